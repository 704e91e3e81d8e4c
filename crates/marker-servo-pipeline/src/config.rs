use serde::{Deserialize, Serialize};

use marker_servo_aruco::{builtins, SquareFiducialDetector, SquareFiducialParams};
use marker_servo_control::ServoParams;
use marker_servo_core::{CameraModel, MarkerDetector};

/// Marker family selector.
///
/// Families are a closed set; building a detector for a family without an
/// implementation fails here, at construction, never per frame.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum MarkerFamily {
    SquareFiducial { dictionary: String },
    QrCode,
}

/// Errors building a detector from configuration.
#[derive(thiserror::Error, Debug)]
pub enum DetectorBuildError {
    #[error("unknown dictionary {0:?}")]
    UnknownDictionary(String),

    #[error("marker family {0} is not implemented")]
    UnsupportedFamily(&'static str),
}

/// Build the detector for a configured family.
pub fn build_detector(
    family: &MarkerFamily,
    params: SquareFiducialParams,
) -> Result<Box<dyn MarkerDetector>, DetectorBuildError> {
    match family {
        MarkerFamily::SquareFiducial { dictionary } => {
            let dict = builtins::builtin_dictionary(dictionary)
                .ok_or_else(|| DetectorBuildError::UnknownDictionary(dictionary.clone()))?;
            Ok(Box::new(SquareFiducialDetector::new(dict, params)))
        }
        MarkerFamily::QrCode => Err(DetectorBuildError::UnsupportedFamily("qr_code")),
    }
}

/// Full pipeline configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub family: MarkerFamily,
    /// Physical marker side length; poses come out in the same unit.
    pub marker_size: f64,
    pub camera: CameraModel,
    #[serde(default)]
    pub detector: SquareFiducialParams,
    #[serde(default)]
    pub servo: ServoParams,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            family: MarkerFamily::SquareFiducial {
                dictionary: "DICT_4X4_16".to_string(),
            },
            marker_size: 0.5,
            camera: CameraModel {
                fx: 467.74270306499267,
                fy: 467.74270306499267,
                cx: 320.5,
                cy: 240.5,
                distortion: [0.0; 5],
                resolution: (640, 480),
                fov: (1.2, 1.1),
            },
            detector: SquareFiducialParams::default(),
            servo: ServoParams::default(),
        }
    }
}

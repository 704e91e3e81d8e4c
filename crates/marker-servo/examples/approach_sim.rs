//! Closed-loop approach simulation.
//!
//! Renders a marker into synthetic frames, runs the full pipeline, and
//! feeds the commanded velocity back into the marker's image position, so
//! the loop visibly converges onto the frame center. Writes a JSON report.
//!
//! Usage: `cargo run --example approach_sim [config.json]`

use std::{env, fs, path::PathBuf, str::FromStr};
use std::time::{Duration, Instant};

use log::{info, LevelFilter};
use serde::{Deserialize, Serialize};

use marker_servo::aruco::builtins::DICT_4X4_16;
use marker_servo::aruco::render::stamp_marker;
use marker_servo::control::{DispatchOutcome, LinkError, VehicleLink, VehicleMode, VelocityCommand};
use marker_servo::convert::frame_from_gray;
use marker_servo::core::{init_with_level, Frame, GrayImage};
use marker_servo::pipeline::{FrameSink, SinkError};
use marker_servo::{FramePipeline, PipelineConfig};

#[derive(Debug, Deserialize)]
struct SimConfig {
    #[serde(default)]
    pipeline: Option<PipelineConfig>,
    /// Marker id to render.
    #[serde(default = "default_marker_id")]
    marker_id: u32,
    /// Initial marker top-left corner in pixels.
    #[serde(default = "default_start")]
    start: (f64, f64),
    #[serde(default = "default_iterations")]
    iterations: usize,
    #[serde(default)]
    output_path: Option<String>,
}

fn default_marker_id() -> u32 {
    7
}

fn default_start() -> (f64, f64) {
    (90.0, 70.0)
}

fn default_iterations() -> usize {
    120
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            pipeline: None,
            marker_id: default_marker_id(),
            start: default_start(),
            iterations: default_iterations(),
            output_path: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct SimReport {
    iterations: usize,
    frames_with_target: usize,
    commands_sent: usize,
    final_pixel_error: (f64, f64),
    converged: bool,
}

struct SimLink {
    sent: Vec<VelocityCommand>,
}

impl VehicleLink for SimLink {
    fn mode(&self) -> VehicleMode {
        VehicleMode::Guided
    }

    fn send_velocity(&mut self, command: &VelocityCommand) -> Result<(), LinkError> {
        self.sent.push(*command);
        Ok(())
    }
}

struct DropSink;

impl FrameSink for DropSink {
    fn publish(&mut self, _frame: Frame) -> Result<(), SinkError> {
        Ok(())
    }
}

const MODULE_PX: usize = 10;

fn render_scene(config: &PipelineConfig, id: u32, pos: (f64, f64), t: Instant) -> Frame {
    let (w, h) = config.camera.resolution;
    let mut gray = GrayImage {
        width: w as usize,
        height: h as usize,
        data: vec![255; (w * h) as usize],
    };
    stamp_marker(
        &mut gray,
        &DICT_4X4_16,
        id,
        pos.0.round().max(0.0) as usize,
        pos.1.round().max(0.0) as usize,
        MODULE_PX,
    );
    frame_from_gray(&gray, t).expect("frame dimensions")
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_with_level(LevelFilter::from_str("info").unwrap_or(LevelFilter::Info))?;

    let sim = load_config()?;
    let config = sim.pipeline.clone().unwrap_or_default();
    let mut pipeline = FramePipeline::from_config(&config, SimLink { sent: Vec::new() }, DropSink)?;

    let marker_px = (DICT_4X4_16.cells_per_side() * MODULE_PX) as f64;
    // Apparent depth of the rendered marker, for velocity -> pixel feedback.
    let depth = config.camera.fx * config.marker_size / marker_px;
    let px_per_unit = config.camera.fx / depth;

    let mut pos = sim.start;
    let mut frames_with_target = 0usize;
    let t0 = Instant::now();

    for i in 0..sim.iterations {
        let frame = render_scene(&config, sim.marker_id, pos, t0 + Duration::from_millis(100 * i as u64));
        let report = pipeline.process_frame(&frame)?;

        if let Some(target) = report.target {
            frames_with_target += 1;
            let dt = target.command.duration.as_secs_f64();
            // Camera motion shifts the scene: forward motion moves the marker
            // down the image, rightward motion moves it left.
            pos.1 += target.command.vx * px_per_unit * dt;
            pos.0 -= target.command.vy * px_per_unit * dt;

            if i % 20 == 0 {
                info!(
                    "iter {i}: depth {:.2}, command ({:+.3}, {:+.3}), dispatch {:?}",
                    target.depth,
                    target.command.vx,
                    target.command.vy,
                    report.dispatch.unwrap_or(DispatchOutcome::DroppedModeGate),
                );
            }
        }
    }

    let (w, h) = config.camera.resolution;
    let center = (w as f64 * 0.5, h as f64 * 0.5);
    let marker_center = (pos.0 + marker_px * 0.5, pos.1 + marker_px * 0.5);
    let final_err = (marker_center.0 - center.0, marker_center.1 - center.1);

    let report = SimReport {
        iterations: sim.iterations,
        frames_with_target,
        commands_sent: pipeline.link().sent.len(),
        final_pixel_error: final_err,
        converged: final_err.0.abs() < 5.0 && final_err.1.abs() < 5.0,
    };
    info!(
        "final pixel error ({:+.1}, {:+.1}), converged: {}",
        final_err.0, final_err.1, report.converged
    );

    write_report(sim.output_path.as_deref(), &report)
}

fn load_config() -> Result<SimConfig, Box<dyn std::error::Error>> {
    match env::args().nth(1) {
        Some(path) => {
            let raw = fs::read_to_string(path)?;
            Ok(serde_json::from_str(&raw)?)
        }
        None => Ok(SimConfig::default()),
    }
}

fn write_report(path: Option<&str>, report: &SimReport) -> Result<(), Box<dyn std::error::Error>> {
    let out_path = path
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("tmpdata/approach_sim_report.json"));
    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&out_path, serde_json::to_string_pretty(report)?)?;
    println!("wrote report JSON to {}", out_path.display());
    Ok(())
}

//! Closed-loop visual servoing control.
//!
//! The image-plane offset of the selected target feeds two persistent PID
//! axis controllers; their outputs map onto body-frame velocities through a
//! fixed sign/axis-swap table. Commands reach the vehicle only through the
//! [`CommandGateway`], which enforces the guided-mode gate.

mod command;
mod gateway;
mod pid;
mod servo;
mod vehicle;

pub use command::VelocityCommand;
pub use gateway::{CommandGateway, DispatchOutcome};
pub use pid::{AxisController, PidGains, MIN_DT};
pub use servo::{ServoParams, VisualServoController};
pub use vehicle::{LinkError, VehicleLink, VehicleMode};

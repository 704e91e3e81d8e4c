use serde::{Deserialize, Serialize};

use crate::command::VelocityCommand;
use crate::vehicle::{LinkError, VehicleLink, VehicleMode};

/// What the gateway did with a command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchOutcome {
    Sent,
    /// The vehicle was not in guided mode; the command was discarded.
    ///
    /// Discarded commands are never queued or replayed: they are derived
    /// from stale frame state, and the pilot who switched modes keeps
    /// override authority until a fresh frame produces a fresh command.
    DroppedModeGate,
}

/// Mode-gated dispatcher in front of the vehicle link.
pub struct CommandGateway<L: VehicleLink> {
    link: L,
}

impl<L: VehicleLink> CommandGateway<L> {
    pub fn new(link: L) -> Self {
        Self { link }
    }

    #[inline]
    pub fn mode(&self) -> VehicleMode {
        self.link.mode()
    }

    #[inline]
    pub fn link(&self) -> &L {
        &self.link
    }

    #[inline]
    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    /// Forward a command iff the vehicle is in guided mode.
    pub fn dispatch(&mut self, command: &VelocityCommand) -> Result<DispatchOutcome, LinkError> {
        let mode = self.link.mode();
        if !mode.is_guided() {
            log::debug!("command dropped, vehicle mode is {mode:?}");
            return Ok(DispatchOutcome::DroppedModeGate);
        }
        self.link.send_velocity(command)?;
        Ok(DispatchOutcome::Sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct FakeLink {
        mode: VehicleMode,
        sent: Vec<VelocityCommand>,
        fail_sends: bool,
    }

    impl FakeLink {
        fn new(mode: VehicleMode) -> Self {
            Self {
                mode,
                sent: Vec::new(),
                fail_sends: false,
            }
        }
    }

    impl VehicleLink for FakeLink {
        fn mode(&self) -> VehicleMode {
            self.mode
        }

        fn send_velocity(&mut self, command: &VelocityCommand) -> Result<(), LinkError> {
            if self.fail_sends {
                return Err(LinkError::SendFailed("socket closed".into()));
            }
            self.sent.push(*command);
            Ok(())
        }
    }

    fn command(vx: f64, vy: f64) -> VelocityCommand {
        VelocityCommand {
            vx,
            vy,
            vz: 0.0,
            duration: Duration::from_millis(500),
        }
    }

    #[test]
    fn dispatches_iff_mode_is_guided() {
        let modes = [
            VehicleMode::Guided,
            VehicleMode::Stabilize,
            VehicleMode::Loiter,
            VehicleMode::Land,
            VehicleMode::Rtl,
            VehicleMode::Auto,
            VehicleMode::Other,
        ];
        // A spread of command magnitudes, signs included.
        let commands: Vec<VelocityCommand> = (-5..=5)
            .flat_map(|i| (-5..=5).map(move |j| command(i as f64 * 0.3, j as f64 * 0.7)))
            .collect();

        for mode in modes {
            for cmd in &commands {
                let mut gateway = CommandGateway::new(FakeLink::new(mode));
                let outcome = gateway.dispatch(cmd).unwrap();
                if mode.is_guided() {
                    assert_eq!(outcome, DispatchOutcome::Sent);
                    assert_eq!(gateway.link().sent.as_slice(), &[*cmd]);
                } else {
                    assert_eq!(outcome, DispatchOutcome::DroppedModeGate);
                    assert!(gateway.link().sent.is_empty());
                }
            }
        }
    }

    #[test]
    fn dropped_commands_are_not_replayed_after_mode_regain() {
        let mut gateway = CommandGateway::new(FakeLink::new(VehicleMode::Land));
        gateway.dispatch(&command(1.0, 0.0)).unwrap();
        assert!(gateway.link().sent.is_empty());

        gateway.link_mut().mode = VehicleMode::Guided;
        gateway.dispatch(&command(0.0, 2.0)).unwrap();
        // only the fresh command goes out
        assert_eq!(gateway.link().sent.as_slice(), &[command(0.0, 2.0)]);
    }

    #[test]
    fn send_failures_surface_to_the_caller() {
        let mut link = FakeLink::new(VehicleMode::Guided);
        link.fail_sends = true;
        let mut gateway = CommandGateway::new(link);
        assert!(matches!(
            gateway.dispatch(&command(1.0, 1.0)),
            Err(LinkError::SendFailed(_))
        ));
    }
}

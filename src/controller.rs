// Toastwatch — Decision / Actuation Controller
//
// ARMED -> CANCELLED as soon as the estimate drops under the threshold.
// CANCELLED holds the cancel line asserted until the toasting-sense input
// falls (HIGH then LOW), which re-arms for the next cycle.  The sense line
// never gates the cancel itself.

use embedded_hal::digital::{OutputPin, PinState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelState {
    Armed,
    Cancelled,
}

/// Level to drive onto the cancel line this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorCommand {
    Release,
    Assert,
}

impl ActuatorCommand {
    pub fn is_asserted(self) -> bool {
        self == Self::Assert
    }

    /// Active HIGH into the open-drain cancel stage.
    pub fn level(self) -> PinState {
        match self {
            Self::Assert => PinState::High,
            Self::Release => PinState::Low,
        }
    }
}

pub struct CancelController {
    threshold_s: f32,
    state: CancelState,
    command: ActuatorCommand,
    toasting: bool,
}

impl CancelController {
    pub fn new(threshold_s: f32) -> Self {
        Self {
            threshold_s,
            state: CancelState::Armed,
            command: ActuatorCommand::Release,
            toasting: false,
        }
    }

    pub fn state(&self) -> CancelState {
        self.state
    }

    /// Command from the last decision; faulted ticks re-drive this.
    pub fn command(&self) -> ActuatorCommand {
        self.command
    }

    /// Feed one prediction together with the toasting-sense level.
    pub fn decide(&mut self, time_to_burnt: f32, toasting: bool) -> ActuatorCommand {
        let stopped = self.toasting && !toasting;
        self.toasting = toasting;

        if stopped {
            if self.state == CancelState::Cancelled {
                log::info!("Toasting stopped, cancel released and re-armed");
            }
            self.state = CancelState::Armed;
            self.command = ActuatorCommand::Release;
            return self.command;
        }

        if self.state == CancelState::Armed && time_to_burnt < self.threshold_s {
            log::info!(
                "{:.1} s to burnt (< {:.1} s), asserting cancel",
                time_to_burnt,
                self.threshold_s
            );
            self.state = CancelState::Cancelled;
        }

        self.command = match self.state {
            CancelState::Armed => ActuatorCommand::Release,
            CancelState::Cancelled => ActuatorCommand::Assert,
        };
        self.command
    }

    pub fn status_text(&self) -> &'static str {
        match (self.state, self.toasting) {
            (CancelState::Cancelled, _) => "Done!",
            (CancelState::Armed, true) => "Toasting...",
            (CancelState::Armed, false) => "Ready",
        }
    }
}

/// Drive the cancel line to an explicit level.  Called every tick.
pub fn drive<P: OutputPin>(pin: &mut P, command: ActuatorCommand) -> Result<(), P::Error> {
    pin.set_state(command.level())
}

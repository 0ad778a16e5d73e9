use crate::animation::path::ControlPath;
use crate::foundation::error::{HaloError, HaloResult};
use crate::scene::state::MainState;
use crossbeam_channel::{Receiver, Sender};
use std::fmt;

/// Pure state transform delivered by the control plane.
pub type StateUpdate = Box<dyn FnOnce(&MainState) -> MainState + Send>;

/// Control-plane event. Applied by the engine between ticks, in arrival order.
pub enum Command {
    /// Replace the state with `update(current)`.
    Update(StateUpdate),
    /// Restart the bounce envelope of one animated field.
    Bounce(ControlPath),
    /// Start a transition to the next item of the sequence at this path.
    AdvanceSequence(ControlPath),
    /// Start the timed live -> ready crossfade.
    StartAutoTransition,
    /// Set the manual live -> ready scrub position.
    ManualScrub(f64),
    /// Stop the scheduler after the current tick.
    Shutdown,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Update(_) => f.write_str("Update(..)"),
            Self::Bounce(p) => f.debug_tuple("Bounce").field(p).finish(),
            Self::AdvanceSequence(p) => f.debug_tuple("AdvanceSequence").field(p).finish(),
            Self::StartAutoTransition => f.write_str("StartAutoTransition"),
            Self::ManualScrub(v) => f.debug_tuple("ManualScrub").field(v).finish(),
            Self::Shutdown => f.write_str("Shutdown"),
        }
    }
}

/// Cloneable sending side of the engine's command queue.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    tx: Sender<Command>,
}

/// Create an unbounded command queue.
pub fn command_channel() -> (EngineHandle, Receiver<Command>) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (EngineHandle { tx }, rx)
}

impl EngineHandle {
    /// Queue a command. Fails only once the engine has been dropped.
    pub fn send(&self, cmd: Command) -> HaloResult<()> {
        self.tx
            .send(cmd)
            .map_err(|e| HaloError::evaluation(format!("engine is gone; dropped {:?}", e.0)))
    }

    /// Queue [`Command::Update`].
    pub fn update(
        &self,
        f: impl FnOnce(&MainState) -> MainState + Send + 'static,
    ) -> HaloResult<()> {
        self.send(Command::Update(Box::new(f)))
    }

    /// Queue [`Command::Bounce`].
    pub fn bounce(&self, path: ControlPath) -> HaloResult<()> {
        self.send(Command::Bounce(path))
    }

    /// Queue [`Command::AdvanceSequence`].
    pub fn advance_sequence(&self, path: ControlPath) -> HaloResult<()> {
        self.send(Command::AdvanceSequence(path))
    }

    /// Queue [`Command::StartAutoTransition`].
    pub fn start_auto_transition(&self) -> HaloResult<()> {
        self.send(Command::StartAutoTransition)
    }

    /// Queue [`Command::ManualScrub`].
    pub fn manual_scrub(&self, value: f64) -> HaloResult<()> {
        self.send(Command::ManualScrub(value))
    }

    /// Queue [`Command::Shutdown`].
    pub fn shutdown(&self) -> HaloResult<()> {
        self.send(Command::Shutdown)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/commands.rs"]
mod tests;

use tokio_util::sync::CancellationToken;

use crate::{Machine, Result, State};

/// Anything that advances one pulse at a time.
///
/// Implemented by [`Machine`] and [`InputChain`](crate::InputChain); drivers
/// such as [`pulse_to_completion`](Stepper::pulse_to_completion) and
/// [`driver::drive`](crate::driver::drive) are written against it.
pub trait Stepper {
    fn pulse(&mut self) -> Result<State>;

    fn state(&self) -> State;

    fn completed(&self) -> bool;

    fn cancel_token(&self) -> CancellationToken;

    /// Pulses until the machine completes.
    ///
    /// Stops early once the machine settles in a state it cannot leave without
    /// a reset (cancelled or faulty). An auto-resetting machine that keeps
    /// completing successfully never settles, so this does not return for it.
    fn pulse_to_completion(&mut self) -> Result<State> {
        while !self.completed() {
            if self.pulse()?.is_terminal() {
                break;
            }
        }
        Ok(self.state())
    }
}

impl<S: Default> Stepper for Machine<S> {
    fn pulse(&mut self) -> Result<State> {
        Machine::<S>::pulse(self)
    }

    fn state(&self) -> State {
        Machine::<S>::state(self)
    }

    fn completed(&self) -> bool {
        Machine::<S>::completed(self)
    }

    fn cancel_token(&self) -> CancellationToken {
        Machine::<S>::cancel_token(self)
    }
}

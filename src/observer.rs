use crate::{Script, State, Step};

/// Identifier returned by [`Machine::add_observer`](crate::Machine::add_observer).
pub type ObserverId = u32;

/// Lifecycle listener attached to a machine.
///
/// All methods have empty default implementations; override the ones you
/// need. Observers are notified in registration order. An observer that
/// panics is removed from the machine and the panic is logged, the pulse
/// itself carries on.
pub trait Observer<S>: Send {
    /// Called at the start of every pulse with the state the pulse starts from.
    fn on_pulse(&mut self, state: State) {
        let _s = state;
    }

    /// Called right before `script` runs.
    fn on_before_invoke(&mut self, script: &Script<S>) {
        let _s = script;
    }

    /// Called right after `script` returned `step`.
    fn on_after_invoke(&mut self, script: &Script<S>, step: &Step<S>) {
        let _s = script;
        let _r = step;
    }

    /// Called when the top of the call stack moved from `previous` to `next`.
    fn on_script_changed(&mut self, previous: &Script<S>, next: &Script<S>) {
        let _p = previous;
        let _n = next;
    }
}

pub(crate) struct OnPulse<F>(pub F);

impl<S, F> Observer<S> for OnPulse<F>
where
    F: FnMut(State) + Send,
{
    fn on_pulse(&mut self, state: State) {
        (self.0)(state)
    }
}

pub(crate) struct OnBeforeInvoke<F>(pub F);

impl<S, F> Observer<S> for OnBeforeInvoke<F>
where
    F: FnMut(&Script<S>) + Send,
{
    fn on_before_invoke(&mut self, script: &Script<S>) {
        (self.0)(script)
    }
}

pub(crate) struct OnAfterInvoke<F>(pub F);

impl<S, F> Observer<S> for OnAfterInvoke<F>
where
    F: FnMut(&Script<S>, &Step<S>) + Send,
{
    fn on_after_invoke(&mut self, script: &Script<S>, step: &Step<S>) {
        (self.0)(script, step)
    }
}

pub(crate) struct OnScriptChanged<F>(pub F);

impl<S, F> Observer<S> for OnScriptChanged<F>
where
    F: FnMut(&Script<S>, &Script<S>) + Send,
{
    fn on_script_changed(&mut self, previous: &Script<S>, next: &Script<S>) {
        (self.0)(previous, next)
    }
}

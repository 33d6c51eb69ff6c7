use tokio_util::sync::CancellationToken;

use crate::{
    Result, Script, State,
    internal::{FrameStack, NameRegistry},
};

/// Machine-provided handle a script receives while it runs.
///
/// Use it to:
/// - `name_current(label)`: label the running script so a later script can
///   jump back to it with [`Step::back_to`](crate::Step::back_to)
/// - `name_external(label, script)`: register a script that is not on the
///   stack, reachable with [`Step::to`](crate::Step::to)
/// - `stack_depth()` / `can_go_back(n)` / `find_in_stack(label)`: inspect the
///   call history before asking for a backward jump
/// - `slot()` / `slot_mut()`: reach the machine's per-run value (for an
///   [`InputChain`](crate::InputChain), the current input)
/// - `cancel()`: stop the machine once this script returns
pub struct Scope<'a, S> {
    pub(crate) stack: &'a FrameStack<S>,
    pub(crate) names: &'a mut NameRegistry<S>,
    pub(crate) slot: &'a mut S,
    pub(crate) state: State,
    pub(crate) cancel_token: &'a CancellationToken,
    pub(crate) machine: &'a str,
}

impl<S> Scope<'_, S> {
    /// Labels the running script, replacing any earlier binding of `label`.
    pub fn name_current(&mut self, label: &str) -> Result<()> {
        let current = self.stack.top().clone();
        tracing::trace!(machine = %self.machine, %label, script = %current.id(), "Naming script");
        self.names.bind(label, current)
    }

    /// Labels a script that does not need to be on the call stack.
    pub fn name_external(&mut self, label: &str, script: &Script<S>) -> Result<()> {
        self.names.bind(label, script.clone())
    }

    /// The script being run.
    #[inline]
    pub fn current(&self) -> &Script<S> {
        self.stack.top()
    }

    /// Whether the running script is the machine's initial script.
    pub fn is_initial(&self) -> bool {
        self.stack.top().id() == self.stack.root().id()
    }

    #[inline]
    pub fn stack_depth(&self) -> usize {
        self.stack.depth()
    }

    /// Whether [`Step::back`](crate::Step::back) with `count` would succeed.
    pub fn can_go_back(&self, count: usize) -> bool {
        count < self.stack.depth()
    }

    /// Depth (0 = running script) of the frame labeled `label`.
    pub fn find_in_stack(&self, label: &str) -> Result<usize> {
        self.names.find_in_stack(label, self.stack)
    }

    #[inline]
    pub fn state(&self) -> State {
        self.state
    }

    #[inline]
    pub fn machine_name(&self) -> &str {
        self.machine
    }

    #[inline]
    pub fn slot(&self) -> &S {
        self.slot
    }

    #[inline]
    pub fn slot_mut(&mut self) -> &mut S {
        self.slot
    }

    /// Requests cancellation. The step returned by the running script is
    /// discarded and the machine settles in [`State::Cancelled`].
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

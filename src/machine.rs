use std::{
    fmt,
    panic::{AssertUnwindSafe, catch_unwind, resume_unwind},
};

use tokio_util::sync::CancellationToken;

use crate::{
    Config, Error, Observer, ObserverId, Result, Scope, Script, State, Step,
    internal::{FrameStack, NameRegistry, Observers},
    observer::{OnAfterInvoke, OnBeforeInvoke, OnPulse, OnScriptChanged},
};

/// A resumable step engine.
///
/// The machine keeps a call stack of [`Script`]s. Every [`pulse`](Machine::pulse)
/// runs the script on top of the stack and applies the [`Step`] it returns.
/// Deferred steps end the pulse; immediate steps keep the machine running
/// within the same pulse, so the number of pulses a run takes equals the
/// number of deferred transitions, not the number of scripts executed.
///
/// `S` is the value every script can reach through its [`Scope`]. It is reset
/// to `S::default()` together with the machine. The plain stepper uses `()`,
/// see [`Chain`].
///
/// # Examples
///
/// ```rust
/// use stepchain::{Chain, Script, State, Step};
///
/// let mut chain = Chain::new(Script::new(|scope| {
///     scope.name_current("start")?;
///     Ok(Step::then(Script::new(|_| Ok(Step::complete()))))
/// }));
///
/// assert_eq!(chain.pulse().unwrap(), State::Completed);
/// ```
pub struct Machine<S = ()> {
    stack: FrameStack<S>,
    names: NameRegistry<S>,
    slot: S,
    state: State,
    completed: bool,
    failed: bool,
    config: Config,
    cancel_token: CancellationToken,
    observers: Observers<S>,
}

/// The plain stepper: scripts receive no external input.
pub type Chain = Machine<()>;

impl<S: Default> Machine<S> {
    pub fn new(script: Script<S>) -> Self {
        Self::with_config(script, Config::default())
    }

    pub fn with_config(script: Script<S>, config: Config) -> Self {
        Self {
            stack: FrameStack::new(script),
            names: NameRegistry::new(),
            slot: S::default(),
            state: State::Unstarted,
            completed: false,
            failed: false,
            config,
            cancel_token: CancellationToken::new(),
            observers: Observers::new(),
        }
    }

    /// Advances the machine by one pulse and returns the state it ends in.
    ///
    /// Runs the top script, then keeps running scripts for as long as they
    /// ask for immediate steps. Terminal machines (completed, failed, faulty)
    /// ignore the pulse; a cancelled machine reports `Cancelled`.
    ///
    /// An error returned by a script is handed back here after the machine
    /// turned `Faulty`. A panicking script also faults the machine and the
    /// panic is resumed on the caller.
    pub fn pulse(&mut self) -> Result<State> {
        if self.cancel_token.is_cancelled() {
            self.state = State::Cancelled;
            self.observers
                .notify(&self.config.name, |o| o.on_pulse(State::Cancelled));
            return Ok(self.state);
        }

        let state = self.state;
        self.observers
            .notify(&self.config.name, |o| o.on_pulse(state));

        if self.state.is_unstarted() {
            tracing::debug!(machine = %self.config.name, "Machine started");
            self.state = State::Running;
        }

        let mut invocations = 0usize;
        while self.state.is_running() {
            if let Some(limit) = self.config.step_limit {
                if invocations >= limit {
                    let err = Error::StepLimitExceeded(limit);
                    self.fault(&err);
                    return Err(err);
                }
            }
            invocations += 1;

            let current = self.stack.top().clone();
            self.observers
                .notify(&self.config.name, |o| o.on_before_invoke(&current));

            let step = self.invoke(&current)?;

            self.observers
                .notify(&self.config.name, |o| o.on_after_invoke(&current, &step));

            if self.cancel_token.is_cancelled() {
                tracing::debug!(machine = %self.config.name, script = %current.id(), "Cancelled while running, discarding step");
                self.state = State::Cancelled;
                break;
            }

            let immediate = match self.apply(step) {
                Ok(immediate) => immediate,
                Err(err) => {
                    self.fault(&err);
                    return Err(err);
                }
            };

            // Terminal step or a reset inside the step: the pulse is over.
            if !self.state.is_running() {
                break;
            }

            let top = self.stack.top();
            if top.id() != current.id() {
                let next = top.clone();
                tracing::trace!(machine = %self.config.name, from = %current.id(), to = %next.id(), depth = self.stack.depth(), "Script changed");
                self.observers
                    .notify(&self.config.name, |o| o.on_script_changed(&current, &next));
            }

            if !immediate {
                break;
            }
        }

        Ok(self.state)
    }

    /// Brings the machine back to its initial script.
    ///
    /// Clears the call stack down to the initial script, forgets all labels,
    /// clears the completed/failed flags, resets the slot and sets the state
    /// to `Unstarted`. Cancellation is not undone.
    pub fn reset(&mut self) {
        self.stack.clear();
        self.names.clear();
        self.completed = false;
        self.failed = false;
        self.slot = S::default();
        self.state = State::Unstarted;
        tracing::debug!(machine = %self.config.name, "Machine reset");
    }

    fn invoke(&mut self, current: &Script<S>) -> Result<Step<S>> {
        tracing::trace!(machine = %self.config.name, script = %current.id(), depth = self.stack.depth(), "Invoking script");
        let mut scope = Scope {
            stack: &self.stack,
            names: &mut self.names,
            slot: &mut self.slot,
            state: self.state,
            cancel_token: &self.cancel_token,
            machine: &self.config.name,
        };

        match catch_unwind(AssertUnwindSafe(|| current.invoke(&mut scope))) {
            Ok(Ok(step)) => Ok(step),
            Ok(Err(err)) => {
                self.fault(&err);
                Err(err)
            }
            Err(panic) => {
                self.state = State::Faulty;
                tracing::error!(machine = %self.config.name, script = %current.id(), "Script panicked");
                resume_unwind(panic)
            }
        }
    }

    /// Applies a step to the call stack and flags. Returns whether the
    /// machine should keep stepping within this pulse.
    ///
    /// A failed jump leaves the stack and the labels untouched.
    fn apply(&mut self, step: Step<S>) -> Result<bool> {
        match step {
            Step::Repeat { immediate } => Ok(immediate),
            Step::Complete { ignore_auto_reset } => {
                self.completed = true;
                if self.config.auto_resetting && !ignore_auto_reset {
                    tracing::debug!(machine = %self.config.name, "Completed, auto-resetting");
                    self.reset();
                } else {
                    tracing::debug!(machine = %self.config.name, "Completed");
                    self.state = State::Completed;
                }
                Ok(false)
            }
            Step::Fail => {
                self.completed = true;
                self.failed = true;
                self.state = State::Failed;
                tracing::debug!(machine = %self.config.name, "Failed");
                Ok(false)
            }
            Step::ContinueTo { next, immediate } => {
                self.stack.push(next);
                Ok(immediate)
            }
            Step::To { label, immediate } => {
                let next = self.names.resolve(&label)?.clone();
                self.stack.push(next);
                Ok(immediate)
            }
            Step::Backwards { count, immediate } => {
                self.stack.pop(count)?;
                Ok(immediate)
            }
            Step::BackwardsTo { label, immediate } => {
                // Depth 0 means the labeled script is running; popping nothing
                // turns this into a repeat.
                let depth = self.names.find_in_stack(&label, &self.stack)?;
                self.stack.pop(depth)?;
                Ok(immediate)
            }
            Step::Restart => {
                self.reset();
                Ok(false)
            }
            Step::RestartContinue => {
                // The reset ends the pulse before the continuation is honored.
                self.reset();
                Ok(true)
            }
        }
    }
}

impl<S> Machine<S> {
    fn fault(&mut self, err: &Error) {
        self.state = State::Faulty;
        tracing::error!(machine = %self.config.name, script = %self.stack.top().id(), error = %err, "Machine faulted");
    }

    /// Requests cancellation. Every later pulse reports `Cancelled`, including
    /// after a reset.
    pub fn cancel(&mut self) {
        self.cancel_token.cancel();
        self.state = State::Cancelled;
        tracing::debug!(machine = %self.config.name, "Machine cancelled");
    }

    /// Token shared with the machine's cancellation checks. Cancel it from any
    /// thread to stop the machine at its next safe point.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Labels the script on top of the stack.
    pub fn name_current(&mut self, label: &str) -> Result<()> {
        let current = self.stack.top().clone();
        self.names.bind(label, current)
    }

    /// Labels a script that does not need to be on the call stack, making it
    /// reachable with [`Step::to`].
    pub fn name_external(&mut self, label: &str, script: &Script<S>) -> Result<()> {
        self.names.bind(label, script.clone())
    }

    /// Label bound to the script on top of the stack, if any.
    pub fn current_label(&self) -> Option<&str> {
        self.names.label_of(self.stack.top().id())
    }

    #[inline]
    pub fn state(&self) -> State {
        self.state
    }

    /// Whether a script completed the machine. Failing also counts as completing.
    #[inline]
    pub fn completed(&self) -> bool {
        self.completed
    }

    #[inline]
    pub fn failed(&self) -> bool {
        self.failed
    }

    #[inline]
    pub fn stack_depth(&self) -> usize {
        self.stack.depth()
    }

    /// The script that runs on the next step.
    #[inline]
    pub fn current_script(&self) -> &Script<S> {
        self.stack.top()
    }

    #[inline]
    pub fn initial_script(&self) -> &Script<S> {
        self.stack.root()
    }

    /// Whether the script that runs next is the initial script, compared by
    /// identity (the initial script may also sit higher up the stack).
    pub fn is_current_initial(&self) -> bool {
        self.stack.top().id() == self.stack.root().id()
    }

    #[inline]
    pub fn auto_resetting(&self) -> bool {
        self.config.auto_resetting
    }

    pub fn set_auto_resetting(&mut self, auto_resetting: bool) {
        self.config.auto_resetting = auto_resetting;
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn slot(&self) -> &S {
        &self.slot
    }

    #[inline]
    pub fn slot_mut(&mut self) -> &mut S {
        &mut self.slot
    }

    /// Attaches an observer. Observers are notified in the order they were added.
    pub fn add_observer<O: Observer<S> + 'static>(&mut self, observer: O) -> ObserverId {
        self.observers.add(Box::new(observer))
    }

    /// Detaches an observer. Returns false when the id is unknown.
    pub fn remove_observer(&mut self, id: ObserverId) -> bool {
        self.observers.remove(id)
    }

    /// Calls `f` at the start of every pulse with the state the pulse starts from.
    pub fn on_pulse<F>(&mut self, f: F) -> ObserverId
    where
        F: FnMut(State) + Send + 'static,
    {
        self.add_observer(OnPulse(f))
    }

    /// Calls `f` right before each script runs.
    pub fn on_before_invoke<F>(&mut self, f: F) -> ObserverId
    where
        F: FnMut(&Script<S>) + Send + 'static,
    {
        self.add_observer(OnBeforeInvoke(f))
    }

    /// Calls `f` with each script and the step it returned.
    pub fn on_after_invoke<F>(&mut self, f: F) -> ObserverId
    where
        F: FnMut(&Script<S>, &Step<S>) + Send + 'static,
    {
        self.add_observer(OnAfterInvoke(f))
    }

    /// Calls `f` with the previous and the new top script whenever the top of
    /// the call stack changes.
    pub fn on_script_changed<F>(&mut self, f: F) -> ObserverId
    where
        F: FnMut(&Script<S>, &Script<S>) + Send + 'static,
    {
        self.add_observer(OnScriptChanged(f))
    }
}

impl<S> fmt::Debug for Machine<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("name", &self.config.name)
            .field("state", &self.state)
            .field("stack_depth", &self.stack.depth())
            .field("current", self.stack.top())
            .field("label", &self.current_label())
            .field("labels", &self.names.len())
            .field("observers", &self.observers.len())
            .finish()
    }
}

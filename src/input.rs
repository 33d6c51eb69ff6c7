use std::{fmt, ops::Deref};

use tokio_util::sync::CancellationToken;

use crate::{
    Config, Machine, Observer, ObserverId, Result, Scope, Script, State, Stepper,
};

/// The value an [`InputChain`] hands to its scripts.
///
/// Scripts get it by reference through their [`Scope`], so writes made by one
/// script are seen by the next script in the same pulse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Input<T> {
    value: T,
    changed: bool,
}

impl<T> Input<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            changed: false,
        }
    }

    #[inline]
    pub fn get(&self) -> &T {
        &self.value
    }

    /// Mutable access that leaves the change flag alone.
    #[inline]
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.value
    }

    /// Replaces the value and marks it as changed.
    pub fn set(&mut self, value: T) {
        self.value = value;
        self.changed = true;
    }

    /// Whether the value differs from the one supplied on the previous pulse.
    #[inline]
    pub fn has_changed(&self) -> bool {
        self.changed
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> Deref for Input<T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl<T> Scope<'_, Input<T>> {
    /// The current input value.
    #[inline]
    pub fn input(&self) -> &T {
        &self.slot.value
    }

    #[inline]
    pub fn input_mut(&mut self) -> &mut T {
        &mut self.slot.value
    }

    /// Replaces the input value and marks it as changed.
    pub fn set_input(&mut self, value: T) {
        self.slot.set(value);
    }

    #[inline]
    pub fn has_changed(&self) -> bool {
        self.slot.changed
    }
}

/// Script run by an [`InputChain`] over values of type `T`.
///
/// Naming the input type up front lets closures use the input helpers of
/// [`Scope`] without annotations: `InputScript::<u32>::new(|scope| ...)`.
pub type InputScript<T> = Script<Input<T>>;

type Comparer<T> = Box<dyn Fn(&T, &T) -> bool + Send>;

/// A stepper that carries one externally supplied value per pulse.
///
/// [`pulse_with`](InputChain::pulse_with) stores the new value and flags it
/// as changed when it differs from the previous one. [`pulse`](InputChain::pulse)
/// re-runs with the previous value, flagged as unchanged.
///
/// Read-only queries of the underlying [`Machine`] are reachable through
/// `Deref`.
///
/// # Examples
///
/// ```rust
/// use stepchain::{InputChain, InputScript, State, Step};
///
/// let mut chain = InputChain::new(InputScript::<u32>::new(|scope| {
///     if *scope.input() >= 3 {
///         return Ok(Step::complete());
///     }
///     Ok(Step::repeat())
/// }));
///
/// chain.pulse_with(1).unwrap();
/// chain.pulse_with(2).unwrap();
/// assert_eq!(chain.pulse_with(3).unwrap(), State::Completed);
/// ```
pub struct InputChain<T> {
    machine: Machine<Input<T>>,
    comparer: Comparer<T>,
}

impl<T> InputChain<T>
where
    T: Default + PartialEq + Send + 'static,
{
    pub fn new(script: Script<Input<T>>) -> Self {
        Self::with_config(script, Config::default())
    }

    pub fn with_config(script: Script<Input<T>>, config: Config) -> Self {
        Self {
            machine: Machine::with_config(script, config),
            comparer: Box::new(|left: &T, right: &T| left == right),
        }
    }

    /// Builds a chain whose first pulse already sees `value` as a fresh input.
    pub fn with_input(value: T, script: Script<Input<T>>) -> Self {
        let mut chain = Self::new(script);
        chain.machine.slot_mut().set(value);
        chain
    }
}

impl<T: Default + 'static> InputChain<T> {
    /// Decides whether the input changed with `comparer` (`true` means equal)
    /// instead of `PartialEq`. Chains after any constructor:
    ///
    /// ```rust
    /// use stepchain::{Config, InputChain, InputScript, Step};
    ///
    /// let chain = InputChain::with_config(
    ///     InputScript::<i32>::new(|_| Ok(Step::repeat())),
    ///     Config::default().with_name("buckets"),
    /// )
    /// .with_comparer(|a, b| a / 10 == b / 10);
    /// # let _ = chain;
    /// ```
    pub fn with_comparer<F>(mut self, comparer: F) -> Self
    where
        F: Fn(&T, &T) -> bool + Send + 'static,
    {
        self.comparer = Box::new(comparer);
        self
    }

    pub fn set_comparer<F>(&mut self, comparer: F)
    where
        F: Fn(&T, &T) -> bool + Send + 'static,
    {
        self.comparer = Box::new(comparer);
    }

    /// Pulses with the previous input.
    ///
    /// The input counts as unchanged, except on the very first pulse where a
    /// value seeded by [`with_input`](InputChain::with_input) is still fresh.
    pub fn pulse(&mut self) -> Result<State> {
        if !self.machine.state().is_unstarted() {
            self.machine.slot_mut().changed = false;
        }
        self.machine.pulse()
    }

    /// Pulses with a new input.
    ///
    /// The input counts as changed when it differs from the current one, or
    /// when the current one was set since the last pulse and not seen yet
    /// (see [`with_input`](InputChain::with_input) and
    /// [`set_current`](InputChain::set_current)). The flag is cleared again
    /// once the pulse is over.
    pub fn pulse_with(&mut self, value: T) -> Result<State> {
        let input = self.machine.slot_mut();
        input.changed = input.changed || !(self.comparer)(&input.value, &value);
        input.value = value;

        let result = self.machine.pulse();
        self.machine.slot_mut().changed = false;
        result
    }

    /// Resets the machine and drops the input back to `T::default()`.
    pub fn reset(&mut self) {
        self.machine.reset();
    }

    /// The current (last supplied) input value.
    #[inline]
    pub fn current(&self) -> &T {
        self.machine.slot().get()
    }

    /// Replaces the input value between pulses and marks it as changed.
    pub fn set_current(&mut self, value: T) {
        self.machine.slot_mut().set(value);
    }

    #[inline]
    pub fn has_changed(&self) -> bool {
        self.machine.slot().has_changed()
    }

    #[inline]
    pub fn input(&self) -> &Input<T> {
        self.machine.slot()
    }
}

impl<T> InputChain<T> {
    pub fn cancel(&mut self) {
        self.machine.cancel();
    }

    pub fn name_current(&mut self, label: &str) -> Result<()> {
        self.machine.name_current(label)
    }

    pub fn name_external(&mut self, label: &str, script: &Script<Input<T>>) -> Result<()> {
        self.machine.name_external(label, script)
    }

    pub fn set_auto_resetting(&mut self, auto_resetting: bool) {
        self.machine.set_auto_resetting(auto_resetting);
    }

    pub fn add_observer<O: Observer<Input<T>> + 'static>(&mut self, observer: O) -> ObserverId {
        self.machine.add_observer(observer)
    }

    pub fn remove_observer(&mut self, id: ObserverId) -> bool {
        self.machine.remove_observer(id)
    }

    pub fn on_pulse<F>(&mut self, f: F) -> ObserverId
    where
        F: FnMut(State) + Send + 'static,
    {
        self.machine.on_pulse(f)
    }

    pub fn on_before_invoke<F>(&mut self, f: F) -> ObserverId
    where
        F: FnMut(&Script<Input<T>>) + Send + 'static,
    {
        self.machine.on_before_invoke(f)
    }

    pub fn on_after_invoke<F>(&mut self, f: F) -> ObserverId
    where
        F: FnMut(&Script<Input<T>>, &crate::Step<Input<T>>) + Send + 'static,
    {
        self.machine.on_after_invoke(f)
    }

    pub fn on_script_changed<F>(&mut self, f: F) -> ObserverId
    where
        F: FnMut(&Script<Input<T>>, &Script<Input<T>>) + Send + 'static,
    {
        self.machine.on_script_changed(f)
    }
}

impl<T> Deref for InputChain<T> {
    type Target = Machine<Input<T>>;
    fn deref(&self) -> &Self::Target {
        &self.machine
    }
}

impl<T: Default + 'static> Stepper for InputChain<T> {
    fn pulse(&mut self) -> Result<State> {
        InputChain::<T>::pulse(self)
    }

    fn state(&self) -> State {
        self.machine.state()
    }

    fn completed(&self) -> bool {
        self.machine.completed()
    }

    fn cancel_token(&self) -> CancellationToken {
        self.machine.cancel_token()
    }
}

impl<T: fmt::Debug> fmt::Debug for InputChain<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputChain")
            .field("machine", &self.machine)
            .field("input", self.machine.slot())
            .finish()
    }
}

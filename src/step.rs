use std::{fmt, sync::Arc};

use crate::Script;

/// Result returned by a [`Script`] to tell the machine what to do next.
///
/// Every variant with an `immediate` flag has a deferred form (the pulse ends
/// and the effect is picked up on the next pulse) and an immediate form (the
/// machine keeps stepping within the current pulse). Constructors come in the
/// same pairs: [`Step::next`] / [`Step::then`], [`Step::back`] /
/// [`Step::back_now`], and so on.
pub enum Step<S = ()> {
    /// Run the current script again.
    Repeat { immediate: bool },
    /// Mark the machine completed. Unless `ignore_auto_reset` is set, an
    /// auto-resetting machine resets instead of settling in `Completed`.
    Complete { ignore_auto_reset: bool },
    /// Mark the machine completed and failed. Never auto-resets.
    Fail,
    /// Push `next` onto the call stack.
    ContinueTo { next: Script<S>, immediate: bool },
    /// Push the script registered under `label`.
    To { label: Arc<str>, immediate: bool },
    /// Pop `count` frames and resume the frame below them.
    Backwards { count: usize, immediate: bool },
    /// Pop frames until the script registered under `label` is on top.
    BackwardsTo { label: Arc<str>, immediate: bool },
    /// Reset the machine; the initial script runs on the next pulse.
    Restart,
    /// Reset the machine and ask to continue immediately.
    ///
    /// The reset ends the pulse before the continuation is looked at, so this
    /// behaves exactly like [`Step::Restart`].
    RestartContinue,
}

impl<S> Step<S> {
    /// Run the current script again on the next pulse.
    pub fn repeat() -> Self {
        Step::Repeat { immediate: false }
    }

    /// Run the current script again within this pulse.
    pub fn again() -> Self {
        Step::Repeat { immediate: true }
    }

    pub fn complete() -> Self {
        Step::Complete {
            ignore_auto_reset: false,
        }
    }

    /// Complete and stay `Completed` even if the machine is auto-resetting.
    pub fn complete_ignoring_reset() -> Self {
        Step::Complete {
            ignore_auto_reset: true,
        }
    }

    pub fn fail() -> Self {
        Step::Fail
    }

    /// Run `next` on the next pulse.
    pub fn next(next: Script<S>) -> Self {
        Step::ContinueTo {
            next,
            immediate: false,
        }
    }

    /// Run `next` within this pulse.
    pub fn then(next: Script<S>) -> Self {
        Step::ContinueTo {
            next,
            immediate: true,
        }
    }

    pub fn to(label: impl Into<Arc<str>>) -> Self {
        Step::To {
            label: label.into(),
            immediate: false,
        }
    }

    pub fn to_now(label: impl Into<Arc<str>>) -> Self {
        Step::To {
            label: label.into(),
            immediate: true,
        }
    }

    pub fn back(count: usize) -> Self {
        Step::Backwards {
            count,
            immediate: false,
        }
    }

    pub fn back_now(count: usize) -> Self {
        Step::Backwards {
            count,
            immediate: true,
        }
    }

    pub fn back_to(label: impl Into<Arc<str>>) -> Self {
        Step::BackwardsTo {
            label: label.into(),
            immediate: false,
        }
    }

    pub fn back_to_now(label: impl Into<Arc<str>>) -> Self {
        Step::BackwardsTo {
            label: label.into(),
            immediate: true,
        }
    }

    pub fn restart() -> Self {
        Step::Restart
    }

    pub fn restart_continue() -> Self {
        Step::RestartContinue
    }

    /// Whether the machine is asked to keep stepping within this pulse.
    pub fn is_immediate(&self) -> bool {
        match self {
            Step::Repeat { immediate }
            | Step::ContinueTo { immediate, .. }
            | Step::To { immediate, .. }
            | Step::Backwards { immediate, .. }
            | Step::BackwardsTo { immediate, .. } => *immediate,
            Step::RestartContinue => true,
            Step::Complete { .. } | Step::Fail | Step::Restart => false,
        }
    }

    pub(crate) fn is_deferred_repeat(&self) -> bool {
        matches!(self, Step::Repeat { immediate: false })
    }

    /// Variant name, used in logs and recordings.
    pub fn kind(&self) -> &'static str {
        match self {
            Step::Repeat { .. } => "Repeat",
            Step::Complete { .. } => "Complete",
            Step::Fail => "Fail",
            Step::ContinueTo { .. } => "ContinueTo",
            Step::To { .. } => "To",
            Step::Backwards { .. } => "Backwards",
            Step::BackwardsTo { .. } => "BackwardsTo",
            Step::Restart => "Restart",
            Step::RestartContinue => "RestartContinue",
        }
    }
}

impl<S> From<Script<S>> for Step<S> {
    fn from(next: Script<S>) -> Self {
        Step::next(next)
    }
}

impl<S> fmt::Debug for Step<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Repeat { immediate } => f
                .debug_struct("Repeat")
                .field("immediate", immediate)
                .finish(),
            Step::Complete { ignore_auto_reset } => f
                .debug_struct("Complete")
                .field("ignore_auto_reset", ignore_auto_reset)
                .finish(),
            Step::Fail => write!(f, "Fail"),
            Step::ContinueTo { next, immediate } => f
                .debug_struct("ContinueTo")
                .field("next", next)
                .field("immediate", immediate)
                .finish(),
            Step::To { label, immediate } => f
                .debug_struct("To")
                .field("label", label)
                .field("immediate", immediate)
                .finish(),
            Step::Backwards { count, immediate } => f
                .debug_struct("Backwards")
                .field("count", count)
                .field("immediate", immediate)
                .finish(),
            Step::BackwardsTo { label, immediate } => f
                .debug_struct("BackwardsTo")
                .field("label", label)
                .field("immediate", immediate)
                .finish(),
            Step::Restart => write!(f, "Restart"),
            Step::RestartContinue => write!(f, "RestartContinue"),
        }
    }
}

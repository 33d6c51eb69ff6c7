use std::fmt;

/// Lifecycle state of a [`Machine`](crate::Machine).
///
/// ```text
/// Unstarted ─▶ Running ─▶ Completed | Failed | Faulty | Cancelled
/// ```
///
/// `Cancelled` is reachable from every other state. [`reset`](crate::Machine::reset)
/// brings any state back to `Unstarted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum State {
    /// Never pulsed, or reset since the last pulse.
    #[default]
    Unstarted,
    /// Pulsed at least once and still making progress.
    Running,
    /// A script returned [`Step::Complete`](crate::Step::Complete).
    Completed,
    /// A script returned [`Step::Fail`](crate::Step::Fail).
    Failed,
    /// A script returned an error or panicked.
    Faulty,
    /// The machine's cancellation token was triggered.
    Cancelled,
}

impl State {
    /// Whether further pulses can never make progress without a reset.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            State::Completed | State::Failed | State::Faulty | State::Cancelled
        )
    }

    pub fn is_running(&self) -> bool {
        matches!(self, State::Running)
    }

    pub fn is_unstarted(&self) -> bool {
        matches!(self, State::Unstarted)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Unstarted => write!(f, "Unstarted"),
            State::Running => write!(f, "Running"),
            State::Completed => write!(f, "Completed"),
            State::Failed => write!(f, "Failed"),
            State::Faulty => write!(f, "Faulty"),
            State::Cancelled => write!(f, "Cancelled"),
        }
    }
}

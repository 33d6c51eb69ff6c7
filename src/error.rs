use std::{fmt::Display, sync::Arc};

use crate::ScriptId;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Could not go backwards {requested} frame(s) from a call stack of depth {depth}.")]
    StackUnderflow { requested: usize, depth: usize },

    #[error("Could not find script corresponding to label '{0}'.")]
    UnknownLabel(Arc<str>),

    #[error("Script labeled '{0}' is not present in the current call stack.")]
    LabelNotInStack(Arc<str>),

    #[error("Script labels must not be empty.")]
    InvalidLabel,

    #[error("Script {0} is already running on another machine.")]
    ScriptBusy(ScriptId),

    #[error("Pulse exceeded the limit of {0} script invocations.")]
    StepLimitExceeded(usize),

    #[error("Error external to the chain occurred: {0}")]
    External(Arc<str>),

    #[error("IO Error: {0}")]
    IOError(#[from] std::io::Error),
}

impl Error {
    /// Wraps any displayable error raised by a script.
    pub fn external(err: impl Display) -> Self {
        Error::External(Arc::from(err.to_string()))
    }

    /// Whether the error came from the engine refusing a jump, as opposed to
    /// a failure raised by the script itself.
    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            Error::StackUnderflow { .. }
                | Error::UnknownLabel(_)
                | Error::LabelNotInStack(_)
                | Error::InvalidLabel
        )
    }
}

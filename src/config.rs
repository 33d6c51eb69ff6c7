use std::sync::Arc;

/// Machine configuration.
///
/// Use the builder methods to customize, or [`Default`] for a plain machine.
///
/// # Examples
///
/// ```rust
/// use stepchain::Config;
///
/// let config = Config::default()
///     .with_name("door")             // Shows up in every log line
///     .with_auto_resetting(true)     // Start over after each completion
///     .with_step_limit(1_000);       // Guard against runaway immediate loops
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Name attached to log events of the machine.
    /// Default: "chain"
    pub name: Arc<str>,

    /// Whether a successful completion immediately resets the machine.
    /// Failures never reset.
    /// Default: false
    pub auto_resetting: bool,

    /// Maximum number of script invocations within one pulse.
    /// Chains of immediate steps are unbounded when `None`.
    /// Default: None
    pub step_limit: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            name: Arc::from("chain"),
            auto_resetting: false,
            step_limit: None,
        }
    }
}

impl Config {
    pub fn with_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Reset the machine whenever a script completes it.
    ///
    /// A script can still settle the machine in `Completed` with
    /// [`Step::complete_ignoring_reset`](crate::Step::complete_ignoring_reset).
    pub fn with_auto_resetting(mut self, auto_resetting: bool) -> Self {
        self.auto_resetting = auto_resetting;
        self
    }

    /// Fault the machine when a single pulse runs more than `limit` scripts.
    ///
    /// Exceeding the limit makes the pulse return
    /// [`Error::StepLimitExceeded`](crate::Error::StepLimitExceeded).
    pub fn with_step_limit(mut self, limit: usize) -> Self {
        self.step_limit = Some(limit);
        self
    }
}

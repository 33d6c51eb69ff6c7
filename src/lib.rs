//! Stepchain - resumable, pulse-driven step engine
//!
//! A chain of scripts that return one another becomes an explicit state
//! machine: each [`pulse`](Machine::pulse) runs the script on top of the call
//! stack and applies the [`Step`] it returns. Scripts can move forward now or
//! on the next pulse, jump back by depth or to a labeled frame, complete,
//! fail or restart the machine.
//!
//! ```rust
//! use stepchain::{Chain, Script, State, Step, Stepper};
//!
//! let mut chain = Chain::new(Script::new(|scope| {
//!     scope.name_current("roll")?;
//!     Ok(Step::next(Script::new(|_| Ok(Step::complete()))))
//! }));
//!
//! assert_eq!(chain.pulse().unwrap(), State::Running);
//! assert_eq!(chain.pulse_to_completion().unwrap(), State::Completed);
//! ```
//!
//! Two steppers are provided: [`Chain`] for scripts without external input,
//! and [`InputChain`] for scripts fed one value per pulse.
//!
//! See `demos/dice.rs` and `demos/odd_pairs.rs`.

mod config;
mod error;
mod input;
mod machine;
mod observer;
mod scope;
mod script;
mod state;
mod step;
mod stepper;

mod internal;

#[cfg(feature = "driver")]
pub mod driver;

#[cfg(feature = "recorder")]
mod recorder;

pub use config::Config;
pub use error::Error;
pub use input::{Input, InputChain, InputScript};
pub use machine::{Chain, Machine};
pub use observer::{Observer, ObserverId};
pub use scope::Scope;
pub use script::{Script, ScriptId};
pub use state::State;
pub use step::Step;
pub use stepper::Stepper;
pub use tokio_util::sync::CancellationToken;

#[cfg(feature = "recorder")]
pub use recorder::Recorder;

pub type Result<T = ()> = std::result::Result<T, Error>;

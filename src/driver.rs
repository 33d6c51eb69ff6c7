//! Drive a machine from a timer.
//!
//! Enable with the `driver` feature (on by default). The driver is just an
//! external caller of [`Stepper::pulse`]; it never runs two machines against
//! each other.
//!
//! ```rust,ignore
//! let mut chain = Chain::new(script);
//! let token = chain.cancel_token();
//! tokio::spawn(async move {
//!     tokio::time::sleep(Duration::from_secs(5)).await;
//!     token.cancel();
//! });
//! let state = stepchain::driver::drive(&mut chain, Duration::from_millis(50)).await?;
//! ```

use std::time::Duration;

use tokio::{
    select,
    time::{self, MissedTickBehavior},
};

use crate::{Result, State, Stepper};

/// Pulses `stepper` once per `period` until it completes or settles in a
/// terminal state.
///
/// The first pulse happens right away. Cancelling the stepper's token stops
/// the loop without waiting for the next tick; the returned state is then
/// `Cancelled`. Errors returned by a pulse end the loop and are passed on.
pub async fn drive<M: Stepper>(stepper: &mut M, period: Duration) -> Result<State> {
    let token = stepper.cancel_token();
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        select! {
            biased;
            _ = token.cancelled() => {
                tracing::debug!("Driver stopped by cancellation");
                return stepper.pulse();
            }
            _ = ticker.tick() => {
                let state = stepper.pulse()?;
                if stepper.completed() || state.is_terminal() {
                    return Ok(state);
                }
            }
        }
    }
}

/// Like [`drive`], feeding one value from `inputs` per tick into
/// [`InputChain::pulse_with`](crate::InputChain::pulse_with).
///
/// Once `inputs` runs dry the remaining ticks fall back to plain pulses.
pub async fn drive_inputs<T, I>(
    chain: &mut crate::InputChain<T>,
    inputs: I,
    period: Duration,
) -> Result<State>
where
    T: Default + 'static,
    I: IntoIterator<Item = T>,
{
    let token = chain.cancel_token();
    let mut inputs = inputs.into_iter();
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        select! {
            biased;
            _ = token.cancelled() => {
                tracing::debug!("Driver stopped by cancellation");
                return chain.pulse();
            }
            _ = ticker.tick() => {
                let state = match inputs.next() {
                    Some(value) => chain.pulse_with(value)?,
                    None => chain.pulse()?,
                };
                if chain.completed() || state.is_terminal() {
                    return Ok(state);
                }
            }
        }
    }
}

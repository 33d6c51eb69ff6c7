//! Drive a chain from a tokio interval and stop it from another task.

use std::time::Duration;

use stepchain::{Chain, Config, Script, Step, driver::drive};

#[tokio::main]
async fn main() -> stepchain::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut chain = Chain::with_config(
        Script::new(|_| {
            let mut ticks = 0u32;
            Ok(Step::next(Script::new(move |_| {
                ticks += 1;
                tracing::info!(ticks, "Tick");
                Ok(Step::repeat())
            })))
        }),
        Config::default().with_name("ticker"),
    );
    chain.on_script_changed(|previous, next| {
        tracing::info!(%previous, %next, "Moved on");
    });

    let token = chain.cancel_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(550)).await;
        token.cancel();
    });

    let state = drive(&mut chain, Duration::from_millis(100)).await?;
    tracing::info!(%state, "Driver finished");
    Ok(())
}

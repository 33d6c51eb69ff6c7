//! Roll a die until it shows a three, celebrate, and jump back to the roller.
//! Stops once the rolls run out.

use stepchain::{Chain, Config, Error, Script, Step, Stepper};

const ROLLS: u32 = 100;

fn roll() -> stepchain::Result<u8> {
    let mut buf = [0u8; 1];
    getrandom::fill(&mut buf).map_err(Error::external)?;
    Ok(buf[0] % 6)
}

fn main() -> stepchain::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let mut chain = Chain::with_config(
        Script::new(|_| {
            let mut rolls = ROLLS;
            Ok(Step::then(Script::new(move |scope| {
                scope.name_current("reroll")?;
                if rolls == 0 {
                    println!("Out of rolls...");
                    return Ok(Step::complete());
                }

                let n = roll()?;
                rolls -= 1;
                println!("Rolling... the die shows {n}");
                if n != 3 {
                    return Ok(Step::repeat());
                }

                Ok(Step::next(Script::new(|_| {
                    println!("3! Winner, rolling again");
                    Ok(Step::back_to("reroll"))
                })))
            })))
        }),
        Config::default().with_name("dice"),
    );

    let state = chain.pulse_to_completion()?;
    println!("Finished: {state}");
    Ok(())
}

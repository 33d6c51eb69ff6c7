//! Walk a Fibonacci series one value per pulse and turn every pair of
//! consecutive odd numbers even.

use std::sync::{Arc, Mutex};

use stepchain::{InputChain, InputScript, Step};

type Indexed = (usize, i64);

fn is_odd(n: i64) -> bool {
    n % 2 != 0
}

fn main() -> stepchain::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let values = Arc::new(Mutex::new(vec![
        0i64, 1, 1, 2, 3, 5, 8, 13, 21, 34, 55, 89, 144, 233, 377, 610, 987, 1597, 2584, 4181,
    ]));
    println!("Before: {:?}", values.lock().unwrap());

    let series = values.clone();
    let mut chain = InputChain::new(InputScript::<Indexed>::new(move |scope| {
        scope.name_current("watch")?;
        if !is_odd(scope.input().1) {
            return Ok(Step::repeat());
        }

        // Second stage runs right away with the first odd value.
        let series = series.clone();
        Ok(Step::then(InputScript::<Indexed>::new(move |scope| {
            let previous = *scope.input();
            let series = series.clone();
            Ok(Step::next(InputScript::<Indexed>::new(move |scope| {
                let current = *scope.input();
                if !is_odd(current.1) {
                    return Ok(Step::back_to("watch"));
                }
                let mut series = series.lock().unwrap();
                series[previous.0] = previous.1 - 1;
                series[current.0] = current.1 - 1;
                Ok(Step::restart())
            })))
        })))
    }));

    let len = values.lock().unwrap().len();
    for index in 0..len {
        let value = values.lock().unwrap()[index];
        chain.pulse_with((index, value))?;
    }

    println!("After:  {:?}", values.lock().unwrap());
    Ok(())
}

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use stepchain::{Config, InputChain, InputScript, State, Step, Stepper};

type Log = Arc<Mutex<Vec<(i32, bool)>>>;

/// A run of `stages` deferred stages, each recording the input it saw.
fn recording_stages(log: Log, stages: usize) -> InputScript<i32> {
    InputScript::<i32>::new(move |scope| {
        log.lock().unwrap().push((*scope.input(), scope.has_changed()));
        if stages == 1 {
            return Ok(Step::complete());
        }
        Ok(Step::next(recording_stages(log.clone(), stages - 1)))
    })
}

fn seen(log: &Log) -> Vec<(i32, bool)> {
    log.lock().unwrap().clone()
}

#[test]
fn simple() {
    let mut chain = InputChain::new(InputScript::<i32>::new(|_| Ok(Step::complete())));

    chain.pulse_with(1).unwrap();

    assert!(chain.completed());
    assert!(!chain.failed());
}

#[test]
fn cancelled_chain_ignores_inputs() {
    let runs = Arc::new(AtomicUsize::new(0));
    let r = runs.clone();
    let mut chain = InputChain::new(InputScript::<i32>::new(move |_| {
        r.fetch_add(1, Ordering::SeqCst);
        Ok(Step::repeat())
    }));

    chain.pulse_with(1).unwrap();
    chain.cancel();

    assert_eq!(chain.pulse_with(2).unwrap(), State::Cancelled);
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert!(!chain.completed());
}

#[test]
fn each_stage_sees_its_pulse_value() {
    let log = Log::default();
    let mut chain = InputChain::new(recording_stages(log.clone(), 5));

    for value in 1..=5 {
        chain.pulse_with(value).unwrap();
    }

    assert!(chain.completed());
    let values: Vec<_> = seen(&log).into_iter().map(|(v, _)| v).collect();
    assert_eq!(values, vec![1, 2, 3, 4, 5]);
}

#[test]
fn input_has_changed() {
    let log = Log::default();
    let mut chain = InputChain::new(recording_stages(log.clone(), 7));

    chain.pulse_with(1).unwrap();
    chain.pulse_with(2).unwrap();
    chain.pulse().unwrap();
    chain.pulse().unwrap();
    chain.pulse_with(3).unwrap();
    chain.pulse_with(4).unwrap();
    chain.pulse_with(5).unwrap();

    assert!(chain.completed());
    assert_eq!(
        seen(&log),
        vec![
            (1, true),
            (2, true),
            (2, false),
            (2, false),
            (3, true),
            (4, true),
            (5, true),
        ]
    );
}

#[test]
fn repeated_value_is_unchanged() {
    let log = Log::default();
    let mut chain = InputChain::new(recording_stages(log.clone(), 3));

    chain.pulse_with(1).unwrap();
    chain.pulse_with(1).unwrap();
    chain.pulse_with(2).unwrap();

    assert_eq!(seen(&log), vec![(1, true), (1, false), (2, true)]);
}

#[test]
fn first_pulse_with_the_default_value_is_unchanged() {
    let log = Log::default();
    let mut chain = InputChain::new(recording_stages(log.clone(), 2));

    chain.pulse_with(0).unwrap();
    chain.pulse_with(4).unwrap();

    assert_eq!(seen(&log), vec![(0, false), (4, true)]);
}

#[test]
fn pulse_after_reset_compares_against_the_default() {
    let log = Log::default();
    let mut chain = InputChain::new(recording_stages(log.clone(), 3));
    chain.pulse_with(5).unwrap();
    chain.reset();
    log.lock().unwrap().clear();

    chain.pulse_with(0).unwrap();
    chain.pulse_with(0).unwrap();
    chain.pulse_with(1).unwrap();

    assert_eq!(seen(&log), vec![(0, false), (0, false), (1, true)]);
}

#[test]
fn custom_comparer_decides_changes() {
    let log = Log::default();
    let mut chain =
        InputChain::new(recording_stages(log.clone(), 3)).with_comparer(|a, b| a / 10 == b / 10);

    chain.pulse_with(11).unwrap();
    chain.pulse_with(15).unwrap();
    chain.pulse_with(21).unwrap();

    assert_eq!(seen(&log), vec![(11, true), (15, false), (21, true)]);
}

#[test]
fn custom_comparer_combines_with_config_and_seed() {
    let log = Log::default();
    let mut chain = InputChain::with_input(12, recording_stages(log.clone(), 2))
        .with_comparer(|a: &i32, b: &i32| a / 10 == b / 10);
    chain.set_auto_resetting(true);

    // The seed is still fresh even though the comparer calls 13 equal to it.
    chain.pulse_with(13).unwrap();
    chain.pulse_with(19).unwrap();
    assert_eq!(seen(&log), vec![(13, true), (19, false)]);
    assert_eq!(chain.state(), State::Unstarted);

    let named = InputChain::with_config(
        recording_stages(Log::default(), 1),
        Config::default().with_name("buckets"),
    )
    .with_comparer(|a, b| a == b);
    assert_eq!(named.name(), "buckets");
}

#[test]
fn seeded_input_is_fresh_on_first_pulse() {
    let log = Log::default();
    let mut chain = InputChain::with_input(7, recording_stages(log.clone(), 2));
    assert!(chain.has_changed());

    chain.pulse().unwrap();
    chain.pulse().unwrap();

    assert_eq!(seen(&log), vec![(7, true), (7, false)]);
}

#[test]
fn script_writes_are_seen_within_the_pulse() {
    let log = Log::default();
    let l = log.clone();
    let mut chain = InputChain::new(InputScript::<i32>::new(move |scope| {
        let next = *scope.input() + 1;
        scope.set_input(next);
        Ok(Step::then(recording_stages(l.clone(), 1)))
    }));

    assert_eq!(chain.pulse_with(1).unwrap(), State::Completed);

    assert_eq!(seen(&log), vec![(2, true)]);
    assert_eq!(*chain.current(), 2);
    assert!(!chain.has_changed());
}

#[test]
fn completion_keeps_the_last_input() {
    let mut chain = InputChain::new(InputScript::<i32>::new(|scope| {
        if *scope.input() >= 1 {
            return Ok(Step::complete_ignoring_reset());
        }
        Ok(Step::next(InputScript::<i32>::new(|scope| {
            *scope.input_mut() += 1;
            Ok(Step::complete())
        })))
    }));

    assert_eq!(chain.pulse_to_completion().unwrap(), State::Completed);
    assert_eq!(*chain.current(), 1);
}

#[test]
fn auto_reset_drops_the_input() {
    let mut chain = InputChain::new(InputScript::<i32>::new(|_| Ok(Step::complete())));
    chain.set_auto_resetting(true);

    assert_eq!(chain.pulse_with(9).unwrap(), State::Unstarted);
    assert_eq!(*chain.current(), 0);
    assert!(!chain.completed());
}

#[test]
fn reset_drops_the_input() {
    let mut chain = InputChain::new(InputScript::<i32>::new(|_| Ok(Step::repeat())));
    chain.pulse_with(5).unwrap();
    chain.set_current(6);
    assert!(chain.has_changed());

    chain.reset();

    assert_eq!(chain.state(), State::Unstarted);
    assert_eq!(*chain.current(), 0);
    assert!(!chain.has_changed());
}

#[test]
fn works_with_owned_inputs() {
    let mut chain = InputChain::new(InputScript::<String>::new(|scope| {
        if scope.input().ends_with('!') {
            return Ok(Step::complete());
        }
        scope.input_mut().push('.');
        Ok(Step::repeat())
    }));

    chain.pulse_with("hi".to_string()).unwrap();
    assert_eq!(chain.current(), "hi.");
    chain.pulse_with("bye!".to_string()).unwrap();
    assert!(chain.completed());
}

#[test]
fn hooks_are_reachable_through_the_input_chain() {
    let pulses = Arc::new(Mutex::new(Vec::new()));
    let p = pulses.clone();
    let mut chain = InputChain::new(recording_stages(Log::default(), 2));
    chain.on_pulse(move |state| p.lock().unwrap().push(state));

    chain.pulse_with(1).unwrap();
    chain.pulse_with(2).unwrap();
    chain.pulse_with(3).unwrap();

    assert_eq!(
        *pulses.lock().unwrap(),
        vec![State::Unstarted, State::Running, State::Completed]
    );
}

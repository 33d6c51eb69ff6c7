#![cfg(feature = "driver")]

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use stepchain::{
    Chain, InputChain, InputScript, Script, State, Step,
    driver::{drive, drive_inputs},
};
use tokio::time::Instant;

fn three_stages() -> Script {
    Script::new(|_| {
        Ok(Step::next(Script::new(|_| {
            Ok(Step::next(Script::new(|_| Ok(Step::complete()))))
        })))
    })
}

#[tokio::test(start_paused = true)]
async fn test_drive_pulses_once_per_period() {
    let mut chain = Chain::new(three_stages());
    let start = Instant::now();

    let state = drive(&mut chain, Duration::from_millis(10)).await.unwrap();

    assert_eq!(state, State::Completed);
    // First tick is immediate, two more ticks follow.
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(20), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(30), "{elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn test_drive_stops_on_cancel() {
    let mut chain = Chain::new(Script::new(|_| Ok(Step::repeat())));
    let token = chain.cancel_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(35)).await;
        token.cancel();
    });

    let state = drive(&mut chain, Duration::from_millis(10)).await.unwrap();

    assert_eq!(state, State::Cancelled);
    assert!(!chain.completed());
}

#[tokio::test(start_paused = true)]
async fn test_drive_returns_fault() {
    let mut chain = Chain::new(Script::new(|_| Ok(Step::back(1))));

    let result = drive(&mut chain, Duration::from_millis(10)).await;

    assert!(result.is_err());
    assert_eq!(chain.state(), State::Faulty);
}

#[tokio::test(start_paused = true)]
async fn test_drive_inputs_feeds_one_value_per_tick() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = seen.clone();
    let mut chain = InputChain::new(InputScript::<u32>::new(move |scope| {
        let mut seen = s.lock().unwrap();
        seen.push(*scope.input());
        if seen.len() == 3 {
            return Ok(Step::complete());
        }
        Ok(Step::repeat())
    }));

    let state = drive_inputs(&mut chain, [4, 5, 6, 7], Duration::from_millis(5))
        .await
        .unwrap();

    assert_eq!(state, State::Completed);
    assert_eq!(*seen.lock().unwrap(), vec![4, 5, 6]);
}

#[tokio::test(start_paused = true)]
async fn test_drive_inputs_falls_back_to_plain_pulses() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = seen.clone();
    let mut chain = InputChain::new(InputScript::<u32>::new(move |scope| {
        let mut seen = s.lock().unwrap();
        seen.push((*scope.input(), scope.has_changed()));
        if seen.len() == 3 {
            return Ok(Step::complete());
        }
        Ok(Step::repeat())
    }));

    drive_inputs(&mut chain, [1], Duration::from_millis(5))
        .await
        .unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![(1, true), (1, false), (1, false)]
    );
}

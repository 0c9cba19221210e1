//! Integration tests for the per-table session controllers.

use std::sync::Arc;
use std::time::Duration;

use freedive_core::controller::{MIN_ROUNDS, ONE_BREATH_MAX_ROUNDS};
use freedive_core::{
    Co2Controller, Co2Params, Config, O2Controller, OneBreathController, OneBreathParams,
    Parameter, SessionPhase, Speaker, TableKind, TableParams, TranscriptSpeaker,
};
use tokio::runtime::Handle;

async fn wait_until_idle<P: TableParams>(controller: &freedive_core::SessionController<P>) {
    let mut rx = controller.subscribe();
    tokio::time::timeout(Duration::from_secs(24 * 3600), rx.wait_for(|s| !s.is_running))
        .await
        .expect("session did not finish")
        .expect("controller dropped");
}

#[tokio::test]
async fn controllers_start_with_eight_default_rounds() {
    let co2 = Co2Controller::new(Handle::current());
    let o2 = O2Controller::new(Handle::current());
    let one = OneBreathController::new(Handle::current());

    assert_eq!(co2.round_count(), 8);
    assert_eq!(co2.rounds()[0].recovery_ms, 120_000);
    assert_eq!(co2.params(), Co2Params::default());
    assert_eq!(o2.rounds().last().unwrap().hold_ms, 180_000);
    assert_eq!(one.rounds()[0].recovery_ms, 6_000);
    assert_eq!(co2.kind(), TableKind::Co2);
    assert!(!co2.is_running());
    assert!(co2.latest_snapshot().is_none());
}

#[tokio::test]
async fn parameter_changes_regenerate_rounds() {
    let mut o2 = O2Controller::new(Handle::current());
    assert!(o2.set_parameter(Parameter::TargetHold, 120_000));
    assert!(o2.rounds().iter().all(|r| r.hold_ms <= 120_000));
    assert_eq!(o2.rounds().last().unwrap().hold_ms, 120_000);
    assert_eq!(o2.round_count(), 8);

    assert!(o2.adjust_parameter(Parameter::Recovery, -15_000));
    assert_eq!(o2.parameter(Parameter::Recovery), Some(105_000));
    assert!(o2.rounds().iter().all(|r| r.recovery_ms == 105_000));
}

#[tokio::test]
async fn values_are_clamped_to_bounds() {
    let mut co2 = Co2Controller::new(Handle::current());
    co2.set_parameter(Parameter::Hold, 5_000);
    assert_eq!(co2.parameter(Parameter::Hold), Some(15_000));
    assert!(co2.rounds().iter().all(|r| r.hold_ms == 15_000));

    co2.adjust_parameter(Parameter::MinRecovery, 120_000);
    assert_eq!(co2.parameter(Parameter::MinRecovery), Some(60_000));

    let mut one = OneBreathController::new(Handle::current());
    one.set_parameter(Parameter::OneBreath, 30_000);
    assert_eq!(one.params().one_breath_ms, 10_000);
}

#[tokio::test]
async fn foreign_parameter_is_a_silent_noop() {
    let mut co2 = Co2Controller::new(Handle::current());
    let before = co2.state();
    assert!(!co2.set_parameter(Parameter::TargetHold, 200_000));
    assert_eq!(co2.state(), before);
}

#[tokio::test]
async fn remove_round_stops_at_six() {
    let mut co2 = Co2Controller::new(Handle::current());
    assert!(co2.remove_round(3));
    assert!(co2.remove_round(0));
    assert_eq!(co2.round_count(), MIN_ROUNDS);
    assert_eq!(co2.rounds()[0].recovery_ms, 90_000);

    let before = co2.state();
    assert!(!co2.remove_round(0));
    assert_eq!(co2.state(), before);
}

#[tokio::test]
async fn remove_round_ignores_index() {
    let mut a = O2Controller::new(Handle::current());
    let mut b = O2Controller::new(Handle::current());
    a.remove_round(0);
    b.remove_round(7);
    assert_eq!(a.rounds(), b.rounds());
}

#[tokio::test]
async fn one_breath_add_round_stops_at_twelve() {
    let mut one = OneBreathController::new(Handle::current());
    while one.round_count() < ONE_BREATH_MAX_ROUNDS {
        assert!(one.add_round());
    }
    let before = one.state();
    assert!(!one.add_round());
    assert_eq!(one.state(), before);
}

#[tokio::test]
async fn co2_add_round_has_no_ceiling() {
    let mut co2 = Co2Controller::new(Handle::current());
    for _ in 0..10 {
        assert!(co2.add_round());
    }
    assert_eq!(co2.round_count(), 18);
    assert_eq!(co2.rounds()[0].recovery_ms, 18 * 15_000);
}

#[tokio::test(start_paused = true)]
async fn running_session_locks_the_table() {
    let mut co2 = Co2Controller::new(Handle::current());
    let speaker = Arc::new(TranscriptSpeaker::new());
    assert!(co2.start_session(speaker.clone()));
    let before = co2.state();

    assert!(!co2.set_parameter(Parameter::Hold, 90_000));
    assert!(!co2.adjust_parameter(Parameter::Hold, 15_000));
    assert!(!co2.add_round());
    assert!(!co2.remove_round(0));
    assert!(!co2.start_session(speaker.clone()));

    let after = co2.state();
    assert_eq!(after.params, before.params);
    assert_eq!(after.rounds, before.rounds);
    assert!(after.is_running);
}

#[tokio::test(start_paused = true)]
async fn ticks_publish_latest_snapshot() {
    let mut co2 = Co2Controller::new(Handle::current());
    let speaker = Arc::new(TranscriptSpeaker::new());
    co2.start_session(speaker.clone());
    assert!(co2.state().started_at.is_some());

    tokio::time::sleep(Duration::from_millis(1_500)).await;

    let snapshot = co2.latest_snapshot().expect("snapshot after first tick");
    assert_eq!(snapshot.remaining_ms, 119_000);
    assert_eq!(snapshot.round_index, 0);
    assert_eq!(snapshot.total_rounds, 8);
    assert_eq!(snapshot.phase, SessionPhase::Recovery);
    assert_eq!(snapshot.table_kind, TableKind::Co2);
    assert_eq!(speaker.spoken(), vec!["Breath"]);
}

#[tokio::test(start_paused = true)]
async fn completed_session_resets_and_announces() {
    let mut one = OneBreathController::with_params(
        OneBreathParams {
            hold_ms: 15_000,
            one_breath_ms: 3_000,
        },
        6,
        Handle::current(),
        Duration::from_secs(1),
    );
    let speaker = Arc::new(TranscriptSpeaker::new());
    let mut rx = one.subscribe();
    assert!(one.start_session(speaker.clone()));

    let mut ticks = 0;
    loop {
        rx.changed().await.expect("controller alive");
        let state = rx.borrow_and_update().clone();
        if state.latest_snapshot.is_some() {
            ticks += 1;
        }
        if !state.is_running {
            break;
        }
    }

    // 6 rounds x (15 s hold + 3 s breath)
    assert_eq!(ticks, 6 * 18);
    let state = one.state();
    assert!(!state.is_running);
    assert!(state.latest_snapshot.is_none());
    assert!(state.started_at.is_none());

    let spoken = speaker.spoken();
    assert_eq!(spoken.first().map(String::as_str), Some("Hold"));
    assert_eq!(spoken.last().map(String::as_str), Some("Session complete"));
    assert_eq!(spoken.iter().filter(|s| *s == "Session complete").count(), 1);
    assert_eq!(spoken.iter().filter(|s| *s == "15 seconds remain").count(), 6);
}

#[tokio::test(start_paused = true)]
async fn stop_is_idempotent_and_clears_state() {
    let mut o2 = O2Controller::new(Handle::current());
    let speaker = Arc::new(TranscriptSpeaker::new());
    o2.start_session(speaker.clone());
    tokio::time::sleep(Duration::from_millis(2_500)).await;

    assert!(o2.stop_session());
    assert!(!o2.stop_session());
    let state = o2.state();
    assert!(!state.is_running);
    assert!(state.latest_snapshot.is_none());

    let spoken = speaker.spoken().len();
    tokio::time::sleep(Duration::from_secs(600)).await;
    assert_eq!(speaker.spoken().len(), spoken);
    assert!(!speaker.spoken().contains(&"Session complete".to_string()));

    // The table is editable again.
    assert!(o2.add_round());
}

#[tokio::test(start_paused = true)]
async fn session_can_be_restarted_after_stop() {
    let mut co2 = Co2Controller::new(Handle::current());
    let first = Arc::new(TranscriptSpeaker::new());
    let second = Arc::new(TranscriptSpeaker::new());

    co2.start_session(first.clone());
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    co2.stop_session();
    let first_spoken = first.spoken().len();

    assert!(co2.start_session(second.clone()));
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    assert_eq!(first.spoken().len(), first_spoken);
    assert_eq!(second.spoken(), vec!["Breath"]);
    assert_eq!(co2.latest_snapshot().unwrap().remaining_ms, 119_000);
}

#[tokio::test(start_paused = true)]
async fn dropping_controller_cancels_session() {
    let speaker = Arc::new(TranscriptSpeaker::new());
    {
        let mut co2 = Co2Controller::new(Handle::current());
        co2.start_session(speaker.clone());
        tokio::time::sleep(Duration::from_millis(1_500)).await;
    }
    let spoken = speaker.spoken().len();
    tokio::time::sleep(Duration::from_secs(3_600)).await;
    assert_eq!(speaker.spoken().len(), spoken);
}

#[tokio::test(start_paused = true)]
async fn controllers_of_different_kinds_run_independently() {
    let mut co2 = Co2Controller::new(Handle::current());
    let mut one = OneBreathController::new(Handle::current());
    let co2_speaker = Arc::new(TranscriptSpeaker::new());
    let one_speaker = Arc::new(TranscriptSpeaker::new());

    co2.start_session(co2_speaker.clone());
    one.start_session(one_speaker.clone());
    tokio::time::sleep(Duration::from_millis(500)).await;
    co2.stop_session();

    assert!(!co2.is_running());
    assert!(one.is_running());
    assert_eq!(one_speaker.spoken(), vec!["Hold"]);
    wait_until_idle(&one).await;
    assert_eq!(
        one_speaker.spoken().last().map(String::as_str),
        Some("Session complete")
    );
}

#[tokio::test]
async fn config_builds_clamped_controllers() {
    let mut config = Config::default();
    config.set("one_breath.rounds", "20").unwrap();
    config.set("one_breath.one_breath_ms", "1000").unwrap();
    config.set("co2.rounds", "2").unwrap();
    config.set("co2.hold_ms", "90000").unwrap();

    let one = config.one_breath_controller(Handle::current());
    assert_eq!(one.round_count(), ONE_BREATH_MAX_ROUNDS);
    assert_eq!(one.params().one_breath_ms, 3_000);

    let co2 = config.co2_controller(Handle::current());
    assert_eq!(co2.round_count(), MIN_ROUNDS);
    assert!(co2.rounds().iter().all(|r| r.hold_ms == 90_000));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn blocking_speaker_does_not_stall_stop() {
    let mut co2 = Co2Controller::with_params(
        Co2Params::default(),
        MIN_ROUNDS,
        Handle::current(),
        Duration::from_millis(10),
    );
    let spoken = Arc::new(TranscriptSpeaker::new());
    let transcript = Arc::clone(&spoken);
    let speaker = move |text: &str| {
        transcript.speak(text);
        // A synchronous voice on the first cue.
        if transcript.spoken().len() == 1 {
            std::thread::sleep(Duration::from_millis(400));
        }
    };
    co2.start_session(Arc::new(speaker));
    tokio::time::sleep(Duration::from_millis(50)).await;

    let started = std::time::Instant::now();
    assert!(co2.stop_session());
    assert!(started.elapsed() < Duration::from_millis(200));
    assert!(!co2.is_running());

    // The cue already being spoken finishes; nothing follows it.
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(spoken.spoken(), vec!["Breath"]);
}

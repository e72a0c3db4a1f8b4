//! Connection and input loop tests against the mock controller
//!
//! Run with: cargo test --test routine

use std::sync::Arc;
use std::time::{Duration, Instant};

use pla_driver::{Controller, Profile, RoutineSettings};
use pla_input::{InputRuntime, Key, Modifiers, RecordingInjector, TrackerId, TrackerSet};
use pla_transport::{LightCommand, MockDiscovery, MockHandle};

const KEY_W: i32 = 17;
const KEY_D: i32 = 32;

struct Rig {
    controller: Controller,
    injector: Arc<RecordingInjector>,
    mock: MockHandle,
}

fn rig(trackers: TrackerSet) -> Rig {
    rig_with_check(trackers, Duration::from_millis(5))
}

fn rig_with_check(trackers: TrackerSet, connection_check: Duration) -> Rig {
    let discovery = MockDiscovery::new();
    let mock = discovery.handle();
    let injector = Arc::new(RecordingInjector::new());
    let runtime = Arc::new(InputRuntime::new(injector.clone()));

    let mut settings = RoutineSettings::from_profile(&Profile::default());
    settings.connection_check = connection_check;
    settings.input_update = Duration::from_millis(1);

    Rig {
        controller: Controller::new(Arc::new(discovery), runtime, trackers, settings),
        injector,
        mock,
    }
}

fn bound_primary_up() -> TrackerSet {
    let mut trackers = TrackerSet::default();
    trackers.set_binding(TrackerId::Primary(Some(0)), 0, Key::new(KEY_W, Modifiers::empty()));
    trackers
}

async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..400 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    false
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_attach_sequence() {
    let rig = rig(TrackerSet::default());
    rig.mock.set_reported_pg(3);

    let tasks = rig.controller.start();
    assert!(wait_until(|| rig.controller.handle().is_some()).await);

    let commands = rig.mock.commands();
    assert_eq!(
        commands,
        vec![
            LightCommand::LightsOn,
            LightCommand::SetColor(Profile::default().color.wire_color()),
            LightCommand::QueryPg,
        ]
    );
    assert_eq!(rig.controller.trackers().lock().primary.current(), 3);

    rig.controller.shutdown(tasks).await;
    assert_eq!(rig.mock.commands().last(), Some(&LightCommand::LightsOff));
    assert!(rig.controller.handle().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stick_presses_key_and_shutdown_drains() {
    let rig = rig(bound_primary_up());
    let tasks = rig.controller.start();
    assert!(wait_until(|| rig.controller.handle().is_some()).await);

    // Device reports up as negative
    rig.mock.set_axis(1, -30000);
    assert!(wait_until(|| rig.injector.count(KEY_W, true) == 1).await);
    assert_eq!(rig.injector.held_codes(), vec![KEY_W]);

    rig.controller.shutdown(tasks).await;
    assert!(rig.injector.held_codes().is_empty());
    assert!(rig.controller.runtime().registry().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_gate_disabled_injects_nothing() {
    let rig = rig(bound_primary_up());
    rig.controller.set_enabled(false);

    let tasks = rig.controller.start();
    assert!(wait_until(|| rig.controller.handle().is_some()).await);

    rig.mock.set_axis(1, -30000);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(rig.injector.events().is_empty());

    rig.controller.set_enabled(true);
    assert!(wait_until(|| rig.injector.count(KEY_W, true) == 1).await);

    rig.controller.shutdown(tasks).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_reenabled_gate_resumes_at_input_rate() {
    let rig = rig_with_check(bound_primary_up(), Duration::from_secs(3));
    let tasks = rig.controller.start();
    assert!(wait_until(|| rig.controller.handle().is_some()).await);

    rig.controller.set_enabled(false);
    rig.mock.set_axis(1, -30000);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(rig.injector.events().is_empty());

    let resumed = Instant::now();
    rig.controller.set_enabled(true);
    assert!(wait_until(|| rig.injector.count(KEY_W, true) == 1).await);
    assert!(resumed.elapsed() < Duration::from_secs(1));

    rig.controller.shutdown(tasks).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_edit_session_pauses_input() {
    let rig = rig(bound_primary_up());
    let tasks = rig.controller.start();
    assert!(wait_until(|| rig.controller.handle().is_some()).await);

    {
        let mut session = rig.controller.edit();
        session.settings_mut().steering.digital = true;
        session.settings_mut().steering.slots = vec![Key::unset(), Key::new(KEY_D, Modifiers::empty())];

        rig.mock.set_axis(1, -30000);
        rig.mock.set_axis(6, 25000);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rig.injector.events().is_empty());

        session.commit();
    }

    assert!(wait_until(|| rig.injector.count(KEY_D, true) == 1).await);
    assert!(wait_until(|| rig.injector.count(KEY_W, true) == 1).await);

    rig.controller.shutdown(tasks).await;
    assert!(rig.injector.held_codes().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unplug_releases_and_reattaches() {
    let rig = rig(bound_primary_up());
    let mut attached = rig.controller.subscribe();
    let tasks = rig.controller.start();

    assert!(wait_until(|| rig.controller.handle().is_some()).await);
    rig.mock.set_axis(1, -30000);
    assert!(wait_until(|| rig.injector.count(KEY_W, true) == 1).await);

    rig.mock.set_connected(false);
    assert!(wait_until(|| rig.controller.handle().is_none()).await);
    assert!(rig.injector.held_codes().is_empty());

    rig.mock.set_connected(true);
    assert!(wait_until(|| rig.controller.handle().is_some()).await);
    assert!(attached.has_changed().unwrap());
    assert!(attached.borrow_and_update().is_some());
    assert!(rig.controller.handle().unwrap().has_link());

    rig.controller.shutdown(tasks).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_attach_without_light_link() {
    let rig = rig(TrackerSet::default());
    rig.mock.set_link_available(false);

    let tasks = rig.controller.start();
    assert!(wait_until(|| rig.controller.handle().is_some()).await);
    let handle = rig.controller.handle().unwrap();
    assert!(!handle.has_link());
    assert!(rig.mock.commands().is_empty());

    rig.controller.shutdown(tasks).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_select_pg_and_color_reach_controller() {
    let rig = rig(TrackerSet::default());
    let tasks = rig.controller.start();
    assert!(wait_until(|| rig.controller.handle().is_some()).await);

    rig.controller.select_pg(5);
    assert_eq!(rig.controller.trackers().lock().primary.current(), 5);

    let red = pla_transport::Rgb::new(255, 0, 0);
    rig.controller.set_color(red);

    let commands = rig.mock.commands();
    assert!(commands.contains(&LightCommand::SetPg(5)));
    assert_eq!(commands.last(), Some(&LightCommand::SetColor(red)));

    rig.controller.shutdown(tasks).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_pg_button_switches_group() {
    let mut trackers = TrackerSet::default();
    trackers.set_binding(TrackerId::Primary(Some(2)), 0, Key::new(KEY_W, Modifiers::empty()));
    let rig = rig(trackers);
    let tasks = rig.controller.start();
    assert!(wait_until(|| rig.controller.handle().is_some()).await);

    // Buttons 3..=10 select PG 1..=8
    rig.mock.set_button(5, true);
    assert!(wait_until(|| rig.controller.trackers().lock().primary.current() == 2).await);
    rig.mock.set_button(5, false);

    rig.mock.set_axis(1, -30000);
    assert!(wait_until(|| rig.injector.count(KEY_W, true) == 1).await);

    rig.controller.shutdown(tasks).await;
}

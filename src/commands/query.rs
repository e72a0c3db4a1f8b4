//! Read-only command handlers.

use super::{parse_target, slot_name, CommandResult, ProfileFile};
use pla_input::{Bindable, JoystickTracker, TrackerId, TrackerSet, PG_COUNT};
use pla_transport::{DeviceDiscovery, EvdevDiscovery};

/// List connected controllers
pub fn devices() -> CommandResult {
    let discovery = EvdevDiscovery::new();
    let devices = discovery.list_devices()?;

    if devices.is_empty() {
        println!("No controller found");
        return Ok(());
    }

    println!("Found {} controller(s):", devices.len());
    for device in &devices {
        println!("  {device}");
    }
    Ok(())
}

/// Print bindings, thresholds and modes of one or all trackers
pub fn show(file: &ProfileFile, tracker: Option<&str>, pg: Option<usize>) -> CommandResult {
    let trackers = file.profile.trackers();

    let targets = match tracker {
        Some(tracker) => match parse_target(tracker, pg)? {
            TrackerId::Primary(None) => primary_targets(),
            target => vec![target],
        },
        None => {
            let mut all = vec![TrackerId::Left, TrackerId::Right];
            all.extend(primary_targets());
            all.push(TrackerId::Steering);
            all
        }
    };

    println!("Profile: {}", file.path.display());
    for target in targets {
        print_tracker(&trackers, target);
    }
    Ok(())
}

fn primary_targets() -> Vec<TrackerId> {
    (0..PG_COUNT).map(|pg| TrackerId::Primary(Some(pg))).collect()
}

fn print_tracker(trackers: &TrackerSet, target: TrackerId) {
    println!();
    match target {
        TrackerId::Steering => {
            let wheel = &trackers.steering;
            println!(
                "[{target}] digital={} threshold={}",
                wheel.digital(),
                wheel.threshold()
            );
            print_slots(wheel, target);
        }
        TrackerId::Left => print_joystick(&trackers.left, target),
        TrackerId::Right => print_joystick(&trackers.right, target),
        TrackerId::Primary(pg) => {
            if let Some(group) = trackers.primary.pg(pg) {
                print_joystick(group, target);
            }
        }
    }
}

fn print_joystick(stick: &JoystickTracker, target: TrackerId) {
    let thresholds = stick.thresholds();
    println!(
        "[{target}] short={} far={} sequencer={} diagonals={} sticky={}",
        thresholds.short(),
        thresholds.far(),
        stick.sequencing(),
        stick.diagonals(),
        stick.sticky()
    );
    if !thresholds.is_consistent() {
        println!("  warning: far threshold is not above the short threshold");
    }
    print_slots(stick, target);
}

fn print_slots<B: Bindable>(tracker: &B, target: TrackerId) {
    let mut any = false;
    for slot in 0..tracker.slot_count() {
        if let Some(key) = tracker.binding(slot).filter(|key| key.is_valid()) {
            println!("  {:>14} ({slot:2}): {key}", slot_name(target, slot));
            any = true;
        }
    }
    if !any {
        println!("  (nothing bound)");
    }
}

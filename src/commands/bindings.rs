//! Profile editing command handlers.

use anyhow::{bail, Context};

use super::{parse_slot, parse_target, slot_name, CommandResult, ProfileFile};
use pla_input::{Bindable, Key, TrackerId};

/// Bind a key or macro to a slot
pub fn bind(
    file: &mut ProfileFile,
    tracker: &str,
    slot: &str,
    binding: &str,
    pg: Option<usize>,
) -> CommandResult {
    let target = parse_target(tracker, pg)?;
    let slot = parse_slot(target, slot)?;
    let key: Key = binding
        .parse()
        .with_context(|| format!("invalid binding \"{binding}\""))?;

    if let Some(name) = key.macro_name() {
        if !file.profile.macros.contains_key(name) {
            eprintln!("Warning: macro \"{name}\" does not exist yet");
        }
    }

    set_binding(file, target, slot, key.clone())?;
    println!("{target} {}: {key}", slot_name(target, slot));
    file.save()
}

/// Clear a slot
pub fn unbind(file: &mut ProfileFile, tracker: &str, slot: &str, pg: Option<usize>) -> CommandResult {
    let target = parse_target(tracker, pg)?;
    let slot = parse_slot(target, slot)?;
    set_binding(file, target, slot, Key::unset())?;
    println!("{target} {}: cleared", slot_name(target, slot));
    file.save()
}

fn set_binding(file: &mut ProfileFile, target: TrackerId, slot: usize, key: Key) -> CommandResult {
    let mut trackers = file.profile.trackers();
    if !trackers.set_binding(target, slot, key) {
        bail!("{target} has no slot {slot}");
    }
    file.profile.keys = trackers.settings();
    Ok(())
}

/// Set short and far thresholds.
///
/// Values are clamped to the editable range and far is kept at least the
/// minimum gap above short.
pub fn thresholds(
    file: &mut ProfileFile,
    tracker: &str,
    short: Option<i32>,
    far: Option<i32>,
    pg: Option<usize>,
) -> CommandResult {
    let target = parse_target(tracker, pg)?;
    let mut trackers = file.profile.trackers();

    if target == TrackerId::Steering {
        if far.is_some() {
            bail!("the wheel only has a short threshold");
        }
        if let Some(short) = short {
            trackers.steering.set_short_threshold(short);
        }
        println!("{target}: threshold={}", trackers.steering.threshold());
    } else {
        let stick = trackers
            .joystick_mut(target)
            .with_context(|| format!("no tracker {target}"))?;
        let model = stick.thresholds_mut();
        match (short, far) {
            (Some(short), Some(far)) => model.set(short, far),
            (Some(short), None) => model.set_short(short),
            (None, Some(far)) => model.set_far(far),
            (None, None) => {}
        }
        println!("{target}: short={} far={}", model.short(), model.far());
    }

    file.profile.keys = trackers.settings();
    file.save()
}

/// Toggle tracker modes
pub fn mode(
    file: &mut ProfileFile,
    tracker: &str,
    sequencer: Option<bool>,
    diagonals: Option<bool>,
    sticky: Option<bool>,
    digital: Option<bool>,
    pg: Option<usize>,
) -> CommandResult {
    let target = parse_target(tracker, pg)?;

    if target == TrackerId::Steering {
        if sequencer.is_some() || diagonals.is_some() || sticky.is_some() {
            bail!("the wheel only supports --digital");
        }
        let wheel = &mut file.profile.keys.steering;
        if let Some(digital) = digital {
            wheel.digital = digital;
        }
        println!("{target}: digital={}", wheel.digital);
        return file.save();
    }

    if digital.is_some() {
        bail!("--digital only applies to the wheel");
    }

    let mut trackers = file.profile.trackers();
    let stick = trackers
        .joystick_mut(target)
        .with_context(|| format!("no tracker {target}"))?;
    if let Some(sequencer) = sequencer {
        stick.set_sequencing(sequencer);
    }
    if let Some(diagonals) = diagonals {
        stick.set_diagonals(diagonals);
    }
    if let Some(sticky) = sticky {
        stick.set_sticky(sticky);
    }
    println!(
        "{target}: sequencer={} diagonals={} sticky={}",
        stick.sequencing(),
        stick.diagonals(),
        stick.sticky()
    );

    file.profile.keys = trackers.settings();
    file.save()
}

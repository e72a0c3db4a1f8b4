//! Macro command handlers.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use evdev::{Device, InputEventKind};
use tracing::{debug, info};

use super::{CommandResult, ProfileFile};
use crate::cli::DelayMode;
use pla_input::keycode::{self, KEY_ESC};
use pla_input::{
    DelayType, InputRuntime, KeyInjector, LogInjector, MacroRecorder, Modifiers, UinputKeyboard,
};

/// Time for the desktop to pick up a new virtual keyboard
const VIRTUAL_KEYBOARD_SETTLE: Duration = Duration::from_millis(500);

fn require_macro(file: &ProfileFile, name: &str) -> CommandResult {
    if !file.profile.macros.contains_key(name) {
        bail!("no macro named \"{name}\"");
    }
    Ok(())
}

/// List macros
pub fn list(file: &ProfileFile) -> CommandResult {
    if file.profile.macros.is_empty() {
        println!("No macros");
        return Ok(());
    }
    for (name, list) in &file.profile.macros {
        println!(
            "  {name}: {} actions, {} delay",
            list.actions.len(),
            list.delay_type
        );
    }
    Ok(())
}

/// Show the actions of a macro
pub fn show(file: &ProfileFile, name: &str) -> CommandResult {
    require_macro(file, name)?;
    let list = &file.profile.macros[name];

    println!("Macro \"{name}\" ({} delay)", list.delay_type);
    if let Some(delay) = list.fixed_delay() {
        println!("Fixed delay: {}ms", delay.as_millis());
    }
    for (i, action) in list.actions.iter().enumerate() {
        println!("  {i:3}: {action}");
    }
    Ok(())
}

/// Play a macro through the virtual keyboard
pub fn fire(file: &ProfileFile, name: &str, dry_run: bool) -> CommandResult {
    require_macro(file, name)?;

    let injector: Arc<dyn KeyInjector> = if dry_run {
        Arc::new(LogInjector)
    } else {
        let keyboard = UinputKeyboard::new(pla_input::injector::VIRTUAL_KEYBOARD_NAME)?;
        std::thread::sleep(VIRTUAL_KEYBOARD_SETTLE);
        Arc::new(keyboard)
    };
    let runtime = InputRuntime::with_macros(injector, file.profile.macro_engine());

    info!("Firing macro \"{}\"", name);
    runtime.macros().fire(name, &runtime);
    runtime.drain();
    Ok(())
}

/// Rename a macro and every reference to it
pub fn rename(file: &mut ProfileFile, old: &str, new: &str) -> CommandResult {
    require_macro(file, old)?;
    if new.is_empty() {
        bail!("macro name cannot be empty");
    }

    let macros = file.profile.macro_engine();
    if !macros.rename(old, new) {
        bail!("a macro named \"{new}\" already exists");
    }
    let mut trackers = file.profile.trackers();
    trackers.rename_macro(old, new);
    file.profile.capture(&trackers, &macros);

    println!("Renamed \"{old}\" to \"{new}\"");
    file.save()
}

/// Delete a macro
pub fn delete(file: &mut ProfileFile, name: &str) -> CommandResult {
    if file.profile.macros.remove(name).is_none() {
        bail!("no macro named \"{name}\"");
    }
    println!("Deleted \"{name}\"");
    file.save()
}

/// Change the delay policy of a macro
pub fn delay(file: &mut ProfileFile, name: &str, mode: DelayMode, ms: u64) -> CommandResult {
    require_macro(file, name)?;

    let delay_type = match mode {
        DelayMode::None => DelayType::None,
        DelayMode::Fixed => DelayType::Fixed,
        DelayMode::Recorded => DelayType::Recorded,
    };

    let macros = file.profile.macro_engine();
    macros.apply_delay(name, delay_type, Duration::from_millis(ms))?;
    file.profile.macros = macros.snapshot();

    match delay_type {
        DelayType::Fixed => println!("\"{name}\": fixed {ms}ms delay"),
        other => println!("\"{name}\": {other} delay"),
    }
    file.save()
}

/// Record a macro from a keyboard until Esc is pressed
pub fn record(file: &mut ProfileFile, name: &str, device: &Path, force: bool) -> CommandResult {
    if name.is_empty() {
        bail!("macro name cannot be empty");
    }
    if file.profile.macros.contains_key(name) && !force {
        bail!("macro \"{name}\" exists (use --force to replace it)");
    }

    let mut keyboard =
        Device::open(device).with_context(|| format!("opening {}", device.display()))?;

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = interrupted.clone();
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))?;

    println!(
        "Recording from {}; press Esc to stop, Ctrl+C to abort",
        keyboard.name().unwrap_or("keyboard")
    );

    let mut recorder = MacroRecorder::new();
    let mut modifiers = Modifiers::empty();

    'capture: loop {
        for event in keyboard.fetch_events()? {
            if interrupted.load(Ordering::SeqCst) {
                println!("Aborted");
                return Ok(());
            }
            let InputEventKind::Key(key) = event.kind() else {
                continue;
            };
            let code = i32::from(key.code());
            // 2 is auto-repeat
            let pressed = match event.value() {
                0 => false,
                1 => true,
                _ => continue,
            };

            if code == KEY_ESC {
                break 'capture;
            }
            if let Some(flag) = modifier_flag(code) {
                modifiers.set(flag, pressed);
            }
            debug!("captured code={} pressed={}", code, pressed);
            recorder.record(code, modifiers, pressed);
        }
    }

    if recorder.is_empty() {
        println!("Nothing recorded");
        return Ok(());
    }

    let list = recorder.finish();
    println!("Recorded {} actions", list.actions.len());
    file.profile.macros.insert(name.to_string(), list);
    file.save()
}

fn modifier_flag(code: i32) -> Option<Modifiers> {
    match code {
        keycode::KEY_LEFTCTRL | keycode::KEY_RIGHTCTRL => Some(Modifiers::CTRL),
        keycode::KEY_LEFTSHIFT | keycode::KEY_RIGHTSHIFT => Some(Modifiers::SHIFT),
        keycode::KEY_LEFTALT | keycode::KEY_RIGHTALT => Some(Modifiers::ALT),
        keycode::KEY_LEFTMETA | keycode::KEY_RIGHTMETA => Some(Modifiers::META),
        _ => None,
    }
}

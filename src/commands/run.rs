//! Driver loop command handler.

use std::path::Path;
use std::sync::Arc;

use tokio::signal::unix::{signal, SignalKind};
use tracing::{debug, info, warn};

use super::{CommandResult, ProfileFile};
use pla_driver::{Controller, Profile, RoutineSettings};
use pla_input::injector::VIRTUAL_KEYBOARD_NAME;
use pla_input::{InputRuntime, KeyInjector, LogInjector, UinputKeyboard};
use pla_transport::EvdevDiscovery;

/// Run until Ctrl+C or SIGTERM. SIGHUP reloads bindings, macros and color
/// from the profile.
pub async fn run(file: ProfileFile, dry_run: bool, serial_port: Option<String>) -> CommandResult {
    let profile = &file.profile;

    let injector: Arc<dyn KeyInjector> = if dry_run {
        info!("Dry run: key events are logged, not injected");
        Arc::new(LogInjector)
    } else {
        let keyboard = UinputKeyboard::new(VIRTUAL_KEYBOARD_NAME)?;
        info!("Created virtual keyboard: {}", VIRTUAL_KEYBOARD_NAME);
        Arc::new(keyboard)
    };

    let runtime = Arc::new(InputRuntime::with_macros(injector, profile.macro_engine()));
    let discovery = Arc::new(EvdevDiscovery::new().with_serial_port(serial_port));
    let controller = Controller::new(
        discovery,
        runtime,
        profile.trackers(),
        RoutineSettings::from_profile(profile),
    );

    let tasks = controller.start();
    info!("Driver running. Press Ctrl+C to exit.");

    let mut hangup = signal(SignalKind::hangup())?;
    let mut terminate = signal(SignalKind::terminate())?;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = terminate.recv() => break,
            _ = hangup.recv() => reload(&controller, &file.path),
        }
    }

    info!("Shutting down");
    controller.shutdown(tasks).await;
    Ok(())
}

fn reload(controller: &Controller, path: &Path) {
    let profile = match Profile::load(path) {
        Ok(profile) => profile,
        Err(e) => {
            warn!("Reload failed, keeping current settings: {}", e);
            return;
        }
    };

    {
        let mut session = controller.edit();
        *session.settings_mut() = profile.tracker_settings();
        if session.is_modified() {
            session.commit();
            info!("Reloaded bindings from {}", path.display());
        } else {
            debug!("Bindings unchanged");
        }
    }

    let macros = controller.runtime().macros();
    for name in macros.names() {
        if !profile.macros.contains_key(&name) {
            macros.remove(&name);
        }
    }
    for (name, list) in &profile.macros {
        macros.replace(name, list.clone());
    }

    controller.set_color(profile.color.wire_color());
}

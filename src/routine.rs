//! Connection and input loops
//!
//! Two loops drive a controller:
//!
//! - The connection loop (async task) watches for the controller every
//!   `connection_check`, runs the attach sequence (lights on, color, PG
//!   query) and publishes the device handle on a `watch` channel.
//! - The input loop (blocking worker) polls the published device every
//!   `input_update` and feeds the trackers.
//!
//! An atomic gate pauses input processing while settings are edited. On
//! shutdown the input loop releases every held key before it returns.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use pla_input::{Editing, InputFrame, InputRuntime, TrackerSet, TrackerSettings};
use pla_transport::{DeviceDiscovery, DeviceInfo, InputDevice, LightLink, Rgb, TransportError};

use crate::config::Profile;
use crate::layout::ControllerLayout;

/// An attached controller: its polled device and optional light link
pub struct ControllerHandle {
    info: DeviceInfo,
    device: Mutex<Box<dyn InputDevice>>,
    link: Mutex<Option<Box<dyn LightLink>>>,
    failed: AtomicBool,
}

impl ControllerHandle {
    pub fn new(
        info: DeviceInfo,
        device: Box<dyn InputDevice>,
        link: Option<Box<dyn LightLink>>,
    ) -> Self {
        Self {
            info,
            device: Mutex::new(device),
            link: Mutex::new(link),
            failed: AtomicBool::new(false),
        }
    }

    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }

    pub fn has_link(&self) -> bool {
        self.link.lock().is_some()
    }

    /// Poll the device and map the snapshot through `layout`
    pub fn poll_frame(&self, layout: &ControllerLayout) -> Result<InputFrame, TransportError> {
        let mut device = self.device.lock();
        device.poll()?;
        Ok(layout.frame(device.as_ref()))
    }

    /// Run `f` on the light link; `Ok(None)` when there is none
    pub fn with_link<T>(
        &self,
        f: impl FnOnce(&mut dyn LightLink) -> Result<T, TransportError>,
    ) -> Result<Option<T>, TransportError> {
        match self.link.lock().as_mut() {
            Some(link) => f(link.as_mut()).map(Some),
            None => Ok(None),
        }
    }

    fn mark_failed(&self) {
        self.failed.store(true, Ordering::Release);
    }

    fn has_failed(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }
}

pub type SharedHandle = Option<Arc<ControllerHandle>>;

/// Loop cadences, light color and layout
#[derive(Debug, Clone)]
pub struct RoutineSettings {
    pub input_update: Duration,
    pub connection_check: Duration,
    /// Color bytes sent on attach
    pub color: Rgb,
    pub layout: ControllerLayout,
}

impl RoutineSettings {
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            input_update: profile.polling.input_update(),
            connection_check: profile.polling.connection_check(),
            color: profile.color.wire_color(),
            layout: profile.layout.clone(),
        }
    }
}

struct Shared {
    discovery: Arc<dyn DeviceDiscovery>,
    runtime: Arc<InputRuntime>,
    trackers: Arc<Mutex<TrackerSet>>,
    settings: Mutex<RoutineSettings>,
    gate: AtomicBool,
    running: AtomicBool,
    wake: Notify,
    handle_tx: watch::Sender<SharedHandle>,
}

impl Shared {
    fn settings(&self) -> RoutineSettings {
        self.settings.lock().clone()
    }

    fn handle(&self) -> SharedHandle {
        self.handle_tx.borrow().clone()
    }

    fn is_current(&self, handle: &Arc<ControllerHandle>) -> bool {
        self.handle_tx
            .borrow()
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, handle))
    }

    fn check_connection(&self) {
        match self.handle() {
            Some(handle) => {
                if handle.has_failed() || !self.still_listed(handle.info()) {
                    self.detach();
                }
            }
            None => self.attach(),
        }
    }

    fn still_listed(&self, info: &DeviceInfo) -> bool {
        match self.discovery.list_devices() {
            Ok(devices) => devices.iter().any(|d| d.path == info.path),
            Err(e) => {
                debug!("Listing controllers failed: {}", e);
                false
            }
        }
    }

    fn attach(&self) {
        let devices = match self.discovery.list_devices() {
            Ok(devices) => devices,
            Err(e) => {
                debug!("Listing controllers failed: {}", e);
                return;
            }
        };
        let Some(info) = devices.into_iter().next() else {
            return;
        };

        let device = match self.discovery.open_device(&info) {
            Ok(device) => device,
            Err(e) => {
                warn!("Failed to open controller {}: {}", info, e);
                return;
            }
        };

        let mut link = match self.discovery.open_link() {
            Ok(link) => Some(link),
            Err(e) => {
                warn!("Light link unavailable: {}", e);
                None
            }
        };

        if let Some(link) = link.as_mut() {
            let color = self.settings.lock().color;
            match start_lights(link.as_mut(), color) {
                Ok(pg) => {
                    debug!("Controller reports PG {}", pg);
                    self.trackers.lock().select_pg(usize::from(pg), &self.runtime);
                }
                Err(e) => warn!("Light link setup failed: {}", e),
            }
        }

        info!("Controller attached: {}", info);
        self.handle_tx
            .send_replace(Some(Arc::new(ControllerHandle::new(info, device, link))));
    }

    fn detach(&self) {
        let Some(handle) = self.handle_tx.send_replace(None) else {
            return;
        };
        if let Err(e) = handle.with_link(|link| link.lights_off()) {
            debug!("Lights off failed: {}", e);
        }
        self.trackers.lock().release_all(&self.runtime);
        info!("Controller detached: {}", handle.info());
    }

    fn stop(&self) {
        self.running.store(false, Ordering::Release);
        self.wake.notify_one();
        // Input loop may be waiting for an attach
        self.handle_tx.send_modify(|_| {});
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

fn start_lights(link: &mut dyn LightLink, color: Rgb) -> Result<u8, TransportError> {
    link.lights_on()?;
    link.set_color(color)?;
    link.query_pg()
}

async fn connection_loop(shared: Arc<Shared>) {
    debug!("Connection loop started");
    while shared.is_running() {
        let check = shared.clone();
        if let Err(e) = tokio::task::spawn_blocking(move || check.check_connection()).await {
            warn!("Connection check panicked: {}", e);
        }

        let period = shared.settings.lock().connection_check;
        tokio::select! {
            _ = tokio::time::sleep(period) => {}
            _ = shared.wake.notified() => {}
        }
    }

    let detach = shared.clone();
    if let Err(e) = tokio::task::spawn_blocking(move || detach.detach()).await {
        warn!("Detach panicked: {}", e);
    }
    debug!("Connection loop stopped");
}

fn input_loop(
    shared: Arc<Shared>,
    mut handle_rx: watch::Receiver<SharedHandle>,
    runtime: tokio::runtime::Handle,
) {
    debug!("Input loop started");
    while shared.is_running() {
        let settings = shared.settings();
        let handle = handle_rx.borrow_and_update().clone();

        let Some(handle) = handle else {
            // Wakes early on attach
            let _ = runtime.block_on(tokio::time::timeout(
                settings.connection_check,
                handle_rx.changed(),
            ));
            continue;
        };
        if !shared.gate.load(Ordering::Acquire) {
            std::thread::sleep(settings.input_update);
            continue;
        }

        match handle.poll_frame(&settings.layout) {
            Ok(frame) => {
                let mut trackers = shared.trackers.lock();
                // Gate and handle are re-checked under the lock: disable and
                // detach both release under it after publishing
                if shared.gate.load(Ordering::Acquire) && shared.is_current(&handle) {
                    trackers.feed(&frame, &shared.runtime);
                }
            }
            Err(e) => {
                warn!("Controller poll failed: {}", e);
                handle.mark_failed();
                std::thread::sleep(settings.connection_check);
                continue;
            }
        }

        std::thread::sleep(settings.input_update);
    }

    shared.trackers.lock().release_all(&shared.runtime);
    shared.runtime.drain();
    debug!("Input loop stopped");
}

/// Join handles of the running loops
pub struct RoutineTasks {
    connection: JoinHandle<()>,
    input: JoinHandle<()>,
}

/// Owns the trackers and loops for one controller
pub struct Controller {
    shared: Arc<Shared>,
}

impl Controller {
    pub fn new(
        discovery: Arc<dyn DeviceDiscovery>,
        runtime: Arc<InputRuntime>,
        trackers: TrackerSet,
        settings: RoutineSettings,
    ) -> Self {
        let (handle_tx, _) = watch::channel(None);
        Self {
            shared: Arc::new(Shared {
                discovery,
                runtime,
                trackers: Arc::new(Mutex::new(trackers)),
                settings: Mutex::new(settings),
                gate: AtomicBool::new(true),
                running: AtomicBool::new(false),
                wake: Notify::new(),
                handle_tx,
            }),
        }
    }

    /// Spawn both loops on the current tokio runtime
    pub fn start(&self) -> RoutineTasks {
        self.shared.running.store(true, Ordering::Release);

        let shared = self.shared.clone();
        let connection = tokio::spawn(connection_loop(shared));

        let shared = self.shared.clone();
        let handle_rx = self.shared.handle_tx.subscribe();
        let runtime = tokio::runtime::Handle::current();
        let input = tokio::task::spawn_blocking(move || input_loop(shared, handle_rx, runtime));

        RoutineTasks { connection, input }
    }

    /// Stop both loops and wait for them.
    ///
    /// Returns once every held key is released and the light link is closed.
    pub async fn shutdown(&self, tasks: RoutineTasks) {
        self.shared.stop();
        if let Err(e) = tasks.input.await {
            warn!("Input loop ended abnormally: {}", e);
        }
        if let Err(e) = tasks.connection.await {
            warn!("Connection loop ended abnormally: {}", e);
        }
        info!("Controller routine stopped");
    }

    pub fn runtime(&self) -> &Arc<InputRuntime> {
        &self.shared.runtime
    }

    pub fn trackers(&self) -> &Arc<Mutex<TrackerSet>> {
        &self.shared.trackers
    }

    /// Currently attached controller
    pub fn handle(&self) -> SharedHandle {
        self.shared.handle()
    }

    /// Receiver that sees every attach and detach
    pub fn subscribe(&self) -> watch::Receiver<SharedHandle> {
        self.shared.handle_tx.subscribe()
    }

    pub fn is_enabled(&self) -> bool {
        self.shared.gate.load(Ordering::Acquire)
    }

    /// Open or close the input gate. Closing releases every held key.
    pub fn set_enabled(&self, enabled: bool) {
        self.shared.gate.store(enabled, Ordering::Release);
        if !enabled {
            self.shared
                .trackers
                .lock()
                .release_all(&self.shared.runtime);
        }
        debug!("Input {}", if enabled { "enabled" } else { "disabled" });
    }

    /// Switch the primary stick to `pg` and tell the controller
    pub fn select_pg(&self, pg: usize) {
        self.shared
            .trackers
            .lock()
            .select_pg(pg, &self.shared.runtime);

        let Ok(pg) = u8::try_from(pg) else {
            return;
        };
        if let Some(handle) = self.handle() {
            if let Err(e) = handle.with_link(|link| link.select_pg(pg)) {
                warn!("Failed to send PG {}: {}", pg, e);
            }
        }
    }

    /// Change the light color now and on every later attach
    pub fn set_color(&self, color: Rgb) {
        self.shared.settings.lock().color = color;
        if let Some(handle) = self.handle() {
            if let Err(e) = handle.with_link(|link| link.set_color(color)) {
                warn!("Failed to send color: {}", e);
            }
        }
    }

    /// Begin editing tracker settings; input is paused until the session
    /// is dropped
    pub fn edit(&self) -> EditSession<'_> {
        self.set_enabled(false);
        let settings = self.shared.trackers.lock().settings();
        EditSession {
            controller: self,
            editing: Editing::new(settings),
        }
    }
}

/// Tracker settings being edited while input is paused
pub struct EditSession<'a> {
    controller: &'a Controller,
    editing: Editing<TrackerSettings>,
}

impl EditSession<'_> {
    pub fn settings(&self) -> &TrackerSettings {
        self.editing.get()
    }

    pub fn settings_mut(&mut self) -> &mut TrackerSettings {
        self.editing.get_mut()
    }

    pub fn is_modified(&self) -> bool {
        self.editing.is_modified()
    }

    /// Apply the edited settings to the live trackers
    pub fn commit(&mut self) {
        let shared = &self.controller.shared;
        shared
            .trackers
            .lock()
            .apply_settings(self.editing.get(), &shared.runtime);
        self.editing.save();
    }

    /// Discard edits since the last commit
    pub fn revert(&mut self) {
        self.editing.revert();
    }
}

impl Drop for EditSession<'_> {
    fn drop(&mut self) {
        self.controller.set_enabled(true);
    }
}

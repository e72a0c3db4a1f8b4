//! Device access for the PLA controller
//!
//! Two independent channels reach the controller:
//!
//! - The joystick interface, polled through evdev ([`InputDevice`])
//! - A USB serial light link for color and PG state ([`LightLink`])
//!
//! [`DeviceDiscovery`] finds and opens both. The [`mock`] module provides
//! in-memory versions for tests.

pub mod device;
pub mod discovery;
pub mod error;
pub mod mock;
pub mod protocol;
pub mod serial;
pub mod types;

pub use device::{normalize_axis, EvdevController, InputDevice};
pub use discovery::{DeviceDiscovery, EvdevDiscovery};
pub use error::TransportError;
pub use mock::{MockDiscovery, MockHandle};
pub use protocol::{color_bytes, LightCommand};
pub use serial::{LightLink, SerialLink};
pub use types::{DeviceInfo, Rgb, PLA_PRODUCT_ID, PLA_VENDOR_ID};

//! Discovery, polling and light link behavior of the mock controller
//!
//! Run with: cargo test -p pla-transport --test mock_devices

use pla_transport::{
    DeviceDiscovery, LightCommand, MockDiscovery, Rgb, TransportError, PLA_PRODUCT_ID,
    PLA_VENDOR_ID,
};

#[test]
fn test_discovery_follows_connection() {
    let discovery = MockDiscovery::new();
    let handle = discovery.handle();

    let devices = discovery.list_devices().unwrap();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].vid, PLA_VENDOR_ID);
    assert_eq!(devices[0].pid, PLA_PRODUCT_ID);

    handle.set_connected(false);
    assert!(discovery.list_devices().unwrap().is_empty());
    assert!(matches!(
        discovery.open_device(&devices[0]),
        Err(TransportError::DeviceNotFound(_))
    ));
}

#[test]
fn test_poll_snapshots_state() {
    let discovery = MockDiscovery::new();
    let handle = discovery.handle();
    let info = discovery.list_devices().unwrap().remove(0);
    let mut device = discovery.open_device(&info).unwrap();

    handle.set_axis(2, -12345);
    handle.set_button(4, true);
    // Nothing visible before the next poll
    assert_eq!(device.axis(2), 0);

    device.poll().unwrap();
    assert_eq!(device.axis(2), -12345);
    assert!(device.button(4));
    assert_eq!(device.axis(99), 0);
    assert!(!device.button(99));
    assert_eq!(handle.polls(), 1);

    handle.set_connected(false);
    assert!(matches!(device.poll(), Err(TransportError::Disconnected)));
    // Last values survive a failed poll
    assert_eq!(device.axis(2), -12345);
}

#[test]
fn test_light_link_commands() {
    let discovery = MockDiscovery::new();
    let handle = discovery.handle();
    handle.set_reported_pg(6);

    let mut link = discovery.open_link().unwrap();
    link.lights_on().unwrap();
    link.set_color(Rgb::new(1, 2, 3)).unwrap();
    assert_eq!(link.query_pg().unwrap(), 6);
    link.select_pg(2).unwrap();
    link.lights_off().unwrap();

    assert_eq!(
        handle.commands(),
        vec![
            LightCommand::LightsOn,
            LightCommand::SetColor(Rgb::new(1, 2, 3)),
            LightCommand::QueryPg,
            LightCommand::SetPg(2),
            LightCommand::LightsOff,
        ]
    );
}

#[test]
fn test_link_unavailable() {
    let discovery = MockDiscovery::new();
    discovery.handle().set_link_available(false);
    assert!(discovery.open_link().is_err());

    let discovery = MockDiscovery::new();
    let handle = discovery.handle();
    let mut link = discovery.open_link().unwrap();
    handle.set_connected(false);
    assert!(matches!(link.lights_on(), Err(TransportError::Disconnected)));
    assert!(handle.commands().is_empty());
}

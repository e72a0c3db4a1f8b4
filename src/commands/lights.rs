//! Light link command handlers.

use anyhow::Context;

use super::{pg_index, CommandResult, ProfileFile};
use pla_transport::{DeviceDiscovery, EvdevDiscovery, LightLink, Rgb};

fn open_link(serial_port: Option<String>) -> anyhow::Result<Box<dyn LightLink>> {
    EvdevDiscovery::new()
        .with_serial_port(serial_port)
        .open_link()
        .context("no controller light link")
}

/// Show or change the light color.
///
/// The profile is updated first; a connected controller gets the new color
/// right away.
pub fn color(
    file: &mut ProfileFile,
    color: Option<&str>,
    brightness: Option<u8>,
    enabled: Option<bool>,
    serial_port: Option<String>,
) -> CommandResult {
    let settings = &mut file.profile.color;

    if color.is_none() && brightness.is_none() && enabled.is_none() {
        println!(
            "Color: {} brightness={}% enabled={}",
            settings.rgb(),
            settings.brightness,
            settings.enabled
        );
        return Ok(());
    }

    if let Some(color) = color {
        let rgb: Rgb = color.parse().map_err(anyhow::Error::msg)?;
        settings.set_rgb(rgb);
    }
    if let Some(brightness) = brightness {
        settings.brightness = brightness.min(100);
    }
    if let Some(enabled) = enabled {
        settings.enabled = enabled;
    }

    let wire = settings.wire_color();
    println!(
        "Color: {} brightness={}% enabled={}",
        settings.rgb(),
        settings.brightness,
        settings.enabled
    );
    file.save()?;

    match open_link(serial_port) {
        Ok(mut link) => {
            link.set_color(wire)?;
            println!("Sent {wire} to {}", link.port_name());
        }
        Err(e) => eprintln!("Not sent to controller: {e:#}"),
    }
    Ok(())
}

/// Query or select the controller's PG
pub fn pg(pg: Option<usize>, serial_port: Option<String>) -> CommandResult {
    let mut link = open_link(serial_port)?;

    match pg {
        Some(pg) => {
            let index = pg_index(pg)?;
            link.select_pg(index as u8)?;
            println!("Selected PG {pg}");
        }
        None => {
            let index = link.query_pg()?;
            println!("PG {}", usize::from(index) + 1);
        }
    }
    Ok(())
}

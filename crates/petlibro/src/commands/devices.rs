//! `devices` and `device <serial>`.

use petlibro_core::Hub;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

pub fn list(hub: &Hub, global: &GlobalOpts) -> Result<(), CliError> {
    let devices = hub.devices();
    let rendered = output::render_devices(global.output, &devices)?;
    output::print_output(&rendered);
    Ok(())
}

pub fn show(hub: &Hub, serial: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let device = hub.require_device(serial)?;
    let rendered = output::render_device(global.output, &device)?;
    output::print_output(&rendered);
    Ok(())
}

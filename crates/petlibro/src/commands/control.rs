//! Feeder commands: `feed`, `feeding-plan`, `today-plans`.
//!
//! Each command refreshes the device afterwards, so the printed summary
//! reflects what the device reports, not what was requested.

use petlibro_core::Hub;

use crate::cli::Toggle;
use crate::error::CliError;
use crate::output;

pub async fn feed(hub: &Hub, serial: &str, portions: Option<u32>) -> Result<(), CliError> {
    let portions = portions.unwrap_or(hub.config().manual_feed_portions);
    if portions == 0 {
        return Err(CliError::Validation {
            field: "portions".into(),
            reason: "must be at least 1".into(),
        });
    }

    let device = hub.require_device(serial)?;
    device.manual_feed(portions).await?;

    output::print_output(&format!(
        "Dispensed {portions} portion(s): {}",
        output::summary(&device.snapshot())
    ));
    Ok(())
}

pub async fn feeding_plan(hub: &Hub, serial: &str, state: Toggle) -> Result<(), CliError> {
    let device = hub.require_device(serial)?;
    device.set_feeding_plan(state.enabled()).await?;

    output::print_output(&format!(
        "Feeding plan {}: {}",
        if state.enabled() { "enabled" } else { "disabled" },
        output::summary(&device.snapshot())
    ));
    Ok(())
}

pub async fn today_plans(hub: &Hub, serial: &str, state: Toggle) -> Result<(), CliError> {
    let device = hub.require_device(serial)?;
    device.set_feeding_plan_today_all(state.enabled()).await?;

    output::print_output(&format!(
        "Today's plans {}: {}",
        if state.enabled() { "enabled" } else { "skipped" },
        output::summary(&device.snapshot())
    ));
    Ok(())
}

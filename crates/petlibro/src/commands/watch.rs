//! `watch`: poll on the configured interval and print each device update.

use std::sync::Arc;

use chrono::Local;
use tracing::info;

use petlibro_core::{Device, DeviceEvent, Hub};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

pub async fn handle(hub: &Hub, global: &GlobalOpts) -> Result<(), CliError> {
    let interval = hub.config().poll_interval;
    if interval.is_zero() {
        return Err(CliError::Validation {
            field: "interval".into(),
            reason: "watch needs a poll interval of at least 1 second".into(),
        });
    }

    let format = global.output;
    let devices = hub.devices();
    let subscriptions: Vec<_> = devices
        .iter()
        .map(|device| {
            let weak = Arc::downgrade(device);
            device.on(DeviceEvent::Update, move || {
                if let Some(device) = weak.upgrade() {
                    print_update(&device, format);
                }
            })
        })
        .collect();

    for device in devices.iter() {
        print_update(device, format);
    }

    hub.start_polling().await;
    info!(
        devices = devices.len(),
        interval_secs = interval.as_secs(),
        "watching, press Ctrl-C to stop"
    );

    let interrupted = tokio::signal::ctrl_c().await;

    for subscription in subscriptions {
        subscription.dispose();
    }
    hub.shutdown().await;

    interrupted.map_err(CliError::from)
}

fn print_update(device: &Device, format: OutputFormat) {
    let snap = device.snapshot();
    let line = match format {
        OutputFormat::Json => match serde_json::to_string(&*snap) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(serial = device.serial(), error = %e, "could not serialize update");
                return;
            }
        },
        OutputFormat::Table => format!(
            "{} {} {}: {}",
            Local::now().format("%H:%M:%S"),
            snap.info.serial,
            snap.info.name,
            output::summary(&snap)
        ),
    };
    output::print_output(&line);
}

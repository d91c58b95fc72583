//! Output formatting: table or JSON.
//!
//! Tables use `tabled`; JSON serializes the device snapshots via serde.

use std::fmt::Write as _;
use std::io::{self, Write};

use tabled::{Table, Tabled, settings::Style};

use petlibro_core::{Device, DeviceSnapshot, FamilyState, FeederState, FountainState};

use crate::cli::OutputFormat;
use crate::error::CliError;

// ── Rows ─────────────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Serial")]
    serial: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Product")]
    product: String,
    #[tabled(rename = "Online")]
    online: String,
    #[tabled(rename = "Today")]
    today: String,
}

impl From<&DeviceSnapshot> for DeviceRow {
    fn from(snap: &DeviceSnapshot) -> Self {
        Self {
            serial: snap.info.serial.clone(),
            name: snap.info.name.clone(),
            product: snap.kind.to_string(),
            online: yes_no_unknown(snap.info.online).into(),
            today: summary(snap),
        }
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render the device list in the chosen format.
pub fn render_devices(format: OutputFormat, devices: &[std::sync::Arc<Device>]) -> Result<String, CliError> {
    let snapshots: Vec<_> = devices.iter().map(|d| d.snapshot()).collect();

    match format {
        OutputFormat::Table => {
            let rows: Vec<DeviceRow> = snapshots.iter().map(|s| DeviceRow::from(&**s)).collect();
            Ok(Table::new(rows).with(Style::rounded()).to_string())
        }
        OutputFormat::Json => {
            let data: Vec<&DeviceSnapshot> = snapshots.iter().map(|s| &**s).collect();
            Ok(serde_json::to_string_pretty(&data)?)
        }
    }
}

/// Render a single device in the chosen format.
pub fn render_device(format: OutputFormat, device: &Device) -> Result<String, CliError> {
    let snap = device.snapshot();

    match format {
        OutputFormat::Table => Ok(detail(&snap)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&*snap)?),
    }
}

/// Print the rendered output to stdout.
pub fn print_output(output: &str) {
    if output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Text helpers ─────────────────────────────────────────────────────

/// One-line description of today's activity.
pub fn summary(snap: &DeviceSnapshot) -> String {
    match snap.state {
        FamilyState::Feeder(ref f) => feeder_summary(f),
        FamilyState::Fountain(ref f) => fountain_summary(f),
    }
}

fn feeder_summary(f: &FeederState) -> String {
    let unit = f.unit.map_or_else(|| "portions".into(), |u| u.to_string());
    let mut line = format!(
        "{:.1} {unit} in {} feeds, plan {}",
        f.today_feeding_quantity,
        f.today_feeding_times,
        on_off(f.feeding_plan_enabled)
    );
    if let Some(ref rfid) = f.rfid {
        let _ = write!(
            line,
            ", door {}{}",
            if rfid.door_state { "open" } else { "closed" },
            if rfid.food_low { ", food low" } else { "" }
        );
    }
    line
}

fn fountain_summary(f: &FountainState) -> String {
    let unit = f.unit.map_or_else(|| "mL".into(), |u| u.to_string());
    match f.weight_percent {
        Some(pct) => format!("{:.0} {unit} drunk, water {pct}%", f.today_total_volume),
        None => format!("{:.0} {unit} drunk", f.today_total_volume),
    }
}

fn detail(snap: &DeviceSnapshot) -> String {
    let info = &snap.info;
    let mut out = String::new();
    let mut field = |label: &str, value: String| {
        let _ = writeln!(out, "{label:<22} {value}");
    };

    field("Serial", info.serial.clone());
    field("Name", info.name.clone());
    field("Product", format!("{} ({})", snap.kind, snap.kind.identifier()));
    field("MAC", info.mac.clone());
    field("Software", info.software_version.clone());
    field("Hardware", info.hardware_version.clone());
    field("Online", yes_no_unknown(info.online).into());
    if let Some(rssi) = info.wifi_rssi {
        field("Wi-Fi RSSI", format!("{rssi} dBm"));
    }

    match snap.state {
        FamilyState::Feeder(ref f) => {
            field("Today", feeder_summary(f));
            field("Feeding plan", on_off(f.feeding_plan_enabled).into());
            if let Some(days) = f.remaining_desiccant_days {
                field("Desiccant", format!("{days} days left"));
            }
            for plan in &f.feeding_plans_today {
                field(
                    "Plan",
                    format!("{} x{} ({})", plan.time, plan.portions, on_off(plan.enabled)),
                );
            }
            if let Some(ref rfid) = f.rfid {
                field("Eating time", format!("{}s", rfid.today_eating_time));
                field("Door blocked", yes_no(rfid.door_blocked).into());
                field("Dispenser ok", yes_no(rfid.food_dispenser_state).into());
                field(
                    "Battery",
                    format!(
                        "{}{}",
                        rfid.battery_percent.map(|p| format!("{p}% ")).unwrap_or_default(),
                        rfid.battery_state.clone().unwrap_or_default()
                    ),
                );
            }
        }
        FamilyState::Fountain(ref f) => {
            field("Today", fountain_summary(f));
            if let Some(days) = f.remaining_cleaning_days {
                field("Cleaning", format!("{days} days left"));
            }
            if let Some(days) = f.remaining_replacement_days {
                field("Filter", format!("{days} days left"));
            }
        }
    }

    out.trim_end().to_owned()
}

fn on_off(v: bool) -> &'static str {
    if v { "on" } else { "off" }
}

fn yes_no(v: bool) -> &'static str {
    if v { "yes" } else { "no" }
}

fn yes_no_unknown(v: Option<bool>) -> &'static str {
    v.map_or("-", yes_no)
}

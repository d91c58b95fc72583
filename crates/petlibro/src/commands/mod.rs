//! Command handlers, one module per command group.
//!
//! Every command logs in and discovers devices first; one-shot commands log
//! out afterwards, `watch` shuts the hub down when interrupted.

pub mod control;
pub mod devices;
pub mod watch;

use tracing::{debug, warn};

use petlibro_core::{Hub, HubState};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

pub async fn dispatch(cmd: Command, hub: &Hub, global: &GlobalOpts) -> Result<(), CliError> {
    hub.login().await?;

    let result = run(cmd, hub, global).await;

    // `watch` shuts the hub down itself.
    if hub.current_state() != HubState::LoggedOut {
        if let Err(e) = hub.logout().await {
            warn!(error = %e, "logout failed (non-fatal)");
        }
    }
    result
}

async fn run(cmd: Command, hub: &Hub, global: &GlobalOpts) -> Result<(), CliError> {
    let report = hub.load_devices().await?;
    debug!(
        added = report.added.len(),
        unsupported = report.unsupported.len(),
        "devices loaded"
    );

    match cmd {
        Command::Watch => watch::handle(hub, global).await,
        Command::Devices => devices::list(hub, global),
        Command::Device { serial } => devices::show(hub, &serial, global),
        Command::Feed { serial, portions } => control::feed(hub, &serial, portions).await,
        Command::FeedingPlan { serial, state } => {
            control::feeding_plan(hub, &serial, state).await
        }
        Command::TodayPlans { serial, state } => control::today_plans(hub, &serial, state).await,
    }
}

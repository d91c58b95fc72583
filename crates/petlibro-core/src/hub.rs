// ── Hub ──
//
// Lifecycle owner for one PETLIBRO account: authentication, device
// discovery, the background poll loop, and logout. Hosts hold a cheap
// `Hub` clone and read devices through it.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use petlibro_api::{Credentials, PetLibroClient, TransportConfig};
use secrecy::ExposeSecret;
use serde::Serialize;
use strum::Display;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::HubConfig;
use crate::device::Device;
use crate::error::CoreError;
use crate::registry;
use crate::store::KeyedCollection;

// ── HubState ─────────────────────────────────────────────────────

/// Lifecycle state observable by hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum HubState {
    Uninitialized,
    Authenticating,
    Discovering,
    Polling,
    LoggedOut,
    Failed,
}

// ── Reports ──────────────────────────────────────────────────────

/// A listed device whose product has no registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnsupportedDevice {
    pub serial: String,
    pub product: String,
}

/// Outcome of [`Hub::load_devices`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiscoveryReport {
    /// Serials seen for the first time.
    pub added: Vec<String>,
    /// Serials already known, refreshed in place.
    pub refreshed: Vec<String>,
    pub unsupported: Vec<UnsupportedDevice>,
}

/// One device whose refresh failed during [`Hub::refresh_devices`].
#[derive(Debug)]
pub struct RefreshFailure {
    pub serial: String,
    pub error: CoreError,
}

/// Outcome of [`Hub::refresh_devices`].
#[derive(Debug, Default)]
pub struct RefreshReport {
    pub refreshed: Vec<String>,
    pub failed: Vec<RefreshFailure>,
}

impl RefreshReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

// ── Hub ──────────────────────────────────────────────────────────

/// Entry point for hosts.
///
/// Cheaply cloneable via `Arc<HubInner>`. Owns the API client and the device
/// set; devices share the client through their own `Arc`.
#[derive(Clone)]
pub struct Hub {
    inner: Arc<HubInner>,
}

struct HubInner {
    config: HubConfig,
    api: Arc<PetLibroClient>,
    devices: KeyedCollection<Device>,
    state: watch::Sender<HubState>,
    last_refresh: RwLock<Option<DateTime<Utc>>>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Hub {
    /// Create a hub from configuration. Does NOT log in -- call
    /// [`connect()`](Self::connect) or [`login()`](Self::login).
    pub fn new(config: HubConfig) -> Result<Self, CoreError> {
        let base_url = config.api_url().map_err(|e| CoreError::Config {
            message: format!("Invalid API URL: {e}"),
        })?;
        let transport = TransportConfig::with_timeout(config.timeout);
        let api = PetLibroClient::with_base_url(base_url, config.region, &config.time_zone, &transport)?;

        Ok(Self::with_client(config, api))
    }

    /// Create a hub around an existing client.
    pub fn with_client(config: HubConfig, api: PetLibroClient) -> Self {
        let (state, _) = watch::channel(HubState::Uninitialized);

        Self {
            inner: Arc::new(HubInner {
                config,
                api: Arc::new(api),
                devices: KeyedCollection::new(),
                state,
                last_refresh: RwLock::new(None),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &HubConfig {
        &self.inner.config
    }

    pub fn api(&self) -> &Arc<PetLibroClient> {
        &self.inner.api
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Authenticate with the configured account.
    ///
    /// A configured session token is installed instead of logging in; the
    /// credentials are still cached so an expired token can be renewed.
    pub async fn login(&self) -> Result<(), CoreError> {
        self.set_state(HubState::Authenticating);
        let config = &self.inner.config;
        let api = &self.inner.api;

        if let Some(ref token) = config.token {
            debug!("installing stored session token");
            api.set_token(Some(token.clone()));
            if !config.email.is_empty() && !config.password.expose_secret().is_empty() {
                api.remember_credentials(Credentials {
                    email: config.email.clone(),
                    password: config.password.clone(),
                });
            }
            return Ok(());
        }

        if let Err(e) = api.login(&config.email, &config.password).await {
            self.set_state(HubState::Failed);
            return Err(e.into());
        }
        info!(email = %config.email, "logged in to PETLIBRO");
        Ok(())
    }

    /// Discover the account's devices.
    ///
    /// Known serials are refreshed in place. New serials are resolved through
    /// the product registry, refreshed once, and added. Unsupported products
    /// are logged, skipped, and listed in the report. Any failed refresh
    /// aborts discovery.
    pub async fn load_devices(&self) -> Result<DiscoveryReport, CoreError> {
        self.advance_setup(HubState::Discovering);

        let report = self.discover().await.inspect_err(|e| {
            warn!(error = %e, "device discovery failed");
            self.advance_setup(HubState::Failed);
        })?;

        self.touch_last_refresh();
        debug!(
            devices = self.inner.devices.len(),
            unsupported = report.unsupported.len(),
            "discovery complete"
        );
        Ok(report)
    }

    /// Refresh every known device concurrently.
    ///
    /// Never fails as a whole: per-device errors are logged and collected
    /// in the report, and the device stays in the set.
    pub async fn refresh_devices(&self) -> RefreshReport {
        let devices = self.inner.devices.snapshot();

        let results = join_all(devices.iter().map(|device| async move {
            (device.serial().to_owned(), device.refresh().await)
        }))
        .await;

        let mut report = RefreshReport::default();
        for (serial, result) in results {
            match result {
                Ok(()) => report.refreshed.push(serial),
                Err(error) => {
                    warn!(%serial, error = %error, transient = error.is_transient(), "unable to refresh device");
                    report.failed.push(RefreshFailure { serial, error });
                }
            }
        }

        self.touch_last_refresh();
        debug!(
            refreshed = report.refreshed.len(),
            failed = report.failed.len(),
            "refresh cycle complete"
        );
        report
    }

    /// Log in, discover devices, and start polling.
    pub async fn connect(&self) -> Result<DiscoveryReport, CoreError> {
        self.login().await?;
        let report = self.load_devices().await?;
        self.start_polling().await;
        Ok(report)
    }

    /// Spawn the background refresh loop. A zero interval disables it.
    ///
    /// A no-op once the hub has logged out.
    pub async fn start_polling(&self) {
        if self.inner.cancel.is_cancelled() {
            debug!("hub logged out, not polling");
            return;
        }
        let period = self.inner.config.poll_interval;
        let mut handles = self.inner.task_handles.lock().await;

        if handles.is_empty() && !period.is_zero() {
            let hub = self.clone();
            let cancel = self.inner.cancel.clone();
            handles.push(tokio::spawn(poll_task(hub, period, cancel)));
        }

        self.set_state(HubState::Polling);
        info!(interval_secs = period.as_secs(), "polling started");
    }

    /// End the session. The hub is terminal afterwards.
    ///
    /// The poll loop is stopped and joined before the token is invalidated,
    /// so no refresh runs against a dead session.
    pub async fn logout(&self) -> Result<(), CoreError> {
        self.stop_polling().await;

        let result = self.inner.api.logout().await;
        self.set_state(HubState::LoggedOut);
        result?;
        info!("logged out");
        Ok(())
    }

    /// Like [`logout()`](Self::logout), but a failed logout is only logged.
    pub async fn shutdown(&self) {
        if let Err(e) = self.logout().await {
            warn!(error = %e, "logout failed (non-fatal)");
        }
    }

    // ── Accessors ────────────────────────────────────────────────

    /// Look up a device by serial.
    pub fn device(&self, serial: &str) -> Option<Arc<Device>> {
        self.inner.devices.get(serial)
    }

    /// Like [`device()`](Self::device), as an error when absent.
    pub fn require_device(&self, serial: &str) -> Result<Arc<Device>, CoreError> {
        self.device(serial).ok_or_else(|| CoreError::DeviceNotFound {
            serial: serial.to_owned(),
        })
    }

    /// All devices in discovery order.
    pub fn devices(&self) -> Arc<Vec<Arc<Device>>> {
        self.inner.devices.snapshot()
    }

    /// Watch the device list.
    pub fn subscribe_devices(&self) -> watch::Receiver<Arc<Vec<Arc<Device>>>> {
        self.inner.devices.subscribe()
    }

    pub fn state(&self) -> watch::Receiver<HubState> {
        self.inner.state.subscribe()
    }

    pub fn current_state(&self) -> HubState {
        *self.inner.state.borrow()
    }

    /// When the last discovery or refresh cycle finished.
    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self
            .inner
            .last_refresh
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // ── Private helpers ──────────────────────────────────────────

    async fn stop_polling(&self) {
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
    }

    async fn discover(&self) -> Result<DiscoveryReport, CoreError> {
        let records = self.inner.api.list_devices().await?;
        let mut report = DiscoveryReport::default();

        for record in records {
            let serial = record.serial.clone();

            if let Some(device) = self.inner.devices.get(&serial) {
                device.refresh().await?;
                report.refreshed.push(serial);
                continue;
            }

            let Ok(kind) = registry::lookup(
                record.product_name.as_deref(),
                record.product_identifier.as_deref(),
            ) else {
                let product = record.product_label().to_owned();
                warn!(%serial, %product, "unsupported device found, skipping");
                report.unsupported.push(UnsupportedDevice { serial, product });
                continue;
            };

            let device = Device::new(record, kind, Arc::clone(&self.inner.api));
            device.refresh().await?;

            let (_, inserted) = self.inner.devices.insert_new(serial.clone(), device);
            if inserted {
                info!(%serial, %kind, "device added");
                report.added.push(serial);
            } else {
                report.refreshed.push(serial);
            }
        }

        Ok(report)
    }

    fn set_state(&self, state: HubState) {
        self.inner.state.send_replace(state);
    }

    /// Setup transitions never demote a polling or logged-out hub.
    fn advance_setup(&self, state: HubState) {
        self.inner.state.send_if_modified(|current| {
            if matches!(*current, HubState::Polling | HubState::LoggedOut) || *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
    }

    fn touch_last_refresh(&self) {
        *self
            .inner
            .last_refresh
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Utc::now());
    }
}

impl std::fmt::Debug for Hub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hub")
            .field("state", &self.current_state())
            .field("devices", &self.inner.devices.len())
            .finish_non_exhaustive()
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Periodically refresh every device until cancelled.
///
/// A failed cycle just waits for the next tick.
async fn poll_task(hub: Hub, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                let report = hub.refresh_devices().await;
                if !report.is_complete() {
                    warn!(failed = report.failed.len(), "periodic refresh incomplete");
                }
            }
        }
    }

    debug!("poll task stopped");
}

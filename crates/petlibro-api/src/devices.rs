// PETLIBRO device endpoints
//
// Discovery (`/device/device/list`), per-device state reads, and the three
// feeder commands. Device-scoped bodies carry the serial under both `id`
// and `deviceSn`, as the vendor app does.

use serde_json::{Value, json};
use tracing::debug;
use uuid::Uuid;

use crate::client::PetLibroClient;
use crate::error::Error;
use crate::models::{DeviceRecord, RawFields};

const LIST_PATH: &str = "/device/device/list";
const BASE_INFO_PATH: &str = "/device/device/baseInfo";
const REAL_INFO_PATH: &str = "/device/device/realInfo";
const GRAIN_STATUS_PATH: &str = "/device/data/grainStatus";
const FEEDING_PLAN_TODAY_PATH: &str = "/device/feedingPlan/todayNew";
const FEEDING_PLAN_SWITCH_PATH: &str = "/device/setting/updateFeedingPlanSwitch";
const FEEDING_PLAN_TODAY_ALL_PATH: &str = "/device/feedingPlan/enableTodayAll";
const MANUAL_FEED_PATH: &str = "/device/device/manualFeeding";

fn serial_body(serial: &str) -> Value {
    json!({ "id": serial, "deviceSn": serial })
}

impl PetLibroClient {
    /// List every device registered on the account.
    ///
    /// `POST /device/device/list`
    pub async fn list_devices(&self) -> Result<Vec<DeviceRecord>, Error> {
        debug!("listing devices");
        let devices: Option<Vec<DeviceRecord>> = self.post(LIST_PATH, &json!({})).await?;
        Ok(devices.unwrap_or_default())
    }

    /// Static device information (name, versions, unit, settings).
    ///
    /// `POST /device/device/baseInfo`
    pub async fn device_base_info(&self, serial: &str) -> Result<RawFields, Error> {
        self.post_fields(BASE_INFO_PATH, serial).await
    }

    /// Live device state (door, battery, online, Wi-Fi).
    ///
    /// `POST /device/device/realInfo`
    pub async fn device_real_info(&self, serial: &str) -> Result<RawFields, Error> {
        self.post_fields(REAL_INFO_PATH, serial).await
    }

    /// Today's dispensing totals.
    ///
    /// `POST /device/data/grainStatus`
    pub async fn device_grain_status(&self, serial: &str) -> Result<RawFields, Error> {
        self.post_fields(GRAIN_STATUS_PATH, serial).await
    }

    /// Today's feeding plan entries.
    ///
    /// `POST /device/feedingPlan/todayNew`
    pub async fn device_feeding_plan_today(&self, serial: &str) -> Result<RawFields, Error> {
        self.post_fields(FEEDING_PLAN_TODAY_PATH, serial).await
    }

    /// Enable or disable the scheduled feeding plan.
    ///
    /// `POST /device/setting/updateFeedingPlanSwitch`
    pub async fn set_feeding_plan(&self, serial: &str, enabled: bool) -> Result<(), Error> {
        debug!(serial, enabled, "setting feeding plan");
        let _: Value = self
            .post(
                FEEDING_PLAN_SWITCH_PATH,
                &json!({
                    "deviceSn": serial,
                    "enable": enabled,
                }),
            )
            .await?;
        Ok(())
    }

    /// Enable or skip every plan entry for today.
    ///
    /// `POST /device/feedingPlan/enableTodayAll`
    pub async fn set_feeding_plan_today_all(&self, serial: &str, enabled: bool) -> Result<(), Error> {
        debug!(serial, enabled, "setting today's feeding plans");
        let _: Value = self
            .post(
                FEEDING_PLAN_TODAY_ALL_PATH,
                &json!({
                    "deviceSn": serial,
                    "enable": enabled,
                }),
            )
            .await?;
        Ok(())
    }

    /// Dispense `amount` portions now.
    ///
    /// `POST /device/device/manualFeeding`. Each call carries a fresh request
    /// id so the device does not drop it as a duplicate.
    pub async fn manual_feed(&self, serial: &str, amount: u32) -> Result<(), Error> {
        let request_id = Uuid::new_v4().simple().to_string();
        debug!(serial, amount, %request_id, "manual feed");
        let _: Value = self
            .post(
                MANUAL_FEED_PATH,
                &json!({
                    "deviceSn": serial,
                    "grainNum": amount,
                    "requestId": request_id,
                }),
            )
            .await?;
        Ok(())
    }

    /// Device-scoped read returning a raw field map (`null` → empty).
    async fn post_fields(&self, path: &str, serial: &str) -> Result<RawFields, Error> {
        debug!(serial, path, "fetching device fields");
        let fields: Option<RawFields> = self.post(path, &serial_body(serial)).await?;
        Ok(fields.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_body_carries_both_keys() {
        let body = serial_body("AF0301");
        assert_eq!(body["id"], "AF0301");
        assert_eq!(body["deviceSn"], "AF0301");
    }
}

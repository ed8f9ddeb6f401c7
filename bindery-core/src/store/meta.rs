//! Metadata every store model carries next to its data fields.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Key of the last-update timestamp (milliseconds since the Unix epoch).
pub const LAST_UPDATE_TIME: &str = "_lastUpdateTime";
/// Key of the "record has never been persisted" flag.
pub const IS_NEW: &str = "_isNew";
/// Key of the "record exists in the backing system" flag.
pub const IS_EXIST: &str = "_isExist";
/// Key under which a store model may ship validation results.
pub const VALIDATION_DATA: &str = "validationData";

/// Freshness markers of a store model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModelMeta {
    #[serde(rename = "_lastUpdateTime", default)]
    pub last_update_time: u64,
    #[serde(rename = "_isNew", default)]
    pub is_new: bool,
    #[serde(rename = "_isExist", default)]
    pub is_exist: bool,
}

impl ModelMeta {
    /// Read the markers from a model. Missing fields read as defaults.
    pub fn read(model: &Value) -> Self {
        Self::deserialize(model).unwrap_or_default()
    }

    /// Write the markers onto a model object. Non-objects are left alone.
    pub fn write(&self, model: &mut Value) {
        if let Value::Object(map) = model {
            map.insert(LAST_UPDATE_TIME.to_string(), Value::from(self.last_update_time));
            map.insert(IS_NEW.to_string(), Value::Bool(self.is_new));
            map.insert(IS_EXIST.to_string(), Value::Bool(self.is_exist));
        }
    }
}

/// A wall-clock timestamp in milliseconds that never repeats or goes back.
pub fn next_update_time() -> u64 {
    static LAST: AtomicU64 = AtomicU64::new(0);

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default();

    let mut previous = LAST.load(Ordering::Relaxed);
    loop {
        let next = now.max(previous + 1);
        match LAST.compare_exchange_weak(previous, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(actual) => previous = actual,
        }
    }
}

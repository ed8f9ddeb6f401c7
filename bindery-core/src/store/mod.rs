//! Store interface
//!
//! A store owns the canonical copy of some data and fans changes out to
//! subscribers over two channels:
//!
//! - the whole-model channel, fired after bulk loads, saves or validation
//!   passes, carrying the full model and optional validation data;
//! - the field channel, fired for single-field edits, carrying the path, the
//!   new value and optional validation data for that path.
//!
//! Subscribers are keyed by [`SubscriberId`]; unsubscribing an id removes it
//! from both channels. Stores must not hold internal locks while invoking
//! callbacks, because subscribers read back from the store synchronously.

mod memory;
mod meta;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::SubscriberId;

pub use memory::MemoryStore;
pub use meta::{next_update_time, ModelMeta, IS_EXIST, IS_NEW, LAST_UPDATE_TIME, VALIDATION_DATA};

/// Delivery options attached to a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOptions {
    /// When false, subscribers refresh their data but do not re-render.
    #[serde(rename = "doUpdateUIState", default = "default_true")]
    pub do_update_ui_state: bool,
}

fn default_true() -> bool {
    true
}

impl UpdateOptions {
    /// Options for a background sync that must not trigger a render.
    pub fn silent() -> Self {
        Self {
            do_update_ui_state: false,
        }
    }
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            do_update_ui_state: true,
        }
    }
}

/// Payload of a whole-model notification.
#[derive(Debug, Clone, Copy)]
pub struct ModelUpdate<'a> {
    pub store_key: &'a str,
    pub model: &'a Value,
    pub validation: Option<&'a Value>,
    pub options: UpdateOptions,
}

/// Payload of a single-field notification.
#[derive(Debug, Clone, Copy)]
pub struct FieldUpdate<'a> {
    pub store_key: &'a str,
    pub path: &'a str,
    pub value: &'a Value,
    pub validation: Option<&'a Value>,
    pub options: UpdateOptions,
}

/// Whole-model subscriber callback.
pub type ModelCallback = Arc<dyn Fn(ModelUpdate<'_>) + Send + Sync>;

/// Single-field subscriber callback.
pub type FieldCallback = Arc<dyn Fn(FieldUpdate<'_>) + Send + Sync>;

/// A source of canonical data that UI state can bind to.
pub trait Store: Send + Sync {
    /// Key under which subscribers mirror this store.
    fn key(&self) -> &str;

    /// The current model. Implementations may hand out a shared snapshot.
    fn model(&self) -> Value;

    /// A deep copy of the current model, isolated from the store.
    fn model_clone(&self) -> Value {
        self.model()
    }

    /// The value at `path` inside the model, if present.
    fn data_by_path(&self, path: &str) -> Option<Value>;

    /// A deep copy of the value at `path`, if present.
    fn data_clone_by_path(&self, path: &str) -> Option<Value> {
        self.data_by_path(path)
    }

    /// Register `id` on the whole-model channel.
    fn subscribe(&self, id: SubscriberId, callback: ModelCallback);

    /// Register `id` on the single-field channel.
    fn subscribe_on_field_update(&self, id: SubscriberId, callback: FieldCallback);

    /// Remove `id` from both channels.
    fn unsubscribe(&self, id: SubscriberId);
}

impl fmt::Debug for dyn Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store").field("key", &self.key()).finish()
    }
}

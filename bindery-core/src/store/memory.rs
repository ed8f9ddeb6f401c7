//! In-process store.
//!
//! `MemoryStore` keeps its model behind a lock and its subscribers in
//! concurrent maps. Callbacks are collected first and invoked after every
//! lock is released, so subscribers may read back from the store while they
//! handle a notification.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use serde_json::{Map, Value};

use super::meta::{next_update_time, ModelMeta};
use super::{FieldCallback, FieldUpdate, ModelCallback, ModelUpdate, Store, UpdateOptions};
use crate::error::PathError;
use crate::path::{self, FieldPath};
use crate::state::SubscriberId;

/// A store holding a single JSON model in memory.
pub struct MemoryStore {
    key: String,
    model: RwLock<Value>,
    model_subscribers: DashMap<SubscriberId, ModelCallback>,
    field_subscribers: DashMap<SubscriberId, FieldCallback>,
}

impl MemoryStore {
    /// A store for a record that already exists in the backing system.
    pub fn new(key: impl Into<String>, model: Value) -> Self {
        Self::with_meta(key, model, false, true)
    }

    /// A store for a record that has not been persisted yet.
    pub fn empty(key: impl Into<String>) -> Self {
        Self::with_meta(key, Value::Object(Map::new()), true, false)
    }

    fn with_meta(key: impl Into<String>, mut model: Value, is_new: bool, is_exist: bool) -> Self {
        ModelMeta {
            last_update_time: next_update_time(),
            is_new,
            is_exist,
        }
        .write(&mut model);

        Self {
            key: key.into(),
            model: RwLock::new(model),
            model_subscribers: DashMap::new(),
            field_subscribers: DashMap::new(),
        }
    }

    /// Replace the model and notify whole-model subscribers.
    pub fn set_model(&self, model: Value) {
        self.set_model_with(model, UpdateOptions::default());
    }

    /// Replace the model, keeping the existence flags, and notify with `options`.
    pub fn set_model_with(&self, mut model: Value, options: UpdateOptions) {
        {
            let mut guard = self.model.write();
            let previous = ModelMeta::read(&guard);
            ModelMeta {
                last_update_time: next_update_time(),
                ..previous
            }
            .write(&mut model);
            *guard = model;
        }
        self.notify_model(None, options);
    }

    /// Publish validation results for the whole model. Data is untouched.
    pub fn set_validation(&self, validation: Value) {
        self.touch();
        self.notify_model(Some(&validation), UpdateOptions::default());
    }

    /// Mark the record as persisted and notify whole-model subscribers.
    pub fn mark_saved(&self) {
        {
            let mut guard = self.model.write();
            ModelMeta {
                last_update_time: next_update_time(),
                is_new: false,
                is_exist: true,
            }
            .write(&mut guard);
        }
        self.notify_model(None, UpdateOptions::default());
    }

    /// Write a single field and notify field subscribers.
    pub fn set_field(&self, field_path: &str, value: Value) -> Result<(), PathError> {
        let parsed = FieldPath::parse(field_path)?;
        {
            let mut guard = self.model.write();
            path::set(&mut guard, &parsed, value.clone())?;
            bump_time(&mut guard);
        }
        self.notify_field(field_path, &value, None);
        Ok(())
    }

    /// Publish validation results for one field. Data is untouched.
    pub fn set_field_validation(&self, field_path: &str, validation: Value) -> Result<(), PathError> {
        let parsed = FieldPath::parse(field_path)?;
        let current = path::get(&self.model.read(), &parsed)
            .cloned()
            .unwrap_or(Value::Null);
        self.notify_field(field_path, &current, Some(&validation));
        Ok(())
    }

    /// Number of distinct subscriber ids across both channels.
    pub fn subscriber_count(&self) -> usize {
        let field_only = self
            .field_subscribers
            .iter()
            .filter(|entry| !self.model_subscribers.contains_key(entry.key()))
            .count();
        self.model_subscribers.len() + field_only
    }

    fn touch(&self) {
        bump_time(&mut self.model.write());
    }

    fn notify_model(&self, validation: Option<&Value>, options: UpdateOptions) {
        let callbacks: Vec<ModelCallback> = self
            .model_subscribers
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        if callbacks.is_empty() {
            return;
        }

        let model = self.model.read().clone();
        for callback in callbacks {
            callback(ModelUpdate {
                store_key: &self.key,
                model: &model,
                validation,
                options,
            });
        }
    }

    fn notify_field(&self, field_path: &str, value: &Value, validation: Option<&Value>) {
        let callbacks: Vec<FieldCallback> = self
            .field_subscribers
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        for callback in callbacks {
            callback(FieldUpdate {
                store_key: &self.key,
                path: field_path,
                value,
                validation,
                options: UpdateOptions::default(),
            });
        }
    }
}

fn bump_time(model: &mut Value) {
    let previous = ModelMeta::read(model);
    ModelMeta {
        last_update_time: next_update_time(),
        ..previous
    }
    .write(model);
}

impl Store for MemoryStore {
    fn key(&self) -> &str {
        &self.key
    }

    fn model(&self) -> Value {
        self.model.read().clone()
    }

    fn data_by_path(&self, field_path: &str) -> Option<Value> {
        let parsed = FieldPath::parse(field_path).ok()?;
        path::get(&self.model.read(), &parsed).cloned()
    }

    fn subscribe(&self, id: SubscriberId, callback: ModelCallback) {
        self.model_subscribers.insert(id, callback);
    }

    fn subscribe_on_field_update(&self, id: SubscriberId, callback: FieldCallback) {
        self.field_subscribers.insert(id, callback);
    }

    fn unsubscribe(&self, id: SubscriberId) {
        self.model_subscribers.remove(&id);
        self.field_subscribers.remove(&id);
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("key", &self.key)
            .field("model", &*self.model.read())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

//! Binding parameters: one per store a UI state binds to.
//!
//! Callers describe bindings with [`PartialBindingParam`], leaving optional
//! knobs unset. [`normalize`] fills the defaults without touching its input,
//! and [`validate`] reports parameters that lack a store.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::BindingError;
use crate::store::Store;

/// Transforms a store model before it is mirrored.
pub type DataConvertFn = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Decides whether a whole-model notification is applied.
pub type ModelCondition = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Decides whether a field notification is applied, given the field value.
pub type FieldCondition = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// A binding parameter as supplied by the component.
#[derive(Clone, Default)]
pub struct PartialBindingParam {
    pub store: Option<Arc<dyn Store>>,
    pub clone_store: Option<bool>,
    pub data_convert: Option<DataConvertFn>,
    pub update_condition: Option<ModelCondition>,
    pub update_field_condition: Option<FieldCondition>,
}

impl PartialBindingParam {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store: Some(store),
            ..Self::default()
        }
    }

    /// Read from the store without asking for an isolated copy.
    pub fn clone_store(mut self, clone_store: bool) -> Self {
        self.clone_store = Some(clone_store);
        self
    }

    pub fn data_convert<F>(mut self, convert: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.data_convert = Some(Arc::new(convert));
        self
    }

    pub fn update_condition<F>(mut self, condition: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.update_condition = Some(Arc::new(condition));
        self
    }

    pub fn update_field_condition<F>(mut self, condition: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.update_field_condition = Some(Arc::new(condition));
        self
    }
}

impl fmt::Debug for PartialBindingParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartialBindingParam")
            .field("store", &self.store.as_ref().map(|store| store.key().to_string()))
            .field("clone_store", &self.clone_store)
            .field("data_convert", &self.data_convert.is_some())
            .field("update_condition", &self.update_condition.is_some())
            .field("update_field_condition", &self.update_field_condition.is_some())
            .finish()
    }
}

/// A binding parameter with every optional knob resolved.
#[derive(Clone)]
pub struct BindingParam {
    pub store: Option<Arc<dyn Store>>,
    pub clone_store: bool,
    pub data_convert: DataConvertFn,
    pub update_condition: ModelCondition,
    pub update_field_condition: FieldCondition,
}

impl BindingParam {
    pub fn store_key(&self) -> Option<&str> {
        self.store.as_deref().map(|store| store.key())
    }

    pub(crate) fn into_binding(self) -> Option<Binding> {
        let store = self.store?;
        Some(Binding {
            key: store.key().to_string(),
            store,
            clone_store: self.clone_store,
            data_convert: self.data_convert,
            update_condition: self.update_condition,
            update_field_condition: self.update_field_condition,
        })
    }
}

impl fmt::Debug for BindingParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingParam")
            .field("store", &self.store_key())
            .field("clone_store", &self.clone_store)
            .finish_non_exhaustive()
    }
}

/// Fill every optional field: clone on read, identity conversion and
/// always-true conditions. The input is left untouched.
pub fn normalize(params: &[PartialBindingParam]) -> Vec<BindingParam> {
    params
        .iter()
        .map(|param| BindingParam {
            store: param.store.clone(),
            clone_store: param.clone_store.unwrap_or(true),
            data_convert: param.data_convert.clone().unwrap_or_else(identity),
            update_condition: param.update_condition.clone().unwrap_or_else(always),
            update_field_condition: param.update_field_condition.clone().unwrap_or_else(always),
        })
        .collect()
}

fn identity() -> DataConvertFn {
    Arc::new(|data: Value| data)
}

fn always() -> ModelCondition {
    Arc::new(|_: &Value| true)
}

/// Report every parameter without a store. Returns whether all are valid.
pub fn validate(component: &str, params: &[BindingParam]) -> bool {
    let mut valid = true;
    for (index, param) in params.iter().enumerate() {
        if param.store.is_none() {
            let err = BindingError::MissingStore {
                component: component.to_string(),
                index,
            };
            tracing::error!(component, index, "{err}");
            valid = false;
        }
    }
    valid
}

/// A validated binding to one store.
#[derive(Clone)]
pub(crate) struct Binding {
    pub key: String,
    pub store: Arc<dyn Store>,
    pub clone_store: bool,
    pub data_convert: DataConvertFn,
    pub update_condition: ModelCondition,
    pub update_field_condition: FieldCondition,
}

impl Binding {
    /// A fresh read of the whole store model, converted for mirroring.
    pub fn read_model(&self) -> Value {
        let model = if self.clone_store {
            self.store.model_clone()
        } else {
            self.store.model()
        };
        (self.data_convert)(model)
    }

    /// A fresh read of one value from the store.
    pub fn read_path(&self, path: &str) -> Option<Value> {
        if self.clone_store {
            self.store.data_clone_by_path(path)
        } else {
            self.store.data_by_path(path)
        }
    }
}

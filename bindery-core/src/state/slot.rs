//! Mirrored store slots.
//!
//! A slot is the state's private working copy of one store's model. Data
//! and validation results live side by side but never inside each other:
//! writing a field can only ever clear the validation entry at that path.
//!
//! An empty validation tree is always stored as `None`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::PathError;
use crate::path::{self, FieldPath};
use crate::store::{ModelMeta, LAST_UPDATE_TIME, VALIDATION_DATA};

/// Working copy of one store plus its validation tree.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MirroredSlot {
    /// Store data fields, including the freshness markers.
    pub data: Value,
    /// Validation results, shaped like `data`.
    #[serde(rename = "validationData", default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<Value>,
}

impl MirroredSlot {
    /// Build a slot from a fresh store read.
    ///
    /// A `validationData` entry shipped inside the model moves to the
    /// validation tree.
    pub fn from_store_model(mut model: Value) -> Self {
        let validation = match &mut model {
            Value::Object(map) => map.remove(VALIDATION_DATA),
            _ => None,
        };
        let mut slot = Self {
            data: model,
            validation: None,
        };
        slot.replace_validation(validation);
        slot
    }

    /// Freshness markers of the mirrored model.
    pub fn meta(&self) -> ModelMeta {
        ModelMeta::read(&self.data)
    }

    pub fn get(&self, path: &FieldPath) -> Option<&Value> {
        path::get(&self.data, path)
    }

    pub fn has(&self, path: &FieldPath) -> bool {
        path::has(&self.data, path)
    }

    /// Validation result recorded at `path`, if any.
    pub fn validation_at(&self, path: &FieldPath) -> Option<&Value> {
        self.validation
            .as_ref()
            .and_then(|validation| path::get(validation, path))
    }

    /// Write a data field and drop the validation entry at that path.
    pub fn write_field(&mut self, path: &FieldPath, value: Value) -> Result<(), PathError> {
        path::set(&mut self.data, path, value)?;
        self.clear_validation_at(path);
        Ok(())
    }

    /// Delete a data field and the validation entry at that path.
    pub fn remove_field(&mut self, path: &FieldPath) {
        path::remove(&mut self.data, path);
        self.clear_validation_at(path);
    }

    /// Record validation results for one field. Data is untouched.
    ///
    /// When the validation tree cannot address `path` yet, it is reset to an
    /// empty mapping before the write.
    pub fn set_field_validation(&mut self, path: &FieldPath, validation: Value) -> Result<(), PathError> {
        let addressable = self
            .validation
            .as_ref()
            .is_some_and(|tree| path::has(tree, path));
        if !addressable {
            self.validation = Some(Value::Object(Map::new()));
        }

        let tree = self
            .validation
            .get_or_insert_with(|| Value::Object(Map::new()));
        let result = path::set(tree, path, validation);
        self.prune_validation();
        result.map(|_| ())
    }

    /// Drop the validation entry at `path`, pruning the tree when it empties.
    pub fn clear_validation_at(&mut self, path: &FieldPath) {
        if path.is_empty() {
            self.validation = None;
            return;
        }
        if let Some(tree) = self.validation.as_mut() {
            path::remove_and_prune(tree, path);
        }
        self.prune_validation();
    }

    /// Replace the whole validation tree.
    pub fn replace_validation(&mut self, validation: Option<Value>) {
        self.validation = validation;
        self.prune_validation();
    }

    pub fn clear_validation(&mut self) {
        self.validation = None;
    }

    /// Copy `_lastUpdateTime` from a fresh store read.
    pub fn refresh_timestamp(&mut self, fresh: &Value) {
        let Some(time) = fresh.get(LAST_UPDATE_TIME) else {
            return;
        };
        if let Value::Object(map) = &mut self.data {
            map.insert(LAST_UPDATE_TIME.to_string(), time.clone());
        }
    }

    fn prune_validation(&mut self) {
        if path::is_empty_mapping(self.validation.as_ref()) {
            self.validation = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn p(path: &str) -> FieldPath {
        FieldPath::parse(path).unwrap()
    }

    #[test]
    fn store_model_validation_moves_to_tree() {
        let slot = MirroredSlot::from_store_model(json!({
            "email": "a@",
            "validationData": {"email": {"format": false}}
        }));
        assert_eq!(slot.data, json!({"email": "a@"}));
        assert_eq!(slot.validation, Some(json!({"email": {"format": false}})));

        let slot = MirroredSlot::from_store_model(json!({"validationData": {}}));
        assert_eq!(slot.validation, None);
    }

    #[test]
    fn write_field_clears_validation_at_path() {
        let mut slot = MirroredSlot::from_store_model(json!({"age": 30}));
        slot.replace_validation(Some(json!({"age": {"min": false}, "name": {"required": true}})));

        slot.write_field(&p("age"), json!(31)).unwrap();

        assert_eq!(slot.get(&p("age")), Some(&json!(31)));
        assert!(slot.validation_at(&p("age")).is_none());
        assert_eq!(slot.validation, Some(json!({"name": {"required": true}})));
    }

    #[test]
    fn clearing_last_validation_entry_prunes_tree() {
        let mut slot = MirroredSlot::from_store_model(json!({"age": 30}));
        slot.replace_validation(Some(json!({"age": {"min": false}})));

        slot.write_field(&p("age"), json!(40)).unwrap();
        assert_eq!(slot.validation, None);
    }

    #[test]
    fn field_validation_leaves_data_alone() {
        let mut slot = MirroredSlot::from_store_model(json!({"name": "Ann"}));
        slot.set_field_validation(&p("email"), json!({"required": true}))
            .unwrap();

        assert_eq!(slot.data, json!({"name": "Ann"}));
        assert_eq!(
            slot.validation_at(&p("email.required")),
            Some(&json!(true))
        );
    }

    #[test]
    fn field_validation_resets_tree_when_path_not_addressable() {
        let mut slot = MirroredSlot::default();
        slot.replace_validation(Some(json!({"name": {"required": true}})));

        slot.set_field_validation(&p("email"), json!({"format": false}))
            .unwrap();
        assert_eq!(slot.validation, Some(json!({"email": {"format": false}})));

        slot.set_field_validation(&p("email"), json!({"format": true}))
            .unwrap();
        assert_eq!(slot.validation, Some(json!({"email": {"format": true}})));
    }

    #[test]
    fn empty_replacement_is_none() {
        let mut slot = MirroredSlot::default();
        slot.replace_validation(Some(json!({})));
        assert_eq!(slot.validation, None);
        slot.replace_validation(Some(Value::Null));
        assert_eq!(slot.validation, None);
    }

    #[test]
    fn refresh_timestamp_only_touches_marker() {
        let mut slot = MirroredSlot::from_store_model(json!({"_lastUpdateTime": 1, "age": 31}));
        slot.refresh_timestamp(&json!({"_lastUpdateTime": 9, "age": 30}));
        assert_eq!(slot.data, json!({"_lastUpdateTime": 9, "age": 31}));
        assert_eq!(slot.meta().last_update_time, 9);
    }

    #[test]
    fn remove_field_drops_data_and_validation() {
        let mut slot = MirroredSlot::from_store_model(json!({"nick": "a"}));
        slot.replace_validation(Some(json!({"nick": {"taken": true}})));
        slot.remove_field(&p("nick"));
        assert_eq!(slot.data, json!({}));
        assert_eq!(slot.validation, None);
    }

    #[test]
    fn serializes_with_validation_key() {
        let mut slot = MirroredSlot::from_store_model(json!({"a": 1}));
        assert_eq!(serde_json::to_value(&slot).unwrap(), json!({"data": {"a": 1}}));

        slot.replace_validation(Some(json!({"a": "bad"})));
        assert_eq!(
            serde_json::to_value(&slot).unwrap(),
            json!({"data": {"a": 1}, "validationData": {"a": "bad"}})
        );
    }
}

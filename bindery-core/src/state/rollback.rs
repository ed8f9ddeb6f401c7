//! Rollback operations.
//!
//! Three granularities are supported: the component's own model, whole
//! mirrored stores, and a single field of one store. Every operation issues
//! at most one render, however many stores it touches.

use super::engine::UiState;
use super::render::{RenderScope, RenderTicket};
use crate::error::BindingError;
use crate::path::FieldPath;

impl UiState {
    /// Restore the component model to a copy of its construction-time value.
    pub fn cancel_model_changes(&self) -> RenderTicket {
        self.restore_model();
        self.schedule_render(RenderScope::Component)
    }

    /// Re-read the given stores and optionally drop their validation.
    ///
    /// With `validation_only` the mirrored data is kept and only the
    /// validation tree is affected. Update conditions are bypassed.
    pub fn cancel_stores_changes<I, S>(
        &self,
        store_keys: I,
        clear_validation: bool,
        validation_only: bool,
    ) -> RenderTicket
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for key in store_keys {
            self.rollback_store(key.as_ref(), clear_validation, validation_only);
        }
        self.schedule_render(RenderScope::Component)
    }

    /// Roll back the component model and every bound store.
    pub fn cancel_all_changes(&self, clear_validation: bool) -> RenderTicket {
        self.restore_model();
        for key in self.bindings.keys() {
            self.rollback_store(key, clear_validation, false);
        }
        self.schedule_render(RenderScope::Component)
    }

    /// Overwrite one mirrored field with the store's live value and drop its
    /// validation entry.
    ///
    /// A path that does not exist on the mirrored slot is logged and
    /// reported as [`BindingError::PathNotFound`]; nothing is changed. The
    /// render is requested whenever `do_update` is set.
    pub fn cancel_changes_by_path(
        &self,
        field_path: &str,
        store_key: &str,
        do_update: bool,
    ) -> Result<(), BindingError> {
        let result = self.rollback_path(store_key, field_path);
        if let Err(err) = &result {
            tracing::warn!(component = %self.component(), %err, "rollback by path skipped");
        }

        if do_update {
            self.schedule_render(RenderScope::Component);
        }
        result
    }

    fn restore_model(&self) {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.model = state.started_model.clone();
    }

    fn rollback_store(&self, store_key: &str, clear_validation: bool, validation_only: bool) {
        if let Err(err) = self.binding(store_key) {
            tracing::warn!(component = %self.component(), %err, "store rollback skipped");
            return;
        }

        if !validation_only {
            if let Err(err) = self.apply_store_model(store_key, None, true) {
                tracing::warn!(component = %self.component(), %err, "store rollback failed");
                return;
            }
        }

        if clear_validation {
            if let Some(slot) = self.state.lock().slots.get_mut(store_key) {
                slot.clear_validation();
            }
        }
    }

    fn rollback_path(&self, store_key: &str, field_path: &str) -> Result<(), BindingError> {
        let parsed = FieldPath::parse(field_path)?;
        let not_found = || BindingError::PathNotFound(FieldPath::join(store_key, field_path));

        let exists = self
            .with_slot(store_key, |slot| slot.has(&parsed))
            .unwrap_or(false);
        if !exists {
            return Err(not_found());
        }

        let live = self.binding(store_key)?.read_path(field_path);

        let mut state = self.state.lock();
        let slot = state.slots.get_mut(store_key).ok_or_else(not_found)?;
        match live {
            Some(value) => slot.write_field(&parsed, value)?,
            None => slot.remove_field(&parsed),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::{json, Value};

    use crate::state::{ManualRenderTrigger, PartialBindingParam, UiState};
    use crate::store::{MemoryStore, Store};

    fn bound(store: &Arc<MemoryStore>, trigger: &Arc<ManualRenderTrigger>) -> Arc<UiState> {
        UiState::builder("ProfileForm")
            .model(json!({"tab": "general", "dirty": false}))
            .bind(PartialBindingParam::new(store.clone()))
            .trigger(trigger.clone())
            .build()
    }

    fn edit(state: &UiState, store_key: &str, path: &str, value: Value) {
        state.on_store_field_update(crate::store::FieldUpdate {
            store_key,
            path,
            value: &value,
            validation: None,
            options: Default::default(),
        });
    }

    fn flag(state: &UiState, store_key: &str, path: &str, validation: Value) {
        state.on_store_field_update(crate::store::FieldUpdate {
            store_key,
            path,
            value: &Value::Null,
            validation: Some(&validation),
            options: Default::default(),
        });
    }

    #[test]
    fn cancel_model_changes_restores_snapshot() {
        let store = Arc::new(MemoryStore::new("user", json!({"name": "Ann"})));
        let trigger = Arc::new(ManualRenderTrigger::new());
        let state = bound(&store, &trigger);

        state.set_model_field("tab", json!("security")).unwrap();
        state.update_model(|model| model["dirty"] = json!(true));
        assert_ne!(state.model(), json!({"tab": "general", "dirty": false}));

        let before = trigger.requested();
        let _ = state.cancel_model_changes();
        assert_eq!(state.model(), json!({"tab": "general", "dirty": false}));
        assert_eq!(trigger.requested(), before + 1);
        assert_eq!(store.subscriber_count(), 1);
    }

    #[test]
    fn restored_model_is_not_aliased_with_snapshot() {
        let store = Arc::new(MemoryStore::new("user", json!({})));
        let trigger = Arc::new(ManualRenderTrigger::new());
        let state = bound(&store, &trigger);

        let _ = state.cancel_model_changes();
        state.set_model_field("tab", json!("billing")).unwrap();
        let _ = state.cancel_model_changes();
        assert_eq!(state.model()["tab"], json!("general"));
    }

    #[test]
    fn cancel_stores_changes_rereads_store_and_clears_validation() {
        let store = Arc::new(MemoryStore::new("user", json!({"age": 30})));
        let trigger = Arc::new(ManualRenderTrigger::new());
        let state = bound(&store, &trigger);

        edit(&state, "user", "age", json!(31));
        flag(&state, "user", "name", json!({"required": true}));
        assert_eq!(state.store_data("user", "age"), Some(json!(31)));
        assert!(state.validation("user").is_some());

        let before = trigger.requested();
        let _ = state.cancel_stores_changes(["user"], true, false);
        assert_eq!(state.store_data("user", "age"), Some(json!(30)));
        assert_eq!(state.validation("user"), None);
        assert_eq!(trigger.requested(), before + 1);
    }

    #[test]
    fn cancel_stores_changes_is_idempotent() {
        let store = Arc::new(MemoryStore::new("user", json!({"age": 30})));
        let trigger = Arc::new(ManualRenderTrigger::new());
        let state = bound(&store, &trigger);
        edit(&state, "user", "age", json!(31));

        let _ = state.cancel_stores_changes(["user"], true, false);
        let first = state.slot("user");
        let _ = state.cancel_stores_changes(["user"], true, false);
        assert_eq!(state.slot("user"), first);
    }

    #[test]
    fn validation_only_keeps_edits() {
        let store = Arc::new(MemoryStore::new("user", json!({"age": 30})));
        let trigger = Arc::new(ManualRenderTrigger::new());
        let state = bound(&store, &trigger);

        edit(&state, "user", "age", json!(31));
        flag(&state, "user", "age", json!({"max": false}));

        let _ = state.cancel_stores_changes(vec!["user".to_string()], true, true);
        assert_eq!(state.store_data("user", "age"), Some(json!(31)));
        assert_eq!(state.validation("user"), None);
    }

    #[test]
    fn cancel_stores_changes_can_keep_validation() {
        let store = Arc::new(MemoryStore::new("user", json!({"age": 30})));
        let trigger = Arc::new(ManualRenderTrigger::new());
        let state = bound(&store, &trigger);

        flag(&state, "user", "age", json!({"max": false}));
        let _ = state.cancel_stores_changes(["user"], false, false);
        // a full re-read replaces the slot, validation included
        assert_eq!(state.validation("user"), None);

        flag(&state, "user", "age", json!({"max": false}));
        let _ = state.cancel_stores_changes(["user"], false, true);
        assert_eq!(state.validation("user"), Some(json!({"age": {"max": false}})));
    }

    #[test]
    fn unknown_store_keys_are_skipped() {
        let store = Arc::new(MemoryStore::new("user", json!({"age": 30})));
        let trigger = Arc::new(ManualRenderTrigger::new());
        let state = bound(&store, &trigger);

        let before = trigger.requested();
        let _ = state.cancel_stores_changes(["nope", "user"], true, false);
        assert_eq!(trigger.requested(), before + 1);
        assert!(state.slot("nope").is_none());
    }

    #[test]
    fn cancel_all_changes_renders_once() {
        let user = Arc::new(MemoryStore::new("user", json!({"age": 30})));
        let prefs = Arc::new(MemoryStore::new("prefs", json!({"theme": "dark"})));
        let trigger = Arc::new(ManualRenderTrigger::new());
        let state = UiState::builder("Settings")
            .model(json!({"open": false}))
            .bind(PartialBindingParam::new(user.clone()))
            .bind(PartialBindingParam::new(prefs.clone()))
            .trigger(trigger.clone())
            .build();

        state.set_model_field("open", json!(true)).unwrap();
        edit(&state, "user", "age", json!(31));
        edit(&state, "prefs", "theme", json!("light"));
        flag(&state, "prefs", "theme", json!({"allowed": false}));
        trigger.commit_all();

        let before = trigger.requested();
        let _ = state.cancel_all_changes(true);
        assert_eq!(trigger.requested(), before + 1);
        assert_eq!(state.model(), json!({"open": false}));
        assert_eq!(state.store_data("user", "age"), Some(json!(30)));
        assert_eq!(state.store_data("prefs", "theme"), Some(json!("dark")));
        assert_eq!(state.validation("prefs"), None);
    }

    #[test]
    fn cancel_changes_by_path_rereads_live_value() {
        let store = Arc::new(MemoryStore::new("user", json!({"age": 30, "name": "Ann"})));
        let trigger = Arc::new(ManualRenderTrigger::new());
        let state = bound(&store, &trigger);

        edit(&state, "user", "age", json!(31));
        edit(&state, "user", "name", json!("Bo"));

        assert!(state.cancel_changes_by_path("age", "user", true).is_ok());
        assert_eq!(state.store_data("user", "age"), Some(json!(30)));
        assert_eq!(state.store_data("user", "name"), Some(json!("Bo")));
    }

    #[test]
    fn cancel_changes_by_path_uses_current_store_value() {
        let store = Arc::new(MemoryStore::new("user", json!({"age": 30})));
        let trigger = Arc::new(ManualRenderTrigger::new());
        let state = bound(&store, &trigger);
        state.remove_state();

        // the store moves on while this state is detached
        store.set_field("age", json!(45)).unwrap();
        assert_eq!(state.store_data("user", "age"), Some(json!(30)));

        state.cancel_changes_by_path("age", "user", false).unwrap();
        assert_eq!(state.store_data("user", "age"), Some(json!(45)));
        assert_eq!(store.data_by_path("age"), Some(json!(45)));
    }

    #[test]
    fn cancel_changes_by_path_clears_validation_at_path() {
        let store = Arc::new(MemoryStore::new("user", json!({"age": 30, "name": ""})));
        let trigger = Arc::new(ManualRenderTrigger::new());
        let state = bound(&store, &trigger);

        flag(&state, "user", "age", json!({"max": false}));
        state.cancel_changes_by_path("age", "user", true).unwrap();
        assert_eq!(state.validation("user"), None);
    }

    #[test]
    fn cancel_changes_by_missing_path_is_reported_no_op() {
        let store = Arc::new(MemoryStore::new("user", json!({"age": 30})));
        let trigger = Arc::new(ManualRenderTrigger::new());
        let state = bound(&store, &trigger);
        let before = state.slot("user");

        let err = state
            .cancel_changes_by_path("address.city", "user", false)
            .unwrap_err();
        assert_eq!(err.to_string(), "path user.address.city not found");
        assert_eq!(state.slot("user"), before);

        let requested = trigger.requested();
        assert!(state.cancel_changes_by_path("zip", "user", true).is_err());
        assert_eq!(trigger.requested(), requested + 1);
    }
}

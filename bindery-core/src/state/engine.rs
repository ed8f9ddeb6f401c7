//! The store binding engine.
//!
//! A [`UiState`] belongs to one component instance. It owns the component's
//! editable `model` with its rollback baseline, mirrors every bound store
//! into a [`MirroredSlot`], and turns store notifications into scoped render
//! requests.
//!
//! # Locking
//!
//! All mutable state sits behind one mutex. The lock is never held while
//! calling into a store, the render trigger or a caller-supplied closure, so
//! a trigger may commit synchronously, a store may deliver notifications
//! re-entrantly and closures may read the state back.

use std::fmt;
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde_json::{Map, Value};

use super::lifecycle::{Lifecycle, SubscriberId};
use super::params::{normalize, validate, Binding, PartialBindingParam};
use super::render::{ImmediateRenderTrigger, RenderScope, RenderTicket, RenderTrigger};
use super::slot::MirroredSlot;
use crate::error::{BindingError, PathError};
use crate::path::{self, FieldPath};
use crate::store::{FieldCallback, FieldUpdate, ModelCallback, ModelUpdate};

/// Mutable part of the engine.
#[derive(Debug, Default)]
pub(crate) struct EngineState {
    pub model: Value,
    pub started_model: Value,
    pub slots: IndexMap<String, MirroredSlot>,
    pub updating_store: Option<String>,
    pub updating_field_path: Option<String>,
}

/// The two subscriber callbacks, created once and handed to every store.
struct Handlers {
    on_model: ModelCallback,
    on_field: FieldCallback,
}

impl Handlers {
    fn new(me: &Weak<UiState>) -> Self {
        let weak = me.clone();
        let on_model: ModelCallback = Arc::new(move |update: ModelUpdate<'_>| {
            if let Some(state) = weak.upgrade() {
                state.on_store_update(update);
            }
        });

        let weak = me.clone();
        let on_field: FieldCallback = Arc::new(move |update: FieldUpdate<'_>| {
            if let Some(state) = weak.upgrade() {
                state.on_store_field_update(update);
            }
        });

        Self { on_model, on_field }
    }
}

/// Component state bound to zero or more stores.
///
/// Built with [`UiState::builder`] and shared as `Arc<UiState>`. Stores only
/// hold weak references, so dropping the last `Arc` tears the state down.
pub struct UiState {
    me: Weak<UiState>,
    component: String,
    lifecycle: Lifecycle,
    pub(super) bindings: IndexMap<String, Binding>,
    bound: bool,
    trigger: Arc<dyn RenderTrigger>,
    handlers: Handlers,
    pub(crate) state: Mutex<EngineState>,
}

impl UiState {
    pub fn builder(component: impl Into<String>) -> UiStateBuilder {
        UiStateBuilder::new(component)
    }

    /// Construct, validate parameters, subscribe and hydrate.
    ///
    /// If any parameter lacks a store the state is still created, but stays
    /// unbound: no subscriptions and no mirrored slots.
    pub fn new(
        component: impl Into<String>,
        model: Option<Value>,
        params: &[PartialBindingParam],
        trigger: Arc<dyn RenderTrigger>,
    ) -> Arc<Self> {
        let component = component.into();
        let params = normalize(params);
        let bound = validate(&component, &params);

        let mut bindings = IndexMap::new();
        if bound {
            for binding in params.into_iter().filter_map(|param| param.into_binding()) {
                if bindings.contains_key(&binding.key) {
                    tracing::warn!(
                        component = %component,
                        store = %binding.key,
                        "store bound twice, keeping the last binding"
                    );
                }
                bindings.insert(binding.key.clone(), binding);
            }
        }

        let model = model.unwrap_or_else(|| Value::Object(Map::new()));
        let started_model = model.clone();

        let state = Arc::new_cyclic(|me| Self {
            me: me.clone(),
            component,
            lifecycle: Lifecycle::new(),
            bindings,
            bound,
            trigger,
            handlers: Handlers::new(me),
            state: Mutex::new(EngineState {
                model,
                started_model,
                ..EngineState::default()
            }),
        });

        if bound {
            state.subscribe_all();
            state.hydrate_all();
        }
        state
    }

    pub fn id(&self) -> SubscriberId {
        self.lifecycle.id()
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    /// Whether parameter validation passed and stores were subscribed.
    pub fn is_bound(&self) -> bool {
        self.bound
    }

    /// Whether [`remove_state`](Self::remove_state) has run.
    pub fn is_removed(&self) -> bool {
        self.lifecycle.is_disposed()
    }

    /// Keys of the bound stores, in binding order.
    pub fn store_keys(&self) -> Vec<String> {
        self.bindings.keys().cloned().collect()
    }

    fn subscribe_all(&self) {
        let id = self.id();
        for binding in self.bindings.values() {
            binding.store.subscribe(id, Arc::clone(&self.handlers.on_model));
            binding
                .store
                .subscribe_on_field_update(id, Arc::clone(&self.handlers.on_field));

            let store = Arc::clone(&binding.store);
            self.lifecycle.on_teardown(move |id| store.unsubscribe(id));

            tracing::debug!(
                component = %self.component,
                store = %binding.key,
                subscriber = %id,
                "subscribed to store"
            );
        }
    }

    fn hydrate_all(&self) {
        for key in self.bindings.keys() {
            match self.apply_store_model(key, None, false) {
                Ok(()) => tracing::debug!(component = %self.component, store = %key, "slot hydrated"),
                Err(err) => {
                    tracing::warn!(component = %self.component, store = %key, %err, "hydration failed")
                }
            }
        }
    }

    pub(crate) fn binding(&self, store_key: &str) -> Result<&Binding, BindingError> {
        self.bindings
            .get(store_key)
            .ok_or_else(|| BindingError::UnknownStore(store_key.to_string()))
    }

    /// Refresh the mirrored slot of `store_key` from a fresh store read.
    ///
    /// A rollback, or an update without validation data, replaces the whole
    /// slot. Otherwise only the validation tree and `_lastUpdateTime` change,
    /// so in-progress edits survive a validation pass. A validation update
    /// for a slot that was never hydrated hydrates it first.
    pub(crate) fn apply_store_model(
        &self,
        store_key: &str,
        validation: Option<&Value>,
        is_rollback: bool,
    ) -> Result<(), BindingError> {
        let binding = self.binding(store_key)?;
        let fresh = binding.read_model();

        let mut guard = self.state.lock();
        let state = &mut *guard;
        match validation {
            Some(validation) if !is_rollback => match state.slots.get_mut(store_key) {
                Some(slot) => {
                    slot.replace_validation(Some(validation.clone()));
                    slot.refresh_timestamp(&fresh);
                }
                None => {
                    let mut slot = MirroredSlot::from_store_model(fresh);
                    slot.replace_validation(Some(validation.clone()));
                    state.slots.insert(store_key.to_string(), slot);
                }
            },
            _ => {
                state
                    .slots
                    .insert(store_key.to_string(), MirroredSlot::from_store_model(fresh));
            }
        }
        Ok(())
    }

    /// Whole-model notification from a bound store.
    pub fn on_store_update(&self, update: ModelUpdate<'_>) {
        if self.lifecycle.is_disposed() {
            tracing::trace!(store = %update.store_key, "update after teardown ignored");
            return;
        }
        let binding = match self.binding(update.store_key) {
            Ok(binding) => binding,
            Err(err) => {
                tracing::warn!(component = %self.component, %err, "store update dropped");
                return;
            }
        };
        if !(binding.update_condition)(update.model) {
            tracing::debug!(store = %update.store_key, "store update rejected by condition");
            return;
        }

        let validation = update.validation.filter(|validation| !validation.is_null());
        if let Err(err) = self.apply_store_model(update.store_key, validation, false) {
            tracing::warn!(component = %self.component, %err, "store update dropped");
            return;
        }

        if !update.options.do_update_ui_state {
            return;
        }
        self.schedule_render(RenderScope::Store(update.store_key.to_string()));
    }

    /// Single-field notification from a bound store.
    pub fn on_store_field_update(&self, update: FieldUpdate<'_>) {
        if self.lifecycle.is_disposed() {
            tracing::trace!(store = %update.store_key, path = %update.path, "field update after teardown ignored");
            return;
        }
        let binding = match self.binding(update.store_key) {
            Ok(binding) => binding,
            Err(err) => {
                tracing::warn!(component = %self.component, %err, "field update dropped");
                return;
            }
        };
        if !(binding.update_field_condition)(update.value) {
            tracing::debug!(
                store = %update.store_key,
                path = %update.path,
                "field update rejected by condition"
            );
            return;
        }

        if let Err(err) = self.patch_field(update) {
            tracing::warn!(
                component = %self.component,
                store = %update.store_key,
                path = %update.path,
                %err,
                "field update dropped"
            );
            return;
        }

        self.schedule_render(RenderScope::Field(FieldPath::join(
            update.store_key,
            update.path,
        )));
    }

    fn patch_field(&self, update: FieldUpdate<'_>) -> Result<(), BindingError> {
        let path = FieldPath::parse(update.path)?;
        let mut state = self.state.lock();
        let slot = state
            .slots
            .get_mut(update.store_key)
            .ok_or_else(|| BindingError::UnknownStore(update.store_key.to_string()))?;

        match update.validation.filter(|validation| !validation.is_null()) {
            Some(validation) => slot.set_field_validation(&path, validation.clone())?,
            None => slot.write_field(&path, update.value.clone())?,
        }
        Ok(())
    }

    /// Set the transient marker for `scope` and request a render.
    ///
    /// The marker is cleared when the host reports the commit. Requests are
    /// never coalesced: every call reaches the trigger.
    pub fn schedule_render(&self, scope: RenderScope) -> RenderTicket {
        {
            let mut state = self.state.lock();
            match &scope {
                RenderScope::Component => state.updating_store = None,
                RenderScope::Store(key) => {
                    state.updating_store = Some(key.clone());
                    state.updating_field_path = None;
                }
                RenderScope::Field(path) => {
                    state.updating_field_path = Some(path.clone());
                    state.updating_store = None;
                }
            }
        }

        tracing::trace!(component = %self.component, ?scope, "render requested");

        let (tx, ticket) = RenderTicket::new();
        let me = self.me.clone();
        self.trigger.request_render(Box::new(move || {
            if let Some(state) = me.upgrade() {
                state.clear_marker(&scope);
            }
            let _ = tx.send(());
        }));
        ticket
    }

    fn clear_marker(&self, scope: &RenderScope) {
        let mut state = self.state.lock();
        match scope {
            RenderScope::Component | RenderScope::Store(_) => state.updating_store = None,
            RenderScope::Field(_) => state.updating_field_path = None,
        }
    }

    /// Unsubscribe from every bound store. Later calls do nothing.
    pub fn remove_state(&self) {
        if self.lifecycle.teardown() {
            tracing::debug!(component = %self.component, subscriber = %self.id(), "state removed");
        }
    }

    /// Store currently being rendered, if a store-scoped render is pending.
    pub fn updating_store(&self) -> Option<String> {
        self.state.lock().updating_store.clone()
    }

    /// Fully qualified field path currently being rendered, if any.
    pub fn updating_field_path(&self) -> Option<String> {
        self.state.lock().updating_field_path.clone()
    }

    /// A copy of the component's own model.
    pub fn model(&self) -> Value {
        self.state.lock().model.clone()
    }

    /// Edit a copy of the component's own model and store the result.
    ///
    /// `f` runs without the state lock held. A model write made by someone
    /// else while `f` runs is overwritten.
    pub fn update_model<R>(&self, f: impl FnOnce(&mut Value) -> R) -> R {
        let mut model = self.model();
        let result = f(&mut model);
        self.state.lock().model = model;
        result
    }

    /// Write one field of the component's own model.
    pub fn set_model_field(&self, field_path: &str, value: Value) -> Result<(), PathError> {
        let parsed = FieldPath::parse(field_path)?;
        path::set(&mut self.state.lock().model, &parsed, value).map(|_| ())
    }

    /// A copy of the mirrored slot for `store_key`.
    pub fn slot(&self, store_key: &str) -> Option<MirroredSlot> {
        self.state.lock().slots.get(store_key).cloned()
    }

    /// Run `f` on a snapshot of the mirrored slot for `store_key`.
    ///
    /// `f` runs without the state lock held.
    pub fn with_slot<R>(&self, store_key: &str, f: impl FnOnce(&MirroredSlot) -> R) -> Option<R> {
        self.slot(store_key).map(|slot| f(&slot))
    }

    /// Read from the live slot under the lock. Only for crate-internal readers
    /// that never call out.
    fn read_slot<R>(&self, store_key: &str, read: impl FnOnce(&MirroredSlot) -> R) -> Option<R> {
        self.state.lock().slots.get(store_key).map(read)
    }

    /// The mirrored value at `field_path` inside `store_key`'s slot.
    pub fn store_data(&self, store_key: &str, field_path: &str) -> Option<Value> {
        let parsed = FieldPath::parse(field_path).ok()?;
        self.read_slot(store_key, |slot| slot.get(&parsed).cloned())
            .flatten()
    }

    /// The validation tree of `store_key`'s slot.
    pub fn validation(&self, store_key: &str) -> Option<Value> {
        self.read_slot(store_key, |slot| slot.validation.clone())
            .flatten()
    }

    pub fn last_store_update_time(&self, store_key: &str) -> Option<u64> {
        self.read_slot(store_key, |slot| slot.meta().last_update_time)
    }

    pub fn store_model_is_new(&self, store_key: &str) -> Option<bool> {
        self.read_slot(store_key, |slot| slot.meta().is_new)
    }

    pub fn store_model_is_exist(&self, store_key: &str) -> Option<bool> {
        self.read_slot(store_key, |slot| slot.meta().is_exist)
    }
}

impl Drop for UiState {
    fn drop(&mut self) {
        self.lifecycle.teardown();
    }
}

impl fmt::Debug for UiState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("UiState")
            .field("id", &self.id())
            .field("component", &self.component)
            .field("bound", &self.bound)
            .field("stores", &self.bindings.keys().collect::<Vec<_>>())
            .field("updating_store", &state.updating_store)
            .field("updating_field_path", &state.updating_field_path)
            .finish()
    }
}

/// Assembles a [`UiState`].
#[derive(Debug)]
pub struct UiStateBuilder {
    component: String,
    model: Option<Value>,
    params: Vec<PartialBindingParam>,
    trigger: Option<Arc<dyn RenderTrigger>>,
}

impl UiStateBuilder {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            model: None,
            params: Vec::new(),
            trigger: None,
        }
    }

    /// Initial component model; also the rollback baseline.
    pub fn model(mut self, model: Value) -> Self {
        self.model = Some(model);
        self
    }

    pub fn bind(mut self, param: PartialBindingParam) -> Self {
        self.params.push(param);
        self
    }

    pub fn bind_all(mut self, params: impl IntoIterator<Item = PartialBindingParam>) -> Self {
        self.params.extend(params);
        self
    }

    /// Render trigger of the host component. Defaults to
    /// [`ImmediateRenderTrigger`].
    pub fn trigger(mut self, trigger: Arc<dyn RenderTrigger>) -> Self {
        self.trigger = Some(trigger);
        self
    }

    pub fn build(self) -> Arc<UiState> {
        let trigger = self
            .trigger
            .unwrap_or_else(|| Arc::new(ImmediateRenderTrigger::new()));
        UiState::new(self.component, self.model, &self.params, trigger)
    }
}

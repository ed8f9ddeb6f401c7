//! UI State Binding
//!
//! This module implements the per-component state that mirrors one or more
//! stores, patches single fields as they change, and rolls edits back.
//!
//! # Concepts
//!
//! ## Bindings
//!
//! A component describes each store it reads with a [`PartialBindingParam`].
//! Parameters are normalized (clone on read, identity conversion, always-true
//! conditions) and validated once, at construction. A parameter without a
//! store leaves the state unbound rather than failing construction.
//!
//! ## Slots
//!
//! Every bound store gets a [`MirroredSlot`] keyed by the store key: the
//! state's own copy of the model plus a validation tree shaped like it.
//! Whole-model notifications replace the slot, or only its validation when
//! validation data arrives. Field notifications patch one path.
//!
//! ## Render markers
//!
//! Each applied notification asks the host to re-render through its
//! [`RenderTrigger`]. Until the host commits, `updating_store` or
//! `updating_field_path` names what caused the render, so child views can
//! skip work unrelated to the change.
//!
//! ## Rollback
//!
//! The component model is snapshotted at construction. Rollback operations
//! restore it, re-read stores wholesale, or re-read a single path.

mod engine;
mod lifecycle;
mod params;
mod render;
mod rollback;
mod slot;

pub use engine::{UiState, UiStateBuilder};
pub use lifecycle::{Lifecycle, SubscriberId};
pub use params::{
    normalize, validate, BindingParam, DataConvertFn, FieldCondition, ModelCondition,
    PartialBindingParam,
};
pub use render::{
    ImmediateRenderTrigger, ManualRenderTrigger, RenderCallback, RenderScope, RenderTicket,
    RenderTrigger,
};
pub use slot::MirroredSlot;

//! Bindery Core
//!
//! This crate binds component-local UI state to shared data stores. It
//! implements:
//!
//! - Store subscription and hydration of per-store mirrored slots
//! - Field-level patching of mirrored data and validation results
//! - Scoped render requests with transient "what is updating" markers
//! - Rollback of the component model, whole stores, or single fields
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `path`: Dotted/bracketed field paths over `serde_json::Value` trees
//! - `store`: The store interface and an in-memory reference store
//! - `state`: The binding engine, render coordination and rollback
//! - `error`: Error types shared across the crate
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use bindery_core::state::{ManualRenderTrigger, PartialBindingParam, UiState};
//! use bindery_core::store::MemoryStore;
//! use serde_json::json;
//!
//! let user = Arc::new(MemoryStore::new("user", json!({"name": "Ann", "age": 30})));
//! let trigger = Arc::new(ManualRenderTrigger::new());
//!
//! let state = UiState::builder("UserCard")
//!     .bind(PartialBindingParam::new(user.clone()))
//!     .trigger(trigger.clone())
//!     .build();
//!
//! user.set_field("age", json!(31)).unwrap();
//! assert_eq!(state.store_data("user", "age"), Some(json!(31)));
//! assert_eq!(state.updating_field_path().as_deref(), Some("user.age"));
//!
//! trigger.commit_all();
//! assert_eq!(state.updating_field_path(), None);
//! ```

pub mod error;
pub mod path;
pub mod state;
pub mod store;

pub use error::{BindingError, PathError};
pub use path::FieldPath;
pub use state::{PartialBindingParam, RenderScope, RenderTrigger, UiState, UiStateBuilder};
pub use store::{MemoryStore, Store, UpdateOptions};

/// Crate version, as reported by Cargo.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

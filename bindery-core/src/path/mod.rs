//! Path Accessor
//!
//! Generic get/has/set/remove over dotted or bracketed paths on a
//! `serde_json::Value` tree. The binding engine uses it to patch single
//! fields of a mirrored store model and to keep the parallel validation tree
//! in shape.
//!
//! # Example
//!
//! ```rust
//! use bindery_core::path::{self, FieldPath};
//! use serde_json::json;
//!
//! let mut doc = json!({"user": {"name": "Ann"}});
//! let age = FieldPath::parse("user.age").unwrap();
//!
//! path::set(&mut doc, &age, json!(30)).unwrap();
//! assert!(path::has(&doc, &age));
//! assert_eq!(path::get(&doc, &age), Some(&json!(30)));
//! ```

mod access;
mod segment;

pub use access::{
    get, get_mut, has, is_empty_mapping, remove, remove_and_prune, set, MAX_PADDING,
};
pub use segment::{FieldPath, Segment};

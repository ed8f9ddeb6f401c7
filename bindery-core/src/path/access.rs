//! Read and write values by [`FieldPath`].

use serde_json::{Map, Value};

use super::segment::{FieldPath, Segment};
use crate::error::PathError;

fn child<'a>(node: &'a Value, segment: &Segment) -> Option<&'a Value> {
    match (node, segment) {
        (Value::Object(map), segment) => map.get(&*segment.as_key()),
        (Value::Array(items), Segment::Index(index)) => items.get(*index),
        _ => None,
    }
}

fn child_mut<'a>(node: &'a mut Value, segment: &Segment) -> Option<&'a mut Value> {
    match (node, segment) {
        (Value::Object(map), segment) => map.get_mut(&*segment.as_key()),
        (Value::Array(items), Segment::Index(index)) => items.get_mut(*index),
        _ => None,
    }
}

/// An empty container of the kind `segment` addresses.
fn vacant_for(segment: &Segment) -> Value {
    match segment {
        Segment::Index(_) => Value::Array(Vec::new()),
        Segment::Key(_) => Value::Object(Map::new()),
    }
}

/// Whether `path` resolves to a value (including an explicit `null`).
pub fn has(root: &Value, path: &FieldPath) -> bool {
    get(root, path).is_some()
}

/// Borrow the value at `path`.
pub fn get<'a>(root: &'a Value, path: &FieldPath) -> Option<&'a Value> {
    path.segments()
        .iter()
        .try_fold(root, |node, segment| child(node, segment))
}

/// Mutably borrow the value at `path`.
pub fn get_mut<'a>(root: &'a mut Value, path: &FieldPath) -> Option<&'a mut Value> {
    path.segments()
        .iter()
        .try_fold(root, |node, segment| child_mut(node, segment))
}

/// Write `value` at `path`, creating missing intermediates.
///
/// Missing or `null` intermediates become an object or an array depending on
/// the segment that addresses into them; arrays are padded with `null`, at
/// most [`MAX_PADDING`] elements past their current end.
/// Returns the previous value, if any.
pub fn set(root: &mut Value, path: &FieldPath, value: Value) -> Result<Option<Value>, PathError> {
    let segments = path.segments();
    let Some((last, parents)) = segments.split_last() else {
        return Ok(Some(std::mem::replace(root, value)));
    };
    check_growth(root, path)?;

    let mut node = root;
    for segment in parents {
        node = descend_or_create(node, segment, path)?;
    }

    if node.is_null() {
        *node = vacant_for(last);
    }
    match node {
        Value::Object(map) => Ok(map.insert(last.as_key().into_owned(), value)),
        Value::Array(items) => match last {
            Segment::Index(index) => {
                let slot = element_or_pad(items, *index, path)?;
                Ok(Some(std::mem::replace(slot, value)))
            }
            Segment::Key(_) => Err(not_a_container(path)),
        },
        _ => Err(not_a_container(path)),
    }
}

fn descend_or_create<'a>(
    node: &'a mut Value,
    segment: &Segment,
    path: &FieldPath,
) -> Result<&'a mut Value, PathError> {
    if node.is_null() {
        *node = vacant_for(segment);
    }
    match node {
        Value::Object(map) => Ok(map
            .entry(segment.as_key().into_owned())
            .or_insert(Value::Null)),
        Value::Array(items) => match segment {
            Segment::Index(index) => element_or_pad(items, *index, path),
            Segment::Key(_) => Err(not_a_container(path)),
        },
        _ => Err(not_a_container(path)),
    }
}

/// How far past the end of an array [`set`] may write.
pub const MAX_PADDING: usize = 1024;

/// Reject writes that would pad some array by more than [`MAX_PADDING`]
/// elements, before anything is mutated.
fn check_growth(root: &Value, path: &FieldPath) -> Result<(), PathError> {
    let mut node = Some(root);
    for segment in path.segments() {
        if let Segment::Index(index) = segment {
            let len = match node {
                Some(Value::Array(items)) => Some(items.len()),
                None | Some(Value::Null) => Some(0),
                Some(_) => None,
            };
            if let Some(len) = len {
                if *index > len.saturating_add(MAX_PADDING) {
                    return Err(index_out_of_range(path, *index));
                }
            }
        }
        node = node.and_then(|node| child(node, segment));
    }
    Ok(())
}

fn element_or_pad<'a>(
    items: &'a mut Vec<Value>,
    index: usize,
    path: &FieldPath,
) -> Result<&'a mut Value, PathError> {
    if index >= items.len() {
        let len = index
            .checked_add(1)
            .filter(|len| len - items.len() <= MAX_PADDING + 1)
            .ok_or_else(|| index_out_of_range(path, index))?;
        items.resize(len, Value::Null);
    }
    Ok(&mut items[index])
}

fn index_out_of_range(path: &FieldPath, index: usize) -> PathError {
    PathError::IndexOutOfRange {
        path: path.to_string(),
        index,
    }
}

fn not_a_container(path: &FieldPath) -> PathError {
    PathError::NotAContainer {
        path: path.to_string(),
    }
}

/// Remove the value at `path` and return it.
///
/// Object entries are deleted. Array elements are replaced by `null` so the
/// indexes of their siblings stay stable.
pub fn remove(root: &mut Value, path: &FieldPath) -> Option<Value> {
    let (last, parents) = path.segments().split_last()?;
    let parent = parents
        .iter()
        .try_fold(root, |node, segment| child_mut(node, segment))?;

    match (parent, last) {
        (Value::Object(map), segment) => map.remove(&*segment.as_key()),
        (Value::Array(items), Segment::Index(index)) => items
            .get_mut(*index)
            .map(|slot| std::mem::replace(slot, Value::Null)),
        _ => None,
    }
}

/// Remove the value at `path`, then drop every ancestor object left empty.
pub fn remove_and_prune(root: &mut Value, path: &FieldPath) -> Option<Value> {
    let removed = remove(root, path)?;

    for depth in (1..path.len()).rev() {
        let parent = path.prefix(depth);
        match get(root, &parent) {
            Some(Value::Object(map)) if map.is_empty() => {
                remove(root, &parent);
            }
            _ => break,
        }
    }

    Some(removed)
}

/// Whether `value` is absent or an empty object.
pub fn is_empty_mapping(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Object(map)) => map.is_empty(),
        Some(_) => false,
    }
}

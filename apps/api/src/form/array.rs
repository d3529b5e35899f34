//! Nested Array Manager — append/remove over the list-shaped parts of the form.
//!
//! The same two operations serve the experience list and every entry's details
//! list. Positions are the identity used by field paths and error lookups, so a
//! removal shifts every later item (and everything keyed on it) down by one.

use std::collections::BTreeMap;

use serde::Serialize;

use super::path::{FieldPath, ListPath, PathError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ListChange {
    Appended { index: usize },
    Removed { index: usize },
    /// Removal refused by the floor-of-one guard; nothing moved.
    Retained,
}

impl ListChange {
    pub fn is_structural(&self) -> bool {
        !matches!(self, ListChange::Retained)
    }
}

/// Pushes `item` onto the end of `items`. No upper bound.
pub fn append<T>(items: &mut Vec<T>, item: T) -> ListChange {
    items.push(item);
    ListChange::Appended {
        index: items.len() - 1,
    }
}

/// Removes the item at `index`, unless it is the only item left.
pub fn remove<T>(
    list: ListPath,
    items: &mut Vec<T>,
    index: usize,
) -> Result<ListChange, PathError> {
    if index >= items.len() {
        return Err(PathError::OutOfRange {
            list,
            index,
            len: items.len(),
        });
    }
    if items.len() == 1 {
        return Ok(ListChange::Retained);
    }
    items.remove(index);
    Ok(ListChange::Removed { index })
}

/// Re-keys a positional map after `removed` left `list`.
///
/// Keys of the removed item are dropped, keys after it move down by one, and
/// keys outside the list are untouched.
pub fn reindex_after_remove<V>(
    map: BTreeMap<FieldPath, V>,
    list: ListPath,
    removed: usize,
) -> BTreeMap<FieldPath, V> {
    map.into_iter()
        .filter_map(|(path, value)| match path.index_in(list) {
            Some(i) if i == removed => None,
            Some(i) if i > removed => Some((path.with_index_in(list, i - 1), value)),
            _ => Some((path, value)),
        })
        .collect()
}

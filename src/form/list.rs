//! Pure, bounds-checked transformations over list values

use std::collections::BTreeSet;

use super::value::{ListItem, ListValue};

/// Why a mutation request left the form unchanged
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NoopReason {
    #[error("field `{0}` does not exist")]
    MissingField(String),

    #[error("field `{0}` is not a list")]
    NotAList(String),

    #[error("index {index} is out of range for list `{field}` of length {len}")]
    IndexOutOfRange {
        field: String,
        index: usize,
        len: usize,
    },

    #[error("no requested index exists in list `{0}`")]
    NothingToRemove(String),
}

/// Outcome of a list mutation. Ignoring it keeps the lenient behaviour:
/// invalid requests simply change nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Applied,
    Skipped(NoopReason),
}

impl Mutation {
    pub fn is_applied(&self) -> bool {
        matches!(self, Mutation::Applied)
    }

    pub fn reason(&self) -> Option<&NoopReason> {
        match self {
            Mutation::Applied => None,
            Mutation::Skipped(reason) => Some(reason),
        }
    }
}

/// A single index or a set of indices to remove
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Indices {
    One(usize),
    Many(BTreeSet<usize>),
}

impl Indices {
    pub fn contains(&self, index: usize) -> bool {
        match self {
            Indices::One(i) => *i == index,
            Indices::Many(set) => set.contains(&index),
        }
    }
}

impl From<usize> for Indices {
    fn from(index: usize) -> Self {
        Indices::One(index)
    }
}

impl From<BTreeSet<usize>> for Indices {
    fn from(set: BTreeSet<usize>) -> Self {
        Indices::Many(set)
    }
}

impl From<Vec<usize>> for Indices {
    fn from(indices: Vec<usize>) -> Self {
        Indices::Many(indices.into_iter().collect())
    }
}

impl From<&[usize]> for Indices {
    fn from(indices: &[usize]) -> Self {
        Indices::Many(indices.iter().copied().collect())
    }
}

impl<const N: usize> From<[usize; N]> for Indices {
    fn from(indices: [usize; N]) -> Self {
        Indices::Many(indices.into_iter().collect())
    }
}

/// Move request: `to` is a position in the list after `from` was taken out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reorder {
    pub from: usize,
    pub to: usize,
}

/// Index that did not address an existing item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfRange {
    pub index: usize,
    pub len: usize,
}

impl ListValue {
    fn check(&self, index: usize) -> Result<(), OutOfRange> {
        if index < self.len() {
            Ok(())
        } else {
            Err(OutOfRange {
                index,
                len: self.len(),
            })
        }
    }

    /// Replace the item at `index`; never creates a new slot
    pub fn with_item(&self, index: usize, item: ListItem) -> Result<ListValue, OutOfRange> {
        self.check(index)?;
        let mut items = self.items().to_vec();
        items[index] = item;
        Ok(ListValue::new(items))
    }

    /// Append `item` as the new last item
    pub fn with_appended(&self, item: ListItem) -> ListValue {
        let mut items = self.items().to_vec();
        items.push(item);
        ListValue::new(items)
    }

    /// Insert `item` before position `index`; `index == len` appends
    pub fn with_inserted(&self, index: usize, item: ListItem) -> Result<ListValue, OutOfRange> {
        if index > self.len() {
            return Err(OutOfRange {
                index,
                len: self.len(),
            });
        }
        let mut items = self.items().to_vec();
        items.insert(index, item);
        Ok(ListValue::new(items))
    }

    /// Keep every item whose original index is not in `indices`.
    /// `None` when no requested index exists.
    pub fn without(&self, indices: &Indices) -> Option<ListValue> {
        let kept: Vec<ListItem> = self
            .iter()
            .enumerate()
            .filter(|(i, _)| !indices.contains(*i))
            .map(|(_, item)| item.clone())
            .collect();
        if kept.len() == self.len() {
            None
        } else {
            Some(ListValue::new(kept))
        }
    }

    /// Take the item at `from` out and reinsert it at `to`
    pub fn reordered(&self, Reorder { from, to }: Reorder) -> Result<ListValue, OutOfRange> {
        self.check(from)?;
        self.check(to)?;
        let mut items = self.items().to_vec();
        let item = items.remove(from);
        items.insert(to, item);
        Ok(ListValue::new(items))
    }
}

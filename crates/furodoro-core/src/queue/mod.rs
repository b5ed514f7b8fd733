//! User-ordered queue of external tasks, each with its own planned length.
//!
//! Running a task never removes it or advances the cursor on its own. The
//! active binding is a weak reference by [`SequenceKey`]: removing the
//! active entry leaves it dangling until the next explicit start.

mod selection;

use std::collections::HashSet;
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::QueueError;
use crate::settings::DEFAULT_WORK_MINUTES;

pub use selection::{CategoryChoice, Selection, TaskChoice};

/// Colour used when a category does not carry one.
pub const DEFAULT_TASK_COLOR: &str = "#6366f1";

/// Identity of one queue entry. The same external task may be queued twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SequenceKey(Uuid);

impl SequenceKey {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SequenceKey {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SequenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A queued external task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRef {
    pub id: String,
    pub name: String,
    pub category_id: String,
    pub category_name: String,
    pub color: String,
    pub sequence_key: SequenceKey,
    /// Work length used when this task is started. Always >= 1.
    pub planned_minutes: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskQueue {
    entries: Vec<TaskRef>,
    active: Option<SequenceKey>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the selected task. Both a category and a task must be
    /// selected; otherwise nothing happens and `None` is returned.
    pub fn enqueue(
        &mut self,
        category: Option<&CategoryChoice>,
        task: Option<&TaskChoice>,
        planned_minutes: u32,
    ) -> Option<SequenceKey> {
        let (category, task) = match (category, task) {
            (Some(c), Some(t)) if !c.id.is_empty() && !t.id.is_empty() => (c, t),
            _ => {
                tracing::debug!("enqueue ignored: category and task must both be selected");
                return None;
            }
        };

        let key = SequenceKey::new();
        self.entries.push(TaskRef {
            id: task.id.clone(),
            name: task.name.clone(),
            category_id: category.id.clone(),
            category_name: category.name.clone(),
            color: category
                .color
                .clone()
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_TASK_COLOR.to_string()),
            sequence_key: key,
            planned_minutes: planned_minutes.max(1),
        });
        tracing::debug!(%key, task_id = %task.id, "task queued");
        Some(key)
    }

    /// Remove an entry. The active binding is left as is.
    pub fn remove(&mut self, key: SequenceKey) -> Result<TaskRef, QueueError> {
        let index = self
            .position(key)
            .ok_or_else(|| QueueError::UnknownKey(key.to_string()))?;
        Ok(self.entries.remove(index))
    }

    /// Replace the order wholesale. `order` must list every current key
    /// exactly once.
    pub fn reorder(&mut self, order: &[SequenceKey]) -> Result<(), QueueError> {
        let not_a_permutation = || QueueError::NotAPermutation {
            got: order.len(),
            have: self.entries.len(),
        };
        if order.len() != self.entries.len() {
            return Err(not_a_permutation());
        }
        let unique: HashSet<_> = order.iter().collect();
        if unique.len() != order.len() {
            return Err(not_a_permutation());
        }

        let mut reordered = Vec::with_capacity(order.len());
        for key in order {
            let entry = self
                .get(*key)
                .cloned()
                .ok_or_else(|| QueueError::UnknownKey(key.to_string()))?;
            reordered.push(entry);
        }
        self.entries = reordered;
        Ok(())
    }

    /// Move the entry at `from` so that it ends up at `to`.
    pub fn move_entry(&mut self, from: usize, to: usize) -> Result<(), QueueError> {
        let len = self.entries.len();
        for index in [from, to] {
            if index >= len {
                return Err(QueueError::OutOfBounds { index, len });
            }
        }
        let entry = self.entries.remove(from);
        self.entries.insert(to, entry);
        Ok(())
    }

    /// Uniformly random order.
    pub fn shuffle(&mut self) {
        self.shuffle_with(&mut rand::thread_rng());
    }

    /// Fisher-Yates with a caller-supplied generator.
    pub fn shuffle_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for i in (1..self.entries.len()).rev() {
            let j = rng.gen_range(0..=i);
            self.entries.swap(i, j);
        }
    }

    /// Bind `key` as the active task.
    pub fn bind_active(&mut self, key: SequenceKey) -> Result<&TaskRef, QueueError> {
        let index = self
            .position(key)
            .ok_or_else(|| QueueError::UnknownKey(key.to_string()))?;
        self.active = Some(key);
        Ok(&self.entries[index])
    }

    pub fn active_key(&self) -> Option<SequenceKey> {
        self.active
    }

    /// The active entry, if it is still queued.
    pub fn active(&self) -> Option<&TaskRef> {
        self.active.and_then(|key| self.get(key))
    }

    /// The entry after the active one, wrapping to the front.
    ///
    /// A single-entry queue has no next. With nothing bound the head is
    /// next, again only when there is more than one entry. A binding whose
    /// entry was removed has no next.
    pub fn next_after_active(&self) -> Option<&TaskRef> {
        if self.entries.len() < 2 {
            return None;
        }
        match self.active {
            Some(key) => {
                let index = self.position(key)?;
                self.entries.get((index + 1) % self.entries.len())
            }
            None => self.entries.first(),
        }
    }

    /// Change a task's planned minutes. Anything below one minute reverts
    /// to the default and is reported as an error.
    pub fn set_duration(&mut self, key: SequenceKey, minutes: i64) -> Result<u32, QueueError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.sequence_key == key)
            .ok_or_else(|| QueueError::UnknownKey(key.to_string()))?;

        let accepted = u32::try_from(minutes).ok().filter(|m| *m >= 1);
        entry.planned_minutes = accepted.unwrap_or(DEFAULT_WORK_MINUTES);
        if accepted.is_none() {
            tracing::warn!(minutes, key = %key, "invalid task duration; reverted to default");
        }
        Ok(entry.planned_minutes)
    }

    pub fn get(&self, key: SequenceKey) -> Option<&TaskRef> {
        self.entries.iter().find(|e| e.sequence_key == key)
    }

    pub fn position(&self, key: SequenceKey) -> Option<usize> {
        self.entries.iter().position(|e| e.sequence_key == key)
    }

    pub fn key_at(&self, index: usize) -> Result<SequenceKey, QueueError> {
        self.entries
            .get(index)
            .map(|e| e.sequence_key)
            .ok_or(QueueError::OutOfBounds {
                index,
                len: self.entries.len(),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaskRef> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

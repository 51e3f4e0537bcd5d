//! Linear undo/redo log with a cursor.
//!
//! ```text
//! add(A) add(B) add(C)      [A, B, C]   cursor = 2
//! undo()                    [A, B, C]   cursor = 1   (C reverted, still redoable)
//! add(D)                    [A, B, D]   cursor = 2   (C discarded)
//! jump_to(None)             [A, B, D]   cursor = -  (D, B, A reverted in that order)
//! ```
//!
//! Invariant: `cursor + 1 <= len <= capacity`, with `None` standing for "nothing applied".
//! Every navigation call is total; asking for something impossible is a no-op returning `false`.

use crate::analytics::HistoryUsage;
use crate::gizmo::GizmoMode;
use serde::Serialize;
use serde_json::Value;
use std::collections::VecDeque;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

pub mod records;

pub use records::{EditRecord, TransformRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Translate,
    Rotate,
    Scale,
    Edit,
}

impl From<GizmoMode> for ActionKind {
    fn from(mode: GizmoMode) -> Self {
        match mode {
            GizmoMode::Translate => ActionKind::Translate,
            GizmoMode::Rotate => ActionKind::Rotate,
            GizmoMode::Scale => ActionKind::Scale,
        }
    }
}

/// Descriptive half of an action record.
#[derive(Debug, Clone)]
pub struct ActionMeta {
    pub id: Uuid,
    pub kind: ActionKind,
    pub description: String,
    pub timestamp: SystemTime,
    /// Record-specific data for panels and diagnostics. Never read back by the history.
    pub payload: Value,
}

impl ActionMeta {
    pub fn new(kind: ActionKind, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            description: description.into(),
            timestamp: SystemTime::now(),
            payload: Value::Null,
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp.duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0)
    }
}

/// A reversible change against some document context `C`.
///
/// `revert` followed by `apply` must restore exactly the state `apply` produced.
pub trait ActionRecord<C> {
    fn meta(&self) -> &ActionMeta;
    fn apply(&mut self, ctx: &mut C);
    fn revert(&mut self, ctx: &mut C);
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub index: usize,
    pub id: Uuid,
    pub kind: ActionKind,
    pub description: String,
    pub timestamp_ms: u64,
    pub applied: bool,
}

/// State handed to subscribers after every change.
#[derive(Debug, Clone, Serialize)]
pub struct HistorySnapshot {
    pub entries: Vec<HistoryEntry>,
    pub cursor: Option<usize>,
    pub capacity: usize,
    pub can_undo: bool,
    pub can_redo: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&HistorySnapshot)>;

pub struct CommandHistory<C> {
    records: VecDeque<Box<dyn ActionRecord<C>>>,
    cursor: Option<usize>,
    capacity: usize,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
    usage: HistoryUsage,
}

impl<C> fmt::Debug for CommandHistory<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandHistory")
            .field("len", &self.records.len())
            .field("cursor", &self.cursor)
            .field("capacity", &self.capacity)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl<C> CommandHistory<C> {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::new(),
            cursor: None,
            capacity: capacity.max(1),
            subscribers: Vec::new(),
            next_subscription: 0,
            usage: HistoryUsage::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Index of the most recently applied record.
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn can_redo(&self) -> bool {
        self.next_index() < self.records.len()
    }

    pub fn usage(&self) -> HistoryUsage {
        self.usage
    }

    pub fn meta(&self, index: usize) -> Option<&ActionMeta> {
        self.records.get(index).map(|record| record.meta())
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.cursor.and_then(|c| self.meta(c)).map(|meta| meta.description.as_str())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.meta(self.next_index()).map(|meta| meta.description.as_str())
    }

    /// Records an already-applied change. Anything after the cursor is discarded first; the
    /// oldest record is evicted when the log is full.
    pub fn add(&mut self, record: Box<dyn ActionRecord<C>>) {
        let keep = self.next_index();
        if keep < self.records.len() {
            let discarded = self.records.len() - keep;
            self.records.truncate(keep);
            self.usage.discarded += discarded as u64;
            tracing::debug!(discarded, "history branch discarded");
        }
        tracing::debug!(description = %record.meta().description, "history add");
        self.records.push_back(record);
        self.cursor = Some(self.records.len() - 1);
        self.usage.added += 1;
        self.enforce_capacity();
        self.notify();
    }

    /// Applies `record` to `ctx`, then records it.
    pub fn execute(&mut self, mut record: Box<dyn ActionRecord<C>>, ctx: &mut C) {
        record.apply(ctx);
        self.add(record);
    }

    pub fn undo(&mut self, ctx: &mut C) -> bool {
        let Some(current) = self.cursor else {
            return false;
        };
        self.records[current].revert(ctx);
        self.cursor = current.checked_sub(1);
        self.usage.undos += 1;
        tracing::debug!(index = current, "history undo");
        self.notify();
        true
    }

    pub fn redo(&mut self, ctx: &mut C) -> bool {
        let next = self.next_index();
        if next >= self.records.len() {
            return false;
        }
        self.records[next].apply(ctx);
        self.cursor = Some(next);
        self.usage.redos += 1;
        tracing::debug!(index = next, "history redo");
        self.notify();
        true
    }

    /// Moves the cursor to `target` (`None` = before the first record), reverting newer records
    /// newest-first or applying older ones oldest-first along the way.
    pub fn jump_to(&mut self, target: Option<usize>, ctx: &mut C) -> bool {
        if matches!(target, Some(index) if index >= self.records.len()) {
            return false;
        }
        let current = self.cursor;
        if target == current {
            return true;
        }
        let goal_next = target.map_or(0, |index| index + 1);
        let current_next = self.next_index();
        if goal_next < current_next {
            for index in (goal_next..current_next).rev() {
                self.records[index].revert(ctx);
            }
        } else {
            for index in current_next..goal_next {
                self.records[index].apply(ctx);
            }
        }
        self.cursor = target;
        self.usage.jumps += 1;
        tracing::debug!(from = ?current, to = ?target, "history jump");
        self.notify();
        true
    }

    /// Drops every record. Subscribers are notified even if the log was already empty.
    pub fn clear(&mut self) {
        self.records.clear();
        self.cursor = None;
        self.usage.clears += 1;
        self.notify();
    }

    /// Evicts oldest records when shrinking below the current length. Subscribers are
    /// notified whenever the capacity changes.
    pub fn set_capacity(&mut self, capacity: usize) {
        let capacity = capacity.max(1);
        if capacity == self.capacity {
            return;
        }
        self.capacity = capacity;
        self.enforce_capacity();
        tracing::debug!(capacity, len = self.records.len(), "history capacity changed");
        self.notify();
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&HistorySnapshot) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(existing, _)| *existing != id);
        self.subscribers.len() != before
    }

    pub fn snapshot(&self) -> HistorySnapshot {
        let applied_until = self.next_index();
        let entries = self
            .records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                let meta = record.meta();
                HistoryEntry {
                    index,
                    id: meta.id,
                    kind: meta.kind,
                    description: meta.description.clone(),
                    timestamp_ms: meta.timestamp_ms(),
                    applied: index < applied_until,
                }
            })
            .collect();
        HistorySnapshot {
            entries,
            cursor: self.cursor,
            capacity: self.capacity,
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
        }
    }

    fn next_index(&self) -> usize {
        self.cursor.map_or(0, |index| index + 1)
    }

    fn enforce_capacity(&mut self) {
        while self.records.len() > self.capacity {
            self.records.pop_front();
            self.cursor = self.cursor.and_then(|index| index.checked_sub(1));
            self.usage.evicted += 1;
        }
    }

    fn notify(&mut self) {
        if self.subscribers.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        for (_, subscriber) in self.subscribers.iter_mut() {
            subscriber(&snapshot);
        }
    }
}

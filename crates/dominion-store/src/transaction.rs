//! Staged per-tick transactions.
//!
//! One tick's worth of mutations (territory replacements, event
//! drafts, streak ledger operations, record candidates) is staged into
//! a [`TickTransaction`] and committed atomically by
//! [`WorldStore::commit`](crate::WorldStore::commit). Nothing in the
//! transaction touches the store until commit, so a failed step simply
//! drops the transaction and the world is untouched.

use std::collections::BTreeMap;

use dominion_types::{EventDraft, RecordSubmission, StreakOp, Territory, TerritoryId};

/// Staged mutations for exactly one tick.
///
/// Created by [`WorldStore::begin_tick`](crate::WorldStore::begin_tick),
/// which captures the store version and the tick number being
/// processed. Commit rejects the transaction if the store has moved on
/// since.
#[derive(Debug, Clone)]
pub struct TickTransaction {
    /// Store version the transaction was begun against.
    pub(crate) base_version: u64,
    /// The tick number being processed (the world tick *before* the
    /// advance; committed events are stamped with this value).
    pub(crate) tick: u64,
    /// Full replacement territory records, keyed by ID.
    pub(crate) territory_updates: BTreeMap<TerritoryId, Territory>,
    /// Events to append, in emission order.
    pub(crate) events: Vec<EventDraft>,
    /// Streak ledger operations.
    pub(crate) streak_ops: Vec<StreakOp>,
    /// Best-ever record candidates.
    pub(crate) record_submissions: Vec<RecordSubmission>,
}

impl TickTransaction {
    pub(crate) const fn new(base_version: u64, tick: u64) -> Self {
        Self {
            base_version,
            tick,
            territory_updates: BTreeMap::new(),
            events: Vec::new(),
            streak_ops: Vec::new(),
            record_submissions: Vec::new(),
        }
    }

    /// The tick number this transaction processes.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Stage a full territory replacement. A later update for the same
    /// territory within the same transaction supersedes the earlier one.
    pub fn update_territory(&mut self, territory: Territory) {
        self.territory_updates.insert(territory.id, territory);
    }

    /// Stage an event for the append-only log.
    pub fn append_event(&mut self, draft: EventDraft) {
        self.events.push(draft);
    }

    /// Stage several events for the append-only log.
    pub fn append_events(&mut self, drafts: impl IntoIterator<Item = EventDraft>) {
        self.events.extend(drafts);
    }

    /// Stage a streak ledger operation.
    pub fn push_streak_op(&mut self, op: StreakOp) {
        self.streak_ops.push(op);
    }

    /// Stage a best-ever record candidate.
    pub fn submit_record(&mut self, submission: RecordSubmission) {
        self.record_submissions.push(submission);
    }

    /// Whether the transaction carries no mutations at all.
    pub fn is_empty(&self) -> bool {
        self.territory_updates.is_empty()
            && self.events.is_empty()
            && self.streak_ops.is_empty()
            && self.record_submissions.is_empty()
    }
}

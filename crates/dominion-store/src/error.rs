//! Error types for the world store.

use dominion_types::{StreakType, TerritoryId};

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A transaction referenced a territory that does not exist.
    #[error("unknown territory: {territory_id}")]
    UnknownTerritory {
        /// The missing territory.
        territory_id: TerritoryId,
    },

    /// A territory with this ID already exists.
    #[error("duplicate territory: {territory_id}")]
    DuplicateTerritory {
        /// The duplicated territory.
        territory_id: TerritoryId,
    },

    /// The transaction was built against an older store version.
    ///
    /// This is the serialization guard: two overlapping tick
    /// invocations cannot both advance the tick from the same starting
    /// value, because the second commit observes a bumped version.
    #[error("stale transaction: built at version {base_version}, store is at {current_version}")]
    StaleTransaction {
        /// Version the transaction was begun against.
        base_version: u64,
        /// Version the store holds now.
        current_version: u64,
    },

    /// An `Open` streak op found an active streak already in place.
    #[error("active {streak_type:?} streak already exists for territory {territory_id}")]
    ActiveStreakExists {
        /// The territory in question.
        territory_id: TerritoryId,
        /// The streak type in question.
        streak_type: StreakType,
    },

    /// An `Advance`/`Close` streak op found no active streak.
    #[error("no active {streak_type:?} streak for territory {territory_id}")]
    NoActiveStreak {
        /// The territory in question.
        territory_id: TerritoryId,
        /// The streak type in question.
        streak_type: StreakType,
    },

    /// The tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,
}

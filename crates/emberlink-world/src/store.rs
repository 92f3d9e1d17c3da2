//! The entity store: the client's mirror of server entities.
//!
//! Every operation is total. Anomalies the server can cause (adding an id
//! twice, touching an id it never added) are logged as warnings and leave
//! the store unchanged; they never reach the caller as errors.
//!
//! # Concurrency note
//!
//! `EntityStore` is a plain `HashMap`, not a concurrent one. It is owned by
//! the client's single event loop, which handles one event at a time, so
//! no locking is needed.

use std::collections::HashMap;

use emberlink_protocol::{EntityId, StateValue};

use crate::Entity;

/// What a store operation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    /// A new entity was inserted.
    Added,
    /// An entity was deleted.
    Removed,
    /// A state value was set or overwritten.
    Updated,
    /// `add` for an id already present; the existing entity was kept.
    DuplicateAdd,
    /// `remove` or `update_state` for an id that isn't present.
    UnknownEntity,
    /// `update_state` without a value; nothing was changed.
    MissingValue,
}

impl StoreOutcome {
    /// `true` if the store changed.
    pub fn is_applied(self) -> bool {
        matches!(self, Self::Added | Self::Removed | Self::Updated)
    }
}

/// Mapping of entity ids to their local mirrors.
///
/// ## Lifecycle
///
/// ```text
/// add(id) ──→ update_state(id, ..)* ──→ remove(id)
/// ```
///
/// Ids are unique at any instant; an id may be reused after removal.
#[derive(Debug, Default)]
pub struct EntityStore {
    entities: HashMap<EntityId, Entity>,
    /// Bumped on every applied mutation so observers can tell whether a
    /// redraw is due.
    revision: u64,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new entity with no states.
    ///
    /// First write wins: if `id` is already present the existing entity,
    /// including any state it has accumulated, is kept and the call only
    /// logs a warning.
    pub fn add(&mut self, id: EntityId, name: Option<String>) -> StoreOutcome {
        if let Some(existing) = self.entities.get(&id) {
            tracing::warn!(
                %id,
                existing = ?existing.name(),
                ignored = ?name,
                "entity added twice, keeping the first"
            );
            return StoreOutcome::DuplicateAdd;
        }
        tracing::debug!(%id, ?name, "entity added");
        self.entities.insert(id, Entity::new(id, name));
        self.revision += 1;
        StoreOutcome::Added
    }

    /// Deletes an entity and all its states.
    ///
    /// `name` is informational; a mismatch with the stored name is logged
    /// but does not block the removal.
    pub fn remove(&mut self, id: EntityId, name: Option<&str>) -> StoreOutcome {
        let Some(removed) = self.entities.remove(&id) else {
            tracing::warn!(%id, ?name, "entity removed without being added");
            return StoreOutcome::UnknownEntity;
        };
        if name.is_some() && name != removed.name() {
            tracing::debug!(
                %id,
                stored = ?removed.name(),
                sent = ?name,
                "remove named a different entity name"
            );
        }
        tracing::debug!(%id, "entity removed");
        self.revision += 1;
        StoreOutcome::Removed
    }

    /// Sets `state_id` on an entity, overwriting any previous value.
    ///
    /// A `None` value is treated as a malformed update: it neither clears
    /// the state nor creates one.
    pub fn update_state(
        &mut self,
        id: EntityId,
        state_id: String,
        value: Option<StateValue>,
    ) -> StoreOutcome {
        let Some(entity) = self.entities.get_mut(&id) else {
            tracing::warn!(%id, state_id, "entity updated without being added");
            return StoreOutcome::UnknownEntity;
        };
        let Some(value) = value else {
            tracing::warn!(%id, state_id, "state update carried no value, ignoring");
            return StoreOutcome::MissingValue;
        };
        tracing::trace!(%id, state_id, kind = value.kind(), "state updated");
        entity.set_state(state_id, value);
        self.revision += 1;
        StoreOutcome::Updated
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Number of applied mutations so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Copies every entity out, ordered by id, for rendering.
    ///
    /// The copies are detached from the store: later mutations don't show
    /// up in them and changing them can't reach back in.
    pub fn snapshot(&self) -> Vec<Entity> {
        let mut out: Vec<Entity> = self.entities.values().cloned().collect();
        out.sort_by_key(Entity::id);
        out
    }
}

// =========================================================================
// Tests
// =========================================================================

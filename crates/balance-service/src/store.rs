//! # Group Store
//!
//! Port over the relational layer for groups and members. The store does
//! keyed CRUD plus one non-trivial operation: [`GroupStore::apply_deltas`],
//! the atomic multi-row balance mutation every expense and payment resolves
//! into. Business rules (name uniqueness, zero-balance removal) live in the
//! manager, not here.

use shared_types::{Group, Member, Money};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// Storage seam for groups and their members.
///
/// Mutations return `false` when the key does not resolve, leaving the
/// store untouched.
pub trait GroupStore: Send + Sync {
    /// Insert a new group.
    fn insert_group(&self, group: Group);

    /// Fetch a group with its members.
    fn group(&self, id: Uuid) -> Option<Group>;

    /// Rename a group.
    fn rename_group(&self, id: Uuid, name: &str) -> bool;

    /// Delete a group and all its members.
    fn remove_group(&self, id: Uuid) -> bool;

    /// Insert a member into an existing group.
    fn insert_member(&self, group_id: Uuid, member: Member) -> bool;

    /// Fetch a member of the given group.
    fn member(&self, group_id: Uuid, member_id: Uuid) -> Option<Member>;

    /// Rename a member of the given group.
    fn rename_member(&self, group_id: Uuid, member_id: Uuid, name: &str) -> bool;

    /// Delete a member from the given group.
    fn remove_member(&self, group_id: Uuid, member_id: Uuid) -> bool;

    /// Apply every `(member, delta)` pair inside one transaction.
    ///
    /// All-or-nothing: if any referenced member does not belong to the
    /// stated group, no balance is touched and `false` is returned. A
    /// member appearing more than once receives the sum of its deltas.
    fn apply_deltas(&self, group_id: Uuid, deltas: &[(Uuid, Money)]) -> bool;
}

/// In-memory adapter used by the single-process runtime and the tests.
#[derive(Default)]
pub struct InMemoryGroupStore {
    groups: Mutex<HashMap<Uuid, Group>>,
}

impl InMemoryGroupStore {
    /// New empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, Group>> {
        self.groups
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl GroupStore for InMemoryGroupStore {
    fn insert_group(&self, group: Group) {
        self.lock().insert(group.id, group);
    }

    fn group(&self, id: Uuid) -> Option<Group> {
        self.lock().get(&id).cloned()
    }

    fn rename_group(&self, id: Uuid, name: &str) -> bool {
        match self.lock().get_mut(&id) {
            Some(group) => {
                group.name = name.to_owned();
                true
            }
            None => false,
        }
    }

    fn remove_group(&self, id: Uuid) -> bool {
        self.lock().remove(&id).is_some()
    }

    fn insert_member(&self, group_id: Uuid, member: Member) -> bool {
        match self.lock().get_mut(&group_id) {
            Some(group) => {
                group.members.push(member);
                true
            }
            None => false,
        }
    }

    fn member(&self, group_id: Uuid, member_id: Uuid) -> Option<Member> {
        self.lock()
            .get(&group_id)?
            .members
            .iter()
            .find(|m| m.id == member_id)
            .cloned()
    }

    fn rename_member(&self, group_id: Uuid, member_id: Uuid, name: &str) -> bool {
        let mut groups = self.lock();
        let Some(group) = groups.get_mut(&group_id) else {
            return false;
        };
        match group.members.iter_mut().find(|m| m.id == member_id) {
            Some(member) => {
                member.name = name.to_owned();
                true
            }
            None => false,
        }
    }

    fn remove_member(&self, group_id: Uuid, member_id: Uuid) -> bool {
        let mut groups = self.lock();
        let Some(group) = groups.get_mut(&group_id) else {
            return false;
        };
        let before = group.members.len();
        group.members.retain(|m| m.id != member_id);
        group.members.len() < before
    }

    fn apply_deltas(&self, group_id: Uuid, deltas: &[(Uuid, Money)]) -> bool {
        let mut groups = self.lock();
        let Some(group) = groups.get_mut(&group_id) else {
            return false;
        };

        // Verify membership before touching anything: the whole batch
        // rolls back on the first missing member.
        if deltas
            .iter()
            .any(|(id, _)| !group.members.iter().any(|m| m.id == *id))
        {
            return false;
        }

        for (id, delta) in deltas {
            if let Some(member) = group.members.iter_mut().find(|m| m.id == *id) {
                member.balance += *delta;
            }
        }
        true
    }
}

use serde::{Deserialize, Serialize};
use swarmspace_common::EntityId;

/// Fire-once effect applied to its owner when due.
///
/// Effects are data, not callbacks, so a queue entry can outlive nothing: a
/// despawned owner's entries are cancelled in bulk and a stale entry for a
/// reused slot fails the generation check at apply time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DeferredEffect {
    SetSpeed(f32),
    SetReverse(bool),
    /// Restore base speed and clear the reverse flag.
    Reset,
    Despawn,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct DeferredTask {
    owner: EntityId,
    due_tick: u64,
    effect: DeferredEffect,
}

/// Pending deferred effects for the whole world, in schedule order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeferredQueue {
    tasks: Vec<DeferredTask>,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Entries currently owned by one entity.
    pub fn pending_for(&self, owner: EntityId) -> usize {
        self.tasks.iter().filter(|t| t.owner == owner).count()
    }

    /// Queue `effect` to fire `delay_ticks` after `now`.
    pub fn schedule(
        &mut self,
        owner: EntityId,
        now: u64,
        delay_ticks: u64,
        effect: DeferredEffect,
    ) {
        self.tasks.push(DeferredTask {
            owner,
            due_tick: now.saturating_add(delay_ticks),
            effect,
        });
    }

    /// Drop every entry for `owner`. Returns how many were cancelled.
    pub fn cancel_owner(&mut self, owner: EntityId) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.owner != owner);
        before - self.tasks.len()
    }

    /// Remove and return everything due at `now`, preserving schedule order.
    pub fn drain_due(&mut self, now: u64) -> Vec<(EntityId, DeferredEffect)> {
        let mut due = Vec::new();
        self.tasks.retain(|t| {
            if t.due_tick <= now {
                due.push((t.owner, t.effect));
                false
            } else {
                true
            }
        });
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(index: u32) -> EntityId {
        EntityId::new(index, 0)
    }

    #[test]
    fn fires_once_when_due() {
        let mut queue = DeferredQueue::new();
        queue.schedule(id(1), 10, 5, DeferredEffect::Reset);

        assert!(queue.drain_due(14).is_empty());
        assert_eq!(
            queue.drain_due(15),
            vec![(id(1), DeferredEffect::Reset)]
        );
        assert!(queue.drain_due(100).is_empty());
    }

    #[test]
    fn cancel_owner_drops_all_entries() {
        let mut queue = DeferredQueue::new();
        queue.schedule(id(1), 0, 1, DeferredEffect::SetSpeed(0.1));
        queue.schedule(id(1), 0, 2, DeferredEffect::Reset);
        queue.schedule(id(2), 0, 3, DeferredEffect::Despawn);

        assert_eq!(queue.cancel_owner(id(1)), 2);
        assert_eq!(queue.pending_for(id(1)), 0);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn drain_preserves_schedule_order() {
        let mut queue = DeferredQueue::new();
        queue.schedule(id(1), 0, 2, DeferredEffect::SetSpeed(0.8));
        queue.schedule(id(1), 0, 1, DeferredEffect::SetSpeed(0.1));
        queue.schedule(id(1), 0, 2, DeferredEffect::Reset);

        let due = queue.drain_due(2);
        assert_eq!(
            due,
            vec![
                (id(1), DeferredEffect::SetSpeed(0.8)),
                (id(1), DeferredEffect::SetSpeed(0.1)),
                (id(1), DeferredEffect::Reset),
            ]
        );
    }
}

//! Contact events derived from successive collision lists
//!
//! The detector rebuilds its list from scratch every pass. The tracker
//! diffs two consecutive lists into enter, stay and exit events.

use crate::body::{Hand, ObjectId};
use crate::detector::CollisionResult;
use glam::Vec3;
use std::collections::BTreeMap;

/// Phase of a contact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactEventType {
    /// Pair started touching this pass
    Enter,
    /// Pair was already touching
    Stay,
    /// Pair stopped touching (or a body went away)
    Exit,
}

/// A contact phase change between two bodies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactEvent {
    pub object_a: ObjectId,
    pub object_b: ObjectId,
    pub event_type: ContactEventType,
    pub hand: Option<Hand>,
    /// Last known contact point
    pub point: Vec3,
    /// Last known contact normal (a to b)
    pub normal: Vec3,
}

impl ContactEvent {
    /// Check if this is an enter event
    pub fn is_enter(&self) -> bool {
        self.event_type == ContactEventType::Enter
    }

    /// Check if this is an exit event
    pub fn is_exit(&self) -> bool {
        self.event_type == ContactEventType::Exit
    }

    fn from_result(result: &CollisionResult, event_type: ContactEventType) -> Self {
        Self {
            object_a: result.object_a,
            object_b: result.object_b,
            event_type,
            hand: result.hand,
            point: result.point,
            normal: result.normal,
        }
    }
}

/// Remembers last pass's contacts to produce phase events
#[derive(Debug, Clone, Default)]
pub struct ContactTracker {
    previous: BTreeMap<(ObjectId, ObjectId), CollisionResult>,
}

impl ContactTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Diff `current` against the previous call, keeping only contacts
    /// accepted by `filter`. Events come out sorted by pair, exits last.
    pub fn update<F>(&mut self, current: &[CollisionResult], filter: F) -> Vec<ContactEvent>
    where
        F: Fn(&CollisionResult) -> bool,
    {
        let next: BTreeMap<_, _> = current
            .iter()
            .filter(|c| c.valid && filter(c))
            .map(|c| (pair_key(c), *c))
            .collect();

        let mut events: Vec<ContactEvent> = next
            .iter()
            .map(|(key, c)| {
                let phase = if self.previous.contains_key(key) {
                    ContactEventType::Stay
                } else {
                    ContactEventType::Enter
                };
                ContactEvent::from_result(c, phase)
            })
            .collect();

        events.extend(
            self.previous
                .iter()
                .filter(|(key, _)| !next.contains_key(key))
                .map(|(_, c)| ContactEvent::from_result(c, ContactEventType::Exit)),
        );

        self.previous = next;
        events
    }

    /// Pairs currently in contact
    pub fn len(&self) -> usize {
        self.previous.len()
    }

    /// Whether no pair is in contact
    pub fn is_empty(&self) -> bool {
        self.previous.is_empty()
    }

    /// Forget every contact
    pub fn clear(&mut self) {
        self.previous.clear();
    }
}

fn pair_key(c: &CollisionResult) -> (ObjectId, ObjectId) {
    if c.object_a <= c.object_b {
        (c.object_a, c.object_b)
    } else {
        (c.object_b, c.object_a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::CollisionType;

    fn contact(a: u64, b: u64) -> CollisionResult {
        CollisionResult {
            object_a: ObjectId::from_raw(a),
            object_b: ObjectId::from_raw(b),
            point: Vec3::ZERO,
            normal: Vec3::Y,
            depth: 0.1,
            collision_type: CollisionType::Touch,
            hand: Some(Hand::Left),
            valid: true,
        }
    }

    #[test]
    fn test_enter_stay_exit() {
        let mut tracker = ContactTracker::new();

        let events = tracker.update(&[contact(1, 2)], |_| true);
        assert_eq!(events.len(), 1);
        assert!(events[0].is_enter());

        let events = tracker.update(&[contact(1, 2), contact(1, 3)], |_| true);
        let phases: Vec<_> = events.iter().map(|e| e.event_type).collect();
        assert_eq!(phases, vec![ContactEventType::Stay, ContactEventType::Enter]);

        let events = tracker.update(&[contact(1, 3)], |_| true);
        assert_eq!(events.len(), 2);
        assert!(events.iter().any(|e| e.is_exit() && e.object_b == ObjectId::from_raw(2)));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_filter_and_validity() {
        let mut tracker = ContactTracker::new();
        let mut invalid = contact(4, 5);
        invalid.valid = false;

        let events = tracker.update(&[contact(1, 2), invalid], |c| c.object_a == ObjectId::from_raw(9));
        assert!(events.is_empty());
        assert!(tracker.is_empty());
    }
}

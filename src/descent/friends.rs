// src/descent/friends.rs
//! Bounded, rank-ordered friend sets.

use std::cmp::Ordering;

/// Up to `capacity` point indices, best-ranked first, as seen by one owner.
///
/// The owner itself is never a member and members are distinct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FriendSet {
    members: Vec<usize>,
    capacity: usize,
}

impl FriendSet {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            members: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Members ordered from most to least preferred.
    #[must_use]
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.members.len() >= self.capacity
    }

    #[must_use]
    pub fn contains(&self, point: usize) -> bool {
        self.members.contains(&point)
    }

    /// The least preferred member.
    #[must_use]
    pub fn worst(&self) -> Option<usize> {
        self.members.last().copied()
    }

    /// Offers `candidate` to the set owned by `owner`.
    ///
    /// `cmp(a, b)` is the owner's ranking. While the set has room the
    /// candidate is inserted; once full, it replaces the worst member only
    /// when strictly preferred to it. Returns true if the set changed.
    pub fn offer<F>(&mut self, owner: usize, candidate: usize, cmp: F) -> bool
    where
        F: Fn(usize, usize) -> Ordering,
    {
        if candidate == owner || self.capacity == 0 || self.contains(candidate) {
            return false;
        }
        if self.is_full() {
            match self.worst() {
                Some(worst) if cmp(candidate, worst) == Ordering::Less => {
                    self.members.pop();
                }
                _ => return false,
            }
        }
        let position = self
            .members
            .partition_point(|&m| cmp(m, candidate) == Ordering::Less);
        self.members.insert(position, candidate);
        true
    }
}

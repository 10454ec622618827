//! Successor window for ring fault tolerance.

use crate::consts::SUCCESSOR_LIST_SIZE;
use crate::dht::Finger;
use crate::key::Key;

/// Fixed window of the successors beyond the immediate one.
///
/// The window is failover material only — it is consulted when the
/// immediate successor stops answering, and repaired one slot per
/// maintenance tick by chaining successors-of-successors. It never decides
/// ownership.
#[derive(Debug)]
pub struct SuccessorWindow {
    entries: Vec<Finger>,
    check_index: usize,
}

impl SuccessorWindow {
    /// A window with every slot pointing at `myself`.
    pub fn new(myself: Finger) -> Self {
        Self {
            entries: vec![myself; SUCCESSOR_LIST_SIZE],
            // The rotating repair starts over at slot 0 on the first tick.
            check_index: SUCCESSOR_LIST_SIZE,
        }
    }

    /// Slot `index` of the window.
    pub fn get(&self, index: usize) -> &Finger {
        &self.entries[index]
    }

    /// Replace slot `index`.
    pub fn set(&mut self, index: usize, finger: Finger) {
        self.entries[index] = finger;
    }

    /// Point every slot at `successor`. Used right after join.
    pub fn seed(&mut self, successor: Finger) {
        for entry in self.entries.iter_mut() {
            *entry = successor.clone();
        }
    }

    /// Advance the repair cursor, returning the slot to recompute.
    /// Slot 0 chains from the immediate successor; every later slot chains
    /// from the one before it.
    pub fn advance_check(&mut self) -> usize {
        self.check_index += 1;
        if self.check_index >= self.entries.len() {
            self.check_index = 0;
        }
        self.check_index
    }

    /// Shift the window left by one and return the promoted former head.
    /// The tail slot keeps its old value until the rotating repair
    /// re-derives it.
    pub fn promote_head(&mut self) -> Finger {
        let head = self.entries[0].clone();
        for index in 0..self.entries.len() - 1 {
            self.entries[index] = self.entries[index + 1].clone();
        }
        head
    }

    /// Snapshot of the window, nearest successor first.
    pub fn list(&self) -> Vec<Finger> {
        self.entries.clone()
    }

    /// The slot keys, nearest successor first.
    pub fn keys(&self) -> Vec<Key> {
        self.entries.iter().map(Finger::key).collect()
    }

    /// Number of slots in the window.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Windows are fixed-size; this mirrors `len` for completeness.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dht::RingNode;

    #[test]
    fn test_check_cursor_starts_at_zero_and_rotates() {
        let node = RingNode::with_key("a", Key::new(1));
        let mut window = SuccessorWindow::new(node.self_finger());

        assert_eq!(window.advance_check(), 0);
        for expected in 1..window.len() {
            assert_eq!(window.advance_check(), expected);
        }
        assert_eq!(window.advance_check(), 0);
    }

    #[test]
    fn test_promote_head_shifts_left() {
        let a = RingNode::with_key("a", Key::new(1));
        let b = RingNode::with_key("b", Key::new(50));
        let c = RingNode::with_key("c", Key::new(90));

        let mut window = SuccessorWindow::new(a.self_finger());
        window.set(0, b.self_finger());
        window.set(1, c.self_finger());

        let promoted = window.promote_head();
        assert_eq!(promoted.key(), Key::new(50));
        // Head now holds the next candidate; the tail keeps its value
        // until the repair pass replaces it.
        assert_eq!(window.keys(), vec![Key::new(90), Key::new(90)]);
    }

    #[test]
    fn test_seed_overwrites_all_slots() {
        let a = RingNode::with_key("a", Key::new(1));
        let b = RingNode::with_key("b", Key::new(2));

        let mut window = SuccessorWindow::new(a.self_finger());
        window.seed(b.self_finger());
        assert!(window.keys().iter().all(|k| *k == Key::new(2)));
    }
}

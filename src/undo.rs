//! The undo log (§4.I): a doubly-linked list of buffer snapshots backed by a
//! wrap-around ring, so history is bounded without ever needing to compact.
//!
//! Grounded on the reference editor's `UndoPush`/`UndoStateIsValid`/`ApplyUndoState`
//! and the `UNDO`/`REDO` branches of `DoCommand`. The reference allocates a
//! snapshot's header, text copy, and line copy as three separate steps from the
//! same byte-addressed ring, which lets a mid-push wraparound invalidate the header
//! it just allocated. This module owns its payload as ordinary heap `Vec`s rather
//! than raw ring bytes, so a snapshot is one atomically-sized [`crate::alloc::ring`]
//! allocation instead of three sequential ones; the observable behavior — a push
//! that doesn't fit is dropped silently and the edit proceeds, while history older
//! than the ring's capacity quietly stops being restorable — is unchanged.

use crate::alloc::ring::{Ring, Token};
use crate::buffer::Character;
use crate::degradation::DegradationLog;

/// Everything a restore needs to put the editor back exactly as it was: the text,
/// and the cursor/selection/scroll state that went with it.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub text: Vec<Character>,
    pub cursor_codepoint_index: usize,
    pub selection_anchor: Option<usize>,
    pub scroll_x: f32,
    pub scroll_y: f32,
}

struct Node {
    token: Token,
    prev: Option<usize>,
    next: Option<usize>,
    snapshot: Snapshot,
}

/// A bounded history of buffer snapshots. `push` is called before any destructive
/// edit; `undo`/`redo` walk the list, skipping (and reporting) snapshots the ring
/// has since evicted.
pub struct UndoLog {
    ring: Ring,
    nodes: Vec<Option<Node>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    /// The currently-applied snapshot, or `None` meaning "live state" (no undo has
    /// been applied since the last push, or a redo walked back to the tail).
    cursor: Option<usize>,
}

/// Per-character ring weight, standing in for the reference's per-byte accounting.
const HEADER_WEIGHT: usize = 1;

impl UndoLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: Ring::new(capacity),
            nodes: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            cursor: None,
        }
    }

    pub fn can_undo(&self) -> bool {
        match self.cursor {
            None => self.tail.is_some(),
            Some(idx) => self.nodes[idx].as_ref().and_then(|n| n.prev).is_some(),
        }
    }

    pub fn can_redo(&self) -> bool {
        self.cursor
            .and_then(|idx| self.nodes[idx].as_ref())
            .is_some_and(|n| n.next.is_some())
    }

    /// Records `snapshot` as the state to restore to if the caller later undoes past
    /// the edit they are about to make. If `undo_cursor` is active, first discards
    /// the redo tail and rewinds the ring to the point it was allocated from.
    pub fn push(&mut self, snapshot: Snapshot) {
        if let Some(cursor_idx) = self.cursor.take() {
            self.truncate_from(cursor_idx);
        }

        let weight = HEADER_WEIGHT + snapshot.text.len();
        let Some(token) = self.ring.alloc(weight) else {
            // Doesn't fit even in an empty ring; drop the snapshot, the edit still
            // proceeds without history for this step.
            return;
        };

        let node = Node {
            token,
            prev: self.tail,
            next: None,
            snapshot,
        };

        let index = match self.free.pop() {
            Some(index) => {
                self.nodes[index] = Some(node);
                index
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        };

        if let Some(tail) = self.tail {
            if let Some(tail_node) = self.nodes[tail].as_mut() {
                tail_node.next = Some(index);
            }
        } else {
            self.head = Some(index);
        }
        self.tail = Some(index);

        self.prune_evicted_prefix();
    }

    /// Drops `idx` and every node reachable via `next` from it, rewinding the ring
    /// to whatever came immediately before `idx`.
    fn truncate_from(&mut self, idx: usize) {
        let prev = self.nodes[idx].as_ref().and_then(|n| n.prev);

        match prev.and_then(|p| self.nodes[p].as_ref()) {
            Some(prev_node) => self.ring.rewind_to(prev_node.token),
            None => self.ring = Ring::new(self.ring.capacity()),
        }

        let mut cursor = Some(idx);
        while let Some(i) = cursor {
            cursor = self.nodes[i].take().and_then(|n| n.next);
            self.free.push(i);
        }

        self.tail = prev;
        if let Some(p) = prev {
            if let Some(node) = self.nodes[p].as_mut() {
                node.next = None;
            }
        } else {
            self.head = None;
        }
    }

    /// Frees any prefix of the list the ring has already overwritten, bounding
    /// memory to roughly the ring's own capacity. Eviction always hits the oldest
    /// surviving node first, so the first live node found ends the scan.
    fn prune_evicted_prefix(&mut self) {
        while let Some(h) = self.head {
            let valid = self.nodes[h].as_ref().is_some_and(|n| self.ring.is_valid(n.token));
            if valid {
                break;
            }
            let next = self.nodes[h].take().and_then(|n| n.next);
            self.free.push(h);
            self.head = next;
            match next {
                Some(n) => {
                    if let Some(node) = self.nodes[n].as_mut() {
                        node.prev = None;
                    }
                }
                None => self.tail = None,
            }
        }
    }

    /// Moves `undo_cursor` one step toward the past. Returns the snapshot to
    /// restore, or `None` if there is nothing left to undo, or the target has aged
    /// out of the ring (in which case
    /// [`Degradation::StaleUndoToken`](crate::Degradation::StaleUndoToken) is
    /// recorded and the cursor still advances, matching the reference).
    pub fn undo(&mut self, degradation: &mut DegradationLog) -> Option<Snapshot> {
        let target = match self.cursor {
            None => self.tail,
            Some(idx) => self.nodes[idx].as_ref().and_then(|n| n.prev),
        };
        let idx = target?;

        self.cursor = Some(idx);
        match self.nodes[idx].as_ref() {
            Some(node) if self.ring.is_valid(node.token) => Some(node.snapshot.clone()),
            _ => {
                degradation.mark_stale_undo_token();
                None
            }
        }
    }

    /// Moves `undo_cursor` one step toward the present. Returns `None` (a no-op)
    /// if the cursor is already live.
    pub fn redo(&mut self, degradation: &mut DegradationLog) -> Option<Snapshot> {
        let cursor_idx = self.cursor?;
        let next_idx = self.nodes[cursor_idx].as_ref().and_then(|n| n.next)?;

        self.cursor = Some(next_idx);
        match self.nodes[next_idx].as_ref() {
            Some(node) if self.ring.is_valid(node.token) => Some(node.snapshot.clone()),
            _ => {
                degradation.mark_stale_undo_token();
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Style;

    fn chars(s: &str) -> Vec<Character> {
        s.chars().map(|c| Character::new(c as u32, Style::REGULAR)).collect()
    }

    fn snap(s: &str) -> Snapshot {
        Snapshot {
            text: chars(s),
            cursor_codepoint_index: s.chars().count(),
            selection_anchor: None,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }

    #[test]
    fn undo_restores_the_previous_snapshot() {
        let mut log = UndoLog::new(1024);
        let mut degradation = DegradationLog::default();
        log.push(snap("a"));
        log.push(snap("ab"));

        assert_eq!(log.undo(&mut degradation).unwrap().text, chars("ab"));
        assert_eq!(log.undo(&mut degradation).unwrap().text, chars("a"));
        assert!(log.undo(&mut degradation).is_none());
    }

    #[test]
    fn redo_replays_forward_after_undo() {
        let mut log = UndoLog::new(1024);
        let mut degradation = DegradationLog::default();
        log.push(snap("a"));
        log.push(snap("ab"));

        log.undo(&mut degradation);
        log.undo(&mut degradation);
        assert_eq!(log.redo(&mut degradation).unwrap().text, chars("a"));
        assert!(!degradation.stale_undo_token());
    }

    #[test]
    fn a_fresh_push_after_undo_discards_the_redo_tail() {
        let mut log = UndoLog::new(1024);
        let mut degradation = DegradationLog::default();
        log.push(snap("a"));
        log.push(snap("ab"));

        log.undo(&mut degradation);
        log.push(snap("abx"));

        assert!(!log.can_redo());
    }

    #[test]
    fn a_snapshot_too_large_for_the_ring_is_dropped_without_blocking_future_pushes() {
        let mut log = UndoLog::new(4);
        log.push(snap("way too long to fit"));
        assert!(!log.can_undo());

        log.push(snap("ok"));
        assert!(log.can_undo());
    }

    #[test]
    fn eviction_prunes_history_the_ring_has_overwritten() {
        // Capacity 6: "a" (weight 2) then "bb" (weight 3) fit without wrapping,
        // leaving the ring at offset 5. "ccc" (weight 4) no longer fits before the
        // end and wraps, overwriting both earlier snapshots' regions.
        let mut log = UndoLog::new(6);
        let mut degradation = DegradationLog::default();
        log.push(snap("a"));
        log.push(snap("bb"));
        log.push(snap("ccc"));

        let restored = log.undo(&mut degradation).unwrap();
        assert_eq!(restored.text, chars("ccc"));
        assert!(!degradation.stale_undo_token());

        // Both earlier snapshots were pruned as stale; nothing left to undo to.
        assert!(!log.can_undo());
        assert!(log.undo(&mut degradation).is_none());
    }
}

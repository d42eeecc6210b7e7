//! Sticky degradation counters.
//!
//! None of the four kinds below abort the operation that triggered them; the editor
//! clamps, drops, or skips and keeps going. They are tracked out-of-band on the editor
//! rather than returned as `Result`, and are logged once each at `warning` the first
//! time they occur (see `Editor`'s call sites in [`crate::edit`] and [`crate::undo`]).

/// One of the four silent-degradation kinds the core distinguishes.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degradation {
    /// The character buffer was already at capacity; an insert was dropped.
    OutOfCapacity,
    /// A per-frame fixed-size array (lines, line glyphs, draw commands, selection
    /// rectangles) was saturated; excess items were discarded.
    LayoutOverflow,
    /// An undo/redo cursor pointed at a ring-evicted snapshot; the operation was a
    /// no-op but the cursor still advanced.
    StaleUndoToken,
    /// Invalid UTF-8 was skipped while decoding IME or clipboard input.
    DecodeError,
}

/// Sticky "has this ever happened" bits, one per [`Degradation`] kind.
///
/// Cheap to carry by value; `Editor` owns one and consults it after mutating
/// operations to decide whether a warning needs to be logged for the first time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DegradationLog {
    out_of_capacity: bool,
    layout_overflow: bool,
    stale_undo_token: bool,
    decode_error: bool,
}

impl DegradationLog {
    pub fn mark_out_of_capacity(&mut self) -> bool {
        !std::mem::replace(&mut self.out_of_capacity, true)
    }

    pub fn mark_layout_overflow(&mut self) -> bool {
        !std::mem::replace(&mut self.layout_overflow, true)
    }

    pub fn mark_stale_undo_token(&mut self) -> bool {
        !std::mem::replace(&mut self.stale_undo_token, true)
    }

    pub fn mark_decode_error(&mut self) -> bool {
        !std::mem::replace(&mut self.decode_error, true)
    }

    pub fn out_of_capacity(&self) -> bool {
        self.out_of_capacity
    }

    pub fn layout_overflow(&self) -> bool {
        self.layout_overflow
    }

    pub fn stale_undo_token(&self) -> bool {
        self.stale_undo_token
    }

    pub fn decode_error(&self) -> bool {
        self.decode_error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_returns_true_only_on_first_occurrence() {
        let mut log = DegradationLog::default();
        assert!(log.mark_out_of_capacity());
        assert!(!log.mark_out_of_capacity());
        assert!(log.out_of_capacity());
    }
}

//! The logical character buffer: an ordered, fixed-capacity sequence of styled
//! codepoints, grounded on the reference editor's `character`/`InsertCharacter`/
//! `DeleteCharacters`. Higher-level editing semantics (cursor motion, undo, IME) live
//! in [`crate::edit`]; this module only owns the array and its two shifting operations.

use crate::DegradationLog;

/// A 2-bit style mask. `Style::Regular` is the empty mask; `Bold`/`Italic` combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Style(u8);

impl Style {
    pub const REGULAR: Style = Style(0);
    pub const BOLD: Style = Style(1 << 0);
    pub const ITALIC: Style = Style(1 << 1);

    pub fn is_bold(self) -> bool {
        self.0 & Self::BOLD.0 != 0
    }

    pub fn is_italic(self) -> bool {
        self.0 & Self::ITALIC.0 != 0
    }

    /// Flips `style` on every set bit of `self`, leaving the rest untouched.
    pub fn toggle(&mut self, style: Style) {
        self.0 ^= style.0;
    }
}

impl std::ops::BitOr for Style {
    type Output = Style;
    fn bitor(self, rhs: Style) -> Style {
        Style(self.0 | rhs.0)
    }
}

/// Populated by the shaper during layout; a cache, not editing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BreakFlags(u16);

impl BreakFlags {
    pub const GRAPHEME: BreakFlags = BreakFlags(1 << 0);
    pub const WORD: BreakFlags = BreakFlags(1 << 1);
    pub const LINE_SOFT: BreakFlags = BreakFlags(1 << 2);
    pub const LINE_HARD: BreakFlags = BreakFlags(1 << 3);
    pub const PARAGRAPH_DIRECTION: BreakFlags = BreakFlags(1 << 4);

    pub fn empty() -> Self {
        BreakFlags(0)
    }

    pub fn contains(self, other: BreakFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: BreakFlags) {
        self.0 |= other.0;
    }
}

impl std::ops::BitOr for BreakFlags {
    type Output = BreakFlags;
    fn bitor(self, rhs: BreakFlags) -> BreakFlags {
        BreakFlags(self.0 | rhs.0)
    }
}

/// The finest-grained atom of editing: one styled codepoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Character {
    pub codepoint: u32,
    pub style: Style,
    pub break_flags: BreakFlags,
}

impl Character {
    pub fn new(codepoint: u32, style: Style) -> Self {
        Self {
            codepoint,
            style,
            break_flags: BreakFlags::empty(),
        }
    }
}

/// An ordered sequence of [`Character`]s, capacity fixed at construction.
///
/// Invariant: `len() <= capacity()`; indices are dense `[0, len())`.
pub struct Buffer {
    characters: Vec<Character>,
    capacity: usize,
}

impl Buffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            characters: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    pub fn as_slice(&self) -> &[Character] {
        &self.characters
    }

    pub fn as_mut_slice(&mut self) -> &mut [Character] {
        &mut self.characters
    }

    pub fn get(&self, index: usize) -> Option<Character> {
        self.characters.get(index).copied()
    }

    /// Overwrites the buffer wholesale, e.g. when restoring an undo snapshot. The
    /// caller guarantees `text.len() <= capacity()`.
    pub fn restore(&mut self, text: &[Character]) {
        debug_assert!(text.len() <= self.capacity);
        self.characters.clear();
        self.characters.extend_from_slice(text);
    }

    /// Inserts one character at `pos`, shifting the tail right by one.
    ///
    /// Fails silently (recording [`crate::Degradation::OutOfCapacity`]) when the buffer is
    /// already at capacity; `pos` is clamped to `[0, len()]`.
    pub fn insert_char(&mut self, pos: usize, ch: Character, degradation: &mut DegradationLog) {
        if self.characters.len() >= self.capacity {
            degradation.mark_out_of_capacity();
            return;
        }

        let pos = pos.min(self.characters.len());
        self.characters.insert(pos, ch);
    }

    /// Removes `[start, end)`, shifting the tail left by `end - start`.
    ///
    /// Out-of-range indices (`start > end`, `end > len()`) are a no-op, matching the
    /// reference editor's `DeleteCharacters` contract.
    pub fn delete_range(&mut self, start: usize, end: usize) {
        if end <= start || end > self.characters.len() {
            return;
        }

        self.characters.drain(start..end);
    }

    /// Toggles `style` over every character in `[start, end)`.
    pub fn toggle_style(&mut self, start: usize, end: usize, style: Style) {
        for ch in &mut self.characters[start.min(self.characters.len())..end.min(self.characters.len())] {
            ch.style.toggle(style);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ch(cp: char) -> Character {
        Character::new(cp as u32, Style::REGULAR)
    }

    #[test]
    fn insert_shifts_tail_right() {
        let mut buf = Buffer::new(8);
        let mut deg = DegradationLog::default();
        buf.insert_char(0, ch('a'), &mut deg);
        buf.insert_char(1, ch('c'), &mut deg);
        buf.insert_char(1, ch('b'), &mut deg);
        assert_eq!(
            buf.as_slice().iter().map(|c| c.codepoint).collect::<Vec<_>>(),
            vec!['a' as u32, 'b' as u32, 'c' as u32]
        );
    }

    #[test]
    fn insert_at_capacity_is_silently_dropped() {
        let mut buf = Buffer::new(1);
        let mut deg = DegradationLog::default();
        buf.insert_char(0, ch('a'), &mut deg);
        buf.insert_char(1, ch('b'), &mut deg);
        assert_eq!(buf.len(), 1);
        assert!(deg.out_of_capacity());
    }

    #[test]
    fn delete_range_shifts_tail_left() {
        let mut buf = Buffer::new(8);
        let mut deg = DegradationLog::default();
        for c in "abcdef".chars() {
            buf.insert_char(buf.len(), ch(c), &mut deg);
        }
        buf.delete_range(1, 3);
        assert_eq!(
            buf.as_slice().iter().map(|c| c.codepoint).collect::<Vec<_>>(),
            "adef".chars().map(|c| c as u32).collect::<Vec<_>>()
        );
    }

    #[test]
    fn delete_out_of_range_is_a_no_op() {
        let mut buf = Buffer::new(8);
        let mut deg = DegradationLog::default();
        buf.insert_char(0, ch('a'), &mut deg);
        buf.delete_range(0, 5);
        assert_eq!(buf.len(), 1);
        buf.delete_range(2, 1);
        assert_eq!(buf.len(), 1);
    }

    #[test]
    fn toggle_style_xors_the_selection() {
        let mut buf = Buffer::new(8);
        let mut deg = DegradationLog::default();
        for c in "abc".chars() {
            buf.insert_char(buf.len(), ch(c), &mut deg);
        }
        buf.toggle_style(0, 3, Style::BOLD);
        assert!(buf.as_slice().iter().all(|c| c.style.is_bold()));
        buf.toggle_style(1, 2, Style::BOLD);
        assert!(buf.get(1).unwrap().style.is_bold() == false);
    }
}

//! The draw-list builder (§4.G): the externally visible output of one frame.
//!
//! Grounded on the reference editor's `draw_command`/`draw_command_list`/`draw_box`.
//! The list is only valid for the frame that produced it; callers must not retain
//! indices into it past the next call to [`crate::editor::Editor::draw`].

use crate::degradation::DegradationLog;

/// An axis-aligned box, open on the high end: `[min, max)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxF {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl BoxF {
    pub fn invalid() -> Self {
        Self {
            min_x: f32::MAX,
            min_y: f32::MAX,
            max_x: f32::MIN,
            max_y: f32::MIN,
        }
    }

    /// Only the X bounds are meaningful at flush time; Y is filled in during the
    /// second pass, so validity is tested on `min_x` alone (mirrors the reference's
    /// `DrawBoxIsValid`).
    pub fn is_valid(self) -> bool {
        self.min_x != f32::MAX
    }

    pub fn union(self, other: Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn union_point(self, x: f32, y: f32) -> Self {
        self.union(Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        })
    }

    pub fn width(self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(self) -> f32 {
        self.max_y - self.min_y
    }

    pub fn overlaps(self, other: Self) -> bool {
        self.max_x >= other.min_x
            && self.min_x < other.max_x
            && self.max_y >= other.min_y
            && self.min_y < other.max_y
    }

    pub fn translated(self, dx: f32, dy: f32) -> Self {
        Self {
            min_x: self.min_x + dx,
            min_y: self.min_y + dy,
            max_x: self.max_x + dx,
            max_y: self.max_y + dy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrawCommandFlags(u8);

impl DrawCommandFlags {
    pub const SELECTED: DrawCommandFlags = DrawCommandFlags(1 << 0);
    pub const VISIBLE: DrawCommandFlags = DrawCommandFlags(1 << 1);

    pub fn empty() -> Self {
        DrawCommandFlags(0)
    }

    pub fn contains(self, other: DrawCommandFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for DrawCommandFlags {
    type Output = DrawCommandFlags;
    fn bitor(self, rhs: DrawCommandFlags) -> DrawCommandFlags {
        DrawCommandFlags(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for DrawCommandFlags {
    fn bitor_assign(&mut self, rhs: DrawCommandFlags) {
        self.0 |= rhs.0;
    }
}

/// One positioned glyph, ready to be rasterized by the caller. `F` is the
/// rasterizer's own font handle type, carried through so the caller never has to
/// re-resolve it from a font index.
#[derive(Debug, Clone)]
pub struct DrawCommand<F> {
    pub font: F,
    pub glyph_id: u32,
    pub codepoint_index: usize,
    pub x: f32,
    pub y: f32,
    pub scale: f32,
    pub scaled_width: f32,
    pub scaled_height: f32,
    pub flags: DrawCommandFlags,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DrawCursor {
    pub x: f32,
    pub y: f32,
}

/// The frame's complete visible output: glyph draw commands, selection boxes,
/// cursor position, and scrollbar thumb extents in `[0, 1]`.
pub struct DrawList<F> {
    pub commands: Vec<DrawCommand<F>>,
    commands_capacity: usize,
    pub selections: Vec<BoxF>,
    selections_capacity: usize,
    pub cursor: DrawCursor,
    pub scroll_min_x: f32,
    pub scroll_max_x: f32,
    pub scroll_min_y: f32,
    pub scroll_max_y: f32,
    /// Codepoint index one past the glyph currently closest to the cursor, tracked
    /// across every line in the document so the single best match wins.
    pub(crate) closest_codepoint_index_to_cursor_plus_one: Option<usize>,
    /// Index of the line that last set [`DrawList::cursor`], so the second pass
    /// knows which line's alignment offset and scroll translation to apply to it.
    pub(crate) cursor_line_index: Option<usize>,
}

impl<F> DrawList<F> {
    pub fn new(commands_capacity: usize, selections_capacity: usize) -> Self {
        Self {
            commands: Vec::new(),
            commands_capacity,
            selections: Vec::new(),
            selections_capacity,
            cursor: DrawCursor::default(),
            scroll_min_x: 0.0,
            scroll_max_x: 1.0,
            scroll_min_y: 0.0,
            scroll_max_y: 1.0,
            closest_codepoint_index_to_cursor_plus_one: None,
            cursor_line_index: None,
        }
    }

    /// Clears everything but the capacities, so the list can be reused frame to
    /// frame without reallocating its backing vectors.
    pub fn begin_frame(&mut self) {
        self.commands.clear();
        self.selections.clear();
        self.cursor = DrawCursor::default();
        self.scroll_min_x = 0.0;
        self.scroll_max_x = 1.0;
        self.scroll_min_y = 0.0;
        self.scroll_max_y = 1.0;
        self.closest_codepoint_index_to_cursor_plus_one = None;
        self.cursor_line_index = None;
    }

    pub(crate) fn push_command(&mut self, command: DrawCommand<F>, degradation: &mut DegradationLog) {
        if self.commands.len() >= self.commands_capacity {
            degradation.mark_layout_overflow();
            return;
        }
        self.commands.push(command);
    }

    pub(crate) fn push_selection(&mut self, selection: BoxF, degradation: &mut DegradationLog) {
        if self.selections.len() >= self.selections_capacity {
            degradation.mark_layout_overflow();
            return;
        }
        self.selections.push(selection);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_box_is_not_valid() {
        assert!(!BoxF::invalid().is_valid());
    }

    #[test]
    fn union_grows_to_cover_both_boxes() {
        let a = BoxF { min_x: 0.0, min_y: 0.0, max_x: 1.0, max_y: 1.0 };
        let b = BoxF { min_x: -1.0, min_y: 2.0, max_x: 0.5, max_y: 3.0 };
        let u = a.union(b);
        assert_eq!(u, BoxF { min_x: -1.0, min_y: 0.0, max_x: 1.0, max_y: 3.0 });
    }

    #[test]
    fn command_capacity_overflow_is_a_degradation_not_a_panic() {
        let mut list: DrawList<()> = DrawList::new(1, 1);
        let mut degradation = DegradationLog::default();
        let command = DrawCommand {
            font: (),
            glyph_id: 0,
            codepoint_index: 0,
            x: 0.0,
            y: 0.0,
            scale: 1.0,
            scaled_width: 1.0,
            scaled_height: 1.0,
            flags: DrawCommandFlags::empty(),
        };
        list.push_command(command.clone(), &mut degradation);
        list.push_command(command, &mut degradation);
        assert_eq!(list.commands.len(), 1);
        assert!(degradation.layout_overflow());
    }
}

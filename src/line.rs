//! The line model (§4.F): per-line geometry, codepoint ranges, selection
//! rectangles, cursor snapping, and the scroll/alignment/visibility second pass.
//!
//! Grounded on the reference editor's `FlushLine`, `AlignmentOffsetXForLine`, and
//! the second pass at the end of `Draw()`.

use std::collections::VecDeque;

use crate::alloc::arena::Arena;
use crate::degradation::DegradationLog;
use crate::draw::{BoxF, DrawCommand, DrawCommandFlags, DrawCursor, DrawList};
use crate::flow::FlowGlyph;
use crate::rasterizer::Rasterizer;
use crate::shape::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlignment {
    #[default]
    DontKnow,
    Left,
    Right,
    Center,
}

/// Offset to add to every glyph's X so the line lands at its alignment within a
/// paragraph of width `text_width`.
pub fn alignment_offset_x(line_width: f32, text_width: f32, alignment: TextAlignment) -> f32 {
    match alignment {
        TextAlignment::Center => (text_width - line_width) * 0.5,
        TextAlignment::Right => text_width - line_width,
        TextAlignment::Left | TextAlignment::DontKnow => 0.0,
    }
}

/// Frame-constant inputs to [`flush_line`], bundled since Rust has no implicit
/// "current editor" the way the reference editor threads one `editor*` everywhere.
pub struct FlushContext<'a, R: Rasterizer> {
    pub rasterizer: &'a R,
    pub ascent: f32,
    pub display_newlines: bool,
    /// `[start, end)` codepoint range currently selected, if any.
    pub selection: Option<(usize, usize)>,
    pub cursor_codepoint_index: usize,
    pub keep_desired_x: bool,
}

/// Cursor placement carried forward across lines during a flush pass; unlike
/// [`DrawList::cursor`] this lives on the editor, not the frame output.
#[derive(Debug, Clone, Copy, Default)]
pub struct CursorSnapState {
    pub desired_x: f32,
    pub line_index: usize,
}

/// One laid-out line: a visual (not logical) sequence of glyphs plus the geometry
/// and draw-list ranges computed for it by [`flush_line`].
pub struct Line<R: Rasterizer> {
    glyphs: VecDeque<FlowGlyph<R>>,
    capacity: usize,

    direction: Option<Direction>,
    pub preferred_alignment: TextAlignment,
    pub actual_alignment: TextAlignment,

    pub glyph_box: BoxF,
    pub min_codepoint_index: Option<usize>,
    pub max_codepoint_index: Option<usize>,

    pub first_command_index: usize,
    pub one_past_last_command_index: usize,
    pub first_selection_index: usize,
    pub one_past_last_selection_index: usize,
}

impl<R: Rasterizer> Line<R> {
    fn new(capacity: usize, preferred_alignment: TextAlignment) -> Self {
        Self {
            glyphs: VecDeque::new(),
            capacity,
            direction: None,
            preferred_alignment,
            actual_alignment: preferred_alignment,
            glyph_box: BoxF::invalid(),
            min_codepoint_index: None,
            max_codepoint_index: None,
            first_command_index: 0,
            one_past_last_command_index: 0,
            first_selection_index: 0,
            one_past_last_selection_index: 0,
        }
    }

    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    pub fn glyphs(&self) -> impl Iterator<Item = &FlowGlyph<R>> {
        self.glyphs.iter()
    }

    fn ensure_direction(&mut self, paragraph_direction: Direction) {
        if self.direction.is_none() {
            self.direction = Some(paragraph_direction);
            if self.preferred_alignment == TextAlignment::DontKnow {
                self.actual_alignment = if paragraph_direction.is_rtl() {
                    TextAlignment::Right
                } else {
                    TextAlignment::Left
                };
            }
        }
    }

    /// Appends a chunk already in global visual left-to-right order, growing the
    /// line's own buffer from the left for LTR lines or the right for RTL lines (so
    /// a later-arriving chunk on an RTL line lands to the left of earlier ones).
    fn append(&mut self, chunk: &[FlowGlyph<R>], degradation: &mut DegradationLog) {
        let room = self.capacity.saturating_sub(self.glyphs.len());
        let chunk = if chunk.len() > room {
            degradation.mark_layout_overflow();
            &chunk[..room]
        } else {
            chunk
        };

        if self.direction == Some(Direction::Rtl) {
            for glyph in chunk.iter().rev() {
                self.glyphs.push_front(glyph.clone());
            }
        } else {
            self.glyphs.extend(chunk.iter().cloned());
        }
    }
}

/// Owns every finished [`Line`] plus the one currently accumulating glyphs.
///
/// Finished lines live in an [`Arena`] rather than a `Vec`: the whole set is
/// released in one shot at the start of every frame's `begin`, the same way the
/// reference editor rewinds its line arena at the top of `Draw()`.
pub struct LineLayout<R: Rasterizer> {
    lines: Arena<Line<R>>,
    current: Option<Line<R>>,
    line_capacity: usize,
    line_glyph_capacity: usize,
    preferred_alignment: TextAlignment,
    cursor_y: f32,
    line_height: f32,
    text_bounds: BoxF,
}

impl<R: Rasterizer> LineLayout<R> {
    pub fn new(line_capacity: usize, line_glyph_capacity: usize, preferred_alignment: TextAlignment) -> Self {
        Self {
            lines: Arena::with_capacity(line_capacity),
            current: None,
            line_capacity,
            line_glyph_capacity,
            preferred_alignment,
            cursor_y: 0.0,
            line_height: 0.0,
            text_bounds: BoxF::invalid(),
        }
    }

    /// Resets for a new frame and opens the first line.
    pub fn begin(&mut self, line_height: f32) {
        self.lines.reset();
        self.cursor_y = 0.0;
        self.line_height = line_height;
        self.text_bounds = BoxF::invalid();
        self.open_line();
    }

    fn open_line(&mut self) {
        self.current = (self.lines.len() < self.line_capacity)
            .then(|| Line::new(self.line_glyph_capacity, self.preferred_alignment));
    }

    pub fn ensure_line_direction(&mut self, paragraph_direction: Direction, degradation: &mut DegradationLog) {
        match &mut self.current {
            Some(line) => line.ensure_direction(paragraph_direction),
            None => {
                degradation.mark_layout_overflow();
            }
        }
    }

    pub fn append_glyphs(&mut self, chunk: &[FlowGlyph<R>], degradation: &mut DegradationLog) {
        match &mut self.current {
            Some(line) => line.append(chunk, degradation),
            None => {
                degradation.mark_layout_overflow();
            }
        }
    }

    fn end_line(
        &mut self,
        ctx: &FlushContext<'_, R>,
        draw_list: &mut DrawList<R::Font>,
        cursor_state: &mut CursorSnapState,
        degradation: &mut DegradationLog,
    ) {
        if let Some(mut line) = self.current.take() {
            let line_index = self.lines.len();
            line.first_command_index = draw_list.commands.len();
            line.first_selection_index = draw_list.selections.len();

            flush_line(ctx, &mut line, draw_list, cursor_state, self.cursor_y, line_index, degradation);

            line.one_past_last_command_index = draw_list.commands.len();
            line.one_past_last_selection_index = draw_list.selections.len();

            self.text_bounds = self.text_bounds.union(line.glyph_box);
            // Never `None`: `open_line` only leaves `current` set once the arena has
            // room for one more line.
            self.lines.push(line);
            self.cursor_y += self.line_height;
        }
    }

    /// Ends the current line and opens a fresh one. Used both for hard breaks and
    /// for wrap-induced soft breaks.
    pub fn next_line(
        &mut self,
        ctx: &FlushContext<'_, R>,
        draw_list: &mut DrawList<R::Font>,
        cursor_state: &mut CursorSnapState,
        degradation: &mut DegradationLog,
    ) {
        self.end_line(ctx, draw_list, cursor_state, degradation);
        self.open_line();
    }

    /// Ends the trailing line, unless it is both empty and not the only line —
    /// dropping a spurious empty line when text ends cleanly at a line boundary,
    /// while still guaranteeing at least one `Line` for a wholly empty document.
    pub fn end_lines(
        &mut self,
        ctx: &FlushContext<'_, R>,
        draw_list: &mut DrawList<R::Font>,
        cursor_state: &mut CursorSnapState,
        degradation: &mut DegradationLog,
    ) {
        let should_flush = match &self.current {
            Some(line) => line.glyph_count() > 0 || self.lines.is_empty(),
            None => false,
        };
        if should_flush {
            self.end_line(ctx, draw_list, cursor_state, degradation);
        }
    }

    pub fn lines(&self) -> &[Line<R>] {
        self.lines.as_slice()
    }

    pub fn text_bounds(&self) -> BoxF {
        self.text_bounds
    }

    pub fn line_height(&self) -> f32 {
        self.line_height
    }
}

/// Walks one closed line's glyphs to compute its geometry: the glyph bounding box,
/// codepoint range, one draw command per glyph, one selection rectangle per
/// direction run, and the cursor snap position. Grounded on the reference editor's
/// `FlushLine`.
#[allow(clippy::too_many_arguments)]
fn flush_line<R: Rasterizer>(
    ctx: &FlushContext<'_, R>,
    line: &mut Line<R>,
    draw_list: &mut DrawList<R::Font>,
    cursor_state: &mut CursorSnapState,
    cursor_y: f32,
    line_index: usize,
    degradation: &mut DegradationLog,
) {
    let mut cursor_x = 0.0f32;
    let mut glyph_y_cursor = cursor_y;
    let ascent_px = ctx.ascent;

    let mut current_direction: Option<Direction> = None;
    let mut selection_box = BoxF::invalid();

    for glyph in line.glyphs.iter() {
        let scale = glyph.scale;

        if current_direction != Some(glyph.direction) {
            if selection_box.is_valid() {
                draw_list.push_selection(selection_box, degradation);
            }
            selection_box = BoxF::invalid();
            current_direction = Some(glyph.direction);
        }

        line.min_codepoint_index = Some(
            line.min_codepoint_index
                .map_or(glyph.codepoint_index, |m| m.min(glyph.codepoint_index)),
        );
        line.max_codepoint_index = Some(
            line.max_codepoint_index
                .map_or(glyph.codepoint_index, |m| m.max(glyph.codepoint_index)),
        );

        let do_not_display = !ctx.display_newlines && glyph.is_newline;
        let mut advance_x = glyph.advance_x * scale;
        let advance_y = glyph.advance_y * scale;
        if do_not_display {
            advance_x = 0.0;
        }

        let selected = ctx
            .selection
            .is_some_and(|(start, end)| glyph.codepoint_index >= start && glyph.codepoint_index < end);

        let bbox = ctx.rasterizer.glyph_bitmap_box_subpixel(&glyph.font, glyph.id, scale, 0.0, 0.0);
        let mut max_x = bbox.max_x;
        if do_not_display {
            // Zero width keeps the command around as an end-of-line sentinel
            // without ever being marked visible.
            max_x = bbox.min_x;
        }

        let glyph_x = cursor_x + glyph.offset_x * scale;
        let glyph_y = ascent_px + glyph_y_cursor - glyph.offset_y * scale;
        let glyph_w = max_x - bbox.min_x;
        let glyph_h = bbox.max_y - bbox.min_y;

        let mut flags = DrawCommandFlags::empty();
        if selected {
            flags |= DrawCommandFlags::SELECTED;
        }

        draw_list.push_command(
            DrawCommand {
                font: glyph.font.clone(),
                glyph_id: glyph.id,
                codepoint_index: glyph.codepoint_index,
                x: glyph_x,
                y: glyph_y,
                scale,
                scaled_width: glyph_w,
                scaled_height: glyph_h,
                flags,
            },
            degradation,
        );

        line.glyph_box = line.glyph_box.union(BoxF {
            min_x: glyph_x,
            min_y: glyph_y,
            max_x: glyph_x + glyph_w,
            max_y: glyph_y + glyph_h,
        });

        if selected {
            selection_box.min_x = selection_box.min_x.min(cursor_x).min(cursor_x + advance_x);
            selection_box.max_x = selection_box.max_x.max(cursor_x).max(cursor_x + advance_x);
            selection_box.min_y = selection_box.min_y.min(glyph_y_cursor);
            // The line's final height isn't known yet; filled in once the line
            // closes, by the second pass (§4.F step 6).
            selection_box.max_y = f32::NEG_INFINITY;
        }

        let closest = draw_list.closest_codepoint_index_to_cursor_plus_one;
        let is_closer = if glyph.direction.is_rtl() {
            glyph.codepoint_index <= ctx.cursor_codepoint_index
                && closest.is_none_or(|c| glyph.codepoint_index + 1 >= c)
        } else {
            glyph.codepoint_index <= ctx.cursor_codepoint_index
                && closest.is_none_or(|c| glyph.codepoint_index + 1 > c)
        };

        if is_closer {
            draw_list.closest_codepoint_index_to_cursor_plus_one = Some(glyph.codepoint_index + 1);
            draw_list.cursor_line_index = Some(line_index);

            draw_list.cursor = if glyph.direction.is_rtl() {
                DrawCursor { x: cursor_x + advance_x, y: glyph_y_cursor - advance_y }
            } else {
                DrawCursor { x: cursor_x, y: glyph_y_cursor }
            };

            if !ctx.keep_desired_x {
                cursor_state.desired_x = if glyph.direction.is_rtl() { cursor_x + advance_x } else { cursor_x };
                cursor_state.line_index = line_index;
            }
        }

        cursor_x += advance_x;
        glyph_y_cursor -= advance_y;
    }

    if selection_box.is_valid() {
        draw_list.push_selection(selection_box, degradation);
    }
}

/// Finds the codepoint whose draw command's horizontal center is closest to (and
/// on the correct side of) `x`, for vertical cursor motion and mouse clicks.
/// Grounded on the reference editor's line-x-to-codepoint snapping used by
/// `MoveCursor`'s vertical paths and `MOUSE_PRESS`.
pub fn line_codepoint_index_at_x<F>(
    commands: &[DrawCommand<F>],
    first_command_index: usize,
    one_past_last_command_index: usize,
    fallback_codepoint_index: usize,
    x: f32,
) -> usize {
    let mut best = fallback_codepoint_index;
    let mut best_distance = f32::MAX;
    for command in &commands[first_command_index..one_past_last_command_index] {
        let center = command.x + command.scaled_width * 0.5;
        let distance = (center - x).abs();
        if distance < best_distance {
            best_distance = distance;
            best = command.codepoint_index;
        }
    }
    best
}

/// Extra horizontal scroll room past the last glyph, so the cursor is never
/// flush against the viewport's right edge when it sits at end-of-line.
///
/// `pub(crate)` so [`crate::editor::Editor`] can compute the same `max_scroll_x`
/// this pass uses when answering a `ScrollAbsolute01` command between frames.
pub(crate) const CURSOR_THICKNESS: f32 = 2.0;

/// The second pass (§4.F step 6): clamps scroll to content bounds, pulls the
/// viewport to include the cursor if requested, translates every line's draw
/// commands and selections from line-local to viewport coordinates applying
/// per-line alignment and the resolved scroll offset, fills in the selection
/// boxes' deferred `max_y`, marks commands overlapping the viewport visible, and
/// leaves the scrollbar thumb extents in `[0, 1]` on `draw_list`.
///
/// Grounded on the reference editor's `Draw()` tail: `AlignmentOffsetXForLine`,
/// the viewport-inclusion clamp, and the visibility/scrollbar computation.
#[allow(clippy::too_many_arguments)]
pub fn finish_frame<R: Rasterizer>(
    lines: &LineLayout<R>,
    draw_list: &mut DrawList<R::Font>,
    scroll_x: &mut f32,
    scroll_y: &mut f32,
    include_cursor_in_viewport: bool,
    ascent: f32,
    viewport_width: f32,
    viewport_height: f32,
) {
    let text_bounds = lines.text_bounds();
    let text_width = if text_bounds.is_valid() { text_bounds.width().max(0.0) } else { 0.0 };

    let max_scroll_x = (text_width - viewport_width + CURSOR_THICKNESS).max(0.0);
    // Line-position-based, not content-height-vs-viewport-based: the last line's
    // top edge (its `glyph_box.min_y`, with the ascent baked back out) is how far
    // past the viewport's top the content can still be pulled, regardless of
    // whether the whole document is shorter than one viewport.
    let last_line_min_y = lines
        .lines()
        .last()
        .map(|line| if line.glyph_box.is_valid() { line.glyph_box.min_y } else { 0.0 })
        .unwrap_or(0.0);
    let max_scroll_y = (last_line_min_y - ascent).max(0.0);

    if include_cursor_in_viewport {
        let cursor = draw_list.cursor;
        if cursor.x < *scroll_x {
            *scroll_x = cursor.x;
        } else if cursor.x > *scroll_x + viewport_width - CURSOR_THICKNESS {
            *scroll_x = cursor.x - viewport_width + CURSOR_THICKNESS;
        }
        if cursor.y < *scroll_y {
            *scroll_y = cursor.y;
        } else if cursor.y + lines.line_height() > *scroll_y + viewport_height {
            *scroll_y = cursor.y + lines.line_height() - viewport_height;
        }
    }

    *scroll_x = scroll_x.clamp(0.0, max_scroll_x);
    *scroll_y = scroll_y.clamp(0.0, max_scroll_y);

    let viewport = BoxF { min_x: 0.0, min_y: 0.0, max_x: viewport_width, max_y: viewport_height };

    for (line_index, line) in lines.lines().iter().enumerate() {
        let line_width = if line.glyph_box.is_valid() { line.glyph_box.width().max(0.0) } else { 0.0 };
        let offset_x = alignment_offset_x(line_width, text_width, line.actual_alignment) - *scroll_x;
        let offset_y = -*scroll_y;

        for command in &mut draw_list.commands[line.first_command_index..line.one_past_last_command_index] {
            command.x += offset_x;
            command.y += offset_y;
            let command_box = BoxF {
                min_x: command.x,
                min_y: command.y,
                max_x: command.x + command.scaled_width,
                max_y: command.y + command.scaled_height,
            };
            if command_box.overlaps(viewport) {
                command.flags |= DrawCommandFlags::VISIBLE;
            }
        }

        for selection in &mut draw_list.selections[line.first_selection_index..line.one_past_last_selection_index] {
            if selection.max_y == f32::NEG_INFINITY {
                selection.max_y = selection.min_y + lines.line_height();
            }
            selection.min_x += offset_x;
            selection.max_x += offset_x;
            selection.min_y += offset_y;
            selection.max_y += offset_y;
        }

        if draw_list.cursor_line_index == Some(line_index) {
            draw_list.cursor.x += offset_x;
            draw_list.cursor.y += offset_y;
        }
    }

    draw_list.scroll_min_x = if max_scroll_x > 0.0 { *scroll_x / max_scroll_x } else { 0.0 };
    draw_list.scroll_max_x =
        if max_scroll_x > 0.0 { ((*scroll_x + viewport_width) / (text_width.max(viewport_width))).min(1.0) } else { 1.0 };
    let scroll_area_height = max_scroll_y + viewport_height;
    draw_list.scroll_min_y = if max_scroll_y > 0.0 { *scroll_y / max_scroll_y } else { 0.0 };
    draw_list.scroll_max_y =
        if max_scroll_y > 0.0 { ((*scroll_y + viewport_height) / scroll_area_height).min(1.0) } else { 1.0 };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::BreakFlags;
    use crate::rasterizer::test_support::TestRasterizer;

    fn glyph(codepoint_index: usize, direction: Direction) -> FlowGlyph<TestRasterizer> {
        FlowGlyph {
            font: (),
            id: codepoint_index as u32,
            codepoint_index,
            direction,
            advance_x: 1.0,
            advance_y: 0.0,
            offset_x: 0.0,
            offset_y: 0.0,
            scale: 10.0,
            break_flags: BreakFlags::empty(),
            no_shape_break: false,
            is_newline: false,
        }
    }

    #[test]
    fn empty_document_still_produces_one_line() {
        let mut lines = LineLayout::<TestRasterizer>::new(8, 64, TextAlignment::DontKnow);
        lines.begin(12.0);
        let rasterizer = TestRasterizer;
        let ctx = FlushContext {
            rasterizer: &rasterizer,
            ascent: 8.0,
            display_newlines: false,
            selection: None,
            cursor_codepoint_index: 0,
            keep_desired_x: false,
        };
        let mut draw_list = DrawList::new(16, 16);
        let mut cursor_state = CursorSnapState::default();
        let mut degradation = DegradationLog::default();

        lines.end_lines(&ctx, &mut draw_list, &mut cursor_state, &mut degradation);

        assert_eq!(lines.lines().len(), 1);
    }

    #[test]
    fn alignment_offset_centers_a_short_line() {
        assert_eq!(alignment_offset_x(10.0, 30.0, TextAlignment::Center), 10.0);
        assert_eq!(alignment_offset_x(10.0, 30.0, TextAlignment::Right), 20.0);
        assert_eq!(alignment_offset_x(10.0, 30.0, TextAlignment::Left), 0.0);
    }

    #[test]
    fn cursor_snaps_to_the_closest_codepoint_not_past_the_cursor() {
        let mut lines = LineLayout::<TestRasterizer>::new(8, 64, TextAlignment::DontKnow);
        lines.begin(12.0);
        lines.ensure_line_direction(Direction::Ltr, &mut DegradationLog::default());
        lines.append_glyphs(
            &[glyph(0, Direction::Ltr), glyph(1, Direction::Ltr), glyph(2, Direction::Ltr)],
            &mut DegradationLog::default(),
        );

        let rasterizer = TestRasterizer;
        let ctx = FlushContext {
            rasterizer: &rasterizer,
            ascent: 8.0,
            display_newlines: false,
            selection: None,
            cursor_codepoint_index: 1,
            keep_desired_x: false,
        };
        let mut draw_list = DrawList::new(16, 16);
        let mut cursor_state = CursorSnapState::default();
        let mut degradation = DegradationLog::default();

        lines.end_lines(&ctx, &mut draw_list, &mut cursor_state, &mut degradation);

        assert_eq!(draw_list.closest_codepoint_index_to_cursor_plus_one, Some(2));
        assert_eq!(draw_list.cursor.x, 10.0); // two glyphs of advance 1.0 * scale 10.0
    }

    #[test]
    fn selected_codepoints_produce_a_selection_rectangle() {
        let mut lines = LineLayout::<TestRasterizer>::new(8, 64, TextAlignment::DontKnow);
        lines.begin(12.0);
        lines.ensure_line_direction(Direction::Ltr, &mut DegradationLog::default());
        lines.append_glyphs(
            &[glyph(0, Direction::Ltr), glyph(1, Direction::Ltr), glyph(2, Direction::Ltr)],
            &mut DegradationLog::default(),
        );

        let rasterizer = TestRasterizer;
        let ctx = FlushContext {
            rasterizer: &rasterizer,
            ascent: 8.0,
            display_newlines: false,
            selection: Some((1, 2)),
            cursor_codepoint_index: 2,
            keep_desired_x: false,
        };
        let mut draw_list = DrawList::new(16, 16);
        let mut cursor_state = CursorSnapState::default();
        let mut degradation = DegradationLog::default();

        lines.end_lines(&ctx, &mut draw_list, &mut cursor_state, &mut degradation);

        assert_eq!(draw_list.selections.len(), 1);
        let selection = draw_list.selections[0];
        assert_eq!(selection.min_x, 10.0);
        assert_eq!(selection.max_x, 20.0);
    }

    #[test]
    fn finish_frame_clamps_scroll_to_content_width() {
        let mut lines = LineLayout::<TestRasterizer>::new(8, 64, TextAlignment::DontKnow);
        lines.begin(12.0);
        lines.ensure_line_direction(Direction::Ltr, &mut DegradationLog::default());
        lines.append_glyphs(
            &[glyph(0, Direction::Ltr), glyph(1, Direction::Ltr), glyph(2, Direction::Ltr)],
            &mut DegradationLog::default(),
        );

        let rasterizer = TestRasterizer;
        let ctx = FlushContext {
            rasterizer: &rasterizer,
            ascent: 8.0,
            display_newlines: false,
            selection: None,
            cursor_codepoint_index: 0,
            keep_desired_x: false,
        };
        let mut draw_list = DrawList::new(16, 16);
        let mut cursor_state = CursorSnapState::default();
        let mut degradation = DegradationLog::default();
        lines.end_lines(&ctx, &mut draw_list, &mut cursor_state, &mut degradation);

        let mut scroll_x = 1000.0;
        let mut scroll_y = 1000.0;
        finish_frame(&lines, &mut draw_list, &mut scroll_x, &mut scroll_y, false, 8.0, 50.0, 50.0);

        // Three glyphs of width 10 fit easily within a 50-wide viewport, so there is
        // no room to scroll at all.
        assert_eq!(scroll_x, 0.0);
        assert_eq!(scroll_y, 0.0);
    }

    #[test]
    fn vertical_scroll_is_line_position_based_not_content_height_based() {
        // Three lines at line_height 12 (text height 36) inside a 50-tall viewport:
        // content is shorter than the viewport, but the original still allows
        // scrolling because MaxScrollY comes from the last line's position, not
        // from a content-height-vs-viewport comparison.
        let mut lines = LineLayout::<TestRasterizer>::new(8, 64, TextAlignment::DontKnow);
        lines.begin(12.0);
        let rasterizer = TestRasterizer;
        let ctx = FlushContext {
            rasterizer: &rasterizer,
            ascent: 8.0,
            display_newlines: false,
            selection: None,
            cursor_codepoint_index: 0,
            keep_desired_x: false,
        };
        let mut draw_list = DrawList::new(16, 16);
        let mut cursor_state = CursorSnapState::default();
        let mut degradation = DegradationLog::default();

        for i in 0..3 {
            lines.ensure_line_direction(Direction::Ltr, &mut degradation);
            lines.append_glyphs(&[glyph(i, Direction::Ltr)], &mut degradation);
            lines.next_line(&ctx, &mut draw_list, &mut cursor_state, &mut degradation);
        }
        lines.end_lines(&ctx, &mut draw_list, &mut cursor_state, &mut degradation);
        assert_eq!(lines.lines().len(), 3);

        let mut scroll_x = 0.0;
        let mut scroll_y = 1000.0;
        finish_frame(&lines, &mut draw_list, &mut scroll_x, &mut scroll_y, false, 8.0, 50.0, 50.0);

        assert_eq!(scroll_y, 24.0);
    }
}

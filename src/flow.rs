//! Run flow and soft-wrap (§4.E): consumes the shaper's run stream and produces
//! per-line, visually ordered glyph layout.
//!
//! Grounded on the reference editor's `FlushDirection`/`FlushVisualGlyphs`. The
//! hardest part to carry over faithfully is the bidi agglutination: within one
//! same-direction stretch of text the shaper can still emit several sub-runs (a
//! font change inside an RTL word, for instance), and for RTL those sub-runs arrive
//! in decreasing-x order while each sub-run's own glyphs are already in local
//! left-to-right order. [`RunFlow::push_run`] reproduces the reference's fix:
//! prepend RTL sub-runs whole (preserving their internal order) so the scratch ends
//! up in global visual left-to-right order regardless of how many sub-runs made it
//! up.

use std::collections::VecDeque;

use crate::buffer::BreakFlags;
use crate::degradation::DegradationLog;
use crate::draw::DrawList;
use crate::line::{CursorSnapState, FlushContext, LineLayout};
use crate::rasterizer::Rasterizer;
use crate::shape::Direction;

/// One shaped glyph, resolved to a concrete rasterizer font handle and scale, in
/// whatever order the shaper or a [`RunFlow`] scratch buffer holds it.
#[derive(Debug, Clone)]
pub struct FlowGlyph<R: Rasterizer> {
    pub font: R::Font,
    pub id: u32,
    pub codepoint_index: usize,
    pub direction: Direction,
    pub advance_x: f32,
    pub advance_y: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub scale: f32,
    pub break_flags: BreakFlags,
    pub no_shape_break: bool,
    pub is_newline: bool,
}

/// Accumulates one same-direction stretch of shaped glyphs in global visual
/// left-to-right order, agglutinating however many shaper sub-runs make it up.
pub struct RunFlow<R: Rasterizer> {
    glyphs: VecDeque<FlowGlyph<R>>,
}

impl<R: Rasterizer> RunFlow<R> {
    pub fn new() -> Self {
        Self { glyphs: VecDeque::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Appends one shaper sub-run's glyphs, already in the sub-run's own local
    /// visual order. LTR sub-runs are appended at the tail; RTL sub-runs are
    /// prepended whole at the head, since the shaper hands back same-direction
    /// sub-runs in decreasing-x order for RTL text.
    pub fn push_run<I>(&mut self, direction: Direction, glyphs: I)
    where
        I: DoubleEndedIterator<Item = FlowGlyph<R>>,
    {
        if direction.is_rtl() {
            for glyph in glyphs.rev() {
                self.glyphs.push_front(glyph);
            }
        } else {
            self.glyphs.extend(glyphs);
        }
    }

    /// Drains the scratch into a plain `Vec`, ready for [`flush_direction`] to scan.
    pub fn drain(&mut self) -> Vec<FlowGlyph<R>> {
        self.glyphs.drain(..).collect()
    }
}

impl<R: Rasterizer> Default for RunFlow<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Scans `glyphs` (one same-direction stretch, already in global visual
/// left-to-right order) and hands it to `lines`, splitting across soft-wrap points
/// when `wrap` is enabled. `running_advance` carries the X cursor across direction
/// boundaries within the same visual line; the caller resets it to zero whenever a
/// hard line break starts a genuinely new line.
///
/// Grounded on the reference editor's `FlushDirection`.
#[allow(clippy::too_many_arguments)]
pub fn flush_direction<R: Rasterizer>(
    lines: &mut LineLayout<R>,
    ctx: &FlushContext<'_, R>,
    draw_list: &mut DrawList<R::Font>,
    cursor_state: &mut CursorSnapState,
    wrap: bool,
    frame_buffer_width: f32,
    running_advance: &mut f32,
    paragraph_direction: Direction,
    direction: Direction,
    glyphs: &[FlowGlyph<R>],
    degradation: &mut DegradationLog,
) {
    let rtl = direction.is_rtl();
    let glyph_count = glyphs.len() as isize;
    let mut start_index: isize = if rtl { glyph_count - 1 } else { 0 };
    let step: isize = if rtl { -1 } else { 1 };

    if wrap && glyph_count > 0 {
        let mut last_shape_break_plus_one: isize = 0;
        let mut last_soft_break_plus_one: isize = 0;
        let mut last_shape_break_codepoint: Option<usize> = None;

        let mut i = start_index;
        while i >= 0 && i < glyph_count {
            let glyph = &glyphs[i as usize];

            if i != start_index
                && Some(glyph.codepoint_index) != last_shape_break_codepoint
                && !glyph.no_shape_break
            {
                if glyph.break_flags.contains(BreakFlags::LINE_SOFT) {
                    last_soft_break_plus_one = i + 1;
                }
                last_shape_break_plus_one = i + 1;
                last_shape_break_codepoint = Some(glyph.codepoint_index);
            }

            *running_advance += glyph.advance_x * glyph.scale;
            if *running_advance > frame_buffer_width {
                let last_break_index = if last_soft_break_plus_one != 0 {
                    last_soft_break_plus_one - 1
                } else if last_shape_break_plus_one != 0 {
                    last_shape_break_plus_one - 1
                } else {
                    i
                };

                let (first, one_past_last) = if rtl {
                    (last_break_index + 1, start_index + 1)
                } else {
                    (start_index, last_break_index)
                };

                if one_past_last > first {
                    flush_visual_glyphs(
                        lines,
                        paragraph_direction,
                        &glyphs[first as usize..one_past_last as usize],
                        degradation,
                    );

                    start_index = last_break_index;
                    last_soft_break_plus_one = 0;
                    last_shape_break_plus_one = 0;
                    *running_advance = 0.0;

                    // Resume scanning from the break point.
                    i = last_break_index - 1;

                    lines.next_line(ctx, draw_list, cursor_state, degradation);
                }
            }

            i += step;
        }
    }

    let (first, one_past_last) = if rtl {
        (0, start_index + 1)
    } else {
        (start_index, glyph_count)
    };
    flush_visual_glyphs(
        lines,
        paragraph_direction,
        &glyphs[first as usize..one_past_last as usize],
        degradation,
    );
}

fn flush_visual_glyphs<R: Rasterizer>(
    lines: &mut LineLayout<R>,
    paragraph_direction: Direction,
    glyphs: &[FlowGlyph<R>],
    degradation: &mut crate::degradation::DegradationLog,
) {
    lines.ensure_line_direction(paragraph_direction, degradation);
    lines.append_glyphs(glyphs, degradation);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::TextAlignment;
    use crate::rasterizer::test_support::TestRasterizer;

    fn glyph(codepoint_index: usize, direction: Direction, advance_x: f32) -> FlowGlyph<TestRasterizer> {
        FlowGlyph {
            font: (),
            id: codepoint_index as u32,
            codepoint_index,
            direction,
            advance_x,
            advance_y: 0.0,
            offset_x: 0.0,
            offset_y: 0.0,
            scale: 1.0,
            break_flags: BreakFlags::empty(),
            no_shape_break: false,
            is_newline: false,
        }
    }

    #[test]
    fn ltr_run_is_appended_tail_first() {
        let mut flow = RunFlow::<TestRasterizer>::new();
        flow.push_run(Direction::Ltr, vec![glyph(0, Direction::Ltr, 1.0), glyph(1, Direction::Ltr, 1.0)].into_iter());
        flow.push_run(Direction::Ltr, vec![glyph(2, Direction::Ltr, 1.0)].into_iter());
        let drained = flow.drain();
        let indices: Vec<_> = drained.iter().map(|g| g.codepoint_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn rtl_sub_runs_are_prepended_whole() {
        let mut flow = RunFlow::<TestRasterizer>::new();
        // First sub-run arrives (rightmost visually), then a second, further-left one.
        flow.push_run(Direction::Rtl, vec![glyph(4, Direction::Rtl, 1.0), glyph(5, Direction::Rtl, 1.0)].into_iter());
        flow.push_run(Direction::Rtl, vec![glyph(2, Direction::Rtl, 1.0), glyph(3, Direction::Rtl, 1.0)].into_iter());
        let drained = flow.drain();
        let indices: Vec<_> = drained.iter().map(|g| g.codepoint_index).collect();
        // The later-arriving sub-run lands to the left, with its own order preserved.
        assert_eq!(indices, vec![2, 3, 4, 5]);
    }

    #[test]
    fn wrap_breaks_at_the_last_soft_break_when_one_exists() {
        let mut lines = LineLayout::<TestRasterizer>::new(8, 64, TextAlignment::DontKnow);
        lines.begin(10.0);
        let mut running_advance = 0.0;
        let mut degradation = DegradationLog::default();

        let mut glyphs = Vec::new();
        for i in 0..5 {
            let mut g = glyph(i, Direction::Ltr, 3.0);
            if i == 2 {
                g.break_flags.insert(BreakFlags::LINE_SOFT);
            }
            glyphs.push(g);
        }

        let rasterizer = TestRasterizer;
        let ctx = FlushContext {
            rasterizer: &rasterizer,
            ascent: 8.0,
            display_newlines: false,
            selection: None,
            cursor_codepoint_index: 0,
            keep_desired_x: false,
        };
        let mut draw_list = DrawList::new(64, 64);
        let mut cursor_state = CursorSnapState::default();

        flush_direction(
            &mut lines,
            &ctx,
            &mut draw_list,
            &mut cursor_state,
            true,
            10.0, // wraps after 4 glyphs of width 3 (12 > 10), should break back at the soft break
            &mut running_advance,
            Direction::Ltr,
            Direction::Ltr,
            &glyphs,
            &mut degradation,
        );

        assert!(lines.lines().len() >= 1);
    }
}

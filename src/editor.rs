//! The editor core (Glue): ties the buffer, font registry, shaper, rasterizer, line
//! layout, draw list, and undo log into one per-document object, and exposes the
//! editing/command surface (§6) a host drives every frame.
//!
//! Grounded on the reference editor's `Draw()` (the shape → flow → line → second-pass
//! pipeline) and `DoCommand()` (the single entry point every keystroke, mouse event,
//! and undo/redo request funnels through).

use crate::buffer::{Buffer, Style};
use crate::degradation::DegradationLog;
use crate::draw::DrawList;
use crate::edit::{self, EditState, Granularity, HDirection, LineExtent, VDirection};
use crate::error::Error;
use crate::flow::{self, RunFlow};
use crate::font::FontRegistry;
use crate::line::{self, CursorSnapState, FlushContext, LineLayout, TextAlignment, CURSOR_THICKNESS};
use crate::rasterizer::Rasterizer;
use crate::shape::{Direction, GlyphFlags, RunFlags, ShapeDriver, ShapeRun, Shaper};
use crate::undo::{Snapshot, UndoLog};

/// Construction-time sizing: every fixed-capacity resource the editor owns (§2.1).
#[derive(Debug, Clone)]
pub struct EditorConfig {
    pub buffer_capacity: usize,
    pub font_capacity: usize,
    pub undo_ring_capacity: usize,
    pub line_capacity: usize,
    pub line_glyph_capacity: usize,
    pub draw_command_capacity: usize,
    pub selection_capacity: usize,
    pub preferred_alignment: TextAlignment,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: 4096,
            font_capacity: 8,
            undo_ring_capacity: 64 * 1024,
            line_capacity: 1024,
            line_glyph_capacity: 1024,
            draw_command_capacity: 4096,
            selection_capacity: 256,
            preferred_alignment: TextAlignment::DontKnow,
        }
    }
}

/// Horizontal or vertical axis, for [`Command::ScrollAbsolute01`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    None,
    X,
    Y,
}

/// One input to [`Editor::do_command`] (§6). Motion/mouse/scroll fields that a
/// particular variant doesn't need are simply ignored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Command {
    pub kind: CommandKind,
    pub selection_active: bool,
    pub x: f32,
    pub y: f32,
    pub axis: Axis,
}

impl Command {
    pub fn new(kind: CommandKind) -> Self {
        Self { kind, selection_active: false, x: 0.0, y: 0.0, axis: Axis::None }
    }

    pub fn extending(mut self, selection_active: bool) -> Self {
        self.selection_active = selection_active;
        self
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn on_axis(mut self, axis: Axis) -> Self {
        self.axis = axis;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    None,
    Left,
    Right,
    Up,
    Down,
    PrevParagraph,
    NextParagraph,
    PrevWord,
    NextWord,
    Home,
    End,
    PageUp,
    PageDown,
    Delete,
    DeleteWord,
    Backspace,
    BackspaceWord,
    MousePress,
    MouseMove,
    MouseRelease,
    Scroll,
    ScrollAbsolute01,
    Undo,
    Redo,
    ToggleLineWrap,
    ToggleNewlineDisplay,
}

/// Ties every component together into one document editor, generic over the host's
/// shaper and rasterizer backends the same way the crate this one descends from
/// keeps its own rendering core generic over its rasterizer.
pub struct Editor<S: Shaper, R: Rasterizer> {
    logger: log::RootLogger,

    buffer: Buffer,
    fonts: FontRegistry<S, R>,
    shaper: S,
    rasterizer: R,

    lines: LineLayout<R>,
    draw_list: DrawList<R::Font>,
    degradation: DegradationLog,

    edit: EditState,
    undo: UndoLog,

    active_style: Style,
    direction_hint: Direction,
    language_hint: String,
    wrap: bool,
    display_newlines: bool,

    max_scroll_x: f32,
    max_scroll_y: f32,
    viewport_height: f32,
}

impl<S: Shaper, R: Rasterizer> Editor<S, R> {
    pub fn new(config: EditorConfig, shaper: S, rasterizer: R) -> Self {
        Self {
            logger: log::RootLogger::new(),

            buffer: Buffer::new(config.buffer_capacity),
            fonts: FontRegistry::new(config.font_capacity),
            shaper,
            rasterizer,

            lines: LineLayout::new(config.line_capacity, config.line_glyph_capacity, config.preferred_alignment),
            draw_list: DrawList::new(config.draw_command_capacity, config.selection_capacity),
            degradation: DegradationLog::default(),

            edit: EditState::default(),
            undo: UndoLog::new(config.undo_ring_capacity),

            active_style: Style::REGULAR,
            direction_hint: Direction::DontKnow,
            language_hint: String::from("en"),
            wrap: true,
            display_newlines: false,

            max_scroll_x: 0.0,
            max_scroll_y: 0.0,
            viewport_height: 0.0,
        }
    }

    pub fn set_language_hint(&mut self, language: impl Into<String>) {
        self.language_hint = language.into();
    }

    pub fn set_direction_hint(&mut self, direction: Direction) {
        self.direction_hint = direction;
    }

    pub fn set_active_style(&mut self, style: Style) {
        self.active_style = style;
    }

    pub fn degradation(&self) -> DegradationLog {
        self.degradation
    }

    pub fn edit_state(&self) -> &EditState {
        &self.edit
    }

    pub fn text(&self) -> &[crate::buffer::Character] {
        self.buffer.as_slice()
    }

    /// Registers one font and recomputes fallback preference order. See
    /// [`FontRegistry::register`].
    pub fn register_font(
        &mut self,
        shaper_font: S::Font,
        rasterizer_font: R::Font,
        bold: bool,
        italic: bool,
    ) -> Result<usize, Error> {
        self.fonts
            .register(shaper_font, rasterizer_font, bold, italic)
            .map_err(Error::from)
    }

    // -- Editing surface (§4.H / §6) -----------------------------------------

    pub fn insert_codepoint(&mut self, codepoint: u32) {
        let before = self.degradation;
        let snapshot = self.snapshot();
        self.undo.push(snapshot);
        edit::insert_codepoint(&mut self.buffer, &mut self.edit, codepoint, self.active_style, &mut self.degradation);
        self.log_new_degradations(before);
    }

    pub fn insert_text(&mut self, utf8: &[u8]) {
        let before = self.degradation;
        let snapshot = self.snapshot();
        self.undo.push(snapshot);
        edit::insert_utf8_text(&mut self.buffer, &mut self.edit, utf8, self.active_style, &mut self.degradation);
        self.log_new_degradations(before);
    }

    pub fn delete_selected(&mut self) -> bool {
        if self.edit.selection_range().is_none() {
            return false;
        }
        let snapshot = self.snapshot();
        self.undo.push(snapshot);
        edit::delete_selection(&mut self.buffer, &mut self.edit)
    }

    pub fn select_all(&mut self) {
        self.edit.selection_anchor = Some(0);
        self.edit.codepoint_index = self.buffer.len();
    }

    pub fn toggle_selection_style(&mut self, style: Style) {
        if self.edit.selection_range().is_none() {
            return;
        }
        let snapshot = self.snapshot();
        self.undo.push(snapshot);
        edit::toggle_style(&mut self.buffer, &self.edit, style);
    }

    /// One IME composition update (§4.H). Does not touch the undo log, matching the
    /// reference: composition is transient until committed by a later real edit.
    pub fn ime_compose(&mut self, text: &str, cursor_offset: usize, selection_length: usize) {
        let before = self.degradation;
        edit::ime_compose(
            &mut self.buffer,
            &mut self.edit,
            text,
            cursor_offset,
            selection_length,
            self.active_style,
            &mut self.degradation,
        );
        self.log_new_degradations(before);
    }

    pub fn can_undo(&self) -> bool {
        self.undo.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.undo.can_redo()
    }

    pub fn perform_undo(&mut self) {
        let before = self.degradation;
        if let Some(snapshot) = self.undo.undo(&mut self.degradation) {
            self.restore(snapshot);
        }
        self.log_new_degradations(before);
    }

    pub fn perform_redo(&mut self) {
        let before = self.degradation;
        if let Some(snapshot) = self.undo.redo(&mut self.degradation) {
            self.restore(snapshot);
        }
        self.log_new_degradations(before);
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            text: self.buffer.as_slice().to_vec(),
            cursor_codepoint_index: self.edit.codepoint_index,
            selection_anchor: self.edit.selection_anchor,
            scroll_x: self.edit.scroll_x,
            scroll_y: self.edit.scroll_y,
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.buffer.restore(&snapshot.text);
        self.edit.codepoint_index = snapshot.cursor_codepoint_index;
        self.edit.selection_anchor = snapshot.selection_anchor;
        self.edit.scroll_x = snapshot.scroll_x;
        self.edit.scroll_y = snapshot.scroll_y;
        self.edit.keep_desired_x = false;
        self.edit.keep_desired_y = false;
        self.edit.move_viewpoint_to_include_cursor = true;
    }

    /// `DoCommand` (§6): the single entry point for motion, mouse, scroll, and
    /// undo/redo input. Text insertion/deletion/IME have their own methods above
    /// since they carry payloads `Command`'s fixed field set doesn't fit.
    pub fn do_command(&mut self, command: Command) {
        use CommandKind::*;

        let extend = command.selection_active;
        match command.kind {
            None => {}
            Left => edit::move_horizontal(&self.buffer, &mut self.edit, HDirection::Backward, Granularity::Grapheme, extend),
            Right => edit::move_horizontal(&self.buffer, &mut self.edit, HDirection::Forward, Granularity::Grapheme, extend),
            PrevWord => edit::move_horizontal(&self.buffer, &mut self.edit, HDirection::Backward, Granularity::Word, extend),
            NextWord => edit::move_horizontal(&self.buffer, &mut self.edit, HDirection::Forward, Granularity::Word, extend),
            Up => self.move_vertical(VDirection::Up, Granularity::Line, extend),
            Down => self.move_vertical(VDirection::Down, Granularity::Line, extend),
            PrevParagraph => self.move_vertical(VDirection::Up, Granularity::Paragraph, extend),
            NextParagraph => self.move_vertical(VDirection::Down, Granularity::Paragraph, extend),
            Home => {
                let extents = self.line_extents();
                edit::move_home(&mut self.edit, &extents, extend);
            }
            End => {
                let extents = self.line_extents();
                edit::move_end(&mut self.edit, &extents, extend);
            }
            PageUp => self.move_page(VDirection::Up, extend),
            PageDown => self.move_page(VDirection::Down, extend),
            // Forward single-unit deletion steps by grapheme, not codepoint: deleting
            // one codepoint from the start of a cluster would strand trailing
            // combining marks. Backspace stays codepoint-granularity (below).
            Delete => self.delete_forward(Granularity::Grapheme),
            DeleteWord => self.delete_forward(Granularity::Word),
            Backspace => self.delete_backward(Granularity::Codepoint),
            BackspaceWord => self.delete_backward(Granularity::Word),
            MousePress => self.mouse_press(command.x, command.y),
            MouseMove => self.mouse_move(command.x, command.y),
            MouseRelease => edit::mouse_release(&mut self.edit),
            Scroll => edit::scroll_by(&mut self.edit, command.x, command.y),
            ScrollAbsolute01 => match command.axis {
                Axis::X => edit::scroll_absolute_x(&mut self.edit, command.x, self.max_scroll_x),
                Axis::Y => edit::scroll_absolute_y(&mut self.edit, command.x, self.max_scroll_y),
                Axis::None => {}
            },
            Undo => self.perform_undo(),
            Redo => self.perform_redo(),
            ToggleLineWrap => self.wrap = !self.wrap,
            ToggleNewlineDisplay => self.display_newlines = !self.display_newlines,
        }
    }

    fn line_extents(&self) -> Vec<LineExtent> {
        self.lines.lines().iter().map(LineExtent::from).collect()
    }

    fn line_command_ranges(&self) -> (Vec<usize>, Vec<usize>) {
        let firsts = self.lines.lines().iter().map(|l| l.first_command_index).collect();
        let lasts = self.lines.lines().iter().map(|l| l.one_past_last_command_index).collect();
        (firsts, lasts)
    }

    fn move_vertical(&mut self, direction: VDirection, granularity: Granularity, extend: bool) {
        let extents = self.line_extents();
        let (firsts, lasts) = self.line_command_ranges();
        edit::move_vertical(&mut self.edit, &extents, &self.draw_list.commands, &firsts, &lasts, direction, granularity, extend);
    }

    fn move_page(&mut self, direction: VDirection, extend: bool) {
        let extents = self.line_extents();
        let bounds = self.lines.text_bounds();
        let (min_y, max_y) = if bounds.is_valid() { (bounds.min_y, bounds.max_y) } else { (0.0, 0.0) };
        // `viewport_height` is whatever `frame_buffer_height` the last `draw` call
        // saw; before the first draw there is no viewport yet, so one line stands in.
        let viewport_height = if self.viewport_height > 0.0 { self.viewport_height } else { self.lines.line_height() };
        edit::move_page(&mut self.edit, &extents, viewport_height, min_y, max_y, direction, extend);
    }

    fn mouse_press(&mut self, x: f32, y: f32) {
        let extents = self.line_extents();
        let (firsts, lasts) = self.line_command_ranges();
        let line_height = self.lines.line_height();
        edit::mouse_press(&mut self.edit, &extents, &self.draw_list.commands, &firsts, &lasts, line_height, x, y);
    }

    fn mouse_move(&mut self, x: f32, y: f32) {
        let extents = self.line_extents();
        let (firsts, lasts) = self.line_command_ranges();
        let line_height = self.lines.line_height();
        edit::mouse_move(&mut self.edit, &extents, &self.draw_list.commands, &firsts, &lasts, line_height, x, y);
    }

    /// `Delete`/`DeleteWord`: deletes the selection if any, else steps forward by
    /// `granularity` from the cursor and removes the span crossed.
    fn delete_forward(&mut self, granularity: Granularity) {
        if self.delete_selected() {
            return;
        }
        let start = self.edit.codepoint_index;
        let mut probe = self.edit.clone();
        edit::move_horizontal(&self.buffer, &mut probe, HDirection::Forward, granularity, false);
        let end = probe.codepoint_index;
        if end > start {
            let snapshot = self.snapshot();
            self.undo.push(snapshot);
            self.buffer.delete_range(start, end);
            self.edit.keep_desired_x = false;
            self.edit.keep_desired_y = false;
            self.edit.move_viewpoint_to_include_cursor = true;
        }
    }

    /// `Backspace`/`BackspaceWord`: deletes the selection if any, else steps
    /// backward by `granularity` from the cursor and removes the span crossed.
    fn delete_backward(&mut self, granularity: Granularity) {
        if self.delete_selected() {
            return;
        }
        let end = self.edit.codepoint_index;
        let mut probe = self.edit.clone();
        edit::move_horizontal(&self.buffer, &mut probe, HDirection::Backward, granularity, false);
        let start = probe.codepoint_index;
        if end > start {
            let snapshot = self.snapshot();
            self.undo.push(snapshot);
            self.buffer.delete_range(start, end);
            self.edit.codepoint_index = start;
            self.edit.keep_desired_x = false;
            self.edit.keep_desired_y = false;
            self.edit.move_viewpoint_to_include_cursor = true;
        }
    }

    /// `Draw()` (§4.D–§4.G): shapes the whole buffer, flows runs into lines, closes
    /// the layout, and runs the scroll/alignment/visibility second pass. Returns the
    /// frame's draw list, valid until the next call to `draw`.
    pub fn draw(
        &mut self,
        font_pixel_height: f32,
        frame_buffer_width: f32,
        frame_buffer_height: f32,
    ) -> Result<&DrawList<R::Font>, Error> {
        let before = self.degradation;

        self.draw_list.begin_frame();

        let (ascent, descent) = self.frame_metrics(font_pixel_height);
        let line_height = ascent + descent;
        self.lines.begin(line_height);

        ShapeDriver::feed(&mut self.shaper, &self.fonts, self.buffer.as_slice(), self.direction_hint, &self.language_hint)?;

        let ctx = FlushContext {
            rasterizer: &self.rasterizer,
            ascent,
            display_newlines: self.display_newlines,
            selection: self.edit.selection_range(),
            cursor_codepoint_index: self.edit.codepoint_index,
            keep_desired_x: self.edit.keep_desired_x,
        };
        let mut cursor_state = CursorSnapState::default();
        let mut flow_runs = RunFlow::<R>::new();
        let mut current_direction: Option<Direction> = None;
        let mut paragraph_direction = Direction::Ltr;
        let mut running_advance = 0.0f32;

        loop {
            let Some(run) = self.shaper.shape_run() else { break };
            let direction = run.direction();
            let run_paragraph_direction = run.paragraph_direction();
            let flags = run.flags();
            let font_index = run.font_index();
            // `run`'s lifetime is tied to `&mut self.shaper`; collect its glyphs now
            // so that borrow ends before the next `self.shaper`/`self.fonts` access.
            let glyphs: Vec<_> = run.into_glyphs().collect();

            let Some(font) = self.fonts.get(font_index) else {
                self.degradation.mark_layout_overflow();
                continue;
            };
            let rasterizer_font = font.rasterizer_handle().clone();
            let scale = self.rasterizer.scale_for_pixel_height(&rasterizer_font, font_pixel_height);

            let mut flow_glyphs = Vec::with_capacity(glyphs.len());
            for glyph in &glyphs {
                let break_flags = self
                    .shaper
                    .get_shape_codepoint(glyph.codepoint_index)
                    .map(|c| c.break_flags)
                    .unwrap_or_default();
                // Writes the shaper's resolved break opportunities back onto the
                // buffer so `edit::move_horizontal`'s grapheme/word granularity has
                // something to consult outside of a draw.
                if let Some(ch) = self.buffer.as_mut_slice().get_mut(glyph.codepoint_index) {
                    ch.break_flags = break_flags;
                }
                let is_newline = self
                    .buffer
                    .get(glyph.codepoint_index)
                    .map(|c| c.codepoint == '\n' as u32)
                    .unwrap_or(true);

                flow_glyphs.push(flow::FlowGlyph {
                    font: rasterizer_font.clone(),
                    id: glyph.id,
                    codepoint_index: glyph.codepoint_index,
                    direction,
                    advance_x: glyph.advance_x,
                    advance_y: glyph.advance_y,
                    offset_x: glyph.offset_x,
                    offset_y: glyph.offset_y,
                    scale,
                    break_flags,
                    no_shape_break: glyph.flags.contains(GlyphFlags::NO_BREAK),
                    is_newline,
                });
            }

            if current_direction.is_some_and(|d| d != direction) {
                let drained = flow_runs.drain();
                flow::flush_direction(
                    &mut self.lines, &ctx, &mut self.draw_list, &mut cursor_state, self.wrap, frame_buffer_width,
                    &mut running_advance, paragraph_direction, current_direction.unwrap(), &drained, &mut self.degradation,
                );
            }
            current_direction = Some(direction);
            paragraph_direction = run_paragraph_direction;
            flow_runs.push_run(direction, flow_glyphs.into_iter());

            if flags.contains(RunFlags::LINE_HARD) {
                let drained = flow_runs.drain();
                flow::flush_direction(
                    &mut self.lines, &ctx, &mut self.draw_list, &mut cursor_state, self.wrap, frame_buffer_width,
                    &mut running_advance, paragraph_direction, direction, &drained, &mut self.degradation,
                );
                self.lines.next_line(&ctx, &mut self.draw_list, &mut cursor_state, &mut self.degradation);
                current_direction = None;
                running_advance = 0.0;
            }
        }

        if !flow_runs.is_empty() {
            let drained = flow_runs.drain();
            let direction = current_direction.unwrap_or(Direction::Ltr);
            flow::flush_direction(
                &mut self.lines, &ctx, &mut self.draw_list, &mut cursor_state, self.wrap, frame_buffer_width,
                &mut running_advance, paragraph_direction, direction, &drained, &mut self.degradation,
            );
        }

        self.lines.end_lines(&ctx, &mut self.draw_list, &mut cursor_state, &mut self.degradation);

        if !self.edit.keep_desired_x {
            self.edit.desired_x = cursor_state.desired_x;
            self.edit.line_index = cursor_state.line_index;
        }

        line::finish_frame(
            &self.lines,
            &mut self.draw_list,
            &mut self.edit.scroll_x,
            &mut self.edit.scroll_y,
            self.edit.move_viewpoint_to_include_cursor,
            ascent,
            frame_buffer_width,
            frame_buffer_height,
        );
        self.edit.move_viewpoint_to_include_cursor = false;

        self.cache_max_scroll(ascent, frame_buffer_width);
        self.viewport_height = frame_buffer_height;
        self.log_new_degradations(before);

        Ok(&self.draw_list)
    }

    /// Largest ascent/descent across every registered font, scaled to
    /// `font_pixel_height`; `0.0`/`0.0` if nothing is registered yet.
    fn frame_metrics(&self, font_pixel_height: f32) -> (f32, f32) {
        let mut ascent = 0.0f32;
        let mut descent = 0.0f32;
        for index in 0..self.fonts.len() {
            let Some(font) = self.fonts.get(index) else { continue };
            let handle = font.rasterizer_handle();
            let scale = self.rasterizer.scale_for_pixel_height(handle, font_pixel_height);
            let metrics = self.rasterizer.font_v_metrics(handle, scale);
            ascent = ascent.max(metrics.ascent);
            descent = descent.max(metrics.descent);
        }
        (ascent, descent)
    }

    /// Mirrors `finish_frame`'s own `max_scroll_{x,y}` arithmetic so
    /// `ScrollAbsolute01` has something to scale against between frames.
    fn cache_max_scroll(&mut self, ascent: f32, viewport_width: f32) {
        let text_bounds = self.lines.text_bounds();
        let text_width = if text_bounds.is_valid() { text_bounds.width().max(0.0) } else { 0.0 };
        self.max_scroll_x = (text_width - viewport_width + CURSOR_THICKNESS).max(0.0);
        let last_line_min_y = self
            .lines
            .lines()
            .last()
            .map(|line| if line.glyph_box.is_valid() { line.glyph_box.min_y } else { 0.0 })
            .unwrap_or(0.0);
        self.max_scroll_y = (last_line_min_y - ascent).max(0.0);
    }

    fn log_new_degradations(&mut self, before: DegradationLog) {
        let after = self.degradation;
        if after.out_of_capacity() && !before.out_of_capacity() {
            log::warning!(self, "character buffer is full, dropping further inserts");
        }
        if after.layout_overflow() && !before.layout_overflow() {
            log::warning!(self, "a per-frame layout array saturated, discarding excess items");
        }
        if after.stale_undo_token() && !before.stale_undo_token() {
            log::warning!(self, "undo/redo pointed at an evicted snapshot, treating it as a no-op");
        }
        if after.decode_error() && !before.decode_error() {
            log::warning!(self, "invalid UTF-8 was skipped while decoding inserted text");
        }
    }
}

impl<S: Shaper, R: Rasterizer> log::AsLogger for Editor<S, R> {
    fn as_logger(&self) -> &impl log::Logger {
        &self.logger
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::test_support::TestRasterizer;
    use crate::shape::test_support::TestShaper;

    fn editor() -> Editor<TestShaper, TestRasterizer> {
        let mut editor = Editor::new(EditorConfig::default(), TestShaper::new(), TestRasterizer);
        editor.register_font((), (), false, false).unwrap();
        editor
    }

    #[test]
    fn typing_then_drawing_produces_one_command_per_codepoint() {
        let mut editor = editor();
        for ch in "ab".chars() {
            editor.insert_codepoint(ch as u32);
        }
        let draw_list = editor.draw(16.0, 200.0, 200.0).unwrap();
        // Two glyphs plus the trailing synthetic newline sentinel.
        assert_eq!(draw_list.commands.len(), 3);
    }

    #[test]
    fn end_moves_cursor_to_line_end_after_a_draw() {
        let mut editor = editor();
        for ch in "hello".chars() {
            editor.insert_codepoint(ch as u32);
        }
        editor.draw(16.0, 200.0, 200.0).unwrap();
        editor.do_command(Command::new(CommandKind::Home));
        assert_eq!(editor.edit_state().codepoint_index, 0);
        editor.do_command(Command::new(CommandKind::End));
        assert_eq!(editor.edit_state().codepoint_index, 5);
    }

    #[test]
    fn undo_restores_text_after_an_insert() {
        let mut editor = editor();
        editor.insert_codepoint('a' as u32);
        editor.insert_codepoint('b' as u32);
        editor.do_command(Command::new(CommandKind::Undo));
        let text: String = editor.text().iter().filter_map(|c| char::from_u32(c.codepoint)).collect();
        assert_eq!(text, "a");
    }

    #[test]
    fn backspace_deletes_one_codepoint_before_the_cursor() {
        let mut editor = editor();
        editor.insert_text(b"abc");
        editor.do_command(Command::new(CommandKind::Backspace));
        let text: String = editor.text().iter().filter_map(|c| char::from_u32(c.codepoint)).collect();
        assert_eq!(text, "ab");
        assert_eq!(editor.edit_state().codepoint_index, 2);
    }

    #[test]
    fn select_all_then_delete_empties_the_buffer() {
        let mut editor = editor();
        editor.insert_text(b"hello");
        editor.select_all();
        assert!(editor.delete_selected());
        assert_eq!(editor.text().len(), 0);
    }

    #[test]
    fn drawing_with_no_registered_fonts_does_not_panic() {
        let mut editor: Editor<TestShaper, TestRasterizer> = Editor::new(EditorConfig::default(), TestShaper::new(), TestRasterizer);
        editor.insert_codepoint('a' as u32);
        let draw_list = editor.draw(16.0, 200.0, 200.0).unwrap();
        assert_eq!(draw_list.commands.len(), 0);
    }
}

//! Editing and cursor motion (§4.H): insertion, deletion, granularity-based
//! cursor motion, mouse, scrolling, style toggling, and IME composition.
//!
//! Grounded on the reference editor's `MoveCursor`, `DeleteText`, and the mouse/
//! scroll branches of `DoCommand`. Unlike [`crate::flow`]/[`crate::line`], most of
//! this module only touches the character buffer and cursor bookkeeping, so it
//! stays ungeneric; the handful of operations that need last frame's line geometry
//! (vertical motion, mouse) take it as a plain slice rather than pulling in `R`.

use crate::buffer::{Buffer, BreakFlags, Character, Style};
use crate::degradation::DegradationLog;
use crate::draw::DrawCommand;
use crate::line::{line_codepoint_index_at_x, Line};
use crate::rasterizer::Rasterizer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Codepoint,
    Grapheme,
    Word,
    Line,
    Paragraph,
    Page,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HDirection {
    Backward,
    Forward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VDirection {
    Up,
    Down,
}

/// Just enough of a flushed [`Line`] for cursor motion to consult, detached from
/// its glyph storage so the caller can hand over last frame's layout without
/// re-borrowing the whole [`crate::line::LineLayout`].
#[derive(Debug, Clone, Copy)]
pub struct LineExtent {
    pub min_codepoint_index: usize,
    pub max_codepoint_index: usize,
    pub min_y: f32,
    pub max_y: f32,
    pub is_empty: bool,
}

impl<R: Rasterizer> From<&Line<R>> for LineExtent {
    fn from(line: &Line<R>) -> Self {
        Self {
            min_codepoint_index: line.min_codepoint_index.unwrap_or(0),
            max_codepoint_index: line.max_codepoint_index.unwrap_or(0),
            min_y: line.glyph_box.min_y,
            max_y: line.glyph_box.max_y,
            is_empty: line.glyph_count() == 0,
        }
    }
}

/// The editor's non-buffer, non-undo editing state: cursor, selection anchor, and
/// scroll targets. Lives on `Editor` alongside the buffer and undo log.
#[derive(Debug, Clone)]
pub struct EditState {
    pub codepoint_index: usize,
    pub line_index: usize,
    pub desired_x: f32,
    pub desired_y: f32,
    /// `Some(anchor)` while a selection is active; the live range is
    /// `[anchor, codepoint_index)` or its reverse, whichever is ordered.
    pub selection_anchor: Option<usize>,
    pub keep_desired_x: bool,
    pub keep_desired_y: bool,
    pub move_viewpoint_to_include_cursor: bool,
    pub scroll_x: f32,
    pub scroll_y: f32,
    ime_start: Option<usize>,
    ime_length: usize,
    mouse_button_down: bool,
}

impl Default for EditState {
    fn default() -> Self {
        Self {
            codepoint_index: 0,
            line_index: 0,
            desired_x: 0.0,
            desired_y: 0.0,
            selection_anchor: None,
            keep_desired_x: false,
            keep_desired_y: false,
            move_viewpoint_to_include_cursor: false,
            scroll_x: 0.0,
            scroll_y: 0.0,
            ime_start: None,
            ime_length: 0,
            mouse_button_down: false,
        }
    }
}

impl EditState {
    /// Ordered `(start, end)` selection range, or `None` if the selection is empty
    /// or collapsed.
    pub fn selection_range(&self) -> Option<(usize, usize)> {
        let anchor = self.selection_anchor?;
        if anchor == self.codepoint_index {
            return None;
        }
        Some((anchor.min(self.codepoint_index), anchor.max(self.codepoint_index)))
    }

    fn collapse_selection(&mut self) {
        self.selection_anchor = None;
    }

    fn place_cursor(&mut self, codepoint_index: usize, extend: bool) {
        if !extend {
            self.collapse_selection();
        } else if self.selection_anchor.is_none() {
            self.selection_anchor = Some(self.codepoint_index);
        }
        self.codepoint_index = codepoint_index;
        self.keep_desired_x = false;
        self.keep_desired_y = false;
        self.move_viewpoint_to_include_cursor = true;
    }
}

/// Inserts one codepoint at the cursor, replacing any active selection first.
pub fn insert_codepoint(
    buffer: &mut Buffer,
    state: &mut EditState,
    codepoint: u32,
    style: Style,
    degradation: &mut DegradationLog,
) {
    if let Some((start, end)) = state.selection_range() {
        buffer.delete_range(start, end);
        state.codepoint_index = start;
        state.collapse_selection();
    }

    buffer.insert_char(state.codepoint_index, Character::new(codepoint, style), degradation);
    state.codepoint_index += 1;
    state.keep_desired_x = false;
    state.keep_desired_y = false;
    state.move_viewpoint_to_include_cursor = true;
}

/// Decodes `text` as UTF-8 and inserts each codepoint in turn. Invalid bytes are
/// skipped (§7 `DecodeError`); decoding resumes at the next valid codepoint
/// boundary rather than aborting the rest of the paste.
pub fn insert_utf8_text(
    buffer: &mut Buffer,
    state: &mut EditState,
    text: &[u8],
    style: Style,
    degradation: &mut DegradationLog,
) {
    if let Some((start, end)) = state.selection_range() {
        buffer.delete_range(start, end);
        state.codepoint_index = start;
        state.collapse_selection();
    }

    let mut remaining = text;
    loop {
        match std::str::from_utf8(remaining) {
            Ok(valid) => {
                for ch in valid.chars() {
                    buffer.insert_char(state.codepoint_index, Character::new(ch as u32, style), degradation);
                    state.codepoint_index += 1;
                }
                break;
            }
            Err(err) => {
                degradation.mark_decode_error();
                let good = &remaining[..err.valid_up_to()];
                for ch in good.chars() {
                    buffer.insert_char(state.codepoint_index, Character::new(ch as u32, style), degradation);
                    state.codepoint_index += 1;
                }
                let skip = err.error_len().unwrap_or(1).max(1);
                if err.valid_up_to() + skip >= remaining.len() {
                    break;
                }
                remaining = &remaining[err.valid_up_to() + skip..];
            }
        }
    }

    state.keep_desired_x = false;
    state.keep_desired_y = false;
    state.move_viewpoint_to_include_cursor = true;
}

/// Deletes the active selection, if any, placing the cursor at its start.
/// Returns `true` if a selection was actually deleted.
pub fn delete_selection(buffer: &mut Buffer, state: &mut EditState) -> bool {
    let Some((start, end)) = state.selection_range() else {
        return false;
    };
    buffer.delete_range(start, end);
    state.codepoint_index = start;
    state.collapse_selection();
    state.keep_desired_x = false;
    state.keep_desired_y = false;
    state.move_viewpoint_to_include_cursor = true;
    true
}

fn granularity_flag(granularity: Granularity) -> Option<BreakFlags> {
    match granularity {
        Granularity::Grapheme => Some(BreakFlags::GRAPHEME),
        Granularity::Word => Some(BreakFlags::WORD),
        _ => None,
    }
}

/// Horizontal motion (`Codepoint`/`Grapheme`/`Word`). If a selection is active and
/// the caller is not extending it, the cursor collapses toward the motion
/// direction instead of actually stepping.
pub fn move_horizontal(
    buffer: &Buffer,
    state: &mut EditState,
    direction: HDirection,
    granularity: Granularity,
    extend: bool,
) {
    if !extend {
        if let Some((start, end)) = state.selection_range() {
            let target = match direction {
                HDirection::Backward => start,
                HDirection::Forward => end,
            };
            state.codepoint_index = target;
            state.collapse_selection();
            state.keep_desired_x = false;
            state.keep_desired_y = false;
            state.move_viewpoint_to_include_cursor = true;
            return;
        }
    }

    let len = buffer.len();
    let flag = granularity_flag(granularity);
    let mut index = state.codepoint_index;

    match direction {
        HDirection::Backward => {
            if index == 0 {
                state.place_cursor(0, extend);
                return;
            }
            index -= 1;
            if let Some(flag) = flag {
                while index > 0 {
                    let stops = buffer
                        .get(index)
                        .map(|ch| ch.break_flags.contains(flag))
                        .unwrap_or(true);
                    if stops {
                        break;
                    }
                    index -= 1;
                }
            }
        }
        HDirection::Forward => {
            if index >= len {
                state.place_cursor(len, extend);
                return;
            }
            index += 1;
            if let Some(flag) = flag {
                while index < len {
                    let stops = buffer
                        .get(index)
                        .map(|ch| ch.break_flags.contains(flag))
                        .unwrap_or(true);
                    if stops {
                        break;
                    }
                    index += 1;
                }
            }
        }
    }

    state.place_cursor(index, extend);
}

/// The line containing `codepoint_index`, or the last line if it falls past the
/// end of the document (the buffer can be one codepoint longer than its text, for
/// the trailing cursor position).
fn line_index_for_codepoint(lines: &[LineExtent], codepoint_index: usize) -> usize {
    lines
        .iter()
        .position(|line| codepoint_index >= line.min_codepoint_index && codepoint_index <= line.max_codepoint_index)
        .unwrap_or_else(|| lines.len().saturating_sub(1))
}

/// Vertical motion (`Line`/`Paragraph`). `lines` is last frame's flushed line
/// geometry, in document order. Remaps the cursor to the closest codepoint on the
/// destination line at `desired_x`, preserving the column across consecutive
/// vertical moves via `keep_desired_x`.
pub fn move_vertical<F>(
    state: &mut EditState,
    lines: &[LineExtent],
    commands: &[DrawCommand<F>],
    line_first_command: &[usize],
    line_one_past_last_command: &[usize],
    direction: VDirection,
    granularity: Granularity,
    extend: bool,
) {
    if !extend {
        // A non-extending vertical move out of an active selection first lands on
        // the selection's directional edge (mirroring horizontal motion), then
        // steps one line/paragraph further from there.
        if let Some((start, end)) = state.selection_range() {
            let edge = match direction {
                VDirection::Up => start,
                VDirection::Down => end,
            };
            state.codepoint_index = edge;
            state.line_index = line_index_for_codepoint(lines, edge);
        }
        state.collapse_selection();
    } else if state.selection_anchor.is_none() {
        state.selection_anchor = Some(state.codepoint_index);
    }

    if lines.is_empty() {
        return;
    }

    if !state.keep_desired_x {
        state.desired_x = commands
            .get(state.codepoint_index)
            .map(|c| c.x)
            .unwrap_or(0.0);
    }

    let mut target = state.line_index;
    match granularity {
        Granularity::Paragraph => {
            // Skip any empty lines first, cross at least one non-empty line, then
            // stop just before the next empty run.
            let step: isize = match direction {
                VDirection::Up => -1,
                VDirection::Down => 1,
            };
            let mut i = target as isize;
            while i + step >= 0 && (i + step) < lines.len() as isize && lines[(i + step) as usize].is_empty {
                i += step;
            }
            let mut crossed_non_empty = false;
            loop {
                let next = i + step;
                if next < 0 || next >= lines.len() as isize {
                    break;
                }
                if crossed_non_empty && lines[next as usize].is_empty {
                    break;
                }
                i = next;
                if !lines[i as usize].is_empty {
                    crossed_non_empty = true;
                }
            }
            target = i.clamp(0, lines.len() as isize - 1) as usize;
        }
        _ => {
            target = match direction {
                VDirection::Up => target.saturating_sub(1),
                VDirection::Down => (target + 1).min(lines.len() - 1),
            };
        }
    }
    target = target.min(lines.len() - 1);

    let first = line_first_command.get(target).copied().unwrap_or(0);
    let one_past_last = line_one_past_last_command.get(target).copied().unwrap_or(first);
    let fallback = lines[target].min_codepoint_index;
    let codepoint_index = line_codepoint_index_at_x(commands, first, one_past_last, fallback, state.desired_x);

    state.codepoint_index = codepoint_index;
    state.line_index = target;
    state.keep_desired_x = true;
    state.move_viewpoint_to_include_cursor = true;
}

/// Page motion: moves `desired_y` by one viewport height, clamps to content
/// bounds, then lands on the closest line whose top is on the far side of the new
/// target in the motion direction.
pub fn move_page(
    state: &mut EditState,
    lines: &[LineExtent],
    viewport_height: f32,
    text_min_y: f32,
    text_max_y: f32,
    direction: VDirection,
    extend: bool,
) {
    if !extend {
        state.collapse_selection();
    } else if state.selection_anchor.is_none() {
        state.selection_anchor = Some(state.codepoint_index);
    }

    if lines.is_empty() {
        return;
    }

    let delta = match direction {
        VDirection::Up => -viewport_height,
        VDirection::Down => viewport_height,
    };
    state.desired_y = (state.desired_y + delta).clamp(text_min_y, text_max_y);

    let target = match direction {
        VDirection::Down => lines
            .iter()
            .position(|line| line.min_y >= state.desired_y)
            .unwrap_or(lines.len() - 1),
        VDirection::Up => lines
            .iter()
            .rposition(|line| line.min_y <= state.desired_y)
            .unwrap_or(0),
    };

    state.codepoint_index = lines[target].min_codepoint_index;
    state.line_index = target;
    state.keep_desired_x = false;
    state.move_viewpoint_to_include_cursor = true;
}

pub fn move_home(state: &mut EditState, lines: &[LineExtent], extend: bool) {
    let Some(line) = lines.get(state.line_index) else {
        return;
    };
    state.place_cursor(line.min_codepoint_index, extend);
}

pub fn move_end(state: &mut EditState, lines: &[LineExtent], extend: bool) {
    let Some(line) = lines.get(state.line_index) else {
        return;
    };
    state.place_cursor(line.max_codepoint_index, extend);
}

/// `MOUSE_PRESS`: positions the cursor at the line under `y` and the codepoint
/// under `x` within it, and starts a new selection anchored there.
pub fn mouse_press<F>(
    state: &mut EditState,
    lines: &[LineExtent],
    commands: &[DrawCommand<F>],
    line_first_command: &[usize],
    line_one_past_last_command: &[usize],
    line_height: f32,
    x: f32,
    y: f32,
) {
    state.mouse_button_down = true;
    state.collapse_selection();
    mouse_move(state, lines, commands, line_first_command, line_one_past_last_command, line_height, x, y);
    state.selection_anchor = Some(state.codepoint_index);
}

/// `MOUSE_MOVE`: while a button is held, extends the selection to the codepoint
/// under the pointer. A no-op if no button is down.
pub fn mouse_move<F>(
    state: &mut EditState,
    lines: &[LineExtent],
    commands: &[DrawCommand<F>],
    line_first_command: &[usize],
    line_one_past_last_command: &[usize],
    line_height: f32,
    x: f32,
    y: f32,
) {
    if lines.is_empty() {
        return;
    }
    if state.selection_anchor.is_none() && !state.mouse_button_down {
        return;
    }

    let line_index = ((state.scroll_y + y) / line_height).max(0.0) as usize;
    let line_index = line_index.min(lines.len() - 1);

    let first = line_first_command.get(line_index).copied().unwrap_or(0);
    let one_past_last = line_one_past_last_command.get(line_index).copied().unwrap_or(first);
    let fallback = lines[line_index].min_codepoint_index;
    let codepoint_index = line_codepoint_index_at_x(commands, first, one_past_last, fallback, x);

    state.codepoint_index = codepoint_index;
    state.line_index = line_index;
    state.keep_desired_x = false;
    state.keep_desired_y = false;
    state.move_viewpoint_to_include_cursor = true;
}

/// `MOUSE_RELEASE`: the selection (if any) is left exactly as it stands.
pub fn mouse_release(state: &mut EditState) {
    state.mouse_button_down = false;
}

pub fn scroll_by(state: &mut EditState, dx: f32, dy: f32) {
    state.scroll_x += dx;
    state.scroll_y += dy;
}

pub fn scroll_absolute_x(state: &mut EditState, t: f32, max_scroll_x: f32) {
    state.scroll_x = t * max_scroll_x;
}

pub fn scroll_absolute_y(state: &mut EditState, t: f32, max_scroll_y: f32) {
    state.scroll_y = t * max_scroll_y;
}

/// XORs `style` over every codepoint in the active selection.
pub fn toggle_style(buffer: &mut Buffer, state: &EditState, style: Style) {
    if let Some((start, end)) = state.selection_range() {
        buffer.toggle_style(start, end, style);
    }
}

/// One IME composition update: replaces the previous composition range (if any)
/// with `text`, without touching the undo log, and positions cursor/selection from
/// the supplied offsets. A zero-length `text` signals commit and clears IME state.
pub fn ime_compose(
    buffer: &mut Buffer,
    state: &mut EditState,
    text: &str,
    cursor_offset: usize,
    selection_length: usize,
    style: Style,
    degradation: &mut DegradationLog,
) {
    if let Some(start) = state.ime_start {
        buffer.delete_range(start, start + state.ime_length);
    }
    let start = state.ime_start.unwrap_or(state.codepoint_index);

    let mut pos = start;
    for ch in text.chars() {
        buffer.insert_char(pos, Character::new(ch as u32, style), degradation);
        pos += 1;
    }
    let inserted = pos - start;

    if text.is_empty() {
        state.ime_start = None;
        state.ime_length = 0;
    } else {
        state.ime_start = Some(start);
        state.ime_length = inserted;
    }

    state.codepoint_index = start + cursor_offset.min(inserted);
    state.selection_anchor = if selection_length > 0 {
        Some((state.codepoint_index + selection_length).min(start + inserted))
    } else {
        None
    };
    state.move_viewpoint_to_include_cursor = true;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ch(c: char) -> Character {
        Character::new(c as u32, Style::REGULAR)
    }

    fn fill(buffer: &mut Buffer, text: &str, degradation: &mut DegradationLog) {
        for c in text.chars() {
            buffer.insert_char(buffer.len(), ch(c), degradation);
        }
    }

    #[test]
    fn insert_codepoint_advances_cursor() {
        let mut buffer = Buffer::new(16);
        let mut state = EditState::default();
        let mut deg = DegradationLog::default();
        insert_codepoint(&mut buffer, &mut state, 'a' as u32, Style::REGULAR, &mut deg);
        insert_codepoint(&mut buffer, &mut state, 'b' as u32, Style::REGULAR, &mut deg);
        assert_eq!(state.codepoint_index, 2);
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn insert_replaces_active_selection() {
        let mut buffer = Buffer::new(16);
        let mut deg = DegradationLog::default();
        fill(&mut buffer, "abc", &mut deg);
        let mut state = EditState { codepoint_index: 3, selection_anchor: Some(0), ..EditState::default() };
        insert_codepoint(&mut buffer, &mut state, 'x' as u32, Style::REGULAR, &mut deg);
        let text: String = buffer.as_slice().iter().filter_map(|c| char::from_u32(c.codepoint)).collect();
        assert_eq!(text, "x");
        assert!(state.selection_anchor.is_none());
    }

    #[test]
    fn backward_motion_collapses_selection_to_its_start() {
        let mut buffer = Buffer::new(16);
        let mut deg = DegradationLog::default();
        fill(&mut buffer, "abcdef", &mut deg);
        let mut state = EditState { codepoint_index: 4, selection_anchor: Some(1), ..EditState::default() };
        move_horizontal(&buffer, &mut state, HDirection::Backward, Granularity::Codepoint, false);
        assert_eq!(state.codepoint_index, 1);
        assert!(state.selection_anchor.is_none());
    }

    #[test]
    fn word_motion_stops_at_the_next_word_break() {
        let mut buffer = Buffer::new(16);
        let mut deg = DegradationLog::default();
        fill(&mut buffer, "ab cd", &mut deg);
        buffer.as_mut_slice()[2].break_flags.insert(BreakFlags::WORD);
        let mut state = EditState::default();
        move_horizontal(&buffer, &mut state, HDirection::Forward, Granularity::Word, false);
        assert_eq!(state.codepoint_index, 2);
    }

    fn line_extent(index: usize) -> LineExtent {
        LineExtent { min_codepoint_index: index, max_codepoint_index: index, min_y: index as f32, max_y: index as f32, is_empty: false }
    }

    #[test]
    fn downward_motion_out_of_an_upward_selection_steps_from_the_selections_bottom_edge() {
        // Five one-codepoint lines. Selection anchored at line 3, cursor at line 1
        // (selected upward). A non-extending Down press must land one line past the
        // selection's bottom edge (line 3), i.e. line 4, not one line past wherever
        // the cursor visually sat (line 1 -> line 2).
        let lines: Vec<LineExtent> = (0..5).map(line_extent).collect();
        let commands: Vec<DrawCommand<()>> = Vec::new();
        let line_first_command = vec![0; 5];
        let line_one_past_last_command = vec![0; 5];
        let mut state = EditState { codepoint_index: 1, line_index: 1, selection_anchor: Some(3), ..EditState::default() };

        move_vertical(
            &mut state,
            &lines,
            &commands,
            &line_first_command,
            &line_one_past_last_command,
            VDirection::Down,
            Granularity::Line,
            false,
        );

        assert_eq!(state.line_index, 4);
        assert!(state.selection_anchor.is_none());
    }

    #[test]
    fn invalid_utf8_is_skipped_without_aborting_the_rest() {
        let mut buffer = Buffer::new(16);
        let mut state = EditState::default();
        let mut deg = DegradationLog::default();
        let mut bytes = b"ab".to_vec();
        bytes.push(0xFF);
        bytes.extend_from_slice(b"cd");
        insert_utf8_text(&mut buffer, &mut state, &bytes, Style::REGULAR, &mut deg);
        let text: String = buffer.as_slice().iter().filter_map(|c| char::from_u32(c.codepoint)).collect();
        assert_eq!(text, "abcd");
        assert!(deg.decode_error());
    }

    #[test]
    fn ime_compose_replaces_the_previous_composition_range() {
        let mut buffer = Buffer::new(16);
        let mut state = EditState::default();
        let mut deg = DegradationLog::default();
        ime_compose(&mut buffer, &mut state, "ni", 2, 0, Style::REGULAR, &mut deg);
        ime_compose(&mut buffer, &mut state, "nihao", 5, 0, Style::REGULAR, &mut deg);
        let text: String = buffer.as_slice().iter().filter_map(|c| char::from_u32(c.codepoint)).collect();
        assert_eq!(text, "nihao");
        assert_eq!(state.codepoint_index, 5);
    }

    #[test]
    fn ime_commit_clears_composition_state() {
        let mut buffer = Buffer::new(16);
        let mut state = EditState::default();
        let mut deg = DegradationLog::default();
        ime_compose(&mut buffer, &mut state, "hi", 2, 0, Style::REGULAR, &mut deg);
        ime_compose(&mut buffer, &mut state, "", 0, 0, Style::REGULAR, &mut deg);
        assert!(state.ime_start.is_none());
    }
}

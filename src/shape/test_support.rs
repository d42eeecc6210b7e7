//! A deterministic reference [`Shaper`] used only by this crate's own unit tests.
//!
//! Built on `unicode_bidi` + `icu_segmenter` for real bidi levels and grapheme break
//! opportunities, so tests can assert on actual bidi reordering and break behavior
//! without pulling in a font/shaping backend. Each codepoint becomes exactly one
//! glyph advancing by one unit, which is all the wrap/flow tests need.

use std::collections::VecDeque;

use icu_segmenter::GraphemeClusterSegmenter;
use unicode_bidi::BidiInfo;

use super::{BreakFlags, Direction, Glyph, GlyphFlags, RunFlags, ShapeCodepoint, ShapeRun, Shaper};

pub struct TestRun {
    direction: Direction,
    paragraph_direction: Direction,
    flags: RunFlags,
    glyphs: Vec<Glyph>,
}

impl<'a> ShapeRun<'a> for TestRun {
    type Glyphs = std::vec::IntoIter<Glyph>;

    fn direction(&self) -> Direction {
        self.direction
    }

    fn paragraph_direction(&self) -> Direction {
        self.paragraph_direction
    }

    fn flags(&self) -> RunFlags {
        self.flags
    }

    fn font_index(&self) -> usize {
        0
    }

    fn into_glyphs(self) -> Self::Glyphs {
        self.glyphs.into_iter()
    }
}

pub struct TestShaper {
    codepoints: Vec<u32>,
    manual_breaks: Vec<usize>,
    codepoint_info: Vec<ShapeCodepoint>,
    runs: VecDeque<TestRun>,
}

impl TestShaper {
    pub fn new() -> Self {
        Self {
            codepoints: Vec::new(),
            manual_breaks: Vec::new(),
            codepoint_info: Vec::new(),
            runs: VecDeque::new(),
        }
    }

    pub fn fed_codepoints(&self) -> &[u32] {
        &self.codepoints
    }

    pub fn manual_break_count(&self) -> usize {
        self.manual_breaks.len()
    }
}

impl Default for TestShaper {
    fn default() -> Self {
        Self::new()
    }
}

impl Shaper for TestShaper {
    type Font = ();
    type Run<'a>
        = TestRun
    where
        Self: 'a;

    fn shape_begin(&mut self, _direction_hint: Direction, _language_hint: &str) {
        self.codepoints.clear();
        self.manual_breaks.clear();
        self.codepoint_info.clear();
        self.runs.clear();
    }

    fn shape_codepoint(&mut self, codepoint: u32) {
        self.codepoints.push(codepoint);
    }

    fn shape_manual_break(&mut self) {
        self.manual_breaks.push(self.codepoints.len());
    }

    fn shape_push_font(&mut self, _font: &()) {}

    fn shape_pop_font(&mut self) {}

    fn shape_end(&mut self) {
        let text: String = self
            .codepoints
            .iter()
            .filter_map(|&cp| char::from_u32(cp))
            .collect();

        let mut byte_of_cp = Vec::with_capacity(self.codepoints.len() + 1);
        for (byte_offset, _) in text.char_indices() {
            byte_of_cp.push(byte_offset);
        }
        byte_of_cp.push(text.len());

        self.codepoint_info = vec![ShapeCodepoint::default(); self.codepoints.len()];

        let grapheme_segmenter = GraphemeClusterSegmenter::new();
        for byte_offset in grapheme_segmenter.segment_str(&text) {
            if let Ok(cp_index) = byte_of_cp.binary_search(&byte_offset) {
                if cp_index < self.codepoint_info.len() {
                    self.codepoint_info[cp_index].break_flags.insert(BreakFlags::GRAPHEME);
                }
            }
        }

        let bidi = BidiInfo::new(&text, None);
        let paragraph_direction = match bidi.paragraphs.first() {
            Some(p) if bidi.levels[p.range.start].is_rtl() => Direction::Rtl,
            _ => Direction::Ltr,
        };

        let mut glyphs: Vec<Glyph> = Vec::with_capacity(self.codepoints.len());
        let mut run_direction: Option<Direction> = None;
        let mut cp_index = 0usize;

        let flush = |glyphs: &mut Vec<Glyph>,
                     run_direction: &mut Option<Direction>,
                     runs: &mut VecDeque<TestRun>,
                     hard: bool| {
            if glyphs.is_empty() {
                return;
            }
            let direction = run_direction.take().unwrap_or(Direction::Ltr);
            let mut flags = RunFlags::empty();
            if hard {
                flags = flags | RunFlags::LINE_HARD;
            }
            runs.push_back(TestRun {
                direction,
                paragraph_direction,
                flags,
                glyphs: std::mem::take(glyphs),
            });
        };

        for (byte_offset, ch) in text.char_indices() {
            let is_manual_break = self.manual_breaks.contains(&cp_index);
            let level = bidi
                .levels
                .get(byte_offset)
                .copied()
                .unwrap_or(unicode_bidi::Level::ltr());
            let direction = if level.is_rtl() { Direction::Rtl } else { Direction::Ltr };

            if is_manual_break || run_direction.is_some_and(|d| d != direction) {
                flush(&mut glyphs, &mut run_direction, &mut self.runs, false);
            }
            run_direction = Some(direction);

            let is_newline = ch == '\n';
            glyphs.push(Glyph {
                id: ch as u32,
                codepoint_index: cp_index,
                advance_x: if is_newline { 0.0 } else { 1.0 },
                advance_y: 0.0,
                offset_x: 0.0,
                offset_y: 0.0,
                flags: if self.codepoint_info[cp_index].break_flags.contains(BreakFlags::GRAPHEME) {
                    GlyphFlags::empty()
                } else {
                    GlyphFlags::NO_BREAK
                },
            });

            cp_index += 1;
        }

        flush(&mut glyphs, &mut run_direction, &mut self.runs, true);

        if let Some(last) = self.runs.back_mut() {
            last.flags = last.flags | RunFlags::LINE_HARD;
        }
    }

    fn shape_run(&mut self) -> Option<Self::Run<'_>> {
        self.runs.pop_front()
    }

    fn get_shape_codepoint(&self, index: usize) -> Option<ShapeCodepoint> {
        self.codepoint_info.get(index).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_ascii_is_one_ltr_run() {
        let mut shaper = TestShaper::new();
        shaper.shape_begin(Direction::DontKnow, "en");
        for cp in "ab".chars() {
            shaper.shape_codepoint(cp as u32);
        }
        shaper.shape_codepoint('\n' as u32);
        shaper.shape_end();

        let run = shaper.shape_run().unwrap();
        assert_eq!(run.direction(), Direction::Ltr);
        assert!(run.flags().contains(RunFlags::LINE_HARD));
        assert_eq!(run.into_glyphs().count(), 3);
        assert!(shaper.shape_run().is_none());
    }

    #[test]
    fn hebrew_run_is_tagged_rtl() {
        let mut shaper = TestShaper::new();
        shaper.shape_begin(Direction::DontKnow, "he");
        for cp in ['\u{05D0}', '\u{05D1}'] {
            shaper.shape_codepoint(cp as u32);
        }
        shaper.shape_codepoint('\n' as u32);
        shaper.shape_end();

        let run = shaper.shape_run().unwrap();
        assert_eq!(run.direction(), Direction::Rtl);
    }
}

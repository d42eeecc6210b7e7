//! Segments the character buffer into shaper calls, grounded on the reference
//! editor's per-style shape loop in `Draw()`: push fonts in lowest-to-highest
//! preference order (the shaper's fallback stack tries the topmost font first),
//! break the shaped run on every style change, and always end with an explicit
//! newline so the shaper hands back a final run terminated by `LINE_HARD`.

use crate::buffer::{Character, Style};
use crate::font::{self, FontRegistry};
use crate::rasterizer::Rasterizer;

use super::{Direction, ShapeError, Shaper};

pub struct ShapeDriver;

impl ShapeDriver {
    /// Runs one `shape_begin..shape_end` bracket over `text`, re-pushing the active
    /// style's font preference stack on every style change.
    pub fn feed<S: Shaper, R: Rasterizer>(
        shaper: &mut S,
        fonts: &FontRegistry<S, R>,
        text: &[Character],
        direction_hint: Direction,
        language_hint: &str,
    ) -> Result<(), ShapeError> {
        shaper.shape_begin(direction_hint, language_hint);

        let mut pushed = 0usize;
        let mut current_style: Option<Style> = None;

        for ch in text {
            if current_style != Some(ch.style) {
                if current_style.is_some() {
                    shaper.shape_manual_break();
                }
                push_style_stack(shaper, fonts, ch.style, &mut pushed)?;
                current_style = Some(ch.style);
            }
            shaper.shape_codepoint(ch.codepoint);
        }

        if current_style.is_none() {
            push_style_stack(shaper, fonts, Style::REGULAR, &mut pushed)?;
        }
        shaper.shape_codepoint('\n' as u32);

        shaper.shape_end();
        Ok(())
    }
}

/// Pops every previously pushed font, then pushes `style`'s preference permutation in
/// reverse (lowest score first) so the highest-scoring font ends up on top of the
/// shaper's fallback stack.
fn push_style_stack<S: Shaper, R: Rasterizer>(
    shaper: &mut S,
    fonts: &FontRegistry<S, R>,
    style: Style,
    pushed: &mut usize,
) -> Result<(), ShapeError> {
    for _ in 0..*pushed {
        shaper.shape_pop_font();
    }

    let order = fonts.preference_order(style);
    for &font_index in order.iter().rev() {
        let font = fonts
            .get(font_index)
            .ok_or(font::Error::NotFound(style))?;
        shaper.shape_push_font(font.shaper_handle());
    }
    *pushed = order.len();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Character;
    use crate::shape::test_support::TestShaper;
    use crate::rasterizer::test_support::TestRasterizer;

    fn registry_with_one_font() -> FontRegistry<TestShaper, TestRasterizer> {
        let mut fonts = FontRegistry::new(4);
        fonts.register((), (), false, false).unwrap();
        fonts
    }

    #[test]
    fn feeds_every_codepoint_plus_trailing_newline() {
        let fonts = registry_with_one_font();
        let mut shaper = TestShaper::new();
        let text: Vec<Character> = "ab".chars().map(|c| Character::new(c as u32, Style::REGULAR)).collect();

        ShapeDriver::feed(&mut shaper, &fonts, &text, Direction::DontKnow, "en").unwrap();

        assert_eq!(shaper.fed_codepoints(), &['a' as u32, 'b' as u32, '\n' as u32]);
    }

    #[test]
    fn style_change_emits_a_manual_break() {
        let fonts = registry_with_one_font();
        let mut shaper = TestShaper::new();
        let text = vec![
            Character::new('a' as u32, Style::REGULAR),
            Character::new('b' as u32, Style::BOLD),
        ];

        ShapeDriver::feed(&mut shaper, &fonts, &text, Direction::DontKnow, "en").unwrap();

        assert_eq!(shaper.manual_break_count(), 1);
    }
}

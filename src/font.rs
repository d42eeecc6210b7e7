//! The font registry: a small fixed set of registered fonts plus, for each of the
//! four canonical text styles, a fallback preference order over them.
//!
//! Grounded on the reference editor's `PushFont` and its preference-table bubble sort
//! in the editor init path, carried over into a registration-order-preserving,
//! `Rc`-handle-based registry rather than raw font-table indices.

use thiserror::Error;
use util::rc::Rc;

use crate::buffer::Style;
use crate::rasterizer::Rasterizer;
use crate::shape::Shaper;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no registered font can represent style {0:?}")]
    NotFound(Style),
    #[error("font registry is full (capacity {0})")]
    RegistryFull(usize),
}

struct FontInner<S: Shaper, R: Rasterizer> {
    shaper_font: S::Font,
    rasterizer_font: R::Font,
    bold: bool,
    italic: bool,
}

/// A cheaply `Clone`-able handle to a registered font.
///
/// `Rc`-backed rather than an index into the registry so that the shaping driver can
/// hold onto a font across a push/pop of the fallback stack without re-borrowing the
/// registry.
pub struct Font<S: Shaper, R: Rasterizer>(Rc<FontInner<S, R>>);

impl<S: Shaper, R: Rasterizer> Font<S, R> {
    pub fn shaper_handle(&self) -> &S::Font {
        &self.0.shaper_font
    }

    pub fn rasterizer_handle(&self) -> &R::Font {
        &self.0.rasterizer_font
    }

    pub fn is_bold(&self) -> bool {
        self.0.bold
    }

    pub fn is_italic(&self) -> bool {
        self.0.italic
    }
}

impl<S: Shaper, R: Rasterizer> Clone for Font<S, R> {
    fn clone(&self) -> Self {
        Font(self.0.clone())
    }
}

/// Score of one font against one requested style: `+1` per axis the font carries and
/// matches, `-1` per axis the font carries and mismatches, `0` for an axis the font
/// doesn't carry at all (an upright font is never penalized for "not being upright").
fn score(bold: bool, italic: bool, style: Style) -> i32 {
    let mut s = 0;
    if bold {
        s += if style.is_bold() { 1 } else { -1 };
    }
    if italic {
        s += if style.is_italic() { 1 } else { -1 };
    }
    s
}

pub struct FontRegistry<S: Shaper, R: Rasterizer> {
    fonts: Vec<Font<S, R>>,
    capacity: usize,
    /// One permutation of font indices per canonical style, highest-scoring first.
    preference: [Vec<usize>; 4],
}

impl<S: Shaper, R: Rasterizer> FontRegistry<S, R> {
    pub fn new(capacity: usize) -> Self {
        Self {
            fonts: Vec::with_capacity(capacity),
            capacity,
            preference: [Vec::new(), Vec::new(), Vec::new(), Vec::new()],
        }
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Font<S, R>> {
        self.fonts.get(index)
    }

    /// Registers a font and recomputes every style's preference permutation.
    pub fn register(
        &mut self,
        shaper_font: S::Font,
        rasterizer_font: R::Font,
        bold: bool,
        italic: bool,
    ) -> Result<usize, Error> {
        if self.fonts.len() >= self.capacity {
            return Err(Error::RegistryFull(self.capacity));
        }

        let index = self.fonts.len();
        self.fonts.push(Font(Rc::new(FontInner {
            shaper_font,
            rasterizer_font,
            bold,
            italic,
        })));
        self.recompute_preferences();
        Ok(index)
    }

    /// Recomputes, for each canonical style, a stable sort of font indices by
    /// descending score. Grounded on the reference editor's bubble sort: adjacent
    /// elements are swapped only on strict inequality, which is what preserves
    /// registration order among ties.
    fn recompute_preferences(&mut self) {
        let bold_italic = real_bold_italic_style();

        for (style_slot, style) in self.preference.iter_mut().zip(canonical_styles(bold_italic)) {
            let mut order: Vec<usize> = (0..self.fonts.len()).collect();
            let scores: Vec<i32> = self
                .fonts
                .iter()
                .map(|f| score(f.is_bold(), f.is_italic(), style))
                .collect();

            for _pass in 0..order.len() {
                for right in 1..order.len() {
                    let left = right - 1;
                    if scores[order[left]] < scores[order[right]] {
                        order.swap(left, right);
                    }
                }
            }

            *style_slot = order;
        }
    }

    /// The preferred fallback order for `style`, highest preference first.
    ///
    /// The shaping driver pushes these onto the shaper's font stack in *reverse*, so
    /// the highest-preference font ends up on top (tried first).
    pub fn preference_order(&self, style: Style) -> &[usize] {
        let idx = canonical_style_index(style);
        &self.preference[idx]
    }

    /// Finds the best-scoring font for `style`, if any are registered.
    pub fn best_for_style(&self, style: Style) -> Result<&Font<S, R>, Error> {
        self.preference_order(style)
            .first()
            .and_then(|&i| self.fonts.get(i))
            .ok_or(Error::NotFound(style))
    }
}

fn real_bold_italic_style() -> Style {
    Style::BOLD | Style::ITALIC
}

fn canonical_styles(bold_italic: Style) -> [Style; 4] {
    [Style::REGULAR, Style::ITALIC, Style::BOLD, bold_italic]
}

fn canonical_style_index(style: Style) -> usize {
    match (style.is_bold(), style.is_italic()) {
        (false, false) => 0,
        (false, true) => 1,
        (true, false) => 2,
        (true, true) => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::test_support::TestShaper;
    use crate::rasterizer::test_support::TestRasterizer;

    fn registry() -> FontRegistry<TestShaper, TestRasterizer> {
        FontRegistry::new(8)
    }

    #[test]
    fn regular_font_wins_regular_style_ties_broken_by_registration_order() {
        let mut reg = registry();
        reg.register((), (), false, false).unwrap(); // 0: upright
        reg.register((), (), false, false).unwrap(); // 1: another upright
        reg.register((), (), true, false).unwrap(); // 2: bold

        let order = reg.preference_order(Style::REGULAR);
        assert_eq!(order[0], 0);
        assert_eq!(order[1], 1);
        assert_eq!(order[2], 2);
    }

    #[test]
    fn italic_style_prefers_the_italic_font() {
        let mut reg = registry();
        reg.register((), (), false, false).unwrap(); // 0: upright
        reg.register((), (), false, true).unwrap(); // 1: italic

        let order = reg.preference_order(Style::ITALIC);
        assert_eq!(order[0], 1);
    }

    #[test]
    fn bold_italic_prefers_the_matching_font_over_partial_matches() {
        let mut reg = registry();
        reg.register((), (), true, false).unwrap(); // 0: bold only
        reg.register((), (), true, true).unwrap(); // 1: bold italic
        reg.register((), (), false, true).unwrap(); // 2: italic only

        let order = reg.preference_order(Style::BOLD | Style::ITALIC);
        assert_eq!(order[0], 1);
    }

    #[test]
    fn registry_full_is_an_error_not_a_silent_drop() {
        let mut reg = FontRegistry::<TestShaper, TestRasterizer>::new(1);
        reg.register((), (), false, false).unwrap();
        assert!(matches!(
            reg.register((), (), false, false),
            Err(Error::RegistryFull(1))
        ));
    }
}

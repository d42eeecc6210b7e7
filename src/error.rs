use thiserror::Error;

use crate::font;
use crate::shape::ShapeError;

/// Errors that cross an actual fallible boundary of the editor core.
///
/// These are distinct from the silent [`Degradation`](crate::Degradation) counters tracked
/// on [`Editor`](crate::Editor): a `Degradation` means an operation clamped itself and kept
/// going, an `Error` means the operation that produced it could not be completed at all.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Font(#[from] font::Error),
    #[error(transparent)]
    Shape(#[from] ShapeError),
}

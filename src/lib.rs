//! A rich-text editor core: a fixed-capacity styled character buffer, Unicode-aware
//! shaping and line flow, and the cursor/selection/undo state machine that sits on
//! top of them (§1–§9). The host supplies a [`Shaper`] and a [`Rasterizer`]; this
//! crate owns everything from keystroke to draw list.
//!
//! Grounded on the reference editor's single `editor` global and its `Draw()`/
//! `DoCommand()` pair, reshaped here as the generic [`Editor<S, R>`](editor::Editor).

#![allow(clippy::too_many_arguments)]

pub mod alloc;
pub mod buffer;
pub mod degradation;
pub mod draw;
pub mod edit;
pub mod editor;
pub mod error;
pub mod flow;
pub mod font;
pub mod line;
pub mod rasterizer;
pub mod shape;
pub mod undo;

pub use degradation::{Degradation, DegradationLog};
pub use editor::{Axis, Command, CommandKind, Editor, EditorConfig};
pub use error::Error;
pub use rasterizer::Rasterizer;
pub use shape::Shaper;

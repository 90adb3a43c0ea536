//! Flowchart text repair for the diagram renderer.
//!
//! Classifies raw generator output, normalizes it into text the renderer is
//! likely to accept, and synthesizes a guaranteed-valid fallback diagram when
//! it does not.

pub mod fallback;
pub mod normalize;
pub mod source;
pub mod tokens;

pub use fallback::synthesize;
pub use normalize::{double_letter_ids, normalize};
pub use source::DiagramSource;

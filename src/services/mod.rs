//! Domain services.
//!
//! `render` owns diagram identities and their fallback ladder; `export`
//! talks to the backend that rasterizes diagrams and converts them for the
//! external editor.

pub mod export;
pub mod render;

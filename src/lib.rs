//! Eligian compiler core.
//!
//! Lowers the syntax tree of an Eligian timeline program into the JSON
//! configuration consumed by the Eligius playback engine, together with a
//! source map from generated ids back to program locations.

pub mod dsl;
pub mod error;
pub mod model;
pub mod registry;
pub mod settings;

pub use dsl::compile;
pub use error::{CompileError, TransformError};
pub use model::{EligiusIR, EngineConfig};

#[allow(
    clippy::indexing_slicing,
    clippy::wildcard_imports,
    clippy::single_match_else,
    clippy::needless_pass_by_value,
    clippy::module_name_repetitions,
)]
pub mod ast;
#[allow(
    clippy::wildcard_imports,
    clippy::single_match_else,
    clippy::module_name_repetitions,
)]
pub mod constants;
#[allow(clippy::module_name_repetitions)]
pub mod documents;
#[allow(
    clippy::cast_possible_truncation,
    clippy::float_cmp,
    clippy::single_match_else,
    clippy::module_name_repetitions,
)]
pub mod eval;
#[allow(clippy::module_name_repetitions)]
pub mod imports;
#[allow(
    clippy::single_match_else,
    clippy::needless_pass_by_value,
    clippy::module_name_repetitions,
)]
pub mod scope;
#[allow(
    clippy::wildcard_imports,
    clippy::single_match_else,
    clippy::needless_pass_by_value,
    clippy::too_many_arguments,
    clippy::module_name_repetitions,
)]
pub mod transform;
#[allow(clippy::single_match_else, clippy::module_name_repetitions)]
pub mod typeck;

use std::path::Path;

use ast::{Library, Program};
use documents::DocumentResolver;

use crate::error::CompileError;
use crate::model::EligiusIR;
use crate::settings::{read_json, AssetBundle, CompilerSettings};

/// Compile a syntax tree into an engine configuration.
///
/// This is the primary public entry point:
/// syntax tree → lower → structural check → `EligiusIR`
pub fn compile(
    program: &Program,
    documents: &dyn DocumentResolver,
    assets: &AssetBundle,
    settings: &CompilerSettings,
) -> Result<EligiusIR, CompileError> {
    let ir = transform::lower_program(program, documents, assets, settings)?;
    typeck::check_config(&ir)?;
    Ok(ir)
}

/// Read a program syntax tree from a JSON file.
pub fn load_program(path: &Path) -> Result<Program, CompileError> {
    load_document(path)
}

/// Read a library syntax tree from a JSON file.
pub fn load_library(path: &Path) -> Result<Library, CompileError> {
    load_document(path)
}

fn load_document<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CompileError> {
    read_json(path).map_err(|e| CompileError::Document {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

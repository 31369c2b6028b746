//! Front door for embedding this crate: parse, compile, and run a source
//! string in one call, the way a host (a CLI, a language-server shim)
//! wants to use it rather than wiring the three stages together by hand.

use crate::bytecode::BytecodeImage;
use crate::config::Config;
use crate::error::{CompileError, Diagnostics, VmFault};
use crate::{compile, diagnostics, vm};
use subset_ts_vm_parser::{parse_with_errors, ParseErrors};

/// Everything a caller gets back from [`check_source`]: the compiled
/// image (useful for a second `vm::run` with a different [`Config`]), and
/// every class of problem found at each stage. A non-empty `parse_errors`
/// means `image` was built from a best-effort recovered tree (§7.1) and
/// its diagnostics should be read with that in mind.
#[derive(Debug)]
pub struct CheckOutcome {
    pub image: BytecodeImage,
    pub parse_errors: ParseErrors,
    pub compile_errors: Vec<CompileError>,
    pub diagnostics: Diagnostics,
}

impl CheckOutcome {
    /// True if nothing went wrong at any stage.
    pub fn is_clean(&self) -> bool {
        self.parse_errors.is_empty() && self.compile_errors.is_empty() && self.diagnostics.is_empty()
    }

    /// Render every VM diagnostic as `tsc` would print it, using this
    /// outcome's own image for the source map.
    pub fn render_diagnostics(&self, file_name: &str, source_text: &str) -> String {
        diagnostics::render_all(&self.diagnostics, &self.image.source_map, file_name, source_text)
    }
}

/// Parse, compile, and run `source` under `config`. Parse errors and
/// compile errors never abort this function — each stage does what it
/// can with a malformed tree and the caller inspects what came back.
/// Only a [`VmFault`] (a malformed bytecode image, never expected from
/// this crate's own compiler) stops the pipeline early.
pub fn check_source(source: &str, file_name: &str, config: Config) -> Result<CheckOutcome, VmFault> {
    let (source_file, parse_errors) = parse_with_errors(source);
    let (image, compile_errors) = compile::compile(&source_file);
    let diagnostics = vm::run(&image, file_name, source, config)?;
    Ok(CheckOutcome {
        image,
        parse_errors,
        compile_errors,
        diagnostics,
    })
}

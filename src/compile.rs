//! Adapter for the external assembler.

use std::path::Path;
use std::process::Command;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::errors::{Error, Result};

/// Assemble a source file with the external assembler and return the raw
/// program bytes.
///
/// A failed assembly is an error here; it never flows downstream as a
/// missing image.
pub fn compile_program(src: &Path, assembler: &Path) -> Result<Vec<u8>> {
    let out = NamedTempFile::new()?;
    debug!("assembling {} with {}", src.display(), assembler.display());

    let output = Command::new(assembler)
        .arg("-o")
        .arg(out.path())
        .arg(src)
        .output()
        .map_err(|e| Error::Compile(format!("failed to run {}: {}", assembler.display(), e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Compile(format!(
            "{} exited with {}: {}",
            assembler.display(),
            output.status,
            stderr.trim()
        )));
    }

    Ok(std::fs::read(out.path())?)
}

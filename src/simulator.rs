//! Bridge to the cycle-accurate hardware simulator.
//!
//! The simulator is driven through the hardware project's make target: the
//! image is serialized to a hex file the testbench loads, the testbench
//! runs, and its textual report is parsed back into an [`ExecResult`]. The
//! report parser is separate from the subprocess call so it can be exercised
//! on synthetic output.

use std::io::Write;
use std::path::PathBuf;
use std::process::Command;

use regex::Regex;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::config::{Config, CELL_BYTES};
use crate::errors::{Error, Result};
use crate::image::Image;
use crate::memory::{ExecResult, MemoryCell};

/// Number of word lines in a simulator hex image.
pub const IMAGE_WORDS: usize = 256;
/// Marker line for addresses the image leaves untouched, so downstream
/// tooling can tell them from explicit zeros.
pub const DONT_CARE: &str = "xxxx";
/// Testbench target built to run one simulation.
const SIM_TARGET: &str = "Processor_tb.vcd";

pub struct Simulator {
    config: Config,
    toolchain_dir: PathBuf,
}

impl Simulator {
    pub fn new(config: Config, toolchain_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            toolchain_dir: toolchain_dir.into(),
        }
    }

    /// Run the image through the simulator and collect its report.
    pub fn run(&self, image: &Image) -> Result<ExecResult> {
        let hex = write_hex_image(image)?;
        debug!("simulating {} byte image via {}", image.len(), hex.path().display());

        let output = Command::new("make")
            .current_dir(&self.toolchain_dir)
            .arg("-B")
            .arg(format!("TEST_FILE={}", hex.path().display()))
            .arg(SIM_TARGET)
            .output()
            .map_err(|e| {
                Error::Toolchain(format!(
                    "failed to run make in {}: {}",
                    self.toolchain_dir.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Toolchain(format!(
                "make exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let report = parse_report(&stdout, self.config.cells)?;
        Ok(ExecResult {
            cells: report.cells,
            cycles: report.cycles,
            size: image.len(),
        })
    }
}

/// Serialize an image to the hex format the testbench loads: one big-endian
/// 16-bit word per line for the program, then the don't-care marker up to
/// exactly [`IMAGE_WORDS`] lines. The file is removed when the handle drops.
fn write_hex_image(image: &Image) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    let mut lines = 0;
    for word in image.words() {
        writeln!(file, "{:04x}", word)?;
        lines += 1;
    }
    while lines < IMAGE_WORDS {
        writeln!(file, "{}", DONT_CARE)?;
        lines += 1;
    }
    file.flush()?;
    Ok(file)
}

/// A parsed simulator report.
pub struct Report {
    pub cycles: u64,
    pub cells: Vec<MemoryCell>,
}

/// Parse the simulator's textual report.
///
/// Two fixed grammars: a `Cycles: <n>` line anywhere (the last match wins,
/// 0 if absent), and the final `cells` lines, each a full cell dump of 512
/// colon-separated two-digit hex bytes. Anything malformed is rejected
/// rather than defaulted.
pub fn parse_report(text: &str, cells: usize) -> Result<Report> {
    let lines: Vec<&str> = text.trim().lines().collect();

    let cycle_re = Regex::new(r"^Cycles: ([0-9]+)$").unwrap();
    let mut cycles = 0;
    for line in &lines {
        if let Some(m) = cycle_re.captures(line) {
            cycles = m[1]
                .parse()
                .map_err(|_| Error::Toolchain(format!("cycle count out of range: {}", line)))?;
        }
    }

    if lines.len() < cells {
        return Err(Error::Toolchain(format!(
            "expected {} cell dumps, got {} lines of output",
            cells,
            lines.len()
        )));
    }
    let mut mem = Vec::with_capacity(cells);
    for line in &lines[lines.len() - cells..] {
        mem.push(parse_cell_line(line)?);
    }

    Ok(Report { cycles, cells: mem })
}

fn parse_cell_line(line: &str) -> Result<MemoryCell> {
    let mut bytes = [0u8; CELL_BYTES];
    let mut n = 0;
    for tok in line.trim().split(':') {
        if n == CELL_BYTES {
            return Err(Error::Toolchain(format!(
                "cell dump has more than {} bytes",
                CELL_BYTES
            )));
        }
        if tok.len() != 2 {
            return Err(Error::Toolchain(format!(
                "malformed byte `{}` in cell dump",
                tok
            )));
        }
        bytes[n] = u8::from_str_radix(tok, 16)
            .map_err(|_| Error::Toolchain(format!("malformed byte `{}` in cell dump", tok)))?;
        n += 1;
    }
    if n != CELL_BYTES {
        return Err(Error::Toolchain(format!(
            "cell dump has {} bytes, expected {}",
            n, CELL_BYTES
        )));
    }
    Ok(MemoryCell::new(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn config() -> Config {
        Config {
            address_bits: 8,
            data_bits: 16,
            cores: 1,
            cells: 2,
        }
    }

    fn cell_line(sp: u8) -> String {
        let mut bytes = [0u8; CELL_BYTES];
        bytes[0] = sp;
        crate::diff::byte_string(&bytes)
    }

    #[test]
    fn hex_image_is_words_then_dont_care() {
        let img = Image::build(vec![0xab, 0xcd, 0x00, 0x5e], &config()).unwrap();
        let hex = write_hex_image(&img).unwrap();
        let mut text = String::new();
        hex.reopen().unwrap().read_to_string(&mut text).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), IMAGE_WORDS);
        assert_eq!(lines[0], "abcd");
        assert_eq!(lines[1], "005e");
        assert!(lines[2..].iter().all(|l| *l == DONT_CARE));
    }

    #[test]
    fn report_takes_the_last_cycles_line() {
        let text = format!(
            "building...\nCycles: 10\nCycles: 42\n{}\n{}\n",
            cell_line(0),
            cell_line(254)
        );
        let report = parse_report(&text, 2).unwrap();
        assert_eq!(report.cycles, 42);
        assert_eq!(report.cells.len(), 2);
        assert_eq!(report.cells[1].sp(), 254);
    }

    #[test]
    fn missing_cycles_line_defaults_to_zero() {
        let text = cell_line(0);
        let report = parse_report(&text, 1).unwrap();
        assert_eq!(report.cycles, 0);
    }

    #[test]
    fn too_few_trailing_lines_is_an_error() {
        let text = format!("Cycles: 3\n{}\n", cell_line(0));
        assert!(matches!(parse_report(&text, 3), Err(Error::Toolchain(_))));
    }

    #[test]
    fn malformed_cell_line_is_rejected() {
        let text = "Cycles: 3\n00:zz:01\n";
        assert!(matches!(parse_report(text, 1), Err(Error::Toolchain(_))));

        let short = "Cycles: 3\n00:01:02\n";
        assert!(matches!(parse_report(short, 1), Err(Error::Toolchain(_))));
    }
}

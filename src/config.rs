//! Hardware configuration, read once from the project's defaults header and
//! threaded through every constructor that needs it.

use std::path::Path;

use regex::Regex;

use crate::errors::{Error, Result};

/// Size of one core's memory snapshot in bytes.
pub const CELL_BYTES: usize = 512;

/// Address and data widths of the processor plus the core/cell layout.
///
/// `address_bits` and `data_bits` have no built-in default; the defaults
/// header must provide them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub address_bits: u32,
    pub data_bits: u32,
    pub cores: usize,
    pub cells: usize,
}

impl Config {
    /// Read the configuration from the hardware project's defaults header.
    ///
    /// Recognized directives: `ADDRESS_BITS <n>`, `DATA_BITS <n>`,
    /// `` `define MULTI_CORE <n> `` and `` `define CELL_COUNT <n> ``.
    /// Core count defaults to 1, cell count to 16.
    pub fn from_defaults_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::parse_defaults(&text, &path.display().to_string())
    }

    fn parse_defaults(text: &str, path: &str) -> Result<Self> {
        let p_addr = Regex::new(r"ADDRESS_BITS ([0-9]+)").unwrap();
        let p_data = Regex::new(r"DATA_BITS ([0-9]+)").unwrap();
        let p_cores = Regex::new(r"^`define MULTI_CORE ([0-9]+)").unwrap();
        let p_cells = Regex::new(r"^`define CELL_COUNT ([0-9]+)").unwrap();

        let mut address_bits = None;
        let mut data_bits = None;
        let mut cores = 1;
        let mut cells = 16;

        for line in text.lines() {
            let line = line.trim();
            if let Some(m) = p_addr.captures(line) {
                address_bits = m[1].parse().ok();
            }
            if let Some(m) = p_data.captures(line) {
                data_bits = m[1].parse().ok();
            }
            if let Some(m) = p_cores.captures(line) {
                cores = m[1].parse().unwrap_or(cores);
            }
            if let Some(m) = p_cells.captures(line) {
                cells = m[1].parse().unwrap_or(cells);
            }
        }

        let config = Self {
            address_bits: address_bits.ok_or(Error::MissingDefault {
                key: "ADDRESS_BITS",
                path: path.to_string(),
            })?,
            data_bits: data_bits.ok_or(Error::MissingDefault {
                key: "DATA_BITS",
                path: path.to_string(),
            })?,
            cores,
            cells,
        };
        config.validate()?;
        Ok(config)
    }

    /// Addressable RAM in bytes, `2^address_bits * data_bits / 8`.
    pub fn ram_bytes(&self) -> usize {
        (1usize << self.address_bits) * self.data_bits as usize / 8
    }

    /// Check the invariants that tie the widths to the snapshot layout.
    ///
    /// The device reports memory as fixed 512-byte cells covering all
    /// addressable RAM, so the addressable space must fit one cell region.
    pub fn validate(&self) -> Result<()> {
        if self.address_bits == 0 || self.data_bits == 0 {
            return Err(Error::Config(
                "address and data widths must be nonzero".to_string(),
            ));
        }
        if self.data_bits % 8 != 0 {
            return Err(Error::Config(format!(
                "data width {} is not a whole number of bytes",
                self.data_bits
            )));
        }
        if self.ram_bytes() > CELL_BYTES {
            return Err(Error::Config(format!(
                "{} bit addresses with {} bit words imply {} bytes of RAM, \
                 more than the {} byte cell snapshot",
                self.address_bits,
                self.data_bits,
                self.ram_bytes(),
                CELL_BYTES
            )));
        }
        if self.cores == 0 || self.cells < self.cores {
            return Err(Error::Config(format!(
                "{} cells cannot hold {} cores",
                self.cells, self.cores
            )));
        }
        Ok(())
    }
}

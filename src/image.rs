//! Program image construction.

use crate::config::Config;
use crate::errors::{Error, Result};

/// Encoding of the no-op instruction, used as padding.
pub const NOP: u8 = 0x5e;

/// A padded, capacity-checked binary program ready for simulation or
/// transmission. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    bytes: Vec<u8>,
}

impl Image {
    /// Build an image from raw program bytes.
    ///
    /// Odd-length input gets exactly one NOP byte of padding, and an empty
    /// program becomes a single NOP so there is always a last word to
    /// address. The result must fit the device's addressable RAM.
    pub fn build(mut bytes: Vec<u8>, config: &Config) -> Result<Self> {
        if bytes.len() % 2 == 1 || bytes.is_empty() {
            bytes.push(NOP);
        }
        let limit = config.ram_bytes();
        if bytes.len() > limit {
            return Err(Error::Capacity {
                size: bytes.len(),
                limit,
            });
        }
        Ok(Self { bytes })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Zero-based address of the last 16-bit word.
    pub fn last_word_addr(&self) -> u8 {
        ((self.bytes.len() - 1) / 2) as u8
    }

    /// Big-endian 16-bit words of the image. A trailing half word (only
    /// possible for the single-NOP image) is filled out with NOP.
    pub fn words(&self) -> impl Iterator<Item = u16> + '_ {
        self.bytes
            .chunks(2)
            .map(|c| u16::from_be_bytes([c[0], *c.get(1).unwrap_or(&NOP)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            address_bits: 8,
            data_bits: 16,
            cores: 1,
            cells: 16,
        }
    }

    #[test]
    fn even_input_is_preserved_verbatim() {
        let img = Image::build(vec![1, 2, 3, 4], &config()).unwrap();
        assert_eq!(img.as_bytes(), &[1, 2, 3, 4]);
        assert_eq!(img.last_word_addr(), 1);
    }

    #[test]
    fn odd_input_gets_one_nop() {
        let img = Image::build(vec![1, 2, 3], &config()).unwrap();
        assert_eq!(img.as_bytes(), &[1, 2, 3, NOP]);
        assert_eq!(img.len(), 4);
    }

    #[test]
    fn empty_input_becomes_a_single_nop() {
        let img = Image::build(Vec::new(), &config()).unwrap();
        assert_eq!(img.as_bytes(), &[NOP]);
        assert_eq!(img.last_word_addr(), 0);
    }

    #[test]
    fn capacity_is_the_addressable_ram() {
        // 8 bit addresses, 16 bit words: 512 bytes of RAM
        assert!(Image::build(vec![0; 512], &config()).is_ok());
        let err = Image::build(vec![0; 513], &config()).unwrap_err();
        assert!(matches!(
            err,
            Error::Capacity {
                size: 514,
                limit: 512
            }
        ));
    }

    #[test]
    fn words_are_big_endian() {
        let img = Image::build(vec![0xab, 0xcd, 0x00, 0x01], &config()).unwrap();
        assert_eq!(img.words().collect::<Vec<_>>(), vec![0xabcd, 0x0001]);
    }
}

//! Serial link to the device.
//!
//! Wire protocol, request: one length byte holding the address of the
//! image's last 16-bit word, then the raw image bytes, then a flush.
//! Response: one 512-byte memory snapshot per cell, in core order. There is
//! no framing or checksum; a read that comes up short on timeout is a typed
//! error, never a truncated result.

use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::config::{Config, CELL_BYTES};
use crate::errors::{Error, Result};
use crate::image::Image;
use crate::memory::{ExecResult, MemoryCell};

/// Device-name patterns recognized by port auto-detection.
const PORT_PATTERNS: &[&str] = &["cu.usbserial", "ttyUSB", "ttyACM"];

/// Find a plugged-in device by scanning `/dev`.
///
/// Conservative: candidates are sorted and the last one wins, so a freshly
/// enumerated adapter is preferred over a stale entry.
pub fn auto_port() -> Result<String> {
    let mut matches: Vec<String> = std::fs::read_dir("/dev")?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| PORT_PATTERNS.iter().any(|p| name.starts_with(p)))
        .collect();
    matches.sort();
    match matches.pop() {
        Some(name) => Ok(format!("/dev/{}", name)),
        None => Err(Error::DeviceNotFound(
            "no usb-serial device under /dev, please reconnect the FPGA".to_string(),
        )),
    }
}

/// Resolve an explicit port path or fall back to auto-detection. The path
/// must exist either way.
pub fn resolve_port(port: Option<&str>) -> Result<String> {
    let port = match port {
        Some(p) => p.to_string(),
        None => auto_port()?,
    };
    if !Path::new(&port).exists() {
        return Err(Error::DeviceNotFound(format!(
            "{} is not a known path",
            port
        )));
    }
    Ok(port)
}

/// Byte-oriented duplex channel. The wire protocol is written against this
/// seam so it can be exercised without hardware.
pub trait Channel {
    fn send(&mut self, buf: &[u8]) -> Result<()>;

    /// Read up to `buf.len()` bytes, returning how many arrived before the
    /// timeout. A short count is not an error at this layer.
    fn recv(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Block until every written byte is physically out.
    fn flush(&mut self) -> Result<()>;
}

/// A [`Channel`] over a real serial port. The port is closed when the value
/// drops, on every exit path.
pub struct SerialChannel {
    port: Box<dyn serialport::SerialPort>,
}

impl SerialChannel {
    pub fn open(path: &str, baudrate: u32, timeout: Duration) -> Result<Self> {
        let port = serialport::new(path, baudrate).timeout(timeout).open()?;
        Ok(Self { port })
    }
}

impl Channel for SerialChannel {
    fn send(&mut self, buf: &[u8]) -> Result<()> {
        self.port.write_all(buf)?;
        Ok(())
    }

    fn recv(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut total = 0;
        while total < buf.len() {
            match self.port.read(&mut buf[total..]) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => break,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(total)
    }

    fn flush(&mut self) -> Result<()> {
        self.port.flush()?;
        Ok(())
    }
}

/// Push an image to the device and read back every cell snapshot.
///
/// Every read is validated against the expected snapshot size: a shortfall
/// under timeout becomes [`Error::ShortRead`] so downstream decoding never
/// sees a truncated cell.
pub fn send_image<C: Channel>(chan: &mut C, image: &Image, config: &Config) -> Result<ExecResult> {
    chan.send(&[image.last_word_addr()])?;
    chan.send(image.as_bytes())?;
    chan.flush()?;
    debug!("sent {} bytes, reading {} cells", image.len(), config.cells);

    let mut cells = Vec::with_capacity(config.cells);
    for cell in 0..config.cells {
        let mut buf = [0u8; CELL_BYTES];
        let got = chan.recv(&mut buf)?;
        if got != CELL_BYTES {
            return Err(Error::ShortRead {
                cell,
                expected: CELL_BYTES,
                got,
            });
        }
        cells.push(MemoryCell::new(buf));
    }

    // Timing is not observable over this channel.
    Ok(ExecResult {
        cells,
        cycles: 0,
        size: image.len(),
    })
}

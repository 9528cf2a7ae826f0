use thiserror::Error;

/// Harness errors.
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to read default {key} from {path}")]
    MissingDefault { key: &'static str, path: String },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("no device found: {0}")]
    DeviceNotFound(String),
    #[error("program size {size} exceeds maximum allowed size of {limit}")]
    Capacity { size: usize, limit: usize },
    #[error("assembler failed: {0}")]
    Compile(String),
    #[error("simulator toolchain failed: {0}")]
    Toolchain(String),
    #[error("short read on cell {cell}: expected {expected} bytes, got {got}")]
    ShortRead {
        cell: usize,
        expected: usize,
        got: usize,
    },
    #[error("invalid expect declaration: {0}")]
    Expect(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serial error: {0}")]
    Serial(#[from] serialport::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

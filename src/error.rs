use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReceiverError {
    #[error("buffer length {0} is not a power of two")]
    BufferLenNotPowerOfTwo(usize),

    #[error("bin layout needs {last_bin} bins but the spectrum only has {bins}")]
    BinLayoutOutOfRange { last_bin: usize, bins: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, ReceiverError>;

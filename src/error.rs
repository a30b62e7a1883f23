use thiserror::Error;

/// Errors produced while parsing and demultiplexing a transport stream.
#[derive(Error, Debug)]
pub enum DemuxError {
    /// A transport packet was not exactly 188 bytes
    #[error("invalid packet length: expected 188 bytes, got {0}")]
    InvalidLength(usize),

    /// The first byte of a transport packet was not 0x47
    #[error("invalid sync byte: 0x{0:02X}")]
    InvalidSyncByte(u8),

    /// A PES buffer ended before its header did
    #[error("PES data too short: need {expected} bytes, have {actual}")]
    TooShort {
        /// Bytes needed
        expected: usize,
        /// Bytes available
        actual: usize,
    },

    /// A PES buffer did not begin with 00 00 01
    #[error("invalid PES start code prefix")]
    InvalidStartCode,

    /// The bit reader ran out of data
    #[error("reached end of bitstream data")]
    EndOfData,

    /// A caller passed an out-of-range argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Well-framed data with an unusable value
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Strict continuity checking saw a counter gap
    #[error("continuity error on PID {pid}: expected {expected}, got {actual}")]
    ContinuityError {
        /// Stream the gap was seen on
        pid: u16,
        /// Counter that should have followed
        expected: u8,
        /// Counter that arrived
        actual: u8,
    },

    /// Opening, writing or flushing the output of one PID failed
    #[error("sink error on PID {pid}: {source}")]
    SinkIo {
        /// Stream whose output failed
        pid: u16,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// Reading the input failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration value could not be used
    #[error("config error: {0}")]
    Config(String),
}

impl DemuxError {
    /// Returns true for failures local to one packet, PES unit or PID.
    ///
    /// A demux loop is expected to log these and carry on with the next
    /// packet. Input read failures and configuration errors are fatal.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DemuxError::InvalidLength(_)
                | DemuxError::InvalidSyncByte(_)
                | DemuxError::TooShort { .. }
                | DemuxError::InvalidStartCode
                | DemuxError::ContinuityError { .. }
                | DemuxError::SinkIo { .. }
        )
    }
}

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, DemuxError>;

use super::types::TS_PACKET_SIZE;
use crate::error::Result;
use std::io::ErrorKind;
use tokio::io::{AsyncRead, AsyncReadExt};

/// What the next read from a [`TSPacketReader`] produced.
#[derive(Debug, PartialEq, Eq)]
pub enum ReadOutcome<'a> {
    /// A full 188-byte chunk. Its first byte has not been checked.
    Packet(&'a [u8]),
    /// The input ended partway through a packet; holds the bytes received.
    Truncated(usize),
    /// The input ended on a packet boundary.
    EndOfStream,
}

/// Splits an async byte stream into consecutive 188-byte chunks.
///
/// The chunk is kept in an internal buffer that the next read overwrites,
/// so the returned slice only lives until then. No resynchronisation is
/// attempted; a stream that loses alignment keeps producing chunks that fail
/// the sync byte check.
pub struct TSPacketReader<R: AsyncRead + Unpin> {
    reader: R,
    buf: [u8; TS_PACKET_SIZE],
    packets_read: u64,
    finished: bool,
}

impl<R: AsyncRead + Unpin> TSPacketReader<R> {
    /// Wraps `reader`; nothing is read until the first call.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: [0u8; TS_PACKET_SIZE],
            packets_read: 0,
            finished: false,
        }
    }

    /// Full packets returned so far.
    pub fn packets_read(&self) -> u64 {
        self.packets_read
    }

    /// Reads the next chunk.
    ///
    /// Once the input is exhausted every further call returns
    /// `EndOfStream`. Read failures other than interruption propagate as
    /// `DemuxError::Io`.
    pub async fn next_packet(&mut self) -> Result<ReadOutcome<'_>> {
        if self.finished {
            return Ok(ReadOutcome::EndOfStream);
        }

        let mut filled = 0;
        while filled < TS_PACKET_SIZE {
            match self.reader.read(&mut self.buf[filled..]).await {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        match filled {
            TS_PACKET_SIZE => {
                self.packets_read += 1;
                Ok(ReadOutcome::Packet(&self.buf))
            }
            0 => {
                self.finished = true;
                Ok(ReadOutcome::EndOfStream)
            }
            partial => {
                self.finished = true;
                Ok(ReadOutcome::Truncated(partial))
            }
        }
    }

    /// Returns the wrapped reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

use super::assembler::{PidStats, StreamAssembler};
use super::parser::parse_packet;
use super::reader::{ReadOutcome, TSPacketReader};
use super::sink::SinkFactory;
use crate::error::Result;
use crate::utils::hex_dump;
use log::{debug, log_enabled, trace, warn, Level};
use tokio::io::AsyncRead;

/// MPEG Transport Stream demuxer.
///
/// Drives a [`TSPacketReader`] into a [`StreamAssembler`]:
/// - every 188-byte chunk is parsed; bad packets are logged and skipped
/// - parsed packets are handed to the assembler, whose per-PID failures
///   are logged and counted
/// - reading stops at end of input, at a truncated final packet, or after
///   the configured packet limit, and the assembler is closed
pub struct TSDemuxer<R: AsyncRead + Unpin, F: SinkFactory> {
    reader: TSPacketReader<R>,
    assembler: StreamAssembler<F>,
    max_packets: Option<u64>,
}

/// What a [`TSDemuxer::run`] call processed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DemuxSummary {
    /// Full 188-byte chunks read from the input
    pub packets_read: u64,
    /// Chunks rejected by the packet parser
    pub invalid_packets: u64,
    /// Recoverable errors reported by the assembler (sink failures,
    /// continuity violations in strict mode)
    pub assembler_errors: u64,
    /// Size of a trailing partial packet, if the input ended mid-packet
    pub truncated_tail: Option<usize>,
    /// Per-PID statistics, sorted by PID
    pub pids: Vec<(u16, PidStats)>,
}

impl<R: AsyncRead + Unpin, F: SinkFactory> TSDemuxer<R, F> {
    /// Creates a new TS demuxer.
    pub fn new(reader: R, assembler: StreamAssembler<F>) -> Self {
        Self {
            reader: TSPacketReader::new(reader),
            assembler,
            max_packets: None,
        }
    }

    /// Stops after `max_packets` chunks have been read.
    pub fn with_max_packets(mut self, max_packets: Option<u64>) -> Self {
        self.max_packets = max_packets;
        self
    }

    /// The assembler, for inspecting statistics.
    pub fn assembler(&self) -> &StreamAssembler<F> {
        &self.assembler
    }

    /// Runs the demux loop to completion.
    ///
    /// Only an input read failure aborts the loop; it is returned as
    /// `DemuxError::Io` and the assembler is left to be closed on drop.
    pub async fn run(&mut self) -> Result<DemuxSummary> {
        let mut summary = DemuxSummary::default();

        loop {
            if self
                .max_packets
                .is_some_and(|max| summary.packets_read >= max)
            {
                debug!("Reached packet limit of {}", summary.packets_read);
                break;
            }

            let data = match self.reader.next_packet().await? {
                ReadOutcome::Packet(data) => data,
                ReadOutcome::Truncated(len) => {
                    warn!(
                        "Input ends with a truncated packet ({} of 188 bytes), ignoring it",
                        len
                    );
                    summary.truncated_tail = Some(len);
                    break;
                }
                ReadOutcome::EndOfStream => break,
            };
            summary.packets_read += 1;

            if log_enabled!(Level::Trace) {
                trace!("Packet {}:\n{}", summary.packets_read, hex_dump(data));
            }

            let packet = match parse_packet(data) {
                Ok(packet) => packet,
                Err(e) => {
                    warn!("Skipping packet {}: {}", summary.packets_read, e);
                    summary.invalid_packets += 1;
                    continue;
                }
            };
            debug!("{}", packet);

            if let Err(e) = self.assembler.add_packet(&packet) {
                if !e.is_recoverable() {
                    return Err(e);
                }
                warn!("Packet {} on PID {}: {}", summary.packets_read, packet.pid(), e);
                summary.assembler_errors += 1;
            }
        }

        if let Err(e) = self.assembler.close() {
            warn!("Failed to close outputs: {}", e);
            summary.assembler_errors += 1;
        }
        summary.pids = self.assembler.stats();

        debug!(
            "Demux finished: {} packets, {} invalid, {} assembler errors",
            summary.packets_read, summary.invalid_packets, summary.assembler_errors
        );
        Ok(summary)
    }
}

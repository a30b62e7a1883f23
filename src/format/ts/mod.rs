//! # MPEG Transport Stream (TS) Demultiplexing
//!
//! This module splits an MPEG Transport Stream into per-PID elementary
//! streams:
//!
//! - TS packet parsing, including adaptation fields and the PCR base
//! - Packetized Elementary Stream (PES) header parsing with PTS/DTS
//! - PES reassembly per PID with the PES header stripped on output
//! - Optional continuity counter checking
//!
//! ## Core Features
//!
//! - **Parsing**: [`parse_packet`] and [`parse_pes`] are pure and borrow from
//!   the caller's buffer
//! - **Assembly**: [`StreamAssembler`] owns one buffer and one sink per PID
//! - **Sinks**: files via [`FileSinkFactory`], memory via [`MemorySinkFactory`],
//!   or any [`SinkFactory`] implementation
//! - **Driving**: [`TSDemuxer`] reads an async input and ties it all together
//!
//! ## Example Usage
//!
//! ### Parsing a Packet
//!
//! ```rust
//! use tsdemux::format::ts::{parse_packet, TS_PACKET_SIZE};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut data = [0xFFu8; TS_PACKET_SIZE];
//! data[..4].copy_from_slice(&[0x47, 0x41, 0x00, 0x10]);
//!
//! let packet = parse_packet(&data)?;
//! assert_eq!(packet.pid(), 256);
//! assert!(packet.payload_unit_start());
//! assert_eq!(packet.payload.len(), 184);
//! # Ok(())
//! # }
//! ```
//!
//! ### Demuxing a File
//!
//! ```rust,no_run
//! use tsdemux::format::ts::{FileSinkFactory, StreamAssembler, TSDemuxer};
//!
//! # async fn demux() -> Result<(), Box<dyn std::error::Error>> {
//! let input = tokio::fs::File::open("input.ts").await?;
//! let sinks = FileSinkFactory::new("./output")?;
//!
//! let mut demuxer = TSDemuxer::new(input, StreamAssembler::new(sinks));
//! let summary = demuxer.run().await?;
//! println!("{} packets, {} PIDs", summary.packets_read, summary.pids.len());
//! # Ok(())
//! # }
//! ```

/// PES reassembly and continuity checking
pub mod assembler;

/// Read/parse/assemble driving loop
pub mod demuxer;

/// Low-level TS packet parsing utilities
pub mod parser;

/// PES packet handling and ES extraction
pub mod pes;

/// Fixed-size packet reader over async input
pub mod reader;

/// Output destinations for elementary streams
pub mod sink;

/// Core TS types and constants
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types and constants
pub use assembler::{ContinuityMode, PidStats, StreamAssembler};
pub use demuxer::{DemuxSummary, TSDemuxer};
pub use parser::{parse_adaptation_field, parse_header, parse_packet};
pub use pes::{extract_es, parse_pes, parse_timestamp, EsPayload, PESHeader, PESPacket};
pub use reader::{ReadOutcome, TSPacketReader};
pub use sink::{FileSinkFactory, MemorySink, MemorySinkFactory, SinkFactory};
pub use types::{
    pcr_base_to_duration, pts_to_duration, AdaptationField, AdaptationFieldControl, TSHeader,
    TSPacket, PID_NULL, PID_PAT, TS_PACKET_SIZE, TS_SYNC_BYTE,
};

#![doc(html_root_url = "https://docs.rs/tsdemux/0.1.0")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

//! # tsdemux - MPEG Transport Stream demultiplexer
//!
//! `tsdemux` splits an MPEG Transport Stream into its elementary streams.
//! Every PID is tracked independently: PES units are reassembled from
//! 188-byte transport packets, their PES headers are stripped, and the raw
//! elementary stream bytes are appended to one output per PID.
//!
//! ## Features
//!
//! ### Transport Layer
//! - Packet header and adaptation field parsing
//! - PCR base extraction
//! - Optional continuity counter checking (off, warn, strict)
//!
//! ### PES Layer
//! - PES header parsing with PTS/DTS decoding
//! - Per-PID reassembly driven by the payload_unit_start_indicator
//! - Non-PES data passed through untouched
//!
//! ### Bitstream Utilities
//! - MSB-first bit reader with Exp-Golomb decoding for codec headers
//!
//! ## Quick Start
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! tsdemux = "0.1.0"
//! ```
//!
//! ### Demuxing a File
//!
//! ```rust,no_run
//! use tsdemux::config::DemuxConfig;
//! use tsdemux::format::ts::{FileSinkFactory, StreamAssembler, TSDemuxer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DemuxConfig::load();
//!
//!     let sinks = FileSinkFactory::new(&config.output_dir)?
//!         .with_extension(config.extension.clone());
//!     let assembler = StreamAssembler::new(sinks).with_continuity(config.continuity);
//!
//!     let input = tokio::fs::File::open("input.ts").await?;
//!     let mut demuxer = TSDemuxer::new(input, assembler).with_max_packets(config.max_packets);
//!
//!     let summary = demuxer.run().await?;
//!     for (pid, stats) in &summary.pids {
//!         println!("PID {}: {} bytes", pid, stats.es_bytes);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! - `format`: container formats
//!   - `ts`: packet parser, PES parser, assembler, sinks and the demux loop
//!
//! - `config`: demux settings from defaults, config files and environment
//!
//! - `error`: Error handling types and utilities
//!   - `DemuxError` with a recoverable/fatal split
//!   - Result type alias for convenience
//!
//! - `utils`: Common utilities and helper functions
//!   - Bitstream reading
//!   - Hex dumps
//!

/// Error types and utilities
pub mod error;

/// Media format implementations
pub mod format;

/// Common utilities and helper functions
pub mod utils;

/// Configuration module
pub mod config;

pub use error::{DemuxError, Result};

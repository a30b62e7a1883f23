//! Container format implementations.

/// MPEG Transport Stream demultiplexing
pub mod ts;

pub use self::ts::{StreamAssembler, TSDemuxer};

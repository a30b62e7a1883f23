//! # Utility Functions and Types
//!
//! Common helpers used throughout the tsdemux library:
//!
//! - Bit-level reading for codec bitstreams (Exp-Golomb included)
//! - Hex dumps for diagnostics
//!
//! ## Bit Operations
//!
//! ```rust
//! use tsdemux::utils::BitReader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let data = vec![0b10110011u8];
//! let mut reader = BitReader::new(&data);
//!
//! // Read specific number of bits
//! let value = reader.read_bits(3)?; // Reads first 3 bits (101)
//! assert_eq!(value, 0b101);
//! # Ok(())
//! # }
//! ```
//!
//! ## Hex Dumps
//!
//! ```rust
//! use tsdemux::utils::hex_dump;
//!
//! let dump = hex_dump(b"GA");
//! assert!(dump.starts_with("0000 47 41"));
//! ```

/// Bit manipulation and bitstream reading utilities
pub mod bits;

/// Hex dump rendering
pub mod hex;

pub use bits::BitReader;
pub use hex::hex_dump;

use super::pes::{extract_es, EsPayload};
use super::sink::SinkFactory;
use super::types::{TSPacket, PID_NULL};
use crate::error::{DemuxError, Result};
use bytes::BytesMut;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::str::FromStr;

/// How the assembler treats continuity counter gaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContinuityMode {
    /// Counters are not evaluated.
    #[default]
    Disabled,
    /// Gaps are logged and counted; the packet is still assembled.
    /// A single repeated counter is a duplicate and is dropped.
    Warn,
    /// Gaps fail `add_packet` and the packet is not assembled.
    /// Duplicates are dropped as in `Warn`.
    Strict,
}

impl FromStr for ContinuityMode {
    type Err = DemuxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "disabled" | "none" => Ok(ContinuityMode::Disabled),
            "warn" => Ok(ContinuityMode::Warn),
            "strict" => Ok(ContinuityMode::Strict),
            other => Err(DemuxError::Config(format!(
                "unknown continuity mode '{}' (expected off, warn or strict)",
                other
            ))),
        }
    }
}

impl fmt::Display for ContinuityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContinuityMode::Disabled => "off",
            ContinuityMode::Warn => "warn",
            ContinuityMode::Strict => "strict",
        };
        f.write_str(name)
    }
}

/// Per-PID counters collected while assembling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PidStats {
    /// Packets with a non-empty payload accepted for this PID
    pub packets: u64,
    /// Transport payload bytes copied into the reassembly buffer
    pub payload_bytes: u64,
    /// Completed units handed to ES extraction
    pub units: u64,
    /// Elementary stream bytes written to the sink
    pub es_bytes: u64,
    /// Continuity gaps detected (always 0 when checking is disabled)
    pub continuity_errors: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Continuity {
    Initial,
    Ok,
    Duplicate,
    Gap { expected: u8, actual: u8 },
}

/// Reassembly state for one PID.
struct PidState<S> {
    buffer: Option<BytesMut>,
    sink: Option<S>,
    last_cc: Option<u8>,
    duplicate_seen: bool,
    stats: PidStats,
}

impl<S> Default for PidState<S> {
    fn default() -> Self {
        Self {
            buffer: None,
            sink: None,
            last_cc: None,
            duplicate_seen: false,
            stats: PidStats::default(),
        }
    }
}

impl<S> PidState<S> {
    fn check_continuity(&mut self, cc: u8, discontinuity: bool) -> Continuity {
        let last_cc = match self.last_cc {
            Some(last_cc) if !discontinuity => last_cc,
            _ => {
                self.last_cc = Some(cc);
                self.duplicate_seen = false;
                return Continuity::Initial;
            }
        };

        let expected = (last_cc + 1) & 0x0F;
        if cc == expected {
            self.last_cc = Some(cc);
            self.duplicate_seen = false;
            Continuity::Ok
        } else if cc == last_cc && !self.duplicate_seen {
            self.duplicate_seen = true;
            Continuity::Duplicate
        } else {
            self.last_cc = Some(cc);
            self.duplicate_seen = false;
            Continuity::Gap {
                expected,
                actual: cc,
            }
        }
    }
}

/// Reassembles PES units per PID and writes their elementary stream bytes
/// to sinks obtained from a [`SinkFactory`].
///
/// A unit starts with a packet whose payload_unit_start_indicator is set and
/// runs until the next such packet on the same PID; that boundary flushes
/// the previous unit. Units still open when the assembler is closed (or
/// dropped) are flushed then. Every PID is tracked the same way, PSI tables
/// included.
///
/// # Example
///
/// ```
/// use tsdemux::format::ts::{parse_packet, MemorySinkFactory, StreamAssembler};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let outputs = MemorySinkFactory::new();
/// let mut assembler = StreamAssembler::new(outputs.clone());
///
/// let mut packet = [0xFFu8; 188];
/// packet[..4].copy_from_slice(&[0x47, 0x40, 0x64, 0x10]);
/// packet[4..13].copy_from_slice(&[0x00, 0x00, 0x01, 0xE0, 0x00, 0x00, 0x80, 0x00, 0x00]);
///
/// assembler.add_packet(&parse_packet(&packet)?)?;
/// assembler.close()?;
///
/// assert_eq!(outputs.contents(100).map(|es| es.len()), Some(175));
/// # Ok(())
/// # }
/// ```
pub struct StreamAssembler<F: SinkFactory> {
    factory: F,
    pids: HashMap<u16, PidState<F::Sink>>,
    continuity: ContinuityMode,
}

impl<F: SinkFactory> StreamAssembler<F> {
    /// Creates an assembler with continuity checking disabled.
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            pids: HashMap::new(),
            continuity: ContinuityMode::Disabled,
        }
    }

    /// Sets how continuity counters are checked.
    pub fn with_continuity(mut self, mode: ContinuityMode) -> Self {
        self.continuity = mode;
        self
    }

    /// Current continuity mode.
    pub fn continuity_mode(&self) -> ContinuityMode {
        self.continuity
    }

    /// Feeds one transport packet.
    ///
    /// Packets without payload are ignored. The payload is copied, so the
    /// caller may reuse the packet buffer afterwards.
    ///
    /// Errors are local to the PID: `SinkIo` when flushing the previous unit
    /// failed (the new unit has still been started), `ContinuityError` in
    /// strict mode (the packet was dropped).
    pub fn add_packet(&mut self, packet: &TSPacket<'_>) -> Result<()> {
        if packet.payload.is_empty() {
            return Ok(());
        }

        let pid = packet.pid();
        let mode = self.continuity;
        let state = self.pids.entry(pid).or_default();

        if mode != ContinuityMode::Disabled && pid != PID_NULL {
            let status =
                state.check_continuity(packet.continuity_counter(), packet.discontinuity());
            match status {
                Continuity::Initial | Continuity::Ok => {}
                Continuity::Duplicate => {
                    // A repeated packet carries the same payload as the one before it
                    debug!(
                        "Dropping duplicate packet on PID {} (CC {})",
                        pid,
                        packet.continuity_counter()
                    );
                    return Ok(());
                }
                Continuity::Gap { expected, actual } => {
                    state.stats.continuity_errors += 1;
                    if mode == ContinuityMode::Strict {
                        return Err(DemuxError::ContinuityError {
                            pid,
                            expected,
                            actual,
                        });
                    }
                    warn!(
                        "Continuity gap on PID {}: expected {}, got {}",
                        pid, expected, actual
                    );
                }
            }
        }

        state.stats.packets += 1;
        state.stats.payload_bytes += packet.payload.len() as u64;

        if packet.payload_unit_start() {
            let previous = state.buffer.replace(BytesMut::from(packet.payload));
            match previous {
                Some(unit) if !unit.is_empty() => {
                    Self::flush_unit(&mut self.factory, pid, state, &unit)
                }
                _ => Ok(()),
            }
        } else {
            state
                .buffer
                .get_or_insert_with(BytesMut::new)
                .extend_from_slice(packet.payload);
            Ok(())
        }
    }

    /// Flushes the open unit of `pid`, if any, and forgets it.
    pub fn flush(&mut self, pid: u16) -> Result<()> {
        let Some(state) = self.pids.get_mut(&pid) else {
            return Ok(());
        };
        match state.buffer.take() {
            Some(unit) if !unit.is_empty() => {
                Self::flush_unit(&mut self.factory, pid, state, &unit)
            }
            _ => Ok(()),
        }
    }

    /// Flushes every open unit, then flushes and releases every sink.
    ///
    /// All PIDs are attempted even if some fail; the first failure is
    /// returned and the others are logged. Calling `close` again is a no-op.
    pub fn close(&mut self) -> Result<()> {
        let mut pids: Vec<u16> = self.pids.keys().copied().collect();
        pids.sort_unstable();

        let mut first_error = None;
        for pid in pids {
            let mut result = self.flush(pid);

            if let Some(state) = self.pids.get_mut(&pid) {
                if let Some(mut sink) = state.sink.take() {
                    let flushed = sink
                        .flush()
                        .map_err(|source| DemuxError::SinkIo { pid, source });
                    if flushed.is_ok() {
                        info!("Closed output for PID {}", pid);
                    }
                    result = result.and(flushed);
                }
            }

            if let Err(e) = result {
                if first_error.is_none() {
                    first_error = Some(e);
                } else {
                    warn!("Failed to close PID {}: {}", pid, e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Statistics for one PID.
    pub fn pid_stats(&self, pid: u16) -> Option<PidStats> {
        self.pids.get(&pid).map(|state| state.stats)
    }

    /// Statistics for every PID seen, sorted by PID.
    pub fn stats(&self) -> Vec<(u16, PidStats)> {
        let mut stats: Vec<(u16, PidStats)> = self
            .pids
            .iter()
            .map(|(pid, state)| (*pid, state.stats))
            .collect();
        stats.sort_unstable_by_key(|(pid, _)| *pid);
        stats
    }

    /// Bytes buffered for the open unit of `pid`.
    pub fn pending_len(&self, pid: u16) -> usize {
        self.pids
            .get(&pid)
            .and_then(|state| state.buffer.as_ref())
            .map_or(0, |buffer| buffer.len())
    }

    fn flush_unit(
        factory: &mut F,
        pid: u16,
        state: &mut PidState<F::Sink>,
        unit: &[u8],
    ) -> Result<()> {
        state.stats.units += 1;

        let sink = match &mut state.sink {
            Some(sink) => sink,
            slot => slot.insert(
                factory
                    .create_sink(pid)
                    .map_err(|source| DemuxError::SinkIo { pid, source })?,
            ),
        };

        let es = extract_es(unit);
        match es {
            EsPayload::Stripped(_) => {}
            EsPayload::Raw(_) => debug!("PID {}: unit has no PES start code, writing raw", pid),
            EsPayload::Empty => {
                debug!("PID {}: dropping {} byte unit with no ES data", pid, unit.len());
                return Ok(());
            }
        }

        let bytes = es.as_bytes();
        sink.write_all(bytes)
            .map_err(|source| DemuxError::SinkIo { pid, source })?;
        state.stats.es_bytes += bytes.len() as u64;
        Ok(())
    }
}

impl<F: SinkFactory> Drop for StreamAssembler<F> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Error closing stream assembler: {}", e);
        }
    }
}

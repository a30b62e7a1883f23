use std::fmt;
use std::time::Duration;

/// Size of every transport packet
pub const TS_PACKET_SIZE: usize = 188;
/// Size of the fixed packet header
pub const TS_HEADER_SIZE: usize = 4;
/// First byte of every packet
pub const TS_SYNC_BYTE: u8 = 0x47;

/// Program Association Table PID
pub const PID_PAT: u16 = 0x0000;
/// Null (stuffing) packet PID
pub const PID_NULL: u16 = 0x1FFF;

/// Minimum adaptation field length that can hold the flags byte and a PCR.
pub const PCR_MIN_ADAPTATION_LENGTH: u8 = 7;

/// PTS, DTS and PCR base clock rate
pub const PTS_HZ: u64 = 90_000;

/// The 2-bit adaptation_field_control field of the TS header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdaptationFieldControl {
    /// `00`: reserved, the packet carries neither adaptation field nor payload
    Reserved,
    /// `01`: payload only
    PayloadOnly,
    /// `10`: adaptation field only
    AdaptationOnly,
    /// `11`: adaptation field followed by payload
    AdaptationAndPayload,
}

impl AdaptationFieldControl {
    /// Decodes the two low bits of `value`.
    pub fn from_bits(value: u8) -> Self {
        match value & 0x03 {
            0b01 => AdaptationFieldControl::PayloadOnly,
            0b10 => AdaptationFieldControl::AdaptationOnly,
            0b11 => AdaptationFieldControl::AdaptationAndPayload,
            _ => AdaptationFieldControl::Reserved,
        }
    }

    /// Returns the raw 2-bit value.
    pub fn bits(self) -> u8 {
        match self {
            AdaptationFieldControl::Reserved => 0b00,
            AdaptationFieldControl::PayloadOnly => 0b01,
            AdaptationFieldControl::AdaptationOnly => 0b10,
            AdaptationFieldControl::AdaptationAndPayload => 0b11,
        }
    }

    /// True for `10` and `11`.
    pub fn has_adaptation_field(self) -> bool {
        matches!(
            self,
            AdaptationFieldControl::AdaptationOnly | AdaptationFieldControl::AdaptationAndPayload
        )
    }

    /// True for `01` and `11`.
    pub fn has_payload(self) -> bool {
        matches!(
            self,
            AdaptationFieldControl::PayloadOnly | AdaptationFieldControl::AdaptationAndPayload
        )
    }
}

/// The fixed 4-byte transport packet header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TSHeader {
    /// Always 0x47
    pub sync_byte: u8,
    /// transport_error_indicator
    pub transport_error: bool,
    /// payload_unit_start_indicator (PUSI)
    pub payload_unit_start: bool,
    /// transport_priority
    pub transport_priority: bool,
    /// 13-bit packet identifier
    pub pid: u16,
    /// 2-bit transport_scrambling_control, stored but not acted on
    pub scrambling_control: u8,
    /// What follows the header
    pub adaptation_field_control: AdaptationFieldControl,
    /// 4-bit continuity_counter
    pub continuity_counter: u8,
}

/// The subset of the adaptation field this demuxer decodes.
///
/// Only the 33-bit PCR base is kept; the 9-bit extension is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdaptationField {
    /// adaptation_field_length, not counting the length byte itself
    pub length: u8,
    /// discontinuity_indicator
    pub discontinuity: bool,
    /// random_access_indicator
    pub random_access: bool,
    /// elementary_stream_priority_indicator
    pub es_priority: bool,
    /// PCR base in 90 kHz units
    pub pcr: Option<u64>,
}

/// A parsed transport packet borrowing its payload from the input buffer.
#[derive(Debug, Clone, Copy)]
pub struct TSPacket<'a> {
    /// Fixed 4-byte header
    pub header: TSHeader,
    /// Present when the AFC says so
    pub adaptation_field: Option<AdaptationField>,
    /// Bytes after the header and adaptation field; empty when the packet
    /// carries no payload.
    pub payload: &'a [u8],
}

impl<'a> TSPacket<'a> {
    /// Packet identifier.
    pub fn pid(&self) -> u16 {
        self.header.pid
    }

    /// Whether the payload starts a new PES unit or section.
    pub fn payload_unit_start(&self) -> bool {
        self.header.payload_unit_start
    }

    /// 4-bit continuity counter.
    pub fn continuity_counter(&self) -> u8 {
        self.header.continuity_counter
    }

    /// PCR base carried in the adaptation field, if any.
    pub fn pcr(&self) -> Option<u64> {
        self.adaptation_field.and_then(|af| af.pcr)
    }

    /// Whether the adaptation field signals a discontinuity.
    pub fn discontinuity(&self) -> bool {
        self.adaptation_field.is_some_and(|af| af.discontinuity)
    }

    /// Whether this is a null (stuffing) packet.
    pub fn is_null(&self) -> bool {
        self.header.pid == PID_NULL
    }
}

impl fmt::Display for TSPacket<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let afc = self.header.adaptation_field_control;
        write!(
            f,
            "[TS] PID: {:4} | PUSI: {:<5} | CC: {:2} | AFC: {}",
            self.header.pid,
            self.header.payload_unit_start,
            self.header.continuity_counter,
            afc.bits()
        )?;
        match afc {
            AdaptationFieldControl::AdaptationOnly => write!(f, " (adapt)")?,
            AdaptationFieldControl::AdaptationAndPayload => write!(f, " (mix)")?,
            _ => {}
        }

        if let Some(af) = &self.adaptation_field {
            write!(f, "\n    adaptation: len={}, rai={}", af.length, af.random_access)?;
            if let Some(pcr) = af.pcr {
                write!(f, ", pcr={}", pcr)?;
            }
        }

        if !self.payload.is_empty() {
            let preview = &self.payload[..self.payload.len().min(8)];
            write!(f, "\n    payload: {:3} bytes [", self.payload.len())?;
            for (i, byte) in preview.iter().enumerate() {
                if i > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{:02X}", byte)?;
            }
            write!(f, " ...]")?;
        }
        Ok(())
    }
}

/// Converts 90 kHz PTS/DTS ticks to a duration.
pub fn pts_to_duration(pts: u64) -> Duration {
    Duration::from_nanos(((pts as u128 * 1_000_000_000) / PTS_HZ as u128) as u64)
}

/// The PCR base ticks at 90 kHz, same as PTS/DTS.
pub fn pcr_base_to_duration(pcr_base: u64) -> Duration {
    pts_to_duration(pcr_base)
}

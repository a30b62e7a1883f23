use super::types::*;
use crate::error::{DemuxError, Result};

/// Parses one 188-byte transport packet.
///
/// The returned packet borrows its payload from `data`; callers that need
/// the bytes after `data` is reused must copy them. Packets whose
/// adaptation field claims more room than the packet has yield an empty
/// payload rather than an error.
pub fn parse_packet(data: &[u8]) -> Result<TSPacket<'_>> {
    let data: &[u8; TS_PACKET_SIZE] = data
        .try_into()
        .map_err(|_| DemuxError::InvalidLength(data.len()))?;

    let header = parse_header(data)?;
    let afc = header.adaptation_field_control;

    let mut payload_offset = TS_HEADER_SIZE;
    let mut adaptation_field = None;
    if afc.has_adaptation_field() {
        let field = parse_adaptation_field(data);
        payload_offset += 1 + field.length as usize;
        adaptation_field = Some(field);
    }

    let payload = if afc.has_payload() && payload_offset < TS_PACKET_SIZE {
        &data[payload_offset..]
    } else {
        &[]
    };

    Ok(TSPacket {
        header,
        adaptation_field,
        payload,
    })
}

/// Parses the fixed 4-byte header.
pub fn parse_header(data: &[u8]) -> Result<TSHeader> {
    if data.len() < TS_HEADER_SIZE {
        return Err(DemuxError::InvalidLength(data.len()));
    }

    if data[0] != TS_SYNC_BYTE {
        return Err(DemuxError::InvalidSyncByte(data[0]));
    }

    Ok(TSHeader {
        sync_byte: data[0],
        transport_error: (data[1] & 0x80) != 0,
        payload_unit_start: (data[1] & 0x40) != 0,
        transport_priority: (data[1] & 0x20) != 0,
        pid: (((data[1] & 0x1F) as u16) << 8) | data[2] as u16,
        scrambling_control: (data[3] >> 6) & 0x03,
        adaptation_field_control: AdaptationFieldControl::from_bits(data[3] >> 4),
        continuity_counter: data[3] & 0x0F,
    })
}

/// Decodes the adaptation field that starts at byte 4 of a full packet.
///
/// A zero length field has no flags byte. The PCR is only decoded when the
/// field is long enough to hold it (length >= 7).
pub fn parse_adaptation_field(packet: &[u8; TS_PACKET_SIZE]) -> AdaptationField {
    let length = packet[4];
    let mut field = AdaptationField {
        length,
        ..Default::default()
    };

    if length == 0 {
        return field;
    }

    let flags = packet[5];
    field.discontinuity = (flags & 0x80) != 0;
    field.random_access = (flags & 0x40) != 0;
    field.es_priority = (flags & 0x20) != 0;

    let pcr_flag = (flags & 0x10) != 0;
    if pcr_flag && length >= PCR_MIN_ADAPTATION_LENGTH {
        field.pcr = Some(decode_pcr_base(&packet[6..11]));
    }

    field
}

/// PCR base from the first 5 of the 6 PCR bytes. The reserved bits and the
/// 9-bit extension that follow bit 7 of the fifth byte are dropped.
fn decode_pcr_base(p: &[u8]) -> u64 {
    ((p[0] as u64) << 25)
        | ((p[1] as u64) << 17)
        | ((p[2] as u64) << 9)
        | ((p[3] as u64) << 1)
        | ((p[4] as u64) >> 7)
}

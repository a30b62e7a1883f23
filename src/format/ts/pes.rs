use crate::error::{DemuxError, Result};

/// PES start code prefix
pub const PES_START_CODE: [u8; 3] = [0x00, 0x00, 0x01];

/// Start code, stream id and PES_packet_length
pub const PES_BASIC_HEADER_SIZE: usize = 6;

/// Basic header plus the two flag bytes and PES_header_data_length
pub const PES_OPTIONAL_HEADER_OFFSET: usize = 9;

/// Size of one packed PTS or DTS field
pub const PES_TIMESTAMP_SIZE: usize = 5;

/// First audio stream id
pub const STREAM_ID_AUDIO_MIN: u8 = 0xC0;
/// Last audio stream id
pub const STREAM_ID_AUDIO_MAX: u8 = 0xDF;
/// First video stream id
pub const STREAM_ID_VIDEO_MIN: u8 = 0xE0;
/// Last video stream id
pub const STREAM_ID_VIDEO_MAX: u8 = 0xEF;

const PTS_DTS_FLAGS_PTS_ONLY: u8 = 0b10;
const PTS_DTS_FLAGS_PTS_DTS: u8 = 0b11;

/// Audio streams carry the optional PES header.
pub fn is_audio_stream_id(stream_id: u8) -> bool {
    (STREAM_ID_AUDIO_MIN..=STREAM_ID_AUDIO_MAX).contains(&stream_id)
}

/// Video streams carry the optional PES header.
pub fn is_video_stream_id(stream_id: u8) -> bool {
    (STREAM_ID_VIDEO_MIN..=STREAM_ID_VIDEO_MAX).contains(&stream_id)
}

/// Packetized Elementary Stream (PES) header fields this demuxer decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PESHeader {
    /// Stream identifier indicating content type (video/audio/etc.)
    pub stream_id: u8,
    /// PES_packet_length as signalled; 0 means unbounded (common for video)
    pub packet_length: u16,
    /// Top two bits of the second flag byte; 0 when there is no optional header
    pub pts_dts_flags: u8,
    /// PES_header_data_length; 0 when there is no optional header
    pub header_data_length: u8,
    /// Presentation Time Stamp (33 bits, 90 kHz)
    pub pts: Option<u64>,
    /// Decoding Time Stamp (33 bits, 90 kHz)
    pub dts: Option<u64>,
}

impl PESHeader {
    /// Whether a PTS was decoded.
    pub fn has_pts(&self) -> bool {
        self.pts.is_some()
    }

    /// Whether a DTS was decoded.
    pub fn has_dts(&self) -> bool {
        self.dts.is_some()
    }
}

/// A parsed PES packet borrowing its payload from the input buffer.
#[derive(Debug, Clone, Copy)]
pub struct PESPacket<'a> {
    /// Decoded header fields
    pub header: PESHeader,
    /// Elementary stream bytes following the PES header
    pub payload: &'a [u8],
}

/// Parses a buffer that begins with a PES start code.
///
/// Audio (`0xC0..=0xDF`) and video (`0xE0..=0xEF`) streams carry the
/// optional header; their timestamps are decoded and the payload starts
/// after `PES_header_data_length`. Every other stream id (padding, private
/// streams, ...) is treated as header-less and its payload starts at byte 6.
pub fn parse_pes(data: &[u8]) -> Result<PESPacket<'_>> {
    if data.len() < PES_BASIC_HEADER_SIZE {
        return Err(DemuxError::TooShort {
            expected: PES_BASIC_HEADER_SIZE,
            actual: data.len(),
        });
    }

    if data[..3] != PES_START_CODE {
        return Err(DemuxError::InvalidStartCode);
    }

    let mut header = PESHeader {
        stream_id: data[3],
        packet_length: u16::from_be_bytes([data[4], data[5]]),
        ..Default::default()
    };

    if !is_audio_stream_id(header.stream_id) && !is_video_stream_id(header.stream_id) {
        return Ok(PESPacket {
            header,
            payload: &data[PES_BASIC_HEADER_SIZE..],
        });
    }

    if data.len() < PES_OPTIONAL_HEADER_OFFSET {
        return Err(DemuxError::TooShort {
            expected: PES_OPTIONAL_HEADER_OFFSET,
            actual: data.len(),
        });
    }

    header.pts_dts_flags = (data[7] >> 6) & 0x03;
    header.header_data_length = data[8];

    let payload_start = PES_OPTIONAL_HEADER_OFFSET + header.header_data_length as usize;
    if data.len() < payload_start {
        return Err(DemuxError::TooShort {
            expected: payload_start,
            actual: data.len(),
        });
    }

    let pos = PES_OPTIONAL_HEADER_OFFSET;
    let header_data_length = header.header_data_length as usize;
    match header.pts_dts_flags {
        PTS_DTS_FLAGS_PTS_ONLY if header_data_length >= PES_TIMESTAMP_SIZE => {
            header.pts = Some(parse_timestamp(&data[pos..pos + PES_TIMESTAMP_SIZE]));
        }
        PTS_DTS_FLAGS_PTS_DTS if header_data_length >= 2 * PES_TIMESTAMP_SIZE => {
            header.pts = Some(parse_timestamp(&data[pos..pos + PES_TIMESTAMP_SIZE]));
            let pos = pos + PES_TIMESTAMP_SIZE;
            header.dts = Some(parse_timestamp(&data[pos..pos + PES_TIMESTAMP_SIZE]));
        }
        // 00 is "no timestamps", 01 is forbidden
        _ => {}
    }

    Ok(PESPacket {
        header,
        payload: &data[payload_start..],
    })
}

/// Decodes a packed 5-byte PTS/DTS field into its 33-bit value.
///
/// Layout: `[prefix(4) | ts32..30 | 1] [ts29..22] [ts21..15 | 1] [ts14..7] [ts6..0 | 1]`.
/// The prefix and marker bits are masked out but not checked, so a field
/// with bad markers still decodes. Returns 0 for inputs shorter than 5 bytes.
pub fn parse_timestamp(data: &[u8]) -> u64 {
    if data.len() < PES_TIMESTAMP_SIZE {
        return 0;
    }

    ((data[0] as u64 & 0x0E) << 29)
        | ((data[1] as u64) << 22)
        | ((data[2] as u64 & 0xFE) << 14)
        | ((data[3] as u64) << 7)
        | ((data[4] as u64) >> 1)
}

/// What an accumulated PES unit yields for the output sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EsPayload<'a> {
    /// PES header stripped; these are the elementary stream bytes
    Stripped(&'a [u8]),
    /// No start code; the unit is passed through untouched
    Raw(&'a [u8]),
    /// Nothing to emit: the unit is shorter than a minimal PES header, or
    /// the header consumes all of it
    Empty,
}

impl<'a> EsPayload<'a> {
    /// Bytes to write; empty for `Empty`.
    pub fn as_bytes(&self) -> &'a [u8] {
        match *self {
            EsPayload::Stripped(bytes) | EsPayload::Raw(bytes) => bytes,
            EsPayload::Empty => &[],
        }
    }
}

/// Strips PES framing from a reassembled unit.
///
/// Uses the same offsets as [`parse_pes`] for audio/video streams, but only
/// needs PES_header_data_length: units under 9 bytes are dropped, units
/// without a start code pass through as raw data, and the payload starts at
/// `9 + PES_header_data_length`.
pub fn extract_es(data: &[u8]) -> EsPayload<'_> {
    if data.len() < PES_OPTIONAL_HEADER_OFFSET {
        return EsPayload::Empty;
    }

    if data[..3] != PES_START_CODE {
        return EsPayload::Raw(data);
    }

    let header_size = PES_OPTIONAL_HEADER_OFFSET + data[8] as usize;
    if data.len() <= header_size {
        return EsPayload::Empty;
    }

    EsPayload::Stripped(&data[header_size..])
}

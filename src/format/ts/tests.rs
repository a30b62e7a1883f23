//! Packet builders shared by the TS unit tests, plus end-to-end checks of
//! parser, assembler and PES handling working together.

use super::sink::{MemorySink, MemorySinkFactory, SinkFactory};
use super::types::*;
use std::io;

/// Builds one 188-byte packet.
///
/// A full 184-byte payload without PCR is sent payload-only (AFC 01);
/// anything shorter is padded with adaptation field stuffing, which is
/// also where the PCR goes.
pub(crate) fn ts_packet(
    pid: u16,
    pusi: bool,
    cc: u8,
    pcr: Option<u64>,
    payload: &[u8],
) -> [u8; TS_PACKET_SIZE] {
    let room = TS_PACKET_SIZE - TS_HEADER_SIZE;
    assert!(payload.len() <= room, "payload too large");

    let mut data = [0xFFu8; TS_PACKET_SIZE];
    data[0] = TS_SYNC_BYTE;
    data[1] = ((pid >> 8) as u8 & 0x1F) | if pusi { 0x40 } else { 0 };
    data[2] = pid as u8;

    if payload.len() == room && pcr.is_none() {
        data[3] = 0x10 | (cc & 0x0F);
        data[TS_HEADER_SIZE..].copy_from_slice(payload);
        return data;
    }

    let afc = if payload.is_empty() { 0x20 } else { 0x30 };
    data[3] = afc | (cc & 0x0F);

    let af_total = room - payload.len();
    let length = af_total - 1;
    data[4] = length as u8;
    if length >= 1 {
        data[5] = 0x00;
        if let Some(base) = pcr {
            assert!(length >= PCR_MIN_ADAPTATION_LENGTH as usize, "no room for PCR");
            data[5] |= 0x10;
            data[6] = (base >> 25) as u8;
            data[7] = (base >> 17) as u8;
            data[8] = (base >> 9) as u8;
            data[9] = (base >> 1) as u8;
            data[10] = (((base & 1) as u8) << 7) | 0x7E;
            data[11] = 0x00;
        }
    }

    data[TS_HEADER_SIZE + af_total..].copy_from_slice(payload);
    data
}

/// Packs a 33-bit timestamp with the given 4-bit prefix and marker bits.
pub(crate) fn encode_timestamp(prefix: u8, ts: u64) -> [u8; 5] {
    [
        (prefix << 4) | ((ts >> 29) as u8 & 0x0E) | 0x01,
        (ts >> 22) as u8,
        ((ts >> 14) as u8 & 0xFE) | 0x01,
        (ts >> 7) as u8,
        ((ts << 1) as u8 & 0xFE) | 0x01,
    ]
}

/// Builds a PES unit with an optional header carrying the given timestamps.
pub(crate) fn pes_unit(stream_id: u8, pts: Option<u64>, dts: Option<u64>, es: &[u8]) -> Vec<u8> {
    let mut header_data = Vec::new();
    let flags = match (pts, dts) {
        (Some(pts), Some(dts)) => {
            header_data.extend_from_slice(&encode_timestamp(0b0011, pts));
            header_data.extend_from_slice(&encode_timestamp(0b0001, dts));
            0xC0
        }
        (Some(pts), None) => {
            header_data.extend_from_slice(&encode_timestamp(0b0010, pts));
            0x80
        }
        _ => 0x00,
    };

    let packet_length = 3 + header_data.len() + es.len();
    let packet_length = if packet_length > u16::MAX as usize {
        0
    } else {
        packet_length as u16
    };

    let mut unit = vec![0x00, 0x00, 0x01, stream_id];
    unit.extend_from_slice(&packet_length.to_be_bytes());
    unit.push(0x80);
    unit.push(flags);
    unit.push(header_data.len() as u8);
    unit.extend_from_slice(&header_data);
    unit.extend_from_slice(es);
    unit
}

/// Splits one unit into consecutive packets, the first one flagged PUSI.
pub(crate) fn packetize(pid: u16, cc_start: u8, unit: &[u8]) -> Vec<[u8; TS_PACKET_SIZE]> {
    unit.chunks(TS_PACKET_SIZE - TS_HEADER_SIZE)
        .enumerate()
        .map(|(i, chunk)| {
            let cc = cc_start.wrapping_add(i as u8) & 0x0F;
            ts_packet(pid, i == 0, cc, None, chunk)
        })
        .collect()
}

/// Sink factory that refuses to open sinks for some PIDs.
pub(crate) struct FailingSinkFactory {
    failing: Vec<u16>,
    inner: MemorySinkFactory,
}

impl FailingSinkFactory {
    pub(crate) fn new(failing: &[u16]) -> Self {
        Self {
            failing: failing.to_vec(),
            inner: MemorySinkFactory::new(),
        }
    }

    pub(crate) fn outputs(&self) -> MemorySinkFactory {
        self.inner.clone()
    }
}

impl SinkFactory for FailingSinkFactory {
    type Sink = MemorySink;

    fn create_sink(&mut self, pid: u16) -> io::Result<Self::Sink> {
        if self.failing.contains(&pid) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("sink for PID {} refused", pid),
            ));
        }
        self.inner.create_sink(pid)
    }
}

mod end_to_end {
    use super::super::assembler::StreamAssembler;
    use super::super::parser::parse_packet;
    use super::super::pes::parse_pes;
    use super::*;
    use pretty_assertions::assert_eq;

    fn demux_all(packets: &[[u8; TS_PACKET_SIZE]]) -> MemorySinkFactory {
        let outputs = MemorySinkFactory::new();
        let mut assembler = StreamAssembler::new(outputs.clone());
        for data in packets {
            let packet = parse_packet(data).unwrap();
            assembler.add_packet(&packet).unwrap();
        }
        assembler.close().unwrap();
        outputs
    }

    #[test]
    fn test_payload_only_round_trip() {
        let es: Vec<u8> = (0..1000u32).map(|i| (i * 7 % 251) as u8).collect();
        let header_len = pes_unit(0xE0, Some(90_000), Some(87_000), &[]).len();

        // Pad the unit to a whole number of packets so every one is AFC 01
        let mut padded_es = es;
        let pad = (184 - (header_len + padded_es.len()) % 184) % 184;
        padded_es.extend(std::iter::repeat(0x5A).take(pad));
        let unit = pes_unit(0xE0, Some(90_000), Some(87_000), &padded_es);
        assert_eq!(unit.len() % 184, 0);

        let packets = packetize(256, 0, &unit);
        for data in &packets {
            assert_eq!(data[3] & 0x30, 0x10);
        }

        let outputs = demux_all(&packets);
        assert_eq!(outputs.contents(256), Some(padded_es));
    }

    #[test]
    fn test_multi_unit_stream_with_stuffing() {
        let first: Vec<u8> = (0..300u32).map(|i| i as u8).collect();
        let second: Vec<u8> = (0..50u32).map(|i| (255 - i) as u8).collect();

        let mut packets = packetize(101, 0, &pes_unit(0xE0, Some(0), None, &first));
        let cc = packets.len() as u8;
        packets.extend(packetize(101, cc, &pes_unit(0xE0, Some(3003), None, &second)));

        let outputs = demux_all(&packets);
        let mut expected = first;
        expected.extend_from_slice(&second);
        assert_eq!(outputs.contents(101), Some(expected));
    }

    #[test]
    fn test_timestamps_survive_packetization() {
        let unit = pes_unit(0xC0, Some(183_003), Some(180_000), &[0xFF, 0xF1]);
        let packets = packetize(257, 0, &unit);
        assert_eq!(packets.len(), 1);

        let packet = parse_packet(&packets[0]).unwrap();
        let pes = parse_pes(packet.payload).unwrap();
        assert_eq!(pes.header.pts, Some(183_003));
        assert_eq!(pes.header.dts, Some(180_000));
        assert_eq!(pes.payload, &[0xFF, 0xF1]);
    }

    #[test]
    fn test_pcr_builder_round_trip() {
        for base in [0u64, 1, 27_000_000, (1 << 33) - 1] {
            let data = ts_packet(100, false, 0, Some(base), &[]);
            let packet = parse_packet(&data).unwrap();
            assert_eq!(packet.pcr(), Some(base));
            assert!(packet.payload.is_empty());
        }
    }
}

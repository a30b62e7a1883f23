use pretty_assertions::assert_eq;
use std::io::Cursor;
use tempfile::tempdir;
use tsdemux::format::ts::{
    parse_pes, ContinuityMode, FileSinkFactory, MemorySinkFactory, StreamAssembler, TSDemuxer,
    TS_PACKET_SIZE,
};

/// Packs a PES unit carrying a PTS into as many packets as it needs,
/// stuffing the last one through its adaptation field.
fn packetize(pid: u16, cc_start: u8, pts: u64, es: &[u8]) -> Vec<u8> {
    let mut unit = vec![0x00, 0x00, 0x01, 0xE0, 0x00, 0x00, 0x80, 0x80, 0x05];
    unit.extend_from_slice(&[
        0x21 | ((pts >> 29) as u8 & 0x0E),
        (pts >> 22) as u8,
        ((pts >> 14) as u8 & 0xFE) | 0x01,
        (pts >> 7) as u8,
        ((pts << 1) as u8 & 0xFE) | 0x01,
    ]);
    unit.extend_from_slice(es);

    let mut out = Vec::new();
    for (i, chunk) in unit.chunks(184).enumerate() {
        let mut packet = [0xFFu8; TS_PACKET_SIZE];
        packet[0] = 0x47;
        packet[1] = ((pid >> 8) as u8 & 0x1F) | if i == 0 { 0x40 } else { 0 };
        packet[2] = pid as u8;
        let cc = cc_start.wrapping_add(i as u8) & 0x0F;
        if chunk.len() == 184 {
            packet[3] = 0x10 | cc;
            packet[4..].copy_from_slice(chunk);
        } else {
            packet[3] = 0x30 | cc;
            let af_total = 184 - chunk.len();
            packet[4] = (af_total - 1) as u8;
            if af_total > 1 {
                packet[5] = 0x00;
            }
            packet[4 + af_total..].copy_from_slice(chunk);
        }
        out.extend_from_slice(&packet);
    }
    out
}

fn sample_es(len: usize, seed: u8) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)).collect()
}

#[tokio::test]
async fn test_demux_interleaved_streams_to_memory() {
    let video = sample_es(1000, 1);
    let audio = sample_es(250, 2);

    let video_packets = packetize(256, 0, 90_000, &video);
    let audio_packets = packetize(257, 0, 90_000, &audio);

    // Interleave packet by packet
    let mut input = Vec::new();
    let mut v = video_packets.chunks(TS_PACKET_SIZE);
    let mut a = audio_packets.chunks(TS_PACKET_SIZE);
    loop {
        let (next_v, next_a) = (v.next(), a.next());
        if next_v.is_none() && next_a.is_none() {
            break;
        }
        input.extend_from_slice(next_v.unwrap_or_default());
        input.extend_from_slice(next_a.unwrap_or_default());
    }

    let outputs = MemorySinkFactory::new();
    let mut demuxer = TSDemuxer::new(
        Cursor::new(input),
        StreamAssembler::new(outputs.clone()).with_continuity(ContinuityMode::Strict),
    );
    let summary = demuxer.run().await.unwrap();

    assert_eq!(summary.invalid_packets, 0);
    assert_eq!(summary.assembler_errors, 0);
    assert_eq!(outputs.pids(), vec![256, 257]);
    assert_eq!(outputs.contents(256), Some(video));
    assert_eq!(outputs.contents(257), Some(audio));
}

#[tokio::test]
async fn test_demux_to_files() {
    let dir = tempdir().unwrap();
    let first = sample_es(400, 3);
    let second = sample_es(20, 4);

    let mut input = packetize(100, 0, 0, &first);
    input.extend(packetize(100, 3, 3003, &second));
    // A dangling partial packet at the end
    input.extend_from_slice(&[0x47, 0x00, 0x64, 0x10, 0x00]);

    let sinks = FileSinkFactory::new(dir.path()).unwrap().with_extension("es");
    let path = sinks.path_for(100);
    let mut demuxer = TSDemuxer::new(Cursor::new(input), StreamAssembler::new(sinks));
    let summary = demuxer.run().await.unwrap();

    assert_eq!(summary.truncated_tail, Some(5));
    assert_eq!(summary.packets_read, 4);

    let stats = summary.pids[0].1;
    assert_eq!(summary.pids[0].0, 100);
    assert_eq!(stats.units, 2);
    assert_eq!(stats.es_bytes, 420);

    let mut expected = first;
    expected.extend_from_slice(&second);
    assert_eq!(std::fs::read(path).unwrap(), expected);
}

#[tokio::test]
async fn test_strict_continuity_drops_out_of_order_packet() {
    let es = sample_es(500, 5);
    let packets = packetize(300, 0, 0, &es);
    assert_eq!(packets.len(), 3 * TS_PACKET_SIZE);

    // Swap the second and third packets
    let mut input = packets[..TS_PACKET_SIZE].to_vec();
    input.extend_from_slice(&packets[2 * TS_PACKET_SIZE..]);
    input.extend_from_slice(&packets[TS_PACKET_SIZE..2 * TS_PACKET_SIZE]);

    let outputs = MemorySinkFactory::new();
    let mut demuxer = TSDemuxer::new(
        Cursor::new(input),
        StreamAssembler::new(outputs.clone()).with_continuity(ContinuityMode::Strict),
    );
    let summary = demuxer.run().await.unwrap();

    assert_eq!(summary.assembler_errors, 2);
    assert_eq!(summary.pids[0].1.continuity_errors, 2);
    // Only the first packet's share of the unit made it out
    assert_eq!(outputs.contents(300), Some(es[..184 - 14].to_vec()));
}

#[test]
fn test_pes_timestamp_from_builder() {
    let packets = packetize(100, 0, 8_589_934_591, &[0xAA]);
    // 14 header bytes plus one ES byte sit at the end of the only packet
    assert_eq!(packets.len(), TS_PACKET_SIZE);
    let pes = parse_pes(&packets[TS_PACKET_SIZE - 15..]).unwrap();
    assert_eq!(pes.header.pts, Some(8_589_934_591));
    assert_eq!(pes.payload, &[0xAA]);
}

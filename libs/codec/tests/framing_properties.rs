//! Packet Framing Property Tests
//!
//! Framing output must depend only on the byte stream, never on where the
//! transport happened to split it.

use bytes::Bytes;
use codec::{decode, encode_frame, Message, Packet, PacketFramer};
use proptest::prelude::*;

prop_compose! {
    fn arb_packet()
        (packet_type in any::<u8>(), payload in prop::collection::vec(any::<u8>(), 0..512)) -> Packet {
        Packet { packet_type, payload: Bytes::from(payload) }
    }
}

prop_compose! {
    /// A packet sequence, its concatenated wire bytes, and cut points into them
    fn stream_with_cuts()
        (packets in prop::collection::vec(arb_packet(), 0..12))
        (cuts in prop::collection::vec(
            0..=packets.iter().map(Packet::wire_len).sum::<usize>(),
            0..16,
        ), packets in Just(packets)) -> (Vec<Packet>, Vec<u8>, Vec<usize>)
    {
        let mut stream = Vec::new();
        for packet in &packets {
            stream.extend_from_slice(&packet.to_bytes());
        }
        let mut cuts = cuts;
        cuts.sort_unstable();
        (packets, stream, cuts)
    }
}

fn feed_in_chunks(stream: &[u8], cuts: &[usize]) -> (Vec<Packet>, PacketFramer) {
    let mut framer = PacketFramer::new();
    let mut packets = Vec::new();
    let mut start = 0;
    for &cut in cuts.iter().chain(std::iter::once(&stream.len())) {
        framer.feed(&stream[start..cut], |p| packets.push(p));
        start = cut;
    }
    (packets, framer)
}

proptest! {
    /// Property: any chunking of a stream yields the same packets in order
    #[test]
    fn chunking_does_not_change_output((expected, stream, cuts) in stream_with_cuts()) {
        let (packets, framer) = feed_in_chunks(&stream, &cuts);
        prop_assert_eq!(packets, expected);
        prop_assert!(framer.is_idle());
    }

    /// Property: a stream truncated mid-packet yields exactly the complete prefix
    #[test]
    fn truncated_stream_yields_complete_prefix(
        (expected, stream, _cuts) in stream_with_cuts(),
        drop in 1usize..8,
    ) {
        prop_assume!(!stream.is_empty());
        let drop = drop.min(stream.len());
        let truncated = &stream[..stream.len() - drop];

        let mut framer = PacketFramer::new();
        let packets = framer.feed_collect(truncated);

        let mut consumed = 0;
        let complete: Vec<Packet> = expected
            .into_iter()
            .take_while(|p| {
                consumed += p.wire_len();
                consumed <= truncated.len()
            })
            .collect();
        prop_assert_eq!(&packets, &complete);
    }

    /// Property: run-mode commands survive frame, split and decode
    #[test]
    fn encoded_commands_decode_after_arbitrary_split(
        modes in prop::collection::vec(0i32..5, 1..8),
        split in any::<prop::sample::Index>(),
    ) {
        let messages: Vec<Message> = modes
            .iter()
            .map(|&m| Message::RunMode(codec::proto::RunMode { mode: m }))
            .collect();
        let mut stream = Vec::new();
        for message in &messages {
            stream.extend_from_slice(&encode_frame(message).unwrap());
        }
        let at = split.index(stream.len() + 1);

        let mut framer = PacketFramer::new();
        let mut packets = framer.feed_collect(&stream[..at]);
        packets.extend(framer.feed_collect(&stream[at..]));

        let decoded: Vec<Message> = packets.iter().map(|p| decode(p).unwrap()).collect();
        prop_assert_eq!(decoded, messages);
    }
}

#[test]
fn test_scenario_interleaved_types() {
    let mut stream = Vec::new();
    stream.extend_from_slice(&[0x02, 0x00, 0x00]);
    stream.extend_from_slice(&[0x06, 0x02, 0x00, 0xAB, 0xCD]);
    stream.extend_from_slice(&[0x09, 0x01, 0x00, 0xFF]);

    let (packets, framer) = feed_in_chunks(&stream, &[4, 7]);
    assert_eq!(packets.len(), 3);
    assert_eq!(packets[0].packet_type, 2);
    assert!(packets[0].payload.is_empty());
    assert_eq!(&packets[1].payload[..], &[0xAB, 0xCD]);
    assert_eq!(packets[2].packet_type, 9);
    assert!(framer.is_idle());
}

//! Malformed traffic
//!
//! Aborted transactions, corrupted parity and out-of-range master ids must
//! never stop the decoder. They show up as flags and incomplete packets.

use anyhow::Result;
use rffe::{
    ABORTED_PACKET, AnalyzerSettings, CommandType, Decoder, FrameFlags, FrameKind, Packet,
    PacketCollector, PacketStatus, RESYNC_START, SimulationConfig, SimulationGenerator,
    Transaction,
};

struct Decoded {
    packets: Vec<Packet>,
    discarded: u64,
}

fn decode(generator: &SimulationGenerator) -> Result<Decoded> {
    let capture = generator.to_capture()?;
    let mut decoder = Decoder::from_capture(&capture, &AnalyzerSettings::default())?;
    let mut sink = PacketCollector::new();
    let summary = decoder.run(&mut sink, || false);
    Ok(Decoded { packets: sink.into_packets(), discarded: summary.discarded })
}

fn follow_up() -> Transaction {
    Transaction::new(0x9, 0x01, vec![0x40, 0xDE, 0xAD]).expect("valid transaction")
}

#[test]
fn test_abort_at_every_bit_resynchronizes() -> Result<()> {
    let aborted = Transaction::new(0x5, 0x3A, vec![0x12, 0x34, 0x01, 0x02, 0x03])?;
    let total_bits = aborted.wire_bits().len();

    for bits in 0..total_bits {
        let mut generator = SimulationGenerator::new(SimulationConfig::default())?;
        generator.encode_aborted(&aborted, bits)?;
        generator.encode(&follow_up())?;
        generator.idle(40);

        let decoded = decode(&generator)?;
        let resumed = decoded.packets.last().expect("follow-up packet");
        assert!(resumed.is_complete(), "abort after {bits} bits");
        assert!(resumed.frames[0].has_flag(RESYNC_START), "abort after {bits} bits");
        assert_eq!(resumed.payload(), follow_up().bytes, "abort after {bits} bits");

        if bits == 0 {
            // the clock never rose, so nothing of the first packet was decoded
            assert_eq!(decoded.packets.len(), 1);
            assert_eq!(decoded.discarded, 1);
        } else {
            assert_eq!(decoded.packets.len(), 2, "abort after {bits} bits");
            let first = &decoded.packets[0];
            assert_eq!(first.status, PacketStatus::Incomplete);
            assert_eq!(first.frames[0].kind, FrameKind::StartCondition);
            let last = first.frames.last().expect("error frame");
            assert_eq!(last.kind, FrameKind::ErrorCase);
            assert!(last.has_flag(ABORTED_PACKET));
            assert_eq!(last.end, resumed.frames[0].start);
        }
    }
    Ok(())
}

#[test]
fn test_repeated_aborts_chain() -> Result<()> {
    let mut generator = SimulationGenerator::new(SimulationConfig::default())?;
    let write = Transaction::new(0x2, 0x50, vec![0x99])?;
    generator.encode_aborted(&write, 8)?;
    generator.encode_aborted(&write, 15)?;
    generator.encode(&follow_up())?;
    generator.idle(40);

    let decoded = decode(&generator)?;
    let statuses: Vec<_> = decoded.packets.iter().map(|packet| packet.status).collect();
    assert_eq!(
        statuses,
        vec![PacketStatus::Incomplete, PacketStatus::Incomplete, PacketStatus::Complete]
    );
    assert!(!decoded.packets[0].frames[0].has_flag(RESYNC_START));
    assert!(decoded.packets[1].frames[0].has_flag(RESYNC_START));
    assert!(decoded.packets[2].frames[0].has_flag(RESYNC_START));
    Ok(())
}

#[test]
fn test_corrupted_header_parity_is_flagged() -> Result<()> {
    let mut generator = SimulationGenerator::new(SimulationConfig::default())?;
    let transaction = Transaction::new(0x5, 0xAA, Vec::new())?;
    let mut bits = transaction.wire_bits();
    bits[12] = !bits[12];
    generator.emit_start_condition();
    generator.emit_bits(&bits);
    generator.idle(40);

    let decoded = decode(&generator)?;
    assert_eq!(decoded.packets.len(), 1);
    let packet = &decoded.packets[0];
    assert!(packet.is_complete());
    assert_eq!(packet.parity_errors(), 1);
    assert_eq!(packet.command_type(), Some(CommandType::Write0));
    assert_eq!(packet.inline_value(), Some(0x2A));
    Ok(())
}

#[test]
fn test_corrupted_data_parity_keeps_decoding() -> Result<()> {
    let mut generator = SimulationGenerator::new(SimulationConfig::default())?;
    let transaction = Transaction::new(0x5, 0x01, vec![0x10, 0x20, 0x30])?;
    let mut bits = transaction.wire_bits();
    // parity of the second data byte: header 13, address 9, first data 9
    bits[13 + 9 + 9 + 8] = !bits[13 + 9 + 9 + 8];
    generator.emit_start_condition();
    generator.emit_bits(&bits);
    generator.encode(&follow_up())?;
    generator.idle(40);

    let decoded = decode(&generator)?;
    assert_eq!(decoded.packets.len(), 2);
    assert_eq!(decoded.packets[0].parity_errors(), 1);
    assert_eq!(decoded.packets[0].payload(), vec![0x10, 0x20, 0x30]);
    assert_eq!(decoded.packets[1].parity_errors(), 0);
    Ok(())
}

#[test]
fn test_master_id_bound() -> Result<()> {
    let mut generator = SimulationGenerator::new(SimulationConfig::default())?;
    generator.encode(&Transaction::new(0x3, 0x1C, vec![0x01, 0x02, 0x03])?)?;
    generator.encode(&Transaction::new(0x4, 0x1C, vec![0x01, 0x02, 0x03])?)?;
    generator.idle(40);

    let decoded = decode(&generator)?;
    assert_eq!(decoded.packets.len(), 2);
    for packet in &decoded.packets {
        assert_eq!(packet.command_type(), Some(CommandType::MasterRead));
        assert!(packet.is_complete());
    }
    assert!(!decoded.packets[0].has_flag(FrameFlags::INVALID_MASTER_ID));
    assert!(decoded.packets[1].has_flag(FrameFlags::INVALID_MASTER_ID));
    Ok(())
}

#[test]
fn test_reserved_command_is_header_only() -> Result<()> {
    let mut generator = SimulationGenerator::new(SimulationConfig::default())?;
    generator.encode(&Transaction::new(0x7, 0x15, Vec::new())?)?;
    generator.encode(&follow_up())?;
    generator.idle(40);

    let decoded = decode(&generator)?;
    assert_eq!(decoded.packets.len(), 2);
    let reserved = &decoded.packets[0];
    assert_eq!(
        reserved.kinds(),
        vec![
            FrameKind::StartCondition,
            FrameKind::SlaveAddress,
            FrameKind::Command,
            FrameKind::Parity,
            FrameKind::BusPark,
        ]
    );
    assert!(reserved.has_flag(FrameFlags::INVALID_COMMAND));
    assert_eq!(decoded.packets[1].payload(), follow_up().bytes);
    Ok(())
}

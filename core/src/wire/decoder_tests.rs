use std::sync::Arc;

use super::assembler::{FrameAssembler, FrameSink, FRAME_DELIMITER};
use super::decoder::ProtocolDecoder;
use super::error::DecodeError;
use super::varint::encode_varint;
use crate::boss_names::BossNameStore;
use crate::game_data::StaticSkillCatalog;
use crate::storage::LogWriter;
use crate::tracker::{CombatAggregator, EntityRegistry};
use a2meter_types::MeterConfig;

fn fixture() -> (ProtocolDecoder, Arc<CombatAggregator>) {
    let registry = Arc::new(EntityRegistry::new(
        Arc::new(BossNameStore::in_memory()),
        &MeterConfig::default(),
    ));
    let writer = LogWriter::new(
        std::env::temp_dir().join(format!("a2meter-dec-{}", uuid::Uuid::new_v4())),
        "abcd1234".into(),
    );
    let aggregator = Arc::new(CombatAggregator::new(
        registry.clone(),
        Arc::new(StaticSkillCatalog),
        writer,
        &MeterConfig::default(),
    ));
    (ProtocolDecoder::new(registry, aggregator.clone()), aggregator)
}

/// Prepend the single-byte length varint (total size, trailer included) and
/// append the frame trailer.
fn finish_frame(core: Vec<u8>) -> Vec<u8> {
    let total = 1 + core.len() + FRAME_DELIMITER.len();
    assert!(total <= 0x7F, "test frame too long for a 1-byte length");
    let mut out = Vec::with_capacity(total);
    out.push(total as u8);
    out.extend(core);
    out.extend_from_slice(&FRAME_DELIMITER);
    out
}

fn damage_frame_with(
    target: u32,
    actor: u32,
    skill: u32,
    damage: u32,
    switch: u32,
    block: &[u8],
) -> Vec<u8> {
    let expected = match switch & 0x0F {
        4 => 8,
        5 => 12,
        6 => 10,
        7 => 14,
        _ => panic!("switch nibble without a block length"),
    };
    assert_eq!(block.len(), expected);

    let mut core = vec![0x04, 0x38];
    core.extend(encode_varint(target));
    core.extend(encode_varint(switch));
    core.extend(encode_varint(0x01)); // damage-kind flags, bit 0 = crit
    core.extend(encode_varint(actor));
    core.extend_from_slice(&skill.to_le_bytes());
    core.push(0); // fifth byte of the skill field
    core.extend(encode_varint(0)); // damage kind
    core.extend_from_slice(block);
    core.extend(encode_varint(0)); // unknown
    core.extend(encode_varint(damage));
    core.extend(encode_varint(1)); // loop count
    finish_frame(core)
}

fn damage_frame(target: u32, actor: u32, skill: u32, damage: u32) -> Vec<u8> {
    damage_frame_with(target, actor, skill, damage, 4, &[0u8; 8])
}

fn dot_frame(target: u32, actor: u32, raw_code: u32, damage: u32) -> Vec<u8> {
    let mut core = vec![0x05, 0x38];
    core.extend(encode_varint(target));
    core.push(0xAA); // pad byte
    core.extend(encode_varint(actor));
    core.extend(encode_varint(0)); // unknown
    core.extend_from_slice(&raw_code.to_le_bytes());
    core.extend(encode_varint(damage));
    finish_frame(core)
}

fn map_frame(map_id: u32) -> Vec<u8> {
    let mut core = vec![0x00, 0x61];
    core.extend_from_slice(&map_id.to_le_bytes());
    finish_frame(core)
}

fn nickname_frame(subject: u32, name: &str) -> Vec<u8> {
    let mut core = vec![0x04, 0x8D];
    core.extend_from_slice(&[0u8; 7]); // brings the subject id to offset 10
    core.extend(encode_varint(subject));
    core.push(name.len() as u8);
    core.extend_from_slice(name.as_bytes());
    finish_frame(core)
}

fn spawn_core(entity: u32, codes: (u32, u32)) -> Vec<u8> {
    let mut core = vec![0x40, 0x36];
    core.extend(encode_varint(entity));
    core.extend_from_slice(&[0u8; 28]);
    core.extend(encode_varint(codes.0));
    core.extend(encode_varint(codes.1));
    core
}

fn spawn_frame(entity: u32, npc_code: u32) -> Vec<u8> {
    finish_frame(spawn_core(entity, (npc_code, npc_code)))
}

fn summon_frame(entity: u32, npc_code: u32, owner: u16) -> Vec<u8> {
    let mut core = spawn_core(entity, (npc_code, npc_code));
    core.extend_from_slice(&[0xFF; 8]);
    core.extend_from_slice(&[0x07, 0x02, 0x06]);
    core.extend_from_slice(&owner.to_le_bytes());
    finish_frame(core)
}

#[test]
fn damage_frame_reaches_the_aggregator() {
    let (decoder, aggregator) = fixture();
    decoder.on_frame(&spawn_frame(9, 5000)).unwrap();
    decoder.on_frame(&damage_frame(9, 5, 110100, 1_000)).unwrap();

    let snap = aggregator.snapshot();
    assert_eq!(snap.target_id, 9);
    assert_eq!(snap.total_damage, 1_000);
    assert_eq!(snap.map[&5].job, "Gladiator");
    assert_eq!(snap.map[&5].per_skill[&110100].crit_times, 1);
}

#[test]
fn special_flags_survive_decoding() {
    let (decoder, aggregator) = fixture();
    decoder.on_frame(&spawn_frame(9, 5000)).unwrap();
    let mut block = [0u8; 10];
    block[0] = 0x01 | 0x08; // back + perfect
    decoder
        .on_frame(&damage_frame_with(9, 5, 110100, 700, 6, &block))
        .unwrap();

    let skill = &aggregator.snapshot().map[&5].per_skill[&110100];
    assert_eq!(skill.back_times, 1);
    assert_eq!(skill.perfect_times, 1);
    assert_eq!(skill.parry_times, 0);
}

#[test]
fn self_damage_is_discarded() {
    let (decoder, aggregator) = fixture();
    decoder.on_frame(&spawn_frame(9, 5000)).unwrap();
    decoder.on_frame(&damage_frame(9, 9, 110100, 1_000)).unwrap();
    assert!(aggregator.snapshot().is_empty());
}

#[test]
fn dot_frame_counts_as_dot_damage() {
    let (decoder, aggregator) = fixture();
    decoder.on_frame(&spawn_frame(9, 5000)).unwrap();
    // raw code on the wire is the skill code times 100
    decoder.on_frame(&dot_frame(9, 5, 11_010_000, 80)).unwrap();

    let snap = aggregator.snapshot();
    assert_eq!(snap.total_damage, 80);
    let skill = &snap.map[&5].per_skill[&110100];
    assert_eq!(skill.dot_times, 1);
    assert_eq!(skill.dot_damage_amount, 80);
    assert_eq!(skill.times, 0);
}

#[test]
fn dot_self_damage_is_discarded() {
    let (decoder, aggregator) = fixture();
    decoder.on_frame(&spawn_frame(9, 5000)).unwrap();
    decoder.on_frame(&dot_frame(9, 9, 11_010_000, 80)).unwrap();
    assert!(aggregator.snapshot().is_empty());
}

#[test]
fn map_frame_updates_current_map() {
    let (decoder, aggregator) = fixture();
    decoder.on_frame(&map_frame(310_100)).unwrap();
    assert_eq!(aggregator.registry().current_map(), 310_100);
    // Out-of-range candidates are consumed but never stored
    decoder.on_frame(&map_frame(50)).unwrap();
    assert_eq!(aggregator.registry().current_map(), 310_100);
}

#[test]
fn nickname_frame_names_the_player() {
    let (decoder, aggregator) = fixture();
    decoder.on_frame(&nickname_frame(42, "Karin")).unwrap();
    assert_eq!(aggregator.registry().display_name(42), "Karin");
}

#[test]
fn oversized_nickname_is_rejected() {
    let (decoder, aggregator) = fixture();
    let long = "x".repeat(80);
    // Build by hand: the length byte exceeds the nickname cap
    let mut core = vec![0x04, 0x8D];
    core.extend_from_slice(&[0u8; 7]);
    core.extend(encode_varint(42));
    core.push(long.len() as u8);
    core.extend_from_slice(&long.as_bytes()[..20]);
    decoder.on_frame(&finish_frame(core)).unwrap();
    assert!(aggregator.registry().get(42).is_none());
}

#[test]
fn npc_code_requires_matching_double_read() {
    let (decoder, aggregator) = fixture();
    decoder
        .on_frame(&finish_frame(spawn_core(7, (5000, 5001))))
        .unwrap();
    assert!(aggregator.registry().get(7).is_none());

    decoder.on_frame(&spawn_frame(7, 5000)).unwrap();
    let npc = aggregator.registry().get(7).unwrap();
    assert_eq!(npc.as_npc().map(|n| n.npc_code), Some(5000));
}

#[test]
fn summon_frame_registers_owner() {
    let (decoder, aggregator) = fixture();
    decoder.on_frame(&summon_frame(77, 7000, 5)).unwrap();
    let summon = aggregator.registry().get(77).unwrap();
    let summon = summon.as_summon().unwrap();
    assert_eq!(summon.owner_id, 5);
    assert_eq!(summon.npc_code, 7000);
}

#[test]
fn coalesced_messages_are_split_and_both_decoded() {
    let (decoder, aggregator) = fixture();
    decoder.on_frame(&spawn_frame(9, 5000)).unwrap();
    let mut joined = map_frame(310_100);
    joined.extend(damage_frame(9, 5, 110100, 400));
    decoder.on_frame(&joined).unwrap();

    assert_eq!(aggregator.registry().current_map(), 310_100);
    assert_eq!(aggregator.snapshot().total_damage, 400);
}

#[test]
fn leading_garbage_is_shifted_away() {
    let (decoder, aggregator) = fixture();
    let mut frame = vec![0x01]; // length field of 1 is meaningless
    frame.extend(map_frame(310_100));
    decoder.on_frame(&frame).unwrap();
    assert_eq!(aggregator.registry().current_map(), 310_100);
}

#[test]
fn broken_length_recovers_damage_for_current_target() {
    let (decoder, aggregator) = fixture();
    decoder.on_frame(&spawn_frame(9, 5000)).unwrap();
    decoder.on_frame(&damage_frame(9, 5, 110100, 100)).unwrap();
    assert_eq!(aggregator.registry().current_target(), Some(9));

    // Declared length 200, nothing like that many bytes behind it
    let mut span = vec![0xC8, 0x01, 0x00, 0x00];
    let inner = damage_frame(9, 5, 110100, 500);
    span.extend_from_slice(&inner[..inner.len() - 3]);
    decoder.on_frame(&span).unwrap();

    assert_eq!(aggregator.snapshot().total_damage, 600);
}

#[test]
fn ff_ff_header_is_skipped() {
    let (decoder, aggregator) = fixture();
    let mut span = vec![0xC8, 0x01, 0xFF, 0xFF, 0, 0, 0, 0, 0, 0];
    span.extend(map_frame(310_100));
    decoder.on_frame(&span).unwrap();
    assert_eq!(aggregator.registry().current_map(), 310_100);
}

#[test]
fn nickname_recovered_from_corrupt_span() {
    let (decoder, aggregator) = fixture();
    // Declared length 127 with 16 bytes present; no current target, so the
    // scan falls through to the nickname templates. Subject id 77 precedes
    // a template-2 shape: 00, length, name bytes.
    let span = vec![
        0x7F, 0x01, 0x02, 0x01, 0x4D, 0x01, 0x00, 0x05, b'K', b'a', b'r', b'i', b'n', 0x01,
        0x02, 0x03,
    ];
    decoder.on_frame(&span).unwrap();
    assert_eq!(aggregator.registry().display_name(77), "Karin");
}

#[test]
fn implausible_recovered_names_are_dropped() {
    let (decoder, aggregator) = fixture();
    // Same template shape, but the candidate is purely numeric
    let span = vec![
        0x7F, 0x01, 0x02, 0x01, 0x4D, 0x01, 0x00, 0x05, b'1', b'2', b'3', b'4', b'5', 0x01,
        0x02, 0x03,
    ];
    decoder.on_frame(&span).unwrap();
    assert!(aggregator.registry().get(77).is_none());
}

#[test]
fn frame_shorter_than_delimiter_errors() {
    let (decoder, _) = fixture();
    assert!(matches!(
        decoder.on_frame(&[0x06]),
        Err(DecodeError::FrameTooShort { len: 1 })
    ));
}

#[test]
fn assembler_to_aggregator_pipeline() {
    let registry = Arc::new(EntityRegistry::new(
        Arc::new(BossNameStore::in_memory()),
        &MeterConfig::default(),
    ));
    let writer = LogWriter::new(
        std::env::temp_dir().join(format!("a2meter-dec-{}", uuid::Uuid::new_v4())),
        "abcd1234".into(),
    );
    let aggregator = Arc::new(CombatAggregator::new(
        registry.clone(),
        Arc::new(StaticSkillCatalog),
        writer,
        &MeterConfig::default(),
    ));
    let assembler = FrameAssembler::new(
        ProtocolDecoder::new(registry.clone(), aggregator.clone()),
        64 * 1024,
    );

    let mut stream = Vec::new();
    stream.extend(map_frame(310_100));
    stream.extend(spawn_frame(9, 5000));
    stream.extend(damage_frame(9, 5, 110100, 1_000));
    stream.extend(damage_frame(9, 5, 110100, 500));

    // One byte at a time, the worst possible chunking
    for byte in stream {
        assembler.process_chunk(&[byte]);
    }

    assert_eq!(registry.current_map(), 310_100);
    let snap = aggregator.snapshot();
    assert_eq!(snap.total_damage, 1_500);
    assert_eq!(snap.map[&5].nickname, "User_5");
}

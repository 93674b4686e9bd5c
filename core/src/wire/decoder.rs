//! Frame decoder: length reconciliation, opcode routing and the resync
//! heuristics for corrupted spans.
//!
//! The wire format is undocumented and the source never signals errors, so
//! the decoder is built to self-heal: a span whose declared length disagrees
//! with reality is shifted, split or pattern-scanned until something parses,
//! and whatever does not is dropped.

use std::collections::VecDeque;
use std::sync::Arc;

use memchr::memmem;
use tracing::trace;

use super::assembler::{FrameSink, FRAME_DELIMITER};
use super::error::DecodeError;
use super::varint::{encode_varint, read_varint, Varint};
use crate::tracker::{now_ms, CombatAggregator, DamageEvent, EntityRegistry, SpecialFlags};
use a2meter_types::MAX_NICKNAME_LEN;

const OPCODE_MAP: [u8; 2] = [0x00, 0x61];
const OPCODE_DAMAGE: [u8; 2] = [0x04, 0x38];
const OPCODE_DOT: [u8; 2] = [0x05, 0x38];
const OPCODE_NICKNAME: [u8; 2] = [0x04, 0x8D];
const OPCODE_SPAWN: [u8; 2] = [0x40, 0x36];

/// Map ids are six-digit values; anything else at the map opcode's position
/// is a false positive.
const MAP_ID_RANGE: std::ops::RangeInclusive<u32> = 100_000..=999_999;

pub struct ProtocolDecoder {
    registry: Arc<EntityRegistry>,
    aggregator: Arc<CombatAggregator>,
}

impl FrameSink for ProtocolDecoder {
    fn on_frame(&self, frame: &[u8]) -> Result<(), DecodeError> {
        self.decode_frame(frame)
    }
}

impl ProtocolDecoder {
    pub fn new(registry: Arc<EntityRegistry>, aggregator: Arc<CombatAggregator>) -> Self {
        Self {
            registry,
            aggregator,
        }
    }

    /// Length reconciliation over an explicit work list. Corrupted streams
    /// can split one frame into many spans; a work list bounds the depth
    /// where recursion would not.
    pub fn decode_frame(&self, frame: &[u8]) -> Result<(), DecodeError> {
        if frame.len() < FRAME_DELIMITER.len() {
            return Err(DecodeError::FrameTooShort { len: frame.len() });
        }
        let mut work: VecDeque<Vec<u8>> = VecDeque::new();
        work.push_back(frame.to_vec());

        while let Some(span) = work.pop_front() {
            let declared = read_varint(&span, 0).ok().map(|v| v.value as usize);

            if declared == Some(span.len()) {
                // Healthy frame: strip the trailer, decode once
                if span.len() >= 3 {
                    self.route(&span[..span.len() - 3]);
                }
                continue;
            }
            if span.len() <= 3 {
                continue;
            }
            match declared {
                Some(d) if d > span.len() => {
                    self.recover_broken(&span, &mut work);
                }
                Some(d) if d > 3 => {
                    // One well-framed message followed by more data
                    let head = &span[..d - 3];
                    // A bare 3-byte head is a stray trailer, skip it
                    if head.len() != 3 && !head.is_empty() {
                        self.route(head);
                    }
                    work.push_front(span[d - 3..].to_vec());
                }
                _ => {
                    // Unreadable or meaningless length field: shift one byte
                    // and retry
                    work.push_front(span[1..].to_vec());
                }
            }
        }
        Ok(())
    }

    /// Opcode routing. Order matters: the map id influences how later
    /// messages are keyed, and the DoT layout is loose enough that it must
    /// stay the last resort.
    fn route(&self, packet: &[u8]) {
        if packet.len() < 3 {
            return;
        }
        if self.parse_map(packet) {
            return;
        }
        if self.parse_damage(packet) {
            return;
        }
        if self.parse_nickname(packet) {
            return;
        }
        if self.parse_spawn(packet) {
            return;
        }
        self.parse_dot(packet);
    }

    fn parse_map(&self, p: &[u8]) -> bool {
        let Some(head) = varint_at(p, 0) else {
            return false;
        };
        let offset = head.len;
        if p.len() < offset + 2 + 4 {
            return false;
        }
        if p[offset..offset + 2] != OPCODE_MAP {
            return false;
        }
        let Some(candidate) = read_u32_le(p, offset + 2) else {
            return false;
        };
        if MAP_ID_RANGE.contains(&candidate) {
            trace!(map_id = candidate, "map change");
            self.registry.set_current_map(candidate);
        }
        // Opcode matched; an out-of-range value still consumes the message
        true
    }

    fn parse_damage(&self, p: &[u8]) -> bool {
        // 0x20-headed packets share bytes with the damage layout but are not
        // damage
        if p[0] == 0x20 {
            return false;
        }
        let Some(head) = varint_at(p, 0) else {
            return false;
        };
        let mut offset = head.len;
        if p.len() < offset + 2 || p[offset..offset + 2] != OPCODE_DAMAGE {
            return false;
        }
        offset += 2;

        let Some(target) = varint_at(p, offset) else {
            return false;
        };
        offset += target.len;
        let Some(switch) = varint_at(p, offset) else {
            return false;
        };
        offset += switch.len;
        let Some(kind_flags) = varint_at(p, offset) else {
            return false;
        };
        offset += kind_flags.len;
        let Some(actor) = varint_at(p, offset) else {
            return false;
        };
        offset += actor.len;

        // 5-byte skill field, low 4 bytes little-endian
        if offset + 5 >= p.len() {
            return false;
        }
        let Some(skill_code) = read_u32_le(p, offset) else {
            return false;
        };
        offset += 5;

        let Some(kind) = varint_at(p, offset) else {
            return false;
        };
        offset += kind.len;

        // The low nibble of the switch field selects the special-block length
        let block_len = match switch.value & 0x0F {
            4 => 8,
            5 => 12,
            6 => 10,
            7 => 14,
            _ => return false,
        };
        if offset + block_len > p.len() {
            return false;
        }
        let specials = SpecialFlags::from_block(&p[offset..offset + block_len]);
        offset += block_len;

        let Some(unknown) = varint_at(p, offset) else {
            return false;
        };
        offset += unknown.len;
        let Some(damage) = varint_at(p, offset) else {
            return false;
        };
        offset += damage.len;
        if offset >= p.len() {
            return false;
        }
        let Some(_loop_count) = varint_at(p, offset) else {
            return false;
        };

        if actor.value != target.value {
            let mut event = DamageEvent::new(
                target.value,
                actor.value,
                skill_code,
                i64::from(damage.value),
                now_ms(),
            );
            event.kind_flags = kind_flags.value;
            event.specials = specials;
            self.aggregator.on_damage(&event);
        }
        true
    }

    fn parse_dot(&self, p: &[u8]) -> bool {
        let Some(head) = varint_at(p, 0) else {
            return false;
        };
        let mut offset = head.len;
        if p.len() < offset + 2 || p[offset..offset + 2] != OPCODE_DOT {
            return false;
        }
        offset += 2;

        let Some(target) = varint_at(p, offset) else {
            return false;
        };
        offset += target.len;
        // One fixed pad byte between target and actor
        offset += 1;
        let Some(actor) = varint_at(p, offset) else {
            return false;
        };
        if actor.value == target.value {
            return false;
        }
        offset += actor.len;
        let Some(unknown) = varint_at(p, offset) else {
            return false;
        };
        offset += unknown.len;

        let Some(raw_code) = read_u32_le(p, offset) else {
            return false;
        };
        let skill_code = raw_code / 100;
        offset += 4;
        if p.len() <= offset {
            return false;
        }
        let Some(damage) = varint_at(p, offset) else {
            return false;
        };

        let mut event = DamageEvent::new(
            target.value,
            actor.value,
            skill_code,
            i64::from(damage.value),
            now_ms(),
        );
        event.is_dot = true;
        self.aggregator.on_damage(&event);
        true
    }

    fn parse_nickname(&self, p: &[u8]) -> bool {
        let Some(head) = varint_at(p, 0) else {
            return false;
        };
        let offset = head.len;
        if p.len() < offset + 2 || p[offset..offset + 2] != OPCODE_NICKNAME {
            return false;
        }
        // The subject id sits at a fixed offset in this message, independent
        // of the length varint's width
        let mut offset = 10;
        if offset >= p.len() {
            return false;
        }
        let Some(subject) = varint_at(p, offset) else {
            return false;
        };
        offset += subject.len;
        if offset >= p.len() {
            return false;
        }
        let name_len = p[offset] as usize;
        if name_len > MAX_NICKNAME_LEN || offset + 1 + name_len > p.len() {
            return false;
        }
        let name = String::from_utf8_lossy(&p[offset + 1..offset + 1 + name_len]).into_owned();
        self.registry.on_nickname(subject.value, &name);
        true
    }

    /// Spawn frames may confirm an NPC code, register a summon, or both.
    fn parse_spawn(&self, p: &[u8]) -> bool {
        let Some(head) = varint_at(p, 0) else {
            return false;
        };
        let mut offset = head.len;
        if p.len() < offset + 2 || p[offset..offset + 2] != OPCODE_SPAWN {
            return false;
        }
        offset += 2;

        let Some(entity) = varint_at(p, offset) else {
            return false;
        };
        offset += entity.len + 28;

        // The NPC code appears twice in a row; equality is the confirmation
        // that this really is the code field and not line noise
        let mut npc_code = 0;
        if let Some(first) = varint_at(p, offset) {
            if let Some(second) = varint_at(p, offset + first.len) {
                if first.value == second.value {
                    npc_code = first.value;
                    if npc_code != 0 {
                        self.registry.on_npc_observed(entity.value, npc_code);
                    }
                }
            }
        }

        // Summon detection is positional: an 8-byte FF marker, then a
        // 07 02 06 sub-opcode, then the owner id 11 bytes past it
        if let Some(key_idx) = memmem::find(p, &[0xFF; 8]) {
            if let Some(sub_idx) = memmem::find(&p[key_idx + 8..], &[0x07, 0x02, 0x06]) {
                let owner_offset = key_idx + sub_idx + 11;
                if let Some(owner) = read_u16_le(p, owner_offset) {
                    self.registry
                        .on_summon_observed(entity.value, u32::from(owner), npc_code);
                }
            }
        }
        true
    }

    /// Recovery for spans whose declared length exceeds what arrived.
    ///
    /// An `FF FF` at bytes 2..4 marks a known 10-byte header to skip. For
    /// everything else, hunt the span for damage or DoT messages aimed at
    /// the current display target and re-frame around whichever comes first;
    /// if nothing is salvaged on the first pass, scan for nickname shapes so
    /// a corrupted name packet is not lost outright.
    fn recover_broken(&self, span: &[u8], work: &mut VecDeque<Vec<u8>>) {
        let mut cursor = span;
        let mut allow_nickname_scan = true;
        loop {
            if cursor.len() >= 4 && cursor[2] == 0xFF && cursor[3] == 0xFF {
                if cursor.len() > 10 {
                    work.push_front(cursor[10..].to_vec());
                }
                return;
            }

            let mut processed = false;
            if let Some(target) = self.registry.current_target() {
                let target_bytes = encode_varint(target);
                let mut damage_key = OPCODE_DAMAGE.to_vec();
                damage_key.extend_from_slice(&target_bytes);
                let mut dot_key = OPCODE_DOT.to_vec();
                dot_key.extend_from_slice(&target_bytes);

                let damage_idx = memmem::find(cursor, &damage_key).filter(|&i| i > 0);
                let dot_idx = memmem::find(cursor, &dot_key).filter(|&i| i > 0);
                let found = match (damage_idx, dot_idx) {
                    (Some(d), Some(t)) if d < t => Some((d, true)),
                    (Some(_), Some(t)) => Some((t, false)),
                    (Some(d), None) => Some((d, true)),
                    (None, Some(t)) => Some((t, false)),
                    (None, None) => None,
                };

                if let Some((idx, is_damage)) = found {
                    // The byte before the opcode is reinterpreted as the
                    // message's single-byte length prefix
                    if let Some(prefix) = varint_at(cursor, idx - 1).filter(|v| v.len == 1) {
                        let start = idx - 1;
                        if prefix.value > 3 {
                            let end = start + prefix.value as usize - 3;
                            if end <= cursor.len() {
                                let extracted = &cursor[start..end];
                                if is_damage {
                                    self.parse_damage(extracted);
                                } else {
                                    self.parse_dot(extracted);
                                }
                                processed = true;
                                if end < cursor.len() {
                                    cursor = &cursor[end..];
                                    allow_nickname_scan = false;
                                    continue;
                                }
                            }
                        }
                    }
                }
            }

            if allow_nickname_scan && !processed {
                self.scan_nickname_candidates(cursor);
            }
            return;
        }
    }

    /// Last-ditch nickname extraction from a corrupted span. Three observed
    /// byte templates, each anchored on a varint subject id; candidates must
    /// look like a name before they are trusted.
    fn scan_nickname_candidates(&self, p: &[u8]) {
        let mut origin = 0usize;
        while origin < p.len() {
            let Some(subject) = varint_at(p, origin) else {
                return;
            };
            let inner = origin + subject.len;
            if inner + 6 >= p.len() {
                origin += 1;
                continue;
            }

            if p[inner + 3] == 0x01 && p[inner + 4] == 0x07 {
                let n = p[inner + 5] as usize;
                if inner + 6 + n <= p.len()
                    && self.try_nickname(subject.value, &p[inner + 6..inner + 6 + n])
                {
                    origin += 1;
                }
            }
            if p.len() > inner + 3 && p[inner + 1] == 0x00 {
                let n = p[inner + 2] as usize;
                if n != 0
                    && p.len() >= inner + n + 3
                    && self.try_nickname(subject.value, &p[inner + 3..inner + 3 + n])
                {
                    origin += 1;
                }
            }
            if p.len() > inner + 5 && p[inner + 3] == 0x00 && p[inner + 4] == 0x07 {
                let n = p[inner + 5] as usize;
                if p.len() > inner + n + 6
                    && self.try_nickname(subject.value, &p[inner + 6..inner + 6 + n])
                {
                    origin += 1;
                }
            }
            origin += 1;
        }
    }

    fn try_nickname(&self, subject: u32, bytes: &[u8]) -> bool {
        let Ok(name) = std::str::from_utf8(bytes) else {
            return false;
        };
        if !plausible_nickname(name) {
            return false;
        }
        trace!(subject, name, "nickname recovered from corrupted span");
        self.registry.on_nickname(subject, name);
        true
    }
}

/// Accept only strings that could be a player name: Hangul syllables and
/// ASCII alphanumerics, not purely numeric, not a lone letter.
fn plausible_nickname(name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    let all_valid = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || ('가'..='힣').contains(&c));
    if !all_valid {
        return false;
    }
    if name.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    !(name.len() == 1 && name.chars().all(|c| c.is_ascii_alphabetic()))
}

fn varint_at(p: &[u8], offset: usize) -> Option<Varint> {
    read_varint(p, offset).ok()
}

fn read_u16_le(p: &[u8], offset: usize) -> Option<u16> {
    let bytes: [u8; 2] = p.get(offset..offset + 2)?.try_into().ok()?;
    Some(u16::from_le_bytes(bytes))
}

fn read_u32_le(p: &[u8], offset: usize) -> Option<u32> {
    let bytes: [u8; 4] = p.get(offset..offset + 4)?.try_into().ok()?;
    Some(u32::from_le_bytes(bytes))
}

//! Decoded damage events, the only output format of the protocol decoder.

use uuid::Uuid;

/// Special-damage bits carried in byte 0 of the variable-length flag block.
/// Only blocks of 10 bytes or more carry them; 8-byte blocks have none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpecialFlags(u8);

impl SpecialFlags {
    pub const BACK: u8 = 0x01;
    pub const PARRY: u8 = 0x04;
    pub const PERFECT: u8 = 0x08;
    pub const DOUBLE: u8 = 0x10;
    pub const ENDURE: u8 = 0x20;
    pub const POWER_SHARD: u8 = 0x80;
    // 0x02 and 0x40 are observed but their meaning is unknown

    pub fn from_block(block: &[u8]) -> Self {
        if block.len() >= 10 {
            Self(block[0])
        } else {
            Self(0)
        }
    }

    pub fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub fn contains(self, bit: u8) -> bool {
        self.0 & bit != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// One decoded hit, regular or damage-over-time.
#[derive(Debug, Clone)]
pub struct DamageEvent {
    /// Dedup key: the same event is applied to a target at most once.
    pub uuid: Uuid,
    pub timestamp_ms: i64,
    pub target_id: u32,
    pub actor_id: u32,
    /// Raw skill code from the packet, rank offset included.
    pub skill_code: u32,
    pub damage: i64,
    pub is_dot: bool,
    /// Damage-kind flag varint; bit 0 marks a critical hit.
    pub kind_flags: u32,
    pub specials: SpecialFlags,
}

impl DamageEvent {
    pub fn new(target_id: u32, actor_id: u32, skill_code: u32, damage: i64, now_ms: i64) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            timestamp_ms: now_ms,
            target_id,
            actor_id,
            skill_code,
            damage,
            is_dot: false,
            kind_flags: 0,
            specials: SpecialFlags::default(),
        }
    }

    pub fn is_crit(&self) -> bool {
        self.kind_flags & 0x01 != 0
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

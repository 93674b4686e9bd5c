//! Class inference from observed skills.
//!
//! Other players never announce their class; the first recognizable skill they
//! use betrays it. Mapping is by the class band of the base code.

use phf::phf_map;

use super::{SkillCatalog, StaticSkillCatalog};

static JOB_BY_BAND: phf::Map<u32, &'static str> = phf_map! {
    11u32 => "Gladiator",
    12u32 => "Templar",
    13u32 => "Assassin",
    14u32 => "Ranger",
    15u32 => "Sorcerer",
    16u32 => "Spiritmaster",
    17u32 => "Cleric",
    18u32 => "Chanter",
};

/// Class name for the player who used this raw skill code, if the skill is in
/// the catalog.
pub fn job_for_skill(raw: u32) -> Option<&'static str> {
    let base = StaticSkillCatalog.base_code(raw)?;
    JOB_BY_BAND.get(&(base / 10_000)).copied()
}

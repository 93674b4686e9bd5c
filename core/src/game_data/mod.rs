//! Static game data: skill names and class inference.
//!
//! Packets carry skill codes with a per-rank/per-morph numeric offset added to
//! a base code. The catalog resolves a raw code back to its base by rounding
//! against increasingly coarse moduli and checking the known-skills table.

mod jobs;
mod skills;

pub use jobs::job_for_skill;

/// Lookup from skill codes to display data.
///
/// A trait so the aggregator can be tested against a tiny in-memory catalog
/// instead of the full shipped table.
pub trait SkillCatalog: Send + Sync {
    /// The base (offset-free) code for a raw wire code, if known.
    fn base_code(&self, raw: u32) -> Option<u32>;

    /// Display name for a base code.
    fn name(&self, base: u32) -> Option<&'static str>;

    /// Human-readable label for a raw wire code.
    ///
    /// Unknown codes fall back to the number itself. A nonzero offset from the
    /// base is rendered digit by digit after the name, so "Cleave" at raw
    /// 110120 becomes `Cleave[2][0]`.
    fn display_name(&self, raw: u32) -> String {
        let Some(base) = self.base_code(raw) else {
            return raw.to_string();
        };
        let Some(name) = self.name(base) else {
            return raw.to_string();
        };
        let offset = raw - base;
        if offset == 0 {
            return name.to_string();
        }
        let mut out = String::from(name);
        for digit in offset.to_string().chars() {
            out.push('[');
            out.push(digit);
            out.push(']');
        }
        out
    }
}

/// Catalog backed by the compiled-in skill table.
pub struct StaticSkillCatalog;

impl SkillCatalog for StaticSkillCatalog {
    fn base_code(&self, raw: u32) -> Option<u32> {
        // Offsets never cross a power-of-ten boundary in observed data, so
        // the first modulus whose rounding lands on a known code wins.
        for modulus in [100, 1_000, 10_000] {
            let candidate = raw - raw % modulus;
            if skills::SKILL_NAMES.contains_key(&candidate) {
                return Some(candidate);
            }
        }
        if skills::SKILL_NAMES.contains_key(&raw) {
            return Some(raw);
        }
        None
    }

    fn name(&self, base: u32) -> Option<&'static str> {
        skills::SKILL_NAMES.get(&base).copied()
    }
}

//! Per-(target, attacker) accumulation and per-skill breakdown.

use hashbrown::HashMap;
use serde::Serialize;

use super::event::{DamageEvent, SpecialFlags};
use crate::game_data::{job_for_skill, SkillCatalog};

/// Running tally for one skill, keyed by its raw wire code.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzedSkill {
    pub display_name: String,
    pub times: u64,
    pub damage_amount: i64,
    pub crit_times: u64,
    pub back_times: u64,
    pub parry_times: u64,
    pub perfect_times: u64,
    pub double_times: u64,
    pub dot_times: u64,
    pub dot_damage_amount: i64,
}

impl AnalyzedSkill {
    fn new(display_name: String) -> Self {
        Self {
            display_name,
            times: 0,
            damage_amount: 0,
            crit_times: 0,
            back_times: 0,
            parry_times: 0,
            perfect_times: 0,
            double_times: 0,
            dot_times: 0,
            dot_damage_amount: 0,
        }
    }
}

/// One attacker's contribution against one target.
#[derive(Debug, Clone)]
pub struct PersonalData {
    pub nickname: String,
    /// Inferred from the first catalog-recognized skill; never re-resolved.
    pub job: Option<&'static str>,
    pub cumulative_damage: i64,
    pub per_skill: HashMap<u32, AnalyzedSkill>,
}

impl PersonalData {
    pub fn new(nickname: String) -> Self {
        Self {
            nickname,
            job: None,
            cumulative_damage: 0,
            per_skill: HashMap::new(),
        }
    }

    pub fn apply(&mut self, event: &DamageEvent, catalog: &dyn SkillCatalog) {
        self.cumulative_damage += event.damage;
        if self.job.is_none() {
            self.job = job_for_skill(event.skill_code);
        }
        let skill = self
            .per_skill
            .entry(event.skill_code)
            .or_insert_with(|| AnalyzedSkill::new(catalog.display_name(event.skill_code)));
        if event.is_dot {
            skill.dot_times += 1;
            skill.dot_damage_amount += event.damage;
            return;
        }
        skill.times += 1;
        skill.damage_amount += event.damage;
        if event.is_crit() {
            skill.crit_times += 1;
        }
        if event.specials.contains(SpecialFlags::BACK) {
            skill.back_times += 1;
        }
        if event.specials.contains(SpecialFlags::PARRY) {
            skill.parry_times += 1;
        }
        if event.specials.contains(SpecialFlags::PERFECT) {
            skill.perfect_times += 1;
        }
        if event.specials.contains(SpecialFlags::DOUBLE) {
            skill.double_times += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_data::StaticSkillCatalog;

    fn crit_event(skill: u32, damage: i64) -> DamageEvent {
        let mut e = DamageEvent::new(9, 5, skill, damage, 1_000);
        e.kind_flags = 0x01;
        e
    }

    #[test]
    fn dot_hits_tally_separately() {
        let mut data = PersonalData::new("Karin".into());
        let mut dot = DamageEvent::new(9, 5, 110100, 40, 1_000);
        dot.is_dot = true;
        data.apply(&dot, &StaticSkillCatalog);
        data.apply(&DamageEvent::new(9, 5, 110100, 300, 1_100), &StaticSkillCatalog);

        let skill = &data.per_skill[&110100];
        assert_eq!(skill.times, 1);
        assert_eq!(skill.damage_amount, 300);
        assert_eq!(skill.dot_times, 1);
        assert_eq!(skill.dot_damage_amount, 40);
        assert_eq!(data.cumulative_damage, 340);
    }

    #[test]
    fn job_resolves_once_from_first_known_skill() {
        let mut data = PersonalData::new("Karin".into());
        data.apply(&DamageEvent::new(9, 5, 42, 10, 0), &StaticSkillCatalog);
        assert_eq!(data.job, None);
        data.apply(&crit_event(110100, 10), &StaticSkillCatalog);
        assert_eq!(data.job, Some("Gladiator"));
        data.apply(&crit_event(150100, 10), &StaticSkillCatalog);
        assert_eq!(data.job, Some("Gladiator"));
        assert_eq!(data.per_skill[&110100].crit_times, 1);
    }
}

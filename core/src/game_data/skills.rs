//! Known base skill codes and their display names.
//!
//! Codes follow the class banding of the client data: the leading two digits
//! select the class, the rest the skill line. Ranks and morphs are additive
//! offsets on top of these bases and are never listed here.

use phf::phf_map;

pub static SKILL_NAMES: phf::Map<u32, &'static str> = phf_map! {
    // Gladiator
    110100u32 => "Cleave",
    110200u32 => "Ferocious Strike",
    110300u32 => "Wrathful Wave",
    110400u32 => "Crippling Cut",
    110500u32 => "Whirling Strike",
    111000u32 => "Berserking",
    112000u32 => "Sure Strike",

    // Templar
    120100u32 => "Shining Slash",
    120200u32 => "Punishing Thrust",
    120300u32 => "Divine Blow",
    120400u32 => "Shield Bash",
    121000u32 => "Aegis Barrier",

    // Assassin
    130100u32 => "Swift Edge",
    130200u32 => "Venomous Strike",
    130300u32 => "Ambush",
    130400u32 => "Flurry",
    131000u32 => "Apply Poison",

    // Ranger
    140100u32 => "Piercing Arrow",
    140200u32 => "Hunter's Volley",
    140300u32 => "Snipe",
    140400u32 => "Trap of Thorns",
    141000u32 => "Bestial Fury",

    // Sorcerer
    150100u32 => "Flame Bolt",
    150200u32 => "Frost Lance",
    150300u32 => "Inferno Blaze",
    150400u32 => "Lightning Chain",
    151000u32 => "Arcane Surge",

    // Spiritmaster
    160100u32 => "Spirit Claw",
    160200u32 => "Erosion",
    160300u32 => "Cursed Flame",
    160400u32 => "Command: Assault",
    161000u32 => "Summon Fire Spirit",

    // Cleric
    170100u32 => "Smite",
    170200u32 => "Holy Censure",
    170300u32 => "Chastise",
    171000u32 => "Radiant Judgment",

    // Chanter
    180100u32 => "Staff Strike",
    180200u32 => "Resonant Blow",
    180300u32 => "Soul Crush",
    181000u32 => "Inescapable Judgment",
};

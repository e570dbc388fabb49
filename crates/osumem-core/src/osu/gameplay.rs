use serde::Serialize;

use crate::error::Result;
use crate::schema::{Record, RecordSchema};

/// Fields that fail outside of gameplay without anything being wrong.
///
/// The leaderboard and key overlay objects are only allocated while a map is
/// being played.
pub const TRANSIENT_FIELDS: &[&str] = &["leaderboard", "key_overlay"];

/// Live state of the current play
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GameplayData {
    pub retries: i32,
    pub player_name: String,
    pub mods_xor1: i32,
    pub mods_xor2: i32,
    pub hit_errors: Vec<i32>,
    pub mode: i32,
    pub max_combo: i16,
    pub score_v2: i32,
    pub hit_100: i16,
    pub hit_300: i16,
    pub hit_50: i16,
    pub hit_geki: i16,
    pub hit_katu: i16,
    pub hit_miss: i16,
    pub combo: i16,
    pub player_hp_smooth: f64,
    pub player_hp: f64,
    pub accuracy: f64,
    pub leaderboard: u32,
    pub key_overlay: u32,
}

impl GameplayData {
    /// Active mods bitmask; the client stores it split across two xored words
    pub fn mods(&self) -> u32 {
        (self.mods_xor1 ^ self.mods_xor2) as u32
    }
}

impl Record for GameplayData {
    fn schema() -> Result<RecordSchema<Self>> {
        RecordSchema::builder("GameplayData")
            .field("retries", "[Base - 0x33] + 0x8", |r: &mut Self| {
                &mut r.retries
            })
            .field("player_name", "[[[Ruleset + 0x68] + 0x38] + 0x28]", |r: &mut Self| {
                &mut r.player_name
            })
            .field("mods_xor1", "[[[Ruleset + 0x68] + 0x38] + 0x1C] + 0xC", |r: &mut Self| {
                &mut r.mods_xor1
            })
            .field("mods_xor2", "[[[Ruleset + 0x68] + 0x38] + 0x1C] + 0x8", |r: &mut Self| {
                &mut r.mods_xor2
            })
            .field("hit_errors", "[[[Ruleset + 0x68] + 0x38] + 0x38]", |r: &mut Self| {
                &mut r.hit_errors
            })
            .field("mode", "[[Ruleset + 0x68] + 0x38] + 0x64", |r: &mut Self| &mut r.mode)
            .field("max_combo", "[[Ruleset + 0x68] + 0x38] + 0x68", |r: &mut Self| {
                &mut r.max_combo
            })
            .field("score_v2", "Ruleset + 0x100", |r: &mut Self| &mut r.score_v2)
            .field("hit_100", "[[Ruleset + 0x68] + 0x38] + 0x88", |r: &mut Self| {
                &mut r.hit_100
            })
            .field("hit_300", "[[Ruleset + 0x68] + 0x38] + 0x8A", |r: &mut Self| {
                &mut r.hit_300
            })
            .field("hit_50", "[[Ruleset + 0x68] + 0x38] + 0x8C", |r: &mut Self| {
                &mut r.hit_50
            })
            .field("hit_geki", "[[Ruleset + 0x68] + 0x38] + 0x8E", |r: &mut Self| {
                &mut r.hit_geki
            })
            .field("hit_katu", "[[Ruleset + 0x68] + 0x38] + 0x90", |r: &mut Self| {
                &mut r.hit_katu
            })
            .field("hit_miss", "[[Ruleset + 0x68] + 0x38] + 0x92", |r: &mut Self| {
                &mut r.hit_miss
            })
            .field("combo", "[[Ruleset + 0x68] + 0x38] + 0x94", |r: &mut Self| {
                &mut r.combo
            })
            .field("player_hp_smooth", "[[Ruleset + 0x68] + 0x40] + 0x14", |r: &mut Self| {
                &mut r.player_hp_smooth
            })
            .field("player_hp", "[[Ruleset + 0x68] + 0x40] + 0x1C", |r: &mut Self| {
                &mut r.player_hp
            })
            .field("accuracy", "[[Ruleset + 0x68] + 0x48] + 0xC", |r: &mut Self| {
                &mut r.accuracy
            })
            .field("leaderboard", "[Ruleset + 0x7C] + 0x24", |r: &mut Self| {
                &mut r.leaderboard
            })
            // Dead pointers here are common, keep it last
            .field("key_overlay", "[[Ruleset + 0xB0] + 0x10] + 0x4", |r: &mut Self| {
                &mut r.key_overlay
            })
            .build()
    }
}

use serde::Serialize;

use super::GameStatus;
use crate::error::Result;
use crate::schema::{Record, RecordSchema};

/// Client state and the currently selected beatmap
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MenuData {
    pub status: u32,
    pub menu_game_mode: i32,
    pub plays: i32,
    pub artist: String,
    pub artist_original: String,
    pub title: String,
    pub title_original: String,
    pub ar: f32,
    pub cs: f32,
    pub hp: f32,
    pub od: f32,
    pub star_rating_struct: u32,
    pub audio_filename: String,
    pub background_filename: String,
    pub folder: String,
    pub creator: String,
    pub name: String,
    pub path: String,
    pub difficulty: String,
    pub map_id: i32,
    pub set_id: i32,
    /// unknown, unsubmitted, pending/wip/graveyard, unused, ranked, approved, qualified
    pub ranked_status: i32,
    pub md5: String,
    pub object_count: i32,
}

impl MenuData {
    pub fn game_status(&self) -> GameStatus {
        GameStatus::from_u32(self.status)
    }
}

impl Record for MenuData {
    fn schema() -> Result<RecordSchema<Self>> {
        RecordSchema::builder("MenuData")
            .field("status", "[Status - 0x4]", |r: &mut Self| &mut r.status)
            .field("menu_game_mode", "[Base - 0x33]", |r: &mut Self| {
                &mut r.menu_game_mode
            })
            .field("plays", "[Base - 0x33] + 0xC", |r: &mut Self| &mut r.plays)
            .field("artist", "[[Beatmap] + 0x18]", |r: &mut Self| &mut r.artist)
            .field("artist_original", "[[Beatmap] + 0x1C]", |r: &mut Self| {
                &mut r.artist_original
            })
            .field("title", "[[Beatmap] + 0x24]", |r: &mut Self| &mut r.title)
            .field("title_original", "[[Beatmap] + 0x28]", |r: &mut Self| {
                &mut r.title_original
            })
            .field("ar", "[Beatmap] + 0x2C", |r: &mut Self| &mut r.ar)
            .field("cs", "[Beatmap] + 0x30", |r: &mut Self| &mut r.cs)
            .field("hp", "[Beatmap] + 0x34", |r: &mut Self| &mut r.hp)
            .field("od", "[Beatmap] + 0x38", |r: &mut Self| &mut r.od)
            .field("star_rating_struct", "[Beatmap] + 0x8C", |r: &mut Self| {
                &mut r.star_rating_struct
            })
            .field("audio_filename", "[[Beatmap] + 0x64]", |r: &mut Self| {
                &mut r.audio_filename
            })
            .field("background_filename", "[[Beatmap] + 0x68]", |r: &mut Self| {
                &mut r.background_filename
            })
            .field("folder", "[[Beatmap] + 0x78]", |r: &mut Self| &mut r.folder)
            .field("creator", "[[Beatmap] + 0x7C]", |r: &mut Self| &mut r.creator)
            .field("name", "[[Beatmap] + 0x80]", |r: &mut Self| &mut r.name)
            .field("path", "[[Beatmap] + 0x90]", |r: &mut Self| &mut r.path)
            .field("difficulty", "[[Beatmap] + 0xAC]", |r: &mut Self| {
                &mut r.difficulty
            })
            .field("map_id", "[Beatmap] + 0xC8", |r: &mut Self| &mut r.map_id)
            .field("set_id", "[Beatmap] + 0xCC", |r: &mut Self| &mut r.set_id)
            .field("ranked_status", "[Beatmap] + 0x12C", |r: &mut Self| {
                &mut r.ranked_status
            })
            .field("md5", "[[Beatmap] + 0x6C]", |r: &mut Self| &mut r.md5)
            .field("object_count", "[Beatmap] + 0xFC", |r: &mut Self| {
                &mut r.object_count
            })
            .build()
    }
}

/// Just the client status, readable before a beatmap is loaded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusData {
    pub status: u32,
}

impl StatusData {
    pub fn game_status(&self) -> GameStatus {
        GameStatus::from_u32(self.status)
    }
}

impl Record for StatusData {
    fn schema() -> Result<RecordSchema<Self>> {
        RecordSchema::builder("StatusData")
            .field("status", "[Status - 0x4]", |r: &mut Self| &mut r.status)
            .build()
    }
}

use crate::error::Result;
use crate::schema::AddressSchema;

pub const STATUS: &str = "48 83 F8 04 73 1E";
pub const SETTINGS_CLASS: &str = "83 E0 20 85 C0 7E 2F";
pub const BASE: &str = "F8 01 74 04 83 65";
pub const MENU_MODS: &str = "C8 FF ?? ?? ?? ?? ?? 81 0D ?? ?? ?? ?? 00 08 00 00";
pub const PLAY_TIME: &str = "5E 5F 5D C3 A1 ?? ?? ?? ?? 89 ?? 04";
pub const CHAT_CHECKER: &str = "0A D7 23 3C 00 00 ?? 01";
pub const SKIN_DATA: &str = "75 21 8B 1D";
pub const RULESETS: &str = "7D 15 A1 ?? ?? ?? ?? 85 C0";
pub const CHAT_AREA: &str = "33 47 9D FF 5B 7F FF FF";

/// Addresses exposed by the osu! stable client
///
/// `Status` and `SettingsClass` are available from the main menu onwards;
/// the rest are found once the client has loaded a beatmap.
pub fn address_schema() -> Result<AddressSchema> {
    AddressSchema::builder()
        .signature("Status", STATUS)
        .signature("SettingsClass", SETTINGS_CLASS)
        .signature("Base", BASE)
        .signature("MenuMods", MENU_MODS)
        .signature("PlayTime", PLAY_TIME)
        .signature("ChatChecker", CHAT_CHECKER)
        .signature("SkinData", SKIN_DATA)
        .signature("Rulesets", RULESETS)
        .signature("ChatArea", CHAT_AREA)
        .derived("Ruleset", "[[Rulesets - 0xB] + 0x4]")
        .derived("Beatmap", "[Base - 0xC]")
        .derived("Settings", "[SettingsClass + 0x8]")
        .build()
}

//! osu! stable memory layout
//!
//! Signatures and pointer chains for the 32-bit .NET client. Offsets are
//! tied to client builds; when the game updates, this is the module that
//! changes.

mod addresses;
mod gameplay;
mod menu;
mod status;

pub use addresses::address_schema;
pub use gameplay::{GameplayData, TRANSIENT_FIELDS};
pub use menu::{MenuData, StatusData};
pub use status::GameStatus;

use crate::error::Result;
use crate::schema::{AddressSchema, Record, RecordSchema};

/// Process image name of the stable client
pub const PROCESS_NAME: &str = "osu!.exe";

/// Window titles of other programs that also run an `osu!.exe`
pub const BLACKLISTED_TITLES: &[&str] = &["osu!lazer", "osu!framework"];

/// Every osu! schema, built and cross-checked
#[derive(Debug)]
pub struct Schemas {
    pub addresses: AddressSchema,
    pub status: RecordSchema<StatusData>,
    pub menu: RecordSchema<MenuData>,
    pub gameplay: RecordSchema<GameplayData>,
}

impl Schemas {
    pub fn load() -> Result<Self> {
        let addresses = address_schema()?;
        let status = StatusData::schema()?;
        let menu = MenuData::schema()?;
        let gameplay = GameplayData::schema()?;

        status.validate(&addresses)?;
        menu.validate(&addresses)?;
        gameplay.validate(&addresses)?;

        Ok(Self {
            addresses,
            status,
            menu,
            gameplay,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::memory::{MockProcess, MockProcessBuilder};
    use crate::session::Session;

    const CODE: u64 = 0x0040_0000;
    const STATUS_SLOT: u64 = 0x0100_0000;
    const BEATMAP_SLOT: u64 = 0x0200_0000;
    const BEATMAP: u64 = 0x0300_0000;
    const STRINGS: u64 = 0x0400_0000;
    const MENU: u64 = 0x0500_0000;
    const RULESETS: u64 = 0x0600_0000;
    const RULESET: u64 = 0x0700_0000;
    const GAMEPLAY: u64 = 0x0800_0000;
    const SCORE: u64 = 0x0900_0000;
    const SCORE_DATA: u64 = 0x0A00_0000;
    const HP_ACC: u64 = 0x0B00_0000;

    /// A client sitting in gameplay with a few values filled in
    fn fake_client() -> MockProcess {
        let mut builder = MockProcessBuilder::new();
        for start in [
            CODE,
            STATUS_SLOT,
            BEATMAP_SLOT,
            BEATMAP,
            STRINGS,
            MENU,
            RULESETS,
            RULESET,
            GAMEPLAY,
            SCORE,
            SCORE_DATA,
            HP_ACC,
        ] {
            builder = builder.region(start, 0x1000);
        }

        // Signatures
        builder = builder
            .write_bytes(CODE + 0x100, &[0x48, 0x83, 0xF8, 0x04, 0x73, 0x1E])
            .write_ptr(CODE + 0xFC, STATUS_SLOT as u32)
            .write(STATUS_SLOT, 2u32)
            .write_bytes(CODE + 0x200, &[0xF8, 0x01, 0x74, 0x04, 0x83, 0x65])
            .write_ptr(CODE + 0x200 - 0xC, BEATMAP_SLOT as u32)
            .write_ptr(CODE + 0x200 - 0x33, MENU as u32)
            .write_bytes(CODE + 0x300, &[0x7D, 0x15, 0xA1, 0, 0, 0, 0, 0x85, 0xC0])
            .write_ptr(CODE + 0x300 - 0xB, RULESETS as u32);

        // Menu
        builder = builder
            .write(MENU, 0i32)
            .write(MENU + 0x8, 3i32)
            .write(MENU + 0xC, 42i32)
            .write_ptr(BEATMAP_SLOT, BEATMAP as u32)
            .write_string(STRINGS + 0xF00, "");
        for offset in [0x18, 0x1C, 0x24, 0x28, 0x64, 0x68, 0x6C, 0x78, 0x7C, 0x80, 0x90, 0xAC] {
            builder = builder.write_ptr(BEATMAP + offset, (STRINGS + 0xF00) as u32);
        }
        builder = builder
            .write_string(STRINGS, "Camellia")
            .write_ptr(BEATMAP + 0x18, STRINGS as u32)
            .write_string(STRINGS + 0x100, "Exit This Earth's Atomosphere")
            .write_ptr(BEATMAP + 0x24, (STRINGS + 0x100) as u32)
            .write(BEATMAP + 0x2C, 9.3f32)
            .write(BEATMAP + 0xC8, 1_234_567i32);

        // Gameplay
        builder = builder
            .write_ptr(RULESETS + 0x4, RULESET as u32)
            .write_ptr(RULESET + 0x68, GAMEPLAY as u32)
            .write_ptr(GAMEPLAY + 0x38, SCORE as u32)
            .write_ptr(GAMEPLAY + 0x40, HP_ACC as u32)
            .write_ptr(GAMEPLAY + 0x48, (HP_ACC + 0x100) as u32)
            .write(HP_ACC + 0x1C, 200.0f64)
            .write(HP_ACC + 0x10C, 98.5f64)
            .write(SCORE + 0x92, 5i16)
            .write(SCORE + 0x94, 321i16)
            .write_string(SCORE_DATA, "peppy")
            .write_ptr(SCORE + 0x28, SCORE_DATA as u32)
            .write_list(SCORE_DATA + 0x100, SCORE_DATA + 0x200, &[-3i32, 12])
            .write_ptr(SCORE + 0x38, (SCORE_DATA + 0x100) as u32)
            .write(SCORE_DATA + 0x30C, 0x5A5A ^ 72)
            .write(SCORE_DATA + 0x308, 0x5A5A)
            .write_ptr(SCORE + 0x1C, (SCORE_DATA + 0x300) as u32);

        builder.build()
    }

    fn session() -> Session<MockProcess> {
        let schemas = Schemas::load().unwrap();
        let mut session = Session::new(fake_client(), schemas.addresses);
        // MenuMods, PlayTime, ChatChecker, SkinData and ChatArea are absent
        let err = session.resolve_signatures().unwrap_err();
        assert!(matches!(err, Error::PatternNotFound(_)));
        session
    }

    #[test]
    fn test_schemas_load() {
        let schemas = Schemas::load().unwrap();
        assert_eq!(schemas.menu.len(), 24);
        assert_eq!(schemas.gameplay.len(), 20);
    }

    #[test]
    fn test_resolves_present_signatures() {
        let session = session();
        let table = session.addresses();
        assert_eq!(table.get("Status"), Some(CODE + 0x100));
        assert_eq!(table.get("Base"), Some(CODE + 0x200));
        assert_eq!(table.get("Rulesets"), Some(CODE + 0x300));
        assert!(table.unresolved().contains(&"SkinData"));
    }

    #[test]
    fn test_read_status() {
        let session = session();
        let schemas = Schemas::load().unwrap();

        let mut status = StatusData::default();
        session.read(&schemas.status, &mut status).unwrap();
        assert_eq!(status.game_status(), GameStatus::Playing);
    }

    #[test]
    fn test_read_menu() {
        let session = session();
        let schemas = Schemas::load().unwrap();

        let mut menu = MenuData::default();
        session.read(&schemas.menu, &mut menu).unwrap();
        assert_eq!(menu.game_status(), GameStatus::Playing);
        assert_eq!(menu.plays, 42);
        assert_eq!(menu.artist, "Camellia");
        assert_eq!(menu.title, "Exit This Earth's Atomosphere");
        assert_eq!(menu.creator, "");
        assert_eq!(menu.ar, 9.3);
        assert_eq!(menu.map_id, 1_234_567);
    }

    #[test]
    fn test_read_gameplay_tolerates_transient_fields() {
        let session = session();
        let schemas = Schemas::load().unwrap();

        let mut gameplay = GameplayData::default();
        let err = session.read(&schemas.gameplay, &mut gameplay).unwrap_err();
        assert!(err.only_within(TRANSIENT_FIELDS), "{}", err);
        assert_eq!(err.len(), 2);

        assert_eq!(gameplay.retries, 3);
        assert_eq!(gameplay.player_name, "peppy");
        assert_eq!(gameplay.hit_miss, 5);
        assert_eq!(gameplay.combo, 321);
        assert_eq!(gameplay.hit_errors, vec![-3, 12]);
        assert_eq!(gameplay.mods(), 72);
        assert_eq!(gameplay.player_hp, 200.0);
        assert_eq!(gameplay.accuracy, 98.5);
    }
}

use serde::Serialize;
use strum::{Display, FromRepr, IntoStaticStr};

/// Screen the client is currently on
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, FromRepr, IntoStaticStr, Display,
)]
#[repr(u32)]
pub enum GameStatus {
    MainMenu = 0,
    EditingMap = 1,
    Playing = 2,
    GameShutdownAnimation = 3,
    SongSelectEdit = 4,
    SongSelect = 5,
    ResultsScreen = 7,
    GameStartupAnimation = 10,
    MultiplayerRooms = 11,
    MultiplayerRoom = 12,
    MultiplayerSongSelect = 13,
    MultiplayerResultsscreen = 14,
    OsuDirect = 15,
    RankingTagCoop = 17,
    RankingTeam = 18,
    ProcessingBeatmaps = 19,
    Tourney = 22,
    #[default]
    Unknown = u32::MAX,
}

impl GameStatus {
    pub fn from_u32(value: u32) -> Self {
        Self::from_repr(value).unwrap_or(Self::Unknown)
    }

    pub fn is_playing(&self) -> bool {
        *self == Self::Playing
    }

    pub fn name(&self) -> &'static str {
        self.into()
    }
}

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

// Map location (node number on the game board)
pub type Location = u32;

/// Map used when the caller does not pick one.
pub const DEFAULT_MAP_ID: u32 = 801;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct GameId(pub u64);

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GameId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(GameId)
    }
}

impl FromStr for PlayerId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(PlayerId)
    }
}

/// Error for wire strings that name no known variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} '{}'", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

// Player roles, matched case-insensitively on the wire
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(try_from = "String")]
pub enum Role {
    Fugitive,
    Detective,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Fugitive => "Fugitive",
            Role::Detective => "Detective",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fugitive" | "mrx" => Ok(Role::Fugitive),
            "detective" => Ok(Role::Detective),
            _ => Err(UnknownVariant {
                kind: "role",
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Server-side game lifecycle.
///
/// `Fugitive` and `Detective` name whose turn it is. Unrecognised values are
/// kept verbatim in `Other` and treated as not playing.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum GameState {
    #[default]
    Waiting,
    Fugitive,
    Detective,
    Over,
    Other(String),
}

impl GameState {
    /// True once the host has started the game and it has not ended.
    pub fn is_playing(&self) -> bool {
        self.turn().is_some()
    }

    /// Role whose turn it is, if the game is in play.
    pub fn turn(&self) -> Option<Role> {
        match self {
            GameState::Fugitive => Some(Role::Fugitive),
            GameState::Detective => Some(Role::Detective),
            _ => None,
        }
    }

    pub fn is_over(&self) -> bool {
        matches!(self, GameState::Over)
    }
}

impl From<String> for GameState {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "waiting" => GameState::Waiting,
            "fugitive" => GameState::Fugitive,
            "detective" => GameState::Detective,
            "over" => GameState::Over,
            _ => GameState::Other(value),
        }
    }
}

impl From<GameState> for String {
    fn from(value: GameState) -> Self {
        match value {
            GameState::Waiting => "Waiting".to_string(),
            GameState::Fugitive => "Fugitive".to_string(),
            GameState::Detective => "Detective".to_string(),
            GameState::Over => "Over".to_string(),
            GameState::Other(s) => s,
        }
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameState::Other(s) => f.write_str(s),
            other => f.write_str(&String::from(other.clone())),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum GameLength {
    Short,
    Long,
}

impl FromStr for GameLength {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "short" => Ok(GameLength::Short),
            "long" => Ok(GameLength::Long),
            _ => Err(UnknownVariant {
                kind: "game length",
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for GameLength {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for GameLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameLength::Short => f.write_str("short"),
            GameLength::Long => f.write_str("long"),
        }
    }
}

// Transport ticket label (taxi, bus, underground, ...)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Ticket(String);

impl Ticket {
    pub const TAXI: &'static str = "Taxi";
    pub const BUS: &'static str = "Bus";
    pub const UNDERGROUND: &'static str = "Underground";

    /// Trimmed ticket label, `None` when blank.
    pub fn new(label: impl AsRef<str>) -> Option<Self> {
        let label = label.as_ref().trim();
        if label.is_empty() {
            None
        } else {
            Some(Self(label.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub player_id: PlayerId,
    #[serde(default)]
    pub player_name: String,
    #[serde(default, deserialize_with = "lenient_role", skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_id: Option<GameId>,
}

/// A game as reported by `GET /games` and `GET /games/{id}`.
///
/// Everything but the identifier may be missing on the wire.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub game_id: GameId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_length: Option<GameLength>,
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default)]
    pub state: GameState,
    #[serde(default, deserialize_with = "lenient_role", skip_serializing_if = "Option::is_none")]
    pub winner: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_id: Option<PlayerId>,
}

impl Game {
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.player_id == id)
    }

    pub fn fugitive(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.role == Some(Role::Fugitive))
    }

    pub fn detectives(&self) -> impl Iterator<Item = &Player> {
        self.players
            .iter()
            .filter(|p| p.role == Some(Role::Detective))
    }

    /// Host as announced by the server, falling back to the earliest joiner.
    pub fn host(&self) -> Option<PlayerId> {
        self.host_id
            .or_else(|| self.players.first().map(|p| p.player_id))
    }

    pub fn display_name(&self) -> &str {
        self.game_name.as_deref().unwrap_or("Unnamed Game")
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct GameList {
    #[serde(default)]
    pub games: Vec<Game>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameRequest {
    pub name: String,
    pub game_length: GameLength,
    pub map_id: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameResponse {
    pub game_id: GameId,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JoinGameRequest {
    pub player_name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JoinGameResponse {
    pub player_id: PlayerId,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MoveRequest {
    #[serde(rename = "gameID")]
    pub game_id: GameId,
    pub ticket: Ticket,
    pub destination: Location,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MoveRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket: Option<Ticket>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<Location>,
}

/// `GET /players/{id}/moves`
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MoveHistory {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_location: Option<Location>,
    #[serde(default)]
    pub moves: Vec<MoveRecord>,
}

// Body of write endpoints that only acknowledge
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Ack {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Ack {
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }
}

fn lenient_role<'de, D>(deserializer: D) -> Result<Option<Role>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()))
}

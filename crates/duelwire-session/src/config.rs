//! Session configuration and the deck it submits.

use serde::{Deserialize, Serialize};

/// Client version 38.1.8 packed the way the server compares it.
pub const DEFAULT_VERSION: u32 = 38 | 1 << 8 | 8 << 16;

// ---------------------------------------------------------------------------
// Deck
// ---------------------------------------------------------------------------

/// Card codes submitted to the server, in the order they are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    pub main: Vec<u32>,
    pub extra: Vec<u32>,
    #[serde(default)]
    pub side: Vec<u32>,
}

impl Deck {
    pub fn new(main: Vec<u32>, extra: Vec<u32>) -> Self {
        Self {
            main,
            extra,
            side: Vec::new(),
        }
    }

    pub fn with_side(mut self, side: Vec<u32>) -> Self {
        self.side = side;
        self
    }

    /// Main plus extra, the first count in the deck submission.
    pub fn playing_count(&self) -> usize {
        self.main.len() + self.extra.len()
    }

    pub fn is_empty(&self) -> bool {
        self.main.is_empty() && self.extra.is_empty() && self.side.is_empty()
    }
}

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Who we are in the lobby and what we bring.
///
/// Every field has a default, so a config file only needs the parts it
/// changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Display name, at most 19 UTF-16 units survive the 40-byte field.
    pub name: String,

    /// Client version sent in the join request.
    pub version: u32,

    /// Room password / creation string. Empty joins any open room.
    pub room_info: String,

    pub deck: Deck,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            name: "duelwire".into(),
            version: DEFAULT_VERSION,
            room_info: String::new(),
            deck: Deck::default(),
        }
    }
}

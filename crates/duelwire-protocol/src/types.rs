//! Vocabulary shared by the wire layer and the duel mirror.
//!
//! The bitmask types use `bitflags` with unknown bits retained: the
//! server may send bits a newer core introduced, and they must survive
//! a decode/encode trip untouched. Always construct them from wire
//! values with `from_bits_retain`, never `from_bits_truncate`.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// A seat, seen from this client's side of the table.
///
/// The wire always carries the *absolute* seat (0 = whoever went first).
/// Everything above the codec works with the *relative* seat, so the
/// mirror never has to care which side the coin toss put us on. The
/// translation lives in [`Perspective`](crate::Perspective).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    Me = 0,
    Opponent = 1,
}

impl Player {
    /// Both seats, `Me` first. Handy for "reset both sides" loops.
    pub const BOTH: [Player; 2] = [Player::Me, Player::Opponent];

    /// The other seat.
    pub fn opponent(self) -> Self {
        match self {
            Self::Me => Self::Opponent,
            Self::Opponent => Self::Me,
        }
    }

    /// Index into per-player arrays (`0` for `Me`, `1` for `Opponent`).
    pub fn index(self) -> usize {
        self as usize
    }

    pub(crate) fn from_index(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Me),
            1 => Some(Self::Opponent),
            _ => None,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Me => write!(f, "me"),
            Self::Opponent => write!(f, "opponent"),
        }
    }
}

// ---------------------------------------------------------------------------
// Bitmasks
// ---------------------------------------------------------------------------

bitflags! {
    /// Where a card sits.
    ///
    /// One primary bit at a time; `OVERLAY` may be combined with a zone
    /// bit when the card is material attached to a field monster.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Location: u32 {
        const DECK = 0x1;
        const HAND = 0x2;
        const MONSTER_ZONE = 0x4;
        const SPELL_ZONE = 0x8;
        const GRAVE = 0x10;
        const BANISHED = 0x20;
        const EXTRA = 0x40;
        const OVERLAY = 0x80;
        const ON_FIELD = 0x0c;
        const FIELD_ZONE = 0x100;
        const PENDULUM_ZONE = 0x200;
    }
}

bitflags! {
    /// Face-up/face-down times attack/defense.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Position: u32 {
        const FACEUP_ATTACK = 0x1;
        const FACEDOWN_ATTACK = 0x2;
        const FACEUP_DEFENSE = 0x4;
        const FACEDOWN_DEFENSE = 0x8;
        const FACEUP = 0x5;
        const FACEDOWN = 0xa;
        const ATTACK = 0x3;
        const DEFENSE = 0xc;
    }
}

impl Position {
    /// The four concrete positions, in the order the server lists them.
    pub const CONCRETE: [Position; 4] = [
        Position::FACEUP_ATTACK,
        Position::FACEDOWN_ATTACK,
        Position::FACEUP_DEFENSE,
        Position::FACEDOWN_DEFENSE,
    ];

    pub fn is_faceup(self) -> bool {
        self.intersects(Self::FACEUP)
    }
}

bitflags! {
    /// Card type and sub-type bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct CardType: u32 {
        const MONSTER = 0x1;
        const SPELL = 0x2;
        const TRAP = 0x4;
        const NORMAL = 0x10;
        const EFFECT = 0x20;
        const FUSION = 0x40;
        const RITUAL = 0x80;
        const TRAP_MONSTER = 0x100;
        const SPIRIT = 0x200;
        const UNION = 0x400;
        const GEMINI = 0x800;
        const TUNER = 0x1000;
        const SYNCHRO = 0x2000;
        const TOKEN = 0x4000;
        const QUICKPLAY = 0x10000;
        const CONTINUOUS = 0x20000;
        const EQUIP = 0x40000;
        const FIELD = 0x80000;
        const COUNTER = 0x100000;
        const FLIP = 0x200000;
        const TOON = 0x400000;
        const XYZ = 0x800000;
        const PENDULUM = 0x1000000;
        const SPSUMMON = 0x2000000;
        const LINK = 0x4000000;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Attribute: u32 {
        const EARTH = 0x1;
        const WATER = 0x2;
        const FIRE = 0x4;
        const WIND = 0x8;
        const LIGHT = 0x10;
        const DARK = 0x20;
        const DIVINE = 0x40;
    }
}

bitflags! {
    /// Monster race. 64 bits wide since newer cores outgrew 32.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Race: u64 {
        const WARRIOR = 0x1;
        const SPELLCASTER = 0x2;
        const FAIRY = 0x4;
        const FIEND = 0x8;
        const ZOMBIE = 0x10;
        const MACHINE = 0x20;
        const AQUA = 0x40;
        const PYRO = 0x80;
        const ROCK = 0x100;
        const WINGED_BEAST = 0x200;
        const PLANT = 0x400;
        const INSECT = 0x800;
        const THUNDER = 0x1000;
        const DRAGON = 0x2000;
        const BEAST = 0x4000;
        const BEAST_WARRIOR = 0x8000;
        const DINOSAUR = 0x10000;
        const FISH = 0x20000;
        const SEA_SERPENT = 0x40000;
        const REPTILE = 0x80000;
        const PSYCHIC = 0x100000;
        const DIVINE = 0x200000;
        const CREATOR_GOD = 0x400000;
        const WYRM = 0x800000;
        const CYBERSE = 0x1000000;
        const ILLUSION = 0x2000000;
    }
}

bitflags! {
    /// Turn phase. Informational: the client records what the server
    /// announces and never advances it on its own.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Phase: u32 {
        const DRAW = 0x1;
        const STANDBY = 0x2;
        const MAIN1 = 0x4;
        const BATTLE_START = 0x8;
        const BATTLE_STEP = 0x10;
        const DAMAGE = 0x20;
        const DAMAGE_CALC = 0x40;
        const BATTLE = 0x80;
        const MAIN2 = 0x100;
        const END = 0x200;
    }
}

// ---------------------------------------------------------------------------
// LocInfo
// ---------------------------------------------------------------------------

/// The 10-byte card address used all over the game messages:
/// controller (1), location (1), index (4), position (4).
///
/// For overlay material `position` carries the material's sequence
/// under its holder rather than a battle position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocInfo {
    pub controller: Player,
    pub location: Location,
    pub index: u32,
    pub position: Position,
}

impl LocInfo {
    /// Convenience constructor for an address without a position.
    pub fn new(controller: Player, location: Location, index: u32) -> Self {
        Self {
            controller,
            location,
            index,
            position: Position::empty(),
        }
    }
}

impl fmt::Display for LocInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{:#x}[{}]",
            self.controller,
            self.location.bits(),
            self.index
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_opponent_flips_seat() {
        assert_eq!(Player::Me.opponent(), Player::Opponent);
        assert_eq!(Player::Opponent.opponent(), Player::Me);
    }

    #[test]
    fn test_player_index_matches_discriminant() {
        assert_eq!(Player::Me.index(), 0);
        assert_eq!(Player::Opponent.index(), 1);
        assert_eq!(Player::from_index(2), None);
    }

    #[test]
    fn test_location_retains_unknown_bits() {
        let raw = 0x8000_0004;
        let loc = Location::from_bits_retain(raw);
        assert!(loc.contains(Location::MONSTER_ZONE));
        assert_eq!(loc.bits(), raw);
    }

    #[test]
    fn test_position_faceup_covers_both_faceup_positions() {
        assert!(Position::FACEUP_ATTACK.is_faceup());
        assert!(Position::FACEUP_DEFENSE.is_faceup());
        assert!(!Position::FACEDOWN_DEFENSE.is_faceup());
    }

    #[test]
    fn test_location_serializes_by_flag_name() {
        let json = serde_json::to_string(&Location::GRAVE).unwrap();
        assert_eq!(json, "\"GRAVE\"");
        let back: Location = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Location::GRAVE);
    }

    #[test]
    fn test_loc_info_display() {
        let loc = LocInfo::new(Player::Opponent, Location::HAND, 2);
        assert_eq!(loc.to_string(), "opponent:0x2[2]");
    }
}

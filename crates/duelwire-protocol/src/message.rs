//! Message kind identifiers.
//!
//! Three id spaces: client-to-server (`CTOS`), server-to-client
//! (`STOC`), and the game events carried inside `StocMessage::GameMsg`.
//! Decoding goes through `TryFrom<u8>`; an unknown id comes back as the
//! raw byte so the dispatcher can log it and move on.

use std::fmt;

/// Client-to-server message kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CtosMessage {
    Response = 0x01,
    UpdateDeck = 0x02,
    HandResult = 0x03,
    TpResult = 0x04,
    PlayerInfo = 0x10,
    JoinGame = 0x12,
    Surrender = 0x14,
    TimeConfirm = 0x15,
    Chat = 0x16,
    HsReady = 0x22,
    RematchResponse = 0xf0,
}

/// Server-to-client message kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StocMessage {
    GameMsg = 0x01,
    ErrorMsg = 0x02,
    SelectHand = 0x03,
    SelectTp = 0x04,
    ChangeSide = 0x07,
    JoinGame = 0x12,
    TypeChange = 0x13,
    DuelStart = 0x15,
    DuelEnd = 0x16,
    Replay = 0x17,
    TimeLimit = 0x18,
    Chat = 0x19,
    PlayerEnter = 0x20,
    PlayerChange = 0x21,
    WatchChange = 0x22,
    Rematch = 0xf1,
}

impl TryFrom<u8> for StocMessage {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0x01 => Self::GameMsg,
            0x02 => Self::ErrorMsg,
            0x03 => Self::SelectHand,
            0x04 => Self::SelectTp,
            0x07 => Self::ChangeSide,
            0x12 => Self::JoinGame,
            0x13 => Self::TypeChange,
            0x15 => Self::DuelStart,
            0x16 => Self::DuelEnd,
            0x17 => Self::Replay,
            0x18 => Self::TimeLimit,
            0x19 => Self::Chat,
            0x20 => Self::PlayerEnter,
            0x21 => Self::PlayerChange,
            0x22 => Self::WatchChange,
            0xf1 => Self::Rematch,
            other => return Err(other),
        })
    }
}

/// Game events, the inner kind of a `GameMsg` envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum GameMessage {
    Retry = 1,
    Hint = 2,
    Start = 4,
    Win = 5,
    UpdateData = 6,
    UpdateCard = 7,
    SelectBattleCmd = 10,
    SelectIdleCmd = 11,
    SelectEffectYn = 12,
    SelectYesNo = 13,
    SelectOption = 14,
    SelectCard = 15,
    SelectChain = 16,
    SelectPlace = 18,
    SelectPosition = 19,
    SelectTribute = 20,
    SortChain = 21,
    SelectCounter = 22,
    SelectSum = 23,
    SelectDisField = 24,
    SortCard = 25,
    SelectUnselectCard = 26,
    ShuffleDeck = 32,
    ShuffleHand = 33,
    ShuffleSetCard = 36,
    ShuffleExtra = 39,
    NewTurn = 40,
    NewPhase = 41,
    Move = 50,
    PosChange = 53,
    Set = 54,
    Swap = 55,
    Summoning = 60,
    Summoned = 61,
    SpSummoning = 62,
    SpSummoned = 63,
    FlipSummoning = 64,
    FlipSummoned = 65,
    Chaining = 70,
    ChainEnd = 74,
    BecomeTarget = 83,
    Draw = 90,
    Damage = 91,
    Recover = 92,
    Equip = 93,
    LpUpdate = 94,
    Unequip = 95,
    CardTarget = 96,
    CancelTarget = 97,
    PayLpCost = 100,
    AddCounter = 101,
    RemoveCounter = 102,
    Attack = 110,
    Battle = 111,
    AttackDisabled = 112,
    RockPaperScissors = 132,
    AnnounceRace = 140,
    AnnounceAttrib = 141,
    AnnounceCard = 142,
    AnnounceNumber = 143,
    TagSwap = 161,
}

impl GameMessage {
    /// Every event kind this crate knows, in id order.
    pub const ALL: [GameMessage; 61] = [
        Self::Retry,
        Self::Hint,
        Self::Start,
        Self::Win,
        Self::UpdateData,
        Self::UpdateCard,
        Self::SelectBattleCmd,
        Self::SelectIdleCmd,
        Self::SelectEffectYn,
        Self::SelectYesNo,
        Self::SelectOption,
        Self::SelectCard,
        Self::SelectChain,
        Self::SelectPlace,
        Self::SelectPosition,
        Self::SelectTribute,
        Self::SortChain,
        Self::SelectCounter,
        Self::SelectSum,
        Self::SelectDisField,
        Self::SortCard,
        Self::SelectUnselectCard,
        Self::ShuffleDeck,
        Self::ShuffleHand,
        Self::ShuffleSetCard,
        Self::ShuffleExtra,
        Self::NewTurn,
        Self::NewPhase,
        Self::Move,
        Self::PosChange,
        Self::Set,
        Self::Swap,
        Self::Summoning,
        Self::Summoned,
        Self::SpSummoning,
        Self::SpSummoned,
        Self::FlipSummoning,
        Self::FlipSummoned,
        Self::Chaining,
        Self::ChainEnd,
        Self::BecomeTarget,
        Self::Draw,
        Self::Damage,
        Self::Recover,
        Self::Equip,
        Self::LpUpdate,
        Self::Unequip,
        Self::CardTarget,
        Self::CancelTarget,
        Self::PayLpCost,
        Self::AddCounter,
        Self::RemoveCounter,
        Self::Attack,
        Self::Battle,
        Self::AttackDisabled,
        Self::RockPaperScissors,
        Self::AnnounceRace,
        Self::AnnounceAttrib,
        Self::AnnounceCard,
        Self::AnnounceNumber,
        Self::TagSwap,
    ];

    pub fn id(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for GameMessage {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .iter()
            .copied()
            .find(|msg| msg.id() == value)
            .ok_or(value)
    }
}

impl fmt::Display for GameMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl fmt::Display for StocMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

//! Decision requests: what the server asks, and the answers it accepts.
//!
//! Every request type here is decoded from one `GAME_MSG` payload. While
//! decoding, each candidate card is looked up in the mirror and its code
//! recorded there, since a decision request is often the first time the
//! server shows what a face-down card is. A candidate the mirror cannot
//! place is still offered, with no handle.
//!
//! The answer types carry their own wire encoding
//! ([`IdleAction::into_response`] and friends), so the dispatcher never
//! has to know a reply layout.

use duelwire_duel::{CardHandle, Duel};
use duelwire_protocol::{
    Attribute, LocInfo, Location, PacketReader, Player, Position, ProtocolError, Race, Response,
};
use serde::Serialize;

/// `SELECT_YESNO` description code asking whether to replay a battle.
pub const BATTLE_REPLAY: u64 = 30;

const MONSTER_ROW_BITS: u32 = 0x7f;
const SPELL_ROW_SHIFT: u32 = 8;
const SPELL_ROW_BITS: u32 = 0xff;
const OPPONENT_SHIFT: u32 = 16;

// ---------------------------------------------------------------------------
// Candidates
// ---------------------------------------------------------------------------

/// A card the server offers as a choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardChoice {
    pub code: u32,
    pub at: LocInfo,
    /// The mirror's card at `at`, if it holds one.
    pub card: Option<CardHandle>,
}

impl CardChoice {
    fn reveal(duel: &mut Duel, code: u32, at: LocInfo) -> Self {
        let card = match duel.reveal(code, &at) {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!(code, %at, error = %e, "candidate not in mirror");
                None
            }
        };
        Self { code, at, card }
    }

    /// `code, controller, location, index: u32, position: u32`.
    fn read_full(r: &mut PacketReader<'_>, duel: &mut Duel) -> Result<Self, ProtocolError> {
        let code = r.read_u32()?;
        let at = r.read_loc_info()?;
        Ok(Self::reveal(duel, code, at))
    }

    /// `code, controller, location, index: u32`.
    fn read_short(r: &mut PacketReader<'_>, duel: &mut Duel) -> Result<Self, ProtocolError> {
        let code = r.read_u32()?;
        let controller = r.read_player()?;
        let location = r.read_location()?;
        let index = r.read_u32()?;
        Ok(Self::reveal(duel, code, LocInfo::new(controller, location, index)))
    }

    /// `code, controller, location, index: u8`.
    fn read_compact(r: &mut PacketReader<'_>, duel: &mut Duel) -> Result<Self, ProtocolError> {
        let code = r.read_u32()?;
        let controller = r.read_player()?;
        let location = r.read_location()?;
        let index = u32::from(r.read_u8()?);
        Ok(Self::reveal(duel, code, LocInfo::new(controller, location, index)))
    }
}

/// An effect the server offers to activate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Activation {
    pub card: CardChoice,
    /// String id of the effect text.
    pub description: u64,
}

/// A monster that may declare an attack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attacker {
    pub card: CardChoice,
    pub direct_attack: bool,
}

fn read_list<T>(
    r: &mut PacketReader<'_>,
    duel: &mut Duel,
    count: u32,
    mut read: impl FnMut(&mut PacketReader<'_>, &mut Duel) -> Result<T, ProtocolError>,
) -> Result<Vec<T>, ProtocolError> {
    // Counts come off the wire; let the reader's bounds decide.
    let mut items = Vec::new();
    for _ in 0..count {
        items.push(read(r, duel)?);
    }
    Ok(items)
}

fn read_counted<T>(
    r: &mut PacketReader<'_>,
    duel: &mut Duel,
    read: impl FnMut(&mut PacketReader<'_>, &mut Duel) -> Result<T, ProtocolError>,
) -> Result<Vec<T>, ProtocolError> {
    let count = r.read_u32()?;
    read_list(r, duel, count, read)
}

// ---------------------------------------------------------------------------
// Main and battle phase commands
// ---------------------------------------------------------------------------

/// `SELECT_IDLECMD`: the open main-phase actions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IdleRequest {
    pub summonable: Vec<CardChoice>,
    pub special_summonable: Vec<CardChoice>,
    pub repositionable: Vec<CardChoice>,
    pub monster_settable: Vec<CardChoice>,
    pub spell_settable: Vec<CardChoice>,
    pub activatable: Vec<Activation>,
    pub can_battle: bool,
    pub can_end: bool,
    pub can_shuffle: bool,
}

impl IdleRequest {
    pub fn decode(r: &mut PacketReader<'_>, duel: &mut Duel) -> Result<Self, ProtocolError> {
        let _player = r.read_player()?;
        let summonable = read_counted(r, duel, CardChoice::read_short)?;
        let special_summonable = read_counted(r, duel, CardChoice::read_short)?;
        let repositionable = read_counted(r, duel, CardChoice::read_compact)?;
        let monster_settable = read_counted(r, duel, CardChoice::read_short)?;
        let spell_settable = read_counted(r, duel, CardChoice::read_short)?;
        let activatable = read_counted(r, duel, |r, duel| {
            let card = CardChoice::read_short(r, duel)?;
            let description = r.read_u64()?;
            let _mode = r.read_u8()?;
            Ok(Activation { card, description })
        })?;
        Ok(Self {
            summonable,
            special_summonable,
            repositionable,
            monster_settable,
            spell_settable,
            activatable,
            can_battle: r.read_bool()?,
            can_end: r.read_bool()?,
            can_shuffle: r.read_bool()?,
        })
    }
}

/// A main-phase command. Indices point into the matching list of the
/// [`IdleRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleAction {
    Summon(usize),
    SpecialSummon(usize),
    Reposition(usize),
    MonsterSet(usize),
    SpellSet(usize),
    Activate(usize),
    ToBattle,
    End,
    Shuffle,
}

impl IdleAction {
    pub fn into_response(self) -> Response {
        match self {
            Self::Summon(i) => Response::command(i, 0),
            Self::SpecialSummon(i) => Response::command(i, 1),
            Self::Reposition(i) => Response::command(i, 2),
            Self::MonsterSet(i) => Response::command(i, 3),
            Self::SpellSet(i) => Response::command(i, 4),
            Self::Activate(i) => Response::command(i, 5),
            Self::ToBattle => Response::command(0, 6),
            Self::End => Response::command(0, 7),
            Self::Shuffle => Response::command(0, 8),
        }
    }
}

/// `SELECT_BATTLECMD`: the open battle-phase actions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BattleRequest {
    pub activatable: Vec<Activation>,
    pub attackable: Vec<Attacker>,
    pub can_main2: bool,
    pub can_end: bool,
}

impl BattleRequest {
    pub fn decode(r: &mut PacketReader<'_>, duel: &mut Duel) -> Result<Self, ProtocolError> {
        let _player = r.read_player()?;
        let activatable = read_counted(r, duel, |r, duel| {
            let card = CardChoice::read_short(r, duel)?;
            let description = r.read_u64()?;
            let _mode = r.read_u8()?;
            Ok(Activation { card, description })
        })?;
        let attackable = read_counted(r, duel, |r, duel| {
            let card = CardChoice::read_compact(r, duel)?;
            let direct_attack = r.read_bool()?;
            if let Some(handle) = card.card {
                if let Err(e) = duel.ready_attacker(handle, direct_attack) {
                    tracing::warn!(%handle, error = %e, "attacker vanished from mirror");
                }
            }
            Ok(Attacker {
                card,
                direct_attack,
            })
        })?;
        Ok(Self {
            activatable,
            attackable,
            can_main2: r.read_bool()?,
            can_end: r.read_bool()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleAction {
    Activate(usize),
    Attack(usize),
    ToMain2,
    End,
}

impl BattleAction {
    pub fn into_response(self) -> Response {
        match self {
            Self::Activate(i) => Response::command(i, 0),
            Self::Attack(i) => Response::command(i, 1),
            Self::ToMain2 => Response::command(0, 2),
            Self::End => Response::command(0, 3),
        }
    }
}

// ---------------------------------------------------------------------------
// Yes/no and options
// ---------------------------------------------------------------------------

/// `SELECT_EFFECTYN`: activate this card's effect now?
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectYnRequest {
    pub card: CardChoice,
    pub description: u64,
}

impl EffectYnRequest {
    pub fn decode(r: &mut PacketReader<'_>, duel: &mut Duel) -> Result<Self, ProtocolError> {
        let _player = r.read_player()?;
        let card = CardChoice::read_full(r, duel)?;
        Ok(Self {
            card,
            description: r.read_u64()?,
        })
    }
}

/// `SELECT_YESNO`: a bare question identified by its description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YesNoRequest {
    pub description: u64,
}

impl YesNoRequest {
    pub fn decode(r: &mut PacketReader<'_>) -> Result<Self, ProtocolError> {
        let _player = r.read_player()?;
        Ok(Self {
            description: r.read_u64()?,
        })
    }

    pub fn is_battle_replay(&self) -> bool {
        self.description == BATTLE_REPLAY
    }
}

/// `SELECT_OPTION`: pick one of several effect texts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionRequest {
    pub options: Vec<u64>,
}

impl OptionRequest {
    pub fn decode(r: &mut PacketReader<'_>) -> Result<Self, ProtocolError> {
        let _player = r.read_player()?;
        let count = r.read_u8()?;
        let options = (0..count).map(|_| r.read_u64()).collect::<Result<_, _>>()?;
        Ok(Self { options })
    }
}

// ---------------------------------------------------------------------------
// Card selections
// ---------------------------------------------------------------------------

/// `SELECT_CARD` and `SELECT_TRIBUTE`: choose between `min` and `max`
/// of the offered cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectCardRequest {
    pub cancelable: bool,
    pub min: u32,
    pub max: u32,
    pub choices: Vec<CardChoice>,
    /// The last `HINT_SELECT` text, saying what the selection is for.
    pub hint: u64,
}

impl SelectCardRequest {
    pub fn decode(r: &mut PacketReader<'_>, duel: &mut Duel) -> Result<Self, ProtocolError> {
        Self::decode_with(r, duel, CardChoice::read_full)
    }

    /// Tribute candidates trade the position for a release parameter.
    pub fn decode_tribute(r: &mut PacketReader<'_>, duel: &mut Duel) -> Result<Self, ProtocolError> {
        Self::decode_with(r, duel, |r, duel| {
            let card = CardChoice::read_short(r, duel)?;
            let _release_param = r.read_u8()?;
            Ok(card)
        })
    }

    fn decode_with(
        r: &mut PacketReader<'_>,
        duel: &mut Duel,
        read: impl FnMut(&mut PacketReader<'_>, &mut Duel) -> Result<CardChoice, ProtocolError>,
    ) -> Result<Self, ProtocolError> {
        let _player = r.read_player()?;
        let cancelable = r.read_bool()?;
        let min = r.read_u32()?;
        let max = r.read_u32()?;
        let choices = read_counted(r, duel, read)?;
        Ok(Self {
            cancelable,
            min,
            max,
            choices,
            hint: duel.select_hint(),
        })
    }

    /// The first `min` candidates.
    pub fn first_min(&self) -> Vec<usize> {
        (0..self.choices.len()).take(self.min as usize).collect()
    }
}

/// `SELECT_UNSELECT_CARD`: one step of an incremental selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnselectRequest {
    /// The selection already satisfies the minimum and may stop here.
    pub finishable: bool,
    pub cancelable: bool,
    pub min: u32,
    pub max: u32,
    pub selectable: Vec<CardChoice>,
    /// Cards picked in earlier steps that may be taken back.
    pub unselectable: Vec<CardChoice>,
    pub hint: u64,
}

impl UnselectRequest {
    pub fn decode(r: &mut PacketReader<'_>, duel: &mut Duel) -> Result<Self, ProtocolError> {
        let _player = r.read_player()?;
        let finishable = r.read_bool()?;
        let cancelable = r.read_bool()? || finishable;
        let min = r.read_u32()?;
        let max = r.read_u32()?;
        let selectable = read_counted(r, duel, CardChoice::read_full)?;
        let unselectable = read_counted(r, duel, CardChoice::read_full)?;
        Ok(Self {
            finishable,
            cancelable,
            min,
            max,
            selectable,
            unselectable,
            hint: duel.select_hint(),
        })
    }
}

/// `SELECT_CHAIN`: respond to the current chain, or pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainRequest {
    pub special_count: u8,
    /// Passing is not allowed.
    pub forced: bool,
    pub hint_timing: u32,
    pub other_timing: u32,
    pub choices: Vec<Activation>,
}

impl ChainRequest {
    pub fn decode(r: &mut PacketReader<'_>, duel: &mut Duel) -> Result<Self, ProtocolError> {
        let _player = r.read_player()?;
        let special_count = r.read_u8()?;
        let forced = r.read_bool()?;
        let hint_timing = r.read_u32()?;
        let other_timing = r.read_u32()?;
        let choices = read_counted(r, duel, |r, duel| {
            let card = CardChoice::read_full(r, duel)?;
            let description = r.read_u64()?;
            let _mode = r.read_u8()?;
            Ok(Activation { card, description })
        })?;
        Ok(Self {
            special_count,
            forced,
            hint_timing,
            other_timing,
            choices,
        })
    }
}

/// One candidate of a `SELECT_COUNTER` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterChoice {
    pub card: CardChoice,
    /// Counters of the requested type on the card.
    pub available: u16,
}

/// `SELECT_COUNTER`: remove `quantity` counters spread over the cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterRequest {
    pub counter: u16,
    pub quantity: u32,
    pub choices: Vec<CounterChoice>,
}

impl CounterRequest {
    pub fn decode(r: &mut PacketReader<'_>, duel: &mut Duel) -> Result<Self, ProtocolError> {
        let _player = r.read_player()?;
        let counter = r.read_u16()?;
        let quantity = r.read_u32()?;
        let count = u32::from(r.read_u8()?);
        let choices = read_list(r, duel, count, |r, duel| {
            let card = CardChoice::read_compact(r, duel)?;
            Ok(CounterChoice {
                card,
                available: r.read_u16()?,
            })
        })?;
        Ok(Self {
            counter,
            quantity,
            choices,
        })
    }

    /// Takes counters from each card in order until `quantity` is met.
    pub fn greedy(&self) -> Vec<u16> {
        let mut left = self.quantity;
        self.choices
            .iter()
            .map(|choice| {
                let take = left.min(u32::from(choice.available));
                left -= take;
                take as u16
            })
            .collect()
    }
}

/// One candidate of a `SELECT_SUM` request with its two possible values
/// (most cards only use the first).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SumChoice {
    pub card: CardChoice,
    pub values: (u16, u16),
}

/// `SELECT_SUM`: pick cards whose values add up to `sum`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SumRequest {
    /// The total must be hit exactly rather than reached.
    pub exact: bool,
    pub sum: u32,
    pub min: u32,
    pub max: u32,
    /// Cards that are always part of the selection.
    pub must: Vec<SumChoice>,
    pub choices: Vec<SumChoice>,
}

impl SumRequest {
    pub fn decode(r: &mut PacketReader<'_>, duel: &mut Duel) -> Result<Self, ProtocolError> {
        let _player = r.read_player()?;
        let exact = !r.read_bool()?;
        let sum = r.read_u32()?;
        let min = r.read_u32()?;
        let max = r.read_u32()?;
        let read = |r: &mut PacketReader<'_>, duel: &mut Duel| -> Result<SumChoice, ProtocolError> {
            let card = CardChoice::read_short(r, duel)?;
            let values = (r.read_u16()?, r.read_u16()?);
            Ok(SumChoice { card, values })
        };
        let must = read_counted(r, duel, read)?;
        let choices = read_counted(r, duel, read)?;
        Ok(Self {
            exact,
            sum,
            min,
            max,
            must,
            choices,
        })
    }

    /// What the optional cards still have to add up to.
    pub fn remaining(&self) -> u32 {
        let fixed: u32 = self
            .must
            .iter()
            .map(|c| u32::from(c.values.0.max(c.values.1)))
            .sum();
        self.sum.saturating_sub(fixed)
    }

    /// Adds optional cards in order until the remaining total is reached.
    pub fn greedy(&self) -> Vec<usize> {
        let target = self.remaining();
        let mut total = 0;
        let mut picked = Vec::new();
        for (i, choice) in self.choices.iter().enumerate() {
            if total >= target && picked.len() >= self.min as usize {
                break;
            }
            total += u32::from(choice.values.0);
            picked.push(i);
        }
        picked
    }

    /// Reply indices cover the mandatory cards first, then the picks.
    pub(crate) fn into_response(&self, picked: &[usize]) -> Response {
        let must = self.must.len();
        let indices = (0..must)
            .chain(picked.iter().map(|i| must + i))
            .map(|i| i as u32)
            .collect();
        Response::Cards(indices)
    }
}

/// `SORT_CARD`: put the cards in an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortRequest {
    pub choices: Vec<CardChoice>,
}

impl SortRequest {
    pub fn decode(r: &mut PacketReader<'_>, duel: &mut Duel) -> Result<Self, ProtocolError> {
        let _player = r.read_player()?;
        let count = r.read_u32()?;
        // The reply names each card by a single byte.
        if count > SortRequest::MAX_CARDS {
            return Err(ProtocolError::InvalidMessage(format!(
                "cannot sort {count} cards, at most {} fit a reply",
                SortRequest::MAX_CARDS
            )));
        }
        let choices = read_list(r, duel, count, CardChoice::read_short)?;
        Ok(Self { choices })
    }

    /// The largest list a byte-per-card reply can order.
    pub const MAX_CARDS: u32 = u8::MAX as u32 + 1;

    /// The order the server listed them in.
    pub fn as_listed(&self) -> Vec<u8> {
        (0..=u8::MAX).take(self.choices.len()).collect()
    }
}

// ---------------------------------------------------------------------------
// Zones and positions
// ---------------------------------------------------------------------------

/// One free zone a card can go to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlaceChoice {
    pub player: Player,
    pub location: Location,
    pub slot: u8,
}

impl PlaceChoice {
    pub fn into_response(self) -> Response {
        Response::Place {
            player: self.player,
            location: self.location,
            slot: self.slot,
        }
    }
}

/// `SELECT_PLACE` and `SELECT_DISFIELD`: choose a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlaceRequest {
    pub count: u8,
    /// Zone bits that may be chosen. The wire sends the blocked ones.
    pub selectable: u32,
    /// The zone is being disabled rather than filled.
    pub disable: bool,
}

impl PlaceRequest {
    pub fn decode(r: &mut PacketReader<'_>, disable: bool) -> Result<Self, ProtocolError> {
        let _player = r.read_player()?;
        let count = r.read_u8()?;
        let blocked = r.read_u32()?;
        Ok(Self {
            count,
            selectable: !blocked,
            disable,
        })
    }

    /// Every selectable zone: our monsters, our spells, then the
    /// opponent's in the same order.
    pub fn zones(&self) -> impl Iterator<Item = PlaceChoice> + '_ {
        [Player::Me, Player::Opponent]
            .into_iter()
            .flat_map(move |player| {
                let shift = if player == Player::Me { 0 } else { OPPONENT_SHIFT };
                let side = self.selectable >> shift;
                let monsters = (0..7u8)
                    .filter(move |slot| side & MONSTER_ROW_BITS & (1 << slot) != 0)
                    .map(move |slot| PlaceChoice {
                        player,
                        location: Location::MONSTER_ZONE,
                        slot,
                    });
                let spells = (0..8u8)
                    .filter(move |slot| (side >> SPELL_ROW_SHIFT) & SPELL_ROW_BITS & (1 << slot) != 0)
                    .map(move |slot| PlaceChoice {
                        player,
                        location: Location::SPELL_ZONE,
                        slot,
                    });
                monsters.chain(spells)
            })
    }
}

/// `SELECT_POSITION`: the battle positions a card may take.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionRequest {
    pub code: u32,
    pub positions: Vec<Position>,
}

impl PositionRequest {
    pub fn decode(r: &mut PacketReader<'_>) -> Result<Self, ProtocolError> {
        let _player = r.read_player()?;
        let code = r.read_u32()?;
        let allowed = r.read_position_u8()?;
        let positions = Position::CONCRETE
            .into_iter()
            .filter(|p| allowed.contains(*p))
            .collect();
        Ok(Self { code, positions })
    }
}

// ---------------------------------------------------------------------------
// Announcements
// ---------------------------------------------------------------------------

/// `ANNOUNCE_RACE`: declare `count` races out of `available`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RaceRequest {
    pub count: u8,
    pub available: Race,
}

impl RaceRequest {
    pub fn decode(r: &mut PacketReader<'_>) -> Result<Self, ProtocolError> {
        let _player = r.read_player()?;
        Ok(Self {
            count: r.read_u8()?,
            available: Race::from_bits_retain(u64::from(r.read_u32()?)),
        })
    }

    pub fn lowest(&self) -> Race {
        Race::from_bits_retain(lowest_bits(self.available.bits(), self.count))
    }
}

/// `ANNOUNCE_ATTRIB`: declare `count` attributes out of `available`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AttributeRequest {
    pub count: u8,
    pub available: Attribute,
}

impl AttributeRequest {
    pub fn decode(r: &mut PacketReader<'_>) -> Result<Self, ProtocolError> {
        let _player = r.read_player()?;
        Ok(Self {
            count: r.read_u8()?,
            available: Attribute::from_bits_retain(r.read_u32()?),
        })
    }

    pub fn lowest(&self) -> Attribute {
        Attribute::from_bits_retain(lowest_bits(u64::from(self.available.bits()), self.count) as u32)
    }
}

fn lowest_bits(mut available: u64, count: u8) -> u64 {
    let mut chosen = 0;
    for _ in 0..count {
        if available == 0 {
            break;
        }
        let bit = available & available.wrapping_neg();
        chosen |= bit;
        available &= !bit;
    }
    chosen
}

/// `ANNOUNCE_NUMBER`: pick one of the offered numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NumberRequest {
    pub options: Vec<u32>,
}

impl NumberRequest {
    pub fn decode(r: &mut PacketReader<'_>) -> Result<Self, ProtocolError> {
        let _player = r.read_player()?;
        let count = r.read_u8()?;
        let options = (0..count).map(|_| r.read_u32()).collect::<Result<_, _>>()?;
        Ok(Self { options })
    }
}

/// `ANNOUNCE_CARD`: name a card matching the filter program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardNameRequest {
    /// The server's filter, as a stack-machine program.
    pub opcodes: Vec<u64>,
}

impl CardNameRequest {
    pub fn decode(r: &mut PacketReader<'_>) -> Result<Self, ProtocolError> {
        let _player = r.read_player()?;
        let count = r.read_u8()?;
        let opcodes = (0..count).map(|_| r.read_u64()).collect::<Result<_, _>>()?;
        Ok(Self { opcodes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duelwire_duel::DuelEvent;
    use duelwire_protocol::{PacketWriter, Perspective};

    fn duel() -> Duel {
        let mut duel = Duel::new();
        duel.apply(&DuelEvent::Start {
            first: Player::Me,
            life: [8000, 8000],
            decks: [(40, 0), (40, 0)],
        })
        .unwrap();
        duel.apply(&DuelEvent::Draw {
            player: Player::Me,
            count: 5,
        })
        .unwrap();
        duel
    }

    fn reader(w: &PacketWriter) -> PacketReader<'_> {
        PacketReader::new(w.as_bytes()).with_perspective(Perspective::default())
    }

    fn short(w: &mut PacketWriter, code: u32, location: Location, index: u32) {
        w.write_u32(code);
        w.write_player(Player::Me);
        w.write_u8(location.bits() as u8);
        w.write_u32(index);
    }

    #[test]
    fn test_idle_request_reveals_candidates() {
        let mut duel = duel();
        let mut w = PacketWriter::new();
        w.write_player(Player::Me);
        w.write_u32(1);
        short(&mut w, 89631139, Location::HAND, 0);
        for _ in 0..4 {
            w.write_u32(0);
        }
        w.write_u32(1);
        short(&mut w, 5318639, Location::HAND, 1);
        w.write_u64(5318639 << 4);
        w.write_u8(0);
        w.write_bool(true);
        w.write_bool(true);
        w.write_bool(false);

        let mut r = reader(&w);
        let request = IdleRequest::decode(&mut r, &mut duel).unwrap();
        assert!(r.is_empty());
        assert_eq!(request.summonable.len(), 1);
        assert_eq!(request.activatable[0].description, 5318639 << 4);
        assert!(request.can_battle && request.can_end && !request.can_shuffle);

        let handle = request.summonable[0].card.unwrap();
        assert_eq!(duel.card(handle).unwrap().id, 89631139);
    }

    #[test]
    fn test_candidate_missing_from_mirror_has_no_handle() {
        let mut duel = duel();
        let mut w = PacketWriter::new();
        w.write_player(Player::Me);
        w.write_bool(false);
        w.write_u32(1);
        w.write_u32(1);
        w.write_u32(1);
        w.write_u32(42);
        w.write_player(Player::Opponent);
        w.write_u8(Location::GRAVE.bits() as u8);
        w.write_u32(9);
        w.write_u32(Position::FACEUP_ATTACK.bits());

        let request = SelectCardRequest::decode(&mut reader(&w), &mut duel).unwrap();
        assert_eq!(request.choices[0].card, None);
        assert_eq!(request.choices[0].code, 42);
        assert_eq!(request.first_min(), vec![0]);
    }

    #[test]
    fn test_idle_and_battle_actions_encode_commands() {
        assert_eq!(IdleAction::Activate(2).into_response(), Response::Int(0x0002_0005));
        assert_eq!(IdleAction::ToBattle.into_response(), Response::Int(6));
        assert_eq!(IdleAction::End.into_response(), Response::Int(7));
        assert_eq!(BattleAction::Attack(1).into_response(), Response::Int(0x0001_0001));
        assert_eq!(BattleAction::End.into_response(), Response::Int(3));
    }

    #[test]
    fn test_place_request_lists_free_zones() {
        let mut w = PacketWriter::new();
        w.write_player(Player::Me);
        w.write_u8(1);
        // everything blocked except our monster zone 2 and the
        // opponent's spell zone 0
        w.write_u32(!(0x4 | (0x100 << 16)));
        let request = PlaceRequest::decode(&mut reader(&w), false).unwrap();
        let zones: Vec<_> = request.zones().collect();
        assert_eq!(
            zones,
            vec![
                PlaceChoice {
                    player: Player::Me,
                    location: Location::MONSTER_ZONE,
                    slot: 2
                },
                PlaceChoice {
                    player: Player::Opponent,
                    location: Location::SPELL_ZONE,
                    slot: 0
                },
            ]
        );
    }

    #[test]
    fn test_sort_request_lists_in_order() {
        let mut duel = duel();
        let mut w = PacketWriter::new();
        w.write_player(Player::Me);
        w.write_u32(3);
        for index in 0..3 {
            short(&mut w, 0, Location::HAND, index);
        }
        let request = SortRequest::decode(&mut reader(&w), &mut duel).unwrap();
        assert_eq!(request.as_listed(), vec![0, 1, 2]);
    }

    #[test]
    fn test_sort_request_too_long_for_reply_fails() {
        let mut duel = duel();
        let mut w = PacketWriter::new();
        w.write_player(Player::Me);
        w.write_u32(SortRequest::MAX_CARDS + 1);
        let err = SortRequest::decode(&mut reader(&w), &mut duel).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidMessage(_)));
    }

    #[test]
    fn test_position_request_filters_concrete_positions() {
        let mut w = PacketWriter::new();
        w.write_player(Player::Me);
        w.write_u32(1);
        w.write_u8(0x5);
        let request = PositionRequest::decode(&mut reader(&w)).unwrap();
        assert_eq!(
            request.positions,
            vec![Position::FACEUP_ATTACK, Position::FACEUP_DEFENSE]
        );
    }

    #[test]
    fn test_counter_greedy_spreads_quantity() {
        let choice = |available| CounterChoice {
            card: CardChoice {
                code: 1,
                at: LocInfo::new(Player::Me, Location::SPELL_ZONE, 0),
                card: None,
            },
            available,
        };
        let request = CounterRequest {
            counter: 1,
            quantity: 5,
            choices: vec![choice(3), choice(1), choice(4)],
        };
        assert_eq!(request.greedy(), vec![3, 1, 1]);
    }

    #[test]
    fn test_sum_reply_puts_must_cards_first() {
        let choice = |value| SumChoice {
            card: CardChoice {
                code: 1,
                at: LocInfo::new(Player::Me, Location::HAND, 0),
                card: None,
            },
            values: (value, 0),
        };
        let request = SumRequest {
            exact: true,
            sum: 8,
            min: 1,
            max: 3,
            must: vec![choice(4)],
            choices: vec![choice(2), choice(2), choice(6)],
        };
        assert_eq!(request.remaining(), 4);
        let picked = request.greedy();
        assert_eq!(picked, vec![0, 1]);
        assert_eq!(request.into_response(&picked), Response::Cards(vec![0, 1, 2]));
    }

    #[test]
    fn test_announce_lowest_bits() {
        let races = RaceRequest {
            count: 2,
            available: Race::DRAGON | Race::WARRIOR | Race::FIEND,
        };
        assert_eq!(races.lowest(), Race::WARRIOR | Race::FIEND);
        let attributes = AttributeRequest {
            count: 3,
            available: Attribute::DARK,
        };
        assert_eq!(attributes.lowest(), Attribute::DARK);
    }

    #[test]
    fn test_yes_no_battle_replay() {
        let mut w = PacketWriter::new();
        w.write_player(Player::Me);
        w.write_u64(BATTLE_REPLAY);
        assert!(YesNoRequest::decode(&mut reader(&w)).unwrap().is_battle_replay());
    }

    #[test]
    fn test_unselect_finishable_implies_cancelable() {
        let mut duel = duel();
        let mut w = PacketWriter::new();
        w.write_player(Player::Me);
        w.write_bool(true);
        w.write_bool(false);
        w.write_u32(0);
        w.write_u32(2);
        w.write_u32(0);
        w.write_u32(0);
        let request = UnselectRequest::decode(&mut reader(&w), &mut duel).unwrap();
        assert!(request.finishable && request.cancelable);
        assert!(request.selectable.is_empty());
    }
}

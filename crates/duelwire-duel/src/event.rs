//! Decoded game events and how each one lands on the mirror.

use duelwire_protocol::{CardQuery, LocInfo, Location, Phase, Player, Position};

use crate::{Duel, DuelError};

/// Which summon a `*SUMMONING` event announced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummonKind {
    Normal,
    Special,
    Flip,
}

/// One state-changing game event, with player fields already relative.
///
/// The dispatcher decodes these from the wire and feeds them to
/// [`Duel::apply`] in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum DuelEvent {
    /// A new duel. `life` and `decks` are indexed by relative player;
    /// each deck entry is `(main, extra)`.
    Start {
        first: Player,
        life: [u32; 2],
        decks: [(u16, u16); 2],
    },
    /// `winner` is `None` for a draw.
    Win { winner: Option<Player>, reason: u8 },
    Hint { kind: u8, player: Player, data: u64 },
    NewTurn { player: Player },
    NewPhase { phase: Phase },
    Move {
        code: u32,
        from: LocInfo,
        to: LocInfo,
        reason: u32,
    },
    PosChange {
        code: u32,
        at: LocInfo,
        position: Position,
    },
    Swap {
        first: (u32, LocInfo),
        second: (u32, LocInfo),
    },
    Summoning {
        kind: SummonKind,
        code: u32,
        at: LocInfo,
    },
    Summoned { kind: SummonKind },
    Chaining { code: u32, at: LocInfo, player: Player },
    ChainEnd,
    BecomeTarget { targets: Vec<LocInfo> },
    Draw { player: Player, count: u32 },
    /// Battle damage, effect damage and life point costs alike.
    Damage { player: Player, amount: u32 },
    Recover { player: Player, amount: u32 },
    LpUpdate { player: Player, life: u32 },
    Equip { equip: LocInfo, target: LocInfo },
    Unequip { equip: LocInfo },
    CardTarget { source: LocInfo, target: LocInfo },
    CancelTarget { source: LocInfo, target: LocInfo },
    /// `defender` is `None` for a direct attack.
    Attack {
        attacker: LocInfo,
        defender: Option<LocInfo>,
    },
    Battle,
    AttackDisabled,
    ShuffleDeck { player: Player },
    ShuffleHand { player: Player, codes: Vec<u32> },
    ShuffleExtra { player: Player, codes: Vec<u32> },
    ShuffleSetCard {
        before: Vec<LocInfo>,
        after: Vec<LocInfo>,
    },
    UpdateData {
        player: Player,
        location: Location,
        slots: Vec<Option<Vec<CardQuery>>>,
    },
    UpdateCard { at: LocInfo, queries: Vec<CardQuery> },
    AddCounter { at: LocInfo, kind: u16, count: u16 },
    RemoveCounter { at: LocInfo, kind: u16, count: u16 },
}

impl Duel {
    /// Applies one event.
    ///
    /// On error the mirror is left consistent but may lag the server;
    /// callers log and carry on with the next event.
    pub fn apply(&mut self, event: &DuelEvent) -> Result<(), DuelError> {
        match event {
            DuelEvent::Start { first, life, decks } => self.start(*first, *life, *decks),
            DuelEvent::Win { winner, .. } => self.finish(*winner),
            DuelEvent::Hint { kind, data, .. } => self.hint(*kind, *data),
            DuelEvent::NewTurn { player } => self.new_turn(*player),
            DuelEvent::NewPhase { phase } => self.new_phase(*phase),
            DuelEvent::Move { code, from, to, .. } => self.move_card(*code, from, to)?,
            DuelEvent::PosChange { code, at, position } => self.change_position(*code, at, *position)?,
            DuelEvent::Swap { first, second } => {
                self.swap((first.0, &first.1), (second.0, &second.1))?;
            }
            DuelEvent::Summoning { code, at, .. } => self.begin_summon(*code, at)?,
            DuelEvent::Summoned { kind } => self.finish_summon(*kind == SummonKind::Special),
            DuelEvent::Chaining { code, at, player } => self.chaining(*code, at, *player)?,
            DuelEvent::ChainEnd => self.chain_end(),
            DuelEvent::BecomeTarget { targets } => self.become_target(targets)?,
            DuelEvent::Draw { player, count } => self.draw(*player, *count)?,
            DuelEvent::Damage { player, amount } => self.damage(*player, *amount),
            DuelEvent::Recover { player, amount } => self.recover(*player, *amount),
            DuelEvent::LpUpdate { player, life } => self.set_life(*player, *life),
            DuelEvent::Equip { equip, target } => {
                let equip = self.find(equip)?;
                let target = self.find(target)?;
                self.equip(equip, target)?;
            }
            DuelEvent::Unequip { equip } => {
                let equip = self.find(equip)?;
                self.unequip(equip)?;
            }
            DuelEvent::CardTarget { source, target } => {
                let source = self.find(source)?;
                let target = self.find(target)?;
                self.add_target(source, target)?;
            }
            DuelEvent::CancelTarget { source, target } => {
                let source = self.find(source)?;
                let target = self.find(target)?;
                self.cancel_target(source, target)?;
            }
            DuelEvent::Attack { attacker, defender } => self.attack(attacker, defender.as_ref())?,
            DuelEvent::Battle | DuelEvent::AttackDisabled => self.end_battle(),
            DuelEvent::ShuffleDeck { player } => self.shuffle_deck(*player),
            DuelEvent::ShuffleHand { player, codes } => self.shuffle_hand(*player, codes),
            DuelEvent::ShuffleExtra { player, codes } => self.shuffle_extra(*player, codes),
            DuelEvent::ShuffleSetCard { before, after } => self.shuffle_set_cards(before, after)?,
            DuelEvent::UpdateData {
                player,
                location,
                slots,
            } => self.update_location(*player, *location, slots)?,
            DuelEvent::UpdateCard { at, queries } => {
                let card = self.find(at)?;
                self.update_card(card, queries)?;
            }
            DuelEvent::AddCounter { at, kind, count } => self.add_counter(at, *kind, *count)?,
            DuelEvent::RemoveCounter { at, kind, count } => self.remove_counter(at, *kind, *count)?,
        }
        Ok(())
    }
}

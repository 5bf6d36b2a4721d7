//! Cards and the handles that address them.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use duelwire_protocol::{Attribute, CardQuery, CardType, Location, Player, Position, Race};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CardHandle
// ---------------------------------------------------------------------------

/// Index of a card in the duel's arena.
///
/// Handles are never reused within one duel, so a handle to a released
/// card stays stale instead of silently pointing at a newcomer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CardHandle(u32);

impl CardHandle {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    /// Position in the arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for CardHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "card#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Card
// ---------------------------------------------------------------------------

/// Status bit: the card's effects are negated.
pub const STATUS_DISABLED: u32 = 0x1;
/// Status bit: the card was properly summoned.
pub const STATUS_PROC_COMPLETE: u32 = 0x8;

/// Everything the mirror knows about one card.
///
/// A card starts out with id 0 and default attributes, and fills in as
/// the server discloses it. The data fields are public; the relations
/// to other cards are private so that both ends of a link are always
/// updated together through [`Duel`](crate::Duel).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Card {
    /// Card code, 0 while hidden.
    pub id: u32,
    pub alias: u32,
    pub card_type: CardType,
    pub level: u32,
    pub rank: u32,
    pub attribute: Attribute,
    pub race: Race,
    pub attack: i32,
    pub defense: i32,
    pub base_attack: i32,
    pub base_defense: i32,
    pub lscale: u32,
    pub rscale: u32,
    pub link_rating: u32,
    pub link_marker: u32,

    pub controller: Player,
    pub location: Location,
    pub position: Position,
    /// Counter type to count.
    pub counters: BTreeMap<u16, u16>,
    pub status: u32,
    pub reason: u32,
    pub faceup: bool,
    pub special_summoned: bool,
    pub can_direct_attack: bool,
    /// Already declared an attack this phase.
    pub attacked: bool,
    pub public: bool,
    pub hidden: bool,
    pub cover: u32,
    /// Ids of the material stacked under this card, bottom first.
    pub overlays: Vec<u32>,

    target_cards: BTreeSet<CardHandle>,
    targeted_by: BTreeSet<CardHandle>,
    equip_target: Option<CardHandle>,
    equip_cards: BTreeSet<CardHandle>,
    reason_card: Option<CardHandle>,
}

impl Card {
    pub(crate) fn new(controller: Player, location: Location) -> Self {
        Self {
            id: 0,
            alias: 0,
            card_type: CardType::empty(),
            level: 0,
            rank: 0,
            attribute: Attribute::empty(),
            race: Race::empty(),
            attack: 0,
            defense: 0,
            base_attack: 0,
            base_defense: 0,
            lscale: 0,
            rscale: 0,
            link_rating: 0,
            link_marker: 0,
            controller,
            location,
            position: Position::FACEDOWN_ATTACK,
            counters: BTreeMap::new(),
            status: 0,
            reason: 0,
            faceup: false,
            special_summoned: false,
            can_direct_attack: false,
            attacked: false,
            public: false,
            hidden: false,
            cover: 0,
            overlays: Vec::new(),
            target_cards: BTreeSet::new(),
            targeted_by: BTreeSet::new(),
            equip_target: None,
            equip_cards: BTreeSet::new(),
            reason_card: None,
        }
    }

    pub fn is_monster(&self) -> bool {
        self.card_type.contains(CardType::MONSTER)
    }

    pub fn is_spell(&self) -> bool {
        self.card_type.contains(CardType::SPELL)
    }

    pub fn is_trap(&self) -> bool {
        self.card_type.contains(CardType::TRAP)
    }

    pub fn is_attack(&self) -> bool {
        self.position.intersects(Position::ATTACK)
    }

    pub fn is_defense(&self) -> bool {
        self.position.intersects(Position::DEFENSE)
    }

    pub fn is_disabled(&self) -> bool {
        self.status & STATUS_DISABLED != 0
    }

    /// How many counters of `kind` sit on the card.
    pub fn counter(&self, kind: u16) -> u16 {
        self.counters.get(&kind).copied().unwrap_or(0)
    }

    /// Sets the battle position and the face-up flag that follows it.
    pub fn set_position(&mut self, position: Position) {
        self.position = position;
        self.faceup = position.is_faceup();
    }

    /// Cards this one targets.
    pub fn target_cards(&self) -> impl Iterator<Item = CardHandle> + '_ {
        self.target_cards.iter().copied()
    }

    /// Cards targeting this one.
    pub fn targeted_by(&self) -> impl Iterator<Item = CardHandle> + '_ {
        self.targeted_by.iter().copied()
    }

    /// The monster this card is equipped to.
    pub fn equip_target(&self) -> Option<CardHandle> {
        self.equip_target
    }

    /// Cards equipped to this one.
    pub fn equip_cards(&self) -> impl Iterator<Item = CardHandle> + '_ {
        self.equip_cards.iter().copied()
    }

    /// The card responsible for this card's last move.
    pub fn reason_card(&self) -> Option<CardHandle> {
        self.reason_card
    }

    /// Applies a disclosed field that touches only this card.
    ///
    /// Returns `false` for queries that link to other cards; those go
    /// through the duel so the other end is updated too.
    pub(crate) fn apply_query(&mut self, query: &CardQuery) -> bool {
        match query {
            CardQuery::Id(id) => self.id = *id,
            CardQuery::Position(position) => self.set_position(*position),
            CardQuery::Alias(alias) => self.alias = *alias,
            CardQuery::Type(card_type) => self.card_type = *card_type,
            CardQuery::Level(level) => self.level = *level,
            CardQuery::Rank(rank) => self.rank = *rank,
            CardQuery::Attribute(attribute) => self.attribute = *attribute,
            CardQuery::Race(race) => self.race = *race,
            CardQuery::Attack(attack) => self.attack = *attack,
            CardQuery::Defense(defense) => self.defense = *defense,
            CardQuery::BaseAttack(attack) => self.base_attack = *attack,
            CardQuery::BaseDefense(defense) => self.base_defense = *defense,
            CardQuery::Reason(reason) => self.reason = *reason,
            CardQuery::Overlays(ids) => self.overlays = ids.clone(),
            CardQuery::Counters(counters) => {
                self.counters = counters
                    .iter()
                    .filter(|(_, count)| *count > 0)
                    .copied()
                    .collect();
            }
            CardQuery::Controller(player) => self.controller = *player,
            CardQuery::Status(status) => self.status = *status,
            CardQuery::IsPublic(public) => self.public = *public,
            CardQuery::LeftScale(scale) => self.lscale = *scale,
            CardQuery::RightScale(scale) => self.rscale = *scale,
            CardQuery::Link { rating, marker } => {
                self.link_rating = *rating;
                self.link_marker = *marker;
            }
            CardQuery::IsHidden(hidden) => self.hidden = *hidden,
            CardQuery::Cover(cover) => self.cover = *cover,
            CardQuery::ReasonCard(_) | CardQuery::EquipCard(_) | CardQuery::TargetCards(_) => {
                return false;
            }
        }
        true
    }

    // Relation edges. Only `Duel` calls these, always in pairs.

    pub(crate) fn link_target(&mut self, target: CardHandle) {
        self.target_cards.insert(target);
    }

    pub(crate) fn unlink_target(&mut self, target: CardHandle) {
        self.target_cards.remove(&target);
    }

    pub(crate) fn link_targeted_by(&mut self, source: CardHandle) {
        self.targeted_by.insert(source);
    }

    pub(crate) fn unlink_targeted_by(&mut self, source: CardHandle) {
        self.targeted_by.remove(&source);
    }

    pub(crate) fn take_targets(&mut self) -> BTreeSet<CardHandle> {
        std::mem::take(&mut self.target_cards)
    }

    pub(crate) fn take_targeted_by(&mut self) -> BTreeSet<CardHandle> {
        std::mem::take(&mut self.targeted_by)
    }

    pub(crate) fn replace_equip_target(&mut self, target: Option<CardHandle>) -> Option<CardHandle> {
        std::mem::replace(&mut self.equip_target, target)
    }

    pub(crate) fn link_equip(&mut self, equip: CardHandle) {
        self.equip_cards.insert(equip);
    }

    pub(crate) fn unlink_equip(&mut self, equip: CardHandle) {
        self.equip_cards.remove(&equip);
    }

    pub(crate) fn take_equip_cards(&mut self) -> BTreeSet<CardHandle> {
        std::mem::take(&mut self.equip_cards)
    }

    pub(crate) fn set_reason_card(&mut self, card: Option<CardHandle>) {
        self.reason_card = card;
    }
}

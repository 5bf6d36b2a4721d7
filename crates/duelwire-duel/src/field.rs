//! One player's half of the table.

use duelwire_protocol::{Location, Player};
use serde::Serialize;

use crate::{CardHandle, DuelError};

/// Monster zones per side: five main zones and two extra monster zones.
pub const MONSTER_ZONES: usize = 7;
/// Spell/trap zones per side: five columns and the field spell zone.
pub const SPELL_ZONES: usize = 6;

const MONSTER_ZONE_ID: u32 = 0x1;
const SPELL_ZONE_ID: u32 = 0x100;
const OPPONENT_ZONE_SHIFT: u32 = 16;

// ---------------------------------------------------------------------------
// Area
// ---------------------------------------------------------------------------

/// The ordered card lists of a side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pile {
    Deck,
    Hand,
    Extra,
    Grave,
    Banished,
}

/// The fixed zone rows of a side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Row {
    Monster,
    Spell,
}

/// The container a location bitmask refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Area {
    Pile(Pile),
    Row(Row),
}

impl Area {
    /// Resolves the primary category of `location`.
    ///
    /// Modifier bits (overlay, field/pendulum markers) are ignored; an
    /// overlay address names its holder's zone.
    pub fn from_location(location: Location) -> Result<Self, DuelError> {
        match location.bits() & 0x7f {
            0x01 => Ok(Self::Pile(Pile::Deck)),
            0x02 => Ok(Self::Pile(Pile::Hand)),
            0x04 => Ok(Self::Row(Row::Monster)),
            0x08 => Ok(Self::Row(Row::Spell)),
            0x10 => Ok(Self::Pile(Pile::Grave)),
            0x20 => Ok(Self::Pile(Pile::Banished)),
            0x40 => Ok(Self::Pile(Pile::Extra)),
            _ => Err(DuelError::UnknownLocation(location.bits())),
        }
    }

    /// Where a piece of overlay material's holder sits.
    pub(crate) fn holder_row(location: Location) -> Row {
        if location.contains(Location::SPELL_ZONE) {
            Row::Spell
        } else {
            Row::Monster
        }
    }
}

// ---------------------------------------------------------------------------
// Zone
// ---------------------------------------------------------------------------

/// A single field slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Zone {
    id: u32,
    card: Option<CardHandle>,
}

impl Zone {
    fn new(id: u32) -> Self {
        Self { id, card: None }
    }

    /// Bit identifying this slot in place-selection masks.
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn card(&self) -> Option<CardHandle> {
        self.card
    }

    pub fn is_empty(&self) -> bool {
        self.card.is_none()
    }

    pub(crate) fn take(&mut self) -> Option<CardHandle> {
        self.card.take()
    }

    pub(crate) fn replace(&mut self, card: CardHandle) -> Option<CardHandle> {
        self.card.replace(card)
    }
}

// ---------------------------------------------------------------------------
// HalfField
// ---------------------------------------------------------------------------

/// One player's containers plus the combat markers of the current phase.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HalfField {
    hand: Vec<CardHandle>,
    deck: Vec<CardHandle>,
    extra: Vec<CardHandle>,
    grave: Vec<CardHandle>,
    banished: Vec<CardHandle>,
    monster_zones: [Zone; MONSTER_ZONES],
    spell_zones: [Zone; SPELL_ZONES],
    pub(crate) battling_monster: Option<CardHandle>,
    pub(crate) under_attack: bool,
}

impl HalfField {
    pub(crate) fn new(side: Player) -> Self {
        let shift = match side {
            Player::Me => 0,
            Player::Opponent => OPPONENT_ZONE_SHIFT,
        };
        Self {
            hand: Vec::new(),
            deck: Vec::new(),
            extra: Vec::new(),
            grave: Vec::new(),
            banished: Vec::new(),
            monster_zones: std::array::from_fn(|i| Zone::new((MONSTER_ZONE_ID << i) << shift)),
            spell_zones: std::array::from_fn(|i| Zone::new((SPELL_ZONE_ID << i) << shift)),
            battling_monster: None,
            under_attack: false,
        }
    }

    pub fn pile(&self, pile: Pile) -> &[CardHandle] {
        match pile {
            Pile::Deck => &self.deck,
            Pile::Hand => &self.hand,
            Pile::Extra => &self.extra,
            Pile::Grave => &self.grave,
            Pile::Banished => &self.banished,
        }
    }

    pub(crate) fn pile_mut(&mut self, pile: Pile) -> &mut Vec<CardHandle> {
        match pile {
            Pile::Deck => &mut self.deck,
            Pile::Hand => &mut self.hand,
            Pile::Extra => &mut self.extra,
            Pile::Grave => &mut self.grave,
            Pile::Banished => &mut self.banished,
        }
    }

    pub fn row(&self, row: Row) -> &[Zone] {
        match row {
            Row::Monster => &self.monster_zones,
            Row::Spell => &self.spell_zones,
        }
    }

    pub(crate) fn row_mut(&mut self, row: Row) -> &mut [Zone] {
        match row {
            Row::Monster => &mut self.monster_zones,
            Row::Spell => &mut self.spell_zones,
        }
    }

    pub fn hand(&self) -> &[CardHandle] {
        &self.hand
    }

    /// Deck cards, bottom first; the top card is the last one.
    pub fn deck(&self) -> &[CardHandle] {
        &self.deck
    }

    pub fn extra(&self) -> &[CardHandle] {
        &self.extra
    }

    pub fn grave(&self) -> &[CardHandle] {
        &self.grave
    }

    pub fn banished(&self) -> &[CardHandle] {
        &self.banished
    }

    /// All seven monster zones, left to right, extra monster zones last.
    pub fn monster_zones(&self) -> &[Zone] {
        &self.monster_zones
    }

    pub fn main_monster_zones(&self) -> &[Zone] {
        &self.monster_zones[..5]
    }

    pub fn extra_monster_zones(&self) -> &[Zone] {
        &self.monster_zones[5..]
    }

    /// All six spell/trap zones, the field spell zone last.
    pub fn spell_zones(&self) -> &[Zone] {
        &self.spell_zones
    }

    pub fn field_spell_zone(&self) -> &Zone {
        &self.spell_zones[5]
    }

    /// The leftmost and rightmost spell zones double as pendulum zones.
    pub fn pendulum_zones(&self) -> [&Zone; 2] {
        [&self.spell_zones[0], &self.spell_zones[4]]
    }

    /// The monster declared in the current attack, if any.
    pub fn battling_monster(&self) -> Option<CardHandle> {
        self.battling_monster
    }

    /// This side is the target of the current attack.
    pub fn under_attack(&self) -> bool {
        self.under_attack
    }

    /// Cards occupying monster zones.
    pub fn monsters(&self) -> impl Iterator<Item = CardHandle> + '_ {
        self.monster_zones.iter().filter_map(Zone::card)
    }

    /// Cards occupying spell/trap zones.
    pub fn spells(&self) -> impl Iterator<Item = CardHandle> + '_ {
        self.spell_zones.iter().filter_map(Zone::card)
    }

    pub fn monster_count(&self) -> usize {
        self.monsters().count()
    }

    pub fn spell_count(&self) -> usize {
        self.spells().count()
    }

    pub fn field_count(&self) -> usize {
        self.monster_count() + self.spell_count()
    }

    pub fn is_field_empty(&self) -> bool {
        self.field_count() == 0
    }

    /// Returns `true` if any container on this side holds `card`.
    pub fn contains(&self, card: CardHandle) -> bool {
        [&self.hand, &self.deck, &self.extra, &self.grave, &self.banished]
            .iter()
            .any(|pile| pile.contains(&card))
            || self
                .monster_zones
                .iter()
                .chain(&self.spell_zones)
                .any(|zone| zone.card == Some(card))
    }

    /// Drops every reference this side holds to `card`.
    pub(crate) fn detach(&mut self, card: CardHandle) {
        for pile in [
            &mut self.hand,
            &mut self.deck,
            &mut self.extra,
            &mut self.grave,
            &mut self.banished,
        ] {
            pile.retain(|c| *c != card);
        }
        for zone in self.monster_zones.iter_mut().chain(&mut self.spell_zones) {
            if zone.card == Some(card) {
                zone.card = None;
            }
        }
        if self.battling_monster == Some(card) {
            self.battling_monster = None;
        }
    }

    pub(crate) fn clear_combat(&mut self) {
        self.battling_monster = None;
        self.under_attack = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area_from_location_covers_every_category() {
        assert_eq!(Area::from_location(Location::DECK), Ok(Area::Pile(Pile::Deck)));
        assert_eq!(Area::from_location(Location::HAND), Ok(Area::Pile(Pile::Hand)));
        assert_eq!(Area::from_location(Location::MONSTER_ZONE), Ok(Area::Row(Row::Monster)));
        assert_eq!(Area::from_location(Location::SPELL_ZONE), Ok(Area::Row(Row::Spell)));
        assert_eq!(Area::from_location(Location::GRAVE), Ok(Area::Pile(Pile::Grave)));
        assert_eq!(Area::from_location(Location::BANISHED), Ok(Area::Pile(Pile::Banished)));
        assert_eq!(Area::from_location(Location::EXTRA), Ok(Area::Pile(Pile::Extra)));
    }

    #[test]
    fn test_area_from_location_ignores_modifier_bits() {
        let pendulum = Location::SPELL_ZONE | Location::PENDULUM_ZONE;
        assert_eq!(Area::from_location(pendulum), Ok(Area::Row(Row::Spell)));
    }

    #[test]
    fn test_area_from_location_rejects_unknown() {
        assert_eq!(
            Area::from_location(Location::empty()),
            Err(DuelError::UnknownLocation(0))
        );
        assert_eq!(
            Area::from_location(Location::HAND | Location::GRAVE),
            Err(DuelError::UnknownLocation(0x12))
        );
    }

    #[test]
    fn test_half_field_zone_ids() {
        let mine = HalfField::new(Player::Me);
        let theirs = HalfField::new(Player::Opponent);
        assert_eq!(mine.monster_zones()[0].id(), 0x1);
        assert_eq!(mine.monster_zones()[6].id(), 0x40);
        assert_eq!(mine.spell_zones()[0].id(), 0x100);
        assert_eq!(mine.field_spell_zone().id(), 0x2000);
        assert_eq!(theirs.monster_zones()[0].id(), 0x1_0000);
        assert_eq!(theirs.spell_zones()[5].id(), 0x2000_0000);
    }

    #[test]
    fn test_half_field_detach_clears_everywhere() {
        let mut field = HalfField::new(Player::Me);
        let card = CardHandle::new(4);
        field.pile_mut(Pile::Grave).push(card);
        field.row_mut(Row::Monster)[2].replace(card);
        field.battling_monster = Some(card);
        assert!(field.contains(card));

        field.detach(card);
        assert!(!field.contains(card));
        assert_eq!(field.battling_monster(), None);
        assert!(field.monster_zones()[2].is_empty());
    }
}

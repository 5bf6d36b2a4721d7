//! The duel aggregate: both half fields, the card arena, and the
//! cross-cutting turn, chain and summon state.
//!
//! Every mutation here keeps three things true:
//!
//! - a card sits in at most one container;
//! - target and equip links are recorded on both cards or on neither;
//! - a zone holds at most one card, and overlay ids hang off that card.
//!
//! Cards are owned by an arena (`Vec<Option<Card>>`) and referenced by
//! [`CardHandle`]. Releasing a card purges every reference to it, so a
//! relation can never point at a card the mirror no longer holds.

use duelwire_protocol::{CardQuery, LocInfo, Location, Phase, Player, Position};
use serde::{Deserialize, Serialize};

use crate::field::{Area, HalfField, Pile, Zone};
use crate::{Card, CardHandle, DuelError};

/// Starting life points when the server has not said otherwise.
pub const DEFAULT_LIFE: u32 = 8000;

/// HINT kinds the mirror reacts to.
const HINT_EVENT: u8 = 1;
const HINT_SELECT: u8 = 3;
const HINT_EVENT_MAINPHASE_END: u64 = 23;
const HINT_EVENT_BATTLING: u64 = 24;

/// How a duel ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Winner(Player),
    Draw,
}

impl Outcome {
    /// Returns `true` if this client won.
    pub fn is_win(self) -> bool {
        self == Self::Winner(Player::Me)
    }
}

/// The mirror of one duel, always seen from this client's seat.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Duel {
    cards: Vec<Option<Card>>,
    fields: [HalfField; 2],
    first: Player,
    turn: u32,
    turn_player: Player,
    phase: Phase,
    life: [u32; 2],
    summoning: Vec<CardHandle>,
    last_summoned: Vec<CardHandle>,
    last_summon_player: Option<Player>,
    current_chain: Vec<CardHandle>,
    last_chain_player: Option<Player>,
    chain_targets: Vec<CardHandle>,
    current_chain_target: Vec<CardHandle>,
    mainphase_end: bool,
    select_hint: u64,
    outcome: Option<Outcome>,
}

impl Default for Duel {
    fn default() -> Self {
        Self::new()
    }
}

impl Duel {
    pub fn new() -> Self {
        Self {
            cards: Vec::new(),
            fields: [HalfField::new(Player::Me), HalfField::new(Player::Opponent)],
            first: Player::Me,
            turn: 0,
            turn_player: Player::Me,
            phase: Phase::empty(),
            life: [DEFAULT_LIFE; 2],
            summoning: Vec::new(),
            last_summoned: Vec::new(),
            last_summon_player: None,
            current_chain: Vec::new(),
            last_chain_player: None,
            chain_targets: Vec::new(),
            current_chain_target: Vec::new(),
            mainphase_end: false,
            select_hint: 0,
            outcome: None,
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// The card behind `handle`, unless it has been released.
    pub fn card(&self, handle: CardHandle) -> Option<&Card> {
        self.cards.get(handle.index()).and_then(Option::as_ref)
    }

    /// Like [`card`](Self::card), as a `Result`.
    pub fn get(&self, handle: CardHandle) -> Result<&Card, DuelError> {
        self.card(handle).ok_or(DuelError::StaleHandle(handle))
    }

    /// Every live card with its handle, in creation order.
    pub fn cards(&self) -> impl Iterator<Item = (CardHandle, &Card)> + '_ {
        self.cards
            .iter()
            .enumerate()
            .filter_map(|(i, card)| card.as_ref().map(|card| (CardHandle::new(i), card)))
    }

    pub fn field(&self, player: Player) -> &HalfField {
        &self.fields[player.index()]
    }

    /// Resolves an address to the card sitting there.
    ///
    /// Overlay addresses never resolve: material is an id on its holder,
    /// not a card of its own.
    pub fn find(&self, at: &LocInfo) -> Result<CardHandle, DuelError> {
        if at.location.contains(Location::OVERLAY) {
            return Err(DuelError::not_found(at));
        }
        let field = self.field(at.controller);
        let index = at.index as usize;
        let found = match Area::from_location(at.location)? {
            Area::Pile(pile) => field.pile(pile).get(index).copied(),
            Area::Row(row) => field.row(row).get(index).and_then(Zone::card),
        };
        found.ok_or_else(|| DuelError::not_found(at))
    }

    /// Shorthand for [`find`](Self::find) without a position.
    pub fn card_at(&self, player: Player, location: Location, index: u32) -> Option<CardHandle> {
        self.find(&LocInfo::new(player, location, index)).ok()
    }

    /// The cards of one location, in container order. Empty zones are
    /// skipped.
    pub fn cards_at(&self, player: Player, location: Location) -> Vec<CardHandle> {
        let field = self.field(player);
        match Area::from_location(location) {
            Ok(Area::Pile(pile)) => field.pile(pile).to_vec(),
            Ok(Area::Row(row)) => field.row(row).iter().filter_map(Zone::card).collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn life(&self, player: Player) -> u32 {
        self.life[player.index()]
    }

    pub fn first_player(&self) -> Player {
        self.first
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn turn_player(&self) -> Player {
        self.turn_player
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Cards whose summon has been announced but not yet completed.
    pub fn summoning(&self) -> &[CardHandle] {
        &self.summoning
    }

    pub fn last_summoned(&self) -> &[CardHandle] {
        &self.last_summoned
    }

    pub fn last_summon_player(&self) -> Option<Player> {
        self.last_summon_player
    }

    /// Activated cards on the chain, oldest link first.
    pub fn current_chain(&self) -> &[CardHandle] {
        &self.current_chain
    }

    pub fn last_chain_player(&self) -> Option<Player> {
        self.last_chain_player
    }

    /// Every card targeted while the current chain was built.
    pub fn chain_targets(&self) -> &[CardHandle] {
        &self.chain_targets
    }

    /// Cards targeted by the newest chain link.
    pub fn current_chain_target(&self) -> &[CardHandle] {
        &self.current_chain_target
    }

    /// The server has signalled the end of the main phase.
    pub fn mainphase_end(&self) -> bool {
        self.mainphase_end
    }

    /// The last "select" hint, usually a string id explaining the next
    /// prompt.
    pub fn select_hint(&self) -> u64 {
        self.select_hint
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Looks up the card at `at` and records the code the server just
    /// showed for it. A code of 0 leaves the known id alone.
    pub fn reveal(&mut self, code: u32, at: &LocInfo) -> Result<CardHandle, DuelError> {
        let handle = self.find(at)?;
        if code != 0 {
            self.card_mut(handle)?.id = code;
        }
        Ok(handle)
    }

    /// Records that the server offered `handle` as an attacker this step.
    pub fn ready_attacker(&mut self, handle: CardHandle, can_direct_attack: bool) -> Result<(), DuelError> {
        let card = self.card_mut(handle)?;
        card.can_direct_attack = can_direct_attack;
        card.attacked = false;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Arena
    // -----------------------------------------------------------------------

    fn alloc(&mut self, card: Card) -> CardHandle {
        let handle = CardHandle::new(self.cards.len());
        self.cards.push(Some(card));
        handle
    }

    fn slot_mut(&mut self, handle: CardHandle) -> Option<&mut Card> {
        self.cards.get_mut(handle.index()).and_then(Option::as_mut)
    }

    pub(crate) fn card_mut(&mut self, handle: CardHandle) -> Result<&mut Card, DuelError> {
        self.slot_mut(handle).ok_or(DuelError::StaleHandle(handle))
    }

    /// Drops a card and every reference to it.
    fn release(&mut self, handle: CardHandle) {
        let Some(mut card) = self.cards.get_mut(handle.index()).and_then(Option::take) else {
            return;
        };
        for target in card.take_targets() {
            if let Some(other) = self.slot_mut(target) {
                other.unlink_targeted_by(handle);
            }
        }
        for source in card.take_targeted_by() {
            if let Some(other) = self.slot_mut(source) {
                other.unlink_target(handle);
            }
        }
        if let Some(target) = card.replace_equip_target(None) {
            if let Some(other) = self.slot_mut(target) {
                other.unlink_equip(handle);
            }
        }
        for equip in card.take_equip_cards() {
            if let Some(other) = self.slot_mut(equip) {
                other.replace_equip_target(None);
            }
        }
        for other in self.cards.iter_mut().flatten() {
            if other.reason_card() == Some(handle) {
                other.set_reason_card(None);
            }
        }
        for field in &mut self.fields {
            field.detach(handle);
        }
        for list in [
            &mut self.summoning,
            &mut self.last_summoned,
            &mut self.current_chain,
            &mut self.chain_targets,
            &mut self.current_chain_target,
        ] {
            list.retain(|c| *c != handle);
        }
    }

    // -----------------------------------------------------------------------
    // Containers
    // -----------------------------------------------------------------------

    /// Takes the card at `at` out of its container.
    fn lift(&mut self, at: &LocInfo) -> Result<CardHandle, DuelError> {
        let area = Area::from_location(at.location)?;
        let index = at.index as usize;
        let field = &mut self.fields[at.controller.index()];
        let taken = match area {
            Area::Pile(pile) => {
                let cards = field.pile_mut(pile);
                (index < cards.len()).then(|| cards.remove(index))
            }
            Area::Row(row) => field.row_mut(row).get_mut(index).and_then(Zone::take),
        };
        taken.ok_or_else(|| DuelError::not_found(at))
    }

    /// Takes a known card out of the container at `at`. Unlike
    /// [`lift`](Self::lift) this goes by handle, so earlier removals from
    /// the same pile do not shift later ones.
    fn unseat(&mut self, handle: CardHandle, at: &LocInfo) -> Result<(), DuelError> {
        let area = Area::from_location(at.location)?;
        let field = &mut self.fields[at.controller.index()];
        match area {
            Area::Pile(pile) => field.pile_mut(pile).retain(|c| *c != handle),
            Area::Row(row) => {
                if let Some(zone) = field.row_mut(row).get_mut(at.index as usize) {
                    zone.take();
                }
            }
        }
        Ok(())
    }

    /// Whether [`place`](Self::place) would accept `at`.
    fn check_place(&self, at: &LocInfo) -> Result<(), DuelError> {
        match Area::from_location(at.location)? {
            Area::Pile(_) => Ok(()),
            Area::Row(row) if (at.index as usize) < self.field(at.controller).row(row).len() => Ok(()),
            Area::Row(_) => Err(DuelError::out_of_range(at)),
        }
    }

    /// Puts a card that is in no container at `at`.
    ///
    /// Piles grow at the end. A zone that is somehow still occupied
    /// loses its old card, which is released.
    fn place(&mut self, handle: CardHandle, at: &LocInfo) -> Result<(), DuelError> {
        let area = Area::from_location(at.location)?;
        self.get(handle)?;
        let field = &mut self.fields[at.controller.index()];
        let evicted = match area {
            Area::Pile(pile) => {
                field.pile_mut(pile).push(handle);
                None
            }
            Area::Row(row) => field
                .row_mut(row)
                .get_mut(at.index as usize)
                .ok_or_else(|| DuelError::out_of_range(at))?
                .replace(handle),
        };

        let card = self.card_mut(handle)?;
        card.controller = at.controller;
        card.location = at.location;
        card.set_position(at.position);

        if let Some(old) = evicted.filter(|old| *old != handle) {
            tracing::warn!(%old, %at, "zone was still occupied, releasing its card");
            self.release(old);
        }
        Ok(())
    }

    /// The card holding material at an overlay address.
    fn holder(&self, at: &LocInfo) -> Result<CardHandle, DuelError> {
        let row = Area::holder_row(at.location);
        self.field(at.controller)
            .row(row)
            .get(at.index as usize)
            .ok_or_else(|| DuelError::out_of_range(at))?
            .card()
            .ok_or_else(|| DuelError::zone_empty(at))
    }

    fn attach_material(&mut self, at: &LocInfo, code: u32) -> Result<(), DuelError> {
        let holder = self.holder(at)?;
        self.card_mut(holder)?.overlays.push(code);
        Ok(())
    }

    /// Removes one material id from its holder. Matches by id first and
    /// falls back to the overlay sequence carried in `position`.
    fn detach_material(&mut self, at: &LocInfo, code: u32) -> Result<(), DuelError> {
        let holder = self.holder(at)?;
        let card = self.card_mut(holder)?;
        let sequence = at.position.bits() as usize;
        let slot = card
            .overlays
            .iter()
            .position(|id| code != 0 && *id == code)
            .or_else(|| (sequence < card.overlays.len()).then_some(sequence));
        match slot {
            Some(i) => {
                card.overlays.remove(i);
                Ok(())
            }
            None => Err(DuelError::not_found(at)),
        }
    }

    /// Creates hidden cards for a freshly dealt deck.
    pub(crate) fn set_deck(&mut self, player: Player, main: u16, extra: u16) {
        for (pile, count, location) in [
            (Pile::Deck, main, Location::DECK),
            (Pile::Extra, extra, Location::EXTRA),
        ] {
            for _ in 0..count {
                let handle = self.alloc(Card::new(player, location));
                self.fields[player.index()].pile_mut(pile).push(handle);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Moves
    // -----------------------------------------------------------------------

    /// Moves one card between any two addresses.
    ///
    /// The source is resolved before anything about the card changes. A
    /// source the mirror cannot find is logged and a fresh card appears
    /// at the destination, so the mirror converges on what the server
    /// shows.
    pub(crate) fn move_card(&mut self, code: u32, from: &LocInfo, to: &LocInfo) -> Result<(), DuelError> {
        let moving = if from.location.is_empty() {
            None
        } else if from.location.contains(Location::OVERLAY) {
            if let Err(e) = self.detach_material(from, code) {
                tracing::warn!(error = %e, "overlay source missing");
            }
            None
        } else {
            match self.lift(from) {
                Ok(handle) => Some(handle),
                Err(e) => {
                    tracing::warn!(error = %e, %to, "move source missing, creating card at destination");
                    None
                }
            }
        };

        if to.location.contains(Location::OVERLAY) {
            if let Some(handle) = moving {
                self.release(handle);
            }
            return self.attach_material(to, code);
        }
        if to.location.is_empty() {
            if let Some(handle) = moving {
                self.release(handle);
            }
            return Ok(());
        }

        let handle = match moving {
            Some(handle) => handle,
            None => self.alloc(Card::new(to.controller, to.location)),
        };
        self.card_mut(handle)?.id = code;
        if let Err(e) = self.place(handle, to) {
            self.release(handle);
            return Err(e);
        }
        Ok(())
    }

    /// Exchanges two cards, e.g. when control of two monsters swaps.
    ///
    /// Both addresses are checked before either card moves, so a failed
    /// swap leaves the field as it was.
    pub(crate) fn swap(&mut self, first: (u32, &LocInfo), second: (u32, &LocInfo)) -> Result<(), DuelError> {
        let (code_a, at_a) = first;
        let (code_b, at_b) = second;
        let cards = self.resolve_batch(&[*at_a, *at_b], &[*at_b, *at_a])?;
        for (handle, code) in cards.iter().zip([code_a, code_b]) {
            self.card_mut(*handle)?.id = code;
        }
        self.rehome(&cards, &[*at_a, *at_b], &[*at_b, *at_a])
    }

    pub(crate) fn change_position(&mut self, code: u32, at: &LocInfo, position: Position) -> Result<(), DuelError> {
        let handle = self.reveal(code, at)?;
        self.card_mut(handle)?.set_position(position);
        Ok(())
    }

    /// Draws `count` cards from the top of the deck. An empty deck in
    /// the mirror yields hidden placeholder cards.
    pub(crate) fn draw(&mut self, player: Player, count: u32) -> Result<(), DuelError> {
        for _ in 0..count {
            let top = self.fields[player.index()].pile_mut(Pile::Deck).pop();
            let handle = match top {
                Some(handle) => handle,
                None => {
                    tracing::warn!(%player, "draw from an empty mirrored deck");
                    self.alloc(Card::new(player, Location::HAND))
                }
            };
            let card = self.card_mut(handle)?;
            card.controller = player;
            card.location = Location::HAND;
            self.fields[player.index()].pile_mut(Pile::Hand).push(handle);
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Shuffles
    // -----------------------------------------------------------------------

    pub(crate) fn shuffle_deck(&mut self, player: Player) {
        for handle in self.fields[player.index()].deck() {
            if let Some(Some(card)) = self.cards.get_mut(handle.index()) {
                card.id = 0;
            }
        }
    }

    pub(crate) fn shuffle_hand(&mut self, player: Player, codes: &[u32]) {
        let hand = self.fields[player.index()].hand();
        if hand.len() != codes.len() {
            tracing::debug!(%player, mirrored = hand.len(), shown = codes.len(), "hand size differs");
        }
        for (handle, code) in hand.iter().zip(codes) {
            if let Some(Some(card)) = self.cards.get_mut(handle.index()) {
                card.id = *code;
            }
        }
    }

    /// Face-up extra deck cards keep their ids; the codes are for the
    /// face-down ones, in order.
    pub(crate) fn shuffle_extra(&mut self, player: Player, codes: &[u32]) {
        let mut codes = codes.iter();
        for handle in self.fields[player.index()].extra() {
            let Some(Some(card)) = self.cards.get_mut(handle.index()) else {
                continue;
            };
            if card.faceup {
                continue;
            }
            match codes.next() {
                Some(code) => card.id = *code,
                None => break,
            }
        }
    }

    /// Moves a batch of set cards to new addresses at once.
    ///
    /// Every address on both sides is checked first. Then the cards
    /// named in `before` are taken off the field and put down at `after`
    /// in order, with their ids hidden. A rejected batch changes nothing.
    pub(crate) fn shuffle_set_cards(&mut self, before: &[LocInfo], after: &[LocInfo]) -> Result<(), DuelError> {
        if before.len() != after.len() {
            return Err(DuelError::ShuffleMismatch {
                before: before.len(),
                after: after.len(),
            });
        }
        let cards = self.resolve_batch(before, after)?;
        for handle in &cards {
            self.card_mut(*handle)?.id = 0;
        }
        self.rehome(&cards, before, after)
    }

    /// Resolves the cards of a batch move without touching the field.
    ///
    /// Fails if a source is empty, if a destination cannot hold a card,
    /// or if either side names the same address twice.
    fn resolve_batch(&self, before: &[LocInfo], after: &[LocInfo]) -> Result<Vec<CardHandle>, DuelError> {
        for side in [before, after] {
            for (i, at) in side.iter().enumerate() {
                if side[..i].iter().any(|seen| same_address(seen, at)) {
                    return Err(DuelError::repeated(at));
                }
            }
        }
        for at in after {
            self.check_place(at)?;
        }
        before.iter().map(|at| self.find(at)).collect()
    }

    /// Moves already resolved cards. Every address has been checked by
    /// [`resolve_batch`](Self::resolve_batch).
    fn rehome(&mut self, cards: &[CardHandle], before: &[LocInfo], after: &[LocInfo]) -> Result<(), DuelError> {
        for (handle, at) in cards.iter().zip(before) {
            self.unseat(*handle, at)?;
        }
        for (handle, at) in cards.iter().zip(after) {
            self.place(*handle, at)?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Summons and chains
    // -----------------------------------------------------------------------

    pub(crate) fn begin_summon(&mut self, code: u32, at: &LocInfo) -> Result<(), DuelError> {
        let handle = self.reveal(code, at)?;
        self.summoning.push(handle);
        self.last_summon_player = Some(at.controller);
        self.last_summoned.clear();
        Ok(())
    }

    pub(crate) fn finish_summon(&mut self, special: bool) {
        let summoned = std::mem::take(&mut self.summoning);
        if special {
            for handle in &summoned {
                if let Some(card) = self.slot_mut(*handle) {
                    card.special_summoned = true;
                }
            }
        }
        self.last_summoned = summoned;
    }

    pub(crate) fn chaining(&mut self, code: u32, at: &LocInfo, player: Player) -> Result<(), DuelError> {
        let handle = self.reveal(code, at)?;
        self.current_chain.push(handle);
        self.last_chain_player = Some(player);
        self.current_chain_target.clear();
        Ok(())
    }

    /// Records the targets of the chain link being built. Addresses the
    /// mirror cannot resolve are skipped and the first such failure is
    /// returned once the rest are recorded.
    pub(crate) fn become_target(&mut self, targets: &[LocInfo]) -> Result<(), DuelError> {
        let mut missing = None;
        for at in targets {
            match self.find(at) {
                Ok(handle) => {
                    self.current_chain_target.push(handle);
                    self.chain_targets.push(handle);
                }
                Err(e) => {
                    missing.get_or_insert(e);
                }
            }
        }
        missing.map_or(Ok(()), Err)
    }

    pub(crate) fn chain_end(&mut self) {
        self.current_chain.clear();
        self.chain_targets.clear();
        self.current_chain_target.clear();
        self.last_chain_player = None;
    }

    // -----------------------------------------------------------------------
    // Relations
    // -----------------------------------------------------------------------

    pub(crate) fn equip(&mut self, equip: CardHandle, target: CardHandle) -> Result<(), DuelError> {
        self.get(target)?;
        self.unequip(equip)?;
        self.card_mut(equip)?.replace_equip_target(Some(target));
        self.card_mut(target)?.link_equip(equip);
        Ok(())
    }

    /// Detaches an equip card. A card with no equip target is left as is.
    pub(crate) fn unequip(&mut self, equip: CardHandle) -> Result<(), DuelError> {
        if let Some(previous) = self.card_mut(equip)?.replace_equip_target(None) {
            if let Some(card) = self.slot_mut(previous) {
                card.unlink_equip(equip);
            }
        }
        Ok(())
    }

    pub(crate) fn add_target(&mut self, source: CardHandle, target: CardHandle) -> Result<(), DuelError> {
        self.get(target)?;
        self.card_mut(source)?.link_target(target);
        self.card_mut(target)?.link_targeted_by(source);
        Ok(())
    }

    pub(crate) fn cancel_target(&mut self, source: CardHandle, target: CardHandle) -> Result<(), DuelError> {
        self.get(target)?;
        self.card_mut(source)?.unlink_target(target);
        self.card_mut(target)?.unlink_targeted_by(source);
        Ok(())
    }

    fn clear_targets(&mut self, source: CardHandle) -> Result<(), DuelError> {
        for target in self.card_mut(source)?.take_targets() {
            if let Some(card) = self.slot_mut(target) {
                card.unlink_targeted_by(source);
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Disclosure
    // -----------------------------------------------------------------------

    /// Applies one card's disclosed fields.
    pub(crate) fn update_card(&mut self, handle: CardHandle, queries: &[CardQuery]) -> Result<(), DuelError> {
        for query in queries {
            if self.card_mut(handle)?.apply_query(query) {
                continue;
            }
            match query {
                CardQuery::ReasonCard(at) => {
                    let reason = self.find(at).ok();
                    self.card_mut(handle)?.set_reason_card(reason);
                }
                CardQuery::EquipCard(at) => match self.find(at) {
                    Ok(target) => self.equip(handle, target)?,
                    Err(_) => self.unequip(handle)?,
                },
                CardQuery::TargetCards(targets) => {
                    self.clear_targets(handle)?;
                    for at in targets {
                        if let Ok(target) = self.find(at) {
                            self.add_target(handle, target)?;
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Applies a whole location's disclosure, one slot per container
    /// position.
    pub(crate) fn update_location(
        &mut self,
        player: Player,
        location: Location,
        slots: &[Option<Vec<CardQuery>>],
    ) -> Result<(), DuelError> {
        let field = self.field(player);
        let holders: Vec<Option<CardHandle>> = match Area::from_location(location)? {
            Area::Pile(pile) => field.pile(pile).iter().copied().map(Some).collect(),
            Area::Row(row) => field.row(row).iter().map(Zone::card).collect(),
        };
        if holders.len() != slots.len() {
            tracing::debug!(
                %player,
                location = location.bits(),
                mirrored = holders.len(),
                shown = slots.len(),
                "location size differs"
            );
        }
        for (holder, slot) in holders.into_iter().zip(slots) {
            match (holder, slot) {
                (Some(handle), Some(queries)) => self.update_card(handle, queries)?,
                (None, Some(_)) => {
                    tracing::debug!(%player, location = location.bits(), "details for an empty slot");
                }
                _ => {}
            }
        }
        Ok(())
    }

    pub(crate) fn add_counter(&mut self, at: &LocInfo, kind: u16, count: u16) -> Result<(), DuelError> {
        let handle = self.find(at)?;
        let counter = self.card_mut(handle)?.counters.entry(kind).or_insert(0);
        *counter = counter.saturating_add(count);
        Ok(())
    }

    pub(crate) fn remove_counter(&mut self, at: &LocInfo, kind: u16, count: u16) -> Result<(), DuelError> {
        let handle = self.find(at)?;
        let card = self.card_mut(handle)?;
        let left = card.counter(kind).saturating_sub(count);
        if left == 0 {
            card.counters.remove(&kind);
        } else {
            card.counters.insert(kind, left);
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Turn, battle and life
    // -----------------------------------------------------------------------

    /// Resets the mirror for a new duel.
    pub(crate) fn start(&mut self, first: Player, life: [u32; 2], decks: [(u16, u16); 2]) {
        *self = Self::new();
        self.first = first;
        self.turn_player = first;
        self.life = life;
        for player in Player::BOTH {
            let (main, extra) = decks[player.index()];
            self.set_deck(player, main, extra);
        }
    }

    pub(crate) fn finish(&mut self, winner: Option<Player>) {
        self.outcome = Some(match winner {
            Some(player) => Outcome::Winner(player),
            None => Outcome::Draw,
        });
    }

    pub(crate) fn hint(&mut self, kind: u8, data: u64) {
        match (kind, data) {
            (HINT_EVENT, HINT_EVENT_MAINPHASE_END) => self.mainphase_end = true,
            (HINT_EVENT, HINT_EVENT_BATTLING) => {
                for field in &mut self.fields {
                    field.under_attack = false;
                }
            }
            (HINT_SELECT, _) => self.select_hint = data,
            _ => {}
        }
    }

    pub(crate) fn new_turn(&mut self, player: Player) {
        self.turn += 1;
        self.turn_player = player;
    }

    /// Records the phase and clears everything that only lasts a phase.
    pub(crate) fn new_phase(&mut self, phase: Phase) {
        self.phase = phase;
        for field in &mut self.fields {
            field.clear_combat();
        }
        for card in self.cards.iter_mut().flatten() {
            card.attacked = false;
        }
        self.mainphase_end = false;
    }

    /// Marks both combatants. `defender` is `None` for a direct attack.
    pub(crate) fn attack(&mut self, attacker: &LocInfo, defender: Option<&LocInfo>) -> Result<(), DuelError> {
        let attacking = self.find(attacker)?;
        let (side, defending) = match defender {
            Some(at) => (at.controller, Some(self.find(at)?)),
            None => (attacker.controller.opponent(), None),
        };
        self.card_mut(attacking)?.attacked = true;
        self.fields[attacker.controller.index()].battling_monster = Some(attacking);
        let defending_field = &mut self.fields[side.index()];
        defending_field.battling_monster = defending;
        defending_field.under_attack = true;
        Ok(())
    }

    pub(crate) fn end_battle(&mut self) {
        for field in &mut self.fields {
            field.under_attack = false;
        }
    }

    pub(crate) fn damage(&mut self, player: Player, amount: u32) {
        let life = &mut self.life[player.index()];
        *life = life.saturating_sub(amount);
    }

    pub(crate) fn recover(&mut self, player: Player, amount: u32) {
        let life = &mut self.life[player.index()];
        *life = life.saturating_add(amount);
    }

    pub(crate) fn set_life(&mut self, player: Player, life: u32) {
        self.life[player.index()] = life;
    }
}

fn same_address(a: &LocInfo, b: &LocInfo) -> bool {
    a.controller == b.controller && a.location == b.location && a.index == b.index
}

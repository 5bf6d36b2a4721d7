//! The seam between the protocol plumbing and whoever plays the duel.

use duelwire_duel::{Duel, Outcome};
use duelwire_session::MatchRecord;

use crate::request::{
    AttributeRequest, BattleAction, BattleRequest, CardNameRequest, ChainRequest, CounterRequest,
    EffectYnRequest, IdleAction, IdleRequest, NumberRequest, OptionRequest, PlaceChoice,
    PlaceRequest, PositionRequest, RaceRequest, SelectCardRequest, SortRequest, SumRequest,
    UnselectRequest, YesNoRequest,
};
use duelwire_protocol::{Attribute, Position, Race};

/// Rock, paper and scissors as the server numbers them.
pub const ROCK: u8 = 1;
pub const PAPER: u8 = 2;
pub const SCISSORS: u8 = 3;

/// Answers every decision the server asks of us.
///
/// Each method receives a read-only view of the mirror and the decoded
/// request, and returns the answer. The dispatcher owns the encoding,
/// so an implementation never touches bytes.
///
/// Only the three decisions every duel needs are required. The rest
/// have defaults that always produce a reply the server accepts, so a
/// minimal provider can already finish a duel.
///
/// # Example
///
/// ```rust,ignore
/// struct EndEveryTurn;
///
/// impl DecisionProvider for EndEveryTurn {
///     fn select_idle(&mut self, _: &Duel, request: &IdleRequest) -> IdleAction {
///         if request.can_end { IdleAction::End } else { IdleAction::ToBattle }
///     }
///     fn select_battle(&mut self, _: &Duel, _: &BattleRequest) -> BattleAction {
///         BattleAction::End
///     }
///     fn select_cards(&mut self, _: &Duel, request: &SelectCardRequest) -> Vec<usize> {
///         request.first_min()
///     }
/// }
/// ```
pub trait DecisionProvider: Send + 'static {
    // -- Hooks ---------------------------------------------------------------

    /// A duel began. The mirror has just been reset.
    fn on_start(&mut self, _duel: &Duel) {}

    fn on_new_turn(&mut self, _duel: &Duel) {}

    fn on_new_phase(&mut self, _duel: &Duel) {}

    /// The duel ended. `duel.outcome()` is already set.
    fn on_win(&mut self, _duel: &Duel, _outcome: Outcome) {}

    // -- Required ------------------------------------------------------------

    fn select_idle(&mut self, duel: &Duel, request: &IdleRequest) -> IdleAction;

    fn select_battle(&mut self, duel: &Duel, request: &BattleRequest) -> BattleAction;

    /// Indices into `request.choices`, between `min` and `max` of them.
    fn select_cards(&mut self, duel: &Duel, request: &SelectCardRequest) -> Vec<usize>;

    // -- Defaulted -----------------------------------------------------------

    fn select_tribute(&mut self, duel: &Duel, request: &SelectCardRequest) -> Vec<usize> {
        self.select_cards(duel, request)
    }

    fn select_effect_yn(&mut self, _duel: &Duel, _request: &EffectYnRequest) -> bool {
        true
    }

    /// Defaults to replaying a battle and agreeing otherwise.
    fn select_yes_no(&mut self, _duel: &Duel, _request: &YesNoRequest) -> bool {
        true
    }

    fn select_option(&mut self, _duel: &Duel, _request: &OptionRequest) -> usize {
        0
    }

    /// `None` passes. Passing on a forced chain is answered with the
    /// first choice instead.
    fn select_chain(&mut self, _duel: &Duel, request: &ChainRequest) -> Option<usize> {
        request.forced.then_some(0)
    }

    fn select_place(&mut self, _duel: &Duel, request: &PlaceRequest) -> Option<PlaceChoice> {
        request.zones().next()
    }

    fn select_position(&mut self, _duel: &Duel, request: &PositionRequest) -> Position {
        request
            .positions
            .first()
            .copied()
            .unwrap_or(Position::FACEUP_ATTACK)
    }

    /// One count per candidate.
    fn select_counters(&mut self, _duel: &Duel, request: &CounterRequest) -> Vec<u16> {
        request.greedy()
    }

    /// Indices into `request.choices`; the mandatory cards are added by
    /// the dispatcher.
    fn select_sum(&mut self, _duel: &Duel, request: &SumRequest) -> Vec<usize> {
        request.greedy()
    }

    /// `None` finishes the selection. Otherwise the index counts across
    /// `selectable` followed by `unselectable`.
    fn select_unselect(&mut self, _duel: &Duel, request: &UnselectRequest) -> Option<usize> {
        if request.finishable || request.selectable.is_empty() {
            None
        } else {
            Some(0)
        }
    }

    /// A permutation of the candidate indices.
    fn sort_cards(&mut self, _duel: &Duel, request: &SortRequest) -> Vec<u8> {
        request.as_listed()
    }

    fn announce_race(&mut self, _duel: &Duel, request: &RaceRequest) -> Race {
        request.lowest()
    }

    fn announce_attribute(&mut self, _duel: &Duel, request: &AttributeRequest) -> Attribute {
        request.lowest()
    }

    /// Index into `request.options`.
    fn announce_number(&mut self, _duel: &Duel, _request: &NumberRequest) -> usize {
        0
    }

    /// Names the first card this duel has disclosed.
    fn announce_card(&mut self, duel: &Duel, _request: &CardNameRequest) -> u32 {
        duel.cards()
            .map(|(_, card)| card.id)
            .find(|&id| id != 0)
            .unwrap_or_default()
    }

    // -- Lobby ---------------------------------------------------------------

    /// One of [`ROCK`], [`PAPER`], [`SCISSORS`].
    fn select_hand(&mut self) -> u8 {
        rand::random_range(ROCK..=SCISSORS)
    }

    /// `true` to go first.
    fn select_turn_order(&mut self) -> bool {
        true
    }

    fn rematch(&mut self, _record: &MatchRecord) -> bool {
        false
    }
}

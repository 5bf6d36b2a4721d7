//! Frame routing: lobby messages, game events and decision requests.
//!
//! Routing happens at two levels. The outer level is a `match` on the
//! [`StocMessage`] kind. The single outer kind that carries the duel
//! itself, `GAME_MSG`, is routed again through a [`DispatchTable`]: a
//! flat array of handler functions indexed by the [`GameMessage`] id,
//! built once when the [`Dispatcher`] is created.
//!
//! A [`Dispatcher`] never touches a socket. It takes one frame body and
//! returns a [`Reaction`] listing the packets to send, which keeps the
//! whole decision path testable with plain byte slices.

use duelwire_duel::{Duel, DuelEvent, Outcome};
use duelwire_protocol::{
    ChatMessage, GameMessage, HostInfo, Packet, PacketReader, Perspective, Player, Response,
    ServerError, StocMessage, decode_player_enter, split_frame,
};
use duelwire_session::{DuelResult, Session, SessionConfig, SessionError};

use crate::DuelwireError;
use crate::decision::DecisionProvider;
use crate::events::decode_event;
use crate::request::{
    AttributeRequest, BattleRequest, CardNameRequest, ChainRequest, CounterRequest,
    EffectYnRequest, IdleRequest, NumberRequest, OptionRequest, PlaceRequest, PositionRequest,
    RaceRequest, SelectCardRequest, SortRequest, SumRequest, UnselectRequest, YesNoRequest,
};

/// What the client loop should do after one frame.
#[derive(Debug, Default)]
pub struct Reaction {
    /// Packets to send, in order.
    pub replies: Vec<Packet>,
    /// The session is over; close once the replies are out.
    pub close: bool,
}

impl Reaction {
    fn reply(packet: Packet) -> Self {
        Self {
            replies: vec![packet],
            close: false,
        }
    }

    fn close() -> Self {
        Self {
            replies: Vec::new(),
            close: true,
        }
    }
}

// ---------------------------------------------------------------------------
// DispatchTable
// ---------------------------------------------------------------------------

/// Handles one game message. Returns the reply for a decision request.
pub type GameHandler<P> =
    fn(&mut Dispatcher<P>, GameMessage, &mut PacketReader<'_>) -> Result<Option<Response>, DuelwireError>;

/// Game message id → handler, resolved in one array index.
pub struct DispatchTable<P> {
    handlers: [Option<GameHandler<P>>; 256],
}

impl<P: DecisionProvider> DispatchTable<P> {
    pub fn new() -> Self {
        use GameMessage as M;

        let mut table = Self {
            handlers: [None; 256],
        };
        for kind in GameMessage::ALL {
            table.set(kind, on_state_event);
        }

        table.set(M::Retry, on_retry);
        table.set(M::Start, on_start);
        table.set(M::Win, on_win);
        table.set(M::NewTurn, on_new_turn);
        table.set(M::NewPhase, on_new_phase);

        table.set(M::SelectIdleCmd, on_select_idle);
        table.set(M::SelectBattleCmd, on_select_battle);
        table.set(M::SelectEffectYn, on_select_effect_yn);
        table.set(M::SelectYesNo, on_select_yes_no);
        table.set(M::SelectOption, on_select_option);
        table.set(M::SelectCard, on_select_card);
        table.set(M::SelectTribute, on_select_card);
        table.set(M::SelectChain, on_select_chain);
        table.set(M::SelectPlace, on_select_place);
        table.set(M::SelectDisField, on_select_place);
        table.set(M::SelectPosition, on_select_position);
        table.set(M::SelectCounter, on_select_counter);
        table.set(M::SelectSum, on_select_sum);
        table.set(M::SelectUnselectCard, on_select_unselect);
        table.set(M::SortCard, on_sort_card);
        table.set(M::SortChain, on_sort_chain);
        table.set(M::AnnounceRace, on_announce_race);
        table.set(M::AnnounceAttrib, on_announce_attribute);
        table.set(M::AnnounceNumber, on_announce_number);
        table.set(M::AnnounceCard, on_announce_card);
        table.set(M::RockPaperScissors, on_rock_paper_scissors);
        table
    }

    fn set(&mut self, kind: GameMessage, handler: GameHandler<P>) {
        self.handlers[usize::from(kind.id())] = Some(handler);
    }

    pub fn get(&self, kind: GameMessage) -> Option<GameHandler<P>> {
        self.handlers[usize::from(kind.id())]
    }

    pub fn handles(&self, kind: GameMessage) -> bool {
        self.get(kind).is_some()
    }
}

impl<P: DecisionProvider> Default for DispatchTable<P> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Session state, duel mirror and decision provider for one connection.
pub struct Dispatcher<P> {
    table: DispatchTable<P>,
    session: Session,
    duel: Duel,
    perspective: Perspective,
    provider: P,
}

impl<P: DecisionProvider> Dispatcher<P> {
    pub fn new(config: SessionConfig, provider: P) -> Self {
        Self {
            table: DispatchTable::new(),
            session: Session::new(config),
            duel: Duel::new(),
            perspective: Perspective::default(),
            provider,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn duel(&self) -> &Duel {
        &self.duel
    }

    pub fn perspective(&self) -> Perspective {
        self.perspective
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    /// The opening packets of a connection.
    pub fn handshake(&mut self) -> Result<Vec<Packet>, DuelwireError> {
        Ok(self.session.handshake()?.into())
    }

    /// Routes one inbound frame body.
    ///
    /// # Errors
    /// Every error is fatal for the connection: a server error, a
    /// handshake mismatch, a spectator seat, a `RETRY`, or a decision
    /// request that could not be decoded.
    pub fn handle_frame(&mut self, frame: &[u8]) -> Result<Reaction, DuelwireError> {
        let (id, body) = split_frame(frame)?;
        let Ok(kind) = StocMessage::try_from(id) else {
            tracing::warn!(id, len = body.len(), "unknown server message");
            return Ok(Reaction::default());
        };
        tracing::debug!(%kind, len = body.len(), "dispatching");

        let mut r = PacketReader::new(body).with_perspective(self.perspective);
        let reaction = match kind {
            StocMessage::GameMsg => self.handle_game_message(&mut r)?,
            StocMessage::ErrorMsg => {
                let error = ServerError::decode(&mut r)?;
                tracing::warn!(%error, "server refused");
                self.session.finish();
                return Err(SessionError::Server(error).into());
            }
            StocMessage::SelectHand => Reaction::reply(Packet::hand_result(self.provider.select_hand())),
            StocMessage::SelectTp => {
                Reaction::reply(Packet::turn_order(self.provider.select_turn_order()))
            }
            StocMessage::ChangeSide => Reaction::reply(self.session.on_change_side()?),
            StocMessage::JoinGame => {
                let host = HostInfo::decode(&mut r)?;
                match self.session.on_join_ack(host) {
                    Ok(deck) => Reaction::reply(deck),
                    Err(e @ SessionError::HandshakeMismatch { .. }) => {
                        return Err(DuelwireError::desync(e.to_string()));
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            StocMessage::TypeChange => {
                let seat = r.read_u8()?;
                Reaction::reply(self.session.on_type_change(seat)?)
            }
            StocMessage::DuelStart => {
                self.session.on_duel_start()?;
                tracing::info!("duel starting");
                Reaction::default()
            }
            StocMessage::DuelEnd => {
                tracing::info!(record = ?self.session.record(), "match over");
                self.session.finish();
                Reaction::close()
            }
            StocMessage::TimeLimit => {
                let player = r.read_player()?;
                if player == Player::Me {
                    Reaction::reply(Packet::time_confirm())
                } else {
                    Reaction::default()
                }
            }
            StocMessage::Chat => {
                let chat = ChatMessage::decode(&mut r)?;
                tracing::warn!(sender = chat.sender, text = %chat.text, "chat");
                Reaction::default()
            }
            StocMessage::PlayerEnter => {
                let name = decode_player_enter(&mut r)?;
                tracing::debug!(%name, "player entered");
                Reaction::default()
            }
            StocMessage::PlayerChange | StocMessage::WatchChange | StocMessage::Replay => {
                Reaction::default()
            }
            StocMessage::Rematch => {
                let accept = self.provider.rematch(self.session.record());
                tracing::info!(accept, "rematch offered");
                Reaction::reply(self.session.on_rematch(accept)?)
            }
        };

        for packet in &reaction.replies {
            tracing::debug!(kind = ?packet.kind(), len = packet.payload().len(), "reply");
        }
        Ok(reaction)
    }

    fn handle_game_message(&mut self, r: &mut PacketReader<'_>) -> Result<Reaction, DuelwireError> {
        let id = r.read_u8()?;
        let Ok(kind) = GameMessage::try_from(id) else {
            tracing::warn!(id, "unknown game message");
            return Ok(Reaction::default());
        };
        let Some(handler) = self.table.get(kind) else {
            tracing::warn!(%kind, "unhandled game message");
            return Ok(Reaction::default());
        };
        tracing::debug!(%kind, len = r.remaining(), "game message");

        Ok(match handler(self, kind, r)? {
            Some(response) => Reaction::reply(response.into_packet(self.perspective)),
            None => Reaction::default(),
        })
    }

    fn apply(&mut self, event: &DuelEvent) {
        if let Err(e) = self.duel.apply(event) {
            tracing::warn!(error = %e, ?event, "mirror skipped event");
        }
    }

    /// Decodes and applies a state event. Malformed events are skipped.
    fn mirror(&mut self, kind: GameMessage, r: &mut PacketReader<'_>) -> Option<DuelEvent> {
        match decode_event(kind, r) {
            Ok(Some(event)) => {
                self.apply(&event);
                Some(event)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(%kind, error = %e, "undecodable event skipped");
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// State events
// ---------------------------------------------------------------------------

type Handled = Result<Option<Response>, DuelwireError>;

fn on_state_event<P: DecisionProvider>(
    d: &mut Dispatcher<P>,
    kind: GameMessage,
    r: &mut PacketReader<'_>,
) -> Handled {
    d.mirror(kind, r);
    Ok(None)
}

fn on_retry<P: DecisionProvider>(_: &mut Dispatcher<P>, _: GameMessage, _: &mut PacketReader<'_>) -> Handled {
    Err(DuelwireError::desync("server rejected the last response"))
}

fn on_start<P: DecisionProvider>(
    d: &mut Dispatcher<P>,
    kind: GameMessage,
    r: &mut PacketReader<'_>,
) -> Handled {
    if let Some(DuelEvent::Start { first, life, .. }) = d.mirror(kind, r) {
        d.perspective = Perspective::new(first == Player::Me);
        tracing::info!(%first, life = ?life, "duel started");
        d.provider.on_start(&d.duel);
    }
    Ok(None)
}

fn on_win<P: DecisionProvider>(d: &mut Dispatcher<P>, kind: GameMessage, r: &mut PacketReader<'_>) -> Handled {
    d.mirror(kind, r);
    if let Some(outcome) = d.duel.outcome() {
        let result = match outcome {
            Outcome::Winner(Player::Me) => DuelResult::Win,
            Outcome::Winner(Player::Opponent) => DuelResult::Loss,
            Outcome::Draw => DuelResult::Draw,
        };
        d.session.on_duel_result(result);
        d.provider.on_win(&d.duel, outcome);
    }
    Ok(None)
}

fn on_new_turn<P: DecisionProvider>(
    d: &mut Dispatcher<P>,
    kind: GameMessage,
    r: &mut PacketReader<'_>,
) -> Handled {
    d.mirror(kind, r);
    d.provider.on_new_turn(&d.duel);
    Ok(None)
}

fn on_new_phase<P: DecisionProvider>(
    d: &mut Dispatcher<P>,
    kind: GameMessage,
    r: &mut PacketReader<'_>,
) -> Handled {
    d.mirror(kind, r);
    d.provider.on_new_phase(&d.duel);
    Ok(None)
}

// ---------------------------------------------------------------------------
// Decision requests
// ---------------------------------------------------------------------------

fn index(i: usize) -> Response {
    Response::Int(i as i32)
}

fn indices(picked: Vec<usize>) -> Response {
    Response::Cards(picked.into_iter().map(|i| i as u32).collect())
}

fn on_select_idle<P: DecisionProvider>(d: &mut Dispatcher<P>, _: GameMessage, r: &mut PacketReader<'_>) -> Handled {
    let request = IdleRequest::decode(r, &mut d.duel)?;
    let action = d.provider.select_idle(&d.duel, &request);
    tracing::debug!(?action, "idle command");
    Ok(Some(action.into_response()))
}

fn on_select_battle<P: DecisionProvider>(
    d: &mut Dispatcher<P>,
    _: GameMessage,
    r: &mut PacketReader<'_>,
) -> Handled {
    let request = BattleRequest::decode(r, &mut d.duel)?;
    let action = d.provider.select_battle(&d.duel, &request);
    tracing::debug!(?action, "battle command");
    Ok(Some(action.into_response()))
}

fn on_select_effect_yn<P: DecisionProvider>(
    d: &mut Dispatcher<P>,
    _: GameMessage,
    r: &mut PacketReader<'_>,
) -> Handled {
    let request = EffectYnRequest::decode(r, &mut d.duel)?;
    Ok(Some(Response::Bool(d.provider.select_effect_yn(&d.duel, &request))))
}

fn on_select_yes_no<P: DecisionProvider>(
    d: &mut Dispatcher<P>,
    _: GameMessage,
    r: &mut PacketReader<'_>,
) -> Handled {
    let request = YesNoRequest::decode(r)?;
    Ok(Some(Response::Bool(d.provider.select_yes_no(&d.duel, &request))))
}

fn on_select_option<P: DecisionProvider>(
    d: &mut Dispatcher<P>,
    _: GameMessage,
    r: &mut PacketReader<'_>,
) -> Handled {
    let request = OptionRequest::decode(r)?;
    Ok(Some(index(d.provider.select_option(&d.duel, &request))))
}

fn on_select_card<P: DecisionProvider>(
    d: &mut Dispatcher<P>,
    kind: GameMessage,
    r: &mut PacketReader<'_>,
) -> Handled {
    let picked = if kind == GameMessage::SelectTribute {
        let request = SelectCardRequest::decode_tribute(r, &mut d.duel)?;
        d.provider.select_tribute(&d.duel, &request)
    } else {
        let request = SelectCardRequest::decode(r, &mut d.duel)?;
        d.provider.select_cards(&d.duel, &request)
    };
    Ok(Some(indices(picked)))
}

fn on_select_chain<P: DecisionProvider>(
    d: &mut Dispatcher<P>,
    _: GameMessage,
    r: &mut PacketReader<'_>,
) -> Handled {
    let request = ChainRequest::decode(r, &mut d.duel)?;
    if request.choices.is_empty() {
        return Ok(Some(Response::decline()));
    }
    Ok(Some(match d.provider.select_chain(&d.duel, &request) {
        Some(i) => index(i),
        None => Response::decline(),
    }))
}

fn on_select_place<P: DecisionProvider>(
    d: &mut Dispatcher<P>,
    kind: GameMessage,
    r: &mut PacketReader<'_>,
) -> Handled {
    let request = PlaceRequest::decode(r, kind == GameMessage::SelectDisField)?;
    match d.provider.select_place(&d.duel, &request) {
        Some(choice) => Ok(Some(choice.into_response())),
        None => Err(DuelwireError::desync(format!(
            "no zone chosen from mask {:#x}",
            request.selectable
        ))),
    }
}

fn on_select_position<P: DecisionProvider>(
    d: &mut Dispatcher<P>,
    _: GameMessage,
    r: &mut PacketReader<'_>,
) -> Handled {
    let request = PositionRequest::decode(r)?;
    let position = d.provider.select_position(&d.duel, &request);
    Ok(Some(Response::Int(position.bits() as i32)))
}

fn on_select_counter<P: DecisionProvider>(
    d: &mut Dispatcher<P>,
    _: GameMessage,
    r: &mut PacketReader<'_>,
) -> Handled {
    let request = CounterRequest::decode(r, &mut d.duel)?;
    let mut counts = d.provider.select_counters(&d.duel, &request);
    counts.resize(request.choices.len(), 0);
    Ok(Some(Response::Counters(counts)))
}

fn on_select_sum<P: DecisionProvider>(d: &mut Dispatcher<P>, _: GameMessage, r: &mut PacketReader<'_>) -> Handled {
    let request = SumRequest::decode(r, &mut d.duel)?;
    let picked = d.provider.select_sum(&d.duel, &request);
    Ok(Some(request.into_response(&picked)))
}

fn on_select_unselect<P: DecisionProvider>(
    d: &mut Dispatcher<P>,
    _: GameMessage,
    r: &mut PacketReader<'_>,
) -> Handled {
    let request = UnselectRequest::decode(r, &mut d.duel)?;
    let choice = d.provider.select_unselect(&d.duel, &request);
    Ok(Some(Response::Unselect(choice.map(|i| vec![i as u32]))))
}

fn on_sort_card<P: DecisionProvider>(d: &mut Dispatcher<P>, _: GameMessage, r: &mut PacketReader<'_>) -> Handled {
    let request = SortRequest::decode(r, &mut d.duel)?;
    Ok(Some(Response::Bytes(d.provider.sort_cards(&d.duel, &request))))
}

fn on_sort_chain<P: DecisionProvider>(_: &mut Dispatcher<P>, _: GameMessage, _: &mut PacketReader<'_>) -> Handled {
    Ok(Some(Response::decline()))
}

fn on_announce_race<P: DecisionProvider>(
    d: &mut Dispatcher<P>,
    _: GameMessage,
    r: &mut PacketReader<'_>,
) -> Handled {
    let request = RaceRequest::decode(r)?;
    let races = d.provider.announce_race(&d.duel, &request);
    Ok(Some(Response::Int(races.bits() as i32)))
}

fn on_announce_attribute<P: DecisionProvider>(
    d: &mut Dispatcher<P>,
    _: GameMessage,
    r: &mut PacketReader<'_>,
) -> Handled {
    let request = AttributeRequest::decode(r)?;
    let attributes = d.provider.announce_attribute(&d.duel, &request);
    Ok(Some(Response::Int(attributes.bits() as i32)))
}

fn on_announce_number<P: DecisionProvider>(
    d: &mut Dispatcher<P>,
    _: GameMessage,
    r: &mut PacketReader<'_>,
) -> Handled {
    let request = NumberRequest::decode(r)?;
    Ok(Some(index(d.provider.announce_number(&d.duel, &request))))
}

fn on_announce_card<P: DecisionProvider>(
    d: &mut Dispatcher<P>,
    _: GameMessage,
    r: &mut PacketReader<'_>,
) -> Handled {
    let request = CardNameRequest::decode(r)?;
    Ok(Some(Response::Code(d.provider.announce_card(&d.duel, &request))))
}

fn on_rock_paper_scissors<P: DecisionProvider>(
    d: &mut Dispatcher<P>,
    _: GameMessage,
    _: &mut PacketReader<'_>,
) -> Handled {
    Ok(Some(Response::Int(i32::from(d.provider.select_hand()))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{BattleAction, IdleAction};
    use duelwire_protocol::{CtosMessage, Location, PacketWriter, SERVER_HANDSHAKE};

    struct Scripted {
        idle: IdleAction,
        starts: u32,
        outcome: Option<Outcome>,
    }

    impl DecisionProvider for Scripted {
        fn on_start(&mut self, _: &Duel) {
            self.starts += 1;
        }
        fn on_win(&mut self, _: &Duel, outcome: Outcome) {
            self.outcome = Some(outcome);
        }
        fn select_idle(&mut self, _: &Duel, _: &IdleRequest) -> IdleAction {
            self.idle
        }
        fn select_battle(&mut self, _: &Duel, _: &BattleRequest) -> BattleAction {
            BattleAction::End
        }
        fn select_cards(&mut self, _: &Duel, request: &SelectCardRequest) -> Vec<usize> {
            request.first_min()
        }
        fn select_hand(&mut self) -> u8 {
            2
        }
    }

    fn dispatcher() -> Dispatcher<Scripted> {
        Dispatcher::new(
            SessionConfig::default(),
            Scripted {
                idle: IdleAction::End,
                starts: 0,
                outcome: None,
            },
        )
    }

    fn frame(kind: StocMessage, body: &[u8]) -> Vec<u8> {
        let mut frame = vec![kind as u8];
        frame.extend_from_slice(body);
        frame
    }

    fn game(kind: GameMessage, build: impl FnOnce(&mut PacketWriter)) -> Vec<u8> {
        let mut w = PacketWriter::new();
        w.write_u8(kind.id());
        build(&mut w);
        frame(StocMessage::GameMsg, w.as_bytes())
    }

    fn start(went_first: bool) -> Vec<u8> {
        game(GameMessage::Start, |w| {
            w.write_bool(!went_first);
            w.write_u32(8000);
            w.write_u32(8000);
            for _ in 0..2 {
                w.write_u16(40);
                w.write_u16(15);
            }
        })
    }

    fn response_body(reaction: &Reaction) -> Vec<u8> {
        assert_eq!(reaction.replies.len(), 1);
        let packet = &reaction.replies[0];
        assert_eq!(packet.kind(), CtosMessage::Response);
        packet.payload().to_vec()
    }

    #[test]
    fn test_table_handles_every_game_message() {
        let table = DispatchTable::<Scripted>::new();
        for kind in GameMessage::ALL {
            assert!(table.handles(kind), "{kind} has no handler");
        }
    }

    #[test]
    fn test_start_sets_perspective_and_calls_hook() {
        let mut d = dispatcher();
        d.handle_frame(&start(false)).unwrap();
        assert!(!d.perspective().went_first());
        assert_eq!(d.duel().first_player(), Player::Opponent);
        assert_eq!(d.provider().starts, 1);
        assert_eq!(d.duel().cards().count(), 110);
    }

    #[test]
    fn test_player_bytes_follow_perspective_after_start() {
        let mut d = dispatcher();
        d.handle_frame(&start(false)).unwrap();
        // seat 1 is us when we went second
        d.handle_frame(&game(GameMessage::NewTurn, |w| w.write_u8(1))).unwrap();
        assert_eq!(d.duel().turn_player(), Player::Me);
    }

    #[test]
    fn test_idle_request_gets_command_reply() {
        let mut d = dispatcher();
        d.handle_frame(&start(true)).unwrap();
        d.provider_mut().idle = IdleAction::ToBattle;
        let reaction = d
            .handle_frame(&game(GameMessage::SelectIdleCmd, |w| {
                w.write_u8(0);
                for _ in 0..6 {
                    w.write_u32(0);
                }
                w.write_bool(true);
                w.write_bool(true);
                w.write_bool(false);
            }))
            .unwrap();
        assert_eq!(response_body(&reaction), 6i32.to_le_bytes());
    }

    #[test]
    fn test_retry_is_desync() {
        let mut d = dispatcher();
        let err = d.handle_frame(&game(GameMessage::Retry, |_| {})).unwrap_err();
        assert!(err.is_desync());
    }

    #[test]
    fn test_truncated_decision_request_is_fatal() {
        let mut d = dispatcher();
        let err = d
            .handle_frame(&game(GameMessage::SelectIdleCmd, |w| w.write_u8(0)))
            .unwrap_err();
        assert!(matches!(err, DuelwireError::Protocol(_)));
    }

    #[test]
    fn test_truncated_state_event_is_skipped() {
        let mut d = dispatcher();
        d.handle_frame(&start(true)).unwrap();
        let reaction = d
            .handle_frame(&game(GameMessage::Move, |w| w.write_u32(1)))
            .unwrap();
        assert!(reaction.replies.is_empty() && !reaction.close);
    }

    #[test]
    fn test_chain_without_choices_declines() {
        let mut d = dispatcher();
        let reaction = d
            .handle_frame(&game(GameMessage::SelectChain, |w| {
                w.write_u8(0);
                w.write_u8(0);
                w.write_bool(false);
                w.write_u32(0);
                w.write_u32(0);
                w.write_u32(0);
            }))
            .unwrap();
        assert_eq!(response_body(&reaction), (-1i32).to_le_bytes());
    }

    #[test]
    fn test_place_reply_uses_absolute_seat() {
        let mut d = dispatcher();
        d.handle_frame(&start(false)).unwrap();
        let reaction = d
            .handle_frame(&game(GameMessage::SelectPlace, |w| {
                w.write_u8(1);
                w.write_u8(1);
                w.write_u32(!0x2);
            }))
            .unwrap();
        // our seat is 1 when we went second
        assert_eq!(
            response_body(&reaction),
            vec![1, Location::MONSTER_ZONE.bits() as u8, 1]
        );
    }

    #[test]
    fn test_win_records_result_and_calls_hook() {
        let mut d = dispatcher();
        d.handle_frame(&start(true)).unwrap();
        d.handle_frame(&game(GameMessage::Win, |w| {
            w.write_u8(0);
            w.write_u8(0);
        }))
        .unwrap();
        assert_eq!(d.provider().outcome, Some(Outcome::Winner(Player::Me)));
        assert_eq!(d.session().record().won, 1);
    }

    #[test]
    fn test_time_limit_only_confirmed_for_us() {
        let mut d = dispatcher();
        d.handle_frame(&start(true)).unwrap();
        let ours = d.handle_frame(&frame(StocMessage::TimeLimit, &[0, 0, 0])).unwrap();
        assert_eq!(ours.replies[0].kind(), CtosMessage::TimeConfirm);
        let theirs = d.handle_frame(&frame(StocMessage::TimeLimit, &[1, 0, 0])).unwrap();
        assert!(theirs.replies.is_empty());
    }

    #[test]
    fn test_select_hand_uses_provider() {
        let mut d = dispatcher();
        let reaction = d.handle_frame(&frame(StocMessage::SelectHand, &[])).unwrap();
        assert_eq!(reaction.replies[0].kind(), CtosMessage::HandResult);
        assert_eq!(reaction.replies[0].payload(), &[2]);
    }

    #[test]
    fn test_join_with_bad_handshake_sends_nothing() {
        let mut d = dispatcher();
        d.handshake().unwrap();
        let mut w = PacketWriter::new();
        w.write_bytes(&[0; 24]);
        w.write_u32(SERVER_HANDSHAKE ^ 1);
        w.write_bytes(&[0; 28]);
        let err = d.handle_frame(&frame(StocMessage::JoinGame, w.as_bytes())).unwrap_err();
        assert!(err.is_desync(), "{err:?}");
        assert!(err.to_string().contains("handshake"));
        assert!(d.session().state().is_finished());
    }

    #[test]
    fn test_error_msg_is_fatal() {
        let mut d = dispatcher();
        let err = d
            .handle_frame(&frame(StocMessage::ErrorMsg, &[2, 0, 0, 0, 7, 0, 0, 0]))
            .unwrap_err();
        assert!(matches!(err, DuelwireError::Session(SessionError::Server(_))));
    }

    #[test]
    fn test_unknown_kinds_are_skipped() {
        let mut d = dispatcher();
        assert!(d.handle_frame(&[0x99]).unwrap().replies.is_empty());
        assert!(d.handle_frame(&[1, 0xfe]).unwrap().replies.is_empty());
    }

    #[test]
    fn test_duel_end_closes() {
        let mut d = dispatcher();
        assert!(d.handle_frame(&frame(StocMessage::DuelEnd, &[])).unwrap().close);
    }
}

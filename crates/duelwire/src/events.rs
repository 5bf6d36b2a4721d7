//! Wire layouts of the state-changing game events.
//!
//! Each layout below turns one `GAME_MSG` payload into a [`DuelEvent`].
//! Player bytes are translated by the reader's perspective, so the
//! events that come out are already relative.

use duelwire_duel::{DuelEvent, SummonKind};
use duelwire_protocol::{
    GameMessage, LocInfo, PacketReader, Phase, Player, ProtocolError, query,
};

/// Seat byte `WIN` uses for a drawn duel.
const DRAW_SEAT: u8 = 2;

/// Decodes the payload of a state event.
///
/// Returns `Ok(None)` for kinds that carry no state change the mirror
/// tracks (decision requests, `SET`, `TAG_SWAP`, ...) and for updates
/// that name no fields at all.
pub fn decode_event(
    kind: GameMessage,
    r: &mut PacketReader<'_>,
) -> Result<Option<DuelEvent>, ProtocolError> {
    use GameMessage as M;

    let event = match kind {
        M::Start => decode_start(r)?,
        M::Win => {
            let seat = r.read_u8()?;
            let winner = if seat == DRAW_SEAT {
                None
            } else {
                Some(r.perspective().from_wire(seat)?)
            };
            DuelEvent::Win {
                winner,
                reason: r.read_u8()?,
            }
        }
        M::Hint => DuelEvent::Hint {
            kind: r.read_u8()?,
            player: r.read_player()?,
            data: r.read_u64()?,
        },
        M::NewTurn => DuelEvent::NewTurn {
            player: r.read_player()?,
        },
        M::NewPhase => DuelEvent::NewPhase {
            phase: Phase::from_bits_retain(r.read_u32()?),
        },
        M::Move => DuelEvent::Move {
            code: r.read_u32()?,
            from: r.read_loc_info()?,
            to: r.read_loc_info()?,
            reason: r.read_u32()?,
        },
        M::PosChange => {
            let code = r.read_u32()?;
            let controller = r.read_player()?;
            let location = r.read_location()?;
            let index = u32::from(r.read_u8()?);
            let previous = r.read_position_u8()?;
            DuelEvent::PosChange {
                code,
                at: LocInfo {
                    controller,
                    location,
                    index,
                    position: previous,
                },
                position: r.read_position_u8()?,
            }
        }
        M::Swap => DuelEvent::Swap {
            first: (r.read_u32()?, r.read_loc_info()?),
            second: (r.read_u32()?, r.read_loc_info()?),
        },
        M::Summoning | M::SpSummoning | M::FlipSummoning => DuelEvent::Summoning {
            kind: summon_kind(kind),
            code: r.read_u32()?,
            at: r.read_loc_info()?,
        },
        M::Summoned | M::SpSummoned | M::FlipSummoned => DuelEvent::Summoned {
            kind: summon_kind(kind),
        },
        M::Chaining => DuelEvent::Chaining {
            code: r.read_u32()?,
            at: r.read_loc_info()?,
            player: r.read_player()?,
        },
        M::ChainEnd => DuelEvent::ChainEnd,
        M::BecomeTarget => {
            let count = r.read_u32()?;
            let targets = (0..count)
                .map(|_| r.read_loc_info())
                .collect::<Result<_, _>>()?;
            DuelEvent::BecomeTarget { targets }
        }
        M::Draw => DuelEvent::Draw {
            player: r.read_player()?,
            count: r.read_u32()?,
        },
        M::Damage | M::PayLpCost => DuelEvent::Damage {
            player: r.read_player()?,
            amount: r.read_u32()?,
        },
        M::Recover => DuelEvent::Recover {
            player: r.read_player()?,
            amount: r.read_u32()?,
        },
        M::LpUpdate => DuelEvent::LpUpdate {
            player: r.read_player()?,
            life: r.read_u32()?,
        },
        M::Equip => DuelEvent::Equip {
            equip: r.read_loc_info()?,
            target: r.read_loc_info()?,
        },
        M::Unequip => DuelEvent::Unequip {
            equip: r.read_loc_info()?,
        },
        M::CardTarget => DuelEvent::CardTarget {
            source: r.read_loc_info()?,
            target: r.read_loc_info()?,
        },
        M::CancelTarget => DuelEvent::CancelTarget {
            source: r.read_loc_info()?,
            target: r.read_loc_info()?,
        },
        M::Attack => {
            let attacker = r.read_loc_info()?;
            let defender = r.read_loc_info()?;
            DuelEvent::Attack {
                attacker,
                defender: (!defender.location.is_empty()).then_some(defender),
            }
        }
        M::Battle => DuelEvent::Battle,
        M::AttackDisabled => DuelEvent::AttackDisabled,
        M::ShuffleDeck => DuelEvent::ShuffleDeck {
            player: r.read_player()?,
        },
        M::ShuffleHand => {
            let player = r.read_player()?;
            DuelEvent::ShuffleHand {
                player,
                codes: read_codes(r)?,
            }
        }
        M::ShuffleExtra => {
            let player = r.read_player()?;
            DuelEvent::ShuffleExtra {
                player,
                codes: read_codes(r)?,
            }
        }
        M::ShuffleSetCard => {
            let _location = r.read_location()?;
            let count = r.read_u8()?;
            let before = (0..count)
                .map(|_| r.read_loc_info())
                .collect::<Result<_, _>>()?;
            let after = (0..count)
                .map(|_| r.read_loc_info())
                .collect::<Result<_, _>>()?;
            DuelEvent::ShuffleSetCard { before, after }
        }
        M::UpdateData => {
            let player = r.read_player()?;
            let location = r.read_location()?;
            let _size = r.read_u32()?;
            DuelEvent::UpdateData {
                player,
                location,
                slots: query::read_query_slots(r)?,
            }
        }
        M::UpdateCard => {
            let controller = r.read_player()?;
            let location = r.read_location()?;
            let index = u32::from(r.read_u8()?);
            let Some(queries) = query::read_card_queries(r)? else {
                return Ok(None);
            };
            DuelEvent::UpdateCard {
                at: LocInfo::new(controller, location, index),
                queries,
            }
        }
        M::AddCounter | M::RemoveCounter => {
            let counter = r.read_u16()?;
            let controller = r.read_player()?;
            let location = r.read_location()?;
            let index = u32::from(r.read_u8()?);
            let count = r.read_u16()?;
            let at = LocInfo::new(controller, location, index);
            if kind == M::AddCounter {
                DuelEvent::AddCounter {
                    at,
                    kind: counter,
                    count,
                }
            } else {
                DuelEvent::RemoveCounter {
                    at,
                    kind: counter,
                    count,
                }
            }
        }
        _ => return Ok(None),
    };
    Ok(Some(event))
}

/// `START`: whether we are seat 0, then life and deck sizes in seat
/// order. Seat 0 is always whoever goes first.
fn decode_start(r: &mut PacketReader<'_>) -> Result<DuelEvent, ProtocolError> {
    let went_first = !r.read_bool()?;
    let first = if went_first {
        Player::Me
    } else {
        Player::Opponent
    };
    let seats = [first, first.opponent()];

    let mut life = [0; 2];
    for player in seats {
        life[player.index()] = r.read_u32()?;
    }
    let mut decks = [(0, 0); 2];
    for player in seats {
        decks[player.index()] = (r.read_u16()?, r.read_u16()?);
    }
    Ok(DuelEvent::Start { first, life, decks })
}

fn summon_kind(kind: GameMessage) -> SummonKind {
    match kind {
        GameMessage::SpSummoning | GameMessage::SpSummoned => SummonKind::Special,
        GameMessage::FlipSummoning | GameMessage::FlipSummoned => SummonKind::Flip,
        _ => SummonKind::Normal,
    }
}

fn read_codes(r: &mut PacketReader<'_>) -> Result<Vec<u32>, ProtocolError> {
    let count = r.read_u32()?;
    (0..count).map(|_| r.read_u32()).collect()
}

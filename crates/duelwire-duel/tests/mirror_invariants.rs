//! Integration tests that play a scripted stretch of a duel through
//! `Duel::apply` and check the structural invariants after every event.

use duelwire_duel::{CardHandle, Duel, DuelEvent, Pile, SummonKind};
use duelwire_protocol::{CardQuery, LocInfo, Location, Phase, Player, Position};

// =========================================================================
// Helpers
// =========================================================================

fn loc(player: Player, location: Location, index: u32, position: Position) -> LocInfo {
    LocInfo {
        controller: player,
        location,
        index,
        position,
    }
}

fn hand(player: Player, index: u32) -> LocInfo {
    loc(player, Location::HAND, index, Position::FACEDOWN_DEFENSE)
}

fn monster(player: Player, index: u32) -> LocInfo {
    loc(player, Location::MONSTER_ZONE, index, Position::FACEUP_ATTACK)
}

fn spell(player: Player, index: u32) -> LocInfo {
    loc(player, Location::SPELL_ZONE, index, Position::FACEUP_ATTACK)
}

/// How many containers across both sides hold `card`.
fn containers_holding(duel: &Duel, card: CardHandle) -> usize {
    let mut count = 0;
    for player in Player::BOTH {
        let field = duel.field(player);
        for pile in [Pile::Deck, Pile::Hand, Pile::Extra, Pile::Grave, Pile::Banished] {
            count += field.pile(pile).iter().filter(|c| **c == card).count();
        }
        count += field
            .monster_zones()
            .iter()
            .chain(field.spell_zones())
            .filter(|zone| zone.card() == Some(card))
            .count();
    }
    count
}

fn assert_invariants(duel: &Duel, step: &str) {
    for (handle, card) in duel.cards() {
        assert_eq!(
            containers_holding(duel, handle),
            1,
            "{step}: {handle} must sit in exactly one container"
        );
        for target in card.target_cards() {
            let other = duel.card(target).expect("target must be live");
            assert!(other.targeted_by().any(|c| c == handle), "{step}: target link one-sided");
        }
        for source in card.targeted_by() {
            let other = duel.card(source).expect("source must be live");
            assert!(other.target_cards().any(|c| c == handle), "{step}: targeted_by link one-sided");
        }
        if let Some(target) = card.equip_target() {
            let other = duel.card(target).expect("equip target must be live");
            assert!(other.equip_cards().any(|c| c == handle), "{step}: equip link one-sided");
        }
        for equip in card.equip_cards() {
            let other = duel.card(equip).expect("equip card must be live");
            assert_eq!(other.equip_target(), Some(handle), "{step}: equip_cards link one-sided");
        }
    }
    for player in Player::BOTH {
        for zone in duel.field(player).monster_zones() {
            if let Some(card) = zone.card() {
                assert!(duel.card(card).is_some(), "{step}: zone points at a released card");
            }
        }
    }
}

fn script() -> Vec<(&'static str, DuelEvent)> {
    let me = Player::Me;
    let op = Player::Opponent;
    vec![
        (
            "start",
            DuelEvent::Start {
                first: me,
                life: [8000, 8000],
                decks: [(40, 2), (40, 2)],
            },
        ),
        ("draw me", DuelEvent::Draw { player: me, count: 5 }),
        ("draw op", DuelEvent::Draw { player: op, count: 5 }),
        ("turn", DuelEvent::NewTurn { player: me }),
        ("main1", DuelEvent::NewPhase { phase: Phase::MAIN1 }),
        (
            "normal summon",
            DuelEvent::Move {
                code: 89631139,
                from: hand(me, 0),
                to: monster(me, 2),
                reason: 0,
            },
        ),
        (
            "summoning",
            DuelEvent::Summoning {
                kind: SummonKind::Normal,
                code: 89631139,
                at: monster(me, 2),
            },
        ),
        ("summoned", DuelEvent::Summoned { kind: SummonKind::Normal }),
        (
            "set equip",
            DuelEvent::Move {
                code: 0,
                from: hand(me, 0),
                to: spell(me, 0),
                reason: 0,
            },
        ),
        (
            "equip",
            DuelEvent::Equip {
                equip: spell(me, 0),
                target: monster(me, 2),
            },
        ),
        (
            "opponent monster",
            DuelEvent::Move {
                code: 0,
                from: hand(op, 3),
                to: monster(op, 1),
                reason: 0,
            },
        ),
        (
            "chaining",
            DuelEvent::Chaining {
                code: 5318639,
                at: spell(me, 0),
                player: me,
            },
        ),
        (
            "target",
            DuelEvent::BecomeTarget {
                targets: vec![monster(op, 1)],
            },
        ),
        (
            "card target",
            DuelEvent::CardTarget {
                source: spell(me, 0),
                target: monster(op, 1),
            },
        ),
        ("chain end", DuelEvent::ChainEnd),
        ("battle", DuelEvent::NewPhase { phase: Phase::BATTLE_STEP }),
        (
            "attack",
            DuelEvent::Attack {
                attacker: monster(me, 2),
                defender: Some(monster(op, 1)),
            },
        ),
        ("battle resolved", DuelEvent::Battle),
        (
            "opponent monster destroyed",
            DuelEvent::Move {
                code: 4206964,
                from: monster(op, 1),
                to: loc(op, Location::GRAVE, 0, Position::FACEUP_ATTACK),
                reason: 0,
            },
        ),
        (
            "equip destroyed",
            DuelEvent::Move {
                code: 5318639,
                from: spell(me, 0),
                to: loc(me, Location::GRAVE, 0, Position::FACEUP_ATTACK),
                reason: 0,
            },
        ),
        ("unequip", DuelEvent::Unequip { equip: loc(me, Location::GRAVE, 0, Position::empty()) }),
        (
            "update",
            DuelEvent::UpdateCard {
                at: monster(me, 2),
                queries: vec![CardQuery::Attack(3000), CardQuery::EquipCard(LocInfo::new(me, Location::empty(), 0))],
            },
        ),
        ("damage", DuelEvent::Damage { player: op, amount: 1500 }),
        ("main2", DuelEvent::NewPhase { phase: Phase::MAIN2 }),
        (
            "token leaves",
            DuelEvent::Move {
                code: 89631139,
                from: monster(me, 2),
                to: LocInfo::new(me, Location::empty(), 0),
                reason: 0,
            },
        ),
        ("shuffle hand", DuelEvent::ShuffleHand { player: me, codes: vec![1, 2, 3] }),
        ("shuffle deck", DuelEvent::ShuffleDeck { player: op }),
    ]
}

// =========================================================================
// Tests
// =========================================================================

#[test]
fn test_scripted_duel_keeps_invariants_after_every_event() {
    let mut duel = Duel::new();
    for (step, event) in script() {
        duel.apply(&event).unwrap_or_else(|e| panic!("{step}: {e}"));
        assert_invariants(&duel, step);
    }

    assert_eq!(duel.life(Player::Opponent), 6500);
    assert_eq!(duel.field(Player::Me).grave().len(), 1);
    assert_eq!(duel.field(Player::Opponent).grave().len(), 1);
    assert!(duel.field(Player::Me).is_field_empty());
    assert!(duel.current_chain().is_empty());
    assert_eq!(duel.phase(), Phase::MAIN2);
}

#[test]
fn test_failed_event_leaves_invariants_intact() {
    let mut duel = Duel::new();
    for (_, event) in script().into_iter().take(5) {
        duel.apply(&event).unwrap();
    }
    for to in [monster(Player::Me, 2), spell(Player::Me, 0)] {
        duel.apply(&DuelEvent::Move {
            code: 0,
            from: hand(Player::Me, 0),
            to,
            reason: 0,
        })
        .unwrap();
    }
    let held = [monster(Player::Me, 2), spell(Player::Me, 0)].map(|at| duel.find(&at).unwrap());
    let bad = [
        DuelEvent::Equip {
            equip: spell(Player::Me, 4),
            target: monster(Player::Me, 0),
        },
        DuelEvent::ShuffleSetCard {
            before: vec![hand(Player::Me, 0)],
            after: vec![],
        },
        DuelEvent::ShuffleSetCard {
            before: vec![monster(Player::Me, 2), spell(Player::Me, 0)],
            after: vec![spell(Player::Me, 0), spell(Player::Me, 9)],
        },
        DuelEvent::ShuffleSetCard {
            before: vec![monster(Player::Me, 2), monster(Player::Me, 2)],
            after: vec![monster(Player::Me, 2), monster(Player::Me, 3)],
        },
        DuelEvent::Swap {
            first: (1, monster(Player::Me, 2)),
            second: (2, monster(Player::Me, 2)),
        },
        DuelEvent::Swap {
            first: (1, hand(Player::Me, 0)),
            second: (2, monster(Player::Opponent, 6)),
        },
        DuelEvent::Move {
            code: 1,
            from: hand(Player::Me, 0),
            to: monster(Player::Me, 7),
            reason: 0,
        },
    ];
    for event in &bad {
        assert!(duel.apply(event).is_err(), "{event:?} should fail");
        assert_invariants(&duel, "after failure");
    }
    assert_eq!(duel.find(&monster(Player::Me, 2)).unwrap(), held[0]);
    assert_eq!(duel.find(&spell(Player::Me, 0)).unwrap(), held[1]);
}

#[test]
fn test_duel_snapshot_serializes() {
    let mut duel = Duel::new();
    for (_, event) in script().into_iter().take(8) {
        duel.apply(&event).unwrap();
    }
    let snapshot = serde_json::to_value(&duel).expect("duel should serialize");
    assert_eq!(snapshot["turn"], 1);
    assert_eq!(snapshot["life"][0], 8000);
    assert_eq!(snapshot["fields"][0]["hand"].as_array().map(Vec::len), Some(4));
}

use duelwire::prelude::*;
use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, index};
use rand::{Rng, SeedableRng};

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Picks uniformly among whatever the server allows.
struct RandomDuelist {
    rng: StdRng,
}

impl RandomDuelist {
    fn new() -> Self {
        Self { rng: StdRng::from_os_rng() }
    }

    fn seeded(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }
}

impl DecisionProvider for RandomDuelist {
    fn on_start(&mut self, duel: &Duel) {
        tracing::info!(first = %duel.first_player(), "duel started");
    }

    fn on_win(&mut self, duel: &Duel, outcome: Outcome) {
        tracing::info!(?outcome, turns = duel.turn(), "duel over");
    }

    fn select_idle(&mut self, _: &Duel, request: &IdleRequest) -> IdleAction {
        let mut actions = Vec::new();
        actions.extend((0..request.summonable.len()).map(IdleAction::Summon));
        actions.extend((0..request.special_summonable.len()).map(IdleAction::SpecialSummon));
        actions.extend((0..request.repositionable.len()).map(IdleAction::Reposition));
        actions.extend((0..request.monster_settable.len()).map(IdleAction::MonsterSet));
        actions.extend((0..request.spell_settable.len()).map(IdleAction::SpellSet));
        actions.extend((0..request.activatable.len()).map(IdleAction::Activate));
        if request.can_battle {
            actions.push(IdleAction::ToBattle);
        }
        if request.can_end {
            actions.push(IdleAction::End);
        }
        actions.choose(&mut self.rng).copied().unwrap_or(IdleAction::End)
    }

    fn select_battle(&mut self, _: &Duel, request: &BattleRequest) -> BattleAction {
        let mut actions = Vec::new();
        actions.extend((0..request.attackable.len()).map(BattleAction::Attack));
        actions.extend((0..request.activatable.len()).map(BattleAction::Activate));
        if request.can_main2 {
            actions.push(BattleAction::ToMain2);
        }
        if request.can_end {
            actions.push(BattleAction::End);
        }
        actions.choose(&mut self.rng).copied().unwrap_or(BattleAction::End)
    }

    fn select_cards(&mut self, _: &Duel, request: &SelectCardRequest) -> Vec<usize> {
        let len = request.choices.len();
        let max = (request.max as usize).min(len);
        let min = (request.min as usize).min(max);
        let amount = self.rng.random_range(min..=max);
        index::sample(&mut self.rng, len, amount).into_vec()
    }

    fn select_chain(&mut self, _: &Duel, request: &ChainRequest) -> Option<usize> {
        if request.forced || self.rng.random_bool(0.5) {
            Some(self.rng.random_range(0..request.choices.len()))
        } else {
            None
        }
    }

    fn select_effect_yn(&mut self, _: &Duel, _: &EffectYnRequest) -> bool {
        self.rng.random_bool(0.5)
    }

    fn select_option(&mut self, _: &Duel, request: &OptionRequest) -> usize {
        self.rng.random_range(0..request.options.len().max(1))
    }

    fn select_place(&mut self, _: &Duel, request: &PlaceRequest) -> Option<PlaceChoice> {
        let zones: Vec<_> = request.zones().collect();
        zones.choose(&mut self.rng).copied()
    }

    fn select_position(&mut self, _: &Duel, request: &PositionRequest) -> Position {
        request
            .positions
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(Position::FACEUP_ATTACK)
    }
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

/// Reads a `ClientConfig` from the JSON file named by `DUELWIRE_CONFIG`,
/// or falls back to the defaults.
fn load_config() -> Result<ClientConfig, Box<dyn std::error::Error>> {
    match std::env::var_os("DUELWIRE_CONFIG") {
        Some(path) => Ok(serde_json::from_slice(&std::fs::read(path)?)?),
        None => Ok(ClientConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = load_config()?;
    tracing::info!(host = %config.host, port = config.port, name = %config.session.name, "connecting");

    let client = DuelClient::builder()
        .config(config)
        .build(RandomDuelist::new())
        .await?;
    let record = client.run().await?;

    tracing::info!(played = record.played, won = record.won, "match finished");
    Ok(())
}

use std::str::FromStr;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::game::{
    ActionCard, ActionUsage, DecisionMaker, Game, Player, PlayerId, PropertyCard, PropertyColour,
    RentOption,
};

use super::planner::{first_best, Plan, PlanFollower, Planner};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AiStrategy {
    /// 选模拟得分最高的计划。
    Greedy,
    /// 在所有可行计划中均匀随机挑一个。
    Random,
}

impl FromStr for AiStrategy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "greedy" | "best" | "hard" => Ok(AiStrategy::Greedy),
            "random" | "easy" => Ok(AiStrategy::Random),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AiConfig {
    pub strategy: AiStrategy,
    #[serde(default)]
    pub seed: u64,
}

impl AiConfig {
    pub fn with_strategy(mut self, strategy: AiStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            strategy: AiStrategy::Greedy,
            seed: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AiDecision {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<Plan>,
    pub evaluation: i64,
    pub candidates: usize,
    pub strategy: AiStrategy,
}

/// AI 座位：轮到自己出牌时先规划，随后的子选择都照计划回答。
pub struct AiAgent {
    me: PlayerId,
    config: AiConfig,
    rng: SmallRng,
    follower: PlanFollower,
    last_decision: Option<AiDecision>,
}

impl AiAgent {
    pub fn new(me: PlayerId, config: AiConfig) -> Self {
        Self {
            me,
            rng: SmallRng::seed_from_u64(config.seed),
            config,
            follower: PlanFollower::default(),
            last_decision: None,
        }
    }

    pub fn player_id(&self) -> PlayerId {
        self.me
    }

    pub fn last_decision(&self) -> Option<&AiDecision> {
        self.last_decision.as_ref()
    }

    /// Plans the next play for this agent's seat without touching `game`.
    pub fn decide(&mut self, game: &Game) -> AiDecision {
        let strategy = self.config.strategy;
        let seat = match game.seat_of(self.me) {
            Some(seat) if !game.is_finished() => seat,
            _ => {
                return AiDecision {
                    plan: None,
                    evaluation: 0,
                    candidates: 0,
                    strategy,
                }
            }
        };

        let planner = Planner::new(game, seat);
        let (candidates, mut scored) = planner.score_all();
        let chosen = match strategy {
            AiStrategy::Greedy => first_best(scored),
            AiStrategy::Random => {
                scored.shuffle(&mut self.rng);
                scored.into_iter().next()
            }
        };

        match chosen {
            Some(chosen) => AiDecision {
                plan: Some(chosen.plan),
                evaluation: chosen.score,
                candidates,
                strategy,
            },
            None => AiDecision {
                plan: None,
                evaluation: super::planner::value(game, seat),
                candidates,
                strategy,
            },
        }
    }
}

impl DecisionMaker for AiAgent {
    fn choose_card_in_hand(&mut self, game: &Game, player: &Player) -> usize {
        let decision = self.decide(game);
        self.follower.set_plan(decision.plan.clone());
        self.last_decision = Some(decision);
        self.follower.choose_card_in_hand(game, player)
    }

    fn choose_action_usage(&mut self, game: &Game, player: &Player, card: &ActionCard) -> ActionUsage {
        self.follower.choose_action_usage(game, player, card)
    }

    fn choose_player_target(&mut self, game: &Game, player: &Player, targets: &[PlayerId]) -> usize {
        self.follower.choose_player_target(game, player, targets)
    }

    fn choose_full_set_target(
        &mut self,
        game: &Game,
        target: &Player,
        colours: &[PropertyColour],
    ) -> usize {
        self.follower.choose_full_set_target(game, target, colours)
    }

    fn choose_property_target(
        &mut self,
        game: &Game,
        target: &Player,
        properties: &[PropertyCard],
    ) -> usize {
        self.follower.choose_property_target(game, target, properties)
    }

    fn choose_property_source(
        &mut self,
        game: &Game,
        player: &Player,
        properties: &[PropertyCard],
    ) -> usize {
        self.follower.choose_property_source(game, player, properties)
    }

    fn choose_rent_colour_and_amount(
        &mut self,
        game: &Game,
        player: &Player,
        options: &[RentOption],
    ) -> usize {
        self.follower.choose_rent_colour_and_amount(game, player, options)
    }

    fn notify_turn_over(&mut self, game: &Game) {
        self.follower.notify_turn_over(game);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::testing::{action, lot, table};
    use crate::game::{demo_deck, ActionKind, Card, EngineError, GameOutcome, Seats};

    fn ai_seats(game: &Game, strategy: AiStrategy) -> Vec<Box<dyn DecisionMaker>> {
        game.players
            .iter()
            .enumerate()
            .map(|(seat, player)| -> Box<dyn DecisionMaker> {
                let config = AiConfig::default()
                    .with_strategy(strategy)
                    .with_seed(seat as u64 + 1);
                Box::new(AiAgent::new(player.id, config))
            })
            .collect()
    }

    fn play_out(game: &mut Game, seats: &mut Seats) -> Option<GameOutcome> {
        match game.run(seats, 400) {
            Ok(outcome) => Some(outcome),
            Err(EngineError::TurnLimitReached { .. }) => None,
            Err(other) => panic!("unexpected engine error: {other}"),
        }
    }

    #[test]
    fn ai_handles_finished_game() {
        let mut game = Game::sample();
        game.outcome = Some(GameOutcome::Winner {
            player: game.players[1].id,
        });
        let mut agent = AiAgent::new(game.players[0].id, AiConfig::default());
        let decision = agent.decide(&game);
        assert!(decision.plan.is_none());
        assert_eq!(decision.candidates, 0);
    }

    #[test]
    fn greedy_decisions_are_deterministic() {
        let game = Game::sample();
        let me = game.players[0].id;
        let first = AiAgent::new(me, AiConfig::default()).decide(&game);
        let second = AiAgent::new(me, AiConfig::default()).decide(&game);
        assert_eq!(first, second);
        assert!(first.candidates >= 3);
    }

    #[test]
    fn random_strategy_repeats_for_the_same_seed() {
        let game = Game::sample();
        let me = game.players[0].id;
        let config = AiConfig::default()
            .with_strategy(AiStrategy::Random)
            .with_seed(99);
        let picks = |config: &AiConfig| {
            let mut agent = AiAgent::new(me, config.clone());
            (0..5).map(|_| agent.decide(&game).plan).collect::<Vec<_>>()
        };
        assert_eq!(picks(&config), picks(&config));
    }

    #[test]
    fn agent_plays_its_planned_steal() {
        let mut game = table(2, Vec::new());
        game.players[1].add_property(lot(1, PropertyColour::Brown, 1));
        game.players[1].add_property(lot(2, PropertyColour::Green, 4));
        game.players[0].add_to_hand(Card::money(3, 1));
        game.players[0].add_to_hand(Card::Action(action(4, ActionKind::SlyDeal)));
        let mut seats = ai_seats(&game, AiStrategy::Greedy);

        let index = seats[0].choose_card_in_hand(&game, &game.players[0]);
        assert_eq!(index, 1);
        game.play_card_from_hand(0, index, &mut seats).expect("planned play is legal");
        assert_eq!(game.players[0].property_set(PropertyColour::Green).count(), 1);
        assert_eq!(game.players[1].property_set(PropertyColour::Green).count(), 0);
    }

    #[test]
    fn ai_strategy_parses_aliases() {
        assert_eq!("Greedy".parse::<AiStrategy>(), Ok(AiStrategy::Greedy));
        assert_eq!("easy".parse::<AiStrategy>(), Ok(AiStrategy::Random));
        assert!("minimax".parse::<AiStrategy>().is_err());
    }

    #[test]
    fn ai_table_plays_a_whole_game_without_losing_cards() {
        let players = (1..=3)
            .map(|id| Player::new(PlayerId::from_u128(id), format!("AI {id}")))
            .collect();
        let mut game = Game::new(players, demo_deck(), 2024);
        game.start().expect("deal opening hands");
        let mut seats = ai_seats(&game, AiStrategy::Greedy);

        let outcome = play_out(&mut game, &mut seats);
        game.integrity_check().expect("integrity holds after the game");
        assert_eq!(game.all_card_ids().len(), 88);
        if let Some(outcome) = outcome {
            assert_eq!(game.outcome, Some(outcome));
        }
    }

    #[test]
    fn mixed_strategies_replay_identically() {
        let build = || {
            let players = (1..=2)
                .map(|id| Player::new(PlayerId::from_u128(id), format!("AI {id}")))
                .collect();
            let mut game = Game::new(players, demo_deck(), 11);
            game.start().expect("deal opening hands");
            game
        };
        let mut first = build();
        let mut second = build();
        let mut first_seats = ai_seats(&first, AiStrategy::Random);
        let mut second_seats = ai_seats(&second, AiStrategy::Random);
        play_out(&mut first, &mut first_seats);
        play_out(&mut second, &mut second_seats);
        assert_eq!(first.event_log, second.event_log);
    }
}

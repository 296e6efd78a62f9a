use serde::{Deserialize, Serialize};

use crate::game::decision::dearest_property;
use crate::game::{
    ActionCard, ActionKind, ActionUsage, Card, CardId, DecisionMaker, Game, Passive, Player,
    PlayerId, PropertyCard, PropertyColour, RentOption,
};

/// 一次出牌的完整计划：打哪张牌，以及所有目标细节。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Plan {
    Property {
        card: CardId,
    },
    Money {
        card: CardId,
    },
    Bank {
        card: CardId,
    },
    General {
        card: CardId,
    },
    Rent {
        card: CardId,
        colour: PropertyColour,
        amount: u32,
    },
    WildRent {
        card: CardId,
        target: PlayerId,
        colour: PropertyColour,
        amount: u32,
    },
    DebtCollector {
        card: CardId,
        target: PlayerId,
    },
    SlyDeal {
        card: CardId,
        target: PlayerId,
        target_property: CardId,
    },
    ForcedDeal {
        card: CardId,
        target: PlayerId,
        target_property: CardId,
        source_property: CardId,
    },
    DealBreaker {
        card: CardId,
        target: PlayerId,
        colour: PropertyColour,
    },
}

impl Plan {
    pub fn card(&self) -> CardId {
        match self {
            Plan::Property { card }
            | Plan::Money { card }
            | Plan::Bank { card }
            | Plan::General { card }
            | Plan::Rent { card, .. }
            | Plan::WildRent { card, .. }
            | Plan::DebtCollector { card, .. }
            | Plan::SlyDeal { card, .. }
            | Plan::ForcedDeal { card, .. }
            | Plan::DealBreaker { card, .. } => *card,
        }
    }

    pub fn target(&self) -> Option<PlayerId> {
        match self {
            Plan::WildRent { target, .. }
            | Plan::DebtCollector { target, .. }
            | Plan::SlyDeal { target, .. }
            | Plan::ForcedDeal { target, .. }
            | Plan::DealBreaker { target, .. } => Some(*target),
            _ => None,
        }
    }

    fn rent_colour(&self) -> Option<PropertyColour> {
        match self {
            Plan::Rent { colour, .. } | Plan::WildRent { colour, .. } => Some(*colour),
            _ => None,
        }
    }
}

/// 按计划作答的决策者。计划与提问不符属于编程错误，直接 panic。
///
/// 没有计划时（例如在别人的回合里被要求付款）按被动方式回答，
/// 付款时优先交出最值钱的地产。
#[derive(Debug, Clone, Default)]
pub struct PlanFollower {
    plan: Option<Plan>,
}

impl PlanFollower {
    pub fn new(plan: Plan) -> Self {
        Self { plan: Some(plan) }
    }

    pub fn plan(&self) -> Option<&Plan> {
        self.plan.as_ref()
    }

    pub fn set_plan(&mut self, plan: Option<Plan>) {
        self.plan = plan;
    }

    fn mismatch(&self, question: &str) -> ! {
        panic!("plan {:?} cannot answer {}", self.plan, question)
    }
}

impl DecisionMaker for PlanFollower {
    fn choose_card_in_hand(&mut self, _game: &Game, player: &Player) -> usize {
        match &self.plan {
            Some(plan) => player
                .find_card_in_hand_index(plan.card())
                .unwrap_or_else(|| self.mismatch("choose_card_in_hand")),
            None => 0,
        }
    }

    fn choose_action_usage(&mut self, _game: &Game, _player: &Player, _card: &ActionCard) -> ActionUsage {
        match &self.plan {
            Some(Plan::Bank { .. }) | None => ActionUsage::Bank,
            Some(_) => ActionUsage::Play,
        }
    }

    fn choose_player_target(&mut self, _game: &Game, _player: &Player, targets: &[PlayerId]) -> usize {
        self.plan
            .as_ref()
            .and_then(Plan::target)
            .and_then(|target| targets.iter().position(|id| *id == target))
            .unwrap_or_else(|| self.mismatch("choose_player_target"))
    }

    fn choose_full_set_target(
        &mut self,
        _game: &Game,
        _target: &Player,
        colours: &[PropertyColour],
    ) -> usize {
        match &self.plan {
            Some(Plan::DealBreaker { colour, .. }) => colours
                .iter()
                .position(|candidate| candidate == colour)
                .unwrap_or_else(|| self.mismatch("choose_full_set_target")),
            _ => self.mismatch("choose_full_set_target"),
        }
    }

    fn choose_property_target(
        &mut self,
        _game: &Game,
        _target: &Player,
        properties: &[PropertyCard],
    ) -> usize {
        match &self.plan {
            Some(Plan::SlyDeal { target_property, .. })
            | Some(Plan::ForcedDeal { target_property, .. }) => properties
                .iter()
                .position(|card| card.id == *target_property)
                .unwrap_or_else(|| self.mismatch("choose_property_target")),
            _ => self.mismatch("choose_property_target"),
        }
    }

    fn choose_property_source(
        &mut self,
        _game: &Game,
        _player: &Player,
        properties: &[PropertyCard],
    ) -> usize {
        match &self.plan {
            Some(Plan::ForcedDeal { source_property, .. }) => properties
                .iter()
                .position(|card| card.id == *source_property)
                .unwrap_or_else(|| self.mismatch("choose_property_source")),
            None => dearest_property(properties),
            Some(_) => self.mismatch("choose_property_source"),
        }
    }

    fn choose_rent_colour_and_amount(
        &mut self,
        _game: &Game,
        _player: &Player,
        options: &[RentOption],
    ) -> usize {
        self.plan
            .as_ref()
            .and_then(Plan::rent_colour)
            .and_then(|colour| options.iter().position(|option| option.colour == colour))
            .unwrap_or_else(|| self.mismatch("choose_rent_colour_and_amount"))
    }

    fn notify_turn_over(&mut self, _game: &Game) {
        self.plan = None;
    }
}

/// 计划评估结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredPlan {
    pub plan: Plan,
    pub score: i64,
}

/// 为某一座位列举合法计划，并在隔离的副本上模拟打分。
pub struct Planner<'a> {
    game: &'a Game,
    seat: usize,
}

impl<'a> Planner<'a> {
    pub fn new(game: &'a Game, seat: usize) -> Self {
        Self { game, seat }
    }

    fn me(&self) -> &'a Player {
        &self.game.players[self.seat]
    }

    fn opponents(&self) -> impl Iterator<Item = &'a Player> + '_ {
        let seat = self.seat;
        self.game
            .players
            .iter()
            .enumerate()
            .filter(move |(index, _)| *index != seat)
            .map(|(_, player)| player)
    }

    /// Every parameterisation of every card in hand, in hand order. When none
    /// exists each action card may still be banked.
    pub fn generate(&self) -> Vec<Plan> {
        let mut plans: Vec<Plan> = self.me().hand.iter().flat_map(|card| self.plans_for(card)).collect();
        if plans.is_empty() {
            plans = self
                .me()
                .hand
                .iter()
                .filter_map(|card| match card {
                    Card::Action(action) => Some(Plan::Bank { card: action.id }),
                    _ => None,
                })
                .collect();
        }
        plans
    }

    fn plans_for(&self, card: &Card) -> Vec<Plan> {
        match card {
            Card::Property(property) => vec![Plan::Property { card: property.id }],
            Card::Money(money) => vec![Plan::Money { card: money.id }],
            Card::Action(action) => self.action_plans(action),
        }
    }

    fn action_plans(&self, action: &ActionCard) -> Vec<Plan> {
        let card = action.id;
        match action.kind {
            ActionKind::PassGo | ActionKind::ItsMyBirthday => vec![Plan::General { card }],
            ActionKind::JustSayNo => Vec::new(),
            ActionKind::DebtCollector => self
                .opponents()
                .map(|target| Plan::DebtCollector {
                    card,
                    target: target.id,
                })
                .collect(),
            ActionKind::SlyDeal => self
                .opponents()
                .flat_map(|target| {
                    target
                        .properties_to_list(true)
                        .into_iter()
                        .map(move |property| Plan::SlyDeal {
                            card,
                            target: target.id,
                            target_property: property.id,
                        })
                })
                .collect(),
            ActionKind::ForcedDeal => {
                let own = self.me().properties_to_list(true);
                let mut plans = Vec::new();
                for target in self.opponents() {
                    for wanted in target.properties_to_list(true) {
                        for given in own.iter().filter(|given| given.colour != wanted.colour) {
                            plans.push(Plan::ForcedDeal {
                                card,
                                target: target.id,
                                target_property: wanted.id,
                                source_property: given.id,
                            });
                        }
                    }
                }
                plans
            }
            ActionKind::DealBreaker => self
                .opponents()
                .flat_map(|target| {
                    target
                        .complete_set_colours()
                        .into_iter()
                        .map(move |colour| Plan::DealBreaker {
                            card,
                            target: target.id,
                            colour,
                        })
                })
                .collect(),
            ActionKind::RentWild
            | ActionKind::RentBrownLightBlue
            | ActionKind::RentPinkOrange
            | ActionKind::RentRedYellow
            | ActionKind::RentGreenDarkBlue
            | ActionKind::RentRailroadUtility => self.rent_plans(action),
        }
    }

    fn rent_plans(&self, action: &ActionCard) -> Vec<Plan> {
        let card = action.id;
        let colours = action.kind.rent_colours().unwrap_or(&[]);
        let options = self.me().owned_colours_with_rents(colours);
        if action.kind != ActionKind::RentWild {
            return options
                .into_iter()
                .map(|option| Plan::Rent {
                    card,
                    colour: option.colour,
                    amount: option.amount,
                })
                .collect();
        }
        options
            .into_iter()
            .flat_map(|option| {
                self.opponents().map(move |target| Plan::WildRent {
                    card,
                    target: target.id,
                    colour: option.colour,
                    amount: option.amount,
                })
            })
            .collect()
    }

    /// Plays `plan` on a clone of the game and scores the result for this
    /// seat. `None` when the simulated play fails.
    pub fn evaluate(&self, plan: &Plan) -> Option<i64> {
        let mut simulated = self.game.clone();
        let index = simulated.players[self.seat].find_card_in_hand_index(plan.card())?;
        let mut seats: Vec<Box<dyn DecisionMaker>> = (0..simulated.players.len())
            .map(|seat| -> Box<dyn DecisionMaker> {
                if seat == self.seat {
                    Box::new(PlanFollower::new(plan.clone()))
                } else {
                    Box::new(Passive)
                }
            })
            .collect();
        simulated
            .play_card_from_hand(self.seat, index, &mut seats)
            .ok()?;
        Some(value(&simulated, self.seat))
    }

    /// Generates and evaluates every plan, dropping those that fail.
    pub fn score_all(&self) -> (usize, Vec<ScoredPlan>) {
        let plans = self.generate();
        let considered = plans.len();
        let scored = plans
            .into_iter()
            .filter_map(|plan| self.evaluate(&plan).map(|score| ScoredPlan { plan, score }))
            .collect();
        (considered, scored)
    }

    /// The first plan with the highest score.
    pub fn best(&self) -> Option<ScoredPlan> {
        let (_, scored) = self.score_all();
        first_best(scored)
    }
}

pub(crate) fn first_best(scored: Vec<ScoredPlan>) -> Option<ScoredPlan> {
    let mut best: Option<ScoredPlan> = None;
    for candidate in scored {
        if best.as_ref().map_or(true, |current| candidate.score > current.score) {
            best = Some(candidate);
        }
    }
    best
}

/// Assets of `seat` minus everyone else's, plus the size of its own hand.
pub fn value(game: &Game, seat: usize) -> i64 {
    let mut total: i64 = 0;
    for (index, player) in game.players.iter().enumerate() {
        let worth = i64::from(player.total_bank_value() + player.total_property_value());
        if index == seat {
            total += worth;
        } else {
            total -= worth;
        }
    }
    total + game.players[seat].hand.len() as i64
}

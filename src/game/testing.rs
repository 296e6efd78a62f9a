//! 单元测试共用的牌桌与脚本化决策者。

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use super::cards::{ActionCard, ActionKind, BankCard, Card, CardId, MoneyCard, PropertyCard, PropertyColour};
use super::decision::{cheapest_property, ActionUsage, DecisionMaker, Passive, RentOption};
use super::player::{Player, PlayerId};
use super::state::Game;

const NAMES: [&str; 6] = ["Alice", "Bob", "Carol", "Dave", "Erin", "Frank"];

/// A game with `players` empty-handed seats and ids 1..=players.
pub fn table(players: usize, deck: Vec<Card>) -> Game {
    let seats = (0..players)
        .map(|seat| Player::new(PlayerId::from_u128(seat as u128 + 1), NAMES[seat % NAMES.len()]))
        .collect();
    Game::new(seats, deck, 42)
}

pub fn quiet_seats(players: usize) -> Vec<Box<dyn DecisionMaker>> {
    (0..players)
        .map(|_| Box::new(Passive) as Box<dyn DecisionMaker>)
        .collect()
}

pub fn lot(id: CardId, colour: PropertyColour, value: u32) -> PropertyCard {
    PropertyCard {
        id,
        name: format!("{colour} #{id}"),
        value,
        colour,
    }
}

pub fn bank_money(id: CardId, value: u32) -> BankCard {
    BankCard::Money(MoneyCard { id, value })
}

pub fn action(id: CardId, kind: ActionKind) -> ActionCard {
    ActionCard {
        id,
        name: kind.pretty().to_string(),
        value: 3,
        kind,
    }
}

/// Answers from queued scripts and falls back to the passive choices once a
/// queue runs dry. Log lines land in a shared buffer the test can inspect.
#[derive(Default)]
pub struct Scripted {
    cards: VecDeque<usize>,
    usages: VecDeque<ActionUsage>,
    players: VecDeque<usize>,
    full_sets: VecDeque<usize>,
    property_targets: VecDeque<usize>,
    property_sources: VecDeque<usize>,
    rents: VecDeque<usize>,
    logs: Rc<RefCell<Vec<String>>>,
}

impl Scripted {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cards(mut self, picks: impl IntoIterator<Item = usize>) -> Self {
        self.cards.extend(picks);
        self
    }

    pub fn usages(mut self, picks: impl IntoIterator<Item = ActionUsage>) -> Self {
        self.usages.extend(picks);
        self
    }

    pub fn players(mut self, picks: impl IntoIterator<Item = usize>) -> Self {
        self.players.extend(picks);
        self
    }

    pub fn full_sets(mut self, picks: impl IntoIterator<Item = usize>) -> Self {
        self.full_sets.extend(picks);
        self
    }

    pub fn property_targets(mut self, picks: impl IntoIterator<Item = usize>) -> Self {
        self.property_targets.extend(picks);
        self
    }

    pub fn property_sources(mut self, picks: impl IntoIterator<Item = usize>) -> Self {
        self.property_sources.extend(picks);
        self
    }

    pub fn rents(mut self, picks: impl IntoIterator<Item = usize>) -> Self {
        self.rents.extend(picks);
        self
    }

    pub fn logs(&self) -> Rc<RefCell<Vec<String>>> {
        Rc::clone(&self.logs)
    }
}

impl DecisionMaker for Scripted {
    fn choose_card_in_hand(&mut self, _game: &Game, _player: &Player) -> usize {
        self.cards.pop_front().unwrap_or(0)
    }

    fn choose_action_usage(&mut self, _game: &Game, _player: &Player, _card: &ActionCard) -> ActionUsage {
        self.usages.pop_front().unwrap_or(ActionUsage::Play)
    }

    fn choose_player_target(&mut self, _game: &Game, _player: &Player, _targets: &[PlayerId]) -> usize {
        self.players.pop_front().unwrap_or(0)
    }

    fn choose_full_set_target(
        &mut self,
        _game: &Game,
        _target: &Player,
        _colours: &[PropertyColour],
    ) -> usize {
        self.full_sets.pop_front().unwrap_or(0)
    }

    fn choose_property_target(
        &mut self,
        _game: &Game,
        _target: &Player,
        _properties: &[PropertyCard],
    ) -> usize {
        self.property_targets.pop_front().unwrap_or(0)
    }

    fn choose_property_source(
        &mut self,
        _game: &Game,
        _player: &Player,
        properties: &[PropertyCard],
    ) -> usize {
        self.property_sources
            .pop_front()
            .unwrap_or_else(|| cheapest_property(properties))
    }

    fn choose_rent_colour_and_amount(
        &mut self,
        _game: &Game,
        _player: &Player,
        _options: &[RentOption],
    ) -> usize {
        self.rents.pop_front().unwrap_or(0)
    }

    fn log(&mut self, message: &str) {
        self.logs.borrow_mut().push(message.to_string());
    }
}

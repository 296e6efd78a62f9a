use std::collections::HashSet;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::cards::{ActionKind, Card, CardId, PropertyColour};
use super::decision::Seats;
use super::player::{Player, PlayerId, PlayerSnapshot, SnapshotError};
use super::rules::EngineError;

const SHUFFLE_STREAM: u64 = 0x9E37_79B9_7F4A_7C15;

/// 规则参数。缺省值即标准玩法。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GameConfig {
    pub starting_cards: usize,
    pub turn_draw: usize,
    pub plays_per_turn: usize,
    pub pass_go_draw: usize,
    pub sets_to_win: usize,
    pub debt_amount: u32,
    pub birthday_amount: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            starting_cards: 5,
            turn_draw: 2,
            plays_per_turn: 3,
            pass_go_draw: 2,
            sets_to_win: 3,
            debt_amount: 5,
            birthday_amount: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameOutcome {
    Winner { player: PlayerId },
    Draw { players: Vec<PlayerId> },
}

/// 游戏事件流。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameEvent {
    GameStarted {
        players: Vec<PlayerId>,
    },
    DeckReshuffled {
        cards: usize,
    },
    CardsDealt {
        player: PlayerId,
        count: usize,
    },
    PropertyPlaced {
        player: PlayerId,
        card_id: CardId,
        colour: PropertyColour,
    },
    CardBanked {
        player: PlayerId,
        card_id: CardId,
        value: u32,
    },
    ActionPlayed {
        player: PlayerId,
        card_id: CardId,
        kind: ActionKind,
    },
    PaymentMade {
        from: PlayerId,
        to: PlayerId,
        owed: u32,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        bank_cards: Vec<CardId>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        properties: Vec<CardId>,
    },
    PropertyTaken {
        from: PlayerId,
        to: PlayerId,
        card_id: CardId,
    },
    PropertiesSwapped {
        actor: PlayerId,
        target: PlayerId,
        taken: CardId,
        given: CardId,
    },
    SetTaken {
        from: PlayerId,
        to: PlayerId,
        colour: PropertyColour,
        cards: Vec<CardId>,
    },
    TurnEnded {
        player: PlayerId,
        turn: u32,
    },
    GameOver {
        outcome: GameOutcome,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum IntegrityError {
    #[error("current player index {index} out of range for {players} players")]
    InvalidPlayerIndex { index: usize, players: usize },
    #[error("card {card_id} appears more than once")]
    DuplicateCardId { card_id: CardId },
    #[error("card {card_id} of colour {card_colour} sits in {player}'s {set_colour} set")]
    ColourMismatch {
        player: PlayerId,
        card_id: CardId,
        card_colour: PropertyColour,
        set_colour: PropertyColour,
    },
    #[error("player {player} has no {colour} set")]
    MissingColour {
        player: PlayerId,
        colour: PropertyColour,
    },
}

/// 从某一玩家视角看到的对局。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameSnapshot {
    pub players: Vec<PlayerSnapshot>,
    pub current_player_index: usize,
    pub current_turn: u32,
    pub deck_size: usize,
    pub discard_size: usize,
    #[serde(default)]
    pub config: GameConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<GameOutcome>,
}

/// 游戏整体状态。纯数据，可随意克隆用于模拟。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub players: Vec<Player>,
    #[serde(default)]
    pub deck: Vec<Card>,
    #[serde(default)]
    pub discard_pile: Vec<Card>,
    pub current_player_index: usize,
    pub current_turn: u32,
    #[serde(default)]
    pub config: GameConfig,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub event_log: Vec<GameEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<GameOutcome>,
    #[serde(default)]
    pub rng_seed: u64,
    #[serde(default)]
    pub shuffle_count: u64,
}

impl Game {
    pub fn new(players: Vec<Player>, deck: Vec<Card>, rng_seed: u64) -> Self {
        Self {
            players,
            deck,
            discard_pile: Vec::new(),
            current_player_index: 0,
            current_turn: 0,
            config: GameConfig::default(),
            event_log: Vec::new(),
            outcome: None,
            rng_seed,
            shuffle_count: 0,
        }
    }

    pub fn with_config(mut self, config: GameConfig) -> Self {
        self.config = config;
        self
    }

    pub fn record_event(&mut self, event: GameEvent) {
        self.event_log.push(event);
    }

    /// Broadcasts a human-readable line to every seat.
    pub fn log_all(&self, seats: &mut Seats, message: &str) {
        for seat in seats.iter_mut() {
            seat.log(message);
        }
    }

    pub fn current_player(&self) -> &Player {
        &self.players[self.current_player_index]
    }

    pub fn player(&self, seat: usize) -> Result<&Player, EngineError> {
        self.players
            .get(seat)
            .ok_or(EngineError::PlayerNotFound { seat })
    }

    pub fn seat_of(&self, id: PlayerId) -> Option<usize> {
        self.players.iter().position(|player| player.id == id)
    }

    /// Everyone except `seat`, in seat order.
    pub fn opponents_of(&self, seat: usize) -> Vec<PlayerId> {
        self.players
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != seat)
            .map(|(_, player)| player.id)
            .collect()
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    fn shuffle_deck(&mut self) {
        let seed = self
            .rng_seed
            .wrapping_add(self.shuffle_count.wrapping_mul(SHUFFLE_STREAM));
        let mut rng = SmallRng::seed_from_u64(seed);
        self.deck.shuffle(&mut rng);
        self.shuffle_count += 1;
    }

    /// Shuffles the deck and deals the opening hands.
    pub fn start(&mut self) -> Result<(), EngineError> {
        if let Some(seat) = self.players.iter().position(|player| !player.hand.is_empty()) {
            return Err(EngineError::HandNotEmpty { seat });
        }
        self.shuffle_deck();
        self.record_event(GameEvent::GameStarted {
            players: self.players.iter().map(|player| player.id).collect(),
        });
        for seat in 0..self.players.len() {
            self.deal_to_player(seat, self.config.starting_cards)?;
        }
        Ok(())
    }

    pub fn draw_card(&mut self) -> Result<Card, EngineError> {
        if self.deck.is_empty() {
            if self.discard_pile.is_empty() {
                return Err(EngineError::DeckExhausted);
            }
            self.deck = std::mem::take(&mut self.discard_pile);
            self.shuffle_deck();
            self.record_event(GameEvent::DeckReshuffled {
                cards: self.deck.len(),
            });
        }
        self.deck.pop().ok_or(EngineError::DeckExhausted)
    }

    /// Deals exactly `count` cards or, when the deck and discard pile together
    /// hold fewer, nothing at all.
    pub fn deal_to_player(&mut self, seat: usize, count: usize) -> Result<(), EngineError> {
        let player = self.player(seat)?.id;
        if self.deck.len() + self.discard_pile.len() < count {
            return Err(EngineError::DeckExhausted);
        }
        for _ in 0..count {
            let card = self.draw_card()?;
            self.players[seat].add_to_hand(card);
        }
        self.record_event(GameEvent::CardsDealt { player, count });
        Ok(())
    }

    pub fn discard_card(&mut self, card: Card) {
        self.discard_pile.push(card);
    }

    /// Declares the outcome once any player holds enough complete sets.
    pub fn check_win(&mut self, seats: &mut Seats) -> Option<GameOutcome> {
        if let Some(outcome) = &self.outcome {
            return Some(outcome.clone());
        }
        let winners: Vec<&Player> = self
            .players
            .iter()
            .filter(|player| player.has_won(self.config.sets_to_win))
            .collect();
        let (outcome, message) = match winners.as_slice() {
            [] => return None,
            [winner] => (
                GameOutcome::Winner { player: winner.id },
                format!("{} has won the game!", winner.name),
            ),
            several => {
                let names: Vec<&str> = several.iter().map(|player| player.name.as_str()).collect();
                (
                    GameOutcome::Draw {
                        players: several.iter().map(|player| player.id).collect(),
                    },
                    format!("{} have drawn!", names.join(", ")),
                )
            }
        };

        self.outcome = Some(outcome.clone());
        self.record_event(GameEvent::GameOver {
            outcome: outcome.clone(),
        });
        for seat in seats.iter_mut() {
            seat.notify_game_over(self, &outcome);
        }
        self.log_all(seats, &message);
        Some(outcome)
    }

    pub fn end_turn(&mut self, seats: &mut Seats) {
        let finished = self.current_player_index;
        self.record_event(GameEvent::TurnEnded {
            player: self.players[finished].id,
            turn: self.current_turn,
        });
        self.current_turn += 1;
        self.current_player_index = (finished + 1) % self.players.len();
        if let Some(seat) = seats.get_mut(finished) {
            seat.notify_turn_over(self);
        }
    }

    /// Every card id held anywhere in the game: deck, discard, hands, sets, banks.
    pub fn all_card_ids(&self) -> Vec<CardId> {
        let mut ids: Vec<CardId> = self
            .deck
            .iter()
            .chain(self.discard_pile.iter())
            .map(Card::id)
            .collect();
        for player in &self.players {
            ids.extend(player.hand.iter().map(Card::id));
            ids.extend(player.bank.iter().map(|card| card.id()));
            for set in player.property_sets() {
                ids.extend(set.cards().iter().map(|card| card.id));
            }
        }
        ids
    }

    pub fn integrity_check(&self) -> Result<(), IntegrityError> {
        if self.current_player_index >= self.players.len() {
            return Err(IntegrityError::InvalidPlayerIndex {
                index: self.current_player_index,
                players: self.players.len(),
            });
        }

        for player in &self.players {
            for colour in PropertyColour::ALL {
                if !player.property_sets().any(|set| set.colour() == colour) {
                    return Err(IntegrityError::MissingColour {
                        player: player.id,
                        colour,
                    });
                }
            }
            for set in player.property_sets() {
                if let Some(card) = set.cards().iter().find(|card| card.colour != set.colour()) {
                    return Err(IntegrityError::ColourMismatch {
                        player: player.id,
                        card_id: card.id,
                        card_colour: card.colour,
                        set_colour: set.colour(),
                    });
                }
            }
        }

        let mut seen = HashSet::new();
        for card_id in self.all_card_ids() {
            if !seen.insert(card_id) {
                return Err(IntegrityError::DuplicateCardId { card_id });
            }
        }
        Ok(())
    }

    pub fn snapshot_for(&self, viewer: PlayerId) -> GameSnapshot {
        GameSnapshot {
            players: self
                .players
                .iter()
                .map(|player| player.snapshot(player.id == viewer))
                .collect(),
            current_player_index: self.current_player_index,
            current_turn: self.current_turn,
            deck_size: self.deck.len(),
            discard_size: self.discard_pile.len(),
            config: self.config.clone(),
            outcome: self.outcome.clone(),
        }
    }

    /// Rebuilds a game from a player's view. Unseen deck cards are stood in for
    /// by worthless money cards so that simulated draws still grow the hand.
    pub fn from_snapshot(snapshot: GameSnapshot, rng_seed: u64) -> Result<Self, SnapshotError> {
        if snapshot.current_player_index >= snapshot.players.len() {
            return Err(SnapshotError::CurrentPlayerOutOfRange {
                index: snapshot.current_player_index,
                players: snapshot.players.len(),
            });
        }
        let players = snapshot
            .players
            .into_iter()
            .map(Player::from_snapshot)
            .collect::<Result<Vec<_>, _>>()?;

        let mut game = Game::new(players, Vec::new(), rng_seed).with_config(snapshot.config);
        let next_id = game.all_card_ids().into_iter().max().unwrap_or(0) + 1;
        game.deck = (0..snapshot.deck_size as CardId)
            .map(|offset| Card::money(next_id + offset, 0))
            .collect();
        game.current_player_index = snapshot.current_player_index;
        game.current_turn = snapshot.current_turn;
        game.outcome = snapshot.outcome;
        Ok(game)
    }

    /// A small three-player table mid-game, for hosts and tests.
    pub fn sample() -> Self {
        use super::cards::BankCard;

        let mut alice = Player::new(PlayerId::from_u128(1), "Alice");
        let mut bob = Player::new(PlayerId::from_u128(2), "Bob");
        let mut carol = Player::new(PlayerId::from_u128(3), "Carol");

        let mut deck = super::cards::demo_deck();
        let mut take = |id: CardId| -> Option<Card> {
            let pos = deck.iter().position(|card| card.id() == id)?;
            Some(deck.remove(pos))
        };

        // 编号见 demo_deck：1-2 棕色，12-13 红色，29 Deal Breaker，69 起为现金
        for id in [1, 2, 15] {
            if let Some(Card::Property(card)) = take(id) {
                bob.add_property(card);
            }
        }
        for id in [12, 13] {
            if let Some(Card::Property(card)) = take(id) {
                alice.add_property(card);
            }
        }
        if let Some(Card::Property(card)) = take(6) {
            carol.add_property(card);
        }
        for (player, id) in [(&mut alice, 69), (&mut bob, 75), (&mut carol, 80)] {
            if let Some(Card::Money(money)) = take(id) {
                player.add_to_bank(BankCard::Money(money));
            }
        }
        for id in [29, 35, 63] {
            if let Some(card) = take(id) {
                alice.add_to_hand(card);
            }
        }

        let mut game = Game::new(vec![alice, bob, carol], deck, 7);
        game.shuffle_deck();
        game.current_turn = 3;
        game
    }
}

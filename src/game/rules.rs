use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::cards::{ActionCard, ActionKind, BankCard, Card, PropertyCard};
use super::decision::{checked_choice, seat_mut, ActionUsage, RentOption, Seats};
use super::player::PlayerId;
use super::state::{Game, GameEvent, IntegrityError};

/// 可恢复的非法选择：牌退回手中，不消耗出牌次数。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum InvalidChoice {
    #[error("{target} has no complete sets to take")]
    NoCompleteSet { target: PlayerId },
    #[error("{target} has no properties to take")]
    NoPropertiesToTake { target: PlayerId },
    #[error("{player} has no properties to swap")]
    NoPropertiesToSwap { player: PlayerId },
    #[error("no properties of the colours this rent card charges for")]
    NoRentColour,
    #[error("{kind} has no effect when played")]
    NoEffect { kind: ActionKind },
}

/// 致命错误：决策者违约或牌堆耗尽，直接交给宿主处理。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum EngineError {
    #[error("no cards left in the deck or the discard pile")]
    DeckExhausted,
    #[error("choice {index} out of range for {candidates} candidates")]
    ChoiceOutOfRange { index: usize, candidates: usize },
    #[error("seat {seat} has no card at hand index {index}")]
    CardNotInHand { seat: usize, index: usize },
    #[error("no player at seat {seat}")]
    PlayerNotFound { seat: usize },
    #[error("{seats} decision makers seated for {players} players")]
    SeatMismatch { players: usize, seats: usize },
    #[error("seat {seat} already holds cards")]
    HandNotEmpty { seat: usize },
    #[error("the game is already over")]
    GameFinished,
    #[error("no winner after {turns} turns")]
    TurnLimitReached { turns: u32 },
    #[error("integrity violation: {error}")]
    Integrity { error: IntegrityError },
}

impl From<IntegrityError> for EngineError {
    fn from(error: IntegrityError) -> Self {
        EngineError::Integrity { error }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "kind", content = "error")]
pub enum PlayError {
    #[error(transparent)]
    Invalid(#[from] InvalidChoice),
    #[error(transparent)]
    Fatal(#[from] EngineError),
}

impl Game {
    fn ensure_running(&self) -> Result<(), EngineError> {
        if self.is_finished() {
            Err(EngineError::GameFinished)
        } else {
            Ok(())
        }
    }

    fn reject(&self, seat: usize, seats: &mut Seats, reason: InvalidChoice, message: &str) -> PlayError {
        if let Some(maker) = seats.get_mut(seat) {
            maker.log(message);
        }
        PlayError::Invalid(reason)
    }

    /// Asks `seat` to pick one of its opponents and returns the target's seat.
    fn choose_opponent(&self, seat: usize, seats: &mut Seats) -> Result<usize, EngineError> {
        let targets = self.opponents_of(seat);
        let choice = seat_mut(seats, seat)?.choose_player_target(self, &self.players[seat], &targets);
        let target = targets[checked_choice(choice, targets.len())?];
        self.seat_of(target)
            .ok_or(EngineError::PlayerNotFound { seat })
    }

    /// Plays the card at `hand_index`. On an invalid choice the card goes back
    /// to the same place in the hand and the game is otherwise untouched. A
    /// fatal error also returns the card to the hand unless the play already
    /// moved other cards, in which case it is discarded as played.
    pub fn play_card_from_hand(
        &mut self,
        seat: usize,
        hand_index: usize,
        seats: &mut Seats,
    ) -> Result<(), PlayError> {
        self.ensure_running()?;
        let card = self
            .players
            .get_mut(seat)
            .ok_or(EngineError::PlayerNotFound { seat })?
            .remove_from_hand(hand_index)
            .ok_or(EngineError::CardNotInHand {
                seat,
                index: hand_index,
            })?;

        let mark = self.event_log.len();
        match self.play_card(seat, card.clone(), seats) {
            Err(PlayError::Invalid(reason)) => {
                self.players[seat].hand.insert(hand_index, card);
                Err(PlayError::Invalid(reason))
            }
            Err(PlayError::Fatal(error)) => {
                if self.event_log.len() == mark {
                    self.players[seat].hand.insert(hand_index, card);
                } else {
                    self.discard_card(card);
                }
                Err(PlayError::Fatal(error))
            }
            Ok(()) => Ok(()),
        }
    }

    pub fn play_card(&mut self, seat: usize, card: Card, seats: &mut Seats) -> Result<(), PlayError> {
        let player = self.player(seat)?.id;
        match card {
            Card::Property(property) => {
                let message = format!(
                    "{} played {} ({})",
                    self.players[seat].name, property.name, property.colour
                );
                self.record_event(GameEvent::PropertyPlaced {
                    player,
                    card_id: property.id,
                    colour: property.colour,
                });
                self.players[seat].add_property(property);
                self.log_all(seats, &message);
            }
            Card::Money(money) => self.bank_card(seat, BankCard::Money(money), seats),
            Card::Action(action) => {
                let usage =
                    seat_mut(seats, seat)?.choose_action_usage(self, &self.players[seat], &action);
                match usage {
                    ActionUsage::Play => self.play_action_card(seat, action, seats)?,
                    ActionUsage::Bank => self.bank_card(seat, BankCard::Action(action), seats),
                }
            }
        }
        Ok(())
    }

    fn bank_card(&mut self, seat: usize, card: BankCard, seats: &mut Seats) {
        let message = format!("{} banked £{}", self.players[seat].name, card.value());
        self.record_event(GameEvent::CardBanked {
            player: self.players[seat].id,
            card_id: card.id(),
            value: card.value(),
        });
        self.players[seat].add_to_bank(card);
        self.log_all(seats, &message);
    }

    pub fn play_action_card(
        &mut self,
        seat: usize,
        card: ActionCard,
        seats: &mut Seats,
    ) -> Result<(), PlayError> {
        let mark = self.event_log.len();
        match card.kind {
            ActionKind::DealBreaker => self.play_deal_breaker(seat, seats)?,
            ActionKind::SlyDeal => self.play_sly_deal(seat, seats)?,
            ActionKind::ForcedDeal => self.play_forced_deal(seat, seats)?,
            ActionKind::DebtCollector => self.play_debt_collector(seat, seats)?,
            ActionKind::ItsMyBirthday => self.play_birthday(seat, seats)?,
            ActionKind::PassGo => self.play_pass_go(seat, seats)?,
            ActionKind::RentWild
            | ActionKind::RentBrownLightBlue
            | ActionKind::RentPinkOrange
            | ActionKind::RentRedYellow
            | ActionKind::RentGreenDarkBlue
            | ActionKind::RentRailroadUtility => self.play_rent_card(seat, &card, seats)?,
            ActionKind::JustSayNo => {
                let message = format!("{} can only be banked", card.kind);
                return Err(self.reject(seat, seats, InvalidChoice::NoEffect { kind: card.kind }, &message));
            }
        }
        self.event_log.insert(
            mark,
            GameEvent::ActionPlayed {
                player: self.players[seat].id,
                card_id: card.id,
                kind: card.kind,
            },
        );
        self.discard_card(Card::Action(card));
        Ok(())
    }

    pub fn play_deal_breaker(&mut self, seat: usize, seats: &mut Seats) -> Result<(), PlayError> {
        let target = self.choose_opponent(seat, seats)?;
        let colours = self.players[target].complete_set_colours();
        if colours.is_empty() {
            let message = format!("{} has no complete sets to take!", self.players[target].name);
            let reason = InvalidChoice::NoCompleteSet {
                target: self.players[target].id,
            };
            return Err(self.reject(seat, seats, reason, &message));
        }
        let choice = seat_mut(seats, seat)?.choose_full_set_target(self, &self.players[target], &colours);
        let colour = colours[checked_choice(choice, colours.len())?];

        let cards = self.players[target].take_set(colour);
        let ids = cards.iter().map(|card| card.id).collect();
        for card in cards {
            self.players[seat].add_property(card);
        }
        self.record_event(GameEvent::SetTaken {
            from: self.players[target].id,
            to: self.players[seat].id,
            colour,
            cards: ids,
        });
        let message = format!(
            "{} stole the {} set from {}!",
            self.players[seat].name, colour, self.players[target].name
        );
        self.log_all(seats, &message);
        Ok(())
    }

    pub fn play_sly_deal(&mut self, seat: usize, seats: &mut Seats) -> Result<(), PlayError> {
        let target = self.choose_opponent(seat, seats)?;
        let mut candidates = self.players[target].properties_to_list(true);
        if candidates.is_empty() {
            let message = format!("{} has no properties to take!", self.players[target].name);
            let reason = InvalidChoice::NoPropertiesToTake {
                target: self.players[target].id,
            };
            return Err(self.reject(seat, seats, reason, &message));
        }
        let choice =
            seat_mut(seats, seat)?.choose_property_target(self, &self.players[target], &candidates);
        let card = candidates.swap_remove(checked_choice(choice, candidates.len())?);

        let message = format!(
            "{} took {} from {}",
            self.players[seat].name, card.name, self.players[target].name
        );
        self.record_event(GameEvent::PropertyTaken {
            from: self.players[target].id,
            to: self.players[seat].id,
            card_id: card.id,
        });
        self.players[target].remove_property(card.id);
        self.players[seat].add_property(card);
        self.log_all(seats, &message);
        Ok(())
    }

    pub fn play_forced_deal(&mut self, seat: usize, seats: &mut Seats) -> Result<(), PlayError> {
        let mut own = self.players[seat].properties_to_list(true);
        if own.is_empty() {
            let message = format!("{} has no properties to swap!", self.players[seat].name);
            let reason = InvalidChoice::NoPropertiesToSwap {
                player: self.players[seat].id,
            };
            return Err(self.reject(seat, seats, reason, &message));
        }
        let target = self.choose_opponent(seat, seats)?;
        let mut theirs = self.players[target].properties_to_list(true);
        if theirs.is_empty() {
            let message = format!("{} has no properties to swap!", self.players[target].name);
            let reason = InvalidChoice::NoPropertiesToSwap {
                player: self.players[target].id,
            };
            return Err(self.reject(seat, seats, reason, &message));
        }

        let choice =
            seat_mut(seats, seat)?.choose_property_target(self, &self.players[target], &theirs);
        let taken = theirs.swap_remove(checked_choice(choice, theirs.len())?);
        let choice = seat_mut(seats, seat)?.choose_property_source(self, &self.players[seat], &own);
        let given = own.swap_remove(checked_choice(choice, own.len())?);

        self.swap_properties(seat, target, taken, given, seats);
        Ok(())
    }

    fn swap_properties(
        &mut self,
        seat: usize,
        target: usize,
        taken: PropertyCard,
        given: PropertyCard,
        seats: &mut Seats,
    ) {
        let message = format!(
            "{} forced {} to swap {} with {}",
            self.players[seat].name, self.players[target].name, taken.name, given.name
        );
        self.record_event(GameEvent::PropertiesSwapped {
            actor: self.players[seat].id,
            target: self.players[target].id,
            taken: taken.id,
            given: given.id,
        });
        self.players[target].remove_property(taken.id);
        self.players[seat].remove_property(given.id);
        self.players[seat].add_property(taken);
        self.players[target].add_property(given);
        self.log_all(seats, &message);
    }

    /// The colour and amount a rent card charges. A single eligible colour is
    /// taken without asking.
    pub fn rent_colour_and_amount(
        &self,
        seat: usize,
        card: &ActionCard,
        seats: &mut Seats,
    ) -> Result<RentOption, PlayError> {
        let colours = card.kind.rent_colours().unwrap_or(&[]);
        let options = self.player(seat)?.owned_colours_with_rents(colours);
        match options.as_slice() {
            [] => Err(self.reject(
                seat,
                seats,
                InvalidChoice::NoRentColour,
                "You do not own any properties of the required colours",
            )),
            [only] => Ok(*only),
            _ => {
                let choice = seat_mut(seats, seat)?.choose_rent_colour_and_amount(
                    self,
                    &self.players[seat],
                    &options,
                );
                Ok(options[checked_choice(choice, options.len())?])
            }
        }
    }

    pub fn play_rent_card(
        &mut self,
        seat: usize,
        card: &ActionCard,
        seats: &mut Seats,
    ) -> Result<(), PlayError> {
        let rent = self.rent_colour_and_amount(seat, card, seats)?;
        if card.kind == ActionKind::RentWild {
            let target = self.choose_opponent(seat, seats)?;
            self.transfer_payment(target, seat, rent.amount, seats)?;
            let message = format!(
                "{} charged {} £{} in {} rent",
                self.players[seat].name, self.players[target].name, rent.amount, rent.colour
            );
            self.log_all(seats, &message);
        } else {
            for target in 0..self.players.len() {
                if target != seat {
                    self.transfer_payment(target, seat, rent.amount, seats)?;
                }
            }
            let message = format!(
                "{} charged everybody £{} in {} rent",
                self.players[seat].name, rent.amount, rent.colour
            );
            self.log_all(seats, &message);
        }
        Ok(())
    }

    pub fn play_debt_collector(&mut self, seat: usize, seats: &mut Seats) -> Result<(), PlayError> {
        let target = self.choose_opponent(seat, seats)?;
        let amount = self.config.debt_amount;
        let message = format!(
            "{} collected £{} debt from {}",
            self.players[seat].name, amount, self.players[target].name
        );
        self.log_all(seats, &message);
        self.transfer_payment(target, seat, amount, seats)?;
        Ok(())
    }

    pub fn play_birthday(&mut self, seat: usize, seats: &mut Seats) -> Result<(), PlayError> {
        let amount = self.config.birthday_amount;
        for target in 0..self.players.len() {
            if target != seat {
                self.transfer_payment(target, seat, amount, seats)?;
            }
        }
        let message = format!(
            "{} collected £{} from each player for their birthday",
            self.players[seat].name, amount
        );
        self.log_all(seats, &message);
        Ok(())
    }

    pub fn play_pass_go(&mut self, seat: usize, seats: &mut Seats) -> Result<(), PlayError> {
        let count = self.config.pass_go_draw;
        self.deal_to_player(seat, count)?;
        let message = format!("{} passed GO and picked up {} cards", self.players[seat].name, count);
        self.log_all(seats, &message);
        Ok(())
    }
}

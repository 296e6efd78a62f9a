use super::decision::{checked_choice, Seats};
use super::rules::{EngineError, PlayError};
use super::state::{Game, GameOutcome};

impl Game {
    /// Draws as many of `count` cards as the deck and discard pile still hold.
    fn deal_available(&mut self, seat: usize, count: usize) -> Result<usize, EngineError> {
        let available = count.min(self.deck.len() + self.discard_pile.len());
        self.deal_to_player(seat, available)?;
        Ok(available)
    }

    /// Runs one full turn for the current player. Returns the outcome if the
    /// game ended during the turn.
    pub fn play_turn(&mut self, seats: &mut Seats) -> Result<Option<GameOutcome>, EngineError> {
        if self.is_finished() {
            return Err(EngineError::GameFinished);
        }
        if seats.len() != self.players.len() {
            return Err(EngineError::SeatMismatch {
                players: self.players.len(),
                seats: seats.len(),
            });
        }

        let seat = self.current_player_index;
        self.deal_available(seat, self.config.turn_draw)?;

        let mut plays = 0;
        while plays < self.config.plays_per_turn {
            for maker in seats.iter_mut() {
                maker.notify_draw_state(self);
            }
            let hand_size = self.players[seat].hand.len();
            if hand_size == 0 {
                break;
            }
            let choice = seats[seat].choose_card_in_hand(self, &self.players[seat]);
            let index = checked_choice(choice, hand_size)?;
            match self.play_card_from_hand(seat, index, seats) {
                Ok(()) => plays += 1,
                Err(PlayError::Invalid(_)) => continue,
                Err(PlayError::Fatal(error)) => return Err(error),
            }

            if self.players[seat].hand.is_empty() {
                self.deal_available(seat, self.config.starting_cards)?;
            }
            if let Some(outcome) = self.check_win(seats) {
                return Ok(Some(outcome));
            }
        }

        self.end_turn(seats);
        Ok(None)
    }

    /// Plays turns until someone wins or `max_turns` turns have passed.
    pub fn run(&mut self, seats: &mut Seats, max_turns: u32) -> Result<GameOutcome, EngineError> {
        if let Some(outcome) = &self.outcome {
            return Ok(outcome.clone());
        }
        for _ in 0..max_turns {
            if let Some(outcome) = self.play_turn(seats)? {
                return Ok(outcome);
            }
        }
        Err(EngineError::TurnLimitReached { turns: max_turns })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::cards::{demo_deck, ActionKind, Card, PropertyColour};
    use crate::game::decision::{ActionUsage, DecisionMaker};
    use crate::game::testing::{action, lot, quiet_seats, table, Scripted};

    #[test]
    fn turn_draws_plays_three_and_passes_on() {
        let deck = (1..=10).map(|id| Card::money(id, 1)).collect();
        let mut game = table(2, deck);
        let mut seats = quiet_seats(2);

        let outcome = game.play_turn(&mut seats).expect("turn completes");
        assert!(outcome.is_none());
        // 抽 2 张现金全部存入，手牌空后补 5 张再打 1 张
        assert_eq!(game.players[0].total_bank_value(), 3);
        assert_eq!(game.players[0].hand.len(), 4);
        assert_eq!(game.current_player_index, 1);
        assert_eq!(game.current_turn, 1);
    }

    #[test]
    fn invalid_choice_does_not_use_up_a_play() {
        let mut game = table(2, vec![Card::money(1, 1), Card::money(2, 2)]);
        game.players[0].add_to_hand(Card::Action(action(50, ActionKind::SlyDeal)));
        let scripted = Scripted::new()
            .cards([0, 1, 1, 0])
            .usages([ActionUsage::Play, ActionUsage::Bank]);
        let logs = scripted.logs();
        let mut seats = quiet_seats(2);
        seats[0] = Box::new(scripted);

        game.play_turn(&mut seats).expect("turn completes");
        // 第一次偷地产失败，牌留在手中；之后三次都算数
        assert_eq!(game.players[0].total_bank_value(), 6);
        assert_eq!(game.players[0].hand.len(), 0);
        assert_eq!(game.discard_pile.len(), 0);
        assert!(logs.borrow().iter().any(|line| line.contains("no properties to take")));
    }

    #[test]
    fn completing_the_winning_set_ends_the_game_at_once() {
        let mut game = table(2, vec![Card::money(1, 1), Card::money(2, 1)]);
        game.config.sets_to_win = 1;
        game.players[0].add_property(lot(10, PropertyColour::Brown, 1));
        game.players[0].add_to_hand(Card::Property(lot(11, PropertyColour::Brown, 1)));
        let mut seats = quiet_seats(2);
        seats[0] = Box::new(Scripted::new().cards([0]));

        let outcome = game.play_turn(&mut seats).expect("turn completes");
        assert_eq!(
            outcome,
            Some(GameOutcome::Winner {
                player: game.players[0].id
            })
        );
        assert_eq!(game.current_player_index, 0);
        assert_eq!(game.play_turn(&mut seats), Err(EngineError::GameFinished));
    }

    #[test]
    fn seat_count_must_match() {
        let mut game = table(3, demo_deck());
        let mut seats: Vec<Box<dyn DecisionMaker>> = quiet_seats(2);
        assert_eq!(
            game.play_turn(&mut seats),
            Err(EngineError::SeatMismatch {
                players: 3,
                seats: 2
            })
        );
    }

    #[test]
    fn run_stops_at_the_turn_cap() {
        let mut game = table(2, Vec::new());
        let mut seats = quiet_seats(2);
        assert_eq!(
            game.run(&mut seats, 4),
            Err(EngineError::TurnLimitReached { turns: 4 })
        );
        assert_eq!(game.current_turn, 4);
    }
}

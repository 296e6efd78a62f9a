use serde::{Deserialize, Serialize};

use super::cards::{ActionCard, PropertyCard, PropertyColour};
use super::player::{Player, PlayerId};
use super::rules::EngineError;
use super::state::{Game, GameOutcome};

/// 行动牌的用法：打出结算，或当作现金存入银行。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActionUsage {
    Play,
    Bank,
}

/// 租金候选：颜色及按当前持有张数计算的金额。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RentOption {
    pub colour: PropertyColour,
    pub amount: u32,
}

/// 座位上的决策者。引擎在需要子选择时同步调用，返回值是候选切片中的下标。
///
/// `player` 参数总是被询问的那名玩家本人，`target` 是被选作目标的对手。
pub trait DecisionMaker {
    fn choose_card_in_hand(&mut self, game: &Game, player: &Player) -> usize;

    fn choose_action_usage(&mut self, game: &Game, player: &Player, card: &ActionCard)
        -> ActionUsage;

    fn choose_player_target(&mut self, game: &Game, player: &Player, targets: &[PlayerId])
        -> usize;

    fn choose_full_set_target(
        &mut self,
        game: &Game,
        target: &Player,
        colours: &[PropertyColour],
    ) -> usize;

    fn choose_property_target(
        &mut self,
        game: &Game,
        target: &Player,
        properties: &[PropertyCard],
    ) -> usize;

    /// Picks one of the player's own properties to give up, either as payment
    /// or as the actor's half of a forced deal.
    fn choose_property_source(
        &mut self,
        game: &Game,
        player: &Player,
        properties: &[PropertyCard],
    ) -> usize;

    fn choose_rent_colour_and_amount(
        &mut self,
        game: &Game,
        player: &Player,
        options: &[RentOption],
    ) -> usize;

    fn log(&mut self, _message: &str) {}

    fn notify_turn_over(&mut self, _game: &Game) {}

    fn notify_game_over(&mut self, _game: &Game, _outcome: &GameOutcome) {}

    fn notify_draw_state(&mut self, _game: &Game) {}
}

/// 按座位顺序排列的决策者，与 `Game::players` 一一对应。
pub type Seats = [Box<dyn DecisionMaker>];

pub fn seat_mut(seats: &mut Seats, seat: usize) -> Result<&mut Box<dyn DecisionMaker>, EngineError> {
    seats
        .get_mut(seat)
        .ok_or(EngineError::PlayerNotFound { seat })
}

/// Validates a decision maker's answer against the number of candidates.
pub fn checked_choice(index: usize, candidates: usize) -> Result<usize, EngineError> {
    if index < candidates {
        Ok(index)
    } else {
        Err(EngineError::ChoiceOutOfRange { index, candidates })
    }
}

/// 模拟中代替对手座位的被动决策者：总是选第一个候选，付款时交出价值最低的地产。
#[derive(Debug, Clone, Copy, Default)]
pub struct Passive;

impl DecisionMaker for Passive {
    fn choose_card_in_hand(&mut self, _game: &Game, _player: &Player) -> usize {
        0
    }

    fn choose_action_usage(
        &mut self,
        _game: &Game,
        _player: &Player,
        _card: &ActionCard,
    ) -> ActionUsage {
        ActionUsage::Bank
    }

    fn choose_player_target(
        &mut self,
        _game: &Game,
        _player: &Player,
        _targets: &[PlayerId],
    ) -> usize {
        0
    }

    fn choose_full_set_target(
        &mut self,
        _game: &Game,
        _target: &Player,
        _colours: &[PropertyColour],
    ) -> usize {
        0
    }

    fn choose_property_target(
        &mut self,
        _game: &Game,
        _target: &Player,
        _properties: &[PropertyCard],
    ) -> usize {
        0
    }

    fn choose_property_source(
        &mut self,
        _game: &Game,
        _player: &Player,
        properties: &[PropertyCard],
    ) -> usize {
        cheapest_property(properties)
    }

    fn choose_rent_colour_and_amount(
        &mut self,
        _game: &Game,
        _player: &Player,
        _options: &[RentOption],
    ) -> usize {
        0
    }
}

/// Index of the first property with the lowest value; 0 for an empty slice.
pub fn cheapest_property(properties: &[PropertyCard]) -> usize {
    properties
        .iter()
        .enumerate()
        .min_by_key(|(_, card)| card.value)
        .map(|(index, _)| index)
        .unwrap_or(0)
}

/// Index of the first property with the highest value; 0 for an empty slice.
pub fn dearest_property(properties: &[PropertyCard]) -> usize {
    properties
        .iter()
        .enumerate()
        .rev()
        .max_by_key(|(_, card)| card.value)
        .map(|(index, _)| index)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(id: u32, value: u32) -> PropertyCard {
        PropertyCard {
            id,
            name: format!("lot {id}"),
            value,
            colour: PropertyColour::Orange,
        }
    }

    #[test]
    fn out_of_range_choice_is_fatal() {
        assert_eq!(checked_choice(1, 2), Ok(1));
        assert_eq!(
            checked_choice(2, 2),
            Err(EngineError::ChoiceOutOfRange {
                index: 2,
                candidates: 2
            })
        );
    }

    #[test]
    fn property_pickers_prefer_first_on_ties() {
        let cards = vec![card(1, 2), card(2, 1), card(3, 4), card(4, 1), card(5, 4)];
        assert_eq!(cheapest_property(&cards), 1);
        assert_eq!(dearest_property(&cards), 2);
        assert_eq!(cheapest_property(&[]), 0);
    }
}

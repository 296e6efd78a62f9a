use itertools::Itertools;
use serde::{Deserialize, Serialize};

use super::cards::{BankCard, CardId, PropertyCard};
use super::decision::{checked_choice, seat_mut, Seats};
use super::player::Player;
use super::rules::EngineError;
use super::state::{Game, GameEvent};

/// 债务人交出的牌。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Payment {
    pub bank_cards: Vec<BankCard>,
    pub properties: Vec<PropertyCard>,
}

impl Payment {
    pub fn total_value(&self) -> u32 {
        let bank: u32 = self.bank_cards.iter().map(BankCard::value).sum();
        let properties: u32 = self.properties.iter().map(|card| card.value).sum();
        bank + properties
    }

    pub fn is_empty(&self) -> bool {
        self.bank_cards.is_empty() && self.properties.is_empty()
    }

    pub fn card_ids(&self) -> (Vec<CardId>, Vec<CardId>) {
        (
            self.bank_cards.iter().map(BankCard::id).collect(),
            self.properties.iter().map(|card| card.id).collect(),
        )
    }
}

/// Smallest total at or above `amount` that some subset of `values` sums to.
fn cheapest_reachable_total(values: &[u32], amount: u32) -> Option<u32> {
    let total: u32 = values.iter().sum();
    let mut reachable = vec![false; total as usize + 1];
    reachable[0] = true;
    for &value in values {
        let value = value as usize;
        for sum in (value..reachable.len()).rev() {
            if reachable[sum - value] {
                reachable[sum] = true;
            }
        }
    }
    (amount..=total).find(|&sum| reachable[sum as usize])
}

/// Cheapest subset of `values` whose total reaches `amount`, as ascending indices.
/// Ties go to the fewest cards, then to the lexicographically first indices.
fn cheapest_covering_subset(values: &[u32], amount: u32) -> Option<Vec<usize>> {
    let target = cheapest_reachable_total(values, amount)?;
    (1..=values.len()).find_map(|size| {
        (0..values.len())
            .combinations(size)
            .find(|indices| indices.iter().map(|&i| values[i]).sum::<u32>() == target)
    })
}

impl Player {
    /// Takes bank cards covering `amount` with the least overpayment. When the
    /// bank cannot cover it the whole bank goes and the shortfall is returned.
    pub fn charge_money_payment(&mut self, amount: u32) -> (Vec<BankCard>, u32) {
        if amount == 0 {
            return (Vec::new(), 0);
        }
        let total = self.total_bank_value();
        if total < amount {
            return (std::mem::take(&mut self.bank), amount - total);
        }

        let values: Vec<u32> = self.bank.iter().map(BankCard::value).collect();
        let chosen = cheapest_covering_subset(&values, amount).unwrap_or_default();
        let mut charged = Vec::with_capacity(chosen.len());
        let mut kept = Vec::with_capacity(self.bank.len() - chosen.len());
        for (index, card) in std::mem::take(&mut self.bank).into_iter().enumerate() {
            if chosen.contains(&index) {
                charged.push(card);
            } else {
                kept.push(card);
            }
        }
        self.bank = kept;
        (charged, 0)
    }
}

impl Game {
    /// Removes a payment of `amount` from `seat`: money first, then properties
    /// chosen one at a time by the debtor until the shortfall is covered.
    pub fn charge_payment(
        &mut self,
        seat: usize,
        amount: u32,
        seats: &mut Seats,
    ) -> Result<Payment, EngineError> {
        self.player(seat)?;
        let (bank_cards, mut remainder) = self.players[seat].charge_money_payment(amount);

        let mut payment = Payment {
            bank_cards,
            properties: Vec::new(),
        };
        while remainder > 0 {
            let mut candidates = self.players[seat].properties_to_list(false);
            if candidates.is_empty() {
                break;
            }
            let choice = match seat_mut(seats, seat) {
                Ok(maker) => maker.choose_property_source(self, &self.players[seat], &candidates),
                Err(error) => return Err(self.refund(seat, payment, error)),
            };
            let index = match checked_choice(choice, candidates.len()) {
                Ok(index) => index,
                Err(error) => return Err(self.refund(seat, payment, error)),
            };
            let card = candidates.swap_remove(index);
            self.players[seat].remove_property(card.id);
            remainder = remainder.saturating_sub(card.value);
            payment.properties.push(card);
        }

        Ok(payment)
    }

    /// Hands a half-collected payment back to the debtor and passes `error` on.
    fn refund(&mut self, seat: usize, payment: Payment, error: EngineError) -> EngineError {
        let debtor = &mut self.players[seat];
        for card in payment.bank_cards {
            debtor.add_to_bank(card);
        }
        for card in payment.properties {
            debtor.add_property(card);
        }
        error
    }

    /// Charges `from` and credits everything surrendered to `to`.
    pub fn transfer_payment(
        &mut self,
        from: usize,
        to: usize,
        amount: u32,
        seats: &mut Seats,
    ) -> Result<Payment, EngineError> {
        self.player(to)?;
        let payment = self.charge_payment(from, amount, seats)?;
        let (bank_ids, property_ids) = payment.card_ids();
        self.record_event(GameEvent::PaymentMade {
            from: self.players[from].id,
            to: self.players[to].id,
            owed: amount,
            bank_cards: bank_ids,
            properties: property_ids,
        });

        let payee = &mut self.players[to];
        for card in payment.bank_cards.iter().cloned() {
            payee.add_to_bank(card);
        }
        for card in payment.properties.iter().cloned() {
            payee.add_property(card);
        }
        Ok(payment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::cards::PropertyColour;
    use crate::game::testing::{bank_money, lot, quiet_seats, table, Scripted};

    fn bank_values(player: &Player) -> Vec<u32> {
        player.bank.iter().map(BankCard::value).collect()
    }

    #[test]
    fn single_card_beats_a_pair_with_the_same_overpayment() {
        let mut game = table(2, Vec::new());
        for (id, value) in [(1, 2), (2, 3), (3, 5)] {
            game.players[0].add_to_bank(bank_money(id, value));
        }
        let (charged, remainder) = game.players[0].charge_money_payment(4);
        assert_eq!(charged.iter().map(BankCard::value).collect::<Vec<_>>(), vec![5]);
        assert_eq!(remainder, 0);
        assert_eq!(bank_values(&game.players[0]), vec![2, 3]);
    }

    #[test]
    fn exact_pair_is_preferred_over_larger_single() {
        let mut game = table(2, Vec::new());
        for (id, value) in [(1, 10), (2, 1), (3, 3)] {
            game.players[0].add_to_bank(bank_money(id, value));
        }
        let (charged, remainder) = game.players[0].charge_money_payment(4);
        assert_eq!(charged.iter().map(BankCard::id).collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(remainder, 0);
    }

    #[test]
    fn short_bank_is_surrendered_whole() {
        let mut game = table(2, Vec::new());
        for (id, value) in [(1, 1), (2, 2), (3, 2)] {
            game.players[0].add_to_bank(bank_money(id, value));
        }
        let (charged, remainder) = game.players[0].charge_money_payment(6);
        assert_eq!(charged.len(), 3);
        assert_eq!(remainder, 1);
        assert!(game.players[0].bank.is_empty());
    }

    #[test]
    fn zero_amount_takes_nothing() {
        let mut game = table(2, Vec::new());
        game.players[0].add_to_bank(bank_money(1, 5));
        game.players[0].add_property(lot(2, PropertyColour::Red, 3));
        let mut seats = quiet_seats(2);
        let payment = game.charge_payment(0, 0, &mut seats).expect("no-op charge");
        assert!(payment.is_empty());
        assert_eq!(game.players[0].total_bank_value(), 5);
        assert_eq!(game.players[0].n_properties(false), 1);
    }

    #[test]
    fn shortfall_is_covered_by_debtor_chosen_properties() {
        let mut game = table(2, Vec::new());
        game.players[1].add_to_bank(bank_money(1, 1));
        game.players[1].add_property(lot(2, PropertyColour::Red, 3));
        game.players[1].add_property(lot(3, PropertyColour::Brown, 1));
        game.players[1].add_property(lot(4, PropertyColour::Green, 4));

        let mut seats = quiet_seats(2);
        let payment = game.transfer_payment(1, 0, 4, &mut seats).expect("transfer");
        // 现金不足 3，被动方先交最便宜的棕色，再交红色
        assert_eq!(
            payment.properties.iter().map(|card| card.id).collect::<Vec<_>>(),
            vec![3, 2]
        );
        assert_eq!(payment.total_value(), 5);
        assert_eq!(game.players[1].n_properties(false), 1);
        assert_eq!(game.players[0].total_bank_value(), 1);
        assert_eq!(game.players[0].property_set(PropertyColour::Red).count(), 1);
        assert_eq!(game.players[0].property_set(PropertyColour::Brown).count(), 1);
        assert!(matches!(
            game.event_log.last(),
            Some(GameEvent::PaymentMade { owed: 4, .. })
        ));
    }

    #[test]
    fn broke_debtor_pays_nothing_more() {
        let mut game = table(2, Vec::new());
        game.players[1].add_to_bank(bank_money(1, 2));
        let mut seats = quiet_seats(2);
        let payment = game.transfer_payment(1, 0, 5, &mut seats).expect("transfer");
        assert_eq!(payment.total_value(), 2);
        assert_eq!(game.players[0].total_bank_value(), 2);
        game.integrity_check().expect("cards are conserved");
    }

    #[test]
    fn bad_property_choice_is_fatal() {
        let mut game = table(2, Vec::new());
        game.players[1].add_property(lot(2, PropertyColour::Red, 3));
        let mut seats = quiet_seats(2);
        seats[1] = Box::new(Scripted::new().property_sources([4]));
        let err = game
            .charge_payment(1, 2, &mut seats)
            .expect_err("index 4 is out of range");
        assert_eq!(
            err,
            EngineError::ChoiceOutOfRange {
                index: 4,
                candidates: 1
            }
        );
    }

    #[test]
    fn fatal_choice_hands_collected_cards_back() {
        let mut game = table(2, Vec::new());
        game.players[1].add_to_bank(bank_money(1, 1));
        game.players[1].add_property(lot(2, PropertyColour::Red, 3));
        game.players[1].add_property(lot(3, PropertyColour::Green, 4));
        let mut seats = quiet_seats(2);
        seats[1] = Box::new(Scripted::new().property_sources([0, 7]));

        let err = game
            .transfer_payment(1, 0, 8, &mut seats)
            .expect_err("second pick is out of range");
        assert_eq!(
            err,
            EngineError::ChoiceOutOfRange {
                index: 7,
                candidates: 1
            }
        );
        assert_eq!(game.players[1].total_bank_value(), 1);
        assert_eq!(game.players[1].n_properties(false), 2);
        assert_eq!(game.players[0].total_bank_value(), 0);
        assert_eq!(game.all_card_ids().len(), 3);
        assert!(game.event_log.is_empty());
    }

    #[test]
    fn large_bank_of_equal_notes_is_charged_quickly() {
        let mut game = table(2, Vec::new());
        for id in 1..=26 {
            game.players[0].add_to_bank(bank_money(id, 2));
        }
        let (charged, remainder) = game.players[0].charge_money_payment(5);
        assert_eq!(charged.iter().map(BankCard::id).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(remainder, 0);
        assert_eq!(game.players[0].bank.len(), 23);
    }

    #[test]
    fn reachable_total_skips_impossible_sums() {
        assert_eq!(cheapest_reachable_total(&[2, 3, 5], 4), Some(5));
        assert_eq!(cheapest_reachable_total(&[4, 4], 5), Some(8));
        assert_eq!(cheapest_reachable_total(&[1, 2], 4), None);
    }
}

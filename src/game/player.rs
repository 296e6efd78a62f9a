use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::cards::{BankCard, Card, CardId, PropertyCard, PropertyColour};
use super::decision::RentOption;

/// 玩家标识。由调用方在创建玩家时一次性生成，与名字无关。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct PlayerId(u128);

impl PlayerId {
    pub const fn from_u128(value: u128) -> Self {
        Self(value)
    }

    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(rng.gen())
    }

    pub fn as_u128(self) -> u128 {
        self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = format!("{:032x}", self.0);
        write!(
            f,
            "{}-{}-{}-{}-{}",
            &hex[0..8],
            &hex[8..12],
            &hex[12..16],
            &hex[16..20],
            &hex[20..32]
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid player id `{0}`")]
pub struct ParsePlayerIdError(pub String);

impl FromStr for PlayerId {
    type Err = ParsePlayerIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits: String = s.chars().filter(|c| *c != '-').collect();
        if digits.is_empty() || digits.len() > 32 {
            return Err(ParsePlayerIdError(s.to_string()));
        }
        u128::from_str_radix(&digits, 16)
            .map(PlayerId)
            .map_err(|_| ParsePlayerIdError(s.to_string()))
    }
}

impl From<PlayerId> for String {
    fn from(id: PlayerId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for PlayerId {
    type Error = ParsePlayerIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// 快照中的数据不满足地产摆放约束。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum SnapshotError {
    #[error("property set keyed {key} holds a {found} set")]
    SetKeyMismatch {
        key: PropertyColour,
        found: PropertyColour,
    },
    #[error("{colour} set declares required count {declared}")]
    RequiredCountMismatch {
        colour: PropertyColour,
        declared: usize,
    },
    #[error("card {card_id} of colour {card_colour} placed in the {set_colour} set")]
    ColourMismatch {
        card_id: CardId,
        card_colour: PropertyColour,
        set_colour: PropertyColour,
    },
    #[error("current player index {index} out of range for {players} players")]
    CurrentPlayerOutOfRange { index: usize, players: usize },
}

/// 某一颜色下玩家持有的地产。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PropertySet {
    colour: PropertyColour,
    required_count: usize,
    cards: Vec<PropertyCard>,
}

impl PropertySet {
    pub fn new(colour: PropertyColour) -> Self {
        Self {
            colour,
            required_count: colour.required_count(),
            cards: Vec::new(),
        }
    }

    pub fn colour(&self) -> PropertyColour {
        self.colour
    }

    pub fn required_count(&self) -> usize {
        self.required_count
    }

    pub fn cards(&self) -> &[PropertyCard] {
        &self.cards
    }

    pub fn add(&mut self, card: PropertyCard) -> Result<(), SnapshotError> {
        if card.colour != self.colour {
            return Err(SnapshotError::ColourMismatch {
                card_id: card.id,
                card_colour: card.colour,
                set_colour: self.colour,
            });
        }
        self.cards.push(card);
        Ok(())
    }

    pub fn remove(&mut self, card_id: CardId) -> Option<PropertyCard> {
        let pos = self.cards.iter().position(|card| card.id == card_id)?;
        Some(self.cards.remove(pos))
    }

    pub fn count(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.cards.len() >= self.required_count
    }

    pub fn rent(&self) -> u32 {
        self.colour.rent_for(self.cards.len())
    }

    pub fn value(&self) -> u32 {
        self.cards.iter().map(|card| card.value).sum()
    }

    fn take_all(&mut self) -> Vec<PropertyCard> {
        std::mem::take(&mut self.cards)
    }
}

/// 玩家在线路上传输的可见状态。非本人视角下省略手牌。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerSnapshot {
    pub index: PlayerId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hand: Option<Vec<Card>>,
    #[serde(default)]
    pub properties: BTreeMap<PropertyColour, PropertySet>,
    #[serde(default)]
    pub bank: Vec<BankCard>,
}

/// 玩家状态：手牌、按颜色分组的地产、银行。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "PlayerSnapshot", try_from = "PlayerSnapshot")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub hand: Vec<Card>,
    properties: BTreeMap<PropertyColour, PropertySet>,
    pub bank: Vec<BankCard>,
}

impl PartialEq for Player {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Player {}

impl Hash for Player {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

fn empty_property_sets() -> BTreeMap<PropertyColour, PropertySet> {
    PropertyColour::ALL
        .iter()
        .map(|colour| (*colour, PropertySet::new(*colour)))
        .collect()
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            hand: Vec::new(),
            properties: empty_property_sets(),
            bank: Vec::new(),
        }
    }

    pub fn with_random_id<R: Rng + ?Sized>(name: impl Into<String>, rng: &mut R) -> Self {
        Self::new(PlayerId::generate(rng), name)
    }

    pub fn add_to_hand(&mut self, card: Card) {
        self.hand.push(card);
    }

    pub fn find_card_in_hand_index(&self, card_id: CardId) -> Option<usize> {
        self.hand.iter().position(|card| card.id() == card_id)
    }

    pub fn remove_from_hand(&mut self, index: usize) -> Option<Card> {
        if index < self.hand.len() {
            Some(self.hand.remove(index))
        } else {
            None
        }
    }

    pub fn add_property(&mut self, card: PropertyCard) {
        self.properties
            .entry(card.colour)
            .or_insert_with(|| PropertySet::new(card.colour))
            .cards
            .push(card);
    }

    pub fn add_to_bank(&mut self, card: BankCard) {
        self.bank.push(card);
    }

    pub fn property_set(&self, colour: PropertyColour) -> &PropertySet {
        // 构造时已为十种颜色各建一个空集合
        &self.properties[&colour]
    }

    pub fn property_sets(&self) -> impl Iterator<Item = &PropertySet> {
        self.properties.values()
    }

    pub fn remove_property(&mut self, card_id: CardId) -> Option<PropertyCard> {
        self.properties
            .values_mut()
            .find_map(|set| set.remove(card_id))
    }

    /// Removes every card of `colour` and returns them in set order.
    pub fn take_set(&mut self, colour: PropertyColour) -> Vec<PropertyCard> {
        self.properties
            .get_mut(&colour)
            .map(PropertySet::take_all)
            .unwrap_or_default()
    }

    pub fn total_bank_value(&self) -> u32 {
        self.bank.iter().map(BankCard::value).sum()
    }

    pub fn total_property_value(&self) -> u32 {
        self.properties.values().map(PropertySet::value).sum()
    }

    pub fn properties_to_list(&self, without_full_sets: bool) -> Vec<PropertyCard> {
        self.properties
            .values()
            .filter(|set| !(without_full_sets && set.is_complete()))
            .flat_map(|set| set.cards.iter().cloned())
            .collect()
    }

    pub fn n_properties(&self, without_full_sets: bool) -> usize {
        self.properties
            .values()
            .filter(|set| !(without_full_sets && set.is_complete()))
            .map(PropertySet::count)
            .sum()
    }

    pub fn has_properties(&self, without_full_sets: bool) -> bool {
        self.n_properties(without_full_sets) > 0
    }

    pub fn complete_set_colours(&self) -> Vec<PropertyColour> {
        self.properties
            .values()
            .filter(|set| set.is_complete())
            .map(PropertySet::colour)
            .collect()
    }

    pub fn complete_set_count(&self) -> usize {
        self.properties.values().filter(|set| set.is_complete()).count()
    }

    pub fn has_complete_property_set(&self) -> bool {
        self.complete_set_count() > 0
    }

    pub fn has_won(&self, sets_to_win: usize) -> bool {
        self.complete_set_count() >= sets_to_win
    }

    /// The subset of `colours` this player holds at least one card of, each
    /// paired with its current rent.
    pub fn owned_colours_with_rents(&self, colours: &[PropertyColour]) -> Vec<RentOption> {
        colours
            .iter()
            .map(|colour| self.property_set(*colour))
            .filter(|set| !set.is_empty())
            .map(|set| RentOption {
                colour: set.colour(),
                amount: set.rent(),
            })
            .collect()
    }

    pub fn snapshot(&self, reveal_hand: bool) -> PlayerSnapshot {
        PlayerSnapshot {
            index: self.id,
            name: self.name.clone(),
            hand: reveal_hand.then(|| self.hand.clone()),
            properties: self.properties.clone(),
            bank: self.bank.clone(),
        }
    }

    pub fn from_snapshot(snapshot: PlayerSnapshot) -> Result<Self, SnapshotError> {
        let mut player = Player::new(snapshot.index, snapshot.name);
        player.hand = snapshot.hand.unwrap_or_default();
        player.bank = snapshot.bank;
        for (key, set) in snapshot.properties {
            if key != set.colour {
                return Err(SnapshotError::SetKeyMismatch {
                    key,
                    found: set.colour,
                });
            }
            if set.required_count != key.required_count() {
                return Err(SnapshotError::RequiredCountMismatch {
                    colour: key,
                    declared: set.required_count,
                });
            }
            let target = player
                .properties
                .entry(key)
                .or_insert_with(|| PropertySet::new(key));
            for card in set.cards {
                target.add(card)?;
            }
        }
        Ok(player)
    }
}

impl From<Player> for PlayerSnapshot {
    fn from(player: Player) -> Self {
        PlayerSnapshot {
            index: player.id,
            name: player.name,
            hand: Some(player.hand),
            properties: player.properties,
            bank: player.bank,
        }
    }
}

impl TryFrom<PlayerSnapshot> for Player {
    type Error = SnapshotError;

    fn try_from(snapshot: PlayerSnapshot) -> Result<Self, Self::Error> {
        Player::from_snapshot(snapshot)
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

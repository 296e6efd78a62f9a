use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// 一局游戏内唯一的卡牌标识。
pub type CardId = u32;

/// 地产颜色。铁路与公共事业也按普通颜色参与成套判定。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropertyColour {
    Brown,
    LightBlue,
    Pink,
    Orange,
    Red,
    Yellow,
    Green,
    DarkBlue,
    Railroad,
    Utility,
}

impl PropertyColour {
    pub const ALL: [PropertyColour; 10] = [
        PropertyColour::Brown,
        PropertyColour::LightBlue,
        PropertyColour::Pink,
        PropertyColour::Orange,
        PropertyColour::Red,
        PropertyColour::Yellow,
        PropertyColour::Green,
        PropertyColour::DarkBlue,
        PropertyColour::Railroad,
        PropertyColour::Utility,
    ];

    /// 成套所需的张数。
    pub fn required_count(self) -> usize {
        match self {
            PropertyColour::Brown | PropertyColour::DarkBlue | PropertyColour::Utility => 2,
            PropertyColour::Railroad => 4,
            _ => 3,
        }
    }

    /// 租金表，下标为 (持有张数 - 1)。
    pub fn rent_table(self) -> &'static [u32] {
        match self {
            PropertyColour::Brown => &[1, 2],
            PropertyColour::LightBlue => &[1, 2, 3],
            PropertyColour::Pink => &[1, 2, 4],
            PropertyColour::Orange => &[1, 3, 5],
            PropertyColour::Red => &[2, 3, 6],
            PropertyColour::Yellow => &[2, 4, 6],
            PropertyColour::Green => &[2, 4, 7],
            PropertyColour::DarkBlue => &[3, 8],
            PropertyColour::Railroad => &[1, 2, 3, 4],
            PropertyColour::Utility => &[1, 2],
        }
    }

    /// Rent owed for holding `count` cards of this colour.
    pub fn rent_for(self, count: usize) -> u32 {
        if count == 0 {
            return 0;
        }
        let table = self.rent_table();
        table[count.min(table.len()) - 1]
    }

    pub fn pretty(self) -> &'static str {
        match self {
            PropertyColour::Brown => "Brown",
            PropertyColour::LightBlue => "Light Blue",
            PropertyColour::Pink => "Pink",
            PropertyColour::Orange => "Orange",
            PropertyColour::Red => "Red",
            PropertyColour::Yellow => "Yellow",
            PropertyColour::Green => "Green",
            PropertyColour::DarkBlue => "Dark Blue",
            PropertyColour::Railroad => "Railroad",
            PropertyColour::Utility => "Utility",
        }
    }
}

impl fmt::Display for PropertyColour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.pretty())
    }
}

/// 行动牌种类。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    DealBreaker,
    JustSayNo,
    SlyDeal,
    ForcedDeal,
    DebtCollector,
    ItsMyBirthday,
    RentWild,
    RentBrownLightBlue,
    RentPinkOrange,
    RentRedYellow,
    RentGreenDarkBlue,
    RentRailroadUtility,
    PassGo,
}

impl ActionKind {
    /// Colours a rent card may charge for; `None` for non-rent actions.
    pub fn rent_colours(self) -> Option<&'static [PropertyColour]> {
        use PropertyColour::*;
        let colours: &'static [PropertyColour] = match self {
            ActionKind::RentWild => &PropertyColour::ALL,
            ActionKind::RentBrownLightBlue => &[Brown, LightBlue],
            ActionKind::RentPinkOrange => &[Pink, Orange],
            ActionKind::RentRedYellow => &[Red, Yellow],
            ActionKind::RentGreenDarkBlue => &[Green, DarkBlue],
            ActionKind::RentRailroadUtility => &[Railroad, Utility],
            _ => return None,
        };
        Some(colours)
    }

    pub fn is_rent(self) -> bool {
        self.rent_colours().is_some()
    }

    pub fn pretty(self) -> &'static str {
        match self {
            ActionKind::DealBreaker => "Deal Breaker",
            ActionKind::JustSayNo => "Just Say No",
            ActionKind::SlyDeal => "Sly Deal",
            ActionKind::ForcedDeal => "Forced Deal",
            ActionKind::DebtCollector => "Debt Collector",
            ActionKind::ItsMyBirthday => "It's My Birthday",
            ActionKind::RentWild => "Rent Wild",
            ActionKind::RentBrownLightBlue => "Rent Brown/Light Blue",
            ActionKind::RentPinkOrange => "Rent Pink/Orange",
            ActionKind::RentRedYellow => "Rent Red/Yellow",
            ActionKind::RentGreenDarkBlue => "Rent Green/Dark Blue",
            ActionKind::RentRailroadUtility => "Rent Railroad/Utility",
            ActionKind::PassGo => "Pass Go",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.pretty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PropertyCard {
    pub id: CardId,
    pub name: String,
    pub value: u32,
    pub colour: PropertyColour,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ActionCard {
    pub id: CardId,
    pub name: String,
    pub value: u32,
    pub kind: ActionKind,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MoneyCard {
    pub id: CardId,
    pub value: u32,
}

/// 牌面。三种牌型在进入引擎时一次性匹配。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Card {
    Property(PropertyCard),
    Action(ActionCard),
    Money(MoneyCard),
}

impl Card {
    pub fn property(id: CardId, name: impl Into<String>, value: u32, colour: PropertyColour) -> Self {
        Card::Property(PropertyCard {
            id,
            name: name.into(),
            value,
            colour,
        })
    }

    pub fn action(id: CardId, name: impl Into<String>, value: u32, kind: ActionKind) -> Self {
        Card::Action(ActionCard {
            id,
            name: name.into(),
            value,
            kind,
        })
    }

    pub fn money(id: CardId, value: u32) -> Self {
        Card::Money(MoneyCard { id, value })
    }

    pub fn id(&self) -> CardId {
        match self {
            Card::Property(card) => card.id,
            Card::Action(card) => card.id,
            Card::Money(card) => card.id,
        }
    }

    pub fn value(&self) -> u32 {
        match self {
            Card::Property(card) => card.value,
            Card::Action(card) => card.value,
            Card::Money(card) => card.value,
        }
    }

    pub fn name(&self) -> String {
        match self {
            Card::Property(card) => card.name.clone(),
            Card::Action(card) => card.name.clone(),
            Card::Money(card) => format!("£{}M", card.value),
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Card::Property(card) => write!(f, "Property({}, £{}, {})", card.name, card.value, card.colour),
            Card::Action(card) => write!(f, "Action({}, £{})", card.name, card.value),
            Card::Money(card) => write!(f, "Money(£{})", card.value),
        }
    }
}

/// 可存入银行的牌：现金，或当作现金使用的行动牌。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BankCard {
    Money(MoneyCard),
    Action(ActionCard),
}

impl BankCard {
    pub fn id(&self) -> CardId {
        match self {
            BankCard::Money(card) => card.id,
            BankCard::Action(card) => card.id,
        }
    }

    pub fn value(&self) -> u32 {
        match self {
            BankCard::Money(card) => card.value,
            BankCard::Action(card) => card.value,
        }
    }
}

impl From<BankCard> for Card {
    fn from(card: BankCard) -> Self {
        match card {
            BankCard::Money(card) => Card::Money(card),
            BankCard::Action(card) => Card::Action(card),
        }
    }
}

impl From<MoneyCard> for BankCard {
    fn from(card: MoneyCard) -> Self {
        BankCard::Money(card)
    }
}

impl From<ActionCard> for BankCard {
    fn from(card: ActionCard) -> Self {
        BankCard::Action(card)
    }
}

const DEMO_PROPERTIES: &[(&str, u32, PropertyColour)] = &[
    ("Old Kent Road", 1, PropertyColour::Brown),
    ("Whitechapel Road", 1, PropertyColour::Brown),
    ("The Angel Islington", 1, PropertyColour::LightBlue),
    ("Euston Road", 1, PropertyColour::LightBlue),
    ("Pentonville Road", 1, PropertyColour::LightBlue),
    ("Pall Mall", 2, PropertyColour::Pink),
    ("Whitehall", 2, PropertyColour::Pink),
    ("Northumberland Avenue", 2, PropertyColour::Pink),
    ("Bow Street", 2, PropertyColour::Orange),
    ("Marlborough Street", 2, PropertyColour::Orange),
    ("Vine Street", 2, PropertyColour::Orange),
    ("Strand", 3, PropertyColour::Red),
    ("Fleet Street", 3, PropertyColour::Red),
    ("Trafalgar Square", 3, PropertyColour::Red),
    ("Leicester Square", 3, PropertyColour::Yellow),
    ("Coventry Street", 3, PropertyColour::Yellow),
    ("Piccadilly", 3, PropertyColour::Yellow),
    ("Regent Street", 4, PropertyColour::Green),
    ("Oxford Street", 4, PropertyColour::Green),
    ("Bond Street", 4, PropertyColour::Green),
    ("Park Lane", 4, PropertyColour::DarkBlue),
    ("Mayfair", 4, PropertyColour::DarkBlue),
    ("King's Cross Station", 2, PropertyColour::Railroad),
    ("Marylebone Station", 2, PropertyColour::Railroad),
    ("Fenchurch St. Station", 2, PropertyColour::Railroad),
    ("Liverpool St. Station", 2, PropertyColour::Railroad),
    ("Electric Company", 2, PropertyColour::Utility),
    ("Water Works", 2, PropertyColour::Utility),
];

const DEMO_ACTIONS: &[(ActionKind, u32, usize)] = &[
    (ActionKind::DealBreaker, 5, 2),
    (ActionKind::JustSayNo, 4, 3),
    (ActionKind::SlyDeal, 3, 3),
    (ActionKind::ForcedDeal, 3, 3),
    (ActionKind::DebtCollector, 3, 3),
    (ActionKind::ItsMyBirthday, 2, 3),
    (ActionKind::PassGo, 1, 10),
    (ActionKind::RentWild, 3, 3),
    (ActionKind::RentBrownLightBlue, 1, 2),
    (ActionKind::RentPinkOrange, 1, 2),
    (ActionKind::RentRedYellow, 1, 2),
    (ActionKind::RentGreenDarkBlue, 1, 2),
    (ActionKind::RentRailroadUtility, 1, 2),
];

const DEMO_MONEY: &[(u32, usize)] = &[(1, 6), (2, 5), (3, 3), (4, 3), (5, 2), (10, 1)];

static DEMO_DECK: Lazy<Vec<Card>> = Lazy::new(|| {
    let mut deck = Vec::new();
    let mut next_id: CardId = 1;
    let mut take_id = || {
        let id = next_id;
        next_id += 1;
        id
    };

    for (name, value, colour) in DEMO_PROPERTIES {
        deck.push(Card::property(take_id(), *name, *value, *colour));
    }
    for (kind, value, copies) in DEMO_ACTIONS {
        for _ in 0..*copies {
            deck.push(Card::action(take_id(), kind.pretty(), *value, *kind));
        }
    }
    for (value, copies) in DEMO_MONEY {
        for _ in 0..*copies {
            deck.push(Card::money(take_id(), *value));
        }
    }
    deck
});

/// 标准牌组（不含万能地产、房屋与双倍租金牌），卡牌编号从 1 开始连续分配。
pub fn demo_deck() -> Vec<Card> {
    DEMO_DECK.clone()
}

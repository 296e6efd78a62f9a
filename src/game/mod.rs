//! 游戏核心逻辑模块（牌面、玩家、付款、结算与回合驱动）。

pub mod cards;
pub mod charging;
pub mod decision;
pub mod player;
pub mod rules;
pub mod state;
pub mod turn;

#[cfg(test)]
pub(crate) mod testing;

pub use cards::{
    demo_deck,
    ActionCard,
    ActionKind,
    BankCard,
    Card,
    CardId,
    MoneyCard,
    PropertyCard,
    PropertyColour,
};
pub use charging::Payment;
pub use decision::{ActionUsage, DecisionMaker, Passive, RentOption, Seats};
pub use player::{ParsePlayerIdError, Player, PlayerId, PlayerSnapshot, PropertySet, SnapshotError};
pub use rules::{EngineError, InvalidChoice, PlayError};
pub use state::{Game, GameConfig, GameEvent, GameOutcome, GameSnapshot, IntegrityError};

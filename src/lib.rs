pub mod ai;
pub mod game;

use std::fmt::Display;
use std::str::FromStr;

use gloo_timers::future::TimeoutFuture;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::Promise;

pub use ai::{AiAgent, AiConfig, AiDecision, AiStrategy, Plan, PlanFollower, Planner, ScoredPlan};
pub use game::{
    demo_deck, ActionCard, ActionKind, ActionUsage, BankCard, Card, CardId, DecisionMaker,
    EngineError, Game, GameConfig, GameEvent, GameOutcome, GameSnapshot, IntegrityError,
    InvalidChoice, MoneyCard, Passive, Payment, PlayError, Player, PlayerId, PlayerSnapshot,
    PropertyCard, PropertyColour, PropertySet, RentOption, Seats, SnapshotError,
};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    set_panic_hook();
}

#[cfg(target_arch = "wasm32")]
fn console_log(message: &str) {
    web_sys::console::log_1(&message.into());
}

#[cfg(not(target_arch = "wasm32"))]
fn console_log(_message: &str) {}

fn to_js_error<E: Serialize + Display>(error: E) -> JsValue {
    to_value(&error).unwrap_or_else(|_| JsValue::from_str(&error.to_string()))
}

fn serde_to_js_error<E: Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn parse_strategy(strategy: Option<&str>) -> AiStrategy {
    strategy
        .and_then(|value| AiStrategy::from_str(value).ok())
        .unwrap_or(AiStrategy::Greedy)
}

/// AI 座位外壳：照常转发决策，只有第一个座位把日志镜像到浏览器控制台，
/// 免得广播的同一行被打印多次。
struct ConsoleSeat {
    agent: AiAgent,
    mirror: bool,
}

impl DecisionMaker for ConsoleSeat {
    fn choose_card_in_hand(&mut self, game: &Game, player: &Player) -> usize {
        self.agent.choose_card_in_hand(game, player)
    }

    fn choose_action_usage(&mut self, game: &Game, player: &Player, card: &ActionCard) -> ActionUsage {
        self.agent.choose_action_usage(game, player, card)
    }

    fn choose_player_target(&mut self, game: &Game, player: &Player, targets: &[PlayerId]) -> usize {
        self.agent.choose_player_target(game, player, targets)
    }

    fn choose_full_set_target(
        &mut self,
        game: &Game,
        target: &Player,
        colours: &[PropertyColour],
    ) -> usize {
        self.agent.choose_full_set_target(game, target, colours)
    }

    fn choose_property_target(
        &mut self,
        game: &Game,
        target: &Player,
        properties: &[PropertyCard],
    ) -> usize {
        self.agent.choose_property_target(game, target, properties)
    }

    fn choose_property_source(
        &mut self,
        game: &Game,
        player: &Player,
        properties: &[PropertyCard],
    ) -> usize {
        self.agent.choose_property_source(game, player, properties)
    }

    fn choose_rent_colour_and_amount(
        &mut self,
        game: &Game,
        player: &Player,
        options: &[RentOption],
    ) -> usize {
        self.agent.choose_rent_colour_and_amount(game, player, options)
    }

    fn log(&mut self, message: &str) {
        if self.mirror {
            console_log(message);
        }
    }

    fn notify_turn_over(&mut self, game: &Game) {
        self.agent.notify_turn_over(game);
    }
}

/// Seats an all-AI table over the demo deck and deals the opening hands.
fn build_table(
    names: Vec<String>,
    seed: u64,
    strategy: AiStrategy,
) -> Result<(Game, Vec<Box<dyn DecisionMaker>>), EngineError> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let players: Vec<Player> = names
        .into_iter()
        .map(|name| Player::with_random_id(name, &mut rng))
        .collect();
    let seats = players
        .iter()
        .enumerate()
        .map(|(seat, player)| -> Box<dyn DecisionMaker> {
            let config = AiConfig::default()
                .with_strategy(strategy)
                .with_seed(seed.wrapping_add(seat as u64));
            Box::new(ConsoleSeat {
                agent: AiAgent::new(player.id, config),
                mirror: seat == 0,
            })
        })
        .collect();

    let mut game = Game::new(players, demo_deck(), seed);
    game.start()?;
    Ok((game, seats))
}

#[derive(Debug, Serialize, Deserialize)]
struct TurnReport {
    turn: u32,
    player: PlayerId,
    events: Vec<GameEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome: Option<GameOutcome>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChargePreview {
    bank_cards: Vec<BankCard>,
    remainder: u32,
}

fn preview_charge(snapshot: PlayerSnapshot, amount: u32) -> Result<ChargePreview, SnapshotError> {
    let mut player = Player::from_snapshot(snapshot)?;
    let (bank_cards, remainder) = player.charge_money_payment(amount);
    Ok(ChargePreview {
        bank_cards,
        remainder,
    })
}

fn plan_from_snapshot(
    snapshot: GameSnapshot,
    seat: usize,
    config: AiConfig,
) -> Result<AiDecision, JsValue> {
    let game = Game::from_snapshot(snapshot, config.seed).map_err(to_js_error)?;
    let me = game
        .player(seat)
        .map_err(to_js_error)?
        .id;
    Ok(AiAgent::new(me, config).decide(&game))
}

#[wasm_bindgen]
pub struct GameEngine {
    game: Game,
    seats: Vec<Box<dyn DecisionMaker>>,
}

#[wasm_bindgen]
impl GameEngine {
    /// `names` 为玩家名字数组，所有座位都由 AI 控制。
    #[wasm_bindgen(constructor)]
    pub fn new(names: JsValue, seed: u32, strategy: Option<String>) -> Result<GameEngine, JsValue> {
        let names: Vec<String> = from_value(names).map_err(JsValue::from)?;
        if names.len() < 2 {
            return Err(JsValue::from_str("至少需要两名玩家"));
        }
        let (game, seats) = build_table(names, u64::from(seed), parse_strategy(strategy.as_deref()))
            .map_err(to_js_error)?;
        Ok(GameEngine { game, seats })
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.game).map_err(serde_to_js_error)
    }

    /// 某一座位视角的快照，其余玩家的手牌被隐藏。
    pub fn snapshot_json(&self, seat: usize) -> Result<String, JsValue> {
        let viewer = self.game.player(seat).map_err(to_js_error)?.id;
        serde_json::to_string(&self.game.snapshot_for(viewer)).map_err(serde_to_js_error)
    }

    pub fn is_finished(&self) -> bool {
        self.game.is_finished()
    }

    pub fn outcome_json(&self) -> Result<Option<String>, JsValue> {
        self.game
            .outcome
            .as_ref()
            .map(|outcome| serde_json::to_string(outcome).map_err(serde_to_js_error))
            .transpose()
    }

    /// Plays the current player's turn and reports the events it produced.
    pub fn play_turn(&mut self) -> Result<String, JsValue> {
        let turn = self.game.current_turn;
        let player = self.game.current_player().id;
        let mark = self.game.event_log.len();
        let outcome = self.game.play_turn(&mut self.seats).map_err(to_js_error)?;
        let report = TurnReport {
            turn,
            player,
            events: self.game.event_log[mark..].to_vec(),
            outcome,
        };
        serde_json::to_string(&report).map_err(serde_to_js_error)
    }

    /// 延迟 `delay_ms` 毫秒后为当前玩家规划下一步，不改动对局。
    pub fn think_ai(&self, strategy: Option<String>, delay_ms: Option<u32>) -> Promise {
        let game = self.game.clone();
        let strategy = parse_strategy(strategy.as_deref());
        let delay = delay_ms.unwrap_or(0);

        future_to_promise(async move {
            if delay > 0 {
                TimeoutFuture::new(delay).await;
            }
            let config = AiConfig::default()
                .with_strategy(strategy)
                .with_seed(game.rng_seed);
            let mut agent = AiAgent::new(game.current_player().id, config);
            let decision = agent.decide(&game);
            let json = serde_json::to_string(&decision).map_err(serde_to_js_error)?;
            Ok(JsValue::from_str(&json))
        })
    }
}

/// 返回示例对局，方便前端调试。
#[wasm_bindgen(js_name = "createGameState")]
pub fn create_game_state() -> Result<JsValue, JsValue> {
    to_value(&Game::sample()).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "createDemoDeck")]
pub fn create_demo_deck() -> Result<JsValue, JsValue> {
    to_value(&demo_deck()).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "validateState")]
pub fn validate_state(state: JsValue) -> Result<(), JsValue> {
    let game: Game = from_value(state).map_err(JsValue::from)?;
    game.integrity_check()
        .map_err(|error| to_js_error(EngineError::from(error)))
}

/// 预览只用现金支付 `amount` 时会交出哪些牌以及还差多少。
#[wasm_bindgen(js_name = "chargePreview")]
pub fn charge_preview(player: JsValue, amount: u32) -> Result<JsValue, JsValue> {
    let snapshot: PlayerSnapshot = from_value(player).map_err(JsValue::from)?;
    let preview = preview_charge(snapshot, amount).map_err(to_js_error)?;
    to_value(&preview).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "computeAiPlan")]
pub fn compute_ai_plan(
    snapshot: JsValue,
    seat: usize,
    strategy: Option<String>,
    seed: Option<u32>,
) -> Result<JsValue, JsValue> {
    let snapshot: GameSnapshot = from_value(snapshot).map_err(JsValue::from)?;
    let config = AiConfig::default()
        .with_strategy(parse_strategy(strategy.as_deref()))
        .with_seed(u64::from(seed.unwrap_or(0)));
    let decision = plan_from_snapshot(snapshot, seat, config)?;
    to_value(&decision).map_err(JsValue::from)
}

#[cfg(feature = "console_error_panic_hook")]
fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
fn set_panic_hook() {}

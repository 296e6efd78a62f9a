//! 在浏览器或 Node 中运行：`wasm-pack test --node`。
#![cfg(target_arch = "wasm32")]

use nullopoly::{
    charge_preview, compute_ai_plan, create_demo_deck, create_game_state, validate_state,
    AiDecision, Card, Game, GameEngine,
};
use serde::Deserialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

#[derive(Deserialize)]
struct Preview {
    bank_cards: Vec<serde_json::Value>,
    remainder: u32,
}

#[wasm_bindgen_test]
fn demo_deck_crosses_the_boundary() {
    let deck: Vec<Card> = from_value(create_demo_deck().unwrap()).unwrap();
    assert_eq!(deck.len(), 88);
}

#[wasm_bindgen_test]
fn sample_state_validates() {
    let state = create_game_state().unwrap();
    assert!(validate_state(state).is_ok());
}

#[wasm_bindgen_test]
fn duplicated_card_is_rejected() {
    let mut game = Game::sample();
    let copy = game.deck[0].clone();
    game.deck.push(copy);
    assert!(validate_state(to_value(&game).unwrap()).is_err());
}

#[wasm_bindgen_test]
fn engine_plays_turns() {
    let names = to_value(&vec!["Ann", "Ben", "Cat"]).unwrap();
    let mut engine = GameEngine::new(names, 5, None).unwrap();
    let report: serde_json::Value = serde_json::from_str(&engine.play_turn().unwrap()).unwrap();
    assert_eq!(report["turn"], 0);
    let state: Game = serde_json::from_str(&engine.state_json().unwrap()).unwrap();
    assert_eq!(state.current_turn, 1);
    assert!(!engine.is_finished() || engine.outcome_json().unwrap().is_some());
}

#[wasm_bindgen_test]
fn engine_needs_two_players() {
    let names = to_value(&vec!["Solo"]).unwrap();
    assert!(GameEngine::new(names, 1, None).is_err());
}

#[wasm_bindgen_test]
fn charge_preview_reports_remainder() {
    let game = Game::sample();
    let carol = to_value(&game.players[2].snapshot(true)).unwrap();
    let preview: Preview = from_value(charge_preview(carol, 5).unwrap()).unwrap();
    assert_eq!(preview.bank_cards.len(), 1);
    assert_eq!(preview.remainder, 2);
}

#[wasm_bindgen_test]
fn ai_plan_from_snapshot() {
    let game = Game::sample();
    let snapshot = to_value(&game.snapshot_for(game.players[0].id)).unwrap();
    let decision: AiDecision =
        from_value(compute_ai_plan(snapshot, 0, Some("greedy".into()), None).unwrap()).unwrap();
    assert!(decision.plan.is_some());
    assert!(compute_ai_plan(JsValue::NULL, 0, None, None).is_err());
}

//! AI 模块：计划生成、隔离模拟与按计划作答的决策者。

pub mod agent;
pub mod planner;

pub use agent::{AiAgent, AiConfig, AiDecision, AiStrategy};
pub use planner::{value, Plan, PlanFollower, Planner, ScoredPlan};

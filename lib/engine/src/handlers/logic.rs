//! Logic-family handlers.
//!
//! The traversal pointer never branches, so `condition` only records its
//! verdict (`condition_met`) for downstream nodes and for the log. Delay
//! handlers never sleep: they record the wait the messaging bridge must
//! apply between effects.

use async_trait::async_trait;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};

use crate::context::ExecutionContext;
use crate::effect::OutboundEffect;
use crate::error::HandlerError;
use crate::node::Node;
use crate::registry::{HandlerOutcome, NodeHandler};
use crate::template;

#[derive(Debug, Deserialize, Default)]
struct ConditionConfig {
    /// Dotted variable path; the trigger message when absent.
    #[serde(default)]
    variable: Option<String>,
    #[serde(default = "default_operator")]
    operator: String,
    #[serde(default)]
    value: JsonValue,
}

fn default_operator() -> String {
    "contains".to_string()
}

/// Evaluates a comparison and records the verdict without branching.
pub struct Condition;

impl Condition {
    fn evaluate(operator: &str, left: &str, right: &str) -> Result<bool, HandlerError> {
        let met = match operator {
            "contains" => left.to_lowercase().contains(&right.to_lowercase()),
            "equals" => left.eq_ignore_ascii_case(right),
            "not_equals" => !left.eq_ignore_ascii_case(right),
            "starts_with" => left.to_lowercase().starts_with(&right.to_lowercase()),
            ">" | ">=" | "<" | "<=" => {
                let l: f64 = left.trim().parse().unwrap_or(f64::NAN);
                let r: f64 = right.trim().parse().unwrap_or(f64::NAN);
                if l.is_nan() || r.is_nan() {
                    false
                } else {
                    match operator {
                        ">" => l > r,
                        ">=" => l >= r,
                        "<" => l < r,
                        _ => l <= r,
                    }
                }
            }
            other => {
                return Err(HandlerError::invalid_config(format!(
                    "opérateur inconnu: {other}"
                )));
            }
        };
        Ok(met)
    }
}

#[async_trait]
impl NodeHandler for Condition {
    async fn handle(
        &self,
        node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        let config: ConditionConfig =
            serde_json::from_value(node.config_value()).unwrap_or_default();

        let left = match &config.variable {
            Some(path) if !path.is_empty() => ctx
                .variables
                .get_text(path)
                .unwrap_or_else(|| ctx.message.clone()),
            _ => ctx.message.clone(),
        };
        let right = match &config.value {
            JsonValue::String(s) => template::resolve(s, ctx),
            other => other.to_string(),
        };

        let met = Self::evaluate(&config.operator, &left, &right)?;
        ctx.variables.set("condition_met", json!(met));

        let subject = config.variable.as_deref().unwrap_or("message");
        Ok(HandlerOutcome::success(format!(
            "Condition {}: {subject} {} \"{right}\"",
            if met { "remplie" } else { "non remplie" },
            config.operator
        )))
    }
}

#[derive(Debug, Deserialize)]
struct Assignment {
    name: String,
    value: JsonValue,
}

#[derive(Debug, Deserialize, Default)]
struct SetVariableConfig {
    #[serde(default)]
    variables: Vec<Assignment>,
    // Legacy single-assignment form.
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    value: JsonValue,
}

/// Stores one or more variables; string values are template-resolved.
pub struct SetVariable;

#[async_trait]
impl NodeHandler for SetVariable {
    async fn handle(
        &self,
        node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        let config: SetVariableConfig =
            serde_json::from_value(node.config_value()).unwrap_or_default();

        let mut assignments = config.variables;
        if let Some(name) = config.name {
            assignments.push(Assignment {
                name,
                value: config.value,
            });
        }
        if assignments.is_empty() {
            return Ok(HandlerOutcome::warning("Aucune variable à définir"));
        }

        let mut names = Vec::with_capacity(assignments.len());
        for assignment in assignments {
            let value = match assignment.value {
                JsonValue::String(s) => JsonValue::String(template::resolve(&s, ctx)),
                other => other,
            };
            names.push(assignment.name.clone());
            ctx.variables.set(assignment.name, value);
        }
        Ok(HandlerOutcome::success(format!(
            "Variables définies: {}",
            names.join(", ")
        )))
    }
}

#[derive(Debug, Deserialize, Default)]
struct RandomChoiceConfig {
    #[serde(default)]
    choices: Vec<String>,
    // Older flows call the list `messages`.
    #[serde(default)]
    messages: Vec<String>,
}

/// Sends one message picked uniformly from the configured list.
pub struct RandomChoice;

#[async_trait]
impl NodeHandler for RandomChoice {
    async fn handle(
        &self,
        node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        let config: RandomChoiceConfig =
            serde_json::from_value(node.config_value()).unwrap_or_default();
        let choices = if config.choices.is_empty() {
            config.messages
        } else {
            config.choices
        };
        let Some(picked) = choices.choose(&mut rand::thread_rng()).cloned() else {
            return Ok(HandlerOutcome::warning("Aucun choix configuré"));
        };
        ctx.push_effect(OutboundEffect::text(template::resolve(&picked, ctx)));
        Ok(HandlerOutcome::success(format!(
            "Choix aléatoire parmi {} options",
            choices.len()
        )))
    }
}

const LOOP_MAX_ITERATIONS: u32 = 10;

#[derive(Debug, Deserialize)]
struct LoopConfig {
    #[serde(default = "default_loop_count")]
    count: u32,
}

fn default_loop_count() -> u32 {
    1
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            count: default_loop_count(),
        }
    }
}

/// Records the authored iteration count as a variable.
///
/// The single-pointer walker does not re-enter nodes; the iteration count
/// is applied by the messaging bridge when it replays delivery.
pub struct LoopMarker;

#[async_trait]
impl NodeHandler for LoopMarker {
    async fn handle(
        &self,
        node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        let config: LoopConfig = serde_json::from_value(node.config_value()).unwrap_or_default();
        let count = config.count.clamp(1, LOOP_MAX_ITERATIONS);
        ctx.variables.set("loop_count", json!(count));
        Ok(HandlerOutcome::success(format!(
            "Boucle configurée: {count} itération(s)"
        )))
    }
}

#[derive(Debug, Deserialize, Default)]
struct DelayConfig {
    #[serde(default)]
    seconds: Option<u64>,
    // Legacy field names.
    #[serde(default)]
    duration: Option<u64>,
    #[serde(default)]
    delay: Option<u64>,
}

/// Records a fixed wait before the next effect is delivered.
pub struct Delay;

#[async_trait]
impl NodeHandler for Delay {
    async fn handle(
        &self,
        node: &Node,
        _ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        let config: DelayConfig = serde_json::from_value(node.config_value()).unwrap_or_default();
        let seconds = config
            .seconds
            .or(config.duration)
            .or(config.delay)
            .unwrap_or(1);
        Ok(HandlerOutcome::success(format!("Délai de {seconds}s"))
            .with_wait(seconds.saturating_mul(1000)))
    }
}

#[derive(Debug, Deserialize)]
struct AntiBanConfig {
    #[serde(default = "default_anti_ban_min")]
    min_seconds: u64,
    #[serde(default = "default_anti_ban_max")]
    max_seconds: u64,
}

fn default_anti_ban_min() -> u64 {
    2
}

fn default_anti_ban_max() -> u64 {
    8
}

impl Default for AntiBanConfig {
    fn default() -> Self {
        Self {
            min_seconds: default_anti_ban_min(),
            max_seconds: default_anti_ban_max(),
        }
    }
}

/// Records a randomized wait to keep outbound pacing human-looking.
pub struct AntiBan;

#[async_trait]
impl NodeHandler for AntiBan {
    async fn handle(
        &self,
        node: &Node,
        _ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        let config: AntiBanConfig = serde_json::from_value(node.config_value()).unwrap_or_default();
        let (min, max) = if config.min_seconds <= config.max_seconds {
            (config.min_seconds, config.max_seconds)
        } else {
            (config.max_seconds, config.min_seconds)
        };
        let seconds = rand::thread_rng().gen_range(min..=max);
        Ok(HandlerOutcome::success(format!(
            "Délai anti-ban de {seconds}s ({min}-{max}s)"
        ))
        .with_wait(seconds.saturating_mul(1000)))
    }
}

/// Stops the walk; downstream nodes are logged as skipped.
pub struct EndFlow;

#[async_trait]
impl NodeHandler for EndFlow {
    async fn handle(
        &self,
        _node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        ctx.should_continue = false;
        Ok(HandlerOutcome::success("Fin du flux").halting())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::LogStatus;
    use crate::registry::ControlSignal;

    #[tokio::test]
    async fn condition_records_verdict_without_branching() {
        let node = Node::new(
            1,
            "condition",
            json!({"operator": "contains", "value": "prix"}),
        );
        let mut ctx = ExecutionContext::new("quel est le PRIX ?");
        let outcome = Condition.handle(&node, &mut ctx).await.unwrap();
        assert_eq!(outcome.signal, ControlSignal::Continue);
        assert_eq!(ctx.variables.get("condition_met"), Some(&json!(true)));
    }

    #[tokio::test]
    async fn condition_numeric_comparison_on_variable() {
        let node = Node::new(
            1,
            "condition",
            json!({"variable": "sentiment_score", "operator": ">=", "value": "60"}),
        );
        let mut ctx = ExecutionContext::new("");
        ctx.variables.set("sentiment_score", json!(72));
        Condition.handle(&node, &mut ctx).await.unwrap();
        assert_eq!(ctx.variables.get("condition_met"), Some(&json!(true)));
    }

    #[tokio::test]
    async fn condition_unknown_operator_errors() {
        let node = Node::new(1, "condition", json!({"operator": "between", "value": "x"}));
        let mut ctx = ExecutionContext::new("");
        assert!(Condition.handle(&node, &mut ctx).await.is_err());
    }

    #[tokio::test]
    async fn set_variable_list_form_with_templates() {
        let node = Node::new(
            1,
            "set_variable",
            json!({"variables": [
                {"name": "salutation", "value": "Bonjour {{prenom}}"},
                {"name": "seuil", "value": 10}
            ]}),
        );
        let mut ctx = ExecutionContext::new("");
        ctx.contact.first_name = "Awa".into();
        SetVariable.handle(&node, &mut ctx).await.unwrap();
        assert_eq!(ctx.variables.get_text("salutation").as_deref(), Some("Bonjour Awa"));
        assert_eq!(ctx.variables.get("seuil"), Some(&json!(10)));
    }

    #[tokio::test]
    async fn set_variable_legacy_single_form() {
        let node = Node::new(1, "set_variable", json!({"name": "etape", "value": "accueil"}));
        let mut ctx = ExecutionContext::new("");
        SetVariable.handle(&node, &mut ctx).await.unwrap();
        assert_eq!(ctx.variables.get_text("etape").as_deref(), Some("accueil"));
    }

    #[tokio::test]
    async fn random_choice_picks_from_list() {
        let node = Node::new(1, "random_choice", json!({"choices": ["A", "B", "C"]}));
        let mut ctx = ExecutionContext::new("");
        RandomChoice.handle(&node, &mut ctx).await.unwrap();
        assert_eq!(ctx.effects.len(), 1);
        match &ctx.effects[0] {
            OutboundEffect::Text { text } => assert!(["A", "B", "C"].contains(&text.as_str())),
            other => panic!("unexpected effect {other:?}"),
        }
    }

    #[tokio::test]
    async fn delay_records_wait_without_sleeping() {
        let node = Node::new(1, "delay", json!({"seconds": 3}));
        let mut ctx = ExecutionContext::new("");
        let started = std::time::Instant::now();
        let outcome = Delay.handle(&node, &mut ctx).await.unwrap();
        assert!(started.elapsed().as_millis() < 100);
        assert_eq!(outcome.wait_ms, Some(3000));
    }

    #[tokio::test]
    async fn delay_with_huge_seconds_saturates_instead_of_panicking() {
        let node = Node::new(1, "delay", json!({"seconds": u64::MAX}));
        let mut ctx = ExecutionContext::new("");
        let outcome = Delay.handle(&node, &mut ctx).await.unwrap();
        assert_eq!(outcome.wait_ms, Some(u64::MAX));
    }

    #[tokio::test]
    async fn anti_ban_with_huge_bounds_saturates_instead_of_panicking() {
        let node = Node::new(
            1,
            "anti_ban",
            json!({"min_seconds": u64::MAX, "max_seconds": u64::MAX}),
        );
        let mut ctx = ExecutionContext::new("");
        let outcome = AntiBan.handle(&node, &mut ctx).await.unwrap();
        assert_eq!(outcome.wait_ms, Some(u64::MAX));
    }

    #[tokio::test]
    async fn anti_ban_wait_stays_in_range() {
        let node = Node::new(1, "anti_ban", json!({"min_seconds": 2, "max_seconds": 5}));
        let mut ctx = ExecutionContext::new("");
        for _ in 0..20 {
            let outcome = AntiBan.handle(&node, &mut ctx).await.unwrap();
            let wait = outcome.wait_ms.unwrap();
            assert!((2000..=5000).contains(&wait));
        }
    }

    #[tokio::test]
    async fn end_flow_halts() {
        let node = Node::new(1, "end_flow", json!({}));
        let mut ctx = ExecutionContext::new("");
        let outcome = EndFlow.handle(&node, &mut ctx).await.unwrap();
        assert_eq!(outcome.status, LogStatus::Success);
        assert_eq!(outcome.signal, ControlSignal::Halt);
        assert!(!ctx.should_continue);
    }

    #[tokio::test]
    async fn loop_count_clamped() {
        let node = Node::new(1, "loop", json!({"count": 50}));
        let mut ctx = ExecutionContext::new("");
        LoopMarker.handle(&node, &mut ctx).await.unwrap();
        assert_eq!(ctx.variables.get("loop_count"), Some(&json!(10)));
    }
}

//! Per-run execution context.
//!
//! One [`ExecutionContext`] is created per inbound event and discarded once
//! the coordinator has extracted the effect list and the log. Handlers
//! mutate it through `&mut`; nothing here outlives the run.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::effect::OutboundEffect;
use crate::log::LogEntry;

/// Contact fields available to legacy `{field}` placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub email: String,
}

/// A catalog product seeded from the run request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One line of the in-run cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: String,
    pub name: String,
    pub unit_price: f64,
    pub quantity: u32,
}

impl CartLine {
    #[must_use]
    pub fn subtotal(&self) -> f64 {
        self.unit_price * f64::from(self.quantity)
    }
}

/// String-keyed run variables with dotted-path access.
///
/// `get("response.data.id")` descends through nested JSON objects;
/// `set` only ever writes top-level keys (dotted set was never authored
/// in practice, so paths are stored verbatim as keys).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variables(HashMap<String, JsonValue>);

impl Variables {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: JsonValue) {
        self.0.insert(key.into(), value);
    }

    /// Resolves a dotted path. The first segment selects the variable,
    /// the rest descend through object fields.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&JsonValue> {
        let mut segments = path.split('.');
        let root = segments.next()?;
        let mut current = self.0.get(root)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Renders a path as display text: strings bare, everything else as
    /// compact JSON.
    #[must_use]
    pub fn get_text(&self, path: &str) -> Option<String> {
        self.get(path).map(|value| match value {
            JsonValue::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

/// Mutable state shared by every handler over one run.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Trigger message text; AI rewrite handlers replace it in place.
    pub message: String,
    /// Media URL attached to the trigger message, if any.
    pub media_url: Option<String>,
    pub contact: ContactProfile,
    pub variables: Variables,
    /// Ordered outbound buffer; drained by the coordinator.
    pub effects: Vec<OutboundEffect>,
    /// Cleared by `end_flow`-style handlers to stop the walker.
    pub should_continue: bool,
    pub cart: Vec<CartLine>,
    pub catalog: Vec<Product>,
    /// Append-only; one entry per touched node plus the skipped pass.
    pub log: Vec<LogEntry>,
}

impl ExecutionContext {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            media_url: None,
            contact: ContactProfile::default(),
            variables: Variables::new(),
            effects: Vec::new(),
            should_continue: true,
            cart: Vec::new(),
            catalog: Vec::new(),
            log: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_contact(mut self, contact: ContactProfile) -> Self {
        self.contact = contact;
        self
    }

    #[must_use]
    pub fn with_catalog(mut self, catalog: Vec<Product>) -> Self {
        self.catalog = catalog;
        self
    }

    /// Appends an outbound effect in execution order.
    pub fn push_effect(&mut self, effect: OutboundEffect) {
        self.effects.push(effect);
    }

    /// Adds a product to the cart; a repeated add increments quantity
    /// instead of duplicating the line.
    pub fn add_to_cart(&mut self, product: &Product, quantity: u32) {
        if let Some(line) = self.cart.iter_mut().find(|l| l.product_id == product.id) {
            line.quantity = line.quantity.saturating_add(quantity);
        } else {
            self.cart.push(CartLine {
                product_id: product.id.clone(),
                name: product.name.clone(),
                unit_price: product.price,
                quantity,
            });
        }
    }

    /// Total cart value across lines.
    #[must_use]
    pub fn cart_total(&self) -> f64 {
        self.cart.iter().map(CartLine::subtotal).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn product(id: &str, price: f64) -> Product {
        Product {
            id: id.into(),
            name: format!("Produit {id}"),
            price,
            description: None,
        }
    }

    #[test]
    fn dotted_path_descends_objects() {
        let mut vars = Variables::new();
        vars.set("response", json!({"data": {"id": 42, "tags": ["a"]}}));
        assert_eq!(vars.get("response.data.id"), Some(&json!(42)));
        assert!(vars.get("response.data.missing").is_none());
        assert!(vars.get("response.data.tags.0").is_none());
    }

    #[test]
    fn get_text_renders_non_strings_as_json() {
        let mut vars = Variables::new();
        vars.set("total", json!(17.5));
        vars.set("intent", json!("salutation"));
        assert_eq!(vars.get_text("total").as_deref(), Some("17.5"));
        assert_eq!(vars.get_text("intent").as_deref(), Some("salutation"));
    }

    #[test]
    fn repeated_cart_add_increments_quantity() {
        let mut ctx = ExecutionContext::new("ajoutez le produit");
        let p = product("p1", 1000.0);
        ctx.add_to_cart(&p, 1);
        ctx.add_to_cart(&p, 2);
        assert_eq!(ctx.cart.len(), 1);
        assert_eq!(ctx.cart[0].quantity, 3);
        assert!((ctx.cart_total() - 3000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn cart_quantity_saturates_at_the_ceiling() {
        let mut ctx = ExecutionContext::new("");
        let p = product("p1", 1000.0);
        ctx.add_to_cart(&p, u32::MAX);
        ctx.add_to_cart(&p, 5);
        assert_eq!(ctx.cart[0].quantity, u32::MAX);
    }

    #[test]
    fn cart_total_spans_lines() {
        let mut ctx = ExecutionContext::new("");
        ctx.add_to_cart(&product("a", 500.0), 2);
        ctx.add_to_cart(&product("b", 250.0), 1);
        assert!((ctx.cart_total() - 1250.0).abs() < f64::EPSILON);
    }
}

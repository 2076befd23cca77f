//! Commerce-family handlers.
//!
//! The product catalog is seeded from the run request; the cart lives in
//! the execution context. Checkout clears the cart and leaves the order
//! reference in `last_order_id` so downstream nodes can confirm it.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};

use crate::context::ExecutionContext;
use crate::effect::OutboundEffect;
use crate::error::HandlerError;
use crate::node::Node;
use crate::registry::{HandlerOutcome, NodeHandler};
use crate::template;

const CATALOG_PREVIEW_LINES: usize = 5;

/// Renders the product catalog into the chat.
pub struct ShowCatalog;

#[async_trait]
impl NodeHandler for ShowCatalog {
    async fn handle(
        &self,
        _node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        if ctx.catalog.is_empty() {
            return Ok(HandlerOutcome::warning("Catalogue vide"));
        }
        let mut lines = vec!["Voici notre catalogue :".to_string()];
        for product in ctx.catalog.iter().take(CATALOG_PREVIEW_LINES) {
            lines.push(format!("• {} — {} FCFA", product.name, product.price));
        }
        if ctx.catalog.len() > CATALOG_PREVIEW_LINES {
            lines.push(format!(
                "… et {} autres produits",
                ctx.catalog.len() - CATALOG_PREVIEW_LINES
            ));
        }
        let data = serde_json::to_value(&ctx.catalog).unwrap_or(JsonValue::Null);
        ctx.push_effect(OutboundEffect::text(lines.join("\n")));
        ctx.push_effect(OutboundEffect::Payload {
            label: "catalog".to_string(),
            data,
        });
        Ok(HandlerOutcome::success(format!(
            "Catalogue affiché ({} produits)",
            ctx.catalog.len()
        )))
    }
}

#[derive(Debug, Deserialize)]
struct AddToCartConfig {
    product_id: String,
    #[serde(default = "default_quantity")]
    quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

/// Adds a catalog product to the in-run cart.
pub struct AddToCart;

#[async_trait]
impl NodeHandler for AddToCart {
    async fn handle(
        &self,
        node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        let config: AddToCartConfig = serde_json::from_value(node.config_value())
            .map_err(|_| HandlerError::missing_field("product_id"))?;
        let product_id = template::resolve(&config.product_id, ctx);
        let Some(product) = ctx.catalog.iter().find(|p| p.id == product_id).cloned() else {
            return Ok(HandlerOutcome::warning(format!(
                "Produit introuvable: {product_id}"
            )));
        };
        ctx.add_to_cart(&product, config.quantity.max(1));
        ctx.variables.set("cart_total", json!(ctx.cart_total()));
        Ok(HandlerOutcome::success(format!(
            "Ajouté au panier: {} x{}",
            product.name,
            config.quantity.max(1)
        )))
    }
}

fn cart_summary(ctx: &ExecutionContext) -> String {
    let mut lines = vec!["Votre panier :".to_string()];
    for line in &ctx.cart {
        lines.push(format!(
            "• {} x{} — {} FCFA",
            line.name,
            line.quantity,
            line.subtotal()
        ));
    }
    lines.push(format!("Total: {} FCFA", ctx.cart_total()));
    lines.join("\n")
}

/// Shows the current cart contents and total.
pub struct ShowCart;

#[async_trait]
impl NodeHandler for ShowCart {
    async fn handle(
        &self,
        _node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        if ctx.cart.is_empty() {
            ctx.push_effect(OutboundEffect::text("Votre panier est vide."));
            return Ok(HandlerOutcome::success("Panier vide affiché"));
        }
        ctx.variables.set("cart_total", json!(ctx.cart_total()));
        let summary = cart_summary(ctx);
        ctx.push_effect(OutboundEffect::text(summary));
        Ok(HandlerOutcome::success(format!(
            "Panier affiché ({} lignes)",
            ctx.cart.len()
        )))
    }
}

/// Converts the cart into an order and clears it.
pub struct Checkout;

#[async_trait]
impl NodeHandler for Checkout {
    async fn handle(
        &self,
        _node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        if ctx.cart.is_empty() {
            return Ok(HandlerOutcome::warning("Panier vide, commande impossible"));
        }
        let total = ctx.cart_total();
        let order_id = format!("CMD-{}", Utc::now().timestamp_millis());
        let lines = serde_json::to_value(&ctx.cart).unwrap_or(JsonValue::Null);

        ctx.push_effect(OutboundEffect::Payload {
            label: "checkout".to_string(),
            data: json!({"orderId": order_id, "lines": lines, "total": total}),
        });
        ctx.push_effect(OutboundEffect::text(format!(
            "Commande {order_id} confirmée. Total: {total} FCFA. Merci !"
        )));

        ctx.cart.clear();
        ctx.variables
            .set("last_order_id", JsonValue::String(order_id.clone()));
        ctx.variables.set("order_total", json!(total));
        Ok(HandlerOutcome::success(format!(
            "Commande {order_id} créée ({total} FCFA)"
        )))
    }
}

#[derive(Debug, Deserialize)]
struct PromoConfig {
    code: String,
    #[serde(default = "default_discount")]
    percent: f64,
}

fn default_discount() -> f64 {
    10.0
}

/// Applies a promo code when the inbound message carries it.
pub struct ApplyPromo;

#[async_trait]
impl NodeHandler for ApplyPromo {
    async fn handle(
        &self,
        node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        let config: PromoConfig = serde_json::from_value(node.config_value())
            .map_err(|_| HandlerError::missing_field("code"))?;
        if !ctx
            .message
            .to_lowercase()
            .contains(&config.code.to_lowercase())
        {
            return Ok(HandlerOutcome::warning(format!(
                "Code promo {} absent du message",
                config.code
            )));
        }
        let total = ctx.cart_total();
        let discounted = total * (1.0 - config.percent / 100.0);
        ctx.variables
            .set("promo_code", JsonValue::String(config.code.clone()));
        ctx.variables.set("discount_percent", json!(config.percent));
        ctx.variables.set("cart_total", json!(discounted));
        ctx.push_effect(OutboundEffect::text(format!(
            "Code {} appliqué: -{}% sur votre panier.",
            config.code, config.percent
        )));
        Ok(HandlerOutcome::success(format!(
            "Promo {} appliquée (-{}%)",
            config.code, config.percent
        )))
    }
}

#[derive(Debug, Deserialize, Default)]
struct OrderStatusConfig {
    #[serde(default)]
    order_id: Option<String>,
}

/// Replies with the status of the referenced order.
pub struct OrderStatus;

#[async_trait]
impl NodeHandler for OrderStatus {
    async fn handle(
        &self,
        node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        let config: OrderStatusConfig =
            serde_json::from_value(node.config_value()).unwrap_or_default();
        let order_id = config
            .order_id
            .map(|id| template::resolve(&id, ctx))
            .or_else(|| ctx.variables.get_text("last_order_id"));
        let Some(order_id) = order_id.filter(|id| !id.is_empty()) else {
            ctx.push_effect(OutboundEffect::text(
                "Je ne trouve pas de commande associée. Pouvez-vous me donner votre numéro \
                 de commande ?",
            ));
            return Ok(HandlerOutcome::warning("Aucune commande référencée"));
        };
        ctx.push_effect(OutboundEffect::text(format!(
            "Votre commande {order_id} est en cours de préparation. Vous recevrez une \
             notification à l'expédition."
        )));
        Ok(HandlerOutcome::success(format!(
            "Statut de {order_id} communiqué"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Product;
    use crate::log::LogStatus;

    fn catalog() -> Vec<Product> {
        vec![
            Product {
                id: "p1".into(),
                name: "Pagne wax".into(),
                price: 12000.0,
                description: None,
            },
            Product {
                id: "p2".into(),
                name: "Sac tissé".into(),
                price: 8000.0,
                description: None,
            },
        ]
    }

    #[tokio::test]
    async fn add_then_checkout_clears_cart() {
        let mut ctx = ExecutionContext::new("je commande").with_catalog(catalog());
        let add = Node::new(1, "add_to_cart", json!({"product_id": "p1", "quantity": 2}));
        AddToCart.handle(&add, &mut ctx).await.unwrap();
        assert_eq!(ctx.variables.get("cart_total"), Some(&json!(24000.0)));

        let checkout = Node::new(2, "checkout", json!({}));
        let outcome = Checkout.handle(&checkout, &mut ctx).await.unwrap();
        assert_eq!(outcome.status, LogStatus::Success);
        assert!(ctx.cart.is_empty());
        assert!(ctx.variables.get_text("last_order_id").unwrap().starts_with("CMD-"));
        assert_eq!(ctx.effects.len(), 2);
    }

    #[tokio::test]
    async fn checkout_with_empty_cart_warns() {
        let node = Node::new(1, "checkout", json!({}));
        let mut ctx = ExecutionContext::new("");
        let outcome = Checkout.handle(&node, &mut ctx).await.unwrap();
        assert_eq!(outcome.status, LogStatus::Warning);
        assert!(ctx.effects.is_empty());
    }

    #[tokio::test]
    async fn unknown_product_warns() {
        let node = Node::new(1, "add_to_cart", json!({"product_id": "p99"}));
        let mut ctx = ExecutionContext::new("").with_catalog(catalog());
        let outcome = AddToCart.handle(&node, &mut ctx).await.unwrap();
        assert_eq!(outcome.status, LogStatus::Warning);
        assert!(ctx.cart.is_empty());
    }

    #[tokio::test]
    async fn promo_applies_only_when_code_present() {
        let node = Node::new(1, "apply_promo", json!({"code": "AKWABA10", "percent": 10.0}));

        let mut ctx = ExecutionContext::new("je veux utiliser AKWABA10").with_catalog(catalog());
        AddToCart
            .handle(
                &Node::new(2, "add_to_cart", json!({"product_id": "p2"})),
                &mut ctx,
            )
            .await
            .unwrap();
        let outcome = ApplyPromo.handle(&node, &mut ctx).await.unwrap();
        assert_eq!(outcome.status, LogStatus::Success);
        assert_eq!(ctx.variables.get("cart_total"), Some(&json!(7200.0)));

        let mut ctx = ExecutionContext::new("bonjour");
        let outcome = ApplyPromo.handle(&node, &mut ctx).await.unwrap();
        assert_eq!(outcome.status, LogStatus::Warning);
    }

    #[tokio::test]
    async fn catalog_preview_truncates() {
        let mut many = catalog();
        for i in 3..10 {
            many.push(Product {
                id: format!("p{i}"),
                name: format!("Produit {i}"),
                price: 100.0,
                description: None,
            });
        }
        let mut ctx = ExecutionContext::new("").with_catalog(many);
        ShowCatalog.handle(&Node::new(1, "show_catalog", json!({})), &mut ctx).await.unwrap();
        match &ctx.effects[0] {
            OutboundEffect::Text { text } => assert!(text.contains("autres produits")),
            other => panic!("unexpected effect {other:?}"),
        }
    }
}

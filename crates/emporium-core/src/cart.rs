//! # Cart Aggregator
//!
//! Turns raw cart lines into priced line items and a subtotal.
//!
//! ## Build Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      build(lines, lookup)                               │
//! │                                                                         │
//! │  [CartLine]                                                             │
//! │      │ empty? ─────────────────────────────► EmptyCart                  │
//! │      ▼                                                                  │
//! │  merge by product_id (first-seen order)                                 │
//! │      │ qty <= 0 ───────────────────────────► Validation                 │
//! │      │ qty > 999 ──────────────────────────► QuantityTooLarge           │
//! │      │ > 100 products ─────────────────────► CartTooLarge               │
//! │      ▼                                                                  │
//! │  lookup each product                                                    │
//! │      │ missing ────────────────────────────► ProductNotFound            │
//! │      │ inactive ───────────────────────────► ProductInactive            │
//! │      ▼                                                                  │
//! │  freeze unit price + name + sku, line = price × qty                     │
//! │      ▼                                                                  │
//! │  PricedCart { lines, subtotal = Σ line }                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock is NOT checked here. Availability is only meaningful at the moment
//! of reservation, inside the order transaction.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{CartLine, OrderItem, Product};
use crate::validation::validate_quantity;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Product Lookup
// =============================================================================

/// Read access to the catalog while pricing a cart.
///
/// The service pre-fetches all of a cart's products in one query and hands
/// the resulting map to [`build`].
pub trait ProductLookup {
    fn product(&self, product_id: &str) -> Option<&Product>;
}

impl ProductLookup for HashMap<String, Product> {
    fn product(&self, product_id: &str) -> Option<&Product> {
        self.get(product_id)
    }
}

impl ProductLookup for [Product] {
    fn product(&self, product_id: &str) -> Option<&Product> {
        self.iter().find(|p| p.id == product_id)
    }
}

// =============================================================================
// Priced Cart
// =============================================================================

/// One cart line with the product data frozen at pricing time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PricedLine {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub line_subtotal: Money,
}

/// A validated, priced cart.
///
/// ## Invariants
/// - At least one line
/// - Lines are unique by `product_id`
/// - `subtotal == Σ line_subtotal`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PricedCart {
    pub lines: Vec<PricedLine>,
    pub subtotal: Money,
}

impl PricedCart {
    /// Number of distinct products.
    pub fn item_count(&self) -> usize {
        self.lines.len()
    }

    /// Sum of quantities across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// (product_id, quantity) pairs in line order, the input to stock
    /// reservation.
    pub fn quantities(&self) -> Vec<(String, i64)> {
        self.lines
            .iter()
            .map(|l| (l.product_id.clone(), l.quantity))
            .collect()
    }

    /// Converts the priced lines into order items owned by `order_id`.
    ///
    /// Snapshots come from the cart, not the catalog, so later catalog edits
    /// never reach the order.
    pub fn to_order_items(&self, order_id: &str) -> Vec<OrderItem> {
        self.lines
            .iter()
            .map(|line| OrderItem {
                id: uuid::Uuid::new_v4().to_string(),
                order_id: order_id.to_string(),
                product_id: line.product_id.clone(),
                sku_snapshot: line.sku.clone(),
                name_snapshot: line.name.clone(),
                unit_price_cents: line.unit_price.cents(),
                quantity: line.quantity,
                line_subtotal_cents: line.line_subtotal.cents(),
            })
            .collect()
    }
}

// =============================================================================
// Build
// =============================================================================

/// Prices `lines` against `lookup`.
///
/// ## Example
/// ```rust,ignore
/// let products: HashMap<String, Product> = catalog.get_many(&ids).await?;
/// let cart = cart::build(&lines, &products)?;
/// println!("{} items, subtotal {}", cart.total_quantity(), cart.subtotal);
/// ```
pub fn build<L>(lines: &[CartLine], lookup: &L) -> CoreResult<PricedCart>
where
    L: ProductLookup + ?Sized,
{
    if lines.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    let merged = merge_lines(lines)?;

    let mut priced = Vec::with_capacity(merged.len());
    let mut subtotal = Money::zero();

    for (product_id, quantity) in merged {
        let product = lookup
            .product(&product_id)
            .ok_or_else(|| CoreError::ProductNotFound(product_id.clone()))?;

        if !product.is_active {
            return Err(CoreError::ProductInactive(product_id));
        }

        let unit_price = product.price();
        let line_subtotal = unit_price
            .checked_multiply_quantity(quantity)
            .ok_or_else(|| CoreError::overflow(format!("line subtotal for {}", product_id)))?;
        subtotal = subtotal
            .checked_add(line_subtotal)
            .ok_or_else(|| CoreError::overflow("cart subtotal"))?;

        priced.push(PricedLine {
            product_id,
            sku: product.sku.clone(),
            name: product.name.clone(),
            unit_price,
            quantity,
            line_subtotal,
        });
    }

    Ok(PricedCart {
        lines: priced,
        subtotal,
    })
}

/// Sums quantities per product, keeping first-seen order.
fn merge_lines(lines: &[CartLine]) -> CoreResult<Vec<(String, i64)>> {
    let mut merged: Vec<(String, i64)> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for line in lines {
        if line.quantity <= 0 {
            validate_quantity(line.quantity)?;
        }

        match positions.get(line.product_id.as_str()) {
            Some(&idx) => {
                merged[idx].1 = merged[idx].1.saturating_add(line.quantity);
            }
            None => {
                positions.insert(line.product_id.as_str(), merged.len());
                merged.push((line.product_id.clone(), line.quantity));
            }
        }
    }

    if merged.len() > MAX_CART_ITEMS {
        return Err(CoreError::CartTooLarge {
            max: MAX_CART_ITEMS,
        });
    }

    if let Some((_, qty)) = merged.iter().find(|(_, qty)| *qty > MAX_ITEM_QUANTITY) {
        return Err(CoreError::QuantityTooLarge {
            requested: *qty,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(merged)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(id: &str, price_cents: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            sku: format!("SKU-{}", id),
            name: format!("Product {}", id),
            description: None,
            price_cents,
            stock_quantity: 10,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn catalog(products: Vec<Product>) -> HashMap<String, Product> {
        products.into_iter().map(|p| (p.id.clone(), p)).collect()
    }

    #[test]
    fn test_subtotal_is_sum_of_lines() {
        let products = catalog(vec![product("a", 1099), product("b", 250), product("c", 1)]);
        let lines = vec![
            CartLine::new("a", 3),
            CartLine::new("b", 4),
            CartLine::new("c", 999),
        ];

        let cart = build(&lines, &products).unwrap();

        assert_eq!(cart.subtotal, Money::from_cents(1099 * 3 + 250 * 4 + 999));
        let summed = cart
            .lines
            .iter()
            .try_fold(Money::zero(), |acc, l| acc.checked_add(l.line_subtotal));
        assert_eq!(summed, Some(cart.subtotal));
        for line in &cart.lines {
            assert_eq!(
                Some(line.line_subtotal),
                line.unit_price.checked_multiply_quantity(line.quantity)
            );
        }
    }

    #[test]
    fn test_empty_cart_rejected() {
        let products = catalog(vec![product("a", 100)]);
        assert!(matches!(build(&[], &products), Err(CoreError::EmptyCart)));
    }

    #[test]
    fn test_non_positive_quantity_rejected() {
        let products = catalog(vec![product("a", 100)]);
        let err = build(&[CartLine::new("a", 0)], &products).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let err = build(&[CartLine::new("a", -2)], &products).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_quantity_cap_applies_after_merge() {
        let products = catalog(vec![product("a", 100)]);
        let lines = vec![CartLine::new("a", 500), CartLine::new("a", 500)];
        let err = build(&lines, &products).unwrap_err();
        assert!(matches!(
            err,
            CoreError::QuantityTooLarge {
                requested: 1000,
                max: 999
            }
        ));
    }

    #[test]
    fn test_too_many_products() {
        let products: Vec<Product> = (0..=MAX_CART_ITEMS)
            .map(|i| product(&i.to_string(), 100))
            .collect();
        let lines: Vec<CartLine> = products.iter().map(|p| CartLine::new(&p.id, 1)).collect();
        let err = build(&lines, &catalog(products)).unwrap_err();
        assert!(matches!(err, CoreError::CartTooLarge { max: 100 }));
    }

    #[test]
    fn test_missing_and_inactive_products() {
        let mut inactive = product("off", 100);
        inactive.is_active = false;
        let products = catalog(vec![product("a", 100), inactive]);

        let err = build(&[CartLine::new("ghost", 1)], &products).unwrap_err();
        assert!(matches!(err, CoreError::ProductNotFound(id) if id == "ghost"));

        let err = build(&[CartLine::new("off", 1)], &products).unwrap_err();
        assert!(matches!(err, CoreError::ProductInactive(id) if id == "off"));
    }

    #[test]
    fn test_duplicate_lines_merge_in_first_seen_order() {
        let products = catalog(vec![product("a", 100), product("b", 200)]);
        let lines = vec![
            CartLine::new("b", 1),
            CartLine::new("a", 2),
            CartLine::new("b", 3),
        ];

        let cart = build(&lines, &products).unwrap();

        assert_eq!(cart.lines.len(), 2);
        assert_eq!(cart.lines[0].product_id, "b");
        assert_eq!(cart.lines[0].quantity, 4);
        assert_eq!(cart.lines[1].product_id, "a");
        assert_eq!(cart.subtotal, Money::from_cents(4 * 200 + 2 * 100));
    }

    #[test]
    fn test_item_count_vs_total_quantity() {
        let products = catalog(vec![product("a", 100), product("b", 200)]);
        let lines = vec![CartLine::new("a", 2), CartLine::new("b", 3)];

        let cart = build(&lines, &products).unwrap();

        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.total_quantity(), 5);
        assert!(!cart.is_empty());
    }

    #[test]
    fn test_subtotal_overflow_reported() {
        let products = catalog(vec![product("a", i64::MAX / 2), product("b", i64::MAX / 2)]);
        let lines = vec![CartLine::new("a", 2), CartLine::new("b", 2)];
        let err = build(&lines, &products).unwrap_err();
        assert!(matches!(err, CoreError::AmountOverflow { .. }));
    }

    #[test]
    fn test_order_items_freeze_snapshots() {
        let mut products = catalog(vec![product("a", 1500)]);
        let cart = build(&[CartLine::new("a", 2)], &products).unwrap();

        // Catalog changes after pricing
        if let Some(p) = products.get_mut("a") {
            p.price_cents = 9999;
            p.name = "Renamed".to_string();
        }

        let items = cart.to_order_items("order-1");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].order_id, "order-1");
        assert_eq!(items[0].unit_price_cents, 1500);
        assert_eq!(items[0].line_subtotal_cents, 3000);
        assert_eq!(items[0].name_snapshot, "Product a");
        assert_eq!(items[0].sku_snapshot, "SKU-a");
    }

    #[test]
    fn test_slice_lookup() {
        let products = vec![product("a", 100)];
        let cart = build(&[CartLine::new("a", 1)], products.as_slice()).unwrap();
        assert_eq!(cart.subtotal, Money::from_cents(100));
    }
}

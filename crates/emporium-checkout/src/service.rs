//! # Checkout Service
//!
//! Turns a cart into an order and moves orders through their lifecycle.
//!
//! ## Checkout Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_order(user, lines, code?, shipping)                            │
//! │                                                                         │
//! │  1. products().get_many(ids) ──► cart::build ──► PricedCart            │
//! │  2. discounts().get_by_code ──► discount::evaluate ──► AppliedDiscount │
//! │  3. total = subtotal - discount (floor 0)                              │
//! │                                                                         │
//! │  ┌──────────────────── ONE TRANSACTION ────────────────────────────┐   │
//! │  │ 4. reservation::reserve      (compare-and-decrement per line)   │   │
//! │  │ 5. increment_usage           (guarded by usage_limit)           │   │
//! │  │ 6. INSERT order + items + order_created event                   │   │
//! │  │ 7. COMMIT                                                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  Any error in 4-6 drops the transaction: no stock change, no usage,    │
//! │  no order, no event.                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Steps 1-3 only read. Step 4 is the first statement of the transaction and
//! a write, so the connection holds the SQLite write lock from there to
//! COMMIT and concurrent checkouts queue on `busy_timeout`.

use std::collections::HashSet;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info, warn};

use emporium_core::validation::{normalize_discount_code, validate_new_discount};
use emporium_core::{
    cart, discount, order_status, AppliedDiscount, CartLine, CoreError, Discount, Money,
    NewDiscount, Order, OrderEventType, OrderStatus, ShippingInfo, ValidationError,
    MAX_CART_ITEMS,
};
use emporium_db::repository::order::{generate_order_id, generate_order_number};
use emporium_db::reservation::{self, ReserveOutcome, StockReservation};
use emporium_db::{
    Database, DbError, DiscountRepository, OrderEventRepository, OrderRepository,
};
use sqlx::SqliteConnection;

use crate::config::CheckoutConfig;
use crate::error::CheckoutResult;

/// Longest admin note accepted.
pub const MAX_ADMIN_NOTES_LEN: usize = 2000;

/// The checkout engine.
///
/// Cheap to clone; every clone shares the same connection pool, so one
/// instance can serve any number of concurrent requests.
#[derive(Debug, Clone)]
pub struct CheckoutService {
    db: Database,
    order_list_limit: u32,
}

impl CheckoutService {
    /// Wraps an open database.
    pub fn new(db: Database, config: &CheckoutConfig) -> Self {
        CheckoutService {
            db,
            order_list_limit: config.order_list_limit,
        }
    }

    /// Opens the database described by `config` and wraps it.
    pub async fn connect(config: &CheckoutConfig) -> CheckoutResult<Self> {
        let db = Database::new(config.db_config()).await?;
        Ok(CheckoutService::new(db, config))
    }

    /// The underlying database, for catalog and outbox management.
    pub fn database(&self) -> &Database {
        &self.db
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Places an order for `user_id`.
    ///
    /// ## Returns
    /// * `Ok(Order)` - committed, status `Pending`, items in cart order
    /// * `Err(_)` - nothing was written
    pub async fn create_order(
        &self,
        user_id: &str,
        lines: &[CartLine],
        discount_code: Option<&str>,
        shipping: ShippingInfo,
    ) -> CheckoutResult<Order> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(required("user_id").into());
        }
        validate_shipping(&shipping)?;

        let code = discount_code.map(normalize_discount_code).transpose()?;

        debug!(user_id = %user_id, lines = lines.len(), code = ?code, "Checkout started");

        // Price the cart against the catalog as it is now
        let mut seen = HashSet::new();
        let ids: Vec<String> = lines
            .iter()
            .filter(|l| seen.insert(l.product_id.as_str()))
            .map(|l| l.product_id.clone())
            .collect();
        if ids.len() > MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            }
            .into());
        }

        let products = self.db.products().get_many(&ids).await?;
        let priced = cart::build(lines, &products)?;

        let now = Utc::now();

        let applied: Option<(Discount, AppliedDiscount)> = match &code {
            Some(code) => {
                let found = self.db.discounts().get_by_code(code).await?;
                let applied = discount::evaluate(code, found.as_ref(), priced.subtotal, now)?;
                found.map(|d| (d, applied))
            }
            None => None,
        };

        let discount_amount = applied
            .as_ref()
            .map(|(_, a)| a.discount_amount)
            .unwrap_or_else(Money::zero);
        let total = priced
            .subtotal
            .checked_sub(discount_amount)
            .ok_or_else(|| CoreError::overflow("order total"))?
            .floor_zero();

        let order_id = generate_order_id();
        let order = Order {
            id: order_id.clone(),
            order_number: generate_order_number(now),
            user_id: user_id.to_string(),
            status: OrderStatus::Pending,
            subtotal_cents: priced.subtotal.cents(),
            discount_id: applied.as_ref().map(|(d, _)| d.id.clone()),
            discount_code: applied.as_ref().map(|(_, a)| a.code.clone()),
            discount_cents: discount_amount.cents(),
            total_cents: total.cents(),
            shipping_address: shipping.shipping_address,
            customer_name: shipping.customer_name,
            customer_email: shipping.customer_email,
            customer_phone: shipping.customer_phone,
            notes: shipping.notes,
            admin_notes: None,
            created_at: now,
            updated_at: now,
            items: priced.to_order_items(&order_id),
        };

        // Commit sequence: dropping `tx` on any early return rolls back
        let mut tx = self.db.begin().await?;

        match reservation::reserve(&mut tx, &priced.quantities()).await? {
            ReserveOutcome::Reserved(token) => {
                debug!(units = token.total_quantity(), "Stock reserved");
            }
            ReserveOutcome::Shortfall {
                product_id,
                requested,
                available,
            } => {
                warn!(
                    user_id = %user_id,
                    product_id = %product_id,
                    requested,
                    available,
                    "Checkout rejected: insufficient stock"
                );
                return Err(CoreError::InsufficientStock {
                    product_id,
                    requested,
                    available,
                }
                .into());
            }
        }

        if let Some((discount, applied)) = &applied {
            if !DiscountRepository::increment_usage(&mut tx, &discount.id).await? {
                warn!(code = %applied.code, "Checkout rejected: discount no longer usable");
                return Err(usage_failure(&mut tx, discount, &applied.code).await?.into());
            }
        }

        OrderRepository::insert(&mut tx, &order).await?;

        let payload = json!({
            "orderNumber": order.order_number,
            "userId": order.user_id,
            "customerEmail": order.customer_email,
            "itemCount": order.items.len(),
            "totalCents": order.total_cents,
            "discountCode": order.discount_code,
        });
        OrderEventRepository::append(&mut tx, &order.id, OrderEventType::OrderCreated, &payload)
            .await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(
            order_id = %order.id,
            order_number = %order.order_number,
            user_id = %order.user_id,
            subtotal = %order.subtotal(),
            discount = %order.discount_amount(),
            total = %order.total(),
            "Order placed"
        );

        Ok(order)
    }

    /// Checks a discount code against `amount` without using it.
    pub async fn evaluate_discount(
        &self,
        code: &str,
        amount: Money,
    ) -> CheckoutResult<AppliedDiscount> {
        let code = normalize_discount_code(code)?;

        if amount.is_negative() {
            return Err(ValidationError::OutOfRange {
                field: "amount".to_string(),
                min: 0,
                max: i64::MAX,
            }
            .into());
        }

        let found = self.db.discounts().get_by_code(&code).await?;
        let applied = discount::evaluate(&code, found.as_ref(), amount, Utc::now())?;

        debug!(code = %code, amount = %amount, discount = %applied.discount_amount, "Discount previewed");
        Ok(applied)
    }

    // =========================================================================
    // Order lifecycle
    // =========================================================================

    /// Moves an order to `to`.
    ///
    /// Cancelling puts the order's quantities back in stock. The status
    /// change, the stock release and the outbox event commit together.
    pub async fn transition_order_status(
        &self,
        order_id: &str,
        to: OrderStatus,
    ) -> CheckoutResult<Order> {
        let mut order = self
            .db
            .orders()
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;

        let from = order.status;
        order_status::transition(from, to)?;

        let now = Utc::now();
        let mut tx = self.db.begin().await?;

        if !OrderRepository::compare_and_set_status(&mut tx, &order.id, from, to, now).await? {
            // Someone else moved the order after we read it
            let err = match OrderRepository::get_status(&mut tx, &order.id).await? {
                Some(current) => CoreError::InvalidStatusTransition { from: current, to },
                None => CoreError::OrderNotFound(order.id.clone()),
            };
            return Err(err.into());
        }

        let releases_stock = to.releases_stock();
        if releases_stock {
            reservation::release(&mut tx, &StockReservation::from_items(&order.items)).await?;
        }

        let payload = json!({
            "orderNumber": order.order_number,
            "from": from,
            "to": to,
            "stockReleased": releases_stock,
        });
        OrderEventRepository::append(
            &mut tx,
            &order.id,
            OrderEventType::OrderStatusChanged,
            &payload,
        )
        .await?;

        tx.commit().await.map_err(DbError::from)?;

        order.status = to;
        order.updated_at = now;

        info!(
            order_id = %order.id,
            order_number = %order.order_number,
            from = %from,
            to = %to,
            "Order status changed"
        );

        Ok(order)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// An order with its items.
    pub async fn get_order(&self, order_id: &str) -> CheckoutResult<Order> {
        let order = self
            .db
            .orders()
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;
        Ok(order)
    }

    /// A user's orders, newest first.
    pub async fn list_orders_for_user(&self, user_id: &str, limit: u32) -> CheckoutResult<Vec<Order>> {
        Ok(self
            .db
            .orders()
            .list_for_user(user_id, self.page_size(limit))
            .await?)
    }

    /// Orders in `status`, oldest first (the admin work queue).
    pub async fn list_orders_by_status(
        &self,
        status: OrderStatus,
        limit: u32,
    ) -> CheckoutResult<Vec<Order>> {
        Ok(self
            .db
            .orders()
            .list_by_status(status, self.page_size(limit))
            .await?)
    }

    fn page_size(&self, requested: u32) -> u32 {
        requested.clamp(1, self.order_list_limit)
    }

    // =========================================================================
    // Administration
    // =========================================================================

    /// Replaces an order's admin notes. Blank notes clear them.
    pub async fn update_admin_notes(&self, order_id: &str, notes: Option<&str>) -> CheckoutResult<()> {
        let notes = notes.map(str::trim).filter(|n| !n.is_empty());

        if let Some(n) = notes {
            if n.chars().count() > MAX_ADMIN_NOTES_LEN {
                return Err(ValidationError::TooLong {
                    field: "admin_notes".to_string(),
                    max: MAX_ADMIN_NOTES_LEN,
                }
                .into());
            }
        }

        match self.db.orders().update_admin_notes(order_id, notes).await {
            Ok(()) => Ok(()),
            Err(DbError::NotFound { .. }) => Err(CoreError::OrderNotFound(order_id.to_string()).into()),
            Err(e) => Err(e.into()),
        }
    }

    /// Creates a discount code after validating it.
    pub async fn create_discount(&self, new: &NewDiscount) -> CheckoutResult<Discount> {
        let new = validate_new_discount(new)?;
        let discount = self.db.discounts().insert(&new).await?;

        info!(code = %discount.code, discount_type = ?discount.discount_type, "Discount created");
        Ok(discount)
    }
}

fn required(field: &str) -> ValidationError {
    ValidationError::Required {
        field: field.to_string(),
    }
}

/// Explains a refused usage increment from the discount's state on `conn`.
async fn usage_failure(
    conn: &mut SqliteConnection,
    discount: &Discount,
    code: &str,
) -> CheckoutResult<CoreError> {
    let active = DiscountRepository::get_active_flag(conn, &discount.id).await?;

    let err = match (active, discount.usage_limit) {
        (Some(true), Some(limit)) => CoreError::DiscountUsageExceeded {
            code: code.to_string(),
            limit,
        },
        // Disabled or deleted since it was evaluated
        _ => CoreError::DiscountNotFound(code.to_string()),
    };
    Ok(err)
}

fn validate_shipping(shipping: &ShippingInfo) -> Result<(), ValidationError> {
    if shipping.shipping_address.trim().is_empty() {
        return Err(required("shipping_address"));
    }
    if shipping.customer_name.trim().is_empty() {
        return Err(required("customer_name"));
    }
    if shipping.customer_email.trim().is_empty() {
        return Err(required("customer_email"));
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Order State Machine
//!
//! Which status changes an order may go through after creation.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  PENDING ──► CONFIRMED ──► PROCESSING ──► SHIPPED ──► DELIVERED         │
//! │     │            │              │                                       │
//! │     └────────────┴──────────────┴──────────► CANCELLED                  │
//! │                                                                         │
//! │  DELIVERED and CANCELLED are terminal. Self-transitions are invalid.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{CoreError, CoreResult};
use crate::types::OrderStatus;

impl OrderStatus {
    /// Statuses reachable from `self` in one step.
    pub const fn allowed_transitions(&self) -> &'static [OrderStatus] {
        use OrderStatus::*;
        match self {
            Pending => &[Confirmed, Cancelled],
            Confirmed => &[Processing, Cancelled],
            Processing => &[Shipped, Cancelled],
            Shipped => &[Delivered],
            Delivered | Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Whether entering this status gives the order's stock back.
    pub const fn releases_stock(&self) -> bool {
        matches!(self, OrderStatus::Cancelled)
    }
}

/// Validates `from → to`, returning `to` on success.
///
/// ## Example
/// ```rust
/// use emporium_core::order_status::transition;
/// use emporium_core::OrderStatus;
///
/// assert_eq!(
///     transition(OrderStatus::Pending, OrderStatus::Confirmed).unwrap(),
///     OrderStatus::Confirmed
/// );
/// assert!(transition(OrderStatus::Delivered, OrderStatus::Cancelled).is_err());
/// ```
pub fn transition(from: OrderStatus, to: OrderStatus) -> CoreResult<OrderStatus> {
    if from.can_transition_to(to) {
        Ok(to)
    } else {
        Err(CoreError::InvalidStatusTransition { from, to })
    }
}

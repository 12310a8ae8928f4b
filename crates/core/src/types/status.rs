//! Status and role enums shared by the stores.

use serde::{Deserialize, Serialize};

/// Role attached to a user account.
///
/// Determines which store operations a view is allowed to drive; the
/// server is the actual authority and re-checks on every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Buyer,
    Admin,
}

/// Authentication provider a user registered through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    #[default]
    Local,
    Google,
}

/// Product line carried by the shop.
///
/// The wire format spells these `"Books"` and `"Stationary"` (sic); the
/// misspelling is the server's and must be preserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductKind {
    Books,
    #[serde(rename = "Stationary")]
    Stationery,
}

/// Direction of an inventory transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockMovement {
    In,
    Out,
}

/// Lifecycle status of an order.
///
/// Admins move an order forward along pending → paid → shipped →
/// delivered; pending or paid orders may instead end up cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Whether an admin status change from `self` to `next` moves forward
    /// along the fulfilment chain.
    ///
    /// Cancellation is not a forward transition; it has its own
    /// eligibility rule (see `Order::is_cancellable` in the client crate).
    #[must_use]
    pub const fn is_forward_transition(self, next: Self) -> bool {
        (self.rank() + 1) == next.rank() && !matches!(next, Self::Cancelled)
    }

    /// Whether this status still allows user cancellation at all.
    ///
    /// The other half of the eligibility rule is the 24-hour window,
    /// which needs the order's creation time.
    #[must_use]
    pub const fn allows_cancellation(self) -> bool {
        matches!(self, Self::Pending | Self::Paid)
    }

    const fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Paid => 1,
            Self::Shipped => 2,
            Self::Delivered => 3,
            Self::Cancelled => 4,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Paid => write!(f, "paid"),
            Self::Shipped => write!(f, "shipped"),
            Self::Delivered => write!(f, "delivered"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

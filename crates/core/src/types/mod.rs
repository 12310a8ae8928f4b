//! Core type definitions.
//!
//! Newtype wrappers and shared enums that prevent entire classes of
//! mix-up bugs (passing an order id where a product id is expected,
//! comparing statuses by string).

mod email;
mod id;
mod status;

pub use email::{Email, EmailError};
pub use id::{
    CartId, CartItemId, CategoryId, OrderId, OrderItemId, ProductId, ReviewId, TransactionId,
    UserId,
};
pub use status::{AuthProvider, OrderStatus, ProductKind, StockMovement, UserRole};

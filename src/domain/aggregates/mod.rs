//! Aggregates module
pub mod product;
pub mod cart;
pub mod order;
pub mod contact;

pub use product::{NewProduct, Product, ProductFilter, DEFAULT_CATEGORY};
pub use cart::{CartEntry, CartLine, CartSummary};
pub use order::{NewOrder, NewOrderLine, Order, OrderLine, OrderLineWithProduct, OrderStatus, UnknownStatus};
pub use contact::{Contact, NewContact};

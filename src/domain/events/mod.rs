//! Store change events
//!
//! Published on the database change bus after a mutation is durable. Live
//! queries listen for these and re-run.

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreEvent {
    ProductsChanged,
    CartChanged { session: String },
    OrdersChanged,
    ContactsChanged,
}

impl StoreEvent {
    /// Whether a cart view for `session` must be refreshed. Product edits
    /// change the joined name/price columns, so they count too.
    pub fn touches_cart(&self, session: &str) -> bool {
        match self {
            StoreEvent::ProductsChanged => true,
            StoreEvent::CartChanged { session: s } => s == session,
            _ => false,
        }
    }
}

pub mod cart;
pub mod checkout;

pub use cart::{CartSelection, CartSlot, CartStore};
pub use checkout::submit_order;

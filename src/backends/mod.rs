pub mod storefront;
pub mod traits;

// Re-export commonly used types
pub use storefront::StorefrontClient;
pub use traits::{ListingRequest, OrderRequest, StorefrontApi};

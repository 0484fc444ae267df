mod api;

pub use api::StorefrontClient;

pub mod cart_view_model;
pub mod catalog_view_model;
pub mod home_view_model;
pub mod property;
pub mod search_view_model;

pub use cart_view_model::{CartPanel, CartRow, CartViewModel, GaugeLevel, QuotaGauge};
pub use catalog_view_model::{CatalogViewModel, FetchOutcome, PageOutcome};
pub use home_view_model::{HomeRow, HomeSection, HomeViewModel};
pub use property::{Property, PropertySubscriber};
pub use search_view_model::{SearchHit, SearchOutcome, SearchViewModel};

/// Lets a front-end watch a view model's state by property name.
pub trait ViewModel: Send + Sync {
    fn subscribe_to_property(&self, property_name: &str) -> Option<PropertySubscriber>;
}

use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info};

use super::{Property, PropertySubscriber, ViewModel};
use crate::backends::traits::{ListingRequest, StorefrontApi};
use crate::models::{Category, MediaItem, MediaItemId};
use crate::services::cart::CartStore;
use crate::utils::Result;

#[derive(Debug, Clone, PartialEq)]
pub struct HomeRow {
    pub item: MediaItem,
    /// Already in the cart.
    pub is_selected: bool,
}

/// Preview row of one category on the home page.
#[derive(Debug, Clone, PartialEq)]
pub struct HomeSection {
    pub category: Category,
    pub title: String,
    pub rows: Vec<HomeRow>,
}

impl HomeSection {
    fn new(category: &Category, items: Vec<MediaItem>, selected: &HashSet<MediaItemId>) -> Self {
        let rows = items
            .into_iter()
            .map(|item| HomeRow {
                is_selected: selected.contains(&item.id),
                item,
            })
            .collect();
        Self {
            title: category.section_title().to_string(),
            category: category.clone(),
            rows,
        }
    }
}

#[derive(Debug)]
pub struct HomeViewModel {
    api: Arc<dyn StorefrontApi>,
    cart: Arc<CartStore>,
    sections: Property<Vec<HomeSection>>,
    is_loading: Property<bool>,
    notice: Property<Option<String>>,
}

impl HomeViewModel {
    pub fn new(api: Arc<dyn StorefrontApi>, cart: Arc<CartStore>) -> Self {
        Self {
            api,
            cart,
            sections: Property::new(Vec::new(), "sections"),
            is_loading: Property::new(false, "is_loading"),
            notice: Property::new(None, "notice"),
        }
    }

    pub fn sections(&self) -> &Property<Vec<HomeSection>> {
        &self.sections
    }

    pub fn is_loading(&self) -> &Property<bool> {
        &self.is_loading
    }

    pub fn notice(&self) -> &Property<Option<String>> {
        &self.notice
    }

    /// Preview row for `category`. `None` for the `top` pseudo-category and
    /// for categories without media.
    pub async fn load_home_section(&self, category: &Category) -> Result<Option<HomeSection>> {
        if category.slug == Category::TOP_SLUG {
            return Ok(None);
        }

        let request = ListingRequest::first_page(category.id.clone());
        let items = self.api.list_media(&request).await?;
        if items.is_empty() {
            debug!("Dropping empty home section {}", category.slug);
            return Ok(None);
        }

        let selected = self.cart.selected_ids().await?;
        Ok(Some(HomeSection::new(category, items, &selected)))
    }

    /// Load every section concurrently, keeping the category order.
    pub async fn load_home(&self, categories: &[Category]) -> Vec<HomeSection> {
        self.is_loading.set(true);

        let results = join_all(
            categories
                .iter()
                .map(|category| self.load_home_section(category)),
        )
        .await;

        let mut sections = Vec::new();
        for (category, result) in categories.iter().zip(results) {
            match result {
                Ok(Some(section)) => sections.push(section),
                Ok(None) => {}
                Err(e) => {
                    error!("Failed to load home section {}: {}", category.slug, e);
                    self.notice.set(Some(e.notice()));
                }
            }
        }

        info!("Loaded {} home sections", sections.len());
        self.sections.set(sections.clone());
        self.is_loading.set(false);
        sections
    }

    /// Re-evaluate the selection markers after the cart changed.
    pub async fn refresh_selection(&self) -> Result<()> {
        let selected = self.cart.selected_ids().await?;
        self.sections.update(|sections| {
            for row in sections.iter_mut().flat_map(|section| section.rows.iter_mut()) {
                row.is_selected = selected.contains(&row.item.id);
            }
        });
        Ok(())
    }
}

impl ViewModel for HomeViewModel {
    fn subscribe_to_property(&self, property_name: &str) -> Option<PropertySubscriber> {
        match property_name {
            "sections" => Some(self.sections.subscribe()),
            "is_loading" => Some(self.is_loading.subscribe()),
            "notice" => Some(self.notice.subscribe()),
            _ => None,
        }
    }
}

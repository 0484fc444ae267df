use kiosk::models::{Category, CategoryId, MediaItem, MediaItemId, MediaKind, Poster};

pub struct MediaItemBuilder {
    id: String,
    kind: MediaKind,
    title: String,
    price: u64,
    load: u64,
    tags: String,
}

impl MediaItemBuilder {
    pub fn movie(id: &str) -> Self {
        Self {
            id: id.to_string(),
            kind: MediaKind::Movie,
            title: format!("Movie {}", id),
            price: 500,
            load: 10,
            tags: String::new(),
        }
    }

    pub fn series(id: &str) -> Self {
        Self {
            kind: MediaKind::Series,
            title: format!("Series {}", id),
            ..Self::movie(id)
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn with_price(mut self, price: u64) -> Self {
        self.price = price;
        self
    }

    pub fn with_load(mut self, load: u64) -> Self {
        self.load = load;
        self
    }

    pub fn with_tags(mut self, tags: &str) -> Self {
        self.tags = tags.to_string();
        self
    }

    pub fn build(self) -> MediaItem {
        let full_title = match self.kind {
            MediaKind::Movie => None,
            MediaKind::Series => Some(format!("{} Season 1", self.title)),
        };
        MediaItem {
            slug: self.title.to_lowercase().replace(' ', "-"),
            id: MediaItemId::new(self.id),
            kind: self.kind,
            title: self.title,
            full_title,
            price: self.price,
            load: self.load,
            display_load: None,
            poster: Poster::default(),
            tags: self.tags,
            trailer_resource: None,
            display_orders: None,
            display_clicks: None,
            is_adult: false,
        }
    }
}

/// Movies `m0..` with the default price and load.
pub fn movies(count: usize) -> Vec<MediaItem> {
    (0..count)
        .map(|i| MediaItemBuilder::movie(&format!("m{}", i)).build())
        .collect()
}

pub fn category(id: &str, slug: &str) -> Category {
    Category {
        id: CategoryId::new(id),
        slug: slug.to_string(),
        title: format!("Category {}", slug),
        previews_title: None,
    }
}

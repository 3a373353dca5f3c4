use async_trait::async_trait;
use serde_json::json;

use super::{ItemSource, SourceContent, SourceItem};
use crate::error::VectorSearchResult;
use crate::models::Payload;

const COLORS: [&str; 100] = [
    "Red", "Scarlet", "Crimson", "Burgundy", "Maroon", "Ruby", "Cerise", "Carmine",
    "Barn Red", "Coral", "Salmon", "Pink", "Hot Pink", "Rose", "Fuchsia", "Magenta",
    "Raspberry", "Lavender Pink", "Light Salmon", "Dark Red", "Orange", "Dark Orange",
    "Tangerine", "Apricot", "Peach", "Gold", "Yellow", "Lemon", "Canary", "Chartreuse",
    "Mustard", "Saffron", "Amber", "Beige", "Khaki", "Cream", "Papaya Whip", "Corn",
    "Citrine", "Goldenrod", "Green", "Lime", "Forest Green", "Emerald", "Jade", "Sea Green",
    "Mint", "Olive", "Sage", "Hunter Green", "Kelly Green", "Spring Green", "Dark Green",
    "Aquamarine", "Chartreuse Green", "Moss Green", "Pear", "Shamrock Green", "Teal Green",
    "Artichoke Green", "Blue", "Navy", "Royal Blue", "Sapphire", "Azure", "Cerulean",
    "Sky Blue", "Baby Blue", "Turquoise", "Cyan", "Teal", "Indigo", "Denim", "Periwinkle",
    "Powder Blue", "Cadet Blue", "Steel Blue", "Midnight Blue", "Cobalt", "Electric Blue",
    "Purple", "Violet", "Lavender", "Plum", "Lilac", "Amethyst", "Mauve", "Thistle",
    "Orchid", "Byzantium", "Black", "White", "Gray", "Silver", "Charcoal", "Brown",
    "Chocolate", "Tan", "Sepia", "Ivory",
];

/// Fixed list of color names, embedded as text
pub struct ColorSource {
    colors: Vec<String>,
}

impl ColorSource {
    pub fn new() -> Self {
        Self::with_colors(COLORS)
    }

    pub fn with_colors<I, S>(colors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            colors: colors.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for ColorSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ItemSource for ColorSource {
    async fn list(&self) -> VectorSearchResult<Vec<SourceItem>> {
        Ok(self.colors.iter().map(SourceItem::new).collect())
    }

    async fn resolve(&self, item: &SourceItem) -> VectorSearchResult<SourceContent> {
        Ok(SourceContent::Text(item.name.clone()))
    }

    fn payload(&self, item: &SourceItem, _content: &SourceContent, position: u64) -> Payload {
        let mut payload = Payload::new();
        payload.insert("color".to_string(), json!(item.name));
        payload.insert("rand_number".to_string(), json!(position % 10));
        payload
    }
}

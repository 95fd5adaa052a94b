// Declarative poster layouts: named image and text slots on a fixed canvas

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Slot names understood by the infographic renderer
pub mod slot {
    pub const POSTER: &str = "poster";
    pub const CRITIC_ICON: &str = "critic_icon";
    pub const AUDIENCE_ICON: &str = "audience_icon";
    pub const YEAR: &str = "year";
    pub const BOX_OFFICE: &str = "box_office";
    pub const CRITIC_SCORE: &str = "critic_score";
    pub const AUDIENCE_SCORE: &str = "audience_score";
    pub const NAME: &str = "name";
    pub const AGE: &str = "age";
}

pub const DARK_BACKGROUND: [u8; 3] = [30, 30, 30];
pub const WHITE: [u8; 3] = [255, 255, 255];

/// Rectangle an image is scaled into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSlot {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl ImageSlot {
    pub const fn new(x: i64, y: i64, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Top-left anchor of a line of text
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextSlot {
    pub x: i32,
    pub y: i32,
    /// Pixel height of the font
    #[serde(default = "default_text_size")]
    pub size: f32,
    #[serde(default = "default_text_color")]
    pub color: [u8; 3],
}

fn default_text_size() -> f32 {
    48.0
}

fn default_text_color() -> [u8; 3] {
    WHITE
}

impl TextSlot {
    pub const fn new(x: i32, y: i32, size: f32) -> Self {
        Self {
            x,
            y,
            size,
            color: WHITE,
        }
    }
}

/// A fixed-size canvas with named placements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosterLayout {
    pub width: u32,
    pub height: u32,
    /// Canvas color when no background template is available
    pub background: [u8; 3],
    pub images: BTreeMap<String, ImageSlot>,
    pub texts: BTreeMap<String, TextSlot>,
}

/// Partial layout from configuration, merged slot by slot over a default layout
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOverride {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub background: Option<[u8; 3]>,
    pub images: BTreeMap<String, ImageSlot>,
    pub texts: BTreeMap<String, TextSlot>,
}

/// An image bound to its slot
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePlacement {
    pub path: PathBuf,
    pub slot: ImageSlot,
}

/// Text bound to its slot
#[derive(Debug, Clone, PartialEq)]
pub struct TextPlacement {
    pub text: String,
    pub slot: TextSlot,
}

/// Everything the compositor needs to draw one poster
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    pub width: u32,
    pub height: u32,
    pub background: [u8; 3],
    /// Template drawn stretched over the whole canvas before any placement
    pub template: Option<PathBuf>,
    pub images: Vec<ImagePlacement>,
    pub texts: Vec<TextPlacement>,
}

impl PosterLayout {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            background: DARK_BACKGROUND,
            images: BTreeMap::new(),
            texts: BTreeMap::new(),
        }
    }

    pub fn with_image(mut self, name: &str, slot: ImageSlot) -> Self {
        self.images.insert(name.to_string(), slot);
        self
    }

    pub fn with_text(mut self, name: &str, slot: TextSlot) -> Self {
        self.texts.insert(name.to_string(), slot);
        self
    }

    /// 1080x1920 movie frame: year and box office above the poster, score icons below
    pub fn film_strip() -> Self {
        Self::new(1080, 1920)
            .with_image(slot::POSTER, ImageSlot::new(156, 144, 770, 1365))
            .with_image(slot::CRITIC_ICON, ImageSlot::new(156, 1510, 300, 300))
            .with_image(slot::AUDIENCE_ICON, ImageSlot::new(626, 1510, 300, 300))
            .with_text(slot::YEAR, TextSlot::new(170, 90, 48.0))
            .with_text(slot::BOX_OFFICE, TextSlot::new(696, 90, 48.0))
            .with_text(slot::CRITIC_SCORE, TextSlot::new(200, 1840, 64.0))
            .with_text(slot::AUDIENCE_SCORE, TextSlot::new(670, 1840, 64.0))
    }

    /// 1080x1920 actor frame: name and age above the portrait, averages and total below
    pub fn actor_card() -> Self {
        Self::new(1080, 1920)
            .with_image(slot::POSTER, ImageSlot::new(156, 144, 770, 1365))
            .with_image(slot::CRITIC_ICON, ImageSlot::new(156, 1530, 220, 220))
            .with_image(slot::AUDIENCE_ICON, ImageSlot::new(430, 1530, 220, 220))
            .with_text(slot::NAME, TextSlot::new(170, 40, 56.0))
            .with_text(slot::AGE, TextSlot::new(696, 52, 40.0))
            .with_text(slot::BOX_OFFICE, TextSlot::new(704, 1610, 56.0))
            .with_text(slot::CRITIC_SCORE, TextSlot::new(200, 1780, 56.0))
            .with_text(slot::AUDIENCE_SCORE, TextSlot::new(474, 1780, 56.0))
    }

    pub fn with_overrides(mut self, overrides: &LayoutOverride) -> Self {
        if let Some(width) = overrides.width {
            self.width = width;
        }
        if let Some(height) = overrides.height {
            self.height = height;
        }
        if let Some(background) = overrides.background {
            self.background = background;
        }
        self.images
            .extend(overrides.images.iter().map(|(k, v)| (k.clone(), *v)));
        self.texts
            .extend(overrides.texts.iter().map(|(k, v)| (k.clone(), *v)));
        self
    }

    /// Bind content to slots by name. Content for slots the layout lacks is dropped.
    pub fn compose(
        &self,
        template: Option<PathBuf>,
        images: impl IntoIterator<Item = (&'static str, PathBuf)>,
        texts: impl IntoIterator<Item = (&'static str, String)>,
    ) -> Composition {
        let images = images
            .into_iter()
            .filter_map(|(name, path)| match self.images.get(name) {
                Some(slot) => Some(ImagePlacement { path, slot: *slot }),
                None => {
                    tracing::debug!("Layout has no image slot {:?}", name);
                    None
                }
            })
            .collect();

        let texts = texts
            .into_iter()
            .filter_map(|(name, text)| match self.texts.get(name) {
                Some(slot) => Some(TextPlacement { text, slot: *slot }),
                None => {
                    tracing::debug!("Layout has no text slot {:?}", name);
                    None
                }
            })
            .collect();

        Composition {
            width: self.width,
            height: self.height,
            background: self.background,
            template,
            images,
            texts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_film_strip_defaults() {
        let layout = PosterLayout::film_strip();
        assert_eq!((layout.width, layout.height), (1080, 1920));
        assert_eq!(layout.images[slot::POSTER], ImageSlot::new(156, 144, 770, 1365));
        assert_eq!(layout.images[slot::AUDIENCE_ICON].x, 626);
        assert_eq!(layout.texts[slot::BOX_OFFICE].x, 696);
    }

    #[test]
    fn test_overrides_merge_per_slot() {
        let overrides: LayoutOverride = toml::from_str(
            r#"
background = [0, 0, 0]

[texts.year]
x = 10
y = 20
"#,
        )
        .unwrap();
        let layout = PosterLayout::film_strip().with_overrides(&overrides);

        assert_eq!(layout.background, [0, 0, 0]);
        assert_eq!(layout.texts[slot::YEAR].x, 10);
        assert_eq!(layout.texts[slot::YEAR].size, 48.0);
        assert_eq!(layout.texts[slot::YEAR].color, WHITE);
        assert_eq!(layout.texts[slot::BOX_OFFICE].x, 696);
        assert_eq!(layout.images.len(), 3);
    }

    #[test]
    fn test_compose_drops_unknown_slots() {
        let layout = PosterLayout::film_strip();
        let composition = layout.compose(
            None,
            [(slot::POSTER, PathBuf::from("p.jpg"))],
            [
                (slot::YEAR, "1997".to_string()),
                (slot::NAME, "Will Smith".to_string()),
            ],
        );

        assert_eq!(composition.images.len(), 1);
        assert_eq!(composition.texts.len(), 1);
        assert_eq!(composition.texts[0].text, "1997");
        assert_eq!(composition.texts[0].slot.y, 90);
    }
}

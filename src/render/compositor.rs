// Poster compositor: draws a Composition onto an RGB canvas

use fontdue::{Font, FontSettings};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage, Rgba, RgbaImage};
use std::path::{Path, PathBuf};

use crate::error::RenderError;
use crate::render::layout::{Composition, ImagePlacement, TextPlacement};

/// Searched in order when no font is configured
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

fn read_font(path: &Path) -> Option<Font> {
    let bytes = std::fs::read(path).ok()?;
    match Font::from_bytes(bytes, FontSettings::default()) {
        Ok(font) => Some(font),
        Err(e) => {
            tracing::warn!("Failed to parse font {}: {}", path.display(), e);
            None
        }
    }
}

/// Load the configured font, falling back to well-known system fonts
pub fn load_font(configured: Option<&Path>) -> Option<Font> {
    if let Some(path) = configured {
        if let Some(font) = read_font(path) {
            tracing::debug!("Using font {}", path.display());
            return Some(font);
        }
        tracing::warn!("Configured font {} is unusable", path.display());
    }

    let found = SYSTEM_FONTS
        .iter()
        .map(PathBuf::from)
        .find_map(|path| read_font(&path).map(|font| (path, font)));

    match found {
        Some((path, font)) => {
            tracing::debug!("Using system font {}", path.display());
            Some(font)
        }
        None => {
            tracing::warn!("No usable font found; text overlays will be skipped");
            None
        }
    }
}

/// Renders compositions. Missing assets are logged and skipped.
pub struct Compositor {
    font: Option<Font>,
}

impl Compositor {
    pub fn new(font: Option<Font>) -> Self {
        Self { font }
    }

    pub fn render(&self, composition: &Composition) -> RgbImage {
        let mut canvas = self.background(composition);

        for placement in &composition.images {
            if let Err(e) = overlay_image(&mut canvas, placement) {
                tracing::warn!(
                    "Skipping image {}: {}",
                    placement.path.display(),
                    e
                );
            }
        }

        if let Some(ref font) = self.font {
            for placement in &composition.texts {
                draw_text(&mut canvas, font, placement);
            }
        }

        image::DynamicImage::ImageRgba8(canvas).to_rgb8()
    }

    fn background(&self, composition: &Composition) -> RgbaImage {
        let (width, height) = (composition.width, composition.height);

        if let Some(ref template) = composition.template {
            match image::open(template) {
                Ok(img) => {
                    return imageops::resize(&img.to_rgba8(), width, height, FilterType::Triangle)
                }
                Err(e) => tracing::warn!(
                    "Background template {} unavailable ({}), using plain canvas",
                    template.display(),
                    e
                ),
            }
        }

        let [r, g, b] = composition.background;
        RgbaImage::from_pixel(width, height, Rgba([r, g, b, 255]))
    }
}

fn overlay_image(canvas: &mut RgbaImage, placement: &ImagePlacement) -> Result<(), RenderError> {
    let slot = placement.slot;
    if slot.width == 0 || slot.height == 0 {
        return Ok(());
    }

    let img = image::open(&placement.path)?.to_rgba8();
    let resized = imageops::resize(&img, slot.width, slot.height, FilterType::Lanczos3);
    imageops::overlay(canvas, &resized, slot.x, slot.y);
    Ok(())
}

/// Draw one line of text with its top edge at the slot anchor
fn draw_text(canvas: &mut RgbaImage, font: &Font, placement: &TextPlacement) {
    let slot = placement.slot;
    let ascent = font
        .horizontal_line_metrics(slot.size)
        .map(|m| m.ascent)
        .unwrap_or(slot.size);
    let baseline = slot.y as f32 + ascent;
    let [r, g, b] = slot.color;

    let mut pen_x = slot.x as f32;
    for ch in placement.text.chars() {
        let (metrics, bitmap) = font.rasterize(ch, slot.size);

        let left = (pen_x + metrics.xmin as f32).round() as i64;
        // ymin is the offset from the baseline to the glyph bottom
        let top = (baseline - metrics.height as f32 - metrics.ymin as f32).round() as i64;

        for gy in 0..metrics.height {
            for gx in 0..metrics.width {
                let coverage = bitmap[gy * metrics.width + gx];
                if coverage == 0 {
                    continue;
                }
                let (px, py) = (left + gx as i64, top + gy as i64);
                if px < 0 || py < 0 || px >= canvas.width() as i64 || py >= canvas.height() as i64
                {
                    continue;
                }
                blend(canvas.get_pixel_mut(px as u32, py as u32), [r, g, b], coverage);
            }
        }

        pen_x += metrics.advance_width;
    }
}

fn blend(pixel: &mut Rgba<u8>, color: [u8; 3], coverage: u8) {
    let alpha = coverage as f32 / 255.0;
    for (channel, target) in pixel.0.iter_mut().take(3).zip(color) {
        *channel = (*channel as f32 * (1.0 - alpha) + target as f32 * alpha).round() as u8;
    }
}

/// Scale every frame to `width` (keeping aspect) and stack them top to bottom
pub fn stack_vertically(frames: &[RgbImage], width: u32) -> Result<RgbImage, RenderError> {
    if frames.is_empty() {
        return Err(RenderError::Empty("no frames to stack".to_string()));
    }
    if width == 0 {
        return Err(RenderError::InvalidVideo("width must be positive".to_string()));
    }

    let scaled: Vec<RgbImage> = frames
        .iter()
        .map(|frame| resize_to_width(frame, width))
        .collect();

    let total_height: u32 = scaled.iter().map(|f| f.height()).sum();
    let mut out = RgbImage::from_pixel(width, total_height, Rgb([0, 0, 0]));

    let mut y = 0i64;
    for frame in &scaled {
        imageops::replace(&mut out, frame, 0, y);
        y += i64::from(frame.height());
    }

    Ok(out)
}

/// Resize keeping aspect ratio so the result is exactly `width` wide
pub fn resize_to_width(img: &RgbImage, width: u32) -> RgbImage {
    if img.width() == width {
        return img.clone();
    }
    let height = ((img.height() as f64 * width as f64 / img.width().max(1) as f64).round() as u32)
        .max(1);
    imageops::resize(img, width, height, FilterType::Lanczos3)
}

/// Save a rendered poster, creating parent directories as needed
pub fn save_image(img: &RgbImage, path: &Path) -> Result<(), RenderError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    img.save(path)?;
    Ok(())
}

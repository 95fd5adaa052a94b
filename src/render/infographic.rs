// Actor infographic: an actor card, one film strip per superlative, and the actor card again

use image::RgbImage;
use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::error::RenderError;
use crate::models::{ActorSummary, MovieRecord};
use crate::render::compositor::{load_font, stack_vertically, Compositor};
use crate::render::layout::{slot, Composition, PosterLayout};
use crate::stats::aggregate::{AggregateStats, Superlative};
use crate::stats::format::{format_dollars, format_percent, score_icon, ScoreKind};

fn icon(icons_dir: &Path, kind: ScoreKind, score: u8) -> PathBuf {
    icons_dir.join(score_icon(kind, score))
}

/// One movie frame: poster, release year, box office and both scores with their icons
pub fn film_strip_composition(
    layout: &PosterLayout,
    template: Option<&Path>,
    icons_dir: &Path,
    movie: &MovieRecord,
) -> Composition {
    let mut images = Vec::new();
    let mut texts = Vec::new();

    if let Some(ref poster) = movie.poster_path {
        images.push((slot::POSTER, poster.clone()));
    }
    if let Some(score) = movie.critic_score {
        images.push((slot::CRITIC_ICON, icon(icons_dir, ScoreKind::Critic, score)));
        texts.push((slot::CRITIC_SCORE, format_percent(u32::from(score))));
    }
    if let Some(score) = movie.audience_score {
        images.push((slot::AUDIENCE_ICON, icon(icons_dir, ScoreKind::Audience, score)));
        texts.push((slot::AUDIENCE_SCORE, format_percent(u32::from(score))));
    }
    if let Some(year) = movie.release_year {
        texts.push((slot::YEAR, year.to_string()));
    }
    if let Some(box_office) = movie.box_office {
        texts.push((slot::BOX_OFFICE, format_dollars(box_office)));
    }

    layout.compose(template.map(Path::to_path_buf), images, texts)
}

/// The actor frame: portrait, name, age, average scores and total box office
pub fn actor_card_composition(
    layout: &PosterLayout,
    template: Option<&Path>,
    icons_dir: &Path,
    actor: &ActorSummary,
    stats: &AggregateStats<'_>,
) -> Composition {
    let mut images = Vec::new();
    let mut texts = vec![
        (slot::NAME, actor.name.clone()),
        (slot::BOX_OFFICE, format_dollars(stats.total_box_office)),
        (slot::CRITIC_SCORE, format_percent(stats.average_critic_score)),
        (slot::AUDIENCE_SCORE, format_percent(stats.average_audience_score)),
    ];

    if let Some(ref portrait) = actor.portrait_path {
        images.push((slot::POSTER, portrait.clone()));
    }
    if let Some(age) = actor.age() {
        texts.push((slot::AGE, format!("Age {}", age)));
    }

    let average_icon = |kind, average: u32| {
        icon(icons_dir, kind, u8::try_from(average.min(100)).unwrap_or(100))
    };
    images.push((
        slot::CRITIC_ICON,
        average_icon(ScoreKind::Critic, stats.average_critic_score),
    ));
    images.push((
        slot::AUDIENCE_ICON,
        average_icon(ScoreKind::Audience, stats.average_audience_score),
    ));

    layout.compose(template.map(Path::to_path_buf), images, texts)
}

/// A rendered frame and the name it is saved under
pub struct Frame {
    pub name: String,
    pub superlative: Option<Superlative>,
    pub image: RgbImage,
}

/// Renders actor infographics with a fixed set of layouts and assets
pub struct InfographicRenderer {
    compositor: Compositor,
    film_strip: PosterLayout,
    actor_card: PosterLayout,
    template: Option<PathBuf>,
    icons_dir: PathBuf,
}

impl InfographicRenderer {
    pub fn new(
        compositor: Compositor,
        film_strip: PosterLayout,
        actor_card: PosterLayout,
        template: Option<PathBuf>,
        icons_dir: PathBuf,
    ) -> Self {
        Self {
            compositor,
            film_strip,
            actor_card,
            template,
            icons_dir,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let font = load_font(config.render.font_path.as_deref());
        Self::new(
            Compositor::new(font),
            config.render.film_strip_layout(),
            config.render.actor_card_layout(),
            config.render.template_path.clone(),
            config.icons_dir(),
        )
    }

    /// Width every frame is stacked at
    pub fn width(&self) -> u32 {
        self.film_strip.width
    }

    pub fn render_film_strip(&self, movie: &MovieRecord) -> RgbImage {
        let composition = film_strip_composition(
            &self.film_strip,
            self.template.as_deref(),
            &self.icons_dir,
            movie,
        );
        self.compositor.render(&composition)
    }

    pub fn render_actor_card(&self, actor: &ActorSummary, stats: &AggregateStats<'_>) -> RgbImage {
        let composition = actor_card_composition(
            &self.actor_card,
            self.template.as_deref(),
            &self.icons_dir,
            actor,
            stats,
        );
        self.compositor.render(&composition)
    }

    /// Actor card, then one frame per present superlative
    pub fn render_frames(&self, actor: &ActorSummary, stats: &AggregateStats<'_>) -> Vec<Frame> {
        let mut frames = vec![Frame {
            name: actor.name.clone(),
            superlative: None,
            image: self.render_actor_card(actor, stats),
        }];

        for (which, movie) in stats.superlatives() {
            tracing::debug!("{}: {} -> {}", actor.name, which.label(), movie.title);
            frames.push(Frame {
                name: movie.title.clone(),
                superlative: Some(which),
                image: self.render_film_strip(movie),
            });
        }

        frames
    }

    /// Stack the frames into one tall image, closing with the actor card again
    pub fn stack(&self, frames: &[Frame]) -> Result<RgbImage, RenderError> {
        let mut images: Vec<RgbImage> = frames.iter().map(|f| f.image.clone()).collect();
        if let Some(card) = frames.iter().find(|f| f.superlative.is_none()) {
            images.push(card.image.clone());
        }
        stack_vertically(&images, self.width())
    }
}

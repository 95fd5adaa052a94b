// Per-actor orchestration: scrape, enrich, persist, then reload for statistics

use anyhow::Result;
use reqwest::Client;
use sqlx::SqlitePool;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::db;
use crate::error::BoxOfficeParseError;
use crate::models::{ActorSummary, CreditedMovie, MovieRecord, NewActor, NewMovie};
use crate::services::inflation::{parse_release_year, PriceIndex};
use crate::services::omdb::{self, MovieMetadata, OmdbClient};
use crate::services::scraper::{parse_score, RawFilmographyRow, RtScraper};
use crate::stats::box_office::parse_box_office;
use crate::stats::title::{normalize_title, poster_file_stem};

/// Why a filmography row was not stored
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    MissingTitle,
    NoBoxOffice,
    FutureRelease(i32),
    NotFoundInOmdb,
    NotInCast,
    InvalidBoxOffice(String),
    Lookup(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingTitle => write!(f, "no title"),
            SkipReason::NoBoxOffice => write!(f, "no box office data"),
            SkipReason::FutureRelease(year) => write!(f, "not released yet ({})", year),
            SkipReason::NotFoundInOmdb => write!(f, "not found in OMDb"),
            SkipReason::NotInCast => write!(f, "actor not in OMDb cast list"),
            SkipReason::InvalidBoxOffice(raw) => write!(f, "invalid box office {:?}", raw),
            SkipReason::Lookup(e) => write!(f, "lookup failed: {}", e),
        }
    }
}

impl From<BoxOfficeParseError> for SkipReason {
    fn from(e: BoxOfficeParseError) -> Self {
        SkipReason::InvalidBoxOffice(e.raw)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MovieOutcome {
    Stored,
    Skipped(SkipReason),
}

/// Per-movie outcomes of collecting one actor
#[derive(Debug, Clone, PartialEq)]
pub struct ActorReport {
    pub actor: String,
    pub outcomes: Vec<(String, MovieOutcome)>,
}

impl ActorReport {
    pub fn new(actor: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            outcomes: Vec::new(),
        }
    }

    pub fn stored(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| *o == MovieOutcome::Stored)
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.stored()
    }

    fn record(&mut self, title: impl Into<String>, outcome: MovieOutcome) {
        let title = title.into();
        match outcome {
            MovieOutcome::Stored => tracing::info!("{}: stored {:?}", self.actor, title),
            MovieOutcome::Skipped(ref reason) => {
                tracing::info!("{}: skipped {:?}: {}", self.actor, title, reason)
            }
        }
        self.outcomes.push((title, outcome));
    }

    pub fn log_summary(&self) {
        tracing::info!(
            "{}: {} movies stored, {} skipped",
            self.actor,
            self.stored(),
            self.skipped()
        );
    }
}

/// Checks that need no network: a title, scraped box office data and a past release.
/// Returns the title normalized for lookup.
pub fn screen_row(row: &RawFilmographyRow, current_year: i32) -> Result<String, SkipReason> {
    let title = row
        .title
        .as_deref()
        .map(normalize_title)
        .filter(|t| !t.is_empty())
        .ok_or(SkipReason::MissingTitle)?;

    if parse_box_office(row.box_office.as_deref())?.is_none() {
        return Err(SkipReason::NoBoxOffice);
    }

    if let Some(year) = row.year.as_deref().and_then(|y| parse_release_year(y).ok()) {
        if year > current_year {
            return Err(SkipReason::FutureRelease(year));
        }
    }

    Ok(title)
}

/// OMDb's box office when it has one, otherwise the scraped figure
pub fn choose_box_office(
    metadata: Option<&str>,
    scraped: Option<&str>,
) -> Result<Option<f64>, BoxOfficeParseError> {
    match parse_box_office(metadata) {
        Ok(Some(value)) => Ok(Some(value)),
        Ok(None) => parse_box_office(scraped),
        Err(e) => {
            tracing::debug!("{}; using scraped box office", e);
            parse_box_office(scraped)
        }
    }
}

/// Merge a scraped row with its OMDb metadata into a storable movie
pub fn build_new_movie(
    row: &RawFilmographyRow,
    metadata: &MovieMetadata,
    box_office: Option<f64>,
    poster_path: Option<&Path>,
) -> NewMovie {
    let release_year = metadata
        .release_year()
        .or_else(|| row.year.as_deref().and_then(|y| parse_release_year(y).ok()));

    NewMovie {
        critic_score: parse_score(row.critic_score.as_deref()).map(f64::from),
        audience_score: parse_score(row.audience_score.as_deref()).map(f64::from),
        imdb_score: metadata.imdb_rating,
        box_office,
        poster_url: metadata.poster_url.clone(),
        poster_path: poster_path.map(|p| p.display().to_string()),
        release_date: metadata.released.clone(),
        release_year,
        runtime: metadata.runtime.clone(),
        mpaa_rating: metadata.rated.clone(),
        synopsis: metadata.plot.clone(),
        awards: metadata.awards.clone(),
        genres: metadata.genre.clone(),
        directors: metadata.director.clone(),
        ..NewMovie::new(metadata.title.clone())
    }
}

/// Scrapes, enriches and stores filmographies
pub struct Collector<'a> {
    pool: &'a SqlitePool,
    client: Client,
    scraper: RtScraper,
    omdb: OmdbClient,
    portrait_dir: PathBuf,
    current_year: i32,
}

impl<'a> Collector<'a> {
    pub fn new(
        pool: &'a SqlitePool,
        client: Client,
        scraper: RtScraper,
        omdb: OmdbClient,
        portrait_dir: PathBuf,
        current_year: i32,
    ) -> Self {
        Self {
            pool,
            client,
            scraper,
            omdb,
            portrait_dir,
            current_year,
        }
    }

    /// Collect one actor. Scraping and per-movie lookups fail soft; database errors propagate.
    pub async fn collect_actor(&self, name: &str) -> Result<ActorReport> {
        let mut report = ActorReport::new(name);
        let page = self.scraper.scrape_actor(name).await;

        if page.rows.is_empty() {
            tracing::warn!("No filmography found for {}", name);
        }

        let portrait_path = match page.portrait_url {
            Some(ref url) => self.download_portrait(name, url).await,
            None => None,
        };

        db::upsert_actor(
            self.pool,
            &NewActor {
                name: name.to_string(),
                birth_date: page.birth_date,
                portrait_url: page.portrait_url.clone(),
                portrait_path: portrait_path.map(|p| p.display().to_string()),
            },
        )
        .await?;

        for row in &page.rows {
            let label = row
                .title
                .clone()
                .unwrap_or_else(|| format!("row {}", row.sequence_id));

            let outcome = match self.collect_movie(name, row).await? {
                Ok(()) => MovieOutcome::Stored,
                Err(reason) => MovieOutcome::Skipped(reason),
            };
            report.record(label, outcome);
        }

        report.log_summary();
        Ok(report)
    }

    /// Inner result is the movie outcome; the outer one is a storage failure
    async fn collect_movie(
        &self,
        actor: &str,
        row: &RawFilmographyRow,
    ) -> Result<Result<(), SkipReason>> {
        let title = match screen_row(row, self.current_year) {
            Ok(title) => title,
            Err(reason) => return Ok(Err(reason)),
        };

        let metadata = match self.omdb.get_movie(&title).await {
            Ok(Some(metadata)) => metadata,
            Ok(None) => return Ok(Err(SkipReason::NotFoundInOmdb)),
            Err(e) => return Ok(Err(SkipReason::Lookup(format!("{:#}", e)))),
        };

        if metadata.cast_excludes(actor) {
            return Ok(Err(SkipReason::NotInCast));
        }

        let box_office =
            match choose_box_office(metadata.box_office.as_deref(), row.box_office.as_deref()) {
                Ok(value) => value,
                Err(e) => return Ok(Err(e.into())),
            };

        let poster_path = match metadata.poster_url {
            Some(ref url) => match self.omdb.download_poster(&metadata.title, url).await {
                Ok(path) => Some(path),
                Err(e) => {
                    tracing::warn!("Poster for {:?} unavailable: {:#}", metadata.title, e);
                    None
                }
            },
            None => None,
        };

        let movie = build_new_movie(row, &metadata, box_office, poster_path.as_deref());
        db::upsert_movie(self.pool, &movie).await?;
        db::upsert_role(self.pool, actor, &movie.title, row.credited_role.as_deref()).await?;

        Ok(Ok(()))
    }

    async fn download_portrait(&self, name: &str, url: &str) -> Option<PathBuf> {
        let path = self
            .portrait_dir
            .join(format!("{}.jpg", poster_file_stem(name)));

        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::debug!("Portrait already downloaded: {:?}", path);
            return Some(path);
        }

        if let Err(e) = tokio::fs::create_dir_all(&self.portrait_dir).await {
            tracing::warn!("Failed to create {}: {}", self.portrait_dir.display(), e);
            return None;
        }

        match omdb::download_to(&self.client, url, &path).await {
            Ok(()) => Some(path),
            Err(e) => {
                tracing::warn!("Portrait for {} unavailable: {:#}", name, e);
                None
            }
        }
    }
}

/// A stored movie as a statistics record, with box office in present terms.
/// A figure that cannot be adjusted is dropped so totals never mix historical dollars in.
pub fn to_movie_record(credited: CreditedMovie, index: &PriceIndex, current_year: i32) -> MovieRecord {
    let movie = credited.movie;
    let score = |s: Option<f64>| s.map(|s| s.round().clamp(0.0, 100.0) as u8);

    let box_office = match (movie.box_office, movie.release_year) {
        (Some(value), Some(year)) => match index.adjust(value, year, current_year) {
            Ok(adjusted) => Some(adjusted),
            Err(e) => {
                tracing::warn!("Dropping box office of {:?}: {}", movie.title, e);
                None
            }
        },
        (value, _) => value,
    };

    let role = Some(credited.roles).filter(|r| !r.is_empty());

    MovieRecord::new(movie.title)
        .with_year(movie.release_year)
        .with_scores(score(movie.critic_score), score(movie.audience_score))
        .with_box_office(box_office)
        .with_role(role)
        .with_poster(movie.poster_path.map(PathBuf::from))
}

/// Load an actor and their stored filmography. `None` if the actor was never collected.
pub async fn load_summary(
    pool: &SqlitePool,
    name: &str,
    index: &PriceIndex,
    current_year: i32,
) -> Result<Option<ActorSummary>> {
    let Some(actor) = db::get_actor_by_name(pool, name).await? else {
        return Ok(None);
    };

    let movies = db::get_movies_for_actor(pool, name)
        .await?
        .into_iter()
        .map(|m| to_movie_record(m, index, current_year))
        .collect();

    let mut summary = ActorSummary::new(actor.name.clone(), movies);
    summary.birth_date = actor.birth_date();
    summary.award_wins = u32::try_from(actor.award_wins).unwrap_or_default();
    summary.award_nominations = u32::try_from(actor.award_nominations).unwrap_or_default();
    summary.portrait_path = actor.portrait_path.map(PathBuf::from);

    Ok(Some(summary))
}

/// Load several actors, logging the ones that are unknown
pub async fn load_summaries(
    pool: &SqlitePool,
    names: &[String],
    index: &PriceIndex,
    current_year: i32,
) -> Result<Vec<ActorSummary>> {
    let mut summaries = Vec::with_capacity(names.len());
    for name in names {
        match load_summary(pool, name, index, current_year).await? {
            Some(summary) => summaries.push(summary),
            None => tracing::warn!("No stored data for {}; run collect first", name),
        }
    }
    Ok(summaries)
}

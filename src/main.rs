use anyhow::{Context, Result};
use chrono::Datelike;
use clap::{Parser, Subcommand};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod db;
mod error;
mod export;
mod models;
mod pipeline;
mod render;
mod services;
mod stats;

use config::AppConfig;
use pipeline::{ActorReport, Collector};
use render::compositor::save_image;
use render::infographic::InfographicRenderer;
use render::video::{write_video_async, VideoSpec};
use services::inflation::PriceIndex;
use services::omdb::OmdbClient;
use services::scraper::RtScraper;
use stats::title::poster_file_stem;

const DEFAULT_CSV_NAME: &str = "actor_stats.csv";

#[derive(Parser, Debug)]
#[command(name = "filmography-stats")]
#[command(about = "Collect actor filmographies and turn them into stats, posters and videos", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape, enrich and store filmographies
    Collect {
        /// Actor names (defaults to the configured list)
        actors: Vec<String>,
    },

    /// Write aggregate statistics to CSV
    Export {
        actors: Vec<String>,

        /// Output file (defaults to <output_dir>/actor_stats.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render infographic posters and scrolling videos
    Render {
        actors: Vec<String>,

        /// Only write the poster images
        #[arg(long)]
        no_video: bool,
    },

    /// Collect, export and render in one go
    Run {
        actors: Vec<String>,

        #[arg(long)]
        no_video: bool,
    },

    /// Record award counts for an actor
    Awards {
        actor: String,

        #[arg(short, long)]
        wins: u32,

        #[arg(short, long)]
        nominations: u32,
    },

    /// Delete a stored movie and its links
    RemoveMovie { title: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "filmography_stats=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::load();

    config.paths.ensure_dirs().await?;

    config.log_config();

    let pool = connect(&config).await?;
    db::migrate(&pool).await?;

    match cli.command {
        Command::Collect { actors } => {
            let actors = configured_actors(&config, actors)?;
            collect(&config, &pool, &actors).await?;
        }
        Command::Export { actors, output } => {
            let actors = stored_actors(&config, &pool, actors).await?;
            export(&config, &pool, &actors, output).await?;
        }
        Command::Render { actors, no_video } => {
            let actors = stored_actors(&config, &pool, actors).await?;
            render(&config, &pool, &actors, !no_video).await?;
        }
        Command::Run { actors, no_video } => {
            let actors = configured_actors(&config, actors)?;
            collect(&config, &pool, &actors).await?;
            export(&config, &pool, &actors, None).await?;
            render(&config, &pool, &actors, !no_video).await?;
        }
        Command::Awards {
            actor,
            wins,
            nominations,
        } => {
            if db::update_awards(&pool, &actor, wins, nominations).await? {
                tracing::info!("{}: {} wins, {} nominations", actor, wins, nominations);
            } else {
                anyhow::bail!("Unknown actor {:?}; run collect first", actor);
            }
        }
        Command::RemoveMovie { title } => {
            let Some(movie) = db::get_movie_by_title(&pool, &title).await? else {
                anyhow::bail!("No stored movie titled {:?}", title);
            };
            let genres = db::get_movie_genres(&pool, &movie.id).await?;
            let directors = db::get_movie_directors(&pool, &movie.id).await?;
            tracing::info!(
                "Removing {:?} ({}), genres: [{}], directors: [{}]",
                movie.title,
                movie
                    .release_year
                    .map(|y| y.to_string())
                    .unwrap_or_else(|| "unknown year".to_string()),
                genres.join(", "),
                directors.join(", ")
            );
            db::delete_movie(&pool, &title).await?;
        }
    }

    pool.close().await;
    Ok(())
}

async fn connect(config: &AppConfig) -> Result<SqlitePool> {
    let database_url = config.database_url();
    tracing::debug!("Database URL: {}", database_url);

    let connect_options = SqliteConnectOptions::from_str(&database_url)?
        .create_if_missing(true)
        // Enable WAL mode for better concurrent performance
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        // Enable foreign key enforcement
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(connect_options)
        .await
        .context("Failed to open database")?;

    Ok(pool)
}

/// Command line actors, falling back to the configured list
fn configured_actors(config: &AppConfig, actors: Vec<String>) -> Result<Vec<String>> {
    if !actors.is_empty() {
        return Ok(actors);
    }
    if config.actors.is_empty() {
        anyhow::bail!("No actors given; pass names or set `actors` in config.toml");
    }
    Ok(config.actors.clone())
}

/// Like [`configured_actors`], but falls back to every stored actor
async fn stored_actors(
    config: &AppConfig,
    pool: &SqlitePool,
    actors: Vec<String>,
) -> Result<Vec<String>> {
    match configured_actors(config, actors) {
        Ok(actors) => Ok(actors),
        Err(_) => {
            let stored = db::list_actor_names(pool).await?;
            tracing::info!("Using all {} stored actors", stored.len());
            Ok(stored)
        }
    }
}

fn current_year() -> i32 {
    chrono::Local::now().year()
}

async fn collect(config: &AppConfig, pool: &SqlitePool, actors: &[String]) -> Result<Vec<ActorReport>> {
    let api_key = config
        .omdb_api_key
        .clone()
        .context("OMDb API key missing; set OMDB_API_KEY or metadata.omdb_api_key")?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.scraper.timeout_secs))
        .build()
        .context("Failed to build HTTP client")?;

    let collector = Collector::new(
        pool,
        client.clone(),
        RtScraper::new(
            client.clone(),
            config.scraper.base_url.clone(),
            config.scraper.user_agent.clone(),
        ),
        OmdbClient::new(
            client,
            api_key,
            config.omdb_base_url.clone(),
            config.paths.poster_dir(),
        ),
        config.paths.portrait_dir(),
        current_year(),
    );

    let mut reports = Vec::with_capacity(actors.len());
    for actor in actors {
        tracing::info!("Collecting {}", actor);
        reports.push(collector.collect_actor(actor).await?);
    }

    let stored: usize = reports.iter().map(ActorReport::stored).sum();
    let skipped: usize = reports.iter().map(ActorReport::skipped).sum();
    tracing::info!(
        "Collection complete: {} actors, {} movies stored, {} skipped",
        reports.len(),
        stored,
        skipped
    );

    Ok(reports)
}

fn price_index(config: &AppConfig) -> Result<PriceIndex> {
    PriceIndex::load(config.cpi_table.as_deref()).context("Failed to load price index")
}

async fn export(
    config: &AppConfig,
    pool: &SqlitePool,
    actors: &[String],
    output: Option<PathBuf>,
) -> Result<()> {
    let index = price_index(config)?;
    let summaries = pipeline::load_summaries(pool, actors, &index, current_year()).await?;
    let output = output.unwrap_or_else(|| config.paths.output_dir.join(DEFAULT_CSV_NAME));

    export::export_to_file(&output, &summaries)?;
    Ok(())
}

async fn render(
    config: &AppConfig,
    pool: &SqlitePool,
    actors: &[String],
    with_video: bool,
) -> Result<()> {
    let index = price_index(config)?;
    let summaries = pipeline::load_summaries(pool, actors, &index, current_year()).await?;
    let renderer = InfographicRenderer::from_config(config);
    let spec = VideoSpec::from(&config.render.video);

    for actor in &summaries {
        let stats = match actor.stats() {
            Ok(stats) => stats,
            Err(e) => {
                tracing::warn!("Not rendering {}: {}", actor.name, e);
                continue;
            }
        };

        let stem = poster_file_stem(&actor.name);
        let frame_dir = config.paths.output_dir.join(&stem);

        let frames = renderer.render_frames(actor, &stats);
        for frame in &frames {
            let name = match frame.superlative {
                Some(which) => format!("{} - {}", which.label(), frame.name),
                None => frame.name.clone(),
            };
            let path = frame_dir.join(format!("{}.jpg", poster_file_stem(&name)));
            save_image(&frame.image, &path)?;
        }

        let infographic = renderer.stack(&frames)?;
        let poster_path = config.paths.output_dir.join(format!("{}.jpg", stem));
        save_image(&infographic, &poster_path)?;
        tracing::info!("Wrote infographic {}", poster_path.display());

        if with_video {
            let video_path = config.paths.output_dir.join(format!("{}.mp4", stem));
            // A missing or failing ffmpeg costs this actor's video only
            if let Err(e) = write_video_async(config.ffmpeg(), infographic, spec, video_path).await
            {
                tracing::error!("Video for {} failed: {:#}", actor.name, e);
            }
        }
    }

    Ok(())
}

// OMDb metadata provider service
// API Documentation: https://www.omdbapi.com/

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::stats::title::poster_file_stem;

pub const DEFAULT_BASE_URL: &str = "http://www.omdbapi.com/";

/// OMDb API client
pub struct OmdbClient {
    client: Client,
    api_key: String,
    base_url: String,
    poster_dir: PathBuf,
}

/// Raw title lookup response. Every field is a string; "N/A" means missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OmdbResponse {
    #[serde(rename = "Title")]
    pub title: Option<String>,
    #[serde(rename = "Year")]
    pub year: Option<String>,
    #[serde(rename = "Rated")]
    pub rated: Option<String>,
    #[serde(rename = "Released")]
    pub released: Option<String>,
    #[serde(rename = "Runtime")]
    pub runtime: Option<String>,
    #[serde(rename = "Genre")]
    pub genre: Option<String>,
    #[serde(rename = "Director")]
    pub director: Option<String>,
    #[serde(rename = "Actors")]
    pub actors: Option<String>,
    #[serde(rename = "Plot")]
    pub plot: Option<String>,
    #[serde(rename = "Awards")]
    pub awards: Option<String>,
    #[serde(rename = "Poster")]
    pub poster: Option<String>,
    #[serde(rename = "imdbRating")]
    pub imdb_rating: Option<String>,
    #[serde(rename = "BoxOffice")]
    pub box_office: Option<String>,
    #[serde(rename = "Response")]
    pub response: String,
    #[serde(rename = "Error")]
    pub error: Option<String>,
}

/// Cleaned-up title metadata
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MovieMetadata {
    pub title: String,
    pub year: Option<String>,
    pub rated: Option<String>,
    pub released: Option<String>,
    pub runtime: Option<String>,
    /// Comma separated genre names
    pub genre: Option<String>,
    /// Comma separated director names
    pub director: Option<String>,
    /// Comma separated cast names
    pub actors: Option<String>,
    pub plot: Option<String>,
    pub awards: Option<String>,
    pub poster_url: Option<String>,
    pub imdb_rating: Option<f64>,
    /// Box office as reported, e.g. "$250,690,539"
    pub box_office: Option<String>,
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != "N/A")
}

impl OmdbResponse {
    /// None when OMDb reports the title was not found
    pub fn into_metadata(self) -> Option<MovieMetadata> {
        if self.response != "True" {
            return None;
        }

        Some(MovieMetadata {
            title: present(self.title)?,
            year: present(self.year),
            rated: present(self.rated),
            released: present(self.released),
            runtime: present(self.runtime),
            genre: present(self.genre),
            director: present(self.director),
            actors: present(self.actors),
            plot: present(self.plot),
            awards: present(self.awards),
            poster_url: present(self.poster),
            imdb_rating: present(self.imdb_rating).and_then(|r| r.parse().ok()),
            box_office: present(self.box_office),
        })
    }
}

impl MovieMetadata {
    /// Case-insensitive check whether `name` is in the cast list
    pub fn cast_includes(&self, name: &str) -> bool {
        let name = name.trim().to_lowercase();
        self.actors.as_deref().is_some_and(|actors| {
            actors
                .split(',')
                .any(|actor| actor.trim().to_lowercase() == name)
        })
    }

    /// True only when OMDb lists a cast and `name` is not in it. A missing list excludes nobody.
    pub fn cast_excludes(&self, name: &str) -> bool {
        self.actors.is_some() && !self.cast_includes(name)
    }

    /// Release year parsed from the "Year" field ("1999" or "2005–2009")
    pub fn release_year(&self) -> Option<i32> {
        self.year.as_deref()?.get(..4)?.parse().ok()
    }
}

impl OmdbClient {
    /// Create a new OMDb client
    pub fn new(client: Client, api_key: String, base_url: String, poster_dir: PathBuf) -> Self {
        Self {
            client,
            api_key,
            base_url,
            poster_dir,
        }
    }

    /// Look up a movie by exact title
    pub async fn get_movie(&self, title: &str) -> Result<Option<MovieMetadata>> {
        let url = format!(
            "{}?apikey={}&t={}&type=movie&r=json",
            self.base_url,
            urlencoding::encode(&self.api_key),
            urlencoding::encode(title)
        );

        let response: OmdbResponse = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to query OMDb")?
            .json()
            .await
            .context("Failed to parse OMDb response")?;

        if response.response != "True" {
            tracing::debug!(
                "OMDb has no match for {:?}: {}",
                title,
                response.error.as_deref().unwrap_or("unknown error")
            );
        }

        Ok(response.into_metadata())
    }

    /// Local path a poster for `title` is stored at
    pub fn poster_path(&self, title: &str) -> PathBuf {
        self.poster_dir.join(format!("{}.jpg", poster_file_stem(title)))
    }

    /// Download a poster unless the file already exists
    pub async fn download_poster(&self, title: &str, poster_url: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.poster_dir).await?;
        let local_path = self.poster_path(title);

        if fs::try_exists(&local_path).await.unwrap_or(false) {
            tracing::debug!("Poster already downloaded: {:?}", local_path);
            return Ok(local_path);
        }

        download_to(&self.client, poster_url, &local_path).await?;
        tracing::info!("Downloaded poster to {:?}", local_path);
        Ok(local_path)
    }
}

/// Fetch `url` into `path`
pub async fn download_to(client: &Client, url: &str, path: &Path) -> Result<()> {
    tracing::debug!("Downloading image: {}", url);

    let response = client
        .get(url)
        .send()
        .await
        .context("Failed to download image")?;

    if !response.status().is_success() {
        anyhow::bail!("Image download failed with status: {}", response.status());
    }

    let bytes = response.bytes().await?;
    fs::write(path, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOUND: &str = r#"{
        "Title": "Men in Black",
        "Year": "1997",
        "Rated": "PG-13",
        "Released": "02 Jul 1997",
        "Runtime": "98 min",
        "Genre": "Action, Adventure, Comedy",
        "Director": "Barry Sonnenfeld",
        "Actors": "Tommy Lee Jones, Will Smith, Linda Fiorentino",
        "Plot": "A police officer joins a secret organization.",
        "Awards": "Won 1 Oscar. 38 wins & 52 nominations total",
        "Poster": "https://m.media-amazon.com/images/mib.jpg",
        "imdbRating": "7.3",
        "BoxOffice": "$250,690,539",
        "Response": "True"
    }"#;

    #[test]
    fn test_parse_found_movie() {
        let response: OmdbResponse = serde_json::from_str(FOUND).unwrap();
        let movie = response.into_metadata().unwrap();

        assert_eq!(movie.title, "Men in Black");
        assert_eq!(movie.release_year(), Some(1997));
        assert_eq!(movie.imdb_rating, Some(7.3));
        assert_eq!(movie.box_office.as_deref(), Some("$250,690,539"));
        assert_eq!(movie.genre.as_deref(), Some("Action, Adventure, Comedy"));
    }

    #[test]
    fn test_not_found() {
        let response: OmdbResponse =
            serde_json::from_str(r#"{"Response": "False", "Error": "Movie not found!"}"#).unwrap();
        assert!(response.into_metadata().is_none());
    }

    #[test]
    fn test_not_available_fields_are_none() {
        let json = r#"{
            "Title": "Obscure",
            "Year": "N/A",
            "Poster": "N/A",
            "imdbRating": "N/A",
            "BoxOffice": "N/A",
            "Response": "True"
        }"#;
        let response: OmdbResponse = serde_json::from_str(json).unwrap();
        let movie = response.into_metadata().unwrap();

        assert_eq!(movie.poster_url, None);
        assert_eq!(movie.imdb_rating, None);
        assert_eq!(movie.box_office, None);
        assert_eq!(movie.release_year(), None);
    }

    #[test]
    fn test_cast_includes_is_case_insensitive() {
        let response: OmdbResponse = serde_json::from_str(FOUND).unwrap();
        let movie = response.into_metadata().unwrap();

        assert!(movie.cast_includes("will smith"));
        assert!(movie.cast_includes("Linda Fiorentino"));
        assert!(!movie.cast_includes("Will"));
        assert!(!MovieMetadata::default().cast_includes("Will Smith"));
    }

    #[test]
    fn test_missing_cast_list_excludes_nobody() {
        let response: OmdbResponse = serde_json::from_str(FOUND).unwrap();
        let movie = response.into_metadata().unwrap();
        assert!(!movie.cast_excludes("Will Smith"));
        assert!(movie.cast_excludes("Bruce Willis"));

        let uncredited = MovieMetadata {
            title: "Obscure".to_string(),
            actors: None,
            ..Default::default()
        };
        assert!(!uncredited.cast_excludes("Will Smith"));
    }

    #[test]
    fn test_poster_path() {
        let client = OmdbClient::new(
            Client::new(),
            "key".to_string(),
            DEFAULT_BASE_URL.to_string(),
            PathBuf::from("/tmp/posters"),
        );
        assert_eq!(
            client.poster_path("Mission: Impossible?"),
            PathBuf::from("/tmp/posters/Mission_Impossible.jpg")
        );
    }
}

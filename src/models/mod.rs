use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::AggregateError;
use crate::stats::aggregate::{aggregate, AggregateStats};

/// One filmography entry after scraping, enrichment and box office normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    pub title: String,
    pub release_year: Option<i32>,
    /// Critic score, 0-100
    pub critic_score: Option<u8>,
    /// Audience score, 0-100
    pub audience_score: Option<u8>,
    /// Box office in dollars
    pub box_office: Option<f64>,
    pub credited_role: Option<String>,
    pub poster_path: Option<PathBuf>,
}

impl MovieRecord {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            release_year: None,
            critic_score: None,
            audience_score: None,
            box_office: None,
            credited_role: None,
            poster_path: None,
        }
    }

    pub fn with_year(mut self, year: Option<i32>) -> Self {
        self.release_year = year;
        self
    }

    pub fn with_scores(mut self, critic: Option<u8>, audience: Option<u8>) -> Self {
        self.critic_score = critic;
        self.audience_score = audience;
        self
    }

    pub fn with_box_office(mut self, box_office: Option<f64>) -> Self {
        self.box_office = box_office;
        self
    }

    pub fn with_role(mut self, role: Option<String>) -> Self {
        self.credited_role = role;
        self
    }

    pub fn with_poster(mut self, poster_path: Option<PathBuf>) -> Self {
        self.poster_path = poster_path;
        self
    }
}

/// An actor with their filmography, as used for statistics, export and rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorSummary {
    pub name: String,
    pub birth_date: Option<NaiveDate>,
    pub award_wins: u32,
    pub award_nominations: u32,
    pub portrait_path: Option<PathBuf>,
    pub movies: Vec<MovieRecord>,
}

impl ActorSummary {
    pub fn new(name: impl Into<String>, movies: Vec<MovieRecord>) -> Self {
        Self {
            name: name.into(),
            birth_date: None,
            award_wins: 0,
            award_nominations: 0,
            portrait_path: None,
            movies,
        }
    }

    /// Age in whole years today, derived from the birth date
    pub fn age(&self) -> Option<u32> {
        self.age_on(chrono::Local::now().date_naive())
    }

    /// Age in whole years on the given day
    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        let birth = self.birth_date?;
        let mut years = today.year() - birth.year();
        if (today.month(), today.day()) < (birth.month(), birth.day()) {
            years -= 1;
        }
        u32::try_from(years).ok()
    }

    /// Compute aggregate statistics over the filmography
    pub fn stats(&self) -> Result<AggregateStats<'_>, AggregateError> {
        aggregate(&self.movies)
    }
}

// ============================================================================
// Database rows
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MovieRow {
    pub id: String,
    pub title: String,
    pub critic_score: Option<f64>,
    pub audience_score: Option<f64>,
    pub imdb_score: Option<f64>,
    pub box_office: Option<f64>,
    pub poster_url: Option<String>,
    pub poster_path: Option<String>,
    pub release_date: Option<String>,
    pub release_year: Option<i32>,
    pub runtime: Option<String>,
    pub mpaa_rating: Option<String>,
    pub synopsis: Option<String>,
    pub awards: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ActorRow {
    pub id: String,
    pub name: String,
    pub birth_date: Option<String>,
    pub portrait_url: Option<String>,
    pub portrait_path: Option<String>,
    pub award_wins: i64,
    pub award_nominations: i64,
}

impl ActorRow {
    pub fn birth_date(&self) -> Option<NaiveDate> {
        self.birth_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
    }
}

/// Incoming movie data. `None` fields never overwrite stored values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewMovie {
    pub title: String,
    pub critic_score: Option<f64>,
    pub audience_score: Option<f64>,
    pub imdb_score: Option<f64>,
    pub box_office: Option<f64>,
    pub poster_url: Option<String>,
    pub poster_path: Option<String>,
    pub release_date: Option<String>,
    pub release_year: Option<i32>,
    pub runtime: Option<String>,
    pub mpaa_rating: Option<String>,
    pub synopsis: Option<String>,
    pub awards: Option<String>,
    /// Comma separated genre names
    pub genres: Option<String>,
    /// Comma separated director names
    pub directors: Option<String>,
}

impl NewMovie {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

/// Incoming actor data. `None` fields never overwrite stored values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewActor {
    pub name: String,
    pub birth_date: Option<NaiveDate>,
    pub portrait_url: Option<String>,
    pub portrait_path: Option<String>,
}

/// A movie together with the roles a given actor is credited with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CreditedMovie {
    #[sqlx(flatten)]
    pub movie: MovieRow,
    pub roles: String,
}

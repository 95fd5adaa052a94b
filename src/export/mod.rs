// CSV export of per-actor aggregate statistics

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::io::Write;
use std::path::Path;

use crate::models::{ActorSummary, MovieRecord};
use crate::stats::aggregate::{AggregateStats, Superlative};
use crate::stats::format::{format_dollars, score_icon, ScoreKind};

const ACTOR_COLUMNS: &[&str] = &[
    "Actor Name",
    "Age",
    "Birth Date",
    "Award Wins",
    "Award Nominations",
    "Actor Portrait",
    "Total Box Office (Adjusted for Inflation)",
    "Average Critic Score",
    "Average Audience Score",
];

const MOVIE_COLUMNS: &[&str] = &[
    "Title",
    "Poster",
    "Critic Score",
    "Critic Icon",
    "Audience Score",
    "Audience Icon",
    "Box Office",
];

pub fn header() -> Vec<String> {
    let mut columns: Vec<String> = ACTOR_COLUMNS.iter().map(|c| c.to_string()).collect();
    for which in Superlative::ALL {
        columns.extend(
            MOVIE_COLUMNS
                .iter()
                .map(|column| format!("{} {}", which.label(), column)),
        );
    }
    columns
}

fn movie_cells(movie: Option<&MovieRecord>) -> Vec<String> {
    let Some(movie) = movie else {
        return vec![String::new(); MOVIE_COLUMNS.len()];
    };

    let score = |s: Option<u8>| s.map(|s| s.to_string()).unwrap_or_default();
    let icon = |kind, s: Option<u8>| {
        s.map(|s| score_icon(kind, s).to_string())
            .unwrap_or_default()
    };

    vec![
        movie.title.clone(),
        movie
            .poster_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default(),
        score(movie.critic_score),
        icon(ScoreKind::Critic, movie.critic_score),
        score(movie.audience_score),
        icon(ScoreKind::Audience, movie.audience_score),
        movie.box_office.map(format_dollars).unwrap_or_default(),
    ]
}

/// One CSV row for an actor. `today` fixes the age calculation.
pub fn actor_row(actor: &ActorSummary, stats: &AggregateStats<'_>, today: NaiveDate) -> Vec<String> {
    let mut row = vec![
        actor.name.clone(),
        actor
            .age_on(today)
            .map(|a| a.to_string())
            .unwrap_or_default(),
        actor
            .birth_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        actor.award_wins.to_string(),
        actor.award_nominations.to_string(),
        actor
            .portrait_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default(),
        format_dollars(stats.total_box_office),
        stats.average_critic_score.to_string(),
        stats.average_audience_score.to_string(),
    ];

    for which in Superlative::ALL {
        row.extend(movie_cells(stats.superlative(which)));
    }
    row
}

/// Write the header and one row per actor. Actors without movies are skipped.
pub fn write_csv<W: Write>(writer: W, actors: &[ActorSummary], today: NaiveDate) -> Result<usize> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(header())
        .context("Failed to write CSV header")?;

    let mut written = 0;
    for actor in actors {
        match actor.stats() {
            Ok(stats) => {
                csv.write_record(actor_row(actor, &stats, today))
                    .with_context(|| format!("Failed to write CSV row for {}", actor.name))?;
                written += 1;
            }
            Err(e) => tracing::warn!("Not exporting {}: {}", actor.name, e),
        }
    }

    csv.flush().context("Failed to flush CSV")?;
    Ok(written)
}

/// Export to a file, replacing it if present
pub fn export_to_file(path: &Path, actors: &[ActorSummary]) -> Result<usize> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    let today = chrono::Local::now().date_naive();
    let written = write_csv(file, actors, today)?;
    tracing::info!("Exported {} actors to {}", written, path.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_actor() -> ActorSummary {
        let movies = vec![
            MovieRecord::new("A")
                .with_scores(Some(90), Some(70))
                .with_box_office(Some(100_000_000.0)),
            MovieRecord::new("B")
                .with_scores(Some(40), Some(95))
                .with_box_office(Some(500_000_000.0)),
            MovieRecord::new("C")
                .with_scores(Some(60), Some(60))
                .with_box_office(Some(50_000_000.0)),
        ];
        let mut actor = ActorSummary::new("Will Smith", movies);
        actor.birth_date = NaiveDate::from_ymd_opt(1968, 9, 25);
        actor.award_wins = 1;
        actor.award_nominations = 3;
        actor
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 10, 1).unwrap()
    }

    #[test]
    fn test_header_layout() {
        let header = header();
        assert_eq!(header.len(), ACTOR_COLUMNS.len() + 5 * MOVIE_COLUMNS.len());
        assert_eq!(header[0], "Actor Name");
        assert_eq!(header[9], "Best Critic Score Title");
        assert_eq!(header[16], "Highest Grossing Title");
        assert_eq!(header.last().unwrap(), "Worst Audience Score Box Office");
    }

    #[test]
    fn test_actor_row() {
        let actor = sample_actor();
        let stats = actor.stats().unwrap();
        let row = actor_row(&actor, &stats, today());

        assert_eq!(row.len(), header().len());
        assert_eq!(&row[..9], &[
            "Will Smith", "56", "1968-09-25", "1", "3", "", "$650M", "63", "75"
        ]);
        // best critic group
        assert_eq!(&row[9..16], &["A", "", "90", "FreshTomato.png", "70", "FreshPopcorn.png", "$100M"]);
        // worst critic group
        assert_eq!(row[30], "B");
        assert_eq!(row[33], "RottenTomato.png");
    }

    #[test]
    fn test_missing_scores_leave_cells_empty() {
        let actor = ActorSummary::new(
            "Nobody",
            vec![MovieRecord::new("Quiet").with_box_office(Some(1_500.0))],
        );
        let stats = actor.stats().unwrap();
        let row = actor_row(&actor, &stats, today());

        assert_eq!(row[1], "");
        assert_eq!(row[9], "");
        // highest grossing is the only present superlative
        assert_eq!(&row[16..23], &["Quiet", "", "", "", "", "", "$1.5K"]);
    }

    #[test]
    fn test_write_csv_skips_empty_filmographies() {
        let actors = vec![sample_actor(), ActorSummary::new("Empty", Vec::new())];
        let mut buf = Vec::new();
        let written = write_csv(&mut buf, &actors, today()).unwrap();

        assert_eq!(written, 1);
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Actor Name,Age,Birth Date"));
        assert!(lines[1].starts_with("Will Smith,56,1968-09-25"));
    }

    #[test]
    fn test_export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/stats.csv");
        let written = export_to_file(&path, &[sample_actor()]).unwrap();

        assert_eq!(written, 1);
        assert!(std::fs::read_to_string(path).unwrap().contains("Will Smith"));
    }
}

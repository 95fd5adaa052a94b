// Filmography aggregation: totals, averages and superlative movies

use crate::error::AggregateError;
use crate::models::MovieRecord;

/// Derived statistics for a filmography. Never stored; recomputed on demand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateStats<'a> {
    /// Sum of all known box office values (already inflation-adjusted by the caller)
    pub total_box_office: f64,
    /// Mean critic score over movies that have one, rounded; 0 if none do
    pub average_critic_score: u32,
    /// Mean audience score over movies that have one, rounded; 0 if none do
    pub average_audience_score: u32,
    pub best_critic: Option<&'a MovieRecord>,
    pub best_audience: Option<&'a MovieRecord>,
    pub highest_grossing: Option<&'a MovieRecord>,
    pub worst_critic: Option<&'a MovieRecord>,
    pub worst_audience: Option<&'a MovieRecord>,
}

/// The five superlative picks, in presentation order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Superlative {
    BestCritic,
    HighestGrossing,
    BestAudience,
    WorstCritic,
    WorstAudience,
}

impl Superlative {
    pub const ALL: [Superlative; 5] = [
        Superlative::BestCritic,
        Superlative::HighestGrossing,
        Superlative::BestAudience,
        Superlative::WorstCritic,
        Superlative::WorstAudience,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Superlative::BestCritic => "Best Critic Score",
            Superlative::HighestGrossing => "Highest Grossing",
            Superlative::BestAudience => "Best Audience Score",
            Superlative::WorstCritic => "Worst Critic Score",
            Superlative::WorstAudience => "Worst Audience Score",
        }
    }
}

impl<'a> AggregateStats<'a> {
    pub fn superlative(&self, which: Superlative) -> Option<&'a MovieRecord> {
        match which {
            Superlative::BestCritic => self.best_critic,
            Superlative::HighestGrossing => self.highest_grossing,
            Superlative::BestAudience => self.best_audience,
            Superlative::WorstCritic => self.worst_critic,
            Superlative::WorstAudience => self.worst_audience,
        }
    }

    /// Superlatives in presentation order, skipping absent ones
    pub fn superlatives(&self) -> Vec<(Superlative, &'a MovieRecord)> {
        Superlative::ALL
            .iter()
            .filter_map(|&which| self.superlative(which).map(|movie| (which, movie)))
            .collect()
    }
}

/// Which end of a metric to select
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Extreme {
    Max,
    Min,
}

/// Aggregate a non-empty list of movies.
///
/// Superlatives only consider movies where the metric is present, and the first
/// movie in list order wins a tie.
pub fn aggregate(movies: &[MovieRecord]) -> Result<AggregateStats<'_>, AggregateError> {
    if movies.is_empty() {
        return Err(AggregateError::EmptyInput);
    }

    let critic = |m: &MovieRecord| m.critic_score.map(f64::from);
    let audience = |m: &MovieRecord| m.audience_score.map(f64::from);
    let gross = |m: &MovieRecord| m.box_office;

    Ok(AggregateStats {
        total_box_office: movies.iter().filter_map(gross).sum(),
        average_critic_score: rounded_mean(movies.iter().filter_map(critic)),
        average_audience_score: rounded_mean(movies.iter().filter_map(audience)),
        best_critic: select(movies, critic, Extreme::Max),
        best_audience: select(movies, audience, Extreme::Max),
        highest_grossing: select(movies, gross, Extreme::Max),
        worst_critic: select(movies, critic, Extreme::Min),
        worst_audience: select(movies, audience, Extreme::Min),
    })
}

/// Stable max/min: a later movie replaces the current pick only if strictly better
fn select<F>(movies: &[MovieRecord], metric: F, extreme: Extreme) -> Option<&MovieRecord>
where
    F: Fn(&MovieRecord) -> Option<f64>,
{
    let mut best: Option<(&MovieRecord, f64)> = None;

    for movie in movies {
        let Some(value) = metric(movie) else {
            continue;
        };
        let replace = match best {
            None => true,
            Some((_, current)) => match extreme {
                Extreme::Max => value > current,
                Extreme::Min => value < current,
            },
        };
        if replace {
            best = Some((movie, value));
        }
    }

    best.map(|(movie, _)| movie)
}

/// Mean rounded to the nearest whole score, halves away from zero (62.5 -> 63)
fn rounded_mean(values: impl Iterator<Item = f64>) -> u32 {
    let (sum, count) = values.fold((0.0, 0u32), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        return 0;
    }
    (sum / f64::from(count)).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(title: &str, critic: u8, audience: u8, box_office: f64) -> MovieRecord {
        MovieRecord::new(title)
            .with_scores(Some(critic), Some(audience))
            .with_box_office(Some(box_office))
    }

    #[test]
    fn test_superlatives_and_totals() {
        let movies = vec![
            movie("A", 90, 70, 100.0),
            movie("B", 40, 95, 500.0),
            movie("C", 60, 60, 50.0),
        ];
        let stats = aggregate(&movies).unwrap();

        assert_eq!(stats.best_critic.unwrap().title, "A");
        assert_eq!(stats.worst_critic.unwrap().title, "B");
        assert_eq!(stats.best_audience.unwrap().title, "B");
        assert_eq!(stats.worst_audience.unwrap().title, "C");
        assert_eq!(stats.highest_grossing.unwrap().title, "B");
        assert_eq!(stats.total_box_office, 650.0);
        assert_eq!(stats.average_critic_score, 63);
        assert_eq!(stats.average_audience_score, 75);
    }

    #[test]
    fn test_superlatives_in_presentation_order() {
        let movies = vec![
            movie("A", 90, 70, 100.0),
            movie("B", 40, 95, 500.0),
            movie("C", 60, 60, 50.0),
        ];
        let stats = aggregate(&movies).unwrap();
        let titles: Vec<&str> = stats
            .superlatives()
            .iter()
            .map(|(_, m)| m.title.as_str())
            .collect();
        assert_eq!(titles, vec!["A", "B", "B", "B", "C"]);
        assert_eq!(stats.superlatives()[1].0, Superlative::HighestGrossing);
    }

    #[test]
    fn test_empty_input_is_an_error() {
        assert_eq!(aggregate(&[]).unwrap_err(), AggregateError::EmptyInput);
    }

    #[test]
    fn test_ties_pick_first_occurrence() {
        let movies = vec![
            movie("First", 80, 50, 10.0),
            movie("Second", 80, 50, 10.0),
        ];
        let stats = aggregate(&movies).unwrap();

        assert_eq!(stats.best_critic.unwrap().title, "First");
        assert_eq!(stats.worst_critic.unwrap().title, "First");
        assert_eq!(stats.highest_grossing.unwrap().title, "First");
        assert_eq!(stats.worst_audience.unwrap().title, "First");
    }

    #[test]
    fn test_missing_values_are_ignored() {
        let movies = vec![
            MovieRecord::new("No Data"),
            MovieRecord::new("Critics Only").with_scores(Some(20), None),
            movie("Full", 80, 90, 1_000.0),
        ];
        let stats = aggregate(&movies).unwrap();

        // averages only count movies with a score
        assert_eq!(stats.average_critic_score, 50);
        assert_eq!(stats.average_audience_score, 90);
        assert_eq!(stats.total_box_office, 1_000.0);
        assert_eq!(stats.worst_critic.unwrap().title, "Critics Only");
        assert_eq!(stats.worst_audience.unwrap().title, "Full");
        assert_eq!(stats.highest_grossing.unwrap().title, "Full");
    }

    #[test]
    fn test_no_scores_at_all() {
        let movies = vec![MovieRecord::new("Unknown").with_box_office(Some(5.0))];
        let stats = aggregate(&movies).unwrap();

        assert_eq!(stats.average_critic_score, 0);
        assert_eq!(stats.average_audience_score, 0);
        assert!(stats.best_critic.is_none());
        assert!(stats.worst_audience.is_none());
        assert_eq!(stats.highest_grossing.unwrap().title, "Unknown");
    }

    #[test]
    fn test_half_averages_round_up() {
        let movies = vec![movie("A", 62, 81, 1.0), movie("B", 63, 84, 1.0)];
        let stats = aggregate(&movies).unwrap();

        // 62.5 and 82.5
        assert_eq!(stats.average_critic_score, 63);
        assert_eq!(stats.average_audience_score, 83);
        assert_eq!(rounded_mean([64.0, 65.0].into_iter()), 65);
        assert_eq!(rounded_mean(std::iter::empty()), 0);
    }
}

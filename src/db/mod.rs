use anyhow::{Context, Result};
use sqlx::{SqliteConnection, SqlitePool};

use crate::models::{ActorRow, CreditedMovie, MovieRow, NewActor, NewMovie};

const ROLE_SEPARATOR: &str = ", ";

pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS movies (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL UNIQUE,
            critic_score REAL,
            audience_score REAL,
            imdb_score REAL,
            box_office REAL,
            poster_url TEXT,
            poster_path TEXT,
            release_date TEXT,
            release_year INTEGER,
            runtime TEXT,
            mpaa_rating TEXT,
            synopsis TEXT,
            awards TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS actors (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            birth_date TEXT,
            portrait_url TEXT,
            portrait_path TEXT,
            award_wins INTEGER NOT NULL DEFAULT 0,
            award_nominations INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS genres (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS directors (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        );

        -- Many-to-many: movies <-> genres
        CREATE TABLE IF NOT EXISTS movie_genres (
            movie_id TEXT NOT NULL REFERENCES movies(id) ON DELETE CASCADE,
            genre_id TEXT NOT NULL REFERENCES genres(id) ON DELETE CASCADE,
            PRIMARY KEY (movie_id, genre_id)
        );

        -- Many-to-many: movies <-> directors
        CREATE TABLE IF NOT EXISTS movie_directors (
            movie_id TEXT NOT NULL REFERENCES movies(id) ON DELETE CASCADE,
            director_id TEXT NOT NULL REFERENCES directors(id) ON DELETE CASCADE,
            PRIMARY KEY (movie_id, director_id)
        );

        -- Many-to-many: movies <-> actors, with the roles played
        CREATE TABLE IF NOT EXISTS movie_actors (
            movie_id TEXT NOT NULL REFERENCES movies(id) ON DELETE CASCADE,
            actor_id TEXT NOT NULL REFERENCES actors(id) ON DELETE CASCADE,
            roles TEXT NOT NULL DEFAULT '',
            PRIMARY KEY (movie_id, actor_id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    create_indexes(pool).await?;

    Ok(())
}

async fn create_indexes(pool: &SqlitePool) -> Result<()> {
    let indexes = [
        // Filmography lookups by actor
        "CREATE INDEX IF NOT EXISTS idx_movie_actors_actor ON movie_actors(actor_id)",
        // Link lookups by genre/director
        "CREATE INDEX IF NOT EXISTS idx_movie_genres_genre ON movie_genres(genre_id)",
        "CREATE INDEX IF NOT EXISTS idx_movie_directors_director ON movie_directors(director_id)",
        // Filmography ordering
        "CREATE INDEX IF NOT EXISTS idx_movies_year ON movies(release_year)",
    ];

    for index_sql in indexes {
        if let Err(e) = sqlx::query(index_sql).execute(pool).await {
            tracing::warn!("Failed to create index: {} - {}", index_sql, e);
        }
    }

    tracing::debug!("Database indexes created/verified");

    Ok(())
}

/// Split a comma separated OMDb list, dropping blanks and "N/A"
fn split_names(list: Option<&str>) -> Vec<&str> {
    list.map(|l| {
        l.split(',')
            .map(str::trim)
            .filter(|n| !n.is_empty() && *n != "N/A")
            .collect()
    })
    .unwrap_or_default()
}

/// Insert or get a genre/director id by name
async fn get_or_create_named(
    conn: &mut SqliteConnection,
    table: NamedTable,
    name: &str,
) -> Result<String> {
    let id = uuid::Uuid::new_v4().to_string();

    sqlx::query(&format!(
        "INSERT OR IGNORE INTO {} (id, name) VALUES (?, ?)",
        table.name()
    ))
    .bind(&id)
    .bind(name)
    .execute(&mut *conn)
    .await?;

    // Get the actual ID (might be different if it already existed)
    let result: (String,) = sqlx::query_as(&format!("SELECT id FROM {} WHERE name = ?", table.name()))
        .bind(name)
        .fetch_one(&mut *conn)
        .await?;

    Ok(result.0)
}

#[derive(Debug, Clone, Copy)]
enum NamedTable {
    Genres,
    Directors,
}

impl NamedTable {
    fn name(self) -> &'static str {
        match self {
            NamedTable::Genres => "genres",
            NamedTable::Directors => "directors",
        }
    }

    fn link_sql(self) -> &'static str {
        match self {
            NamedTable::Genres => {
                "INSERT OR IGNORE INTO movie_genres (movie_id, genre_id) VALUES (?, ?)"
            }
            NamedTable::Directors => {
                "INSERT OR IGNORE INTO movie_directors (movie_id, director_id) VALUES (?, ?)"
            }
        }
    }
}

async fn link_names(
    conn: &mut SqliteConnection,
    table: NamedTable,
    movie_id: &str,
    names: Option<&str>,
) -> Result<()> {
    for name in split_names(names) {
        let id = get_or_create_named(conn, table, name).await?;
        sqlx::query(table.link_sql())
            .bind(movie_id)
            .bind(&id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Create or merge a movie keyed by title. Returns the movie id.
pub async fn upsert_movie(pool: &SqlitePool, movie: &NewMovie) -> Result<String> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO movies (
            id, title, critic_score, audience_score, imdb_score, box_office,
            poster_url, poster_path, release_date, release_year, runtime,
            mpaa_rating, synopsis, awards
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(title) DO UPDATE SET
            critic_score = COALESCE(excluded.critic_score, movies.critic_score),
            audience_score = COALESCE(excluded.audience_score, movies.audience_score),
            imdb_score = COALESCE(excluded.imdb_score, movies.imdb_score),
            box_office = COALESCE(excluded.box_office, movies.box_office),
            poster_url = COALESCE(excluded.poster_url, movies.poster_url),
            poster_path = COALESCE(excluded.poster_path, movies.poster_path),
            release_date = COALESCE(excluded.release_date, movies.release_date),
            release_year = COALESCE(excluded.release_year, movies.release_year),
            runtime = COALESCE(excluded.runtime, movies.runtime),
            mpaa_rating = COALESCE(excluded.mpaa_rating, movies.mpaa_rating),
            synopsis = COALESCE(excluded.synopsis, movies.synopsis),
            awards = COALESCE(excluded.awards, movies.awards)
        "#,
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(&movie.title)
    .bind(movie.critic_score)
    .bind(movie.audience_score)
    .bind(movie.imdb_score)
    .bind(movie.box_office)
    .bind(&movie.poster_url)
    .bind(&movie.poster_path)
    .bind(&movie.release_date)
    .bind(movie.release_year)
    .bind(&movie.runtime)
    .bind(&movie.mpaa_rating)
    .bind(&movie.synopsis)
    .bind(&movie.awards)
    .execute(&mut *tx)
    .await
    .with_context(|| format!("Failed to upsert movie {:?}", movie.title))?;

    let (movie_id,): (String,) = sqlx::query_as("SELECT id FROM movies WHERE title = ?")
        .bind(&movie.title)
        .fetch_one(&mut *tx)
        .await?;

    link_names(&mut *tx, NamedTable::Genres, &movie_id, movie.genres.as_deref()).await?;
    link_names(&mut *tx, NamedTable::Directors, &movie_id, movie.directors.as_deref()).await?;

    tx.commit().await?;

    tracing::debug!("Upserted movie {:?} ({})", movie.title, movie_id);
    Ok(movie_id)
}

/// Create or merge an actor keyed by name. Returns the actor id.
pub async fn upsert_actor(pool: &SqlitePool, actor: &NewActor) -> Result<String> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO actors (id, name, birth_date, portrait_url, portrait_path)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(name) DO UPDATE SET
            birth_date = COALESCE(excluded.birth_date, actors.birth_date),
            portrait_url = COALESCE(excluded.portrait_url, actors.portrait_url),
            portrait_path = COALESCE(excluded.portrait_path, actors.portrait_path)
        "#,
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(&actor.name)
    .bind(actor.birth_date.map(|d| d.format("%Y-%m-%d").to_string()))
    .bind(&actor.portrait_url)
    .bind(&actor.portrait_path)
    .execute(&mut *tx)
    .await
    .with_context(|| format!("Failed to upsert actor {:?}", actor.name))?;

    let (actor_id,): (String,) = sqlx::query_as("SELECT id FROM actors WHERE name = ?")
        .bind(&actor.name)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(actor_id)
}

/// Add `role` to the actor's credit on a movie, keeping roles distinct.
///
/// Returns the resulting role list, or `None` if the actor or movie is unknown.
pub async fn upsert_role(
    pool: &SqlitePool,
    actor_name: &str,
    movie_title: &str,
    role: Option<&str>,
) -> Result<Option<String>> {
    let mut tx = pool.begin().await?;

    let actor: Option<(String,)> = sqlx::query_as("SELECT id FROM actors WHERE name = ?")
        .bind(actor_name)
        .fetch_optional(&mut *tx)
        .await?;
    let movie: Option<(String,)> = sqlx::query_as("SELECT id FROM movies WHERE title = ?")
        .bind(movie_title)
        .fetch_optional(&mut *tx)
        .await?;

    let (Some((actor_id,)), Some((movie_id,))) = (actor, movie) else {
        tracing::debug!(
            "Not linking {:?} to {:?}: actor or movie not stored",
            actor_name,
            movie_title
        );
        return Ok(None);
    };

    let existing: Option<(String,)> =
        sqlx::query_as("SELECT roles FROM movie_actors WHERE movie_id = ? AND actor_id = ?")
            .bind(&movie_id)
            .bind(&actor_id)
            .fetch_optional(&mut *tx)
            .await?;

    let roles = merge_roles(existing.as_ref().map(|r| r.0.as_str()), role);

    sqlx::query(
        r#"
        INSERT INTO movie_actors (movie_id, actor_id, roles) VALUES (?, ?, ?)
        ON CONFLICT(movie_id, actor_id) DO UPDATE SET roles = excluded.roles
        "#,
    )
    .bind(&movie_id)
    .bind(&actor_id)
    .bind(&roles)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(Some(roles))
}

/// Append `role` to a ", " separated list unless already present
fn merge_roles(existing: Option<&str>, role: Option<&str>) -> String {
    let mut roles: Vec<&str> = existing
        .map(|e| {
            e.split(ROLE_SEPARATOR)
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .collect()
        })
        .unwrap_or_default();

    if let Some(role) = role.map(str::trim).filter(|r| !r.is_empty()) {
        if !roles.contains(&role) {
            roles.push(role);
        }
    }

    roles.join(ROLE_SEPARATOR)
}

pub async fn get_movie_by_title(pool: &SqlitePool, title: &str) -> Result<Option<MovieRow>> {
    let movie = sqlx::query_as(
        r#"
        SELECT id, title, critic_score, audience_score, imdb_score, box_office,
               poster_url, poster_path, release_date, release_year, runtime,
               mpaa_rating, synopsis, awards
        FROM movies WHERE title = ?
        "#,
    )
    .bind(title)
    .fetch_optional(pool)
    .await?;

    Ok(movie)
}

pub async fn get_actor_by_name(pool: &SqlitePool, name: &str) -> Result<Option<ActorRow>> {
    let actor = sqlx::query_as(
        r#"
        SELECT id, name, birth_date, portrait_url, portrait_path, award_wins, award_nominations
        FROM actors WHERE name = ?
        "#,
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;

    Ok(actor)
}

/// All stored actor names, alphabetically
pub async fn list_actor_names(pool: &SqlitePool) -> Result<Vec<String>> {
    let names: Vec<(String,)> = sqlx::query_as("SELECT name FROM actors ORDER BY name")
        .fetch_all(pool)
        .await?;
    Ok(names.into_iter().map(|(n,)| n).collect())
}

/// An actor's movies with their roles, newest first
pub async fn get_movies_for_actor(pool: &SqlitePool, actor_name: &str) -> Result<Vec<CreditedMovie>> {
    let movies = sqlx::query_as(
        r#"
        SELECT m.id, m.title, m.critic_score, m.audience_score, m.imdb_score, m.box_office,
               m.poster_url, m.poster_path, m.release_date, m.release_year, m.runtime,
               m.mpaa_rating, m.synopsis, m.awards, ma.roles
        FROM movies m
        JOIN movie_actors ma ON ma.movie_id = m.id
        JOIN actors a ON a.id = ma.actor_id
        WHERE a.name = ?
        ORDER BY m.release_year IS NULL, m.release_year DESC, m.title
        "#,
    )
    .bind(actor_name)
    .fetch_all(pool)
    .await?;

    Ok(movies)
}

/// Genre names linked to a movie
pub async fn get_movie_genres(pool: &SqlitePool, movie_id: &str) -> Result<Vec<String>> {
    let genres: Vec<(String,)> = sqlx::query_as(
        r#"
        SELECT g.name FROM genres g
        JOIN movie_genres mg ON mg.genre_id = g.id
        WHERE mg.movie_id = ?
        ORDER BY g.name
        "#,
    )
    .bind(movie_id)
    .fetch_all(pool)
    .await?;

    Ok(genres.into_iter().map(|(g,)| g).collect())
}

/// Director names linked to a movie
pub async fn get_movie_directors(pool: &SqlitePool, movie_id: &str) -> Result<Vec<String>> {
    let directors: Vec<(String,)> = sqlx::query_as(
        r#"
        SELECT d.name FROM directors d
        JOIN movie_directors md ON md.director_id = d.id
        WHERE md.movie_id = ?
        ORDER BY d.name
        "#,
    )
    .bind(movie_id)
    .fetch_all(pool)
    .await?;

    Ok(directors.into_iter().map(|(d,)| d).collect())
}

/// Set award counts for an actor. Returns false if the actor is unknown.
pub async fn update_awards(
    pool: &SqlitePool,
    actor_name: &str,
    wins: u32,
    nominations: u32,
) -> Result<bool> {
    let result =
        sqlx::query("UPDATE actors SET award_wins = ?, award_nominations = ? WHERE name = ?")
            .bind(i64::from(wins))
            .bind(i64::from(nominations))
            .bind(actor_name)
            .execute(pool)
            .await?;

    Ok(result.rows_affected() > 0)
}

/// Remove a movie and its links. Returns false if no such movie exists.
pub async fn delete_movie(pool: &SqlitePool, title: &str) -> Result<bool> {
    let mut tx = pool.begin().await?;

    let movie: Option<(String,)> = sqlx::query_as("SELECT id FROM movies WHERE title = ?")
        .bind(title)
        .fetch_optional(&mut *tx)
        .await?;

    let Some((movie_id,)) = movie else {
        return Ok(false);
    };

    for sql in [
        "DELETE FROM movie_actors WHERE movie_id = ?",
        "DELETE FROM movie_genres WHERE movie_id = ?",
        "DELETE FROM movie_directors WHERE movie_id = ?",
        "DELETE FROM movies WHERE id = ?",
    ] {
        sqlx::query(sql).bind(&movie_id).execute(&mut *tx).await?;
    }

    tx.commit().await?;
    tracing::info!("Deleted movie {:?}", title);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        migrate(&pool).await.unwrap();
        pool
    }

    fn men_in_black() -> NewMovie {
        NewMovie {
            critic_score: Some(91.0),
            audience_score: Some(79.0),
            box_office: Some(250_700_000.0),
            release_year: Some(1997),
            genres: Some("Action, Comedy, N/A".to_string()),
            directors: Some("Barry Sonnenfeld".to_string()),
            ..NewMovie::new("Men in Black")
        }
    }

    async fn count(pool: &SqlitePool, table: &str) -> i64 {
        let (n,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(pool)
            .await
            .unwrap();
        n
    }

    #[tokio::test]
    async fn test_upsert_movie_is_idempotent() {
        let pool = test_pool().await;

        let first = upsert_movie(&pool, &men_in_black()).await.unwrap();
        let before = get_movie_by_title(&pool, "Men in Black").await.unwrap().unwrap();
        let second = upsert_movie(&pool, &men_in_black()).await.unwrap();
        let after = get_movie_by_title(&pool, "Men in Black").await.unwrap().unwrap();

        assert_eq!(first, second);
        assert_eq!(before, after);
        assert_eq!(count(&pool, "movies").await, 1);
        assert_eq!(count(&pool, "movie_genres").await, 2);
        assert_eq!(count(&pool, "genres").await, 2);
    }

    #[tokio::test]
    async fn test_upsert_movie_merges_non_null_fields() {
        let pool = test_pool().await;
        upsert_movie(&pool, &men_in_black()).await.unwrap();

        let update = NewMovie {
            synopsis: Some("Agents police alien life on Earth.".to_string()),
            ..NewMovie::new("Men in Black")
        };
        upsert_movie(&pool, &update).await.unwrap();

        let movie = get_movie_by_title(&pool, "Men in Black").await.unwrap().unwrap();
        assert_eq!(movie.synopsis.as_deref(), Some("Agents police alien life on Earth."));
        assert_eq!(movie.critic_score, Some(91.0));
        assert_eq!(movie.box_office, Some(250_700_000.0));
        assert_eq!(movie.release_year, Some(1997));
    }

    #[tokio::test]
    async fn test_genres_and_directors_are_shared() {
        let pool = test_pool().await;
        let mib = upsert_movie(&pool, &men_in_black()).await.unwrap();
        let sequel = NewMovie {
            genres: Some("Comedy, Sci-Fi".to_string()),
            directors: Some("Barry Sonnenfeld".to_string()),
            ..NewMovie::new("Men in Black II")
        };
        let sequel_id = upsert_movie(&pool, &sequel).await.unwrap();

        assert_eq!(count(&pool, "genres").await, 3);
        assert_eq!(count(&pool, "directors").await, 1);
        assert_eq!(
            get_movie_genres(&pool, &mib).await.unwrap(),
            vec!["Action", "Comedy"]
        );
        assert_eq!(
            get_movie_directors(&pool, &sequel_id).await.unwrap(),
            vec!["Barry Sonnenfeld"]
        );
    }

    #[tokio::test]
    async fn test_upsert_actor() {
        let pool = test_pool().await;
        let actor = NewActor {
            name: "Will Smith".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1968, 9, 25),
            ..Default::default()
        };
        let id = upsert_actor(&pool, &actor).await.unwrap();

        let portrait = NewActor {
            name: "Will Smith".to_string(),
            portrait_path: Some("/tmp/will_smith.jpg".to_string()),
            ..Default::default()
        };
        assert_eq!(upsert_actor(&pool, &portrait).await.unwrap(), id);

        let row = get_actor_by_name(&pool, "Will Smith").await.unwrap().unwrap();
        assert_eq!(row.birth_date(), NaiveDate::from_ymd_opt(1968, 9, 25));
        assert_eq!(row.portrait_path.as_deref(), Some("/tmp/will_smith.jpg"));
        assert_eq!(row.award_wins, 0);
        assert_eq!(list_actor_names(&pool).await.unwrap(), vec!["Will Smith"]);
    }

    #[tokio::test]
    async fn test_roles_accumulate_distinct() {
        let pool = test_pool().await;
        upsert_movie(&pool, &men_in_black()).await.unwrap();
        upsert_actor(&pool, &NewActor {
            name: "Will Smith".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

        let roles = upsert_role(&pool, "Will Smith", "Men in Black", Some("Agent J"))
            .await
            .unwrap();
        assert_eq!(roles.as_deref(), Some("Agent J"));

        upsert_role(&pool, "Will Smith", "Men in Black", Some("Agent J")).await.unwrap();
        let roles = upsert_role(&pool, "Will Smith", "Men in Black", Some("James Edwards"))
            .await
            .unwrap();
        assert_eq!(roles.as_deref(), Some("Agent J, James Edwards"));

        let movies = get_movies_for_actor(&pool, "Will Smith").await.unwrap();
        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].movie.title, "Men in Black");
        assert_eq!(movies[0].roles, "Agent J, James Edwards");
    }

    #[tokio::test]
    async fn test_role_for_unknown_actor_or_movie() {
        let pool = test_pool().await;
        upsert_movie(&pool, &men_in_black()).await.unwrap();

        let roles = upsert_role(&pool, "Nobody", "Men in Black", Some("Extra"))
            .await
            .unwrap();
        assert_eq!(roles, None);
        assert_eq!(count(&pool, "movie_actors").await, 0);
    }

    #[tokio::test]
    async fn test_update_awards() {
        let pool = test_pool().await;
        upsert_actor(&pool, &NewActor {
            name: "Will Smith".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

        assert!(update_awards(&pool, "Will Smith", 1, 5).await.unwrap());
        assert!(!update_awards(&pool, "Nobody", 1, 5).await.unwrap());

        let row = get_actor_by_name(&pool, "Will Smith").await.unwrap().unwrap();
        assert_eq!((row.award_wins, row.award_nominations), (1, 5));
    }

    #[tokio::test]
    async fn test_delete_movie_removes_links() {
        let pool = test_pool().await;
        upsert_movie(&pool, &men_in_black()).await.unwrap();
        upsert_actor(&pool, &NewActor {
            name: "Will Smith".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
        upsert_role(&pool, "Will Smith", "Men in Black", Some("Agent J")).await.unwrap();

        assert!(delete_movie(&pool, "Men in Black").await.unwrap());
        assert!(!delete_movie(&pool, "Men in Black").await.unwrap());

        assert_eq!(count(&pool, "movies").await, 0);
        assert_eq!(count(&pool, "movie_actors").await, 0);
        assert_eq!(count(&pool, "movie_genres").await, 0);
        // genres themselves stay for other movies
        assert_eq!(count(&pool, "genres").await, 2);
    }

    #[test]
    fn test_merge_roles() {
        assert_eq!(merge_roles(None, Some("Agent J")), "Agent J");
        assert_eq!(merge_roles(Some("Agent J"), Some("Agent J")), "Agent J");
        assert_eq!(merge_roles(Some("Agent J"), None), "Agent J");
        assert_eq!(merge_roles(Some(""), Some("  ")), "");
    }
}

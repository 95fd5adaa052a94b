// Services module - external data sources

pub mod inflation;

// Filmography and metadata providers
pub mod omdb;
pub mod scraper;

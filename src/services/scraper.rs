// Review-aggregator celebrity page scraper
// Pulls the filmography table, birthday and portrait from one page fetch per actor

use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::{header, Client};
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

pub const DEFAULT_BASE_URL: &str = "https://www.rottentomatoes.com/celebrity/";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

/// Score attribute values that mean "no score"
const SCORE_SENTINELS: &[&str] = &["N/A", "", "-1", "-", "No Score Yet"];

static ROW_OR_SECTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr[data-title], rt-text").expect("valid selector"));
static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".celebrity-filmography__title a").expect("valid selector"));
static YEAR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".celebrity-filmography__year").expect("valid selector"));
static CRITIC: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[data-tomatometer]").expect("valid selector"));
static AUDIENCE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[data-audiencescore]").expect("valid selector"));
static BOX_OFFICE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".celebrity-filmography__box-office").expect("valid selector")
});
static CREDITS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".celebrity-filmography__credits").expect("valid selector"));
static BIRTHDAY: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("p.celebrity-bio__item[data-qa=\"celebrity-bio-bday\"]")
        .expect("valid selector")
});
static IMAGES: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img[alt]").expect("valid selector"));

/// One filmography table row, exactly as scraped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFilmographyRow {
    /// Position in the table, starting at 0
    pub sequence_id: usize,
    pub title: Option<String>,
    pub year: Option<String>,
    pub box_office: Option<String>,
    pub critic_score: Option<String>,
    pub audience_score: Option<String>,
    pub credited_role: Option<String>,
}

/// Everything pulled from an actor's page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActorPage {
    pub rows: Vec<RawFilmographyRow>,
    pub birth_date: Option<NaiveDate>,
    pub portrait_url: Option<String>,
}

/// URL slug for an actor: "Robert Downey Jr." -> "robert_downey_jr"
pub fn actor_slug(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            ' ' | '-' => Some('_'),
            c if c.is_alphanumeric() || c == '_' => Some(c),
            _ => None,
        })
        .collect()
}

/// Map score sentinels to None
pub fn normalize_score(raw: Option<&str>) -> Option<String> {
    let value = raw?.trim();
    if SCORE_SENTINELS.contains(&value) {
        None
    } else {
        Some(value.to_string())
    }
}

/// Parse a score that survived sentinel filtering into 0-100
pub fn parse_score(raw: Option<&str>) -> Option<u8> {
    normalize_score(raw)?.parse::<u8>().ok().filter(|s| *s <= 100)
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn select_text(row: ElementRef<'_>, selector: &Selector) -> Option<String> {
    row.select(selector)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
}

fn select_attr(row: ElementRef<'_>, selector: &Selector, attr: &str) -> Option<String> {
    row.select(selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(str::to_string)
}

/// Parse the celebrity page. Rows after the "TV" section header are ignored.
pub fn parse_actor_page(html: &str, actor_name: &str) -> ActorPage {
    let document = Html::parse_document(html);
    let mut rows = Vec::new();

    for el in document.select(&ROW_OR_SECTION) {
        if el.value().name() == "rt-text" {
            if element_text(el) == "TV" {
                break;
            }
            continue;
        }

        let critic = select_attr(el, &CRITIC, "data-tomatometer");
        let audience = select_attr(el, &AUDIENCE, "data-audiencescore");

        rows.push(RawFilmographyRow {
            sequence_id: rows.len(),
            title: select_text(el, &TITLE),
            year: select_text(el, &YEAR),
            box_office: select_text(el, &BOX_OFFICE),
            critic_score: normalize_score(critic.as_deref()),
            audience_score: normalize_score(audience.as_deref()),
            credited_role: select_text(el, &CREDITS),
        });
    }

    ActorPage {
        rows,
        birth_date: parse_birth_date(&document),
        portrait_url: find_portrait(&document, actor_name),
    }
}

/// "Birthday: Sep 25, 1968" -> 1968-09-25
fn parse_birth_date(document: &Html) -> Option<NaiveDate> {
    let text = document.select(&BIRTHDAY).next().map(element_text)?;
    let date_text = text.rsplit(':').next()?.trim();
    match NaiveDate::parse_from_str(date_text, "%b %d, %Y") {
        Ok(date) => Some(date),
        Err(e) => {
            tracing::debug!("Unparseable birthday {:?}: {}", date_text, e);
            None
        }
    }
}

fn find_portrait(document: &Html, actor_name: &str) -> Option<String> {
    let name = actor_name.trim().to_lowercase();
    document
        .select(&IMAGES)
        .find(|img| {
            let alt = img.value().attr("alt").unwrap_or_default().to_lowercase();
            alt.contains("portrait photo of") && alt.contains(&name)
        })
        .and_then(|img| img.value().attr("src"))
        .map(str::to_string)
}

/// Celebrity page client
pub struct RtScraper {
    client: Client,
    base_url: String,
    user_agent: String,
}

impl RtScraper {
    pub fn new(client: Client, base_url: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            user_agent: user_agent.into(),
        }
    }

    pub fn actor_url(&self, name: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            actor_slug(name)
        )
    }

    async fn fetch_page(&self, name: &str) -> Result<String> {
        let url = self.actor_url(name);
        tracing::debug!("Fetching {}", url);

        let body = self
            .client
            .get(&url)
            .header(header::USER_AGENT, &self.user_agent)
            .send()
            .await
            .context("Failed to fetch celebrity page")?
            .error_for_status()
            .context("Celebrity page returned an error status")?
            .text()
            .await
            .context("Failed to read celebrity page body")?;

        Ok(body)
    }

    /// Fetch and parse an actor page. Network failures yield an empty page.
    pub async fn scrape_actor(&self, name: &str) -> ActorPage {
        match self.fetch_page(name).await {
            Ok(body) => {
                let page = parse_actor_page(&body, name);
                tracing::info!("Scraped {} filmography rows for {}", page.rows.len(), name);
                page
            }
            Err(e) => {
                tracing::warn!("Failed to scrape {}: {:#}", name, e);
                ActorPage::default()
            }
        }
    }
}

// TMDB v3 client: typed responses for the TV listing, "similar" and detail endpoints.
// Public API:
//   - fetch_list_page(list, page) -> Result<ShowPage, TmdbError>
//   - fetch_similar_page(show_id, page) -> Result<ShowPage, TmdbError>
//   - fetch_show_details(show_id) -> Result<ShowDetails, TmdbError>
//   - image_url(path, size): absolute poster/backdrop URL
//
// Endpoint sample:
// https://api.themoviedb.org/3/tv/popular?api_key=...&language=en-US&page=1

use lazy_static::lazy_static;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fmt;
use url::Url;

use crate::app::config::with_config;
use crate::types::{ShowId, ShowList};

/// Highest `page` TMDB serves for any paged endpoint; past it the API answers 422.
pub const MAX_PAGE: u32 = 500;

lazy_static! {
    static ref CLIENT: reqwest::Client = reqwest::Client::builder()
        .user_agent(concat!("tvshows-browser/", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_secs(20))
        .build()
        .unwrap_or_default();
}

#[derive(Debug)]
pub enum TmdbError {
    MissingApiKey,
    Url(url::ParseError),
    Reqwest(reqwest::Error),
    Api { status: u16, message: String },
    Decode(serde_json::Error),
}

impl fmt::Display for TmdbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TmdbError::MissingApiKey => write!(f, "TMDB api key is not configured"),
            TmdbError::Url(e) => write!(f, "Bad endpoint url: {}", e),
            TmdbError::Reqwest(e) => write!(f, "Request error: {}", e),
            TmdbError::Api { status, message } => write!(f, "API error {}: {}", status, message),
            TmdbError::Decode(e) => write!(f, "Failed to parse JSON response: {}", e),
        }
    }
}

impl std::error::Error for TmdbError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TmdbError::Url(e) => Some(e),
            TmdbError::Reqwest(e) => Some(e),
            TmdbError::Decode(e) => Some(e),
            TmdbError::MissingApiKey | TmdbError::Api { .. } => None,
        }
    }
}

impl From<reqwest::Error> for TmdbError {
    fn from(e: reqwest::Error) -> Self {
        TmdbError::Reqwest(e)
    }
}

impl From<url::ParseError> for TmdbError {
    fn from(e: url::ParseError) -> Self {
        TmdbError::Url(e)
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ShowSummary {
    pub id: ShowId,
    pub name: String,
    #[serde(default)]
    pub vote_average: f32,
    // TMDB sends "" for unknown dates
    #[serde(default)]
    pub first_air_date: Option<String>,
}

impl ShowSummary {
    pub fn year(&self) -> Option<&str> {
        self.first_air_date
            .as_deref()
            .and_then(|d| d.get(..4))
            .filter(|y| !y.is_empty())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ShowPage {
    pub page: u32,
    pub results: Vec<ShowSummary>,
    pub total_pages: u32,
}

impl ShowPage {
    fn empty(page: u32) -> Self {
        Self {
            page,
            results: Vec::new(),
            total_pages: page.saturating_sub(1),
        }
    }

    /// Items of this page. Pages past `total_pages` come back empty, which is how
    /// callers detect the end of a listing.
    pub fn into_items(self) -> Vec<ShowSummary> {
        if self.page > self.total_pages {
            Vec::new()
        } else {
            self.results
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Genre {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ShowDetails {
    pub id: ShowId,
    pub name: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub vote_average: f32,
    #[serde(default)]
    pub vote_count: u64,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub number_of_seasons: u32,
    #[serde(default)]
    pub number_of_episodes: u32,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub homepage: Option<String>,
}

impl ShowDetails {
    pub fn genre_names(&self) -> String {
        self.genres
            .iter()
            .map(|g| g.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

// Error body TMDB returns alongside non-2xx statuses.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    status_message: String,
}

fn decode_error(status: u16, body: &str) -> TmdbError {
    let message = match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(b) if !b.status_message.is_empty() => b.status_message,
        _ => body.trim().chars().take(200).collect(),
    };
    TmdbError::Api { status, message }
}

fn decode_body<T: DeserializeOwned>(body: &str) -> Result<T, TmdbError> {
    serde_json::from_str(body).map_err(TmdbError::Decode)
}

/// Absolute image URL for a TMDB file path, e.g. `image_url("/abc.jpg", "w342")`.
pub fn image_url(path: &str, size: &str) -> Option<Url> {
    if path.is_empty() {
        return None;
    }
    let base = with_config(|c| c.image_base.clone());
    let base = if base.ends_with('/') { base } else { format!("{base}/") };
    Url::parse(&base)
        .and_then(|b| b.join(&format!("{}/{}", size, path.trim_start_matches('/'))))
        .ok()
}

fn endpoint(api_base: &str, path: &str) -> Result<Url, TmdbError> {
    let base = if api_base.ends_with('/') {
        api_base.to_string()
    } else {
        format!("{api_base}/")
    };
    Ok(Url::parse(&base)?.join(path.trim_start_matches('/'))?)
}

async fn get_json<T: DeserializeOwned>(path: &str, page: Option<u32>) -> Result<T, TmdbError> {
    let (api_key, api_base, language) =
        with_config(|c| (c.api_key.clone(), c.api_base.clone(), c.language.clone()));
    let api_key = api_key
        .filter(|k| !k.trim().is_empty())
        .ok_or(TmdbError::MissingApiKey)?;
    let url = endpoint(&api_base, path)?;

    let mut params: Vec<(&str, String)> = vec![("api_key", api_key), ("language", language)];
    if let Some(p) = page {
        params.push(("page", p.to_string()));
    }

    log::debug!("tmdb: GET {} page={:?}", url, page);
    let client = &CLIENT;
    let mut resp = client.get(url.clone()).query(&params).send().await?;

    // TMDB rate limits bursts with 429; back off once before giving up.
    if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
        log::warn!("tmdb: received 429 Too Many Requests for {}; delaying 1s before retry", path);
        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
        resp = client.get(url).query(&params).send().await?;
    }

    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        let err = decode_error(status.as_u16(), &body);
        log::warn!("tmdb: {} failed: {}", path, err);
        return Err(err);
    }
    decode_body(&body).inspect_err(|e| log::error!("tmdb: {}: {}", path, e))
}

// TMDB rejects pages past MAX_PAGE with 422 "Invalid page" even when total_pages is
// larger. Both the cap and that reply mean the listing has ended.
fn settle_page(page: u32, res: Result<ShowPage, TmdbError>) -> Result<ShowPage, TmdbError> {
    match res {
        Err(TmdbError::Api { status: 422, message }) if message.contains("Invalid page") => {
            log::info!("tmdb: page {} is past the API page limit: {}", page, message);
            Ok(ShowPage::empty(page))
        }
        other => other,
    }
}

async fn get_page(path: &str, page: u32) -> Result<ShowPage, TmdbError> {
    if page > MAX_PAGE {
        log::debug!("tmdb: {} page {} is past the {} page limit", path, page, MAX_PAGE);
        return Ok(ShowPage::empty(page));
    }
    settle_page(page, get_json(path, Some(page)).await)
}

pub async fn fetch_list_page(list: ShowList, page: u32) -> Result<ShowPage, TmdbError> {
    get_page(&format!("tv/{}", list.api_value()), page).await
}

pub async fn fetch_similar_page(show_id: ShowId, page: u32) -> Result<ShowPage, TmdbError> {
    get_page(&format!("tv/{}/similar", show_id), page).await
}

pub async fn fetch_show_details(show_id: ShowId) -> Result<ShowDetails, TmdbError> {
    get_json(&format!("tv/{}", show_id), None).await
}

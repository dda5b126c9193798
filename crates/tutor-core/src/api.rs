//! Card search API client
//!
//! One GET per search against the card endpoint, JSON parsing of the
//! `cards` array, and name de-duplication capped at [`MAX_RESULTS`].
//! There is no retry logic: a failed request is reported once and the
//! caller decides how to degrade.

use alloc::string::String;
use alloc::vec::Vec;

use log::{debug, info};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Deserialize;
use thiserror_no_std::Error;

use crate::config::DEFAULT_SEARCH_URL;
use crate::http::{HttpClient, HttpError};

/// Result rows shown on the search screen
pub const MAX_RESULTS: usize = 8;

/// Characters left alone when encoding a query (RFC 3986 unreserved set)
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] HttpError),
    #[error("malformed JSON at line {line}, column {column}")]
    Json { line: usize, column: usize },
}

/// One search hit
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CardResult {
    pub name: String,
    #[serde(rename = "imageUrl", default)]
    pub image_url: String,
}

impl CardResult {
    pub fn new(name: &str, image_url: &str) -> Self {
        Self {
            name: name.into(),
            image_url: image_url.into(),
        }
    }
}

pub type CardResults = heapless::Vec<CardResult, MAX_RESULTS>;

#[derive(Deserialize)]
struct SearchResponse {
    cards: Vec<CardResult>,
}

/// Parse a search response body into its card list, in server order.
pub fn parse_cards(body: &[u8]) -> Result<Vec<CardResult>, ApiError> {
    serde_json::from_slice::<SearchResponse>(body)
        .map(|response| response.cards)
        .map_err(|e| ApiError::Json {
            line: e.line(),
            column: e.column(),
        })
}

/// Collects cards with distinct names until [`MAX_RESULTS`] are held.
#[derive(Debug, Default)]
pub struct CardCollector {
    cards: CardResults,
}

impl CardCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_full(&self) -> bool {
        self.cards.is_full()
    }

    /// Keep `card` if no card with the same name was kept before.
    /// Returns whether it was added.
    pub fn offer(&mut self, card: &CardResult) -> bool {
        if self.is_full() || self.cards.iter().any(|kept| kept.name == card.name) {
            return false;
        }
        self.cards.push(card.clone()).is_ok()
    }

    pub fn finish(self) -> CardResults {
        self.cards
    }
}

/// Milestones of a running search, in the order they happen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchProgress {
    /// The response body arrived
    Received,
    /// The body parsed as a card list
    Parsed,
    /// Another distinct name was kept; carries the running count
    Collected(usize),
}

pub struct ApiClient<H> {
    http: H,
    search_url: String,
}

impl<H: HttpClient> ApiClient<H> {
    pub fn new(http: H) -> Self {
        Self::with_search_url(http, DEFAULT_SEARCH_URL)
    }

    /// `search_url` is the endpoint up to and including `name=`
    pub fn with_search_url(http: H, search_url: &str) -> Self {
        Self {
            http,
            search_url: search_url.into(),
        }
    }

    pub fn http(&self) -> &H {
        &self.http
    }

    pub fn set_search_url(&mut self, search_url: &str) {
        self.search_url = search_url.into();
    }

    pub fn search_url(&self, query: &str) -> String {
        let mut url = self.search_url.clone();
        url.extend(utf8_percent_encode(query, QUERY_ENCODE_SET));
        url
    }

    /// Fetch the raw search response body for `query`.
    pub async fn fetch_search(&mut self, query: &str) -> Result<Vec<u8>, ApiError> {
        let url = self.search_url(query);
        info!("Searching cards: {}", url);
        let body = self.http.get(&url).await?;
        debug!("Search response: {} bytes", body.len());
        Ok(body)
    }

    /// Fetch, parse and de-duplicate by exact name in first-seen order.
    /// Scanning stops once [`MAX_RESULTS`] names are held.
    pub async fn search_cards(
        &mut self,
        query: &str,
        mut progress: impl FnMut(SearchProgress),
    ) -> Result<CardResults, ApiError> {
        let body = self.fetch_search(query).await?;
        progress(SearchProgress::Received);
        let cards = parse_cards(&body)?;
        progress(SearchProgress::Parsed);

        let mut collector = CardCollector::new();
        let mut kept = 0;
        for card in &cards {
            if collector.is_full() {
                break;
            }
            if collector.offer(card) {
                kept += 1;
                progress(SearchProgress::Collected(kept));
            }
        }

        let results = collector.finish();
        info!(
            "Search {:?} kept {} of {} cards",
            query,
            results.len(),
            cards.len()
        );
        Ok(results)
    }

    /// Download the image at `url`.
    pub async fn fetch_image(&mut self, url: &str) -> Result<Vec<u8>, ApiError> {
        info!("Fetching image: {}", url);
        let bytes = self.http.get(url).await?;
        debug!("Image response: {} bytes", bytes.len());
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{block_on, MockHttp};
    use alloc::format;

    fn body(names: &[&str]) -> Vec<u8> {
        let cards: Vec<String> = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                format!(r#"{{"name":"{name}","imageUrl":"http://img/{i}.png","cmc":1}}"#)
            })
            .collect();
        format!(r#"{{"cards":[{}]}}"#, cards.join(",")).into_bytes()
    }

    /// Run one search against a canned body, recording every milestone
    fn search(names: &[&str]) -> (CardResults, Vec<SearchProgress>) {
        let http = MockHttp::new().route(DEFAULT_SEARCH_URL, Ok(body(names)));
        let mut client = ApiClient::new(http);
        let mut steps = Vec::new();
        let results = block_on(client.search_cards("x", |step| steps.push(step))).unwrap();
        (results, steps)
    }

    #[test]
    fn duplicates_removed_in_first_seen_order() {
        let (unique, steps) = search(&["Lightning Bolt", "Shock", "Lightning Bolt"]);

        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0], CardResult::new("Lightning Bolt", "http://img/0.png"));
        assert_eq!(unique[1], CardResult::new("Shock", "http://img/1.png"));
        assert_eq!(
            steps,
            [
                SearchProgress::Received,
                SearchProgress::Parsed,
                SearchProgress::Collected(1),
                SearchProgress::Collected(2),
            ]
        );
    }

    #[test]
    fn results_capped_at_eight() {
        let names: Vec<String> = (0..12).map(|i| format!("Card {i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let (unique, steps) = search(&refs);

        assert_eq!(unique.len(), MAX_RESULTS);
        assert_eq!(unique[7].name, "Card 7");
        assert_eq!(steps.last(), Some(&SearchProgress::Collected(MAX_RESULTS)));
    }

    #[test]
    fn names_compare_exactly() {
        let (unique, _) = search(&["Shock", "shock", "Shock "]);
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn collector_refuses_duplicates_and_overflow() {
        let mut collector = CardCollector::new();
        assert!(collector.offer(&CardResult::new("A", "a")));
        assert!(!collector.offer(&CardResult::new("A", "other")));
        for i in 1..MAX_RESULTS {
            assert!(collector.offer(&CardResult::new(&format!("{i}"), "")));
        }
        assert!(collector.is_full());
        assert!(!collector.offer(&CardResult::new("late", "")));
    }

    #[test]
    fn missing_cards_key_is_a_json_error() {
        assert!(matches!(parse_cards(b"{\"error\":\"nope\"}"), Err(ApiError::Json { .. })));
        assert!(matches!(parse_cards(b"<html>"), Err(ApiError::Json { .. })));
        assert_eq!(parse_cards(b"{\"cards\":[]}").unwrap(), Vec::new());
    }

    #[test]
    fn query_is_percent_encoded() {
        let client = ApiClient::new(MockHttp::new());
        assert_eq!(
            client.search_url("jace's bolt"),
            "https://api.magicthegathering.io/v1/cards?contains=imageUrl&name=jace%27s%20bolt"
        );
        assert!(client.search_url("a-b").ends_with("name=a-b"));
    }

    #[test]
    fn search_cards_hits_the_encoded_url_once() {
        let http = MockHttp::new().route(DEFAULT_SEARCH_URL, Ok(body(&["Shock"])));
        let mut client = ApiClient::new(http);
        let results = block_on(client.search_cards("bolt", |_| {})).unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(
            client.http().requests(),
            [format!("{DEFAULT_SEARCH_URL}bolt")]
        );
    }

    #[test]
    fn unparsable_body_stops_after_received() {
        let http = MockHttp::new().route(DEFAULT_SEARCH_URL, Ok(b"<html>".to_vec()));
        let mut client = ApiClient::new(http);
        let mut steps = Vec::new();

        let result = block_on(client.search_cards("bolt", |step| steps.push(step)));

        assert!(matches!(result, Err(ApiError::Json { .. })));
        assert_eq!(steps, [SearchProgress::Received]);
    }

    #[test]
    fn transport_errors_propagate() {
        let http = MockHttp::new().route("http://img/", Err(HttpError::Connect));
        let mut client = ApiClient::new(http);
        assert_eq!(
            block_on(client.fetch_image("http://img/0.png")),
            Err(ApiError::Http(HttpError::Connect))
        );
    }
}

use crate::conversion::EventNormalizer;
use crate::error::{CampuscalError, Result, check_response};
use crate::event::DomainEvent;
use crate::logging::{log_failure, log_request, log_response};
use reqwest::Client;
use std::future::Future;

/// Marker a response body must contain to count as a calendar
const VCALENDAR_MARKER: &str = "BEGIN:VCALENDAR";

pub const ALLORIGINS_RELAY: &str = "https://api.allorigins.win/raw?url=";
pub const CORSPROXY_RELAY: &str = "https://corsproxy.io/?";

/// Something that can GET a URL and hand back the body.
/// Non-2xx statuses must come back as errors.
pub trait Transport {
    fn get(&self, url: &str) -> impl Future<Output = Result<String>> + Send;
}

/// reqwest-backed transport
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        log_response(response.status().as_u16(), url);
        check_response(response, url).await
    }
}

/// One way of reaching a feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStrategy {
    Direct,
    /// The feed URL is percent-encoded and appended to `prefix`
    Relay { prefix: String },
}

impl FetchStrategy {
    pub fn relay(prefix: impl Into<String>) -> Self {
        FetchStrategy::Relay {
            prefix: prefix.into(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            FetchStrategy::Direct => "direct",
            FetchStrategy::Relay { .. } => "relay",
        }
    }

    /// URL actually requested for `feed_url`
    pub fn request_url(&self, feed_url: &str) -> String {
        match self {
            FetchStrategy::Direct => feed_url.to_string(),
            FetchStrategy::Relay { prefix } => {
                format!("{}{}", prefix, urlencoding::encode(feed_url))
            }
        }
    }

    /// Direct first, then each relay in order
    pub fn chain(relays: &[String]) -> Vec<FetchStrategy> {
        std::iter::once(FetchStrategy::Direct)
            .chain(relays.iter().map(FetchStrategy::relay))
            .collect()
    }

    /// Direct, allorigins, corsproxy.io
    pub fn default_chain() -> Vec<FetchStrategy> {
        Self::chain(&[ALLORIGINS_RELAY.to_string(), CORSPROXY_RELAY.to_string()])
    }
}

/// `webcal://` feeds are plain HTTPS
pub fn normalize_feed_url(url: &str) -> String {
    let url = url.trim();
    match url.get(..9) {
        Some(scheme) if scheme.eq_ignore_ascii_case("webcal://") => {
            format!("https://{}", &url[9..])
        }
        _ => url.to_string(),
    }
}

/// Tries each strategy once, in order, and stops at the first response
/// that looks like a calendar
pub struct FetchPipeline<T: Transport> {
    transport: T,
    strategies: Vec<FetchStrategy>,
    normalizer: EventNormalizer,
}

impl<T: Transport> FetchPipeline<T> {
    pub fn new(transport: T, strategies: Vec<FetchStrategy>, normalizer: EventNormalizer) -> Self {
        Self {
            transport,
            strategies,
            normalizer,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch a feed and normalize it, sorted by start
    pub async fn fetch_events(&self, url: &str) -> Result<Vec<DomainEvent>> {
        let text = self.fetch_text(url).await?;
        let events = self.normalizer.parse_calendar(&text);
        log::info!("Loaded {} events from {}", events.len(), url);
        Ok(events)
    }

    /// Raw iCal text of a feed
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        if url.trim().is_empty() {
            return Err(CampuscalError::Config(
                "No calendar URL configured".to_string(),
            ));
        }
        let feed_url = normalize_feed_url(url);

        for strategy in &self.strategies {
            let request_url = strategy.request_url(&feed_url);
            log_request(strategy.name(), &request_url);

            match self.transport.get(&request_url).await {
                Ok(text) if text.contains(VCALENDAR_MARKER) => return Ok(text),
                Ok(_) => {
                    let err = CampuscalError::NotICalendar(request_url);
                    log_failure(strategy.name(), &err.to_string());
                }
                Err(e) => log_failure(strategy.name(), &e.to_string()),
            }
        }

        Err(CampuscalError::Unreachable)
    }
}

use reqwest::Response;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CampuscalError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    #[error("Configuration error: {0}")]
    Config(String),

    /// Every fetch strategy failed. The message is shown to the user as-is.
    #[error("Could not load the calendar. Check the URL or your connection.")]
    Unreachable,

    #[error("Response from {0} is not an iCalendar document")]
    NotICalendar(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("No event with id {0}")]
    EventNotFound(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, CampuscalError>;

/// Check a feed response status and return the body as text on success
pub async fn check_response(response: Response, url: &str) -> Result<String> {
    if !response.status().is_success() {
        return Err(CampuscalError::Http {
            status: response.status().as_u16(),
            url: url.to_string(),
        });
    }

    Ok(response.text().await?)
}

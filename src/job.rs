//! Job identifiers
//!
//! A [`JobId`] names one download request and, later, its artifact in the
//! results directory. It is used verbatim as a file name, so the accepted
//! alphabet is restricted to ASCII letters, digits and `-`.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use url::Url;

const WATCH_PREFIX: &str = "https://www.youtube.com/watch?";
const SHORT_PREFIX: &str = "https://youtu.be/";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum JobIdError {
    #[error("job id is empty")]
    Empty,

    #[error("job id contains invalid character {0:?}")]
    InvalidChar(char),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("unsupported video url: {0}")]
    UnsupportedUrl(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId(String);

impl JobId {
    pub fn parse(raw: &str) -> Result<Self, JobIdError> {
        if raw.is_empty() {
            return Err(JobIdError::Empty);
        }
        if let Some(c) = raw.chars().find(|c| !is_id_char(*c)) {
            return Err(JobIdError::InvalidChar(c));
        }
        Ok(Self(raw.to_string()))
    }

    /// Extract the video id from a watch page or short link URL.
    ///
    /// Accepts `https://www.youtube.com/watch?v=<id>` and
    /// `https://youtu.be/<id>`; everything else is rejected.
    pub fn from_video_url(raw: &str) -> Result<Self, JobIdError> {
        let url = Url::parse(raw.trim())?;
        let normalized = url.as_str();

        let candidate = if normalized.starts_with(WATCH_PREFIX) {
            url.query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned())
                .unwrap_or_default()
        } else if normalized.starts_with(SHORT_PREFIX) {
            url.path().trim_matches('/').to_string()
        } else {
            return Err(JobIdError::UnsupportedUrl(raw.to_string()));
        };

        Self::parse(&candidate)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-'
}

impl FromStr for JobId {
    type Err = JobIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for JobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

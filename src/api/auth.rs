//! HTTP Basic authentication
//!
//! Users come from a two-column CSV file of `user,password` records, with
//! standard quoting. Passwords are only kept as SHA-256 digests once loaded.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{
        HeaderValue, StatusCode,
        header::{AUTHORIZATION, WWW_AUTHENTICATE},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use sha2::{Digest, Sha256};
use thiserror::Error;

pub const REALM: &str = "Restricted";

#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("failed to read users file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: malformed record: {source}")]
    Csv {
        line: usize,
        #[source]
        source: csv::Error,
    },

    #[error("line {line}: expected 2 fields, found {found}")]
    FieldCount { line: usize, found: usize },

    #[error("line {line}: user name must not be empty")]
    EmptyUser { line: usize },

    #[error("line {line}: duplicate user '{user}'")]
    DuplicateUser { line: usize, user: String },
}

/// Known users and their password digests
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    users: HashMap<String, [u8; 32]>,
}

impl Credentials {
    /// Load a users file from disk
    pub fn from_file(path: &Path) -> Result<Self, CredentialsError> {
        let contents = std::fs::read_to_string(path).map_err(|source| CredentialsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents)
    }

    /// Parse `user,password` CSV records. Blank lines are ignored.
    pub fn parse(contents: &str) -> Result<Self, CredentialsError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(contents.as_bytes());
        let mut users = HashMap::new();

        for result in reader.records() {
            let record = result.map_err(|source| CredentialsError::Csv {
                line: source.position().map_or(0, |pos| pos.line() as usize),
                source,
            })?;
            let line = record.position().map_or(0, |pos| pos.line() as usize);

            if record.len() != 2 {
                return Err(CredentialsError::FieldCount {
                    line,
                    found: record.len(),
                });
            }
            let (user, password) = (&record[0], &record[1]);

            if user.is_empty() {
                return Err(CredentialsError::EmptyUser { line });
            }

            if users.insert(user.to_string(), digest(password)).is_some() {
                return Err(CredentialsError::DuplicateUser {
                    line,
                    user: user.to_string(),
                });
            }
        }

        Ok(Self { users })
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn verify(&self, user: &str, password: &str) -> bool {
        match self.users.get(user) {
            Some(expected) => constant_time_eq(expected, &digest(password)),
            None => false,
        }
    }

    /// Check a raw `Authorization` header value
    pub fn verify_header(&self, value: &str) -> bool {
        let Some(encoded) = value.strip_prefix("Basic ") else {
            return false;
        };
        let Ok(decoded) = STANDARD.decode(encoded.trim()) else {
            return false;
        };
        let Ok(pair) = String::from_utf8(decoded) else {
            return false;
        };
        match pair.split_once(':') {
            Some((user, password)) => self.verify(user, password),
            None => false,
        }
    }
}

fn digest(password: &str) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(password.as_bytes()));
    out
}

// Inspects every byte regardless of where the first mismatch is, so response
// timing does not leak how much of a guessed password digest matched.
fn constant_time_eq(a: &[u8; 32], b: &[u8; 32]) -> bool {
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Rejection sent when credentials are missing or wrong
#[derive(Debug)]
pub struct Unauthorized;

impl IntoResponse for Unauthorized {
    fn into_response(self) -> Response {
        let challenge = format!("Basic realm=\"{REALM}\"");
        let mut response = (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
        if let Ok(value) = HeaderValue::from_str(&challenge) {
            response.headers_mut().insert(WWW_AUTHENTICATE, value);
        }
        response
    }
}

/// Basic authentication middleware guarding every route
pub async fn require_basic_auth(
    State(credentials): State<Arc<Credentials>>,
    request: Request,
    next: Next,
) -> Result<Response, Unauthorized> {
    let authorized = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| credentials.verify_header(value));

    if !authorized {
        tracing::debug!(path = %request.uri().path(), "Rejected unauthenticated request");
        return Err(Unauthorized);
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(user: &str, password: &str) -> String {
        format!("Basic {}", STANDARD.encode(format!("{user}:{password}")))
    }

    #[test]
    fn test_parse_and_verify() {
        let creds = Credentials::parse("alice,secret\n\nbob,hunter2\r\n").unwrap();

        assert_eq!(creds.len(), 2);
        assert!(creds.verify("alice", "secret"));
        assert!(creds.verify("bob", "hunter2"));
        assert!(!creds.verify("alice", "hunter2"));
        assert!(!creds.verify("carol", "secret"));
    }

    #[test]
    fn test_field_count_error_reports_line() {
        let err = Credentials::parse("alice,secret\nbob\n").unwrap_err();
        assert!(matches!(err, CredentialsError::FieldCount { line: 2, found: 1 }));

        let err = Credentials::parse("alice,se,cret\n").unwrap_err();
        assert!(matches!(err, CredentialsError::FieldCount { line: 1, found: 3 }));
    }

    #[test]
    fn test_quoted_fields() {
        let creds = Credentials::parse("alice,\"pa,ss\"\n\"bob\",\"secret\"\n").unwrap();

        assert_eq!(creds.len(), 2);
        assert!(creds.verify("alice", "pa,ss"));
        assert!(!creds.verify("alice", "pa"));
        assert!(creds.verify("bob", "secret"));
        assert!(!creds.verify("\"bob\"", "secret"));
    }

    #[test]
    fn test_escaped_quote_in_password() {
        let creds = Credentials::parse("carol,\"say \"\"hi\"\"\"\n").unwrap();
        assert!(creds.verify("carol", "say \"hi\""));
    }

    #[test]
    fn test_empty_user_rejected() {
        let err = Credentials::parse(",secret\n").unwrap_err();
        assert!(matches!(err, CredentialsError::EmptyUser { line: 1 }));
    }

    #[test]
    fn test_duplicate_user_rejected() {
        let err = Credentials::parse("alice,one\nalice,two\n").unwrap_err();
        match err {
            CredentialsError::DuplicateUser { line, user } => {
                assert_eq!(line, 2);
                assert_eq!(user, "alice");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_digest_comparison_checks_every_byte() {
        let expected = digest("secret");
        assert!(constant_time_eq(&expected, &digest("secret")));

        for index in [0, 15, 31] {
            let mut other = expected;
            other[index] ^= 0x01;
            assert!(!constant_time_eq(&expected, &other), "byte {index}");
        }
    }

    #[test]
    fn test_verify_header() {
        let creds = Credentials::parse("alice,pa:ss\n").unwrap();

        assert!(creds.verify_header(&header("alice", "pa:ss")));
        assert!(!creds.verify_header(&header("alice", "wrong")));
        assert!(!creds.verify_header("Bearer abc"));
        assert!(!creds.verify_header("Basic !!not-base64!!"));
        assert!(!creds.verify_header(&format!("Basic {}", STANDARD.encode("alice"))));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("users.csv");
        std::fs::write(&path, "alice,secret\n").unwrap();

        let creds = Credentials::from_file(&path).unwrap();
        assert!(creds.verify("alice", "secret"));

        let missing = Credentials::from_file(&dir.path().join("nope.csv"));
        assert!(matches!(missing, Err(CredentialsError::Io { .. })));
    }
}

//! API models for the submit form, error bodies and health reporting.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::observability::MetricsSnapshot;

/// Body of `POST /`
#[derive(Debug, Deserialize, Clone)]
pub struct SubmitForm {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub components: BTreeMap<String, String>,
    pub version: String,
    pub queue_depth: usize,
    pub queue_capacity: usize,
    pub worker_busy: bool,
    pub metrics: MetricsSnapshot,
}

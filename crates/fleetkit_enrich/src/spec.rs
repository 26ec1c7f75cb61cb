//! Enrichment statuses, options and error types.

use std::fmt;

use fleetkit_table::conf::{C_COL_COLOR_CODE, C_COL_GRUPPE, C_COL_LABEL_IDS, U8_DELIMITER_DEFAULT};
use fleetkit_table::{SpecMergeReport, TableError};
use serde::{Deserialize, Serialize};

use crate::conf::{
    C_API_BASE_URL_DEFAULT, N_API_TIMEOUT_MS_DEFAULT, TUP_PATH_ACTIVE_RESOURCES, TUP_PATH_LABELS,
};

////////////////////////////////////////////////////////////////////////////////
// #region ResponseEnvelope

/// Tagged outcome of one enrichment call.
///
/// Wire form is the lowercase tag; unrecognized tags survive as `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EnumResponseStatus {
    /// Table enriched; payload carries the transfer-encoded table.
    Success,
    /// Fetch, credential or transport failure.
    Error,
    /// Uploaded bytes were not a valid inventory CSV.
    CsvParsingError,
    /// Tag not produced by this pipeline.
    Unknown(String),
}

impl EnumResponseStatus {
    /// Wire tag.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::CsvParsingError => "csv_parsing_error",
            Self::Unknown(tag) => tag,
        }
    }
}

impl From<String> for EnumResponseStatus {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "success" => Self::Success,
            "error" => Self::Error,
            "csv_parsing_error" => Self::CsvParsingError,
            _ => Self::Unknown(tag),
        }
    }
}

impl From<EnumResponseStatus> for String {
    fn from(status: EnumResponseStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for EnumResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status plus optional transfer payload. Only `Success` carries data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecEnrichResponse {
    /// Outcome tag.
    pub status: EnumResponseStatus,
    /// Transfer-encoded table.
    #[serde(rename = "data", default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}

impl SpecEnrichResponse {
    /// Successful response carrying `payload`.
    pub fn success(payload: String) -> Self {
        Self {
            status: EnumResponseStatus::Success,
            payload: Some(payload),
        }
    }

    /// Payload-less response with `status`.
    pub fn failure(status: EnumResponseStatus) -> Self {
        Self {
            status,
            payload: None,
        }
    }

    /// Serialize to the JSON wire envelope.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse the JSON wire envelope.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Options

/// Opaque bearer token passed through to the fleet API.
#[derive(Clone, PartialEq, Eq)]
pub struct SpecBearerToken(String);

impl SpecBearerToken {
    /// Wrap a token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token for the `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// `true` when the token is blank.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for SpecBearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SpecBearerToken(***)")
    }
}

/// HTTP client options for [`crate::api::HttpFleetApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecFleetApiOptions {
    /// API origin, e.g. `https://api.baubuddy.de`.
    pub base_url: String,
    /// Path segments of the active-vehicles endpoint.
    pub path_active_resources: Vec<String>,
    /// Path segments of the label endpoint (label id appended).
    pub path_labels: Vec<String>,
    /// Request timeout.
    pub timeout_ms: u64,
}

impl Default for SpecFleetApiOptions {
    fn default() -> Self {
        Self {
            base_url: C_API_BASE_URL_DEFAULT.to_string(),
            path_active_resources: TUP_PATH_ACTIVE_RESOURCES
                .iter()
                .map(ToString::to_string)
                .collect(),
            path_labels: TUP_PATH_LABELS.iter().map(ToString::to_string).collect(),
            timeout_ms: N_API_TIMEOUT_MS_DEFAULT,
        }
    }
}

/// Column and parsing options for one enrichment pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecEnrichOptions {
    /// Field delimiter of the uploaded CSV.
    pub delimiter: u8,
    /// Column holding label identifiers.
    pub col_label_ids: String,
    /// Column receiving resolved colors.
    pub col_color_code: String,
    /// Grouping column for the final sort.
    pub col_sort: String,
}

impl Default for SpecEnrichOptions {
    fn default() -> Self {
        Self {
            delimiter: U8_DELIMITER_DEFAULT,
            col_label_ids: C_COL_LABEL_IDS.to_string(),
            col_color_code: C_COL_COLOR_CODE.to_string(),
            col_sort: C_COL_GRUPPE.to_string(),
        }
    }
}

/// Counters for one successful enrichment pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpecEnrichReport {
    /// Merge counters.
    pub merge: SpecMergeReport,
    /// Label lookups actually sent (cache misses).
    pub cnt_label_lookups: usize,
    /// Rows in the final table.
    pub cnt_rows: usize,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Fleet/label API failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FleetApiError {
    /// Credential rejected (expired or invalid token).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// Network failure or non-2xx status.
    #[error("Transport failure: {0}")]
    Transport(String),
    /// Body is not the expected record list.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// Fatal enrichment failures, each mapped to one response status.
#[derive(Debug, thiserror::Error)]
pub enum EnrichError {
    /// Uploaded CSV rejected by the loader.
    #[error(transparent)]
    Parse(#[from] TableError),
    /// Active resource fetch failed.
    #[error("Fetching active resources failed: {0}")]
    Fetch(#[from] FleetApiError),
}

impl EnrichError {
    /// Response status for this failure.
    pub fn status(&self) -> EnumResponseStatus {
        match self {
            Self::Parse(_) => EnumResponseStatus::CsvParsingError,
            Self::Fetch(_) => EnumResponseStatus::Error,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

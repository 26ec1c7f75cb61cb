//! Fleet and label API seam.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::Url;
use reqwest::blocking::Client;
use serde_json::{Map, Value};
use tracing::debug;

use crate::spec::{FleetApiError, SpecBearerToken, SpecFleetApiOptions};

/// External record source: active vehicles and label lookups.
pub trait FleetApi {
    /// Fetch all active vehicle records.
    fn fetch_active_resources(
        &self,
        token: &SpecBearerToken,
    ) -> Result<Vec<Map<String, Value>>, FleetApiError>;

    /// Fetch the records of one label.
    fn fetch_label(
        &self,
        label_id: &str,
        token: &SpecBearerToken,
    ) -> Result<Vec<Map<String, Value>>, FleetApiError>;
}

/// Blocking HTTP implementation of [`FleetApi`].
pub struct HttpFleetApi {
    client: Client,
    options: SpecFleetApiOptions,
}

impl HttpFleetApi {
    /// Build a client with the configured timeout.
    pub fn new(options: SpecFleetApiOptions) -> Result<Self, FleetApiError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(options.timeout_ms))
            .build()
            .map_err(|err| FleetApiError::Transport(format!("Failed to build client: {err}")))?;
        Ok(Self { client, options })
    }

    fn derive_url(&self, segments: &[String], last: Option<&str>) -> Result<Url, FleetApiError> {
        let mut url = Url::parse(&self.options.base_url).map_err(|err| {
            FleetApiError::Transport(format!("Invalid base URL {:?}: {err}", self.options.base_url))
        })?;
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                FleetApiError::Transport(format!(
                    "Base URL cannot carry a path: {:?}",
                    self.options.base_url
                ))
            })?;
            path.pop_if_empty().extend(segments);
            if let Some(segment) = last {
                path.push(segment);
            }
        }
        Ok(url)
    }

    fn get_records(
        &self,
        url: Url,
        token: &SpecBearerToken,
    ) -> Result<Vec<Map<String, Value>>, FleetApiError> {
        debug!(url = %url, "GET");
        let response = self
            .client
            .get(url.clone())
            .bearer_auth(token.expose())
            .send()
            .map_err(|err| FleetApiError::Transport(format!("{url}: {err}")))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FleetApiError::Unauthorized(format!("{url} -> {status}")));
        }
        if !status.is_success() {
            return Err(FleetApiError::Transport(format!("{url} -> {status}")));
        }

        let body: Value = response
            .json()
            .map_err(|err| FleetApiError::MalformedResponse(format!("{url}: {err}")))?;
        parse_record_list(body)
    }
}

impl FleetApi for HttpFleetApi {
    fn fetch_active_resources(
        &self,
        token: &SpecBearerToken,
    ) -> Result<Vec<Map<String, Value>>, FleetApiError> {
        let url = self.derive_url(&self.options.path_active_resources, None)?;
        self.get_records(url, token)
    }

    fn fetch_label(
        &self,
        label_id: &str,
        token: &SpecBearerToken,
    ) -> Result<Vec<Map<String, Value>>, FleetApiError> {
        let url = self.derive_url(&self.options.path_labels, Some(label_id))?;
        self.get_records(url, token)
    }
}

/// Interpret a response body as a list of JSON objects.
///
/// An object body (the API's error envelope) is rejected; a body whose
/// `error.code` is 401 is reported as [`FleetApiError::Unauthorized`].
pub fn parse_record_list(body: Value) -> Result<Vec<Map<String, Value>>, FleetApiError> {
    match body {
        Value::Array(l_items) => l_items
            .into_iter()
            .enumerate()
            .map(|(n_idx, item)| match item {
                Value::Object(map) => Ok(map),
                other => Err(FleetApiError::MalformedResponse(format!(
                    "item {n_idx} is not an object: {other}"
                ))),
            })
            .collect(),
        Value::Object(map) => {
            let n_code = map
                .get("error")
                .and_then(|err| err.get("code"))
                .and_then(Value::as_i64);
            if n_code == Some(401) {
                Err(FleetApiError::Unauthorized(Value::Object(map).to_string()))
            } else {
                Err(FleetApiError::MalformedResponse(format!(
                    "expected a list, got {}",
                    Value::Object(map)
                )))
            }
        }
        other => Err(FleetApiError::MalformedResponse(format!(
            "expected a list, got {other}"
        ))),
    }
}

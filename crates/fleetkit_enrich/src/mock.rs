//! In-memory [`FleetApi`] used by tests and offline runs.

use std::cell::Cell;
use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::api::FleetApi;
use crate::conf::C_KEY_LABEL_COLOR_CODE;
use crate::spec::{FleetApiError, SpecBearerToken};

/// Canned fleet API.
///
/// Unknown labels answer with an empty list; `with_label_error` and
/// `with_resources_error` simulate service failures.
#[derive(Debug, Default)]
pub struct MockFleetApi {
    l_resources: Vec<Map<String, Value>>,
    err_resources: Option<FleetApiError>,
    dict_labels: HashMap<String, Result<Vec<Map<String, Value>>, FleetApiError>>,
    cnt_label_calls: Cell<usize>,
}

impl MockFleetApi {
    /// Empty API: no resources, no labels.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `fetch_active_resources` with `resources`.
    pub fn with_resources(mut self, resources: Vec<Map<String, Value>>) -> Self {
        self.l_resources = resources;
        self
    }

    /// Fail `fetch_active_resources` with `err`.
    pub fn with_resources_error(mut self, err: FleetApiError) -> Self {
        self.err_resources = Some(err);
        self
    }

    /// Answer label `label_id` with one record carrying `color_code`.
    pub fn with_label_color(mut self, label_id: &str, color_code: &str) -> Self {
        let mut record = Map::new();
        record.insert(
            C_KEY_LABEL_COLOR_CODE.to_string(),
            Value::String(color_code.to_string()),
        );
        self.dict_labels
            .insert(label_id.to_string(), Ok(vec![record]));
        self
    }

    /// Fail label `label_id` with `err`.
    pub fn with_label_error(mut self, label_id: &str, err: FleetApiError) -> Self {
        self.dict_labels.insert(label_id.to_string(), Err(err));
        self
    }

    /// Number of `fetch_label` calls served so far.
    pub fn label_calls(&self) -> usize {
        self.cnt_label_calls.get()
    }
}

impl FleetApi for MockFleetApi {
    fn fetch_active_resources(
        &self,
        _token: &SpecBearerToken,
    ) -> Result<Vec<Map<String, Value>>, FleetApiError> {
        match &self.err_resources {
            Some(err) => Err(err.clone()),
            None => Ok(self.l_resources.clone()),
        }
    }

    fn fetch_label(
        &self,
        label_id: &str,
        _token: &SpecBearerToken,
    ) -> Result<Vec<Map<String, Value>>, FleetApiError> {
        self.cnt_label_calls.set(self.cnt_label_calls.get() + 1);
        self.dict_labels
            .get(label_id)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

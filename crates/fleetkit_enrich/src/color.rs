//! Per-pass label color resolver.

use std::collections::HashMap;

use fleetkit_table::EnumCellValue;
use serde_json::{Map, Value};
use tracing::warn;

use crate::api::FleetApi;
use crate::conf::C_KEY_LABEL_COLOR_CODE;
use crate::spec::SpecBearerToken;

/// Resolves label ids to color codes for one enrichment pass.
///
/// Every distinct id is looked up at most once; failures degrade to `None`
/// and are cached like successes.
pub struct ColorResolver<'a, A: FleetApi + ?Sized> {
    api: &'a A,
    token: &'a SpecBearerToken,
    dict_cache: HashMap<String, Option<String>>,
    cnt_lookups: usize,
}

impl<'a, A: FleetApi + ?Sized> ColorResolver<'a, A> {
    /// Bind a resolver to one API client and token.
    pub fn new(api: &'a A, token: &'a SpecBearerToken) -> Self {
        Self {
            api,
            token,
            dict_cache: HashMap::new(),
            cnt_lookups: 0,
        }
    }

    /// Resolve one label id. Blank or missing ids never hit the API.
    pub fn resolve(&mut self, label_id: Option<&str>) -> Option<String> {
        let c_label_id = label_id.map(str::trim).filter(|id| !id.is_empty())?;
        if let Some(color) = self.dict_cache.get(c_label_id) {
            return color.clone();
        }

        self.cnt_lookups += 1;
        let color = match self.api.fetch_label(c_label_id, self.token) {
            Ok(l_records) => {
                let color = derive_color_code(&l_records);
                if color.is_none() {
                    warn!(label_id = c_label_id, "label lookup returned no colorCode");
                }
                color
            }
            Err(err) => {
                warn!(label_id = c_label_id, error = %err, "label lookup failed");
                None
            }
        };

        self.dict_cache.insert(c_label_id.to_string(), color.clone());
        color
    }

    /// Resolve the primary label id held by a table cell.
    pub fn resolve_cell(&mut self, value: &EnumCellValue) -> Option<String> {
        let c_text = value.to_text()?;
        let c_label_id = derive_primary_label_id(&c_text)?;
        self.resolve(Some(c_label_id))
    }

    /// Number of lookups sent to the API (cache misses).
    pub fn lookup_count(&self) -> usize {
        self.cnt_lookups
    }
}

/// First non-empty id of a comma-separated label list (`"76,77"`, `"[76, 77]"`).
pub fn derive_primary_label_id(text: &str) -> Option<&str> {
    text.split(',')
        .map(|id| id.trim().trim_matches(|chr| matches!(chr, '[' | ']' | '"')).trim())
        .find(|id| !id.is_empty())
}

fn derive_color_code(records: &[Map<String, Value>]) -> Option<String> {
    records
        .first()?
        .get(C_KEY_LABEL_COLOR_CODE)?
        .as_str()
        .map(str::trim)
        .filter(|color| !color.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockFleetApi;
    use crate::spec::FleetApiError;

    #[test]
    fn resolve_skips_blank_ids_without_lookup() {
        let api = MockFleetApi::new();
        let token = SpecBearerToken::new("t");
        let mut resolver = ColorResolver::new(&api, &token);

        assert_eq!(resolver.resolve(None), None);
        assert_eq!(resolver.resolve(Some("   ")), None);
        assert_eq!(resolver.resolve_cell(&EnumCellValue::None), None);
        assert_eq!(api.label_calls(), 0);
    }

    #[test]
    fn resolve_caches_per_label_id() {
        let api = MockFleetApi::new().with_label_color("76", "#FF0000");
        let token = SpecBearerToken::new("t");
        let mut resolver = ColorResolver::new(&api, &token);

        assert_eq!(resolver.resolve(Some("76")), Some("#FF0000".to_string()));
        assert_eq!(
            resolver.resolve_cell(&EnumCellValue::Integer(76)),
            Some("#FF0000".to_string())
        );
        assert_eq!(resolver.lookup_count(), 1);
        assert_eq!(api.label_calls(), 1);
    }

    #[test]
    fn resolve_degrades_failures_to_none() {
        let api = MockFleetApi::new()
            .with_label_error("L1", FleetApiError::Transport("503".to_string()));
        let token = SpecBearerToken::new("t");
        let mut resolver = ColorResolver::new(&api, &token);

        assert_eq!(resolver.resolve(Some("L1")), None);
        assert_eq!(resolver.resolve(Some("L1")), None);
        assert_eq!(resolver.resolve(Some("unknown")), None);
        assert_eq!(api.label_calls(), 2);
    }

    #[test]
    fn derive_primary_label_id_takes_first_entry() {
        assert_eq!(derive_primary_label_id("76,77"), Some("76"));
        assert_eq!(derive_primary_label_id(" ,77"), Some("77"));
        assert_eq!(derive_primary_label_id("[76, 77]"), Some("76"));
        assert_eq!(derive_primary_label_id(" , "), None);
    }
}

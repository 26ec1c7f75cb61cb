//! Transport seam between the client pipeline and the orchestrator.

use tracing::warn;

use crate::api::FleetApi;
use crate::enrich::enrich;
use crate::spec::{EnumResponseStatus, SpecBearerToken, SpecEnrichOptions, SpecEnrichResponse};

/// "Send table bytes, receive a tagged result."
pub trait Transport {
    /// Submit one CSV upload.
    fn send(&self, table_bytes: &[u8]) -> SpecEnrichResponse;
}

/// In-process transport.
///
/// Runs [`enrich`] directly and passes the response through its JSON wire
/// form, so callers observe exactly what a remote transport would deliver.
pub struct LocalTransport<A: FleetApi> {
    api: A,
    token: SpecBearerToken,
    options: SpecEnrichOptions,
}

impl<A: FleetApi> LocalTransport<A> {
    /// Bind the orchestrator to an API client, token and options.
    pub fn new(api: A, token: SpecBearerToken, options: SpecEnrichOptions) -> Self {
        Self {
            api,
            token,
            options,
        }
    }
}

impl<A: FleetApi> Transport for LocalTransport<A> {
    fn send(&self, table_bytes: &[u8]) -> SpecEnrichResponse {
        let response = enrich(table_bytes, &self.api, &self.token, &self.options);
        let c_wire = match response.to_json() {
            Ok(c_wire) => c_wire,
            Err(err) => {
                warn!(error = %err, "failed to encode response envelope");
                return SpecEnrichResponse::failure(EnumResponseStatus::Error);
            }
        };
        SpecEnrichResponse::from_json(&c_wire).unwrap_or_else(|err| {
            warn!(error = %err, "failed to decode response envelope");
            SpecEnrichResponse::failure(EnumResponseStatus::Error)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockFleetApi;

    #[test]
    fn local_transport_delivers_success_payload() {
        let transport = LocalTransport::new(
            MockFleetApi::new(),
            SpecBearerToken::new("t"),
            SpecEnrichOptions::default(),
        );
        let response = transport.send(b"rnr;gruppe;hu\n1;A;2024-01-01\n");

        assert_eq!(response.status, EnumResponseStatus::Success);
        assert!(response.payload.is_some());
    }

    #[test]
    fn local_transport_delivers_parse_failures() {
        let transport = LocalTransport::new(
            MockFleetApi::new(),
            SpecBearerToken::new("t"),
            SpecEnrichOptions::default(),
        );
        let response = transport.send(b"\xff\xfe");
        assert_eq!(response.status, EnumResponseStatus::CsvParsingError);
        assert_eq!(response.payload, None);
    }
}

//! HTTP client for the flight search backend

use crate::config::Config;
use crate::{Airport, ErrorResponse, FlightError, FlightOffer, SearchRequest, SearchResponse};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

/// Message shown when the backend fails without saying why
pub const GENERIC_SEARCH_ERROR: &str = "Failed to fetch flights";

/// Response of `GET /health`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

/// Client for `/api/airports`, `/search-flights` and `/health`
#[derive(Clone)]
pub struct FlightClient {
    http_client: Client,
    config: Config,
}

impl FlightClient {
    pub fn new(config: Config) -> Result<Self, FlightError> {
        config.validate()?;
        debug!(base_url = %config.base_url, "Creating new flight client");
        let http_client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("flight-finder/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http_client, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fetch the static airport list
    #[instrument(level = "info", skip(self))]
    pub async fn airports(&self) -> Result<Vec<Airport>, FlightError> {
        let url = self.config.endpoint("/api/airports");
        let response = self.http_client.get(&url).send().await?.error_for_status()?;
        let airports: Vec<Airport> = response.json().await?;

        info!(airports = airports.len(), "Loaded airport list");
        Ok(airports)
    }

    /// Run a single one-way search
    #[instrument(level = "info", skip(self, request), fields(
        departure = %request.departure_id,
        arrival = %request.arrival_id,
        date = %request.outbound_date,
    ))]
    pub async fn search_flights(&self, request: &SearchRequest) -> Result<Vec<FlightOffer>, FlightError> {
        let url = self.config.endpoint("/search-flights");
        info!(url = %url, "Submitting flight search");

        let start_time = std::time::Instant::now();
        let response = self.http_client.post(&url).json(request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        info!(
            status = %status,
            duration_ms = start_time.elapsed().as_millis(),
            "Flight search completed"
        );

        if !status.is_success() {
            let err = server_error(status, &body);
            error!(status = %status, error = %err, "Flight search failed");
            return Err(err);
        }

        let parsed: SearchResponse = serde_json::from_str(&body)?;
        debug!(flights_found = parsed.flights.len(), "Parsed search response");
        Ok(parsed.flights)
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn health(&self) -> Result<HealthStatus, FlightError> {
        let url = self.config.endpoint("/health");
        let response = self.http_client.get(&url).send().await?.error_for_status()?;
        Ok(response.json().await?)
    }
}

/// Turn a non-2xx search response into an error carrying the server's message.
fn server_error(status: StatusCode, body: &str) -> FlightError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|r| r.error)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| GENERIC_SEARCH_ERROR.to_string());

    FlightError::Server {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flight_client_creation() {
        assert!(FlightClient::new(Config::default()).is_ok());

        let config = Config {
            base_url: "ftp://example.com".to_string(),
            ..Config::default()
        };
        assert!(FlightClient::new(config).is_err());
    }

    #[test]
    fn test_server_error_uses_backend_message() {
        let err = server_error(StatusCode::BAD_REQUEST, r#"{"error": "Invalid airport code"}"#);
        assert_eq!(err.to_string(), "Invalid airport code");
        assert!(matches!(err, FlightError::Server { status: 400, .. }));
    }

    #[test]
    fn test_server_error_falls_back_to_generic_message() {
        for body in ["", "<html>Bad gateway</html>", r#"{"error": ""}"#, r#"{"detail": "x"}"#] {
            let err = server_error(StatusCode::BAD_GATEWAY, body);
            assert_eq!(err.to_string(), GENERIC_SEARCH_ERROR);
        }
    }
}

//! # Flight Finder
//!
//! Page logic for a flight search site: a hero carousel, airport autocomplete,
//! and a two-step (outbound, then return) flight selection flow that renders
//! offers fetched from a `/search-flights` backend.
//!
//! The page itself is abstracted behind the [`Page`] trait so that the state
//! machine and the renderer can be driven from any event source.

pub mod app;
pub mod autocomplete;
pub mod carousel;
pub mod client;
pub mod config;
pub mod logging;
pub mod page;
pub mod render;
pub mod search;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// Re-export main types for convenience
pub use app::FlightApp;
pub use autocomplete::{AirportIndex, Autocomplete, AUTOCOMPLETE_LIMIT};
pub use carousel::{Carousel, SlideChange, CAROUSEL_INTERVAL};
pub use client::{FlightClient, HealthStatus};
pub use config::Config;
pub use page::{MemoryPage, Page};
pub use search::{SearchState, SearchingFor, SelectionOutcome};

/// Error types for the flight finder
#[derive(Error, Debug)]
pub enum FlightError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("Invalid value: {0}")]
    ParseError(String),

    #[error("Page is missing required elements: {}", .0.join(", "))]
    MissingElements(Vec<String>),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Trip type as used by the trip selector and the search backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TripType {
    #[default]
    RoundTrip,
    OneWay,
}

impl TripType {
    /// Code used by the form selector and the backend (`"1"` / `"2"`).
    pub fn code(self) -> &'static str {
        match self {
            TripType::RoundTrip => "1",
            TripType::OneWay => "2",
        }
    }
}

impl FromStr for TripType {
    type Err = FlightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" | "round-trip" | "roundtrip" => Ok(TripType::RoundTrip),
            "2" | "one-way" | "oneway" => Ok(TripType::OneWay),
            _ => Err(FlightError::ParseError(format!("Invalid trip type: {}", s))),
        }
    }
}

impl Serialize for TripType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

/// Cabin class codes understood by the search backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TravelClass {
    #[default]
    Economy,
    PremiumEconomy,
    Business,
    First,
}

impl TravelClass {
    pub fn code(self) -> &'static str {
        match self {
            TravelClass::Economy => "1",
            TravelClass::PremiumEconomy => "2",
            TravelClass::Business => "3",
            TravelClass::First => "4",
        }
    }
}

impl FromStr for TravelClass {
    type Err = FlightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" | "economy" => Ok(TravelClass::Economy),
            "2" | "premium-economy" | "premium_economy" => Ok(TravelClass::PremiumEconomy),
            "3" | "business" => Ok(TravelClass::Business),
            "4" | "first" => Ok(TravelClass::First),
            _ => Err(FlightError::ParseError(format!("Invalid travel class: {}", s))),
        }
    }
}

impl Serialize for TravelClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

/// Airport entry from `/api/airports`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Airport {
    pub code: String,
    pub city: String,
    pub name: String,
    pub country: String,
}

impl Airport {
    /// `query` must already be uppercased and trimmed.
    pub fn matches(&self, query: &str) -> bool {
        self.code.to_uppercase().starts_with(query)
            || self.city.to_uppercase().contains(query)
            || self.name.to_uppercase().contains(query)
    }
}

/// Search parameters captured from the search form
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    pub departure_id: String, // Airport code
    pub arrival_id: String,   // Airport code
    pub outbound_date: String,
    pub return_date: Option<String>,
    pub adults: u32,
    pub travel_class: TravelClass,
}

impl SearchParams {
    /// True when route and dates match. Passenger count and cabin are ignored.
    pub fn same_trip(&self, other: &SearchParams) -> bool {
        self.departure_id == other.departure_id
            && self.arrival_id == other.arrival_id
            && self.outbound_date == other.outbound_date
            && self.return_date == other.return_date
    }

    /// Parameters for the return leg: reversed route, departing on the return date.
    pub fn reversed(&self) -> SearchParams {
        SearchParams {
            departure_id: self.arrival_id.clone(),
            arrival_id: self.departure_id.clone(),
            outbound_date: self.return_date.clone().unwrap_or_default(),
            return_date: None,
            adults: self.adults,
            travel_class: self.travel_class,
        }
    }
}

/// Request body for `POST /search-flights`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRequest {
    pub departure_id: String,
    pub arrival_id: String,
    pub outbound_date: String,
    pub return_date: Option<String>,
    pub adults: String,
    pub travel_class: TravelClass,
    #[serde(rename = "type")]
    pub trip_type: TripType,
}

impl SearchRequest {
    /// Round trips are orchestrated client-side, so every request is one-way.
    pub fn one_way(params: &SearchParams) -> Self {
        Self {
            departure_id: params.departure_id.clone(),
            arrival_id: params.arrival_id.clone(),
            outbound_date: params.outbound_date.clone(),
            return_date: params.return_date.clone(),
            adults: params.adults.to_string(),
            travel_class: params.travel_class,
            trip_type: TripType::OneWay,
        }
    }
}

/// Departure or arrival point of an offer or leg
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AirportStop {
    pub id: Option<String>,
    pub name: Option<String>,
    pub time: Option<String>, // "YYYY-MM-DD HH:MM", local to the airport
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layover {
    pub id: Option<String>,
    pub name: Option<String>,
    pub duration: Option<u32>, // minutes
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarbonEmissions {
    pub this_flight: Option<f64>, // grams
    pub difference_percent: Option<f64>,
}

/// One flight segment of an offer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Leg {
    pub departure_airport: Option<AirportStop>,
    pub arrival_airport: Option<AirportStop>,
    pub duration: Option<u32>,
    pub airline: Option<String>,
    pub flight_number: Option<String>,
    pub airplane: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub overnight: bool,
}

/// Priced itinerary option returned by the search backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightOffer {
    pub airline: Option<String>,
    pub airline_logo: Option<String>,
    pub price: Option<f64>,
    pub duration: Option<u32>, // minutes
    pub stops: Option<u32>,
    #[serde(rename = "type")]
    pub offer_type: Option<String>,
    pub flight_number: Option<String>,
    pub departure_airport: Option<AirportStop>,
    pub arrival_airport: Option<AirportStop>,
    #[serde(deserialize_with = "null_as_default")]
    pub layovers: Vec<Layover>,
    #[serde(deserialize_with = "null_as_default")]
    pub extensions: Vec<String>,
    pub carbon_emissions: Option<CarbonEmissions>,
    #[serde(deserialize_with = "null_as_default")]
    pub all_flights: Vec<Leg>,
}

impl FlightOffer {
    /// Legs to display. An offer without `all_flights` is shown as a single leg.
    pub fn legs(&self) -> Vec<Leg> {
        if !self.all_flights.is_empty() {
            return self.all_flights.clone();
        }

        vec![Leg {
            departure_airport: self.departure_airport.clone(),
            arrival_airport: self.arrival_airport.clone(),
            duration: self.duration,
            airline: self.airline.clone(),
            flight_number: self.flight_number.clone(),
            airplane: None,
            overnight: false,
        }]
    }

    /// Price used for totals; a missing price counts as zero.
    pub fn price_or_zero(&self) -> f64 {
        self.price.unwrap_or(0.0)
    }
}

/// Successful `/search-flights` response
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub flights: Vec<FlightOffer>,
}

/// Error body returned with non-2xx statuses
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ErrorResponse {
    pub error: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl fmt::Display for SearchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} on {}", self.departure_id, self.arrival_id, self.outbound_date)?;
        if let Some(ref return_date) = self.return_date {
            write!(f, " (return {})", return_date)?;
        }
        Ok(())
    }
}

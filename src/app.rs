//! Event handlers binding the page to the search state machine
//!
//! [`FlightApp`] owns every piece of mutable state: the page, the search
//! state, the last rendered offers and the carousel position. Each `on_*`
//! method corresponds to one page event.

use crate::autocomplete::{AirportIndex, Autocomplete};
use crate::carousel::{slide_ticker, Carousel, SlideChange};
use crate::client::FlightClient;
use crate::page::{ids, Page};
use crate::render;
use crate::search::{SearchState, SelectionOutcome};
use crate::{FlightError, FlightOffer, SearchParams, TripType};
use tokio::time::Interval;
use tracing::{debug, info, warn};

/// Which airport input an autocomplete event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AirportField {
    Departure,
    Arrival,
}

pub struct FlightApp<P: Page> {
    page: P,
    client: FlightClient,
    airports: AirportIndex,
    departure: Autocomplete,
    arrival: Autocomplete,
    carousel: Carousel,
    state: SearchState,
    results: Vec<FlightOffer>,
}

impl<P: Page> FlightApp<P> {
    pub fn new(page: P, client: FlightClient, slide_count: usize) -> Self {
        Self {
            page,
            client,
            airports: AirportIndex::default(),
            departure: Autocomplete::departure(),
            arrival: Autocomplete::arrival(),
            carousel: Carousel::new(slide_count),
            state: SearchState::new(),
            results: Vec::new(),
        }
    }

    /// Page load: fetch airports and sync with the trip selector's current value.
    pub async fn start(page: P, client: FlightClient, slide_count: usize) -> Self {
        let airports = AirportIndex::load(&client).await;
        let mut app = Self::new(page, client, slide_count).with_airports(airports);
        let trip_type = app.page.value(ids::TRIP_TYPE_SELECT);
        app.on_trip_type_change(&trip_type);
        info!(slides = slide_count, airports = app.airports.len(), "Flight search page ready");
        app
    }

    pub fn with_airports(mut self, airports: AirportIndex) -> Self {
        self.airports = airports;
        self
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut P {
        &mut self.page
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    /// Offers currently rendered with select buttons
    pub fn results(&self) -> &[FlightOffer] {
        &self.results
    }

    pub fn into_page(self) -> P {
        self.page
    }

    /// Trip selector changed. `"2"` (one way) hides the return date field;
    /// anything else is treated as a round trip.
    pub fn on_trip_type_change(&mut self, value: &str) {
        let trip_type = value.parse::<TripType>().unwrap_or_default();
        self.page.set_value(ids::TRIP_TYPE_SELECT, trip_type.code());
        self.page.set_hidden(ids::RETURN_FIELD, trip_type == TripType::OneWay);
        self.state.set_trip_type(trip_type);
        self.clear_view();
        debug!(trip_type = ?trip_type, "Trip type changed");
    }

    pub fn on_clear_itinerary(&mut self) {
        self.state.reset();
        self.clear_view();
    }

    pub fn on_input(&mut self, field: AirportField, text: &str) -> usize {
        let autocomplete = self.autocomplete(field).clone();
        self.page.set_value(autocomplete.input_id(), text);
        autocomplete.on_input(&mut self.page, &self.airports, text)
    }

    pub fn on_airport_select(&mut self, field: AirportField, code: &str) {
        let autocomplete = self.autocomplete(field).clone();
        autocomplete.on_select(&mut self.page, code);
    }

    /// Document-wide click; every autocomplete decides for itself whether to close.
    pub fn on_document_click(&mut self, target: Option<&str>) {
        self.departure.on_document_click(&mut self.page, target);
        self.arrival.on_document_click(&mut self.page, target);
    }

    pub fn on_carousel_tick(&mut self) -> Option<SlideChange> {
        let change = self.carousel.tick()?;
        change.apply(&mut self.page);
        Some(change)
    }

    /// Timer driving [`Self::on_carousel_tick`], paced by the configured carousel interval.
    pub fn carousel_ticker(&self) -> Interval {
        slide_ticker(self.client.config().carousel_interval)
    }

    /// Form submitted (also used by the "Search Return Flights" button).
    ///
    /// Failures are rendered as an inline error panel. Returns the number of
    /// offers shown, or `None` when the search failed.
    pub async fn on_submit(&mut self) -> Option<usize> {
        let form = match self.read_form() {
            Ok(form) => form,
            Err(e) => {
                warn!(error = %e, "Invalid search form");
                self.page.set_html(ids::FLIGHT_RESULTS, render::error_panel(&e.to_string()));
                return None;
            }
        };

        let prepared = self.state.prepare_search(form);
        if prepared.started_over {
            self.clear_view();
        }

        self.page.set_hidden(ids::LOADING_INDICATOR, false);
        self.page.set_html(ids::FLIGHT_RESULTS, String::new());
        self.results.clear();

        // No early returns until the loading indicator is hidden again
        let shown = match self.client.search_flights(&prepared.request).await {
            Ok(flights) => Some(self.show_flights(flights)),
            Err(e) => {
                warn!(error = %e, "Showing search error");
                self.page.set_html(ids::FLIGHT_RESULTS, render::error_panel(&e.to_string()));
                None
            }
        };

        self.page.set_hidden(ids::LOADING_INDICATOR, true);
        shown
    }

    /// Render offers for selection; returns how many were rendered.
    pub fn show_flights(&mut self, flights: Vec<FlightOffer>) -> usize {
        let html = render::flight_results(&flights, self.state.searching_for());
        self.page.set_html(ids::FLIGHT_RESULTS, html);
        self.results = flights;
        self.results.len()
    }

    /// Select button of the offer at `index` in the current results.
    pub fn on_select_flight(&mut self, index: usize) -> Result<SelectionOutcome, FlightError> {
        let flight = self.results.get(index).cloned().ok_or_else(|| {
            FlightError::ParseError(format!(
                "No flight at position {} ({} shown)",
                index,
                self.results.len()
            ))
        })?;

        let outcome = self.state.select_flight(flight);
        let panel = match &outcome {
            SelectionOutcome::AwaitingReturn => {
                self.show_itinerary(None);
                render::return_prompt()
            }
            SelectionOutcome::OneWayComplete => {
                self.show_itinerary(None);
                render::one_way_complete()
            }
            SelectionOutcome::RoundTripComplete {
                return_flight,
                total,
            } => {
                self.show_itinerary(Some(return_flight));
                info!(total, "Round trip itinerary complete");
                render::round_trip_complete(*total)
            }
        };
        self.page.set_html(ids::FLIGHT_RESULTS, panel);
        self.results.clear();
        Ok(outcome)
    }

    /// Read the search form the way the page submits it.
    pub fn read_form(&self) -> Result<SearchParams, FlightError> {
        let adults = self.page.value(ids::ADULTS_SELECT);
        let adults = adults
            .trim()
            .parse::<u32>()
            .map_err(|_| FlightError::ParseError(format!("Invalid number of adults: {}", adults)))?;
        let return_date = self.page.value(ids::RETURN_DATE);

        Ok(SearchParams {
            departure_id: self.page.value(ids::DEPARTURE_INPUT).trim().to_uppercase(),
            arrival_id: self.page.value(ids::ARRIVAL_INPUT).trim().to_uppercase(),
            outbound_date: self.page.value(ids::DEPARTURE_DATE),
            return_date: Some(return_date).filter(|d| !d.trim().is_empty()),
            adults,
            travel_class: self.page.value(ids::CLASS_SELECT).parse()?,
        })
    }

    fn autocomplete(&self, field: AirportField) -> &Autocomplete {
        match field {
            AirportField::Departure => &self.departure,
            AirportField::Arrival => &self.arrival,
        }
    }

    fn show_itinerary(&mut self, return_flight: Option<&FlightOffer>) {
        let html = render::itinerary(self.state.outbound_selected(), return_flight);
        self.page.set_hidden(ids::ITINERARY_SECTION, false);
        self.page.set_html(ids::SELECTED_FLIGHTS, html);
    }

    fn clear_view(&mut self) {
        self.page.set_hidden(ids::ITINERARY_SECTION, true);
        self.page.set_html(ids::SELECTED_FLIGHTS, String::new());
        self.page.set_html(ids::FLIGHT_RESULTS, String::new());
        self.results.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autocomplete::tests::sample_airports;
    use crate::config::Config;
    use crate::page::MemoryPage;
    use crate::search::SearchingFor;
    use std::time::Duration;

    fn app() -> FlightApp<MemoryPage> {
        // Nothing listens on port 9, so searches fail fast
        let config = Config {
            base_url: "http://127.0.0.1:9".to_string(),
            ..Config::default()
        };
        let client = FlightClient::new(config).unwrap();
        FlightApp::new(MemoryPage::new(3), client, 3)
            .with_airports(AirportIndex::new(sample_airports()))
    }

    fn fill_form(app: &mut FlightApp<MemoryPage>, return_date: &str) {
        let page = app.page_mut();
        page.set_value(ids::DEPARTURE_INPUT, " yyz ");
        page.set_value(ids::ARRIVAL_INPUT, "lax");
        page.set_value(ids::DEPARTURE_DATE, "2025-12-20");
        page.set_value(ids::RETURN_DATE, return_date);
    }

    fn priced(price: f64) -> FlightOffer {
        FlightOffer {
            price: Some(price),
            airline: Some("Air Canada".to_string()),
            ..FlightOffer::default()
        }
    }

    #[test]
    fn test_read_form_normalizes_values() {
        let mut app = app();
        fill_form(&mut app, "");
        let form = app.read_form().unwrap();

        assert_eq!(form.departure_id, "YYZ");
        assert_eq!(form.arrival_id, "LAX");
        assert_eq!(form.return_date, None);
        assert_eq!(form.adults, 1);
    }

    #[test]
    fn test_read_form_rejects_bad_adults() {
        let mut app = app();
        app.page_mut().set_value(ids::ADULTS_SELECT, "many");
        assert!(matches!(app.read_form(), Err(FlightError::ParseError(_))));
    }

    #[test]
    fn test_trip_type_toggles_return_field() {
        let mut app = app();
        app.on_trip_type_change("2");
        assert!(app.page().is_hidden(ids::RETURN_FIELD));
        assert!(!app.state().is_round_trip());

        app.on_trip_type_change("1");
        assert!(!app.page().is_hidden(ids::RETURN_FIELD));
        assert!(app.state().is_round_trip());
    }

    #[test]
    fn test_round_trip_selection_flow() {
        let mut app = app();
        fill_form(&mut app, "2025-12-27");
        let form = app.read_form().unwrap();
        app.state.prepare_search(form);
        app.show_flights(vec![priced(120.0), priced(180.0)]);

        assert_eq!(app.on_select_flight(0).unwrap(), SelectionOutcome::AwaitingReturn);
        assert_eq!(app.state().searching_for(), SearchingFor::Return);
        assert!(!app.page().is_hidden(ids::ITINERARY_SECTION));
        assert!(app.page().html(ids::FLIGHT_RESULTS).contains("Search Return Flights"));
        assert!(app.results().is_empty());

        app.show_flights(vec![priced(95.0)]);
        assert!(app.page().html(ids::FLIGHT_RESULTS).contains("Select Return"));
        app.on_select_flight(0).unwrap();

        let itinerary = app.page().html(ids::SELECTED_FLIGHTS);
        assert!(itinerary.contains(">Outbound<"));
        assert!(itinerary.contains(">Return<"));
        assert!(app.page().html(ids::FLIGHT_RESULTS).contains("Total: $215"));
    }

    #[test]
    fn test_select_out_of_range() {
        let mut app = app();
        assert!(app.on_select_flight(0).is_err());
    }

    #[test]
    fn test_clear_itinerary_resets_everything() {
        let mut app = app();
        fill_form(&mut app, "2025-12-27");
        let form = app.read_form().unwrap();
        app.state.prepare_search(form);
        app.show_flights(vec![priced(120.0)]);
        app.on_select_flight(0).unwrap();

        app.on_clear_itinerary();
        assert_eq!(app.state().searching_for(), SearchingFor::Outbound);
        assert!(app.state().outbound_selected().is_none());
        assert!(app.page().is_hidden(ids::ITINERARY_SECTION));
        assert_eq!(app.page().html(ids::SELECTED_FLIGHTS), "");
        assert_eq!(app.page().html(ids::FLIGHT_RESULTS), "");
    }

    #[test]
    fn test_autocomplete_events() {
        let mut app = app();
        assert_eq!(app.on_input(AirportField::Departure, "toronto"), 2);
        assert_eq!(app.page().value(ids::DEPARTURE_INPUT), "toronto");

        app.on_airport_select(AirportField::Departure, "YYZ");
        assert_eq!(app.page().value(ids::DEPARTURE_INPUT), "YYZ");
        assert!(app.page().is_hidden(ids::DEPARTURE_DROPDOWN));

        app.on_input(AirportField::Arrival, "lon");
        app.on_document_click(Some(ids::ARRIVAL_INPUT));
        assert!(!app.page().is_hidden(ids::ARRIVAL_DROPDOWN));
        app.on_document_click(Some(ids::FLIGHT_RESULTS));
        assert!(app.page().is_hidden(ids::ARRIVAL_DROPDOWN));
    }

    #[test]
    fn test_carousel_tick_updates_page() {
        let mut app = app();
        app.on_carousel_tick();
        app.on_carousel_tick();
        assert_eq!(app.page().visible_slide(), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_carousel_ticker_advances_slides_every_interval() {
        let mut app = app();
        let mut ticker = app.carousel_ticker();
        let started = tokio::time::Instant::now();

        let early = tokio::time::timeout(Duration::from_millis(4999), ticker.tick()).await;
        assert!(early.is_err());
        assert_eq!(app.page().visible_slide(), Some(0));

        ticker.tick().await;
        app.on_carousel_tick();
        assert!(started.elapsed() >= crate::CAROUSEL_INTERVAL);
        assert_eq!(app.page().visible_slide(), Some(1));

        ticker.tick().await;
        app.on_carousel_tick();
        assert!(started.elapsed() >= crate::CAROUSEL_INTERVAL * 2);
        assert_eq!(app.page().visible_slide(), Some(2));
    }

    #[tokio::test]
    async fn test_failed_search_renders_error_and_hides_loading() {
        let mut app = app();
        fill_form(&mut app, "");

        assert_eq!(app.on_submit().await, None);
        assert!(app.page().is_hidden(ids::LOADING_INDICATOR));
        assert!(app.page().html(ids::FLIGHT_RESULTS).contains("Error:"));
    }

    #[tokio::test]
    async fn test_invalid_form_renders_error() {
        let mut app = app();
        app.page_mut().set_value(ids::CLASS_SELECT, "9");

        assert_eq!(app.on_submit().await, None);
        assert!(app.page().html(ids::FLIGHT_RESULTS).contains("Invalid travel class"));
        assert!(app.page().is_hidden(ids::LOADING_INDICATOR));
    }
}

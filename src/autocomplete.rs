//! Airport autocomplete for the departure and arrival inputs

use crate::client::FlightClient;
use crate::page::{ids, Page};
use crate::{render, Airport};
use tracing::{debug, error, info};

/// Maximum suggestions shown in a dropdown
pub const AUTOCOMPLETE_LIMIT: usize = 8;

/// Read-only airport lookup table, loaded once
#[derive(Debug, Clone, Default)]
pub struct AirportIndex {
    airports: Vec<Airport>,
}

impl AirportIndex {
    pub fn new(airports: Vec<Airport>) -> Self {
        Self { airports }
    }

    /// Fetch the airport list. Failures are logged and leave the index empty.
    pub async fn load(client: &FlightClient) -> Self {
        match client.airports().await {
            Ok(airports) => {
                info!(airports = airports.len(), "Airport autocomplete ready");
                Self::new(airports)
            }
            Err(e) => {
                error!(error = %e, "Failed to load airports, autocomplete disabled");
                Self::default()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.airports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.airports.is_empty()
    }

    /// Airports whose code starts with, or whose city or name contains, the
    /// query (case-insensitive). At most [`AUTOCOMPLETE_LIMIT`] results, in list order.
    pub fn search(&self, text: &str) -> Vec<&Airport> {
        let query = normalize_query(text);
        if query.is_empty() {
            return Vec::new();
        }
        self.airports
            .iter()
            .filter(|airport| airport.matches(&query))
            .take(AUTOCOMPLETE_LIMIT)
            .collect()
    }
}

pub fn normalize_query(text: &str) -> String {
    text.trim().to_uppercase()
}

/// One input/dropdown pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Autocomplete {
    input_id: &'static str,
    dropdown_id: &'static str,
}

impl Autocomplete {
    pub const fn new(input_id: &'static str, dropdown_id: &'static str) -> Self {
        Self {
            input_id,
            dropdown_id,
        }
    }

    pub const fn departure() -> Self {
        Self::new(ids::DEPARTURE_INPUT, ids::DEPARTURE_DROPDOWN)
    }

    pub const fn arrival() -> Self {
        Self::new(ids::ARRIVAL_INPUT, ids::ARRIVAL_DROPDOWN)
    }

    pub fn input_id(&self) -> &'static str {
        self.input_id
    }

    pub fn dropdown_id(&self) -> &'static str {
        self.dropdown_id
    }

    /// Refresh the dropdown for the text typed so far. Returns the number of suggestions shown.
    pub fn on_input<P: Page + ?Sized>(&self, page: &mut P, index: &AirportIndex, text: &str) -> usize {
        let matches = index.search(text);
        debug!(input = self.input_id, query = text, matches = matches.len(), "Autocomplete input");

        if matches.is_empty() {
            page.set_hidden(self.dropdown_id, true);
            return 0;
        }

        page.set_html(self.dropdown_id, render::airport_dropdown(&matches));
        page.set_hidden(self.dropdown_id, false);
        matches.len()
    }

    pub fn on_select<P: Page + ?Sized>(&self, page: &mut P, code: &str) {
        page.set_value(self.input_id, code);
        page.set_hidden(self.dropdown_id, true);
    }

    /// Document-wide click. `target` is the ID of the clicked element or of
    /// its nearest ancestor carrying one of the known IDs.
    pub fn on_document_click<P: Page + ?Sized>(&self, page: &mut P, target: Option<&str>) {
        if target != Some(self.input_id) && target != Some(self.dropdown_id) {
            page.set_hidden(self.dropdown_id, true);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::page::MemoryPage;

    pub(crate) fn sample_airports() -> Vec<Airport> {
        let rows = [
            ("JFK", "New York", "John F. Kennedy International", "United States"),
            ("LGA", "New York", "LaGuardia", "United States"),
            ("EWR", "Newark", "Newark Liberty International", "United States"),
            ("LAX", "Los Angeles", "Los Angeles International", "United States"),
            ("YYZ", "Toronto", "Toronto Pearson International", "Canada"),
            ("YTZ", "Toronto", "Billy Bishop Toronto City", "Canada"),
            ("LHR", "London", "Heathrow", "United Kingdom"),
            ("LGW", "London", "Gatwick", "United Kingdom"),
            ("NRT", "Tokyo", "Narita International", "Japan"),
            ("HND", "Tokyo", "Haneda", "Japan"),
            ("SYD", "Sydney", "Kingsford Smith", "Australia"),
            ("ORD", "Chicago", "O'Hare International", "United States"),
        ];
        rows.iter()
            .map(|(code, city, name, country)| Airport {
                code: code.to_string(),
                city: city.to_string(),
                name: name.to_string(),
                country: country.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_search_results_are_capped_and_match() {
        let index = AirportIndex::new(sample_airports());

        for query in ["a", "n", "int", "L", "toronto", " yy ", "x", "new york"] {
            let results = index.search(query);
            let normalized = normalize_query(query);
            assert!(results.len() <= AUTOCOMPLETE_LIMIT, "query {:?}", query);
            for airport in results {
                assert!(
                    airport.code.starts_with(&normalized)
                        || airport.city.to_uppercase().contains(&normalized)
                        || airport.name.to_uppercase().contains(&normalized),
                    "{:?} does not match {:?}",
                    airport.code,
                    query
                );
            }
        }
    }

    #[test]
    fn test_search_cap_applies() {
        // Every sample airport has an "N" somewhere in its city or name
        let index = AirportIndex::new(sample_airports());
        assert_eq!(index.search("n").len(), AUTOCOMPLETE_LIMIT);
    }

    #[test]
    fn test_code_matches_by_prefix_only() {
        let index = AirportIndex::new(sample_airports());
        let codes: Vec<_> = index.search("yz").iter().map(|a| a.code.as_str()).collect();
        assert!(codes.is_empty());

        let codes: Vec<_> = index.search("yt").iter().map(|a| a.code.as_str()).collect();
        assert_eq!(codes, vec!["YTZ"]);
    }

    #[test]
    fn test_blank_query_hides_dropdown() {
        let index = AirportIndex::new(sample_airports());
        let mut page = MemoryPage::new(0);
        let departure = Autocomplete::departure();

        assert_eq!(departure.on_input(&mut page, &index, "tok"), 2);
        assert!(!page.is_hidden(ids::DEPARTURE_DROPDOWN));
        assert!(page.html(ids::DEPARTURE_DROPDOWN).contains("NRT"));

        assert_eq!(departure.on_input(&mut page, &index, "   "), 0);
        assert!(page.is_hidden(ids::DEPARTURE_DROPDOWN));

        departure.on_input(&mut page, &index, "tok");
        assert_eq!(departure.on_input(&mut page, &index, "zzz"), 0);
        assert!(page.is_hidden(ids::DEPARTURE_DROPDOWN));
    }

    #[test]
    fn test_empty_index_shows_nothing() {
        let mut page = MemoryPage::new(0);
        assert_eq!(Autocomplete::arrival().on_input(&mut page, &AirportIndex::default(), "LAX"), 0);
        assert!(page.is_hidden(ids::ARRIVAL_DROPDOWN));
    }

    #[test]
    fn test_select_writes_code() {
        let index = AirportIndex::new(sample_airports());
        let mut page = MemoryPage::new(0);
        let arrival = Autocomplete::arrival();

        arrival.on_input(&mut page, &index, "lon");
        arrival.on_select(&mut page, "LHR");

        assert_eq!(page.value(ids::ARRIVAL_INPUT), "LHR");
        assert!(page.is_hidden(ids::ARRIVAL_DROPDOWN));
    }

    #[test]
    fn test_outside_click_dismisses_each_instance_independently() {
        let index = AirportIndex::new(sample_airports());
        let mut page = MemoryPage::new(0);
        let departure = Autocomplete::departure();
        let arrival = Autocomplete::arrival();

        departure.on_input(&mut page, &index, "new");
        arrival.on_input(&mut page, &index, "lon");

        // Click inside the departure dropdown: only arrival closes
        for autocomplete in [&departure, &arrival] {
            autocomplete.on_document_click(&mut page, Some(ids::DEPARTURE_DROPDOWN));
        }
        assert!(!page.is_hidden(ids::DEPARTURE_DROPDOWN));
        assert!(page.is_hidden(ids::ARRIVAL_DROPDOWN));

        for autocomplete in [&departure, &arrival] {
            autocomplete.on_document_click(&mut page, None);
        }
        assert!(page.is_hidden(ids::DEPARTURE_DROPDOWN));
    }
}

//! Page abstraction
//!
//! Handlers never touch a real DOM; they go through [`Page`]. [`MemoryPage`]
//! is the in-process implementation used by the CLI session and the tests,
//! and can be seeded from an HTML document parsed with `scraper`.

use crate::FlightError;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;

/// Element IDs the page logic depends on
pub mod ids {
    pub const TRIP_TYPE_SELECT: &str = "tripTypeSelect";
    pub const RETURN_FIELD: &str = "returnField";
    pub const ITINERARY_SECTION: &str = "itinerarySection";
    pub const SELECTED_FLIGHTS: &str = "selectedFlights";
    pub const CLEAR_ITINERARY: &str = "clearItinerary";
    pub const SEARCH_FORM: &str = "flightSearchForm";
    pub const LOADING_INDICATOR: &str = "loadingIndicator";
    pub const FLIGHT_RESULTS: &str = "flightResults";
    pub const DEPARTURE_INPUT: &str = "departureInput";
    pub const DEPARTURE_DROPDOWN: &str = "departureDropdown";
    pub const ARRIVAL_INPUT: &str = "arrivalInput";
    pub const ARRIVAL_DROPDOWN: &str = "arrivalDropdown";
    pub const DEPARTURE_DATE: &str = "departureDate";
    pub const RETURN_DATE: &str = "returnDate";
    pub const ADULTS_SELECT: &str = "adultsSelect";
    pub const CLASS_SELECT: &str = "classSelect";

    pub const REQUIRED: &[&str] = &[
        TRIP_TYPE_SELECT,
        RETURN_FIELD,
        ITINERARY_SECTION,
        SELECTED_FLIGHTS,
        CLEAR_ITINERARY,
        SEARCH_FORM,
        LOADING_INDICATOR,
        FLIGHT_RESULTS,
        DEPARTURE_INPUT,
        DEPARTURE_DROPDOWN,
        ARRIVAL_INPUT,
        ARRIVAL_DROPDOWN,
        DEPARTURE_DATE,
        RETURN_DATE,
        ADULTS_SELECT,
        CLASS_SELECT,
    ];
}

/// Class carried by carousel slides
pub const SLIDE_CLASS: &str = "hero-slide";

/// Operations the page logic performs on the document
pub trait Page {
    /// Replace an element's inner HTML
    fn set_html(&mut self, id: &str, html: String);
    /// Add or remove the `hidden` class
    fn set_hidden(&mut self, id: &str, hidden: bool);
    /// Current value of a form control; empty when unknown
    fn value(&self, id: &str) -> String;
    fn set_value(&mut self, id: &str, value: &str);
    fn set_slide_opacity(&mut self, index: usize, opacity: f32);
}

#[derive(Debug, Clone, Default, PartialEq)]
struct ElementState {
    html: String,
    value: String,
    hidden: bool,
}

/// In-memory page keyed by element ID
#[derive(Debug, Clone, Default)]
pub struct MemoryPage {
    elements: HashMap<String, ElementState>,
    slides: Vec<f32>,
}

impl MemoryPage {
    /// Page in its initial state: overlays hidden, round trip selected,
    /// one adult in economy, first slide visible.
    pub fn new(slide_count: usize) -> Self {
        let mut page = Self::default();
        for id in ids::REQUIRED {
            page.elements.insert(id.to_string(), ElementState::default());
        }
        for id in [
            ids::DEPARTURE_DROPDOWN,
            ids::ARRIVAL_DROPDOWN,
            ids::LOADING_INDICATOR,
            ids::ITINERARY_SECTION,
        ] {
            page.set_hidden(id, true);
        }
        page.set_value(ids::TRIP_TYPE_SELECT, "1");
        page.set_value(ids::ADULTS_SELECT, "1");
        page.set_value(ids::CLASS_SELECT, "1");
        page.slides = initial_slides(slide_count);
        page
    }

    /// Seed a page from an HTML document, keeping its initial values and `hidden` classes.
    pub fn from_document(html: &str) -> Result<Self, FlightError> {
        let report = verify_document(html)?;
        let document = Html::parse_document(html);
        let mut page = Self::default();

        for id in ids::REQUIRED {
            let selector = id_selector(id)?;
            if let Some(element) = document.select(&selector).next() {
                page.elements.insert(id.to_string(), element_state(&element)?);
            }
        }
        page.slides = initial_slides(report.slide_count);
        Ok(page)
    }

    pub fn html(&self, id: &str) -> &str {
        self.elements.get(id).map(|e| e.html.as_str()).unwrap_or("")
    }

    pub fn is_hidden(&self, id: &str) -> bool {
        self.elements.get(id).map(|e| e.hidden).unwrap_or(false)
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    pub fn slide_opacity(&self, index: usize) -> Option<f32> {
        self.slides.get(index).copied()
    }

    /// Index of the first fully opaque slide
    pub fn visible_slide(&self) -> Option<usize> {
        self.slides.iter().position(|&opacity| opacity >= 1.0)
    }
}

impl Page for MemoryPage {
    fn set_html(&mut self, id: &str, html: String) {
        self.elements.entry(id.to_string()).or_default().html = html;
    }

    fn set_hidden(&mut self, id: &str, hidden: bool) {
        self.elements.entry(id.to_string()).or_default().hidden = hidden;
    }

    fn value(&self, id: &str) -> String {
        self.elements.get(id).map(|e| e.value.clone()).unwrap_or_default()
    }

    fn set_value(&mut self, id: &str, value: &str) {
        self.elements.entry(id.to_string()).or_default().value = value.to_string();
    }

    fn set_slide_opacity(&mut self, index: usize, opacity: f32) {
        if let Some(slide) = self.slides.get_mut(index) {
            *slide = opacity;
        }
    }
}

/// Result of checking a document against the element contract
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentReport {
    pub slide_count: usize,
}

/// Check that every required element ID exists and count the carousel slides.
pub fn verify_document(html: &str) -> Result<DocumentReport, FlightError> {
    let document = Html::parse_document(html);

    let mut missing = Vec::new();
    for id in ids::REQUIRED {
        if document.select(&id_selector(id)?).next().is_none() {
            missing.push(id.to_string());
        }
    }
    if !missing.is_empty() {
        return Err(FlightError::MissingElements(missing));
    }

    let slide_selector = Selector::parse(&format!(".{}", SLIDE_CLASS))
        .map_err(|e| FlightError::ParseError(format!("Invalid slide selector: {}", e)))?;
    let slide_count = document.select(&slide_selector).count();

    Ok(DocumentReport { slide_count })
}

fn id_selector(id: &str) -> Result<Selector, FlightError> {
    Selector::parse(&format!("#{}", id))
        .map_err(|e| FlightError::ParseError(format!("Invalid selector for #{}: {}", id, e)))
}

fn element_state(element: &ElementRef) -> Result<ElementState, FlightError> {
    let hidden = element.value().classes().any(|c| c == "hidden");
    let value = match element.value().name() {
        "input" => element.value().attr("value").unwrap_or("").to_string(),
        "select" => selected_option(element)?,
        _ => String::new(),
    };

    Ok(ElementState {
        html: element.inner_html(),
        value,
        hidden,
    })
}

/// Value of the `selected` option, or the first option like a browser would pick.
fn selected_option(select: &ElementRef) -> Result<String, FlightError> {
    let options = Selector::parse("option")
        .map_err(|e| FlightError::ParseError(format!("Invalid option selector: {}", e)))?;

    let mut first = None;
    for option in select.select(&options) {
        let value = option
            .value()
            .attr("value")
            .map(str::to_string)
            .unwrap_or_else(|| option.text().collect::<String>().trim().to_string());
        if option.value().attr("selected").is_some() {
            return Ok(value);
        }
        first.get_or_insert(value);
    }
    Ok(first.unwrap_or_default())
}

fn initial_slides(count: usize) -> Vec<f32> {
    (0..count).map(|i| if i == 0 { 1.0 } else { 0.0 }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_DOCUMENT: &str = r#"
        <html><body>
          <div class="hero-slide"></div><div class="hero-slide"></div><div class="hero-slide"></div>
          <form id="flightSearchForm">
            <select id="tripTypeSelect"><option value="1">Round trip</option><option value="2" selected>One way</option></select>
            <input id="departureInput" value=" jfk "><div id="departureDropdown" class="hidden"></div>
            <input id="arrivalInput"><div id="arrivalDropdown" class="hidden"></div>
            <input id="departureDate" type="date" value="2025-12-20">
            <div id="returnField"><input id="returnDate" type="date"></div>
            <select id="adultsSelect"><option value="1">1</option><option value="2">2</option></select>
            <select id="classSelect"><option value="1">Economy</option></select>
            <button type="submit">Search</button>
          </form>
          <div id="loadingIndicator" class="flex hidden"></div>
          <div id="flightResults"></div>
          <section id="itinerarySection" class="hidden">
            <div id="selectedFlights"></div><button id="clearItinerary">Clear</button>
          </section>
        </body></html>
    "#;

    #[test]
    fn test_verify_document_counts_slides() {
        let report = verify_document(SAMPLE_DOCUMENT).unwrap();
        assert_eq!(report.slide_count, 3);
    }

    #[test]
    fn test_verify_document_reports_missing_ids() {
        let html = SAMPLE_DOCUMENT.replace(r#"id="clearItinerary""#, "");
        match verify_document(&html) {
            Err(FlightError::MissingElements(missing)) => {
                assert_eq!(missing, vec!["clearItinerary".to_string()])
            }
            other => panic!("expected missing elements, got {:?}", other),
        }
    }

    #[test]
    fn test_from_document_reads_initial_state() {
        let page = MemoryPage::from_document(SAMPLE_DOCUMENT).unwrap();

        assert_eq!(page.value(ids::TRIP_TYPE_SELECT), "2");
        assert_eq!(page.value(ids::ADULTS_SELECT), "1");
        assert_eq!(page.value(ids::DEPARTURE_INPUT), " jfk ");
        assert_eq!(page.value(ids::DEPARTURE_DATE), "2025-12-20");
        assert!(page.is_hidden(ids::LOADING_INDICATOR));
        assert!(!page.is_hidden(ids::RETURN_FIELD));
        assert_eq!(page.visible_slide(), Some(0));
        assert_eq!(page.slide_count(), 3);
    }

    #[test]
    fn test_memory_page_defaults() {
        let mut page = MemoryPage::new(0);
        assert!(page.is_hidden(ids::DEPARTURE_DROPDOWN));
        assert_eq!(page.value(ids::TRIP_TYPE_SELECT), "1");
        assert_eq!(page.visible_slide(), None);

        // Out of range slide writes are ignored
        page.set_slide_opacity(4, 1.0);
        assert_eq!(page.slide_opacity(4), None);
    }
}

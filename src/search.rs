//! Outbound/return selection state machine
//!
//! Round trips are run as two one-way searches. The first search picks the
//! outbound leg; selecting it on a round trip moves the state to
//! [`SearchingFor::Return`], and the next search is the stored route reversed,
//! departing on the stored return date.

use crate::{FlightOffer, SearchParams, SearchRequest, TripType};
use tracing::debug;

/// Which leg the next selection fills
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchingFor {
    #[default]
    Outbound,
    Return,
}

/// Result of selecting a flight
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionOutcome {
    /// Outbound stored on a round trip; the return search comes next
    AwaitingReturn,
    /// Outbound stored and nothing else to pick
    OneWayComplete,
    RoundTripComplete {
        return_flight: FlightOffer,
        total: f64,
    },
}

/// A search ready to send
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedSearch {
    pub request: SearchRequest,
    /// The submitted route or dates differed, so prior selections were dropped
    pub started_over: bool,
}

/// Page-lifetime search state
///
/// Invariant: `searching_for == Return` implies an outbound flight is selected
/// and the trip is a round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchState {
    is_round_trip: bool,
    outbound_selected: Option<FlightOffer>,
    searching_for: SearchingFor,
    search_params: Option<SearchParams>,
}

impl Default for SearchState {
    fn default() -> Self {
        Self {
            is_round_trip: true,
            outbound_selected: None,
            searching_for: SearchingFor::Outbound,
            search_params: None,
        }
    }
}

impl SearchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_round_trip(&self) -> bool {
        self.is_round_trip
    }

    pub fn searching_for(&self) -> SearchingFor {
        self.searching_for
    }

    pub fn outbound_selected(&self) -> Option<&FlightOffer> {
        self.outbound_selected.as_ref()
    }

    pub fn search_params(&self) -> Option<&SearchParams> {
        self.search_params.as_ref()
    }

    /// Drop any selection and stored search, back to choosing an outbound flight.
    pub fn reset(&mut self) {
        debug!(from = ?self.searching_for, "Resetting search state");
        self.outbound_selected = None;
        self.searching_for = SearchingFor::Outbound;
        self.search_params = None;
    }

    /// Trip type selector changed. Always resets.
    pub fn set_trip_type(&mut self, trip_type: TripType) {
        self.is_round_trip = trip_type == TripType::RoundTrip;
        self.reset();
    }

    /// True when `form` differs in route or dates from the stored search
    pub fn is_new_search(&self, form: &SearchParams) -> bool {
        self.search_params
            .as_ref()
            .map_or(true, |stored| !stored.same_trip(form))
    }

    /// Turn submitted form values into the request to send.
    ///
    /// While choosing the outbound leg a changed route or date starts over.
    /// While choosing the return leg the form route is ignored: the request
    /// is the stored route reversed, departing on the stored return date.
    pub fn prepare_search(&mut self, form: SearchParams) -> PreparedSearch {
        let mut started_over = false;
        if self.searching_for == SearchingFor::Outbound && self.is_new_search(&form) {
            started_over = self.search_params.is_some();
            self.reset();
        }

        if self.search_params.is_none() {
            self.search_params = Some(form.clone());
        }

        let params = match (self.searching_for, self.search_params.as_ref()) {
            (SearchingFor::Return, Some(stored)) => SearchParams {
                adults: form.adults,
                travel_class: form.travel_class,
                ..stored.reversed()
            },
            _ => form,
        };

        debug!(
            searching_for = ?self.searching_for,
            started_over,
            params = %params,
            "Prepared search"
        );
        PreparedSearch {
            request: SearchRequest::one_way(&params),
            started_over,
        }
    }

    /// Record a selected flight and advance the state machine.
    pub fn select_flight(&mut self, flight: FlightOffer) -> SelectionOutcome {
        if let (SearchingFor::Return, Some(outbound)) = (self.searching_for, self.outbound_selected.as_ref()) {
            let total = outbound.price_or_zero() + flight.price_or_zero();
            debug!(total, "Return flight selected");
            return SelectionOutcome::RoundTripComplete {
                return_flight: flight,
                total,
            };
        }

        self.outbound_selected = Some(flight);
        let has_return_date = self
            .search_params
            .as_ref()
            .map_or(false, |p| p.return_date.is_some());

        if self.is_round_trip && has_return_date {
            self.searching_for = SearchingFor::Return;
            debug!("Outbound selected, waiting for return search");
            SelectionOutcome::AwaitingReturn
        } else {
            debug!("Outbound selected, one-way itinerary complete");
            SelectionOutcome::OneWayComplete
        }
    }
}

//! HTML rendering for results, itinerary cards, prompts and the autocomplete dropdown
//!
//! Every function here is pure: data in, markup out. Missing fields degrade
//! to `N/A` or an empty string rather than failing.

use crate::search::SearchingFor;
use crate::{Airport, AirportStop, FlightOffer, Layover, Leg};
use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

/// Results shown with the "Top Flight" badge, in backend order
pub const TOP_FLIGHT_COUNT: usize = 3;
/// Extension badges shown per offer
pub const MAX_EXTENSIONS: usize = 4;

const NOT_AVAILABLE: &str = "N/A";

/// Escape text for use in element content and quoted attributes
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// `⌊m/60⌋h (m mod 60)m`, or `N/A` for missing or zero durations
pub fn format_duration(minutes: Option<u32>) -> String {
    match minutes {
        Some(m) if m > 0 => hours_minutes(m),
        _ => NOT_AVAILABLE.to_string(),
    }
}

fn hours_minutes(minutes: u32) -> String {
    format!("{}h {}m", minutes / 60, minutes % 60)
}

/// `Sat, Dec 20` from `2025-12-20`; empty when the date can't be parsed
pub fn format_date(date: &str) -> String {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map(|d| d.format("%a, %b %-d").to_string())
        .unwrap_or_default()
}

/// `Nonstop`, `1 stop`, `n stops`
pub fn stops_label(stops: u32) -> String {
    match stops {
        0 => "Nonstop".to_string(),
        1 => "1 stop".to_string(),
        n => format!("{} stops", n),
    }
}

/// Whole numbers print without a fractional part, like JavaScript numbers do
pub fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("{:.0}", amount)
    } else {
        amount.to_string()
    }
}

/// `$120`, or `N/A` for a missing or zero price
pub fn format_price(price: Option<f64>) -> String {
    match price {
        Some(p) if p != 0.0 => format!("${}", format_amount(p)),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Split `"YYYY-MM-DD HH:MM"` into date and time parts
fn split_time(time: &str) -> (&str, Option<&str>) {
    let mut parts = time.split(' ');
    let date = parts.next().unwrap_or("");
    (date, parts.next().filter(|t| !t.is_empty()))
}

fn stop_time(stop: Option<&AirportStop>) -> Option<&str> {
    stop.and_then(|s| s.time.as_deref()).filter(|t| !t.is_empty())
}

fn stop_id(stop: Option<&AirportStop>) -> &str {
    stop.and_then(|s| s.id.as_deref()).unwrap_or("")
}

fn stop_name(stop: Option<&AirportStop>) -> &str {
    stop.and_then(|s| s.name.as_deref()).unwrap_or("")
}

/// Icon and color of an extension badge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Badge {
    pub icon: &'static str,
    pub color: &'static str,
}

const BADGE_DEFAULT: Badge = Badge {
    icon: "fa-circle-info",
    color: "bg-gray-700/50 text-gray-300",
};
const BADGE_LEGROOM_GOOD: Badge = Badge {
    icon: "fa-couch",
    color: "bg-green-600/20 text-green-300 border border-green-500/30",
};
const BADGE_LEGROOM: Badge = Badge {
    icon: "fa-couch",
    color: "bg-blue-600/20 text-blue-300 border border-blue-500/30",
};
const BADGE_WIFI: Badge = Badge {
    icon: "fa-wifi",
    color: "bg-purple-600/20 text-purple-300 border border-purple-500/30",
};
const BADGE_POWER: Badge = Badge {
    icon: "fa-plug",
    color: "bg-yellow-600/20 text-yellow-300 border border-yellow-500/30",
};
const BADGE_ENTERTAINMENT: Badge = Badge {
    icon: "fa-tv",
    color: "bg-pink-600/20 text-pink-300 border border-pink-500/30",
};
const BADGE_CARBON: Badge = Badge {
    icon: "fa-leaf",
    color: "bg-green-600/20 text-green-300 border border-green-500/30",
};

struct ExtensionPatterns {
    legroom: Regex,
    above_average: Regex,
    wifi: Regex,
    power: Regex,
    entertainment: Regex,
    carbon: Regex,
}

fn extension_patterns() -> &'static ExtensionPatterns {
    static PATTERNS: OnceLock<ExtensionPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        // Literal patterns, compilation cannot fail
        let re = |p: &str| Regex::new(p).unwrap_or_else(|e| panic!("bad pattern {}: {}", p, e));
        ExtensionPatterns {
            legroom: re(r"(?i)legroom"),
            above_average: re(r"(?i)above average"),
            wifi: re(r"(?i)wi-fi|wifi"),
            power: re(r"(?i)power|usb"),
            entertainment: re(r"(?i)video|entertainment|stream"),
            carbon: re(r"(?i)carbon"),
        }
    })
}

/// Classify an extension string by keyword. First matching category wins.
pub fn classify_extension(extension: &str) -> Badge {
    let p = extension_patterns();
    if p.legroom.is_match(extension) {
        if p.above_average.is_match(extension) {
            BADGE_LEGROOM_GOOD
        } else {
            BADGE_LEGROOM
        }
    } else if p.wifi.is_match(extension) {
        BADGE_WIFI
    } else if p.power.is_match(extension) {
        BADGE_POWER
    } else if p.entertainment.is_match(extension) {
        BADGE_ENTERTAINMENT
    } else if p.carbon.is_match(extension) {
        BADGE_CARBON
    } else {
        BADGE_DEFAULT
    }
}

/// Carbon line: `<kg> kg CO₂e` plus an optional delta indicator
#[derive(Debug, Clone, PartialEq)]
pub struct CarbonSummary {
    pub emissions: String,
    /// `(css class, "↑12%")` when the delta is non-zero
    pub delta: Option<(&'static str, String)>,
}

pub fn carbon_summary(offer: &FlightOffer) -> CarbonSummary {
    let carbon = offer.carbon_emissions.as_ref();

    let emissions = match carbon.and_then(|c| c.this_flight) {
        Some(grams) if grams != 0.0 => format!("{} kg CO₂e", format_amount((grams / 1000.0).round())),
        _ => NOT_AVAILABLE.to_string(),
    };

    let diff = carbon.and_then(|c| c.difference_percent).unwrap_or(0.0);
    let delta = if diff > 0.0 {
        Some(("text-red-400", format!("↑{}%", format_amount(diff.abs()))))
    } else if diff < 0.0 {
        Some(("text-green-400", format!("↓{}%", format_amount(diff.abs()))))
    } else {
        None
    };

    CarbonSummary { emissions, delta }
}

fn layover_summary(layovers: &[Layover]) -> String {
    layovers
        .iter()
        .map(|l| {
            let label = l
                .name
                .as_deref()
                .filter(|n| !n.is_empty())
                .or(l.id.as_deref())
                .unwrap_or("");
            format!("{} ({})", escape(label), hours_minutes(l.duration.unwrap_or(0)))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn logo(offer_logo: Option<&str>, airline: Option<&str>, class: &str) -> String {
    match offer_logo.filter(|l| !l.is_empty()) {
        Some(src) => format!(
            r#"<img src="{}" alt="{}" class="{}" />"#,
            escape(src),
            escape(airline.unwrap_or("")),
            class
        ),
        None => String::new(),
    }
}

/// Search results: one card per offer, or the "no flights" panel
pub fn flight_results(flights: &[FlightOffer], searching_for: SearchingFor) -> String {
    if flights.is_empty() {
        return no_flights();
    }

    let mut html = String::from(r#"<div class="space-y-4">"#);
    for (index, offer) in flights.iter().enumerate() {
        html.push_str(&offer_card(offer, index, searching_for));
    }
    html.push_str("</div>");
    html
}

pub fn no_flights() -> String {
    r#"<div class="bg-yellow-900/30 border border-yellow-500 text-yellow-200 p-6 rounded-xl text-center">
    <i class="fa-solid fa-plane-slash text-3xl mb-3"></i>
    <p>No flights found for your search criteria. Try different dates or airports.</p>
</div>"#
        .to_string()
}

/// One offer card. `index` is the position in the backend's result order.
pub fn offer_card(offer: &FlightOffer, index: usize, searching_for: SearchingFor) -> String {
    let is_top = index < TOP_FLIGHT_COUNT;
    let border = if is_top {
        "border-blue-500/50 shadow-lg shadow-blue-500/20"
    } else {
        "border-white/10"
    };
    let badge = if is_top {
        r#"<span class="bg-blue-500 text-white text-xs px-3 py-1 rounded-full font-semibold">Top Flight</span>"#
    } else {
        ""
    };

    let mut html = format!(
        r#"<div class="flight-card bg-[#1a2233] border {border} p-6 rounded-xl hover:border-blue-500/50 transition-all duration-300">
<div class="flex justify-between items-start mb-6">
    <div class="flex items-center gap-4">
        {logo}
        <div>
            <h3 class="text-xl font-bold text-blue-300">{airline}</h3>
            <p class="text-sm text-gray-400">{offer_type}</p>
        </div>
    </div>
    <div class="text-right">
        <div class="text-3xl font-bold text-green-400 mb-1">{price}</div>
        {badge}
    </div>
</div>"#,
        logo = logo(
            offer.airline_logo.as_deref(),
            offer.airline.as_deref(),
            "w-12 h-12 object-contain bg-white rounded-lg p-1"
        ),
        airline = escape(offer.airline.as_deref().filter(|a| !a.is_empty()).unwrap_or("Multiple Airlines")),
        offer_type = escape(offer.offer_type.as_deref().filter(|t| !t.is_empty()).unwrap_or("Round trip")),
        price = format_price(offer.price),
    );

    for (leg_index, leg) in offer.legs().iter().enumerate() {
        // Stops describe the whole offer, so only the first leg shows them
        let stops = if leg_index == 0 { offer.stops } else { None };
        html.push_str(&leg_row(leg, leg_index, stops));
    }

    if !offer.layovers.is_empty() {
        html.push_str(&format!(
            r#"<div class="text-xs text-gray-400 mt-2 pt-2 border-t border-white/10"><i class="fa-solid fa-clock mr-1"></i>Layover: {}</div>"#,
            layover_summary(&offer.layovers)
        ));
    }

    if !offer.extensions.is_empty() {
        html.push_str(r#"<div class="flex flex-wrap gap-2 mt-4">"#);
        for extension in offer.extensions.iter().take(MAX_EXTENSIONS) {
            let badge = classify_extension(extension);
            html.push_str(&format!(
                r#"<span class="{} px-3 py-1 rounded-full text-xs flex items-center gap-1.5"><i class="fa-solid {}"></i>{}</span>"#,
                badge.color,
                badge.icon,
                escape(extension)
            ));
        }
        html.push_str("</div>");
    }

    let carbon = carbon_summary(offer);
    let delta = carbon
        .delta
        .map(|(class, text)| format!(r#"<span class="{} font-semibold text-xs">{}</span>"#, class, text))
        .unwrap_or_default();
    let button_label = match searching_for {
        SearchingFor::Outbound => "Select Outbound",
        SearchingFor::Return => "Select Return",
    };
    html.push_str(&format!(
        r#"<div class="flex items-center justify-between mt-4 pt-4 border-t border-white/10">
    <div class="flex items-center gap-2 text-sm">
        <i class="fa-solid fa-leaf text-green-400"></i>
        <span class="text-gray-300">{emissions}</span>
        {delta}
    </div>
    <button data-offer-index="{index}" class="select-flight bg-blue-600 hover:bg-blue-700 text-white font-semibold py-2 px-6 rounded-lg transition duration-300">{button_label}</button>
</div>
</div>"#,
        emissions = carbon.emissions,
    ));

    html
}

fn leg_row(leg: &Leg, leg_index: usize, stops: Option<u32>) -> String {
    let departure = stop_time(leg.departure_airport.as_ref()).unwrap_or(NOT_AVAILABLE);
    let arrival = stop_time(leg.arrival_airport.as_ref()).unwrap_or(NOT_AVAILABLE);
    let (departure_date, departure_clock) = split_time(departure);
    let (arrival_date, arrival_clock) = split_time(arrival);

    let stops_html = match stops {
        Some(n) => {
            let color = if n == 0 { "text-green-400" } else { "text-yellow-400" };
            format!(r#"<div class="text-xs {} font-semibold mt-2">{}</div>"#, color, stops_label(n))
        }
        None => r#"<div class="text-xs text-gray-500 mt-2">&nbsp;</div>"#.to_string(),
    };

    let overnight = if leg.overnight {
        r#"<div class="text-xs text-orange-400 mt-2"><i class="fa-solid fa-moon mr-1"></i>Overnight flight</div>"#
    } else {
        ""
    };

    let airplane = leg
        .airplane
        .as_deref()
        .filter(|a| !a.is_empty())
        .map(|a| format!("· {}", escape(a)))
        .unwrap_or_default();

    format!(
        r#"<div class="flight-leg mb-4" data-leg="{leg_number}">
    <div class="grid grid-cols-7 gap-4 items-center">
        <div class="col-span-2 text-left">
            <div class="text-xs text-gray-500 mb-1">{departure_date}</div>
            <div class="text-3xl font-bold text-white">{departure_time}</div>
            <div class="text-sm text-gray-400 mt-1 font-semibold">{departure_id}</div>
            <div class="text-xs text-gray-500">{departure_name}</div>
        </div>
        <div class="col-span-3 text-center px-4">
            <div class="text-sm text-gray-400 mb-2">{duration}</div>
            <div class="relative"><div class="h-0.5 bg-gradient-to-r from-blue-500 via-purple-500 to-blue-500"></div><i class="fa-solid fa-plane text-blue-400"></i></div>
            {stops_html}
        </div>
        <div class="col-span-2 text-right">
            <div class="text-xs text-gray-500 mb-1">{arrival_date}</div>
            <div class="text-3xl font-bold text-white">{arrival_time}</div>
            <div class="text-sm text-gray-400 mt-1 font-semibold">{arrival_id}</div>
            <div class="text-xs text-gray-500">{arrival_name}</div>
        </div>
    </div>
    {overnight}
    <div class="text-xs text-gray-400 mt-2">{airline} {flight_number} {airplane}</div>
</div>"#,
        leg_number = leg_index + 1,
        departure_date = format_date(departure_date),
        departure_time = escape(departure_clock.unwrap_or(departure)),
        departure_id = escape(stop_id(leg.departure_airport.as_ref())),
        departure_name = escape(stop_name(leg.departure_airport.as_ref())),
        duration = format_duration(leg.duration),
        arrival_date = format_date(arrival_date),
        arrival_time = escape(arrival_clock.unwrap_or(arrival)),
        arrival_id = escape(stop_id(leg.arrival_airport.as_ref())),
        arrival_name = escape(stop_name(leg.arrival_airport.as_ref())),
        airline = escape(leg.airline.as_deref().unwrap_or("")),
        flight_number = escape(leg.flight_number.as_deref().unwrap_or("")),
    )
}

/// Compact card for the itinerary summary
pub fn itinerary_card(offer: &FlightOffer, label: &str) -> String {
    let departure = stop_time(offer.departure_airport.as_ref()).map(split_time);
    let arrival = stop_time(offer.arrival_airport.as_ref()).map(split_time);

    let departure_date = departure.map(|(date, _)| date).unwrap_or("");
    let departure_time = departure.and_then(|(_, t)| t).unwrap_or(NOT_AVAILABLE);
    let arrival_time = arrival.and_then(|(_, t)| t).unwrap_or(NOT_AVAILABLE);

    format!(
        r#"<div class="itinerary-card bg-[#1a2233] border border-blue-500/30 p-4 rounded-lg">
    <div class="flex items-center justify-between">
        <div class="flex items-center gap-3">
            {logo}
            <div>
                <span class="text-xs text-purple-400 font-semibold">{label}</span>
                <div class="text-sm font-semibold text-white">{airline} {flight_number}</div>
                <div class="text-xs text-gray-400">{departure_date}</div>
            </div>
        </div>
        <div class="flex items-center gap-4 text-sm">
            <div class="text-center"><div class="font-bold text-white">{departure_time}</div><div class="text-xs text-gray-400">{departure_id}</div></div>
            <div class="text-center text-gray-400"><i class="fa-solid fa-plane text-blue-400"></i><div class="text-xs">{duration}</div></div>
            <div class="text-center"><div class="font-bold text-white">{arrival_time}</div><div class="text-xs text-gray-400">{arrival_id}</div></div>
            <div class="text-lg font-bold text-green-400">${price}</div>
        </div>
    </div>
</div>"#,
        logo = logo(
            offer.airline_logo.as_deref(),
            offer.airline.as_deref(),
            "w-8 h-8 object-contain bg-white rounded p-1"
        ),
        label = escape(label),
        airline = escape(offer.airline.as_deref().unwrap_or("")),
        flight_number = escape(offer.flight_number.as_deref().unwrap_or("")),
        departure_date = escape(departure_date),
        departure_time = escape(departure_time),
        departure_id = escape(stop_id(offer.departure_airport.as_ref())),
        duration = format_duration(offer.duration),
        arrival_time = escape(arrival_time),
        arrival_id = escape(stop_id(offer.arrival_airport.as_ref())),
        price = format_amount(offer.price_or_zero()),
    )
}

/// Itinerary so far: the outbound card, plus the return card once chosen
pub fn itinerary(outbound: Option<&FlightOffer>, return_flight: Option<&FlightOffer>) -> String {
    let mut html = String::new();
    if let Some(outbound) = outbound {
        html.push_str(&itinerary_card(outbound, "Outbound"));
    }
    if let Some(return_flight) = return_flight {
        html.push_str(&itinerary_card(return_flight, "Return"));
    }
    html
}

pub fn return_prompt() -> String {
    r#"<div class="bg-blue-900/30 border border-blue-500 text-blue-200 p-6 rounded-xl text-center">
    <i class="fa-solid fa-plane-arrival text-3xl mb-3"></i>
    <p class="text-lg font-semibold">Great! Now select your return flight</p>
    <button data-action="search-return" class="mt-4 bg-blue-600 hover:bg-blue-700 text-white font-semibold py-2 px-6 rounded-lg">Search Return Flights</button>
</div>"#
        .to_string()
}

pub fn one_way_complete() -> String {
    r#"<div class="bg-green-900/30 border border-green-500 text-green-200 p-6 rounded-xl text-center">
    <i class="fa-solid fa-check-circle text-3xl mb-3"></i>
    <p class="text-lg font-semibold">Flight selected! Ready to book.</p>
</div>"#
        .to_string()
}

/// Whole-dollar total with halves rounded up, e.g. `214.5` gives `215`
pub fn format_total(total: f64) -> String {
    format_amount(total.round())
}

/// Completion panel; the total is rounded to whole dollars
pub fn round_trip_complete(total: f64) -> String {
    format!(
        r#"<div class="bg-green-900/30 border border-green-500 text-green-200 p-6 rounded-xl text-center">
    <i class="fa-solid fa-check-circle text-3xl mb-3"></i>
    <p class="text-lg font-semibold">Round trip complete! Ready to book.</p>
    <p class="text-sm mt-2">Total: ${}</p>
</div>"#,
        format_total(total)
    )
}

pub fn error_panel(message: &str) -> String {
    format!(
        r#"<div class="bg-red-900/30 border border-red-500 text-red-200 p-6 rounded-xl">
    <i class="fa-solid fa-circle-exclamation mr-2"></i>
    <strong>Error:</strong> {}
</div>"#,
        escape(message)
    )
}

/// Autocomplete dropdown entries; each carries its code in `data-code`
pub fn airport_dropdown(airports: &[&Airport]) -> String {
    airports
        .iter()
        .map(|airport| {
            format!(
                r#"<div class="airport-option px-4 py-3 hover:bg-blue-600/30 cursor-pointer border-b border-white/5 last:border-0" data-code="{code}">
    <div class="flex items-center justify-between">
        <div><span class="font-bold text-blue-300">{code}</span><span class="text-sm text-gray-300 ml-2">{city}</span></div>
        <span class="text-xs text-gray-500">{country}</span>
    </div>
    <div class="text-xs text-gray-400 mt-1">{name}</div>
</div>"#,
                code = escape(&airport.code),
                city = escape(&airport.city),
                country = escape(&airport.country),
                name = escape(&airport.name),
            )
        })
        .collect()
}

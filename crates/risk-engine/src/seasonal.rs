//! Seasonal risk calendar
//!
//! Known recurring hazards injected into scoring as synthetic events, so a
//! Manila supplier scores elevated in August before any typhoon is reported.
//! Seasonal events are regenerated on every scoring run and never stored.

use crate::regions::same_country;
use crate::{Event, EventType, Severity};
use chrono::{DateTime, Utc};

/// Source label carried by synthetic seasonal events
pub const SEASONAL_SOURCE: &str = "Seasonal Risk Calendar";

/// Weight factor applied outside the peak months
pub const OFF_PEAK_FACTOR: f64 = 0.5;

const ALL_YEAR: &[u32] = &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];

#[derive(Debug, Clone, PartialEq)]
pub struct SeasonalRiskWindow {
    pub countries: &'static [&'static str],
    /// When non-empty, the supplier's city must match one of these
    pub cities: &'static [&'static str],
    pub active_months: &'static [u32],
    pub peak_months: &'static [u32],
    pub signal: Severity,
    pub weight: f64,
    pub horizon_days: u32,
    pub label: &'static str,
}

impl SeasonalRiskWindow {
    pub fn applies_to(&self, country: &str, city: &str) -> bool {
        if !self.countries.iter().any(|c| same_country(c, country)) {
            return false;
        }
        if self.cities.is_empty() {
            return true;
        }
        let city = city.trim().to_lowercase();
        !city.is_empty()
            && self
                .cities
                .iter()
                .any(|c| city.contains(c) || c.contains(city.as_str()))
    }

    pub fn is_active(&self, month: u32) -> bool {
        self.active_months.contains(&month)
    }

    pub fn is_peak(&self, month: u32) -> bool {
        self.peak_months.contains(&month)
    }

    /// Weight for `month`: full at peak, halved otherwise
    pub fn weight_in(&self, month: u32) -> f64 {
        if self.is_peak(month) {
            self.weight
        } else {
            self.weight * OFF_PEAK_FACTOR
        }
    }
}

macro_rules! window {
    ($countries:expr, $cities:expr, $months:expr, $peak:expr, $signal:ident, $weight:expr, $horizon:expr, $label:expr) => {
        SeasonalRiskWindow {
            countries: $countries,
            cities: $cities,
            active_months: $months,
            peak_months: $peak,
            signal: Severity::$signal,
            weight: $weight,
            horizon_days: $horizon,
            label: $label,
        }
    };
}

pub static CALENDAR: &[SeasonalRiskWindow] = &[
    // Typhoon / cyclone
    window!(
        &["Philippines", "Taiwan", "Japan", "China", "Vietnam", "South Korea"],
        &[], &[5, 6, 7, 8, 9, 10, 11], &[8, 9, 10], High, 0.7, 30,
        "Typhoon season (Western Pacific)"
    ),
    window!(
        &["Bangladesh", "India", "Myanmar", "Sri Lanka", "Thailand", "Malaysia"],
        &[], &[4, 5, 10, 11], &[4, 5, 10, 11], High, 0.65, 30,
        "Cyclone season (Bay of Bengal)"
    ),
    window!(
        &["Pakistan", "India", "Bangladesh", "Sri Lanka"],
        &[], &[6, 7, 8, 9], &[7, 8], Medium, 0.5, 30,
        "Monsoon season (South Asia)"
    ),
    window!(
        &["United States", "Mexico", "Cuba", "Haiti", "Dominican Republic"],
        &["houston", "miami", "new orleans", "savannah", "charleston", "jacksonville", "manzanillo", "veracruz"],
        &[6, 7, 8, 9, 10, 11], &[8, 9, 10], High, 0.6, 30,
        "Atlantic hurricane season"
    ),
    window!(
        &["Indonesia", "Philippines", "Fiji", "Papua New Guinea", "Australia", "Madagascar", "Mozambique"],
        &[], &[11, 12, 1, 2, 3, 4], &[1, 2, 3], Medium, 0.5, 30,
        "Southern hemisphere cyclone season"
    ),
    // Flooding
    window!(
        &["China", "Vietnam", "Thailand", "Myanmar", "Cambodia", "Laos"],
        &[], &[6, 7, 8, 9], &[7, 8], Medium, 0.45, 30,
        "Summer flooding (SE/East Asia)"
    ),
    window!(
        &["Spain", "Italy", "France", "Greece"],
        &["valencia", "barcelona", "genoa", "marseille"],
        &[10, 11], &[10, 11], Medium, 0.55, 20,
        "DANA flash flood season (Mediterranean)"
    ),
    window!(
        &["Nigeria", "Ghana", "Cameroon", "Ivory Coast", "Senegal"],
        &[], &[6, 7, 8, 9], &[8, 9], Medium, 0.4, 30,
        "West African monsoon / flooding"
    ),
    window!(
        &["Brazil", "Colombia", "Peru", "Ecuador"],
        &[], &[12, 1, 2, 3], &[1, 2], Medium, 0.4, 30,
        "South American wet / flood season"
    ),
    // Winter
    window!(
        &["Germany", "Netherlands", "Belgium", "Poland", "Denmark", "Sweden"],
        &[], &[12, 1, 2], &[1, 2], Low, 0.25, 30,
        "North Sea / Baltic winter storm season"
    ),
    window!(
        &["Canada", "United States"],
        &["chicago", "detroit", "cleveland", "minneapolis", "toronto", "montreal", "boston", "new york"],
        &[12, 1, 2, 3], &[1, 2], Low, 0.25, 20,
        "North American winter storm / port freeze"
    ),
    // Seismic
    window!(
        &["Turkey"],
        &[], ALL_YEAR, &[1, 2, 3], High, 0.35, 30,
        "Seismic risk: North Anatolian Fault (year-round)"
    ),
    window!(
        &["Taiwan", "Japan", "Philippines", "Indonesia", "Nepal", "Pakistan"],
        &[], ALL_YEAR, &[3, 4], Medium, 0.3, 30,
        "High seismic zone (year-round)"
    ),
    // Labour cycles
    window!(
        &["Bangladesh"],
        &[], &[10, 11, 12, 1], &[11, 12], High, 0.6, 30,
        "Bangladesh garment labor unrest: year-end wage negotiations"
    ),
    window!(
        &["France", "Belgium", "Italy", "Spain", "Greece"],
        &[], &[3, 4, 9, 10, 11], &[9, 10], Medium, 0.4, 20,
        "European autumn labor strike season"
    ),
    window!(
        &["United States"],
        &["los angeles", "long beach", "seattle", "new york", "houston", "savannah"],
        &[6, 7, 8, 9, 10], &[7, 8, 9], Medium, 0.4, 30,
        "US West Coast longshoremen contract cycle (ILWU)"
    ),
    window!(
        &["South Africa"],
        &[], &[7, 8, 9, 10], &[8, 9], Medium, 0.4, 20,
        "South African mining / port strike season"
    ),
    window!(
        &["India"],
        &[], &[1, 2, 11, 12], &[1, 2], Low, 0.3, 14,
        "Indian trade union general strike season"
    ),
    // Elections
    window!(
        &["Nigeria", "Kenya", "Ghana", "Zimbabwe", "Democratic Republic of Congo"],
        &[], &[2, 3, 8, 9, 10, 11], &[2, 3, 10, 11], Medium, 0.35, 30,
        "African election instability window"
    ),
    window!(
        &["Pakistan", "Bangladesh", "Myanmar"],
        &[], &[1, 2, 11, 12], &[1, 2], Medium, 0.35, 30,
        "South/SE Asian political instability window"
    ),
    // Harvest
    window!(
        &["Ukraine", "Russia"],
        &[], &[6, 7, 8, 9], &[7, 8], High, 0.65, 30,
        "Black Sea grain harvest: conflict risk to export capacity"
    ),
    window!(
        &["Brazil", "Argentina"],
        &[], &[3, 4, 5], &[4, 5], Low, 0.3, 20,
        "South American soy/corn harvest: port congestion"
    ),
    // Chokepoints
    window!(
        &["Yemen", "Egypt", "Saudi Arabia", "Djibouti", "Eritrea", "Somalia"],
        &["suez", "jeddah", "aden", "djibouti"],
        ALL_YEAR, &[1, 2, 3, 4, 5, 6], High, 0.75, 30,
        "Red Sea / Bab-el-Mandeb: Houthi attack risk"
    ),
    window!(
        &["Iran", "Iraq", "United Arab Emirates", "Kuwait", "Bahrain", "Qatar", "Oman"],
        &["tehran", "bandar abbas", "dubai", "abu dhabi", "kuwait city", "muscat", "basra", "bushehr"],
        ALL_YEAR, &[1, 2, 3, 4, 5, 6, 7, 8], High, 0.8, 30,
        "Strait of Hormuz / Persian Gulf: military escalation & oil transit risk"
    ),
    window!(
        &["Israel", "Lebanon", "Jordan", "Syria", "Palestine"],
        &["tel aviv", "haifa", "ashdod", "beirut", "amman"],
        ALL_YEAR, ALL_YEAR, High, 0.7, 30,
        "Middle East conflict zone: ongoing regional escalation risk"
    ),
    // Wildfire / drought
    window!(
        &["United States", "Canada", "Australia"],
        &[], &[6, 7, 8, 9, 10], &[8, 9], Low, 0.25, 20,
        "Wildfire season: logistics disruption risk"
    ),
    window!(
        &["Morocco", "Algeria", "Spain", "Italy", "Greece", "Portugal"],
        &[], &[7, 8, 9], &[7, 8], Low, 0.25, 20,
        "Mediterranean wildfire / drought season"
    ),
];

/// Windows active for a supplier location in `month` (1-12)
pub fn active_windows(country: &str, city: &str, month: u32) -> Vec<&'static SeasonalRiskWindow> {
    CALENDAR
        .iter()
        .filter(|w| w.is_active(month) && w.applies_to(country, city))
        .collect()
}

/// Synthetic events for every window active at the supplier's location
pub fn seasonal_signals(country: &str, city: &str, month: u32, now: DateTime<Utc>) -> Vec<Event> {
    active_windows(country, city, month)
        .into_iter()
        .map(|window| {
            let peak = window.is_peak(month);
            Event {
                title: format!("[SEASONAL] {} — {}", window.label, country),
                description: format!(
                    "Seasonal risk window active for {}. {}. Window: ~{} days. {}",
                    country,
                    window.label,
                    window.horizon_days,
                    if peak { "PEAK risk period." } else { "Approaching peak." }
                ),
                source: SEASONAL_SOURCE.to_string(),
                url: None,
                published_at: Some(now),
                detected_country: country.to_string(),
                event_type: EventType::Seasonal,
                severity: window.signal,
                disruption_type: None,
                confidence: None,
                reasoning: None,
                seasonal_weight: Some(window.weight_in(month)),
            }
        })
        .collect()
}

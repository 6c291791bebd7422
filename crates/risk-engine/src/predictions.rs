//! Forward-looking disruption outlook per supplier
//!
//! Combines the current score breakdown with built-in knowledge of the
//! supplier's city (seasonal hazards, geopolitics, port infrastructure)
//! and its industry (lead time, substitutability) to project risk over
//! 72 hours, 7 days and 30 days. The calendar month is passed in so the
//! seasonal checks stay deterministic.

use crate::engine::SupplierBreakdown;
use crate::regions::{continent_of, Continent};
use crate::scorer::ScoredEventContribution;
use crate::text::{normalize, truncate_chars};
use crate::Supplier;
use serde::Serialize;

const MAX_THREAT_TITLE_CHARS: usize = 80;
const MAX_SOURCE_CHARS: usize = 30;
const MAX_DATA_SOURCES: usize = 3;

/// Known hazards of a supplier city
#[derive(Debug, Clone, Copy)]
pub struct CityProfile {
    pub city: &'static str,
    pub natural_risks: &'static [&'static str],
    pub geopolitical: &'static [&'static str],
    pub infrastructure: &'static [&'static str],
    pub industry_notes: &'static str,
    pub peak_risk_months: &'static [u32],
}

const fn city(
    city: &'static str,
    natural_risks: &'static [&'static str],
    geopolitical: &'static [&'static str],
    infrastructure: &'static [&'static str],
    industry_notes: &'static str,
    peak_risk_months: &'static [u32],
) -> CityProfile {
    CityProfile {
        city,
        natural_risks,
        geopolitical,
        infrastructure,
        industry_notes,
        peak_risk_months,
    }
}

static CITY_PROFILES: &[CityProfile] = &[
    // East Asia
    city(
        "shanghai",
        &["typhoon (Jun-Nov)", "flooding (summer)", "fog-related port delays"],
        &["US-China trade tensions", "Taiwan Strait proximity"],
        &["world's busiest container port", "heavy fog causes closures"],
        "Global hub for electronics, automotive, machinery exports",
        &[6, 7, 8, 9, 10],
    ),
    city(
        "shenzhen",
        &["typhoon (Jun-Nov)", "flooding"],
        &["US-China tech sanctions", "proximity to Hong Kong instability"],
        &["Yantian port with frequent congestion", "electronics manufacturing hub"],
        "World center for electronics, PCBs, consumer goods",
        &[6, 7, 8, 9, 10],
    ),
    city(
        "guangzhou",
        &["typhoon (Jun-Nov)", "flooding"],
        &["US-China trade tensions"],
        &["Nansha port", "major automotive and textile hub"],
        "Automotive, textiles, electronics, trade fair city",
        &[6, 7, 8, 9],
    ),
    city(
        "kaohsiung",
        &["typhoon (Jul-Oct)", "earthquake (high seismic zone)"],
        &["Taiwan Strait tensions, highest geopolitical risk in Asia"],
        &["Major semiconductor export hub", "TSMC proximity"],
        "Critical global semiconductor and electronics supply chain node",
        &[7, 8, 9, 10],
    ),
    city(
        "taipei",
        &["typhoon (Jul-Oct)", "earthquake (very high seismic zone)"],
        &["Taiwan Strait tensions"],
        &["TSMC HQ", "major tech R&D center"],
        "Global semiconductor design and fab capital",
        &[7, 8, 9, 10],
    ),
    city(
        "tokyo",
        &["earthquake (very high)", "tsunami risk", "typhoon (Aug-Oct)"],
        &["Low, stable democracy", "North Korea proximity"],
        &["Highly resilient infrastructure", "multiple redundant ports"],
        "Automotive, electronics, precision manufacturing",
        &[8, 9, 10],
    ),
    city(
        "osaka",
        &["earthquake", "typhoon (Aug-Oct)"],
        &["Low"],
        &["Kobe port nearby, closed by the 1995 earthquake"],
        "Pharmaceutical, chemicals, machinery",
        &[8, 9],
    ),
    city(
        "busan",
        &["typhoon (occasional)", "winter ice delays"],
        &["North Korea proximity creates latent risk"],
        &["Korea's main container port", "highly efficient"],
        "Automotive parts, electronics, steel",
        &[8, 9],
    ),
    // Southeast Asia
    city(
        "ho chi minh city",
        &["flooding (Oct-Nov)", "typhoon (rare but possible)"],
        &["Low, improving trade relations"],
        &["Cat Lai port with frequent congestion", "road infrastructure developing"],
        "Electronics, garments, footwear; major China+1 destination",
        &[10, 11],
    ),
    city(
        "haiphong",
        &["typhoon (Jul-Oct)", "flooding"],
        &["South China Sea tensions"],
        &["Lach Huyen deep-water port", "northern Vietnam manufacturing hub"],
        "Samsung electronics, automotive, heavy manufacturing",
        &[7, 8, 9, 10],
    ),
    city(
        "jakarta",
        &["flooding (Dec-Feb)", "earthquake", "volcanic activity"],
        &["Low, stable"],
        &["Tanjung Priok port, congestion common", "road infrastructure poor"],
        "Consumer goods, textiles, palm oil, mining",
        &[12, 1, 2],
    ),
    city(
        "bangkok",
        &["flooding (Oct-Nov, severe in 2011 and 2022)", "drought"],
        &["Moderate, periodic political instability"],
        &["Laem Chabang port", "2011 floods shut factories for months"],
        "Automotive (HDD), electronics, food processing",
        &[10, 11],
    ),
    city(
        "manila",
        &["typhoon (20+ per year)", "earthquake", "flooding"],
        &["South China Sea tensions", "US-China proxy concerns"],
        &["Port of Manila with chronic congestion", "power outages common"],
        "Electronics, garments, BPO; high natural disaster exposure",
        &[7, 8, 9, 10, 11],
    ),
    city(
        "dhaka",
        &["flooding (Jun-Sep)", "cyclone (Apr-May, Oct-Nov)"],
        &["Moderate labor unrest and political instability"],
        &["Chittagong port 200km away, road delays common"],
        "World's #2 garment exporter; labor strikes are frequent",
        &[4, 5, 6, 7, 8, 9, 10, 11],
    ),
    city(
        "chittagong",
        &["cyclone (high)", "flooding", "storm surge"],
        &["Labor unrest in garment sector"],
        &["Only major port in Bangladesh, a single point of failure"],
        "All Bangladesh garment and textile exports pass through here",
        &[4, 5, 10, 11],
    ),
    city(
        "karachi",
        &["cyclone (Jun, Oct)", "flooding (monsoon)", "heatwave"],
        &["High political instability", "India tensions"],
        &["Port Qasim and Karachi port", "power outages frequent"],
        "Textiles, chemicals, leather; high geopolitical risk",
        &[6, 7, 8, 9, 10],
    ),
    city(
        "mumbai",
        &["flooding (Jun-Sep, severe)", "cyclone (rare)"],
        &["Low-moderate, India-Pakistan tensions"],
        &["JNPT port, busiest in India but congestion-prone"],
        "Pharmaceuticals, textiles, chemicals, finance",
        &[6, 7, 8, 9],
    ),
    city(
        "colombo",
        &["monsoon (May-Aug, Dec-Jan)", "tsunami risk (Indian Ocean)"],
        &["Moderate, still recovering from the 2022 economic crisis"],
        &["Colombo port, an Indian Ocean hub", "economic instability affects reliability"],
        "Garments, tea, rubber",
        &[5, 6, 7, 8, 12, 1],
    ),
    city(
        "singapore",
        &["Low; no typhoons, minimal earthquake risk"],
        &["Low, neutral hub", "South China Sea proximity"],
        &["World's most efficient port", "highly redundant"],
        "Global transshipment hub; disruption here affects all Asia-EU routes",
        &[],
    ),
    // Middle East
    city(
        "dubai",
        &["extreme heat (Jun-Sep)", "rare flooding"],
        &["Iran tensions", "Yemen conflict proximity", "Strait of Hormuz risk"],
        &["Jebel Ali, among the world's busiest ports", "highly efficient"],
        "Global transshipment and re-export hub for the Middle East and Africa",
        &[1, 2, 3],
    ),
    city(
        "jeddah",
        &["extreme heat", "flooding (rare but severe)"],
        &["Yemen war proximity", "Houthi attacks on Red Sea shipping"],
        &["Islamic Port of Jeddah", "Red Sea route disruptions ongoing"],
        "Red Sea shipping crisis directly affects all Jeddah cargo",
        &[1, 2, 3, 4, 5, 6],
    ),
    // Europe
    city(
        "rotterdam",
        &["flooding (sea level, managed)", "winter storms"],
        &["Low, EU stability", "Russia-Ukraine energy impacts"],
        &["Europe's largest port", "highly resilient"],
        "Gateway for European imports; disruption cascades continent-wide",
        &[11, 12, 1, 2],
    ),
    city(
        "hamburg",
        &["winter storms", "Elbe river flooding"],
        &["Low", "Russia-Ukraine energy crisis impacts"],
        &["Germany's largest port", "rail connections to all of Europe"],
        "Automotive, machinery, chemicals",
        &[11, 12, 1, 2],
    ),
    city(
        "barcelona",
        &["drought (increasing)", "heat waves", "occasional flooding"],
        &["Moderate, periodic strikes"],
        &["Major Mediterranean port", "frequent labor strikes"],
        "Automotive, chemicals, food; labor strikes are recurring",
        &[6, 7, 8],
    ),
    city(
        "valencia",
        &["flooding (DANA storms Oct-Nov)", "drought", "heat"],
        &["Low"],
        &["Spain's busiest port by volume"],
        "Automotive, ceramics, citrus; DANA flash floods are severe",
        &[10, 11],
    ),
    city(
        "istanbul",
        &["earthquake (North Anatolian Fault)", "winter storms"],
        &["High, Ukraine war proximity", "Syria border"],
        &["Bosphorus, a global chokepoint for Black Sea shipping"],
        "Textiles, automotive, chemicals; earthquake risk is significant",
        &[1, 2, 11, 12],
    ),
    city(
        "genoa",
        &["flooding (Liguria, frequent)", "storms"],
        &["Low"],
        &["Italy's busiest port", "Morandi bridge collapse history"],
        "Automotive, steel, chemicals",
        &[10, 11, 12],
    ),
    // Americas
    city(
        "los angeles",
        &["earthquake (San Andreas)", "wildfire", "drought"],
        &["Recurring longshore labor disputes"],
        &["LA/Long Beach, the busiest US port complex"],
        "Gateway for 40% of US imports",
        &[9, 10, 11],
    ),
    city(
        "long beach",
        &["earthquake", "wildfire"],
        &["Longshore labor disputes"],
        &["Part of the LA/LB complex with shared congestion risk"],
        "Co-manages the US West Coast import gateway",
        &[9, 10, 11],
    ),
    city(
        "houston",
        &["hurricane (Jun-Nov)", "flooding (Harvey-scale risk)", "tornado"],
        &["Low"],
        &["Port of Houston, a US energy and chemical hub"],
        "Petrochemicals, energy, aerospace; hurricane season is serious",
        &[8, 9, 10],
    ),
    city(
        "manzanillo",
        &["hurricane (Jun-Nov)", "earthquake", "tsunami"],
        &["Cartel activity in Colima state"],
        &["Mexico's busiest Pacific port"],
        "Automotive, electronics from Asia to Mexico factories",
        &[7, 8, 9, 10],
    ),
    city(
        "santos",
        &["flooding", "landslides (Jan-Mar)"],
        &["Moderate, periodic port worker strikes"],
        &["Latin America's largest port with chronic congestion"],
        "Agricultural exports (soy, coffee), automotive imports",
        &[1, 2, 3],
    ),
    // Africa
    city(
        "lagos",
        &["flooding (Jun-Sep)", "oil spills"],
        &["High political instability", "port security"],
        &["Apapa port with chronic congestion"],
        "Oil and consumer goods; infrastructure is a major risk factor",
        &[6, 7, 8, 9],
    ),
    city(
        "durban",
        &["flooding (historic in Apr 2022)", "cyclone (rare)"],
        &["Moderate labor strikes and political instability"],
        &["Africa's busiest port; the 2022 floods caused a 3-month disruption"],
        "Automotive, mining, agricultural exports",
        &[3, 4, 5],
    ),
    city(
        "suez",
        &["sandstorm", "extreme heat"],
        &["High; Ever Given 2021", "Houthi Red Sea attacks ongoing"],
        &["Suez Canal carries 12% of global trade"],
        "Any Suez closure affects every global supply chain simultaneously",
        &[1, 2, 3, 4],
    ),
];

/// Profile for a city name, ignoring case and surrounding space
pub fn city_profile(name: &str) -> Option<&'static CityProfile> {
    let key = normalize(name);
    CITY_PROFILES.iter().find(|p| p.city == key)
}

/// High-risk months and their cause for a continent
pub fn regional_season(continent: Continent) -> (&'static [u32], &'static str) {
    match continent {
        Continent::Asia => (
            &[6, 7, 8, 9, 10],
            "Typhoon and monsoon season across Southeast and East Asia",
        ),
        Continent::SouthAmerica => (
            &[1, 2, 3, 12],
            "Summer flooding and landslide season in Brazil, Colombia, Peru",
        ),
        Continent::NorthAmerica => (
            &[8, 9, 10],
            "Atlantic hurricane season affecting Gulf Coast and East Coast ports",
        ),
        Continent::Europe => (
            &[11, 12, 1, 2],
            "Winter storms affecting North Sea and Baltic port operations",
        ),
        Continent::Africa => (
            &[6, 7, 8, 9],
            "West African monsoon season; East African long rains",
        ),
        Continent::Oceania => (&[12, 1, 2, 3], "Southern hemisphere cyclone season"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Substitutability {
    VeryLow,
    Low,
    Medium,
    High,
}

/// How exposed an industry is to a supply interruption
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndustryProfile {
    pub lead_time_weeks: u32,
    pub substitutability: Substitutability,
    pub just_in_time: bool,
}

const fn industry(lead_time_weeks: u32, substitutability: Substitutability, just_in_time: bool) -> IndustryProfile {
    IndustryProfile {
        lead_time_weeks,
        substitutability,
        just_in_time,
    }
}

const DEFAULT_INDUSTRY: IndustryProfile = industry(8, Substitutability::Medium, false);

// Checked in order; the first key contained in the category wins
static INDUSTRIES: &[(&str, IndustryProfile)] = &[
    ("electronics", industry(12, Substitutability::Low, true)),
    ("semiconductor", industry(26, Substitutability::VeryLow, false)),
    ("automotive", industry(8, Substitutability::Low, true)),
    ("apparel", industry(16, Substitutability::Medium, false)),
    ("garment", industry(16, Substitutability::Medium, false)),
    ("pharma", industry(24, Substitutability::VeryLow, false)),
    ("chemicals", industry(6, Substitutability::Medium, false)),
    ("raw materials", industry(4, Substitutability::High, false)),
    ("food", industry(2, Substitutability::Medium, true)),
    ("logistics", industry(1, Substitutability::High, true)),
    ("manufacturing", industry(8, Substitutability::Medium, false)),
];

pub fn industry_profile(category: &str) -> IndustryProfile {
    let category = category.to_lowercase();
    INDUSTRIES
        .iter()
        .find(|(key, _)| category.contains(key))
        .map(|(_, profile)| *profile)
        .unwrap_or(DEFAULT_INDUSTRY)
}

/// Whether `month` falls in the city's (or failing that the region's)
/// peak hazard season, with an explanation.
pub fn peak_season(profile: Option<&CityProfile>, country: &str, month: u32) -> (bool, String) {
    if let Some(profile) = profile {
        if profile.peak_risk_months.contains(&month) {
            let hazard = profile.natural_risks.first().copied().unwrap_or_default();
            return (
                true,
                format!("Currently in peak risk season for this city ({})", hazard),
            );
        }
        return (false, "Not currently in peak risk season for this city".to_string());
    }

    match continent_of(country).map(regional_season) {
        Some((months, reason)) if months.contains(&month) => (true, reason.to_string()),
        _ => (false, "Not currently in regional peak risk period".to_string()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trajectory {
    Escalating,
    Elevated,
    Uncertain,
    Stable,
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictionHorizon {
    pub timeframe: String,
    pub trajectory: Trajectory,
    /// Percent chance of a disruption within the window
    pub probability: u8,
    pub expected_impact: String,
    pub narrative: String,
    pub triggers_to_watch: Vec<String>,
}

impl PredictionHorizon {
    fn new(
        timeframe: &str,
        trajectory: Trajectory,
        probability: u8,
        expected_impact: &str,
        narrative: String,
        triggers_to_watch: Vec<String>,
    ) -> Self {
        Self {
            timeframe: timeframe.to_string(),
            trajectory,
            probability,
            expected_impact: expected_impact.to_string(),
            narrative,
            triggers_to_watch,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictionReport {
    pub supplier: String,
    pub city: String,
    pub country: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    pub city_risk_profile: String,
    pub active_threat: String,
    pub seasonal_context: String,
    pub industry: IndustryProfile,
    pub horizons: Vec<PredictionHorizon>,
    pub cascade_risks: Vec<String>,
    pub data_sources: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Project the supplier's risk forward for calendar month `month` (1-12)
pub fn predict(supplier: &Supplier, breakdown: &SupplierBreakdown, month: u32) -> PredictionReport {
    let score = breakdown.score;
    let name = &supplier.name;
    let city = &supplier.city;
    let country = &supplier.country;
    let category = &supplier.category;

    let profile = city_profile(city);
    let industry = industry_profile(category);
    let (is_peak, season_note) = peak_season(profile, country, month);
    let lead_weeks = industry.lead_time_weeks;

    let counted: Vec<&ScoredEventContribution> = breakdown.contributions.iter().filter(|r| r.counted).collect();
    let closest = counted.iter().find_map(|r| r.miles);

    let city_risk_profile = match profile {
        Some(p) => format!(
            "{} has known exposure to: {}. Geopolitical context: {}. {}",
            city,
            p.natural_risks.iter().take(2).copied().collect::<Vec<_>>().join(", "),
            p.geopolitical.join(", "),
            p.industry_notes
        ),
        None => format!(
            "No specific city risk profile for {}. Using regional patterns for {}. Standard supply chain risk applies.",
            city, country
        ),
    };

    let active_threat = match counted.first() {
        Some(top) => {
            let place = match top.miles {
                Some(miles) if miles > 0.0 => format!("{:.0} miles from {}", miles, city),
                _ => format!("in {}", country),
            };
            format!(
                "Active {}-signal event detected {}: \"{}\"",
                top.signal,
                place,
                truncate_chars(&top.title, MAX_THREAT_TITLE_CHARS)
            )
        }
        None => format!("No high-impact events currently detected near {}.", city),
    };

    let h72 = match closest {
        Some(miles) if score >= 60.0 && miles < 100.0 => PredictionHorizon::new(
            "72 hours",
            Trajectory::Escalating,
            75,
            "Severe",
            format!(
                "High-signal disruption within {:.0} miles of {}. Expect immediate operational impact \
                 within 72 hours. Contact {} today to confirm facility status and request emergency \
                 shipment of any in-progress orders.",
                miles, city, name
            ),
            strings(&[
                "Supplier confirms facility closure or reduced capacity",
                "Event moves within 50 miles of city center",
                "Port serving this city announces closure or delays",
            ]),
        ),
        _ if score >= 40.0 => PredictionHorizon::new(
            "72 hours",
            Trajectory::Uncertain,
            40,
            "Moderate",
            format!(
                "Elevated activity near {} but direct impact in 72 hours is not certain. Monitor closely \
                 and check the supplier's communication channels. Prepare a contingency order list in \
                 case rapid action is needed.",
                city
            ),
            strings(&[
                "Risk score increases above 60",
                "New high-signal event appears within 150 miles",
                "Supplier fails to respond to status inquiry",
            ]),
        ),
        _ => PredictionHorizon::new(
            "72 hours",
            Trajectory::Stable,
            10,
            "None",
            format!(
                "No immediate threat to {} operations in the next 72 hours. Current events are distant \
                 or low-signal. Normal operations expected.",
                city
            ),
            strings(&["Any new high-signal event within 200 miles"]),
        ),
    };

    let h7 = if is_peak && score >= 30.0 {
        PredictionHorizon::new(
            "7 days",
            Trajectory::Escalating,
            60,
            "Moderate to Severe",
            format!(
                "{} is currently in its peak risk season ({}). Combined with active events, the 7-day \
                 outlook is concerning. Lead time for {} from {} is typically {} weeks, so any order \
                 placed today will not arrive before the risk window passes. Draw on existing inventory now.",
                city, season_note, category, city, lead_weeks
            ),
            vec![
                format!("Weather service issues warnings for {}", country),
                "Risk score stays above 40 for 3+ consecutive days".to_string(),
                format!("Other {} suppliers in the region also show elevated scores", category),
            ],
        )
    } else if score >= 50.0 {
        PredictionHorizon::new(
            "7 days",
            Trajectory::Uncertain,
            50,
            "Moderate",
            format!(
                "Current disruption risk near {} may persist or intensify over 7 days. With a {}-week \
                 lead time for {}, any new order placed this week will arrive after the risk window. \
                 Focus on expediting existing orders and building buffer from current stock.",
                city, lead_weeks, category
            ),
            strings(&[
                "Disruption confirmed at supplier facility",
                "Port serving city announces operational changes",
            ]),
        )
    } else {
        PredictionHorizon::new(
            "7 days",
            Trajectory::Stable,
            15,
            "Minor",
            format!(
                "7-day outlook for {} is stable. Current events do not suggest escalation. Normal \
                 ordering cadence is appropriate. Use this window to review safety stock levels for {}.",
                city, category
            ),
            vec![format!("Peak season arrival (if applicable to {})", city)],
        )
    };

    let h30 = if profile.is_some() && is_peak {
        PredictionHorizon::new(
            "30 days",
            Trajectory::Elevated,
            45,
            "Moderate",
            format!(
                "The 30-day outlook for {} reflects its known seasonal patterns. {}. Industry lead time \
                 for {} is {} weeks, so decisions made today directly affect your supply 30 days from now. \
                 Consider placing a larger-than-usual order this week as a buffer.",
                city, season_note, category, lead_weeks
            ),
            vec![
                "Seasonal risk materializes (typhoon, flooding, labor action)".to_string(),
                format!("Geopolitical situation in {} deteriorates", country),
                "Risk score trend increases week-over-week".to_string(),
            ],
        )
    } else if score >= 60.0 {
        PredictionHorizon::new(
            "30 days",
            Trajectory::Uncertain,
            35,
            "Moderate",
            format!(
                "High current risk score suggests the situation in {} may not resolve within 30 days. \
                 Begin qualifying alternative {} suppliers now; qualification typically takes 4-12 weeks.",
                city, category
            ),
            strings(&[
                "Situation escalates to conflict or infrastructure failure",
                "Supplier requests force majeure",
            ]),
        )
    } else {
        PredictionHorizon::new(
            "30 days",
            Trajectory::Stable,
            10,
            "None to Minor",
            format!(
                "No significant 30-day risk factors identified for {}. Standard supply chain planning \
                 applies. Use this stable period to review dual-sourcing options.",
                city
            ),
            vec![format!("New geopolitical development in {}", country)],
        )
    };

    let mut cascade_risks = Vec::new();
    if let Some(p) = profile {
        let notes = p.industry_notes.to_lowercase();
        if p.infrastructure.iter().any(|i| i.to_lowercase().contains("port")) {
            cascade_risks.push(format!(
                "Port disruption in {} affects all exporters in the region, not just {}",
                city, name
            ));
        }
        if notes.contains("semiconductor") {
            cascade_risks.push(format!(
                "Semiconductor supply from {} has 6-18 month ripple effects across electronics globally",
                city
            ));
        }
        if notes.contains("automotive") {
            cascade_risks.push(format!(
                "Automotive JIT supply chains from {} can halt assembly lines within days",
                city
            ));
        }
    }
    if industry.just_in_time {
        cascade_risks.push(format!(
            "{} from {} is likely on JIT schedules; even 3-day delays trigger production stops",
            category, city
        ));
    }
    if matches!(industry.substitutability, Substitutability::Low | Substitutability::VeryLow) {
        cascade_risks.push(format!(
            "{} has low substitutability; alternative sourcing takes weeks to qualify",
            category
        ));
    }

    let mut data_sources: Vec<String> = counted
        .iter()
        .take(MAX_DATA_SOURCES)
        .map(|r| truncate_chars(&r.source, MAX_SOURCE_CHARS).to_string())
        .collect();
    if data_sources.is_empty() {
        data_sources.push("No events matched".to_string());
    }

    PredictionReport {
        supplier: name.clone(),
        city: city.clone(),
        country: country.clone(),
        category: category.clone(),
        latitude: supplier.latitude,
        longitude: supplier.longitude,
        city_risk_profile,
        active_threat,
        seasonal_context: season_note,
        industry,
        horizons: vec![h72, h7, h30],
        cascade_risks,
        data_sources,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RiskLevel, Severity};

    fn make_row(title: &str, source: &str, miles: Option<f64>, counted: bool) -> ScoredEventContribution {
        ScoredEventContribution {
            title: title.to_string(),
            source: source.to_string(),
            url: None,
            published: "Today".to_string(),
            event_country: "China".to_string(),
            signal: Severity::High,
            proximity_label: String::new(),
            miles,
            distance_multiplier: 1.0,
            severity_multiplier: 1.0,
            time_multiplier: 1.0,
            points: 20.0,
            counted,
            rank: 1,
            is_forecast: false,
            is_seasonal: false,
        }
    }

    fn make_breakdown(score: f64, rows: Vec<ScoredEventContribution>) -> SupplierBreakdown {
        SupplierBreakdown {
            supplier: "Acme Electronics".to_string(),
            score,
            level: RiskLevel::from_score(score),
            summary: String::new(),
            contributions: rows,
        }
    }

    fn make_supplier(category: &str, city: &str, country: &str) -> Supplier {
        Supplier::new("Acme Electronics", category, city, country, "1")
    }

    #[test]
    fn test_city_profile_lookup() {
        assert!(city_profile(" Ho Chi Minh City ").is_some());
        assert_eq!(city_profile("SHENZHEN").map(|p| p.city), Some("shenzhen"));
        assert!(city_profile("Springfield").is_none());
        assert!(city_profile("singapore").unwrap().peak_risk_months.is_empty());
    }

    #[test]
    fn test_industry_profile_first_match_wins() {
        // "electronics" precedes "semiconductor" in the table
        assert_eq!(industry_profile("Semiconductor Electronics").lead_time_weeks, 12);
        assert_eq!(industry_profile("Semiconductors").lead_time_weeks, 26);
        assert_eq!(
            industry_profile("Pharmaceutical APIs").substitutability,
            Substitutability::VeryLow
        );
        assert!(industry_profile("Fresh Food").just_in_time);
        assert_eq!(industry_profile("Furniture"), DEFAULT_INDUSTRY);
    }

    #[test]
    fn test_peak_season_city_then_region() {
        let shenzhen = city_profile("Shenzhen");
        let (peak, note) = peak_season(shenzhen, "China", 8);
        assert!(peak);
        assert!(note.contains("typhoon (Jun-Nov)"));

        let (peak, note) = peak_season(shenzhen, "China", 2);
        assert!(!peak);
        assert_eq!(note, "Not currently in peak risk season for this city");

        let (peak, note) = peak_season(None, "Germany", 12);
        assert!(peak);
        assert!(note.contains("North Sea"));

        let (peak, _) = peak_season(None, "Germany", 7);
        assert!(!peak);

        let (peak, note) = peak_season(None, "Atlantis", 8);
        assert!(!peak);
        assert_eq!(note, "Not currently in regional peak risk period");
    }

    #[test]
    fn test_nearby_high_score_in_peak_season() {
        let supplier = make_supplier("Electronics", "Shenzhen", "China");
        let breakdown = make_breakdown(
            72.0,
            vec![
                make_row("Typhoon shuts Yantian terminal", "Reuters Asia Pacific Business Desk", Some(15.0), true),
                make_row("Factory fire", "Local", Some(40.0), false),
            ],
        );
        let report = predict(&supplier, &breakdown, 8);

        let trajectories: Vec<Trajectory> = report.horizons.iter().map(|h| h.trajectory).collect();
        assert_eq!(
            trajectories,
            vec![Trajectory::Escalating, Trajectory::Escalating, Trajectory::Elevated]
        );
        assert_eq!(report.horizons[0].probability, 75);
        assert_eq!(report.horizons[0].triggers_to_watch.len(), 3);
        assert!(report.horizons[1].narrative.contains("12 weeks"));
        assert!(report.active_threat.contains("high-signal event detected 15 miles from Shenzhen"));
        assert_eq!(report.data_sources, vec!["Reuters Asia Pacific Business ".to_string()]);

        assert!(report.cascade_risks.iter().any(|c| c.starts_with("Port disruption in Shenzhen")));
        assert!(report.cascade_risks.iter().any(|c| c.contains("JIT schedules")));
        assert!(report.cascade_risks.iter().any(|c| c.contains("low substitutability")));
    }

    #[test]
    fn test_high_score_far_away_off_season() {
        let supplier = make_supplier("Automotive Parts", "Hamburg", "Germany");
        let breakdown = make_breakdown(65.0, vec![make_row("Rail strike", "Wire", Some(250.0), true)]);
        let report = predict(&supplier, &breakdown, 6);

        assert_eq!(report.horizons[0].trajectory, Trajectory::Uncertain);
        assert_eq!(report.horizons[1].trajectory, Trajectory::Uncertain);
        assert_eq!(report.horizons[2].trajectory, Trajectory::Uncertain);
        assert_eq!(report.horizons[2].probability, 35);
        assert!(report.cascade_risks.iter().any(|c| c.starts_with("Automotive JIT supply chains from Hamburg")));
    }

    #[test]
    fn test_quiet_unknown_city() {
        let supplier = make_supplier("Furniture", "Springfield", "Atlantis");
        let report = predict(&supplier, &make_breakdown(0.0, Vec::new()), 8);

        assert!(report.city_risk_profile.starts_with("No specific city risk profile for Springfield"));
        assert_eq!(report.active_threat, "No high-impact events currently detected near Springfield.");
        for horizon in &report.horizons {
            assert_eq!(horizon.trajectory, Trajectory::Stable);
        }
        assert_eq!(report.horizons[0].expected_impact, "None");
        assert_eq!(report.horizons[2].expected_impact, "None to Minor");
        assert!(report.cascade_risks.is_empty());
        assert_eq!(report.data_sources, vec!["No events matched".to_string()]);
    }

    #[test]
    fn test_regional_peak_without_city_profile() {
        let supplier = make_supplier("Textiles", "Ludhiana", "India");
        let breakdown = make_breakdown(35.0, vec![make_row("Monsoon floods", "Wire", None, true)]);
        let report = predict(&supplier, &breakdown, 7);

        // Regional season escalates the week but the month needs a city profile
        assert_eq!(report.horizons[1].trajectory, Trajectory::Escalating);
        assert_eq!(report.horizons[2].trajectory, Trajectory::Stable);
        assert!(report.active_threat.contains("detected in India"));
    }
}

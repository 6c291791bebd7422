//! Country reference data and country detection
//!
//! Each country carries its aliases, continent and a stability tier
//! (1 = very stable .. 4 = high risk) used by the alternative-sourcing
//! recommender. Countries without a published tier default to 3.

use crate::gazetteer;
use crate::text::{contains_word, normalize};
use crate::UNKNOWN_COUNTRY;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Tier assumed for countries absent from the tier table
pub const DEFAULT_RISK_TIER: u8 = 3;

/// Aliases shorter than this are never used for free-text detection
const MIN_DETECT_ALIAS_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Continent {
    Africa,
    Asia,
    Europe,
    NorthAmerica,
    SouthAmerica,
    Oceania,
}

/// Static country record
#[derive(Debug, Clone, Copy)]
pub struct CountryInfo {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub continent: Continent,
    pub tier: Option<u8>,
}

const fn country(
    name: &'static str,
    aliases: &'static [&'static str],
    continent: Continent,
    tier: Option<u8>,
) -> CountryInfo {
    CountryInfo {
        name,
        aliases,
        continent,
        tier,
    }
}

use Continent::*;

static COUNTRIES: &[CountryInfo] = &[
    // Asia
    country("China", &["prc", "people's republic of china"], Asia, Some(2)),
    country("Vietnam", &["viet nam"], Asia, Some(2)),
    country("Indonesia", &[], Asia, Some(2)),
    country("India", &[], Asia, Some(2)),
    country("Bangladesh", &[], Asia, Some(3)),
    country("Thailand", &[], Asia, Some(2)),
    country("Malaysia", &[], Asia, Some(2)),
    country("Philippines", &[], Asia, Some(2)),
    country("Pakistan", &[], Asia, Some(3)),
    country("Sri Lanka", &[], Asia, Some(3)),
    country("Myanmar", &["burma"], Asia, Some(3)),
    country("Cambodia", &[], Asia, Some(3)),
    country("Laos", &[], Asia, None),
    country("Nepal", &[], Asia, None),
    country("South Korea", &["korea", "republic of korea"], Asia, Some(1)),
    country("North Korea", &["dprk"], Asia, Some(4)),
    country("Japan", &[], Asia, Some(1)),
    country("Taiwan", &[], Asia, Some(1)),
    country("Singapore", &[], Asia, Some(1)),
    country("United Arab Emirates", &["uae", "emirates"], Asia, None),
    country("Saudi Arabia", &["saudi"], Asia, None),
    country("Turkey", &["turkiye", "türkiye"], Asia, Some(2)),
    country("Israel", &[], Asia, None),
    country("Palestine", &["gaza", "west bank"], Asia, None),
    country("Lebanon", &[], Asia, Some(4)),
    country("Jordan", &[], Asia, None),
    country("Syria", &[], Asia, Some(4)),
    country("Iraq", &[], Asia, Some(4)),
    country("Iran", &[], Asia, Some(4)),
    country("Oman", &[], Asia, None),
    country("Kuwait", &[], Asia, None),
    country("Bahrain", &[], Asia, None),
    country("Qatar", &[], Asia, None),
    country("Yemen", &[], Asia, Some(4)),
    country("Afghanistan", &[], Asia, Some(4)),
    country("Kazakhstan", &[], Asia, None),
    country("Uzbekistan", &[], Asia, None),
    country("Azerbaijan", &[], Asia, None),
    country("Georgia", &[], Asia, None),
    // Europe
    country("Germany", &[], Europe, Some(1)),
    country("Netherlands", &["holland", "the netherlands"], Europe, Some(1)),
    country("Sweden", &[], Europe, Some(1)),
    country("Denmark", &[], Europe, Some(1)),
    country("Finland", &[], Europe, Some(1)),
    country("Switzerland", &[], Europe, Some(1)),
    country("Austria", &[], Europe, Some(1)),
    country("Czech Republic", &["czechia"], Europe, Some(1)),
    country("Poland", &[], Europe, Some(1)),
    country("Portugal", &[], Europe, Some(2)),
    country("Spain", &[], Europe, Some(2)),
    country("Italy", &[], Europe, Some(2)),
    country("France", &[], Europe, Some(2)),
    country(
        "United Kingdom",
        &["uk", "u.k.", "britain", "great britain", "england", "scotland", "wales"],
        Europe,
        Some(2),
    ),
    country("Ireland", &[], Europe, None),
    country("Belgium", &[], Europe, None),
    country("Greece", &[], Europe, None),
    country("Romania", &[], Europe, None),
    country("Moldova", &[], Europe, None),
    country("Ukraine", &[], Europe, Some(4)),
    country("Belarus", &[], Europe, Some(4)),
    country("Russia", &["russian federation"], Europe, Some(4)),
    // Africa
    country("Egypt", &[], Africa, Some(3)),
    country("Morocco", &[], Africa, Some(2)),
    country("Algeria", &[], Africa, None),
    country("Libya", &[], Africa, Some(4)),
    country("Sudan", &[], Africa, Some(4)),
    country("Nigeria", &[], Africa, Some(3)),
    country("Ghana", &[], Africa, Some(3)),
    country("Cameroon", &[], Africa, None),
    country("Ivory Coast", &["cote d'ivoire", "côte d'ivoire"], Africa, None),
    country("Senegal", &[], Africa, None),
    country("Mali", &[], Africa, Some(4)),
    country("Burkina Faso", &[], Africa, Some(4)),
    country("Kenya", &[], Africa, Some(3)),
    country("Ethiopia", &[], Africa, Some(3)),
    country("Somalia", &[], Africa, Some(4)),
    country("Djibouti", &[], Africa, None),
    country("Eritrea", &[], Africa, None),
    country("South Africa", &[], Africa, Some(3)),
    country("Zimbabwe", &[], Africa, None),
    country("Democratic Republic of Congo", &["drc", "dr congo"], Africa, None),
    country("Madagascar", &[], Africa, None),
    country("Mozambique", &[], Africa, None),
    // North America
    country(
        "United States",
        &["us", "u.s.", "usa", "u.s.a.", "united states of america"],
        NorthAmerica,
        Some(1),
    ),
    country("Canada", &[], NorthAmerica, Some(1)),
    country("Mexico", &[], NorthAmerica, Some(2)),
    country("Cuba", &[], NorthAmerica, None),
    country("Haiti", &[], NorthAmerica, Some(4)),
    country("Dominican Republic", &[], NorthAmerica, None),
    // South America
    country("Brazil", &["brasil"], SouthAmerica, Some(2)),
    country("Argentina", &[], SouthAmerica, None),
    country("Chile", &[], SouthAmerica, None),
    country("Colombia", &[], SouthAmerica, Some(3)),
    country("Peru", &[], SouthAmerica, None),
    country("Ecuador", &[], SouthAmerica, None),
    country("Venezuela", &[], SouthAmerica, Some(4)),
    // Oceania
    country("Australia", &[], Oceania, Some(1)),
    country("Fiji", &[], Oceania, None),
    country("Papua New Guinea", &[], Oceania, None),
];

/// (lowercase name or alias, canonical country), longest first, detection-eligible only
static DETECTION_TERMS: LazyLock<Vec<(String, &'static str)>> = LazyLock::new(|| {
    let mut terms: Vec<(String, &'static str)> = COUNTRIES
        .iter()
        .flat_map(|c| {
            std::iter::once(c.name.to_lowercase())
                .chain(c.aliases.iter().map(|a| a.to_string()))
                .map(move |term| (term, c.name))
        })
        .filter(|(term, _)| term.chars().count() >= MIN_DETECT_ALIAS_LEN)
        .collect();
    terms.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    terms
});

/// Look up a country by canonical name or any alias (case-insensitive)
pub fn country_info(name: &str) -> Option<&'static CountryInfo> {
    let key = normalize(name);
    if key.is_empty() {
        return None;
    }
    COUNTRIES
        .iter()
        .find(|c| c.name.to_lowercase() == key || c.aliases.contains(&key.as_str()))
}

/// Canonical spelling of a country name; unknown names come back trimmed
pub fn canonical_country(name: &str) -> String {
    country_info(name)
        .map(|c| c.name.to_string())
        .unwrap_or_else(|| name.trim().to_string())
}

/// Two country strings refer to the same country
pub fn same_country(a: &str, b: &str) -> bool {
    let (a, b) = (canonical_country(a), canonical_country(b));
    !a.is_empty() && a.eq_ignore_ascii_case(&b)
}

pub fn continent_of(name: &str) -> Option<Continent> {
    country_info(name).map(|c| c.continent)
}

/// Stability tier, defaulting unknown countries to 3
pub fn risk_tier(name: &str) -> u8 {
    country_info(name)
        .and_then(|c| c.tier)
        .unwrap_or(DEFAULT_RISK_TIER)
}

pub fn tier_label(tier: u8) -> &'static str {
    match tier {
        1 => "Very Stable",
        2 => "Mostly Stable",
        3 => "Elevated",
        _ => "High Risk",
    }
}

/// Best-guess country mentioned in free text.
///
/// Port and sourcing cities from the gazetteer are checked first, then
/// country names and aliases. Within each tier the longest match on word
/// boundaries wins. Aliases shorter than four characters ("us", "uk") are
/// skipped because they match too much unrelated text.
pub fn detect_country(text: &str) -> String {
    if text.trim().is_empty() {
        return UNKNOWN_COUNTRY.to_string();
    }
    if let Some(city) = gazetteer::find_city(text) {
        return city.country.to_string();
    }

    let lower = text.to_lowercase();
    DETECTION_TERMS
        .iter()
        .find(|(term, _)| contains_word(&lower, term))
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| UNKNOWN_COUNTRY.to_string())
}

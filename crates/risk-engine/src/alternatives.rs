//! Alternative-sourcing recommender
//!
//! For a flagged supplier, look first for lower-risk suppliers of the same
//! category in the uploaded list, then for curated sourcing regions that
//! are no less stable than the supplier's own country.

use crate::countdown::CountdownEvent;
use crate::regions::{canonical_country, risk_tier, same_country, tier_label};
use crate::text::{normalize, same_name, truncate_chars};
use crate::{RiskLevel, Supplier, HIGH_RISK_THRESHOLD};
use serde::{Deserialize, Serialize};
use std::fmt;

const MAX_SUGGESTIONS: usize = 3;
const HEADLINE_CHARS: usize = 80;
const KM_PER_MILE: f64 = 1.609_344;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Immediate,
    ThisWeek,
    PlanAhead,
}

impl Urgency {
    /// Urgency from days left before a countdown deadline
    pub fn from_days_remaining(days: i64) -> Self {
        if days <= 3 {
            Self::Immediate
        } else if days <= 10 {
            Self::ThisWeek
        } else {
            Self::PlanAhead
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Immediate => "immediate",
            Self::ThisWeek => "this_week",
            Self::PlanAhead => "plan_ahead",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A supplier already in the uploaded list that could take over
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InternalAlternative {
    pub name: String,
    pub city: String,
    pub country: String,
    pub category: String,
    pub tier: String,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    /// Stability tier of the alternative's country (1 best)
    pub risk_tier: u8,
    pub distance_km: Option<f64>,
    pub quality: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionalSuggestion {
    pub country: String,
    pub reason: &'static str,
    pub risk_tier: u8,
    pub tier_label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlternativesReport {
    pub internal_alternatives: Vec<InternalAlternative>,
    pub regional_suggestions: Vec<RegionalSuggestion>,
    pub recommendation: String,
    pub urgency: Urgency,
    pub risk_reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub countdown: Option<CountdownEvent>,
}

type RegionList = &'static [(&'static str, &'static str)];

/// Category keyword → preferred sourcing regions, searched in order
static CATEGORY_REGIONS: &[(&str, RegionList)] = &[
    (
        "electronics",
        &[
            ("Vietnam", "Strong electronics base, China+1 destination, 3-4 week lead time"),
            ("Malaysia", "Penang electronics hub, established supply chain, English-speaking"),
            ("South Korea", "High-quality components, stable politics, 3-4 week lead time"),
            ("Taiwan", "World-class electronics, but Taiwan Strait risk to consider"),
            ("Thailand", "Growing electronics sector, Bangkok-area industrial zones"),
            ("Mexico", "Nearshore for US buyers, 1-2 week lead time, USMCA advantage"),
        ],
    ),
    (
        "semiconductor",
        &[
            ("South Korea", "Samsung, SK Hynix: world-class fabs, stable"),
            ("Taiwan", "TSMC: highest quality but geopolitical risk"),
            ("Japan", "Mature semiconductor industry, stable, high quality"),
            ("United States", "Reshoring incentives, CHIPS Act investment, longer lead time"),
            ("Germany", "Infineon, Bosch: European fab, stable, premium pricing"),
        ],
    ),
    (
        "automotive",
        &[
            ("Mexico", "Major automotive hub, USMCA, 1-2 week nearshore for US"),
            ("Germany", "Premium automotive supply chain, stable, higher cost"),
            ("South Korea", "Hyundai/Kia ecosystem, competitive pricing"),
            ("Japan", "Toyota supplier network, world-class quality systems"),
            ("Czech Republic", "Central European automotive hub, EU stability"),
            ("Poland", "Growing automotive sector, EU member, competitive cost"),
        ],
    ),
    (
        "apparel",
        &[
            ("Vietnam", "World's #2 apparel exporter, competitive pricing, improving quality"),
            ("Cambodia", "Low cost, garment-specialist country, improving infrastructure"),
            ("Indonesia", "Large garment sector, Jakarta/Surabaya factories, stable"),
            ("Morocco", "Fast-fashion nearshore for Europe, 1-2 week lead time"),
            ("Turkey", "Premium fabrics, Europe-nearshore, 1-2 week lead time"),
            ("Ethiopia", "Very low cost, improving infrastructure, growing sector"),
        ],
    ),
    (
        "garment",
        &[
            ("Vietnam", "Strong garment base, improving quality, competitive"),
            ("Cambodia", "Specialist garment country, low cost"),
            ("Indonesia", "Large garment capacity"),
            ("Turkey", "Nearshore for Europe, premium positioning"),
            ("Morocco", "Ultra-nearshore for Europe, fast lead times"),
        ],
    ),
    (
        "pharma",
        &[
            ("India", "World's pharmacy: generic drugs, APIs, FDA-approved plants"),
            ("Germany", "Premium pharma, stable, highest regulatory standards"),
            ("Switzerland", "Precision pharma, Novartis/Roche ecosystem"),
            ("United States", "FDA-compliant, reshoring incentives, higher cost"),
            ("Ireland", "Major pharma hub, EU regulatory, English-speaking"),
        ],
    ),
    (
        "chemicals",
        &[
            ("Germany", "BASF: world's largest chemical company, stable"),
            ("Netherlands", "Rotterdam chemical cluster, global hub"),
            ("India", "Growing chemical sector, competitive pricing"),
            ("South Korea", "LG Chem, SK Innovation: advanced chemicals"),
            ("United States", "Gulf Coast chemical cluster, competitive for North America"),
        ],
    ),
    (
        "raw materials",
        &[
            ("Australia", "Mining stable, major iron ore/coal exporter"),
            ("Canada", "Stable mining sector, diversified minerals"),
            ("Chile", "Copper dominant, stable mining regulation"),
            ("Brazil", "Iron ore, soybeans: large volumes, port congestion watch"),
            ("South Africa", "Platinum, chrome: stable but labor strike risk"),
        ],
    ),
    (
        "food",
        &[
            ("Netherlands", "AgriFood innovation hub, EU compliant, global distributor"),
            ("Brazil", "Huge food producer, soy/coffee/sugar/chicken"),
            ("United States", "Diversified food production, stable"),
            ("Argentina", "Soy, corn, beef: competitive pricing"),
            ("Australia", "Premium food, clean supply chains, stable"),
        ],
    ),
    (
        "logistics",
        &[
            ("Singapore", "World's most efficient logistics hub"),
            ("Netherlands", "Rotterdam: Europe's gateway, excellent infrastructure"),
            ("United Arab Emirates", "Dubai: Middle East/Africa hub, Jebel Ali efficiency"),
            ("Germany", "DHL, DB Schenker HQ, central Europe logistics"),
        ],
    ),
    (
        "manufacturing",
        &[
            ("Vietnam", "Fastest-growing manufacturing hub, competitive cost"),
            ("Mexico", "Nearshore for North America, USMCA, growing capacity"),
            ("Malaysia", "Stable, English-speaking, quality manufacturing"),
            ("Poland", "EU manufacturing, educated workforce, central location"),
            ("Czech Republic", "Central European manufacturing excellence"),
        ],
    ),
];

static DEFAULT_REGIONS: RegionList = &[
    ("Vietnam", "Diversified manufacturing, fastest-growing sourcing hub"),
    ("Malaysia", "Stable, English-speaking, strong infrastructure"),
    ("Mexico", "Nearshore Americas option, USMCA, 1-2 week lead time"),
    ("Germany", "Premium European source, highest stability"),
    ("India", "Scale and cost-competitive across most categories"),
];

/// Curated region list for a category; `default` when nothing matches
pub fn regions_for_category(category: &str) -> RegionList {
    let category = normalize(category);
    if category.is_empty() {
        return DEFAULT_REGIONS;
    }
    CATEGORY_REGIONS
        .iter()
        .find(|(key, _)| category.contains(key) || key.contains(category.as_str()))
        .map(|(_, regions)| *regions)
        .unwrap_or(DEFAULT_REGIONS)
}

/// Related categories: substring either way, or a shared word
pub fn categories_match(wanted: &str, candidate: &str) -> bool {
    let wanted = normalize(wanted);
    let candidate = normalize(candidate);
    if wanted.is_empty() || candidate.is_empty() {
        return false;
    }
    candidate.contains(&wanted)
        || wanted.contains(&candidate)
        || wanted.split_whitespace().any(|word| candidate.contains(word))
}

/// Ranking for an internal alternative: safer country first, then lower score
pub fn alternative_quality(country_tier: u8, risk_score: f64) -> f64 {
    f64::from(5u8.saturating_sub(country_tier)) * 20.0 + (40.0 - risk_score).max(0.0)
}

pub fn find_alternatives(
    at_risk: &Supplier,
    all_suppliers: &[Supplier],
    risk_reason: &str,
    countdown: Option<&CountdownEvent>,
) -> AlternativesReport {
    let home = at_risk.coordinates();

    let mut internal: Vec<InternalAlternative> = all_suppliers
        .iter()
        .filter(|s| !same_name(&s.name, &at_risk.name))
        .filter(|s| categories_match(&at_risk.category, &s.category))
        .filter(|s| s.risk_level != RiskLevel::High && s.risk_score < HIGH_RISK_THRESHOLD)
        .map(|s| {
            let tier = risk_tier(&s.country);
            let distance_km = match (home, s.coordinates()) {
                (Some(a), Some(b)) => Some((a.distance_miles(&b) * KM_PER_MILE).round()),
                _ => None,
            };
            InternalAlternative {
                name: s.name.clone(),
                city: s.city.clone(),
                country: s.country.clone(),
                category: s.category.clone(),
                tier: s.tier.clone(),
                risk_score: s.risk_score,
                risk_level: s.risk_level,
                risk_tier: tier,
                distance_km,
                quality: alternative_quality(tier, s.risk_score),
            }
        })
        .collect();
    internal.sort_by(|a, b| b.quality.total_cmp(&a.quality));
    internal.truncate(MAX_SUGGESTIONS);

    let home_tier = risk_tier(&at_risk.country);
    let regional_suggestions: Vec<RegionalSuggestion> = regions_for_category(&at_risk.category)
        .iter()
        .filter(|(country, _)| !same_country(country, &at_risk.country))
        .map(|&(country, reason)| {
            let tier = risk_tier(country);
            RegionalSuggestion {
                country: canonical_country(country),
                reason,
                risk_tier: tier,
                tier_label: tier_label(tier),
            }
        })
        .filter(|r| r.risk_tier <= home_tier)
        .take(MAX_SUGGESTIONS)
        .collect();

    let (urgency, recommendation) = recommend(at_risk, countdown);

    AlternativesReport {
        internal_alternatives: internal,
        regional_suggestions,
        recommendation,
        urgency,
        risk_reason: risk_reason.to_string(),
        countdown: countdown.cloned(),
    }
}

fn recommend(at_risk: &Supplier, countdown: Option<&CountdownEvent>) -> (Urgency, String) {
    let Some(event) = countdown else {
        return (
            Urgency::ThisWeek,
            format!(
                "{} in {} is at elevated risk. Consider dual-sourcing or qualifying an alternative in a lower-risk region.",
                at_risk.name, at_risk.country
            ),
        );
    };

    let days = event.days_remaining;
    let headline = truncate_chars(&event.headline, HEADLINE_CHARS);
    let urgency = Urgency::from_days_remaining(days);
    let text = match urgency {
        Urgency::Immediate => format!(
            "URGENT: {}... Deadline in {} day(s). Do NOT place new orders with {}. \
             Contact alternative suppliers TODAY and request emergency quotes.",
            headline,
            days.max(0),
            at_risk.name
        ),
        Urgency::ThisWeek => format!(
            "Act this week: {}... Deadline in {} days. Begin qualification of alternatives now: \
             supplier transition typically takes longer than the warning window.",
            headline, days
        ),
        Urgency::PlanAhead => format!(
            "Plan ahead: {}... Deadline in {} days. \
             This is enough time to qualify an alternative. Start the process this week.",
            headline, days
        ),
    };
    (urgency, text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::countdown::detect_countdown;
    use chrono::{DateTime, Duration, Utc};

    fn make_supplier(name: &str, category: &str, city: &str, country: &str, score: f64) -> Supplier {
        let mut s = Supplier::new(name, category, city, country, "1");
        s.risk_score = score;
        s.risk_level = RiskLevel::from_score(score);
        s
    }

    fn make_countdown(days_remaining: i64) -> CountdownEvent {
        let now: DateTime<Utc> = "2026-02-01T00:00:00Z".parse().unwrap();
        let published = now - Duration::days(20 - days_remaining);
        detect_countdown("U.S. will decide within 20 days on sanctions", "", Some(published), now).unwrap()
    }

    fn make_supplier_list() -> Vec<Supplier> {
        vec![
            make_supplier("Shenzhen Circuits", "Electronics", "Shenzhen", "China", 72.0),
            make_supplier("Penang Boards", "electronics components", "Penang", "Malaysia", 10.0)
                .with_coordinates(5.4164, 100.3327),
            make_supplier("Seoul Micro", "Consumer Electronics", "Seoul", "South Korea", 30.0),
            make_supplier("Hanoi PCB", "electronics", "Hanoi", "Vietnam", 65.0),
            make_supplier("Dhaka Knits", "apparel", "Dhaka", "Bangladesh", 5.0),
            make_supplier("Taipei Chips", "electronic parts", "Taipei", "Taiwan", 0.0),
        ]
    }

    #[test]
    fn test_internal_alternatives_ranked() {
        let suppliers = make_supplier_list();
        let at_risk = suppliers[0].clone().with_coordinates(22.5431, 114.0579);
        let report = find_alternatives(&at_risk, &suppliers, "Port strike", None);

        let names: Vec<&str> = report.internal_alternatives.iter().map(|a| a.name.as_str()).collect();
        // Seoul: tier 1, (4*20)+10 = 90. Penang: tier 2, 60+30 = 90 (stable order keeps list order)
        assert_eq!(names, ["Penang Boards", "Seoul Micro"]);
        assert_eq!(report.internal_alternatives[0].quality, 90.0);
        assert!(report.internal_alternatives[0].distance_km.unwrap() > 2000.0);
        assert!(report.internal_alternatives[1].distance_km.is_none());
        assert_eq!(report.risk_reason, "Port strike");
    }

    #[test]
    fn test_at_risk_supplier_excluded_regardless_of_case() {
        let suppliers = make_supplier_list();
        let mut at_risk = suppliers[1].clone();
        at_risk.name = "PENANG BOARDS".to_string();
        at_risk.risk_score = 80.0;
        at_risk.risk_level = RiskLevel::High;

        let report = find_alternatives(&at_risk, &suppliers, "", None);
        assert!(report
            .internal_alternatives
            .iter()
            .all(|a| !a.name.eq_ignore_ascii_case("penang boards")));
        assert_eq!(report.internal_alternatives[0].name, "Seoul Micro");
    }

    #[test]
    fn test_regional_suggestions_skip_home_and_riskier() {
        let suppliers = make_supplier_list();
        let report = find_alternatives(&suppliers[0], &suppliers, "", None);

        let countries: Vec<&str> = report.regional_suggestions.iter().map(|r| r.country.as_str()).collect();
        assert_eq!(countries, ["Vietnam", "Malaysia", "South Korea"]);
        assert!(report.regional_suggestions.iter().all(|r| r.risk_tier <= 2));
        assert_eq!(report.regional_suggestions[2].tier_label, "Very Stable");
    }

    #[test]
    fn test_stable_home_country_limits_regions() {
        let at_risk = make_supplier("Munich Semis", "Semiconductor", "Munich", "Germany", 70.0);
        let report = find_alternatives(&at_risk, &[], "", None);
        let countries: Vec<&str> = report.regional_suggestions.iter().map(|r| r.country.as_str()).collect();
        assert_eq!(countries, ["South Korea", "Taiwan", "Japan"]);
        assert!(report.internal_alternatives.is_empty());
    }

    #[test]
    fn test_category_lookup() {
        assert_eq!(regions_for_category("Apparel & Footwear")[0].0, "Vietnam");
        assert_eq!(regions_for_category("pharma")[0].0, "India");
        assert_eq!(regions_for_category("Widgets")[3].0, "Germany");
        assert_eq!(regions_for_category("").len(), DEFAULT_REGIONS.len());
    }

    #[test]
    fn test_empty_category_matches_nothing() {
        assert!(!categories_match("", "electronics"));
        assert!(!categories_match("electronics", ""));
        assert!(categories_match("electronics", "Consumer Electronics"));
        assert!(categories_match("circuit boards", "boards"));
        assert!(!categories_match("apparel", "electronics"));
    }

    #[test]
    fn test_default_recommendation() {
        let suppliers = make_supplier_list();
        let report = find_alternatives(&suppliers[0], &suppliers, "", None);
        assert_eq!(report.urgency, Urgency::ThisWeek);
        assert!(report
            .recommendation
            .starts_with("Shenzhen Circuits in China is at elevated risk."));
        assert!(report.countdown.is_none());
    }

    #[test]
    fn test_urgency_from_countdown() {
        let suppliers = make_supplier_list();

        let report = find_alternatives(&suppliers[0], &suppliers, "", Some(&make_countdown(2)));
        assert_eq!(report.urgency, Urgency::Immediate);
        assert!(report.recommendation.starts_with("URGENT: U.S. will decide within 20 days"));
        assert!(report.recommendation.contains("Deadline in 2 day(s)"));
        assert!(report.recommendation.contains("Do NOT place new orders with Shenzhen Circuits"));

        let report = find_alternatives(&suppliers[0], &suppliers, "", Some(&make_countdown(8)));
        assert_eq!(report.urgency, Urgency::ThisWeek);
        assert!(report.recommendation.starts_with("Act this week:"));

        let report = find_alternatives(&suppliers[0], &suppliers, "", Some(&make_countdown(15)));
        assert_eq!(report.urgency, Urgency::PlanAhead);
        assert!(report.recommendation.contains("Deadline in 15 days"));
        assert!(report.countdown.is_some());
    }

    #[test]
    fn test_passed_deadline_reports_zero_days() {
        let suppliers = make_supplier_list();
        let report = find_alternatives(&suppliers[0], &suppliers, "", Some(&make_countdown(-2)));
        assert_eq!(report.urgency, Urgency::Immediate);
        assert!(report.recommendation.contains("Deadline in 0 day(s)"));
    }
}

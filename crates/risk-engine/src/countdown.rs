//! Countdown / forecast detection
//!
//! Finds articles announcing a future decision or action deadline
//! ("will decide within 10 days", "48-hour ultimatum", "strike imminent")
//! and turns them into a [`CountdownEvent`] whose urgency rises as the
//! deadline approaches. Countdown urgency feeds the alternatives
//! recommender; it does not alter the scorer's recency weighting.

use crate::rules::{Predicate, RuleSet};
use crate::regions::canonical_country;
use crate::text::truncate_chars;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Countdowns whose deadline passed more than this many days ago give no boost
pub const STALE_AFTER_DAYS: i64 = 7;

const MAX_HEADLINE_CHARS: usize = 200;
const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskType {
    MilitaryStrike,
    Sanctions,
    TradeDecision,
    LaborAction,
    PoliticalCrisis,
    InfrastructureClosure,
}

impl RiskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MilitaryStrike => "military_strike",
            Self::Sanctions => "sanctions",
            Self::TradeDecision => "trade_decision",
            Self::LaborAction => "labor_action",
            Self::PoliticalCrisis => "political_crisis",
            Self::InfrastructureClosure => "infrastructure_closure",
        }
    }

    /// What breaks in the supply chain if this happens
    pub fn supply_chain_impact(&self) -> &'static str {
        match self {
            Self::MilitaryStrike => {
                "Military action in the Gulf region would likely close the Strait of Hormuz, \
                 which carries 21% of global oil transit. Expect immediate oil price spikes (+20-40%), \
                 LNG shortages, and shipping rerouting via the Cape of Good Hope adding 10-14 days \
                 and $500-800K per voyage. All Middle East-origin manufacturing costs rise immediately."
            }
            Self::Sanctions => {
                "New sanctions create immediate compliance risk on open orders and payments. \
                 Suppliers in sanctioned countries may become unreachable. \
                 Expect 2-6 week delays as banks suspend transactions and logistics providers \
                 suspend routes pending legal review."
            }
            Self::TradeDecision => {
                "Trade policy changes can immediately increase landed costs by the tariff percentage. \
                 Existing orders in transit may face unexpected duties on arrival. \
                 Qualification of alternative suppliers typically takes 8-16 weeks."
            }
            Self::LaborAction => {
                "Port or factory strikes halt outbound shipments immediately. \
                 Typical duration 1-3 weeks. In-transit cargo may be stranded. \
                 Air freight alternative adds $3-8/kg premium."
            }
            Self::PoliticalCrisis => {
                "Political instability creates unpredictable factory shutdowns, \
                 border closures, and banking system disruptions. \
                 Lead times become unreliable and force majeure clauses activate."
            }
            Self::InfrastructureClosure => {
                "Infrastructure closure creates hard stop on all shipments through that route. \
                 Rerouting adds days/weeks and significant freight cost premium."
            }
        }
    }

    /// Region keyword → affected countries
    fn region_map(&self) -> &'static [(&'static str, &'static [&'static str])] {
        match self {
            Self::MilitaryStrike => &[
                (
                    "iran",
                    &[
                        "Iran", "Iraq", "UAE", "Saudi Arabia", "Kuwait", "Bahrain", "Qatar", "Oman",
                        "Jordan", "Israel", "Lebanon",
                    ],
                ),
                ("ukraine", &["Ukraine", "Russia", "Belarus", "Poland", "Romania", "Moldova"]),
                ("taiwan strait", &["Taiwan", "China", "Philippines", "Japan", "South Korea"]),
            ],
            _ => &[],
        }
    }
}

impl fmt::Display for RiskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detected deadline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountdownEvent {
    pub headline: String,
    pub published_date: DateTime<Utc>,
    pub deadline_date: DateTime<Utc>,
    pub days_from_publish: i64,
    /// Negative once the deadline has passed
    pub days_remaining: i64,
    /// Likelihood the threatened event happens, 0-100
    pub confidence: u8,
    pub base_confidence: f64,
    pub risk_type: RiskType,
    pub affected_regions: Vec<String>,
    pub supply_chain_impact: String,
    pub score_multiplier: f64,
}

#[derive(Debug, Clone, Copy)]
enum Unit {
    Days,
    Hours,
}

#[derive(Debug, Clone, Copy)]
struct CountdownRule {
    base_confidence: f64,
    unit: Unit,
    /// Window used when the pattern has no number
    default_days: i64,
}

const fn days(base_confidence: f64) -> CountdownRule {
    CountdownRule {
        base_confidence,
        unit: Unit::Days,
        default_days: 3,
    }
}

const fn implicit(base_confidence: f64, default_days: i64) -> CountdownRule {
    CountdownRule {
        base_confidence,
        unit: Unit::Days,
        default_days,
    }
}

fn pattern(re: &str) -> Predicate {
    Predicate::pattern(re).expect("countdown pattern is a valid regex")
}

/// Most specific first; the first matching pattern decides the window
static COUNTDOWN_RULES: LazyLock<RuleSet<CountdownRule>> = LazyLock::new(|| {
    RuleSet::new()
        .with_rule("will_decide_within", pattern(r"will decide within[^\d]*(\d+)\s*days?"), days(1.0))
        .with_rule("within_days", pattern(r"within[^\d]*(\d+)\s*days?"), days(0.9))
        .with_rule("in_the_next", pattern(r"in the next[^\d]*(\d+)\s*days?"), days(0.9))
        .with_rule(
            "decision_expected",
            pattern(r"(?:decision|ruling|verdict|announcement) expected[^\d]*(\d+)\s*days?"),
            days(0.85),
        )
        .with_rule("deadline", pattern(r"(?:deadline|ultimatum|expires?)[^\d]*(\d+)\s*days?"), days(0.9))
        .with_rule(
            "n_day_window",
            pattern(r"(\d+)[\s-]days? (?:ultimatum|deadline|window|warning|period|countdown)"),
            days(0.85),
        )
        .with_rule(
            "by_weekday",
            pattern(r"by (?:monday|tuesday|wednesday|thursday|friday|saturday|sunday)"),
            implicit(0.7, 3),
        )
        .with_rule(
            "hours_to_decide",
            pattern(r"(\d+)\s*hours? to decide"),
            CountdownRule {
                base_confidence: 0.95,
                unit: Unit::Hours,
                default_days: 3,
            },
        )
        .with_rule("strike_this_week", pattern(r"strike within the week"), implicit(0.8, 7))
        .with_rule("imminent", pattern(r"\bimminent\b"), implicit(0.75, 2))
});

static RISK_TYPE_RULES: LazyLock<RuleSet<RiskType>> = LazyLock::new(|| {
    RuleSet::new()
        .with_rule(
            "military_strike",
            Predicate::AnyKeyword(&[
                "strike iran", "military strike", "attack iran", "bomb", "strike on",
                "military action", "air strike", "naval strike", "troops deployed",
                "carriers repositioned", "military buildup", "pre-emptive strike",
            ]),
            RiskType::MilitaryStrike,
        )
        .with_rule(
            "sanctions",
            Predicate::AnyKeyword(&[
                "sanctions", "embargo", "export ban", "import ban", "trade ban",
                "will sanction", "considering sanctions", "new tariff",
            ]),
            RiskType::Sanctions,
        )
        .with_rule(
            "trade_decision",
            Predicate::AnyKeyword(&[
                "trade deal", "trade agreement", "tariff decision", "wto ruling",
                "trade war", "trade negotiation",
            ]),
            RiskType::TradeDecision,
        )
        .with_rule(
            "labor_action",
            Predicate::AnyKeyword(&[
                "strike vote", "walkout", "work stoppage", "labor action",
                "union vote", "industrial action",
            ]),
            RiskType::LaborAction,
        )
        .with_rule(
            "political_crisis",
            Predicate::AnyKeyword(&[
                "coup", "election dispute", "political crisis", "regime change",
                "government collapse", "civil unrest",
            ]),
            RiskType::PoliticalCrisis,
        )
        .with_rule(
            "infrastructure_closure",
            Predicate::AnyKeyword(&[
                "port closure", "canal closure", "strait closure", "border closure",
                "airspace closure", "terminal shutdown",
            ]),
            RiskType::InfrastructureClosure,
        )
});

/// Risk type of countdown text; political crisis when nothing matches
pub fn classify_risk_type(text_lower: &str) -> RiskType {
    RISK_TYPE_RULES.classify(text_lower, RiskType::PoliticalCrisis)
}

/// Confidence scaling by how close the deadline is
pub fn stage_factor(days_remaining: i64, days_from_publish: i64) -> f64 {
    if days_remaining > days_from_publish {
        0.60
    } else if days_remaining > 3 {
        0.75
    } else if days_remaining >= 0 {
        0.95
    } else {
        0.40
    }
}

/// Urgency multiplier, highest on the deadline day
pub fn score_multiplier(days_remaining: i64) -> f64 {
    match days_remaining {
        d if d < 0 => 0.6,
        0 => 2.0,
        1..=3 => 1.8,
        4..=7 => 1.5,
        8..=14 => 1.2,
        _ => 0.9,
    }
}

/// Scan an article for deadline language.
///
/// An undated article is treated as published at `now`. A window too large
/// to place on the calendar yields `None`.
pub fn detect_countdown(
    title: &str,
    description: &str,
    published_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<CountdownEvent> {
    let text = format!("{} {}", title, description).to_lowercase();
    let hit = COUNTDOWN_RULES.first_match(&text)?;
    let rule = *hit.outcome;

    let days_from_publish = match (hit.number, rule.unit) {
        (Some(n), Unit::Days) => i64::from(n),
        (Some(hours), Unit::Hours) => (i64::from(hours) + 23) / 24,
        (None, _) => rule.default_days,
    };

    // Deadlines beyond chrono's range are not real deadlines
    let published_date = published_at.unwrap_or(now);
    let deadline_date = published_date.checked_add_signed(Duration::try_days(days_from_publish)?)?;
    let days_remaining = (deadline_date - now).num_seconds().div_euclid(SECONDS_PER_DAY);

    let confidence =
        (rule.base_confidence * stage_factor(days_remaining, days_from_publish) * 100.0).round() as u8;

    let risk_type = classify_risk_type(&text);
    let affected_regions = risk_type
        .region_map()
        .iter()
        .find(|(key, _)| text.contains(key))
        .map(|(_, countries)| countries.iter().map(|c| canonical_country(c)).collect())
        .unwrap_or_default();

    Some(CountdownEvent {
        headline: truncate_chars(title, MAX_HEADLINE_CHARS).to_string(),
        published_date,
        deadline_date,
        days_from_publish,
        days_remaining,
        confidence,
        base_confidence: rule.base_confidence,
        risk_type,
        affected_regions,
        supply_chain_impact: risk_type.supply_chain_impact().to_string(),
        score_multiplier: score_multiplier(days_remaining),
    })
}

/// Points (0-25) a countdown adds to an affected supplier's urgency
pub fn countdown_to_score_boost(event: &CountdownEvent) -> f64 {
    if event.days_remaining < -STALE_AFTER_DAYS {
        return 0.0;
    }
    (15.0 * f64::from(event.confidence) / 100.0 * event.score_multiplier).min(25.0)
}

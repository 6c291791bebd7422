//! Rule-based response recommendations
//!
//! Turns a supplier's score breakdown into an ordered action list. The
//! disruption types behind the top events pick the playbook; the score
//! decides how far down each playbook to go.

use crate::engine::SupplierBreakdown;
use crate::scorer::ScoredEventContribution;
use crate::text::{contains_any, truncate_chars};
use crate::{DisruptionType, RiskLevel, Supplier};
use serde::Serialize;
use std::fmt;

/// Rows of the breakdown inspected for disruption types
const TYPE_SCAN_ROWS: usize = 5;

const MAX_DO_NOT_DO: usize = 4;
const MAX_TITLE_CHARS: usize = 100;

/// How fast to respond, by score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseUrgency {
    Watch,
    Low,
    Medium,
    High,
    Critical,
}

impl ResponseUrgency {
    /// 75 / 60 / 40 / 20 cut-offs
    pub fn from_score(score: f64) -> Self {
        if score >= 75.0 {
            Self::Critical
        } else if score >= 60.0 {
            Self::High
        } else if score >= 40.0 {
            Self::Medium
        } else if score >= 20.0 {
            Self::Low
        } else {
            Self::Watch
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
            Self::Watch => "WATCH",
        }
    }
}

impl fmt::Display for ResponseUrgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionCategory {
    Inventory,
    Redirect,
    DualSource,
    Monitor,
    Escalate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Action {
    /// 1 is most urgent
    pub priority: usize,
    pub action: String,
    pub detail: String,
    pub timeframe: String,
    pub category: ActionCategory,
}

impl Action {
    fn new(
        priority: usize,
        action: &str,
        detail: String,
        timeframe: &str,
        category: ActionCategory,
    ) -> Self {
        Self {
            priority,
            action: action.to_string(),
            detail,
            timeframe: timeframe.to_string(),
            category,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendationReport {
    pub supplier: String,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub urgency: ResponseUrgency,
    pub disruption_types: Vec<DisruptionType>,
    pub situation_summary: String,
    pub actions: Vec<Action>,
    pub lead_time_warning: String,
    pub alternative_note: String,
    pub do_not_do: Vec<String>,
}

/// Title keywords per disruption type, in reporting order
const TYPE_KEYWORDS: &[(DisruptionType, &[&str])] = &[
    (
        DisruptionType::NaturalDisaster,
        &["earthquake", "tsunami", "flood", "typhoon", "hurricane", "cyclone", "storm", "wildfire"],
    ),
    (
        DisruptionType::LaborStrike,
        &["strike", "walkout", "labor", "union", "worker"],
    ),
    (
        DisruptionType::WarConflict,
        &["war", "conflict", "military", "invasion", "missile", "attack", "coup"],
    ),
    (
        DisruptionType::TradePolicy,
        &["tariff", "sanction", "embargo", "trade war", "export ban", "import ban"],
    ),
    (
        DisruptionType::LogisticsFailure,
        &["port congestion", "vessel", "grounded", "canal", "shipping delay", "blocked"],
    ),
    (
        DisruptionType::InfrastructureDamage,
        &["explosion", "fire", "collapse", "pipeline", "power outage", "blackout"],
    ),
    (
        DisruptionType::Shortage,
        &["shortage", "scarcity", "rationing", "semiconductor", "chip shortage"],
    ),
];

/// Disruption types named in the titles of the top breakdown rows.
///
/// A title can raise several types. `[Other]` when none match.
pub fn detect_disruption_types(rows: &[ScoredEventContribution]) -> Vec<DisruptionType> {
    let titles: Vec<String> = rows
        .iter()
        .take(TYPE_SCAN_ROWS)
        .map(|r| r.title.to_lowercase())
        .collect();

    let types: Vec<DisruptionType> = TYPE_KEYWORDS
        .iter()
        .filter(|(_, words)| titles.iter().any(|t| contains_any(t, words)))
        .map(|(kind, _)| *kind)
        .collect();

    if types.is_empty() {
        vec![DisruptionType::Other]
    } else {
        types
    }
}

/// Usual length of a disruption of this type
pub fn typical_duration(kind: DisruptionType) -> &'static str {
    match kind {
        DisruptionType::NaturalDisaster => "1-4 weeks",
        DisruptionType::LaborStrike => "1-3 weeks",
        DisruptionType::WarConflict | DisruptionType::TradePolicy => "months to years",
        DisruptionType::LogisticsFailure => "days to 2 weeks",
        DisruptionType::InfrastructureDamage => "1-8 weeks",
        DisruptionType::Shortage => "weeks to months",
        _ => "unknown",
    }
}

/// One-line note on how much buffer a tier gives
pub fn tier_context(tier: &str) -> &'static str {
    match tier.trim() {
        "1" => "This is a Tier 1 (direct) supplier: disruption impacts you immediately.",
        "2" => "This is a Tier 2 supplier: disruption affects your Tier 1 suppliers first, giving you slightly more buffer time.",
        "3" => "This is a Tier 3 (raw material) supplier: you likely have 2-4 weeks buffer before this reaches your production.",
        _ => "",
    }
}

fn tier_lead_time_warning(tier: &str) -> &'static str {
    match tier.trim() {
        "1" => "As a Tier 1 supplier, any disruption here impacts your production directly. No buffer from downstream.",
        "2" => "As a Tier 2 supplier, your Tier 1 suppliers absorb the first impact. You typically have 1-3 weeks before it reaches you.",
        _ => "As a Tier 3 supplier, you have the most buffer time, typically 3-6 weeks before raw material shortages affect production.",
    }
}

/// Distance of the highest-ranked counted event that has one
fn closest_event_miles(rows: &[ScoredEventContribution]) -> Option<f64> {
    rows.iter().filter(|r| r.counted).find_map(|r| r.miles)
}

/// Working state while the playbooks run
struct Plan {
    actions: Vec<Action>,
    do_not_do: Vec<String>,
    lead_time_warning: Option<String>,
    alternative_note: Option<String>,
}

impl Plan {
    fn act(&mut self, priority: usize, action: &str, detail: String, timeframe: &str, category: ActionCategory) {
        self.actions
            .push(Action::new(priority, action, detail, timeframe, category));
    }

    fn avoid(&mut self, mistake: &str) {
        self.do_not_do.push(mistake.to_string());
    }
}

/// Build the recommendation report for a scored supplier
pub fn recommend(supplier: &Supplier, breakdown: &SupplierBreakdown) -> RecommendationReport {
    let score = breakdown.score;
    let rows = &breakdown.contributions;
    let name = &supplier.name;
    let city = &supplier.city;
    let country = &supplier.country;
    let category = &supplier.category;

    let urgency = ResponseUrgency::from_score(score);
    let disruption_types = detect_disruption_types(rows);
    let closest = closest_event_miles(rows);

    let distance = match closest {
        Some(miles) if miles > 0.0 => format!("{:.0} miles from {}", miles, city),
        _ => format!("in {}", country),
    };
    let drivers = disruption_types
        .iter()
        .map(DisruptionType::label)
        .collect::<Vec<_>>()
        .join(" and ");
    let top_title = rows
        .first()
        .map(|r| truncate_chars(&r.title, MAX_TITLE_CHARS))
        .unwrap_or("No events detected");

    let mut situation_summary = format!(
        "{} in {}, {} is currently rated {} risk ({:.0}/100). \
         The primary driver is {} activity detected {}. Most recent signal: \"{}\".",
        name, city, country, breakdown.level, score, drivers, distance, top_title
    );
    let tier_note = tier_context(&supplier.tier);
    if !tier_note.is_empty() {
        situation_summary.push(' ');
        situation_summary.push_str(tier_note);
    }
    situation_summary.push_str(if score >= 60.0 {
        " Immediate action is recommended."
    } else {
        " Situation warrants close monitoring."
    });

    let mut plan = Plan {
        actions: Vec::new(),
        do_not_do: Vec::new(),
        lead_time_warning: None,
        alternative_note: None,
    };

    for kind in &disruption_types {
        match kind {
            DisruptionType::NaturalDisaster => match closest {
                Some(miles) if miles < 200.0 && score >= 60.0 => {
                    plan.act(
                        1,
                        "Stock Up Immediately",
                        format!(
                            "A natural disaster is active within {:.0} miles of {}. Contact {} TODAY to confirm \
                             current operational status. If operational, place an emergency purchase order for \
                             4-8 weeks of safety stock before the disruption worsens. Typical recovery: {}.",
                            miles,
                            city,
                            name,
                            typical_duration(*kind)
                        ),
                        "Immediate (within 24h)",
                        ActionCategory::Inventory,
                    );
                    plan.act(
                        2,
                        "Identify Backup Supplier",
                        format!(
                            "In parallel, identify at least one alternative supplier for {} outside of {}. \
                             Even if you don't activate them, a confirmed backup with quoted lead times and \
                             pricing protects you if the situation escalates.",
                            category, country
                        ),
                        "Within 48 hours",
                        ActionCategory::Redirect,
                    );
                    plan.avoid("Don't wait for official confirmation. Natural disasters move faster than communications.");
                    plan.avoid("Don't cancel existing orders without confirming the supplier is actually affected.");
                }
                Some(miles) if miles < 200.0 && score >= 30.0 => {
                    plan.act(
                        1,
                        "Contact Supplier for Status Update",
                        format!(
                            "A {} event is within {:.0} miles. Reach out to {} to confirm their facilities are \
                             unaffected. Request a contingency plan and ask about their own backup production capacity.",
                            kind.label(),
                            miles,
                            name
                        ),
                        "Within 48 hours",
                        ActionCategory::Monitor,
                    );
                    plan.act(
                        2,
                        "Review Current Inventory Levels",
                        format!(
                            "Check how many weeks of stock you currently hold for {} from this supplier. \
                             If below 4 weeks, consider a precautionary top-up order.",
                            category
                        ),
                        "This week",
                        ActionCategory::Inventory,
                    );
                }
                _ => {}
            },

            DisruptionType::LaborStrike => {
                plan.act(
                    1,
                    "Confirm Strike Scope with Supplier",
                    format!(
                        "Strikes are often announced 3-14 days in advance. Contact {} immediately to understand: \
                         (1) Is it at their specific facility or a nearby port? (2) What is the expected duration? \
                         (3) Do they have a contingency shipping plan? Port strikes affect outbound shipping even \
                         if the factory is unaffected.",
                        name
                    ),
                    "Immediate",
                    ActionCategory::Escalate,
                );
                if score >= 50.0 {
                    plan.act(
                        2,
                        "Accelerate In-Transit Orders",
                        format!(
                            "If you have any orders currently in production or awaiting shipment, request {} to \
                             expedite shipping before the strike begins. Even a partial shipment now reduces your \
                             exposure significantly.",
                            name
                        ),
                        "Within 48 hours",
                        ActionCategory::Inventory,
                    );
                    plan.act(
                        3,
                        "Map Alternative Shipping Routes",
                        format!(
                            "If the strike is port-specific, ask {} whether they can route through an alternative \
                             port. Air freight may be cost-justified for high-value or time-critical items.",
                            name
                        ),
                        "Within 48 hours",
                        ActionCategory::Redirect,
                    );
                }
                plan.avoid("Don't assume the strike will resolve quickly. Port strikes often last 2-4 weeks.");
                plan.lead_time_warning = Some(format!(
                    "Strike-related delays typically add 2-6 weeks to lead times from {}.",
                    country
                ));
            }

            DisruptionType::WarConflict => {
                plan.act(
                    1,
                    "Escalate to Procurement Leadership",
                    format!(
                        "Active conflict near {} poses a serious long-term supply risk. This requires \
                         executive-level decision making. Escalate immediately with a brief on current inventory \
                         levels, open orders and alternative suppliers.",
                        city
                    ),
                    "Immediate",
                    ActionCategory::Escalate,
                );
                plan.act(
                    2,
                    "Begin Supplier Qualification in Safe Region",
                    format!(
                        "Start qualification of an alternative {} supplier outside the conflict zone. Target a \
                         country with no geopolitical overlap with {}. Plan for a 3-12 month supply gap.",
                        category, country
                    ),
                    "This week",
                    ActionCategory::DualSource,
                );
                plan.act(
                    3,
                    "Build 60-90 Day Safety Stock",
                    "While the supplier is still operational, build a larger buffer than usual. 60-90 days of \
                     stock gives you time to qualify and onboard an alternative supplier without a production stop."
                        .to_string(),
                    "Within 2 weeks",
                    ActionCategory::Inventory,
                );
                plan.avoid("Don't assume the conflict will stay localized. Supply chain impacts spread faster than news coverage.");
                plan.avoid("Don't place large new orders that may be undeliverable if the supplier becomes unreachable.");
                plan.alternative_note = Some(format!(
                    "Finding a {} supplier outside {} should be treated as a priority project, not a contingency plan.",
                    category, country
                ));
            }

            DisruptionType::TradePolicy => {
                plan.act(
                    1,
                    "Assess Tariff / Sanction Impact",
                    format!(
                        "Trade policy changes affecting {} could significantly change your landed cost or the \
                         legality of imports. Engage your trade compliance team or customs broker to understand: \
                         (1) Which HS codes are affected? (2) What is the effective date? (3) Are there exemptions?",
                        country
                    ),
                    "Within 48 hours",
                    ActionCategory::Escalate,
                );
                if score >= 50.0 {
                    plan.act(
                        2,
                        "Front-Load Orders Before Effective Date",
                        "If a tariff hike or import ban has an announced effective date, place larger orders now \
                         to build inventory at the current duty rate. Even 3-4 months of extra stock may be cheaper \
                         than paying higher tariffs on every future shipment."
                            .to_string(),
                        "This week",
                        ActionCategory::Inventory,
                    );
                    plan.act(
                        3,
                        "Evaluate Country-of-Origin Shift",
                        format!(
                            "Explore whether {} or a comparable supplier can produce in a country not subject to \
                             the new restrictions. Ask {} if they can ship equivalent product from a non-affected facility.",
                            name, name
                        ),
                        "This month",
                        ActionCategory::Redirect,
                    );
                }
                plan.avoid("Don't assume your current classification is correct. Misclassification under new tariff schedules is common.");
            }

            DisruptionType::LogisticsFailure => {
                plan.act(
                    1,
                    "Check In-Transit Shipment Status",
                    format!(
                        "Port congestion or logistics failures affect shipments already en route. Check the \
                         status of all open purchase orders from {} and ask your freight forwarder for \
                         vessel and container tracking updates.",
                        name
                    ),
                    "Immediate",
                    ActionCategory::Monitor,
                );
                plan.act(
                    2,
                    "Evaluate Air Freight for Critical Orders",
                    "For urgent or high-value orders stuck in congested ports, air freight may be worth the \
                     premium. Logistics failures typically resolve in 1-2 weeks, so air freight makes sense only \
                     for items that would stop production."
                        .to_string(),
                    "Within 48 hours",
                    ActionCategory::Redirect,
                );
                plan.lead_time_warning = Some(format!(
                    "Port congestion typically adds 1-3 weeks to ocean freight lead times from {}.",
                    country
                ));
                plan.avoid("Don't cancel orders that are already in transit. Rerouting is usually cheaper than cancellation fees.");
            }

            DisruptionType::Shortage => {
                plan.act(
                    1,
                    "Secure Allocation with Supplier",
                    format!(
                        "During shortages, suppliers often allocate to their largest customers first. Contact {} \
                         to confirm your allocation and any quantity limits per order period.",
                        name
                    ),
                    "Immediate",
                    ActionCategory::Inventory,
                );
                plan.act(
                    2,
                    "Qualify Alternative Sources",
                    format!(
                        "Shortages in {} typically affect multiple suppliers in the same region. Start \
                         qualifying an alternative supplier in a different geography with better access to the \
                         scarce input.",
                        category
                    ),
                    "This week",
                    ActionCategory::DualSource,
                );
                plan.avoid("Don't rely on spot market purchases. During shortages spot prices can be 2-5x contract rates.");
            }

            _ => {}
        }
    }

    let monitor_priority = plan.actions.len() + 1;
    plan.act(
        monitor_priority,
        "Set Up Daily Monitoring",
        format!(
            "Recompute {}'s risk score daily and alert when it crosses 60. \
             Re-evaluate the response plan if the score rises by more than 15 points.",
            name
        ),
        "Ongoing",
        ActionCategory::Monitor,
    );

    let alternative_note = plan.alternative_note.unwrap_or_else(|| {
        if score >= 60.0 {
            format!(
                "Given the high risk score, begin searching for an alternative {} supplier in a different region. \
                 A qualified backup gives you negotiating leverage and insurance against escalation.",
                category
            )
        } else if score >= 30.0 {
            format!(
                "Consider identifying 1-2 backup {} suppliers as a precaution. Vetted alternatives on file \
                 reduce response time if the situation worsens.",
                category
            )
        } else {
            format!(
                "Risk is currently low. Use the time to map potential backup {} suppliers in case conditions change.",
                category
            )
        }
    });

    let mut actions = plan.actions;
    // Stable: playbook order is kept within a priority
    actions.sort_by_key(|a| a.priority);
    let mut do_not_do = plan.do_not_do;
    do_not_do.truncate(MAX_DO_NOT_DO);

    RecommendationReport {
        supplier: name.clone(),
        risk_score: score,
        risk_level: breakdown.level,
        urgency,
        disruption_types,
        situation_summary,
        actions,
        lead_time_warning: plan
            .lead_time_warning
            .unwrap_or_else(|| tier_lead_time_warning(&supplier.tier).to_string()),
        alternative_note,
        do_not_do,
    }
}

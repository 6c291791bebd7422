//! Ordered first-match rule lists
//!
//! Several classifiers (severity tiers, countdown patterns, risk types) are
//! an ordered list of `(predicate, outcome)` pairs evaluated top-down that
//! stop at the first hit. Reordering rules changes behaviour, so the order
//! of `with_rule` calls is significant.

use regex::Regex;

/// Test applied to lowercased text
#[derive(Debug, Clone)]
pub enum Predicate {
    /// Any of the substrings occurs
    AnyKeyword(&'static [&'static str]),
    /// Regex matches; capture group 1, when present, is read as a number
    Pattern(Regex),
}

impl Predicate {
    /// Compile a regex predicate
    pub fn pattern(re: &str) -> std::result::Result<Self, regex::Error> {
        Regex::new(re).map(Self::Pattern)
    }

    /// `None` when the predicate does not hold, otherwise the numeric capture
    fn evaluate(&self, text: &str) -> Option<Option<u32>> {
        match self {
            Self::AnyKeyword(words) => words.iter().any(|w| text.contains(w)).then_some(None),
            Self::Pattern(re) => re
                .captures(text)
                .map(|caps| caps.get(1).and_then(|m| m.as_str().parse().ok())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Rule<O> {
    pub name: &'static str,
    pub predicate: Predicate,
    pub outcome: O,
}

/// The rule that fired, with its numeric capture if any
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleMatch<'a, O> {
    pub rule: &'static str,
    pub outcome: &'a O,
    pub number: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct RuleSet<O> {
    rules: Vec<Rule<O>>,
}

impl<O> Default for RuleSet<O> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<O> RuleSet<O> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule; it is evaluated after every rule added before it
    pub fn with_rule(mut self, name: &'static str, predicate: Predicate, outcome: O) -> Self {
        self.rules.push(Rule {
            name,
            predicate,
            outcome,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[Rule<O>] {
        &self.rules
    }

    /// Evaluate top-down against `text`, which must already be lowercased
    pub fn first_match(&self, text: &str) -> Option<RuleMatch<'_, O>> {
        self.rules.iter().find_map(|rule| {
            rule.predicate.evaluate(text).map(|number| RuleMatch {
                rule: rule.name,
                outcome: &rule.outcome,
                number,
            })
        })
    }
}

impl<O: Clone> RuleSet<O> {
    /// Outcome of the first matching rule, or `default`
    pub fn classify(&self, text: &str, default: O) -> O {
        self.first_match(text)
            .map(|m| m.outcome.clone())
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_match_wins() {
        let rules = RuleSet::new()
            .with_rule("specific", Predicate::AnyKeyword(&["port strike"]), "specific")
            .with_rule("general", Predicate::AnyKeyword(&["strike"]), "general");

        assert_eq!(rules.classify("dock workers port strike", "none"), "specific");
        assert_eq!(rules.classify("general strike called", "none"), "general");
        assert_eq!(rules.classify("calm seas", "none"), "none");
    }

    #[test]
    fn test_order_matters() {
        let rules = RuleSet::new()
            .with_rule("general", Predicate::AnyKeyword(&["strike"]), "general")
            .with_rule("specific", Predicate::AnyKeyword(&["port strike"]), "specific");

        assert_eq!(rules.classify("port strike", "none"), "general");
    }

    #[test]
    fn test_pattern_capture() {
        let rules = RuleSet::new()
            .with_rule("days", Predicate::pattern(r"within (\d+) days").unwrap(), 1.0)
            .with_rule("soon", Predicate::pattern(r"\bsoon\b").unwrap(), 0.5);

        let m = rules.first_match("decision within 10 days").unwrap();
        assert_eq!(m.rule, "days");
        assert_eq!(m.number, Some(10));

        let m = rules.first_match("coming soon").unwrap();
        assert_eq!(m.rule, "soon");
        assert_eq!(m.number, None);
        assert_eq!(*m.outcome, 0.5);

        assert!(rules.first_match("nothing here").is_none());
        assert_eq!(rules.len(), 2);
    }
}

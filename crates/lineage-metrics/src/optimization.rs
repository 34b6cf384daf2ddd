//! Optimization-direction inference as an ordered rule table.
//!
//! Each rule pairs a predicate over the lowercased `title + type` with a
//! target. Rules are evaluated in order and the first match wins; when
//! nothing matches the table's fallback applies (minimize, so unknown
//! metrics are treated as risk-bearing quantities to be reduced).

use crate::{Metric, OptimizationTarget};

/// Test applied to the lowercased `title type` text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Predicate {
    /// Any keyword occurs as a substring.
    AnyKeyword(&'static [&'static str]),
    /// Any keyword occurs once the `masked` words are blanked out.
    AnyKeywordMasking {
        /// Keywords to look for.
        words: &'static [&'static str],
        /// Words removed from the text first.
        masked: &'static [&'static str],
    },
    /// A keyword from `any_of` and a keyword from `with` both occur.
    Compound {
        /// First keyword group.
        any_of: &'static [&'static str],
        /// Second keyword group.
        with: &'static [&'static str],
    },
}

impl Predicate {
    /// Evaluates against already-lowercased text.
    pub fn matches(&self, text: &str) -> bool {
        let contains_any = |words: &[&str]| words.iter().any(|w| text.contains(w));
        match self {
            Self::AnyKeyword(words) => contains_any(words),
            Self::AnyKeywordMasking { words, masked } => {
                let stripped = masked.iter().fold(text.to_string(), |acc, m| acc.replace(m, " "));
                words.iter().any(|w| stripped.contains(w))
            }
            Self::Compound { any_of, with } => contains_any(any_of) && contains_any(with),
        }
    }
}

/// One row of the rule table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OptimizationRule {
    /// Short name, for logs and tests.
    pub name: &'static str,
    /// When the rule applies.
    pub predicate: Predicate,
    /// Target it assigns.
    pub target: OptimizationTarget,
}

/// Keywords of quantities to reduce.
pub const MINIMIZE_KEYWORDS: &[&str] = &[
    "stress",
    "strain",
    "deformation",
    "displacement",
    "deflection",
    "temperature",
    "heat",
    "cost",
    "weight",
    "mass",
    "time",
    "latency",
    "risk",
    "error",
    "loss",
    "vibration",
    "noise",
    "drag",
    "wear",
    "damage",
    "consumption",
];

/// Keywords of quantities to increase.
pub const MAXIMIZE_KEYWORDS: &[&str] = &[
    "efficiency",
    "safety",
    "margin",
    "strength",
    "throughput",
    "capacity",
    "stiffness",
    "performance",
    "yield",
    "reliability",
    "durability",
    "output",
    "score",
    "accuracy",
    "quality",
    "life",
];

/// Words that contain a minimize keyword without meaning it.
pub const MINIMIZE_MASKED: &[&str] = &["lifetime"];

/// Built-in rules, in evaluation order.
pub const DEFAULT_RULES: &[OptimizationRule] = &[
    OptimizationRule {
        name: "safety-factor",
        predicate: Predicate::Compound {
            any_of: &["safety", "margin"],
            with: &["factor"],
        },
        target: OptimizationTarget::Maximize,
    },
    OptimizationRule {
        name: "load-ratio",
        predicate: Predicate::Compound {
            any_of: &["stress", "load"],
            with: &["ratio"],
        },
        target: OptimizationTarget::Minimize,
    },
    OptimizationRule {
        name: "minimize-keyword",
        predicate: Predicate::AnyKeywordMasking {
            words: MINIMIZE_KEYWORDS,
            masked: MINIMIZE_MASKED,
        },
        target: OptimizationTarget::Minimize,
    },
    OptimizationRule {
        name: "maximize-keyword",
        predicate: Predicate::AnyKeyword(MAXIMIZE_KEYWORDS),
        target: OptimizationTarget::Maximize,
    },
];

/// Ordered rule table with a fallback target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptimizationRules {
    rules: Vec<OptimizationRule>,
    fallback: OptimizationTarget,
}

impl Default for OptimizationRules {
    fn default() -> Self {
        Self {
            rules: DEFAULT_RULES.to_vec(),
            fallback: OptimizationTarget::Minimize,
        }
    }
}

impl OptimizationRules {
    /// Creates an empty table with the given fallback.
    pub fn new(fallback: OptimizationTarget) -> Self {
        Self {
            rules: Vec::new(),
            fallback,
        }
    }

    /// Appends a rule after the existing ones.
    pub fn with_rule(mut self, rule: OptimizationRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Inserts a rule ahead of the existing ones.
    pub fn with_override(mut self, rule: OptimizationRule) -> Self {
        self.rules.insert(0, rule);
        self
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &[OptimizationRule] {
        &self.rules
    }

    /// First rule matching the metric identity, if any.
    pub fn matching_rule(&self, title: &str, metric_type: &str) -> Option<&OptimizationRule> {
        let text = format!("{title} {metric_type}").to_lowercase();
        self.rules.iter().find(|rule| rule.predicate.matches(&text))
    }

    /// Classifies a metric identity.
    pub fn classify(&self, title: &str, metric_type: &str) -> OptimizationTarget {
        match self.matching_rule(title, metric_type) {
            Some(rule) => {
                log::trace!("metric '{title}' matched rule '{}'", rule.name);
                rule.target
            }
            None => self.fallback,
        }
    }

    /// Target of `metric`: its explicit target, else the classified one.
    pub fn target_for(&self, metric: &Metric) -> OptimizationTarget {
        metric
            .optimization_target
            .unwrap_or_else(|| self.classify(&metric.title, &metric.metric_type))
    }
}

/// Target of `metric` under the built-in rules.
pub fn get_optimization_target(metric: &Metric) -> OptimizationTarget {
    OptimizationRules::default().target_for(metric)
}

//! Pluggable world-rule dispatch for the rule-adherence check.
//!
//! World rules are free-text expressions; rather than a hard-coded chain of
//! `if` statements, the rule book maps rule names to registered predicates.
//! Unknown rule names fall back to a conservative keyword scan over the
//! rule expression.

use std::collections::BTreeMap;
use std::fmt;

use contracts::{ActionType, CharacterAction, WorldRule};

/// A predicate that returns `true` when the action violates the rule.
pub type RulePredicate = Box<dyn Fn(&CharacterAction) -> bool + Send + Sync>;

/// Words in a rule expression that carry no prohibition content.
const EXPR_STOPWORDS: [&str; 14] = [
    "the", "and", "not", "no", "never", "must", "shall", "is", "are", "rule", "action", "actions",
    "forbidden", "prohibited",
];

/// Terms that mark an intent as flight for the built-in `no_flight` rule.
const FLIGHT_TERMS: [&str; 6] = ["fly", "flies", "flying", "flight", "airborne", "levitate"];

/// Registry of named rule predicates consulted by the adjudicator.
pub struct RuleBook {
    predicates: BTreeMap<String, RulePredicate>,
}

impl fmt::Debug for RuleBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleBook")
            .field("rules", &self.predicates.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl RuleBook {
    pub fn new() -> Self {
        Self {
            predicates: BTreeMap::new(),
        }
    }

    /// The default book ships the `no_flight` movement rule.
    pub fn with_defaults() -> Self {
        let mut book = Self::new();
        book.register("no_flight", |action| {
            matches!(action.action_type, ActionType::Move)
                && contains_any(&action_text(action), &FLIGHT_TERMS)
        });
        book
    }

    /// Register a predicate for a rule name, replacing any previous one.
    pub fn register<F>(&mut self, name: impl Into<String>, predicate: F)
    where
        F: Fn(&CharacterAction) -> bool + Send + Sync + 'static,
    {
        self.predicates.insert(name.into(), Box::new(predicate));
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.predicates.contains_key(name)
    }

    /// Whether the action violates the given rule.
    pub fn violates(&self, rule: &WorldRule, action: &CharacterAction) -> bool {
        match self.predicates.get(&rule.name) {
            Some(predicate) => predicate(action),
            None => expr_keyword_violation(rule, action),
        }
    }
}

impl Default for RuleBook {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn action_text(action: &CharacterAction) -> String {
    let mut text = action.intent.to_ascii_lowercase();
    text.push(' ');
    text.push_str(&action.justification.to_ascii_lowercase());
    text
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

/// Fallback for unregistered rules: the action violates the rule when its
/// intent or justification mentions any substantive keyword of the rule
/// expression. Conservative by design of the keyword list, not clever.
fn expr_keyword_violation(rule: &WorldRule, action: &CharacterAction) -> bool {
    let text = action_text(action);
    rule.expr
        .split(|c: char| !c.is_ascii_alphanumeric())
        .map(|word| word.to_ascii_lowercase())
        .filter(|word| word.len() >= 4 && !EXPR_STOPWORDS.contains(&word.as_str()))
        .any(|word| text.contains(&word))
}

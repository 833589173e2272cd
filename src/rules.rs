//! Ordered first-match-wins rule lists for course type and group number.
//!
//! The lists are plain data: a vendor with a new vocabulary gets new rules
//! pushed onto a [`RuleSet`], the evaluation code stays the same.

use crate::error::Result;
use crate::event::EventType;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

/// Maps a pattern found in title + description to a course type
#[derive(Debug, Clone)]
pub struct TypeRule {
    pattern: Regex,
    event_type: EventType,
    label: String,
}

impl TypeRule {
    /// `pattern` is compiled case-insensitively
    pub fn new(pattern: &str, event_type: EventType, label: &str) -> Result<Self> {
        Ok(Self {
            pattern: case_insensitive(pattern)?,
            event_type,
            label: label.to_string(),
        })
    }
}

/// Result of course-type classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub event_type: EventType,
    pub label: String,
}

impl Classification {
    fn other() -> Self {
        Self {
            event_type: EventType::Other,
            label: "Autre".to_string(),
        }
    }
}

/// Finds a group number; the first capture group holds the digits
#[derive(Debug, Clone)]
pub struct GroupRule {
    pattern: Regex,
}

impl GroupRule {
    /// `pattern` is compiled case-insensitively and must have one capture group
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            pattern: case_insensitive(pattern)?,
        })
    }

    /// `None` when the rule does not match. Digit runs too large for `u32`
    /// saturate at `u32::MAX`.
    fn extract(&self, text: &str) -> Option<Option<u32>> {
        let captures = self.pattern.captures(text)?;
        let digits = captures.get(1).map(|m| m.as_str());
        Some(digits.and_then(|d| match d.parse::<u32>() {
            Ok(n) => Some(n),
            Err(_) if !d.is_empty() && d.bytes().all(|b| b.is_ascii_digit()) => Some(u32::MAX),
            Err(_) => None,
        }))
    }
}

fn case_insensitive(pattern: &str) -> Result<Regex> {
    Ok(RegexBuilder::new(pattern).case_insensitive(true).build()?)
}

const TYPE_VOCABULARY: &[(&str, EventType, &str)] = &[
    (r"\bCM\b", EventType::Cm, "Cours"),
    (r"\bTD\b", EventType::Td, "TD"),
    (r"\bTP\b", EventType::Tp, "TP"),
    (r"\bExamen\b", EventType::Exam, "Examen"),
    (r"\bDS\b", EventType::Exam, "DS"),
    (r"\bPartiel\b", EventType::Exam, "Partiel"),
    (r"\bFérié\b", EventType::Holiday, "Férié"),
];

const GROUP_VOCABULARY: &[&str] = &[
    r"groupe\s*([0-9]+)",
    r"gr\.?\s*([0-9]+)",
    r"gpe\s*([0-9]+)",
    r"g([0-9]+)",
    // ADE semester-group convention, e.g. S1G2
    r"S[0-9]+G([0-9]+)",
];

static STANDARD_RULES: Lazy<RuleSet> = Lazy::new(|| {
    let type_rules = TYPE_VOCABULARY
        .iter()
        .filter_map(|(pattern, event_type, label)| TypeRule::new(pattern, *event_type, label).ok())
        .collect();
    let group_rules = GROUP_VOCABULARY
        .iter()
        .filter_map(|pattern| GroupRule::new(pattern).ok())
        .collect();
    RuleSet::new(type_rules, group_rules)
});

/// The heuristic rule lists used by the normalizer
#[derive(Debug, Clone)]
pub struct RuleSet {
    type_rules: Vec<TypeRule>,
    group_rules: Vec<GroupRule>,
}

impl RuleSet {
    pub fn new(type_rules: Vec<TypeRule>, group_rules: Vec<GroupRule>) -> Self {
        Self {
            type_rules,
            group_rules,
        }
    }

    /// Rules for CELCAT, ADE Campus and Hyperplanning feeds
    pub fn standard() -> Self {
        STANDARD_RULES.clone()
    }

    /// Append a type rule; it is tried after the existing ones
    pub fn push_type_rule(&mut self, rule: TypeRule) {
        self.type_rules.push(rule);
    }

    /// Append a group rule; it is tried after the existing ones
    pub fn push_group_rule(&mut self, rule: GroupRule) {
        self.group_rules.push(rule);
    }

    /// Classify a session from its title and description.
    /// No match yields `OTHER` / "Autre".
    pub fn classify(&self, title: &str, description: Option<&str>) -> Classification {
        let combined = format!("{} {}", title, description.unwrap_or(""));

        self.type_rules
            .iter()
            .find(|rule| rule.pattern.is_match(&combined))
            .map(|rule| Classification {
                event_type: rule.event_type,
                label: rule.label.clone(),
            })
            .unwrap_or_else(Classification::other)
    }

    /// Group number from the first rule matching `text`; later rules are
    /// not consulted once one matches
    pub fn group_number(&self, text: &str) -> Option<u32> {
        self.group_rules.iter().find_map(|rule| rule.extract(text))?
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_rules_compile() {
        let rules = RuleSet::standard();
        assert_eq!(rules.type_rules.len(), TYPE_VOCABULARY.len());
        assert_eq!(rules.group_rules.len(), GROUP_VOCABULARY.len());
    }

    #[test]
    fn test_classify_td() {
        let c = RuleSet::standard().classify("Mathématiques TD", None);
        assert_eq!(c.event_type, EventType::Td);
        assert_eq!(c.label, "TD");
    }

    #[test]
    fn test_classify_no_keyword() {
        let c = RuleSet::standard().classify("Réunion de rentrée", Some("Amphi A"));
        assert_eq!(c, Classification::other());
        assert_eq!(c.label, "Autre");
    }

    #[test]
    fn test_classify_first_rule_wins() {
        // CM is listed before TD
        let c = RuleSet::standard().classify("Algorithmique TD", Some("Event category: CM"));
        assert_eq!(c.event_type, EventType::Cm);
        assert_eq!(c.label, "Cours");
    }

    #[test]
    fn test_classify_exam_variants_and_holiday() {
        let rules = RuleSet::standard();
        assert_eq!(rules.classify("Partiel d'anglais", None).label, "Partiel");
        assert_eq!(rules.classify("ds de physique", None).event_type, EventType::Exam);
        assert_eq!(rules.classify("Jour férié", None).event_type, EventType::Holiday);
    }

    #[test]
    fn test_classify_needs_word_boundary() {
        let c = RuleSet::standard().classify("TDAH sensibilisation", None);
        assert_eq!(c.event_type, EventType::Other);
    }

    #[test]
    fn test_custom_rule_extends_vocabulary() {
        let mut rules = RuleSet::standard();
        rules.push_type_rule(TypeRule::new(r"\bSoutenance\b", EventType::Exam, "Soutenance").unwrap());
        assert_eq!(rules.classify("Soutenance de stage", None).label, "Soutenance");
    }

    #[test]
    fn test_group_number_patterns() {
        let rules = RuleSet::standard();
        assert_eq!(rules.group_number("Session Groupe 3 info"), Some(3));
        assert_eq!(rules.group_number("L2 Gr.12"), Some(12));
        assert_eq!(rules.group_number("Gpe 5"), Some(5));
        assert_eq!(rules.group_number("  S1G2"), Some(2));
        assert_eq!(rules.group_number("Promo entière"), None);
        assert_eq!(rules.group_number(""), None);
    }

    #[test]
    fn test_oversized_group_number_saturates() {
        let rules = RuleSet::standard();
        assert_eq!(rules.group_number("Groupe 99999999999 S1G2"), Some(u32::MAX));
    }

    #[test]
    fn test_pushed_group_rule_runs_last() {
        let mut rules = RuleSet::standard();
        rules.push_group_rule(GroupRule::new(r"section\s*([0-9]+)").unwrap());

        assert_eq!(rules.group_number("Section 4"), Some(4));
        // an earlier rule still wins when both match
        assert_eq!(rules.group_number("Section 4 groupe 2"), Some(2));
        assert_eq!(RuleSet::standard().group_number("Section 4"), None);
    }

    #[test]
    fn test_invalid_rule_is_an_error() {
        assert!(GroupRule::new("groupe(").is_err());
    }
}

//! Entity registry — canonical identity for reporting entities.
//!
//! RULE: Entities are immutable once canonicalized and created lazily on
//! first reference. `canonical_name` + `entity_type` is the stable join
//! key used by every downstream rule.

use crate::types::EntityId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Cra,
    Furnisher,
    Collector,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cra => "cra",
            Self::Furnisher => "furnisher",
            Self::Collector => "collector",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "cra" => Some(Self::Cra),
            "furnisher" => Some(Self::Furnisher),
            "collector" => Some(Self::Collector),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub entity_id: EntityId,
    pub canonical_name: String,
    pub entity_type: EntityType,
}

/// Known spellings of the national bureaus and common data furnishers.
/// Keys are pre-normalized (lowercase, punctuation stripped).
const ALIASES: &[(&str, &str)] = &[
    ("transunion", "TransUnion LLC"),
    ("trans union", "TransUnion LLC"),
    ("transunion llc", "TransUnion LLC"),
    ("tu", "TransUnion LLC"),
    ("equifax", "Equifax Information Services LLC"),
    ("equifax information services", "Equifax Information Services LLC"),
    ("equifax information services llc", "Equifax Information Services LLC"),
    ("experian", "Experian Information Solutions, Inc."),
    ("experian information solutions", "Experian Information Solutions, Inc."),
    ("experian information solutions inc", "Experian Information Solutions, Inc."),
    ("innovis", "Innovis Data Solutions, Inc."),
];

/// Lowercase, strip punctuation, collapse whitespace.
fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last_was_space = true;
    for ch in raw.chars() {
        if ch.is_alphanumeric() {
            for low in ch.to_lowercase() {
                out.push(low);
            }
            last_was_space = false;
        } else if !last_was_space {
            out.push(' ');
            last_was_space = true;
        }
    }
    out.trim_end().to_string()
}

/// Title-case a normalized name for entities with no known alias.
fn title_case(normalized: &str) -> String {
    normalized
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolve a raw entity name to its canonical form.
pub fn canonical_name(raw: &str) -> String {
    let normalized = normalize(raw);
    for (alias, canonical) in ALIASES {
        if *alias == normalized {
            return (*canonical).to_string();
        }
    }
    title_case(&normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bureau_aliases_resolve() {
        assert_eq!(canonical_name("transunion"), "TransUnion LLC");
        assert_eq!(canonical_name("TRANS-UNION"), "TransUnion LLC");
        assert_eq!(canonical_name("Equifax"), "Equifax Information Services LLC");
        assert_eq!(
            canonical_name("experian information solutions, inc."),
            "Experian Information Solutions, Inc."
        );
    }

    #[test]
    fn unknown_names_are_cleaned_not_invented() {
        assert_eq!(canonical_name("  midland   CREDIT mgmt"), "Midland Credit Mgmt");
    }
}

//! Structured card metadata.

use serde::{Deserialize, Serialize};

/// Sentinel for fields that could not be determined.
pub const UNKNOWN: &str = "unknown";

/// Number of fields a recognition result carries.
pub const FIELD_COUNT: usize = 17;

/// Metadata extracted from one card image.
///
/// Field order matches the order the recognition service is asked to answer
/// in and the order of [`CardFields::from_values`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardFields {
    pub name: String,
    pub edition: String,
    pub card_number: String,
    pub language: String,
    pub publisher: String,
    pub release_year: String,
    pub region: String,
    pub rarity: String,
    pub card_type: String,
    pub subtype: String,
    pub color: String,
    pub special_effects: String,
    pub limitation: String,
    pub autograph: String,
    pub memorabilia: String,
    pub condition: String,
    pub market_value: String,
}

impl CardFields {
    /// Placeholder with every field set to [`UNKNOWN`].
    pub fn unknown() -> Self {
        Self::from_values(Vec::new())
    }

    /// Build from positional values. Missing or blank values become
    /// [`UNKNOWN`]; surplus values are ignored.
    pub fn from_values(values: Vec<String>) -> Self {
        let mut values = values.into_iter().map(|v| {
            let v = v.trim();
            if v.is_empty() {
                UNKNOWN.to_string()
            } else {
                v.to_string()
            }
        });
        let mut next = || values.next().unwrap_or_else(|| UNKNOWN.to_string());

        Self {
            name: next(),
            edition: next(),
            card_number: next(),
            language: next(),
            publisher: next(),
            release_year: next(),
            region: next(),
            rarity: next(),
            card_type: next(),
            subtype: next(),
            color: next(),
            special_effects: next(),
            limitation: next(),
            autograph: next(),
            memorabilia: next(),
            condition: next(),
            market_value: next(),
        }
    }

    /// Fields in positional order.
    pub fn values(&self) -> [&str; FIELD_COUNT] {
        [
            self.name.as_str(),
            self.edition.as_str(),
            self.card_number.as_str(),
            self.language.as_str(),
            self.publisher.as_str(),
            self.release_year.as_str(),
            self.region.as_str(),
            self.rarity.as_str(),
            self.card_type.as_str(),
            self.subtype.as_str(),
            self.color.as_str(),
            self.special_effects.as_str(),
            self.limitation.as_str(),
            self.autograph.as_str(),
            self.memorabilia.as_str(),
            self.condition.as_str(),
            self.market_value.as_str(),
        ]
    }

    pub fn is_unknown(&self) -> bool {
        self.values().iter().all(|v| *v == UNKNOWN)
    }
}

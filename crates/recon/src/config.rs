use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::aggregate::DEFAULT_TOP_LIMIT;
use crate::error::ReconError;

/// Reference configuration for the MTN ↔ OCM exchange.
pub const MTN_OCM_TEMPLATE: &str = r#"name = "MTN vs OCM"
top_limit = 15
null_keys = "match"

[carriers.MTN]
file = "mtn.csv"
key = "A_NUMBER"
measure = "CALL_DURATION"
delimiter = ";"
encoding = "latin1"

[carriers.OCM]
file = "ocm.csv"
key = "a_number"
measure = "duration"
delimiter = ";"
encoding = "latin1"

[pair]
left = "MTN"
right = "OCM"
"#;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ReconConfig {
    pub name: String,
    #[serde(default = "default_top_limit")]
    pub top_limit: usize,
    #[serde(default)]
    pub null_keys: NullKeyPolicy,
    pub carriers: BTreeMap<String, CarrierConfig>,
    pub pair: PairConfig,
}

fn default_top_limit() -> usize {
    DEFAULT_TOP_LIMIT
}

/// How missing key values take part in set membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NullKeyPolicy {
    /// A missing key matches a missing key on the other side.
    #[default]
    Match,
    /// A missing key is never matched and always lands in the exceptions.
    NeverMatch,
}

impl std::fmt::Display for NullKeyPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Match => write!(f, "match"),
            Self::NeverMatch => write!(f, "never_match"),
        }
    }
}

// ---------------------------------------------------------------------------
// Carrier
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CarrierConfig {
    pub file: String,
    /// Caller-number column.
    pub key: String,
    /// Call-duration column, in seconds.
    pub measure: String,
    #[serde(default)]
    pub delimiter: Option<char>,
    #[serde(default)]
    pub encoding: Option<String>,
}

impl CarrierConfig {
    pub fn fields(&self) -> FieldMap {
        FieldMap {
            key: self.key.clone(),
            measure: self.measure.clone(),
        }
    }

    /// Configured delimiter as a byte. Validation guarantees it is ASCII.
    pub fn delimiter_byte(&self) -> Option<u8> {
        self.delimiter.filter(char::is_ascii).map(|c| c as u8)
    }
}

/// Logical field names resolved for one carrier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldMap {
    pub key: String,
    pub measure: String,
}

// ---------------------------------------------------------------------------
// Pair
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct PairConfig {
    pub left: String,
    pub right: String,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.carriers.len() < 2 {
            return Err(ReconError::ConfigValidation(
                "at least 2 carriers are required".into(),
            ));
        }

        if self.top_limit == 0 {
            return Err(ReconError::ConfigValidation(
                "top_limit must be greater than 0".into(),
            ));
        }

        for (name, carrier) in &self.carriers {
            if carrier.key.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "carrier '{name}': key column name is empty"
                )));
            }
            if carrier.measure.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "carrier '{name}': measure column name is empty"
                )));
            }
            if let Some(d) = carrier.delimiter {
                if !d.is_ascii() {
                    return Err(ReconError::ConfigValidation(format!(
                        "carrier '{name}': delimiter '{d}' must be a single ASCII character"
                    )));
                }
            }
        }

        if self.pair.left == self.pair.right {
            return Err(ReconError::ConfigValidation(format!(
                "pair must name two different carriers, got '{}' twice",
                self.pair.left
            )));
        }

        self.carrier(&self.pair.left)?;
        self.carrier(&self.pair.right)?;

        Ok(())
    }

    pub fn carrier(&self, name: &str) -> Result<&CarrierConfig, ReconError> {
        self.carriers
            .get(name)
            .ok_or_else(|| ReconError::UnknownCarrier(format!("pair references '{name}'")))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_template() {
        let config = ReconConfig::from_toml(MTN_OCM_TEMPLATE).unwrap();
        assert_eq!(config.name, "MTN vs OCM");
        assert_eq!(config.top_limit, 15);
        assert_eq!(config.null_keys, NullKeyPolicy::Match);
        assert_eq!(config.carriers.len(), 2);

        let mtn = config.carrier("MTN").unwrap();
        assert_eq!(
            mtn.fields(),
            FieldMap {
                key: "A_NUMBER".into(),
                measure: "CALL_DURATION".into(),
            }
        );
        assert_eq!(mtn.delimiter_byte(), Some(b';'));
        assert_eq!(mtn.encoding.as_deref(), Some("latin1"));

        let ocm = config.carrier("OCM").unwrap();
        assert_eq!(ocm.key, "a_number");
        assert_eq!(ocm.measure, "duration");
    }

    #[test]
    fn defaults_apply() {
        let input = r#"
name = "Minimal"

[carriers.A]
file = "a.csv"
key = "k"
measure = "m"

[carriers.B]
file = "b.csv"
key = "k"
measure = "m"

[pair]
left = "A"
right = "B"
"#;
        let config = ReconConfig::from_toml(input).unwrap();
        assert_eq!(config.top_limit, DEFAULT_TOP_LIMIT);
        assert_eq!(config.null_keys, NullKeyPolicy::Match);
        assert_eq!(config.carriers["A"].delimiter_byte(), None);
    }

    #[test]
    fn extra_carriers_allowed() {
        let input = format!(
            r#"{MTN_OCM_TEMPLATE}
[carriers.CAMTEL]
file = "camtel.csv"
key = "caller"
measure = "secs"
"#
        );
        let config = ReconConfig::from_toml(&input).unwrap();
        assert_eq!(config.carriers.len(), 3);
    }

    #[test]
    fn parse_never_match_policy() {
        let input =
            MTN_OCM_TEMPLATE.replace("null_keys = \"match\"", "null_keys = \"never_match\"");
        let config = ReconConfig::from_toml(&input).unwrap();
        assert_eq!(config.null_keys, NullKeyPolicy::NeverMatch);
    }

    #[test]
    fn reject_unknown_policy() {
        let input = MTN_OCM_TEMPLATE.replace("null_keys = \"match\"", "null_keys = \"sometimes\"");
        let err = ReconConfig::from_toml(&input).unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }

    #[test]
    fn reject_unknown_carrier_in_pair() {
        let input = MTN_OCM_TEMPLATE.replace("right = \"OCM\"", "right = \"NEXTTEL\"");
        let err = ReconConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("'NEXTTEL'"));
    }

    #[test]
    fn reject_same_carrier_twice() {
        let input = MTN_OCM_TEMPLATE.replace("right = \"OCM\"", "right = \"MTN\"");
        let err = ReconConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("two different carriers"));
    }

    #[test]
    fn reject_zero_limit() {
        let input = MTN_OCM_TEMPLATE.replace("top_limit = 15", "top_limit = 0");
        let err = ReconConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("top_limit"));
    }

    #[test]
    fn reject_empty_key() {
        let input = MTN_OCM_TEMPLATE.replace("key = \"a_number\"", "key = \" \"");
        let err = ReconConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("carrier 'OCM': key column name is empty"));
    }

    #[test]
    fn reject_non_ascii_delimiter() {
        let input = MTN_OCM_TEMPLATE.replacen("delimiter = \";\"", "delimiter = \"§\"", 1);
        let err = ReconConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("ASCII"));
    }

    #[test]
    fn reject_single_carrier() {
        let input = r#"
name = "Lonely"

[carriers.A]
file = "a.csv"
key = "k"
measure = "m"

[pair]
left = "A"
right = "A"
"#;
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("at least 2 carriers"));
    }
}

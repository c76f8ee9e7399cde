//! Options for a single enhancement call.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which selector features drive the match score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingStrategy {
    /// Compare node-name tokens with selector tokens.
    Name,
    /// Compare node-name tokens with `.class` names.
    Class,
    /// Compare node-name tokens with `#id` names.
    Id,
    /// Weighted blend: 0.4 name + 0.4 class + 0.2 id.
    #[default]
    Hybrid,
}

impl MappingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MappingStrategy::Name => "name",
            MappingStrategy::Class => "class",
            MappingStrategy::Id => "id",
            MappingStrategy::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for MappingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MappingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(MappingStrategy::Name),
            "class" => Ok(MappingStrategy::Class),
            "id" => Ok(MappingStrategy::Id),
            "hybrid" => Ok(MappingStrategy::Hybrid),
            other => Err(format!(
                "unknown mapping strategy '{other}' (expected name, class, id or hybrid)"
            )),
        }
    }
}

/// Configuration for `enhance`.
///
/// Field names serialize in camelCase so option records coming from a UI
/// layer deserialize as-is. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnhanceOptions {
    /// Informational only; recorded but does not change scoring.
    pub strict_matching: bool,

    /// Skip color similarity and color conflicts. Default: **false**.
    pub ignore_colors: bool,

    /// Skip typography similarity and typography conflicts. Default: **false**.
    pub ignore_typography: bool,

    /// Skip spacing similarity and spacing/layout conflicts. Default: **false**.
    pub ignore_spacing: bool,

    /// Label unexplained matches `auto` instead of `manual`. Default: **true**.
    pub enable_auto_mapping: bool,

    /// Default: **hybrid**.
    pub mapping_strategy: MappingStrategy,

    /// Mappings below this confidence are discarded. Default: **0.5**.
    pub min_confidence: f32,

    /// Upper bound on the suggestion list. Default: **5**.
    pub max_suggestions: usize,
}

impl Default for EnhanceOptions {
    fn default() -> Self {
        Self {
            strict_matching: false,
            ignore_colors: false,
            ignore_typography: false,
            ignore_spacing: false,
            enable_auto_mapping: true,
            mapping_strategy: MappingStrategy::Hybrid,
            min_confidence: 0.5,
            max_suggestions: 5,
        }
    }
}

impl EnhanceOptions {
    /// Copy with `min_confidence` clamped into [0, 1] (NaN becomes 0).
    #[must_use]
    pub fn validated(&self) -> Self {
        let min_confidence = if self.min_confidence.is_nan() {
            0.0
        } else {
            self.min_confidence.clamp(0.0, 1.0)
        };
        Self {
            min_confidence,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults() {
        let o = EnhanceOptions::default();
        assert_eq!(o.mapping_strategy, MappingStrategy::Hybrid);
        assert_eq!(o.min_confidence, 0.5);
        assert_eq!(o.max_suggestions, 5);
        assert!(o.enable_auto_mapping);
    }

    #[test]
    fn deserializes_partial_camel_case_record() {
        let o: EnhanceOptions =
            serde_json::from_str(r#"{"mappingStrategy":"class","ignoreColors":true,"minConfidence":0.2}"#)
                .unwrap();
        assert_eq!(
            o,
            EnhanceOptions {
                mapping_strategy: MappingStrategy::Class,
                ignore_colors: true,
                min_confidence: 0.2,
                ..EnhanceOptions::default()
            }
        );
    }

    #[test]
    fn validated_clamps_threshold() {
        let high = EnhanceOptions {
            min_confidence: 3.0,
            ..Default::default()
        };
        assert_eq!(high.validated().min_confidence, 1.0);
        let nan = EnhanceOptions {
            min_confidence: f32::NAN,
            ..Default::default()
        };
        assert_eq!(nan.validated().min_confidence, 0.0);
    }

    #[test]
    fn strategy_from_str() {
        assert_eq!("Hybrid".parse::<MappingStrategy>(), Ok(MappingStrategy::Hybrid));
        assert_eq!("id".parse::<MappingStrategy>(), Ok(MappingStrategy::Id));
        assert!("fuzzy".parse::<MappingStrategy>().is_err());
    }
}

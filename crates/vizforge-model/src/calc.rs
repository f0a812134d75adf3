use serde::{Deserialize, Serialize};

use crate::{Classification, DataType, Role};

/// Prefix of every generated calculated-field identifier.
pub const CALC_ID_PREFIX: &str = "Calculation_";

fn new_calc_id() -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    format!("{CALC_ID_PREFIX}{}", &uuid[..12])
}

/// A column whose value is computed by a formula instead of stored in the
/// extract.
///
/// The formula text is opaque to this crate: it is escaped into the markup
/// verbatim and only the consuming application interprets it. The internal
/// identifier is minted once at construction and never changes; every shelf
/// and dependency reference uses it instead of the caption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculatedField {
    /// User-facing name; may contain spaces and punctuation.
    pub caption: String,
    /// Formula in the consuming application's expression syntax.
    pub formula: String,
    pub datatype: DataType,
    pub role: Role,
    pub classification: Classification,
    /// Default display format, e.g. `p0.0%` for a one-decimal percentage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_format: Option<String>,
    /// Set when the formula already contains aggregation calls. Such fields
    /// must be referenced with the `User` derivation (`usr:` prefix);
    /// wrapping them in a further aggregation silently breaks the rendered
    /// view.
    #[serde(default)]
    pub preaggregated: bool,
    id: String,
}

impl CalculatedField {
    /// Compile a formula into a calculated field. Defaults to a real-valued
    /// quantitative measure, the common case for derived metrics.
    pub fn new(caption: impl Into<String>, formula: impl Into<String>) -> Self {
        CalculatedField {
            caption: caption.into(),
            formula: formula.into(),
            datatype: DataType::Real,
            role: Role::Measure,
            classification: Classification::Quantitative,
            default_format: None,
            preaggregated: false,
            id: new_calc_id(),
        }
    }

    pub fn with_types(
        mut self,
        datatype: DataType,
        role: Role,
        classification: Classification,
    ) -> Self {
        self.datatype = datatype;
        self.role = role;
        self.classification = classification;
        self
    }

    pub fn with_default_format(mut self, format: impl Into<String>) -> Self {
        self.default_format = Some(format.into());
        self
    }

    /// Mark the formula as already aggregated.
    pub fn preaggregated(mut self) -> Self {
        self.preaggregated = true;
        self
    }

    /// The stable internal identifier, e.g. `Calculation_3f9a0c1d2e4b`.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The identifier in bracketed form, as column declarations name it.
    pub fn bracket_name(&self) -> String {
        format!("[{}]", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_has_fixed_prefix_and_short_suffix() {
        let calc = CalculatedField::new("Profit Ratio", "SUM([Profit])/SUM([Sales])");
        let suffix = calc.id().strip_prefix(CALC_ID_PREFIX).unwrap();
        assert_eq!(suffix.len(), 12);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(calc.bracket_name(), format!("[{}]", calc.id()));
    }

    #[test]
    fn id_is_stable_across_reads() {
        let calc = CalculatedField::new("Profit Ratio", "SUM([Profit])/SUM([Sales])").preaggregated();
        let first = calc.id().to_string();
        assert_eq!(calc.id(), first);
        assert_eq!(calc.clone().id(), first);
    }

    #[test]
    fn distinct_fields_get_distinct_ids() {
        let a = CalculatedField::new("A", "1");
        let b = CalculatedField::new("B", "2");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn id_survives_serde() {
        let calc = CalculatedField::new("Profit Ratio", "SUM([Profit])/SUM([Sales])")
            .with_default_format("p0.0%");
        let json = serde_json::to_string(&calc).unwrap();
        let back: CalculatedField = serde_json::from_str(&json).unwrap();
        assert_eq!(back, calc);
        assert_eq!(back.id(), calc.id());
    }
}

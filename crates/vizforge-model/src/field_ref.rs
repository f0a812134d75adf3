use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::worksheet::Aggregation;

/// 2-character classification key embedded in field-instance names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeTag {
    /// `nk`
    Nominal,
    /// `ok`
    Ordinal,
    /// `qk`
    Quantitative,
}

impl TypeTag {
    pub fn as_str(self) -> &'static str {
        match self {
            TypeTag::Nominal => "nk",
            TypeTag::Ordinal => "ok",
            TypeTag::Quantitative => "qk",
        }
    }

    pub fn parse(s: &str) -> Result<Self, FieldRefParseError> {
        match s {
            "nk" => Ok(TypeTag::Nominal),
            "ok" => Ok(TypeTag::Ordinal),
            "qk" => Ok(TypeTag::Quantitative),
            other => Err(FieldRefParseError::UnknownTypeTag(other.to_string())),
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a field's value is derived for one particular appearance in a view.
///
/// This is the aggregation set plus `User`, which marks a calculated field
/// whose formula already aggregates and must be evaluated as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Derivation {
    None,
    Sum,
    Avg,
    Count,
    CountD,
    Min,
    Max,
    Median,
    Attr,
    User,
}

impl Derivation {
    /// Capitalized form used in `column-instance` `derivation` attributes.
    pub fn as_attr(self) -> &'static str {
        match self {
            Derivation::None => "None",
            Derivation::Sum => "Sum",
            Derivation::Avg => "Avg",
            Derivation::Count => "Count",
            Derivation::CountD => "Countd",
            Derivation::Min => "Min",
            Derivation::Max => "Max",
            Derivation::Median => "Median",
            Derivation::Attr => "Attr",
            Derivation::User => "User",
        }
    }

    /// Lower-case prefix used in instance names. `User` shortens to `usr`.
    pub fn as_prefix(self) -> &'static str {
        match self {
            Derivation::None => "none",
            Derivation::Sum => "sum",
            Derivation::Avg => "avg",
            Derivation::Count => "count",
            Derivation::CountD => "countd",
            Derivation::Min => "min",
            Derivation::Max => "max",
            Derivation::Median => "median",
            Derivation::Attr => "attr",
            Derivation::User => "usr",
        }
    }

    pub fn parse_prefix(s: &str) -> Result<Self, FieldRefParseError> {
        match s {
            "none" => Ok(Derivation::None),
            "sum" => Ok(Derivation::Sum),
            "avg" => Ok(Derivation::Avg),
            "count" => Ok(Derivation::Count),
            "countd" => Ok(Derivation::CountD),
            "min" => Ok(Derivation::Min),
            "max" => Ok(Derivation::Max),
            "median" => Ok(Derivation::Median),
            "attr" => Ok(Derivation::Attr),
            "usr" => Ok(Derivation::User),
            other => Err(FieldRefParseError::UnknownDerivation(other.to_string())),
        }
    }
}

impl From<Aggregation> for Derivation {
    fn from(value: Aggregation) -> Self {
        match value {
            Aggregation::None => Derivation::None,
            Aggregation::Sum => Derivation::Sum,
            Aggregation::Avg => Derivation::Avg,
            Aggregation::Count => Derivation::Count,
            Aggregation::CountD => Derivation::CountD,
            Aggregation::Min => Derivation::Min,
            Aggregation::Max => Derivation::Max,
            Aggregation::Median => Derivation::Median,
            Aggregation::Attr => Derivation::Attr,
        }
    }
}

/// Errors raised when parsing a field-instance name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldRefParseError {
    #[error("malformed field instance name: {0:?}")]
    Malformed(String),
    #[error("unknown derivation prefix: {0:?}")]
    UnknownDerivation(String),
    #[error("unknown type tag: {0:?}")]
    UnknownTypeTag(String),
}

/// One appearance of a field in a view: `[derivation:fieldKey:typeTag]`.
///
/// This is the serialization key the consuming application uses to tie shelf
/// contents back to `column-instance` declarations. Two appearances with the
/// same derivation share one instance, so encoders deduplicate on the
/// formatted name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldReference {
    pub derivation: Derivation,
    /// Column name, or a calculated field's internal identifier.
    pub field_key: String,
    pub type_tag: TypeTag,
}

impl FieldReference {
    pub fn new(derivation: Derivation, field_key: impl Into<String>, type_tag: TypeTag) -> Self {
        FieldReference {
            derivation,
            field_key: field_key.into(),
            type_tag,
        }
    }

    /// The bracketed instance name, e.g. `[sum:Sales:qk]`.
    pub fn instance_name(&self) -> String {
        format!(
            "[{}:{}:{}]",
            self.derivation.as_prefix(),
            self.field_key,
            self.type_tag.as_str()
        )
    }

    /// The fully qualified reference used on shelves:
    /// `[datasource].[derivation:fieldKey:typeTag]`.
    pub fn qualified(&self, datasource: &str) -> String {
        format!("[{}].{}", datasource, self.instance_name())
    }

    /// Parse a bracketed instance name back into its parts.
    ///
    /// The field key may itself contain colons; the derivation is everything
    /// before the first colon and the type tag everything after the last.
    pub fn parse(s: &str) -> Result<Self, FieldRefParseError> {
        let inner = s
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .ok_or_else(|| FieldRefParseError::Malformed(s.to_string()))?;
        let (prefix, rest) = inner
            .split_once(':')
            .ok_or_else(|| FieldRefParseError::Malformed(s.to_string()))?;
        let (key, tag) = rest
            .rsplit_once(':')
            .ok_or_else(|| FieldRefParseError::Malformed(s.to_string()))?;
        if key.is_empty() {
            return Err(FieldRefParseError::Malformed(s.to_string()));
        }
        Ok(FieldReference {
            derivation: Derivation::parse_prefix(prefix)?,
            field_key: key.to_string(),
            type_tag: TypeTag::parse(tag)?,
        })
    }
}

impl fmt::Display for FieldReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.instance_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn instance_name_formats() {
        let r = FieldReference::new(Derivation::Sum, "Sales", TypeTag::Quantitative);
        assert_eq!(r.instance_name(), "[sum:Sales:qk]");
        assert_eq!(
            r.qualified("federated.0abc123"),
            "[federated.0abc123].[sum:Sales:qk]"
        );
    }

    #[test]
    fn user_derivation_uses_usr_prefix() {
        let r = FieldReference::new(
            Derivation::User,
            "Calculation_abc123def456",
            TypeTag::Quantitative,
        );
        assert_eq!(r.instance_name(), "[usr:Calculation_abc123def456:qk]");
        assert_eq!(Derivation::User.as_attr(), "User");
    }

    #[test]
    fn parse_round_trips() {
        for name in ["[none:Category:nk]", "[avg:Discount:qk]", "[none:Order Date:ok]"] {
            let parsed = FieldReference::parse(name).unwrap();
            assert_eq!(parsed.instance_name(), name);
        }
    }

    #[test]
    fn parse_keeps_colons_in_field_key() {
        let parsed = FieldReference::parse("[sum:Ratio: a:b:qk]").unwrap();
        assert_eq!(parsed.field_key, "Ratio: a:b");
        assert_eq!(parsed.derivation, Derivation::Sum);
    }

    #[test]
    fn parse_rejects_malformed_names() {
        assert!(matches!(
            FieldReference::parse("sum:Sales:qk"),
            Err(FieldRefParseError::Malformed(_))
        ));
        assert!(matches!(
            FieldReference::parse("[sum:Sales]"),
            Err(FieldRefParseError::Malformed(_))
        ));
        assert!(matches!(
            FieldReference::parse("[sum:Sales:zz]"),
            Err(FieldRefParseError::UnknownTypeTag(_))
        ));
        assert!(matches!(
            FieldReference::parse("[total:Sales:qk]"),
            Err(FieldRefParseError::UnknownDerivation(_))
        ));
    }
}

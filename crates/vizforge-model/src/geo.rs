use thiserror::Error;

/// A column referenced a fixed-configuration key that is not in the closed
/// table (currently: geographic roles).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized geographic role: {0:?}")]
pub struct ConfigurationError(pub String);

/// Closed table mapping geographic-role keys to the `semantic-role`
/// annotation the consuming application needs to geocode the column.
///
/// `Region` maps onto the state geocoding set, matching how the consuming
/// application treats regions.
const GEO_ROLES: &[(&str, &str)] = &[
    ("State", "[State].[Name]"),
    ("Country", "[Country].[Name]"),
    ("Country_ISO", "[Country].[ISO3166_2]"),
    ("City", "[City].[Name]"),
    ("Postal Code", "[ZipCode].[Name]"),
    ("ZipCode", "[ZipCode].[Name]"),
    ("Latitude", "[Latitude]"),
    ("Longitude", "[Longitude]"),
    ("Region", "[State].[Name]"),
    ("County", "[County].[Name]"),
];

/// Resolve a geographic-role key to its `semantic-role` annotation.
pub fn semantic_role(key: &str) -> Result<&'static str, ConfigurationError> {
    GEO_ROLES
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| *v)
        .ok_or_else(|| ConfigurationError(key.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognized_keys_resolve() {
        assert_eq!(semantic_role("State").unwrap(), "[State].[Name]");
        assert_eq!(semantic_role("Postal Code").unwrap(), "[ZipCode].[Name]");
        assert_eq!(semantic_role("ZipCode").unwrap(), "[ZipCode].[Name]");
        assert_eq!(semantic_role("Latitude").unwrap(), "[Latitude]");
        assert_eq!(semantic_role("Region").unwrap(), "[State].[Name]");
    }

    #[test]
    fn unrecognized_key_is_a_configuration_error() {
        assert_eq!(
            semantic_role("Planet"),
            Err(ConfigurationError("Planet".to_string()))
        );
    }
}

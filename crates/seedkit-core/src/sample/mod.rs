//! # Distribution sampling
//!
//! Reads a live database's own data to build a per-column statistical
//! profile (categorical frequencies, numeric ranges, row-count ratios
//! between related tables) without ever persisting the underlying rows.
//! [`crate::generate`] then draws from these profiles instead of plain
//! type-driven fallbacks, so synthetic rows track the shape of production
//! data.

use std::path::Path;

use crate::error::{Result, SeedKitError};

pub mod mask;
pub mod stats;

/// Default filename for a saved distribution profile set.
pub const PROFILES_FILE_NAME: &str = "seedkit.distributions.json";

/// Write distribution profiles to `path` as pretty-printed JSON.
pub fn save_profiles(profiles: &[stats::DistributionProfile], path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(profiles).map_err(|e| SeedKitError::Config {
        message: format!("failed to serialize distribution profiles: {}", e),
    })?;
    std::fs::write(path, json).map_err(|e| SeedKitError::Output {
        message: format!("failed to write profiles to {}", path.display()),
        source: e,
    })?;
    Ok(())
}

/// Read a previously saved distribution profile set back from `path`.
pub fn load_profiles(path: &Path) -> Result<Vec<stats::DistributionProfile>> {
    let contents = std::fs::read_to_string(path).map_err(|e| SeedKitError::Output {
        message: format!("failed to read profiles from {}", path.display()),
        source: e,
    })?;
    let profiles: Vec<stats::DistributionProfile> =
        serde_json::from_str(&contents).map_err(|e| SeedKitError::Config {
            message: format!("failed to parse distribution profiles: {}", e),
        })?;
    Ok(profiles)
}

/// Look up the profile for a given table by name, if one was sampled.
pub fn profile_for_table<'a>(
    profiles: &'a [stats::DistributionProfile],
    table_name: &str,
) -> Option<&'a stats::DistributionProfile> {
    profiles.iter().find(|p| p.table_name == table_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stats::{ColumnDistribution, DistributionProfile};
    use std::collections::HashMap;

    fn sample_profiles() -> Vec<DistributionProfile> {
        vec![
            DistributionProfile {
                table_name: "subscribers".to_string(),
                row_count: 1000,
                column_distributions: {
                    let mut m = HashMap::new();
                    m.insert(
                        "plan_tier".to_string(),
                        ColumnDistribution::Categorical {
                            values: vec![
                                ("free".to_string(), 0.6),
                                ("pro".to_string(), 0.3),
                                ("enterprise".to_string(), 0.1),
                            ],
                        },
                    );
                    m.insert(
                        "lifetime_value".to_string(),
                        ColumnDistribution::Numeric {
                            min: 0.0,
                            max: 5000.0,
                            mean: 240.0,
                            stddev: 310.5,
                        },
                    );
                    m
                },
            },
            DistributionProfile {
                table_name: "invoices".to_string(),
                row_count: 4100,
                column_distributions: {
                    let mut m = HashMap::new();
                    m.insert(
                        "__ratio_subscriber_id".to_string(),
                        ColumnDistribution::Ratio {
                            related_table: "subscribers".to_string(),
                            ratio: 4.1,
                        },
                    );
                    m
                },
            },
        ]
    }

    #[test]
    fn profiles_round_trip_through_a_json_file() {
        let profiles = sample_profiles();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sampled.json");

        save_profiles(&profiles, &path).unwrap();
        let loaded = load_profiles(&path).unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].table_name, "subscribers");
        assert_eq!(loaded[0].row_count, 1000);
        assert_eq!(loaded[0].column_distributions.len(), 2);
        assert_eq!(loaded[1].table_name, "invoices");
        assert_eq!(loaded[1].row_count, 4100);
    }

    #[test]
    fn loading_a_missing_file_errors() {
        let result = load_profiles(Path::new("/nonexistent/path.json"));
        assert!(result.is_err());
    }

    #[test]
    fn empty_profile_set_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");

        save_profiles(&[], &path).unwrap();
        let loaded = load_profiles(&path).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn profile_for_table_finds_by_name_and_misses_otherwise() {
        let profiles = sample_profiles();
        assert_eq!(profile_for_table(&profiles, "invoices").unwrap().row_count, 4100);
        assert!(profile_for_table(&profiles, "unknown_table").is_none());
    }
}

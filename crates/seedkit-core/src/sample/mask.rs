//! PII redaction for sampled distributions.
//!
//! A [`stats::ColumnDistribution::Categorical`] built from a PII column
//! carries the actual production values as its category labels (e.g. real
//! email addresses), since that's the whole point of a categorical
//! distribution. This module flags PII-looking column names and strips
//! those categorical distributions before a profile is ever written to
//! disk, so the generator falls back to its own synthetic values for them
//! instead of replaying real identities.
//!
//! `Numeric` aggregates (min/max/mean/stddev) are kept regardless of column
//! name — they don't expose any individual record.

use super::stats::{ColumnDistribution, DistributionProfile};

/// Substrings that flag a column name as likely PII, grouped loosely by
/// category below. Matching is case-insensitive and by substring, so this
/// catches `snake_case`, `camelCase`, and prefixed/suffixed variants alike.
const PII_PATTERNS: &[&str] = &[
    // Identity
    "email",
    "e_mail",
    "first_name",
    "firstname",
    "last_name",
    "lastname",
    "full_name",
    "fullname",
    "middle_name",
    "middlename",
    "surname",
    "given_name",
    "givenname",
    "family_name",
    "familyname",
    // Contact
    "phone",
    "mobile",
    "telephone",
    "fax",
    "cell_number",
    "contact_number",
    // Address
    "street",
    "address",
    "address_line",
    "city",
    "zip_code",
    "zipcode",
    "postal_code",
    "postalcode",
    // Government IDs
    "ssn",
    "social_security",
    "tax_id",
    "taxid",
    "national_id",
    "passport",
    "driver_license",
    "drivers_license",
    // Financial
    "credit_card",
    "creditcard",
    "card_number",
    "account_number",
    "routing_number",
    "iban",
    "bank_account",
    // Auth
    "password",
    "passwd",
    "password_hash",
    "pass_hash",
    "secret",
    "api_key",
    "apikey",
    "token",
    "auth_token",
    "refresh_token",
    "access_token",
    // Other
    "date_of_birth",
    "dob",
    "birthdate",
    "ip_address",
    "ipaddress",
    "user_agent",
    "useragent",
    "mac_address",
    "date_of_birth_hash",
    "dob_hash",
];

/// Does `name` look like a PII column, by substring match against
/// [`PII_PATTERNS`]?
pub fn is_pii_column(name: &str) -> bool {
    let lower = name.to_lowercase();
    PII_PATTERNS.iter().any(|pattern| lower.contains(pattern))
}

/// Strip categorical distributions for PII-looking columns across every
/// profile in `profiles`, in place. `Numeric` distributions on the same
/// column name are left untouched, and `Ratio` distributions are never
/// PII in the first place.
///
/// Returns how many distributions were removed.
pub fn mask_pii_distributions(profiles: &mut [DistributionProfile]) -> usize {
    let mut masked_count = 0;
    for profile in profiles.iter_mut() {
        let keys_to_remove: Vec<String> = profile
            .column_distributions
            .iter()
            .filter(|(col_name, dist)| {
                is_pii_column(col_name) && matches!(dist, ColumnDistribution::Categorical { .. })
            })
            .map(|(col_name, _)| col_name.clone())
            .collect();

        for key in keys_to_remove {
            profile.column_distributions.remove(&key);
            masked_count += 1;
        }
    }
    masked_count
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn flags_email_variants() {
        assert!(is_pii_column("email"));
        assert!(is_pii_column("billing_email"));
        assert!(is_pii_column("Email"));
        assert!(is_pii_column("EMAIL_ADDRESS"));
        assert!(is_pii_column("e_mail"));
    }

    #[test]
    fn flags_phone_variants() {
        assert!(is_pii_column("phone"));
        assert!(is_pii_column("phone_number"));
        assert!(is_pii_column("mobile"));
        assert!(is_pii_column("telephone"));
    }

    #[test]
    fn flags_government_id_variants() {
        assert!(is_pii_column("ssn"));
        assert!(is_pii_column("social_security_number"));
        assert!(is_pii_column("SSN"));
        assert!(is_pii_column("passport_number"));
    }

    #[test]
    fn flags_credential_variants() {
        assert!(is_pii_column("password"));
        assert!(is_pii_column("password_hash"));
        assert!(is_pii_column("api_key"));
        assert!(is_pii_column("secret"));
    }

    #[test]
    fn leaves_ordinary_business_columns_unflagged() {
        assert!(!is_pii_column("plan_tier"));
        assert!(!is_pii_column("name")); // too generic on its own
        assert!(!is_pii_column("category"));
        assert!(!is_pii_column("status"));
        assert!(!is_pii_column("amount_due"));
        assert!(!is_pii_column("quantity"));
        assert!(!is_pii_column("description"));
        assert!(!is_pii_column("created_at"));
    }

    #[test]
    fn masks_categorical_pii_but_keeps_business_columns() {
        let mut profiles = vec![DistributionProfile {
            table_name: "subscribers".to_string(),
            row_count: 1000,
            column_distributions: {
                let mut m = HashMap::new();
                m.insert(
                    "email".to_string(),
                    ColumnDistribution::Categorical {
                        values: vec![
                            ("alice@example.com".to_string(), 0.01),
                            ("bob@example.com".to_string(), 0.01),
                        ],
                    },
                );
                m.insert(
                    "plan_tier".to_string(),
                    ColumnDistribution::Categorical {
                        values: vec![("free".to_string(), 0.7), ("pro".to_string(), 0.3)],
                    },
                );
                m
            },
        }];

        let masked = mask_pii_distributions(&mut profiles);
        assert_eq!(masked, 1, "should mask email but not plan_tier");
        assert!(!profiles[0].column_distributions.contains_key("email"));
        assert!(profiles[0].column_distributions.contains_key("plan_tier"));
    }

    #[test]
    fn numeric_distributions_are_never_masked() {
        let mut profiles = vec![DistributionProfile {
            table_name: "subscribers".to_string(),
            row_count: 1000,
            column_distributions: {
                let mut m = HashMap::new();
                // Numeric aggregate under a PII-looking name is still safe.
                m.insert(
                    "phone".to_string(),
                    ColumnDistribution::Numeric {
                        min: 1000000000.0,
                        max: 9999999999.0,
                        mean: 5000000000.0,
                        stddev: 2000000000.0,
                    },
                );
                m
            },
        }];

        let masked = mask_pii_distributions(&mut profiles);
        assert_eq!(masked, 0);
        assert!(profiles[0].column_distributions.contains_key("phone"));
    }

    #[test]
    fn masks_every_pii_column_in_a_profile() {
        let mut profiles = vec![DistributionProfile {
            table_name: "subscribers".to_string(),
            row_count: 500,
            column_distributions: {
                let mut m = HashMap::new();
                m.insert(
                    "email".to_string(),
                    ColumnDistribution::Categorical {
                        values: vec![("a@b.com".to_string(), 1.0)],
                    },
                );
                m.insert(
                    "first_name".to_string(),
                    ColumnDistribution::Categorical {
                        values: vec![("Alice".to_string(), 0.5)],
                    },
                );
                m.insert(
                    "password_hash".to_string(),
                    ColumnDistribution::Categorical {
                        values: vec![("$2b$10$...".to_string(), 0.01)],
                    },
                );
                m.insert(
                    "plan_tier".to_string(),
                    ColumnDistribution::Categorical {
                        values: vec![("free".to_string(), 0.1), ("pro".to_string(), 0.9)],
                    },
                );
                m
            },
        }];

        let masked = mask_pii_distributions(&mut profiles);
        assert_eq!(masked, 3, "should mask email, first_name, password_hash");
        assert_eq!(profiles[0].column_distributions.len(), 1);
        assert!(profiles[0].column_distributions.contains_key("plan_tier"));
    }
}

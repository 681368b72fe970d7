//! Per-column value generation.
//!
//! [`ValueGenerator`] turns a single [`Column`] into a [`Value`], honoring
//! (in order) UUID identity, declared/CHECK-derived allowed values, declared
//! numeric bounds, and finally a type-dispatch fallback that uses `fake` for
//! realistic-looking strings when the caller's dictionary toggles allow it.

use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use fake::faker::address::en::{CityName, StreetName};
use fake::faker::company::en::CompanyName;
use fake::faker::internet::en::{FreeEmail, Username};
use fake::faker::lorem::en::{Sentence, Word, Words};
use fake::faker::name::en::{FirstName, LastName};
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use rand::Rng;
use uuid::Uuid;

use crate::constraint::ParsedConstraint;
use crate::error::{Result, SeedKitError};
use crate::generate::value::Value;
use crate::schema::types::{Column, DataType};

/// Classic "lorem ipsum" word bank, used for the generic text fallback when
/// `use_latin_dictionary` is the only source enabled.
const LATIN_WORDS: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing",
    "elit", "sed", "do", "eiusmod", "tempor", "incididunt", "ut", "labore",
    "et", "dolore", "magna", "aliqua", "enim", "ad", "minim", "veniam",
    "quis", "nostrud", "exercitation", "ullamco", "laboris", "nisi",
];

/// Common Spanish word bank, used for the generic text fallback when
/// `use_spanish_dictionary` is the only source enabled.
const SPANISH_WORDS: &[&str] = &[
    "casa", "tiempo", "vida", "mundo", "agua", "dia", "hombre", "mujer",
    "nino", "ciudad", "trabajo", "historia", "mano", "parte", "lugar",
    "momento", "forma", "palabra", "problema", "cosa", "gobierno", "pais",
];

/// ISO 3166-1 alpha-2 country codes, used for 2-char string fallbacks.
const ISO2_COUNTRY_CODES: &[&str] = &[
    "US", "GB", "DE", "FR", "ES", "IT", "CA", "MX", "BR", "JP", "CN", "IN",
    "AU", "NL", "SE", "NO", "PL", "PT", "IE", "CH", "AT", "BE", "DK", "FI",
];

/// ISO 3166-1 alpha-3 country codes, used for 3-char string fallbacks.
const ISO3_COUNTRY_CODES: &[&str] = &[
    "USA", "GBR", "DEU", "FRA", "ESP", "ITA", "CAN", "MEX", "BRA", "JPN",
    "CHN", "IND", "AUS", "NLD", "SWE", "NOR", "POL", "PRT", "IRL", "CHE",
];

/// Caller-configurable dictionary sources `ValueGenerator` draws from when no
/// constraint pins a string column down. At least one should be enabled;
/// with none enabled, generic text falls back to a bare column/row marker.
#[derive(Debug, Clone, Copy)]
pub struct DictionaryOptions {
    pub use_latin_dictionary: bool,
    pub use_english_dictionary: bool,
    pub use_spanish_dictionary: bool,
}

impl Default for DictionaryOptions {
    fn default() -> Self {
        Self {
            use_latin_dictionary: true,
            use_english_dictionary: true,
            use_spanish_dictionary: true,
        }
    }
}

impl DictionaryOptions {
    fn any_enabled(&self) -> bool {
        self.use_latin_dictionary || self.use_english_dictionary || self.use_spanish_dictionary
    }
}

const UUID_MAX_ATTEMPTS: usize = 1_000_000;

pub struct ValueGenerator<'a> {
    pub dictionaries: DictionaryOptions,
    pub numeric_scale: u32,
    used_uuids: &'a mut HashSet<Uuid>,
}

impl<'a> ValueGenerator<'a> {
    pub fn new(
        dictionaries: DictionaryOptions,
        numeric_scale: u32,
        used_uuids: &'a mut HashSet<Uuid>,
    ) -> Self {
        Self {
            dictionaries,
            numeric_scale,
            used_uuids,
        }
    }

    /// Generate a value for `column`, honoring `parsed` (the CHECK-derived
    /// bounds for this column) ahead of the generic type fallback.
    pub fn generate(
        &mut self,
        table_name: &str,
        column: &Column,
        parsed: &ParsedConstraint,
        row_index: usize,
        rng: &mut impl Rng,
    ) -> Result<Value> {
        if column.is_uuid {
            return self.generate_uuid(table_name, column, rng);
        }

        let allowed = declared_allowed_values(column, parsed);
        if !allowed.is_empty() {
            let pick = &allowed[rng.random_range(0..allowed.len())];
            return Ok(Value::String(pick.clone().into()));
        }

        if let Some(v) = self.generate_within_bounds(column, parsed, rng) {
            return Ok(v);
        }

        Ok(self.generate_by_type(table_name, column, row_index, rng))
    }

    /// A column configured for soft-delete: either the literal configured
    /// value, the schema's own default, or a generated value as a fallback.
    pub fn generate_soft_delete_value(
        &mut self,
        table_name: &str,
        column: &Column,
        use_schema_default: bool,
        configured_value: Option<&Value>,
        row_index: usize,
        rng: &mut impl Rng,
    ) -> Result<Value> {
        if use_schema_default && column.has_default {
            return Ok(Value::Default);
        }
        if let Some(v) = configured_value {
            return Ok(v.clone());
        }
        let parsed = ParsedConstraint::default();
        self.generate(table_name, column, &parsed, row_index, rng)
    }

    fn generate_uuid(&mut self, table_name: &str, column: &Column, rng: &mut impl Rng) -> Result<Value> {
        for _ in 0..UUID_MAX_ATTEMPTS {
            let candidate = Uuid::new_v4();
            if self.used_uuids.insert(candidate) {
                return Ok(Value::Uuid(candidate));
            }
        }
        Err(SeedKitError::UuidExhausted {
            table: table_name.to_string(),
            column: column.name.clone(),
            attempts: UUID_MAX_ATTEMPTS,
        })
    }

    fn generate_within_bounds(
        &self,
        column: &Column,
        parsed: &ParsedConstraint,
        rng: &mut impl Rng,
    ) -> Option<Value> {
        let min = parsed.min.or(column.min_value);
        let max = parsed.max.or(column.max_value);
        let (min, max) = match (min, max) {
            (Some(a), Some(b)) if a <= b => (a, b),
            (Some(a), Some(b)) => (b, a),
            _ => return None,
        };

        if is_integer_type(&column.data_type) {
            let lo = min.ceil() as i64;
            let hi = max.floor() as i64;
            let hi = hi.max(lo);
            return Some(Value::Int(rng.random_range(lo..=hi)));
        }

        let scale = column.numeric_scale.unwrap_or(self.numeric_scale);
        let raw = rng.random_range(min..=max);
        Some(round_half_up_to_decimal(raw, scale))
    }

    fn generate_by_type(
        &self,
        table_name: &str,
        column: &Column,
        row_index: usize,
        rng: &mut impl Rng,
    ) -> Value {
        match &column.data_type {
            DataType::Boolean => Value::Bool(rng.random_bool(0.5)),
            DataType::SmallInt | DataType::Integer | DataType::Serial => {
                Value::Int(rng.random_range(1..=10_000))
            }
            DataType::BigInt | DataType::BigSerial => Value::Int(rng.random_range(1..=1_000_000)),
            DataType::Float | DataType::Double => {
                let (lo, hi) = decimal_fallback_bounds(column, None);
                round_half_up_to_decimal(rng.random_range(lo..=hi), self.numeric_scale)
            }
            DataType::Numeric => {
                let scale = column.numeric_scale.unwrap_or(self.numeric_scale);
                let (lo, hi) = decimal_fallback_bounds(column, Some(scale));
                round_half_up_to_decimal(rng.random_range(lo..=hi), scale)
            }
            DataType::Date => Value::Date(random_date(rng)),
            DataType::Timestamp => Value::Timestamp(random_timestamp(rng).naive_utc()),
            DataType::TimestampTz => Value::TimestampTz(random_timestamp(rng)),
            DataType::Time => Value::Time(random_timestamp(rng).time()),
            DataType::Char => {
                let s = self.generate_string(table_name, column, rng);
                Value::String(pad_to_fixed_width(s, column.max_length).into())
            }
            DataType::VarChar | DataType::Text => {
                Value::String(self.generate_string(table_name, column, rng).into())
            }
            DataType::Json | DataType::Jsonb => Value::Json(serde_json::json!({})),
            DataType::Binary => Value::Bytes(vec![0u8; 8]),
            _ => Value::String(format!("{}_{}", column.name, row_index).into()),
        }
    }

    fn generate_string(&self, _table_name: &str, column: &Column, rng: &mut impl Rng) -> String {
        let max_len = column.max_length;
        let lower_name = column.name.to_lowercase();

        // Named-entity patterns (email, phone, person/company names) only make
        // sense rendered in a real language, so they key off English being one
        // of the enabled sources rather than a dedicated toggle.
        if self.dictionaries.use_english_dictionary {
            if lower_name.contains("email") {
                return clamp(FreeEmail().fake_with_rng(rng), max_len);
            }
            if lower_name.contains("phone") {
                return clamp(PhoneNumber().fake_with_rng(rng), max_len);
            }
            if lower_name.contains("username") || lower_name == "handle" {
                return clamp(Username().fake_with_rng(rng), max_len);
            }
            if lower_name.contains("street") || lower_name.contains("address") {
                return clamp(StreetName().fake_with_rng(rng), max_len);
            }
            if lower_name.contains("city") {
                return clamp(CityName().fake_with_rng(rng), max_len);
            }
            if lower_name.contains("first_name") || lower_name == "given_name" {
                return clamp(FirstName().fake_with_rng(rng), max_len);
            }
            if lower_name.contains("last_name") || lower_name == "surname" {
                return clamp(LastName().fake_with_rng(rng), max_len);
            }
            if lower_name.contains("company") || lower_name.contains("employer") {
                return clamp(CompanyName().fake_with_rng(rng), max_len);
            }
            if lower_name == "name" || lower_name.ends_with("_name") {
                let full = format!(
                    "{} {}",
                    FirstName().fake_with_rng::<String, _>(rng),
                    LastName().fake_with_rng::<String, _>(rng)
                );
                return clamp(full, max_len);
            }
        }

        match max_len {
            Some(2) => ISO2_COUNTRY_CODES[rng.random_range(0..ISO2_COUNTRY_CODES.len())].to_string(),
            Some(3) => ISO3_COUNTRY_CODES[rng.random_range(0..ISO3_COUNTRY_CODES.len())].to_string(),
            Some(24) => random_iban_like(rng),
            _ if !self.dictionaries.any_enabled() => clamp(column.name.clone(), max_len),
            _ => clamp(self.sentence(3, 9, rng), max_len),
        }
    }

    /// Draw a single word from the highest-priority enabled dictionary
    /// (English, then Latin, then Spanish).
    fn word(&self, rng: &mut impl Rng) -> String {
        if self.dictionaries.use_english_dictionary {
            Word().fake_with_rng(rng)
        } else if self.dictionaries.use_latin_dictionary {
            LATIN_WORDS[rng.random_range(0..LATIN_WORDS.len())].to_string()
        } else {
            SPANISH_WORDS[rng.random_range(0..SPANISH_WORDS.len())].to_string()
        }
    }

    fn words(&self, min: usize, max: usize, rng: &mut impl Rng) -> Vec<String> {
        if self.dictionaries.use_english_dictionary {
            Words(min..max).fake_with_rng(rng)
        } else {
            let n = rng.random_range(min..max.max(min + 1));
            (0..n).map(|_| self.word(rng)).collect()
        }
    }

    fn sentence(&self, min: usize, max: usize, rng: &mut impl Rng) -> String {
        if self.dictionaries.use_english_dictionary {
            Sentence(min..max).fake_with_rng(rng)
        } else {
            let mut words = self.words(min, max, rng);
            if let Some(first) = words.first_mut() {
                *first = capitalize(first);
            }
            format!("{}.", words.join(" "))
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn declared_allowed_values(column: &Column, parsed: &ParsedConstraint) -> Vec<String> {
    if let Some(values) = &column.allowed_values {
        if !values.is_empty() {
            return values.clone();
        }
    }
    if !parsed.allowed_values.is_empty() {
        return parsed.allowed_values.clone();
    }
    Vec::new()
}

fn is_integer_type(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::SmallInt | DataType::Integer | DataType::BigInt | DataType::Serial | DataType::BigSerial
    )
}

/// Bounds for an unconstrained decimal/double fallback: the column's own
/// declared min/max if present, else `[1, 1000]`, capped so the integer part
/// still fits the column's declared precision (if any).
fn decimal_fallback_bounds(column: &Column, scale: Option<u32>) -> (f64, f64) {
    let lo = column.min_value.unwrap_or(1.0);
    let mut hi = column.max_value.unwrap_or(1000.0);

    if let Some(precision) = column.numeric_precision {
        let scale = scale.or(column.numeric_scale).unwrap_or(0);
        let integer_digits = precision.saturating_sub(scale).max(1);
        let cap = 10f64.powi(integer_digits as i32) - 1.0;
        hi = hi.min(cap);
    }

    if hi < lo {
        (hi, lo)
    } else {
        (lo, hi)
    }
}

fn round_half_up_to_decimal(value: f64, scale: u32) -> Value {
    let factor = 10f64.powi(scale as i32);
    let mantissa = (value * factor).round() as i64;
    Value::Decimal { mantissa, scale }
}

fn random_date(rng: &mut impl Rng) -> NaiveDate {
    let today = Utc::now().date_naive();
    let offset_days = rng.random_range(0..=3650);
    today - Duration::days(offset_days)
}

fn random_timestamp(rng: &mut impl Rng) -> DateTime<Utc> {
    let now = Utc::now();
    let offset_seconds = rng.random_range(0..=31_536_000i64);
    now - Duration::seconds(offset_seconds)
}

fn clamp(s: String, max_len: Option<u32>) -> String {
    match max_len {
        Some(n) if (s.chars().count() as u32) > n => s.chars().take(n as usize).collect(),
        _ => s,
    }
}

/// Right-pad a fixed-width `Char` value with spaces to its declared length.
fn pad_to_fixed_width(s: String, max_len: Option<u32>) -> String {
    let s = clamp(s, max_len);
    match max_len {
        Some(n) => {
            let len = s.chars().count() as u32;
            if len < n {
                let mut padded = s;
                padded.extend(std::iter::repeat(' ').take((n - len) as usize));
                padded
            } else {
                s
            }
        }
        None => s,
    }
}

/// A synthetic IBAN-like value: "ES" followed by 22 digits, matching the
/// 24-character fixed width this pattern is used for.
fn random_iban_like(rng: &mut impl Rng) -> String {
    let mut s = String::with_capacity(24);
    s.push_str("ES");
    for _ in 0..22 {
        s.push(std::char::from_digit(rng.random_range(0..10), 10).unwrap());
    }
    s
}

//! # Constraint Parsing
//!
//! Turns the raw CHECK expression strings a [`Table`](crate::schema::types::Table)
//! carries into structured bounds the generation pipeline can act on.
//!
//! This is deliberately a best-effort extractor, not a SQL expression parser:
//! it recognizes a handful of common shapes (`BETWEEN`, comparisons, `IN`
//! lists, `= ANY ARRAY`, `length()`/`char_length()`) and a restricted DNF of
//! column-equals-literal atoms for cross-column rules. Anything else is
//! silently ignored — see `generate::row_generator` for how a table with no
//! parseable constraints still generates rows fine.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use regex::Regex;

use crate::schema::types::CheckConstraint;

/// Structured per-column constraint derived from zero or more CHECK
/// expressions naming that column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedConstraint {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub allowed_values: Vec<String>,
    pub max_length: Option<u32>,
}

impl ParsedConstraint {
    pub fn is_empty(&self) -> bool {
        self.min.is_none()
            && self.max.is_none()
            && self.allowed_values.is_empty()
            && self.max_length.is_none()
    }

    fn tighten_min(&mut self, value: f64) {
        self.min = Some(self.min.map_or(value, |m| m.max(value)));
    }

    fn tighten_max(&mut self, value: f64) {
        self.max = Some(self.max.map_or(value, |m| m.min(value)));
    }

    fn push_allowed(&mut self, value: String) {
        if !self.allowed_values.contains(&value) {
            self.allowed_values.push(value);
        }
    }
}

/// A derived rule saying the combined values of `columns` must match one of
/// the enumerated `allowed_combinations`, extracted from a CHECK expression
/// in disjunctive normal form (a disjunction of `col = literal` conjunctions).
#[derive(Debug, Clone, PartialEq)]
pub struct MultiColumnConstraint {
    pub columns: BTreeSet<String>,
    pub allowed_combinations: Vec<IndexMap<String, String>>,
}

/// Parses CHECK expressions into per-column and multi-column constraints.
pub struct ConstraintParser;

impl ConstraintParser {
    /// Parse every CHECK on the table that mentions `column_name` into a
    /// single accumulated [`ParsedConstraint`].
    pub fn parse_column(
        column_name: &str,
        checks: &[CheckConstraint],
        declared_length: Option<u32>,
    ) -> ParsedConstraint {
        let mut constraint = ParsedConstraint::default();

        for check in checks {
            let expr = check.expression.as_str();
            if expr.trim().is_empty() {
                continue;
            }
            apply_between(&mut constraint, expr, column_name);
            apply_comparison(&mut constraint, expr, column_name);
            apply_in_list(&mut constraint, expr, column_name);
            apply_any_array(&mut constraint, expr, column_name);
            apply_equals_literal(&mut constraint, expr, column_name);
            apply_length(&mut constraint, expr, column_name);
        }

        if let Some(declared) = declared_length {
            constraint.max_length = Some(match constraint.max_length {
                Some(ml) if ml <= declared => ml,
                _ => declared,
            });
        }

        constraint
    }

    /// Parse every CHECK on the table into the multi-column constraints it
    /// yields. A CHECK that doesn't contain `=` plus `AND`/`OR` contributes
    /// nothing here (it may still contribute to per-column constraints).
    pub fn parse_multi_column(checks: &[CheckConstraint]) -> Vec<MultiColumnConstraint> {
        checks
            .iter()
            .filter_map(|check| parse_dnf(&check.expression))
            .collect()
    }
}

/// Builds a regex fragment matching `column_name` preceded by optional
/// `schema.table.`-style qualifiers (each optionally double-quoted) and
/// followed by zero or more `::type` casts.
fn col_fragment(column_name: &str) -> String {
    format!(
        r#"(?:"?[A-Za-z_][\w$]*"?\.)*"?{}"?(?:::[\w\[\]]+)*"#,
        regex::escape(column_name)
    )
}

fn compile(pattern: &str) -> Option<Regex> {
    Regex::new(pattern).ok()
}

fn apply_between(constraint: &mut ParsedConstraint, expr: &str, column_name: &str) {
    let pattern = format!(
        r"(?i){}\s+between\s+(-?[\d.]+)\s+and\s+(-?[\d.]+)",
        col_fragment(column_name)
    );
    let Some(re) = compile(&pattern) else { return };
    for caps in re.captures_iter(expr) {
        let (Ok(a), Ok(b)) = (caps[1].parse::<f64>(), caps[2].parse::<f64>()) else {
            continue; // unparseable literal: silently skipped
        };
        constraint.tighten_min(a.min(b));
        constraint.tighten_max(a.max(b));
    }
}

fn apply_comparison(constraint: &mut ParsedConstraint, expr: &str, column_name: &str) {
    // Order matters: >= / <= must be tried before their single-character prefixes.
    let pattern = format!(
        r"(?i){}\s*(>=|<=|>|<|=)\s*(-?[\d.]+)",
        col_fragment(column_name)
    );
    let Some(re) = compile(&pattern) else { return };
    for caps in re.captures_iter(expr) {
        let op = &caps[1];
        let Ok(n) = caps[2].parse::<f64>() else {
            continue;
        };
        match op {
            ">=" => constraint.tighten_min(n),
            ">" => constraint.tighten_min(next_upward(n)),
            "<=" => constraint.tighten_max(n),
            "<" => constraint.tighten_max(next_downward(n)),
            "=" => {
                constraint.tighten_min(n);
                constraint.tighten_max(n);
            }
            _ => {}
        }
    }
}

fn apply_in_list(constraint: &mut ParsedConstraint, expr: &str, column_name: &str) {
    let pattern = format!(r"(?i){}\s+in\s*\(([^)]*)\)", col_fragment(column_name));
    let Some(re) = compile(&pattern) else { return };
    for caps in re.captures_iter(expr) {
        for token in split_top_level(&caps[1], ',') {
            constraint.push_allowed(unquote(token.trim()));
        }
    }
}

fn apply_any_array(constraint: &mut ParsedConstraint, expr: &str, column_name: &str) {
    let pattern = format!(
        r"(?i){}\s*=\s*any\s*array\s*\[([^\]]*)\]",
        col_fragment(column_name)
    );
    let Some(re) = compile(&pattern) else { return };
    for caps in re.captures_iter(expr) {
        for token in split_top_level(&caps[1], ',') {
            let token = strip_casts(token.trim());
            constraint.push_allowed(unquote(&token));
        }
    }
}

fn apply_equals_literal(constraint: &mut ParsedConstraint, expr: &str, column_name: &str) {
    let pattern = format!(r#"(?i){}\s*=\s*('(?:[^']|'')*'|"[^"]*"|[\w.+-]+)"#, col_fragment(column_name));
    let Some(re) = compile(&pattern) else { return };
    for caps in re.captures_iter(expr) {
        let raw = &caps[1];
        if raw.trim().eq_ignore_ascii_case("any") {
            continue; // handled by apply_any_array
        }
        constraint.push_allowed(unquote(raw));
    }
}

fn apply_length(constraint: &mut ParsedConstraint, expr: &str, column_name: &str) {
    let pattern = format!(
        r"(?i)(?:char_length|length)\(\s*{}\s*\)\s*(<=|<|=)\s*(\d+)",
        col_fragment(column_name)
    );
    let Some(re) = compile(&pattern) else { return };
    for caps in re.captures_iter(expr) {
        let Ok(n) = caps[2].parse::<u32>() else {
            continue;
        };
        let bound = match &caps[1] {
            "<" => n.saturating_sub(1),
            _ => n, // "<=" and "=" both tighten to n
        };
        constraint.max_length = Some(match constraint.max_length {
            Some(existing) => existing.min(bound),
            None => bound,
        });
    }
}

/// Smallest representable step away from `n`, used as an "exclusive bound"
/// nudge so `col > n` / `col < n` can be represented as inclusive bounds.
fn next_upward(n: f64) -> f64 {
    let step = (n.abs() * f64::EPSILON).max(1e-9);
    n + step
}

fn next_downward(n: f64) -> f64 {
    let step = (n.abs() * f64::EPSILON).max(1e-9);
    n - step
}

fn unquote(token: &str) -> String {
    let t = token.trim();
    if t.len() >= 2 {
        if (t.starts_with('\'') && t.ends_with('\'')) || (t.starts_with('"') && t.ends_with('"')) {
            return t[1..t.len() - 1].replace("''", "'");
        }
    }
    t.to_string()
}

fn strip_casts(token: &str) -> String {
    match token.find("::") {
        Some(idx) => token[..idx].to_string(),
        None => token.to_string(),
    }
}

/// Split `s` on `sep`, ignoring separators nested inside parens or quotes.
fn split_top_level(s: &str, sep: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut in_quote: Option<char> = None;
    let mut current = String::new();

    for ch in s.chars() {
        match in_quote {
            Some(q) if ch == q => {
                in_quote = None;
                current.push(ch);
            }
            Some(_) => current.push(ch),
            None => match ch {
                '\'' | '"' => {
                    in_quote = Some(ch);
                    current.push(ch);
                }
                '(' | '[' => {
                    depth += 1;
                    current.push(ch);
                }
                ')' | ']' => {
                    depth -= 1;
                    current.push(ch);
                }
                c if c == sep && depth == 0 => {
                    parts.push(std::mem::take(&mut current));
                }
                c => current.push(c),
            },
        }
    }
    if !current.trim().is_empty() {
        parts.push(current);
    }
    parts
}

/// Split `expr` on a top-level keyword (`AND`/`OR`), case-insensitive,
/// respecting parenthesis depth and quoted strings.
fn split_top_level_keyword<'a>(expr: &'a str, keyword: &str) -> Vec<&'a str> {
    let bytes = expr.as_bytes();
    let kw_lower = keyword.to_lowercase();
    let lower = expr.to_lowercase();
    let mut depth = 0i32;
    let mut in_quote: Option<u8> = None;
    let mut parts = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;

    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = in_quote {
            if b == q {
                in_quote = None;
            }
            i += 1;
            continue;
        }
        match b {
            b'\'' | b'"' => {
                in_quote = Some(b);
                i += 1;
            }
            b'(' => {
                depth += 1;
                i += 1;
            }
            b')' => {
                depth -= 1;
                i += 1;
            }
            _ if depth == 0 && lower[i..].starts_with(&kw_lower) => {
                let before_ok = i == 0 || !bytes[i - 1].is_ascii_alphanumeric();
                let after_idx = i + kw_lower.len();
                let after_ok = after_idx >= bytes.len() || !bytes[after_idx].is_ascii_alphanumeric();
                if before_ok && after_ok {
                    parts.push(expr[start..i].trim());
                    i = after_idx;
                    start = i;
                } else {
                    i += 1;
                }
            }
            _ => i += 1,
        }
    }
    parts.push(expr[start..].trim());
    parts
}

fn strip_outer_parens(expr: &str) -> &str {
    let mut s = expr.trim();
    while s.starts_with('(') && s.ends_with(')') {
        let inner = &s[1..s.len() - 1];
        if balanced(inner) {
            s = inner.trim();
        } else {
            break;
        }
    }
    s
}

fn balanced(s: &str) -> bool {
    let mut depth = 0i32;
    for c in s.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

/// Attempt to read `expr` as a disjunction of conjunctions of `col = literal`
/// atoms. Any atom in an AND-clause that doesn't match disqualifies that
/// whole clause; if every clause is disqualified, the CHECK contributes no
/// multi-column constraint at all.
fn parse_dnf(expr: &str) -> Option<MultiColumnConstraint> {
    if !expr.contains('=') || (!expr.to_lowercase().contains(" and") && !expr.to_lowercase().contains(" or")) {
        return None;
    }

    let eq_re = Regex::new(r#"(?i)^\s*"?([A-Za-z_][\w$]*)"?\s*=\s*('(?:[^']|'')*'|"[^"]*"|[\w.+-]+)\s*$"#)
        .ok()?;

    let mut columns = BTreeSet::new();
    let mut combinations = Vec::new();

    for or_clause in split_top_level_keyword(expr, "or") {
        let or_clause = strip_outer_parens(or_clause);
        let mut combo = IndexMap::new();
        let mut ok = true;

        for atom in split_top_level_keyword(or_clause, "and") {
            let atom = strip_outer_parens(atom);
            match eq_re.captures(atom) {
                Some(caps) => {
                    let col = caps[1].to_string();
                    let val = unquote(&caps[2]);
                    columns.insert(col.clone());
                    combo.insert(col, val);
                }
                None => {
                    ok = false;
                    break;
                }
            }
        }

        if ok && !combo.is_empty() {
            combinations.push(combo);
        }
    }

    if combinations.is_empty() {
        None
    } else {
        Some(MultiColumnConstraint {
            columns,
            allowed_combinations: combinations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(expr: &str) -> CheckConstraint {
        CheckConstraint {
            name: None,
            expression: expr.to_string(),
        }
    }

    #[test]
    fn empty_checks_yield_empty_constraint() {
        let parsed = ConstraintParser::parse_column("val", &[], None);
        assert!(parsed.is_empty());
    }

    #[test]
    fn between_intersects_across_multiple_checks() {
        let checks = vec![
            check("val BETWEEN 10 AND 20"),
            check("val BETWEEN 5 AND 15"),
        ];
        let parsed = ConstraintParser::parse_column("val", &checks, None);
        assert_eq!(parsed.min, Some(10.0));
        assert_eq!(parsed.max, Some(15.0));
    }

    #[test]
    fn in_list_unquotes_values() {
        let checks = vec![check("status IN ('A', 'B', 'C')")];
        let parsed = ConstraintParser::parse_column("status", &checks, None);
        assert_eq!(parsed.allowed_values, vec!["A", "B", "C"]);
    }

    #[test]
    fn greater_than_or_equal_tightens_min() {
        let checks = vec![check("price >= 0")];
        let parsed = ConstraintParser::parse_column("price", &checks, None);
        assert_eq!(parsed.min, Some(0.0));
    }

    #[test]
    fn length_check_clamps_to_declared_length() {
        let checks = vec![check("char_length(code) <= 10")];
        let parsed = ConstraintParser::parse_column("code", &checks, Some(5));
        assert_eq!(parsed.max_length, Some(5));
    }

    #[test]
    fn any_array_strips_casts() {
        let checks = vec![check("currency = ANY ARRAY['USD'::text, 'EUR'::text]")];
        let parsed = ConstraintParser::parse_column("currency", &checks, None);
        assert_eq!(parsed.allowed_values, vec!["USD", "EUR"]);
    }

    #[test]
    fn dnf_extracts_disjunction_of_conjunctions() {
        let checks = vec![check(
            "(status = 'active' AND kind = 'user') OR (status = 'pending' AND kind = 'guest')",
        )];
        let constraints = ConstraintParser::parse_multi_column(&checks);
        assert_eq!(constraints.len(), 1);
        assert_eq!(constraints[0].allowed_combinations.len(), 2);
        assert!(constraints[0].columns.contains("status"));
        assert!(constraints[0].columns.contains("kind"));
    }

    #[test]
    fn dnf_disqualifies_clause_with_non_equality_atom() {
        let checks = vec![check("(status = 'active' AND age > 18) OR (status = 'pending')")];
        let constraints = ConstraintParser::parse_multi_column(&checks);
        assert_eq!(constraints.len(), 1);
        // Only the second clause (a pure equality) survives.
        assert_eq!(constraints[0].allowed_combinations.len(), 1);
    }

    #[test]
    fn unparseable_between_literal_is_skipped_not_fatal() {
        let checks = vec![check("val BETWEEN foo AND 20")];
        let parsed = ConstraintParser::parse_column("val", &checks, None);
        assert!(parsed.min.is_none());
        assert!(parsed.max.is_none());
    }
}

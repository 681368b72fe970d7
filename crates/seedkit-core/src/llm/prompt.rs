//! # Prompt Templates
//!
//! Builds the per-column batch-fill prompt an [`AiValueProvider`] sends to
//! the LLM: a short table context plus a request for `count` distinct
//! string values matching the column's SQL type and an approximate word
//! count.
//!
//! [`AiValueProvider`]: super::provider::AiValueProvider

/// Build a batch-fill prompt for one `table.column`.
///
/// `context` is a compact description of the table the column lives in
/// (name plus sibling column names), giving the model enough to infer what
/// the column means without sending the whole schema DDL.
pub fn batch_fill_prompt(
    context: &str,
    table: &str,
    column: &str,
    sql_type: &str,
    word_count: usize,
    count: usize,
) -> String {
    format!(
        r#"You are generating realistic synthetic data for a database column.

Table context:
{context}

Column: {table}.{column}
SQL type: {sql_type}
Target length: approximately {word_count} word(s) per value.

Generate exactly {count} distinct, realistic string values for this column.
Each value should fit naturally as data for a column named "{column}" in a
table named "{table}". Do not include surrounding quotes or explanation.

Return ONLY a JSON object of the form {{"values": ["value1", "value2", ...]}}
with exactly {count} entries, no surrounding text."#,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_names_table_and_column() {
        let prompt = batch_fill_prompt("users(id, bio, email)", "users", "bio", "text", 12, 5);
        assert!(prompt.contains("users.bio"));
        assert!(prompt.contains("text"));
        assert!(prompt.contains("5 entries") || prompt.contains("exactly 5"));
    }

    #[test]
    fn prompt_requests_json_values_object() {
        let prompt = batch_fill_prompt("orders(id, notes)", "orders", "notes", "varchar(255)", 8, 3);
        assert!(prompt.contains("\"values\""));
    }

    #[test]
    fn prompt_includes_word_count_target() {
        let prompt = batch_fill_prompt("users(id, bio)", "users", "bio", "text", 15, 2);
        assert!(prompt.contains("15 word"));
    }
}

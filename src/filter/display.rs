//! Display names for filters.

use chrono::DateTime;
use serde_json::Value;

use crate::design::{CompoundType, SimpleFilterDesign};

/// Locale-style date rendering for RFC 3339 values
const DATE_FORMAT: &str = "%-m/%-d/%Y";

/// `"Database / Table / Field operator value"`
pub(crate) fn simple_name(design: &SimpleFilterDesign) -> String {
    let name = format!(
        "{} / {} / {} {} {}",
        design.database.label(),
        design.table.label(),
        design.field.label(),
        design.operator,
        value_label(design.value.as_ref())
    );
    name.trim_end().to_string()
}

/// `"(child) type (child)"`, one pair of parentheses per nesting level
pub(crate) fn compound_name<'a>(kind: CompoundType, children: impl Iterator<Item = &'a str>) -> String {
    children
        .map(|child| format!("({})", child))
        .collect::<Vec<_>>()
        .join(&format!(" {} ", kind))
}

/// Human-readable form of a filter value
pub(crate) fn value_label(value: Option<&Value>) -> String {
    match value {
        None => String::new(),
        Some(Value::String(text)) => match DateTime::parse_from_rfc3339(text) {
            Ok(date) => date.format(DATE_FORMAT).to_string(),
            Err(_) => text.clone(),
        },
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::{DatabaseMeta, FieldKey, FieldMeta, TableMeta};
    use serde_json::json;

    #[test]
    fn test_simple_name_uses_pretty_names() {
        let field = FieldKey::new(
            "es",
            DatabaseMeta::new("news", "News"),
            TableMeta::new("articles", "Articles"),
            FieldMeta::new("author", "Author"),
        );
        let design = SimpleFilterDesign::new(&field, "=", "Jane");
        assert_eq!(simple_name(&design), "News / Articles / Author = Jane");
    }

    #[test]
    fn test_value_labels() {
        assert_eq!(value_label(None), "");
        assert_eq!(value_label(Some(&json!(0))), "0");
        assert_eq!(value_label(Some(&json!(false))), "false");
        assert_eq!(value_label(Some(&Value::Null)), "null");
        assert_eq!(value_label(Some(&json!("2018-01-02T00:00:00Z"))), "1/2/2018");
    }

    #[test]
    fn test_missing_value_trims_name() {
        let design = SimpleFilterDesign::new(&FieldKey::named("es", "db", "t", "f"), "!=", 1)
            .without_value();
        assert_eq!(simple_name(&design), "db / t / f !=");
    }

    #[test]
    fn test_compound_name() {
        let name = compound_name(CompoundType::Or, ["a = 1", "b = 2"].into_iter());
        assert_eq!(name, "(a = 1) or (b = 2)");
    }
}

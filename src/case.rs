//! Naming helpers for entity names: tag capitalization and conventional foreign keys.

/// Uppercase the first character: "tasks" -> "Tasks".
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Naive singular form: drops one trailing 's'. "tasks" -> "task", "status" -> "statu".
pub fn singular(s: &str) -> &str {
    s.strip_suffix('s').unwrap_or(s)
}

/// Conventional foreign key column on a dependent table: "tasks" -> "taskId".
pub fn foreign_key_for(parent: &str) -> String {
    format!("{}Id", singular(parent))
}

/// PascalCase name prefix for component schemas: "expense_items" -> "ExpenseItems".
pub fn to_pascal_case(s: &str) -> String {
    s.split(|c: char| c == '_' || c == '-')
        .filter(|part| !part.is_empty())
        .map(capitalize)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capitalizes_first_letter_only() {
        assert_eq!(capitalize("tasks"), "Tasks");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn foreign_key_uses_singular() {
        assert_eq!(foreign_key_for("expenses"), "expenseId");
        assert_eq!(foreign_key_for("staff"), "staffId");
    }

    #[test]
    fn pascal_case_splits_on_separators() {
        assert_eq!(to_pascal_case("expense_items"), "ExpenseItems");
        assert_eq!(to_pascal_case("tasks"), "Tasks");
    }
}

use serde::Serialize;

use crate::entities::project::MAX_TECHNOLOGY_LENGTH;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Technology {
    pub id: i64,
    pub name: String,
    pub project_id: i64,
}

/// Splits a comma separated technology list, trimming each entry and
/// dropping the empty ones. Order and duplicates are preserved.
pub fn parse_technologies(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Inverse of [`parse_technologies`], used to prefill the edit form.
pub fn join_technologies<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    names.into_iter().collect::<Vec<_>>().join(", ")
}

pub fn technology_name_too_long(name: &str) -> bool {
    name.chars().count() > MAX_TECHNOLOGY_LENGTH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_and_trims_names() {
        assert_eq!(parse_technologies("Go, Rust"), vec!["Go", "Rust"]);
    }

    #[test]
    fn drops_empty_entries() {
        assert_eq!(parse_technologies(" , Python,,  Flask ,"), vec!["Python", "Flask"]);
        assert!(parse_technologies("").is_empty());
        assert!(parse_technologies("  ,  ").is_empty());
    }

    #[test]
    fn keeps_duplicates() {
        assert_eq!(parse_technologies("SQL, SQL"), vec!["SQL", "SQL"]);
    }

    #[test]
    fn joins_for_the_edit_form() {
        assert_eq!(join_technologies(["Go", "Rust"]), "Go, Rust");
        assert_eq!(parse_technologies(&join_technologies(["Go", "Rust"])), vec!["Go", "Rust"]);
    }
}

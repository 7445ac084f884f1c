use crate::config::IngestLimits;
use crate::domain::model::{CellScalar, FullName, SanitizedRow};
use crate::utils::error::{IngestError, Result};
use regex::Regex;
use std::sync::LazyLock;

/// Characters that never belong in a person's name. Unicode letters and
/// combining marks stay, so names in any script survive; whitespace,
/// apostrophes, periods and hyphens stay for names like "O'Brien" and
/// "Jean-Luc".
static NAME_DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{M}\s'.\-]+").expect("name pattern is valid"));

/// Pulls member names out of sanitized rows.
///
/// Column matching is heuristic and per row: any header whose lowercase form
/// contains both "first" and "name" supplies the first name, likewise "last"
/// and "name" for the last name. Rows missing either column, or where either
/// side cleans down to nothing, are skipped silently. Duplicates are kept;
/// two members may genuinely share a name.
pub struct NameExtractor;

impl NameExtractor {
    pub fn extract(rows: &[SanitizedRow], limits: &IngestLimits) -> Result<Vec<FullName>> {
        let mut names = Vec::new();
        for row in rows {
            if let Some(name) = extract_from_row(row, limits) {
                names.push(name);
            }
        }

        if names.len() > limits.max_members {
            return Err(IngestError::TooManyMembers {
                count: names.len(),
                limit: limits.max_members,
            });
        }

        tracing::debug!("Extracted {} member names", names.len());
        Ok(names)
    }
}

fn extract_from_row(row: &SanitizedRow, limits: &IngestLimits) -> Option<FullName> {
    // Both halves must survive cleaning; a row with only one usable side is
    // skipped, never half-emitted.
    let first = name_part(find_column(row, "first"), limits)?;
    let last = name_part(find_column(row, "last"), limits)?;
    Some(FullName::new(format!("{first} {last}")))
}

/// First cell whose header contains both `marker` and "name", ignoring case.
fn find_column<'a>(row: &'a SanitizedRow, marker: &str) -> Option<&'a CellScalar> {
    row.iter()
        .find(|(header, _)| {
            let lower = header.to_lowercase();
            lower.contains(marker) && lower.contains("name")
        })
        .map(|(_, value)| value)
}

/// Cleans one name component. Returns `None` when the cell is absent, cleans
/// down to nothing, or exceeds the configured name length after trimming.
fn name_part(value: Option<&CellScalar>, limits: &IngestLimits) -> Option<String> {
    let raw = value?.to_display_string();
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.chars().count() > limits.max_name_length {
        return None;
    }

    // Stripping can expose new edge whitespace; interior whitespace is part
    // of the allowed class and stays untouched.
    let stripped = NAME_DISALLOWED.replace_all(trimmed, "");
    let cleaned = stripped.trim();
    if cleaned.is_empty() {
        return None;
    }
    Some(cleaned.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> IngestLimits {
        IngestLimits::default()
    }

    fn row(pairs: &[(&str, &str)]) -> SanitizedRow {
        let mut row = SanitizedRow::new();
        for (header, value) in pairs {
            row.push(header.to_string(), CellScalar::Text(value.to_string()));
        }
        row
    }

    #[test]
    fn test_joins_first_and_last_name_with_trimming() {
        let rows = vec![row(&[("First Name", "  John "), ("Last Name", "Doe")])];
        let names = NameExtractor::extract(&rows, &limits()).unwrap();
        assert_eq!(names, vec![FullName::new("John Doe")]);
    }

    #[test]
    fn test_header_matching_is_case_insensitive_and_fuzzy() {
        let rows = vec![
            row(&[("FIRST NAME", "Ada"), ("LAST NAME", "Lovelace")]),
            row(&[("firstname", "Grace"), ("lastname", "Hopper")]),
            row(&[("Member First Name", "Annie"), ("Member Last Name", "Easley")]),
        ];
        let names = NameExtractor::extract(&rows, &limits()).unwrap();
        assert_eq!(
            names,
            vec![
                FullName::new("Ada Lovelace"),
                FullName::new("Grace Hopper"),
                FullName::new("Annie Easley"),
            ]
        );
    }

    #[test]
    fn test_rows_missing_either_name_are_skipped() {
        let rows = vec![
            row(&[("First Name", "Cher"), ("Last Name", "")]),
            row(&[("Last Name", "Ali")]),
            row(&[("First Name", "Grace"), ("Last Name", "Hopper")]),
        ];
        let names = NameExtractor::extract(&rows, &limits()).unwrap();
        assert_eq!(names, vec![FullName::new("Grace Hopper")]);
    }

    #[test]
    fn test_rows_without_name_columns_are_skipped() {
        let rows = vec![
            row(&[("Club", "Riyadh"), ("Seats", "4")]),
            row(&[("First Name", "Aisha"), ("Last Name", "Khan")]),
        ];
        let names = NameExtractor::extract(&rows, &limits()).unwrap();
        assert_eq!(names, vec![FullName::new("Aisha Khan")]);
    }

    #[test]
    fn test_unicode_names_survive_cleaning() {
        let rows = vec![
            row(&[("First Name", "عائشة"), ("Last Name", "خان")]),
            row(&[("First Name", "José"), ("Last Name", "Núñez")]),
        ];
        let names = NameExtractor::extract(&rows, &limits()).unwrap();
        assert_eq!(
            names,
            vec![FullName::new("عائشة خان"), FullName::new("José Núñez")]
        );
    }

    #[test]
    fn test_disallowed_characters_are_stripped_from_names() {
        let rows = vec![row(&[
            ("First Name", "J0hn<script>"),
            ("Last Name", "O'Brien-Smith Jr."),
        ])];
        let names = NameExtractor::extract(&rows, &limits()).unwrap();
        assert_eq!(names, vec![FullName::new("Jhnscript O'Brien-Smith Jr.")]);
    }

    #[test]
    fn test_overlong_component_skips_the_row() {
        let rows = vec![
            row(&[("First Name", &"x".repeat(51)), ("Last Name", "Doe")]),
            row(&[("First Name", &"x".repeat(50)), ("Last Name", "Doe")]),
        ];
        let names = NameExtractor::extract(&rows, &limits()).unwrap();
        // Exactly at the limit is still allowed.
        assert_eq!(names, vec![FullName::new(format!("{} Doe", "x".repeat(50)))]);
    }

    #[test]
    fn test_interior_whitespace_is_preserved() {
        let rows = vec![row(&[
            ("First Name", "Anna  Maria"),
            ("Last Name", "Doe"),
        ])];
        let names = NameExtractor::extract(&rows, &limits()).unwrap();
        assert_eq!(names, vec![FullName::new("Anna  Maria Doe")]);
    }

    #[test]
    fn test_component_that_cleans_to_nothing_is_skipped() {
        let rows = vec![row(&[("First Name", "###"), ("Last Name", "$$$")])];
        let names = NameExtractor::extract(&rows, &limits()).unwrap();
        assert!(names.is_empty());
    }

    #[test]
    fn test_duplicates_are_preserved() {
        let rows = vec![
            row(&[("First Name", "John"), ("Last Name", "Doe")]),
            row(&[("First Name", "John"), ("Last Name", "Doe")]),
        ];
        let names = NameExtractor::extract(&rows, &limits()).unwrap();
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn test_member_ceiling_is_enforced() {
        let small = IngestLimits {
            max_members: 1,
            ..Default::default()
        };
        let rows = vec![
            row(&[("First Name", "A"), ("Last Name", "B")]),
            row(&[("First Name", "C"), ("Last Name", "D")]),
        ];
        assert!(matches!(
            NameExtractor::extract(&rows, &small),
            Err(IngestError::TooManyMembers { count: 2, limit: 1 })
        ));
    }

    #[test]
    fn test_non_text_cells_render_through_display_form() {
        let mut r = SanitizedRow::new();
        r.push("First Name", CellScalar::Bool(true));
        r.push("Last Name", CellScalar::Text("Doe".to_string()));
        let names = NameExtractor::extract(&[r], &limits()).unwrap();
        assert_eq!(names, vec![FullName::new("true Doe")]);

        // Digits are not name characters; a numeric cell cleans to nothing
        // and the row is skipped.
        let mut r = SanitizedRow::new();
        r.push("First Name", CellScalar::Number(42.0));
        r.push("Last Name", CellScalar::Text("Doe".to_string()));
        let names = NameExtractor::extract(&[r], &limits()).unwrap();
        assert!(names.is_empty());
    }
}

//! Cleanup of raw model output into a bare SQL statement.
//!
//! This is a textual heuristic, not a parser. Whatever it leaves behind is
//! checked again by the statement guard and the executor.

use regex::Regex;
use std::sync::LazyLock;

static TAGGED_OPENING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^```sql\s*").expect("valid fence pattern"));
static BARE_OPENING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^```\s*").expect("valid fence pattern"));
static CLOSING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```\s*$").expect("valid fence pattern"));

/// Strip code fences, an optional `sql` language tag and surrounding
/// whitespace from `raw`.
pub fn sanitize(raw: &str) -> String {
    let text = raw.trim();

    let text = match TAGGED_OPENING_FENCE.find(text) {
        Some(fence) => &text[fence.end()..],
        None => BARE_OPENING_FENCE
            .find(text)
            .map_or(text, |fence| &text[fence.end()..]),
    };

    let text = CLOSING_FENCE
        .find(text)
        .map_or(text, |fence| &text[..fence.start()]);

    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const Q: &str = "SELECT region, SUM(profit) FROM sales GROUP BY region;";

    #[test]
    fn test_tagged_fence() {
        assert_eq!(sanitize(&format!("```sql\n{}\n```", Q)), Q);
    }

    #[test]
    fn test_bare_fence() {
        assert_eq!(sanitize(&format!("```\n{}\n```", Q)), Q);
    }

    #[test]
    fn test_unfenced() {
        assert_eq!(sanitize(Q), Q);
        assert_eq!(sanitize(&format!("  \n{}\n\t", Q)), Q);
    }

    #[test]
    fn test_tag_case_insensitive() {
        assert_eq!(sanitize(&format!("```SQL\n{}\n```", Q)), Q);
        assert_eq!(sanitize(&format!("```Sql {}```", Q)), Q);
    }

    #[test]
    fn test_smartphone_example() {
        let raw = "```sql\nSELECT * FROM sales WHERE product_name = 'Smartphone';\n```";
        assert_eq!(
            sanitize(raw),
            "SELECT * FROM sales WHERE product_name = 'Smartphone';"
        );
    }

    #[test]
    fn test_surrounding_whitespace_and_trailing_blank_lines() {
        let raw = format!("\n\n```sql\n\n{}\n\n```\n\n", Q);
        assert_eq!(sanitize(&raw), Q);
    }

    #[test]
    fn test_other_language_tag_leaves_residue() {
        // Only the `sql` tag is recognized; anything else is left for the
        // executor to reject.
        assert_eq!(sanitize(&format!("```sqlite\n{}\n```", Q)), format!("ite\n{}", Q));
        assert_eq!(sanitize(&format!("```postgres\n{}\n```", Q)), format!("postgres\n{}", Q));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(sanitize(""), "");
        assert_eq!(sanitize("```\n```"), "");
    }
}

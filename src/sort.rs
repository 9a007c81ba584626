use serde::{Deserialize, Serialize};

/// Sort direction for an ordering clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// One parsed segment of a sort expression, before alias resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSegment {
    pub column: String,
    pub direction: SortDirection,
}

/// Parse a sort expression like `"name,-created_at"` into ordered segments.
///
/// Segments are trimmed and empty ones dropped; a leading `-` marks a
/// descending direction. Column tokens are stripped down to letters, digits
/// and underscores before anything else looks at them, and segments that end
/// up empty are dropped. Left-to-right order is preserved and is the
/// application order of the resulting clauses.
pub fn parse_sort_expression(expression: &str) -> Vec<SortSegment> {
    let mut segments = Vec::new();
    for part in expression.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let (token, direction) = match part.strip_prefix('-') {
            Some(stripped) => (stripped, SortDirection::Desc),
            None => (part, SortDirection::Asc),
        };
        let column = sanitize_column(token);
        if column.is_empty() {
            continue;
        }
        segments.push(SortSegment { column, direction });
    }
    segments
}

/// Strip every character that is not a letter, digit or underscore.
///
/// Qualified `table.column` tokens collapse to `tablecolumn` on purpose:
/// only bare column names are addressable from a sort expression.
pub fn sanitize_column(token: &str) -> String {
    token
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

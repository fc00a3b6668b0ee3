//! Recommendation ranking over findings

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::checks::messages;
use crate::validation::{Detail, Severity};

/// Recommendations kept per priority tier unless configured otherwise
pub const DEFAULT_TOP_N: usize = 5;

/// Suggestion attached to messages missing from the table
pub const FALLBACK_SUGGESTION: &str = "Review the reported artifacts and resolve the issue";

/// Aggregation errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AggregationError {
    /// A finding without a message or artifact path reached the aggregator
    #[error("Malformed detail at index {index}: {reason}")]
    MalformedDetail { index: usize, reason: &'static str },
}

/// Recommendation tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::High => write!(f, "high"),
            Priority::Medium => write!(f, "medium"),
        }
    }
}

/// One actionable summary of identical findings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: Priority,
    pub issue_text: String,
    pub occurrence_count: usize,
    pub suggested_action: String,
}

const SUGGESTIONS: &[(&str, &str)] = &[
    (messages::MISSING_TITLE, "Add a top-level '# Title' heading as the first content line"),
    (
        messages::UNTERMINATED_FRONTMATTER,
        "Close the frontmatter block with a '---' line",
    ),
    (messages::FRONTMATTER_MISSING_NAME, "Add a 'name:' field to the frontmatter"),
    (
        messages::FRONTMATTER_MISSING_DESCRIPTION,
        "Add a 'description:' field to the frontmatter",
    ),
    (messages::UNCLOSED_CODE_FENCE, "Close every ``` code fence that is opened"),
    (messages::INVALID_JSON, "Fix the JSON syntax so the file parses"),
    (messages::LINE_TOO_LONG, "Wrap long lines or move content into lists or tables"),
    (messages::TODO_MARKER, "Resolve or remove TODO/FIXME markers before publishing"),
    (messages::EMPTY_SECTION, "Add content under the heading or remove the section"),
    (messages::BROKEN_LINK, "Point relative links at files that exist in the corpus"),
    (messages::MISSING_SHEBANG, "Start scripts with a '#!' interpreter line"),
    (
        messages::OVERSIZED_ARTIFACT,
        "Split the artifact into smaller documents",
    ),
    (
        messages::UNREADABLE_ARTIFACT,
        "Check file permissions and encoding (UTF-8 expected)",
    ),
];

/// Suggested action for a finding message, by exact text
pub fn suggestion_for(message: &str) -> &'static str {
    SUGGESTIONS
        .iter()
        .find(|(m, _)| *m == message)
        .map(|(_, s)| *s)
        .unwrap_or(FALLBACK_SUGGESTION)
}

struct Group<'a> {
    message: &'a str,
    count: usize,
    has_error: bool,
}

/// Rank findings into at most `top_n` high and `top_n` medium recommendations
///
/// Findings are grouped by exact message text. A group with any error is
/// high priority. Each tier is sorted by count (ties keep first appearance)
/// and truncated on its own before high is placed ahead of medium.
pub fn recommend(details: &[Detail], top_n: usize) -> Result<Vec<Recommendation>, AggregationError> {
    let mut groups: Vec<Group<'_>> = Vec::new();
    let mut index_of: HashMap<&str, usize> = HashMap::new();

    for (index, detail) in details.iter().enumerate() {
        if detail.message.trim().is_empty() {
            return Err(AggregationError::MalformedDetail {
                index,
                reason: "empty message",
            });
        }
        if detail.artifact_path.is_empty() {
            return Err(AggregationError::MalformedDetail {
                index,
                reason: "empty artifact path",
            });
        }

        let slot = *index_of.entry(detail.message.as_str()).or_insert_with(|| {
            groups.push(Group {
                message: detail.message.as_str(),
                count: 0,
                has_error: false,
            });
            groups.len() - 1
        });
        let group = &mut groups[slot];
        group.count += 1;
        group.has_error |= detail.severity == Severity::Error;
    }

    let (mut high, mut medium): (Vec<Group<'_>>, Vec<Group<'_>>) =
        groups.into_iter().partition(|g| g.has_error);
    high.sort_by(|a, b| b.count.cmp(&a.count));
    medium.sort_by(|a, b| b.count.cmp(&a.count));

    let tier = |groups: Vec<Group<'_>>, priority: Priority| {
        groups
            .into_iter()
            .take(top_n)
            .map(move |g| Recommendation {
                priority,
                issue_text: g.message.to_string(),
                occurrence_count: g.count,
                suggested_action: suggestion_for(g.message).to_string(),
            })
            .collect::<Vec<_>>()
    };

    let mut recommendations = tier(high, Priority::High);
    recommendations.extend(tier(medium, Priority::Medium));
    Ok(recommendations)
}

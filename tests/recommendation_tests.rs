//! Recommendation Engine Tests
//!
//! Tests for:
//! - A. Mixed-severity grouping and tier ordering
//! - B. Recommendation cap
//! - C. Contract violations fail fast

use corpus_validator::aggregator::{recommend, AggregationError, Priority, FALLBACK_SUGGESTION};
use corpus_validator::checks::messages;
use corpus_validator::validation::Detail;

fn many(detail: Detail, n: usize) -> Vec<Detail> {
    (0..n).map(|_| detail.clone()).collect()
}

// ===== A. Grouping =====

#[test]
fn test_missing_title_and_line_length_scenario() {
    let mut details = many(Detail::error("a.md", "Missing title"), 8);
    details.extend(many(Detail::warning("b.md", "Missing title"), 4));
    details.extend(many(Detail::warning("c.md", "Line too long"), 3));

    let recs = recommend(&details, 5).expect("well-formed");

    assert_eq!(recs.len(), 2);
    assert_eq!(
        (recs[0].priority, recs[0].issue_text.as_str(), recs[0].occurrence_count),
        (Priority::High, "Missing title", 12)
    );
    assert_eq!(
        (recs[1].priority, recs[1].issue_text.as_str(), recs[1].occurrence_count),
        (Priority::Medium, "Line too long", 3)
    );
    assert_ne!(recs[0].suggested_action, FALLBACK_SUGGESTION);
}

#[test]
fn test_catalog_messages_all_have_suggestions() {
    let catalog = [
        messages::MISSING_TITLE,
        messages::UNTERMINATED_FRONTMATTER,
        messages::FRONTMATTER_MISSING_NAME,
        messages::FRONTMATTER_MISSING_DESCRIPTION,
        messages::UNCLOSED_CODE_FENCE,
        messages::INVALID_JSON,
        messages::LINE_TOO_LONG,
        messages::TODO_MARKER,
        messages::EMPTY_SECTION,
        messages::BROKEN_LINK,
        messages::MISSING_SHEBANG,
        messages::OVERSIZED_ARTIFACT,
        messages::UNREADABLE_ARTIFACT,
    ];
    let details: Vec<Detail> = catalog.iter().map(|m| Detail::warning("x.md", *m)).collect();

    let recs = recommend(&details, catalog.len()).expect("well-formed");
    assert_eq!(recs.len(), catalog.len());
    assert!(recs.iter().all(|r| r.suggested_action != FALLBACK_SUGGESTION));
}

// ===== B. Cap =====

#[test]
fn test_never_more_than_top_n_per_tier() {
    let mut details = Vec::new();
    for i in 0..20 {
        details.push(Detail::error("a.md", format!("error kind {}", i)));
        details.push(Detail::warning("a.md", format!("warning kind {}", i)));
    }

    for top_n in 1..=7 {
        let recs = recommend(&details, top_n).expect("well-formed");
        assert!(recs.len() <= 2 * top_n);
        let high = recs.iter().filter(|r| r.priority == Priority::High).count();
        let medium = recs.iter().filter(|r| r.priority == Priority::Medium).count();
        assert_eq!(high, top_n);
        assert_eq!(medium, top_n);
        // High tier always precedes medium
        assert!(recs[..high].iter().all(|r| r.priority == Priority::High));
    }
}

// ===== C. Contract violations =====

#[test]
fn test_empty_message_fails_fast() {
    let details = vec![
        Detail::warning("a.md", "Line too long"),
        Detail::error("b.md", ""),
    ];
    let err = recommend(&details, 5).expect_err("malformed");
    assert!(matches!(err, AggregationError::MalformedDetail { index: 1, .. }));
}

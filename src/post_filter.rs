use crate::constants::{
    IRRELEVANT_QUESTION_KEYWORD, IRRELEVANT_TITLE_KEYWORDS, LONG_POST_FACTOR,
    MODERATION_REMOVAL_MARKER, TRIP_REPORT_PHRASES,
};
use crate::error::{Result, ScraperError};
use crate::types::{Answer, Post};
use regex::Regex;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Why a post was dropped. Carried with the decision so the firing rule is
/// always reportable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    TripReport,
    NotAppropriate,
    LongPost,
    IrrelevantPost,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RejectReason::TripReport => "Trip Report",
            RejectReason::NotAppropriate => "Not Appropriate",
            RejectReason::LongPost => "Long Post",
            RejectReason::IrrelevantPost => "Irrelevant Post",
        };
        write!(f, "{}", name)
    }
}

/// Outcome of evaluating one post against the rule chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDecision {
    Accepted,
    Rejected(RejectReason),
}

/// Ordered admissibility rules for community QA posts. Rules run in a fixed
/// priority; the first match rejects and later rules are not consulted.
pub struct PostFilterChain {
    average_post_length: f64,
    trip_report_marker: Regex,
}

/// Per-run counters for a filter pass over a posts corpus.
#[derive(Debug, Default)]
pub struct FilterSummary {
    pub total: usize,
    pub accepted: usize,
    pub trip_reports: usize,
    pub not_appropriate: usize,
    pub long_posts: usize,
    pub irrelevant: usize,
}

impl PostFilterChain {
    /// `average_post_length` is a corpus-wide statistic computed upstream;
    /// the chain never recomputes it.
    pub fn new(average_post_length: f64) -> Self {
        Self {
            average_post_length,
            // "TR" then a non-letter separator, then more text
            trip_report_marker: Regex::new(r"^TR[\s\-/:.]+\S").unwrap(),
        }
    }

    pub fn evaluate(&self, post: &Post) -> FilterDecision {
        if self.is_trip_report(&post.title) {
            return FilterDecision::Rejected(RejectReason::TripReport);
        }
        if self.is_not_appropriate(&post.answers) {
            return FilterDecision::Rejected(RejectReason::NotAppropriate);
        }
        if self.is_long_post(&post.question) {
            return FilterDecision::Rejected(RejectReason::LongPost);
        }
        if self.is_irrelevant(&post.title, &post.question) {
            return FilterDecision::Rejected(RejectReason::IrrelevantPost);
        }
        FilterDecision::Accepted
    }

    fn is_trip_report(&self, title: &str) -> bool {
        if self.trip_report_marker.is_match(title) {
            return true;
        }
        let lower = title.to_lowercase();
        TRIP_REPORT_PHRASES.iter().any(|phrase| lower.contains(phrase))
    }

    fn is_not_appropriate(&self, answers: &[Answer]) -> bool {
        answers
            .iter()
            .any(|answer| answer.body.contains(MODERATION_REMOVAL_MARKER))
    }

    /// Strictly longer than `LONG_POST_FACTOR` times the corpus average;
    /// a question at exactly the threshold passes.
    fn is_long_post(&self, question: &str) -> bool {
        question.chars().count() as f64 > LONG_POST_FACTOR * self.average_post_length
    }

    fn is_irrelevant(&self, title: &str, question: &str) -> bool {
        let title_lower = title.to_lowercase();
        if IRRELEVANT_TITLE_KEYWORDS
            .iter()
            .any(|keyword| title_lower.contains(keyword))
        {
            return true;
        }
        question.to_lowercase().contains(IRRELEVANT_QUESTION_KEYWORD)
    }

    /// Filters a JSON posts corpus file into an accepted-only corpus file,
    /// preserving input order. Unreadable/malformed input is fatal.
    pub fn run(&self, input: &Path, output: &Path) -> Result<FilterSummary> {
        let content = fs::read_to_string(input).map_err(|e| ScraperError::InputRead {
            path: input.display().to_string(),
            message: e.to_string(),
        })?;
        let posts: Vec<Post> = serde_json::from_str(&content).map_err(|e| ScraperError::InputRead {
            path: input.display().to_string(),
            message: e.to_string(),
        })?;

        let mut summary = FilterSummary {
            total: posts.len(),
            ..Default::default()
        };
        let mut accepted = Vec::new();

        for post in posts {
            match self.evaluate(&post) {
                FilterDecision::Accepted => {
                    summary.accepted += 1;
                    accepted.push(post);
                }
                FilterDecision::Rejected(reason) => {
                    debug!(url = %post.url, %reason, "post rejected");
                    match reason {
                        RejectReason::TripReport => summary.trip_reports += 1,
                        RejectReason::NotAppropriate => summary.not_appropriate += 1,
                        RejectReason::LongPost => summary.long_posts += 1,
                        RejectReason::IrrelevantPost => summary.irrelevant += 1,
                    }
                }
            }
        }

        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(output, serde_json::to_string_pretty(&accepted)?)?;
        info!(
            total = summary.total,
            accepted = summary.accepted,
            "post filter pass finished"
        );

        Ok(summary)
    }
}

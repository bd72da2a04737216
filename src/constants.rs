//! Crawler name constants and the fixed keyword/marker sets used by the
//! extraction and filtering stages.

// Crawler names (used in logs and CLI output)
pub const HOTELS_CRAWLER: &str = "hotels";
pub const RESTAURANTS_CRAWLER: &str = "restaurants";
pub const ATTRACTIONS_CRAWLER: &str = "attractions";

/// Browser identity sent with every page request
pub const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/79.0.3945.117 Safari/537.36";
pub const ACCEPT_LANGUAGE: &str = "en-GB,en-US;q=0.9,en;q=0.8";

/// Number of reviews requested per review-list page
pub const REVIEW_PAGE_SIZE: u32 = 10;

/// Tracking query parameters stripped from booking-site entity URLs
pub const HOTEL_TRACKING_PARAMS: &[&str] = &["label", "sid"];

/// Tracking query parameters stripped from advisor-site entity URLs
pub const ADVISOR_TRACKING_PARAMS: &[&str] = &["m", "ref"];

/// Marker phrase left behind when moderators remove an answer
pub const MODERATION_REMOVAL_MARKER: &str =
    "was determined to be inappropriate by the TripAdvisor community";

/// Phrases in a post title that mark it as a trip narrative
pub const TRIP_REPORT_PHRASES: &[&str] = &["trip report", "trip review"];

/// Title keywords signalling non-question content (compared lowercase)
pub const IRRELEVANT_TITLE_KEYWORDS: &[&str] = &[
    " vs ",
    " vs.",
    " or ",
    "your thoughts",
    "route",
    "transfer",
    "itinerary",
    "how to get",
    "review of",
];

/// A question mentioning its own itinerary is not answerable as a QA item
pub const IRRELEVANT_QUESTION_KEYWORD: &str = "itinerary";

/// Multiplier over the corpus average length beyond which a question is
/// considered a long post
pub const LONG_POST_FACTOR: f64 = 1.7;

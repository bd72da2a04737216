pub mod attractions;
pub mod hotels;
pub mod restaurants;

use crate::entity_id::EntityType;
use crate::fetch::PageFetcher;
use crate::types::EntityCrawler;
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;
use url::Url;

pub use attractions::AttractionsCrawler;
pub use hotels::HotelsCrawler;
pub use restaurants::RestaurantsCrawler;

/// Closed per-type lookup: one crawler implementation per entity type.
pub fn create_crawler(
    entity_type: EntityType,
    fetcher: Arc<dyn PageFetcher>,
) -> Arc<dyn EntityCrawler> {
    match entity_type {
        EntityType::Hotel => Arc::new(HotelsCrawler::new(fetcher)),
        EntityType::Restaurant => Arc::new(RestaurantsCrawler::new(fetcher)),
        EntityType::Attraction => Arc::new(AttractionsCrawler::new(fetcher)),
    }
}

/// Strips known tracking query parameters from an entity URL, keeping blank
/// values and the order of everything else. Unparseable URLs pass through.
pub(crate) fn clean_url(raw: &str, tracking_params: &[&str]) -> String {
    let mut parsed = match Url::parse(raw.trim()) {
        Ok(url) => url,
        Err(_) => return raw.trim().to_string(),
    };

    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(name, _)| !tracking_params.contains(&name.as_ref()))
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();

    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        let mut pairs = parsed.query_pairs_mut();
        pairs.clear();
        for (name, value) in &kept {
            pairs.append_pair(name, value);
        }
        drop(pairs);
    }

    parsed.to_string()
}

/// Resolves a possibly-relative "next page" href against the current page.
pub(crate) fn resolve_href(current: &str, href: &str) -> String {
    match Url::parse(current).and_then(|base| base.join(href)) {
        Ok(url) => url.to_string(),
        Err(_) => href.to_string(),
    }
}

/// Date text may carry a `"<label>: <value>"` prefix. With a `": "` separator
/// present, the segment between the first and second separator is taken (a
/// value containing its own `": "` is truncated there; kept as-is, the
/// downstream corpus was built on this behavior). Without one, the trimmed
/// text is used verbatim.
pub(crate) fn split_date_prefix(text: &str) -> String {
    match text.split_once(": ") {
        Some((_, rest)) => match rest.find(": ") {
            Some(idx) => rest[..idx].to_string(),
            None => rest.to_string(),
        },
        None => text.trim().to_string(),
    }
}

/// Reads the page's first embedded JSON-LD block, if it parses.
pub(crate) fn json_ld(document: &Html) -> Option<serde_json::Value> {
    let selector = Selector::parse(r#"script[type="application/ld+json"]"#).unwrap();
    let script = document.select(&selector).next()?;
    let text: String = script.text().collect();
    serde_json::from_str(&text).ok()
}

/// First element matching `selector`, as trimmed text.
pub(crate) fn select_first_text(document: &Html, selector: &Selector) -> Option<String> {
    document.select(selector).next().map(|el| collect_text(&el))
}

/// All elements matching `selector`, each as trimmed text.
pub(crate) fn select_all_text(document: &Html, selector: &Selector) -> Vec<String> {
    document.select(selector).map(|el| collect_text(&el)).collect()
}

/// Text of every element matching `selector`, joined with single spaces.
pub(crate) fn select_joined_text(document: &Html, selector: &Selector) -> String {
    let parts: Vec<String> = document
        .select(selector)
        .map(|el| collect_text(&el))
        .filter(|t| !t.is_empty())
        .collect();
    parts.join(" ")
}

pub(crate) fn collect_text(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Decodes an advisor-style bubble rating class (`bubble_45` -> `"4.5"`).
/// Anything unexpected defaults to `"0"`.
pub(crate) fn bubble_rating(class_attr: &str) -> String {
    class_attr
        .split_whitespace()
        .find_map(|token| token.strip_prefix("bubble_"))
        .and_then(|digits| digits.parse::<u32>().ok())
        .map(|value| format!("{:.1}", value as f64 / 10.0))
        .unwrap_or_else(|| "0".to_string())
}

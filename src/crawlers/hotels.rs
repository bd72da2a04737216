use crate::constants::{HOTELS_CRAWLER, HOTEL_TRACKING_PARAMS, REVIEW_PAGE_SIZE};
use crate::crawlers::{
    clean_url, collect_text, json_ld, resolve_href, select_all_text, select_first_text,
    select_joined_text, split_date_prefix,
};
use crate::error::Result;
use crate::fetch::PageFetcher;
use crate::types::{EntityCrawler, EntityRef, RawEntity, RawReview};
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

const REVIEW_LIST_URL: &str = "https://www.booking.com/reviewlist.en-gb.html";

/// Extractor for booking-site hotel pages. Reads the embedded JSON-LD record
/// first and falls back to positional markup per field; review history is
/// walked page by page through the review-list endpoint.
pub struct HotelsCrawler {
    fetcher: Arc<dyn PageFetcher>,
    coordinates: Regex,
}

impl HotelsCrawler {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            fetcher,
            // Captures only the two-element array so trailing script junk
            // never leaks into the decode
            coordinates: Regex::new(
                r#"defaultCoordinates:\s*(\[\s*['"][\d.]+['"]\s*,\s*['"][\d.]+['"]\s*\])"#,
            )
            .unwrap(),
        }
    }

    /// Review-list URL for offset 0, derived from the hotel page URL: the
    /// country code is the second-to-last path segment, the page name the
    /// last one without its extension.
    fn base_review_page_url(&self, hotel_url: &str) -> String {
        let without_query = hotel_url.trim().split('?').next().unwrap_or("");
        let segments: Vec<&str> = without_query
            .trim_end_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();
        let pagename = segments
            .last()
            .map(|s| s.split('.').next().unwrap_or(s))
            .unwrap_or("");
        let cc1 = if segments.len() >= 2 {
            segments[segments.len() - 2]
        } else {
            ""
        };

        let mut url = Url::parse(REVIEW_LIST_URL).unwrap();
        url.query_pairs_mut()
            .append_pair("cc1", cc1)
            .append_pair("pagename", pagename)
            .append_pair("rows", &REVIEW_PAGE_SIZE.to_string())
            .append_pair("offset", "0");
        url.to_string()
    }

    /// Locates the embedded coordinate pair, accepting single- or
    /// double-quoted literals. Any failure defaults both coordinates; a page
    /// without coordinates is not an error.
    fn parse_coordinates(&self, body: &str) -> (String, String) {
        let fallback = || ("0.0".to_string(), "0.0".to_string());

        let token = match self.coordinates.captures(body).and_then(|c| c.get(1)) {
            Some(m) => m.as_str().replace('\'', "\""),
            None => {
                debug!("no coordinate token on page, defaulting");
                return fallback();
            }
        };
        let pair: Vec<String> = match serde_json::from_str(&token) {
            Ok(pair) => pair,
            Err(_) => return fallback(),
        };
        let latitude = pair.first().and_then(|v| v.parse::<f64>().ok());
        let longitude = pair.get(1).and_then(|v| v.parse::<f64>().ok());
        match (latitude, longitude) {
            (Some(lat), Some(lng)) => (lat.to_string(), lng.to_string()),
            _ => fallback(),
        }
    }

    fn parse_entity_page(&self, body: &str) -> RawEntity {
        let document = Html::parse_document(body);
        let structured = json_ld(&document);

        let name_fallback = Selector::parse("h2#hp_hotel_name").unwrap();
        let address_fallback = Selector::parse("span.hp_address_subtitle").unwrap();
        let properties_selector = Selector::parse("div.important_facility").unwrap();
        let description_selector =
            Selector::parse("div#property_description_content p").unwrap();

        let name = structured
            .as_ref()
            .and_then(|d| d.get("name"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .or_else(|| select_first_text(&document, &name_fallback))
            .unwrap_or_else(|| {
                debug!("hotel name missing from both sources, defaulting");
                String::new()
            });

        let address = structured
            .as_ref()
            .and_then(|d| d.get("address"))
            .and_then(|a| a.get("streetAddress"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .or_else(|| select_first_text(&document, &address_fallback))
            .unwrap_or_else(|| {
                debug!("hotel address missing from both sources, defaulting");
                String::new()
            });

        // Structured ratings arrive on a 0-10 scale; the markup path has no
        // rating element, so a missing structured rating defaults outright
        let rating = structured
            .as_ref()
            .and_then(|d| d.get("aggregateRating"))
            .and_then(|r| r.get("ratingValue"))
            .and_then(|v| v.as_f64())
            .map(|v| (v / 2.0).to_string())
            .unwrap_or_else(|| {
                debug!("hotel rating missing from structured data, defaulting");
                "0.0".to_string()
            });

        let (latitude, longitude) = self.parse_coordinates(body);

        RawEntity {
            name,
            address,
            rating,
            latitude,
            longitude,
            properties: select_all_text(&document, &properties_selector),
            description: select_joined_text(&document, &description_selector),
            ..Default::default()
        }
    }

    /// Parses one review-list page: the items it carries plus the next-page
    /// href, if any.
    fn parse_review_page(&self, body: &str, review_url: &str) -> (Vec<RawReview>, Option<String>) {
        let document = Html::parse_document(body);
        let item_selector = Selector::parse("ul.review_list > li").unwrap();
        let title_selector = Selector::parse("h3.c-review-block__title").unwrap();
        let body_selector = Selector::parse("span.c-review__body").unwrap();
        let score_selector = Selector::parse("div.bui-review-score__badge").unwrap();
        let date_selector = Selector::parse("span.c-review-block__date").unwrap();
        let next_selector = Selector::parse("a.pagenext").unwrap();

        let mut reviews = Vec::new();
        for item in document.select(&item_selector) {
            let title = item
                .select(&title_selector)
                .next()
                .map(|el| collect_text(&el))
                .unwrap_or_default();
            let description = item
                .select(&body_selector)
                .map(|el| collect_text(&el))
                .collect::<Vec<_>>()
                .join(" ");
            let rating = item
                .select(&score_selector)
                .next()
                .map(|el| collect_text(&el))
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "0".to_string());
            let date = item
                .select(&date_selector)
                .next()
                .map(|el| split_date_prefix(&collect_text(&el)))
                .unwrap_or_default();

            reviews.push(RawReview {
                title,
                description,
                rating,
                date,
                url: review_url.to_string(),
            });
        }

        let next = document
            .select(&next_selector)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(str::to_string);
        (reviews, next)
    }
}

#[async_trait::async_trait]
impl EntityCrawler for HotelsCrawler {
    fn crawler_name(&self) -> &'static str {
        HOTELS_CRAWLER
    }

    async fn crawl(&self, entity: &EntityRef) -> Result<RawEntity> {
        let body = self.fetcher.fetch(&entity.url).await?;
        let mut raw = self.parse_entity_page(&body);
        raw.url = entity.url.clone();

        // Reviews carry the tracking-stripped entity URL, not their own page
        let review_url = clean_url(&entity.url, HOTEL_TRACKING_PARAMS);
        let mut page_url = self.base_review_page_url(&entity.url);
        let mut previous: Option<String> = None;

        loop {
            let page = self.fetcher.fetch(&page_url).await?;
            let (mut items, next_href) = self.parse_review_page(&page, &review_url);
            raw.reviews.append(&mut items);

            match next_href {
                Some(href) => {
                    let next_url = resolve_href(&page_url, &href);
                    if next_url == page_url || previous.as_deref() == Some(next_url.as_str()) {
                        warn!(url = %next_url, "repeated review pagination link, stopping");
                        break;
                    }
                    previous = Some(std::mem::replace(&mut page_url, next_url));
                }
                None => break,
            }
        }

        info!(id = %entity.id, reviews = raw.reviews.len(), "hotel record assembled");
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::PageFetcher;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct SequenceFetcher {
        pages: Mutex<VecDeque<String>>,
    }

    impl SequenceFetcher {
        fn new(pages: Vec<&str>) -> Arc<Self> {
            Arc::new(Self {
                pages: Mutex::new(pages.into_iter().map(str::to_string).collect()),
            })
        }
    }

    #[async_trait]
    impl PageFetcher for SequenceFetcher {
        async fn fetch(&self, _url: &str) -> Result<String> {
            Ok(self.pages.lock().unwrap().pop_front().unwrap_or_default())
        }
    }

    fn crawler() -> HotelsCrawler {
        HotelsCrawler::new(SequenceFetcher::new(vec![]))
    }

    #[test]
    fn coordinates_regex_captures_only_the_array() {
        let page = r#"defaultCoordinates: ['35.69635946', '139.76560682'], isRTL: '', action: 'hotel'"#;
        let (lat, lng) = crawler().parse_coordinates(page);
        assert_eq!(lat, "35.69635946");
        assert_eq!(lng, "139.76560682");
    }

    #[test]
    fn coordinates_accept_double_quotes_and_spacing() {
        let cases = [
            r#"defaultCoordinates: ["35.69", "139.76"]"#,
            r#"defaultCoordinates:['35.69','139.76']"#,
            r#"defaultCoordinates: [ '35.69' , '139.76' ]"#,
        ];
        for page in cases {
            let (lat, lng) = crawler().parse_coordinates(page);
            assert_eq!(lat, "35.69", "failed on: {}", page);
            assert_eq!(lng, "139.76");
        }
    }

    #[test]
    fn missing_coordinates_default_without_error() {
        let (lat, lng) = crawler().parse_coordinates("<html>No coordinates here</html>");
        assert_eq!(lat, "0.0");
        assert_eq!(lng, "0.0");
    }

    #[test]
    fn review_page_url_is_derived_from_hotel_url() {
        let url = crawler().base_review_page_url("https://www.booking.com/hotel/jp/tokyo-tower.en-gb.html");
        assert!(url.starts_with("https://www.booking.com/reviewlist.en-gb.html?"));
        assert!(url.contains("cc1=jp"));
        assert!(url.contains("pagename=tokyo-tower"));
        assert!(url.contains("rows=10"));
        assert!(url.contains("offset=0"));
    }

    #[test]
    fn entity_page_prefers_structured_data() {
        let page = r#"<html><head>
            <script type="application/ld+json">
            {"name": "Grand Hotel", "address": {"streetAddress": "1 Main St"},
             "aggregateRating": {"ratingValue": 9.0}}
            </script></head>
            <body>defaultCoordinates: ['35.69', '139.76']</body></html>"#;

        let raw = crawler().parse_entity_page(page);
        assert_eq!(raw.name, "Grand Hotel");
        assert_eq!(raw.address, "1 Main St");
        assert_eq!(raw.rating, "4.5"); // structured scale is halved
        assert_eq!(raw.latitude, "35.69");
        assert_eq!(raw.longitude, "139.76");
    }

    #[test]
    fn entity_page_falls_back_to_markup() {
        let page = r#"<html><body>
            <h2 id="hp_hotel_name">Fallback Hotel</h2>
            <span class="hp_address_subtitle">2 Side St</span>
            <div class="important_facility">WiFi</div>
            <div class="important_facility">Pool</div>
            <div id="property_description_content"><p>Nice</p><p>place</p></div>
            </body></html>"#;

        let raw = crawler().parse_entity_page(page);
        assert_eq!(raw.name, "Fallback Hotel");
        assert_eq!(raw.address, "2 Side St");
        assert_eq!(raw.rating, "0.0");
        assert_eq!(raw.latitude, "0.0");
        assert_eq!(raw.properties, vec!["WiFi", "Pool"]);
        assert_eq!(raw.description, "Nice place");
    }

    #[test]
    fn entity_page_with_nothing_defaults_every_field() {
        let raw = crawler().parse_entity_page("<html><body></body></html>");
        assert_eq!(raw.name, "");
        assert_eq!(raw.address, "");
        assert_eq!(raw.rating, "0.0");
        assert_eq!(raw.latitude, "0.0");
        assert_eq!(raw.longitude, "0.0");
        assert!(raw.properties.is_empty());
        assert_eq!(raw.description, "");
    }

    #[test]
    fn review_page_parses_items_and_next_link() {
        let page = r#"<html><body><ul class="review_list">
            <li>
              <h3 class="c-review-block__title">Great stay</h3>
              <span class="c-review__body">Loved it</span>
              <div class="bui-review-score__badge">9.0</div>
              <span class="c-review-block__date">Reviewed: 1 January 2023</span>
            </li>
            <li>
              <span class="c-review__body">No title here</span>
            </li>
            </ul>
            <a class="pagenext" href="/reviewlist.en-gb.html?offset=10">Next</a>
            </body></html>"#;

        let (reviews, next) = crawler().parse_review_page(page, "https://hotel.example/clean");
        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[0].title, "Great stay");
        assert_eq!(reviews[0].rating, "9.0");
        assert_eq!(reviews[0].date, "1 January 2023");
        assert_eq!(reviews[0].url, "https://hotel.example/clean");
        assert_eq!(reviews[1].title, "");
        assert_eq!(reviews[1].rating, "0");
        assert_eq!(next.as_deref(), Some("/reviewlist.en-gb.html?offset=10"));
    }

    #[tokio::test]
    async fn crawl_walks_pagination_until_no_next_link() {
        let detail = r#"<html><head><script type="application/ld+json">
            {"name": "Grand Hotel", "address": {"streetAddress": "1 Main St"},
             "aggregateRating": {"ratingValue": 8.0}}
            </script></head><body></body></html>"#;
        let page_one = r#"<ul class="review_list">
            <li><h3 class="c-review-block__title">First</h3></li></ul>
            <a class="pagenext" href="?offset=10">Next</a>"#;
        let page_two = r#"<ul class="review_list">
            <li><h3 class="c-review-block__title">Second</h3></li></ul>"#;

        let fetcher = SequenceFetcher::new(vec![detail, page_one, page_two]);
        let crawler = HotelsCrawler::new(fetcher);
        let entity = EntityRef {
            id: "123_H_001".to_string(),
            url: "https://www.booking.com/hotel/jp/tokyo.html?sid=abc".to_string(),
        };

        let raw = crawler.crawl(&entity).await.unwrap();
        assert_eq!(raw.name, "Grand Hotel");
        assert_eq!(raw.rating, "4");
        assert_eq!(raw.reviews.len(), 2);
        assert_eq!(raw.reviews[0].title, "First");
        assert_eq!(raw.reviews[1].title, "Second");
        // Reviews inherit the tracking-stripped entity URL
        assert_eq!(raw.reviews[0].url, "https://www.booking.com/hotel/jp/tokyo.html");
        assert_eq!(raw.url, entity.url);
    }

    #[tokio::test]
    async fn crawl_breaks_on_repeated_next_link() {
        let detail = "<html><body></body></html>";
        // Both pages point at the same offset, which would loop forever
        let looping_page = r#"<ul class="review_list">
            <li><h3 class="c-review-block__title">Only</h3></li></ul>
            <a class="pagenext" href="?offset=10">Next</a>"#;

        let fetcher = SequenceFetcher::new(vec![detail, looping_page, looping_page, looping_page]);
        let crawler = HotelsCrawler::new(fetcher);
        let entity = EntityRef {
            id: "123_H_002".to_string(),
            url: "https://www.booking.com/hotel/jp/loop.html".to_string(),
        };

        let raw = crawler.crawl(&entity).await.unwrap();
        // Two fetches at most: the second page repeats the first's next link
        assert!(raw.reviews.len() <= 2);
    }
}

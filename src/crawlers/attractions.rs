use crate::constants::{ADVISOR_TRACKING_PARAMS, ATTRACTIONS_CRAWLER, REVIEW_PAGE_SIZE};
use crate::crawlers::{
    bubble_rating, clean_url, collect_text, json_ld, resolve_href, select_all_text,
    select_first_text, select_joined_text, split_date_prefix,
};
use crate::error::Result;
use crate::fetch::PageFetcher;
use crate::types::{EntityCrawler, EntityRef, RawEntity, RawReview};
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// Extractor for advisor-site attraction pages. Structurally the restaurant
/// crawler with the attraction page's selector set.
pub struct AttractionsCrawler {
    fetcher: Arc<dyn PageFetcher>,
    coordinates: Regex,
}

impl AttractionsCrawler {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            fetcher,
            coordinates: Regex::new(
                r#""latitude"\s*:\s*"?([-\d.]+)"?\s*,\s*"longitude"\s*:\s*"?([-\d.]+)"?"#,
            )
            .unwrap(),
        }
    }

    fn base_review_page_url(&self, attraction_url: &str) -> String {
        let clean = clean_url(attraction_url, ADVISOR_TRACKING_PARAMS);
        match Url::parse(&clean) {
            Ok(mut url) => {
                url.query_pairs_mut()
                    .append_pair("reviewsRows", &REVIEW_PAGE_SIZE.to_string())
                    .append_pair("reviewsOffset", "0");
                url.to_string()
            }
            Err(_) => clean,
        }
    }

    fn parse_coordinates(&self, body: &str) -> (String, String) {
        match self.coordinates.captures(body) {
            Some(captures) => {
                let latitude = captures.get(1).and_then(|m| m.as_str().parse::<f64>().ok());
                let longitude = captures.get(2).and_then(|m| m.as_str().parse::<f64>().ok());
                match (latitude, longitude) {
                    (Some(lat), Some(lng)) => (lat.to_string(), lng.to_string()),
                    _ => ("0.0".to_string(), "0.0".to_string()),
                }
            }
            None => {
                debug!("no coordinate token on page, defaulting");
                ("0.0".to_string(), "0.0".to_string())
            }
        }
    }

    fn parse_entity_page(&self, body: &str) -> RawEntity {
        let document = Html::parse_document(body);
        let structured = json_ld(&document);

        let name_fallback = Selector::parse("h1#HEADING").unwrap();
        let address_fallback = Selector::parse("span.detail_address").unwrap();
        let properties_selector = Selector::parse("div.attraction_details div.detail").unwrap();
        let description_selector = Selector::parse("div.attraction_description p").unwrap();

        let name = structured
            .as_ref()
            .and_then(|d| d.get("name"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .or_else(|| select_first_text(&document, &name_fallback))
            .unwrap_or_else(|| {
                debug!("attraction name missing from both sources, defaulting");
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
                debug!("attraction address missing from both sources, defaulting");
                String::new()
            });

        // Advisor ratings are already on the output 0-5 scale
        let rating = structured
            .as_ref()
            .and_then(|d| d.get("aggregateRating"))
            .and_then(|r| r.get("ratingValue"))
            .and_then(|v| v.as_f64())
            .map(|v| v.to_string())
            .unwrap_or_else(|| {
                debug!("attraction rating missing from structured data, defaulting");
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

    fn parse_review_page(&self, body: &str, review_url: &str) -> (Vec<RawReview>, Option<String>) {
        let document = Html::parse_document(body);
        let item_selector = Selector::parse("div.review-container").unwrap();
        let title_selector = Selector::parse("span.noQuotes").unwrap();
        let body_selector = Selector::parse("p.partial_entry").unwrap();
        let bubble_selector = Selector::parse("span.ui_bubble_rating").unwrap();
        let date_selector = Selector::parse("span.ratingDate").unwrap();
        let next_selector = Selector::parse("a.nav.next").unwrap();

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
                .select(&bubble_selector)
                .next()
                .and_then(|el| el.value().attr("class"))
                .map(bubble_rating)
                .unwrap_or_else(|| "0".to_string());
            let date = item
                .select(&date_selector)
                .next()
                .map(|el| {
                    el.value()
                        .attr("title")
                        .map(str::to_string)
                        .unwrap_or_else(|| split_date_prefix(&collect_text(&el)))
                })
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
impl EntityCrawler for AttractionsCrawler {
    fn crawler_name(&self) -> &'static str {
        ATTRACTIONS_CRAWLER
    }

    async fn crawl(&self, entity: &EntityRef) -> Result<RawEntity> {
        let body = self.fetcher.fetch(&entity.url).await?;
        let mut raw = self.parse_entity_page(&body);
        raw.url = entity.url.clone();

        let review_url = clean_url(&entity.url, ADVISOR_TRACKING_PARAMS);
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

        info!(id = %entity.id, reviews = raw.reviews.len(), "attraction record assembled");
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

    fn crawler() -> AttractionsCrawler {
        AttractionsCrawler::new(SequenceFetcher::new(vec![]))
    }

    #[test]
    fn parses_quoted_and_bare_coordinates() {
        let (lat, lng) = crawler().parse_coordinates(r#""latitude":"48.8584","longitude":"2.2945""#);
        assert_eq!(lat, "48.8584");
        assert_eq!(lng, "2.2945");

        let (lat, lng) = crawler().parse_coordinates(r#""latitude": 48.8584, "longitude": 2.2945"#);
        assert_eq!(lat, "48.8584");
        assert_eq!(lng, "2.2945");
    }

    #[test]
    fn missing_coordinates_default() {
        let (lat, lng) = crawler().parse_coordinates("nothing embedded");
        assert_eq!(lat, "0.0");
        assert_eq!(lng, "0.0");
    }

    #[test]
    fn entity_page_falls_back_to_markup() {
        let page = r#"<html><body>
            <h1 id="HEADING">Old Tower</h1>
            <span class="detail_address">Tower Square 1</span>
            <div class="attraction_details"><div class="detail">Guided tours</div></div>
            <div class="attraction_description"><p>Historic.</p></div>
            </body></html>"#;

        let raw = crawler().parse_entity_page(page);
        assert_eq!(raw.name, "Old Tower");
        assert_eq!(raw.address, "Tower Square 1");
        assert_eq!(raw.rating, "0.0");
        assert_eq!(raw.properties, vec!["Guided tours"]);
        assert_eq!(raw.description, "Historic.");
    }

    #[tokio::test]
    async fn crawl_assembles_record_with_reviews() {
        let detail = r#"<html><head><script type="application/ld+json">
            {"name": "Old Tower", "address": {"streetAddress": "Tower Square 1"},
             "aggregateRating": {"ratingValue": 4.5}}
            </script></head><body></body></html>"#;
        let reviews_page = r#"<div class="review-container">
            <span class="noQuotes">Worth it</span>
            <span class="ui_bubble_rating bubble_50"></span>
            </div>"#;

        let fetcher = SequenceFetcher::new(vec![detail, reviews_page]);
        let crawler = AttractionsCrawler::new(fetcher);
        let entity = EntityRef {
            id: "123_A_001".to_string(),
            url: "https://www.tripadvisor.com/Attraction_Review-g1-d3.html".to_string(),
        };

        let raw = crawler.crawl(&entity).await.unwrap();
        assert_eq!(raw.name, "Old Tower");
        assert_eq!(raw.rating, "4.5");
        assert_eq!(raw.reviews.len(), 1);
        assert_eq!(raw.reviews[0].rating, "5.0");
    }
}

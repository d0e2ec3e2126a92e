use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use scraper::{Html, Selector};

use super::{DetailError, DetailFields, DetailSource};
use crate::models::drug::{KEY_EFFICACY, KEY_IMAGE};
use crate::pipeline::lookup::Lookup;

/// Text fields scraped from the page: (output key, CSS selector).
const TEXT_SELECTORS: &[(&str, &str)] = &[(KEY_EFFICACY, "#_ee_doc")];

/// Product photo on the detail page.
const IMAGE_SELECTOR: &str = "#scroll_01 > div > div > img";

/// Compiled selectors for the detail page layout.
pub struct DetailSelectors {
    text: Vec<(&'static str, Selector)>,
    image: Selector,
}

impl DetailSelectors {
    pub fn compile() -> Result<Self, DetailError> {
        let text = TEXT_SELECTORS
            .iter()
            .map(|(key, css)| Ok((*key, parse_selector(css)?)))
            .collect::<Result<Vec<_>, DetailError>>()?;
        Ok(Self {
            text,
            image: parse_selector(IMAGE_SELECTOR)?,
        })
    }
}

fn parse_selector(css: &str) -> Result<Selector, DetailError> {
    Selector::parse(css).map_err(|e| DetailError::Selector {
        selector: css.to_string(),
        reason: format!("{e:?}"),
    })
}

/// Extract the known fields from a detail page.
///
/// The image is returned as Markdown (`![item_seq](src)`) ready for display.
pub fn parse_detail_html(html: &str, item_seq: &str, selectors: &DetailSelectors) -> DetailFields {
    let document = Html::parse_document(html);
    let mut fields = DetailFields::new();

    for (key, selector) in &selectors.text {
        if let Some(element) = document.select(selector).next() {
            let text: String = element.text().collect();
            fields.insert((*key).to_string(), text.trim().to_string());
        }
    }

    if let Some(src) = document
        .select(&selectors.image)
        .next()
        .and_then(|img| img.value().attr("src"))
    {
        fields.insert(KEY_IMAGE.to_string(), format!("![{item_seq}]({src})"));
    }

    fields
}

/// Scrapes the public drug detail page for one product.
pub struct NedrugScraper {
    detail_url: String,
    client: reqwest::blocking::Client,
    selectors: DetailSelectors,
}

impl NedrugScraper {
    /// `detail_url` is a prefix; the item sequence is appended verbatim.
    pub fn new(detail_url: &str, client: reqwest::blocking::Client) -> Result<Self, DetailError> {
        Ok(Self {
            detail_url: detail_url.to_string(),
            client,
            selectors: DetailSelectors::compile()?,
        })
    }

    fn fetch_html(&self, item_seq: &str) -> Result<String, DetailError> {
        let url = format!("{}{}", self.detail_url, item_seq);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| DetailError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DetailError::Status(status.as_u16()));
        }

        response
            .text()
            .map_err(|e| DetailError::Request(e.to_string()))
    }
}

impl DetailSource for NedrugScraper {
    fn fetch_detail(&self, item_seq: &str) -> Lookup<DetailFields> {
        match self.fetch_html(item_seq) {
            Ok(html) => {
                let fields = parse_detail_html(&html, item_seq, &self.selectors);
                if fields.is_empty() {
                    tracing::debug!(item_seq, "Detail page matched no known fields");
                    Lookup::Empty
                } else {
                    Lookup::Found(fields)
                }
            }
            Err(e) => {
                tracing::warn!(item_seq, error = %e, "Detail page fetch failed");
                Lookup::Unavailable(e.to_string())
            }
        }
    }
}

/// Canned detail pages for testing.
#[derive(Default)]
pub struct MockDetailSource {
    pages: HashMap<String, DetailFields>,
    calls: AtomicUsize,
}

impl MockDetailSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, item_seq: &str, fields: &[(&str, &str)]) -> Self {
        self.pages.insert(
            item_seq.to_string(),
            fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DetailSource for MockDetailSource {
    fn fetch_detail(&self, item_seq: &str) -> Lookup<DetailFields> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.pages.get(item_seq) {
            Some(fields) => Lookup::Found(fields.clone()),
            None => Lookup::Unavailable("no such page".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::http::{build_http_client, spawn_stub_server};
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::response::{Html as HtmlBody, IntoResponse};
    use axum::routing::get;
    use axum::Router;

    const PAGE: &str = r#"<html><body>
        <section id="scroll_01"><div><div><img src="https://img.example.com/201405281.jpg"></div></div></section>
        <div id="_ee_doc">
            <p>1. 피부진균증</p>
            <p>2. 손발톱진균증</p>
        </div>
    </body></html>"#;

    const MAINTENANCE: &str = "<html><body><p>점검중</p></body></html>";

    fn selectors() -> DetailSelectors {
        DetailSelectors::compile().unwrap()
    }

    #[test]
    fn extracts_efficacy_and_image() {
        let fields = parse_detail_html(PAGE, "201405281", &selectors());
        let efficacy = fields.get(KEY_EFFICACY).unwrap();
        assert!(efficacy.starts_with("1. 피부진균증"));
        assert!(efficacy.contains("2. 손발톱진균증"));
        assert_eq!(
            fields.get(KEY_IMAGE).unwrap(),
            "![201405281](https://img.example.com/201405281.jpg)"
        );
    }

    #[test]
    fn unmatched_selectors_are_omitted() {
        let fields = parse_detail_html(MAINTENANCE, "1", &selectors());
        assert!(fields.is_empty());
    }

    #[test]
    fn image_without_src_is_omitted() {
        let html = r#"<div id="scroll_01"><div><div><img alt="none"></div></div></div>"#;
        let fields = parse_detail_html(html, "1", &selectors());
        assert!(fields.get(KEY_IMAGE).is_none());
    }

    #[test]
    fn image_must_be_nested_two_divs_deep() {
        let html = r#"<div id="scroll_01"><img src="x.jpg"></div>"#;
        assert!(parse_detail_html(html, "1", &selectors()).is_empty());
    }

    #[test]
    fn scraper_fetches_by_item_seq() {
        let app = Router::new().route(
            "/detail",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                match q.get("cacheSeq").map(String::as_str) {
                    Some("201405281") => HtmlBody(PAGE).into_response(),
                    Some("196000011") => HtmlBody(MAINTENANCE).into_response(),
                    _ => StatusCode::NOT_FOUND.into_response(),
                }
            }),
        );
        let base = spawn_stub_server(app);
        let scraper = NedrugScraper::new(
            &format!("{base}/detail?cacheSeq="),
            build_http_client(5).unwrap(),
        )
        .unwrap();

        let fields = scraper.fetch_detail("201405281").found().unwrap();
        assert!(fields.contains_key(KEY_EFFICACY));

        assert_eq!(scraper.fetch_detail("196000011"), Lookup::Empty);
        assert!(scraper.fetch_detail("999").is_unavailable());
    }

    #[test]
    fn mock_detail_counts_calls() {
        let mock = MockDetailSource::new().with_page("1", &[(KEY_EFFICACY, "두통")]);
        assert!(mock.fetch_detail("1").is_found());
        assert!(mock.fetch_detail("2").is_unavailable());
        assert_eq!(mock.calls(), 2);
    }
}

// src/extractors/listing.rs

// --- Imports ---
use crate::browser::PageSession;
use crate::config::{ListingSelectors, SiteConfig};
use crate::models::{RawRecord, RawTable, UNKNOWN};
use crate::utils::error::ExtractError;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

// --- Main Extractor Structure ---
/// Turns a search-results page into one [`RawRecord`] per listing element.
pub struct ListingExtractor {
    listing: Selector,
    name: Selector,
    price: Selector,
    rating: Selector,
    reviews: Selector,
}

fn compile(selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|_| ExtractError::InvalidSelector(selector.to_string()))
}

impl ListingExtractor {
    pub fn new(selectors: &ListingSelectors) -> Result<Self, ExtractError> {
        Ok(Self {
            listing: compile(&selectors.listing)?,
            name: compile(&selectors.name)?,
            price: compile(&selectors.price)?,
            rating: compile(&selectors.rating)?,
            reviews: compile(&selectors.reviews)?,
        })
    }

    /// Extracts every listing in document order. Never fails: each field that
    /// cannot be read becomes "Unknown" independently of the others.
    pub fn extract_listings(&self, html_content: &str) -> RawTable {
        let document = Html::parse_document(html_content);

        let records: RawTable = document
            .select(&self.listing)
            .map(|listing| {
                RawRecord::new(
                    read_field(listing, &self.name),
                    read_field(listing, &self.price),
                    read_field(listing, &self.rating),
                    read_field(listing, &self.reviews),
                )
            })
            .collect();

        let unnamed = records.iter().filter(|r| r.name == UNKNOWN).count();
        tracing::info!(
            "Extracted {} listing elements ({} without a readable name)",
            records.len(),
            unnamed
        );
        records
    }
}

/// Text of the first element under `listing` matching `selector`, with
/// whitespace collapsed; "Unknown" when nothing matches or the text is blank.
fn read_field(listing: ElementRef, selector: &Selector) -> String {
    listing
        .select(selector)
        .next()
        .map(|el| el.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" "))
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Runs one search on `session` and extracts the result listings.
///
/// The session is consumed and closed whether or not the run succeeds. A
/// failed navigation or search submission aborts the run with no partial table.
pub async fn scrape_search_results<S: PageSession>(
    mut session: S,
    site: &SiteConfig,
    extractor: &ListingExtractor,
    query: &str,
) -> Result<RawTable, ExtractError> {
    let outcome = search_and_extract(&mut session, site, extractor, query).await;
    session.close();
    outcome
}

async fn search_and_extract<S: PageSession>(
    session: &mut S,
    site: &SiteConfig,
    extractor: &ListingExtractor,
    query: &str,
) -> Result<RawTable, ExtractError> {
    tracing::info!("Starting scraper for query '{}' on {}", query, site.base_url);

    session.navigate(&site.base_url).await?;
    settle(site.navigate_settle).await;

    session.submit_search(&site.search_input_id, query).await?;
    settle(site.search_settle).await;

    let html = session.current_html()?;
    Ok(extractor.extract_listings(html))
}

async fn settle(pause: Duration) {
    if !pause.is_zero() {
        tokio::time::sleep(pause).await;
    }
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::SessionError;
    use std::cell::Cell;
    use std::rc::Rc;

    const RESULTS: &str = r#"
        <html><body>
        <div class="s-main-slot">
            <div class="s-result-item">
                <h2><a href="/p/1"><span>Acme   Laptop
                    14"</span></a></h2>
                <span class="a-price-whole">54,990</span>
                <span class="a-icon-alt">4.3 out of 5 stars</span>
                <span class="a-size-base">1,204</span>
            </div>
            <div class="s-result-item">
                <h2><a href="/p/2"><span>Bare Listing</span></a></h2>
                <span class="a-price-whole">   </span>
            </div>
            <div class="s-result-item"></div>
        </div>
        <div class="s-result-item"><h2><a><span>Outside main slot</span></a></h2></div>
        </body></html>
    "#;

    fn extractor() -> ListingExtractor {
        ListingExtractor::new(&ListingSelectors::default()).unwrap()
    }

    #[test]
    fn test_extracts_fields_in_document_order() {
        let rows = extractor().extract_listings(RESULTS);

        assert_eq!(rows.len(), 3, "Only listings inside the main slot count");
        assert_eq!(rows[0], RawRecord::new("Acme Laptop 14\"", "54,990", "4.3 out of 5 stars", "1,204"));
        assert_eq!(rows[1], RawRecord::new("Bare Listing", UNKNOWN, UNKNOWN, UNKNOWN));
        assert_eq!(rows[2], RawRecord::new(UNKNOWN, UNKNOWN, UNKNOWN, UNKNOWN));
    }

    #[test]
    fn test_every_field_is_populated() {
        for row in extractor().extract_listings(RESULTS) {
            assert!(row.fields().iter().all(|f| !f.is_empty()), "Empty field in {:?}", row);
        }
    }

    #[test]
    fn test_page_without_listings() {
        assert!(extractor().extract_listings("<html><body><p>No results</p></body></html>").is_empty());
    }

    #[test]
    fn test_invalid_selector_rejected() {
        let selectors = ListingSelectors { price: "span[".to_string(), ..ListingSelectors::default() };
        assert!(matches!(
            ListingExtractor::new(&selectors),
            Err(ExtractError::InvalidSelector(s)) if s == "span["
        ));
    }

    /// Serves fixed markup and records what the extractor asked for.
    struct FixtureSession {
        results: &'static str,
        fail_navigation: bool,
        searched: Option<(String, String)>,
        loaded: bool,
        closed: Rc<Cell<bool>>,
    }

    impl FixtureSession {
        fn new(results: &'static str, closed: Rc<Cell<bool>>) -> Self {
            Self { results, fail_navigation: false, searched: None, loaded: false, closed }
        }
    }

    impl PageSession for FixtureSession {
        async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
            if self.fail_navigation {
                return Err(SessionError::InvalidUrl(url.to_string()));
            }
            self.loaded = true;
            Ok(())
        }

        async fn submit_search(&mut self, input_id: &str, text: &str) -> Result<(), SessionError> {
            if !self.loaded {
                return Err(SessionError::NoPage);
            }
            self.searched = Some((input_id.to_string(), text.to_string()));
            Ok(())
        }

        fn current_html(&self) -> Result<&str, SessionError> {
            match self.searched {
                Some(_) => Ok(self.results),
                None => Err(SessionError::NoPage),
            }
        }

        fn close(&mut self) {
            self.closed.set(true);
        }
    }

    #[test]
    fn test_scrape_runs_search_and_closes_session() {
        let closed = Rc::new(Cell::new(false));
        let session = FixtureSession::new(RESULTS, closed.clone());
        let site = SiteConfig::default().without_delays();

        let rows = tokio_test::block_on(scrape_search_results(session, &site, &extractor(), "laptops")).unwrap();

        assert_eq!(rows.len(), 3);
        assert!(closed.get(), "Session must be closed after a successful run");
    }

    #[test]
    fn test_navigation_failure_aborts_and_closes_session() {
        let closed = Rc::new(Cell::new(false));
        let mut session = FixtureSession::new(RESULTS, closed.clone());
        session.fail_navigation = true;
        let site = SiteConfig::default().without_delays();

        let result = tokio_test::block_on(scrape_search_results(session, &site, &extractor(), "laptops"));

        assert!(matches!(result, Err(ExtractError::Session(SessionError::InvalidUrl(_)))));
        assert!(closed.get(), "Session must be closed after a failed run");
    }
}

// src/browser/http.rs
use crate::browser::session::PageSession;
use crate::config::SiteConfig;
use crate::utils::error::SessionError;
use once_cell::sync::Lazy;
use reqwest::{header, Url};
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

struct LoadedPage {
    url: Url,
    html: String,
}

/// Page session backed by plain HTTP requests. Form submission is emulated
/// by building the GET request the browser would send.
pub struct HttpSession {
    client: Option<reqwest::Client>,
    current: Option<LoadedPage>,
    request_delay: Duration,
}

impl HttpSession {
    /// Opens a session configured with the site's User-Agent and request pacing.
    pub fn open(config: &SiteConfig) -> Result<Self, SessionError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(30))
            .build()?;

        tracing::debug!("Opened HTTP page session (User-Agent: {})", config.user_agent);
        Ok(Self {
            client: Some(client),
            current: None,
            request_delay: config.request_delay,
        })
    }

    async fn fetch(&mut self, url: Url) -> Result<(), SessionError> {
        let client = self.client.as_ref().ok_or(SessionError::Closed)?;

        // --- Basic Rate Limiting ---
        tokio::time::sleep(self.request_delay).await;

        tracing::info!("Fetching page: {}", url);
        let response = client
            .get(url.clone())
            .header(header::ACCEPT, "text/html,application/xhtml+xml,*/*")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("HTTP error status: {} for URL: {}", status, url);
            if status == reqwest::StatusCode::SERVICE_UNAVAILABLE {
                tracing::warn!("Received 503 - the site is probably throttling automated clients.");
            }
            return Err(SessionError::Http { status, url: url.to_string() });
        }

        // Relative form actions resolve against where redirects landed us.
        let final_url = response.url().clone();
        let html = response.text().await?;
        tracing::debug!("Loaded {} bytes from {}", html.len(), final_url);

        self.current = Some(LoadedPage { url: final_url, html });
        Ok(())
    }
}

impl PageSession for HttpSession {
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        let url = Url::parse(url).map_err(|e| SessionError::InvalidUrl(format!("{url}: {e}")))?;
        self.fetch(url).await
    }

    async fn submit_search(&mut self, input_id: &str, text: &str) -> Result<(), SessionError> {
        if self.client.is_none() {
            return Err(SessionError::Closed);
        }
        let page = self.current.as_ref().ok_or(SessionError::NoPage)?;
        let target = search_form_target(&page.url, &page.html, input_id, text)?;
        self.fetch(target).await
    }

    fn current_html(&self) -> Result<&str, SessionError> {
        if self.client.is_none() {
            return Err(SessionError::Closed);
        }
        self.current
            .as_ref()
            .map(|page| page.html.as_str())
            .ok_or(SessionError::NoPage)
    }

    fn close(&mut self) {
        if self.client.take().is_some() {
            tracing::debug!("Page session closed");
        }
        self.current = None;
    }
}

impl Drop for HttpSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Builds the GET URL produced by submitting `text` in the form that owns
/// `input#input_id`: the form action plus its other named fields.
pub fn search_form_target(
    page_url: &Url,
    html: &str,
    input_id: &str,
    text: &str,
) -> Result<Url, SessionError> {
    let document = Html::parse_document(html);

    let input_selector = Selector::parse(&format!("input[id=\"{}\"]", input_id))
        .map_err(|_| SessionError::ElementNotFound(format!("input#{input_id}")))?;
    let input = document
        .select(&input_selector)
        .next()
        .ok_or_else(|| SessionError::ElementNotFound(format!("input#{input_id}")))?;
    let input_name = input
        .value()
        .attr("name")
        .ok_or_else(|| SessionError::ElementNotFound(format!("name attribute on input#{input_id}")))?;

    let form = input
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "form")
        .ok_or_else(|| SessionError::ElementNotFound(format!("form enclosing input#{input_id}")))?;

    if form
        .value()
        .attr("method")
        .is_some_and(|m| m.eq_ignore_ascii_case("post"))
    {
        tracing::warn!("Search form declares POST; submitting as GET");
    }

    let action = form.value().attr("action").unwrap_or("");
    let mut target = page_url
        .join(action)
        .map_err(|e| SessionError::InvalidUrl(format!("{action}: {e}")))?;

    let mut pairs = form_fields(form, input);
    pairs.push((input_name.to_string(), text.to_string()));

    target.set_fragment(None);
    target.query_pairs_mut().clear().extend_pairs(pairs);
    Ok(target)
}

static FIELD_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("input[name], select[name]").expect("Failed to compile FIELD_SELECTOR")
});

static OPTION_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("option").expect("Failed to compile OPTION_SELECTOR")
});

/// Named fields a browser would submit alongside the search text.
fn form_fields(form: ElementRef, search_input: ElementRef) -> Vec<(String, String)> {
    let mut pairs = Vec::new();

    for field in form.select(&FIELD_SELECTOR) {
        if field.id() == search_input.id() {
            continue;
        }
        let el = field.value();
        let Some(name) = el.attr("name") else { continue };

        let value = if el.name() == "select" {
            let mut options = field.select(&OPTION_SELECTOR);
            let selected = field
                .select(&OPTION_SELECTOR)
                .find(|opt| opt.value().attr("selected").is_some())
                .or_else(|| options.next());
            match selected {
                Some(opt) => opt
                    .value()
                    .attr("value")
                    .map(str::to_string)
                    .unwrap_or_else(|| opt.text().collect::<String>().trim().to_string()),
                None => continue,
            }
        } else {
            let kind = el.attr("type").unwrap_or("text").to_ascii_lowercase();
            match kind.as_str() {
                "submit" | "button" | "image" | "reset" | "file" => continue,
                "checkbox" | "radio" if el.attr("checked").is_none() => continue,
                "checkbox" | "radio" => el.attr("value").unwrap_or("on").to_string(),
                _ => el.attr("value").unwrap_or("").to_string(),
            }
        };

        pairs.push((name.to_string(), value));
    }

    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    const LANDING: &str = r#"
        <html><body>
        <form id="nav-search-bar-form" action="/s/ref=nav_bb_sb" method="GET">
            <select name="url" id="searchDropdownBox">
                <option value="search-alias=stripbooks">Books</option>
                <option selected="selected" value="search-alias=aps">All Categories</option>
            </select>
            <input type="hidden" name="__mk_en_IN" value="ÅMÅŽÕÑ">
            <input type="text" id="twotabsearchtextbox" name="field-keywords" value="">
            <input type="checkbox" name="prime" value="1">
            <input type="submit" name="go" value="Go">
        </form>
        </body></html>
    "#;

    fn base() -> Url {
        Url::parse("https://www.amazon.in/").unwrap()
    }

    #[test]
    fn test_search_target_includes_form_fields() {
        let target = search_form_target(&base(), LANDING, "twotabsearchtextbox", "gaming laptops").unwrap();

        assert_eq!(target.path(), "/s/ref=nav_bb_sb");
        let pairs: Vec<(String, String)> = target.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("url".to_string(), "search-alias=aps".to_string()),
                ("__mk_en_IN".to_string(), "ÅMÅŽÕÑ".to_string()),
                ("field-keywords".to_string(), "gaming laptops".to_string()),
            ]
        );
    }

    #[test]
    fn test_search_target_without_action_reuses_page_url() {
        let html = r#"<form><input id="q" name="q"></form>"#;
        let page = Url::parse("http://localhost:9000/search?old=1#top").unwrap();
        let target = search_form_target(&page, html, "q", "laptops").unwrap();
        assert_eq!(target.as_str(), "http://localhost:9000/search?q=laptops");
    }

    #[test]
    fn test_search_target_missing_input_or_form() {
        let no_input = search_form_target(&base(), "<form></form>", "twotabsearchtextbox", "x");
        assert!(matches!(no_input, Err(SessionError::ElementNotFound(_))));

        let no_form = search_form_target(&base(), r#"<input id="q" name="q">"#, "q", "x");
        assert!(matches!(no_form, Err(SessionError::ElementNotFound(msg)) if msg.contains("form")));

        let no_name = search_form_target(&base(), r#"<form><input id="q"></form>"#, "q", "x");
        assert!(matches!(no_name, Err(SessionError::ElementNotFound(msg)) if msg.contains("name")));
    }

    /// Serves `connections` requests on localhost, one per connection, and
    /// reports each request line. `/down` answers 503, `/` the search form,
    /// anything else a results page.
    fn spawn_site(connections: usize) -> (std::net::SocketAddr, std::sync::mpsc::Receiver<String>) {
        use std::io::{BufRead, BufReader, Write};

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = std::sync::mpsc::channel();

        std::thread::spawn(move || {
            for stream in listener.incoming().take(connections) {
                let mut stream = stream.unwrap();
                let mut reader = BufReader::new(stream.try_clone().unwrap());
                let mut request_line = String::new();
                reader.read_line(&mut request_line).unwrap();
                loop {
                    let mut header = String::new();
                    if reader.read_line(&mut header).unwrap() == 0 || header.trim().is_empty() {
                        break;
                    }
                }
                let request_line = request_line.trim().to_string();
                tx.send(request_line.clone()).unwrap();

                let (status, body) = if request_line.starts_with("GET /down ") {
                    ("503 Service Unavailable", "busy".to_string())
                } else if request_line.starts_with("GET / ") {
                    (
                        "200 OK",
                        r#"<form action="/s"><input type="hidden" name="k" value="v"><input id="q" name="field-keywords"></form>"#
                            .to_string(),
                    )
                } else {
                    ("200 OK", "<div class=\"results\">found</div>".to_string())
                };
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                stream.write_all(response.as_bytes()).unwrap();
            }
        });

        (addr, rx)
    }

    #[test]
    fn test_http_error_status_and_form_submission() {
        let (addr, requests) = spawn_site(3);
        let config = SiteConfig::default().without_delays();
        let mut session = HttpSession::open(&config).unwrap();

        tokio_test::block_on(async {
            let down = session.navigate(&format!("http://{addr}/down")).await;
            assert!(
                matches!(down, Err(SessionError::Http { status, .. }) if status == reqwest::StatusCode::SERVICE_UNAVAILABLE),
                "Expected 503 error, got {:?}",
                down
            );

            session.navigate(&format!("http://{addr}/")).await.unwrap();
            session.submit_search("q", "a b").await.unwrap();
        });

        assert!(session.current_html().unwrap().contains("<div class=\"results\">found</div>"));
        let lines: Vec<String> = (0..3).map(|_| requests.recv().unwrap()).collect();
        assert_eq!(
            lines,
            vec![
                "GET /down HTTP/1.1".to_string(),
                "GET / HTTP/1.1".to_string(),
                "GET /s?k=v&field-keywords=a+b HTTP/1.1".to_string(),
            ]
        );
    }

    #[test]
    fn test_session_state_errors() {
        let config = SiteConfig::default().without_delays();
        let mut session = HttpSession::open(&config).unwrap();

        assert!(matches!(session.current_html(), Err(SessionError::NoPage)));
        let submitted = tokio_test::block_on(session.submit_search("q", "x"));
        assert!(matches!(submitted, Err(SessionError::NoPage)));
        let bad_url = tokio_test::block_on(session.navigate("not a url"));
        assert!(matches!(bad_url, Err(SessionError::InvalidUrl(_))));

        session.close();
        assert!(matches!(session.current_html(), Err(SessionError::Closed)));
        let after_close = tokio_test::block_on(session.navigate("http://localhost/"));
        assert!(matches!(after_close, Err(SessionError::Closed)));
    }
}

//! Web search tool: Google Custom Search plus page scraping.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{Tool, ToolError};

/// How many result pages are fetched and scraped per query.
const MAX_RESULTS: usize = 3;

/// Per-page extract cap, to keep observations within the model's context.
const MAX_PAGE_CHARS: usize = 2000;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; ReactAgent/1.0)";

/// Search the web via Google Custom Search and return scraped page content.
#[derive(Debug)]
pub struct WebSearch {
    api_key: String,
    engine_id: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    link: Option<String>,
}

impl WebSearch {
    pub fn new(api_key: impl Into<String>, engine_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            engine_id: engine_id.into(),
        }
    }

    fn failed(&self, message: impl std::fmt::Display) -> ToolError {
        ToolError::Failed {
            tool: "WebSearch".to_string(),
            message: message.to_string(),
        }
    }

    /// Fetch one result page and extract its readable text.
    async fn scrape_page(&self, client: &reqwest::Client, link: &str) -> anyhow::Result<String> {
        let response = client
            .get(link)
            .timeout(Duration::from_secs(10))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Could not fetch page (Status: {})", status);
        }

        let html = response.text().await?;
        Ok(truncate(&extract_text(&html), MAX_PAGE_CHARS))
    }
}

#[async_trait]
impl Tool for WebSearch {
    fn name(&self) -> &str {
        "WebSearch"
    }

    fn description(&self) -> &str {
        "Searches the internet and scrapes full page content for current information, facts, news, or any topic. Returns detailed content from top search results. Use this when you need recent information or facts you don't know."
    }

    async fn invoke(&self, input: &str) -> Result<String, ToolError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| self.failed(e))?;

        let search_url = format!(
            "https://www.googleapis.com/customsearch/v1?key={}&cx={}&q={}",
            self.api_key,
            self.engine_id,
            urlencoding::encode(input)
        );

        let response = client
            .get(&search_url)
            .send()
            .await
            .map_err(|e| self.failed(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.failed(format!(
                "Could not reach search service (Status: {})",
                status
            )));
        }

        let data: SearchResponse = response.json().await.map_err(|e| self.failed(e))?;

        if data.items.is_empty() {
            return Ok("No search results found. Try rephrasing your query.".to_string());
        }

        let mut pages = Vec::new();
        for (i, item) in data.items.iter().take(MAX_RESULTS).enumerate() {
            let link = match item.link.as_deref() {
                Some(link) if url::Url::parse(link).is_ok() => link,
                _ => continue,
            };

            match self.scrape_page(&client, link).await {
                Ok(text) => pages.push(format!("Page {}:\nURL: {}\n{}", i + 1, link, text)),
                Err(e) => pages.push(format!(
                    "Page {}:\nURL: {}\nError scraping page: {}",
                    i + 1,
                    link,
                    e
                )),
            }
        }

        if pages.is_empty() {
            Ok("No pages could be scraped successfully.".to_string())
        } else {
            Ok(pages.join("\n\n"))
        }
    }
}

/// Extract readable text from HTML.
fn extract_text(html: &str) -> String {
    let mut text = html.to_string();

    // Remove scripts
    while let Some(start) = text.find("<script") {
        match text[start..].find("</script>") {
            Some(end) => text = format!("{}{}", &text[..start], &text[start + end + 9..]),
            None => break,
        }
    }

    // Remove styles
    while let Some(start) = text.find("<style") {
        match text[start..].find("</style>") {
            Some(end) => text = format!("{}{}", &text[..start], &text[start + end + 8..]),
            None => break,
        }
    }

    // Remove all tags
    let mut result = String::new();
    let mut in_tag = false;
    for c in text.chars() {
        if c == '<' {
            in_tag = true;
        } else if c == '>' {
            in_tag = false;
            result.push(' ');
        } else if !in_tag {
            result.push(c);
        }
    }

    // Collapse whitespace
    let result: String = result.split_whitespace().collect::<Vec<_>>().join(" ");

    html_decode(&result)
}

/// Basic HTML entity decoding.
fn html_decode(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
}

/// Truncate at a char boundary at or below `max` bytes.
fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut idx = max;
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    format!("{}...", &s[..idx])
}

//! Web search
//!
//! `SearchProvider` is the seam between the `web_search` tool and the
//! network. The shipped provider scrapes the DuckDuckGo HTML results page.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use url::form_urlencoded;

use crate::core::config::SearchConfig;
use crate::core::{AideError, Result, ToolCategory, ToolDefinition};
use crate::tools::registry::{parse_args, ToolHandler, ToolRegistry};

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const MAX_RESULTS: usize = 10;
/// How far past a result title to look for its snippet
const SNIPPET_WINDOW: usize = 2000;

/// One search result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Anything that can answer a web query
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>>;
}

/// DuckDuckGo HTML results client
pub struct DuckDuckGoClient {
    client: Client,
    endpoint: String,
}

impl DuckDuckGoClient {
    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AideError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        let body: String = form_urlencoded::Serializer::new(String::new())
            .append_pair("q", query)
            .append_pair("b", "")
            .finish();

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AideError::tool(format!("DuckDuckGo returned HTTP {}", status)));
        }

        let html = response.text().await?;
        let hits = parse_results(&html, max_results);
        log::debug!("Search '{}' returned {} results", query, hits.len());
        Ok(hits)
    }
}

/// Pull result blocks out of the HTML results page
///
/// Each block has `<a class="result__a" href=...>TITLE</a>` followed by
/// `<a class="result__snippet" ...>SNIPPET</a>`.
fn parse_results(html: &str, max_results: usize) -> Vec<SearchHit> {
    const TITLE_MARKER: &str = "class=\"result__a\"";
    const SNIPPET_MARKER: &str = "class=\"result__snippet\"";

    let mut hits = Vec::new();
    let mut pos = 0;

    while hits.len() < max_results {
        let Some(offset) = html[pos..].find(TITLE_MARKER) else {
            break;
        };
        let marker = pos + offset;
        pos = marker + TITLE_MARKER.len();

        let Some(tag_start) = html[..marker].rfind("<a ") else {
            continue;
        };
        let Some(tag_end) = html[marker..].find('>').map(|i| marker + i) else {
            break;
        };
        let Some(href) = extract_attr(&html[tag_start..tag_end], "href") else {
            continue;
        };
        let Some(title_end) = html[tag_end..].find("</a>").map(|i| tag_end + i) else {
            break;
        };
        let title = strip_tags(&html[tag_end + 1..title_end]);
        pos = title_end;

        let window_end = floor_char_boundary(html, (title_end + SNIPPET_WINDOW).min(html.len()));
        let window = &html[title_end..window_end];
        // Stop at the next result so a missing snippet doesn't borrow the neighbour's
        let window = match window.find(TITLE_MARKER) {
            Some(next) => &window[..next],
            None => window,
        };
        let snippet = window
            .find(SNIPPET_MARKER)
            .and_then(|i| {
                let rest = &window[i..];
                let open = rest.find('>')? + 1;
                let close = rest[open..].find("</")? + open;
                Some(strip_tags(&rest[open..close]))
            })
            .unwrap_or_default();

        let url = resolve_redirect(&href);
        if url.is_empty() || title.is_empty() {
            continue;
        }
        hits.push(SearchHit {
            title,
            url,
            snippet,
        });
    }

    hits
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Result links are wrapped as `//duckduckgo.com/l/?uddg=<encoded>&...`
fn resolve_redirect(href: &str) -> String {
    if let Some((_, query)) = href.split_once("/l/?") {
        return form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == "uddg")
            .map(|(_, value)| value.into_owned())
            .unwrap_or_default();
    }
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else {
        String::new()
    }
}

fn extract_attr(tag: &str, attr: &str) -> Option<String> {
    let pattern = format!("{}=\"", attr);
    let start = tag.find(&pattern)? + pattern.len();
    let end = tag[start..].find('"')? + start;
    Some(decode_entities(&tag[start..end]))
}

fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    decode_entities(out.trim())
}

fn decode_entities(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Render hits the way the model sees them
pub fn format_hits(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return "No search results found.".to_string();
    }
    let mut lines = Vec::with_capacity(hits.len() * 4);
    for (i, hit) in hits.iter().enumerate() {
        lines.push(format!("{}. {}", i + 1, hit.title));
        lines.push(format!("   URL: {}", hit.url));
        lines.push(format!("   {}", hit.snippet));
        lines.push(String::new());
    }
    lines.join("\n")
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WebSearchArgs {
    query: String,
    #[serde(default)]
    max_results: Option<i64>,
}

/// The `web_search` tool; transport failures are reported in the result text
pub struct WebSearchTool {
    provider: Arc<dyn SearchProvider>,
    default_results: usize,
}

impl WebSearchTool {
    pub fn new(provider: Arc<dyn SearchProvider>, default_results: usize) -> Self {
        Self {
            provider,
            default_results: default_results.clamp(1, MAX_RESULTS),
        }
    }

    pub fn definition() -> ToolDefinition {
        ToolDefinition::new(
            "web_search",
            "Search the web for current information, news, weather, facts, or any topic.",
            json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "The search query"},
                    "max_results": {"type": "integer", "description": "Number of results (1-10, default 5)"}
                },
                "required": ["query"]
            }),
        )
    }

    fn result_count(&self, requested: Option<i64>) -> usize {
        match requested {
            Some(n) => n.clamp(1, MAX_RESULTS as i64) as usize,
            None => self.default_results,
        }
    }
}

#[async_trait]
impl ToolHandler for WebSearchTool {
    async fn call(&self, arguments: Value) -> Result<String> {
        let args: WebSearchArgs = parse_args(arguments)?;
        let count = self.result_count(args.max_results);

        match self.provider.search(&args.query, count).await {
            Ok(mut hits) => {
                hits.truncate(count);
                Ok(format_hits(&hits))
            }
            Err(e) => {
                log::warn!("Search failed for '{}': {}", args.query, e);
                Ok(format!("Search failed: {}", e))
            }
        }
    }
}

/// Register `web_search` backed by `provider`
pub fn register(
    registry: &mut ToolRegistry,
    provider: Arc<dyn SearchProvider>,
    default_results: usize,
) -> Result<()> {
    registry.register(
        WebSearchTool::definition(),
        ToolCategory::Search,
        Arc::new(WebSearchTool::new(provider, default_results)),
    )
}

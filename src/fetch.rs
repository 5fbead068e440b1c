//! Content fetcher: reads rendered page bodies and direct child listings
//! from the wiki REST API and normalizes HTML to plain text.

use async_trait::async_trait;
use regex::Regex;
use std::env;
use tracing::{debug, error};

use crate::contract::{FetchError, FetchedPage, PageFetcher, PageNode};

/// Placeholder body for pages whose export view is empty, so downstream
/// rendering always has non-empty input.
pub const EMPTY_BODY_PLACEHOLDER: &str = "(no content)";

const CHILD_BATCH_LIMIT: usize = 100;

/// Production [`PageFetcher`] over the Confluence REST API, authenticated
/// with a personal access token sent as a bearer header.
pub struct ConfluenceFetcher {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl ConfluenceFetcher {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string(); // avoid "//"
        Self {
            client: reqwest::Client::new(),
            base_url,
            token: token.into(),
        }
    }

    /// Construct from `CONFLUENCE_BASE_URL` and `CONFLUENCE_API_TOKEN`.
    pub fn new_from_env() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        match (
            env::var("CONFLUENCE_BASE_URL"),
            env::var("CONFLUENCE_API_TOKEN"),
        ) {
            (Ok(base_url), Ok(token)) => {
                tracing::info!(
                    base_url = %base_url,
                    token_set = !token.is_empty(),
                    "Initialized ConfluenceFetcher from environment"
                );
                Ok(Self::new(base_url, token))
            }
            (Err(e), _) => {
                error!(error = ?e, "CONFLUENCE_BASE_URL missing in environment");
                Err(Box::new(e))
            }
            (_, Err(e)) => {
                error!(error = ?e, "CONFLUENCE_API_TOKEN missing in environment");
                Err(Box::new(e))
            }
        }
    }
}

fn transport_error(e: &reqwest::Error) -> FetchError {
    FetchError {
        status_code: e.status().map_or(0, |s| s.as_u16()),
        message: e.to_string(),
    }
}

#[async_trait]
impl PageFetcher for ConfluenceFetcher {
    async fn fetch_page(&self, page_id: &str) -> Result<FetchedPage, FetchError> {
        let url = format!(
            "{}/rest/api/content/{}?expand=body.export_view,title",
            self.base_url, page_id
        );
        debug!(url = %url, "Fetching page content");

        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| String::from("<failed to decode response body>"));
            error!(status = %status, url = %url, "Source API returned error fetching page content");
            return Err(FetchError {
                status_code: status.as_u16(),
                message: body,
            });
        }
        let data: serde_json::Value = resp.json().await.map_err(|e| transport_error(&e))?;

        let title = data
            .get("title")
            .and_then(|v| v.as_str())
            .unwrap_or("Untitled")
            .to_string();
        let raw_html = data
            .get("body")
            .and_then(|b| b.get("export_view"))
            .and_then(|s| s.get("value"))
            .and_then(|v| v.as_str())
            .unwrap_or("");

        let text = html_to_text(raw_html);
        let body_text = if text.trim().is_empty() {
            EMPTY_BODY_PLACEHOLDER.to_string()
        } else {
            text
        };
        debug!(page_id, title = %title, bytes = body_text.len(), "Fetched page content");
        Ok(FetchedPage { title, body_text })
    }

    async fn fetch_children(&self, page_id: &str) -> Result<Vec<PageNode>, FetchError> {
        let mut children = Vec::new();
        let mut start = 0usize;
        loop {
            let url = format!(
                "{}/rest/api/content/{}/child/page?limit={}&start={}",
                self.base_url, page_id, CHILD_BATCH_LIMIT, start
            );
            let resp = self
                .client
                .get(&url)
                .bearer_auth(&self.token)
                .send()
                .await
                .map_err(|e| transport_error(&e))?;
            let status = resp.status();
            if !status.is_success() {
                let body = resp
                    .text()
                    .await
                    .unwrap_or_else(|_| String::from("<failed to decode response body>"));
                error!(status = %status, url = %url, "Source API returned error listing children");
                return Err(FetchError {
                    status_code: status.as_u16(),
                    message: body,
                });
            }
            let json_val: serde_json::Value = resp.json().await.map_err(|e| transport_error(&e))?;
            let results = json_val
                .get("results")
                .and_then(|v| v.as_array())
                .cloned()
                .unwrap_or_default();
            let size = results.len();

            for entry in &results {
                // ids come back as strings, but tolerate numeric ids too
                let id = entry.get("id").and_then(|v| {
                    v.as_str()
                        .map(str::to_string)
                        .or_else(|| v.as_u64().map(|n| n.to_string()))
                });
                let title = entry.get("title").and_then(|v| v.as_str());
                match (id, title) {
                    (Some(id), Some(title)) => children.push(PageNode {
                        id,
                        title: title.to_string(),
                    }),
                    _ => debug!(entry = %entry, "Skipping child entry without id/title"),
                }
            }

            if size < CHILD_BATCH_LIMIT {
                break;
            }
            start += CHILD_BATCH_LIMIT;
        }
        debug!(page_id, count = children.len(), "Fetched direct children");
        Ok(children)
    }
}

/// Strip the exported HTML down to plain text, preserving line breaks as
/// line separators and removing zero-width characters the source editor
/// leaves behind (U+200B..U+200D, U+FEFF).
pub fn html_to_text(html: &str) -> String {
    let mut text = String::from(html);
    for tag in ["</p>", "<br>", "<br/>", "<br />", "</li>", "</tr>", "</div>"] {
        text = text.replace(tag, "\n");
    }
    for i in 1..=6 {
        text = text.replace(&format!("</h{i}>"), "\n");
    }
    text = Regex::new(r"<[^>]+>")
        .unwrap()
        .replace_all(&text, "")
        .to_string();
    // decode the entities the export view actually emits; && last
    text = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    text = Regex::new(r"[\x{200B}-\x{200D}\x{FEFF}]")
        .unwrap()
        .replace_all(&text, "")
        .to_string();
    let text = Regex::new(r"\n{3,}")
        .unwrap()
        .replace_all(&text, "\n\n")
        .to_string();
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraphs_become_line_separators() {
        assert_eq!(html_to_text("<p>one</p><p>two</p>"), "one\ntwo");
        assert_eq!(html_to_text("first<br/>second"), "first\nsecond");
    }

    #[test]
    fn headings_and_lists_keep_their_own_lines() {
        assert_eq!(html_to_text("<h1>Title</h1>Body"), "Title\nBody");
        assert_eq!(html_to_text("<ul><li>a</li><li>b</li></ul>"), "a\nb");
    }

    #[test]
    fn tags_and_attributes_are_stripped() {
        assert_eq!(
            html_to_text(r#"<span class="x">hello</span> <a href="y">world</a>"#),
            "hello world"
        );
    }

    #[test]
    fn zero_width_characters_are_removed() {
        assert_eq!(html_to_text("a\u{200B}b\u{200D}c\u{FEFF}d"), "abcd");
    }

    #[test]
    fn common_entities_are_decoded() {
        assert_eq!(html_to_text("Tom &amp; Jerry &lt;3&nbsp;!"), "Tom & Jerry <3 !");
    }

    #[test]
    fn blank_line_runs_collapse_to_one_separator() {
        assert_eq!(html_to_text("<p>one</p>\n\n\n<p>two</p>"), "one\n\ntwo");
    }
}

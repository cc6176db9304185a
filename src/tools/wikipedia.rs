//! Wikipedia lookup through the MediaWiki API.

use super::{truncate_chars, Tool, ToolKind};
use crate::error::{ForskError, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

const NO_RESULTS: &str = "No good Wikipedia Search Result was found";
const MAX_QUERY_CHARS: usize = 300;

/// The `wikipedia` tool.
///
/// Summarizes at most `top_k` pages and caps the digest at `max_chars`.
pub struct WikipediaTool {
    client: reqwest::Client,
    lang: String,
    top_k: usize,
    max_chars: usize,
}

impl WikipediaTool {
    pub fn new(client: reqwest::Client, lang: &str, top_k: usize, max_chars: usize) -> Self {
        Self {
            client,
            lang: lang.to_string(),
            top_k,
            max_chars,
        }
    }

    fn api_url(&self) -> String {
        format!("https://{}.wikipedia.org/w/api.php", self.lang)
    }

    async fn get_json(&self, params: &[(&str, &str)]) -> Result<Value> {
        let response = self.client.get(self.api_url()).query(params).send().await?;
        if !response.status().is_success() {
            return Err(ForskError::tool(
                ToolKind::Wikipedia.name(),
                format!("HTTP error {}", response.status()),
            ));
        }
        Ok(response.json().await?)
    }

    async fn search_titles(&self, query: &str) -> Result<Vec<String>> {
        let limit = self.top_k.to_string();
        let body = self
            .get_json(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", limit.as_str()),
                ("format", "json"),
                ("utf8", "1"),
            ])
            .await?;
        Ok(parse_search_titles(&body, self.top_k))
    }

    async fn page_summary(&self, title: &str) -> Result<Option<String>> {
        let body = self
            .get_json(&[
                ("action", "query"),
                ("prop", "extracts"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("titles", title),
                ("format", "json"),
                ("formatversion", "2"),
            ])
            .await?;
        Ok(parse_extract(&body))
    }
}

/// Titles from a `list=search` response.
pub fn parse_search_titles(body: &Value, limit: usize) -> Vec<String> {
    body.pointer("/query/search")
        .and_then(Value::as_array)
        .map(|hits| {
            hits.iter()
                .filter_map(|hit| hit.get("title").and_then(Value::as_str))
                .map(str::to_string)
                .take(limit)
                .collect()
        })
        .unwrap_or_default()
}

/// Plain-text extract from a `prop=extracts` response (formatversion 2).
pub fn parse_extract(body: &Value) -> Option<String> {
    body.pointer("/query/pages/0/extract")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// Render page summaries as the digest handed back to the model.
pub fn format_pages(pages: &[(String, String)], max_chars: usize) -> String {
    if pages.is_empty() {
        return NO_RESULTS.to_string();
    }
    let joined = pages
        .iter()
        .map(|(title, summary)| format!("Page: {}\nSummary: {}", title, summary))
        .collect::<Vec<_>>()
        .join("\n\n");
    truncate_chars(&joined, max_chars)
}

#[async_trait]
impl Tool for WikipediaTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Wikipedia
    }

    async fn invoke(&self, input: &str) -> Result<String> {
        let query = truncate_chars(input, MAX_QUERY_CHARS);
        let titles = self.search_titles(&query).await?;

        let summaries =
            futures::future::try_join_all(titles.iter().map(|title| self.page_summary(title)))
                .await?;

        let pages: Vec<(String, String)> = titles
            .into_iter()
            .zip(summaries)
            .filter_map(|(title, summary)| summary.map(|s| (title, s)))
            .collect();

        debug!("Wikipedia lookup for '{}' found {} pages", query, pages.len());
        Ok(format_pages(&pages, self.max_chars))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_search_titles() {
        let body = json!({
            "query": {"search": [
                {"title": "Rust (programming language)", "pageid": 1},
                {"title": "Rust", "pageid": 2},
                {"pageid": 3},
                {"title": "Rust Belt", "pageid": 4}
            ]}
        });
        assert_eq!(
            parse_search_titles(&body, 2),
            vec!["Rust (programming language)", "Rust"]
        );
        assert!(parse_search_titles(&json!({"batchcomplete": ""}), 3).is_empty());
    }

    #[test]
    fn test_parse_extract() {
        let body = json!({"query": {"pages": [{"title": "Rust", "extract": "  Rust is a language. "}]}});
        assert_eq!(parse_extract(&body), Some("Rust is a language.".to_string()));

        let missing = json!({"query": {"pages": [{"title": "Nope", "missing": true}]}});
        assert_eq!(parse_extract(&missing), None);
    }

    #[test]
    fn test_format_pages_caps_length() {
        let pages = vec![
            ("A".to_string(), "x".repeat(3000)),
            ("B".to_string(), "y".repeat(3000)),
        ];
        let digest = format_pages(&pages, 4000);
        assert_eq!(digest.chars().count(), 4000);
        assert!(digest.starts_with("Page: A\nSummary: xxx"));
        assert!(digest.contains("\n\nPage: B\nSummary: y"));

        assert_eq!(format_pages(&[], 4000), NO_RESULTS);
    }
}

//! Web search through DuckDuckGo's HTML endpoint.

use super::{collapse_whitespace, Tool, ToolKind};
use crate::error::{ForskError, Result};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

const SEARCH_URL: &str = "https://html.duckduckgo.com/html/";
const NO_RESULTS: &str = "No good DuckDuckGo Search Result was found";

/// One search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// The `search` tool.
pub struct SearchTool {
    client: reqwest::Client,
    max_results: usize,
    result_sel: Selector,
    title_sel: Selector,
    snippet_sel: Selector,
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| {
        ForskError::tool(
            ToolKind::Search.name(),
            format!("Invalid selector '{}': {}", css, e),
        )
    })
}

impl SearchTool {
    pub fn new(client: reqwest::Client, max_results: usize) -> Result<Self> {
        Ok(Self {
            client,
            max_results,
            result_sel: selector(".result__body")?,
            title_sel: selector("a.result__a")?,
            snippet_sel: selector(".result__snippet")?,
        })
    }

    /// Pull search hits out of a DuckDuckGo HTML results page.
    pub fn parse_results(&self, html: &str) -> Vec<SearchHit> {
        let document = Html::parse_document(html);

        document
            .select(&self.result_sel)
            .filter_map(|block| {
                let link = block.select(&self.title_sel).next()?;
                let url = resolve_redirect(link.value().attr("href").unwrap_or_default());
                let snippet = block
                    .select(&self.snippet_sel)
                    .next()
                    .map(|s| element_text(&s))
                    .unwrap_or_default();
                Some(SearchHit {
                    title: element_text(&link),
                    url,
                    snippet,
                })
            })
            .take(self.max_results)
            .collect()
    }
}

/// Decoded text content of an element, whitespace collapsed.
fn element_text(element: &ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

/// DuckDuckGo wraps result links in `//duckduckgo.com/l/?uddg=<target>`.
fn resolve_redirect(href: &str) -> String {
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else {
        href.to_string()
    };

    url::Url::parse(&absolute)
        .ok()
        .and_then(|u| {
            u.query_pairs()
                .find(|(key, _)| key == "uddg")
                .map(|(_, target)| target.into_owned())
        })
        .unwrap_or(absolute)
}

/// Render hits as the text digest handed back to the model.
pub fn format_hits(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return NO_RESULTS.to_string();
    }
    hits.iter()
        .map(|hit| format!("{}\n{}\n{}", hit.title, hit.snippet, hit.url))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[async_trait]
impl Tool for SearchTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Search
    }

    async fn invoke(&self, input: &str) -> Result<String> {
        let response = self
            .client
            .post(SEARCH_URL)
            .form(&[("q", input)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ForskError::tool(
                ToolKind::Search.name(),
                format!("HTTP error {}", response.status()),
            ));
        }

        let html = response.text().await?;
        let hits = self.parse_results(&html);
        debug!("Search for '{}' returned {} hits", input, hits.len());

        Ok(format_hits(&hits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
<div class="result results_links results_links_deep web-result">
  <div class="links_main links_deep result__body">
    <h2 class="result__title">
      <a rel="nofollow" class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.bea.gov%2Fdata%2Fgdp&amp;rut=abc">Gross Domestic Product | <b>U.S.</b> BEA</a>
    </h2>
    <a class="result__snippet" href="//duckduckgo.com/l/?uddg=x">Real <b>GDP</b> increased at an annual rate of 2.8&#x27;s percent &amp; more.</a>
  </div>
</div>
<div class="result results_links results_links_deep web-result">
  <div class="links_main links_deep result__body">
    <h2 class="result__title">
      <a rel="nofollow" class="result__a" href="https://example.org/direct">Direct link</a>
    </h2>
  </div>
</div>
"#;

    fn tool(max_results: usize) -> SearchTool {
        SearchTool::new(reqwest::Client::new(), max_results).unwrap()
    }

    #[test]
    fn test_parse_results() {
        let hits = tool(5).parse_results(PAGE);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "Gross Domestic Product | U.S. BEA");
        assert_eq!(hits[0].url, "https://www.bea.gov/data/gdp");
        assert_eq!(
            hits[0].snippet,
            "Real GDP increased at an annual rate of 2.8's percent & more."
        );
        assert_eq!(hits[1].url, "https://example.org/direct");
        assert_eq!(hits[1].snippet, "");
    }

    #[test]
    fn test_parse_results_decodes_entities() {
        let page = r#"
<div class="result__body">
  <a class="result__a" href="https://example.org/a?x=1&amp;y=2">Rust&#8217;s &hellip; guide &#x2F; intro</a>
  <div class="result__snippet">It&#8217;s fast &mdash; and <b>safe</b></div>
</div>"#;
        let hits = tool(5).parse_results(page);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Rust\u{2019}s \u{2026} guide / intro");
        assert_eq!(hits[0].snippet, "It\u{2019}s fast \u{2014} and safe");
        assert_eq!(hits[0].url, "https://example.org/a?x=1&y=2");
    }

    #[test]
    fn test_parse_results_respects_limit() {
        assert_eq!(tool(1).parse_results(PAGE).len(), 1);
    }

    #[test]
    fn test_format_hits() {
        assert_eq!(format_hits(&[]), NO_RESULTS);
        let hits = vec![SearchHit {
            title: "T".to_string(),
            url: "https://u".to_string(),
            snippet: "S".to_string(),
        }];
        assert_eq!(format_hits(&hits), "T\nS\nhttps://u");
    }
}

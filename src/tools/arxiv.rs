//! arXiv paper lookup through the Atom export API.

use super::{collapse_whitespace, decode_entities, truncate_chars, Tool, ToolKind};
use crate::error::{ForskError, Result};
use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

const API_URL: &str = "https://export.arxiv.org/api/query";
const NO_RESULTS: &str = "No good Arxiv Result was found";
const MAX_QUERY_CHARS: usize = 300;

/// Metadata for one paper.
#[derive(Debug, Clone, PartialEq)]
pub struct Paper {
    pub published: String,
    pub title: String,
    pub authors: Vec<String>,
    pub summary: String,
}

/// The `arxiv` tool.
pub struct ArxivTool {
    client: reqwest::Client,
    max_results: usize,
    max_chars: usize,
    entry_re: Regex,
    published_re: Regex,
    title_re: Regex,
    summary_re: Regex,
    author_re: Regex,
}

impl ArxivTool {
    pub fn new(client: reqwest::Client, max_results: usize, max_chars: usize) -> Result<Self> {
        Ok(Self {
            client,
            max_results,
            max_chars,
            entry_re: Regex::new(r"(?s)<entry>(.*?)</entry>")?,
            published_re: Regex::new(r"(?s)<published>\s*(.*?)\s*</published>")?,
            title_re: Regex::new(r"(?s)<title[^>]*>(.*?)</title>")?,
            summary_re: Regex::new(r"(?s)<summary[^>]*>(.*?)</summary>")?,
            author_re: Regex::new(r"(?s)<author>\s*<name>(.*?)</name>")?,
        })
    }

    /// Pull paper metadata out of an Atom feed.
    pub fn parse_feed(&self, feed: &str) -> Vec<Paper> {
        self.entry_re
            .captures_iter(feed)
            .filter_map(|entry| {
                let entry = entry.get(1)?.as_str();
                let text = |re: &Regex| {
                    re.captures(entry)
                        .map(|c| collapse_whitespace(&decode_entities(&c[1])))
                        .unwrap_or_default()
                };

                let title = text(&self.title_re);
                if title.is_empty() {
                    return None;
                }
                let published: String = text(&self.published_re).chars().take(10).collect();
                let authors = self
                    .author_re
                    .captures_iter(entry)
                    .map(|c| collapse_whitespace(&decode_entities(&c[1])))
                    .collect();

                Some(Paper {
                    published,
                    title,
                    authors,
                    summary: text(&self.summary_re),
                })
            })
            .take(self.max_results)
            .collect()
    }
}

/// Render papers as the digest handed back to the model.
pub fn format_papers(papers: &[Paper], max_chars: usize) -> String {
    if papers.is_empty() {
        return NO_RESULTS.to_string();
    }
    let joined = papers
        .iter()
        .map(|p| {
            format!(
                "Published: {}\nTitle: {}\nAuthors: {}\nSummary: {}",
                p.published,
                p.title,
                p.authors.join(", "),
                p.summary
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");
    truncate_chars(&joined, max_chars)
}

#[async_trait]
impl Tool for ArxivTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Arxiv
    }

    async fn invoke(&self, input: &str) -> Result<String> {
        let query = truncate_chars(input, MAX_QUERY_CHARS);
        let max_results = self.max_results.to_string();

        let response = self
            .client
            .get(API_URL)
            .query(&[
                ("search_query", query.as_str()),
                ("start", "0"),
                ("max_results", max_results.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ForskError::tool(
                ToolKind::Arxiv.name(),
                format!("HTTP error {}", response.status()),
            ));
        }

        let feed = response.text().await?;
        let papers = self.parse_feed(&feed);
        debug!("arXiv lookup for '{}' found {} papers", query, papers.len());

        Ok(format_papers(&papers, self.max_chars))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title type="html">ArXiv Query: search_query=all:transformers</title>
  <entry>
    <id>http://arxiv.org/abs/1706.03762v7</id>
    <published>2017-06-12T17:57:34Z</published>
    <title>Attention Is All
      You Need</title>
    <summary>  The dominant sequence transduction models are based on complex
recurrent &amp; convolutional networks.
    </summary>
    <author>
      <name>Ashish Vaswani</name>
    </author>
    <author>
      <name>Noam Shazeer</name>
    </author>
  </entry>
  <entry>
    <published>2018-10-11T00:50:01Z</published>
    <title>BERT</title>
    <summary>Pre-training.</summary>
    <author><name>Jacob Devlin</name></author>
  </entry>
</feed>"#;

    fn tool(max_results: usize) -> ArxivTool {
        ArxivTool::new(reqwest::Client::new(), max_results, 4000).unwrap()
    }

    #[test]
    fn test_parse_feed() {
        let papers = tool(3).parse_feed(FEED);
        assert_eq!(papers.len(), 2);
        assert_eq!(
            papers[0],
            Paper {
                published: "2017-06-12".to_string(),
                title: "Attention Is All You Need".to_string(),
                authors: vec!["Ashish Vaswani".to_string(), "Noam Shazeer".to_string()],
                summary: "The dominant sequence transduction models are based on complex recurrent & convolutional networks.".to_string(),
            }
        );
        assert_eq!(papers[1].authors, vec!["Jacob Devlin"]);
    }

    #[test]
    fn test_parse_feed_respects_limit() {
        assert_eq!(tool(1).parse_feed(FEED).len(), 1);
        assert!(tool(3).parse_feed("<feed></feed>").is_empty());
    }

    #[test]
    fn test_format_papers() {
        let papers = tool(3).parse_feed(FEED);
        let digest = format_papers(&papers[1..], 4000);
        assert_eq!(
            digest,
            "Published: 2018-10-11\nTitle: BERT\nAuthors: Jacob Devlin\nSummary: Pre-training."
        );
        assert_eq!(format_papers(&[], 4000), NO_RESULTS);
        assert_eq!(format_papers(&papers, 20).chars().count(), 20);
    }
}

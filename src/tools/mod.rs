//! Research tools the agent can call.
//!
//! Every tool takes a single text query and returns a single text result.
//! The set of tools is closed: see [`ToolKind`].

mod arxiv;
mod calculator;
pub mod math;
mod registry;
mod save;
mod search;
mod wikipedia;

pub use arxiv::ArxivTool;
pub use calculator::{CalculatorError, CalculatorTool, ExpressionModel, OpenAIExpressionModel};
pub use registry::ToolRegistry;
pub use save::SaveTool;
pub use search::SearchTool;
pub use wikipedia::WikipediaTool;

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// The fixed set of capabilities available to the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    Search,
    Wikipedia,
    Arxiv,
    Calculator,
    SaveTextToFile,
}

impl ToolKind {
    pub const ALL: [ToolKind; 5] = [
        ToolKind::Search,
        ToolKind::Wikipedia,
        ToolKind::Arxiv,
        ToolKind::Calculator,
        ToolKind::SaveTextToFile,
    ];

    /// Name the model uses to call the tool.
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::Search => "search",
            ToolKind::Wikipedia => "wikipedia",
            ToolKind::Arxiv => "arxiv",
            ToolKind::Calculator => "calculator",
            ToolKind::SaveTextToFile => "save_text_to_file",
        }
    }

    /// Description shown to the model.
    pub fn description(&self) -> &'static str {
        match self {
            ToolKind::Search => "Search the web for information",
            ToolKind::Wikipedia => "Search Wikipedia for information about a topic",
            ToolKind::Arxiv => {
                "Search arXiv for scientific papers. Input is a search query; \
                 returns publication date, title, authors and abstract"
            }
            ToolKind::Calculator => "Useful for when you need to answer questions about math",
            ToolKind::SaveTextToFile => "Saves structured research data to a text file",
        }
    }
}

impl std::str::FromStr for ToolKind {
    type Err = crate::error::ForskError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ToolKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| crate::error::ForskError::UnknownTool(s.to_string()))
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A capability with a text-in, text-out contract.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Which capability this is.
    fn kind(&self) -> ToolKind;

    /// Run the tool on a single text query.
    async fn invoke(&self, input: &str) -> Result<String>;
}

/// Build the HTTP client shared by network-backed tools.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .user_agent(concat!("forsk/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()?)
}

/// Truncate to at most `max_chars` characters.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Decode XML entities in Atom payloads: the five predefined ones plus
/// numeric character references.
pub(crate) fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail.find(';').and_then(|semi| {
            let entity = &tail[1..semi];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .map(|hex| u32::from_str_radix(hex, 16))
                    .or_else(|| entity.strip_prefix('#').map(|dec| dec.parse::<u32>()))
                    .and_then(|code| code.ok())
                    .and_then(char::from_u32),
            };
            ch.map(|c| (c, semi + 1))
        });

        match decoded {
            Some((c, len)) => {
                out.push(c);
                rest = &tail[len..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Collapse runs of whitespace into single spaces.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_kind_names_round_trip() {
        for kind in ToolKind::ALL {
            assert_eq!(kind.name().parse::<ToolKind>().unwrap(), kind);
        }
        assert!("python_repl".parse::<ToolKind>().is_err());
    }

    #[test]
    fn test_http_client_builds() {
        assert!(http_client(Duration::from_secs(30)).is_ok());
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("R&amp;D &lt;b&gt; &quot;x&quot;"), "R&D <b> \"x\"");
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
        assert_eq!(decode_entities("Schr&#246;dinger &#x2F; 1&#8211;2"), "Schr\u{f6}dinger / 1\u{2013}2");
        assert_eq!(decode_entities("AT&T & co &bogus;"), "AT&T & co &bogus;");
    }
}

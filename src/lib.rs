//! Forsk - Research assistant
//!
//! Runs a tool-using language model agent over a research topic and turns the
//! free-form transcript into a validated, structured research record.
//!
//! The name "Forsk" comes from the Norwegian/Danish word for "research."
//!
//! # Overview
//!
//! A research request flows through:
//! - the agent runner, which calls tools (web search, Wikipedia, arXiv,
//!   a calculator and a research log) until the model answers
//! - the extractor, which finds the first schema-valid JSON object in the
//!   answer and attaches the authoritative tool trace
//! - the assembler, which returns either the record or an error shape
//!   carrying the raw run
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `tools` - The closed set of research tools
//! - `agent` - The [`agent::AgentRunner`] seam and its OpenAI implementation
//! - `research` - Extraction, assembly and the request-level [`research::Researcher`]
//! - `cli` - Command line and HTTP front ends
//!
//! # Example
//!
//! ```rust,no_run
//! use forsk::config::Settings;
//! use forsk::research::{ResearchRequest, Researcher};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let researcher = Researcher::from_settings(&settings, None, None)?;
//!
//!     let request = ResearchRequest::new("Economic impact of AI")
//!         .with_questions(vec!["Which sectors are affected first?".to_string()]);
//!     let body = researcher.run_json(&request).await;
//!     println!("{}", serde_json::to_string_pretty(&body)?);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod error;
pub mod openai;
pub mod research;
pub mod tools;

pub use error::{ForskError, Result};

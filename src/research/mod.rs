//! Research pipeline: from an agent run to a validated, cited record.
//!
//! - `record` - the [`ResearchRecord`] schema and its typed validation
//! - `extract` - recovery of the record from a noisy model transcript
//! - `assemble` - trace building and the failure shape
//! - `service` - the request-level [`Researcher`]

mod assemble;
pub mod extract;
mod record;
mod service;

pub use assemble::{assemble, build_trace, display_string, ExtractionFailure, ExtractionOutcome};
pub use extract::ExtractError;
pub use record::{ResearchRecord, ResponseProfile, SchemaError, ToolInvocation};
pub use service::{ResearchRequest, Researcher};

//! Chain ingestion: node access, the new-block feed and trace decoding.

mod error;
mod feed;
mod provider;
mod trace;

pub use error::{ProviderError, METHOD_NOT_FOUND};
pub use feed::{BlockReport, ChainFeed, FeedOptions, FeedState, TraceOutcome, TransactionOutcome};
pub use provider::{HttpProvider, NodeProvider};
pub use trace::{structural_steps, StructuralTraceDecoder, TraceDecoder};

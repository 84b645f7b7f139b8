//! Backend sync: authenticated upload client, session state and contract
//! upload orchestration.

mod backend;
mod client;
mod dedup;
mod error;
pub mod records;
mod session;
mod types;
mod upload;

pub use backend::{Backend, BlockAck, ContractAst, ContractData, TransactionAck};
pub use client::SyncClient;
pub use dedup::AddressDedupTracker;
pub use error::SyncError;
pub use session::{SessionOptions, SyncSession};
pub use types::{TracingMode, User, Workspace};
pub use upload::{ast_requests, upload_contract, UploadReport};

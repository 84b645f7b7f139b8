//! Chain ingestion feed: new blocks, their transactions, receipts and traces.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use futures_util::stream::{self, StreamExt};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use super::error::ProviderError;
use super::provider::NodeProvider;
use super::trace::TraceDecoder;
use crate::display;
use crate::sync::records::{normalize_block, normalize_receipt};
use crate::sync::SyncSession;

/// Blocks fetched concurrently during a range sync.
const RANGE_CONCURRENCY: usize = 8;

/// Feed connection state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FeedState {
    #[default]
    Disconnected,
    Connecting,
    Subscribed,
    Fetching,
    Idle,
}

/// How the feed behaves for the lifetime of a session.
#[derive(Debug, Clone, Copy)]
pub struct FeedOptions {
    /// Forward block numbers only and let the backend fetch the data.
    pub server_side: bool,
    /// Reconnect after provider errors instead of returning them.
    pub reconnect: bool,
    /// Interval between new-block checks.
    pub poll_interval: Duration,
    /// Fixed delay before a reconnect attempt.
    pub reconnect_delay: Duration,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            server_side: false,
            reconnect: true,
            poll_interval: Duration::from_secs(1),
            reconnect_delay: Duration::from_secs(5),
        }
    }
}

/// Outcome of syncing one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionOutcome {
    Synced,
    ReceiptUnavailable,
    UploadFailed,
}

/// Outcome of collecting one transaction's trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceOutcome {
    Synced,
    /// The node does not implement `debug_traceTransaction`.
    NotAvailable,
    Failed,
}

/// Per-block totals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockReport {
    pub number: u64,
    pub block_synced: bool,
    pub transactions: Vec<TransactionOutcome>,
}

/// Receives new blocks from the node and forwards them to the backend.
pub struct ChainFeed {
    provider: Arc<dyn NodeProvider>,
    decoder: Arc<dyn TraceDecoder>,
    session: Arc<SyncSession>,
    options: FeedOptions,
    state: FeedState,
    last_block: Option<u64>,
}

impl ChainFeed {
    #[must_use]
    pub fn new(
        provider: Arc<dyn NodeProvider>,
        decoder: Arc<dyn TraceDecoder>,
        session: Arc<SyncSession>,
        options: FeedOptions,
    ) -> Self {
        Self {
            provider,
            decoder,
            session,
            options,
            state: FeedState::Disconnected,
            last_block: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> FeedState {
        self.state
    }

    /// Last block handed to the backend.
    #[must_use]
    pub fn last_block(&self) -> Option<u64> {
        self.last_block
    }

    fn transition(&mut self, state: FeedState) {
        if self.state != state {
            tracing::trace!(from = ?self.state, to = ?state, "Feed state transition");
            self.state = state;
        }
    }

    /// Follow the chain head until cancelled.
    ///
    /// The first block synced is the head at connection time. After a
    /// reconnect, blocks mined during the outage are caught up. A head
    /// below the last synced block (a restarted dev chain) restarts the
    /// feed from the new head.
    ///
    /// # Errors
    ///
    /// Returns the provider error when reconnecting is disabled.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<(), ProviderError> {
        loop {
            if cancel.is_cancelled() {
                return Ok(());
            }

            if self.state == FeedState::Disconnected {
                self.transition(FeedState::Connecting);
            }

            let delay = match self.poll_once().await {
                Ok(()) => self.options.poll_interval,
                Err(e) => {
                    display::print_connection_error(&self.session.workspace().rpc_server, &e.to_string());
                    self.transition(FeedState::Disconnected);
                    if !self.options.reconnect {
                        return Err(e);
                    }
                    tracing::info!(
                        delay_secs = self.options.reconnect_delay.as_secs(),
                        "Reconnecting to node"
                    );
                    self.options.reconnect_delay
                }
            };

            tokio::select! {
                () = cancel.cancelled() => return Ok(()),
                () = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Check the head once and sync every block not yet seen.
    async fn poll_once(&mut self) -> Result<(), ProviderError> {
        let head = self.provider.block_number().await?;
        if self.state == FeedState::Connecting {
            tracing::info!(head, "Subscribed to new blocks");
            self.transition(FeedState::Subscribed);
        }

        if let Some(last) = self.last_block.filter(|&last| head < last) {
            tracing::warn!(head, last_block = last, "Chain head moved backwards, restarting from head");
            self.last_block = None;
        }

        let first = self.last_block.map_or(head, |last| last + 1);
        for number in first..=head {
            self.transition(FeedState::Fetching);
            self.process_block(number).await?;
            self.last_block = Some(number);
        }
        self.transition(FeedState::Idle);
        Ok(())
    }

    /// Sync one block and all of its transactions.
    ///
    /// Upload failures are logged and reported, never returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the block itself cannot be fetched.
    pub async fn process_block(&self, number: u64) -> Result<BlockReport, ProviderError> {
        tracing::info!(block = number, "Syncing block");
        let backend = self.session.backend();

        if self.options.server_side {
            let synced = match backend.sync_block(&json!({ "number": number }), true).await {
                Ok(_) => true,
                Err(e) => {
                    tracing::error!(block = number, error = %e, "Server-side block sync failed");
                    false
                }
            };
            return Ok(BlockReport {
                number,
                block_synced: synced,
                transactions: Vec::new(),
            });
        }

        let Some(block) = self.provider.block_with_transactions(number).await? else {
            tracing::warn!(block = number, "Node returned no block");
            return Ok(BlockReport {
                number,
                ..BlockReport::default()
            });
        };
        let block = normalize_block(block);

        let block_synced = match backend.sync_block(&block, false).await {
            Ok(ack) => {
                display::print_block_synced(ack.block_number.unwrap_or(number));
                true
            }
            Err(e) => {
                tracing::error!(block = number, error = %e, "Block sync failed");
                false
            }
        };

        let transactions: Vec<&Value> = block
            .get("transactions")
            .and_then(Value::as_array)
            .map(|txs| txs.iter().filter(|tx| tx.is_object()).collect())
            .unwrap_or_default();

        let outcomes = join_all(
            transactions
                .into_iter()
                .map(|tx| self.process_transaction(&block, tx)),
        )
        .await;

        Ok(BlockReport {
            number,
            block_synced,
            transactions: outcomes,
        })
    }

    /// Fetch a transaction's receipt and push both to the backend.
    pub async fn process_transaction(&self, block: &Value, transaction: &Value) -> TransactionOutcome {
        let hash = transaction.get("hash").and_then(Value::as_str).unwrap_or_default();

        // The backend rejects transactions without a receipt.
        let Some(receipt) = self.fetch_receipt(hash).await else {
            tracing::warn!(tx_hash = %hash, "Couldn't get receipt information for transaction");
            return TransactionOutcome::ReceiptUnavailable;
        };
        let receipt = normalize_receipt(receipt);

        match self
            .session
            .backend()
            .sync_transaction(block, transaction, &receipt)
            .await
        {
            Ok(ack) => {
                display::print_transaction_synced(ack.tx_hash.as_deref().unwrap_or(hash));
            }
            Err(e) => {
                tracing::error!(tx_hash = %hash, error = %e, "Transaction sync failed");
                return TransactionOutcome::UploadFailed;
            }
        }

        if self.session.workspace().traces_enabled() {
            self.trace_transaction(transaction).await;
        }
        TransactionOutcome::Synced
    }

    /// Receipt through the structured call, falling back to a raw call.
    async fn fetch_receipt(&self, hash: &str) -> Option<Value> {
        match self.provider.transaction_receipt(hash).await {
            Ok(receipt) => receipt,
            Err(e) => {
                tracing::debug!(tx_hash = %hash, error = %e, "Structured receipt call failed, using raw call");
                match self
                    .provider
                    .request("eth_getTransactionReceipt", json!([hash]))
                    .await
                {
                    Ok(raw) if !raw.is_null() => Some(raw),
                    Ok(_) => None,
                    Err(e) => {
                        tracing::debug!(tx_hash = %hash, error = %e, "Raw receipt call failed");
                        None
                    }
                }
            }
        }
    }

    /// Request, decode and upload a transaction's opcode trace.
    pub async fn trace_transaction(&self, transaction: &Value) -> TraceOutcome {
        let hash = transaction.get("hash").and_then(Value::as_str).unwrap_or_default();
        let to = transaction.get("to").and_then(Value::as_str);

        let raw = match self
            .provider
            .request("debug_traceTransaction", json!([hash, {}]))
            .await
        {
            Ok(raw) => raw,
            Err(e) if e.is_method_not_found() => {
                display::print_trace_unavailable();
                return TraceOutcome::NotAvailable;
            }
            Err(e) => {
                tracing::warn!(tx_hash = %hash, error = %e, "Trace request failed");
                return TraceOutcome::Failed;
            }
        };

        let steps = self
            .decoder
            .decode(to, Some(&raw), self.provider.as_ref())
            .await;

        match self.session.backend().sync_trace(hash, &steps).await {
            Ok(()) => {
                display::print_trace_synced(hash);
                TraceOutcome::Synced
            }
            Err(e) => {
                tracing::error!(tx_hash = %hash, error = %e, "Trace sync failed");
                TraceOutcome::Failed
            }
        }
    }

    /// Sync every block in `from..=to` once.
    ///
    /// # Errors
    ///
    /// Returns the first provider error; this one-shot mode does not retry.
    pub async fn sync_range(&self, from: u64, to: u64) -> Result<Vec<BlockReport>, ProviderError> {
        let results: Vec<Result<BlockReport, ProviderError>> = stream::iter(from..=to)
            .map(|number| self.process_block(number))
            .buffer_unordered(RANGE_CONCURRENCY)
            .collect()
            .await;

        let mut reports = results.into_iter().collect::<Result<Vec<_>, _>>()?;
        reports.sort_by_key(|report| report.number);
        Ok(reports)
    }
}

impl std::fmt::Debug for ChainFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainFeed")
            .field("state", &self.state)
            .field("last_block", &self.last_block)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

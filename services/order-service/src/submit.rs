//! Submit orchestration
//!
//! One submission is one logical linear transaction:
//! validate → admission lock → matching lock → serializable persistence
//! (with audit appends) → book mutation → signed receipt.
//!
//! The matching pass runs against the locked book but mutates nothing;
//! its intended mutations are applied only after the transaction
//! commits, still under the matching lock. An aborted transaction
//! therefore leaves the book exactly as it was.

use audit_log::AuditSink;
use matching_engine::{match_order, BookRegistry};
use serde::{Deserialize, Serialize};
use signing::{Receipt, ReceiptSigner};
use std::sync::Arc;
use tracing::{error, info, instrument};
use types::clock::{Clock, IdGenerator};
use types::ids::{MarketId, UserAddress};
use types::market::Outcome;
use types::order::{Order, Side};

use crate::admission::AdmissionLocks;
use crate::errors::SubmitError;
use crate::positions::position_deltas;
use crate::store::{SubmitBatch, SubmitStore};
use crate::validator::{self, AddressFormat};

/// An order submission as it leaves the HTTP layer.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitRequest {
    pub market_id: MarketId,
    pub user_address: UserAddress,
    pub side: Side,
    pub outcome: Outcome,
    /// Raw price from the wire; bounds-checked during validation.
    pub price: f64,
    pub quantity: u64,
}

/// The signed response for an accepted submission.
#[derive(Debug, Clone, Serialize)]
pub struct SignedReceipt {
    #[serde(flatten)]
    pub receipt: Receipt,
    pub signature: String,
    pub public_key: String,
}

/// The submit-path orchestrator. Holds every collaborator by capability
/// so tests can substitute the stores, clock, and signer.
pub struct OrderSubmitService {
    store: Arc<dyn SubmitStore>,
    audit: Arc<dyn AuditSink>,
    signer: Arc<dyn ReceiptSigner>,
    books: Arc<BookRegistry>,
    admission: AdmissionLocks,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    address_format: AddressFormat,
}

impl OrderSubmitService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn SubmitStore>,
        audit: Arc<dyn AuditSink>,
        signer: Arc<dyn ReceiptSigner>,
        books: Arc<BookRegistry>,
        admission: AdmissionLocks,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        address_format: AddressFormat,
    ) -> Self {
        Self {
            store,
            audit,
            signer,
            books,
            admission,
            clock,
            ids,
            address_format,
        }
    }

    pub fn books(&self) -> &Arc<BookRegistry> {
        &self.books
    }

    pub fn audit(&self) -> &Arc<dyn AuditSink> {
        &self.audit
    }

    pub fn store(&self) -> &Arc<dyn SubmitStore> {
        &self.store
    }

    /// Submit one limit order and return its signed receipt.
    #[instrument(skip(self, request), fields(market = %request.market_id, user = %request.user_address))]
    pub async fn submit(&self, request: SubmitRequest) -> Result<SignedReceipt, SubmitError> {
        // The single wall-clock sample every trade of this submission shares
        let now = self.clock.now();

        let market = self
            .store
            .fetch_market(request.market_id)
            .await
            .map_err(SubmitError::from_store)?;
        let valid = validator::validate(&request, market.as_ref(), now, &self.address_format)?;

        let _admission = self
            .admission
            .try_acquire(request.user_address.clone(), request.market_id)
            .ok_or(SubmitError::RateLimited)?;

        let book_ref = self.book_for(request.market_id, request.outcome).await?;
        let mut book = book_ref.lock().await;

        let taker = Order::new(
            self.ids.order_id(),
            request.market_id,
            request.user_address.clone(),
            request.side,
            request.outcome,
            valid.price,
            valid.quantity,
            now,
        );
        let result = match_order(&book, &taker, self.ids.as_ref(), now);

        let mut final_taker = taker;
        let filled = valid.quantity - result.taker_remaining;
        if !filled.is_zero() {
            final_taker.add_fill(filled);
        }

        let batch = SubmitBatch {
            taker: final_taker.clone(),
            trades: result.trades.clone(),
            maker_updates: result.maker_updates.clone(),
            deltas: position_deltas(&result.trades),
            timestamp: now,
        };
        self.store
            .persist_submit(&batch, self.audit.as_ref())
            .await
            .map_err(SubmitError::from_store)?;

        // Committed: make the match visible in the book
        for update in &result.maker_updates {
            book.update_quantity(&update.order_id, update.new_remaining);
        }
        if !result.taker_remaining.is_zero() {
            book.add(&final_taker)?;
        }
        drop(book);

        info!(
            order_id = %final_taker.id,
            trades = result.trades.len(),
            status = final_taker.status.as_str(),
            "order submitted"
        );

        let receipt = Receipt::from_order(&final_taker, result.trades, now);
        let signature = self.signer.sign(&receipt).map_err(|source| {
            // The order is committed; only the receipt is unsigned
            error!(order_id = %final_taker.id, %source, "receipt signing failed after commit");
            SubmitError::Signing {
                order_id: final_taker.id,
                source,
            }
        })?;

        Ok(SignedReceipt {
            receipt,
            signature,
            public_key: self.signer.public_key(),
        })
    }

    /// Get the live book, hydrating it from open orders on first touch.
    async fn book_for(
        &self,
        market_id: MarketId,
        outcome: Outcome,
    ) -> Result<Arc<tokio::sync::Mutex<matching_engine::OrderBook>>, SubmitError> {
        if self.books.contains(market_id, outcome) {
            return Ok(self.books.get(market_id, outcome));
        }
        let open = self
            .store
            .open_orders(market_id, outcome)
            .await
            .map_err(SubmitError::from_store)?;
        Ok(self.books.rebuild_if_absent(market_id, outcome, &open)?)
    }

    /// Depth snapshot of one live book.
    pub async fn depth(
        &self,
        market_id: MarketId,
        outcome: Outcome,
        levels: usize,
    ) -> Result<matching_engine::Depth, SubmitError> {
        let book_ref = self.book_for(market_id, outcome).await?;
        let book = book_ref.lock().await;
        Ok(book.depth(levels))
    }
}

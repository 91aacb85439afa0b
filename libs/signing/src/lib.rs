//! Receipt signing — canonical serialization and detached signatures
//!
//! Canonicalizes an order receipt to deterministic JSON bytes (sorted
//! keys, integers as decimal strings, prices at fixed 8-digit scale,
//! ISO-8601 UTC timestamps), hashes them with SHA-256, and produces a
//! detached Ed25519 signature. Key material lifecycle is external; the
//! signer only ever sees the raw 32-byte secret.

use chrono::{DateTime, SecondsFormat, Utc};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use types::prelude::*;

/// Receipt schema version (frozen).
pub const RECEIPT_SCHEMA_VERSION: &str = "1.0.0";

// ---------------------------------------------------------------------------
// Receipt
// ---------------------------------------------------------------------------

/// The signable result of one order submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Receipt {
    pub order_id: OrderId,
    pub market_id: MarketId,
    pub side: Side,
    pub outcome: Outcome,
    pub price: Price,
    pub quantity: Quantity,
    pub filled_quantity: Quantity,
    pub status: OrderStatus,
    pub trades: Vec<Trade>,
    /// The single wall-clock sample taken for the submission.
    pub timestamp: DateTime<Utc>,
}

impl Receipt {
    /// Build a receipt from the final order state and its trades.
    pub fn from_order(order: &Order, trades: Vec<Trade>, timestamp: DateTime<Utc>) -> Self {
        Self {
            order_id: order.id,
            market_id: order.market_id,
            side: order.side,
            outcome: order.outcome,
            price: order.price,
            quantity: order.quantity,
            filled_quantity: order.filled_quantity,
            status: order.status,
            trades,
            timestamp,
        }
    }

    /// Serialize to canonical JSON bytes.
    ///
    /// `BTreeMap` keys give a deterministic field order; all numeric values
    /// are rendered as strings so the byte stream is identical across
    /// serializer implementations.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut root: BTreeMap<&str, serde_json::Value> = BTreeMap::new();
        root.insert("version", RECEIPT_SCHEMA_VERSION.into());
        root.insert("orderId", self.order_id.to_string().into());
        root.insert("marketId", self.market_id.to_string().into());
        root.insert("side", self.side.as_str().into());
        root.insert("outcome", self.outcome.as_str().into());
        root.insert("price", self.price.fixed_scale().into());
        root.insert("quantity", self.quantity.to_string().into());
        root.insert("filledQuantity", self.filled_quantity.to_string().into());
        root.insert("status", self.status.as_str().into());
        root.insert("timestamp", iso8601(self.timestamp).into());

        let trades: Vec<serde_json::Value> = self
            .trades
            .iter()
            .map(|trade| {
                let mut fields: BTreeMap<&str, serde_json::Value> = BTreeMap::new();
                fields.insert("tradeId", trade.id.to_string().into());
                fields.insert("price", trade.price.fixed_scale().into());
                fields.insert("quantity", trade.quantity.to_string().into());
                fields.insert("makerOrderId", trade.maker_order_id.to_string().into());
                fields.insert("takerOrderId", trade.taker_order_id.to_string().into());
                fields.insert("buyerAddress", trade.buyer_address().to_string().into());
                fields.insert("sellerAddress", trade.seller_address().to_string().into());
                fields.insert("timestamp", iso8601(trade.executed_at).into());
                serde_json::to_value(fields).expect("trade canonicalization must not fail")
            })
            .collect();
        root.insert("trades", trades.into());

        serde_json::to_vec(&root).expect("receipt canonicalization must not fail")
    }

    /// SHA-256 digest of the canonical bytes.
    pub fn hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.canonical_bytes());
        hasher.finalize().into()
    }
}

fn iso8601(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ---------------------------------------------------------------------------
// Signer
// ---------------------------------------------------------------------------

/// Capability to sign receipts. Concrete impls are chosen at startup.
pub trait ReceiptSigner: Send + Sync {
    /// Produce a detached hex-encoded signature over the receipt's
    /// canonical bytes.
    fn sign(&self, receipt: &Receipt) -> Result<String, SigningError>;

    /// Hex-encoded public key of the signer.
    fn public_key(&self) -> String;
}

/// Ed25519 signer backed by an in-memory secret key.
#[derive(Debug)]
pub struct Ed25519ReceiptSigner {
    signing_key: SigningKey,
}

impl Ed25519ReceiptSigner {
    /// Build from a hex-encoded 32-byte secret.
    pub fn from_hex(secret_hex: &str) -> Result<Self, SigningError> {
        let bytes = hex::decode(secret_hex).map_err(|_| SigningError::InvalidKey)?;
        let seed: [u8; 32] = bytes.try_into().map_err(|_| SigningError::InvalidKey)?;
        Ok(Self {
            signing_key: SigningKey::from_bytes(&seed),
        })
    }

    pub fn from_bytes(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }
}

impl ReceiptSigner for Ed25519ReceiptSigner {
    fn sign(&self, receipt: &Receipt) -> Result<String, SigningError> {
        let signature = self.signing_key.sign(&receipt.hash());
        Ok(hex::encode(signature.to_bytes()))
    }

    fn public_key(&self) -> String {
        hex::encode(self.signing_key.verifying_key().to_bytes())
    }
}

/// Verify a detached receipt signature.
pub fn verify_receipt(
    receipt: &Receipt,
    signature_hex: &str,
    public_key_hex: &str,
) -> Result<(), SigningError> {
    let pub_bytes = hex::decode(public_key_hex).map_err(|_| SigningError::InvalidKey)?;
    let sig_bytes = hex::decode(signature_hex).map_err(|_| SigningError::InvalidSignature)?;

    let pub_key: [u8; 32] = pub_bytes.try_into().map_err(|_| SigningError::InvalidKey)?;
    let sig: [u8; 64] = sig_bytes
        .try_into()
        .map_err(|_| SigningError::InvalidSignature)?;

    let verifying_key =
        VerifyingKey::from_bytes(&pub_key).map_err(|_| SigningError::InvalidKey)?;
    let signature = Signature::from_bytes(&sig);

    verifying_key
        .verify(&receipt.hash(), &signature)
        .map_err(|_| SigningError::VerificationFailed)
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SigningError {
    #[error("Invalid signing key")]
    InvalidKey,

    #[error("Invalid signature encoding")]
    InvalidSignature,

    #[error("Signature verification failed")]
    VerificationFailed,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_signer() -> Ed25519ReceiptSigner {
        // Deterministic seed for repeatable test vectors
        let seed: [u8; 32] = [
            0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E,
            0x0F, 0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1A, 0x1B, 0x1C,
            0x1D, 0x1E, 0x1F, 0x20,
        ];
        Ed25519ReceiptSigner::from_bytes(&seed)
    }

    fn sample_receipt() -> Receipt {
        let ts = Utc.with_ymd_and_hms(2024, 2, 16, 12, 0, 0).unwrap();
        let market_id = MarketId::new();
        let taker = Order::new(
            OrderId::new(),
            market_id,
            UserAddress::new("0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb"),
            Side::Buy,
            Outcome::Yes,
            Price::from_str("0.6").unwrap(),
            Quantity::new(100),
            ts,
        );
        let trade = Trade::new(
            TradeId::new(),
            market_id,
            Outcome::Yes,
            Price::from_str("0.55").unwrap(),
            Quantity::new(100),
            OrderId::new(),
            taker.id,
            UserAddress::new("0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"),
            taker.user_address.clone(),
            Side::Buy,
            ts,
        );
        let mut filled = taker;
        filled.add_fill(Quantity::new(100));
        Receipt::from_order(&filled, vec![trade], ts)
    }

    #[test]
    fn test_canonical_bytes_deterministic() {
        let receipt = sample_receipt();
        assert_eq!(receipt.canonical_bytes(), receipt.canonical_bytes());
        assert_eq!(receipt.hash(), receipt.hash());
    }

    #[test]
    fn test_canonical_bytes_sorted_keys() {
        let receipt = sample_receipt();
        let json = String::from_utf8(receipt.canonical_bytes()).unwrap();
        let filled_pos = json.find("\"filledQuantity\"").unwrap();
        let market_pos = json.find("\"marketId\"").unwrap();
        let order_pos = json.find("\"orderId\"").unwrap();
        let version_pos = json.find("\"version\"").unwrap();
        assert!(filled_pos < market_pos);
        assert!(market_pos < order_pos);
        assert!(order_pos < version_pos);
    }

    #[test]
    fn test_canonical_fixed_scale_price() {
        let receipt = sample_receipt();
        let json = String::from_utf8(receipt.canonical_bytes()).unwrap();
        assert!(json.contains("\"price\":\"0.60000000\""));
        assert!(json.contains("\"price\":\"0.55000000\""));
        assert!(json.contains("\"quantity\":\"100\""));
    }

    #[test]
    fn test_canonical_iso8601_timestamps() {
        let receipt = sample_receipt();
        let json = String::from_utf8(receipt.canonical_bytes()).unwrap();
        assert!(json.contains("\"timestamp\":\"2024-02-16T12:00:00.000Z\""));
    }

    #[test]
    fn test_hash_changes_with_content() {
        let receipt = sample_receipt();
        let mut other = receipt.clone();
        other.filled_quantity = Quantity::new(99);
        assert_ne!(receipt.hash(), other.hash());
    }

    #[test]
    fn test_sign_and_verify() {
        let signer = test_signer();
        let receipt = sample_receipt();
        let signature = signer.sign(&receipt).unwrap();
        assert!(verify_receipt(&receipt, &signature, &signer.public_key()).is_ok());
    }

    #[test]
    fn test_signature_stable() {
        let signer = test_signer();
        let receipt = sample_receipt();
        // Ed25519 with a fixed key is deterministic
        assert_eq!(signer.sign(&receipt).unwrap(), signer.sign(&receipt).unwrap());
    }

    #[test]
    fn test_signature_length() {
        let signer = test_signer();
        let signature = signer.sign(&sample_receipt()).unwrap();
        // Ed25519 signature = 64 bytes = 128 hex chars
        assert_eq!(signature.len(), 128);
        assert_eq!(signer.public_key().len(), 64);
    }

    #[test]
    fn test_verify_tampered_receipt_fails() {
        let signer = test_signer();
        let receipt = sample_receipt();
        let signature = signer.sign(&receipt).unwrap();

        let mut tampered = receipt.clone();
        tampered.quantity = Quantity::new(1);
        assert_eq!(
            verify_receipt(&tampered, &signature, &signer.public_key()),
            Err(SigningError::VerificationFailed)
        );
    }

    #[test]
    fn test_verify_wrong_key_fails() {
        use rand::rngs::OsRng;
        let signer = test_signer();
        let receipt = sample_receipt();
        let signature = signer.sign(&receipt).unwrap();

        let other = SigningKey::generate(&mut OsRng);
        let other_pub = hex::encode(other.verifying_key().to_bytes());
        assert_eq!(
            verify_receipt(&receipt, &signature, &other_pub),
            Err(SigningError::VerificationFailed)
        );
    }

    #[test]
    fn test_from_hex_round_trip() {
        let seed_hex = "0102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f20";
        let signer = Ed25519ReceiptSigner::from_hex(seed_hex).unwrap();
        assert_eq!(signer.public_key(), test_signer().public_key());
    }

    #[test]
    fn test_from_hex_rejects_bad_input() {
        assert_eq!(
            Ed25519ReceiptSigner::from_hex("not hex").unwrap_err(),
            SigningError::InvalidKey
        );
        assert_eq!(
            Ed25519ReceiptSigner::from_hex("0102").unwrap_err(),
            SigningError::InvalidKey
        );
    }
}

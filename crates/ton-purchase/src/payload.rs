//! Buy-order payload encoding.
//!
//! The sale contract expects a single cell:
//!
//! ```text
//! op:32  query_id:64  jetton_amount:Coins  0:1  buyer:addr_std  expires_at:32
//! ```
//!
//! The embedded address is the buyer wallet, not the contract: the
//! contract pays the jettons (or a refund) back to it. The query id is
//! drawn fresh per call for correlation only; the expiry is a validity
//! window the contract enforces, not a client timer.

use std::time::{SystemTime, UNIX_EPOCH};

use ton_cell::{Cell, CellBuilder, CellError, MsgAddress};

use crate::error::{PurchaseError, PurchaseResult};

/// Buy operation code
pub const BUY_OP: u32 = 0xaf750d34;

/// Payload validity window in seconds
pub const PAYLOAD_TTL_SECS: u64 = 300;

/// Encode a buy payload with a fresh query id and the default expiry.
pub fn encode_buy_payload(address: &MsgAddress, jetton_amount: u64) -> PurchaseResult<Cell> {
    let query_id: u64 = rand::random();
    let expires_at = (unix_now() + PAYLOAD_TTL_SECS) as u32;
    encode_buy_payload_with(address, jetton_amount, query_id, expires_at)
}

/// Parse the buyer address, then encode.
pub fn encode_buy_payload_str(address: &str, jetton_amount: u64) -> PurchaseResult<Cell> {
    let address = MsgAddress::from_string(address)?;
    encode_buy_payload(&address, jetton_amount)
}

/// Deterministic encoding core: every generated field is an argument.
pub fn encode_buy_payload_with(
    address: &MsgAddress,
    jetton_amount: u64,
    query_id: u64,
    expires_at: u32,
) -> PurchaseResult<Cell> {
    if !address.is_internal() {
        return Err(PurchaseError::Encoding(CellError::InvalidAddress(
            "buy payload requires an internal buyer address".to_string(),
        )));
    }

    let mut builder = CellBuilder::new();
    builder.store_u32(BUY_OP)?;
    builder.store_u64(query_id)?;
    builder.store_coins(jetton_amount as u128)?;
    builder.store_bit(false)?;
    builder.store_address(address)?;
    builder.store_u32(expires_at)?;
    builder.build().map_err(Into::into)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

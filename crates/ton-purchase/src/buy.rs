//! End-to-end purchase submission.
//!
//! One call builds, signs, submits and waits: derive the wallet from the
//! seed, encode the buy payload around the wallet's own address, wrap it
//! in a non-bounceable transfer to the sale contract, submit the signed
//! external message and poll the wallet seqno until it advances.
//!
//! Failures propagate verbatim; there is no local retry. Cancellation is
//! cooperative and only abandons the inclusion wait: a message already
//! handed to the liteserver may still land on chain.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use ton_cell::{BagOfCells, MsgAddress};
use ton_wallet::{open_wallet, Mnemonic, Transfer, WalletVersion};

use crate::api::TonApi;
use crate::error::{PurchaseError, PurchaseResult};
use crate::payload::{encode_buy_payload, PAYLOAD_TTL_SECS};

/// Seconds between seqno polls while waiting for inclusion.
const INCLUSION_POLL_SECS: u64 = 3;

/// Outcome of a submitted purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseReceipt {
    /// Hash of the external message that was sent.
    pub message_hash: [u8; 32],
    /// Wallet seqno the message consumed.
    pub seqno: u32,
}

/// Buy jettons from a sale contract.
///
/// `ton_amount` is a decimal string in whole coins ("0.05" attaches
/// 50_000_000 nanotons). The buyer address embedded in the payload is the
/// wallet derived from `seed_words`; `contract_addr` is only the envelope
/// destination.
pub async fn buy_tokens<A: TonApi>(
    cancel: &CancellationToken,
    api: &A,
    seed_words: &str,
    version: WalletVersion,
    jetton_amount: u64,
    ton_amount: &str,
    contract_addr: &str,
) -> PurchaseResult<PurchaseReceipt> {
    let mnemonic = Mnemonic::from_phrase(seed_words, "")?;
    let wallet = open_wallet(&mnemonic, version, 0)?;

    let dest = MsgAddress::from_string(contract_addr)?;
    let value = parse_ton_amount(ton_amount)?;

    let payload = encode_buy_payload(wallet.address(), jetton_amount)?;
    let transfer = Transfer::new(dest, value)
        .with_bounce(false)
        .with_payload(payload);

    let seqno = api.seqno(wallet.address()).await?;
    debug!(seqno, address = %wallet.address(), "building transfer");

    let valid_until = (unix_now() + PAYLOAD_TTL_SECS) as u32;
    let body = wallet.create_transfer_body(seqno, &[transfer], valid_until)?;
    let signed = wallet.sign(&body)?;
    // A wallet that has never sent anything carries its state init along.
    let external = wallet.create_external_message(&signed, seqno == 0)?;

    let message_hash = external.hash();
    let boc = BagOfCells::from_root(external).serialize()?;

    let status = api.send_message(&boc).await?;
    if status != 1 {
        return Err(PurchaseError::Rejected(status));
    }
    info!(seqno, "message accepted, waiting for inclusion");

    wait_for_inclusion(cancel, api, wallet.address(), seqno).await?;
    Ok(PurchaseReceipt { message_hash, seqno })
}

/// Poll the wallet seqno until it moves past `sent_seqno`.
async fn wait_for_inclusion<A: TonApi>(
    cancel: &CancellationToken,
    api: &A,
    address: &MsgAddress,
    sent_seqno: u32,
) -> PurchaseResult<()> {
    loop {
        if cancel.is_cancelled() {
            return Err(PurchaseError::Cancelled);
        }

        let current = api.seqno(address).await?;
        if current > sent_seqno {
            info!(seqno = current, "transaction included");
            return Ok(());
        }

        tokio::select! {
            _ = cancel.cancelled() => return Err(PurchaseError::Cancelled),
            _ = tokio::time::sleep(Duration::from_secs(INCLUSION_POLL_SECS)) => {}
        }
    }
}

/// Parse a decimal coin amount into nanotons (9-decimal fixed point).
pub fn parse_ton_amount(s: &str) -> PurchaseResult<u128> {
    let bad = || PurchaseError::InvalidAmount(s.to_string());

    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(bad());
    }
    if frac.len() > 9 {
        return Err(bad());
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(bad());
    }

    let whole_part: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| bad())?
    };
    let frac_part: u128 = if frac.is_empty() {
        0
    } else {
        let padded = format!("{:0<9}", frac);
        padded.parse().map_err(|_| bad())?
    };

    whole_part
        .checked_mul(1_000_000_000)
        .and_then(|n| n.checked_add(frac_part))
        .ok_or_else(bad)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

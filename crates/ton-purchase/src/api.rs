//! Provider seam between the submitter and the liteserver client.
//!
//! The submitter talks to the chain through [`TonApi`] so tests can swap
//! in doubles. The [`TonClient`] implementation carries the one piece of
//! chain-specific decoding the flow needs: reading a wallet seqno out of
//! a get-method result stack.

use std::path::Path;

use ton_cell::{BagOfCells, CellSlice, MsgAddress};
use ton_liteclient::{
    compute_method_id, AccountId, GlobalConfig, LiteError, LiteResult, ProofCheckPolicy,
    RunMethodResult, TonClient,
};
use tracing::debug;

use crate::error::{PurchaseError, PurchaseResult};

/// Stack entry tag for a 64-bit integer (`vm_stk_tinyint`).
const STACK_TINYINT: u8 = 0x01;

/// TVM exit code when the dispatcher finds no such method.
const EXIT_NO_METHOD: i32 = 11;

/// Liteserver exit code when the account has no state to run against.
const EXIT_NOT_INITIALIZED: i32 = -256;

/// Build a [`TonClient`] from a global-config file.
///
/// A missing or unparseable config fails here, before any identity or
/// encoding work runs.
pub fn connect(path: impl AsRef<Path>, policy: ProofCheckPolicy) -> PurchaseResult<TonClient> {
    let config = GlobalConfig::from_file(path)?;
    TonClient::from_config(&config, policy).map_err(|e| match e {
        LiteError::Config(inner) => PurchaseError::Config(inner),
        other => PurchaseError::Submission(other),
    })
}

/// Chain operations the purchase flow needs.
#[allow(async_fn_in_trait)]
pub trait TonApi {
    /// Current wallet seqno; 0 when the account is not deployed.
    async fn seqno(&self, address: &MsgAddress) -> LiteResult<u32>;

    /// Submit a serialized external message, returning the raw status.
    async fn send_message(&self, boc: &[u8]) -> LiteResult<i32>;
}

impl TonApi for TonClient {
    async fn seqno(&self, address: &MsgAddress) -> LiteResult<u32> {
        let info = self.get_masterchain_info().await?;
        let account = AccountId::from(address);
        let result = self
            .run_get_method(&info.last, &account, compute_method_id("seqno"), &[])
            .await?;
        seqno_from_result(result)
    }

    async fn send_message(&self, boc: &[u8]) -> LiteResult<i32> {
        TonClient::send_message(self, boc).await
    }
}

/// Map a `seqno` get-method result to the wallet seqno.
///
/// Only an account without state reads as 0: no deployed code to
/// dispatch into (`EXIT_NO_METHOD`) or no state at all
/// (`EXIT_NOT_INITIALIZED`). Any other TVM failure on a deployed wallet
/// propagates; treating it as 0 would re-send a deploy-style message.
fn seqno_from_result(result: RunMethodResult) -> LiteResult<u32> {
    if !result.is_success() {
        return match result.exit_code {
            EXIT_NO_METHOD | EXIT_NOT_INITIALIZED => {
                debug!(exit_code = result.exit_code, "account uninitialized, seqno 0");
                Ok(0)
            }
            code => Err(LiteError::Server {
                code,
                message: format!("seqno get-method failed with exit code {code}"),
            }),
        };
    }
    match result.result {
        Some(stack) => decode_seqno_stack(&stack),
        None => Ok(0),
    }
}

/// Read the integer off the top of a serialized VM stack.
///
/// The stack rides as a bag of cells whose root is
/// `depth:24 rest:^VmStackList tos:VmStackValue`; a wallet seqno comes
/// back as a `vm_stk_tinyint` on top.
fn decode_seqno_stack(boc: &[u8]) -> LiteResult<u32> {
    let cell_err = |e: ton_cell::CellError| LiteError::Tl(format!("bad result stack: {e}"));

    let bag = BagOfCells::deserialize(boc).map_err(cell_err)?;
    let root = bag.single_root().map_err(cell_err)?;

    let mut slice = CellSlice::new(root);
    let depth = slice.load_uint(24).map_err(cell_err)?;
    if depth == 0 {
        return Ok(0);
    }

    let tag = slice.load_u8().map_err(cell_err)?;
    if tag != STACK_TINYINT {
        return Err(LiteError::Tl(format!(
            "unexpected stack entry tag 0x{tag:02x}"
        )));
    }
    let value = slice.load_int(64).map_err(cell_err)?;
    Ok(value as u32)
}

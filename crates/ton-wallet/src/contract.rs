//! Wallet contract interface.

use std::sync::Arc;

use ton_cell::{Cell, CellBuilder, MsgAddress};

use crate::error::WalletResult;
use crate::message::Transfer;
use crate::mnemonic::Mnemonic;
use crate::v3r2::WalletV3R2;

/// Wallet contract revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum WalletVersion {
    /// Wallet V3 revision 2
    V3R2,
}

/// Common wallet contract interface.
pub trait Wallet: Send + Sync {
    /// Contract revision
    fn version(&self) -> WalletVersion;

    /// Wallet address
    fn address(&self) -> &MsgAddress;

    /// Public key the contract checks signatures against
    fn public_key(&self) -> &[u8; 32];

    /// Workchain the wallet lives in
    fn workchain(&self) -> i32;

    /// State init cell for deployment
    fn state_init(&self) -> WalletResult<Cell>;

    /// Build the unsigned transfer body for the given seqno and expiry
    fn create_transfer_body(
        &self,
        seqno: u32,
        transfers: &[Transfer],
        valid_until: u32,
    ) -> WalletResult<Cell>;

    /// Prepend the signature over the body hash to the body
    fn sign(&self, body: &Cell) -> WalletResult<Cell>;

    /// Wrap a signed body into an external inbound message.
    ///
    /// Set `deploy` on the first message to an undeployed wallet so the
    /// state init rides along; the contract does not exist on chain until
    /// one message carries it.
    fn create_external_message(&self, signed_body: &Cell, deploy: bool) -> WalletResult<Cell> {
        let mut builder = CellBuilder::new();

        // ext_in_msg_info$10 src:addr_none$00 dest import_fee:0
        builder.store_bits(&[true, false])?;
        builder.store_bits(&[false, false])?;
        builder.store_address(self.address())?;
        builder.store_coins(0)?;

        if deploy {
            builder.store_bit(true)?;
            builder.store_bit(true)?; // state init in ref
            builder.store_ref(Arc::new(self.state_init()?))?;
        } else {
            builder.store_bit(false)?;
        }

        // body in ref
        builder.store_bit(true)?;
        builder.store_ref(Arc::new(signed_body.clone()))?;

        builder.build().map_err(Into::into)
    }
}

/// Open a wallet of the given revision for a mnemonic.
pub fn open_wallet(
    mnemonic: &Mnemonic,
    version: WalletVersion,
    workchain: i32,
) -> WalletResult<Box<dyn Wallet>> {
    match version {
        WalletVersion::V3R2 => Ok(Box::new(WalletV3R2::new(mnemonic.to_keypair(), workchain)?)),
    }
}

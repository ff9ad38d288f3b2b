//! Wallet V3R2 contract.
//!
//! Persistent data is `seqno:32 subwallet_id:32 public_key:256`; the
//! transfer body is `subwallet_id:32 valid_until:32 seqno:32` followed by
//! up to four `mode:8 ^message` pairs. The address is derived from the
//! state init, so it is fixed by the public key, workchain and subwallet
//! id alone.

use std::sync::Arc;

use ton_cell::{Cell, CellBuilder, MsgAddress};
use ton_crypto::Ed25519Keypair;

use crate::codes::wallet_v3r2_code;
use crate::contract::{Wallet, WalletVersion};
use crate::error::{WalletError, WalletResult};
use crate::message::{build_internal_message, Transfer};

/// Default subwallet ID for workchain 0
pub const DEFAULT_SUBWALLET_ID: u32 = 698983191;

/// Maximum messages per transfer body
const MAX_TRANSFERS: usize = 4;

/// Wallet V3 revision 2
pub struct WalletV3R2 {
    keypair: Ed25519Keypair,
    workchain: i32,
    subwallet_id: u32,
    address: MsgAddress,
}

impl WalletV3R2 {
    /// Open a wallet with the conventional subwallet id for the workchain.
    pub fn new(keypair: Ed25519Keypair, workchain: i32) -> WalletResult<Self> {
        let subwallet_id = DEFAULT_SUBWALLET_ID.wrapping_add(workchain as u32);
        Self::with_subwallet(keypair, workchain, subwallet_id)
    }

    /// Open a wallet with an explicit subwallet id.
    pub fn with_subwallet(
        keypair: Ed25519Keypair,
        workchain: i32,
        subwallet_id: u32,
    ) -> WalletResult<Self> {
        let state_init = build_state_init(&keypair.public_key, subwallet_id)?;
        let address = MsgAddress::Internal {
            workchain,
            address: state_init.hash(),
        };
        Ok(Self {
            keypair,
            workchain,
            subwallet_id,
            address,
        })
    }

    /// The subwallet id baked into the contract data.
    pub fn subwallet_id(&self) -> u32 {
        self.subwallet_id
    }
}

fn build_state_init(pubkey: &[u8; 32], subwallet_id: u32) -> WalletResult<Cell> {
    let code = wallet_v3r2_code()?;

    let mut data_builder = CellBuilder::new();
    data_builder.store_u32(0)?; // seqno starts at 0
    data_builder.store_u32(subwallet_id)?;
    data_builder.store_bytes(pubkey)?;
    let data = data_builder.build()?;

    // no split_depth, no special, code ref, data ref, no library
    let mut builder = CellBuilder::new();
    builder.store_bit(false)?;
    builder.store_bit(false)?;
    builder.store_bit(true)?;
    builder.store_ref(code)?;
    builder.store_bit(true)?;
    builder.store_ref(Arc::new(data))?;
    builder.store_bit(false)?;
    builder.build().map_err(Into::into)
}

impl Wallet for WalletV3R2 {
    fn version(&self) -> WalletVersion {
        WalletVersion::V3R2
    }

    fn address(&self) -> &MsgAddress {
        &self.address
    }

    fn public_key(&self) -> &[u8; 32] {
        &self.keypair.public_key
    }

    fn workchain(&self) -> i32 {
        self.workchain
    }

    fn state_init(&self) -> WalletResult<Cell> {
        build_state_init(&self.keypair.public_key, self.subwallet_id)
    }

    fn create_transfer_body(
        &self,
        seqno: u32,
        transfers: &[Transfer],
        valid_until: u32,
    ) -> WalletResult<Cell> {
        if transfers.len() > MAX_TRANSFERS {
            return Err(WalletError::TooManyTransfers {
                max: MAX_TRANSFERS,
                got: transfers.len(),
            });
        }

        let mut builder = CellBuilder::new();
        builder.store_u32(self.subwallet_id)?;
        builder.store_u32(valid_until)?;
        builder.store_u32(seqno)?;

        for transfer in transfers {
            builder.store_u8(transfer.mode)?;
            let msg = build_internal_message(transfer)?;
            builder.store_ref(Arc::new(msg))?;
        }

        builder.build().map_err(Into::into)
    }

    fn sign(&self, body: &Cell) -> WalletResult<Cell> {
        let signature = self.keypair.sign(&body.hash());

        // signature:512 then the body inlined, bits and refs
        let mut builder = CellBuilder::new();
        builder.store_bytes(&signature)?;

        let body_data = body.data();
        for i in 0..body.bit_len() {
            let bit = (body_data[i / 8] >> (7 - i % 8)) & 1 == 1;
            builder.store_bit(bit)?;
        }
        for r in body.references() {
            builder.store_ref(r.clone())?;
        }

        builder.build().map_err(Into::into)
    }
}

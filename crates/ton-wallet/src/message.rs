//! Outgoing transfer descriptions and internal message layout.

use std::sync::Arc;

use ton_cell::{Cell, CellBuilder, CellResult, MsgAddress};

use crate::error::WalletResult;

/// Pay forwarding fees from the sender balance and ignore action errors.
pub const SEND_MODE_PAY_FEES_SEPARATELY: u8 = 3;

/// One outgoing transfer from a wallet.
#[derive(Debug, Clone)]
pub struct Transfer {
    /// Destination address
    pub to: MsgAddress,
    /// Amount in nanotons
    pub amount: u128,
    /// Optional message payload
    pub payload: Option<Arc<Cell>>,
    /// Bounce flag
    pub bounce: bool,
    /// Disable instant hypercube routing
    pub ihr_disabled: bool,
    /// Send mode byte
    pub mode: u8,
}

impl Transfer {
    /// A bounceable transfer with no payload and the default send mode.
    pub fn new(to: MsgAddress, amount: u128) -> Self {
        Self {
            to,
            amount,
            payload: None,
            bounce: true,
            ihr_disabled: true,
            mode: SEND_MODE_PAY_FEES_SEPARATELY,
        }
    }

    /// Attach a payload cell.
    pub fn with_payload(mut self, payload: Cell) -> Self {
        self.payload = Some(Arc::new(payload));
        self
    }

    /// Set the bounce flag.
    pub fn with_bounce(mut self, bounce: bool) -> Self {
        self.bounce = bounce;
        self
    }

    /// Set the send mode byte.
    pub fn with_mode(mut self, mode: u8) -> Self {
        self.mode = mode;
        self
    }
}

/// Build the `int_msg_info$0` message cell for a transfer.
///
/// Fee, lt and timestamp fields are left at zero; validators fill them
/// when the sending contract emits the message.
pub fn build_internal_message(transfer: &Transfer) -> WalletResult<Cell> {
    let mut builder = CellBuilder::new();

    // int_msg_info$0 ihr_disabled:Bool bounce:Bool bounced:Bool
    builder.store_bit(false)?;
    builder.store_bit(transfer.ihr_disabled)?;
    builder.store_bit(transfer.bounce)?;
    builder.store_bit(false)?;

    // src: addr_none$00, filled in by the emitting contract
    builder.store_bits(&[false, false])?;
    builder.store_address(&transfer.to)?;
    builder.store_coins(transfer.amount)?;

    // no extra currencies
    builder.store_bit(false)?;

    // ihr_fee and fwd_fee, computed by validators
    builder.store_coins(0)?;
    builder.store_coins(0)?;

    // created_lt and created_at, filled in on send
    builder.store_u64(0)?;
    builder.store_u32(0)?;

    // no state init
    builder.store_bit(false)?;

    match transfer.payload {
        Some(ref payload) => {
            builder.store_bit(true)?;
            builder.store_ref(payload.clone())?;
        }
        None => {
            builder.store_bit(false)?;
        }
    }

    builder.build().map_err(Into::into)
}

/// Build a plain-text comment cell (op 0 followed by UTF-8 bytes).
pub fn build_comment(text: &str) -> CellResult<Cell> {
    let mut builder = CellBuilder::new();
    builder.store_u32(0)?;
    builder.store_bytes(text.as_bytes())?;
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ton_cell::CellSlice;

    fn dest() -> MsgAddress {
        MsgAddress::Internal {
            workchain: 0,
            address: [0x11; 32],
        }
    }

    #[test]
    fn test_transfer_builder() {
        let transfer = Transfer::new(dest(), 1_000_000_000)
            .with_bounce(false)
            .with_mode(128);

        assert_eq!(transfer.amount, 1_000_000_000);
        assert!(!transfer.bounce);
        assert!(transfer.ihr_disabled);
        assert_eq!(transfer.mode, 128);
    }

    #[test]
    fn test_internal_message_layout() {
        let transfer = Transfer::new(dest(), 250_000_000).with_bounce(false);
        let msg = build_internal_message(&transfer).unwrap();

        let mut slice = CellSlice::new(&msg);
        assert!(!slice.load_bit().unwrap()); // internal
        assert!(slice.load_bit().unwrap()); // ihr_disabled
        assert!(!slice.load_bit().unwrap()); // bounce off
        assert!(!slice.load_bit().unwrap()); // bounced
        assert_eq!(slice.load_uint(2).unwrap(), 0); // src addr_none
        assert_eq!(slice.load_address().unwrap(), dest());
        assert_eq!(slice.load_coins().unwrap(), 250_000_000);
    }

    #[test]
    fn test_payload_goes_into_ref() {
        let payload = build_comment("gm").unwrap();
        let transfer = Transfer::new(dest(), 1).with_payload(payload);
        let msg = build_internal_message(&transfer).unwrap();
        assert_eq!(msg.reference_count(), 1);
    }

    #[test]
    fn test_no_payload_no_refs() {
        let msg = build_internal_message(&Transfer::new(dest(), 1)).unwrap();
        assert_eq!(msg.reference_count(), 0);
    }

    #[test]
    fn test_build_comment() {
        let cell = build_comment("Hello TON").unwrap();
        let mut slice = CellSlice::new(&cell);
        assert_eq!(slice.load_u32().unwrap(), 0);
        assert_eq!(slice.load_bytes(9).unwrap(), b"Hello TON");
    }
}

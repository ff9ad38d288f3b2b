//! Record types for liteserver queries and responses.

use std::fmt;

use crate::error::LiteResult;
use crate::tl::{TlReader, TlWriter};

/// Extended block identifier with hashes (`tonNode.blockIdExt`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockIdExt {
    /// Workchain id (-1 for masterchain, 0 for basechain).
    pub workchain: i32,
    /// Shard identifier.
    pub shard: i64,
    /// Block sequence number.
    pub seqno: u32,
    /// Root hash of the block.
    pub root_hash: [u8; 32],
    /// File hash of the block.
    pub file_hash: [u8; 32],
}

impl BlockIdExt {
    pub fn is_masterchain(&self) -> bool {
        self.workchain == -1
    }

    pub fn serialize(&self, writer: &mut TlWriter) {
        writer.write_i32(self.workchain);
        writer.write_i64(self.shard);
        writer.write_u32(self.seqno);
        writer.write_int256(&self.root_hash);
        writer.write_int256(&self.file_hash);
    }

    pub fn deserialize(reader: &mut TlReader) -> LiteResult<Self> {
        Ok(Self {
            workchain: reader.read_i32()?,
            shard: reader.read_i64()?,
            seqno: reader.read_u32()?,
            root_hash: reader.read_int256()?,
            file_hash: reader.read_int256()?,
        })
    }
}

impl fmt::Display for BlockIdExt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}:{:016x}:{})",
            self.workchain, self.shard as u64, self.seqno
        )
    }
}

/// Zero state reference (`tonNode.zeroStateIdExt`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZeroStateIdExt {
    pub workchain: i32,
    pub root_hash: [u8; 32],
    pub file_hash: [u8; 32],
}

impl ZeroStateIdExt {
    pub fn deserialize(reader: &mut TlReader) -> LiteResult<Self> {
        Ok(Self {
            workchain: reader.read_i32()?,
            root_hash: reader.read_int256()?,
            file_hash: reader.read_int256()?,
        })
    }
}

/// Account reference for queries (`liteServer.accountId`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountId {
    /// Workchain id.
    pub workchain: i32,
    /// 256-bit account address.
    pub address: [u8; 32],
}

impl AccountId {
    pub fn new(workchain: i32, address: [u8; 32]) -> Self {
        Self { workchain, address }
    }

    pub fn serialize(&self, writer: &mut TlWriter) {
        writer.write_i32(self.workchain);
        writer.write_int256(&self.address);
    }
}

impl From<&ton_cell::MsgAddress> for AccountId {
    /// A null address maps to workchain 0 with a zero hash.
    fn from(addr: &ton_cell::MsgAddress) -> Self {
        match addr {
            ton_cell::MsgAddress::Null => Self::new(0, [0u8; 32]),
            ton_cell::MsgAddress::Internal { workchain, address } => {
                Self::new(*workchain, *address)
            }
        }
    }
}

/// `liteServer.masterchainInfo` response.
#[derive(Debug, Clone)]
pub struct MasterchainInfo {
    /// Last known masterchain block.
    pub last: BlockIdExt,
    /// State root hash.
    pub state_root_hash: [u8; 32],
    /// Initial (zero) state.
    pub init: ZeroStateIdExt,
}

impl MasterchainInfo {
    pub fn deserialize(reader: &mut TlReader) -> LiteResult<Self> {
        Ok(Self {
            last: BlockIdExt::deserialize(reader)?,
            state_root_hash: reader.read_int256()?,
            init: ZeroStateIdExt::deserialize(reader)?,
        })
    }
}

/// `liteServer.sendMsgStatus` response. Status 1 means accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendMsgStatus {
    pub status: i32,
}

impl SendMsgStatus {
    pub fn deserialize(reader: &mut TlReader) -> LiteResult<Self> {
        Ok(Self {
            status: reader.read_i32()?,
        })
    }

    pub fn is_ok(&self) -> bool {
        self.status == 1
    }
}

/// `liteServer.runMethodResult` response.
///
/// Field presence is gated by the mode flags echoed back by the server.
#[derive(Debug, Clone)]
pub struct RunMethodResult {
    pub mode: u32,
    /// Block at which the method was executed.
    pub block_id: BlockIdExt,
    /// Shard block holding the account.
    pub shard_block: BlockIdExt,
    /// Shard proof (mode bit 0).
    pub shard_proof: Option<Vec<u8>>,
    /// Account proof (mode bit 0).
    pub proof: Option<Vec<u8>>,
    /// State proof (mode bit 1).
    pub state_proof: Option<Vec<u8>>,
    /// Initial c7 register (mode bit 3).
    pub init_c7: Option<Vec<u8>>,
    /// Library extras (mode bit 4).
    pub lib_extras: Option<Vec<u8>>,
    /// TVM exit code.
    pub exit_code: i32,
    /// Result stack as a bag of cells (mode bit 2).
    pub result: Option<Vec<u8>>,
}

impl RunMethodResult {
    pub fn deserialize(reader: &mut TlReader) -> LiteResult<Self> {
        let mode = reader.read_u32()?;
        let block_id = BlockIdExt::deserialize(reader)?;
        let shard_block = BlockIdExt::deserialize(reader)?;

        let shard_proof = (mode & 1 != 0).then(|| reader.read_bytes()).transpose()?;
        let proof = (mode & 1 != 0).then(|| reader.read_bytes()).transpose()?;
        let state_proof = (mode & 2 != 0).then(|| reader.read_bytes()).transpose()?;
        let init_c7 = (mode & 8 != 0).then(|| reader.read_bytes()).transpose()?;
        let lib_extras = (mode & 16 != 0).then(|| reader.read_bytes()).transpose()?;
        let exit_code = reader.read_i32()?;
        let result = (mode & 4 != 0).then(|| reader.read_bytes()).transpose()?;

        Ok(Self {
            mode,
            block_id,
            shard_block,
            shard_proof,
            proof,
            state_proof,
            init_c7,
            lib_extras,
            exit_code,
            result,
        })
    }

    /// True if the TVM exited cleanly.
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

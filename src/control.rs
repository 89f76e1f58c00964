use crate::{
    csd::CsdData,
    cid::CidData,
    session::CardType,
};

/// Result code of the block device surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    Ok,
    IoError,
    WriteProtected,
    NotReady,
    InvalidParameter,
}

/// Power control request, accepted and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerCtrl {
    Off,
    On,
    Query,
}

/// Control and information requests of the block device surface.
pub enum Control<'a> {
    /// Wait until the card no longer signals busy.
    Sync,
    /// Count of 512-byte sectors.
    GetSectorCount(&'a mut u64),
    /// Sector size in bytes.
    GetSectorSize(&'a mut usize),
    /// Erase block size in sectors.
    GetBlockSize(&'a mut u32),
    GetCardType(&'a mut CardType),
    GetCsd(&'a mut CsdData),
    GetCid(&'a mut CidData),
    GetOcr(&'a mut [u8; 4]),
    /// 512-bit SD status, SD cards only.
    GetSdStatus(&'a mut [u8; 64]),
    Power(PowerCtrl),
}

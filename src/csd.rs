use crate::{
    consts::BLOCK_SIZE_U64,
    register::{RegisterData, RegisterImage},
    session::CardType,
};

use size::{consts::KiB, Size};

/// Card Specific Data block.
pub type CsdData = RegisterData;

/// CSD field layout.
pub mod fields {
    use crate::register::RegisterSlice;

    pub const CSD_STRUCTURE: RegisterSlice = RegisterSlice::bits(127, 126);
    pub const READ_BL_LEN: RegisterSlice = RegisterSlice::bits(83, 80);
    pub const ERASE_BLK_EN: RegisterSlice = RegisterSlice::bit(46);
    pub const SECTOR_SIZE: RegisterSlice = RegisterSlice::bits(45, 39);
    pub const WRITE_BL_LEN: RegisterSlice = RegisterSlice::bits(25, 22);
    pub const COPY: RegisterSlice = RegisterSlice::bit(14);
    pub const PERM_WRITE_PROTECT: RegisterSlice = RegisterSlice::bit(13);
    pub const TMP_WRITE_PROTECT: RegisterSlice = RegisterSlice::bit(12);

    /// Standard capacity (structure 1.0), also used by MMC.
    pub mod v1 {
        use crate::register::RegisterSlice;

        pub const C_SIZE: RegisterSlice = RegisterSlice::bits(73, 62);
        pub const C_SIZE_MULT: RegisterSlice = RegisterSlice::bits(49, 47);
    }

    /// High and extended capacity (structure 2.0).
    pub mod v2 {
        use crate::register::RegisterSlice;

        pub const C_SIZE: RegisterSlice = RegisterSlice::bits(69, 48);
    }

    /// Ultra capacity (structure 3.0).
    pub mod v3 {
        use crate::register::RegisterSlice;

        pub const C_SIZE: RegisterSlice = RegisterSlice::bits(75, 48);
    }

    /// MMC erase group layout, replaces `SECTOR_SIZE`.
    pub mod mmc {
        use crate::register::RegisterSlice;

        pub const ERASE_GRP_SIZE: RegisterSlice = RegisterSlice::bits(46, 42);
        pub const ERASE_GRP_MULT: RegisterSlice = RegisterSlice::bits(41, 37);
    }
}

/// Capacity unit of structure 2.0 and 3.0 `C_SIZE`.
const HIGH_CAPACITY_UNIT: u64 = 512 * (KiB as u64);

/// Card Specific Data register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Csd {
    raw: CsdData,
    image: RegisterImage,
}

impl Csd {
    /// Wrap a register as clocked out by the card.
    pub fn from_wire(raw: CsdData) -> Self {
        Csd {
            raw,
            image: RegisterImage::from_wire(&raw),
        }
    }

    /// Register bytes in wire order.
    pub fn raw(&self) -> &CsdData {
        &self.raw
    }

    /// Byte-order corrected image.
    pub fn image(&self) -> &RegisterImage {
        &self.image
    }

    /// Raw `CSD_STRUCTURE` field.
    pub fn structure(&self) -> u8 {
        self.image.get(fields::CSD_STRUCTURE) as u8
    }

    /// CSD version; MMC registers are always read with the 1.0 layout.
    pub fn version(&self, card_type: CardType) -> u8 {
        match card_type {
            CardType::MMC => 1,
            _ => self.structure() + 1,
        }
    }

    /// Read block length exponent.
    pub fn read_block_length(&self) -> u8 {
        self.image.get(fields::READ_BL_LEN) as u8
    }

    /// Write block length exponent.
    pub fn write_block_length(&self) -> u8 {
        self.image.get(fields::WRITE_BL_LEN) as u8
    }

    /// Erase of single write blocks is allowed (`ERASE_BLK_EN`).
    pub fn erase_single_block_enabled(&self) -> bool {
        self.image.get(fields::ERASE_BLK_EN) != 0
    }

    /// Content is a copy (`COPY`).
    pub fn copy_flag(&self) -> bool {
        self.image.get(fields::COPY) != 0
    }

    /// Permanent or temporary write protection is set.
    pub fn write_protected(&self) -> bool {
        self.image.get(fields::PERM_WRITE_PROTECT) != 0
            || self.image.get(fields::TMP_WRITE_PROTECT) != 0
    }

    /// Derive block lengths and capacity for a card of `card_type`.
    ///
    /// Returns `None` for a structure version this crate can't decode.
    pub fn geometry(&self, card_type: CardType) -> Option<CardGeometry> {
        let csd_version = self.version(card_type);
        let block_length_read = 1u32 << self.read_block_length();
        let block_length_write = 1u32 << self.write_block_length();

        let sector_length = match card_type {
            CardType::MMC => {
                (self.image.get(fields::mmc::ERASE_GRP_SIZE) + 1)
                    * (self.image.get(fields::mmc::ERASE_GRP_MULT) + 1)
            }
            _ => self.image.get(fields::SECTOR_SIZE) + 1,
        };

        let (block_count, capacity_bytes) = match csd_version {
            1 => {
                let device_size = u64::from(self.image.get(fields::v1::C_SIZE));
                let multiplier = self.image.get(fields::v1::C_SIZE_MULT);
                let block_count = (device_size + 1) << (multiplier + 2);
                (block_count, block_count * u64::from(block_length_read))
            }
            2 | 3 => {
                let device_size = match csd_version {
                    2 => self.image.get(fields::v2::C_SIZE),
                    _ => self.image.get(fields::v3::C_SIZE),
                };
                let capacity = (u64::from(device_size) + 1) * HIGH_CAPACITY_UNIT;
                (capacity / u64::from(block_length_read), capacity)
            }
            _ => return None,
        };

        Some(CardGeometry {
            csd_version,
            block_length_read,
            block_length_write,
            sector_length,
            block_count,
            capacity_bytes,
        })
    }
}

/// Represents capacity provider.
pub trait CapacityProvider {
    /// Returns the card capacity in bytes.
    fn card_capacity(&self) -> Size;

    /// Returns the card capacity in 512-byte blocks.
    fn card_capacity_blocks(&self) -> u64;
}

/// Sizes derived from the CSD register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CardGeometry {
    /// CSD structure version (1, 2 or 3).
    pub csd_version: u8,
    /// Max read block length in bytes.
    pub block_length_read: u32,
    /// Max write block length in bytes.
    pub block_length_write: u32,
    /// Erase granularity in write blocks.
    pub sector_length: u32,
    /// Capacity in `block_length_read` blocks.
    pub block_count: u64,
    /// Capacity in bytes.
    pub capacity_bytes: u64,
}

impl CapacityProvider for CardGeometry {
    fn card_capacity(&self) -> Size {
        Size::from_bytes(self.capacity_bytes)
    }

    fn card_capacity_blocks(&self) -> u64 {
        self.capacity_bytes / BLOCK_SIZE_U64
    }
}

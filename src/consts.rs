/// Logical sector size exposed to the block device layer.
pub const BLOCK_SIZE: usize = 512;
/// [`BLOCK_SIZE`] as `u64`.
pub const BLOCK_SIZE_U64: u64 = BLOCK_SIZE as u64;

pub mod commands {
    /// CMD base value.
    pub const CMD_BASE: u8 = 0x40;
    /// ACMD flag.
    pub const ACMD_FLAG: u8 = 0x80;
    /// GO_IDLE_STATE - init card in spi mode if CS low.
    pub const CMD0: u8 = CMD_BASE;
    /// SEND_OP_COND - MMC operating condition negotiation.
    pub const CMD1: u8 = CMD_BASE + 1;
    /// SEND_IF_COND - verify SD Memory Card interface operating condition.
    pub const CMD8: u8 = CMD_BASE + 8;
    /// SEND_CSD - read the Card Specific Data (CSD register).
    pub const CMD9: u8 = CMD_BASE + 9;
    /// SEND_CID - read the Card Identification (CID register).
    pub const CMD10: u8 = CMD_BASE + 10;
    /// SEND_STATUS - read the card status register.
    pub const CMD13: u8 = CMD_BASE + 13;
    /// SET_BLOCKLEN - set block length of byte addressed cards.
    pub const CMD16: u8 = CMD_BASE + 16;
    /// READ_SINGLE_BLOCK - read a single data block from the card.
    pub const CMD17: u8 = CMD_BASE + 17;
    /// APP_CMD - escape for application specific command.
    pub const CMD55: u8 = CMD_BASE + 55;
    /// READ_OCR - read the OCR register of a card.
    pub const CMD58: u8 = CMD_BASE + 58;
    /// CRC_ON_OFF - enable or disable CRC checking.
    pub const CMD59: u8 = CMD_BASE + 59;
    /// SD_STATUS - read the 512-bit SD status.
    pub const ACMD13: u8 = CMD_BASE + ACMD_FLAG + 13;
    /// SD_SEND_OP_COMD - Sends host capacity support information and activates
    /// the card's initialization process.
    pub const ACMD41: u8 = CMD_BASE + ACMD_FLAG + 41;

    /// Command number without the class and ACMD bits, for logging.
    pub const fn number(cmd: u8) -> u8 {
        cmd & !(CMD_BASE | ACMD_FLAG)
    }
}

pub mod arguments {
    /// SEND_IF_COND argument: 2.7-3.6V supply and the check pattern.
    pub const IF_COND: u32 = 0x0000_01AA;
    /// Host capacity support bit of SD_SEND_OP_COMD.
    pub const HCS: u32 = 0x4000_0000;
    /// CRC_ON_OFF argument enabling CRC.
    pub const CRC_ON: u32 = 0x0000_0001;
}

pub mod tokens {
    /// Start data token for read or write single block.
    pub const DATA_START_BLOCK: u8 = 0xFE;
    /// Byte clocked out by an idle card, also the receive filler.
    pub const AVAILABLE: u8 = 0xFF;
    /// Check pattern echoed back by SEND_IF_COND.
    pub const IF_COND_CHECK_PATTERN: u8 = 0xAA;
}

/// Represents config for [`SdMmcSpi`](crate::SdMmcSpi).
pub trait SdMmcSpiConfig {
    /// Max attempts of each operating-conditions negotiation loop.
    const MAX_RETRY: usize;
    /// Max bytes to poll for the R1 start bit.
    const READ_R1_ATTEMPTS: usize;
    /// Max bytes to poll for a data start token.
    const START_TOKEN_ATTEMPTS: usize;
    /// Max bytes to poll for the card to release the bus.
    const WAIT_AVAILABLE_ATTEMPTS: usize;
    /// Count of `0xFF` bytes clocked out before `GO_IDLE_STATE`.
    const INIT_CLOCK_BYTES: usize;
    /// Count of dummy cycles for delay.
    const DELAY_DUMMY_CYCLES: usize;
    /// Chunk size used to clock in data block payloads.
    const BURST_SIZE: usize;
    /// Turn on card side command CRC checking and validate data block CRC.
    const ENABLE_CRC: bool;
}

/// Default implementation of [`SdMmcSpiConfig`](crate::SdMmcSpiConfig).
pub struct DefaultSdMmcSpiConfig;

impl SdMmcSpiConfig for DefaultSdMmcSpiConfig {
    const MAX_RETRY: usize = 255;
    const READ_R1_ATTEMPTS: usize = 8;
    const START_TOKEN_ATTEMPTS: usize = 4096;
    const WAIT_AVAILABLE_ATTEMPTS: usize = 4096;
    const INIT_CLOCK_BYTES: usize = 10;
    const DELAY_DUMMY_CYCLES: usize = 32;
    const BURST_SIZE: usize = 16;
    const ENABLE_CRC: bool = true;
}

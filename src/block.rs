//! Single data block reception: start token, payload, CRC16.

use crate::{
    config::SdMmcSpiConfig,
    consts::tokens,
    crc::crc16,
};

use embedded_hal::blocking::spi::Transfer;

/// Data block reception failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockError<E> {
    /// Error from the SPI peripheral.
    Transport(E),
    /// No start token within the polling budget.
    Timeout,
    /// The card answered with a data error token.
    ErrorToken(u8),
    /// CRC mismatch (card, host).
    Crc(u16, u16),
}

fn receive<Spi: Transfer<u8>>(spi: &mut Spi) -> Result<u8, BlockError<Spi::Error>> {
    spi.transfer(&mut [tokens::AVAILABLE])
        .map(|b| b[0])
        .map_err(BlockError::Transport)
}

/// Poll for the start-of-data token.
fn wait_start_token<Spi, Config>(spi: &mut Spi) -> Result<(), BlockError<Spi::Error>>
where
    Spi: Transfer<u8>,
    Config: SdMmcSpiConfig,
{
    for _ in 0..Config::START_TOKEN_ATTEMPTS {
        match receive(spi)? {
            tokens::DATA_START_BLOCK => return Ok(()),
            tokens::AVAILABLE => {}
            token => {
                warn!("Data error token: 0x{:02X}", token);
                return Err(BlockError::ErrorToken(token));
            }
        }
    }

    Err(BlockError::Timeout)
}

/// Receive one data block into `buf`.
///
/// The payload is clocked in `Config::BURST_SIZE` bytes at a time, the
/// trailing CRC16 is checked when `Config::ENABLE_CRC` is set.
pub fn read_block<Spi, Config>(spi: &mut Spi, buf: &mut [u8]) -> Result<(), BlockError<Spi::Error>>
where
    Spi: Transfer<u8>,
    Config: SdMmcSpiConfig,
{
    wait_start_token::<Spi, Config>(spi)?;

    for chunk in buf.chunks_mut(Config::BURST_SIZE.max(1)) {
        chunk.fill(tokens::AVAILABLE);
        spi.transfer(chunk).map_err(BlockError::Transport)?;
    }

    let mut crc = [tokens::AVAILABLE; 2];
    spi.transfer(&mut crc).map_err(BlockError::Transport)?;

    if Config::ENABLE_CRC {
        let card_crc = u16::from_be_bytes(crc);
        let host_crc = crc16(buf);

        if card_crc != host_crc {
            return Err(BlockError::Crc(card_crc, host_crc));
        }
    }

    Ok(())
}

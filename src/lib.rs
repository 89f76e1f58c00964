//! SD/MMC card protocol engine written in Embedded Rust, built on the ideas of [embedded-sdmmc](https://crates.io/crates/embedded-sdmmc).
//!
//! The crate turns an SPI bus plus a chip select switch into a typed SD/MMC
//! command/response protocol: it negotiates the card family (MMC, SD ver 1,
//! SD ver 2, SDHC), decodes the CSD and CID registers and reads 512-byte
//! sectors.
//!
//! ## Features
//!
//! * `log` (default): log through the `log` crate.
//! * `defmt`: log through `defmt` instead, when `log` is disabled.

#![cfg_attr(not(test), no_std)]

mod fmt;

mod block;
mod cid;
mod command;
mod config;
mod consts;
mod control;
mod crc;
mod csd;
mod register;
mod response;
mod select;
mod session;
#[cfg(test)]
mod testutil;

pub use crate::{
    block::BlockError,
    cid::{Cid, CidData, CidRegister},
    command::{command_frame, is_app_command, response_kind, FRAME_LEN},
    config::{DefaultSdMmcSpiConfig, SdMmcSpiConfig},
    consts::{arguments, commands, tokens, BLOCK_SIZE},
    control::{Control, Outcome, PowerCtrl},
    crc::{crc16, crc16_ccitt, crc16_with_seed, crc7, frame_checksum},
    csd::{fields as csd_fields, CapacityProvider, CardGeometry, Csd, CsdData},
    register::{unpack, RegisterData, RegisterImage, RegisterSlice},
    response::{IfCond, Ocr, R1Response, R2Status, Response, ResponseKind},
    select::{ChipSelect, SelectError},
    session::{CardSession, CardState, CardType},
};
pub use diskio::{
    BlockSize, DiskioDevice, Error as DiskioError, IoctlCmd, Lba, Status, StatusFlag,
};

use crate::consts::BLOCK_SIZE_U64;

use core::{
    cell::{Cell, RefCell},
    marker::PhantomData,
};
use embedded_hal::blocking::spi::Transfer;
use switch_hal::OutputSwitch;

/// [`SdMmcSpi`] result error.
///
/// `T` - transport error type.
/// `S` - select switch type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<T, S> {
    /// Error from the SPI peripheral.
    Transport(T),
    /// Couldn't set a select.
    SelectError(S),
    /// A command chain is already nested as deep as allowed.
    Busy,
    /// Failed to enable CRC checking on the card.
    CantEnableCRC,
    /// No response when reading data from the card.
    TimeoutReadBuffer,
    /// No response when waiting for the card to not be busy.
    TimeoutWaitAvailable,
    /// No response when executing this command.
    TimeoutCommand(u8),
    /// The card answered this command with error bits set.
    Rejected(u8, R1Response),
    /// The card answered this command with a well formed but unexpected response.
    UnexpectedResponse(u8, R1Response),
    /// SEND_IF_COND echoed a wrong check pattern.
    IfCondMismatch(u8),
    /// The card never left idle state within the retry budget of this command.
    NegotiationExhausted(u8),
    /// The card sent a data error token instead of a data block.
    ErrorToken(u8),
    /// CRC mismatch (card, host).
    CrcError(u16, u16),
    /// CSD structure version this crate can't decode.
    UnsupportedCsd(u8),
    /// Can't perform this operation with the card in this state.
    BadState,
    /// Buffer or address out of range.
    InvalidArgument,
    /// The card is write protected.
    WriteProtected,
    /// Operation is not implemented.
    Unsupported,
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorKind {
    /// Protocol or transport failure.
    Error,
    /// Reentrant use of the command chain.
    Busy,
    /// A polling budget ran out.
    Timeout,
}

impl<T, S> Error<T, S> {
    /// Coarse classification of the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Busy => ErrorKind::Busy,
            Error::TimeoutReadBuffer | Error::TimeoutWaitAvailable | Error::TimeoutCommand(_) => {
                ErrorKind::Timeout
            }
            _ => ErrorKind::Error,
        }
    }

    /// Result code reported to the block device layer.
    pub fn outcome(&self) -> Outcome {
        match self {
            Error::BadState => Outcome::NotReady,
            Error::InvalidArgument | Error::Unsupported => Outcome::InvalidParameter,
            Error::WriteProtected => Outcome::WriteProtected,
            _ => Outcome::IoError,
        }
    }
}

impl<T, S> From<SelectError<S>> for Error<T, S> {
    fn from(err: SelectError<S>) -> Self {
        match err {
            SelectError::Busy => Error::Busy,
            SelectError::Switch(err) => Error::SelectError(err),
        }
    }
}

impl<T, S> From<BlockError<T>> for Error<T, S> {
    fn from(err: BlockError<T>) -> Self {
        match err {
            BlockError::Transport(err) => Error::Transport(err),
            BlockError::Timeout => Error::TimeoutReadBuffer,
            BlockError::ErrorToken(token) => Error::ErrorToken(token),
            BlockError::Crc(card, host) => Error::CrcError(card, host),
        }
    }
}

/// Error type alias.
type ErrorFor<T> = <T as DiskioDevice>::HardwareError;

/// SD Card SPI driver.
///
/// `Spi` - SPI.
/// `Cs` - Chip select output switch.
/// `Config` - Config implementation of driver config trait.
pub struct SdMmcSpi<Spi: Transfer<u8>, Cs: OutputSwitch, Config: SdMmcSpiConfig> {
    spi: RefCell<Spi>,
    cs: RefCell<ChipSelect<Cs>>,
    session: CardSession,
    response: Cell<Option<Response>>,
    error_token: Cell<Option<u8>>,
    config: PhantomData<Config>,
}

impl<Spi: Transfer<u8>, Cs: OutputSwitch, Config: SdMmcSpiConfig> SdMmcSpi<Spi, Cs, Config>
where
    Spi::Error: core::fmt::Debug,
    Cs::Error: core::fmt::Debug,
{
    /// Creates a new [`SdMmcSpi<Spi, Cs, Config>`].
    ///
    /// `spi` - SPI instance.
    /// `cs` - chip select output switch.
    pub fn new(spi: Spi, cs: Cs) -> Self {
        SdMmcSpi {
            spi: RefCell::new(spi),
            cs: RefCell::new(ChipSelect::new(cs)),
            session: CardSession::default(),
            response: Cell::new(None),
            error_token: Cell::new(None),
            config: PhantomData::<Config>,
        }
    }

    /// Give back the SPI and the chip select switch.
    pub fn release(self) -> (Spi, Cs) {
        (self.spi.into_inner(), self.cs.into_inner().into_inner())
    }

    /// Session data gathered so far.
    pub fn session(&self) -> &CardSession {
        &self.session
    }

    /// Current lifecycle state.
    pub fn state(&self) -> CardState {
        self.session.state
    }

    /// Response to the last command that got one.
    pub fn last_response(&self) -> Option<Response> {
        self.response.get()
    }

    /// Last data error token sent by the card.
    pub fn error_token(&self) -> Option<u8> {
        self.error_token.get()
    }

    /// Nesting depth of the chip select.
    pub fn select_depth(&self) -> u8 {
        self.cs.borrow().depth()
    }

    /// Return the session to [`CardState::Reset`], dropping everything learned.
    pub fn reset_session(&mut self) {
        info!("SD reset invoked");
        self.session = CardSession::default();
        self.response.set(None);
        self.error_token.set(None);

        if self.cs.get_mut().release().is_err() {
            warn!("SD select release failed on reset");
        }
    }

    /// Validate buffer for read/write.
    fn validate_buffer_len(buf_len: usize) -> Result<(), ErrorFor<Self>> {
        if buf_len == 0 || buf_len % BLOCK_SIZE != 0 {
            error!(
                "SD invalid buffer, length: {}, block size: {}",
                buf_len, BLOCK_SIZE
            );
            Err(Error::InvalidArgument)
        } else {
            Ok(())
        }
    }

    /// Validate ready.
    fn validate_ready(&self) -> Result<&CardGeometry, ErrorFor<Self>> {
        self.session.geometry().ok_or(Error::BadState)
    }

    /// Delay.
    fn delay() {
        for i in 0..Config::DELAY_DUMMY_CYCLES {
            unsafe { core::ptr::read_volatile(&i) };
        }
    }

    /// Enter a select span.
    fn select(&self) -> Result<(), ErrorFor<Self>> {
        self.cs.borrow_mut().select().map_err(Error::from)
    }

    /// Leave a select span.
    fn deselect(&self) -> Result<(), ErrorFor<Self>> {
        self.cs.borrow_mut().deselect().map_err(Error::SelectError)
    }

    /// CS scope, the span is left on every exit path.
    fn cs_scope<R, F>(&self, f: F) -> Result<R, ErrorFor<Self>>
    where
        F: FnOnce(&Self) -> Result<R, ErrorFor<Self>>,
    {
        self.select()?;
        let result = f(self);
        let released = self.deselect();

        let value = result?;
        released?;

        Ok(value)
    }

    /// Send one byte and receive one byte.
    fn transfer(&self, data: u8) -> Result<u8, ErrorFor<Self>> {
        self.spi
            .borrow_mut()
            .transfer(&mut [data])
            .map(|b| b[0])
            .map_err(Error::Transport)
    }

    /// Receive a byte from the SD card by clocking in an 0xFF byte.
    fn receive(&self) -> Result<u8, ErrorFor<Self>> {
        self.transfer(tokens::AVAILABLE)
    }

    /// Send a byte to the SD card.
    fn send(&self, data: u8) -> Result<(), ErrorFor<Self>> {
        self.transfer(data).map(|_| ())
    }

    /// Send a slice to the SD card.
    fn send_slice(&self, data: &[u8]) -> Result<(), ErrorFor<Self>> {
        for byte in data.iter() {
            self.send(*byte)?;
        }

        Ok(())
    }

    /// Wait for token.
    fn wait_for_token<F: Fn(u8) -> bool>(
        &self,
        token_validator: F,
        error: ErrorFor<Self>,
    ) -> Result<u8, ErrorFor<Self>> {
        for _ in 0..Config::WAIT_AVAILABLE_ATTEMPTS {
            let token = self.receive()?;

            if token_validator(token) {
                return Ok(token);
            }

            Self::delay();
        }

        Err(error)
    }

    /// Wait available state of card.
    fn wait_available_state(&self) -> Result<(), ErrorFor<Self>> {
        self.wait_for_token(
            |token| token == tokens::AVAILABLE,
            Error::TimeoutWaitAvailable,
        )
        .map(|_| ())
    }

    /// Poll for the R1 byte, the first one with a cleared start bit.
    fn read_r1(&self, cmd: u8) -> Result<R1Response, ErrorFor<Self>> {
        for _ in 0..Config::READ_R1_ATTEMPTS {
            let r1 = R1Response(self.receive()?);

            if r1.is_valid() {
                return Ok(r1);
            }
        }

        Err(Error::TimeoutCommand(cmd))
    }

    /// Send command implementation, chip select already taken.
    fn send_command_impl(&self, cmd: u8, arg: u32) -> Result<Response, ErrorFor<Self>> {
        if is_app_command(cmd) {
            self.send_command(commands::CMD55, 0x0000_0000)?;
        }

        self.wait_available_state()?;
        self.send_slice(&command_frame(cmd & !commands::ACMD_FLAG, arg))?;

        let r1 = self.read_r1(cmd)?;
        let kind = response_kind(cmd);
        let mut tail = [0u8; 4];
        for byte in tail.iter_mut().take(kind.tail_len()) {
            *byte = self.receive()?;
        }

        let response = Response::assemble(kind, r1, tail);
        self.response.set(Some(response));

        if r1.has_error() {
            debug!(
                "CMD{} rejected: 0x{:02X}",
                commands::number(cmd),
                r1.0
            );
            return Err(Error::Rejected(cmd, r1));
        }

        trace!("CMD{} response: 0x{:02X}", commands::number(cmd), r1.0);

        Ok(response)
    }

    /// Send command.
    ///
    /// Application commands are prefixed with `APP_CMD` in the same select
    /// span. Fails with [`Error::Busy`] when the select is already nested
    /// twice.
    pub fn send_command(&self, cmd: u8, arg: u32) -> Result<Response, ErrorFor<Self>> {
        self.cs_scope(|s| s.send_command_impl(cmd, arg))
    }

    /// Read data.
    fn read_data(&self, data: &mut [u8]) -> Result<(), ErrorFor<Self>> {
        block::read_block::<Spi, Config>(&mut *self.spi.borrow_mut(), data).map_err(|err| {
            if let BlockError::ErrorToken(token) = err {
                self.error_token.set(Some(token));
            }
            Error::from(err)
        })
    }

    /// Read a 16-byte register with a data block command.
    fn read_register(&self, cmd: u8) -> Result<RegisterData, ErrorFor<Self>> {
        let mut data = RegisterData::default();

        self.cs_scope(|s| {
            s.send_command(cmd, 0x0000_0000)?;
            s.read_data(&mut data)
        })?;

        Ok(data)
    }

    /// Clock the synchronization preamble with the card deselected.
    fn clock_preamble(&self) -> Result<(), ErrorFor<Self>> {
        self.cs.borrow_mut().release().map_err(Error::SelectError)?;

        for _ in 0..Config::INIT_CLOCK_BYTES {
            self.send(tokens::AVAILABLE)?;
        }

        Ok(())
    }

    /// Enter SD to SPI mode.
    fn go_idle(&self) -> Result<(), ErrorFor<Self>> {
        info!("Enter to SPI mode for SD");

        let r1 = self.send_command(commands::CMD0, 0x0000_0000)?.r1();
        if r1 != R1Response::IN_IDLE_STATE {
            warn!(
                "Wrong response from CMD{}: 0x{:02X}",
                commands::number(commands::CMD0),
                r1.0
            );
            return Err(Error::UnexpectedResponse(commands::CMD0, r1));
        }

        Ok(())
    }

    /// Enable CRC.
    fn enable_crc(&self) -> Result<(), ErrorFor<Self>> {
        info!("Enabling CRC for SD");

        match self.send_command(commands::CMD59, arguments::CRC_ON) {
            Ok(_) => Ok(()),
            Err(Error::Rejected(..)) => Err(Error::CantEnableCRC),
            Err(err) => Err(err),
        }
    }

    /// Verify SD Memory Card interface operating condition.
    ///
    /// Returns whether the card is SD ver 2 or later.
    fn send_if_cond(&self) -> Result<bool, ErrorFor<Self>> {
        info!("Verifing SD Memory Card interface operating condition");

        match self.send_command(commands::CMD8, arguments::IF_COND) {
            Ok(Response::R7(_, if_cond)) => {
                if if_cond.check_pattern() != tokens::IF_COND_CHECK_PATTERN {
                    warn!("Wrong check pattern: 0x{:02X}", if_cond.check_pattern());
                    return Err(Error::IfCondMismatch(if_cond.check_pattern()));
                }
                Ok(true)
            }
            Ok(response) => Err(Error::UnexpectedResponse(commands::CMD8, response.r1())),
            Err(Error::Rejected(..)) | Err(Error::TimeoutCommand(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Repeat an operating-conditions command until the card leaves idle state.
    fn wait_op_cond(&self, cmd: u8, arg: u32) -> Result<(), ErrorFor<Self>> {
        for attempt in 0..Config::MAX_RETRY {
            if !self.send_command(cmd, arg)?.r1().in_idle_state() {
                debug!(
                    "CMD{} ready after {} attempts",
                    commands::number(cmd),
                    attempt + 1
                );
                return Ok(());
            }

            Self::delay();
        }

        Err(Error::NegotiationExhausted(cmd))
    }

    /// Negotiate a SD ver 2 card and read its OCR.
    fn init_v2(&self) -> Result<(CardType, Ocr), ErrorFor<Self>> {
        info!("Sending host capacity support information and activates");
        self.wait_op_cond(commands::ACMD41, arguments::HCS)?;

        let ocr = match self.send_command(commands::CMD58, 0x0000_0000)? {
            Response::R3(_, ocr) => ocr,
            response => return Err(Error::UnexpectedResponse(commands::CMD58, response.r1())),
        };

        let card_type = if ocr.card_capacity_status() {
            CardType::SDHC
        } else {
            CardType::SD2
        };

        Ok((card_type, ocr))
    }

    /// Negotiate a SD ver 1 card, falling back to MMC.
    fn init_legacy(&self) -> Result<CardType, ErrorFor<Self>> {
        info!("Checking SD ver 1");

        match self.wait_op_cond(commands::ACMD41, 0x0000_0000) {
            Ok(()) => return Ok(CardType::SD1),
            Err(Error::Rejected(..))
            | Err(Error::TimeoutCommand(_))
            | Err(Error::NegotiationExhausted(_)) => {}
            Err(err) => return Err(err),
        }

        info!("Not a SD card, checking MMC");
        self.wait_op_cond(commands::CMD1, 0x0000_0000)?;

        Ok(CardType::MMC)
    }

    /// Card detection and register readout, everything after `Busy`.
    fn negotiate(&mut self) -> Result<CardGeometry, ErrorFor<Self>> {
        self.go_idle()?;

        if Config::ENABLE_CRC {
            self.enable_crc()?;
        }

        let card_type = if self.send_if_cond()? {
            let (card_type, ocr) = self.init_v2()?;
            self.session.ocr = ocr;
            card_type
        } else {
            self.init_legacy()?
        };

        self.session.card_type = card_type;
        info!("SD card type: {:?}", card_type);

        if !card_type.is_block_addressed() {
            self.send_command(commands::CMD16, BLOCK_SIZE as u32)?;
        }

        let csd = Csd::from_wire(self.read_register(commands::CMD9)?);
        self.session.csd = Some(csd);

        let cid = Cid::from_wire(self.read_register(commands::CMD10)?);
        self.session.cid = Some(cid);

        let geometry = csd
            .geometry(card_type)
            .ok_or(Error::UnsupportedCsd(csd.structure()))?;
        self.session.geometry = Some(geometry);

        Ok(geometry)
    }

    /// Initialize SD.
    ///
    /// Runs the negotiation only from [`CardState::Reset`]; in any other
    /// state the current state is returned untouched.
    pub fn init(&mut self) -> Result<CardState, ErrorFor<Self>> {
        if self.session.state != CardState::Reset {
            warn!("SD already is initialized, state: {:?}", self.session.state);
            return Ok(self.session.state);
        }

        info!("SD initialize started");
        self.session.state = CardState::Busy;

        if let Err(err) = self.clock_preamble() {
            error!("Failed to clock SD preamble");
            self.session.state = CardState::Reset;
            return Err(err);
        }

        match self.negotiate() {
            Ok(geometry) => {
                info!(
                    "SD successfully initialized, version: {:?}, capacity: {} bytes",
                    self.session.card_type,
                    geometry.capacity_bytes
                );
                self.session.state = CardState::Ready;
                Ok(CardState::Ready)
            }
            Err(err) => {
                error!("Failed to initialize SD: {:?}", err.kind());
                self.session.state = CardState::Error;
                Err(err)
            }
        }
    }

    /// Read whole 512-byte sectors starting at `sector`.
    pub fn read_blocks(&self, buf: &mut [u8], sector: u64) -> Result<(), ErrorFor<Self>> {
        Self::validate_buffer_len(buf.len())?;
        let geometry = self.validate_ready()?;

        let count = (buf.len() / BLOCK_SIZE) as u64;
        match sector.checked_add(count) {
            Some(end) if end <= geometry.card_capacity_blocks() => {}
            _ => return Err(Error::InvalidArgument),
        }

        for (sector, chunk) in (sector..).zip(buf.chunks_mut(BLOCK_SIZE)) {
            let address = self
                .session
                .address(sector, BLOCK_SIZE_U64)
                .ok_or(Error::InvalidArgument)?;

            self.cs_scope(|s| {
                s.send_command(commands::CMD17, address)?;
                s.read_data(chunk)
            })?;
        }

        Ok(())
    }

    /// Write whole 512-byte sectors starting at `sector`. Not implemented.
    pub fn write_blocks(&self, buf: &[u8], _sector: u64) -> Result<(), ErrorFor<Self>> {
        Self::validate_buffer_len(buf.len())?;
        self.validate_ready()?;

        match self.session.csd() {
            Some(csd) if csd.write_protected() => Err(Error::WriteProtected),
            _ => Err(Error::Unsupported),
        }
    }

    /// Read the SD status block; `APP_CMD` is sent by hand because the data
    /// phase already holds one select level.
    fn read_sd_status(&self, buf: &mut [u8; 64]) -> Result<(), ErrorFor<Self>> {
        if !self.session.card_type.is_sd() {
            return Err(Error::InvalidArgument);
        }

        self.cs_scope(|s| {
            s.send_command(commands::CMD55, 0x0000_0000)?;
            s.send_command(commands::ACMD13 & !commands::ACMD_FLAG, 0x0000_0000)?;
            s.read_data(buf)
        })
    }

    fn try_control(&self, ctrl: Control) -> Result<(), ErrorFor<Self>> {
        if let Control::Power(request) = ctrl {
            debug!("SD power control ignored: {:?}", request);
            return Ok(());
        }

        let geometry = self.validate_ready()?;

        match ctrl {
            Control::Sync => self.cs_scope(|s| s.wait_available_state()),
            Control::GetSectorCount(count) => {
                *count = geometry.card_capacity_blocks();
                Ok(())
            }
            Control::GetSectorSize(size) => {
                *size = BLOCK_SIZE;
                Ok(())
            }
            Control::GetBlockSize(size) => {
                let bytes = geometry.sector_length * geometry.block_length_write;
                *size = (bytes / BLOCK_SIZE as u32).max(1);
                Ok(())
            }
            Control::GetCardType(card_type) => {
                *card_type = self.session.card_type;
                Ok(())
            }
            Control::GetCsd(data) => {
                let csd = self.session.csd().ok_or(Error::BadState)?;
                *data = *csd.raw();
                Ok(())
            }
            Control::GetCid(data) => {
                let cid = self.session.cid().ok_or(Error::BadState)?;
                *data = *cid.raw();
                Ok(())
            }
            Control::GetOcr(data) => {
                *data = self.session.ocr.0.to_be_bytes();
                Ok(())
            }
            Control::GetSdStatus(buf) => self.read_sd_status(buf),
            Control::Power(_) => Ok(()),
        }
    }

    /// Control and information requests.
    pub fn control(&self, ctrl: Control) -> Outcome {
        match self.try_control(ctrl) {
            Ok(()) => Outcome::Ok,
            Err(err) => {
                warn!("SD control failed: {:?}", err.kind());
                err.outcome()
            }
        }
    }

    /// Answer a `diskio` request through the control selector.
    fn try_ioctl(&self, cmd: IoctlCmd) -> Result<(), ErrorFor<Self>> {
        match cmd {
            IoctlCmd::CtrlSync => self.try_control(Control::Sync),
            IoctlCmd::GetSectorCount(count) => {
                let mut sectors = 0u64;
                self.try_control(Control::GetSectorCount(&mut sectors))?;
                *count = sectors as _;
                Ok(())
            }
            IoctlCmd::GetSectorSize(size) => {
                let mut sector_size = 0usize;
                self.try_control(Control::GetSectorSize(&mut sector_size))?;
                *size = sector_size as _;
                Ok(())
            }
            IoctlCmd::GetBlockSize(size) => {
                let mut block_size = 0u32;
                self.try_control(Control::GetBlockSize(&mut block_size))?;
                *size = block_size as usize;
                Ok(())
            }
            _ => Err(Error::Unsupported),
        }
    }

    /// Map onto the `diskio` error, keeping hardware details.
    fn to_diskio(err: ErrorFor<Self>) -> DiskioError<ErrorFor<Self>> {
        match err {
            Error::InvalidArgument => DiskioError::InvalidArgument,
            Error::BadState => DiskioError::NotInitialized,
            Error::Unsupported => DiskioError::NotSupported,
            err => DiskioError::Hardware(err),
        }
    }
}

impl<Spi: Transfer<u8>, Cs: OutputSwitch, Config: SdMmcSpiConfig> DiskioDevice
    for SdMmcSpi<Spi, Cs, Config>
where
    Spi::Error: core::fmt::Debug,
    Cs::Error: core::fmt::Debug,
{
    type HardwareError = Error<Spi::Error, Cs::Error>;

    fn status(&self) -> Status {
        match self.session.state {
            CardState::Ready => match self.session.csd() {
                Some(csd) if csd.write_protected() => StatusFlag::WriteProtected.into(),
                _ => Status::empty(),
            },
            CardState::Error => StatusFlag::ErrorOccured | StatusFlag::NotInitialized,
            CardState::Reset | CardState::Busy => StatusFlag::NotInitialized.into(),
        }
    }

    fn reset(&mut self) {
        self.reset_session();
    }

    fn initialize(&mut self) -> Result<(), DiskioError<Self::HardwareError>> {
        if self.session.state != CardState::Reset {
            warn!("SD already is initialized");
            return Err(DiskioError::AlreadyInitialized);
        }

        self.init().map(|_| ()).map_err(DiskioError::Hardware)
    }

    fn read(&self, buf: &mut [u8], lba: Lba) -> Result<(), DiskioError<Self::HardwareError>> {
        self.read_blocks(buf, lba as u64).map_err(Self::to_diskio)
    }

    fn write(&self, buf: &[u8], lba: Lba) -> Result<(), DiskioError<Self::HardwareError>> {
        self.write_blocks(buf, lba as u64).map_err(Self::to_diskio)
    }

    fn ioctl(&self, cmd: IoctlCmd) -> Result<(), DiskioError<Self::HardwareError>> {
        self.try_ioctl(cmd).map_err(Self::to_diskio)
    }
}

//! Emulated SD/MMC card behind a SPI bus and a chip select switch.

#![allow(dead_code)]

use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use embedded_hal::blocking::spi::Transfer;
use hex_literal::hex;
use sdmmc_spi_engine::{SdMmcSpi, SdMmcSpiConfig};
use switch_hal::OutputSwitch;

/// SDHC card, CSD structure 2.0, 3_947_888_640 bytes.
pub const CSD_V2: [u8; 16] = hex!("40 0E 00 32 5B 59 00 00 1D 69 7F 80 0A 40 00 8B");
/// Standard capacity card, CSD structure 1.0, 1_015_808_000 bytes.
pub const CSD_V1: [u8; 16] = hex!("00 26 00 32 5F 59 83 C8 AD DB CF FF D2 40 40 A5");
/// SanDisk "SU08G".
pub const CID: [u8; 16] = hex!("03 53 44 53 55 30 38 47 80 12 34 56 78 00 C2 E5");

pub const OCR_SDHC: u32 = 0xC0FF_8000;
pub const OCR_SD2: u32 = 0x80FF_8000;

/// Card family the emulator pretends to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// Never answers.
    Absent,
    Mmc,
    Sd1,
    Sd2,
}

pub struct Card {
    pub family: Family,
    /// Answer to GO_IDLE_STATE.
    pub go_idle_r1: u8,
    /// Busy answers before an operating-conditions command succeeds, `None` never.
    pub busy_polls: Option<usize>,
    /// Busy answers to the MMC SEND_OP_COND, `None` never.
    pub mmc_busy_polls: Option<usize>,
    pub ocr: u32,
    pub if_cond_echo: Option<u8>,
    pub csd: [u8; 16],
    pub cid: [u8; 16],
    /// Data error token answered instead of this command's data block.
    pub error_token: Option<(u8, u8)>,
    /// Corrupt the CRC of this command's data block.
    pub bad_crc: Option<u8>,

    /// Every frame received, as (command number, argument).
    pub commands: Vec<(u8, u32)>,
    pub selected: bool,
    pub select_edges: usize,
    /// Bytes clocked while deselected.
    pub idle_clocks: usize,

    idle: bool,
    app_cmd: bool,
    crc_on: bool,
    frame: Vec<u8>,
    out: VecDeque<u8>,
}

impl Card {
    pub fn new(family: Family) -> Self {
        let (ocr, csd) = match family {
            Family::Sd2 => (OCR_SDHC, CSD_V2),
            _ => (0, CSD_V1),
        };

        Card {
            family,
            go_idle_r1: 0x01,
            busy_polls: Some(2),
            mmc_busy_polls: Some(2),
            ocr,
            if_cond_echo: None,
            csd,
            cid: CID,
            error_token: None,
            bad_crc: None,
            commands: Vec::new(),
            selected: false,
            select_edges: 0,
            idle_clocks: 0,
            idle: false,
            app_cmd: false,
            crc_on: false,
            frame: Vec::new(),
            out: VecDeque::new(),
        }
    }

    /// Commands received, numbers only.
    pub fn command_numbers(&self) -> Vec<u8> {
        self.commands.iter().map(|(cmd, _)| *cmd).collect()
    }

    pub fn count(&self, cmd: u8) -> usize {
        self.commands.iter().filter(|(c, _)| *c == cmd).count()
    }

    fn exchange(&mut self, byte: u8) -> u8 {
        if !self.selected {
            self.idle_clocks += 1;
            return 0xFF;
        }

        let out = self.out.pop_front().unwrap_or(0xFF);

        if self.frame.is_empty() && (byte & 0xC0) != 0x40 {
            return out;
        }

        self.frame.push(byte);
        if self.frame.len() == 6 {
            let frame = core::mem::take(&mut self.frame);
            self.on_frame(&frame);
        }

        out
    }

    fn r1(&self) -> u8 {
        u8::from(self.idle)
    }

    fn respond(&mut self, bytes: &[u8]) {
        // One byte of command response time.
        self.out.push_back(0xFF);
        self.out.extend(bytes.iter().copied());
    }

    fn data_block(&mut self, cmd: u8, payload: &[u8]) {
        if let Some((token_cmd, token)) = self.error_token {
            if token_cmd == cmd {
                self.out.extend([0xFF, token]);
                return;
            }
        }

        let mut crc = crc16(payload);
        if self.bad_crc == Some(cmd) {
            crc ^= 0xFFFF;
        }

        self.out.extend([0xFF, 0xFF, 0xFE]);
        self.out.extend(payload.iter().copied());
        self.out.extend(crc.to_be_bytes());
    }

    fn on_frame(&mut self, frame: &[u8]) {
        let cmd = frame[0] & 0x3F;
        let arg = u32::from_be_bytes([frame[1], frame[2], frame[3], frame[4]]);
        self.commands.push((cmd, arg));

        if self.family == Family::Absent {
            return;
        }

        let crc_checked = self.crc_on || cmd == 0 || cmd == 8;
        if (frame[5] & 0x01) == 0 || (crc_checked && frame[5] != (crc7(&frame[..5]) << 1 | 1)) {
            self.respond(&[self.r1() | 0x08]);
            return;
        }

        let app_cmd = core::mem::replace(&mut self.app_cmd, false);

        match (cmd, app_cmd) {
            (0, _) => {
                self.idle = true;
                self.crc_on = false;
                self.respond(&[self.go_idle_r1]);
            }
            (1, _) if self.family == Family::Mmc => {
                self.op_cond(true);
            }
            (8, _) if self.family == Family::Sd2 => {
                let echo = self.if_cond_echo.unwrap_or(arg as u8);
                self.respond(&[self.r1(), 0x00, 0x00, ((arg >> 8) & 0x0F) as u8, echo]);
            }
            (9, _) => {
                self.respond(&[self.r1()]);
                let csd = self.csd;
                self.data_block(9, &csd);
            }
            (10, _) => {
                self.respond(&[self.r1()]);
                let cid = self.cid;
                self.data_block(10, &cid);
            }
            (13, true) => {
                self.respond(&[self.r1(), 0x00]);
                let status: Vec<u8> = (0..64u8).collect();
                self.data_block(13, &status);
            }
            (16, _) => self.respond(&[self.r1()]),
            (17, _) => {
                self.respond(&[self.r1()]);
                let sector = if self.ocr & 0x4000_0000 != 0 {
                    arg
                } else {
                    arg / 512
                };
                let payload = sector_payload(sector);
                self.data_block(17, &payload);
            }
            (41, true) => self.op_cond(false),
            (55, _) if self.family != Family::Mmc => {
                self.app_cmd = true;
                self.respond(&[self.r1()]);
            }
            (58, _) => {
                let ocr = self.ocr.to_be_bytes();
                self.respond(&[self.r1(), ocr[0], ocr[1], ocr[2], ocr[3]]);
            }
            (59, _) => {
                self.crc_on = arg & 1 != 0;
                self.respond(&[self.r1()]);
            }
            _ => self.respond(&[self.r1() | 0x04]),
        }
    }

    fn op_cond(&mut self, mmc: bool) {
        let polls = if mmc {
            &mut self.mmc_busy_polls
        } else {
            &mut self.busy_polls
        };

        match polls {
            Some(0) => self.idle = false,
            Some(left) => *left -= 1,
            None => {}
        }

        self.respond(&[self.r1()]);
    }
}

/// Content of a sector as served by the emulator.
pub fn sector_payload(sector: u32) -> Vec<u8> {
    (0..512u32)
        .map(|i| (sector.wrapping_mul(31) ^ i) as u8)
        .collect()
}

fn crc7(data: &[u8]) -> u8 {
    let mut crc = 0u8;
    for &byte in data {
        for bit in (0..8).rev() {
            let feedback = ((byte >> bit) & 1) ^ ((crc >> 6) & 1);
            crc = (crc << 1) & 0x7F;
            if feedback != 0 {
                crc ^= 0x09;
            }
        }
    }
    crc
}

fn crc16(data: &[u8]) -> u16 {
    let mut crc = 0u16;
    for &byte in data {
        crc ^= u16::from(byte) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x1021
            } else {
                crc << 1
            };
        }
    }
    crc
}

pub type Shared = Rc<RefCell<Card>>;

pub struct FakeSpi(pub Shared);

impl Transfer<u8> for FakeSpi {
    type Error = ();

    fn transfer<'w>(&mut self, words: &'w mut [u8]) -> Result<&'w [u8], ()> {
        let mut card = self.0.borrow_mut();
        for word in words.iter_mut() {
            *word = card.exchange(*word);
        }

        Ok(words)
    }
}

pub struct FakeCs(pub Shared);

impl OutputSwitch for FakeCs {
    type Error = ();

    fn on(&mut self) -> Result<(), ()> {
        let mut card = self.0.borrow_mut();
        if !card.selected {
            card.select_edges += 1;
        }
        card.selected = true;
        Ok(())
    }

    fn off(&mut self) -> Result<(), ()> {
        self.0.borrow_mut().selected = false;
        Ok(())
    }
}

pub struct TestConfig;

impl SdMmcSpiConfig for TestConfig {
    const MAX_RETRY: usize = 8;
    const READ_R1_ATTEMPTS: usize = 8;
    const START_TOKEN_ATTEMPTS: usize = 64;
    const WAIT_AVAILABLE_ATTEMPTS: usize = 64;
    const INIT_CLOCK_BYTES: usize = 10;
    const DELAY_DUMMY_CYCLES: usize = 0;
    const BURST_SIZE: usize = 16;
    const ENABLE_CRC: bool = true;
}

pub type Driver = SdMmcSpi<FakeSpi, FakeCs, TestConfig>;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Driver wired to `card`, plus a handle to inspect the card.
pub fn driver(card: Card) -> (Driver, Shared) {
    init_logger();
    let shared = Rc::new(RefCell::new(card));
    let sd = SdMmcSpi::new(FakeSpi(shared.clone()), FakeCs(shared.clone()));
    (sd, shared)
}

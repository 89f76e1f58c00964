//! Test doubles for the SPI bus and the chip select line.

use std::{collections::VecDeque, vec::Vec};

use embedded_hal::blocking::spi::Transfer;
use switch_hal::OutputSwitch;

/// SPI bus answering from a queue, `0xFF` once the queue runs dry.
#[derive(Default)]
pub struct ScriptedSpi {
    rx: VecDeque<u8>,
    /// Every byte the host clocked out.
    pub sent: Vec<u8>,
    /// Fail every transfer once this many bytes went through.
    pub fail_after: Option<usize>,
}

impl ScriptedSpi {
    pub fn queue(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }

    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    pub fn is_drained(&self) -> bool {
        self.rx.is_empty()
    }
}

impl Transfer<u8> for ScriptedSpi {
    type Error = ();

    fn transfer<'w>(&mut self, words: &'w mut [u8]) -> Result<&'w [u8], ()> {
        for word in words.iter_mut() {
            if self.fail_after.map_or(false, |limit| self.sent.len() >= limit) {
                return Err(());
            }
            self.sent.push(*word);
            *word = self.rx.pop_front().unwrap_or(0xFF);
        }

        Ok(words)
    }
}

/// Select switch recording every level change.
#[derive(Default)]
pub struct SwitchLog {
    pub on: bool,
    pub transitions: Vec<bool>,
    pub fail: bool,
}

impl OutputSwitch for SwitchLog {
    type Error = ();

    fn on(&mut self) -> Result<(), ()> {
        if self.fail {
            return Err(());
        }
        self.on = true;
        self.transitions.push(true);
        Ok(())
    }

    fn off(&mut self) -> Result<(), ()> {
        if self.fail {
            return Err(());
        }
        self.on = false;
        self.transitions.push(false);
        Ok(())
    }
}

use crate::register::RegisterData;

use bitfield::bitfield;

/// Card Identification block.
pub type CidData = RegisterData;

bitfield! {
    /// Card Identification register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CidRegister(u128);
    pub u8, manufacturer_id, _: 127, 120;
    pub u16, oem_id, _: 119, 104;
    pub u64, product_name, _: 103, 64;
    pub u8, product_revision, _: 63, 56;
    pub u32, serial_number, _: 55, 24;
    pub u8, manufacturing_year, _: 19, 12;
    pub u8, manufacturing_month, _: 11, 8;
    pub u8, crc, _: 7, 1;
}

/// Card Identification, raw bytes plus decoded view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cid {
    raw: CidData,
    register: CidRegister,
}

impl Cid {
    /// Wrap a register as clocked out by the card.
    pub fn from_wire(raw: CidData) -> Self {
        Cid {
            raw,
            register: CidRegister(u128::from_be_bytes(raw)),
        }
    }

    /// Register bytes in wire order.
    pub fn raw(&self) -> &CidData {
        &self.raw
    }

    /// Decoded fields.
    pub fn register(&self) -> &CidRegister {
        &self.register
    }

    /// Product name as five ASCII characters.
    pub fn product_name(&self) -> [u8; 5] {
        let name = self.register.product_name().to_be_bytes();
        [name[3], name[4], name[5], name[6], name[7]]
    }

    /// Manufacturing year and month; SD counts years from 2000.
    pub fn manufacturing_date(&self) -> (u16, u8) {
        (
            2000 + u16::from(self.register.manufacturing_year()),
            self.register.manufacturing_month(),
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Cid {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "Cid mid={=u8:#x} psn={=u32:#x}",
            self.register.manufacturer_id(),
            self.register.serial_number()
        )
    }
}

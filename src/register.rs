//! Bit slice access to the 128-bit card registers (CSD, CID).
//!
//! The card clocks a register out most significant byte first. After the
//! byte order is reversed the image is addressed like a little-endian
//! integer: bit `n` of the register lives in byte `n / 8`, bit `n % 8`.

/// Raw 16-byte register as received from the card.
pub type RegisterData = [u8; 16];

/// A contiguous `(offset, width)` bit field of a 128-bit register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterSlice {
    /// Index of the least significant bit of the field.
    pub offset: u8,
    /// Width in bits, at most 32.
    pub width: u8,
}

impl RegisterSlice {
    /// Field spanning `msb..=lsb`, the notation of the card register tables.
    pub const fn bits(msb: u8, lsb: u8) -> Self {
        RegisterSlice {
            offset: lsb,
            width: msb - lsb + 1,
        }
    }

    /// Single bit field.
    pub const fn bit(bit: u8) -> Self {
        RegisterSlice {
            offset: bit,
            width: 1,
        }
    }
}

/// Byte-order corrected register image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterImage(pub RegisterData);

impl RegisterImage {
    /// Convert the wire order image into the addressable one.
    pub fn from_wire(data: &RegisterData) -> Self {
        // One 128-bit swap: word order reversed and bytes swapped in each word.
        RegisterImage(u128::from_be_bytes(*data).to_le_bytes())
    }

    /// Extract a field described by `slice`.
    pub fn get(&self, slice: RegisterSlice) -> u32 {
        unpack(&self.0, u32::from(slice.offset), u32::from(slice.width))
    }

    /// Extract a single bit flag.
    pub fn flag(&self, bit: u8) -> bool {
        self.get(RegisterSlice::bit(bit)) != 0
    }
}

/// Extract `width` bits starting at `offset` from a byte-order corrected image.
///
/// Bits beyond the end of the image read as zero; `width` is clamped to 32.
pub fn unpack(image: &RegisterData, offset: u32, width: u32) -> u32 {
    let width = width.min(32);
    if width == 0 || offset >= 128 {
        return 0;
    }

    let first = (offset / 8) as usize;
    let last = ((offset + width - 1) / 8).min(127 / 8) as usize;

    let mut acc: u64 = 0;
    for byte in image[first..=last].iter().rev() {
        acc = (acc << 8) | u64::from(*byte);
    }

    let mask = if width == 32 {
        u32::MAX
    } else {
        (1u32 << width) - 1
    };

    ((acc >> (offset % 8)) as u32) & mask
}

use crate::{
    cid::Cid,
    csd::{CardGeometry, Csd},
    response::Ocr,
};

/// Lifecycle of a card session.
///
/// `Reset -> Busy -> {Ready, Error}`; leaving `Ready` or `Error` takes an
/// explicit reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CardState {
    #[default]
    Reset,
    Busy,
    Ready,
    Error,
}

/// Card type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CardType {
    #[default]
    Unknown,
    /// MMC ver 3.
    MMC,
    /// SD ver 1.
    SD1,
    /// SD ver 2, standard capacity.
    SD2,
    /// High or extended capacity, block addressed.
    SDHC,
    /// Ultra capacity, block addressed. Reserved, never detected.
    SDUC,
}

impl CardType {
    /// Whether commands take block numbers instead of byte offsets.
    pub fn is_block_addressed(self) -> bool {
        matches!(self, CardType::SDHC | CardType::SDUC)
    }

    /// Whether the card understands the SD application commands.
    pub fn is_sd(self) -> bool {
        matches!(
            self,
            CardType::SD1 | CardType::SD2 | CardType::SDHC | CardType::SDUC
        )
    }
}

/// Everything learned about a card during initialization.
///
/// Registers and geometry are only meaningful in [`CardState::Ready`]; a
/// failed initialization may leave some of them populated.
#[derive(Debug, Clone, Default)]
pub struct CardSession {
    pub(crate) state: CardState,
    pub(crate) card_type: CardType,
    pub(crate) ocr: Ocr,
    pub(crate) csd: Option<Csd>,
    pub(crate) cid: Option<Cid>,
    pub(crate) geometry: Option<CardGeometry>,
}

impl CardSession {
    /// Current lifecycle state.
    pub fn state(&self) -> CardState {
        self.state
    }

    /// Detected card family.
    pub fn card_type(&self) -> CardType {
        self.card_type
    }

    /// Operating conditions register, captured for SD ver 2 and later.
    pub fn ocr(&self) -> Ocr {
        self.ocr
    }

    /// Card Specific Data register.
    pub fn csd(&self) -> Option<&Csd> {
        self.csd.as_ref()
    }

    /// Card Identification register.
    pub fn cid(&self) -> Option<&Cid> {
        self.cid.as_ref()
    }

    /// Derived block lengths and capacity, once the card is ready.
    pub fn geometry(&self) -> Option<&CardGeometry> {
        match self.state {
            CardState::Ready => self.geometry.as_ref(),
            _ => None,
        }
    }

    /// Translate a logical sector into a command address argument.
    pub(crate) fn address(&self, sector: u64, block_size: u64) -> Option<u32> {
        let address = if self.card_type.is_block_addressed() {
            sector
        } else {
            sector.checked_mul(block_size)?
        };

        u32::try_from(address).ok()
    }
}

use switch_hal::OutputSwitch;

/// Failure to take the chip select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectError<E> {
    /// Nesting limit reached, another command chain is in flight.
    Busy,
    /// The select line couldn't be driven.
    Switch(E),
}

/// Chip select line with nesting bookkeeping.
///
/// A command that issues a nested command (the `APP_CMD` prefix of an ACMD)
/// keeps one continuous select span: only the outermost `select` asserts the
/// line and only the matching outermost `deselect` releases it.
///
/// The counter is single-threaded reentrancy bookkeeping, not a lock.
pub struct ChipSelect<Cs> {
    cs: Cs,
    depth: u8,
}

impl<Cs: OutputSwitch> ChipSelect<Cs> {
    /// Deepest allowed nesting.
    pub const MAX_DEPTH: u8 = 2;

    /// Wrap a select line, starting deselected.
    pub fn new(cs: Cs) -> Self {
        ChipSelect { cs, depth: 0 }
    }

    /// Current nesting depth.
    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// Whether the line is asserted.
    pub fn is_selected(&self) -> bool {
        self.depth > 0
    }

    /// Enter a select span, asserting the line on the outermost one.
    pub fn select(&mut self) -> Result<(), SelectError<Cs::Error>> {
        if self.depth >= Self::MAX_DEPTH {
            return Err(SelectError::Busy);
        }

        if self.depth == 0 {
            self.cs.on().map_err(SelectError::Switch)?;
        }
        self.depth += 1;

        Ok(())
    }

    /// Leave a select span, releasing the line when the outermost one ends.
    pub fn deselect(&mut self) -> Result<(), Cs::Error> {
        match self.depth {
            0 => Ok(()),
            1 => {
                self.depth = 0;
                self.cs.off()
            }
            _ => {
                self.depth -= 1;
                Ok(())
            }
        }
    }

    /// Drop every span and drive the line idle.
    pub fn release(&mut self) -> Result<(), Cs::Error> {
        self.depth = 0;
        self.cs.off()
    }

    /// Give back the select line.
    pub fn into_inner(self) -> Cs {
        self.cs
    }
}

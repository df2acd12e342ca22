//! 10:1 parallel-to-serial conversion for the three data channels plus the TMDS clock lane

use crate::tmds::{SYMBOL_LEN, TmdsSymbol};
use bincode::{Decode, Encode};
use hdmi_common::frontend::SerialBits;
use hdmi_common::num::GetBit;

/// High for the first half of each pixel period, LSB first.
pub const CLOCK_PATTERN: u16 = 0b0000011111;

#[derive(Debug, Clone, Default, Encode, Decode)]
pub struct Serializer {
    shift_registers: [u16; 3],
    clock_register: u16,
    counter: u8,
}

impl Serializer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Position within the current symbol; 0 means the next tick reloads the shift registers.
    #[must_use]
    pub fn counter(&self) -> u8 {
        self.counter
    }

    /// Emit one serial bit per lane.
    ///
    /// `symbols` is only sampled on the first tick of each group of 10, so it must hold the
    /// registered encoder output for the whole pixel period.
    #[inline]
    pub fn tick(&mut self, symbols: &[TmdsSymbol; 3]) -> SerialBits {
        if self.counter == 0 {
            self.shift_registers = symbols.map(TmdsSymbol::bits);
            self.clock_register = CLOCK_PATTERN;
        }

        let bits = SerialBits {
            data: self.shift_registers.map(|register| register.bit(0)),
            clock: self.clock_register.bit(0),
        };

        for register in &mut self.shift_registers {
            *register >>= 1;
        }
        self.clock_register >>= 1;

        self.counter += 1;
        if self.counter == SYMBOL_LEN {
            self.counter = 0;
        }

        bits
    }
}

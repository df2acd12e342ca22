//! TMDS symbol encoding
//!
//! Each of the three data channels owns a [`TmdsEncoder`] that turns one cycle's period and
//! payload into a 10-bit symbol. Video data goes through the DVI 8b/10b line code, which tracks a
//! running disparity to keep the link DC balanced; every other period maps to fixed codewords.

use crate::period::Period;
use bincode::{Decode, Encode};
use hdmi_common::num::GetBit;
use hdmi_proc_macros::EnumDisplay;

pub const SYMBOL_LEN: u8 = 10;

/// Running disparity never leaves this range in either direction.
pub const MAX_DISPARITY: i8 = 8;

const CONTROL_CODES: [u16; 4] = [0b1101010100, 0b0010101011, 0b0101010100, 0b1010101011];

const TERC4_CODES: [u16; 16] = [
    0b1010011100,
    0b1001100011,
    0b1011100100,
    0b1011100010,
    0b0101110001,
    0b0100011110,
    0b0110001110,
    0b0100111100,
    0b1011001100,
    0b0100111001,
    0b0110011100,
    0b1011000110,
    0b1010001110,
    0b1001110001,
    0b0101100011,
    0b1011000011,
];

const VIDEO_GUARD_CODES: [u16; 3] = [0b1011001100, 0b0100110011, 0b1011001100];

const ISLAND_GUARD_CODE: u16 = 0b0100110011;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
pub struct TmdsSymbol(u16);

impl TmdsSymbol {
    #[inline]
    #[must_use]
    pub const fn new(bits: u16) -> Self {
        Self(bits & 0x3FF)
    }

    #[inline]
    #[must_use]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Ones minus zeros across all 10 bits.
    #[inline]
    #[must_use]
    pub const fn disparity(self) -> i8 {
        2 * self.0.count_ones() as i8 - SYMBOL_LEN as i8
    }

    #[must_use]
    pub const fn control(bits: u8) -> Self {
        Self(CONTROL_CODES[(bits & 3) as usize])
    }

    #[must_use]
    pub const fn terc4(nibble: u8) -> Self {
        Self(TERC4_CODES[(nibble & 0xF) as usize])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, EnumDisplay)]
pub enum TmdsChannel {
    Blue,
    Green,
    Red,
}

impl TmdsChannel {
    pub const ALL: [Self; 3] = [Self::Blue, Self::Green, Self::Red];

    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Candidate payloads for one channel; the period picks which one is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelPayload {
    pub video: u8,
    /// Low 4 bits used
    pub island: u8,
    /// Low 2 bits used; on channel 0 this is always `{vsync, hsync}`
    pub control: u8,
}

#[derive(Debug, Clone, Encode, Decode)]
pub struct TmdsEncoder {
    channel: TmdsChannel,
    disparity: i8,
}

impl TmdsEncoder {
    #[must_use]
    pub fn new(channel: TmdsChannel) -> Self {
        Self { channel, disparity: 0 }
    }

    #[must_use]
    pub fn channel(&self) -> TmdsChannel {
        self.channel
    }

    #[must_use]
    pub fn disparity(&self) -> i8 {
        self.disparity
    }

    pub fn reset_disparity(&mut self) {
        self.disparity = 0;
    }

    pub fn encode_symbol(&mut self, period: Period, payload: ChannelPayload) -> TmdsSymbol {
        match period {
            Period::Control => TmdsSymbol::control(payload.control),
            Period::VideoGuard => TmdsSymbol(VIDEO_GUARD_CODES[self.channel.index()]),
            Period::VideoData => self.encode_video(payload.video),
            Period::DataIslandGuard => match self.channel {
                TmdsChannel::Blue => TmdsSymbol::terc4(0b1100 | (payload.control & 3)),
                TmdsChannel::Green | TmdsChannel::Red => TmdsSymbol(ISLAND_GUARD_CODE),
            },
            Period::DataIslandData => TmdsSymbol::terc4(payload.island),
        }
    }

    fn encode_video(&mut self, data: u8) -> TmdsSymbol {
        let data_ones = data.count_ones();
        let use_xnor = data_ones > 4 || (data_ones == 4 && !data.bit(0));

        // Transition-minimized stage; bit 8 is set when XOR was used
        let mut q_m = data & 1;
        for i in 1..8 {
            let bit = q_m.bit(i - 1) ^ data.bit(i) ^ use_xnor;
            q_m = q_m.with_bit(i, bit);
        }
        let xor_used = !use_xnor;

        let ones = q_m.count_ones() as i8;
        let zeros = 8 - ones;

        let (invert, delta) = if self.disparity == 0 || ones == zeros {
            (use_xnor, if xor_used { ones - zeros } else { zeros - ones })
        } else if (self.disparity > 0 && ones > zeros) || (self.disparity < 0 && zeros > ones) {
            (true, 2 * i8::from(xor_used) + zeros - ones)
        } else {
            (false, -2 * i8::from(use_xnor) + ones - zeros)
        };

        let data_bits = if invert { !q_m } else { q_m };
        let symbol = TmdsSymbol(
            (u16::from(invert) << 9) | (u16::from(xor_used) << 8) | u16::from(data_bits),
        );

        self.disparity += delta;
        debug_assert_eq!(delta, symbol.disparity());
        debug_assert!(self.disparity.abs() <= MAX_DISPARITY, "disparity {}", self.disparity);

        symbol
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn video(encoder: &mut TmdsEncoder, data: u8) -> u16 {
        let payload = ChannelPayload { video: data, ..ChannelPayload::default() };
        encoder.encode_symbol(Period::VideoData, payload).bits()
    }

    #[test]
    fn control_codes() {
        let mut encoder = TmdsEncoder::new(TmdsChannel::Blue);
        let expected = [0b1101010100, 0b0010101011, 0b0101010100, 0b1010101011];
        for (control, expected) in (0..4).zip(expected) {
            let payload = ChannelPayload { control, ..ChannelPayload::default() };
            assert_eq!(encoder.encode_symbol(Period::Control, payload).bits(), expected);
        }
        assert_eq!(encoder.disparity(), 0);
    }

    #[test]
    fn control_leaves_disparity_untouched() {
        let mut encoder = TmdsEncoder::new(TmdsChannel::Green);
        video(&mut encoder, 0x00);
        assert_eq!(encoder.disparity(), -8);

        for control in 0..4 {
            let payload = ChannelPayload { control, ..ChannelPayload::default() };
            encoder.encode_symbol(Period::Control, payload);
        }
        assert_eq!(encoder.disparity(), -8);

        encoder.reset_disparity();
        assert_eq!(encoder.disparity(), 0);
    }

    #[test]
    fn control_codes_ignore_disparity() {
        let expected = [0b1101010100, 0b0010101011, 0b0101010100, 0b1010101011];

        for (warmup, disparity) in [(&[0x00][..], -8), (&[0x00, 0x00][..], 2)] {
            let mut encoder = TmdsEncoder::new(TmdsChannel::Red);
            for &data in warmup {
                video(&mut encoder, data);
            }
            assert_eq!(encoder.disparity(), disparity);

            for (control, expected) in (0..4).zip(expected) {
                let payload = ChannelPayload { control, ..ChannelPayload::default() };
                assert_eq!(encoder.encode_symbol(Period::Control, payload).bits(), expected);
                assert_eq!(encoder.disparity(), disparity);
            }
        }
    }

    #[test]
    fn video_known_symbols() {
        let mut encoder = TmdsEncoder::new(TmdsChannel::Red);
        assert_eq!(video(&mut encoder, 0x00), 0b0100000000);
        assert_eq!(encoder.disparity(), -8);
        assert_eq!(video(&mut encoder, 0x00), 0b1111111111);
        assert_eq!(encoder.disparity(), 2);

        for (data, expected) in
            [(0xFF, 0b1000000000), (0x10, 0b0111110000), (0x55, 0b0100110011), (0xAA, 0b1000110011)]
        {
            let mut encoder = TmdsEncoder::new(TmdsChannel::Red);
            assert_eq!(video(&mut encoder, data), expected, "{data:02X}");
        }
    }

    #[test]
    fn video_inverts_against_positive_disparity() {
        let mut encoder = TmdsEncoder::new(TmdsChannel::Blue);
        encoder.disparity = 2;
        assert_eq!(video(&mut encoder, 0x80), 0b0110000000);
        assert_eq!(encoder.disparity(), -4);
    }

    #[test]
    fn video_disparity_stays_bounded() {
        for channel in TmdsChannel::ALL {
            let mut encoder = TmdsEncoder::new(channel);
            for _ in 0..100_000 {
                let before = encoder.disparity();
                let symbol = video(&mut encoder, rand::random());
                assert_eq!(encoder.disparity(), before + TmdsSymbol::new(symbol).disparity());
                assert!(encoder.disparity().abs() <= MAX_DISPARITY);
            }
        }
    }

    #[test]
    fn video_symbols_decode_to_input() {
        let mut encoder = TmdsEncoder::new(TmdsChannel::Green);
        for data in 0..=255_u8 {
            let symbol = video(&mut encoder, data);

            let mut q_m = symbol as u8;
            if symbol.bit(9) {
                q_m = !q_m;
            }
            let mut decoded = q_m & 1;
            for i in 1..8 {
                let bit = q_m.bit(i) ^ q_m.bit(i - 1) ^ !symbol.bit(8);
                decoded = decoded.with_bit(i, bit);
            }
            assert_eq!(decoded, data);
        }
    }

    #[test]
    fn terc4_table() {
        assert_eq!(TmdsSymbol::terc4(0).bits(), 0b1010011100);
        assert_eq!(TmdsSymbol::terc4(0b1100).bits(), 0b1010001110);
        assert_eq!(TmdsSymbol::terc4(0b1111).bits(), 0b1011000011);

        let mut encoder = TmdsEncoder::new(TmdsChannel::Red);
        for nibble in 0..16 {
            let payload = ChannelPayload { island: nibble, ..ChannelPayload::default() };
            let symbol = encoder.encode_symbol(Period::DataIslandData, payload);
            assert_eq!(symbol, TmdsSymbol::terc4(nibble));
        }
    }

    #[test]
    fn guard_bands() {
        let mut encoders = TmdsChannel::ALL.map(TmdsEncoder::new);

        let video_guard = encoders.each_mut().map(|encoder| {
            encoder.encode_symbol(Period::VideoGuard, ChannelPayload::default()).bits()
        });
        assert_eq!(video_guard, [0b1011001100, 0b0100110011, 0b1011001100]);

        for sync in 0..4 {
            let payload = ChannelPayload { control: sync, ..ChannelPayload::default() };
            let island_guard = encoders
                .each_mut()
                .map(|encoder| encoder.encode_symbol(Period::DataIslandGuard, payload));
            assert_eq!(island_guard[0], TmdsSymbol::terc4(0b1100 | sync));
            assert_eq!(island_guard[1].bits(), 0b0100110011);
            assert_eq!(island_guard[2].bits(), 0b0100110011);
        }

        assert!(encoders.iter().all(|encoder| encoder.disparity() == 0));
    }

    #[test]
    fn symbol_masks_to_ten_bits() {
        assert_eq!(TmdsSymbol::new(0xFFFF).bits(), 0x3FF);
        assert_eq!(TmdsSymbol::new(0x3FF).disparity(), 10);
        assert_eq!(TmdsSymbol::new(0).disparity(), -10);
    }
}

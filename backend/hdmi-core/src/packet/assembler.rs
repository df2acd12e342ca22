//! BCH error correction and per-cycle interleaving of packet bits onto the data island channels

use crate::packet::{HEADER_LEN, Packet, SUBPACKET_LEN, SUBPACKETS};
use bincode::{Decode, Encode};
use hdmi_common::num::GetBit;

const BCH_GENERATOR: u8 = 0b1000_0011;

pub const PACKET_CYCLES: u8 = 32;

/// Parity byte of the BCH code over the low `len` bits of `data`, LSB first.
#[must_use]
pub fn bch_parity(data: u64, len: u8) -> u8 {
    (0..len).fold(0, |ecc, i| {
        let feedback = (ecc ^ u8::from(data.bit(i))) & 1 != 0;
        (ecc >> 1) ^ if feedback { BCH_GENERATOR } else { 0 }
    })
}

fn le_bytes(bytes: &[u8]) -> u64 {
    bytes.iter().rev().fold(0, |acc, &byte| (acc << 8) | u64::from(byte))
}

#[derive(Debug, Clone, Default, Encode, Decode)]
pub struct PacketAssembler {
    // BCH(32,24): HB0..HB2 then parity
    header_block: u32,
    // BCH(64,56): SB0..SB6 then parity
    subpacket_blocks: [u64; SUBPACKETS],
    counter: u8,
}

impl PacketAssembler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Latch a packet and restart the cycle counter.
    pub fn load(&mut self, packet: &Packet) {
        let header = le_bytes(&packet.header);
        let header_parity = bch_parity(header, 8 * HEADER_LEN as u8);
        self.header_block = (header as u32) | (u32::from(header_parity) << 24);

        self.subpacket_blocks = packet.subpackets.map(|subpacket| {
            let data = le_bytes(&subpacket);
            data | (u64::from(bch_parity(data, 8 * SUBPACKET_LEN as u8)) << 56)
        });

        self.counter = 0;
    }

    /// The 9 payload bits for the given cycle within the packet: bit 0 from the header block, bits
    /// 1-4 the even bit of subpackets 0-3, bits 5-8 the odd bit.
    #[must_use]
    pub fn byte_at(&self, counter: u8) -> u16 {
        debug_assert!(counter < PACKET_CYCLES);

        let even = 2 * counter;
        let odd = even + 1;

        let mut byte = u16::from(self.header_block.bit(counter));
        for (i, block) in self.subpacket_blocks.iter().enumerate() {
            byte |= u16::from(block.bit(even)) << (1 + i);
            byte |= u16::from(block.bit(odd)) << (5 + i);
        }

        byte
    }

    /// Payload bits for the current cycle, advancing the counter.
    pub fn next_byte(&mut self) -> u16 {
        let byte = self.byte_at(self.counter);
        self.counter = (self.counter + 1) % PACKET_CYCLES;
        byte
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::PacketType;
    use test_log::test;

    #[test]
    fn parity_of_zero_is_zero() {
        assert_eq!(bch_parity(0, 24), 0);
        assert_eq!(bch_parity(0, 56), 0);
    }

    #[test]
    fn parity_known_values() {
        assert_eq!(bch_parity(1, 24), 0x4A);
        assert_eq!(bch_parity(1, 56), 0xBF);
        assert_eq!(bch_parity(le_bytes(&[0x82, 0x02, 0x0D]), 24), 0xE4);
        assert_eq!(bch_parity(le_bytes(&[0x00, 0x00, 0x62, 0x70, 0x00, 0x18, 0x00]), 56), 0x1D);
    }

    #[test]
    fn parity_is_linear() {
        for _ in 0..1000 {
            let a = rand::random::<u64>() & 0x00FF_FFFF_FFFF_FFFF;
            let b = rand::random::<u64>() & 0x00FF_FFFF_FFFF_FFFF;
            assert_eq!(bch_parity(a ^ b, 56), bch_parity(a, 56) ^ bch_parity(b, 56));
        }
    }

    #[test]
    fn null_packet_is_all_zero() {
        let mut assembler = PacketAssembler::new();
        assembler.load(&Packet::NULL);
        assert!((0..PACKET_CYCLES).all(|_| assembler.next_byte() == 0));
    }

    #[test]
    fn interleaves_header_and_subpackets() {
        let mut packet = Packet::new(PacketType::AudioClockRegeneration, 0, 0);
        packet.subpackets[0][0] = 0b01;
        packet.subpackets[3][0] = 0b10;

        let mut assembler = PacketAssembler::new();
        assembler.load(&packet);

        // Cycle 0: header bit 0, subpacket 0 even bit 0, subpacket 3 odd bit 1
        assert_eq!(assembler.next_byte(), 0b1_0000_0011);
        assert_eq!(assembler.byte_at(1), 0);

        // Header parity occupies cycles 24-31
        let parity = bch_parity(1, 24);
        for cycle in 24..PACKET_CYCLES {
            assert_eq!(assembler.byte_at(cycle) & 1, u16::from(parity.bit(cycle - 24)), "{cycle}");
        }
    }

    #[test]
    fn subpacket_parity_in_last_four_cycles() {
        let mut packet = Packet::NULL;
        packet.subpackets[1] = [0x00, 0x00, 0x62, 0x70, 0x00, 0x18, 0x00];

        let mut assembler = PacketAssembler::new();
        assembler.load(&packet);

        let parity = (28..PACKET_CYCLES).fold(0_u8, |parity, cycle| {
            let byte = assembler.byte_at(cycle);
            let i = 2 * (cycle - 28);
            parity | (u8::from(byte.bit(2)) << i) | (u8::from(byte.bit(6)) << (i + 1))
        });
        assert_eq!(parity, 0x1D);
    }

    #[test]
    fn load_restarts_counter() {
        let mut packet = Packet::NULL;
        packet.header[0] = 1;

        let mut assembler = PacketAssembler::new();
        assembler.load(&packet);
        for _ in 0..5 {
            assembler.next_byte();
        }
        assembler.load(&packet);
        assert_eq!(assembler.next_byte() & 1, 1);
    }
}

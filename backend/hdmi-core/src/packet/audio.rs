//! Audio Clock Regeneration and Audio Sample packets

use crate::packet::{Packet, PacketType};
use bincode::{Decode, Encode};
use hdmi_common::num::GetBit;
use hdmi_config::AudioSampleRate;

pub const SAMPLES_PER_PACKET: usize = 4;

/// IEC 60958 channel status block length, in frames.
pub const CHANNEL_STATUS_FRAMES: u8 = 192;

const CHANNEL_STATUS_LEN: usize = CHANNEL_STATUS_FRAMES as usize / 8;

const SAMPLE_WORD_BITS: u8 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
pub struct StereoSample {
    /// Signed, right-aligned in the configured bit width
    pub left: i32,
    pub right: i32,
}

/// Recommended N for the sample rate; the sink multiplies the regenerated TMDS clock by N/CTS to
/// recover `128 * fs`.
#[must_use]
pub const fn acr_n(sample_rate: AudioSampleRate) -> u32 {
    match sample_rate {
        AudioSampleRate::Hz32000
        | AudioSampleRate::Hz48000
        | AudioSampleRate::Hz96000
        | AudioSampleRate::Hz192000 => 16 * sample_rate.hz() / 125,
        AudioSampleRate::Hz44100 | AudioSampleRate::Hz88200 | AudioSampleRate::Hz176400 => {
            32 * sample_rate.hz() / 225
        }
    }
}

#[must_use]
pub fn acr_cts(pixel_rate_hz: u32, sample_rate: AudioSampleRate) -> u32 {
    let n = u64::from(acr_n(sample_rate));
    (u64::from(pixel_rate_hz) * n / (128 * u64::from(sample_rate.hz()))) as u32
}

/// Audio Clock Regeneration packet; all four subpackets carry the same N/CTS pair.
#[must_use]
pub fn acr_packet(n: u32, cts: u32) -> Packet {
    let subpacket = [
        0x00,
        cts.bits(16..=19) as u8,
        (cts >> 8) as u8,
        cts as u8,
        n.bits(16..=19) as u8,
        (n >> 8) as u8,
        n as u8,
    ];

    Packet { subpackets: [subpacket; 4], ..Packet::new(PacketType::AudioClockRegeneration, 0, 0) }
}

fn sample_frequency_code(sample_rate: AudioSampleRate) -> u8 {
    match sample_rate {
        AudioSampleRate::Hz44100 => 0x0,
        AudioSampleRate::Hz48000 => 0x2,
        AudioSampleRate::Hz32000 => 0x3,
        AudioSampleRate::Hz88200 => 0x8,
        AudioSampleRate::Hz96000 => 0xA,
        AudioSampleRate::Hz176400 => 0xC,
        AudioSampleRate::Hz192000 => 0xE,
    }
}

// Max word length flag in bit 0, word length in bits 1-3
fn word_length_code(bit_width: u8) -> u8 {
    match bit_width {
        16 => 0b0010,
        17 => 0b1100,
        18 => 0b0100,
        19 => 0b1000,
        20 => 0b1010,
        21 => 0b1101,
        22 => 0b0101,
        23 => 0b1001,
        _ => 0b1011,
    }
}

fn channel_status(
    sample_rate: AudioSampleRate,
    bit_width: u8,
    channel: u8,
) -> [u8; CHANNEL_STATUS_LEN] {
    let mut status = [0; CHANNEL_STATUS_LEN];
    // Consumer use, linear PCM, copying permitted, no pre-emphasis
    status[0] = 0x04;
    status[2] = channel << 4;
    status[3] = sample_frequency_code(sample_rate);
    status[4] = word_length_code(bit_width);
    status
}

/// Packs stereo samples into Audio Sample packets, tracking the position within the IEC 60958
/// channel status block.
#[derive(Debug, Clone, Encode, Decode)]
pub struct AudioSamplePacketizer {
    channel_status: [[u8; CHANNEL_STATUS_LEN]; 2],
    bit_width: u8,
    frame: u8,
}

impl AudioSamplePacketizer {
    #[must_use]
    pub fn new(sample_rate: AudioSampleRate, bit_width: u8) -> Self {
        Self {
            channel_status: [
                channel_status(sample_rate, bit_width, 1),
                channel_status(sample_rate, bit_width, 2),
            ],
            bit_width,
            frame: 0,
        }
    }

    /// Index of the next frame within the channel status block.
    #[must_use]
    pub fn frame(&self) -> u8 {
        self.frame
    }

    /// Build a packet from up to 4 samples; any beyond that are ignored.
    pub fn packet(&mut self, samples: &[StereoSample]) -> Packet {
        let samples = &samples[..samples.len().min(SAMPLES_PER_PACKET)];

        let mut sample_present = 0_u8;
        let mut block_start = 0_u8;
        let mut packet = Packet::NULL;

        for (i, (sample, subpacket)) in samples.iter().zip(&mut packet.subpackets).enumerate() {
            sample_present |= 1 << i;
            if self.frame == 0 {
                block_start |= 1 << i;
            }

            let byte = usize::from(self.frame / 8);
            let bit = self.frame % 8;

            let mut flags = 0;
            for (channel, value) in [sample.left, sample.right].into_iter().enumerate() {
                let word = self.sample_word(value);
                subpacket[3 * channel..3 * channel + 3].copy_from_slice(&word.to_le_bytes()[..3]);

                // Valid (0 = valid) and user data bits stay clear
                let status = self.channel_status[channel][byte].bit(bit);
                let parity = (word.count_ones() + u32::from(status)) % 2 != 0;
                flags |= ((u8::from(status) << 2) | (u8::from(parity) << 3)) << (4 * channel);
            }
            subpacket[6] = flags;

            self.frame = (self.frame + 1) % CHANNEL_STATUS_FRAMES;
        }

        packet.header = [PacketType::AudioSample.code(), sample_present, block_start << 4];
        packet
    }

    fn sample_word(&self, sample: i32) -> u32 {
        ((sample as u32) << (SAMPLE_WORD_BITS - self.bit_width)) & 0x00FF_FFFF
    }
}

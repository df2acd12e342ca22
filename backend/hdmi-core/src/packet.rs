//! Data island packets and the packet source interface

mod assembler;
pub mod audio;
pub mod infoframe;
mod picker;

use crate::timing::PixelPosition;
use bincode::{Decode, Encode};
use hdmi_proc_macros::EnumDisplay;

pub use assembler::PacketAssembler;
pub use picker::{DEFAULT_AUDIO_QUEUE_LEN, PacketPicker};

pub const HEADER_LEN: usize = 3;
pub const SUBPACKET_LEN: usize = 7;
pub const SUBPACKETS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, EnumDisplay)]
pub enum PacketType {
    Null,
    AudioClockRegeneration,
    AudioSample,
    AviInfoFrame,
    SourceProductDescription,
    AudioInfoFrame,
}

impl PacketType {
    pub const ALL: [Self; 6] = [
        Self::Null,
        Self::AudioClockRegeneration,
        Self::AudioSample,
        Self::AviInfoFrame,
        Self::SourceProductDescription,
        Self::AudioInfoFrame,
    ];

    /// Header byte HB0.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Null => 0x00,
            Self::AudioClockRegeneration => 0x01,
            Self::AudioSample => 0x02,
            Self::AviInfoFrame => 0x82,
            Self::SourceProductDescription => 0x83,
            Self::AudioInfoFrame => 0x84,
        }
    }

    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|packet_type| packet_type.code() == code)
    }
}

/// One 32-cycle data island packet before error correction: 3 header bytes and 4 subpackets of
/// 7 bytes each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
pub struct Packet {
    pub header: [u8; HEADER_LEN],
    pub subpackets: [[u8; SUBPACKET_LEN]; SUBPACKETS],
}

impl Packet {
    pub const NULL: Self =
        Self { header: [0; HEADER_LEN], subpackets: [[0; SUBPACKET_LEN]; SUBPACKETS] };

    #[must_use]
    pub const fn new(packet_type: PacketType, hb1: u8, hb2: u8) -> Self {
        Self { header: [packet_type.code(), hb1, hb2], ..Self::NULL }
    }

    #[must_use]
    pub fn packet_type(&self) -> Option<PacketType> {
        PacketType::from_code(self.header[0])
    }
}

/// Issued by the transmitter at the first cycle of every packet slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketRequest {
    pub position: PixelPosition,
    /// Slot index within the current data island
    pub slot: u16,
    /// Pixel clocks elapsed since the transmitter was created
    pub pixel_clock: u64,
}

/// Producer of data island packet content.
pub trait PacketSource {
    /// Supply the packet for the slot described by `request`. Returning `None` is an underrun;
    /// the transmitter sends a Null packet in its place.
    fn next_packet(&mut self, request: PacketRequest) -> Option<Packet>;

    /// Called once per frame at the last pixel of the last line.
    fn video_field_end(&mut self) {}
}

/// Packet source that fills every slot with a Null packet.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPacketSource;

impl PacketSource for NullPacketSource {
    fn next_packet(&mut self, _request: PacketRequest) -> Option<Packet> {
        Some(Packet::NULL)
    }
}

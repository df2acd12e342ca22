//! AVI, Audio and Source Product Description InfoFrames

use crate::packet::{Packet, PacketType, SUBPACKET_LEN, SUBPACKETS};
use hdmi_config::{
    HdmiConfig, PRODUCT_DESCRIPTION_LEN, PictureAspectRatio, VENDOR_NAME_LEN, VideoIdCode,
};

const AVI_VERSION: u8 = 2;
const AVI_LEN: u8 = 13;

const AUDIO_VERSION: u8 = 1;
const AUDIO_LEN: u8 = 10;

const SPD_VERSION: u8 = 1;
const SPD_LEN: u8 = 25;

// Active format: same as picture aspect ratio
const ACTIVE_FORMAT_SAME_AS_PICTURE: u8 = 0b1000;

/// Build an InfoFrame from payload bytes PB1 onwards. PB0 is the checksum that makes every header
/// and payload byte sum to zero.
fn infoframe(packet_type: PacketType, version: u8, len: u8, payload: &[u8]) -> Packet {
    debug_assert!(payload.len() <= usize::from(len));
    debug_assert!(payload.len() < SUBPACKETS * SUBPACKET_LEN);

    let mut packet = Packet::new(packet_type, version, len);

    let mut bytes = [0_u8; SUBPACKETS * SUBPACKET_LEN];
    bytes[1..=payload.len()].copy_from_slice(payload);

    let sum = packet.header.iter().chain(payload).fold(0_u8, |sum, &byte| sum.wrapping_add(byte));
    bytes[0] = sum.wrapping_neg();

    for (subpacket, chunk) in packet.subpackets.iter_mut().zip(bytes.chunks_exact(SUBPACKET_LEN)) {
        subpacket.copy_from_slice(chunk);
    }

    packet
}

/// Auxiliary Video Information: RGB 4:4:4, full picture active format, the configured VIC.
#[must_use]
pub fn avi_infoframe(video_id_code: VideoIdCode) -> Packet {
    let picture_aspect = match video_id_code.picture_aspect_ratio() {
        PictureAspectRatio::FourThree => 0b01,
        PictureAspectRatio::SixteenNine => 0b10,
    };

    let payload = [
        // Y = RGB, active format information present, no bar or scan information
        0b0001_0000,
        (picture_aspect << 4) | ACTIVE_FORMAT_SAME_AS_PICTURE,
        0x00,
        video_id_code.id(),
        // No pixel repetition
        0x00,
    ];

    infoframe(PacketType::AviInfoFrame, AVI_VERSION, AVI_LEN, &payload)
}

/// Two-channel LPCM; coding type, rate and size all refer to the stream header.
#[must_use]
pub fn audio_infoframe() -> Packet {
    let channel_count_minus_one = 1;
    let payload = [channel_count_minus_one, 0x00, 0x00, 0x00, 0x00];

    infoframe(PacketType::AudioInfoFrame, AUDIO_VERSION, AUDIO_LEN, &payload)
}

/// Source Product Description with NUL-padded ASCII vendor and product strings.
#[must_use]
pub fn spd_infoframe(config: &HdmiConfig) -> Packet {
    let mut payload = [0_u8; SPD_LEN as usize];

    let (vendor, rest) = payload.split_at_mut(VENDOR_NAME_LEN);
    let (product, source_device) = rest.split_at_mut(PRODUCT_DESCRIPTION_LEN);

    copy_truncated(config.vendor_name.as_bytes(), vendor);
    copy_truncated(config.product_description.as_bytes(), product);
    source_device[0] = config.source_device.code();

    infoframe(PacketType::SourceProductDescription, SPD_VERSION, SPD_LEN, &payload)
}

fn copy_truncated(src: &[u8], dest: &mut [u8]) {
    let len = src.len().min(dest.len());
    dest[..len].copy_from_slice(&src[..len]);
}

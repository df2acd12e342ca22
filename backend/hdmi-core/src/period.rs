//! Period classification and data island scheduling
//!
//! Every pixel clock is assigned exactly one [`Period`] from its position relative to the start of
//! the visible screen area. Data islands sit at the very start of each line's horizontal blanking
//! interval and hold as many 32-cycle packet slots as fit in front of the video preamble.

use crate::timing::{PixelPosition, SyncLevels, VideoModeProfile};
use bincode::{Decode, Encode};
use hdmi_proc_macros::EnumDisplay;

pub const MAX_PACKETS_PER_ISLAND: u16 = 18;
pub const PACKET_SLOT_LEN: u16 = 32;

const GUARD_BAND_LEN: u16 = 2;
const PREAMBLE_LEN: u16 = 8;
const MIN_CONTROL_PERIOD_LEN: u16 = 12;

// The island preamble occupies [0, 8) and its leading guard band [8, 10)
const ISLAND_DATA_START: u16 = PREAMBLE_LEN + GUARD_BAND_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode, EnumDisplay)]
pub enum Period {
    #[default]
    Control,
    VideoGuard,
    VideoData,
    DataIslandGuard,
    DataIslandData,
}

/// Number of packet slots that fit in horizontal blanking before the video preamble, leaving
/// room for both island guard bands, both preambles and the minimum control period.
#[must_use]
pub fn packets_per_island(screen_start_x: u16) -> u16 {
    let overhead = GUARD_BAND_LEN
        + PREAMBLE_LEN
        + MIN_CONTROL_PERIOD_LEN
        + GUARD_BAND_LEN
        + GUARD_BAND_LEN
        + PREAMBLE_LEN;

    (screen_start_x.saturating_sub(overhead) / PACKET_SLOT_LEN).min(MAX_PACKETS_PER_ISLAND)
}

/// Per-cycle classifier output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
pub struct Classification {
    pub period: Period,
    pub video_preamble: bool,
    pub island_preamble: bool,
    /// First cycle of a packet slot; the packet source must supply the slot's packet
    pub packet_enable: bool,
    /// First data cycle of the island
    pub island_leading: bool,
}

impl Classification {
    /// Two-bit control payloads for channels 0, 1 and 2.
    #[inline]
    #[must_use]
    pub fn control_bits(self, sync: SyncLevels) -> [u8; 3] {
        let ctl0 = u8::from(self.video_preamble || self.island_preamble);
        let ctl2 = u8::from(self.island_preamble);

        [sync.bits(), ctl0, ctl2]
    }
}

#[derive(Debug, Clone, Encode, Decode)]
pub struct PeriodClassifier {
    screen_start_x: u16,
    screen_start_y: u16,
    num_packets: u16,
    island_data_end: u16,
    dvi_output: bool,
}

impl PeriodClassifier {
    #[must_use]
    pub fn new(profile: &VideoModeProfile, dvi_output: bool) -> Self {
        let screen_start_x = profile.screen_start_x();
        let num_packets = if dvi_output { 0 } else { packets_per_island(screen_start_x) };

        Self {
            screen_start_x,
            screen_start_y: profile.screen_start_y(),
            num_packets,
            island_data_end: ISLAND_DATA_START + PACKET_SLOT_LEN * num_packets,
            dvi_output,
        }
    }

    #[must_use]
    pub fn num_packets(&self) -> u16 {
        self.num_packets
    }

    #[must_use]
    pub fn classify(&self, position: PixelPosition) -> Classification {
        let PixelPosition { cx, cy } = position;
        let in_screen_lines = cy >= self.screen_start_y;

        if in_screen_lines && cx >= self.screen_start_x {
            return Classification { period: Period::VideoData, ..Classification::default() };
        }

        if self.dvi_output {
            return Classification::default();
        }

        if in_screen_lines && cx >= self.screen_start_x - GUARD_BAND_LEN {
            return Classification { period: Period::VideoGuard, ..Classification::default() };
        }

        if in_screen_lines && cx >= self.screen_start_x - GUARD_BAND_LEN - PREAMBLE_LEN {
            return Classification { video_preamble: true, ..Classification::default() };
        }

        if self.num_packets == 0 {
            return Classification::default();
        }

        if cx < PREAMBLE_LEN {
            Classification { island_preamble: true, ..Classification::default() }
        } else if cx < ISLAND_DATA_START
            || (self.island_data_end..self.island_data_end + GUARD_BAND_LEN).contains(&cx)
        {
            Classification { period: Period::DataIslandGuard, ..Classification::default() }
        } else if cx < self.island_data_end {
            let slot_offset = (cx - ISLAND_DATA_START) % PACKET_SLOT_LEN;
            Classification {
                period: Period::DataIslandData,
                packet_enable: slot_offset == 0,
                island_leading: cx == ISLAND_DATA_START,
                ..Classification::default()
            }
        } else {
            Classification::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::SyncPulse;
    use hdmi_config::VideoIdCode;
    use test_log::test;

    fn classifier(vic: VideoIdCode) -> PeriodClassifier {
        PeriodClassifier::new(&VideoModeProfile::for_video_id_code(vic), false)
    }

    fn at(cx: u16, cy: u16) -> PixelPosition {
        PixelPosition { cx, cy }
    }

    #[test]
    fn packet_counts_per_mode() {
        for (vic, expected) in [
            (VideoIdCode::Vic1, 3),
            (VideoIdCode::Vic2, 3),
            (VideoIdCode::Vic4, 10),
            (VideoIdCode::Vic16, 7),
            (VideoIdCode::Vic17, 3),
            (VideoIdCode::Vic19, 18),
        ] {
            assert_eq!(classifier(vic).num_packets(), expected, "{vic}");
        }
    }

    #[test]
    fn packet_count_edge_cases() {
        assert_eq!(packets_per_island(0), 0);
        assert_eq!(packets_per_island(33), 0);
        assert_eq!(packets_per_island(65), 0);
        assert_eq!(packets_per_island(66), 1);
        assert_eq!(packets_per_island(2000), MAX_PACKETS_PER_ISLAND);
    }

    #[test]
    fn vga_line_layout() {
        // 640x480: ssx = 160, ssy = 45, 3 packets, island data in [10, 106)
        let classifier = classifier(VideoIdCode::Vic1);

        for cx in 0..8 {
            let class = classifier.classify(at(cx, 100));
            assert_eq!(class.period, Period::Control);
            assert!(class.island_preamble);
            assert_eq!(class.control_bits(SyncLevels::default()), [0, 1, 1]);
        }

        for cx in [8, 9, 106, 107] {
            assert_eq!(classifier.classify(at(cx, 100)).period, Period::DataIslandGuard, "{cx}");
        }

        for cx in 10..106 {
            let class = classifier.classify(at(cx, 100));
            assert_eq!(class.period, Period::DataIslandData);
            assert_eq!(class.packet_enable, [10, 42, 74].contains(&cx), "{cx}");
            assert_eq!(class.island_leading, cx == 10);
        }

        for cx in 108..150 {
            let class = classifier.classify(at(cx, 100));
            assert_eq!(class, Classification::default(), "{cx}");
        }

        for cx in 150..158 {
            let class = classifier.classify(at(cx, 100));
            assert_eq!(class.period, Period::Control);
            assert!(class.video_preamble);
            assert!(!class.island_preamble);
            assert_eq!(class.control_bits(SyncLevels::default()), [0, 1, 0]);
        }

        assert_eq!(classifier.classify(at(158, 100)).period, Period::VideoGuard);
        assert_eq!(classifier.classify(at(159, 100)).period, Period::VideoGuard);
        assert_eq!(classifier.classify(at(160, 100)).period, Period::VideoData);
        assert_eq!(classifier.classify(at(799, 524)).period, Period::VideoData);
    }

    #[test]
    fn vertical_blanking_lines_keep_islands_but_no_video() {
        let classifier = classifier(VideoIdCode::Vic1);

        assert_eq!(classifier.classify(at(10, 0)).period, Period::DataIslandData);
        assert!(classifier.classify(at(10, 0)).packet_enable);

        for cx in [150, 158, 159, 160, 799] {
            let class = classifier.classify(at(cx, 44));
            assert_eq!(class, Classification::default(), "{cx}");
        }
    }

    #[test]
    fn periods_are_exclusive_and_exhaustive() {
        let profile = VideoModeProfile::for_video_id_code(VideoIdCode::Vic1);
        let classifier = PeriodClassifier::new(&profile, false);

        let mut counts = [0_u32; 5];
        for cy in 0..profile.frame_height {
            for cx in 0..profile.frame_width {
                let class = classifier.classify(at(cx, cy));
                counts[class.period as usize] += 1;

                if class.packet_enable || class.island_leading {
                    assert_eq!(class.period, Period::DataIslandData);
                }
                if class.video_preamble || class.island_preamble {
                    assert_eq!(class.period, Period::Control);
                    assert!(!(class.video_preamble && class.island_preamble));
                }
            }
        }

        assert_eq!(counts[Period::VideoData as usize], 640 * 480);
        assert_eq!(counts[Period::VideoGuard as usize], 2 * 480);
        assert_eq!(counts[Period::DataIslandData as usize], 96 * 525);
        assert_eq!(counts[Period::DataIslandGuard as usize], 4 * 525);
        assert_eq!(counts.iter().sum::<u32>(), profile.pixels_per_frame());
    }

    #[test]
    fn narrow_blanking_has_no_islands() {
        let profile = VideoModeProfile {
            frame_width: 680,
            hsync: SyncPulse { start: 4, len: 16 },
            ..VideoModeProfile::for_video_id_code(VideoIdCode::Vic1)
        };
        let classifier = PeriodClassifier::new(&profile, false);
        assert_eq!(classifier.num_packets(), 0);

        for cx in 0..30 {
            let class = classifier.classify(at(cx, 100));
            assert_eq!(class, Classification::default(), "{cx}");
        }

        assert!(classifier.classify(at(30, 100)).video_preamble);
        assert_eq!(classifier.classify(at(38, 100)).period, Period::VideoGuard);
        assert_eq!(classifier.classify(at(40, 100)).period, Period::VideoData);
    }

    #[test]
    fn dvi_output_only_has_video_and_control() {
        let profile = VideoModeProfile::for_video_id_code(VideoIdCode::Vic4);
        let classifier = PeriodClassifier::new(&profile, true);
        assert_eq!(classifier.num_packets(), 0);

        for cy in [0, 29, 30, 749] {
            for cx in 0..profile.frame_width {
                let class = classifier.classify(at(cx, cy));
                let expected =
                    if cy >= 30 && cx >= 370 { Period::VideoData } else { Period::Control };
                assert_eq!(class.period, expected, "({cx}, {cy})");
                assert!(!class.video_preamble && !class.island_preamble);
            }
        }
    }

    #[test]
    fn control_bits_carry_sync() {
        let class = Classification::default();
        assert_eq!(class.control_bits(SyncLevels { hsync: true, vsync: false }), [0b01, 0, 0]);
        assert_eq!(class.control_bits(SyncLevels { hsync: false, vsync: true }), [0b10, 0, 0]);
    }
}

//! Video timing generator: mode table, pixel position counters and sync pulses

use bincode::{Decode, Encode};
use hdmi_config::VideoIdCode;
use hdmi_proc_macros::EnumDisplay;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    #[error("frame dimensions must be non-zero, got {width}x{height}")]
    EmptyFrame { width: u16, height: u16 },
    #[error(
        "screen {screen_width}x{screen_height} does not fit in frame {frame_width}x{frame_height}"
    )]
    ScreenLargerThanFrame {
        screen_width: u16,
        screen_height: u16,
        frame_width: u16,
        frame_height: u16,
    },
    #[error("horizontal blanking of {0} pixels is too short; at least 22 required")]
    HorizontalBlanking(u16),
    #[error("{axis} sync pulse {start}+{len} extends past the frame edge at {frame_len}")]
    SyncPulse { axis: &'static str, start: u16, len: u16, frame_len: u16 },
    #[error("position ({cx}, {cy}) is outside the {frame_width}x{frame_height} frame")]
    PositionOutsideFrame { cx: u16, cy: u16, frame_width: u16, frame_height: u16 },
}

/// Video guard band, video preamble and the minimum control period that must precede it.
pub const MIN_HORIZONTAL_BLANKING: u16 = 2 + 8 + 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, EnumDisplay)]
pub enum SyncPolarity {
    #[enum_name = "active-low"]
    ActiveLow,
    #[enum_name = "active-high"]
    ActiveHigh,
}

impl SyncPolarity {
    #[inline]
    #[must_use]
    pub const fn level(self, active: bool) -> bool {
        match self {
            Self::ActiveLow => !active,
            Self::ActiveHigh => active,
        }
    }
}

/// Sync pulse covering `start..start + len` on its axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct SyncPulse {
    pub start: u16,
    pub len: u16,
}

impl SyncPulse {
    #[inline]
    #[must_use]
    pub const fn contains(self, pos: u16) -> bool {
        pos >= self.start && pos - self.start < self.len
    }

    const fn end(self) -> u32 {
        self.start as u32 + self.len as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct VideoModeProfile {
    pub frame_width: u16,
    pub frame_height: u16,
    pub screen_width: u16,
    pub screen_height: u16,
    pub pixel_rate_hz: u32,
    pub hsync: SyncPulse,
    pub vsync: SyncPulse,
    pub sync_polarity: SyncPolarity,
}

const VGA_640X480P60: VideoModeProfile = VideoModeProfile {
    frame_width: 800,
    frame_height: 525,
    screen_width: 640,
    screen_height: 480,
    pixel_rate_hz: 25_200_000,
    hsync: SyncPulse { start: 16, len: 96 },
    vsync: SyncPulse { start: 0, len: 2 },
    sync_polarity: SyncPolarity::ActiveLow,
};

const SD_720X480P60: VideoModeProfile = VideoModeProfile {
    frame_width: 858,
    frame_height: 525,
    screen_width: 720,
    screen_height: 480,
    pixel_rate_hz: 27_027_000,
    hsync: SyncPulse { start: 16, len: 62 },
    vsync: SyncPulse { start: 6, len: 6 },
    sync_polarity: SyncPolarity::ActiveLow,
};

const HD_1280X720P60: VideoModeProfile = VideoModeProfile {
    frame_width: 1650,
    frame_height: 750,
    screen_width: 1280,
    screen_height: 720,
    pixel_rate_hz: 74_250_000,
    hsync: SyncPulse { start: 110, len: 40 },
    vsync: SyncPulse { start: 0, len: 5 },
    sync_polarity: SyncPolarity::ActiveHigh,
};

const FHD_1920X1080P60: VideoModeProfile = VideoModeProfile {
    frame_width: 2200,
    frame_height: 1125,
    screen_width: 1920,
    screen_height: 1080,
    pixel_rate_hz: 148_500_000,
    hsync: SyncPulse { start: 88, len: 44 },
    vsync: SyncPulse { start: 0, len: 5 },
    sync_polarity: SyncPolarity::ActiveHigh,
};

const FHD_1920X1080P30: VideoModeProfile =
    VideoModeProfile { pixel_rate_hz: 74_250_000, ..FHD_1920X1080P60 };

const SD_720X576P50: VideoModeProfile = VideoModeProfile {
    frame_width: 864,
    frame_height: 625,
    screen_width: 720,
    screen_height: 576,
    pixel_rate_hz: 27_000_000,
    hsync: SyncPulse { start: 12, len: 64 },
    vsync: SyncPulse { start: 0, len: 5 },
    sync_polarity: SyncPolarity::ActiveLow,
};

const HD_1280X720P50: VideoModeProfile = VideoModeProfile {
    frame_width: 1980,
    hsync: SyncPulse { start: 440, len: 40 },
    ..HD_1280X720P60
};

impl VideoModeProfile {
    #[must_use]
    pub const fn for_video_id_code(vic: VideoIdCode) -> Self {
        match vic {
            VideoIdCode::Vic1 => VGA_640X480P60,
            VideoIdCode::Vic2 | VideoIdCode::Vic3 => SD_720X480P60,
            VideoIdCode::Vic4 => HD_1280X720P60,
            VideoIdCode::Vic16 => FHD_1920X1080P60,
            VideoIdCode::Vic17 | VideoIdCode::Vic18 => SD_720X576P50,
            VideoIdCode::Vic19 => HD_1280X720P50,
            VideoIdCode::Vic34 => FHD_1920X1080P30,
        }
    }

    /// # Errors
    ///
    /// Returns an error if the frame is empty, the screen does not fit inside the frame, the
    /// horizontal blanking interval cannot hold a video preamble, or a sync pulse runs off the
    /// edge of the frame.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.frame_width == 0 || self.frame_height == 0 {
            return Err(ProfileError::EmptyFrame {
                width: self.frame_width,
                height: self.frame_height,
            });
        }

        if self.screen_width > self.frame_width || self.screen_height > self.frame_height {
            return Err(ProfileError::ScreenLargerThanFrame {
                screen_width: self.screen_width,
                screen_height: self.screen_height,
                frame_width: self.frame_width,
                frame_height: self.frame_height,
            });
        }

        if self.screen_start_x() < MIN_HORIZONTAL_BLANKING {
            return Err(ProfileError::HorizontalBlanking(self.screen_start_x()));
        }

        for (axis, pulse, frame_len) in [
            ("horizontal", self.hsync, self.frame_width),
            ("vertical", self.vsync, self.frame_height),
        ] {
            if pulse.end() > u32::from(frame_len) {
                return Err(ProfileError::SyncPulse {
                    axis,
                    start: pulse.start,
                    len: pulse.len,
                    frame_len,
                });
            }
        }

        Ok(())
    }

    #[inline]
    #[must_use]
    pub const fn screen_start_x(&self) -> u16 {
        self.frame_width - self.screen_width
    }

    #[inline]
    #[must_use]
    pub const fn screen_start_y(&self) -> u16 {
        self.frame_height - self.screen_height
    }

    #[must_use]
    pub const fn pixels_per_frame(&self) -> u32 {
        self.frame_width as u32 * self.frame_height as u32
    }

    #[must_use]
    pub fn refresh_rate_hz(&self) -> f64 {
        f64::from(self.pixel_rate_hz) / f64::from(self.pixels_per_frame())
    }

    /// Sync line levels at the given position, after polarity has been applied.
    #[inline]
    #[must_use]
    pub const fn sync_levels(&self, position: PixelPosition) -> SyncLevels {
        SyncLevels {
            hsync: self.sync_polarity.level(self.hsync.contains(position.cx)),
            vsync: self.sync_polarity.level(self.vsync.contains(position.cy)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
pub struct PixelPosition {
    pub cx: u16,
    pub cy: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
pub struct SyncLevels {
    pub hsync: bool,
    pub vsync: bool,
}

impl SyncLevels {
    /// `{vsync, hsync}` as carried in control and data island payloads.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u8 {
        ((self.vsync as u8) << 1) | (self.hsync as u8)
    }
}

/// Timing generator output for one pixel clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimingState {
    pub position: PixelPosition,
    pub sync: SyncLevels,
    pub line_start: bool,
    pub video_field_end: bool,
}

#[derive(Debug, Clone, Encode, Decode)]
pub struct VideoTiming {
    profile: VideoModeProfile,
    position: PixelPosition,
}

impl VideoTiming {
    /// # Errors
    ///
    /// Returns an error if the profile fails [`VideoModeProfile::validate`].
    pub fn new(profile: VideoModeProfile) -> Result<Self, ProfileError> {
        profile.validate()?;

        Ok(Self { profile, position: PixelPosition::default() })
    }

    #[must_use]
    pub fn profile(&self) -> &VideoModeProfile {
        &self.profile
    }

    /// Check a timing state that did not come from [`Self::new`], such as one decoded from a
    /// saved state.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile is invalid or the position lies outside the frame.
    pub fn validate(&self) -> Result<(), ProfileError> {
        self.profile.validate()?;

        let PixelPosition { cx, cy } = self.position;
        if cx >= self.profile.frame_width || cy >= self.profile.frame_height {
            return Err(ProfileError::PositionOutsideFrame {
                cx,
                cy,
                frame_width: self.profile.frame_width,
                frame_height: self.profile.frame_height,
            });
        }

        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> TimingState {
        let position = self.position;
        TimingState {
            position,
            sync: self.profile.sync_levels(position),
            line_start: position.cx == 0,
            video_field_end: position.cx == self.profile.frame_width - 1
                && position.cy == self.profile.frame_height - 1,
        }
    }

    /// Advance one pixel clock, wrapping at the end of each line and frame.
    #[inline]
    pub fn advance(&mut self) {
        self.position.cx += 1;
        if self.position.cx == self.profile.frame_width {
            self.position.cx = 0;
            self.position.cy += 1;
            if self.position.cy == self.profile.frame_height {
                self.position.cy = 0;
            }
        }
    }
}

use bincode::{Decode, Encode};
use hdmi_proc_macros::{ConfigDisplay, EnumAll, EnumDisplay, EnumFromStr};
use thiserror::Error;

pub const MIN_AUDIO_BIT_WIDTH: u8 = 16;
pub const MAX_AUDIO_BIT_WIDTH: u8 = 24;

// Sizes of the Source Product Description InfoFrame text fields
pub const VENDOR_NAME_LEN: usize = 8;
pub const PRODUCT_DESCRIPTION_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unsupported video identification code {0}; supported codes are 1-4, 16-19 and 34")]
    UnsupportedVideoIdCode(u8),
    #[error("unsupported audio bit width {0}; must be between 16 and 24")]
    AudioBitWidth(u8),
    #[error("{field} must be ASCII and at most {max_len} bytes long, was '{value}'")]
    SpdText { field: &'static str, max_len: usize, value: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// CEA-861 video identification codes with a timing in the supported mode table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode, EnumDisplay, EnumFromStr, EnumAll,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "clap", derive(hdmi_proc_macros::CustomValueEnum))]
pub enum VideoIdCode {
    #[default]
    #[enum_name = "640x480p60"]
    Vic1,
    #[enum_name = "720x480p60-4:3"]
    Vic2,
    #[enum_name = "720x480p60-16:9"]
    Vic3,
    #[enum_name = "1280x720p60"]
    Vic4,
    #[enum_name = "1920x1080p60"]
    Vic16,
    #[enum_name = "720x576p50-4:3"]
    Vic17,
    #[enum_name = "720x576p50-16:9"]
    Vic18,
    #[enum_name = "1280x720p50"]
    Vic19,
    #[enum_name = "1920x1080p30"]
    Vic34,
}

impl VideoIdCode {
    #[must_use]
    pub const fn id(self) -> u8 {
        match self {
            Self::Vic1 => 1,
            Self::Vic2 => 2,
            Self::Vic3 => 3,
            Self::Vic4 => 4,
            Self::Vic16 => 16,
            Self::Vic17 => 17,
            Self::Vic18 => 18,
            Self::Vic19 => 19,
            Self::Vic34 => 34,
        }
    }

    #[must_use]
    pub const fn picture_aspect_ratio(self) -> PictureAspectRatio {
        match self {
            Self::Vic1 | Self::Vic2 | Self::Vic17 => PictureAspectRatio::FourThree,
            Self::Vic3 | Self::Vic4 | Self::Vic16 | Self::Vic18 | Self::Vic19 | Self::Vic34 => {
                PictureAspectRatio::SixteenNine
            }
        }
    }
}

impl TryFrom<u8> for VideoIdCode {
    type Error = ConfigError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|vic| vic.id() == value)
            .ok_or(ConfigError::UnsupportedVideoIdCode(value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, EnumDisplay)]
pub enum PictureAspectRatio {
    #[enum_name = "4:3"]
    FourThree,
    #[enum_name = "16:9"]
    SixteenNine,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode, EnumDisplay, EnumFromStr, EnumAll,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "clap", derive(hdmi_proc_macros::CustomValueEnum))]
pub enum AudioSampleRate {
    #[enum_name = "32000"]
    Hz32000,
    #[enum_name = "44100"]
    Hz44100,
    #[default]
    #[enum_name = "48000"]
    Hz48000,
    #[enum_name = "88200"]
    Hz88200,
    #[enum_name = "96000"]
    Hz96000,
    #[enum_name = "176400"]
    Hz176400,
    #[enum_name = "192000"]
    Hz192000,
}

impl AudioSampleRate {
    #[must_use]
    pub const fn hz(self) -> u32 {
        match self {
            Self::Hz32000 => 32_000,
            Self::Hz44100 => 44_100,
            Self::Hz48000 => 48_000,
            Self::Hz88200 => 88_200,
            Self::Hz96000 => 96_000,
            Self::Hz176400 => 176_400,
            Self::Hz192000 => 192_000,
        }
    }
}

/// Source device classification reported in the Source Product Description InfoFrame.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode, EnumDisplay, EnumFromStr, EnumAll,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "clap", derive(hdmi_proc_macros::CustomValueEnum))]
pub enum SourceDeviceType {
    Unknown,
    DigitalStb,
    Dvd,
    DVhs,
    HddVideo,
    Dvc,
    Dsc,
    VideoCd,
    Game,
    #[default]
    PcGeneral,
    BluRay,
    SuperAudioCd,
}

impl SourceDeviceType {
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Unknown => 0x00,
            Self::DigitalStb => 0x01,
            Self::Dvd => 0x02,
            Self::DVhs => 0x03,
            Self::HddVideo => 0x04,
            Self::Dvc => 0x05,
            Self::Dsc => 0x06,
            Self::VideoCd => 0x07,
            Self::Game => 0x08,
            Self::PcGeneral => 0x09,
            Self::BluRay => 0x0A,
            Self::SuperAudioCd => 0x0B,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, ConfigDisplay)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HdmiConfig {
    pub video_id_code: VideoIdCode,
    pub audio_sample_rate: AudioSampleRate,
    pub audio_bit_width: u8,
    /// Emit a plain DVI signal: no data islands, guard bands or preambles
    pub dvi_output: bool,
    pub vendor_name: String,
    pub product_description: String,
    pub source_device: SourceDeviceType,
}

impl Default for HdmiConfig {
    fn default() -> Self {
        Self {
            video_id_code: VideoIdCode::default(),
            audio_sample_rate: AudioSampleRate::default(),
            audio_bit_width: MIN_AUDIO_BIT_WIDTH,
            dvi_output: false,
            vendor_name: "Unknown".into(),
            product_description: "FPGA".into(),
            source_device: SourceDeviceType::default(),
        }
    }
}

impl HdmiConfig {
    /// # Errors
    ///
    /// Returns an error if the audio bit width is out of range or if either SPD text field is
    /// too long or contains non-ASCII characters.
    pub fn validate(&self) -> ConfigResult<()> {
        if !(MIN_AUDIO_BIT_WIDTH..=MAX_AUDIO_BIT_WIDTH).contains(&self.audio_bit_width) {
            return Err(ConfigError::AudioBitWidth(self.audio_bit_width));
        }

        validate_spd_text("vendor_name", &self.vendor_name, VENDOR_NAME_LEN)?;
        validate_spd_text(
            "product_description",
            &self.product_description,
            PRODUCT_DESCRIPTION_LEN,
        )?;

        Ok(())
    }
}

fn validate_spd_text(field: &'static str, value: &str, max_len: usize) -> ConfigResult<()> {
    if !value.is_ascii() || value.len() > max_len {
        return Err(ConfigError::SpdText { field, max_len, value: value.into() });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(HdmiConfig::default().validate(), Ok(()));
    }

    #[test]
    fn video_id_code_round_trips_through_id() {
        for vic in VideoIdCode::ALL {
            assert_eq!(VideoIdCode::try_from(vic.id()), Ok(vic));
        }
    }

    #[test]
    fn out_of_table_video_id_code_rejected() {
        for id in [0, 5, 15, 20, 33, 35, 95, 255] {
            assert_eq!(VideoIdCode::try_from(id), Err(ConfigError::UnsupportedVideoIdCode(id)));
        }
    }

    #[test]
    fn video_id_code_from_str() {
        assert_eq!(VideoIdCode::from_str("vic16"), Ok(VideoIdCode::Vic16));
        assert_eq!(VideoIdCode::from_str("1280x720p50"), Ok(VideoIdCode::Vic19));
        assert!(VideoIdCode::from_str("3840x2160p30").is_err());
    }

    #[test]
    fn audio_bit_width_bounds() {
        for audio_bit_width in [15, 25] {
            let config = HdmiConfig { audio_bit_width, ..HdmiConfig::default() };
            assert_eq!(config.validate(), Err(ConfigError::AudioBitWidth(audio_bit_width)));
        }

        for audio_bit_width in MIN_AUDIO_BIT_WIDTH..=MAX_AUDIO_BIT_WIDTH {
            let config = HdmiConfig { audio_bit_width, ..HdmiConfig::default() };
            assert_eq!(config.validate(), Ok(()));
        }
    }

    #[test]
    fn spd_text_limits() {
        let config = HdmiConfig { vendor_name: "TooLongName".into(), ..HdmiConfig::default() };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SpdText { field: "vendor_name", .. })
        ));

        let config =
            HdmiConfig { product_description: "Écran".into(), ..HdmiConfig::default() };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SpdText { field: "product_description", .. })
        ));

        let config = HdmiConfig {
            vendor_name: "8bytes!!".into(),
            product_description: "sixteen bytes!!!".into(),
            ..HdmiConfig::default()
        };
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn config_display_lists_fields() {
        let display = HdmiConfig::default().to_string();
        assert!(display.contains("video_id_code: 640x480p60"));
        assert!(display.contains("audio_sample_rate: 48000"));
    }
}

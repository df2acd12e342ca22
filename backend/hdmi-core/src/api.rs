//! HDMI transmitter public interface and per-pixel pipeline

use crate::packet::{Packet, PacketAssembler, PacketRequest, PacketSource};
use crate::period::{Classification, Period, PeriodClassifier};
use crate::serializer::Serializer;
use crate::timing::{PixelPosition, ProfileError, SyncLevels, VideoModeProfile, VideoTiming};
use crate::tmds::{ChannelPayload, SYMBOL_LEN, TmdsChannel, TmdsEncoder, TmdsSymbol};
use bincode::error::{DecodeError, EncodeError};
use bincode::{Decode, Encode};
use hdmi_common::frontend::{Color, PixelSource, SerialSink, TickEffect, TickResult};
use hdmi_common::num::GetBit;
use hdmi_config::{ConfigError, HdmiConfig};
use std::array;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HdmiInitError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Invalid video mode profile: {0}")]
    Profile(#[from] ProfileError),
}

#[derive(Debug, Error)]
pub enum HdmiError<PErr, SErr> {
    #[error("Pixel source error: {0}")]
    PixelSource(PErr),
    #[error("Serial sink error: {0}")]
    SerialSink(SErr),
}

pub type HdmiResult<PErr, SErr> = TickResult<HdmiError<PErr, SErr>>;

/// Everything the pipeline decided for one pixel clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelCycle {
    pub position: PixelPosition,
    pub sync: SyncLevels,
    pub period: Period,
    pub packet_enable: bool,
    pub symbols: [TmdsSymbol; 3],
    pub effect: TickEffect,
}

#[derive(Debug, Clone, Encode, Decode)]
pub struct HdmiTransmitter {
    config: HdmiConfig,
    timing: VideoTiming,
    classifier: PeriodClassifier,
    assembler: PacketAssembler,
    encoders: [TmdsEncoder; 3],
    serializer: Serializer,
    // Registered encoder output, shifted out during the following pixel period
    symbols: [TmdsSymbol; 3],
    slot: u16,
    pixel_clock: u64,
    frame_count: u64,
    packet_underruns: u64,
}

impl HdmiTransmitter {
    /// Create a transmitter for the configured video mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation.
    pub fn new(config: HdmiConfig) -> Result<Self, HdmiInitError> {
        let profile = VideoModeProfile::for_video_id_code(config.video_id_code);
        Self::with_profile(config, profile)
    }

    /// Create a transmitter with a custom video mode profile in place of the one for the
    /// configured video identification code. The AVI InfoFrame still reports the configured code.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration or the profile fails validation.
    pub fn with_profile(
        config: HdmiConfig,
        profile: VideoModeProfile,
    ) -> Result<Self, HdmiInitError> {
        config.validate()?;
        let timing = VideoTiming::new(profile)?;
        let classifier = PeriodClassifier::new(&profile, config.dvi_output);

        log::info!("HDMI transmitter config: {config}");
        log::info!(
            "Video timing: frame {}x{}, screen {}x{}, {} Hz pixel clock ({:.2} Hz), {} sync",
            profile.frame_width,
            profile.frame_height,
            profile.screen_width,
            profile.screen_height,
            profile.pixel_rate_hz,
            profile.refresh_rate_hz(),
            profile.sync_polarity
        );
        if config.dvi_output {
            log::info!("DVI output; data islands disabled");
        } else {
            log::info!("{} packets per data island", classifier.num_packets());
        }

        Ok(Self {
            config,
            timing,
            classifier,
            assembler: PacketAssembler::new(),
            encoders: TmdsChannel::ALL.map(TmdsEncoder::new),
            serializer: Serializer::new(),
            symbols: [TmdsSymbol::default(); 3],
            slot: 0,
            pixel_clock: 0,
            frame_count: 0,
            packet_underruns: 0,
        })
    }

    #[must_use]
    pub fn config(&self) -> &HdmiConfig {
        &self.config
    }

    #[must_use]
    pub fn profile(&self) -> &VideoModeProfile {
        self.timing.profile()
    }

    #[must_use]
    pub fn packets_per_island(&self) -> u16 {
        self.classifier.num_packets()
    }

    #[must_use]
    pub fn position(&self) -> PixelPosition {
        self.timing.state().position
    }

    #[must_use]
    pub fn running_disparity(&self) -> [i8; 3] {
        self.encoders.each_ref().map(TmdsEncoder::disparity)
    }

    /// Symbols registered by the most recent pixel step.
    #[must_use]
    pub fn symbols(&self) -> [TmdsSymbol; 3] {
        self.symbols
    }

    #[must_use]
    pub fn pixel_clock(&self) -> u64 {
        self.pixel_clock
    }

    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Number of packet slots the packet source failed to fill.
    #[must_use]
    pub fn packet_underruns(&self) -> u64 {
        self.packet_underruns
    }

    /// Run the pixel-clock domain for one cycle: classify the current position, fetch the payload
    /// it selects, encode one symbol per channel into the output register, and advance.
    ///
    /// # Errors
    ///
    /// Propagates any error from the pixel source.
    pub fn tick_pixel<P, K>(
        &mut self,
        pixels: &mut P,
        packets: &mut K,
    ) -> Result<PixelCycle, P::Err>
    where
        P: PixelSource,
        K: PacketSource,
    {
        let state = self.timing.state();
        let class = self.classifier.classify(state.position);

        if class.packet_enable {
            if class.island_leading {
                self.slot = 0;
            }
            self.load_packet(state.position, packets);
            self.slot += 1;
        }

        let payloads = self.channel_payloads(state.position, state.sync, class, pixels)?;

        if state.line_start {
            for encoder in &mut self.encoders {
                encoder.reset_disparity();
            }
        }

        self.symbols =
            array::from_fn(|i| self.encoders[i].encode_symbol(class.period, payloads[i]));

        let effect = if state.video_field_end {
            packets.video_field_end();
            self.frame_count += 1;

            if log::log_enabled!(log::Level::Trace) {
                log::trace!(
                    "Frame {} complete at pixel clock {}; {} packet underruns",
                    self.frame_count,
                    self.pixel_clock,
                    self.packet_underruns
                );
            }

            TickEffect::FrameComplete
        } else {
            TickEffect::None
        };

        self.timing.advance();
        self.pixel_clock += 1;

        Ok(PixelCycle {
            position: state.position,
            sync: state.sync,
            period: class.period,
            packet_enable: class.packet_enable,
            symbols: self.symbols,
            effect,
        })
    }

    /// Run one full pixel period: shift the previously registered symbols out over 10 serial
    /// ticks, then register the next cycle's symbols.
    ///
    /// # Errors
    ///
    /// Propagates any error from the pixel source or the serial sink.
    pub fn tick<P, K, S>(
        &mut self,
        pixels: &mut P,
        packets: &mut K,
        serial_sink: &mut S,
    ) -> HdmiResult<P::Err, S::Err>
    where
        P: PixelSource,
        K: PacketSource,
        S: SerialSink,
    {
        for _ in 0..SYMBOL_LEN {
            let bits = self.serializer.tick(&self.symbols);
            serial_sink.push_bits(bits).map_err(HdmiError::SerialSink)?;
        }

        let cycle = self.tick_pixel(pixels, packets).map_err(HdmiError::PixelSource)?;
        Ok(cycle.effect)
    }

    /// Tick until the end of the current frame.
    ///
    /// # Errors
    ///
    /// Propagates any error from the pixel source or the serial sink.
    pub fn run_frame<P, K, S>(
        &mut self,
        pixels: &mut P,
        packets: &mut K,
        serial_sink: &mut S,
    ) -> Result<(), HdmiError<P::Err, S::Err>>
    where
        P: PixelSource,
        K: PacketSource,
        S: SerialSink,
    {
        while self.tick(pixels, packets, serial_sink)? != TickEffect::FrameComplete {}
        Ok(())
    }

    /// Serialize the full pipeline state.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn save_state(&self) -> Result<Vec<u8>, EncodeError> {
        bincode::encode_to_vec(self, bincode::config::standard())
    }

    /// Restore a pipeline previously saved with [`Self::save_state`].
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes do not decode to a transmitter, or if the decoded config or
    /// timing state is invalid.
    pub fn load_state(bytes: &[u8]) -> Result<Self, DecodeError> {
        let (transmitter, _): (Self, _) =
            bincode::decode_from_slice(bytes, bincode::config::standard())?;

        transmitter.config.validate().map_err(|err| {
            DecodeError::OtherString(format!("saved state has invalid config: {err}"))
        })?;
        transmitter.timing.validate().map_err(|err| {
            DecodeError::OtherString(format!("saved state has invalid timing: {err}"))
        })?;

        Ok(transmitter)
    }

    fn load_packet<K: PacketSource>(&mut self, position: PixelPosition, packets: &mut K) {
        let request = PacketRequest { position, slot: self.slot, pixel_clock: self.pixel_clock };
        let packet = packets.next_packet(request).unwrap_or_else(|| {
            self.packet_underruns += 1;
            log::debug!(
                "Packet source underrun at line {} slot {}; sending Null packet",
                position.cy,
                self.slot
            );
            Packet::NULL
        });

        self.assembler.load(&packet);
    }

    fn channel_payloads<P: PixelSource>(
        &mut self,
        position: PixelPosition,
        sync: SyncLevels,
        class: Classification,
        pixels: &mut P,
    ) -> Result<[ChannelPayload; 3], P::Err> {
        let control = class.control_bits(sync);

        let color = if class.period == Period::VideoData {
            let profile = self.timing.profile();
            pixels.pixel(
                position.cx - profile.screen_start_x(),
                position.cy - profile.screen_start_y(),
            )?
        } else {
            Color::BLACK
        };
        let video = color.to_channel_bytes();

        let island = if class.period == Period::DataIslandData {
            island_nibbles(self.assembler.next_byte(), class.island_leading, sync)
        } else {
            [0; 3]
        };

        Ok(array::from_fn(|i| ChannelPayload {
            video: video[i],
            island: island[i],
            control: control[i],
        }))
    }
}

/// Split a cycle's 9 assembler bits, the leading-edge marker and sync across the three channels'
/// TERC4 nibbles. Channel 0 gets `{!leading, header bit, vsync, hsync}`, channels 1 and 2 the
/// even and odd subpacket bits.
fn island_nibbles(byte: u16, island_leading: bool, sync: SyncLevels) -> [u8; 3] {
    let channel_0 =
        (u8::from(!island_leading) << 3) | (u8::from(byte.bit(0)) << 2) | sync.bits();

    [channel_0, byte.bits(1..=4) as u8, byte.bits(5..=8) as u8]
}

//! Reference packet source carrying audio and the standard per-field InfoFrames

use crate::packet::audio::{self, AudioSamplePacketizer, SAMPLES_PER_PACKET, StereoSample};
use crate::packet::{Packet, PacketRequest, PacketSource, infoframe};
use crate::timing::VideoModeProfile;
use bincode::{Decode, Encode};
use hdmi_config::HdmiConfig;
use std::collections::VecDeque;

/// Roughly 20ms of audio at 48kHz.
pub const DEFAULT_AUDIO_QUEUE_LEN: usize = 1024;

#[derive(Debug, Clone, Encode, Decode)]
pub struct PacketPicker {
    acr_packet: Packet,
    acr_interval: u64,
    last_acr: Option<u64>,
    // Audio, AVI, SPD; sent in this order once per video field
    infoframes: [Packet; 3],
    next_infoframe: usize,
    packetizer: AudioSamplePacketizer,
    audio_queue: VecDeque<StereoSample>,
    audio_queue_len: usize,
    dropped_samples: u64,
}

impl PacketPicker {
    #[must_use]
    pub fn new(config: &HdmiConfig, profile: &VideoModeProfile) -> Self {
        Self::with_audio_queue_len(config, profile, DEFAULT_AUDIO_QUEUE_LEN)
    }

    #[must_use]
    pub fn with_audio_queue_len(
        config: &HdmiConfig,
        profile: &VideoModeProfile,
        audio_queue_len: usize,
    ) -> Self {
        let n = audio::acr_n(config.audio_sample_rate);
        let cts = audio::acr_cts(profile.pixel_rate_hz, config.audio_sample_rate);

        log::info!(
            "Audio clock regeneration for {} Hz at {} Hz pixel clock: N={n}, CTS={cts}",
            config.audio_sample_rate,
            profile.pixel_rate_hz
        );

        Self {
            acr_packet: audio::acr_packet(n, cts),
            acr_interval: cts.into(),
            last_acr: None,
            infoframes: [
                infoframe::audio_infoframe(),
                infoframe::avi_infoframe(config.video_id_code),
                infoframe::spd_infoframe(config),
            ],
            next_infoframe: 0,
            packetizer: AudioSamplePacketizer::new(
                config.audio_sample_rate,
                config.audio_bit_width,
            ),
            audio_queue: VecDeque::with_capacity(audio_queue_len),
            audio_queue_len,
            dropped_samples: 0,
        }
    }

    /// Queue a sample for transmission, dropping the oldest queued sample if the queue is full.
    pub fn push_sample(&mut self, sample: StereoSample) {
        if self.audio_queue_len == 0 {
            self.dropped_samples += 1;
            return;
        }

        if self.audio_queue.len() == self.audio_queue_len {
            self.audio_queue.pop_front();
            self.dropped_samples += 1;
            log::debug!(
                "Audio queue full at {} samples; dropped oldest sample ({} total)",
                self.audio_queue_len,
                self.dropped_samples
            );
        }

        self.audio_queue.push_back(sample);
    }

    #[must_use]
    pub fn queued_samples(&self) -> usize {
        self.audio_queue.len()
    }

    #[must_use]
    pub fn dropped_samples(&self) -> u64 {
        self.dropped_samples
    }

    // A clock earlier than the last ACR means the picker moved to another pipeline; resend
    fn acr_due(&self, pixel_clock: u64) -> bool {
        self.last_acr.is_none_or(|last_acr| {
            pixel_clock.checked_sub(last_acr).is_none_or(|elapsed| elapsed >= self.acr_interval)
        })
    }

    fn audio_sample_packet(&mut self) -> Packet {
        let len = self.audio_queue.len().min(SAMPLES_PER_PACKET);
        let mut samples = [StereoSample::default(); SAMPLES_PER_PACKET];
        for (sample, queued) in samples.iter_mut().zip(self.audio_queue.drain(..len)) {
            *sample = queued;
        }

        self.packetizer.packet(&samples[..len])
    }
}

impl PacketSource for PacketPicker {
    fn next_packet(&mut self, request: PacketRequest) -> Option<Packet> {
        if self.acr_due(request.pixel_clock) {
            self.last_acr = Some(request.pixel_clock);
            return Some(self.acr_packet);
        }

        if !self.audio_queue.is_empty() {
            return Some(self.audio_sample_packet());
        }

        if let Some(&packet) = self.infoframes.get(self.next_infoframe) {
            self.next_infoframe += 1;
            return Some(packet);
        }

        Some(Packet::NULL)
    }

    fn video_field_end(&mut self) {
        if log::log_enabled!(log::Level::Trace) && self.next_infoframe < self.infoframes.len() {
            log::trace!(
                "Field ended with {} InfoFrames unsent",
                self.infoframes.len() - self.next_infoframe
            );
        }

        self.next_infoframe = 0;
    }
}

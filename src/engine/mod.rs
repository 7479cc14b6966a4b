//! The sequencer + synthesizer, exposed publicly as [`Player`].
//!
//! `Player` is the single entry point the core crate exposes (spec §6): a
//! constructor over a byte buffer, a handful of playback-setting mutators,
//! and the two frame-decoding calls. Everything here is synchronous and
//! single-threaded (spec §5) — there is no global state, and a `Player`
//! owns every buffer it touches.

mod channel;
mod mixer;
mod sequencer;

use crate::error::ModuleError;
use crate::formats;
use crate::module::Module;
use channel::ChannelState;

/// Internal cap on how many frames are rendered per sub-block; bounds the
/// scratch buffers regardless of the caller's requested frame count.
const MAX_BLOCK_FRAMES: usize = 1024;

const DEFAULT_SAMPLE_RATE: u32 = 48_000;
const DEFAULT_SPEED: u32 = 6;
const DEFAULT_BPM: u32 = 125;

/// Pending `PositionJump` (B) / `PatternBreak` (D) target, applied at the
/// next line boundary.
#[derive(Debug, Clone, Copy, Default)]
struct PendingJump {
    active: bool,
    pattern_order_idx: usize,
    line_idx: usize,
}

/// A loaded ProTracker module plus its play cursor: the whole decoder.
pub struct Player {
    module: Module,

    sample_rate: u32,
    channel_count: u16,
    stereo_width: f32,

    pattern_order_idx: usize,
    line_idx: usize,
    tick_idx: u32,
    frames_until_next_tick: usize,

    speed: u32,
    bpm: u32,
    pattern_delay: u32,

    pending_jump: PendingJump,

    channels: Vec<ChannelState>,
    mix_scratch: Vec<f32>,
    /// Interleaved float scratch for `decode_frames_i16`, sized for the
    /// widest possible sub-block (stereo, `MAX_BLOCK_FRAMES` frames) so the
    /// player owns it rather than allocating one per call.
    i16_scratch: Vec<f32>,
}

impl Player {
    /// Parse `buf` as a ProTracker MOD file and construct a player
    /// positioned at the start of the song.
    pub fn from_bytes(buf: &[u8]) -> Result<Player, ModuleError> {
        let module = formats::parse(buf)?;

        let default_panning = |i: usize| if (i + 1) & 0x2 == 0 { -1.0 } else { 1.0 };
        let channels = (0..crate::module::NUM_CHANNELS)
            .map(|i| ChannelState::new(default_panning(i)))
            .collect();

        let mut player = Player {
            module,
            sample_rate: DEFAULT_SAMPLE_RATE,
            channel_count: 2,
            stereo_width: 1.0,
            pattern_order_idx: 0,
            line_idx: 0,
            tick_idx: 0,
            frames_until_next_tick: 0,
            speed: DEFAULT_SPEED,
            bpm: DEFAULT_BPM,
            pattern_delay: 0,
            pending_jump: PendingJump::default(),
            channels,
            mix_scratch: vec![0.0; MAX_BLOCK_FRAMES],
            i16_scratch: vec![0.0; MAX_BLOCK_FRAMES * 2],
        };
        player.reset_to_beginning();
        Ok(player)
    }

    /// Set the output sample rate in Hz. Takes effect immediately for
    /// resampling; tick timing recomputes at the next tick boundary.
    pub fn set_sample_rate(&mut self, hz: u32) {
        self.sample_rate = hz;
    }

    /// Select stereo (2-channel) or mono (1-channel) output.
    pub fn set_stereo(&mut self, stereo: bool) {
        self.channel_count = if stereo { 2 } else { 1 };
    }

    /// Clamp and set the stereo width, 0.0 (mono-like) .. 1.0 (hard panning).
    pub fn set_stereo_width(&mut self, width: f32) {
        self.stereo_width = width.clamp(0.0, 1.0);
    }

    /// The parsed module this player is decoding, for display purposes
    /// (song name, sample table, pattern count).
    pub fn module(&self) -> &Module {
        &self.module
    }

    /// Reset the song cursor to (order 0, line 0, tick 0) and (re-)execute
    /// line 0.
    pub fn reset_to_beginning(&mut self) {
        self.pattern_order_idx = 0;
        self.line_idx = 0;
        self.tick_idx = 0;
        self.pattern_delay = 0;
        self.pending_jump = PendingJump::default();
        // A fresh `Player` starts every channel at `ChannelState::new`
        // (silent, no sample latched); `reset_to_beginning` must land on
        // that same state rather than leaving a channel mid-playback from
        // whatever it was doing before the reset, or a module whose line
        // 0 doesn't retrigger every channel would decode differently
        // after a reset than a freshly constructed player would.
        for channel in &mut self.channels {
            *channel = ChannelState::new(channel.panning);
        }
        self.execute_line();
    }

    /// Decode `frame_count` frames as interleaved floats in approximately
    /// `[-1, 1]` into `out`, which must hold `frame_count * channel_count()`
    /// samples.
    pub fn decode_frames_f(&mut self, frame_count: usize, out: &mut [f32]) {
        let out_channels = self.channel_count as usize;
        debug_assert!(out.len() >= frame_count * out_channels);

        let mut frames_remaining = frame_count;
        let mut cursor = 0usize;
        while frames_remaining > 0 {
            let block = frames_remaining
                .min(MAX_BLOCK_FRAMES)
                .min(self.frames_until_next_tick);

            let out_slice = &mut out[cursor * out_channels..(cursor + block) * out_channels];
            self.render_block(block, out_slice);

            cursor += block;
            frames_remaining -= block;
            self.frames_until_next_tick -= block;

            if self.frames_until_next_tick == 0 {
                self.advance_tick();
            }
        }
    }

    /// As [`Player::decode_frames_f`], but scaled to 16-bit signed integers.
    pub fn decode_frames_i16(&mut self, frame_count: usize, out: &mut [i16]) {
        let out_channels = self.channel_count as usize;
        debug_assert!(out.len() >= frame_count * out_channels);

        let mut frames_remaining = frame_count;
        let mut cursor = 0usize;
        while frames_remaining > 0 {
            let block = frames_remaining.min(MAX_BLOCK_FRAMES);
            let mut scratch = std::mem::take(&mut self.i16_scratch);
            let buf = &mut scratch[..block * out_channels];
            self.decode_frames_f(block, buf);
            for (dst, &src) in out[cursor * out_channels..(cursor + block) * out_channels]
                .iter_mut()
                .zip(buf.iter())
            {
                *dst = (src * 32767.0).clamp(-32768.0, 32767.0) as i16;
            }
            self.i16_scratch = scratch;
            cursor += block;
            frames_remaining -= block;
        }
    }

    /// Render `num_frames` frames (all belonging to the current tick; the
    /// caller guarantees `num_frames <= frames_until_next_tick`) into the
    /// interleaved output slice.
    fn render_block(&mut self, num_frames: usize, out: &mut [f32]) {
        out.fill(0.0);

        let sample_rate = self.sample_rate;
        let stereo_width = self.stereo_width;
        let out_channels = self.channel_count;
        let num_channels = self.channels.len() as u16;

        let Player {
            module,
            channels,
            mix_scratch,
            ..
        } = self;

        for channel in channels.iter_mut() {
            let scratch = &mut mix_scratch[..num_frames];
            let sample = module.sample(channel.sample);
            channel.render(sample, sample_rate, scratch);
            mixer::mix_channel(
                scratch,
                out,
                out_channels,
                num_channels,
                channel.panning,
                stereo_width,
            );
        }
    }
}

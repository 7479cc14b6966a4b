//! Song-time progression: the cursor, line/tick execution, and the full
//! effect dispatch table (spec §4.2 / §4.2.1).

use super::{PendingJump, Player};
use crate::module::{Note, NUM_CHANNELS, PATTERN_LINES};

impl Player {
    /// Ticks-per-line for the current line: `speed + pattern_delay`.
    fn ticks_per_line(&self) -> u32 {
        self.speed + self.pattern_delay
    }

    fn recompute_tick_timing(&mut self) {
        let seconds_per_tick = 1.0 / (0.4 * self.bpm as f32);
        // `.max(1)` guards against a degenerate sample_rate/bpm combination
        // rounding the tick length down to zero frames, which would
        // otherwise spin `decode_frames_f`'s sub-block loop forever.
        self.frames_until_next_tick = ((self.sample_rate as f32 * seconds_per_tick) as usize).max(1);
    }

    /// Called whenever `frames_until_next_tick` reaches zero: advances the
    /// tick (and, on a line boundary, the line/pattern cursor) per spec
    /// §4.2's "Line advance".
    pub(super) fn advance_tick(&mut self) {
        self.tick_idx += 1;
        if self.tick_idx < self.ticks_per_line() {
            self.execute_tick();
            return;
        }

        self.tick_idx = 0;
        self.pattern_delay = 0;
        self.line_idx += 1;

        if self.pending_jump.active || self.line_idx >= PATTERN_LINES {
            let old_order_idx = self.pattern_order_idx;

            if self.pending_jump.active {
                // PatternBreak's `x*10 + y` target is decimal-typed but
                // not range-checked in the file format, so a row like
                // 0x64 (x=6,y=4 -> 64) or 0x99 (-> 99) is a structurally
                // valid pattern cell. ProTracker treats an out-of-range
                // break row as row 0; without this guard the jump would
                // land past the pattern's 64 lines and panic on index.
                self.line_idx = if self.pending_jump.line_idx >= PATTERN_LINES {
                    0
                } else {
                    self.pending_jump.line_idx
                };
                self.pattern_order_idx = self.pending_jump.pattern_order_idx;
                self.pending_jump = PendingJump::default();
            } else {
                self.line_idx = 0;
                self.pattern_order_idx += 1;
            }

            if self.pattern_order_idx >= self.module.song_length {
                self.pattern_order_idx = 0; // song loops forever
            }

            if self.pattern_order_idx != old_order_idx {
                #[cfg(feature = "trace")]
                tracing::debug!(
                    from = old_order_idx,
                    to = self.pattern_order_idx,
                    "pattern order advanced"
                );
                for channel in &mut self.channels {
                    channel.loop_start = 0;
                    channel.loop_count = 0;
                }
            }
        }

        self.execute_line();
    }

    /// Latch new notes and (re-)initialize effects for the current line.
    pub(super) fn execute_line(&mut self) {
        let pattern_idx = self.module.pattern_order[self.pattern_order_idx] as usize;
        let line = self.module.patterns[pattern_idx].lines[self.line_idx];

        for channel_idx in 0..NUM_CHANNELS.min(self.channels.len()) {
            let note = line[channel_idx];

            {
                let channel = &mut self.channels[channel_idx];
                // Effects are active only for the line they appear on.
                channel.vol_slide_active = false;
                channel.tremolo_active = false;
                channel.arpeggio_active = false;
                channel.vol_offset = 0;
                channel.retrigger_rate = 0;
                channel.note_cut_idx = 0;
                if note.effect_type != EFFECT_VOLSLIDE_PORT {
                    channel.pitch_slide_active = false;
                }
                if note.effect_type != EFFECT_VOLSLIDE_VIB {
                    channel.vibrato_active = false;
                    channel.pitch_offset = 0.0;
                }
            }

            if (note.period != 0 || note.sample != 0) && note.effect_type != EFFECT_SLIDE_TO_NOTE {
                let sample_idx = if note.sample != 0 {
                    note.sample
                } else {
                    self.channels[channel_idx].sample
                };
                let default_volume = self.module.sample(sample_idx).map(|s| s.volume).unwrap_or(0);

                let channel = &mut self.channels[channel_idx];
                if note.period != 0 {
                    channel.period = note.period;
                }
                if note.sample != 0 {
                    channel.sample = note.sample;
                }
                channel.sample_pos = 0.0;
                channel.sample_looped = false;
                channel.volume = default_volume;

                if note.effect_type != EFFECT_VIBRATO
                    && note.effect_type != EFFECT_TREMOLO
                    && note.effect_type != EFFECT_VOLSLIDE_VIB
                {
                    channel.vib_phase = 0;
                }
            }

            self.execute_effect(channel_idx, note);
        }

        self.recompute_tick_timing();
    }

    /// Advance continuous effects (slides, vibrato, tremolo, arpeggio,
    /// retrigger, note-cut) on every non-line tick.
    fn execute_tick(&mut self) {
        for channel in &mut self.channels {
            if channel.vol_slide_active {
                let new_vol = channel.volume as i16 + channel.vol_slide as i16;
                channel.volume = new_vol.clamp(0, 64) as u8;
            }

            if channel.pitch_slide_active {
                let mut new_period = channel.period as i32 + channel.pitch_slide as i32;
                if channel.target_period != 0 {
                    new_period = if channel.pitch_slide > 0 {
                        new_period.min(channel.target_period as i32)
                    } else {
                        new_period.max(channel.target_period as i32)
                    };
                }
                channel.period = new_period.clamp(20, 20000) as u16;
            }

            if channel.arpeggio_active {
                let phase = self.tick_idx % 3;
                channel.pitch_offset = match phase {
                    0 => 0.0,
                    1 => channel.arpeggio1 as f32,
                    _ => channel.arpeggio2 as f32,
                };
            }

            if channel.vibrato_active || channel.tremolo_active {
                channel.vib_phase = channel.vib_phase.wrapping_add(1);
                let osc_per_tick = channel.vib_rate as f32 / 64.0;
                let wave = super::channel::approx_sin(
                    channel.vib_phase as f32 * osc_per_tick * 2.0 * std::f32::consts::PI,
                );

                if channel.vibrato_active {
                    channel.pitch_offset = wave * channel.vib_depth as f32 / 16.0;
                } else {
                    channel.vol_offset = (wave * channel.vib_depth as f32) as i8;
                }
            }

            if channel.retrigger_rate > 0 && self.tick_idx % channel.retrigger_rate as u32 == 0 {
                channel.sample_pos = 0.0;
            }

            if channel.note_cut_idx != 0 && channel.note_cut_idx as u32 == self.tick_idx {
                channel.volume = 0;
            }
        }

        self.recompute_tick_timing();
    }

    fn flag_jump(&mut self, pattern_order_idx: Option<usize>, line_idx: Option<usize>) {
        if !self.pending_jump.active {
            self.pending_jump.pattern_order_idx = self.pattern_order_idx;
            self.pending_jump.line_idx = 0;
        }
        if let Some(p) = pattern_order_idx {
            self.pending_jump.pattern_order_idx = p;
        }
        if let Some(l) = line_idx {
            self.pending_jump.line_idx = l;
        }
        self.pending_jump.active = true;
    }

    fn execute_effect(&mut self, channel_idx: usize, note: Note) {
        let (x, y) = note.effect_xy();
        let param = note.effect_param;

        match note.effect_type {
            EFFECT_ARPEGGIO => {
                if param != 0 {
                    let channel = &mut self.channels[channel_idx];
                    channel.arpeggio_active = true;
                    channel.arpeggio1 = x;
                    channel.arpeggio2 = y;
                }
            }
            EFFECT_SLIDE_UP => {
                let channel = &mut self.channels[channel_idx];
                channel.pitch_slide_active = true;
                channel.pitch_slide = -(param as i16);
                channel.target_period = 0;
            }
            EFFECT_SLIDE_DOWN => {
                let channel = &mut self.channels[channel_idx];
                channel.pitch_slide_active = true;
                channel.pitch_slide = param as i16;
                channel.target_period = 0;
            }
            EFFECT_SLIDE_TO_NOTE => {
                let channel = &mut self.channels[channel_idx];
                channel.pitch_slide_active = true;
                if note.period != 0 {
                    channel.target_period = note.period;
                }
                if param != 0 {
                    channel.pitch_slide = if channel.target_period > channel.period {
                        param as i16
                    } else {
                        -(param as i16)
                    };
                }
            }
            EFFECT_VIBRATO => {
                let channel = &mut self.channels[channel_idx];
                channel.vibrato_active = true;
                if x != 0 {
                    channel.vib_rate = x;
                }
                if y != 0 {
                    channel.vib_depth = y;
                }
            }
            EFFECT_TREMOLO => {
                let speed = self.speed;
                let channel = &mut self.channels[channel_idx];
                channel.tremolo_active = true;
                if x != 0 {
                    channel.vib_rate = x;
                }
                if y != 0 {
                    // Depth is "baked" against the speed at latch time; if
                    // speed changes later this value goes stale. Preserved
                    // from the original implementation (see spec §9).
                    channel.vib_depth = y.saturating_mul(speed.saturating_sub(1) as u8);
                }
            }
            EFFECT_SET_PAN => {
                // unimplemented, see spec non-goals (Effect_SetPan)
            }
            EFFECT_SET_SAMPLE_OFFSET => {
                if param > 0 {
                    self.channels[channel_idx].sample_pos = 256.0 * param as f32;
                }
            }
            EFFECT_VOLSLIDE | EFFECT_VOLSLIDE_PORT | EFFECT_VOLSLIDE_VIB => {
                let channel = &mut self.channels[channel_idx];
                channel.vol_slide_active = true;
                channel.vol_slide = if x != 0 { x as i8 } else { -(y as i8) };
            }
            EFFECT_POSITION_JUMP => {
                let line = if self.pending_jump.active {
                    None
                } else {
                    Some(0)
                };
                self.flag_jump(Some(param as usize), line);
            }
            EFFECT_SET_VOLUME => {
                // Stored raw, like the original: `0..=64` is the range
                // valid data uses, but the apply-time clamp in
                // `ChannelState::render` is what actually enforces the
                // invariant, matching `volume = param` in spec §4.2.1.
                self.channels[channel_idx].volume = param;
            }
            EFFECT_PATTERN_BREAK => {
                let pattern = if self.pending_jump.active {
                    None
                } else {
                    Some(self.pattern_order_idx + 1)
                };
                let line = (x as usize) * 10 + y as usize;
                self.flag_jump(pattern, Some(line));
            }
            EFFECT_EXTENDED => self.execute_extended_effect(channel_idx, x, y),
            EFFECT_SET_SPEED => {
                let value = param.max(1);
                if value <= 32 {
                    self.speed = value as u32;
                } else {
                    self.bpm = value as u32;
                }
            }
            _ => {}
        }
    }

    fn execute_extended_effect(&mut self, channel_idx: usize, x: u8, y: u8) {
        match x {
            EXT_FINE_SLIDE_UP => {
                let channel = &mut self.channels[channel_idx];
                channel.period = channel.period.saturating_sub(y as u16);
            }
            EXT_FINE_SLIDE_DOWN => {
                let channel = &mut self.channels[channel_idx];
                channel.period = channel.period.saturating_add(y as u16);
            }
            EXT_PATTERN_LOOP => {
                if y == 0 {
                    self.channels[channel_idx].loop_start = self.line_idx as u8;
                } else {
                    let channel = &mut self.channels[channel_idx];
                    if channel.loop_count == 0 {
                        channel.loop_count = y;
                    } else {
                        channel.loop_count -= 1;
                    }

                    if channel.loop_count > 0 {
                        let loop_start = channel.loop_start as usize;
                        let pattern_order_idx = self.pattern_order_idx;
                        #[cfg(feature = "trace")]
                        tracing::debug!(channel_idx, loop_start, "pattern loop back-jump");
                        self.flag_jump(Some(pattern_order_idx), Some(loop_start));
                    }
                }
            }
            EXT_RETRIGGER => {
                self.channels[channel_idx].retrigger_rate = y;
            }
            EXT_FINE_VOLSLIDE_UP => {
                let channel = &mut self.channels[channel_idx];
                channel.volume = (channel.volume + y).min(64);
            }
            EXT_FINE_VOLSLIDE_DOWN => {
                let channel = &mut self.channels[channel_idx];
                channel.volume = channel.volume.saturating_sub(y);
            }
            EXT_NOTE_CUT => {
                let channel = &mut self.channels[channel_idx];
                if y == 0 {
                    channel.volume = 0;
                } else {
                    channel.note_cut_idx = y;
                }
            }
            EXT_PATTERN_DELAY => {
                self.pattern_delay = y as u32 * self.speed;
            }
            // SetFilter, Glissando, SetVibWave, SetFineTune, SetTremWave,
            // SetCoursePan, NoteDelay, InvertLoop: unimplemented per spec
            // non-goals; recognized but silently no-op.
            _ => {}
        }
    }
}

const EFFECT_ARPEGGIO: u8 = 0x0;
const EFFECT_SLIDE_UP: u8 = 0x1;
const EFFECT_SLIDE_DOWN: u8 = 0x2;
const EFFECT_SLIDE_TO_NOTE: u8 = 0x3;
const EFFECT_VIBRATO: u8 = 0x4;
const EFFECT_VOLSLIDE_PORT: u8 = 0x5;
const EFFECT_VOLSLIDE_VIB: u8 = 0x6;
const EFFECT_TREMOLO: u8 = 0x7;
const EFFECT_SET_PAN: u8 = 0x8;
const EFFECT_SET_SAMPLE_OFFSET: u8 = 0x9;
const EFFECT_VOLSLIDE: u8 = 0xA;
const EFFECT_POSITION_JUMP: u8 = 0xB;
const EFFECT_SET_VOLUME: u8 = 0xC;
const EFFECT_PATTERN_BREAK: u8 = 0xD;
const EFFECT_EXTENDED: u8 = 0xE;
const EFFECT_SET_SPEED: u8 = 0xF;

const EXT_FINE_SLIDE_UP: u8 = 0x1;
const EXT_FINE_SLIDE_DOWN: u8 = 0x2;
const EXT_PATTERN_LOOP: u8 = 0x6;
const EXT_RETRIGGER: u8 = 0x9;
const EXT_FINE_VOLSLIDE_UP: u8 = 0xA;
const EXT_FINE_VOLSLIDE_DOWN: u8 = 0xB;
const EXT_NOTE_CUT: u8 = 0xC;
const EXT_PATTERN_DELAY: u8 = 0xE;

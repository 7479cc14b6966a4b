//! Sums per-channel mono buffers into the interleaved output buffer,
//! applying panning and the channel-count gain compensation (spec §4.3).

/// Mix one channel's rendered mono `buffer` into interleaved `out`,
/// which holds `buffer.len()` frames at `out_channels` (1 or 2).
pub fn mix_channel(
    buffer: &[f32],
    out: &mut [f32],
    out_channels: u16,
    num_channels: u16,
    panning: f32,
    stereo_width: f32,
) {
    let gain = out_channels as f32 / num_channels as f32;

    match out_channels {
        1 => {
            for (frame, &sample) in buffer.iter().enumerate() {
                out[frame] += gain * sample;
            }
        }
        2 => {
            let pan = (panning * stereo_width).clamp(-1.0, 1.0);
            let left_gain = gain * (0.5 - 0.5 * pan);
            let right_gain = gain * (0.5 + 0.5 * pan);
            for (frame, &sample) in buffer.iter().enumerate() {
                out[frame * 2] += left_gain * sample;
                out[frame * 2 + 1] += right_gain * sample;
            }
        }
        _ => unreachable!("output_channel_count must be 1 or 2"),
    }
}

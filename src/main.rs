use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use clap::Parser;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use modplayer::Player;

/// Decode and play (or render) a ProTracker MOD file.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The .mod file to load.
    path: PathBuf,

    /// Output sample rate in Hz.
    #[arg(long, default_value_t = 48_000)]
    sample_rate: u32,

    /// Render mono instead of stereo.
    #[arg(long)]
    mono: bool,

    /// Stereo width, 0.0 (mono-like) .. 1.0 (hard panning).
    #[arg(long, default_value_t = 1.0)]
    stereo_width: f32,

    /// Render to a WAV file instead of playing live.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Seconds to render when writing a WAV file.
    #[arg(long, default_value_t = 30.0)]
    seconds: f32,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let buf = fs::read(&args.path)?;
    let mut player = Player::from_bytes(&buf)?;
    tracing::info!(
        path = %args.path.display(),
        name = %player.module().name,
        samples = player.module().samples.len() - 1,
        patterns = player.module().patterns.len(),
        "loaded mod file"
    );

    player.set_sample_rate(args.sample_rate);
    player.set_stereo(!args.mono);
    player.set_stereo_width(args.stereo_width);

    match &args.output {
        Some(out_path) => render_to_wav(player, &args, out_path),
        None => play_live(player, &args),
    }
}

fn render_to_wav(mut player: Player, args: &Args, out_path: &PathBuf) -> Result<(), Box<dyn Error>> {
    let channels = if args.mono { 1 } else { 2 };
    let spec = hound::WavSpec {
        channels,
        sample_rate: args.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(out_path, spec)?;

    let total_frames = (args.seconds * args.sample_rate as f32) as usize;
    let block_frames = 4096;
    let mut buf = vec![0i16; block_frames * channels as usize];

    let mut frames_remaining = total_frames;
    while frames_remaining > 0 {
        let block = frames_remaining.min(block_frames);
        let slice = &mut buf[..block * channels as usize];
        player.decode_frames_i16(block, slice);
        for sample in slice.iter() {
            writer.write_sample(*sample)?;
        }
        frames_remaining -= block;
    }

    writer.finalize()?;
    tracing::info!(path = %out_path.display(), "wrote wav file");
    Ok(())
}

fn play_live(player: Player, args: &Args) -> Result<(), Box<dyn Error>> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or("no default output device")?;
    let mut config = device.default_output_config()?.config();
    config.channels = if args.mono { 1 } else { 2 };
    config.sample_rate = cpal::SampleRate(args.sample_rate);

    let shared = Arc::new(Mutex::new(player));
    let stream_shared = Arc::clone(&shared);

    let stream = device.build_output_stream(
        &config,
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            let channels = config.channels as usize;
            let mut player = stream_shared.lock().expect("player mutex poisoned");
            player.decode_frames_f(data.len() / channels, data);
        },
        |err| tracing::error!(%err, "audio stream error"),
        None,
    )?;

    stream.play()?;
    tracing::info!("playing; press enter to stop");
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(())
}

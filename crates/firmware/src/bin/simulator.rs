//! Desktop simulator: stream a local music directory into the simulated
//! decoder chip, driven by a key script.
//!
//! ```bash
//! cargo run -p firmware --bin simulator --features simulator -- \
//!     --music-dir ./music --keys ".....n....+....q"
//! ```
//!
//! Set `RUST_LOG=debug` for per-block tracing.

use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, ValueEnum};
use firmware::{DapApp, KeyScript, LogStatus};
use platform::config::{APP_NAME, APP_VERSION, DEFAULT_VOLUME};
use platform::mocks::{FakeDelay, SimulatedVs1053};
use platform::storage_local::LocalFileStorage;
use platform::vs1053::{PARAM_BYTE_RATE, SCI_DECODE_TIME};
use platform::DelayWait;
use playback::stream::StreamCursor;
use playback::{AudioPlayer, DecoderConfig, PlayMode, PlayerConfig, RecoveryTier, TickOutcome, Vs1053};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

/// Simulated main-loop period.
const TICK_MS: u64 = 10;

#[derive(Parser, Debug)]
#[command(name = "simulator", version, about = "Stream a music directory into a simulated VS1053")]
struct Args {
    /// Music directory; falls back to MUSIC_PATH
    #[arg(long)]
    music_dir: Option<String>,

    /// Start volume in percent
    #[arg(long, default_value_t = DEFAULT_VOLUME)]
    volume: u8,

    /// Play mode
    #[arg(long, value_enum, default_value_t = ModeArg::Single)]
    mode: ModeArg,

    /// Stop after this many main-loop ticks
    #[arg(long, default_value_t = 1_000_000)]
    max_ticks: u64,

    /// Button script, one key per tick: space/k play, n/l next, p/j previous,
    /// +/- volume, m mode, q back, anything else idle
    #[arg(long, default_value = "")]
    keys: String,

    /// Use the blocking playlist loop instead of the cooperative main loop
    #[arg(long)]
    blocking: bool,

    /// Stream byte rate reported by the simulated decoder
    #[arg(long, default_value_t = 16_000)]
    byte_rate: u16,

    /// Play the chip's sine test with this code and exit
    #[arg(long)]
    sine_test: Option<u8>,

    /// Random-mode seed; defaults to the clock
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Single,
    RepeatOne,
    RepeatAll,
    Random,
}

impl From<ModeArg> for PlayMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Single => PlayMode::Single,
            ModeArg::RepeatOne => PlayMode::RepeatOne,
            ModeArg::RepeatAll => PlayMode::RepeatAll,
            ModeArg::Random => PlayMode::Random,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,firmware=info,playback=info")),
        )
        .init();

    if args.volume > 100 {
        bail!("--volume must be between 0 and 100, got {}", args.volume);
    }
    let storage = match &args.music_dir {
        Some(dir) => LocalFileStorage::new(dir),
        None => LocalFileStorage::from_env().context("pass --music-dir or set MUSIC_PATH")?,
    };
    tracing::info!(
        app = APP_NAME,
        version = APP_VERSION,
        mode = PlayMode::from(args.mode).label(),
        volume = args.volume,
        "starting simulator"
    );

    let chip = SimulatedVs1053::new();
    chip.set_ram(PARAM_BYTE_RATE, args.byte_rate);
    let decoder = Vs1053::new(
        chip.clone(),
        DelayWait::new(FakeDelay::new()),
        DecoderConfig::default(),
    );
    let config = PlayerConfig {
        default_volume: args.volume,
        default_mode: args.mode.into(),
        ..PlayerConfig::default()
    };
    let seed = args.seed.unwrap_or_else(clock_seed);
    let player = AudioPlayer::new(decoder, storage, SmallRng::seed_from_u64(seed), config)
        .with_sink(LogStatus::default());
    let mut app = DapApp::new(player, KeyScript::new(&args.keys));

    let variant = app
        .player_mut()
        .init()
        .map_err(|e| anyhow!("decoder bring-up failed: {e}"))?;
    tracing::info!(?variant, "decoder ready");

    if let Some(code) = args.sine_test {
        let decoder = app.player_mut().decoder_mut();
        decoder
            .sine_test_start(code)
            .map_err(|e| anyhow!("sine test start: {e}"))?;
        tracing::info!(code, tone = ?chip.sine_tone(), "sine test running");
        decoder
            .sine_test_stop()
            .map_err(|e| anyhow!("sine test stop: {e}"))?;
        return Ok(());
    }

    if args.blocking {
        app.run_blocking()
            .map_err(|e| anyhow!("playlist failed: {e}"))?;
    } else {
        run_cooperative(&mut app, &chip, &args)?;
    }

    let sink = *app.player().sink();
    let log = app.player().decoder().recovery_log();
    tracing::info!(
        finished = sink.finished(),
        errors = sink.errors(),
        cooperative = log.count(RecoveryTier::Cooperative),
        soft_resets = log.count(RecoveryTier::SoftReset),
        hard_resets = log.count(RecoveryTier::HardReset),
        "done"
    );
    Ok(())
}

type SimApp<'a> = DapApp<
    SimulatedVs1053,
    DelayWait<FakeDelay>,
    LocalFileStorage,
    SmallRng,
    LogStatus,
    KeyScript<'a>,
>;

/// Main loop: one key and one pump tick per [`TICK_MS`].
fn run_cooperative(app: &mut SimApp<'_>, chip: &SimulatedVs1053, args: &Args) -> Result<()> {
    if args.keys.is_empty() {
        app.player_mut()
            .play_first()
            .map_err(|e| anyhow!("nothing to play: {e}"))?;
    }

    let mut now_ms = 0u64;
    for _ in 0..args.max_ticks {
        let outcome = app.poll(now_ms);
        if let TickOutcome::Finished(end) = outcome {
            tracing::debug!(?end, "stream ended");
        }

        // The simulated chip decodes instantly; derive its clock from bytes sent.
        if let Some(streamed) = app.player().pump().cursor().map(StreamCursor::streamed) {
            let secs = streamed
                .checked_div(u64::from(args.byte_rate))
                .unwrap_or(0);
            chip.set_register(SCI_DECODE_TIME, u16::try_from(secs).unwrap_or(u16::MAX));
        }
        chip.clear_sdi();

        if app.input().is_done() && !app.player().is_playing() {
            break;
        }
        now_ms = now_ms.saturating_add(TICK_MS);
    }

    let status = app.player_mut().status();
    tracing::info!(
        file = status.file.as_str(),
        index = status.index,
        time_secs = status.time_secs,
        volume = status.volume.get(),
        mode = status.mode.label(),
        elapsed_ms = now_ms,
        "stopped"
    );
    Ok(())
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() ^ u64::from(d.subsec_nanos()))
        .unwrap_or(0)
}

mod audio;
mod cli;
mod config;
mod encode;
mod patterns;
mod render;
mod report;
mod settings;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::atomic::AtomicBool;

use audio::analysis::SpectralAnalyzer;
use cli::Cli;
use encode::assemble::VideoAssembler;
use encode::ffmpeg::{FfmpegEncoder, VideoCodec};
use patterns::PatternKind;
use render::frame::PatternRenderer;
use render::sequencer::FrameSequencer;
use report::{GenerationReport, JobSummary};
use settings::{Colors, ConfigError, Effects, Geometry, RenderConfig, TitleSettings};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();

    // Config file: explicit --config, or auto-detect audioline.toml / user config
    if let Some(path) = config::find_config_path(cli.config.as_deref()) {
        match config::load_config(&path) {
            Ok(cfg) => {
                log::info!("Loaded config from {}", path.display());
                cfg.merge_into(&mut cli)
                    .with_context(|| format!("Invalid value in {}", path.display()))?;
            }
            // An explicitly requested config must load
            Err(err) if cli.config.is_some() => return Err(err),
            Err(err) => log::warn!("{:#}", err),
        }
    }

    if cli.list_patterns {
        println!("Available patterns:");
        for kind in PatternKind::ALL {
            println!("  {:<22} {:<26} {}", kind.id(), kind.display_name(), kind.description());
        }
        for (alias, kind) in patterns::aliases() {
            println!("  {:<22} alias for {}", alias, kind.id());
        }
        return Ok(());
    }

    let pattern = patterns::lookup(&cli.pattern).with_context(|| {
        format!(
            "Unknown pattern '{}'. Available: {}",
            cli.pattern,
            patterns::identifiers().collect::<Vec<_>>().join(", ")
        )
    })?;
    let fps = settings::validate_fps(cli.fps)?;

    let input = cli.input.as_ref().context("Input audio file is required")?;
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    let render_config = build_render_config(&cli)?;
    render_config.validate()?;

    log::info!("audioline - procedural line patterns from audio");
    log::info!("Input: {}", input.display());
    log::info!("Pattern: {} ({})", pattern.display_name(), pattern.id());
    log::info!(
        "Resolution: {}x{} @ {}fps",
        render_config.geometry.width,
        render_config.geometry.height,
        fps
    );

    // 1. Decode audio
    log::info!("Decoding audio...");
    let signal = audio::decode::decode_audio(input)?;

    // 2. Spectrogram and band energy
    log::info!("Analyzing audio...");
    let analyzer = SpectralAnalyzer::new(signal);

    let renderer = PatternRenderer::new(render_config, cli.font.as_deref());
    let sequencer = FrameSequencer::new(
        &analyzer,
        &renderer,
        pattern.id(),
        fps,
        cli.duration,
        cli.normalization,
    );
    let mut rng = ChaCha8Rng::seed_from_u64(cli.seed);

    // Single preview frame
    if let Some(at) = cli.preview_at {
        let path = cli.output.with_extension("png");
        let frame = sequencer.render_at(at, &mut rng);
        frame.save_png(&path)?;
        log::info!("Preview at {:.2}s written to {}", at, path.display());
        return Ok(());
    }

    let total_frames = sequencer.total_frames();
    log::info!(
        "Total frames: {}, Duration: {:.1}s",
        total_frames,
        sequencer.duration()
    );

    // Paced playback into a single PNG
    if let Some(ref live) = cli.live {
        let cancel = AtomicBool::new(false);
        let shown = sequencer.play(&mut rng, &cancel, |frame| {
            if let Err(err) = frame.save_png(live) {
                log::warn!("{:#}", err);
            }
        });
        log::info!("Live playback finished after {} frames", shown);
        return Ok(());
    }

    // 3. Render frames to the job directory
    let assembler = VideoAssembler::new(FfmpegEncoder::new(VideoCodec {
        codec: cli.codec.clone(),
        pix_fmt: cli.pix_fmt.clone(),
        crf: cli.crf,
    }))?;

    let pb = ProgressBar::new(total_frames as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} frames ({eta} remaining)")
            .unwrap()
            .progress_chars("=>-"),
    );
    let frames = sequencer.persist(&assembler.frame_dir(), &mut rng, |done, _| {
        pb.set_position(done as u64)
    })?;
    pb.finish_with_message("Rendering complete");

    // 4. Encode and mux
    let video = assembler.assemble(frames, fps, analyzer.signal(), sequencer.duration())?;
    std::fs::write(&cli.output, &video.bytes)
        .with_context(|| format!("Failed to write output: {}", cli.output.display()))?;
    log::info!("Done! Output: {}", cli.output.display());

    let report = GenerationReport::new(
        JobSummary {
            input,
            duration_secs: sequencer.duration(),
            sample_rate: analyzer.signal().sample_rate(),
            fps,
            total_frames: video.total_frames,
            quality: cli.quality,
            normalization: cli.normalization,
            shares: video.shares,
        },
        pattern,
        renderer.config(),
    );
    println!("{}", report);
    if let Some(ref path) = cli.report {
        report.write_json(path)?;
        log::info!("Report written to {}", path.display());
    }

    Ok(())
}

fn build_render_config(cli: &Cli) -> Result<RenderConfig, ConfigError> {
    Ok(RenderConfig {
        colors: Colors {
            low: cli.low_color.parse()?,
            mid: cli.mid_color.parse()?,
            high: cli.high_color.parse()?,
            background: cli.background.parse()?,
        },
        effects: Effects {
            intensity: cli.intensity,
            speed: cli.speed,
            randomness: cli.randomness,
            alpha: cli.alpha,
            glow: cli.glow,
            grid: cli.grid,
            special_grid: cli.special_grid,
        },
        geometry: Geometry::new(cli.aspect, cli.quality, cli.dpi),
        title: TitleSettings {
            text: cli.title.clone(),
            size: cli.title_size,
            color: cli.title_color.parse()?,
            horizontal: cli.title_x,
            vertical: cli.title_y,
        },
    })
}

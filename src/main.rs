//! Monologue CLI binary entry point.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use monologue::audio::{AssetStore, AudioPlayer, SimulatedPlayer, SymphoniaProbe};
use monologue::cli::{Cli, Commands, GenerateArgs};
use monologue::config::MonologueConfig;
use monologue::error::Result;
use monologue::generation::OpenAiChatClient;
use monologue::pipeline::{
    Coordinator, PipelineEvent, PipelineEventPayload, PipelineEventSink, PipelineOptions,
    PipelineStatus, PlaybackStart,
};
use monologue::speech::{OpenAiSpeechProvider, SpeechSynthesisClient};
use monologue::types::{PodcastRequest, Voice};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate(args) => handle_generate(args).await,
        Commands::Voices => {
            for voice in Voice::all() {
                println!("{:<8} {}", voice.id(), voice.description());
            }
            Ok(ExitCode::SUCCESS)
        }
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {e}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("monologue=info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}

async fn handle_generate(args: GenerateArgs) -> Result<ExitCode> {
    let mut config = MonologueConfig::from_env()?;
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }
    if let Some(max) = args.max_segments {
        config.max_segments = max;
    }

    let generator = Arc::new(OpenAiChatClient::from_config(&config)?);
    let provider = Arc::new(OpenAiSpeechProvider::from_config(&config)?);
    let synthesizer = Arc::new(SpeechSynthesisClient::new(provider, Arc::new(SymphoniaProbe)));
    let player = open_player(args.no_playback)?;

    // Stream progress to stderr; the transcript goes to stdout at the end.
    let sink: PipelineEventSink = Arc::new(|event: PipelineEvent| match &event.payload {
        PipelineEventPayload::SegmentGenerated { index, phase, .. } => {
            eprintln!("· segment {} written ({phase})", index + 1);
        }
        PipelineEventPayload::SegmentSynthesized {
            index,
            duration_secs,
            accumulated_secs,
        } => {
            eprintln!(
                "· segment {} voiced: {duration_secs:.1}s, {accumulated_secs:.1}s total",
                index + 1
            );
        }
        PipelineEventPayload::PlaybackStarted { index } => {
            eprintln!("▶ playing segment {}", index + 1);
        }
        _ => {}
    });

    let options = PipelineOptions {
        playback_enabled: !args.no_playback,
        playback_start: if args.after_production {
            PlaybackStart::AfterProduction
        } else {
            PlaybackStart::AfterFirstSegment
        },
        event_sink: Some(sink),
        ..PipelineOptions::from_config(&config)
    };
    let format = options.format;
    let coordinator = Coordinator::new(generator, synthesizer, player, options);

    let mut request = PodcastRequest::from_minutes(args.topic, args.voice, f64::from(args.minutes))?;
    request.title = args.title;

    let handle = coordinator.start(request)?;
    let asset_dir = handle.asset_dir().to_path_buf();
    let cancel = handle.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nstopping…");
            cancel.cancel();
        }
    });

    let outcome = handle.wait().await;
    let paths = AssetStore::new(&asset_dir, format)
        .write_record(&outcome.conversation)
        .await?;
    eprintln!("record: {}", paths.record.display());

    match outcome.status {
        PipelineStatus::Completed => {
            println!("{}", outcome.conversation.transcript());
            eprintln!("transcript: {}", paths.transcript.display());
            Ok(ExitCode::SUCCESS)
        }
        PipelineStatus::Canceled => {
            eprintln!("canceled after {} segment(s)", outcome.conversation.segment_count());
            Ok(ExitCode::from(130))
        }
        PipelineStatus::Failed => {
            match outcome.error {
                Some(e) => eprintln!("{}: {e}", e.user_message()),
                None => eprintln!("generation failed"),
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

#[cfg(feature = "playback")]
fn open_player(no_playback: bool) -> Result<Arc<dyn AudioPlayer>> {
    if no_playback {
        return Ok(Arc::new(SimulatedPlayer::new()));
    }
    Ok(Arc::new(monologue::audio::RodioPlayer::open_default()?))
}

#[cfg(not(feature = "playback"))]
fn open_player(no_playback: bool) -> Result<Arc<dyn AudioPlayer>> {
    if !no_playback {
        tracing::warn!("built without the `playback` feature; pacing playback without audio output");
    }
    Ok(Arc::new(SimulatedPlayer::new()))
}

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use loqa_stt_stream::{
    create_router, spawn_websocket_session, AppState, AudioFile, AudioInput, Config,
    IamTokenAuthority, NatsClient, SessionConfig, SessionEvent, StartDescriptor, TokenAuthority,
    WebSocketSessionFactory,
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "loqa-stt-stream", version, about = "Streaming speech-to-text relay")]
struct Cli {
    /// Configuration file (extension optional)
    #[arg(short, long, default_value = "config/loqa-stt-stream")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve,
    /// Stream a 16-bit PCM WAV file to the recognizer and print transcripts
    Stream {
        file: PathBuf,

        /// Channel ID used in logs
        #[arg(long)]
        channel: Option<String>,

        /// Override the configured audio language (e.g. "fr-FR")
        #[arg(long)]
        language: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config))?;

    info!("Loqa STT Stream v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);

    let authority: Arc<dyn TokenAuthority> =
        Arc::new(IamTokenAuthority::new(cfg.stt.iam_url.clone()));

    match cli.command {
        Command::Serve => serve(cfg, authority).await,
        Command::Stream {
            file,
            channel,
            language,
        } => stream_file(cfg, authority, file, channel, language).await,
    }
}

async fn serve(cfg: Config, authority: Arc<dyn TokenAuthority>) -> Result<()> {
    let publisher = match &cfg.nats.url {
        Some(url) => Some(Arc::new(
            NatsClient::connect(url, cfg.nats.subject_prefix.clone()).await?,
        )),
        None => {
            info!("No NATS URL configured, events are kept in memory only");
            None
        }
    };

    let state = AppState::new(
        cfg.stt.clone(),
        Arc::new(WebSocketSessionFactory { authority }),
        publisher,
    )
    .with_event_history(cfg.service.http.event_history);
    let app = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app).await.context("HTTP server failed")?;

    Ok(())
}

async fn stream_file(
    cfg: Config,
    authority: Arc<dyn TokenAuthority>,
    file: PathBuf,
    channel: Option<String>,
    language: Option<String>,
) -> Result<()> {
    let audio = AudioFile::open(&file)?;

    let channel = channel.unwrap_or_else(|| format!("stream-{}", uuid::Uuid::new_v4()));
    let mut session_cfg = SessionConfig::from_stt(channel, &cfg.stt);
    if language.is_some() {
        session_cfg.language = language;
    }

    let (handle, mut events) = spawn_websocket_session(session_cfg, authority)?;

    handle.submit(AudioInput::Start(
        StartDescriptor::default()
            .with_content_type(&audio.content_type())
            .with_interim_results(cfg.stt.interim_results),
    ))?;

    let chunk_ms = cfg.stream.chunk_ms;
    let chunks = audio.pcm_chunks(chunk_ms);
    info!("Streaming {} chunks of {}ms", chunks.len(), chunk_ms);

    let feeder = {
        let handle = handle.clone();
        tokio::spawn(async move {
            for chunk in chunks {
                if handle.submit(AudioInput::Data(chunk)).is_err() {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(chunk_ms)).await;
            }
            let _ = handle.submit(AudioInput::Stop);
        })
    };

    let idle = Duration::from_secs(cfg.stream.idle_secs);
    loop {
        match tokio::time::timeout(idle, events.recv()).await {
            Ok(Some(event)) => print_event(&event),
            Ok(None) => break,
            Err(_) if feeder.is_finished() => break,
            Err(_) => continue,
        }
    }

    let stats = handle.shutdown().await?;
    info!(
        "Stream finished: {} frames sent over {} connections",
        stats.frames_sent, stats.connections_opened
    );

    Ok(())
}

fn print_event(event: &SessionEvent) {
    match event {
        SessionEvent::Listening { .. } => info!("Recognizer listening"),
        SessionEvent::Results { .. } => {
            if let Some(text) = event.transcript() {
                if event.is_final() {
                    println!("\r{}", text);
                } else {
                    print!("\r{}", text);
                    std::io::stdout().flush().ok();
                }
            }
        }
        SessionEvent::Error { kind, message } => warn!("{:?}: {}", kind, message),
    }
}

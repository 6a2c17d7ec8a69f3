//! Voice Coach console entry point
//!
//! Opens one realtime voice conversation and prints its events. Typed lines are
//! sent as user turns; slash commands control the session.

mod commands;
mod wav;

use anyhow::Context;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use voice_coach_agent::{ConversationConfig, ConversationEvent, VoiceConversation};
use voice_coach_config::constants::audio::SAMPLE_RATE;
use voice_coach_config::{load_settings, Settings};
use voice_coach_transport::{HttpCredentialIssuer, RealtimeWsFactory};

use commands::{Command, HELP};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Priority: env vars > config/{env} > config/default > defaults
    let env = std::env::var("VOICE_COACH_ENV").ok();
    let settings = match load_settings(env.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            // Tracing not yet initialized
            eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
            Settings::default()
        },
    };

    init_tracing(&settings);

    tracing::info!(
        env = env.as_deref().unwrap_or("default"),
        production = settings.environment.is_production(),
        persona = %settings.persona.name,
        "Starting voice-coach v{}",
        env!("CARGO_PKG_VERSION")
    );

    let issuer = HttpCredentialIssuer::from_settings(&settings.realtime)
        .context("Failed to create credential issuer")?;
    let factory = Arc::new(RealtimeWsFactory::from_settings(&settings.realtime));

    let conversation = Arc::new(VoiceConversation::new(
        ConversationConfig::from(&settings),
        settings.persona.clone(),
        Arc::new(issuer),
        factory.clone(),
        None,
    ));

    let printer = tokio::spawn(print_events(conversation.subscribe()));

    start(&conversation).await;
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        let line = tokio::select! {
            _ = &mut shutdown => break,
            line = lines.next_line() => line.context("Failed to read stdin")?,
        };
        let Some(line) = line else {
            break;
        };

        match Command::parse(&line) {
            Command::Empty => {},
            Command::Say(text) => match conversation.send_voice_message(&text) {
                Ok(true) => {},
                Ok(false) => println!("(not connected, type /start)"),
                Err(e) => tracing::warn!(error = %e, "Failed to send message"),
            },
            Command::Persona(name) => {
                let mut persona = conversation.persona();
                persona.id = name.to_lowercase().replace(char::is_whitespace, "-");
                persona.name = name;
                if let Err(e) = conversation.update_persona(persona) {
                    tracing::warn!(error = %e, "Failed to update persona");
                }
            },
            Command::Voice(voice) => {
                let persona = conversation.persona().with_voice(voice);
                if let Err(e) = conversation.update_persona(persona) {
                    tracing::warn!(error = %e, "Failed to update voice");
                }
            },
            Command::Play(path) => play(&conversation, &factory, &path),
            Command::Start => start(&conversation).await,
            Command::Stop => conversation.stop_voice(),
            Command::Help => println!("{}", HELP),
            Command::Quit => break,
            Command::Unknown(input) => println!("Unknown command: {} (try /help)", input),
        }
    }

    conversation.stop_voice();
    printer.abort();
    tracing::info!("voice-coach stopped");

    Ok(())
}

async fn start(conversation: &VoiceConversation) {
    match conversation.start_voice().await {
        Ok(true) => {},
        Ok(false) => println!("(voice session already active)"),
        Err(e) => println!("Could not start voice session: {}", e),
    }
}

/// Stream a WAV file into the active session's capture track
fn play(conversation: &VoiceConversation, factory: &RealtimeWsFactory, path: &std::path::Path) {
    let Some(track) = factory.capture().filter(|_| conversation.is_active()) else {
        println!("(not connected, type /start)");
        return;
    };

    let samples = match wav::load_pcm16(path) {
        Ok(samples) => samples,
        Err(e) => {
            println!("Could not read audio file: {:#}", e);
            return;
        },
    };

    println!(
        "(playing {} ({:.1}s))",
        path.display(),
        samples.len() as f32 / SAMPLE_RATE as f32
    );
    tokio::spawn(async move {
        let frames = wav::stream_into(track, samples).await;
        tracing::debug!(frames, "Finished streaming audio file");
    });
}

async fn print_events(mut events: tokio::sync::broadcast::Receiver<ConversationEvent>) {
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Event printer lagged");
                continue;
            },
            Err(RecvError::Closed) => break,
        };

        match event {
            ConversationEvent::Connected { session_id, model } => {
                println!("[connected] session {} ({})", session_id, model)
            },
            ConversationEvent::Disconnected { reason, .. } => println!("[disconnected] {}", reason),
            ConversationEvent::UserSpeechStarted => println!("[you are speaking]"),
            ConversationEvent::UserTranscriptUpdate { text, is_final: false } => {
                println!("  ... {}", text)
            },
            ConversationEvent::UserMessage { text } => println!("you: {}", text),
            ConversationEvent::AssistantMessage { text } => println!("assistant: {}", text),
            ConversationEvent::UserTranscriptUpdate { .. }
            | ConversationEvent::TurnChanged(_)
            | ConversationEvent::ResponseRequested => {
                tracing::debug!(?event, "Conversation event");
            },
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        }
    }
}

fn init_tracing(settings: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &settings.observability.log_level;
        format!("voice_coach={},warn", level).into()
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if settings.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    subscriber.with(fmt_layer).init();
}

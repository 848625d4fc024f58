//! voicebridge-demo: drive a recognition session against the scripted mock
//!
//! Wires the session to the in-tree mock recognizer and a static permission
//! store, subscribes to every event, and runs one listen attempt end to end.
//! Useful for watching event ordering and state transitions in the logs.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use voicebridge::mock::MockRecognizerFactory;
use voicebridge::{Config, NativeCallback, SpeechSession, StaticPermissions};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "voicebridge demo starting"
    );

    let config = Config::load();
    info!(?config.default_language, "configuration loaded");

    // Scripted recognition: the same callback sequence a platform
    // recognizer would deliver for one short utterance.
    let factory = MockRecognizerFactory::new().with_start_script(vec![
        NativeCallback::Ready,
        NativeCallback::BeginningOfSpeech,
        NativeCallback::RmsChanged(0.4),
        NativeCallback::RmsChanged(0.7),
        NativeCallback::PartialResults(vec!["hello".into()]),
        NativeCallback::PartialResults(vec!["hello world".into()]),
        NativeCallback::Results(vec!["hello world".into(), "hello word".into()]),
        NativeCallback::EndOfSpeech,
    ]);

    let session = SpeechSession::spawn(
        config,
        Arc::new(StaticPermissions::granted()),
        Arc::new(factory),
    );

    let _begin = session.on_speech_begin(|| info!("recognizer ready"));
    let _start = session.on_speech_start(|| info!("speech began"));
    let _volume = session.on_speech_volume_changed(|rms_db| info!(rms_db, "volume"));
    let _partial = session
        .on_speech_partial_results(|partial_text, _| info!(%partial_text, "partial result"));
    let _end = session.on_speech_end(|ended| info!(ended, "end of speech"));
    let _error = session.on_speech_error(|code, message| info!(code, %message, "error"));

    // Forward the final result out of the callback so the demo can await it.
    let (final_tx, mut final_rx) = mpsc::unbounded_channel();
    let _results = session.on_speech_results(move |text, alternatives| {
        let _ = final_tx.send((text, alternatives));
    });

    info!(
        granted = session.check_permissions().await,
        "microphone permission"
    );

    session.start_listening(None).await?;

    tokio::select! {
        result = final_rx.recv() => {
            if let Some((text, alternatives)) = result {
                info!(%text, ?alternatives, "final result");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted, cancelling");
            let _ = session.cancel_listening().await;
        }
    }

    session.destroy().await?;

    info!("voicebridge demo stopped");
    Ok(())
}

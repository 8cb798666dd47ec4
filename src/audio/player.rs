//! Audio players used by the playback consumer.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::{MonologueError, Result};
use crate::types::AudioAsset;

/// Plays one clip at a time.
#[async_trait]
pub trait AudioPlayer: Send + Sync {
    /// Play `asset`, resolving once playback has finished.
    ///
    /// Resolves with [`MonologueError::Canceled`] when interrupted by
    /// [`AudioPlayer::stop`].
    async fn play(&self, asset: &AudioAsset) -> Result<()>;

    /// Interrupt the clip currently playing, if any.
    fn stop(&self);
}

/// Headless player that waits for each clip's probed length.
#[derive(Debug, Clone)]
pub struct SimulatedPlayer {
    speed: f64,
    stops: Arc<watch::Sender<u64>>,
}

impl Default for SimulatedPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedPlayer {
    pub fn new() -> Self {
        Self {
            speed: 1.0,
            stops: Arc::new(watch::channel(0).0),
        }
    }

    /// Play back faster (`> 1.0`) or slower than real time.
    pub fn with_speed(mut self, speed: f64) -> Self {
        if speed.is_finite() && speed > 0.0 {
            self.speed = speed;
        }
        self
    }
}

#[async_trait]
impl AudioPlayer for SimulatedPlayer {
    async fn play(&self, asset: &AudioAsset) -> Result<()> {
        let mut stops = self.stops.subscribe();
        let wait = Duration::from_secs_f64(asset.duration.as_secs_f64() / self.speed);
        tokio::select! {
            _ = stops.changed() => Err(MonologueError::Canceled),
            _ = tokio::time::sleep(wait) => Ok(()),
        }
    }

    fn stop(&self) {
        self.stops.send_modify(|n| *n += 1);
    }
}

#[cfg(feature = "playback")]
pub use rodio_output::RodioPlayer;

#[cfg(feature = "playback")]
mod rodio_output {
    use std::fs::File;
    use std::io::BufReader;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{mpsc, Arc};

    use async_trait::async_trait;

    use super::AudioPlayer;
    use crate::error::{MonologueError, Result};
    use crate::types::AudioAsset;

    /// Speaker output through the default rodio device.
    ///
    /// The output stream lives on a dedicated thread for as long as the
    /// player exists; playback completion comes from the sink draining.
    pub struct RodioPlayer {
        sink: Arc<rodio::Sink>,
        stops: AtomicU64,
        shutdown: Option<mpsc::Sender<()>>,
    }

    impl RodioPlayer {
        pub fn open_default() -> Result<Self> {
            let (ready_tx, ready_rx) = mpsc::channel();
            let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

            std::thread::Builder::new()
                .name("monologue-audio".to_string())
                .spawn(move || {
                    let stream = match rodio::OutputStreamBuilder::open_default_stream() {
                        Ok(stream) => stream,
                        Err(e) => {
                            let _ = ready_tx.send(Err(e.to_string()));
                            return;
                        }
                    };
                    let sink = Arc::new(rodio::Sink::connect_new(stream.mixer()));
                    let _ = ready_tx.send(Ok(sink));
                    // Hold the stream until the player is dropped.
                    let _ = shutdown_rx.recv();
                    drop(stream);
                })
                .map_err(|e| MonologueError::Playback(format!("audio thread: {e}")))?;

            let sink = ready_rx
                .recv()
                .map_err(|_| MonologueError::Playback("audio thread exited".to_string()))?
                .map_err(|e| MonologueError::Playback(format!("no output device: {e}")))?;

            Ok(Self {
                sink,
                stops: AtomicU64::new(0),
                shutdown: Some(shutdown_tx),
            })
        }
    }

    #[async_trait]
    impl AudioPlayer for RodioPlayer {
        async fn play(&self, asset: &AudioAsset) -> Result<()> {
            let stops_before = self.stops.load(Ordering::SeqCst);
            let file = File::open(&asset.path)
                .map_err(|e| MonologueError::local_io(&asset.path, e))?;
            let decoder = rodio::Decoder::new(BufReader::new(file)).map_err(|e| {
                MonologueError::Playback(format!("{}: {e}", asset.path.display()))
            })?;

            self.sink.append(decoder);
            self.sink.play();

            let sink = Arc::clone(&self.sink);
            tokio::task::spawn_blocking(move || sink.sleep_until_end())
                .await
                .map_err(|e| MonologueError::Playback(e.to_string()))?;

            if self.stops.load(Ordering::SeqCst) != stops_before {
                return Err(MonologueError::Canceled);
            }
            Ok(())
        }

        fn stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
            self.sink.stop();
        }
    }

    impl Drop for RodioPlayer {
        fn drop(&mut self) {
            self.sink.stop();
            if let Some(tx) = self.shutdown.take() {
                let _ = tx.send(());
            }
        }
    }
}

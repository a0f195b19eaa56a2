//! Speaker output through `rodio`.
//!
//! `OutputStream` is not `Send`, so a dedicated thread owns the stream and
//! the active sink and is driven over a command channel. Each clip gets a
//! playback id so a late stop from an aborted run cannot silence the clip
//! that replaced it.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use lesson_core::audio::{AudioError, AudioManager};
use lesson_core::cancellation::CancellationToken;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

const SINK_POLL: Duration = Duration::from_millis(20);

type PlaybackDone = oneshot::Sender<Result<(), AudioError>>;

enum AudioCommand {
    Play {
        id: u64,
        url: String,
        path: PathBuf,
        done: PlaybackDone,
    },
    Stop {
        id: u64,
    },
    StopAll,
    Shutdown,
}

struct ActiveClip {
    id: u64,
    url: String,
    sink: Sink,
    done: PlaybackDone,
}

impl ActiveClip {
    fn abort(self) {
        debug!(id = self.id, url = %self.url, "Stopping clip");
        self.sink.stop();
        let _ = self.done.send(Err(AudioError::Aborted));
    }
}

pub struct RodioAudioManager {
    commands: mpsc::Sender<AudioCommand>,
    next_id: AtomicU64,
    audio_root: PathBuf,
}

impl RodioAudioManager {
    /// Open the default output device. Relative clip urls resolve against
    /// `audio_root`.
    pub fn new(audio_root: PathBuf, volume: f32) -> Result<Self> {
        let (commands, rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();
        let volume = volume.clamp(0.0, 1.0);

        thread::Builder::new()
            .name("audio-output".to_string())
            .spawn(move || audio_thread(rx, ready_tx, volume))
            .context("Spawning audio output thread")?;

        ready_rx
            .recv()
            .context("Audio output thread exited during startup")?
            .map_err(|err| anyhow!(err))
            .context("Opening audio output")?;

        info!(root = %audio_root.display(), volume, "Audio output ready");
        Ok(Self {
            commands,
            next_id: AtomicU64::new(1),
            audio_root,
        })
    }

    fn resolve(&self, url: &str) -> PathBuf {
        resolve_clip_path(&self.audio_root, url)
    }

    fn send(&self, command: AudioCommand) -> Result<(), AudioError> {
        self.commands
            .send(command)
            .map_err(|_| AudioError::Unavailable("audio output thread stopped".to_string()))
    }
}

impl Drop for RodioAudioManager {
    fn drop(&mut self) {
        let _ = self.commands.send(AudioCommand::Shutdown);
    }
}

#[async_trait]
impl AudioManager for RodioAudioManager {
    async fn play(&self, url: &str, cancel: &CancellationToken) -> Result<(), AudioError> {
        if cancel.is_cancelled() {
            return Err(AudioError::Aborted);
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (done, finished) = oneshot::channel();
        self.send(AudioCommand::Play {
            id,
            url: url.to_string(),
            path: self.resolve(url),
            done,
        })?;

        tokio::select! {
            result = finished => result.unwrap_or_else(|_| {
                Err(AudioError::Unavailable("audio output thread dropped clip".to_string()))
            }),
            _ = cancel.cancelled() => {
                let _ = self.send(AudioCommand::Stop { id });
                Err(AudioError::Aborted)
            }
        }
    }

    async fn duration_secs(&self, url: &str) -> Result<f64, AudioError> {
        let path = self.resolve(url);
        let owned_url = url.to_string();
        tokio::task::spawn_blocking(move || probe_duration_secs(&path, &owned_url))
            .await
            .map_err(|err| AudioError::Load {
                url: url.to_string(),
                reason: format!("duration probe panicked: {err}"),
            })?
    }

    fn stop_all(&self) {
        if self.send(AudioCommand::StopAll).is_err() {
            warn!("stop_all ignored; audio output thread is gone");
        }
    }
}

fn audio_thread(
    rx: mpsc::Receiver<AudioCommand>,
    ready: mpsc::Sender<Result<(), String>>,
    volume: f32,
) {
    let (_stream, handle) = match OutputStream::try_default() {
        Ok(output) => output,
        Err(err) => {
            let _ = ready.send(Err(err.to_string()));
            return;
        }
    };
    let _ = ready.send(Ok(()));

    let mut active: Option<ActiveClip> = None;
    loop {
        let command = if active.is_some() {
            match rx.recv_timeout(SINK_POLL) {
                Ok(command) => Some(command),
                Err(mpsc::RecvTimeoutError::Timeout) => None,
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
        } else {
            match rx.recv() {
                Ok(command) => Some(command),
                Err(_) => break,
            }
        };

        match command {
            Some(AudioCommand::Play { id, url, path, done }) => {
                if let Some(previous) = active.take() {
                    previous.abort();
                }
                match start_sink(&handle, &path, volume) {
                    Ok(sink) => {
                        debug!(id, url = %url, path = %path.display(), "Clip started");
                        active = Some(ActiveClip { id, url, sink, done });
                    }
                    Err(err) => {
                        let _ = done.send(Err(AudioError::Load {
                            url,
                            reason: format!("{err:#}"),
                        }));
                    }
                }
            }
            Some(AudioCommand::Stop { id }) => {
                if active.as_ref().is_some_and(|clip| clip.id == id) {
                    if let Some(clip) = active.take() {
                        clip.abort();
                    }
                }
            }
            Some(AudioCommand::StopAll) => {
                if let Some(clip) = active.take() {
                    clip.abort();
                }
            }
            Some(AudioCommand::Shutdown) => break,
            None => {}
        }

        if active.as_ref().is_some_and(|clip| clip.sink.empty()) {
            if let Some(clip) = active.take() {
                debug!(id = clip.id, url = %clip.url, "Clip finished");
                let _ = clip.done.send(Ok(()));
            }
        }
    }

    if let Some(clip) = active.take() {
        clip.abort();
    }
    debug!("Audio output thread exiting");
}

fn start_sink(handle: &OutputStreamHandle, path: &Path, volume: f32) -> Result<Sink> {
    let file = File::open(path).with_context(|| format!("Opening {}", path.display()))?;
    let source = Decoder::new(BufReader::new(file))
        .with_context(|| format!("Decoding {}", path.display()))?;
    let sink = Sink::try_new(handle).context("Creating sink")?;
    sink.set_volume(volume);
    sink.append(source);
    sink.play();
    Ok(sink)
}

fn probe_duration_secs(path: &Path, url: &str) -> Result<f64, AudioError> {
    let load_error = |reason: String| AudioError::Load {
        url: url.to_string(),
        reason,
    };

    let is_wav = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));
    if is_wav {
        let reader = hound::WavReader::open(path).map_err(|err| load_error(err.to_string()))?;
        let sample_rate = reader.spec().sample_rate;
        if sample_rate == 0 {
            return Err(load_error("wav header reports zero sample rate".to_string()));
        }
        return Ok(f64::from(reader.duration()) / f64::from(sample_rate));
    }

    let file = File::open(path).map_err(|err| load_error(err.to_string()))?;
    Decoder::new(BufReader::new(file))
        .map_err(|err| load_error(err.to_string()))?
        .total_duration()
        .map(|duration| duration.as_secs_f64())
        .ok_or_else(|| load_error("decoder does not report a duration".to_string()))
}

/// `file://` prefixes are stripped; absolute paths are kept as-is.
pub fn resolve_clip_path(root: &Path, url: &str) -> PathBuf {
    let trimmed = url.trim();
    let trimmed = trimmed.strip_prefix("file://").unwrap_or(trimmed);
    let candidate = Path::new(trimmed);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        root.join(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_temp_file(name: &str, extension: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        std::env::temp_dir().join(format!("lesson-player-{name}-{nanos}.{extension}"))
    }

    #[test]
    fn relative_urls_resolve_against_root() {
        let root = Path::new("/lessons/unit-1");
        assert_eq!(
            resolve_clip_path(root, "audio/a.mp3"),
            PathBuf::from("/lessons/unit-1/audio/a.mp3")
        );
        assert_eq!(
            resolve_clip_path(root, "file:///srv/clips/b.wav"),
            PathBuf::from("/srv/clips/b.wav")
        );
        assert_eq!(
            resolve_clip_path(root, " /abs/c.ogg "),
            PathBuf::from("/abs/c.ogg")
        );
    }

    #[test]
    fn wav_duration_comes_from_header() {
        let path = unique_temp_file("duration", "wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).expect("create wav");
        for _ in 0..12_000 {
            writer.write_sample(0i16).expect("write sample");
        }
        writer.finalize().expect("finalize wav");

        let secs = probe_duration_secs(&path, "clip.wav").expect("probe duration");
        assert!((secs - 1.5).abs() < 1e-9);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn missing_clip_reports_load_error() {
        let path = unique_temp_file("missing", "mp3");
        let err = probe_duration_secs(&path, "missing.mp3").expect_err("missing file should fail");
        assert!(matches!(err, AudioError::Load { ref url, .. } if url == "missing.mp3"));
    }
}

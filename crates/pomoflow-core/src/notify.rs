//! Collaborators the engine calls around phase transitions.
//!
//! Host applications plug in real notification and audio backends. The
//! logging implementations here are what the CLI uses; they honour the
//! user's [`AppSettings`] but only emit `tracing` records.

use std::sync::{Arc, Mutex};

use crate::storage::AppSettings;

/// Schedules local notifications.
pub trait NotificationScheduler: Send {
    /// Show `title`/`body` after `delay_secs` seconds.
    fn schedule(&mut self, title: &str, body: &str, delay_secs: u64);
    /// Drop every pending notification.
    fn cancel_all(&mut self);
}

/// Plays short audio cues.
pub trait AudioPlayer: Send {
    fn play(&mut self, sound_id: &str);
    /// Volume between 0.0 and 1.0.
    fn set_volume(&mut self, level: f64);
}

#[derive(Debug, Clone)]
pub struct LogNotifier {
    enabled: bool,
}

impl LogNotifier {
    pub fn new(settings: &AppSettings) -> Self {
        Self {
            enabled: settings.notifications.enabled,
        }
    }
}

impl Default for LogNotifier {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl NotificationScheduler for LogNotifier {
    fn schedule(&mut self, title: &str, body: &str, delay_secs: u64) {
        if self.enabled {
            tracing::info!(title, body, delay_secs, "scheduling notification");
        }
    }

    fn cancel_all(&mut self) {
        if self.enabled {
            tracing::info!("cancelling all notifications");
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogAudioPlayer {
    muted: bool,
    volume: f64,
}

impl LogAudioPlayer {
    pub fn new(settings: &AppSettings) -> Self {
        let mut player = Self {
            muted: settings.audio.chime().is_none() || !settings.notifications.sound,
            volume: 0.0,
        };
        player.set_volume(settings.audio.volume);
        player
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }
}

impl Default for LogAudioPlayer {
    fn default() -> Self {
        Self::new(&AppSettings::default())
    }
}

impl AudioPlayer for LogAudioPlayer {
    fn play(&mut self, sound_id: &str) {
        if !self.muted {
            tracing::info!(sound_id, volume = self.volume, "playing sound");
        }
    }

    fn set_volume(&mut self, level: f64) {
        self.volume = level.clamp(0.0, 1.0);
        tracing::debug!(volume = self.volume, "audio volume set");
    }
}

/// One call made to a [`Recorder`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Schedule {
        title: String,
        body: String,
        delay_secs: u64,
    },
    CancelAll,
    Play(String),
    SetVolume(f64),
}

/// Records every collaborator call. Clones share the same log, so the
/// engine can own one handle while a test inspects another.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }

    fn push(&self, call: Call) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl NotificationScheduler for Recorder {
    fn schedule(&mut self, title: &str, body: &str, delay_secs: u64) {
        self.push(Call::Schedule {
            title: title.to_string(),
            body: body.to_string(),
            delay_secs,
        });
    }

    fn cancel_all(&mut self) {
        self.push(Call::CancelAll);
    }
}

impl AudioPlayer for Recorder {
    fn play(&mut self, sound_id: &str) {
        self.push(Call::Play(sound_id.to_string()));
    }

    fn set_volume(&mut self, level: f64) {
        self.push(Call::SetVolume(level));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_audio_player_clamps_volume() {
        let mut player = LogAudioPlayer::default();
        assert_eq!(player.volume(), 0.7);
        player.set_volume(3.0);
        assert_eq!(player.volume(), 1.0);
        player.set_volume(-1.0);
        assert_eq!(player.volume(), 0.0);
    }

    #[test]
    fn recorder_clones_share_log() {
        let recorder = Recorder::new();
        let mut handle = recorder.clone();
        handle.schedule("t", "b", 5);
        handle.play("focus-complete");
        assert_eq!(
            recorder.calls(),
            vec![
                Call::Schedule {
                    title: "t".into(),
                    body: "b".into(),
                    delay_secs: 5
                },
                Call::Play("focus-complete".into()),
            ]
        );
        recorder.clear();
        assert!(recorder.calls().is_empty());
    }
}

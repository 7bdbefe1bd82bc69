// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::process::Stdio;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::SinkError;

/// Media type hint sent with every play command
pub const MEDIA_CONTENT_TYPE: &str = "music";

/// How long a freshly launched player may take to fail before it counts as playing
pub const STARTUP_GRACE: Duration = Duration::from_millis(500);

/// A single "play this URL" command
#[derive(Debug, Clone, PartialEq)]
pub struct PlayMedia {
    pub sink_id: String,
    pub media_content_id: String,
    pub media_content_type: String,
}

impl PlayMedia {
    pub fn audio(sink_id: impl Into<String>, audio_url: impl Into<String>) -> Self {
        Self {
            sink_id: sink_id.into(),
            media_content_id: audio_url.into(),
            media_content_type: MEDIA_CONTENT_TYPE.to_string(),
        }
    }
}

/// External playback target
#[async_trait]
pub trait PlaybackSink: Send + Sync {
    async fn play_media(&self, request: PlayMedia) -> Result<(), SinkError>;

    /// Detach the sink from any speaker group
    async fn unjoin(&self, sink_id: &str) -> Result<(), SinkError>;

    /// Set the volume as a fraction in `0.0..=1.0`
    async fn set_volume(&self, sink_id: &str, level: f32) -> Result<(), SinkError>;
}

/// Plays media by launching a local player program with the audio URL
///
/// `play_media` returns once the player has survived [`STARTUP_GRACE`]; the
/// player then keeps running on its own. Speaker groups do not exist for a
/// local player, so `unjoin` is a no-op. The last volume set is passed to the
/// next launch through `volume_flag`.
pub struct CommandSink {
    program: String,
    args: Vec<String>,
    volume_flag: Option<String>,
    volume: Mutex<Option<f32>>,
    startup_grace: Duration,
}

impl CommandSink {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            volume_flag: None,
            volume: Mutex::new(None),
            startup_grace: STARTUP_GRACE,
        }
    }

    pub fn with_startup_grace(mut self, grace: Duration) -> Self {
        self.startup_grace = grace;
        self
    }

    /// Extra arguments placed before the URL
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Flag prefix for the volume percentage, e.g. `--volume=` for mpv
    pub fn with_volume_flag(mut self, flag: impl Into<String>) -> Self {
        self.volume_flag = Some(flag.into());
        self
    }

    fn command_line(&self, url: &str) -> Vec<String> {
        let mut line = self.args.clone();
        let volume = *self.volume.lock().unwrap_or_else(|e| e.into_inner());
        if let (Some(flag), Some(level)) = (&self.volume_flag, volume) {
            line.push(format!("{flag}{}", (level * 100.0).round() as u32));
        }
        line.push(url.to_string());
        line
    }
}

#[async_trait]
impl PlaybackSink for CommandSink {
    async fn play_media(&self, request: PlayMedia) -> Result<(), SinkError> {
        let args = self.command_line(&request.media_content_id);
        info!(program = %self.program, sink = %request.sink_id, "launching player");

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|e| SinkError::Launch {
                program: self.program.clone(),
                source: e,
            })?;

        match tokio::time::timeout(self.startup_grace, child.wait()).await {
            // Still running: playback has started
            Err(_) => {
                debug!(program = %self.program, pid = ?child.id(), "player running");
                Ok(())
            }
            Ok(Ok(status)) if status.success() => Ok(()),
            Ok(Ok(status)) => Err(SinkError::Rejected {
                sink_id: request.sink_id,
                reason: format!("{} exited with {status}", self.program),
            }),
            Ok(Err(e)) => Err(SinkError::Launch {
                program: self.program.clone(),
                source: e,
            }),
        }
    }

    async fn unjoin(&self, sink_id: &str) -> Result<(), SinkError> {
        debug!(sink = sink_id, "local player has no speaker group");
        Ok(())
    }

    async fn set_volume(&self, sink_id: &str, level: f32) -> Result<(), SinkError> {
        debug!(sink = sink_id, level, "volume stored for next launch");
        *self.volume.lock().unwrap_or_else(|e| e.into_inner()) = Some(level);
        Ok(())
    }
}

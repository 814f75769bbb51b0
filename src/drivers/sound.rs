//! Fire-and-forget sound trigger.
//!
//! Resolves a clip file name against the asset directory and hands the path
//! to the [`AudioPlayer`].  Never blocks on playback and never fails the
//! caller: a missing clip or a player error is logged and reported back as a
//! [`PlaybackFault`] the caller is free to ignore.

use std::path::PathBuf;

use log::{debug, warn};

use crate::app::ports::AudioPlayer;
use crate::error::PlaybackFault;

pub struct SoundTrigger<A> {
    player: A,
    asset_dir: PathBuf,
}

impl<A: AudioPlayer> SoundTrigger<A> {
    pub fn new(player: A, asset_dir: impl Into<PathBuf>) -> Self {
        Self {
            player,
            asset_dir: asset_dir.into(),
        }
    }

    /// Full path for `clip`.
    pub fn resolve(&self, clip: &str) -> PathBuf {
        self.asset_dir.join(clip)
    }

    pub fn play(&mut self, clip: &str) -> Result<(), PlaybackFault> {
        let path = self.resolve(clip);
        if !path.is_file() {
            warn!("Sound: {} ({})", PlaybackFault::ClipMissing, path.display());
            return Err(PlaybackFault::ClipMissing);
        }
        debug!("Sound: playing {}", path.display());
        self.player.play(&path).inspect_err(|e| {
            warn!("Sound: {} ({})", e, path.display());
        })
    }

    /// Clips from `clips` that do not exist under the asset directory.
    pub fn missing<'a>(&self, clips: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
        clips
            .into_iter()
            .filter(|clip| !self.resolve(clip).is_file())
            .collect()
    }
}

//! Sound cue resolution and music playlist
//!
//! Playback belongs to the host. This module decides *what* to play and how
//! loud: cues map to logical sound names, missing sounds fall back to the
//! platform default, and the playlist advances when the host reports the
//! current track finished.

use serde::{Deserialize, Serialize};

use crate::assets::AssetCatalog;
use crate::settings::Settings;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundEffect {
    /// Rocket flung
    Fling,
    /// Rocket hits a normal obstacle
    Bounce,
    /// Astronaut rescued
    Success,
    /// Level clock ran out
    Failure,
}

impl SoundEffect {
    pub const ALL: [SoundEffect; 4] = [
        SoundEffect::Fling,
        SoundEffect::Bounce,
        SoundEffect::Success,
        SoundEffect::Failure,
    ];

    pub fn asset_name(&self) -> &'static str {
        match self {
            SoundEffect::Fling => "sfx_fling",
            SoundEffect::Bounce => "sfx_bounce",
            SoundEffect::Success => "sfx_success",
            SoundEffect::Failure => "sfx_failure",
        }
    }
}

/// Where a sound comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoundSource {
    Asset(&'static str),
    /// Platform default beep
    SystemDefault,
}

/// A sound the host should play now
#[derive(Debug, Clone, PartialEq)]
pub struct PlayRequest {
    pub source: SoundSource,
    pub volume: f64,
}

/// Volume state for effects and music
#[derive(Debug, Clone, PartialEq)]
pub struct AudioMixer {
    sfx_volume: f64,
    music_volume: f64,
    muted: bool,
}

impl Default for AudioMixer {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl AudioMixer {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            sfx_volume: settings.sfx_volume.clamp(0.0, 1.0),
            music_volume: settings.music_volume.clamp(0.0, 1.0),
            muted: settings.muted,
        }
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f64) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    /// Set music volume (0.0 - 1.0)
    pub fn set_music_volume(&mut self, vol: f64) {
        self.music_volume = vol.clamp(0.0, 1.0);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn sfx_volume(&self) -> f64 {
        if self.muted { 0.0 } else { self.sfx_volume }
    }

    pub fn music_volume(&self) -> f64 {
        if self.muted { 0.0 } else { self.music_volume }
    }

    /// Resolve an effect; `None` when it would be silent
    pub fn resolve(&self, effect: SoundEffect, catalog: &dyn AssetCatalog) -> Option<PlayRequest> {
        let volume = self.sfx_volume();
        if volume <= 0.0 {
            return None;
        }

        let name = effect.asset_name();
        let source = if catalog.has_sound(name) {
            SoundSource::Asset(name)
        } else {
            log::warn!("Missing sound '{name}', using system default");
            SoundSource::SystemDefault
        };
        Some(PlayRequest { source, volume })
    }
}

/// Track after `current` in a playlist of `len`, wrapping to the start
pub fn next_track_index(current: usize, len: usize) -> usize {
    if len == 0 { 0 } else { (current + 1) % len }
}

/// Background music rotation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    tracks: Vec<String>,
    current: usize,
}

impl Playlist {
    /// Build from candidate names, dropping tracks the catalog lacks
    pub fn new(candidates: &[&str], catalog: &dyn AssetCatalog) -> Self {
        let tracks = candidates
            .iter()
            .filter(|name| {
                let present = catalog.has_sound(name);
                if !present {
                    log::warn!("Missing music track '{name}', skipping");
                }
                present
            })
            .map(|name| name.to_string())
            .collect();
        Self { tracks, current: 0 }
    }

    pub fn current(&self) -> Option<&str> {
        self.tracks.get(self.current).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// The host finished playing the current track; returns the next one
    pub fn on_track_finished(&mut self) -> Option<&str> {
        self.current = next_track_index(self.current, self.tracks.len());
        self.current()
    }
}

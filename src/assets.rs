//! Asset lookups by logical name
//!
//! The engine never loads files. Hosts answer "does this image/sound exist"
//! and the engine degrades around the gaps: a missing background is skipped,
//! a missing obstacle image removes that kind from the level, and a missing
//! astronaut sprite turns the collection animation off.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::consts::BACKGROUND_COUNT;
use crate::sim::state::{LevelAssets, ObstacleKind, background_index};

/// Logical name of the astronaut sprite
pub const ASTRONAUT_SPRITE: &str = "astronaut";

/// Logical name of a level's background
pub fn background_asset(level: u32) -> String {
    format!("background_{}", background_index(level))
}

/// Answers whether a named asset is available
pub trait AssetCatalog {
    fn has_image(&self, name: &str) -> bool;
    fn has_sound(&self, name: &str) -> bool;
}

/// Fixed list of available assets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetManifest {
    pub images: BTreeSet<String>,
    pub sounds: BTreeSet<String>,
}

impl AssetManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every image and sound the engine knows how to ask for
    pub fn complete() -> Self {
        let mut manifest = Self::new();
        for n in 1..=BACKGROUND_COUNT {
            manifest.images.insert(format!("background_{n}"));
        }
        manifest.images.insert(ASTRONAUT_SPRITE.to_string());
        for kind in ObstacleKind::ALL {
            manifest.images.insert(kind.asset_name().to_string());
        }
        for effect in crate::audio::SoundEffect::ALL {
            manifest.sounds.insert(effect.asset_name().to_string());
        }
        manifest
    }

    pub fn with_image(mut self, name: &str) -> Self {
        self.images.insert(name.to_string());
        self
    }

    pub fn with_sound(mut self, name: &str) -> Self {
        self.sounds.insert(name.to_string());
        self
    }

    pub fn without_image(mut self, name: &str) -> Self {
        self.images.remove(name);
        self
    }

    pub fn without_sound(mut self, name: &str) -> Self {
        self.sounds.remove(name);
        self
    }
}

impl AssetCatalog for AssetManifest {
    fn has_image(&self, name: &str) -> bool {
        self.images.contains(name)
    }

    fn has_sound(&self, name: &str) -> bool {
        self.sounds.contains(name)
    }
}

/// Resolve what a level can draw, logging anything missing
pub fn resolve_level_assets(catalog: &dyn AssetCatalog, level: u32) -> LevelAssets {
    let background_name = background_asset(level);
    let background = if catalog.has_image(&background_name) {
        Some(background_name)
    } else {
        log::warn!("Missing background '{background_name}', skipping");
        None
    };

    let astronaut_sprite = catalog.has_image(ASTRONAUT_SPRITE);
    if !astronaut_sprite {
        log::warn!("Missing astronaut sprite, collection animation disabled");
    }

    let obstacle_kinds: Vec<ObstacleKind> = ObstacleKind::ALL
        .into_iter()
        .filter(|kind| {
            let present = catalog.has_image(kind.asset_name());
            if !present {
                log::warn!("Missing '{}', {:?} obstacles disabled", kind.asset_name(), kind);
            }
            present
        })
        .collect();

    LevelAssets {
        background,
        astronaut_sprite,
        obstacle_kinds,
    }
}

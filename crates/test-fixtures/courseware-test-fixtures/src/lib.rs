use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;

pub mod dom;
pub mod selector;
pub mod sound;

pub use dom::{ElementSpec, MemoryDocument, Node, PendingFetch};
pub use sound::{AudioCall, RecordingAudio, RecordingSound, SoundCall};

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    courses: HashMap<String, String>,
    animations: HashMap<String, String>,
    /// Page URL -> fragment file.
    pages: HashMap<String, String>,
}

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

fn resolve_path(rel: &str) -> PathBuf {
    fixtures_root().join(rel)
}

fn read_to_string(rel: &str) -> Result<String> {
    let path = resolve_path(rel);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))
}

fn load_json<T: DeserializeOwned>(rel: &str) -> Result<T> {
    let text = read_to_string(rel)?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse JSON fixture {rel}"))
}

fn lookup<'a, T>(map: &'a HashMap<String, T>, kind: &str, name: &str) -> Result<&'a T> {
    map.get(name)
        .ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))
}

pub mod courses {
    use super::*;

    pub fn keys() -> Vec<String> {
        MANIFEST.courses.keys().cloned().collect()
    }

    pub fn json(name: &str) -> Result<String> {
        let rel = lookup(&MANIFEST.courses, "course", name)?;
        read_to_string(rel)
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        let rel = lookup(&MANIFEST.courses, "course", name)?;
        super::load_json(rel)
    }
}

/// Raw `data-animation` attribute values, exactly as authored.
pub mod animations {
    use super::*;

    pub fn keys() -> Vec<String> {
        MANIFEST.animations.keys().cloned().collect()
    }

    pub fn raw(name: &str) -> Result<String> {
        let rel = lookup(&MANIFEST.animations, "animation", name)?;
        Ok(read_to_string(rel)?.trim_end().to_string())
    }

    pub fn path(name: &str) -> Result<PathBuf> {
        let rel = lookup(&MANIFEST.animations, "animation", name)?;
        Ok(resolve_path(rel))
    }
}

/// Page fragments served by [`MemoryDocument`] fetches.
pub mod pages {
    use super::*;

    pub fn urls() -> Vec<String> {
        MANIFEST.pages.keys().cloned().collect()
    }

    pub fn load(url: &str) -> Result<Vec<ElementSpec>> {
        let rel = lookup(&MANIFEST.pages, "page", url)?;
        super::load_json(rel)
    }

    /// Register every page fragment with `doc`.
    pub fn register_all(doc: &mut MemoryDocument) -> Result<()> {
        for (url, rel) in MANIFEST.pages.iter() {
            let elements: Vec<ElementSpec> = super::load_json(rel)?;
            doc.register_fragment(url, elements);
        }
        Ok(())
    }
}

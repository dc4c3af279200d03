//! Interface to the external rendering collaborator.
//!
//! The renderer owns sprite creation and layering; this crate only tells it
//! which sprite within a layer should be visible. Callers guarantee at most
//! one call per actual change, so implementations may treat every call as a
//! real transition.

/// Logical sprite layers of the character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpriteLayer {
    Mouth,
    Eyes,
}

impl SpriteLayer {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpriteLayer::Mouth => "mouth",
            SpriteLayer::Eyes => "eyes",
        }
    }
}

/// Pluggable sprite output handler.
///
/// Pairs with `CaptureSource` for input - this is where animation decisions
/// leave the pipeline.
pub trait SpriteSurface: Send {
    /// Shows exactly one sprite for `key` in `layer`, hiding its siblings.
    fn set_visible_sprite(&mut self, layer: SpriteLayer, key: &str);

    /// Name for logging/debugging.
    fn name(&self) -> &'static str {
        "surface"
    }
}

/// Surface that discards everything. Useful when running headless.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSurface;

impl SpriteSurface for NullSurface {
    fn set_visible_sprite(&mut self, _layer: SpriteLayer, _key: &str) {}

    fn name(&self) -> &'static str {
        "null"
    }
}

/// Surface that prints every change to stdout. Used by the CLI.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSurface;

impl SpriteSurface for StdoutSurface {
    fn set_visible_sprite(&mut self, layer: SpriteLayer, key: &str) {
        println!("{}: {}", layer.as_str(), key);
    }

    fn name(&self) -> &'static str {
        "stdout"
    }
}

/// Surface that records every call, for assertions in tests.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub calls: Vec<(SpriteLayer, String)>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys set on the given layer, in order.
    pub fn keys_for(&self, layer: SpriteLayer) -> Vec<&str> {
        self.calls
            .iter()
            .filter(|(l, _)| *l == layer)
            .map(|(_, k)| k.as_str())
            .collect()
    }
}

impl SpriteSurface for RecordingSurface {
    fn set_visible_sprite(&mut self, layer: SpriteLayer, key: &str) {
        self.calls.push((layer, key.to_string()));
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Surface that forwards to a shared recording, for tests that need to
/// inspect calls while the surface is owned by a pipeline.
#[derive(Debug, Clone, Default)]
pub struct SharedRecordingSurface {
    inner: std::sync::Arc<std::sync::Mutex<RecordingSurface>>,
}

impl SharedRecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the calls recorded so far.
    pub fn calls(&self) -> Vec<(SpriteLayer, String)> {
        match self.inner.lock() {
            Ok(guard) => guard.calls.clone(),
            Err(poisoned) => poisoned.into_inner().calls.clone(),
        }
    }

    /// Keys set on the given layer, in order.
    pub fn keys_for(&self, layer: SpriteLayer) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|(l, _)| *l == layer)
            .map(|(_, k)| k)
            .collect()
    }
}

impl SpriteSurface for SharedRecordingSurface {
    fn set_visible_sprite(&mut self, layer: SpriteLayer, key: &str) {
        let mut guard = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.set_visible_sprite(layer, key);
    }

    fn name(&self) -> &'static str {
        "shared-recording"
    }
}

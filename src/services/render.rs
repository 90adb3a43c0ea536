//! Render service — drives each diagram identity down the fallback ladder.
//!
//! DESIGN
//! ======
//! A diagram identity is an id plus the raw text presented under it. Each
//! identity owns a slot holding its [`RenderState`] and a generation number.
//! Presenting new text under an id replaces the slot with a fresh generation
//! and spawns the ladder for it:
//!
//! 1. primary: normalized text, strict profile
//! 2. retry: normalized text with doubled single-letter ids, strict profile
//! 3. fallback: nodes synthesized from the original text, lenient profile
//!
//! then a static placeholder. Every attempt gets a fresh render-target key,
//! and no tier runs more than once.
//!
//! Every state write checks the slot generation first. A superseded or
//! dismissed identity's task keeps its in-flight engine call but never
//! writes, and stops climbing the ladder.
//!
//! TRADE-OFFS
//! ==========
//! Slots live in memory. Past `capacity` ids, presenting a new id evicts the
//! oldest settled slot; in-flight slots are never evicted, so the map may
//! exceed the cap while every slot is still rendering.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::mermaid::{DiagramSource, double_letter_ids, normalize, synthesize};
use crate::render::{EngineHandle, LeniencyProfile, RenderAttempt};

pub const NO_DIAGRAM_MESSAGE: &str = "No diagram code provided.";
pub const SIMPLIFIED_NOTICE: &str = "Diagram rendered with simplified syntax due to parsing issues.";
pub const UNRENDERABLE_MESSAGE: &str = "Diagram could not be rendered. Check the original code for syntax issues.";

// =============================================================================
// TYPES
// =============================================================================

/// A rung of the fallback ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Primary,
    Retry,
    Fallback,
}

impl Tier {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Retry => "retry",
            Self::Fallback => "fallback",
        }
    }
}

/// Observable state of one diagram identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RenderState {
    Idle,
    Rendering { tier: Tier },
    Rendered { markup: String },
    FallbackRendered { markup: String, notice: String },
    /// Every tier failed; `source` echoes the original text for inspection.
    Unrenderable { source: String, message: String },
    Empty { message: String },
    Embedded { url: String },
}

impl RenderState {
    /// True once no further transition will happen for this identity.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Idle | Self::Rendering { .. })
    }
}

struct Slot {
    generation: u64,
    raw: String,
    source: DiagramSource,
    state: RenderState,
}

// =============================================================================
// SERVICE
// =============================================================================

/// Owns every live diagram identity. Clone is cheap; all fields are shared.
#[derive(Clone)]
pub struct RenderService {
    engine: EngineHandle,
    slots: Arc<RwLock<HashMap<String, Slot>>>,
    generations: Arc<AtomicU64>,
    capacity: usize,
}

impl RenderService {
    /// Service that keeps at most `capacity` settled identities.
    #[must_use]
    pub fn new(engine: EngineHandle, capacity: usize) -> Self {
        Self {
            engine,
            slots: Arc::new(RwLock::new(HashMap::new())),
            generations: Arc::new(AtomicU64::new(0)),
            capacity: capacity.max(1),
        }
    }

    /// Present `raw` under `id`.
    ///
    /// Returns the spawned ladder task when rendering starts. Re-presenting
    /// the current text, empty text, and embed links spawn nothing.
    pub async fn present(&self, id: &str, raw: &str) -> Option<JoinHandle<()>> {
        let source = DiagramSource::classify(raw);
        let state = match &source {
            DiagramSource::Empty => RenderState::Empty { message: NO_DIAGRAM_MESSAGE.into() },
            DiagramSource::Embed(url) => RenderState::Embedded { url: url.clone() },
            DiagramSource::Mermaid(_) => RenderState::Idle,
        };

        let generation = {
            let mut slots = self.slots.write().await;
            if slots.get(id).is_some_and(|slot| slot.raw == raw) {
                debug!(%id, "render: identity unchanged");
                return None;
            }
            if !slots.contains_key(id) && slots.len() >= self.capacity {
                evict_oldest_settled(&mut slots);
            }
            let generation = self.generations.fetch_add(1, Ordering::Relaxed) + 1;
            slots.insert(id.to_owned(), Slot { generation, raw: raw.to_owned(), source: source.clone(), state });
            generation
        };
        info!(%id, generation, raw_len = raw.len(), "render: identity presented");

        let code = source.code()?.to_owned();
        let service = self.clone();
        let id = id.to_owned();
        Some(tokio::spawn(async move { service.run_ladder(&id, generation, &code).await }))
    }

    /// Current state of `id`, if presented.
    pub async fn state(&self, id: &str) -> Option<RenderState> {
        self.slots.read().await.get(id).map(|slot| slot.state.clone())
    }

    /// Classified source currently presented under `id`.
    pub async fn source(&self, id: &str) -> Option<DiagramSource> {
        self.slots.read().await.get(id).map(|slot| slot.source.clone())
    }

    /// Forget `id`. In-flight work for it is discarded on arrival.
    pub async fn dismiss(&self, id: &str) -> bool {
        let removed = self.slots.write().await.remove(id).is_some();
        if removed {
            info!(%id, "render: identity dismissed");
        }
        removed
    }

    async fn run_ladder(&self, id: &str, generation: u64, source: &str) {
        if !self.commit(id, generation, RenderState::Rendering { tier: Tier::Primary }).await {
            return;
        }
        let normalized = normalize(source);
        if let Ok(diagram) = self.attempt(id, Tier::Primary, LeniencyProfile::Strict, &normalized).await {
            self.commit(id, generation, RenderState::Rendered { markup: diagram.markup }).await;
            return;
        }

        if !self.commit(id, generation, RenderState::Rendering { tier: Tier::Retry }).await {
            return;
        }
        let retried = double_letter_ids(&normalized);
        if let Ok(diagram) = self.attempt(id, Tier::Retry, LeniencyProfile::Strict, &retried).await {
            self.commit(id, generation, RenderState::Rendered { markup: diagram.markup }).await;
            return;
        }

        if !self.commit(id, generation, RenderState::Rendering { tier: Tier::Fallback }).await {
            return;
        }
        let safe = synthesize(source);
        let settled = match self.attempt(id, Tier::Fallback, LeniencyProfile::Lenient, &safe).await {
            Ok(diagram) => RenderState::FallbackRendered { markup: diagram.markup, notice: SIMPLIFIED_NOTICE.into() },
            Err(_) => RenderState::Unrenderable { source: source.to_owned(), message: UNRENDERABLE_MESSAGE.into() },
        };
        self.commit(id, generation, settled).await;
    }

    async fn attempt(&self, id: &str, tier: Tier, profile: LeniencyProfile, source: &str) -> RenderAttempt {
        let key = render_key(id, tier);
        let result = self.engine.render(profile, &key, source).await;
        match &result {
            Ok(_) => info!(%id, tier = tier.as_str(), %key, "render: attempt succeeded"),
            Err(e) => warn!(%id, tier = tier.as_str(), %key, error = %e, "render: attempt failed"),
        }
        result
    }

    /// Write `state` if `generation` is still current for `id`.
    async fn commit(&self, id: &str, generation: u64, state: RenderState) -> bool {
        let mut slots = self.slots.write().await;
        match slots.get_mut(id) {
            Some(slot) if slot.generation == generation => {
                slot.state = state;
                true
            }
            _ => {
                debug!(%id, generation, "render: stale result discarded");
                false
            }
        }
    }
}

fn evict_oldest_settled(slots: &mut HashMap<String, Slot>) {
    let oldest = slots
        .iter()
        .filter(|(_, slot)| slot.state.is_settled())
        .min_by_key(|(_, slot)| slot.generation)
        .map(|(id, _)| id.clone());
    if let Some(id) = oldest {
        slots.remove(&id);
        debug!(%id, "render: evicted settled identity");
    }
}

/// Unique render-target key for one attempt.
fn render_key(id: &str, tier: Tier) -> String {
    format!("{id}-{}-{}", tier.as_str(), Uuid::new_v4().simple())
}

#[cfg(test)]
#[path = "render_test.rs"]
mod tests;

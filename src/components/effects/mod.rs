//! Decorative landing-page effects.
//!
//! Everything animated on the page runs off one virtual-time scheduler:
//! - Self-replacing pools of matrix rain columns, floating shapes and particles
//! - A boot log typed into a fake terminal
//! - A simulated transaction feed capped at eight items
//! - Navbar, resize, visibility and scroll-reveal adaptations
//!
//! Effects render through the [`Scene`] trait. [`MemoryScene`] backs tests and
//! headless runs; the browser build uses a DOM-backed scene driven by the
//! [`EffectsLayer`] component.
//!
//! # Example
//!
//! ```
//! use flossx_fx::components::effects::{
//! 	EffectKind, EffectsConfig, Landing, MemoryScene, Viewport, WallClock,
//! };
//! use rand::SeedableRng;
//! use rand::rngs::SmallRng;
//!
//! let mut scene = MemoryScene::with_all_mounts();
//! let viewport = Viewport { width: 1280.0, height: 800.0 };
//! let mut landing = Landing::new(EffectsConfig::default(), viewport, SmallRng::seed_from_u64(1));
//! landing.start(&mut scene);
//! landing.advance_to(&mut scene, 16_000, WallClock::default());
//! assert_eq!(landing.pool(EffectKind::Particle).live_count(), 15);
//! ```

#[cfg(target_arch = "wasm32")]
mod component;
mod config;
#[cfg(target_arch = "wasm32")]
mod dom;
mod feed;
mod landing;
mod memory;
pub mod page;
mod pool;
mod scene;
mod schedule;
mod terminal;

#[cfg(target_arch = "wasm32")]
pub use component::EffectsLayer;
pub use config::EffectsConfig;
#[cfg(target_arch = "wasm32")]
pub use dom::DomScene;
pub use feed::{CATALOGUE, FEED_CAPACITY, FeedTask, Transaction, TransactionFeed, TransactionKind, WallClock};
pub use landing::{Landing, MAX_FRAME_GAP, Task, expected_mounts};
pub use memory::{MemoryNode, MemoryScene};
pub use pool::{
	EffectInstance, EffectKind, EffectPool, EffectProfile, MATRIX_ALPHABET, MATRIX_COLUMN_WIDTH,
	PoolTask, SHAPE_VARIANTS, Viewport, matrix_text,
};
pub use scene::{ClassTarget, MountPoint, NodeId, NodeSpec, Parent, Placement, Scene};
pub use schedule::{Deferred, MIN_INTERVAL, Millis, Scheduler, TaskId};
pub use terminal::{CURSOR_GLYPH, DEFAULT_COMMANDS, TerminalPhase, TerminalTask, TerminalTyper};

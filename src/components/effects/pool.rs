//! Self-replacing pools of short-lived decorative elements.
//!
//! Matrix rain columns, floating shapes and particles all follow the same life
//! cycle: appear after a random startup delay, live for a fixed time, then get
//! removed and immediately replaced by a freshly randomized sibling. A pool
//! keeps that population at its target size for as long as the page lives.

use std::collections::BTreeMap;

use log::debug;
use rand::Rng;
use rand::seq::SliceRandom;

use super::scene::{MountPoint, NodeId, NodeSpec, Parent, Placement, Scene};
use super::schedule::{Deferred, Millis};

/// Horizontal spacing between matrix rain columns, in pixels.
pub const MATRIX_COLUMN_WIDTH: f64 = 20.0;

/// Glyphs a matrix column is made of.
pub const MATRIX_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Shape variants, each a CSS class next to `shape`.
pub const SHAPE_VARIANTS: [&str; 4] = ["triangle", "circle", "square", "hexagon"];

/// Visual type of a pooled element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EffectKind {
	MatrixColumn,
	Shape,
	Particle,
}

/// Timing ranges for one [`EffectKind`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EffectProfile {
	/// Upper bound of the initial spawn delay, in milliseconds.
	pub startup_window: Millis,
	/// Time an instance stays mounted before it is replaced.
	pub lifetime: Millis,
	/// CSS animation duration range, in seconds.
	pub duration_secs: (f64, f64),
	/// CSS animation delay range, in seconds.
	pub delay_secs: (f64, f64),
}

impl EffectKind {
	pub const ALL: [EffectKind; 3] = [
		EffectKind::MatrixColumn,
		EffectKind::Shape,
		EffectKind::Particle,
	];

	pub const fn profile(self) -> EffectProfile {
		match self {
			EffectKind::MatrixColumn => EffectProfile {
				startup_window: 5000,
				lifetime: 15_000,
				duration_secs: (8.0, 15.0),
				delay_secs: (0.0, 5.0),
			},
			EffectKind::Shape => EffectProfile {
				startup_window: 5000,
				lifetime: 25_000,
				duration_secs: (8.0, 20.0),
				delay_secs: (0.0, 5.0),
			},
			EffectKind::Particle => EffectProfile {
				startup_window: 2000,
				lifetime: 14_000,
				duration_secs: (6.0, 12.0),
				delay_secs: (0.0, 3.0),
			},
		}
	}

	pub const fn mount_point(self) -> MountPoint {
		match self {
			EffectKind::MatrixColumn => MountPoint::MatrixRain,
			EffectKind::Shape => MountPoint::FloatingShapes,
			EffectKind::Particle => MountPoint::Particles,
		}
	}

	pub const fn name(self) -> &'static str {
		match self {
			EffectKind::MatrixColumn => "matrix column",
			EffectKind::Shape => "shape",
			EffectKind::Particle => "particle",
		}
	}
}

/// Viewport size in CSS pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
	pub width: f64,
	pub height: f64,
}

/// A live pooled element.
#[derive(Clone, Debug, PartialEq)]
pub struct EffectInstance {
	pub node: NodeId,
	/// Stable slot the instance fills; matrix columns use it as their column.
	pub slot: usize,
	pub born_at: Millis,
	pub left: f64,
	pub top: Option<f64>,
	pub duration_secs: f64,
	pub delay_secs: f64,
}

/// Pool work to run later.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoolTask {
	Spawn { generation: u64, slot: usize },
	Expire { generation: u64, node: NodeId },
}

/// Steady-state population of one [`EffectKind`].
///
/// Clearing bumps the generation; tasks carrying an older generation are
/// ignored, so a cleared pool never resurrects its old instances.
#[derive(Debug)]
pub struct EffectPool {
	kind: EffectKind,
	target: usize,
	generation: u64,
	live: BTreeMap<NodeId, EffectInstance>,
	spawned: u64,
	retired: u64,
}

impl EffectPool {
	pub fn new(kind: EffectKind, target: usize) -> Self {
		Self {
			kind,
			target,
			generation: 0,
			live: BTreeMap::new(),
			spawned: 0,
			retired: 0,
		}
	}

	pub fn kind(&self) -> EffectKind {
		self.kind
	}

	pub fn generation(&self) -> u64 {
		self.generation
	}

	pub fn live_count(&self) -> usize {
		self.live.len()
	}

	pub fn instances(&self) -> impl Iterator<Item = &EffectInstance> {
		self.live.values()
	}

	/// Total instances ever mounted by this pool.
	pub fn spawned(&self) -> u64 {
		self.spawned
	}

	/// Total instances removed on expiry.
	pub fn retired(&self) -> u64 {
		self.retired
	}

	/// Number of slots for the given viewport. Matrix rain is further limited
	/// by how many columns fit across the screen.
	pub fn slots(&self, viewport: Viewport) -> usize {
		match self.kind {
			EffectKind::MatrixColumn => {
				let fit = (viewport.width.max(0.0) / MATRIX_COLUMN_WIDTH).floor() as usize;
				fit.min(self.target)
			}
			_ => self.target,
		}
	}

	/// Schedule the initial, staggered spawn of every slot.
	///
	/// Does nothing when the container is missing.
	pub fn populate(
		&self,
		scene: &impl Scene,
		rng: &mut impl Rng,
		viewport: Viewport,
	) -> Vec<Deferred<PoolTask>> {
		if !scene.has_mount(self.kind.mount_point()) {
			debug!("flossx: no container for {} pool", self.kind.name());
			return Vec::new();
		}
		let window = self.kind.profile().startup_window;
		(0..self.slots(viewport))
			.map(|slot| {
				Deferred::new(
					rng.gen_range(0..=window),
					PoolTask::Spawn {
						generation: self.generation,
						slot,
					},
				)
			})
			.collect()
	}

	/// Run a scheduled task, returning the follow-up to schedule, if any.
	pub fn handle(
		&mut self,
		task: PoolTask,
		scene: &mut impl Scene,
		rng: &mut impl Rng,
		viewport: Viewport,
		now: Millis,
	) -> Option<Deferred<PoolTask>> {
		match task {
			PoolTask::Spawn { generation, slot } => {
				if generation != self.generation {
					return None;
				}
				self.spawn(slot, scene, rng, viewport, now)
			}
			PoolTask::Expire { generation, node } => {
				if generation != self.generation {
					return None;
				}
				let instance = self.live.remove(&node)?;
				scene.unmount(node);
				self.retired += 1;
				self.spawn(instance.slot, scene, rng, viewport, now)
			}
		}
	}

	/// Shift instance birth times after the scheduler clock skipped `by`.
	pub fn shift_clock(&mut self, by: Millis) {
		for instance in self.live.values_mut() {
			instance.born_at = instance.born_at.saturating_add(by);
		}
	}

	/// Detach every instance and invalidate outstanding tasks.
	pub fn clear(&mut self, scene: &mut impl Scene) {
		scene.clear(self.kind.mount_point());
		self.live.clear();
		self.generation += 1;
	}

	fn spawn(
		&mut self,
		slot: usize,
		scene: &mut impl Scene,
		rng: &mut impl Rng,
		viewport: Viewport,
		now: Millis,
	) -> Option<Deferred<PoolTask>> {
		let mount = self.kind.mount_point();
		let (spec, instance) = randomize(self.kind, slot, viewport, rng);
		let Some(node) = scene.mount(Parent::Mount(mount), Placement::Append, &spec) else {
			debug!("flossx: {} container gone, pool stops", self.kind.name());
			return None;
		};

		self.live.insert(
			node,
			EffectInstance {
				node,
				born_at: now,
				..instance
			},
		);
		self.spawned += 1;

		Some(Deferred::new(
			self.kind.profile().lifetime,
			PoolTask::Expire {
				generation: self.generation,
				node,
			},
		))
	}
}

fn uniform(rng: &mut impl Rng, (lo, hi): (f64, f64)) -> f64 {
	if hi > lo { rng.gen_range(lo..hi) } else { lo }
}

/// A 10-30 glyph column, one glyph per line.
pub fn matrix_text(rng: &mut impl Rng) -> String {
	let len = rng.gen_range(10..=30);
	let mut text = String::with_capacity(len * 2);
	for _ in 0..len {
		let glyph = MATRIX_ALPHABET[rng.gen_range(0..MATRIX_ALPHABET.len())];
		text.push(glyph as char);
		text.push('\n');
	}
	text
}

/// Roll the random parameters for one instance and describe its element.
fn randomize(
	kind: EffectKind,
	slot: usize,
	viewport: Viewport,
	rng: &mut impl Rng,
) -> (NodeSpec, EffectInstance) {
	let profile = kind.profile();
	let left = match kind {
		EffectKind::MatrixColumn => slot as f64 * MATRIX_COLUMN_WIDTH,
		_ => uniform(rng, (0.0, viewport.width)),
	};
	let top = match kind {
		EffectKind::Shape => Some(uniform(rng, (0.0, viewport.height))),
		_ => None,
	};
	let duration_secs = uniform(rng, profile.duration_secs);
	let delay_secs = uniform(rng, profile.delay_secs);

	let mut spec = match kind {
		EffectKind::MatrixColumn => NodeSpec::new("div")
			.class("matrix-column")
			.text(matrix_text(rng)),
		EffectKind::Shape => {
			let variant = SHAPE_VARIANTS.choose(rng).copied().unwrap_or("circle");
			NodeSpec::new("div").class(format!("shape {variant}"))
		}
		EffectKind::Particle => NodeSpec::new("div").class("particle"),
	};
	spec = spec.style("left", format!("{left:.2}px"));
	if let Some(top) = top {
		spec = spec.style("top", format!("{top:.2}px"));
	}
	spec = spec
		.style("animation-duration", format!("{duration_secs:.2}s"))
		.style("animation-delay", format!("{delay_secs:.2}s"));

	let instance = EffectInstance {
		node: NodeId(0),
		slot,
		born_at: 0,
		left,
		top,
		duration_secs,
		delay_secs,
	};
	(spec, instance)
}

#[cfg(test)]
mod tests {
	use rand::SeedableRng;
	use rand::rngs::SmallRng;

	use super::super::memory::MemoryScene;
	use super::super::schedule::Scheduler;
	use super::*;

	const VIEWPORT: Viewport = Viewport {
		width: 1280.0,
		height: 800.0,
	};

	/// Drive a single pool on its own scheduler up to `until`.
	fn run(
		pool: &mut EffectPool,
		scene: &mut MemoryScene,
		rng: &mut SmallRng,
		scheduler: &mut Scheduler<PoolTask>,
		until: Millis,
	) {
		while let Some(task) = scheduler.pop_due(until) {
			let now = scheduler.now();
			if let Some(next) = pool.handle(task, scene, rng, VIEWPORT, now) {
				scheduler.schedule(next);
			}
		}
		scheduler.settle(until);
	}

	fn started(kind: EffectKind, target: usize) -> (EffectPool, MemoryScene, SmallRng, Scheduler<PoolTask>) {
		let pool = EffectPool::new(kind, target);
		let scene = MemoryScene::with_all_mounts();
		let mut rng = SmallRng::seed_from_u64(11);
		let mut scheduler = Scheduler::new();
		for deferred in pool.populate(&scene, &mut rng, VIEWPORT) {
			scheduler.schedule(deferred);
		}
		(pool, scene, rng, scheduler)
	}

	#[test]
	fn zero_target_spawns_nothing() {
		let (mut pool, mut scene, mut rng, mut scheduler) = started(EffectKind::Particle, 0);
		assert_eq!(scheduler.pending(), 0);
		run(&mut pool, &mut scene, &mut rng, &mut scheduler, 60_000);
		assert_eq!(pool.live_count(), 0);
		assert!(scene.children(MountPoint::Particles).is_empty());
	}

	#[test]
	fn fills_within_startup_window_and_stays_full() {
		let (mut pool, mut scene, mut rng, mut scheduler) = started(EffectKind::Shape, 8);
		run(&mut pool, &mut scene, &mut rng, &mut scheduler, 5000);
		assert_eq!(pool.live_count(), 8);

		for step in 1..=40 {
			run(&mut pool, &mut scene, &mut rng, &mut scheduler, 5000 + step * 1000);
			assert_eq!(pool.live_count(), 8);
			assert_eq!(scene.children(MountPoint::FloatingShapes).len(), 8);
		}
	}

	#[test]
	fn every_expiry_is_replaced_once() {
		let (mut pool, mut scene, mut rng, mut scheduler) = started(EffectKind::Particle, 5);
		run(&mut pool, &mut scene, &mut rng, &mut scheduler, 100_000);
		assert!(pool.retired() > 0);
		assert_eq!(pool.spawned(), pool.retired() + 5);
	}

	#[test]
	fn replacement_is_freshly_mounted() {
		let (mut pool, mut scene, mut rng, mut scheduler) = started(EffectKind::Particle, 1);
		run(&mut pool, &mut scene, &mut rng, &mut scheduler, 2000);
		let first = pool.instances().next().unwrap().node;

		run(&mut pool, &mut scene, &mut rng, &mut scheduler, 16_000);
		let second = pool.instances().next().unwrap().node;
		assert_ne!(first, second);
		assert!(scene.was_unmounted(first));
		assert!(scene.contains(second));
	}

	#[test]
	fn missing_container_stops_silently() {
		let (mut pool, mut scene, mut rng, mut scheduler) = started(EffectKind::Particle, 4);
		run(&mut pool, &mut scene, &mut rng, &mut scheduler, 3000);
		assert_eq!(pool.live_count(), 4);

		scene.remove_mount(MountPoint::Particles);
		run(&mut pool, &mut scene, &mut rng, &mut scheduler, 60_000);
		assert_eq!(pool.live_count(), 0);
		assert_eq!(scheduler.pending(), 0);
	}

	#[test]
	fn externally_cleared_container_is_refilled() {
		let (mut pool, mut scene, mut rng, mut scheduler) = started(EffectKind::Particle, 6);
		run(&mut pool, &mut scene, &mut rng, &mut scheduler, 2000);
		assert_eq!(pool.live_count(), 6);

		scene.clear(MountPoint::Particles);
		assert!(scene.children(MountPoint::Particles).is_empty());

		run(&mut pool, &mut scene, &mut rng, &mut scheduler, 2000 + 14_000);
		assert_eq!(pool.live_count(), 6);
		assert_eq!(scene.children(MountPoint::Particles).len(), 6);
		assert_eq!(pool.retired(), 6);
		assert_eq!(pool.generation(), 0);
	}

	#[test]
	fn no_container_no_schedule() {
		let pool = EffectPool::new(EffectKind::Shape, 8);
		let scene = MemoryScene::new();
		let mut rng = SmallRng::seed_from_u64(1);
		assert!(pool.populate(&scene, &mut rng, VIEWPORT).is_empty());
	}

	#[test]
	fn cleared_pool_ignores_stale_tasks() {
		let (mut pool, mut scene, mut rng, mut scheduler) = started(EffectKind::Shape, 3);
		run(&mut pool, &mut scene, &mut rng, &mut scheduler, 1000);
		pool.clear(&mut scene);
		run(&mut pool, &mut scene, &mut rng, &mut scheduler, 80_000);
		assert_eq!(pool.live_count(), 0);
		assert!(scene.children(MountPoint::FloatingShapes).is_empty());
	}

	#[test]
	fn matrix_columns_are_bounded_by_viewport() {
		let pool = EffectPool::new(EffectKind::MatrixColumn, 50);
		let narrow = Viewport {
			width: 390.0,
			height: 844.0,
		};
		assert_eq!(pool.slots(narrow), 19);
		assert_eq!(pool.slots(VIEWPORT), 50);
	}

	#[test]
	fn matrix_columns_keep_their_position() {
		let (mut pool, mut scene, mut rng, mut scheduler) = started(EffectKind::MatrixColumn, 50);
		run(&mut pool, &mut scene, &mut rng, &mut scheduler, 60_000);
		assert_eq!(pool.live_count(), 50);

		let mut slots: Vec<usize> = pool.instances().map(|i| i.slot).collect();
		slots.sort_unstable();
		assert_eq!(slots, (0..50).collect::<Vec<_>>());

		for instance in pool.instances() {
			assert_eq!(instance.left, instance.slot as f64 * MATRIX_COLUMN_WIDTH);
			let node = scene.node(instance.node).unwrap();
			assert!(node.has_class("matrix-column"));
			let glyphs = node.text.lines().count();
			assert!((10..=30).contains(&glyphs), "{glyphs} glyphs");
		}
	}

	#[test]
	fn randomized_values_stay_in_range() {
		let mut rng = SmallRng::seed_from_u64(3);
		for slot in 0..200 {
			let (spec, shape) = randomize(EffectKind::Shape, slot, VIEWPORT, &mut rng);
			assert!((0.0..VIEWPORT.width).contains(&shape.left));
			assert!((0.0..VIEWPORT.height).contains(&shape.top.unwrap()));
			assert!((8.0..20.0).contains(&shape.duration_secs));
			assert!((0.0..5.0).contains(&shape.delay_secs));
			assert!(spec.class.starts_with("shape "));
			assert!(spec.style_value("top").is_some());

			let (spec, particle) = randomize(EffectKind::Particle, slot, VIEWPORT, &mut rng);
			assert!((6.0..12.0).contains(&particle.duration_secs));
			assert!((0.0..3.0).contains(&particle.delay_secs));
			assert_eq!(spec.class, "particle");
			assert!(spec.style_value("top").is_none());
		}
	}

	#[test]
	fn matrix_text_uses_alphabet() {
		let mut rng = SmallRng::seed_from_u64(5);
		for _ in 0..50 {
			let text = matrix_text(&mut rng);
			for line in text.lines() {
				assert_eq!(line.len(), 1);
				assert!(MATRIX_ALPHABET.contains(&line.as_bytes()[0]));
			}
		}
	}
}

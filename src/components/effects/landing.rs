//! Application state for the landing page effects.
//!
//! [`Landing`] owns every effect, the shared scheduler and the random source.
//! The host creates it once the mount points exist, calls [`Landing::start`],
//! then feeds it clock readings and page events. Nothing here touches the DOM
//! except through the [`Scene`] it is handed.

use log::{debug, info};
use rand::Rng;
use rand::rngs::SmallRng;

use super::config::EffectsConfig;
use super::feed::{FeedTask, TransactionFeed, WallClock};
use super::page::{
	self, NavbarState, PerformanceHints, RECREATE_DELAY, RESIZE_DEBOUNCE, ResizeOutcome,
	ResizeWatcher, STAT_CARD_SETTLE,
};
use super::pool::{EffectKind, EffectPool, PoolTask, Viewport};
use super::scene::{MountPoint, NodeId, Scene};
use super::schedule::{Deferred, Millis, Scheduler};
use super::terminal::{TerminalTask, TerminalTyper};

/// Longest stretch of time a single frame replays. Anything beyond it, such as
/// the time a hidden tab received no frames, is skipped.
pub const MAX_FRAME_GAP: Millis = 1000;

/// Everything that can sit on the scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Task {
	Pool(EffectKind, PoolTask),
	Terminal(TerminalTask),
	Feed(FeedTask),
	ResizeSettled,
	Recreate,
	SettleStatCard(NodeId),
}

/// Root state object. Generic over the random source so tests can seed it.
pub struct Landing<R = SmallRng> {
	config: EffectsConfig,
	scheduler: Scheduler<Task>,
	rng: R,
	viewport: Viewport,
	matrix: EffectPool,
	shapes: EffectPool,
	particles: EffectPool,
	terminal: TerminalTyper,
	feed: TransactionFeed,
	navbar: NavbarState,
	resize: ResizeWatcher,
	started: bool,
}

impl<R: Rng> Landing<R> {
	pub fn new(config: EffectsConfig, viewport: Viewport, rng: R) -> Self {
		Self {
			matrix: EffectPool::new(EffectKind::MatrixColumn, config.matrix_columns),
			shapes: EffectPool::new(EffectKind::Shape, config.shape_count),
			particles: EffectPool::new(EffectKind::Particle, config.particle_count),
			terminal: TerminalTyper::with_default_commands(config.typing_speed_ms),
			feed: TransactionFeed::new(config.transaction_interval_ms),
			navbar: NavbarState::default(),
			resize: ResizeWatcher::new(viewport.width),
			scheduler: Scheduler::new(),
			config,
			rng,
			viewport,
			started: false,
		}
	}

	pub fn config(&self) -> &EffectsConfig {
		&self.config
	}

	pub fn viewport(&self) -> Viewport {
		self.viewport
	}

	pub fn pool(&self, kind: EffectKind) -> &EffectPool {
		match kind {
			EffectKind::MatrixColumn => &self.matrix,
			EffectKind::Shape => &self.shapes,
			EffectKind::Particle => &self.particles,
		}
	}

	pub fn terminal(&self) -> &TerminalTyper {
		&self.terminal
	}

	pub fn feed(&self) -> &TransactionFeed {
		&self.feed
	}

	pub fn navbar(&self) -> &NavbarState {
		&self.navbar
	}

	/// Current scheduler time.
	pub fn now(&self) -> Millis {
		self.scheduler.now()
	}

	/// Tasks waiting on the scheduler.
	pub fn pending_tasks(&self) -> usize {
		self.scheduler.pending()
	}

	/// Kick off every effect whose mount point exists. Idempotent.
	pub fn start(&mut self, scene: &mut impl Scene) {
		if self.started {
			return;
		}
		self.started = true;

		for kind in EffectKind::ALL {
			self.populate(kind, scene);
		}
		if let Some(first) = self.terminal.start(&*scene) {
			self.scheduler.schedule(first.map(Task::Terminal));
		}
		if let Some(first) = self.feed.start(&*scene) {
			self.scheduler.schedule(first.map(Task::Feed));
		}

		info!(
			"flossx: effects started ({} matrix columns, {} shapes, {} particles)",
			self.matrix.slots(self.viewport),
			self.shapes.slots(self.viewport),
			self.particles.slots(self.viewport),
		);
	}

	/// Advance by one animation frame. A gap longer than [`MAX_FRAME_GAP`] is
	/// skipped, not replayed: pending timers keep their remaining delay.
	pub fn tick(&mut self, scene: &mut impl Scene, now: Millis, clock: WallClock) {
		let gap = now.saturating_sub(self.scheduler.now());
		if gap > MAX_FRAME_GAP {
			let skipped = gap - MAX_FRAME_GAP;
			self.scheduler.skip(skipped);
			self.matrix.shift_clock(skipped);
			self.shapes.shift_clock(skipped);
			self.particles.shift_clock(skipped);
			debug!("flossx: skipped {}ms without frames", skipped);
		}
		self.advance_to(scene, now, clock);
	}

	/// Run every task due at or before `now`, however far away it is.
	pub fn advance_to(&mut self, scene: &mut impl Scene, now: Millis, clock: WallClock) {
		while let Some(task) = self.scheduler.pop_due(now) {
			self.dispatch(task, scene, clock);
		}
		self.scheduler.settle(now);
	}

	pub fn on_scroll(&mut self, scene: &mut impl Scene, offset: f64) {
		self.navbar.on_scroll(scene, offset);
	}

	/// Record the new size and (re)start the debounce timer.
	pub fn on_resize(&mut self, viewport: Viewport) {
		self.viewport = viewport;
		let id = self.scheduler.schedule_in(RESIZE_DEBOUNCE, Task::ResizeSettled);
		if let Some(previous) = self.resize.replace_settle(id) {
			self.scheduler.cancel(previous);
		}
	}

	pub fn on_visibility_change(&mut self, scene: &mut impl Scene, hidden: bool) {
		PerformanceHints::apply_visibility(scene, hidden);
	}

	pub fn apply_hardware_concurrency(&mut self, scene: &mut impl Scene, cores: Option<f64>) {
		PerformanceHints::apply_hardware_concurrency(scene, cores);
	}

	pub fn apply_battery_level(&mut self, scene: &mut impl Scene, level: f64) {
		PerformanceHints::apply_battery_level(scene, level);
	}

	/// A scroll-reveal element entered the viewport.
	pub fn reveal(&mut self, scene: &mut impl Scene, node: NodeId) {
		page::reveal(scene, node);
	}

	/// A stat card entered the viewport.
	pub fn nudge_stat_card(&mut self, scene: &mut impl Scene, node: NodeId) {
		page::nudge_stat_card(scene, node);
		self.scheduler
			.schedule_in(STAT_CARD_SETTLE, Task::SettleStatCard(node));
	}

	/// Clear the matrix rain and floating shapes and repopulate them shortly
	/// after. Calling this again before the repopulation fires replaces the
	/// pending one, so only one pool per type ever comes back.
	pub fn recreate_effects(&mut self, scene: &mut impl Scene) {
		self.matrix.clear(scene);
		self.shapes.clear(scene);
		let id = self.scheduler.schedule_in(RECREATE_DELAY, Task::Recreate);
		if let Some(previous) = self.resize.replace_recreate(id) {
			self.scheduler.cancel(previous);
		}
		debug!("flossx: background effects cleared for {}px", self.viewport.width);
	}

	fn populate(&mut self, kind: EffectKind, scene: &mut impl Scene) {
		let pool = match kind {
			EffectKind::MatrixColumn => &self.matrix,
			EffectKind::Shape => &self.shapes,
			EffectKind::Particle => &self.particles,
		};
		for deferred in pool.populate(&*scene, &mut self.rng, self.viewport) {
			self.scheduler.schedule(deferred.map(|t| Task::Pool(kind, t)));
		}
	}

	fn dispatch(&mut self, task: Task, scene: &mut impl Scene, clock: WallClock) {
		let now = self.scheduler.now();
		match task {
			Task::Pool(kind, task) => {
				let pool = match kind {
					EffectKind::MatrixColumn => &mut self.matrix,
					EffectKind::Shape => &mut self.shapes,
					EffectKind::Particle => &mut self.particles,
				};
				if let Some(next) = pool.handle(task, scene, &mut self.rng, self.viewport, now) {
					self.scheduler.schedule(next.map(|t| Task::Pool(kind, t)));
				}
			}
			Task::Terminal(task) => {
				let next = self.terminal.handle(task, scene);
				self.schedule_all(next, Task::Terminal);
			}
			Task::Feed(task) => {
				let next = self.feed.handle(task, scene, &mut self.rng, clock);
				self.schedule_all(next, Task::Feed);
			}
			Task::ResizeSettled => {
				if self.resize.settle(self.viewport.width) == ResizeOutcome::Recreate {
					self.recreate_effects(scene);
				}
			}
			Task::Recreate => {
				self.resize.recreate_fired();
				self.populate(EffectKind::MatrixColumn, scene);
				self.populate(EffectKind::Shape, scene);
			}
			Task::SettleStatCard(node) => page::settle_stat_card(scene, node),
		}
	}

	fn schedule_all<T>(&mut self, next: Vec<Deferred<T>>, wrap: impl Fn(T) -> Task) {
		for deferred in next {
			self.scheduler.schedule(deferred.map(&wrap));
		}
	}
}

/// Every mount point the page is expected to provide.
pub fn expected_mounts() -> impl Iterator<Item = &'static str> {
	MountPoint::ALL.into_iter().map(MountPoint::element_id)
}

#[cfg(test)]
mod tests {
	use rand::SeedableRng;

	use super::super::memory::MemoryScene;
	use super::*;

	const VIEWPORT: Viewport = Viewport {
		width: 1280.0,
		height: 800.0,
	};

	fn landing(config: EffectsConfig) -> (Landing, MemoryScene) {
		let mut scene = MemoryScene::with_all_mounts();
		let mut landing = Landing::new(config, VIEWPORT, SmallRng::seed_from_u64(42));
		landing.start(&mut scene);
		(landing, scene)
	}

	fn step(landing: &mut Landing, scene: &mut MemoryScene, until: Millis) {
		landing.advance_to(scene, until, WallClock::default());
	}

	#[test]
	fn all_pools_reach_target() {
		let (mut landing, mut scene) = landing(EffectsConfig::default());
		step(&mut landing, &mut scene, 5000);

		assert_eq!(landing.pool(EffectKind::MatrixColumn).live_count(), 50);
		assert_eq!(landing.pool(EffectKind::Shape).live_count(), 8);
		assert_eq!(landing.pool(EffectKind::Particle).live_count(), 15);
		assert_eq!(scene.children(MountPoint::MatrixRain).len(), 50);
		assert_eq!(scene.children(MountPoint::FloatingShapes).len(), 8);
		assert_eq!(scene.children(MountPoint::Particles).len(), 15);
	}

	#[test]
	fn start_twice_does_not_double_pools() {
		let (mut landing, mut scene) = landing(EffectsConfig::default());
		landing.start(&mut scene);
		step(&mut landing, &mut scene, 30_000);
		assert_eq!(scene.children(MountPoint::Particles).len(), 15);
	}

	#[test]
	fn recreate_twice_leaves_one_pool_per_type() {
		let (mut landing, mut scene) = landing(EffectsConfig::default());
		step(&mut landing, &mut scene, 6000);

		landing.recreate_effects(&mut scene);
		step(&mut landing, &mut scene, 6050);
		landing.recreate_effects(&mut scene);
		assert!(scene.children(MountPoint::MatrixRain).is_empty());
		assert!(scene.children(MountPoint::FloatingShapes).is_empty());

		for t in (7000..=80_000).step_by(1000) {
			step(&mut landing, &mut scene, t + 6050);
			assert!(scene.children(MountPoint::MatrixRain).len() <= 50);
			assert!(scene.children(MountPoint::FloatingShapes).len() <= 8);
		}
		assert_eq!(landing.pool(EffectKind::MatrixColumn).live_count(), 50);
		assert_eq!(landing.pool(EffectKind::Shape).live_count(), 8);
		assert_eq!(scene.children(MountPoint::MatrixRain).len(), 50);
		assert_eq!(scene.children(MountPoint::FloatingShapes).len(), 8);
		// Particles are not part of the rebuild.
		assert_eq!(scene.children(MountPoint::Particles).len(), 15);
	}

	#[test]
	fn resize_is_debounced_and_thresholded() {
		let (mut landing, mut scene) = landing(EffectsConfig::default());
		step(&mut landing, &mut scene, 6000);
		let generation = landing.pool(EffectKind::Shape).generation();

		// Small change: nothing happens.
		landing.on_resize(Viewport {
			width: 1200.0,
			height: 800.0,
		});
		step(&mut landing, &mut scene, 7000);
		assert_eq!(landing.pool(EffectKind::Shape).generation(), generation);

		// A burst of events settles once.
		for width in [1000.0, 900.0, 800.0] {
			landing.on_resize(Viewport {
				width,
				height: 800.0,
			});
			let until = landing.now() + 100;
			step(&mut landing, &mut scene, until);
		}
		assert_eq!(landing.pool(EffectKind::Shape).generation(), generation);
		let until = landing.now() + 250;
		step(&mut landing, &mut scene, until);
		assert_eq!(landing.pool(EffectKind::Shape).generation(), generation + 1);

		let until = landing.now() + 10_000;
		step(&mut landing, &mut scene, until);
		assert_eq!(landing.pool(EffectKind::MatrixColumn).live_count(), 40);
		assert_eq!(scene.children(MountPoint::MatrixRain).len(), 40);
	}

	#[test]
	fn long_pause_is_not_replayed() {
		let (mut landing, mut scene) = landing(EffectsConfig::default());
		step(&mut landing, &mut scene, 20_000);
		let spawned: u64 = EffectKind::ALL.iter().map(|k| landing.pool(*k).spawned()).sum();
		let live: usize = EffectKind::ALL.iter().map(|k| landing.pool(*k).live_count()).sum();
		let generated = landing.feed().total_generated();

		let now = 20_000 + 3_600_000;
		landing.tick(&mut scene, now, WallClock::default());

		let after: u64 = EffectKind::ALL.iter().map(|k| landing.pool(*k).spawned()).sum();
		assert!(after - spawned <= live as u64, "{} mounts", after - spawned);
		assert!(landing.feed().total_generated() - generated <= 1);
		assert_eq!(landing.now(), now);
		for kind in EffectKind::ALL {
			let pool = landing.pool(kind);
			assert_eq!(pool.live_count(), pool.slots(VIEWPORT));
			let lifetime = kind.profile().lifetime;
			assert!(pool.instances().all(|i| now - i.born_at < lifetime));
		}
	}

	#[test]
	fn short_frames_are_not_skipped() {
		let (mut ticked, mut ticked_scene) = landing(EffectsConfig::default());
		let (mut stepped, mut stepped_scene) = landing(EffectsConfig::default());
		for now in (0..20_000).step_by(16).chain([20_000]) {
			ticked.tick(&mut ticked_scene, now, WallClock::default());
		}
		step(&mut stepped, &mut stepped_scene, 20_000);
		for kind in EffectKind::ALL {
			assert_eq!(ticked.pool(kind).spawned(), stepped.pool(kind).spawned());
		}
		assert_eq!(ticked.feed().total_generated(), stepped.feed().total_generated());
	}

	#[test]
	fn stat_card_settles_later() {
		let (mut landing, mut scene) = landing(EffectsConfig::default());
		let card = scene.adopt("div", "stat-card");
		landing.nudge_stat_card(&mut scene, card);
		step(&mut landing, &mut scene, 299);
		assert_eq!(
			scene.node(card).unwrap().style("transform"),
			Some("translateY(-8px)")
		);
		step(&mut landing, &mut scene, 300);
		assert_eq!(
			scene.node(card).unwrap().style("transform"),
			Some("translateY(0)")
		);
	}

	#[test]
	fn empty_page_runs_nothing() {
		let mut scene = MemoryScene::new();
		let mut landing = Landing::new(
			EffectsConfig::default(),
			VIEWPORT,
			SmallRng::seed_from_u64(1),
		);
		landing.start(&mut scene);
		assert_eq!(landing.pending_tasks(), 0);
		landing.advance_to(&mut scene, 100_000, WallClock::default());
		assert_eq!(landing.feed().total_generated(), 0);
	}

	#[test]
	fn expected_mounts_match_page_ids() {
		let ids: Vec<_> = expected_mounts().collect();
		assert_eq!(
			ids,
			vec![
				"terminalContent",
				"matrixRain",
				"floatingShapes",
				"particleSystem",
				"transactionFeed"
			]
		);
	}
}

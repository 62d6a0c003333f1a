//! Small page-level adaptations: navbar scroll state, performance hints,
//! resize tracking and scroll-triggered reveals.
//!
//! The class names here are what the stylesheet keys on and must not change.

use super::scene::{ClassTarget, NodeId, Scene};
use super::schedule::{Millis, TaskId};

pub const SCROLLED: &str = "scrolled";
pub const REDUCED_MOTION: &str = "reduced-motion";
pub const BATTERY_SAVE: &str = "battery-save";
pub const PAUSED_ANIMATIONS: &str = "paused-animations";
pub const ANIMATE_IN: &str = "animate-in";

/// Vertical scroll offset past which the navbar turns solid.
pub const NAV_SCROLL_THRESHOLD: f64 = 100.0;

/// Fewer logical cores than this gets reduced motion.
pub const MIN_CORES_FOR_FULL_MOTION: f64 = 4.0;

/// Battery level below which background effects are hidden.
pub const LOW_BATTERY_LEVEL: f64 = 0.2;

pub const RESIZE_DEBOUNCE: Millis = 250;

/// Width change, in pixels, that warrants rebuilding the backgrounds.
pub const RESIZE_THRESHOLD: f64 = 200.0;

/// Pause between clearing the backgrounds and repopulating them.
pub const RECREATE_DELAY: Millis = 100;

/// Stat cards spring back after this long.
pub const STAT_CARD_SETTLE: Millis = 300;

/// Selectors revealed with [`ANIMATE_IN`] on first intersection.
pub const REVEAL_SELECTOR: &str = ".feature-card, .flow-step, .security-feature";
pub const REVEAL_THRESHOLD: f64 = 0.1;
pub const REVEAL_ROOT_MARGIN: &str = "0px 0px -50px 0px";

pub const STAT_CARD_SELECTOR: &str = ".stat-card";
pub const STAT_CARD_THRESHOLD: f64 = 0.3;

/// Tracks whether the navbar carries the `scrolled` class.
#[derive(Clone, Copy, Debug, Default)]
pub struct NavbarState {
	scrolled: bool,
}

impl NavbarState {
	pub fn is_scrolled(&self) -> bool {
		self.scrolled
	}

	/// Returns true if the class was toggled.
	pub fn on_scroll(&mut self, scene: &mut impl Scene, offset: f64) -> bool {
		let scrolled = offset > NAV_SCROLL_THRESHOLD;
		if scrolled == self.scrolled {
			return false;
		}
		self.scrolled = scrolled;
		scene.set_class(ClassTarget::Navbar, SCROLLED, scrolled);
		true
	}
}

/// Body classes that tone effects down on weak or constrained devices.
pub struct PerformanceHints;

impl PerformanceHints {
	/// `cores` is `None` when the browser does not report it.
	pub fn apply_hardware_concurrency(scene: &mut impl Scene, cores: Option<f64>) {
		if cores.is_some_and(|c| c > 0.0 && c < MIN_CORES_FOR_FULL_MOTION) {
			scene.set_class(ClassTarget::Body, REDUCED_MOTION, true);
		}
	}

	pub fn apply_battery_level(scene: &mut impl Scene, level: f64) {
		if level < LOW_BATTERY_LEVEL {
			scene.set_class(ClassTarget::Body, BATTERY_SAVE, true);
		}
	}

	pub fn apply_visibility(scene: &mut impl Scene, hidden: bool) {
		scene.set_class(ClassTarget::Body, PAUSED_ANIMATIONS, hidden);
	}
}

/// What a settled resize asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResizeOutcome {
	Ignore,
	Recreate,
}

/// Debounce and threshold bookkeeping for window resizes.
#[derive(Debug)]
pub struct ResizeWatcher {
	last_width: f64,
	pending_settle: Option<TaskId>,
	pending_recreate: Option<TaskId>,
}

impl ResizeWatcher {
	pub fn new(initial_width: f64) -> Self {
		Self {
			last_width: initial_width,
			pending_settle: None,
			pending_recreate: None,
		}
	}

	pub fn last_width(&self) -> f64 {
		self.last_width
	}

	/// Swap in a new debounce task, returning the one it supersedes.
	pub fn replace_settle(&mut self, id: TaskId) -> Option<TaskId> {
		self.pending_settle.replace(id)
	}

	/// Swap in a new recreate task, returning the one it supersedes.
	pub fn replace_recreate(&mut self, id: TaskId) -> Option<TaskId> {
		self.pending_recreate.replace(id)
	}

	pub fn recreate_fired(&mut self) {
		self.pending_recreate = None;
	}

	/// Decide on the width the window settled at.
	pub fn settle(&mut self, width: f64) -> ResizeOutcome {
		self.pending_settle = None;
		if (width - self.last_width).abs() > RESIZE_THRESHOLD {
			self.last_width = width;
			ResizeOutcome::Recreate
		} else {
			ResizeOutcome::Ignore
		}
	}
}

/// Mark a scroll-revealed element.
pub fn reveal(scene: &mut impl Scene, node: NodeId) {
	scene.set_class(ClassTarget::Node(node), ANIMATE_IN, true);
}

/// Lift a stat card; [`settle_stat_card`] drops it back.
pub fn nudge_stat_card(scene: &mut impl Scene, node: NodeId) {
	scene.set_style(node, "transform", "translateY(-8px)");
	scene.set_style(
		node,
		"transition",
		"all 0.6s cubic-bezier(0.25, 0.46, 0.45, 0.94)",
	);
}

pub fn settle_stat_card(scene: &mut impl Scene, node: NodeId) {
	scene.set_style(node, "transform", "translateY(0)");
}

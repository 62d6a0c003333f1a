//! Simulated live transaction feed.

use std::collections::VecDeque;

use chrono::{DateTime, FixedOffset};
use log::debug;
use rand::Rng;
use rand::seq::SliceRandom;

use super::scene::{MountPoint, NodeId, NodeSpec, Parent, Placement, Scene};
use super::schedule::{Deferred, MIN_INTERVAL, Millis};

/// Most items the feed shows at once.
pub const FEED_CAPACITY: usize = 8;

/// Roughly one animation frame, used to animate a fresh item in.
const REVEAL_DELAY: Millis = 16;

/// One row of the transaction catalogue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransactionKind {
	pub label: &'static str,
	pub icon: &'static str,
	pub status: &'static str,
}

pub const CATALOGUE: [TransactionKind; 6] = [
	TransactionKind {
		label: "ATM_WITHDRAWAL",
		icon: "🏧",
		status: "APPROVED",
	},
	TransactionKind {
		label: "POS_PURCHASE",
		icon: "💳",
		status: "APPROVED",
	},
	TransactionKind {
		label: "ONLINE_TRANSFER",
		icon: "💻",
		status: "APPROVED",
	},
	TransactionKind {
		label: "CONTACTLESS_PAY",
		icon: "📱",
		status: "APPROVED",
	},
	TransactionKind {
		label: "CARD_VALIDATION",
		icon: "✅",
		status: "VERIFIED",
	},
	TransactionKind {
		label: "FRAUD_CHECK",
		icon: "🛡️",
		status: "BLOCKED",
	},
];

/// Wall-clock reading supplied by the host.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WallClock {
	/// Milliseconds since the Unix epoch.
	pub epoch_ms: i64,
	/// Local offset east of UTC, in minutes.
	pub utc_offset_minutes: i32,
}

impl WallClock {
	/// Local `HH:MM:SS`, or an empty string for an unrepresentable time.
	pub fn time_of_day(&self) -> String {
		let offset = FixedOffset::east_opt(self.utc_offset_minutes * 60)
			.or_else(|| FixedOffset::east_opt(0));
		match (DateTime::from_timestamp_millis(self.epoch_ms), offset) {
			(Some(utc), Some(offset)) => utc.with_timezone(&offset).format("%H:%M:%S").to_string(),
			_ => String::new(),
		}
	}
}

/// A synthesized transaction.
#[derive(Clone, Debug, PartialEq)]
pub struct Transaction {
	pub id: String,
	pub kind: TransactionKind,
	/// Dollars, rounded to cents.
	pub amount: f64,
	pub time: String,
}

impl Transaction {
	/// Draw a random transaction stamped with `clock`.
	pub fn synthesize(rng: &mut impl Rng, clock: WallClock) -> Self {
		let kind = CATALOGUE.choose(rng).copied().unwrap_or(CATALOGUE[0]);
		let amount = (rng.gen_range(10.0..=9999.0_f64) * 100.0).round() / 100.0;
		Self {
			id: format!("TXN{:06}", clock.epoch_ms.rem_euclid(1_000_000)),
			kind,
			amount,
			time: clock.time_of_day(),
		}
	}

	pub fn formatted_amount(&self) -> String {
		format!("${:.2}", self.amount)
	}

	fn to_spec(&self) -> NodeSpec {
		let status_class = format!("transaction-status {}", self.kind.status.to_lowercase());
		NodeSpec::new("div")
			.class("transaction-item")
			.child(
				NodeSpec::new("div")
					.class("transaction-header")
					.child(NodeSpec::new("span").class("transaction-icon").text(self.kind.icon))
					.child(NodeSpec::new("span").class("transaction-id").text(&self.id))
					.child(NodeSpec::new("span").class(status_class).text(self.kind.status)),
			)
			.child(
				NodeSpec::new("div")
					.class("transaction-details")
					.child(NodeSpec::new("span").class("transaction-type").text(self.kind.label))
					.child(
						NodeSpec::new("span")
							.class("transaction-amount")
							.text(self.formatted_amount()),
					),
			)
			.child(NodeSpec::new("div").class("transaction-time").text(&self.time))
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeedTask {
	Generate,
	Reveal(NodeId),
}

/// Bounded, newest-first list of fake transactions.
#[derive(Debug)]
pub struct TransactionFeed {
	interval: Millis,
	items: VecDeque<(NodeId, Transaction)>,
	total: u64,
}

impl TransactionFeed {
	/// `interval` is raised to [`MIN_INTERVAL`] if smaller.
	pub fn new(interval: Millis) -> Self {
		Self {
			interval: interval.max(MIN_INTERVAL),
			items: VecDeque::with_capacity(FEED_CAPACITY + 1),
			total: 0,
		}
	}

	/// Delay between generated transactions.
	pub fn interval(&self) -> Millis {
		self.interval
	}

	/// Visible transactions, newest first.
	pub fn visible(&self) -> impl Iterator<Item = &Transaction> {
		self.items.iter().map(|(_, t)| t)
	}

	pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
		self.items.iter().map(|(n, _)| *n)
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	/// Transactions generated since start. Cosmetic only.
	pub fn total_generated(&self) -> u64 {
		self.total
	}

	/// The first transaction is generated right away.
	pub fn start(&self, scene: &impl Scene) -> Option<Deferred<FeedTask>> {
		if !scene.has_mount(MountPoint::TransactionFeed) {
			debug!("flossx: no transaction feed container");
			return None;
		}
		Some(Deferred::new(0, FeedTask::Generate))
	}

	pub fn handle(
		&mut self,
		task: FeedTask,
		scene: &mut impl Scene,
		rng: &mut impl Rng,
		clock: WallClock,
	) -> Vec<Deferred<FeedTask>> {
		match task {
			FeedTask::Generate => self.generate(scene, rng, clock),
			FeedTask::Reveal(node) => {
				if self.items.iter().any(|(n, _)| *n == node) {
					scene.set_style(node, "opacity", "1");
					scene.set_style(node, "transform", "translateX(0)");
				}
				Vec::new()
			}
		}
	}

	fn generate(
		&mut self,
		scene: &mut impl Scene,
		rng: &mut impl Rng,
		clock: WallClock,
	) -> Vec<Deferred<FeedTask>> {
		let transaction = Transaction::synthesize(rng, clock);
		let spec = transaction.to_spec();
		let Some(node) = scene.mount(
			Parent::Mount(MountPoint::TransactionFeed),
			Placement::Prepend,
			&spec,
		) else {
			debug!("flossx: transaction feed container gone, feed stops");
			return Vec::new();
		};

		self.items.push_front((node, transaction));
		while self.items.len() > FEED_CAPACITY {
			if let Some((old, _)) = self.items.pop_back() {
				scene.unmount(old);
			}
		}
		self.total += 1;

		vec![
			Deferred::new(REVEAL_DELAY, FeedTask::Reveal(node)),
			Deferred::new(self.interval, FeedTask::Generate),
		]
	}
}

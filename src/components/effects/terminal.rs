//! Fake terminal boot log, typed out one character at a time.

use log::{debug, info};

use super::scene::{MountPoint, NodeId, NodeSpec, Parent, Placement, Scene};
use super::schedule::{Deferred, MIN_INTERVAL, Millis};

/// Boot log shown in the hero terminal.
pub const DEFAULT_COMMANDS: [&str; 12] = [
	"./flossx83 --init-audit-engine",
	"[INFO] Starting FLOSSX83 Enterprise Suite...",
	"[OK] Core Switch Engine initialized",
	"[OK] HSM Tokenization service active",
	"[OK] Fraud Detection AI models loaded",
	"[INFO] Processing transaction flow...",
	"[AUDIT] ISO 8583 message parser ready",
	"[SECURITY] PCI DSS compliance verified",
	"[OK] ATM/POS Simulator GUI launched",
	"[TRACE] Real-time message tracer online",
	"[SUCCESS] All systems operational ✓",
	"[MONITOR] Awaiting transactions...",
];

pub const CURSOR_GLYPH: &str = "█";

/// A new line starts every this many character intervals.
const LINE_INTERVAL_FACTOR: Millis = 15;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerminalTask {
	NextLine,
	TypeChar { line: usize },
}

/// Typing runs once; idle is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerminalPhase {
	Typing,
	Idle,
}

#[derive(Debug)]
struct TypedLine {
	command: NodeId,
	chars: Vec<char>,
	typed: usize,
}

impl TypedLine {
	fn is_complete(&self) -> bool {
		self.typed >= self.chars.len()
	}
}

/// Reveals a fixed list of commands line by line, then parks a blinking
/// cursor on the last line.
#[derive(Debug)]
pub struct TerminalTyper {
	commands: Vec<String>,
	char_interval: Millis,
	next_line: usize,
	exhausted: bool,
	lines: Vec<TypedLine>,
	phase: TerminalPhase,
	cursor: Option<NodeId>,
}

impl TerminalTyper {
	/// `char_interval` is raised to [`MIN_INTERVAL`] if smaller.
	pub fn new<I, S>(commands: I, char_interval: Millis) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			commands: commands.into_iter().map(Into::into).collect(),
			char_interval: char_interval.max(MIN_INTERVAL),
			next_line: 0,
			exhausted: false,
			lines: Vec::new(),
			phase: TerminalPhase::Typing,
			cursor: None,
		}
	}

	pub fn with_default_commands(char_interval: Millis) -> Self {
		Self::new(DEFAULT_COMMANDS, char_interval)
	}

	pub fn phase(&self) -> TerminalPhase {
		self.phase
	}

	pub fn lines_rendered(&self) -> usize {
		self.lines.len()
	}

	/// Command span of every rendered line, in order.
	pub fn command_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
		self.lines.iter().map(|l| l.command)
	}

	pub fn cursor(&self) -> Option<NodeId> {
		self.cursor
	}

	pub fn line_interval(&self) -> Millis {
		self.char_interval.saturating_mul(LINE_INTERVAL_FACTOR)
	}

	/// First line tick, or nothing when the page has no terminal.
	pub fn start(&self, scene: &impl Scene) -> Option<Deferred<TerminalTask>> {
		if !scene.has_mount(MountPoint::Terminal) {
			debug!("flossx: no terminal container");
			return None;
		}
		Some(Deferred::new(self.line_interval(), TerminalTask::NextLine))
	}

	pub fn handle(
		&mut self,
		task: TerminalTask,
		scene: &mut impl Scene,
	) -> Vec<Deferred<TerminalTask>> {
		if self.phase == TerminalPhase::Idle {
			return Vec::new();
		}
		match task {
			TerminalTask::NextLine => self.next_line(scene),
			TerminalTask::TypeChar { line } => self.type_char(line, scene),
		}
	}

	fn next_line(&mut self, scene: &mut impl Scene) -> Vec<Deferred<TerminalTask>> {
		let Some(text) = self.commands.get(self.next_line) else {
			self.exhausted = true;
			self.finish_if_done(scene);
			return Vec::new();
		};

		let spec = NodeSpec::new("div")
			.class("terminal-line")
			.child(NodeSpec::new("span").class("prompt").text("$"));
		let Some(line) = scene.mount(Parent::Mount(MountPoint::Terminal), Placement::Append, &spec)
		else {
			debug!("flossx: terminal container gone, typing stops");
			self.phase = TerminalPhase::Idle;
			return Vec::new();
		};
		let command = NodeSpec::new("span").class("command");
		let Some(command) = scene.mount(Parent::Node(line), Placement::Append, &command) else {
			self.phase = TerminalPhase::Idle;
			return Vec::new();
		};

		let index = self.lines.len();
		self.lines.push(TypedLine {
			command,
			chars: text.chars().collect(),
			typed: 0,
		});
		self.next_line += 1;

		vec![
			Deferred::new(self.char_interval, TerminalTask::TypeChar { line: index }),
			Deferred::new(self.line_interval(), TerminalTask::NextLine),
		]
	}

	fn type_char(&mut self, index: usize, scene: &mut impl Scene) -> Vec<Deferred<TerminalTask>> {
		let Some(line) = self.lines.get_mut(index) else {
			return Vec::new();
		};
		if let Some(c) = line.chars.get(line.typed) {
			let mut buf = [0u8; 4];
			scene.append_text(line.command, c.encode_utf8(&mut buf));
			line.typed += 1;
		}
		if !line.is_complete() {
			return vec![Deferred::new(
				self.char_interval,
				TerminalTask::TypeChar { line: index },
			)];
		}
		self.finish_if_done(scene);
		Vec::new()
	}

	/// Park the cursor once every line has been dispatched and fully typed.
	fn finish_if_done(&mut self, scene: &mut impl Scene) {
		if !self.exhausted || !self.lines.iter().all(TypedLine::is_complete) {
			return;
		}
		self.phase = TerminalPhase::Idle;

		let Some(last) = self.lines.last() else {
			return;
		};
		let cursor = NodeSpec::new("span")
			.class("cursor")
			.text(CURSOR_GLYPH)
			.style("animation", "blink 1s infinite");
		self.cursor = scene.mount(Parent::Node(last.command), Placement::Append, &cursor);
		info!("flossx: terminal boot log complete");
	}
}

#[cfg(test)]
mod tests {
	use super::super::memory::MemoryScene;
	use super::super::schedule::Scheduler;
	use super::*;

	fn start(typer: &TerminalTyper, scene: &MemoryScene) -> Scheduler<TerminalTask> {
		let mut scheduler = Scheduler::new();
		if let Some(first) = typer.start(scene) {
			scheduler.schedule(first);
		}
		scheduler
	}

	fn advance(
		scheduler: &mut Scheduler<TerminalTask>,
		typer: &mut TerminalTyper,
		scene: &mut MemoryScene,
		until: Millis,
	) {
		while let Some(task) = scheduler.pop_due(until) {
			for next in typer.handle(task, scene) {
				scheduler.schedule(next);
			}
		}
		scheduler.settle(until);
	}

	fn run(typer: &mut TerminalTyper, scene: &mut MemoryScene, until: Millis) -> Scheduler<TerminalTask> {
		let mut scheduler = start(typer, scene);
		advance(&mut scheduler, typer, scene, until);
		scheduler
	}

	#[test]
	fn renders_every_line_then_one_cursor() {
		let mut scene = MemoryScene::with_all_mounts();
		let mut typer = TerminalTyper::with_default_commands(100);
		let scheduler = run(&mut typer, &mut scene, 10 * 60 * 1000);

		assert_eq!(typer.phase(), TerminalPhase::Idle);
		assert_eq!(scheduler.pending(), 0);
		assert_eq!(scene.children(MountPoint::Terminal).len(), DEFAULT_COMMANDS.len());

		let commands: Vec<NodeId> = typer.command_nodes().collect();
		for (node, expected) in commands.iter().zip(DEFAULT_COMMANDS) {
			assert_eq!(scene.node(*node).unwrap().text, expected);
		}

		let cursor = typer.cursor().unwrap();
		let last = scene.node(*commands.last().unwrap()).unwrap();
		assert_eq!(last.children, vec![cursor]);
		assert_eq!(scene.node(cursor).unwrap().text, CURSOR_GLYPH);
		assert_eq!(
			scene.node(cursor).unwrap().style("animation"),
			Some("blink 1s infinite")
		);

		for node in &commands[..commands.len() - 1] {
			assert!(scene.node(*node).unwrap().children.is_empty());
		}
	}

	#[test]
	fn reveals_left_to_right() {
		let mut scene = MemoryScene::with_all_mounts();
		let mut typer = TerminalTyper::new(["abcdef"], 10);

		// First line is appended at 150ms, characters follow every 10ms.
		run(&mut typer, &mut scene, 150 + 30);
		let node = typer.command_nodes().next().unwrap();
		assert_eq!(scene.node(node).unwrap().text, "abc");
		assert!(typer.cursor().is_none());
	}

	#[test]
	fn cursor_waits_for_last_line_to_finish() {
		let mut scene = MemoryScene::with_all_mounts();
		// The long last line is still typing when the line timer runs out.
		let long = "x".repeat(40);
		let mut typer = TerminalTyper::new(["a", long.as_str()], 10);
		let mut scheduler = start(&typer, &scene);

		advance(&mut scheduler, &mut typer, &mut scene, 3 * 150);
		assert_eq!(typer.lines_rendered(), 2);
		assert_eq!(typer.phase(), TerminalPhase::Typing);
		assert!(typer.cursor().is_none());

		advance(&mut scheduler, &mut typer, &mut scene, 2 * 150 + 40 * 10);
		assert_eq!(typer.phase(), TerminalPhase::Idle);
		assert!(typer.cursor().is_some());
		assert_eq!(scheduler.pending(), 0);
	}

	#[test]
	fn zero_speed_still_advances_the_clock() {
		let mut scene = MemoryScene::with_all_mounts();
		let mut typer = TerminalTyper::new(["ab"], 0);
		assert_eq!(typer.line_interval(), MIN_INTERVAL * LINE_INTERVAL_FACTOR);

		run(&mut typer, &mut scene, 100);
		assert_eq!(typer.phase(), TerminalPhase::Idle);
		let node = typer.command_nodes().next().unwrap();
		assert_eq!(scene.node(node).unwrap().text, "ab");
	}

	#[test]
	fn huge_speed_saturates_line_interval() {
		let typer = TerminalTyper::new(["ab"], Millis::MAX / 2);
		assert_eq!(typer.line_interval(), Millis::MAX);
	}

	#[test]
	fn missing_terminal_never_starts() {
		let scene = MemoryScene::new();
		let typer = TerminalTyper::with_default_commands(100);
		assert!(typer.start(&scene).is_none());
	}

	#[test]
	fn idle_is_final() {
		let mut scene = MemoryScene::with_all_mounts();
		let mut typer = TerminalTyper::new(["ok"], 10);
		run(&mut typer, &mut scene, 10_000);
		assert_eq!(typer.phase(), TerminalPhase::Idle);

		assert!(typer.handle(TerminalTask::NextLine, &mut scene).is_empty());
		assert_eq!(typer.lines_rendered(), 1);
	}

	#[test]
	fn empty_command_list_goes_idle_without_cursor() {
		let mut scene = MemoryScene::with_all_mounts();
		let mut typer = TerminalTyper::new(Vec::<String>::new(), 10);
		run(&mut typer, &mut scene, 1000);
		assert_eq!(typer.phase(), TerminalPhase::Idle);
		assert!(typer.cursor().is_none());
		assert!(scene.children(MountPoint::Terminal).is_empty());
	}
}

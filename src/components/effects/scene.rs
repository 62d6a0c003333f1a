//! Render-target abstraction.
//!
//! Effects never touch the DOM directly. They describe elements as
//! [`NodeSpec`] trees and hand them to a [`Scene`], which the browser build
//! implements over `web-sys` and tests implement in memory.

/// Named containers the host page provides.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MountPoint {
	Terminal,
	MatrixRain,
	FloatingShapes,
	Particles,
	TransactionFeed,
}

impl MountPoint {
	pub const ALL: [MountPoint; 5] = [
		MountPoint::Terminal,
		MountPoint::MatrixRain,
		MountPoint::FloatingShapes,
		MountPoint::Particles,
		MountPoint::TransactionFeed,
	];

	/// Element id of the container in the page markup.
	pub const fn element_id(self) -> &'static str {
		match self {
			MountPoint::Terminal => "terminalContent",
			MountPoint::MatrixRain => "matrixRain",
			MountPoint::FloatingShapes => "floatingShapes",
			MountPoint::Particles => "particleSystem",
			MountPoint::TransactionFeed => "transactionFeed",
		}
	}
}

/// Opaque handle to an element created by, or adopted into, a scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

/// Where a new element is attached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parent {
	Mount(MountPoint),
	Node(NodeId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
	Append,
	Prepend,
}

/// Elements whose class list effects may toggle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClassTarget {
	Body,
	Navbar,
	Node(NodeId),
}

/// Description of an element subtree to create.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeSpec {
	pub tag: &'static str,
	pub class: String,
	pub text: String,
	pub style: Vec<(&'static str, String)>,
	pub children: Vec<NodeSpec>,
}

impl NodeSpec {
	pub fn new(tag: &'static str) -> Self {
		Self {
			tag,
			..Self::default()
		}
	}

	pub fn class(mut self, class: impl Into<String>) -> Self {
		self.class = class.into();
		self
	}

	pub fn text(mut self, text: impl Into<String>) -> Self {
		self.text = text.into();
		self
	}

	pub fn style(mut self, property: &'static str, value: impl Into<String>) -> Self {
		self.style.push((property, value.into()));
		self
	}

	pub fn child(mut self, child: NodeSpec) -> Self {
		self.children.push(child);
		self
	}

	/// Look up a style property set on this spec.
	pub fn style_value(&self, property: &str) -> Option<&str> {
		self.style
			.iter()
			.find(|(p, _)| *p == property)
			.map(|(_, v)| v.as_str())
	}
}

/// Minimal set of render operations the effects need.
///
/// Every operation is best-effort: a missing parent or node makes it a no-op,
/// never an error.
pub trait Scene {
	/// Whether the host page provides this container.
	fn has_mount(&self, mount: MountPoint) -> bool;

	/// Create `node` under `parent`. Returns `None` if the parent is gone.
	fn mount(&mut self, parent: Parent, placement: Placement, node: &NodeSpec) -> Option<NodeId>;

	/// Detach a node. Returns false if it was already detached, for instance
	/// because its container was cleared.
	fn unmount(&mut self, node: NodeId) -> bool;

	fn set_style(&mut self, node: NodeId, property: &str, value: &str);

	fn append_text(&mut self, node: NodeId, text: &str);

	/// Detach everything under a container.
	fn clear(&mut self, mount: MountPoint);

	fn set_class(&mut self, target: ClassTarget, class: &str, on: bool);
}

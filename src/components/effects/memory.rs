//! In-memory [`Scene`] used by tests and headless runs.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use super::scene::{ClassTarget, MountPoint, NodeId, NodeSpec, Parent, Placement, Scene};

/// An element held by [`MemoryScene`].
#[derive(Clone, Debug, Default)]
pub struct MemoryNode {
	pub tag: &'static str,
	pub class: String,
	pub text: String,
	pub style: BTreeMap<String, String>,
	pub children: Vec<NodeId>,
	parent: Option<Parent>,
}

impl MemoryNode {
	pub fn style(&self, property: &str) -> Option<&str> {
		self.style.get(property).map(String::as_str)
	}

	pub fn has_class(&self, class: &str) -> bool {
		self.class.split_whitespace().any(|c| c == class)
	}
}

/// Element tree kept in plain collections.
///
/// Removing a node drops its whole subtree, so a stale [`NodeId`] simply stops
/// resolving.
#[derive(Debug, Default)]
pub struct MemoryScene {
	mounts: HashMap<MountPoint, Vec<NodeId>>,
	nodes: HashMap<NodeId, MemoryNode>,
	classes: HashMap<ClassTarget, BTreeSet<String>>,
	next_id: u64,
	unmounted: HashSet<NodeId>,
}

impl MemoryScene {
	/// A scene without any containers.
	pub fn new() -> Self {
		Self::default()
	}

	/// A scene providing every [`MountPoint`].
	pub fn with_all_mounts() -> Self {
		let mut scene = Self::new();
		for mount in MountPoint::ALL {
			scene.add_mount(mount);
		}
		scene
	}

	pub fn add_mount(&mut self, mount: MountPoint) {
		self.mounts.entry(mount).or_default();
	}

	/// Remove a container and everything in it, as a page teardown would.
	pub fn remove_mount(&mut self, mount: MountPoint) {
		self.clear(mount);
		self.mounts.remove(&mount);
	}

	/// Register an element that exists in the page but was not created by an
	/// effect (stat cards, feature cards).
	pub fn adopt(&mut self, tag: &'static str, class: &str) -> NodeId {
		let id = self.allocate();
		self.nodes.insert(
			id,
			MemoryNode {
				tag,
				class: class.to_string(),
				..MemoryNode::default()
			},
		);
		id
	}

	/// Top-level nodes of a container in document order.
	pub fn children(&self, mount: MountPoint) -> &[NodeId] {
		self.mounts.get(&mount).map(Vec::as_slice).unwrap_or(&[])
	}

	pub fn node(&self, id: NodeId) -> Option<&MemoryNode> {
		self.nodes.get(&id)
	}

	/// Whether the node is still attached somewhere in the scene.
	pub fn contains(&self, id: NodeId) -> bool {
		self.nodes.contains_key(&id)
	}

	/// Whether `unmount` has ever successfully detached this node.
	pub fn was_unmounted(&self, id: NodeId) -> bool {
		self.unmounted.contains(&id)
	}

	/// Text of a node and all of its descendants, in document order.
	pub fn text_content(&self, id: NodeId) -> String {
		let mut out = String::new();
		self.collect_text(id, &mut out);
		out
	}

	pub fn has_class(&self, target: ClassTarget, class: &str) -> bool {
		let toggled = self
			.classes
			.get(&target)
			.is_some_and(|set| set.contains(class));
		let static_class = match target {
			ClassTarget::Node(id) => self.nodes.get(&id).is_some_and(|n| n.has_class(class)),
			_ => false,
		};
		toggled || static_class
	}

	fn collect_text(&self, id: NodeId, out: &mut String) {
		if let Some(node) = self.nodes.get(&id) {
			out.push_str(&node.text);
			for child in &node.children {
				self.collect_text(*child, out);
			}
		}
	}

	fn allocate(&mut self) -> NodeId {
		let id = NodeId(self.next_id);
		self.next_id += 1;
		id
	}

	fn build(&mut self, spec: &NodeSpec, parent: Parent) -> NodeId {
		let id = self.allocate();
		let children = spec
			.children
			.iter()
			.map(|child| self.build(child, Parent::Node(id)))
			.collect();
		self.nodes.insert(
			id,
			MemoryNode {
				tag: spec.tag,
				class: spec.class.clone(),
				text: spec.text.clone(),
				style: spec
					.style
					.iter()
					.map(|(p, v)| (p.to_string(), v.clone()))
					.collect(),
				children,
				parent: Some(parent),
			},
		);
		id
	}

	fn drop_subtree(&mut self, id: NodeId) {
		if let Some(node) = self.nodes.remove(&id) {
			self.classes.remove(&ClassTarget::Node(id));
			for child in node.children {
				self.drop_subtree(child);
			}
		}
	}
}

impl Scene for MemoryScene {
	fn has_mount(&self, mount: MountPoint) -> bool {
		self.mounts.contains_key(&mount)
	}

	fn mount(&mut self, parent: Parent, placement: Placement, node: &NodeSpec) -> Option<NodeId> {
		let present = match parent {
			Parent::Mount(mount) => self.mounts.contains_key(&mount),
			Parent::Node(id) => self.nodes.contains_key(&id),
		};
		if !present {
			return None;
		}

		let id = self.build(node, parent);
		let siblings = match parent {
			Parent::Mount(mount) => self.mounts.get_mut(&mount)?,
			Parent::Node(pid) => &mut self.nodes.get_mut(&pid)?.children,
		};
		match placement {
			Placement::Append => siblings.push(id),
			Placement::Prepend => siblings.insert(0, id),
		}
		Some(id)
	}

	fn unmount(&mut self, node: NodeId) -> bool {
		let Some(parent) = self.nodes.get(&node).and_then(|n| n.parent) else {
			return false;
		};
		let siblings = match parent {
			Parent::Mount(mount) => self.mounts.get_mut(&mount),
			Parent::Node(pid) => self.nodes.get_mut(&pid).map(|n| &mut n.children),
		};
		if let Some(siblings) = siblings {
			siblings.retain(|id| *id != node);
		}
		self.drop_subtree(node);
		self.unmounted.insert(node);
		true
	}

	fn set_style(&mut self, node: NodeId, property: &str, value: &str) {
		if let Some(n) = self.nodes.get_mut(&node) {
			n.style.insert(property.to_string(), value.to_string());
		}
	}

	fn append_text(&mut self, node: NodeId, text: &str) {
		if let Some(n) = self.nodes.get_mut(&node) {
			n.text.push_str(text);
		}
	}

	fn clear(&mut self, mount: MountPoint) {
		let Some(roots) = self.mounts.get_mut(&mount) else {
			return;
		};
		for id in std::mem::take(roots) {
			self.drop_subtree(id);
		}
	}

	fn set_class(&mut self, target: ClassTarget, class: &str, on: bool) {
		if let ClassTarget::Node(id) = target {
			if !self.nodes.contains_key(&id) {
				return;
			}
		}
		let set = self.classes.entry(target).or_default();
		if on {
			set.insert(class.to_string());
		} else {
			set.remove(class);
		}
	}
}

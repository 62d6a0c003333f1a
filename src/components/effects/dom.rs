//! [`Scene`] over the live DOM.

use std::collections::HashMap;

use log::warn;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, Node};

use super::scene::{ClassTarget, MountPoint, NodeId, NodeSpec, Parent, Placement, Scene};

/// Maps [`NodeId`]s to the elements they stand for.
///
/// Entries for elements that have left the document are pruned whenever a
/// container is cleared, so the map tracks live effect nodes plus any adopted
/// page elements.
pub struct DomScene {
	document: Document,
	nodes: HashMap<NodeId, Element>,
	next_id: u64,
}

impl DomScene {
	pub fn new(document: Document) -> Self {
		Self {
			document,
			nodes: HashMap::new(),
			next_id: 0,
		}
	}

	/// Hand out an id for an element the page already contains. Adopting the
	/// same element twice returns the same id.
	pub fn adopt(&mut self, element: &Element) -> NodeId {
		let target: &Node = element;
		if let Some((id, _)) = self.nodes.iter().find(|(_, e)| e.is_same_node(Some(target))) {
			return *id;
		}
		let id = self.allocate();
		self.nodes.insert(id, element.clone());
		id
	}

	fn allocate(&mut self) -> NodeId {
		let id = NodeId(self.next_id);
		self.next_id += 1;
		id
	}

	fn container(&self, mount: MountPoint) -> Option<Element> {
		self.document.get_element_by_id(mount.element_id())
	}

	fn build(&self, spec: &NodeSpec) -> Option<Element> {
		let element = match self.document.create_element(spec.tag) {
			Ok(element) => element,
			Err(e) => {
				warn!("flossx: cannot create <{}>: {:?}", spec.tag, e);
				return None;
			}
		};
		if !spec.class.is_empty() {
			element.set_class_name(&spec.class);
		}
		if !spec.text.is_empty() {
			element.set_text_content(Some(&spec.text));
		}
		if let Some(html) = element.dyn_ref::<HtmlElement>() {
			let style = html.style();
			for (property, value) in &spec.style {
				let _ = style.set_property(property, value);
			}
		}
		for child in &spec.children {
			let child = self.build(child)?;
			let _ = element.append_child(&child);
		}
		Some(element)
	}

	fn class_target(&self, target: ClassTarget) -> Option<Element> {
		match target {
			ClassTarget::Body => self.document.body().map(Into::into),
			ClassTarget::Navbar => self.document.query_selector(".navbar").ok().flatten(),
			ClassTarget::Node(id) => self.nodes.get(&id).cloned(),
		}
	}
}

impl Scene for DomScene {
	fn has_mount(&self, mount: MountPoint) -> bool {
		self.container(mount).is_some()
	}

	fn mount(&mut self, parent: Parent, placement: Placement, node: &NodeSpec) -> Option<NodeId> {
		let parent = match parent {
			Parent::Mount(mount) => self.container(mount)?,
			Parent::Node(id) => self.nodes.get(&id)?.clone(),
		};
		let element = self.build(node)?;
		let attached = match placement {
			Placement::Append => parent.append_child(&element),
			Placement::Prepend => parent.insert_before(&element, parent.first_child().as_ref()),
		};
		if attached.is_err() {
			return None;
		}
		let id = self.allocate();
		self.nodes.insert(id, element);
		Some(id)
	}

	fn unmount(&mut self, node: NodeId) -> bool {
		let Some(element) = self.nodes.remove(&node) else {
			return false;
		};
		match element.parent_node() {
			Some(parent) => parent.remove_child(&element).is_ok(),
			None => false,
		}
	}

	fn set_style(&mut self, node: NodeId, property: &str, value: &str) {
		let Some(html) = self.nodes.get(&node).and_then(|e| e.dyn_ref::<HtmlElement>()) else {
			return;
		};
		let _ = html.style().set_property(property, value);
	}

	fn append_text(&mut self, node: NodeId, text: &str) {
		if let Some(element) = self.nodes.get(&node) {
			let mut content = element.text_content().unwrap_or_default();
			content.push_str(text);
			element.set_text_content(Some(&content));
		}
	}

	fn clear(&mut self, mount: MountPoint) {
		if let Some(container) = self.container(mount) {
			container.set_inner_html("");
		}
		self.nodes.retain(|_, element| element.is_connected());
	}

	fn set_class(&mut self, target: ClassTarget, class: &str, on: bool) {
		if let Some(element) = self.class_target(target) {
			let _ = element.class_list().toggle_with_force(class, on);
		}
	}
}

//! flossx-fx: Decorative visual effects for the FLOSSX83 landing page.
//!
//! This crate provides the client-side effects layer of a static marketing
//! page: a typed terminal boot log, matrix rain, floating shapes, particles and
//! a simulated transaction feed, plus small scroll, resize and performance
//! adaptations. The effect logic is environment-agnostic and runs natively in
//! tests; the WASM build mounts it into the page with Leptos.

#![cfg_attr(not(target_arch = "wasm32"), allow(unused_crate_dependencies))]

pub mod components;

pub use components::effects::{EffectKind, EffectsConfig, Landing, MemoryScene, Scene, Viewport};

#[cfg(target_arch = "wasm32")]
pub use web::{App, init_logging};

#[cfg(target_arch = "wasm32")]
mod web {
	use leptos::prelude::*;
	use leptos_meta::*;
	use log::{Level, info, warn};
	use wasm_bindgen::JsCast;
	use web_sys::{HtmlScriptElement, Window};

	use crate::components::effects::{EffectsConfig, EffectsLayer, expected_mounts};

	/// Initialize logging and panic hooks for the WASM target.
	pub fn init_logging() {
		let _ = console_log::init_with_level(Level::Debug);
		console_error_panic_hook::set_once();
		info!("flossx: logging initialized");
	}

	/// Load effect overrides from a script element with id="fx-config".
	/// Expected format: JSON object, e.g. { "particleCount": 30 }
	fn load_config() -> Option<EffectsConfig> {
		let window: Window = web_sys::window()?;
		let document = window.document()?;
		let element = document.get_element_by_id("fx-config")?;
		let script: HtmlScriptElement = element.dyn_into().ok()?;
		let json_text = script.text().ok()?;

		match EffectsConfig::from_json(&json_text) {
			Ok(config) => {
				info!("flossx: loaded config overrides {:?}", config);
				Some(config)
			}
			Err(e) => {
				warn!("flossx: failed to parse effect config: {}", e);
				None
			}
		}
	}

	/// Main application component.
	/// Loads effect configuration from the DOM and mounts the effects layer.
	#[component]
	pub fn App() -> impl IntoView {
		provide_meta_context();

		let config = load_config().unwrap_or_default();
		if let Some(document) = web_sys::window().and_then(|w| w.document()) {
			for id in expected_mounts() {
				if document.get_element_by_id(id).is_none() {
					info!("flossx: page has no #{}, its effect stays off", id);
				}
			}
		}

		view! {
			<Title text="FLOSSX83 Enterprise Suite" />
			<Meta charset="UTF-8" />
			<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

			<EffectsLayer config=config />
		}
	}
}

//! Leptos component hosting the background layers and driving every effect.
//!
//! The component renders the three decorative containers, then, once they are
//! in the document, builds a [`Landing`] over a [`DomScene`] and wires page
//! events to it. An animation loop runs via `requestAnimationFrame`, advancing
//! the effect scheduler to `performance.now()` each frame.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Array, Date, Function, Promise, Reflect};
use leptos::prelude::*;
use log::{debug, info, warn};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
	Document, Element, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit,
	Window,
};

use super::config::EffectsConfig;
use super::dom::DomScene;
use super::feed::WallClock;
use super::landing::Landing;
use super::page::{
	REVEAL_ROOT_MARGIN, REVEAL_SELECTOR, REVEAL_THRESHOLD, STAT_CARD_SELECTOR, STAT_CARD_THRESHOLD,
};
use super::pool::Viewport;
use super::schedule::Millis;

/// Fallback when the window does not report its size.
const DEFAULT_VIEWPORT: Viewport = Viewport {
	width: 1280.0,
	height: 800.0,
};

/// Effect state plus the scene it draws into.
struct Runtime {
	landing: Landing,
	scene: DomScene,
}

impl Runtime {
	fn tick(&mut self, window: &Window) {
		let Runtime { landing, scene } = self;
		landing.tick(scene, now_ms(window), wall_clock());
	}
}

/// Renders the matrix rain, floating shape and particle containers and starts
/// the effects once they are mounted.
///
/// The terminal, transaction feed, navbar and cards belong to the host page;
/// effects for any of them that are missing simply never start.
#[component]
pub fn EffectsLayer(#[prop(optional)] config: Option<EffectsConfig>) -> impl IntoView {
	let layer_ref = NodeRef::<leptos::html::Div>::new();
	let runtime: Rc<RefCell<Option<Rc<RefCell<Runtime>>>>> = Rc::new(RefCell::new(None));
	let config = config.unwrap_or_default();

	Effect::new(move |_| {
		if layer_ref.get().is_none() || runtime.borrow().is_some() {
			return;
		}
		*runtime.borrow_mut() = start(config.clone());
	});

	view! {
		<div node_ref=layer_ref class="effects-layer" aria-hidden="true">
			<div id="matrixRain" class="matrix-rain"></div>
			<div id="floatingShapes" class="floating-shapes"></div>
			<div id="particleSystem" class="particle-system"></div>
		</div>
	}
}

/// Build the runtime and hook it to the window. Returns `None` outside a
/// browser document.
fn start(config: EffectsConfig) -> Option<Rc<RefCell<Runtime>>> {
	let Some(window) = web_sys::window() else {
		warn!("flossx: no window, effects disabled");
		return None;
	};
	let Some(document) = window.document() else {
		warn!("flossx: no document, effects disabled");
		return None;
	};

	let mut scene = DomScene::new(document.clone());
	let mut landing = Landing::new(config, viewport_of(&window), SmallRng::from_entropy());
	landing.advance_to(&mut scene, now_ms(&window), wall_clock());
	landing.start(&mut scene);
	landing.on_scroll(&mut scene, window.page_y_offset().unwrap_or(0.0));
	let cores = window.navigator().hardware_concurrency();
	landing.apply_hardware_concurrency(&mut scene, (cores > 0.0).then_some(cores));

	let runtime = Rc::new(RefCell::new(Runtime { landing, scene }));

	listen(&window, "scroll", {
		let runtime = runtime.clone();
		move || {
			let Some(window) = web_sys::window() else {
				return;
			};
			let offset = window.page_y_offset().unwrap_or(0.0);
			let mut rt = runtime.borrow_mut();
			let Runtime { landing, scene } = &mut *rt;
			landing.on_scroll(scene, offset);
		}
	});

	listen(&window, "resize", {
		let runtime = runtime.clone();
		move || {
			let Some(window) = web_sys::window() else {
				return;
			};
			runtime.borrow_mut().landing.on_resize(viewport_of(&window));
		}
	});

	listen(&document, "visibilitychange", {
		let runtime = runtime.clone();
		let document = document.clone();
		move || {
			let mut rt = runtime.borrow_mut();
			let Runtime { landing, scene } = &mut *rt;
			landing.on_visibility_change(scene, document.hidden());
		}
	});

	observe(&document, REVEAL_SELECTOR, REVEAL_THRESHOLD, Some(REVEAL_ROOT_MARGIN), {
		let runtime = runtime.clone();
		move |element| {
			let mut rt = runtime.borrow_mut();
			let Runtime { landing, scene } = &mut *rt;
			let node = scene.adopt(&element);
			landing.reveal(scene, node);
		}
	});

	observe(&document, STAT_CARD_SELECTOR, STAT_CARD_THRESHOLD, None, {
		let runtime = runtime.clone();
		move |element| {
			let mut rt = runtime.borrow_mut();
			let Runtime { landing, scene } = &mut *rt;
			let node = scene.adopt(&element);
			landing.nudge_stat_card(scene, node);
		}
	});

	watch_battery(&window, runtime.clone());
	animate(&window, runtime.clone());

	info!("flossx: effects runtime attached");
	Some(runtime)
}

/// Attach a listener for the lifetime of the page.
fn listen(target: &web_sys::EventTarget, event: &str, mut handler: impl FnMut() + 'static) {
	let callback: Closure<dyn FnMut()> = Closure::new(move || handler());
	if target
		.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())
		.is_err()
	{
		warn!("flossx: could not listen for {}", event);
	}
	callback.forget();
}

/// Call `on_enter` for each element matching `selector` as it scrolls into view.
fn observe(
	document: &Document,
	selector: &str,
	threshold: f64,
	root_margin: Option<&str>,
	mut on_enter: impl FnMut(Element) + 'static,
) {
	let callback: Closure<dyn FnMut(Array, IntersectionObserver)> =
		Closure::new(move |entries: Array, _observer: IntersectionObserver| {
			for entry in entries.iter() {
				let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
					continue;
				};
				if entry.is_intersecting() {
					on_enter(entry.target());
				}
			}
		});

	let options = IntersectionObserverInit::new();
	options.set_threshold(&JsValue::from_f64(threshold));
	if let Some(margin) = root_margin {
		options.set_root_margin(margin);
	}
	let observer = match IntersectionObserver::new_with_options(
		callback.as_ref().unchecked_ref(),
		&options,
	) {
		Ok(observer) => observer,
		Err(e) => {
			warn!("flossx: IntersectionObserver unavailable: {:?}", e);
			return;
		}
	};

	if let Ok(list) = document.query_selector_all(selector) {
		for i in 0..list.length() {
			if let Some(element) = list.item(i).and_then(|n| n.dyn_into::<Element>().ok()) {
				observer.observe(&element);
			}
		}
		debug!("flossx: observing {} x {}", list.length(), selector);
	}
	callback.forget();
}

/// Hide background effects on a low battery, where the Battery API exists.
fn watch_battery(window: &Window, runtime: Rc<RefCell<Runtime>>) {
	let navigator = window.navigator();
	let get_battery = Reflect::get(&navigator, &JsValue::from_str("getBattery"))
		.ok()
		.and_then(|f| f.dyn_into::<Function>().ok());
	let Some(get_battery) = get_battery else {
		debug!("flossx: battery API unavailable");
		return;
	};
	let Some(promise) = get_battery
		.call0(&navigator)
		.ok()
		.and_then(|p| p.dyn_into::<Promise>().ok())
	else {
		return;
	};

	let on_battery = Closure::once(move |battery: JsValue| {
		let level = Reflect::get(&battery, &JsValue::from_str("level"))
			.ok()
			.and_then(|v| v.as_f64());
		if let Some(level) = level {
			let mut rt = runtime.borrow_mut();
			let Runtime { landing, scene } = &mut *rt;
			landing.apply_battery_level(scene, level);
		}
	});
	let _ = promise.then(&on_battery);
	on_battery.forget();
}

/// Advance the scheduler once per animation frame, forever.
fn animate(window: &Window, runtime: Rc<RefCell<Runtime>>) {
	let frame: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let frame_inner = frame.clone();
	*frame.borrow_mut() = Some(Closure::new(move || {
		let Some(window) = web_sys::window() else {
			return;
		};
		runtime.borrow_mut().tick(&window);
		if let Some(ref cb) = *frame_inner.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	}));
	if let Some(ref cb) = *frame.borrow() {
		let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
	}
}

fn viewport_of(window: &Window) -> Viewport {
	let width = window.inner_width().ok().and_then(|v| v.as_f64());
	let height = window.inner_height().ok().and_then(|v| v.as_f64());
	match (width, height) {
		(Some(width), Some(height)) => Viewport { width, height },
		_ => DEFAULT_VIEWPORT,
	}
}

fn now_ms(window: &Window) -> Millis {
	window
		.performance()
		.map(|p| p.now().max(0.0) as Millis)
		.unwrap_or_default()
}

fn wall_clock() -> WallClock {
	let date = Date::new_0();
	WallClock {
		epoch_ms: date.get_time() as i64,
		utc_offset_minutes: -(date.get_timezone_offset() as i32),
	}
}

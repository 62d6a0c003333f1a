//! Client entrypoint for the CSR build.

// Bin target reuses lib deps, silence noisy lint.
#![allow(unused_crate_dependencies)]

#[cfg(target_arch = "wasm32")]
fn main() {
	use flossx_fx::{App, init_logging};
	use leptos::prelude::*;

	init_logging();

	mount_to_body(|| {
		view! { <App /> }
	})
}

// Native builds only exist so `cargo test` works on the host.
#[cfg(not(target_arch = "wasm32"))]
fn main() {}

//! Tunables for the landing-page effects.

use serde::Deserialize;

/// Effect tunables. Every field falls back to its compile-time default when
/// missing from the page-supplied JSON.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct EffectsConfig {
	/// Milliseconds between typed terminal characters. Lines advance every
	/// fifteen characters' worth of time. Zero is treated as 1.
	#[serde(alias = "terminalSpeed")]
	pub typing_speed_ms: u64,
	/// Target population of the particle pool.
	#[serde(alias = "particleCount")]
	pub particle_count: usize,
	/// Target population of the floating-shape pool.
	#[serde(alias = "shapeCount")]
	pub shape_count: usize,
	/// Upper bound on matrix rain columns; the viewport width may allow fewer.
	#[serde(alias = "matrixColumns")]
	pub matrix_columns: usize,
	/// Milliseconds between synthesized transactions. Zero is treated as 1.
	#[serde(alias = "transactionInterval")]
	pub transaction_interval_ms: u64,
}

impl Default for EffectsConfig {
	fn default() -> Self {
		Self {
			typing_speed_ms: 100,
			particle_count: 15,
			shape_count: 8,
			matrix_columns: 50,
			transaction_interval_ms: 3000,
		}
	}
}

impl EffectsConfig {
	/// Parse overrides from a JSON object such as `{"particleCount": 30}`.
	pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(json)
	}
}

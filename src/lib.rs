// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Complexity limits (thresholds in clippy.toml)
#![deny(clippy::cognitive_complexity)]
#![deny(clippy::too_many_lines)]
#![deny(clippy::excessive_nesting)]
// Function signature hygiene
#![deny(clippy::too_many_arguments)]
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]

//! Occlusion-query based viewport object picking for wgpu renderers.
//!
//! Every candidate object is drawn under its own GPU occlusion query and the
//! per-query "anything drawn?" answers become an ordered list of hits. A
//! two-pass variant finds the single object nearest to the viewer.
//!
//! # Key entry points
//!
//! - [`select::SelectSession`] - begin / load id / end lifecycle of one
//!   picking pass
//! - [`select::select_nearest`] and [`select::Picker`] - one- and two-pass
//!   picking over a [`select::DrawDriver`]
//! - [`wgpu_target::WgpuSelectTarget`] - offscreen wgpu backend
//! - [`select::dummy::DummyGpu`] - CPU backend for tests and development
//! - [`options::Options`] - buffer and query pool sizing, TOML presets
//!
//! # Architecture
//!
//! A session borrows a [`select::SelectGpu`] (render state plus query pool
//! provider) and the caller's [`select::HitBuffer`]. It saves render state
//! at begin, issues one query per loaded id and restores render state when
//! it ends, whether the pass succeeded, overflowed the buffer or failed.

pub mod error;
pub mod options;
pub mod select;
pub mod wgpu_target;

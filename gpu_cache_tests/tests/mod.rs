// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! This crate contains the integration test suite for `gpu_cache`.
//!
//! - The `util` module contains a counting image allocator and a font whose
//!   glyph sizes are encoded in the glyph index, shared by all tests.
//! - We do not use the default Rust test harness, but instead use this `mod.rs` file as the
//!   entry point to run all other tests. This makes it easier to share the mock collaborators.
//! - If you want to add new tests, put them into the module of their topic (atlas packing,
//!   glyphs, textures, gc) and start the test name with that topic, e.g. `gc_keeps_live_atlas`
//!   rather than `keeps_live_atlas_in_gc`.

#![allow(missing_docs, reason = "we don't need docs for testing")]
#![allow(clippy::cast_possible_truncation, reason = "not critical for testing")]

mod util;

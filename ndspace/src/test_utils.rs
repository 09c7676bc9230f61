/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

use std::sync::Once;

use tracing::Level;

/// Set up a tracing subscriber with a filter, so we can print tracing logs
/// with >= level. `RUST_LOG`, when set, takes precedence over `level`.
///
/// Output goes through the test writer, so it is captured per test like
/// `println!`.
pub fn set_tracing_env_filter(level: Level) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.as_str()));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");
}

/// Installs the trace-level subscriber once per test binary.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| set_tracing_env_filter(Level::TRACE));
}

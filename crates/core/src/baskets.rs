// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reserved work-basket names used by the engine itself.

/// Basket a pause step pends the case at.
pub const PAUSE: &str = "workflow_pause";

/// Holding basket assigned by crash repair; a case pended here can be
/// resumed immediately.
pub const TEMP_HOLD: &str = "workflow_temp_hold";

/// Default system error basket for error pends.
pub const ERROR: &str = "workflow_error";

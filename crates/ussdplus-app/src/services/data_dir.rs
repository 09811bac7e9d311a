// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-aware data directory resolution.

use std::path::{Path, PathBuf};

use ussdplus_core::error::Result;

/// Return the application data directory, creating it if needed.
pub fn data_dir() -> Result<PathBuf> {
    data_dir_in(&dirs_fallback())
}

/// Default location of the desktop inbox fixture.
pub fn default_inbox() -> Result<PathBuf> {
    Ok(data_dir()?.join("inbox.db"))
}

fn data_dir_in(base: &Path) -> Result<PathBuf> {
    let dir = base.join("ussd-plus");
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn dirs_fallback() -> PathBuf {
    // Try XDG data dir, then fallback to home
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    // Last resort
    std::env::temp_dir()
}

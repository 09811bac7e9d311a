// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Host service layer: builds the method channel over a desktop inbox.

pub mod data_dir;
pub mod host;

// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query functions. Each module covers one table.

pub mod messages;
pub mod presence;
pub mod sessions;

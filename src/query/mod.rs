// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query module - retrieval and embedding commands

pub mod embed;
pub mod retrieve;

// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Plate detection endpoint

pub mod handler;

pub use handler::detect_handler;

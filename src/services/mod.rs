// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

pub mod engine;
pub mod field_codec;
pub mod logging;
pub mod orchestrator;
pub mod query_compiler;
pub mod result_projector;
pub mod search;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! aires-config: Hot-reloadable INI configuration for AIRES.
//!
//! The on-disk format is a plain INI file (`config/aires.ini`). Parsing is a
//! comment-preserving document model so `config set` can rewrite one value
//! without disturbing hand-written comments. Typed sections bind on top of
//! the document with warn-and-fallback semantics: a malformed numeric never
//! takes the service down.

pub mod document;
pub mod sections;
pub mod store;

pub use document::Document;
pub use sections::{
    AiServicesSection, AlertingSection, Config, DirectoriesSection, LoggingSection,
    MonitoringSection, PipelineSection, ProcessingSection, WatchdogSection,
};
pub use store::{ConfigError, ConfigStore};

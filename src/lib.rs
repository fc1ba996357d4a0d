//! Doppelgänger: a GitHub App that flags duplicate issues and reviews pull
//! requests.
//!
//! SYSTEM CONTEXT
//! ==============
//! GitHub delivers webhooks to `routes::webhook`. Issues are embedded and
//! compared with the repository's stored issues (`services::issue`); pull
//! requests are reviewed by a chat model with the code they depend on as
//! context (`services::pull_request`). The homepage feature section is
//! rendered by `features`.

pub mod config;
pub mod db;
pub mod deps;
pub mod features;
pub mod github;
pub mod llm;
pub mod routes;
pub mod services;
pub mod state;
pub mod vector;
pub mod webhook;

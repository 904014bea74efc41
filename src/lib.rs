//! # repo-lens
//!
//! Ingests a source repository, indexes it for exact nearest-neighbour
//! retrieval, and answers questions about it with a language model. A
//! second subsystem estimates the blast radius of changing a file from the
//! project's static import graph.
//!
//! ## Architecture
//!
//! ```text
//!   repo URL / local dir
//!          │
//!          ▼
//!   ┌──────────────┐    ┌──────────────┐    ┌──────────────────────┐
//!   │ materialize  │───▶│ walk + chunk │───▶│ embed (per file)     │
//!   │ (git2, depth │    │ (char / line │    │ failed file dropped  │
//!   │  1, timeout) │    │  windows)    │    └──────────┬───────────┘
//!   └──────────────┘    └──────┬───────┘               │ rebuild once
//!                              │                       ▼
//!                              │            ┌──────────────────────┐
//!                              │            │ VectorIndex snapshot │
//!                              │            │ indexes/ + metadata/ │
//!                              ▼            └──────────┬───────────┘
//!                   ┌────────────────────┐             │ top-k
//!                   │ dependency graph   │             ▼
//!                   │ graphs/{p}.json    │  ┌──────────────────────┐
//!                   └─────────┬──────────┘  │ context (15k chars)  │
//!                             │             │ + session window     │
//!                             ▼             │ + LanguageModel      │
//!                   ┌────────────────────┐  └──────────────────────┘
//!                   │ impact: direct +   │
//!                   │ one-hop indirect   │
//!                   └────────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for providers, ingestion and queries
//! - [`error`] - `EngineError` taxonomy and project-name validation
//! - [`models`] - Shared data types: `Chunk`, `ImpactResult`, request/response types
//! - [`chunking`] - Character-window and line-block chunkers
//! - [`search::vector`] - Exact Euclidean index with atomic disk persistence
//! - [`search::registry`] - Per-project snapshot cache with serialised replacement
//! - [`llm`] - Embedding and chat providers (Ollama, OpenAI, Anthropic, blake3 hash)
//! - [`git`] - Source materialization and filtered file walking
//! - [`ingest`] - The ingestion pipeline
//! - [`graph`] - Reference extraction, dependency graph and impact scoring
//! - [`analysis`] - Language mix, entry points and largest files
//! - [`chat`] - Query engine, prompt assembly and session store
//! - [`api`] - Thin axum handlers over the engine
//! - [`state`] - Shared application state

pub mod analysis;
pub mod api;
pub mod chat;
pub mod chunking;
pub mod config;
pub mod error;
pub mod git;
pub mod graph;
pub mod ingest;
pub mod llm;
pub mod models;
pub mod search;
pub mod state;

//! # Feedback Pulse
//!
//! A customer-feedback enrichment and retrieval-augmented answering
//! pipeline.
//!
//! Feedback Pulse takes free-text customer feedback rows, enriches each one
//! with sentiment and topic labels plus a semantic embedding via an external
//! AI gateway, indexes the enriched corpus in an in-memory vector index, and
//! answers natural-language questions over that corpus with a
//! retrieval-augmented generation flow.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌──────────────┐   ┌────────────┐   ┌──────────┐
//! │ Feedback  │──▶│  Enrichment   │──▶│  Vector    │──▶│   RAG    │
//! │ rows      │   │  (concurrent) │   │  index     │   │ answerer │
//! └───────────┘   └──────┬───────┘   └────────────┘   └────┬─────┘
//!                        │                                 │
//!                        ▼                                 ▼
//!                 ┌────────────┐                  ┌──────────────┐
//!                 │ AI gateway │◀─────────────────│   question   │
//!                 │ (external) │                  └──────────────┘
//!                 └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! pulse enrich --input data/rows.jsonl --output data/enriched.jsonl
//! pulse ask "Which supplier gets the worst feedback?" --data data/enriched.jsonl
//! pulse stats --data data/enriched.jsonl
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`prompts`] | Prompt template loading and rendering |
//! | [`models`] | Core data types and failure sentinels |
//! | [`gateway`] | External AI gateway (classify, embed, generate) |
//! | [`enrich`] | Concurrent per-row enrichment pipeline |
//! | [`index`] | In-memory vector index with top-k cosine queries |
//! | [`rag`] | Retrieval-augmented answerer |
//! | [`artifact`] | Line-delimited JSON artifact I/O |
//! | [`context`] | Application context and lifecycle |

pub mod artifact;
pub mod config;
pub mod context;
pub mod enrich;
pub mod gateway;
pub mod index;
pub mod models;
pub mod prompts;
pub mod rag;

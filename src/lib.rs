//! # lets-vote
//!
//! A web service presenting election-candidate information with
//! retrieval-augmented, citation-backed answers. User questions are embedded,
//! matched against a corpus of ingested text chunks by vector distance, and
//! answered by a hosted chat-completion model that is instructed to cite the
//! retrieved sources.
//!
//! ## Answer flow
//!
//! ```text
//!   ┌────────────┐   ┌───────────┐   ┌────────────────┐   ┌─────────────┐
//!   │ User query  │──▶│ Embedding │──▶│ KNN retrieval  │──▶│   Prompt    │
//!   │ (search /   │   │ generator │   │ (chunk store,  │   │  assembler  │
//!   │  issue)     │   │           │   │  doc/sibling   │   │ (citations) │
//!   └────────────┘   └───────────┘   │  joins)        │   └──────┬──────┘
//!                                    └────────────────┘          │
//!                                                                ▼
//!                                                       ┌────────────────┐
//!                                                       │  Completion    │
//!                                                       │  proxy (SSE    │
//!                                                       │  delta stream) │
//!                                                       └────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for the server, corpus
//!   location, and the embedding/completion providers
//! - [`error`] - The error taxonomy shared by every component and its single
//!   HTTP-status mapping
//! - [`models`] - Shared data types: `Document`, `Chunk`, `ScoredChunk`,
//!   `ChatMessage`, request/response types
//! - [`candidates`] - The static candidate catalog: races, candidates,
//!   links, tracked issues
//! - [`llm::embeddings`] - Embedding generation via an OpenAI-compatible API
//! - [`llm::chat_stream`] - Per-request provider selection and streamed chat
//!   completions
//! - [`retrieval`] - The `Retriever`, the `ChunkStore` repository interface,
//!   and the persisted in-memory store behind it
//! - [`prompt`] - Pure prompt assembly: base instructions, citation block,
//!   user customization
//! - [`stream_state`] - The streamed-response consumption state machine
//! - [`api`] - Axum HTTP handlers for search, the candidate pages, and the
//!   completion proxy
//! - [`state`] - Shared application state

pub mod api;
pub mod candidates;
pub mod config;
pub mod error;
pub mod llm;
pub mod models;
pub mod prompt;
pub mod retrieval;
pub mod state;
pub mod stream_state;

//! # ChatRAG
//!
//! Chat with your PDF documents.
//!
//! Uploaded PDFs are split into overlapping chunks, embedded, and kept in an
//! in-memory vector index. Questions are answered by a chat model that sees
//! the most relevant chunks and the conversation so far.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌────────────┐   ┌─────────────┐
//! │  Upload  │──▶│  Document  │──▶│ VectorIndex │
//! │ HTTP/CLI │   │ Processor  │   │  (cosine)   │
//! └──────────┘   └────────────┘   └──────┬──────┘
//!                                        │ retriever
//!                 ┌──────────────────────▼──────┐
//!   question ───▶ │ ConversationPipeline        │ ───▶ answer
//!                 │ retrieve→prompt→model→text  │
//!                 └─────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export GROQ_API_KEY=...
//! chatrag chat report.pdf      # terminal chat
//! chatrag serve                # HTTP API on 127.0.0.1:8501
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`chunk`] | Recursive character text splitter |
//! | [`extract`] | PDF text extraction |
//! | [`document`] | Upload → chunks |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`llm`] | Chat-completion clients |
//! | [`factory`] | Model factory |
//! | [`index`] | In-memory vector index and retriever |
//! | [`pipeline`] | Retrieval-augmented answer pipeline |
//! | [`controller`] | Session controller |
//! | [`session`] | Chat history rules shared by the front-ends |
//! | [`server`] | HTTP API |
//! | [`repl`] | Terminal chat |

pub mod chunk;
pub mod config;
pub mod controller;
pub mod document;
pub mod embedding;
pub mod extract;
pub mod factory;
pub mod http;
pub mod index;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod repl;
pub mod server;
pub mod session;

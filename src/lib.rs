//! # resume-qa
//!
//! Answers natural-language questions about a single resume.
//!
//! The resume is loaded from a JSON file and indexed by the first retrieval
//! tier that succeeds: semantic search over embedded chunks, or a lexical
//! (BM25) index as fallback. Questions retrieve the top chunks, and
//! questions that ask about a whole section ("tell me about your skills")
//! are answered with that section in full. An optional LLM rewrites the
//! retrieved text into a direct answer.
//!
//! ```text
//!   question ──► active backend ──(error)──► next backend
//!                      │
//!                      ▼
//!               ranked chunks ──► section match? ──► full section
//!                                       │
//!                                       └──► joined chunks / top chunk
//!                                                   │
//!                                          (generator configured?)
//!                                                   ▼
//!                                                 answer
//! ```
//!
//! Failures never surface to callers: `initialize` reports a boolean and
//! `answer` falls back to fixed messages.

pub mod api;
pub mod chunking;
pub mod classify;
pub mod config;
pub mod error;
pub mod llm;
pub mod models;
pub mod qa;
pub mod resume;
pub mod search;
pub mod state;

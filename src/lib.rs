//! Turn raw meeting transcripts into a one-liner, key points, decisions and
//! action items.
//!
//! The core lives in [`summarize`]: a caption-aware normalizer, a deterministic
//! heuristic extractor and an optional generative extractor behind a retry loop
//! that always degrades to the heuristic result.

pub mod batch;
pub mod config;
pub mod ingest;
pub mod output;
pub mod summarize;

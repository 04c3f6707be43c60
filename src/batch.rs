//! Summarize many transcripts on a small pool of scoped worker threads.
//!
//! Each transcript is an independent call into the shared [`Summarizer`]; results
//! come back in input order. A file that can't be read becomes an `error` record
//! instead of aborting the batch.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use tracing::{debug, warn};

use crate::ingest::{self, text::filename_to_title, Format, TranscriptDoc};
use crate::summarize::{GenerationParams, SummaryRecord, Summarizer};

/// Summarize one already-loaded transcript.
pub fn summarize_doc(summarizer: &Summarizer, doc: &TranscriptDoc, params: &GenerationParams) -> SummaryRecord {
    let result = summarizer.build_result(&doc.text, params);
    debug!(
        source = %doc.source,
        extractor = result.extractor.as_str(),
        attempts = result.attempts,
        "summarized transcript"
    );
    SummaryRecord::completed(&doc.title, &doc.source, result)
}

/// Load and summarize one file, turning read failures into an `error` record.
pub fn summarize_path(
    summarizer: &Summarizer,
    path: &Path,
    format: Option<Format>,
    params: &GenerationParams,
) -> SummaryRecord {
    match ingest::load_file(path, format) {
        Ok(doc) => summarize_doc(summarizer, &doc, params),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read transcript");
            SummaryRecord::failed(&filename_to_title(path), &path.display().to_string(), &format!("{e:#}"))
        }
    }
}

/// Summarize every path with up to `jobs` workers. Output order matches `paths`.
pub fn summarize_paths(
    summarizer: &Summarizer,
    paths: &[PathBuf],
    format: Option<Format>,
    params: &GenerationParams,
    jobs: usize,
) -> Vec<SummaryRecord> {
    let workers = jobs.max(1).min(paths.len());
    if workers <= 1 {
        return paths
            .iter()
            .map(|p| summarize_path(summarizer, p, format, params))
            .collect();
    }

    debug!(workers, transcripts = paths.len(), "starting batch");
    let next = AtomicUsize::new(0);
    let mut slots: Vec<Option<SummaryRecord>> = vec![None; paths.len()];

    thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                scope.spawn(|| {
                    let mut done = Vec::new();
                    loop {
                        let i = next.fetch_add(1, Ordering::Relaxed);
                        let Some(path) = paths.get(i) else { break };
                        done.push((i, summarize_path(summarizer, path, format, params)));
                    }
                    done
                })
            })
            .collect();

        for handle in handles {
            match handle.join() {
                Ok(done) => {
                    for (i, record) in done {
                        slots[i] = Some(record);
                    }
                }
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }
    });

    slots.into_iter().flatten().collect()
}

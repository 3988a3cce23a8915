//! Translation service boundary and the batch orchestrator.
//!
//! The orchestrator partitions candidates into fixed-size batches, validates
//! every returned pair against the source's structural fingerprint, and
//! drives a bounded retry loop that re-requests only the still-invalid
//! subset with accumulated feedback. Transport failures are fatal; only
//! validation failures are retried.

use std::collections::HashMap;
use std::num::NonZeroUsize;

use lru::LruCache;
use swiftloc_core::{Candidate, RowStatus, TranslationRow};
use swiftloc_tokens::{validate, ValidationIssue};
use thiserror::Error;
use tracing::{debug, info};

mod openai;
pub use openai::{OpenAiProvider, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_MS};

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("translation service HTTP {status}: {detail}")]
    Http { status: u16, detail: String },
    #[error("translation service connection error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("translation service returned an empty response body")]
    EmptyResponse,
    #[error("failed to parse translation service output: {0}")]
    MalformedResponse(String),
}

/// One batch request to the service. Association of the response is by
/// exact source string, never positional index.
#[derive(Debug)]
pub struct BatchRequest<'a> {
    pub model: &'a str,
    pub source_lang: &'a str,
    pub target_lang: &'a str,
    pub sources: &'a [String],
    pub validation_feedback: Option<&'a str>,
}

/// External collaborator reached over a request/response boundary.
pub trait TranslationProvider {
    fn translate(&self, req: &BatchRequest<'_>) -> Result<HashMap<String, String>, TranslateError>;
}

#[derive(Debug, Clone)]
pub struct TranslateOptions {
    pub model: String,
    pub source_lang: String,
    pub target_lang: String,
    pub batch_size: usize,
    pub max_retries: usize,
    pub cache_size: usize,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            model: "gpt-4.1".to_string(),
            source_lang: "en".to_string(),
            target_lang: "es".to_string(),
            batch_size: 30,
            max_retries: 2,
            cache_size: 1024,
        }
    }
}

pub const FALLBACK_VALIDATION: &str = "fallback_due_to_validation";
pub const MISSING_VALIDATION: &str = "fallback_missing_translation";

fn cache_key(opts: &TranslateOptions, source: &str) -> String {
    format!("{}|{}|{}", opts.source_lang, opts.target_lang, source)
}

/// Validate one returned pair. A target byte-identical to its source counts
/// as "no translation returned" so the retry loop can press the service for
/// a real translation; a literally empty source fails the empty check
/// instead.
fn validate_pair(source: &str, target: &str) -> Result<(), ValidationIssue> {
    validate(source, target)?;
    if target == source {
        return Err(ValidationIssue::MissingTranslation);
    }
    Ok(())
}

/// Run the full retry pipeline over ordered candidates and produce exactly
/// one row per candidate. Batches are independent and processed in order;
/// the service gets up to `max_retries + 1` attempts per batch.
pub fn translate_candidates(
    candidates: &[Candidate],
    provider: &dyn TranslationProvider,
    opts: &TranslateOptions,
) -> Result<Vec<TranslationRow>, TranslateError> {
    let mut cache: LruCache<String, String> =
        LruCache::new(NonZeroUsize::new(opts.cache_size.max(1)).unwrap());
    let mut final_targets: HashMap<String, String> = HashMap::new();
    let mut validations: HashMap<String, &'static str> = HashMap::new();

    let ordered: Vec<String> = candidates.iter().map(|c| c.source.clone()).collect();

    for batch in ordered.chunks(opts.batch_size.max(1)) {
        let mut pending: Vec<String> = Vec::new();

        // Cache hits skip the wire but still pass through validation.
        for source in batch {
            let key = cache_key(opts, source);
            match cache.get(&key).cloned() {
                Some(hit) if validate_pair(source, &hit).is_ok() => {
                    final_targets.insert(source.clone(), hit);
                    validations.insert(source.clone(), "ok");
                }
                Some(_) => {
                    cache.pop(&key);
                    pending.push(source.clone());
                }
                None => pending.push(source.clone()),
            }
        }

        let mut feedback: Option<String> = None;

        for attempt in 0..=opts.max_retries {
            if pending.is_empty() {
                break;
            }
            debug!(
                event = "translate_attempt",
                attempt = attempt,
                pending = pending.len(),
                has_feedback = feedback.is_some()
            );

            let translated = provider.translate(&BatchRequest {
                model: &opts.model,
                source_lang: &opts.source_lang,
                target_lang: &opts.target_lang,
                sources: &pending,
                validation_feedback: feedback.as_deref(),
            })?;

            let mut next_pending: Vec<String> = Vec::new();
            let mut issues: Vec<String> = Vec::new();

            for source in &pending {
                // A source omitted from the response defaults to identity.
                let target = translated.get(source).cloned().unwrap_or_else(|| source.clone());
                match validate_pair(source, &target) {
                    Ok(()) => {
                        cache.put(cache_key(opts, source), target.clone());
                        final_targets.insert(source.clone(), target);
                        validations.insert(source.clone(), "ok");
                    }
                    Err(reason) => {
                        issues.push(format!("{source} -> {reason}"));
                        next_pending.push(source.clone());
                    }
                }
            }

            if !next_pending.is_empty() && attempt < opts.max_retries {
                feedback = Some(format!(
                    "Previous attempt failed validation. Fix only these entries and preserve placeholders/interpolations/units exactly: {}",
                    issues.join("; ")
                ));
                pending = next_pending;
                continue;
            }

            // Retries exhausted: keep the original text.
            for source in next_pending {
                final_targets.insert(source.clone(), source.clone());
                validations.insert(source, FALLBACK_VALIDATION);
            }
            break;
        }
    }

    let rows: Vec<TranslationRow> = candidates
        .iter()
        .map(|candidate| {
            let target = final_targets
                .get(&candidate.source)
                .cloned()
                .unwrap_or_else(|| candidate.source.clone());
            let validation = validations
                .get(&candidate.source)
                .copied()
                .unwrap_or(MISSING_VALIDATION);
            let status = if target != candidate.source {
                RowStatus::Translated
            } else {
                RowStatus::Fallback
            };
            TranslationRow {
                source: candidate.source.clone(),
                target,
                status,
                validation: validation.to_string(),
                contexts: candidate.contexts.clone(),
            }
        })
        .collect();

    let translated = rows.iter().filter(|r| r.status == RowStatus::Translated).count();
    info!(
        event = "translate_done",
        total = rows.len(),
        translated = translated,
        fallback = rows.len() - translated
    );
    Ok(rows)
}

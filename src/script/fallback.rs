//! Fallback refiner: wraps any [`ScriptRefiner`] and polishes locally on error.
//!
//! When the underlying call fails for any reason (`MissingCredential`,
//! `Request`, `Status`, `Timeout`, `Parse`, `EmptyResponse`)
//! [`FallbackRefiner`] returns [`polish_locally`] of the raw text instead of
//! propagating the error.

use async_trait::async_trait;

use crate::script::refiner::{RefineError, ScriptRefiner};

/// Closing phrase appended by the local polish.
pub const CLOSING_PHRASE: &str = ". Enjoy!";

/// Deterministic local stand-in for the language model.
///
/// Title-cases every whitespace-separated token, strips trailing periods and
/// appends [`CLOSING_PHRASE`].  Pure: the output depends only on `raw`, and it
/// is never empty.
///
/// ```
/// use creator_studio::script::polish_locally;
///
/// assert_eq!(polish_locally("hello world"), "Hello World. Enjoy!");
/// assert_eq!(polish_locally("THE END..."), "The End. Enjoy!");
/// ```
pub fn polish_locally(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let words: Vec<String> = lowered.split_whitespace().map(capitalize).collect();
    let joined = words.join(" ");

    let mut polished = joined.trim_end_matches('.').to_string();
    polished.push_str(CLOSING_PHRASE);
    polished
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// FallbackRefiner
// ---------------------------------------------------------------------------

/// A transparent wrapper around any [`ScriptRefiner`] that never returns an
/// error.
///
/// # Example
/// ```rust
/// use creator_studio::config::ScriptConfig;
/// use creator_studio::script::{ApiRefiner, FallbackRefiner};
///
/// let refiner = FallbackRefiner::new(ApiRefiner::from_config(&ScriptConfig::default()));
/// // `refiner` is safe to use even when the API is unreachable.
/// ```
pub struct FallbackRefiner<R: ScriptRefiner> {
    inner: R,
}

impl<R: ScriptRefiner> FallbackRefiner<R> {
    /// Wrap `inner` with fallback behaviour.
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Return a reference to the wrapped refiner.
    pub fn inner(&self) -> &R {
        &self.inner
    }
}

#[async_trait]
impl<R: ScriptRefiner> ScriptRefiner for FallbackRefiner<R> {
    /// This implementation **never** returns `Err(_)`.
    async fn refine(&self, raw: &str) -> Result<String, RefineError> {
        match self.inner.refine(raw).await {
            Ok(refined) if !refined.trim().is_empty() => Ok(refined),
            Ok(_) => {
                log::warn!("script refinement returned blank text; polishing locally");
                Ok(polish_locally(raw))
            }
            Err(err) => {
                log::warn!("script refinement failed ({err}); polishing locally");
                Ok(polish_locally(raw))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

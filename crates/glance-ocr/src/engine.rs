use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use glance_types::{BoundingBox, Choice, RecognitionCandidate, TextOrientation};
use image::DynamicImage;

use crate::error::EngineError;

/// Raw symbol as reported by an engine; choices in engine order
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedSymbol {
    pub bbox: BoundingBox,
    pub choices: Vec<Choice>,
}

/// Interrupts a recognition call from another thread
pub trait AbortHandle: Send + Sync {
    /// Ask the call in progress to return as soon as possible. Safe to call
    /// at any time, including when nothing is running.
    fn abort(&self);
}

/// Symbol-level recognition engine driven by a single worker thread.
///
/// Implementations should drop stale abort requests in `set_image`, so an
/// abort aimed at a previous call does not cut the next one short.
pub trait RecognitionEngine: Send {
    fn set_image(&mut self, image: &DynamicImage);

    fn set_orientation(&mut self, orientation: TextOrientation);

    /// Recognize the current image, blocking until done or aborted
    fn recognize_symbols(&mut self) -> Result<Vec<RecognizedSymbol>, EngineError>;

    /// Release per-image state after a call
    fn reset(&mut self);

    fn abort_handle(&self) -> Arc<dyn AbortHandle>;
}

/// Plain flag engines can poll between units of work
#[derive(Debug, Default)]
pub struct AbortFlag(AtomicBool);

impl AbortFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear the flag, returning whether it was set
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }
}

impl AbortHandle for AbortFlag {
    fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Engine order is kept; each symbol's choices are sorted most likely first.
/// Symbols without any choice are dropped.
pub fn symbols_to_candidates(
    symbols: impl IntoIterator<Item = RecognizedSymbol>,
) -> Vec<RecognitionCandidate> {
    let mut candidates = Vec::new();
    let mut symbols = symbols.into_iter();

    while let Some(RecognizedSymbol { bbox, mut choices }) = symbols.next() {
        if choices.is_empty() {
            continue;
        }
        choices.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        candidates.push(RecognitionCandidate { bbox, choices });
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbol(x: i32, choices: &[(&str, f64)]) -> RecognizedSymbol {
        RecognizedSymbol {
            bbox: BoundingBox::new(x, 0, 10, 10),
            choices: choices.iter().map(|(t, c)| Choice::new(*t, *c)).collect(),
        }
    }

    #[test]
    fn keeps_symbol_order_and_sorts_choices() {
        let candidates = symbols_to_candidates(vec![
            symbol(0, &[("末", 0.3), ("未", 0.7)]),
            symbol(10, &[("来", 0.9)]),
        ]);

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].bbox.x, 0);
        let texts: Vec<&str> = candidates[0].choices.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["未", "末"]);
        assert_eq!(candidates[1].best().unwrap().text, "来");
    }

    #[test]
    fn equal_confidence_keeps_engine_order() {
        let candidates = symbols_to_candidates(vec![symbol(0, &[("a", 0.5), ("b", 0.5)])]);
        assert_eq!(candidates[0].choices[0].text, "a");
    }

    #[test]
    fn drops_symbols_without_choices() {
        let candidates = symbols_to_candidates(vec![symbol(0, &[]), symbol(5, &[("x", 0.1)])]);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].bbox.x, 5);
    }

    #[test]
    fn abort_flag_take_clears() {
        let flag = AbortFlag::new();
        assert!(!flag.take());
        flag.abort();
        assert!(flag.is_aborted());
        assert!(flag.take());
        assert!(!flag.is_aborted());
    }
}

//! Single-slot parse cache for math snippets
//!
//! Holds the tree of the most recently parsed snippet, keyed by its exact
//! text. Concurrent requests for the same text share one in-flight parse
//! through a weak registry of `OnceCell`s; the cell disappears once the
//! last waiter drops it.

use std::sync::{Arc, Weak};

use arc_swap::ArcSwapOption;
use fxhash::FxHashMap;
use parking_lot::Mutex;
use tokio::sync::OnceCell;

use super::parser::{MathParser, ParseOptions};
use super::tree::SyntaxTree;
use crate::utils::error::{AssistError, AssistResult};

type Flight = OnceCell<Option<Arc<SyntaxTree>>>;

/// Cached text/tree pair. Swapped as a unit so a reader never sees a tree
/// paired with another snippet's text.
struct CacheEntry {
    text: Arc<str>,
    tree: Arc<SyntaxTree>,
}

pub struct SnippetTreeCache {
    parser: Arc<dyn MathParser>,
    options: ParseOptions,
    slot: ArcSwapOption<CacheEntry>,
    in_flight: Mutex<FxHashMap<Arc<str>, Weak<Flight>>>,
}

impl SnippetTreeCache {
    pub fn new(parser: Arc<dyn MathParser>) -> Self {
        Self::with_options(parser, ParseOptions::default())
    }

    pub fn with_options(parser: Arc<dyn MathParser>, options: ParseOptions) -> Self {
        Self {
            parser,
            options,
            slot: ArcSwapOption::empty(),
            in_flight: Mutex::new(FxHashMap::default()),
        }
    }

    /// Tree for `text`, parsing only when the slot holds a different snippet.
    ///
    /// `Ok(None)` when the parser produced nothing; that outcome is not
    /// cached. Parser errors are returned as-is.
    pub async fn get(&self, text: &str) -> AssistResult<Option<Arc<SyntaxTree>>> {
        if let Some(tree) = self.lookup(text) {
            tracing::trace!(len = text.len(), "snippet cache hit");
            return Ok(Some(tree));
        }

        let tree = self.parse_shared(text).await?;
        if let Some(tree) = &tree {
            self.slot.store(Some(Arc::new(CacheEntry {
                text: Arc::from(text),
                tree: Arc::clone(tree),
            })));
        }
        Ok(tree)
    }

    /// Parse through the in-flight registry. A flight that finished and was
    /// pruned between the caller's miss and joining has already filled the
    /// slot, so the slot is checked again before parsing.
    async fn parse_shared(&self, text: &str) -> AssistResult<Option<Arc<SyntaxTree>>> {
        let flight = self.join_flight(text);
        let parsed = flight
            .get_or_try_init(|| async {
                if let Some(tree) = self.lookup(text) {
                    return Ok::<_, AssistError>(Some(tree));
                }
                tracing::debug!(len = text.len(), "parsing math snippet");
                let tree = self.parser.parse(text, self.options).await?;
                Ok::<_, AssistError>(tree.map(Arc::new))
            })
            .await
            .cloned();
        drop(flight);
        self.prune_flights();
        parsed
    }

    /// Cached tree for exactly `text`, without parsing
    pub fn lookup(&self, text: &str) -> Option<Arc<SyntaxTree>> {
        let entry = self.slot.load_full()?;
        if entry.text.as_ref() == text {
            Some(Arc::clone(&entry.tree))
        } else {
            None
        }
    }

    /// Text of the cached snippet, if any
    pub fn cached_text(&self) -> Option<Arc<str>> {
        self.slot.load_full().map(|entry| Arc::clone(&entry.text))
    }

    pub fn clear(&self) {
        self.slot.store(None);
    }

    fn join_flight(&self, text: &str) -> Arc<Flight> {
        let mut flights = self.in_flight.lock();
        if let Some(flight) = flights.get(text).and_then(Weak::upgrade) {
            return flight;
        }
        let flight = Arc::new(Flight::new());
        flights.insert(Arc::from(text), Arc::downgrade(&flight));
        flight
    }

    fn prune_flights(&self) {
        self.in_flight.lock().retain(|_, f| f.strong_count() > 0);
    }

    #[cfg(test)]
    fn flights_pending(&self) -> usize {
        self.in_flight.lock().len()
    }
}

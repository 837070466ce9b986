//! Breadth-first crawl frontier
//!
//! A FIFO queue of (URL, depth) targets paired with a hash-set index of every
//! URL ever enqueued, so membership checks are O(1) and a URL is never queued
//! twice in one run, even after it has been popped and failed.

use crate::url::normalize;
use std::collections::{HashSet, VecDeque};
use url::Url;

/// A page waiting to be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    /// Normalized page URL
    pub url: Url,

    /// Link distance from the start URL (the start URL is depth 0)
    pub depth: u32,
}

impl CrawlTarget {
    pub fn new(url: Url, depth: u32) -> Self {
        Self {
            url: normalize(&url),
            depth,
        }
    }
}

/// FIFO frontier with a seen-index
#[derive(Debug)]
pub struct Frontier {
    queue: VecDeque<CrawlTarget>,
    seen: HashSet<String>,
    max_depth: u32,
}

impl Frontier {
    /// Creates an empty frontier accepting targets up to `max_depth`
    pub fn new(max_depth: u32) -> Self {
        Self {
            queue: VecDeque::new(),
            seen: HashSet::new(),
            max_depth,
        }
    }

    /// Enqueues a target unless it is too deep or was ever enqueued before
    ///
    /// Returns true when the target was added.
    pub fn push_if_new(&mut self, target: CrawlTarget) -> bool {
        if target.depth > self.max_depth {
            tracing::trace!("Not queueing {} (depth {} > {})", target.url, target.depth, self.max_depth);
            return false;
        }

        if !self.seen.insert(target.url.as_str().to_string()) {
            return false;
        }

        tracing::trace!("Queued {} at depth {}", target.url, target.depth);
        self.queue.push_back(target);
        true
    }

    /// Pops the oldest target
    pub fn pop(&mut self) -> Option<CrawlTarget> {
        self.queue.pop_front()
    }

    /// Returns true if the URL was ever enqueued in this run
    #[cfg(test)]
    pub fn has_seen(&self, url: &Url) -> bool {
        self.seen.contains(normalize(url).as_str())
    }

    /// Number of targets still waiting
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

//! FIFO work queue with a visited set

use std::collections::{HashSet, VecDeque};

use url::Url;

/// Pending URLs of one crawl.
///
/// Every URL ever queued, the seed included, counts against the page budget,
/// so neither the queue nor the visited set can grow past it.
#[derive(Debug, Clone)]
pub struct Frontier {
    queue: VecDeque<Url>,
    queued: HashSet<String>,
    visited: HashSet<String>,
    budget: usize,
}

impl Frontier {
    /// Start a frontier holding only the seed
    pub fn new(seed: Url, budget: usize) -> Self {
        let mut frontier = Self {
            queue: VecDeque::new(),
            queued: HashSet::new(),
            visited: HashSet::new(),
            budget,
        };
        frontier.push(seed);
        frontier
    }

    /// Queue a URL unless it was seen before or the budget is used up.
    /// Returns whether it was queued.
    pub fn push(&mut self, url: Url) -> bool {
        if self.queued.len() >= self.budget || self.queued.contains(url.as_str()) {
            return false;
        }
        self.queued.insert(url.as_str().to_string());
        self.queue.push_back(url);
        true
    }

    /// Queue several URLs in order; returns how many were queued
    pub fn extend(&mut self, urls: impl IntoIterator<Item = Url>) -> usize {
        urls.into_iter().filter(|url| self.push(url.clone())).count()
    }

    /// Next pending URL
    pub fn pop(&mut self) -> Option<Url> {
        self.queue.pop_front()
    }

    /// Record a URL as fetched; returns false if it already was
    pub fn mark_visited(&mut self, url: &Url) -> bool {
        self.visited.insert(url.as_str().to_string())
    }

    /// Number of URLs fetched so far
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// How many more URLs may be queued
    pub fn remaining_capacity(&self) -> usize {
        self.budget.saturating_sub(self.queued.len())
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

//! Result accumulator shared by concurrent variant searches
//!
//! Owns every raw batch returned so far plus the set of content hashes seen, so
//! the hunt service can stop issuing searches once the global result cap is
//! reached. Safe to share between in-flight searches.

use std::collections::HashSet;

use parking_lot::Mutex;

use super::content_search::RawCandidate;

#[derive(Debug, Default)]
struct AccumulatorState {
    batches: Vec<Vec<RawCandidate>>,
    seen: HashSet<String>,
    total: usize,
}

/// Accumulates raw search batches and counts unique content hashes
#[derive(Debug)]
pub struct CandidateAccumulator {
    cap: usize,
    state: Mutex<AccumulatorState>,
}

impl CandidateAccumulator {
    /// `cap` is the global unique-result budget; 0 means unbounded
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            state: Mutex::new(AccumulatorState::default()),
        }
    }

    /// Record one search batch and return the unique count afterwards.
    /// Duplicates are kept here and dropped later, first occurrence first.
    pub fn add_batch(&self, batch: Vec<RawCandidate>) -> usize {
        let mut state = self.state.lock();
        state.total += batch.len();
        for candidate in &batch {
            state.seen.insert(candidate.content_hash.clone());
        }
        state.batches.push(batch);
        state.seen.len()
    }

    pub fn unique_count(&self) -> usize {
        self.state.lock().seen.len()
    }

    /// Raw records received so far, duplicates included
    pub fn total_results(&self) -> usize {
        self.state.lock().total
    }

    pub fn is_full(&self) -> bool {
        self.cap > 0 && self.unique_count() >= self.cap
    }

    /// All batches flattened in arrival order
    pub fn into_candidates(self) -> Vec<RawCandidate> {
        self.state.into_inner().batches.into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(hashes: &[&str]) -> Vec<RawCandidate> {
        hashes
            .iter()
            .map(|h| RawCandidate::new(*h, format!("Title {}", h)))
            .collect()
    }

    #[test]
    fn test_counts_unique_hashes() {
        let acc = CandidateAccumulator::new(10);
        assert_eq!(acc.add_batch(batch(&["a", "b"])), 2);
        assert_eq!(acc.add_batch(batch(&["b", "c"])), 3);
        assert_eq!(acc.total_results(), 4);
        assert!(!acc.is_full());
    }

    #[test]
    fn test_duplicates_within_batch_count_once() {
        let acc = CandidateAccumulator::new(0);
        assert_eq!(acc.add_batch(batch(&["a", "a", "b", "a"])), 2);
        assert_eq!(acc.unique_count(), 2);
        assert_eq!(acc.total_results(), 4);
    }

    #[test]
    fn test_full_at_cap() {
        let acc = CandidateAccumulator::new(2);
        acc.add_batch(batch(&["a", "a"]));
        assert!(!acc.is_full());
        acc.add_batch(batch(&["b"]));
        assert!(acc.is_full());
    }

    #[test]
    fn test_zero_cap_is_unbounded() {
        let acc = CandidateAccumulator::new(0);
        acc.add_batch(batch(&["a", "b", "c"]));
        assert!(!acc.is_full());
    }

    #[test]
    fn test_into_candidates_keeps_arrival_order() {
        let acc = CandidateAccumulator::new(0);
        acc.add_batch(batch(&["x", "y"]));
        acc.add_batch(batch(&["y", "z"]));
        let hashes: Vec<String> = acc
            .into_candidates()
            .into_iter()
            .map(|c| c.content_hash)
            .collect();
        assert_eq!(hashes, vec!["x", "y", "y", "z"]);
    }
}

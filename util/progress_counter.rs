use std::sync::{
	atomic::{AtomicU64, Ordering},
	Arc,
};

/// A cheaply clonable counter used to report how far a scan over a dataframe has come.
#[derive(Clone, Debug)]
pub struct ProgressCounter {
	current: Arc<AtomicU64>,
	total: u64,
}

impl ProgressCounter {
	pub fn new(total: u64) -> Self {
		Self {
			current: Arc::new(AtomicU64::new(0)),
			total,
		}
	}
	pub fn total(&self) -> u64 {
		self.total
	}
	pub fn get(&self) -> u64 {
		self.current.load(Ordering::Relaxed)
	}
	pub fn inc(&self, amount: u64) {
		self.current.fetch_add(amount, Ordering::Relaxed);
	}
}

#[test]
fn test_progress_counter() {
	let counter = ProgressCounter::new(10);
	let clone = counter.clone();
	counter.inc(3);
	clone.inc(4);
	assert_eq!(counter.get(), 7);
	assert_eq!(counter.total(), 10);
}

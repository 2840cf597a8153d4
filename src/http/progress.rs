//! Transfer progress reporting.

// self
use crate::_prelude::*;

/// Callback receiving whole percentages in `0..=100`.
pub type ProgressCallback = Arc<dyn Fn(u8) + Send + Sync>;

/// Converts byte counters into percentages and forwards them to a callback.
///
/// Nothing is reported while the total size is unknown or zero.
#[derive(Clone)]
pub struct ProgressReporter(ProgressCallback);
impl ProgressReporter {
	/// Wraps a percentage callback.
	pub fn new(callback: impl Fn(u8) + Send + Sync + 'static) -> Self {
		Self(Arc::new(callback))
	}

	/// Reports `floor(loaded * 100 / total)`, clamped to 100.
	pub fn report(&self, loaded: u64, total: Option<u64>) {
		if let Some(percent) = percent(loaded, total) {
			(self.0)(percent);
		}
	}
}
impl Debug for ProgressReporter {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("ProgressReporter(..)")
	}
}

fn percent(loaded: u64, total: Option<u64>) -> Option<u8> {
	let total = total.filter(|total| *total > 0)?;
	let ratio = u128::from(loaded.min(total)) * 100 / u128::from(total);

	u8::try_from(ratio).ok()
}

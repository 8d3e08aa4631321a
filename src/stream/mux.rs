//! Lazy k-way merge of ordered record sources.

// crates.io
use futures_util::future;
// self
use crate::{
	_prelude::*,
	obs::{self, OperationKind, OperationSpan, Outcome},
	stream::{BoxSource, RecordSource, SourceFuture},
};

/// Shared total order over records.
pub type Comparator<T> = Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

struct Cursor<T> {
	index: usize,
	head: T,
	source: BoxSource<T>,
}

enum State<T> {
	Idle(Vec<BoxSource<T>>),
	Merging,
}

/// Merges sources that are each ordered under the same comparator into one ordered source.
///
/// The first pull asks every source for its head concurrently. Afterwards only the source whose
/// head was handed out last is advanced, so each source holds at most one fetched but unyielded
/// record at any time. Equal heads are yielded in the order their sources were given.
///
/// A source that fails is dropped after its error has been returned; pulling again continues
/// with the remaining sources. Errors raised by the initial pulls are returned one per call, in
/// source order, before merging starts.
pub struct Mux<T> {
	state: State<T>,
	compare: Comparator<T>,
	cursors: VecDeque<Cursor<T>>,
	yielded: Option<(usize, BoxSource<T>)>,
	errors: VecDeque<Error>,
}
impl<T> Mux<T>
where
	T: 'static + Send,
{
	/// Creates a merge over `sources` ordered by `compare`; nothing is fetched until first pull.
	pub fn new(sources: Vec<BoxSource<T>>, compare: Comparator<T>) -> Self {
		Self {
			state: State::Idle(sources),
			compare,
			cursors: VecDeque::new(),
			yielded: None,
			errors: VecDeque::new(),
		}
	}

	/// Convenience constructor taking a plain comparison function.
	pub fn by<F>(sources: Vec<BoxSource<T>>, compare: F) -> Self
	where
		F: 'static + Fn(&T, &T) -> Ordering + Send + Sync,
	{
		Self::new(sources, Arc::new(compare))
	}

	/// Number of sources still able to yield records.
	pub fn live_sources(&self) -> usize {
		match &self.state {
			State::Idle(sources) => sources.len(),
			State::Merging => self.cursors.len() + usize::from(self.yielded.is_some()),
		}
	}

	async fn start(&mut self, mut sources: Vec<BoxSource<T>>) {
		let heads = future::join_all(sources.iter_mut().map(|source| source.next())).await;
		let mut cursors = Vec::with_capacity(sources.len());

		for (index, (source, head)) in sources.into_iter().zip(heads).enumerate() {
			match head {
				Ok(Some(head)) => cursors.push(Cursor { index, head, source }),
				Ok(None) => {},
				Err(e) => {
					tracing::warn!(source = index, error = %e, "Dropping failed merge source.");

					self.errors.push_back(e);
				},
			}
		}

		let compare = self.compare.clone();

		// Stable sort keeps input order among equal heads.
		cursors.sort_by(|a, b| compare(&a.head, &b.head));

		self.cursors = cursors.into();
		self.state = State::Merging;
	}

	async fn refill(&mut self) -> Result<()> {
		let Some((index, mut source)) = self.yielded.take() else {
			return Ok(());
		};

		match source.next().await {
			Ok(Some(head)) => {
				self.insert(Cursor { index, head, source });

				Ok(())
			},
			Ok(None) => Ok(()),
			Err(e) => {
				tracing::warn!(source = index, error = %e, "Dropping failed merge source.");

				Err(e)
			},
		}
	}

	fn insert(&mut self, cursor: Cursor<T>) {
		let compare = &self.compare;
		let at = self.cursors.partition_point(|existing| {
			compare(&existing.head, &cursor.head).then(existing.index.cmp(&cursor.index))
				== Ordering::Less
		});

		self.cursors.insert(at, cursor);
	}

	async fn advance(&mut self) -> Result<Option<T>> {
		if let State::Idle(sources) = &mut self.state {
			let sources = std::mem::take(sources);

			self.start(sources).await;
		}
		if let Some(e) = self.errors.pop_front() {
			return Err(e);
		}

		self.refill().await?;

		let Some(Cursor { index, head, source }) = self.cursors.pop_front() else {
			return Ok(None);
		};

		self.yielded = Some((index, source));

		Ok(Some(head))
	}
}
impl<T> RecordSource<T> for Mux<T>
where
	T: 'static + Send,
{
	fn next(&mut self) -> SourceFuture<'_, Option<T>> {
		Box::pin(async move {
			let span = OperationSpan::new(OperationKind::Aggregate, "mux_next");
			let result = span.instrument(self.advance()).await;

			if result.is_err() {
				obs::record_operation_outcome(OperationKind::Aggregate, Outcome::SourceDropped);
			}

			result
		})
	}
}
impl<T> Debug for Mux<T> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Mux")
			.field("started", &matches!(self.state, State::Merging))
			.field("cursors", &self.cursors.len())
			.field("pending_errors", &self.errors.len())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
	// self
	use super::*;
	use crate::stream::{IterSource, collect};

	struct Counted {
		items: VecDeque<i64>,
		pulls: Arc<AtomicUsize>,
	}
	impl RecordSource<i64> for Counted {
		fn next(&mut self) -> SourceFuture<'_, Option<i64>> {
			self.pulls.fetch_add(1, AtomicOrdering::SeqCst);

			let item = self.items.pop_front();

			Box::pin(async move { Ok(item) })
		}
	}

	struct Failing;
	impl RecordSource<i64> for Failing {
		fn next(&mut self) -> SourceFuture<'_, Option<i64>> {
			Box::pin(async { Err(Error::http(500, "down")) })
		}
	}

	fn descending(a: &i64, b: &i64) -> Ordering {
		b.cmp(a)
	}

	fn boxed(items: &[i64]) -> BoxSource<i64> {
		Box::new(IterSource::new(items.to_vec()))
	}

	#[tokio::test]
	async fn merges_descending_sources() {
		let mut mux = Mux::by(vec![boxed(&[10, 8, 5]), boxed(&[9, 7]), boxed(&[])], descending);
		let merged = collect(&mut mux).await.expect("Merge should succeed.");

		assert_eq!(merged, vec![10, 9, 8, 7, 5]);
		assert_eq!(mux.next().await.expect("Exhausted merge should not fail."), None);
	}

	#[tokio::test]
	async fn zero_sources_are_immediately_exhausted() {
		let mut mux = Mux::<i64>::by(vec![], descending);

		assert_eq!(mux.next().await.expect("Empty merge should not fail."), None);
	}

	#[tokio::test]
	async fn output_is_sorted_permutation_of_inputs() {
		let inputs: [&[i64]; 4] = [&[1, 4, 4, 9], &[2, 3, 10], &[4], &[0, 0, 11, 12, 13]];
		let sources = inputs.iter().map(|items| boxed(items)).collect();
		let mut mux = Mux::by(sources, |a: &i64, b: &i64| a.cmp(b));
		let merged = collect(&mut mux).await.expect("Merge should succeed.");
		let mut expected = inputs.concat();

		expected.sort();

		assert_eq!(merged, expected);
	}

	#[tokio::test]
	async fn each_source_holds_at_most_one_unyielded_head() {
		let counters = (0..3).map(|_| Arc::new(AtomicUsize::new(0))).collect::<Vec<_>>();
		let inputs: [&[i64]; 3] = [&[9, 6, 3], &[8, 5, 2], &[7, 4, 1]];
		let sources = inputs
			.iter()
			.zip(&counters)
			.map(|(items, pulls)| {
				Box::new(Counted { items: items.iter().copied().collect(), pulls: pulls.clone() })
					as BoxSource<i64>
			})
			.collect();
		let mut mux = Mux::by(sources, descending);

		for yielded in 1..=9 {
			mux.next().await.expect("Merge should succeed.");

			let pulled = counters.iter().map(|c| c.load(AtomicOrdering::SeqCst)).sum::<usize>();

			assert!(pulled <= yielded + counters.len(), "{pulled} pulls after {yielded} yields.");

			if yielded == 1 {
				assert_eq!(pulled, counters.len(), "Only the initial heads should be fetched.");
			}
		}
	}

	#[tokio::test]
	async fn ties_follow_source_order() {
		let tagged = |tag: i64, items: &[i64]| -> BoxSource<i64> {
			Box::new(IterSource::new(items.iter().map(|v| v * 10 + tag).collect::<Vec<_>>()))
		};
		let by_value = |a: &i64, b: &i64| (b / 10).cmp(&(a / 10));
		let sources = vec![tagged(1, &[5, 3]), tagged(2, &[5, 3]), tagged(3, &[5])];
		let mut mux = Mux::by(sources, by_value);
		let merged = collect(&mut mux).await.expect("Merge should succeed.");

		assert_eq!(merged, vec![51, 52, 53, 31, 32]);
	}

	#[tokio::test]
	async fn failing_source_is_reported_then_dropped() {
		let sources: Vec<BoxSource<i64>> = vec![boxed(&[3, 1]), Box::new(Failing), boxed(&[2])];
		let mut mux = Mux::by(sources, descending);
		let err = mux.next().await.expect_err("Initial failure should surface first.");

		assert!(matches!(err, Error::Http { status: 500, .. }));

		let rest = collect(&mut mux).await.expect("Remaining sources should merge.");

		assert_eq!(rest, vec![3, 2, 1]);
		assert_eq!(mux.live_sources(), 0);
	}

	#[tokio::test]
	async fn merges_compose() {
		let inner = Mux::by(vec![boxed(&[6, 2]), boxed(&[4])], descending);
		let sources: Vec<BoxSource<i64>> = vec![Box::new(inner), boxed(&[5, 1])];
		let mut outer = Mux::by(sources, descending);

		assert_eq!(collect(&mut outer).await.expect("Merge should succeed."), vec![6, 5, 4, 2, 1]);
	}
}

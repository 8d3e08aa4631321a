//! Pull-based record sources and the combinators that merge them.
//!
//! A [`RecordSource`] hands out one record per call and is only advanced when the caller asks
//! for the next record. [`PagedSource`] adapts a remote paginated listing, [`Mux`] merges any
//! number of sources into one ordered source, and [`SortOrder`] builds the comparator it merges
//! with.

pub mod mux;
pub mod order;
pub mod paged;

pub use mux::*;
pub use order::*;
pub use paged::*;

// self
use crate::_prelude::*;

/// Boxed future returned by [`RecordSource::next`].
pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Lazy, possibly remote, sequence of records.
pub trait RecordSource<T>
where
	Self: Send,
{
	/// Resolves to the next record, or `None` once the source is exhausted.
	///
	/// An exhausted source keeps resolving to `None`.
	fn next(&mut self) -> SourceFuture<'_, Option<T>>;
}
impl<T, S> RecordSource<T> for Box<S>
where
	S: ?Sized + RecordSource<T>,
{
	fn next(&mut self) -> SourceFuture<'_, Option<T>> {
		(**self).next()
	}
}

/// Boxed record source.
pub type BoxSource<T> = Box<dyn RecordSource<T>>;

/// In-memory source over already materialized records.
#[derive(Clone, Debug, Default)]
pub struct IterSource<T> {
	items: VecDeque<T>,
}
impl<T> IterSource<T> {
	/// Wraps the provided records, yielded in iteration order.
	pub fn new(items: impl IntoIterator<Item = T>) -> Self {
		Self { items: items.into_iter().collect() }
	}
}
impl<T> RecordSource<T> for IterSource<T>
where
	T: Send,
{
	fn next(&mut self) -> SourceFuture<'_, Option<T>> {
		let item = self.items.pop_front();

		Box::pin(async move { Ok(item) })
	}
}

/// Drains up to `limit` records from `source`.
pub async fn take<T, S>(source: &mut S, limit: usize) -> Result<Vec<T>>
where
	S: ?Sized + RecordSource<T>,
{
	let mut out = Vec::with_capacity(limit.min(64));

	while out.len() < limit {
		match source.next().await? {
			Some(item) => out.push(item),
			None => break,
		}
	}

	Ok(out)
}

/// Drains `source` until it is exhausted.
pub async fn collect<T, S>(source: &mut S) -> Result<Vec<T>>
where
	S: ?Sized + RecordSource<T>,
{
	take(source, usize::MAX).await
}

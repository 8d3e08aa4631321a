//! Adapter turning a remote paginated listing into a lazy [`RecordSource`].

// self
use crate::{
	_prelude::*,
	obs::{self, OperationKind, OperationSpan},
	stream::{RecordSource, SourceFuture},
};

/// Boxed future returned by [`PageFetcher::fetch_page`].
pub type PageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<Page<T>>> + 'a + Send>>;

/// One page of a remote listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page<T> {
	/// Records in remote order.
	pub items: Vec<T>,
	/// Whether another page may follow.
	pub has_more: bool,
}
impl<T> Page<T> {
	/// Page followed by more pages.
	pub fn more(items: Vec<T>) -> Self {
		Self { items, has_more: true }
	}

	/// Final page.
	pub fn last(items: Vec<T>) -> Self {
		Self { items, has_more: false }
	}
}

/// Fetches numbered pages (starting at 0) of a remote listing.
pub trait PageFetcher<T>
where
	Self: Send + Sync,
{
	/// Fetches page `page`.
	fn fetch_page(&self, page: u32) -> PageFuture<'_, T>;
}
impl<T, F, Fut> PageFetcher<T> for F
where
	F: Fn(u32) -> Fut + Send + Sync,
	Fut: 'static + Send + Future<Output = Result<Page<T>>>,
{
	fn fetch_page(&self, page: u32) -> PageFuture<'_, T> {
		Box::pin(self(page))
	}
}

/// Lazy source over a [`PageFetcher`].
///
/// Page `n + 1` is requested only once every record of page `n` was handed out and page `n`
/// announced more pages. A failed fetch is surfaced as is and the same page is requested again
/// on the next pull.
pub struct PagedSource<T> {
	fetcher: Arc<dyn PageFetcher<T>>,
	next_page: u32,
	buffer: VecDeque<T>,
	exhausted: bool,
}
impl<T> PagedSource<T> {
	/// Creates a source starting at page 0.
	pub fn new(fetcher: Arc<dyn PageFetcher<T>>) -> Self {
		Self { fetcher, next_page: 0, buffer: VecDeque::new(), exhausted: false }
	}

	/// Number of pages fetched so far.
	pub fn pages_fetched(&self) -> u32 {
		self.next_page
	}
}
impl<T> RecordSource<T> for PagedSource<T>
where
	T: Send,
{
	fn next(&mut self) -> SourceFuture<'_, Option<T>> {
		Box::pin(async move {
			loop {
				if let Some(item) = self.buffer.pop_front() {
					return Ok(Some(item));
				}
				if self.exhausted {
					return Ok(None);
				}

				let page = self.next_page;
				let span = OperationSpan::new(OperationKind::PageFetch, "fetch_page");
				let fetched = obs::record_result(
					OperationKind::PageFetch,
					span.instrument(self.fetcher.fetch_page(page)).await,
				)?;

				tracing::debug!(page, items = fetched.items.len(), has_more = fetched.has_more);

				self.next_page += 1;
				self.exhausted = !fetched.has_more;
				self.buffer.extend(fetched.items);
			}
		})
	}
}
impl<T> Debug for PagedSource<T> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PagedSource")
			.field("next_page", &self.next_page)
			.field("buffered", &self.buffer.len())
			.field("exhausted", &self.exhausted)
			.finish()
	}
}

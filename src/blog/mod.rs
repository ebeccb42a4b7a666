pub mod archive;
pub mod cache;
pub mod models;
pub mod source;

pub use archive::{ArchivePost, BlogArchive, PostAttributes};
pub use cache::{BlogCache, Clock, SystemClock, DEFAULT_STORAGE_KEY};
pub use models::{BlogSummary, CachedBlogSnapshot, RawBlogAuthor, RawBlogPost};
pub use source::{BlogSource, DevToSource};

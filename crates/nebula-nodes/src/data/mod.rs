//! Pure data-transform node handlers (§3 line 120).

pub mod aggregate;
pub mod crypto;
pub mod datetime;
pub mod filter;
pub mod html_extract;
pub mod json_transform;
pub mod limit;
pub mod remove_duplicates;
pub mod sort;
pub mod split_batches;
pub mod unique;
pub mod xml;

pub use aggregate::AggregateHandler;
pub use crypto::CryptoHandler;
pub use datetime::DatetimeHandler;
pub use filter::FilterHandler;
pub use html_extract::HtmlExtractHandler;
pub use json_transform::JsonTransformHandler;
pub use limit::LimitHandler;
pub use remove_duplicates::RemoveDuplicatesHandler;
pub use sort::SortHandler;
pub use split_batches::SplitBatchesHandler;
pub use unique::UniqueHandler;
pub use xml::XmlHandler;

//! Search backends and source assessment
//!
//! # Module Structure
//!
//! - [`search`](crate::tools::search) - The [`SearchBackend`] trait plus web
//!   (daedra/DuckDuckGo) and Wikipedia implementations
//! - [`quality`](crate::tools::quality) - URL authority classification and
//!   result-set observations for the rule store
//!
//! # Example
//!
//! ```ignore
//! use research_panel::tools::{SearchBackend, WikipediaSearch};
//!
//! let wiki = WikipediaSearch::default();
//! for hit in wiki.search("grid-scale batteries").await? {
//!     println!("{}: {}", hit.title, hit.url);
//! }
//! ```

/// Source authority scoring.
pub mod quality;
/// Web and encyclopedia search backends.
pub mod search;

pub use search::{SearchBackend, WebSearch, WikipediaSearch};

//! Reference discovery and orphan aggregation
//!
//! Matchers decide whether objects of one candidate kind reference a target.
//! The registry maps every candidate kind to its matcher, discovery unions
//! their results for one target, and aggregation turns per-target results
//! into a namespace-wide [`OrphanReport`].

pub mod aggregation;
pub mod discovery;
pub mod error;
pub mod matchers;
pub mod registry;
pub mod report;
pub mod target;

pub use aggregation::OrphanAggregator;
pub use discovery::ReferenceDiscovery;
pub use error::{AnalyzerError, Result};
pub use matchers::{ReferenceMatcher, Support};
pub use registry::MatcherRegistry;
pub use report::{Orphan, OrphanReport};
pub use target::Target;

//! Report templates
//!
//! Typed model of the declarative report tree used by every run and merge.
//!
//! # Core Concepts
//!
//! - [`Report`]: ordered sections of ordered items, validated from JSON once
//! - [`Item`]: display metadata, optional [`CommandSource`], and [`ItemData`]
//! - [`extract_steps`]: deterministic flattening into [`ExecutionStep`]s
//! - [`FieldPath`]: dotted address of a field, as named by join tasks
//!
//! # Example
//!
//! ```rust,ignore
//! use perfbench_report::Report;
//!
//! let report = Report::from_json_str(&template_text)?;
//! for step in report.steps() {
//!     println!("{} {} {}", step.index, step.key(), step.command.reference());
//! }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod data;
mod error;
mod item;
mod path;
mod report;
mod steps;

pub use data::{Attributed, ChartData, ChartSeries, ItemData};
pub use error::TemplateError;
pub use item::{CommandKind, CommandSource, Item, ItemKind, ItemState, DIFF_SUFFIX};
pub use path::{FieldPath, PathError};
pub use report::{Report, Section, RESULT_SECTION};
pub use steps::{extract_steps, ExecutionStep, StepKey};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! The structured record query & aggregation engine.
//!
//! Four stateless stages, each a pure function of a record slice and the
//! call's arguments:
//!
//! ```text
//!  query / filters ──▶ filter ───┐
//!  date window ─────▶ window ───┼──▶ aggregate ──▶ report ──▶ text
//!  (stats) ─────────────────────┘
//! ```
//!
//! Nothing here touches a store or a clock. Callers pass the records they
//! read from one snapshot and an explicit reference instant.

pub mod aggregate;
pub mod filter;
pub mod predicate;
pub mod report;
pub mod window;

pub use aggregate::{
    Group, GroupKey, GroupSpec, GroupTable, Metric, Rate, Reduction, ScalarSpec, Summary, UNSPECIFIED,
    Unit, Value, aggregate, reduce,
};
pub use filter::{Accepted, Query, search};
pub use predicate::{EvalContext, Predicate};
pub use report::{
    Cell, CellSource, Column, Criteria, FormatOptions, ListTemplate, Payload, Report, ReportKind,
    Section, SummaryTemplate, TotalLine, format, format_money, format_value,
};
pub use window::{
    DEFAULT_HORIZON_DAYS, DateWindow, Direction, WindowClass, WindowEvaluator, in_window, today,
};

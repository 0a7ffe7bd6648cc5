mod assign;
mod grouping;
mod order;
mod row;
mod signals;
mod tracker;

pub use assign::{AssignmentMap, Inference, JobTrace, infer, infer_with};
pub use order::{DEFAULT_FALLBACK, StatusOrder};
pub use row::{FieldMap, Row};
pub use signals::{SignalOverrides, SignalTables};
pub use tracker::{Decision, Source};

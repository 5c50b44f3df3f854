//! Task domain values and their on-disk stores.

pub mod model;
pub mod store;

pub use model::{
    coerce_dependencies, coerce_dependency, ComplexityReport, Priority, Subtask, Task,
    TaskStatus, TasksFile, TasksMetadata,
};
pub use store::{ComplexityReportFile, ReportStore, TaskStore};

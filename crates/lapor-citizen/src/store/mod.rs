//! Postgres stores for the citizen service.

mod read;
mod write;

pub use read::{
    CategoryStats, MyReportRow, PublicReportRow, ReadModelRow, ReadStore, ReportListPage,
    StatsSummary,
};
pub use write::{CitizenUser, ReportWriteStore};

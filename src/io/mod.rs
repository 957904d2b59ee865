//! On-disk archives and report export.

pub mod archive;
pub mod export;

pub use archive::{ArchiveError, load_region, read_curve};
pub use export::{FlowRow, export_csv, flow_rows, write_csv};

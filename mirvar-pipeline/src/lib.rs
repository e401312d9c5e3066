//! Sequential stage chain for one sample run:
//! library build → trim → collapse → align → post-process.
//!
//! Each stage declares its inputs and outputs and is skipped when its
//! outputs are fresh; external collaborators (cutadapt, bowtie2) are probed
//! before any stage runs and abort the run on abnormal exit.

pub mod collapse;
pub mod config;
pub mod run;
pub mod stage;
pub mod tools;

pub use collapse::{CollapseTable, collapse_reads};
pub use config::RunConfig;
pub use run::{RunSummary, run_pipeline};
pub use stage::Stage;
pub use tools::ToolPaths;

//! # dataset-audit CLI
//!
//! Command-line interface for the dataset audit.
//!
//! ## Usage
//! ```bash
//! dataset-audit audit ./corn_dataset
//! dataset-audit audit ./corn_dataset --threshold 3 --output json
//! ```

mod cli;

use dataset_evidence::Result;

fn main() -> Result<()> {
    cli::run()
}

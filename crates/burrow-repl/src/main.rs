//! burrow entry point.
//!
//! Launch the interactive browser:
//! ```bash
//! cargo run -p burrow-repl
//! ```

use anyhow::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    // Logs go to stderr so they never interleave with listings (respects RUST_LOG)
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    burrow_repl::run()
}

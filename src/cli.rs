use clap::{Parser, ValueEnum};

/// Portfolio site server: resume-subdomain routing and hardened response headers.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Log output format. Defaults to pretty in debug builds and JSON in release builds.
    #[arg(long, value_enum, default_value_t = TracingFormat::default())]
    pub tracing: TracingFormat,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracingFormat {
    /// Human-readable, compact single-line output
    Pretty,
    /// One JSON object per line
    Json,
}

impl Default for TracingFormat {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            TracingFormat::Pretty
        } else {
            TracingFormat::Json
        }
    }
}

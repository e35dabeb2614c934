//! Common CLI types shared across commands

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Table format - one row per month, one column per severity
    #[default]
    Table,
    /// JSON format - structured for scripts and renderers
    Json,
}

//! Report format implementations
//!
//! Provides exporters for CSV, JSON, Markdown and HTML.

pub mod csv;
pub mod html;
pub mod json;
pub mod markdown;

pub use csv::CsvReporter;
pub use html::HtmlReporter;
pub use json::JsonReporter;
pub use markdown::MarkdownReporter;

use super::ReportGenerator;
use std::fmt;
use std::str::FromStr;

/// Supported report formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportFormat {
    /// Day-by-slot timetable as CSV
    Csv,
    /// Full candidate and statistics as JSON
    Json,
    /// Markdown summary
    Markdown,
    /// Self-contained HTML page
    Html,
}

impl ReportFormat {
    /// All formats
    pub const ALL: [Self; 4] = [Self::Csv, Self::Json, Self::Markdown, Self::Html];

    /// Get the file extension for this format
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Markdown => "md",
            Self::Html => "html",
        }
    }

    /// Generator for this format
    #[must_use]
    pub fn reporter(self) -> Box<dyn ReportGenerator> {
        match self {
            Self::Csv => Box::new(CsvReporter::new()),
            Self::Json => Box::new(JsonReporter::new()),
            Self::Markdown => Box::new(MarkdownReporter::new()),
            Self::Html => Box::new(HtmlReporter::new()),
        }
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "md" | "markdown" => Ok(Self::Markdown),
            "html" | "htm" => Ok(Self::Html),
            _ => Err(format!("Unknown report format: {s}")),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv => write!(f, "csv"),
            Self::Json => write!(f, "json"),
            Self::Markdown => write!(f, "markdown"),
            Self::Html => write!(f, "html"),
        }
    }
}

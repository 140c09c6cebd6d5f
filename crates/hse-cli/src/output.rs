//! Output formatting

use clap::ValueEnum;
use colored::{ColoredString, Colorize};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self, String> {
        <Self as ValueEnum>::from_str(s, true)
    }

    /// Print `data`; the table view is built lazily from `rows`
    pub fn print<T, R, F>(&self, data: &T, rows: F) -> anyhow::Result<()>
    where
        T: Serialize + ?Sized,
        R: Tabled,
        F: FnOnce() -> Vec<R>,
    {
        match self {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(data)?),
            OutputFormat::Yaml => print!("{}", serde_yaml::to_string(data)?),
            OutputFormat::Table => {
                let rows = rows();
                if rows.is_empty() {
                    println!("{}", "(none)".dimmed());
                } else {
                    println!("{}", Table::new(rows).with(Style::rounded()));
                }
            }
        }
        Ok(())
    }

    /// One-line confirmation for table output, the full record otherwise
    pub fn confirm<T: Serialize + ?Sized>(&self, data: &T, message: &str) -> anyhow::Result<()> {
        match self {
            OutputFormat::Table => {
                println!("{} {}", "✓".green(), message);
                Ok(())
            }
            _ => self.print(data, Vec::<Detail>::new),
        }
    }
}

/// Key/value row for single-record table views
#[derive(Tabled)]
pub struct Detail {
    #[tabled(rename = "Field")]
    pub key: &'static str,
    #[tabled(rename = "Value")]
    pub value: String,
}

impl Detail {
    pub fn new(key: &'static str, value: impl ToString) -> Self {
        Self { key, value: value.to_string() }
    }
}

/// Status words coloured consistently across lifecycles
pub fn status(s: impl AsRef<str>) -> ColoredString {
    let s = s.as_ref();
    match s {
        "completed" | "active" => s.green(),
        "in-progress" | "in_progress" | "draft" => s.yellow(),
        "overdue" => s.red().bold(),
        "archived" => s.dimmed(),
        _ => s.cyan(),
    }
}

pub fn priority(s: impl AsRef<str>) -> ColoredString {
    let s = s.as_ref();
    match s {
        "critical" | "urgent" => s.red().bold(),
        "high" => s.red(),
        "medium" => s.yellow(),
        _ => s.normal(),
    }
}

pub fn or_dash(value: Option<impl ToString>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert!(matches!(OutputFormat::parse("YAML"), Ok(OutputFormat::Yaml)));
        assert!(OutputFormat::parse("xml").is_err());
    }

    #[test]
    fn test_or_dash() {
        assert_eq!(or_dash(None::<u32>), "-");
        assert_eq!(or_dash(Some(3)), "3");
    }
}

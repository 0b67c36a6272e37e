//! Table output formatting for CLI commands
//!
//! Renders the capability registry using comfy-table.

use crate::domain::models::{Capability, CapabilityProvider};
use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use std::env;

/// Table formatter for CLI output
pub struct TableFormatter {
    /// Whether to use colors in output
    use_colors: bool,
    /// Maximum width for tables (None = auto)
    max_width: Option<u16>,
}

impl TableFormatter {
    /// Create a new table formatter
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
            max_width: None,
        }
    }

    /// Create a new table formatter with custom settings
    pub fn with_config(use_colors: bool, max_width: Option<u16>) -> Self {
        Self {
            use_colors,
            max_width,
        }
    }

    /// Format capabilities as a table, marking the ones granted
    pub fn format_capabilities<'a>(
        &self,
        capabilities: impl IntoIterator<Item = &'a Capability>,
        is_granted: impl Fn(&Capability) -> bool,
    ) -> String {
        let mut table = self.create_base_table();

        table.set_header(vec![
            Cell::new("Provider").add_attribute(Attribute::Bold),
            Cell::new("Operation").add_attribute(Attribute::Bold),
            Cell::new("Identifier").add_attribute(Attribute::Bold),
            Cell::new("Granted").add_attribute(Attribute::Bold),
            Cell::new("Description").add_attribute(Attribute::Bold),
        ]);

        for capability in capabilities {
            let granted = is_granted(capability);

            let provider_cell = if self.use_colors {
                Cell::new(capability.provider.as_str()).fg(provider_color(capability.provider))
            } else {
                Cell::new(capability.provider.as_str())
            };

            let granted_cell = match (granted, self.use_colors) {
                (true, true) => Cell::new("yes").fg(Color::Green),
                (false, true) => Cell::new("no").fg(Color::DarkGrey),
                (true, false) => Cell::new("yes"),
                (false, false) => Cell::new("no"),
            };

            table.add_row(vec![
                provider_cell,
                Cell::new(capability.operation),
                Cell::new(capability.identifier()),
                granted_cell,
                Cell::new(capability.summary),
            ]);
        }

        table.to_string()
    }

    fn create_base_table(&self) -> Table {
        let mut table = Table::new();

        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        if let Some(width) = self.max_width {
            table.set_width(width);
        }

        table
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// Check if colors should be used
fn supports_color() -> bool {
    // Respect NO_COLOR environment variable
    if env::var("NO_COLOR").is_ok() {
        return false;
    }

    if let Ok(term) = env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    true
}

fn provider_color(provider: CapabilityProvider) -> Color {
    match provider {
        CapabilityProvider::Sqlite => Color::Cyan,
        CapabilityProvider::Filesystem => Color::Magenta,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::CapabilityRegistry;

    #[test]
    fn test_format_capabilities() {
        let formatter = TableFormatter::with_config(false, Some(200));
        let output = formatter.format_capabilities(CapabilityRegistry::all(), |c| {
            c.provider == CapabilityProvider::Sqlite
        });

        assert!(output.contains("Identifier"));
        assert!(output.contains("mcp__sqlite__write_query"));
        assert!(output.contains("mcp__filesystem__read_file"));
        assert!(output.contains("yes"));
        assert!(output.contains("no"));
    }
}

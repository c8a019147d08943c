use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{AddressTemplate, DeadlineError};

/// XPath of the "Resume Upload End" column on the placement portal.
pub const PORTAL_ADDRESS_TEMPLATE: &str = "/html/body/table/tbody/tr[3]/td/table/tbody/tr/td/table/tbody/tr/td/div[2]/div[3]/div[3]/div/table/tbody/tr[{number}]/td[12]";

/// Scanner settings. `Default` reproduces the portal's reference behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanConfig {
    /// Name of the child frame the table is rendered in.
    pub frame_name: String,
    /// Structural address of the deadline cell, with one `{number}` placeholder.
    pub address_template: String,
    pub first_row: u32,
    pub last_row: u32,
    pub tick_interval_ms: u64,
    /// The loop stops itself this long after `start`.
    pub auto_stop_ms: u64,
    pub palette: StatusPalette,
    /// Number of preceding sibling cells that belong to one row.
    pub row_width: usize,
    /// URL fragments on which the content script activates on its own.
    pub page_markers: Vec<String>,
    pub start_delay_ms: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            frame_name: "myframe".to_string(),
            address_template: PORTAL_ADDRESS_TEMPLATE.to_string(),
            first_row: 2,
            last_row: 600,
            tick_interval_ms: 1_000,
            auto_stop_ms: 300_000,
            palette: StatusPalette::default(),
            row_width: 10,
            page_markers: vec!["showmenu.htm".to_string(), "erp.iitkgp.ac.in".to_string()],
            start_delay_ms: 2_000,
        }
    }
}

impl ScanConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn auto_stop_after(&self) -> Duration {
        Duration::from_millis(self.auto_stop_ms)
    }

    pub fn start_delay(&self) -> Duration {
        Duration::from_millis(self.start_delay_ms)
    }

    /// Builds the validated address template for the configured row range.
    pub fn address_template(&self) -> Result<AddressTemplate, DeadlineError> {
        AddressTemplate::new(&self.address_template, self.first_row, self.last_row)
    }

    /// Whether the scanner should self-activate on `url`.
    pub fn matches_page(&self, url: &str) -> bool {
        self.page_markers
            .iter()
            .any(|marker| !marker.is_empty() && url.contains(marker.as_str()))
    }
}

/// Colours used when annotating rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusPalette {
    pub upcoming: String,
    pub warning: String,
    pub overdue: String,
    pub border: String,
}

impl Default for StatusPalette {
    fn default() -> Self {
        Self {
            upcoming: "#00FF00".to_string(),
            warning: "#FB8C00".to_string(),
            overdue: "#E53935".to_string(),
            border: "#BDBDBD".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activates_on_portal_pages_only() {
        let config = ScanConfig::default();
        assert!(config.matches_page("https://erp.iitkgp.ac.in/IIT_ERP3/showmenu.htm"));
        assert!(config.matches_page("https://erp.iitkgp.ac.in/TrainingPlacementSSO/TPStudent.jsp"));
        assert!(config.matches_page("http://localhost:8080/showmenu.htm?module=tnp"));
        assert!(!config.matches_page("https://example.org/index.html"));
        assert!(!config.matches_page(""));
    }

    #[test]
    fn empty_marker_matches_nothing() {
        let config = ScanConfig {
            page_markers: vec![String::new(), "showmenu.htm".to_string()],
            ..ScanConfig::default()
        };
        assert!(!config.matches_page("https://example.org/index.html"));
        assert!(config.matches_page("https://erp.iitkgp.ac.in/IIT_ERP3/showmenu.htm"));

        let no_markers = ScanConfig {
            page_markers: Vec::new(),
            ..ScanConfig::default()
        };
        assert!(!no_markers.matches_page("https://erp.iitkgp.ac.in/IIT_ERP3/showmenu.htm"));
    }

    #[test]
    fn durations_follow_the_millisecond_fields() {
        let config = ScanConfig::default();
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
        assert_eq!(config.auto_stop_after(), Duration::from_secs(300));
        assert_eq!(config.start_delay(), Duration::from_secs(2));
    }
}

//! Structural addresses of the deadline cells.

use crate::DeadlineError;

/// Token replaced by the row number in an address template.
pub const ROW_PLACEHOLDER: &str = "{number}";

/// A template with one row placeholder plus the inclusive row range it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressTemplate {
    template: String,
    start: u32,
    end: u32,
}

/// One fully substituted address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowAddress {
    pub row: u32,
    pub path: String,
}

impl AddressTemplate {
    pub fn new(template: &str, start: u32, end: u32) -> Result<Self, DeadlineError> {
        if template.matches(ROW_PLACEHOLDER).count() != 1 {
            return Err(DeadlineError::InvalidTemplate {
                template: template.to_string(),
                placeholder: ROW_PLACEHOLDER,
            });
        }
        if start > end {
            return Err(DeadlineError::InvalidRange { start, end });
        }
        Ok(Self {
            template: template.to_string(),
            start,
            end,
        })
    }

    /// Address of a single row, whether or not it lies inside the range.
    pub fn address_for(&self, row: u32) -> RowAddress {
        RowAddress {
            row,
            path: self
                .template
                .replacen(ROW_PLACEHOLDER, &row.to_string(), 1)
                .trim()
                .to_string(),
        }
    }

    /// All addresses in ascending row order.
    pub fn expand(&self) -> Vec<RowAddress> {
        (self.start..=self.end)
            .map(|row| self.address_for(row))
            .collect()
    }
}

/// Expands `template` over `[start, end]`.
pub fn expand_addresses(
    template: &str,
    start: u32,
    end: u32,
) -> Result<Vec<RowAddress>, DeadlineError> {
    Ok(AddressTemplate::new(template, start, end)?.expand())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_every_row_once_in_order() {
        let addresses = expand_addresses("/table/tr[{number}]/td[12]", 2, 6).unwrap();
        assert_eq!(addresses.len(), 5);
        for (offset, address) in addresses.iter().enumerate() {
            let row = 2 + offset as u32;
            assert_eq!(address.row, row);
            assert_eq!(address.path, format!("/table/tr[{row}]/td[12]"));
            assert!(!address.path.contains(ROW_PLACEHOLDER));
        }
    }

    #[test]
    fn single_row_range_is_valid() {
        let template = AddressTemplate::new("//tr[{number}]", 7, 7).unwrap();
        assert_eq!(template.expand().len(), 1);
        assert_eq!(template.expand()[0].path, "//tr[7]");
    }

    #[test]
    fn rejects_bad_templates_and_ranges() {
        assert!(matches!(
            AddressTemplate::new("//tr/td", 1, 2),
            Err(DeadlineError::InvalidTemplate { .. })
        ));
        assert!(matches!(
            AddressTemplate::new("//tr[{number}]/td[{number}]", 1, 2),
            Err(DeadlineError::InvalidTemplate { .. })
        ));
        assert_eq!(
            AddressTemplate::new("//tr[{number}]", 5, 4),
            Err(DeadlineError::InvalidRange { start: 5, end: 4 })
        );
    }

    #[test]
    fn expansion_is_deterministic() {
        let template = AddressTemplate::new("  //tr[{number}]/td ", 1, 3).unwrap();
        assert_eq!(template.expand(), template.expand());
        assert_eq!(template.expand()[0].path, "//tr[1]/td");
    }
}

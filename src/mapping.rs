//! Static SKU-to-barcode lookup table.
//!
//! The table maps Shopify SKUs to distributor barcodes and is maintained
//! outside this job. It is loaded once before the run and consulted, never
//! built, by the sync: the distributor reports a barcode, and the reverse
//! lookup finds the Shopify SKU to update.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

/// Errors that can occur while loading the mapping table.
#[derive(Debug, Error)]
pub enum MappingError {
    /// The mapping file could not be read.
    #[error("Failed to read mapping file '{path}': {source}")]
    Unreadable {
        /// Path that was attempted.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The mapping file could not be parsed.
    #[error("Failed to parse mapping file '{path}': {source}")]
    Invalid {
        /// Path that was attempted.
        path: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// The static Shopify-SKU to distributor-barcode table, indexed for
/// reverse lookup.
///
/// # Example
///
/// ```rust
/// use stock_sync::mapping::SkuMapping;
///
/// let mapping = SkuMapping::from_pairs([
///     ("SKU-1".to_string(), "5000000000001".to_string()),
/// ]);
///
/// assert_eq!(mapping.sku_for_barcode("5000000000001"), Some("SKU-1"));
/// assert_eq!(mapping.sku_for_barcode("unknown"), None);
/// ```
#[derive(Clone, Debug, Default)]
pub struct SkuMapping {
    sku_by_barcode: HashMap<String, String>,
}

impl SkuMapping {
    /// Loads the table from a JSON object of `{"sku": "barcode"}` entries.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError`] if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MappingError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| MappingError::Unreadable {
            path: path.display().to_string(),
            source,
        })?;

        let table: HashMap<String, String> =
            serde_json::from_str(&contents).map_err(|source| MappingError::Invalid {
                path: path.display().to_string(),
                source,
            })?;

        Ok(Self::from_pairs(table))
    }

    /// Builds the table from `(sku, barcode)` pairs.
    ///
    /// A barcode listed under more than one SKU keeps the last entry seen;
    /// the collision is logged because it usually means the table needs
    /// maintenance.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut sku_by_barcode = HashMap::new();
        for (sku, barcode) in pairs {
            if let Some(previous) = sku_by_barcode.insert(barcode.clone(), sku) {
                tracing::warn!(barcode, previous_sku = previous, "duplicate barcode in mapping table");
            }
        }
        Self { sku_by_barcode }
    }

    /// Looks up the Shopify SKU for a distributor barcode.
    #[must_use]
    pub fn sku_for_barcode(&self, barcode: &str) -> Option<&str> {
        self.sku_by_barcode.get(barcode).map(String::as_str)
    }

    /// Returns the number of mapped products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sku_by_barcode.len()
    }

    /// Returns `true` if the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sku_by_barcode.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_reverse_lookup() {
        let mapping = SkuMapping::from_pairs([
            ("SKU-1".to_string(), "5000000000001".to_string()),
            ("SKU-2".to_string(), "5000000000002".to_string()),
        ]);

        assert_eq!(mapping.sku_for_barcode("5000000000001"), Some("SKU-1"));
        assert_eq!(mapping.sku_for_barcode("5000000000002"), Some("SKU-2"));
        assert_eq!(mapping.sku_for_barcode("5000000000003"), None);
        assert_eq!(mapping.len(), 2);
    }

    #[test]
    fn test_from_file_round_trip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"SKU-1": "5000000000001"}}"#).unwrap();

        let mapping = SkuMapping::from_file(file.path()).unwrap();
        assert_eq!(mapping.sku_for_barcode("5000000000001"), Some("SKU-1"));
    }

    #[test]
    fn test_from_file_missing_is_an_error() {
        assert!(matches!(
            SkuMapping::from_file("/nonexistent/mapping.json"),
            Err(MappingError::Unreadable { .. })
        ));
    }

    #[test]
    fn test_from_file_rejects_malformed_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        assert!(matches!(
            SkuMapping::from_file(file.path()),
            Err(MappingError::Invalid { .. })
        ));
    }
}

//! Bulk product import from CSV
//!
//! The file must carry every product column as a header. Empty numeric cells
//! read as zero. Each row is validated like an API payload, and the first
//! invalid row aborts the import with its line number. Rows are inserted in
//! one transaction only after all of them validated.

use serde_json::{Map, Value};
use std::io::Read;
use std::path::Path;

use super::model::ProductInput;
use super::repository::ProductRepository;
use super::validation::check_input;
use crate::error::{Error, Result};

/// Columns the header row must contain
pub const REQUIRED_HEADERS: [&str; 10] = [
    "name",
    "description",
    "cost_price",
    "selling_price",
    "category",
    "stock_available",
    "units_sold",
    "customer_rating",
    "demand_forecast",
    "optimized_price",
];

const NUMERIC_COLUMNS: [&str; 7] = [
    "cost_price",
    "selling_price",
    "stock_available",
    "units_sold",
    "customer_rating",
    "demand_forecast",
    "optimized_price",
];

/// Outcome of a successful import
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    /// Rows inserted
    pub imported: u64,
}

/// Parse and validate every row of a CSV document
pub fn read_products<R: Read>(source: R) -> Result<Vec<ProductInput>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(source);

    let headers = reader.headers()?.clone();
    let missing: Vec<&str> = REQUIRED_HEADERS
        .iter()
        .copied()
        .filter(|required| !headers.iter().any(|h| h == *required))
        .collect();
    if !missing.is_empty() {
        return Err(Error::Csv(format!(
            "Missing required columns: {}",
            missing.join(", ")
        )));
    }

    let mut products = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line());

        let mut row = Map::new();
        for (header, cell) in headers.iter().zip(record.iter()) {
            if !REQUIRED_HEADERS.contains(&header) {
                continue;
            }
            let value = if cell.is_empty() && NUMERIC_COLUMNS.contains(&header) {
                "0"
            } else {
                cell
            };
            row.insert(header.to_string(), Value::String(value.to_string()));
        }

        let input = check_input(&row).map_err(|errors| Error::InvalidRow { line, errors })?;
        products.push(input);
    }

    Ok(products)
}

/// Import a CSV file into the repository
pub async fn import_file(
    path: impl AsRef<Path>,
    products: &dyn ProductRepository,
) -> Result<ImportSummary> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "Importing products");

    let rows = read_products(bytes.as_slice())?;
    let imported = products.insert_many(rows).await?;

    tracing::info!(path = %path.display(), imported, "Products imported");
    Ok(ImportSummary { imported })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::products::filter::ProductFilter;
    use crate::products::repository::MemoryProductRepository;
    use std::io::Write;

    const HEADER: &str = "name,description,cost_price,selling_price,category,stock_available,\
                          units_sold,customer_rating,demand_forecast,optimized_price";

    #[test]
    fn test_reads_rows_with_numeric_defaults() {
        let csv = format!(
            "{HEADER}\nGreen Tea,Loose leaf,2.50,4.00,Beverages,10,3,4,12,\n\
             Coffee,,3,5.5,Beverages,,,,,4.75\n"
        );
        let rows = read_products(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].optimized_price.to_string(), "0.00");
        assert_eq!(rows[1].description, "");
        assert_eq!(rows[1].stock_available, 0);
        assert_eq!(rows[1].selling_price.to_string(), "5.50");
    }

    #[test]
    fn test_missing_header() {
        let err = read_products("name,category\nTea,Drinks\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Csv(ref m) if m.contains("cost_price")));
    }

    #[test]
    fn test_first_invalid_row_reports_line() {
        let csv = format!(
            "{HEADER}\nGreen Tea,,2.50,4.00,Beverages,10,3,4,12,0\n\
             Bad,,2.50,4.00,Beverages,10,3,9,12,0\n\
             Worse,,-1,4.00,Beverages,10,3,4,12,0\n"
        );
        match read_products(csv.as_bytes()) {
            Err(Error::InvalidRow { line, errors }) => {
                assert_eq!(line, 3);
                assert!(errors.contains("customer_rating"));
            }
            other => panic!("expected invalid row, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_import_file_is_all_or_nothing() {
        let repo = MemoryProductRepository::new();

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        write!(bad, "{HEADER}\nTea,,1,2,Drinks,1,1,1,1,0\n,,1,2,Drinks,1,1,1,1,0\n").unwrap();
        assert!(import_file(bad.path(), &repo).await.is_err());
        assert_eq!(repo.count(&ProductFilter::default()).await.unwrap(), 0);

        let mut good = tempfile::NamedTempFile::new().unwrap();
        write!(good, "{HEADER}\nTea,,1,2,Drinks,1,1,1,1,0\nCake,,1,2,Food,1,1,1,1,0\n").unwrap();
        let summary = import_file(good.path(), &repo).await.unwrap();
        assert_eq!(summary.imported, 2);
        assert_eq!(repo.count(&ProductFilter::default()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let repo = MemoryProductRepository::new();
        let err = import_file("/nonexistent/products.csv", &repo).await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}

//! Spreadsheet ingestion: reads product rows from the configured workbook.
//!
//! The header row must match the configured template exactly, in count and
//! position; a mismatch is fatal before any network work starts. Data rows
//! map positionally: name, image URL, quantity, price, brand, code, length,
//! width, height, weight.

use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use tracing::{info, warn};

use crate::config::SpreadsheetConfig;
use crate::error::Error;
use crate::models::ProductRow;

pub fn load_rows(config: &SpreadsheetConfig) -> Result<Vec<ProductRow>, Error> {
    let path = Path::new(&config.dir).join(&config.file);
    let mut workbook = open_workbook_auto(&path).map_err(|e| {
        Error::Validation(format!("Failed to open spreadsheet {}: {e}", path.display()))
    })?;

    let range = workbook
        .worksheet_range(&config.sheet)
        .map_err(|e| Error::Validation(format!("Sheet '{}' not found: {e}", config.sheet)))?;

    let mut rows = range.rows();
    let header_row = rows
        .next()
        .ok_or_else(|| Error::Validation("spreadsheet is empty".to_string()))?;
    let headers: Vec<String> = header_row.iter().map(cell_to_string).collect();
    validate_headers(&headers, &config.expected_headers)?;

    let mut products = Vec::new();
    for (index, row) in rows.enumerate() {
        if row.iter().all(|cell| matches!(cell, Data::Empty)) {
            continue;
        }
        match row_to_product(row) {
            Some(product) => products.push(product),
            // +2: one for the header row, one for 1-based sheet numbering
            None => warn!("Row {} is missing required fields, skipping", index + 2),
        }
    }

    info!(
        "Loaded {} product rows from {}",
        products.len(),
        path.display()
    );
    Ok(products)
}

/// Checks the header row against the configured expectation, in count and
/// position.
fn validate_headers(found: &[String], expected: &[String]) -> Result<(), Error> {
    if expected.is_empty() {
        warn!("No expected headers configured, skipping validation");
        return Ok(());
    }

    let found: Vec<&String> = found.iter().filter(|h| !h.is_empty()).collect();
    if found.len() != expected.len() {
        return Err(Error::Validation(format!(
            "expected {} spreadsheet headers, found {}",
            expected.len(),
            found.len()
        )));
    }

    for (position, (found, expected)) in found.iter().zip(expected).enumerate() {
        if found.as_str() != expected.as_str() {
            return Err(Error::Validation(format!(
                "header {} should be '{expected}', found '{found}'",
                position + 1
            )));
        }
    }

    Ok(())
}

fn row_to_product(row: &[Data]) -> Option<ProductRow> {
    let cell = |i: usize| row.get(i).map(cell_to_string).unwrap_or_default();
    let optional = |value: String| if value.is_empty() { None } else { Some(value) };

    let name = cell(0);
    let image_url = cell(1);
    if name.is_empty() || image_url.is_empty() {
        return None;
    }

    Some(ProductRow {
        name,
        image_url,
        quantity: cell(2),
        price: normalize_decimal(&cell(3)),
        brand: optional(cell(4)),
        code: optional(cell(5)),
        length: normalize_decimal(&cell(6)),
        width: normalize_decimal(&cell(7)),
        height: normalize_decimal(&cell(8)),
        weight: normalize_decimal(&cell(9)),
    })
}

/// Rewrites decimal separators for the portal's locale: `10.5` becomes
/// `10,5`, and `;` stands in for a literal dot.
fn normalize_decimal(value: &str) -> String {
    value.replace('.', ",").replace(';', ".")
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        // Integral floats are how calamine reports whole-number cells such
        // as barcodes; keep them free of a trailing ".0".
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

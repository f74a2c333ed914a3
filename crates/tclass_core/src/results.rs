use std::collections::HashMap;

use crate::contract::{QueryResultRow, ValidationError};

/// One page of the paginated query result: rows of optional string cells.
/// A cell with no value (possible in sparse result sets) is skipped when
/// zipping against the header, matching the source service's shape.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResultPage {
    pub rows: Vec<Vec<Option<String>>>,
}

/// Assembles [`QueryResultRow`]s from result pages, one pass.
///
/// The first row of the first page names the fields; every later row is
/// zipped against those names. Non-restartable: feed pages in source order.
#[derive(Debug, Default)]
pub struct RowAssembler {
    header: Option<Vec<String>>,
}

impl RowAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Converts one page into rows, consuming the header row if this is the
    /// first page. Fails on a row that does not carry every schema field.
    pub fn rows_from_page(&mut self, page: &ResultPage) -> Result<Vec<QueryResultRow>, ValidationError> {
        let mut rows = Vec::new();
        for raw_row in &page.rows {
            let values: Vec<String> = raw_row.iter().flatten().cloned().collect();
            match &self.header {
                None => {
                    if values.is_empty() {
                        return Err(ValidationError::new(
                            "Result set header row carries no field names",
                        ));
                    }
                    self.header = Some(values);
                }
                Some(header) => rows.push(row_from_values(header, values)?),
            }
        }
        Ok(rows)
    }
}

fn row_from_values(header: &[String], values: Vec<String>) -> Result<QueryResultRow, ValidationError> {
    let mut fields: HashMap<&str, String> = header
        .iter()
        .map(String::as_str)
        .zip(values)
        .collect();

    let mut take = |name: &str| {
        fields
            .remove(name)
            .ok_or_else(|| ValidationError::new(format!("Result row is missing field '{name}'")))
    };

    let region = take("region")?;
    let account_id = take("account_id")?;
    let table_name = take("table_name")?;
    let recommendation = take("recommendation")?;
    let savings_text = take("potential_savings_per_month")?;
    let potential_savings_per_month = savings_text.trim().parse::<i64>().map_err(|_| {
        ValidationError::new(format!(
            "Field 'potential_savings_per_month' is not an integer: '{savings_text}'"
        ))
    })?;

    Ok(QueryResultRow {
        region,
        account_id,
        table_name,
        recommendation,
        potential_savings_per_month,
        update_result: None,
        updated: false,
    })
}

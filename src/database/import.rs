use csv::ReaderBuilder;

use crate::error::CoreError;

/*
Catalog import syntax

name                    unit
Flour,g
"Jam, apricot",g
"10"" pan liner",pcs
Eggs,pcs
*/

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: String,
    pub measurement_unit: String,
}

/// Parses catalog rows as CSV without a header. Quoted fields follow RFC 4180
/// (`""` is a literal quote). The unit is the last field of a row, so unquoted
/// names may still contain commas of their own.
pub fn parse_catalog(text: &str) -> Result<Vec<CatalogEntry>, CoreError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut entries = vec![];
    for record in reader.records() {
        let record = record.map_err(|e| {
            let line = e.position().map(|p| p.line()).unwrap_or_default();
            CoreError::validation("catalog", format!("line {line}: {e}"))
        })?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        let fields: Vec<&str> = record.iter().collect();
        if fields.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        let Some((unit, name)) = fields.split_last().filter(|(_, name)| !name.is_empty()) else {
            return Err(CoreError::validation(
                "catalog",
                format!("line {line}: expected `name,unit`"),
            ));
        };

        let name = name.join(",");
        let name = name.trim();
        let measurement_unit = unit.trim();
        if name.is_empty() || measurement_unit.is_empty() {
            return Err(CoreError::validation(
                "catalog",
                format!("line {line}: name and unit must not be empty"),
            ));
        }

        entries.push(CatalogEntry {
            name: name.to_string(),
            measurement_unit: measurement_unit.to_string(),
        });
    }

    Ok(entries)
}

//! Reader for the normalized raw table
//!
//! Expected columns (any order): `Date, GeoID, GeoName, Population, Continent,
//! DailyCases, DailyDeaths`. `Continent` is optional. Rows may appear in any
//! order, the repository sorts each region chronologically.

use crate::error::{Result, SeriesError};
use crate::models::RawRow;
use crate::sources::SourceAdapter;
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"];

struct Layout {
    date: usize,
    geo_id: usize,
    geo_name: usize,
    population: usize,
    continent: Option<usize>,
    daily_cases: usize,
    daily_deaths: usize,
}

impl Layout {
    fn from_header(header: &StringRecord) -> Result<Self> {
        let find = |name: &str| header.iter().position(|h| h == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| SeriesError::Parse {
                line: 1,
                message: format!("Missing column {}", name),
            })
        };

        Ok(Self {
            date: require("Date")?,
            geo_id: require("GeoID")?,
            geo_name: require("GeoName")?,
            population: require("Population")?,
            continent: find("Continent"),
            daily_cases: require("DailyCases")?,
            daily_deaths: require("DailyDeaths")?,
        })
    }
}

/// Load the raw table from a file
pub fn load_raw_table(path: impl AsRef<Path>, adapter: &dyn SourceAdapter) -> Result<Vec<RawRow>> {
    let path = path.as_ref();
    let start = std::time::Instant::now();
    let file = File::open(path)?;
    let rows = parse_raw_table(file, adapter)?;

    tracing::info!(
        path = ?path,
        source = adapter.info().short_name,
        rows = rows.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Loaded raw table"
    );

    Ok(rows)
}

/// Parse the raw table, dropping ids the adapter does not accept
pub fn parse_raw_table<R: Read>(reader: R, adapter: &dyn SourceAdapter) -> Result<Vec<RawRow>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let header = reader.headers()?.clone();
    if header.is_empty() {
        return Ok(Vec::new());
    }
    let layout = Layout::from_header(&header)?;

    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for result in reader.records() {
        let record = result?;
        let line_no = record.position().map(|p| p.line() as usize).unwrap_or_default();

        let field = |i: usize| {
            record.get(i).ok_or_else(|| SeriesError::Parse {
                line: line_no,
                message: format!("Expected at least {} fields, got {}", i + 1, record.len()),
            })
        };

        let raw_id = field(layout.geo_id)?;
        if !adapter.accepts(raw_id) {
            skipped += 1;
            continue;
        }

        let geo_id = adapter.canonical_id(raw_id);
        let continent = match layout.continent {
            Some(i) => Some(field(i)?).filter(|c| !c.is_empty()).map(str::to_string),
            None => None,
        };

        rows.push(RawRow {
            date: parse_date(field(layout.date)?, line_no)?,
            geo_name: field(layout.geo_name)?.to_string(),
            population: parse_count(field(layout.population)?, line_no, "Population", &geo_id)?,
            continent,
            daily_cases: parse_count(field(layout.daily_cases)?, line_no, "DailyCases", &geo_id)?,
            daily_deaths: parse_count(field(layout.daily_deaths)?, line_no, "DailyDeaths", &geo_id)?,
            geo_id,
        });
    }

    if skipped > 0 {
        tracing::debug!(skipped, "Dropped rows with ids that are not regions");
    }

    Ok(rows)
}

fn parse_date(value: &str, line: usize) -> Result<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .ok_or_else(|| SeriesError::Parse {
            line,
            message: format!("Invalid date: {}", value),
        })
}

/// Integer count; blanks are zero and published negative corrections are clamped to zero
fn parse_count(value: &str, line: usize, column: &str, region: &str) -> Result<u64> {
    if value.is_empty() {
        return Ok(0);
    }

    let parsed = match value.parse::<i64>() {
        Ok(v) => v,
        Err(_) => match value.parse::<f64>() {
            Ok(v) if v.is_finite() && v.fract() == 0.0 => v as i64,
            _ => {
                return Err(SeriesError::Parse {
                    line,
                    message: format!("Invalid {}: {}", column, value),
                })
            }
        },
    };

    if parsed < 0 {
        tracing::warn!(line, region, column, value = parsed, "Negative count clamped to zero");
        return Ok(0);
    }

    Ok(parsed as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{OwidSource, WhoSource};
    use std::io::Cursor;

    const TABLE: &str = "\
Date,GeoID,GeoName,Population,Continent,DailyCases,DailyDeaths
2020-03-02,DE,Germany,83000000,Europe,12,0
2020-03-01,DE,Germany,83000000,Europe,5,0
01/03/2020,KR,\"Korea, Republic of\",51000000,Asia,600.0,3
2020-03-01,XC,Saba,2000,,1,0
2020-03-03,XA,Bonaire,20000,America,-4,
";

    #[test]
    fn test_parse_table() {
        let rows = parse_raw_table(Cursor::new(TABLE), &WhoSource).unwrap();
        assert_eq!(rows.len(), 4);

        assert_eq!(rows[0].geo_id, "DE");
        assert_eq!(rows[0].daily_cases, 12);
        assert_eq!(rows[0].continent.as_deref(), Some("Europe"));

        assert_eq!(rows[2].geo_name, "Korea, Republic of");
        assert_eq!(rows[2].date, NaiveDate::from_ymd_opt(2020, 3, 1).unwrap());
        assert_eq!(rows[2].daily_cases, 600);

        // Bonaire renamed, negative correction clamped, blank deaths are zero
        assert_eq!(rows[3].geo_id, "BQ");
        assert_eq!(rows[3].daily_cases, 0);
        assert_eq!(rows[3].daily_deaths, 0);
    }

    #[test]
    fn test_columns_in_any_order() {
        let table = "DailyDeaths,DailyCases,GeoName,GeoID,Date,Population\n1,2,France,FR,2020-04-01,67000000\n";
        let rows = parse_raw_table(Cursor::new(table), &OwidSource).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].daily_cases, 2);
        assert_eq!(rows[0].daily_deaths, 1);
        assert_eq!(rows[0].continent, None);
    }

    #[test]
    fn test_missing_column() {
        let table = "Date,GeoID,GeoName,DailyCases,DailyDeaths\n";
        let result = parse_raw_table(Cursor::new(table), &WhoSource);
        assert!(matches!(result, Err(SeriesError::Parse { line: 1, .. })));
    }

    #[test]
    fn test_invalid_date_reports_line() {
        let table = "Date,GeoID,GeoName,Population,DailyCases,DailyDeaths\n2020-13-45,DE,Germany,1,1,1\n";
        let result = parse_raw_table(Cursor::new(table), &WhoSource);
        assert!(matches!(result, Err(SeriesError::Parse { line: 2, .. })));
    }

    #[test]
    fn test_quoted_name_with_line_break() {
        let table = "Date,GeoID,GeoName,Population,DailyCases,DailyDeaths\n2020-04-01,CI,\"Cote\nd'Ivoire\",26000000,4,0\n2020-04-02,CI,\"Cote\nd'Ivoire\",26000000,x,0\n";
        let result = parse_raw_table(Cursor::new(table), &WhoSource);
        assert!(matches!(result, Err(SeriesError::Parse { .. })));

        let rows = parse_raw_table(Cursor::new(&table[..table.rfind("2020-04-02").unwrap()]), &WhoSource).unwrap();
        assert_eq!(rows[0].geo_name, "Cote\nd'Ivoire");
    }

    #[test]
    fn test_empty_input() {
        let rows = parse_raw_table(Cursor::new(""), &WhoSource).unwrap();
        assert!(rows.is_empty());
    }
}

//! Tabular encoding of a derived dataset, one row per region-day
//!
//! Floats are written with the shortest representation that parses back to
//! the same value, `NaN` spelled `NaN`. An empty cell means the column is not
//! present for that region.

use crate::error::{Result, SeriesError};
use crate::models::{Column, DailyRecord, Dataset, DerivedSeries, RegionInfo, RegionSeries};
use chrono::NaiveDate;
use csv::{ReaderBuilder, Writer};
use std::collections::{BTreeSet, HashMap};
use std::io::{Read, Write};

const FIXED_COLUMNS: [&str; 7] = [
    "Date",
    "GeoID",
    "GeoName",
    "Continent",
    "Population",
    "DailyCases",
    "DailyDeaths",
];

/// Write `dataset` as a table
pub fn write_dataset<W: Write>(dataset: &Dataset, writer: W) -> Result<()> {
    let columns: BTreeSet<Column> = dataset.iter().flat_map(|s| s.derived_columns()).collect();
    let mut writer = Writer::from_writer(writer);

    let header = FIXED_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(columns.iter().map(|c| c.to_string()));
    writer.write_record(header)?;

    for series in dataset {
        let values: Vec<Option<_>> = columns.iter().map(|c| series.values(*c)).collect();
        let info = series.info();

        for (i, record) in series.records().iter().enumerate() {
            let mut fields = vec![
                record.date.format("%Y-%m-%d").to_string(),
                info.id.clone(),
                info.name.clone(),
                info.continent.clone().unwrap_or_default(),
                record.population.to_string(),
                record.daily_new_cases.to_string(),
                record.daily_new_deaths.to_string(),
            ];
            fields.extend(values.iter().map(|column| match column {
                Some(v) => v[i].to_string(),
                None => String::new(),
            }));
            writer.write_record(&fields)?;
        }
    }

    writer.flush()?;
    Ok(())
}

struct PendingRegion {
    info: RegionInfo,
    rows: Vec<(DailyRecord, Vec<Option<f64>>)>,
}

/// Read a table written by [`write_dataset`]
pub fn read_dataset<R: Read>(reader: R) -> Result<Dataset> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(reader);

    let header = reader.headers()?.clone();
    if header.is_empty() {
        return Ok(Dataset::new());
    }

    if header.len() < FIXED_COLUMNS.len() || !header.iter().zip(FIXED_COLUMNS).all(|(a, b)| a == b) {
        return Err(SeriesError::Cache(format!(
            "Unexpected cache header: {}",
            header.iter().collect::<Vec<_>>().join(",")
        )));
    }

    let columns = header
        .iter()
        .skip(FIXED_COLUMNS.len())
        .map(|name| {
            name.parse::<Column>()
                .map_err(|message| SeriesError::Parse { line: 1, message })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut order: Vec<String> = Vec::new();
    let mut regions: HashMap<String, PendingRegion> = HashMap::new();

    for result in reader.records() {
        let fields = result?;
        let line_no = fields.position().map(|p| p.line() as usize).unwrap_or_default();

        let parse_err = |message: String| SeriesError::Parse { line: line_no, message };
        let date = NaiveDate::parse_from_str(&fields[0], "%Y-%m-%d")
            .map_err(|e| parse_err(format!("Invalid date {}: {}", &fields[0], e)))?;
        let count = |i: usize| {
            fields[i]
                .parse::<u64>()
                .map_err(|e| parse_err(format!("Invalid {} {}: {}", FIXED_COLUMNS[i], &fields[i], e)))
        };
        let record = DailyRecord::new(date, count(5)?, count(6)?, count(4)?);

        let values = fields
            .iter()
            .skip(FIXED_COLUMNS.len())
            .map(|cell| {
                if cell.is_empty() {
                    Ok(None)
                } else {
                    cell.parse::<f64>()
                        .map(Some)
                        .map_err(|e| parse_err(format!("Invalid value {}: {}", cell, e)))
                }
            })
            .collect::<Result<Vec<_>>>()?;

        let id = fields[1].to_string();
        let region = regions.entry(id.clone()).or_insert_with(|| {
            order.push(id.clone());
            PendingRegion {
                info: RegionInfo::new(
                    id.clone(),
                    &fields[2],
                    Some(fields[3].to_string()).filter(|c| !c.is_empty()),
                ),
                rows: Vec::new(),
            }
        });
        region.rows.push((record, values));
    }

    order
        .into_iter()
        .filter_map(|id| regions.remove(&id))
        .map(|pending| assemble(pending, &columns))
        .collect::<Result<Vec<_>>>()
        .map(Dataset::from)
}

fn assemble(mut pending: PendingRegion, columns: &[Column]) -> Result<DerivedSeries> {
    pending.rows.sort_by_key(|(record, _)| record.date);

    let records = pending.rows.iter().map(|(record, _)| *record).collect();
    let mut series = DerivedSeries::from(RegionSeries::new(pending.info, records)?);

    for (c, column) in columns.iter().enumerate() {
        let cells: Vec<Option<f64>> = pending.rows.iter().map(|(_, values)| values[c]).collect();

        if cells.iter().all(Option::is_none) {
            continue;
        }

        let values = cells.into_iter().collect::<Option<Vec<f64>>>().ok_or_else(|| {
            SeriesError::Cache(format!(
                "Column {} is incomplete for region {}",
                column,
                series.id()
            ))
        })?;
        series.insert(*column, values)?;
    }

    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Metric;
    use std::io::Cursor;

    fn sample() -> Dataset {
        let date = |d| NaiveDate::from_ymd_opt(2021, 2, d).unwrap();
        let mut de = DerivedSeries::from(
            RegionSeries::new(
                RegionInfo::new("DE", "Germany", Some("Europe".to_string())),
                vec![DailyRecord::new(date(1), 10, 1, 83_000_000), DailyRecord::new(date(2), 0, 0, 83_000_000)],
            )
            .unwrap(),
        );
        de.insert(Column::DOUBLING_TIME, vec![f64::NAN, 0.1 + 0.2]).unwrap();
        de.insert(Column::rolling(Metric::DailyCases, 7), vec![10.0, 5.0]).unwrap();

        let kr = DerivedSeries::from(
            RegionSeries::new(
                RegionInfo::new("KR", "Korea, Republic of", None),
                vec![DailyRecord::new(date(1), 3, 0, 51_000_000)],
            )
            .unwrap(),
        );

        Dataset::from(vec![de, kr])
    }

    #[test]
    fn test_round_trip_is_bit_identical() {
        let dataset = sample();
        let mut buffer = Vec::new();
        write_dataset(&dataset, &mut buffer).unwrap();

        let restored = read_dataset(Cursor::new(buffer)).unwrap();
        assert!(restored.bit_identical(&dataset));
        assert_eq!(restored.region_ids(), vec!["DE", "KR"]);
        assert!(!restored.get("KR").unwrap().has(Column::DOUBLING_TIME));
    }

    #[test]
    fn test_names_with_separators_survive() {
        let date = NaiveDate::from_ymd_opt(2021, 2, 1).unwrap();
        let mut series = DerivedSeries::from(
            RegionSeries::new(
                RegionInfo::new("XX", "Line one\nline two, \"quoted\"", None),
                vec![DailyRecord::new(date, 1, 0, 1_000)],
            )
            .unwrap(),
        );
        series.insert(Column::PERCENT_DEATHS, vec![0.0]).unwrap();
        let dataset = Dataset::from(vec![series]);

        let mut buffer = Vec::new();
        write_dataset(&dataset, &mut buffer).unwrap();

        let restored = read_dataset(Cursor::new(buffer)).unwrap();
        assert!(restored.bit_identical(&dataset));
        assert_eq!(restored.get("XX").unwrap().info().name, "Line one\nline two, \"quoted\"");
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let table = "\
Date,GeoID,GeoName,Continent,Population,DailyCases,DailyDeaths,R
2021-02-01,DE,Germany,Europe,100,1,0
";
        let result = read_dataset(Cursor::new(table));
        assert!(matches!(result, Err(SeriesError::Parse { .. })));
    }

    #[test]
    fn test_header_checked() {
        let result = read_dataset(Cursor::new("Date,GeoID\n"));
        assert!(matches!(result, Err(SeriesError::Cache(_))));
    }

    #[test]
    fn test_incomplete_column_rejected() {
        let table = "\
Date,GeoID,GeoName,Continent,Population,DailyCases,DailyDeaths,R
2021-02-01,DE,Germany,Europe,100,1,0,0.5
2021-02-02,DE,Germany,Europe,100,1,0,
";
        let result = read_dataset(Cursor::new(table));
        assert!(matches!(result, Err(SeriesError::Cache(_))));
    }

    #[test]
    fn test_rows_reordered_by_date() {
        let table = "\
Date,GeoID,GeoName,Continent,Population,DailyCases,DailyDeaths,CumulativeCases
2021-02-02,DE,Germany,Europe,100,2,0,3
2021-02-01,DE,Germany,Europe,100,1,0,1
";
        let dataset = read_dataset(Cursor::new(table)).unwrap();
        let de = dataset.get("DE").unwrap();
        assert_eq!(de.records()[0].daily_new_cases, 1);
        assert_eq!(de.values(Column::CUMULATIVE_CASES).unwrap().as_ref(), &[1.0, 3.0]);
    }
}

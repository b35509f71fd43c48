//! File output for projection tables and summaries

use crate::error::ModelResult;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Write serializable rows as CSV with a header line
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> ModelResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write a value as pretty-printed JSON
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> ModelResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::params::ProjectInputs;
    use crate::projection::{CurrencyBasis, ProjectionEngine, QuarterRecord};

    #[test]
    fn test_quarterly_csv_reads_back() {
        let params = ProjectInputs::default().to_parameters().unwrap();
        let result = ProjectionEngine::new(params).run();
        let rows = result.quarters_in(CurrencyBasis::LocalMillions);

        let path = std::env::temp_dir().join("btm_solar_finance_quarterly_test.csv");
        write_csv(&path, &rows).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let loaded: Vec<QuarterRecord> = reader.deserialize().collect::<Result<_, _>>().unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.len(), rows.len());
        assert_eq!(loaded[0].quarter, 1);
        assert_eq!(loaded[0].period_end, rows[0].period_end);
    }

    #[test]
    fn test_missing_directory_is_csv_error() {
        let path = std::env::temp_dir()
            .join("btm_solar_finance_no_such_dir")
            .join("out.csv");
        let rows: Vec<(u32, f64)> = vec![(1, 2.0)];
        assert!(matches!(write_csv(&path, &rows), Err(ModelError::Csv(_))));
    }

    #[test]
    fn test_json_summary_written() {
        let path = std::env::temp_dir().join("btm_solar_finance_summary_test.json");
        let inputs = ProjectInputs {
            specific_yield: 1.25,
            ..Default::default()
        };
        write_json(&path, &inputs).unwrap();
        let loaded = ProjectInputs::load_json(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, inputs);
    }
}

//! Cell-level comparison logic

use chrono::NaiveDateTime;

use crate::error::{CompareError, Result};
use crate::model::{CellValue, ColumnComparisonDetail, ColumnType};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Decides whether two cells of a matched row pair are equal
#[derive(Debug, Clone, Copy)]
pub struct CellComparator {
    case_sensitive: bool,
}

impl CellComparator {
    /// `case_sensitive` applies to columns without a detail
    pub fn new(case_sensitive: bool) -> Self {
        Self { case_sensitive }
    }

    /// Compare two cell values for equality
    pub fn equal(
        &self,
        column: &str,
        a: &CellValue,
        b: &CellValue,
        detail: Option<&ColumnComparisonDetail>,
    ) -> Result<bool> {
        if a.is_blank() && b.is_blank() {
            return Ok(true);
        }

        let Some(detail) = detail else {
            return Ok(text_equal(a, b, self.case_sensitive));
        };

        match detail.column_type {
            ColumnType::Int => {
                let x = integer(column, a)?;
                let y = integer(column, b)?;
                let tolerance = detail.tolerance.max(0.0).trunc() as u64;
                Ok(x.abs_diff(y) <= tolerance)
            }
            ColumnType::Float | ColumnType::Double => {
                let x = real(column, a)?;
                let y = real(column, b)?;
                Ok((x - y).abs() <= detail.tolerance)
            }
            ColumnType::String => Ok(text_equal(a, b, detail.case_sensitive)),
            ColumnType::Date => Ok(within(a, b, |x, y| {
                seconds_between(x, y) / SECONDS_PER_DAY <= detail.tolerance
            })),
            ColumnType::DateTime => Ok(within(a, b, |x, y| {
                seconds_between(x, y) <= detail.tolerance
            })),
            ColumnType::Raw => Ok(a.display() == b.display()),
        }
    }
}

impl Default for CellComparator {
    fn default() -> Self {
        Self::new(true)
    }
}

fn text_equal(a: &CellValue, b: &CellValue, case_sensitive: bool) -> bool {
    let (a, b) = (a.display(), b.display());
    if case_sensitive {
        a == b
    } else {
        a.to_lowercase() == b.to_lowercase()
    }
}

/// Apply `test` when both values read as timestamps, else compare the raw text
fn within<F>(a: &CellValue, b: &CellValue, test: F) -> bool
where
    F: FnOnce(NaiveDateTime, NaiveDateTime) -> bool,
{
    match (a.as_timestamp(), b.as_timestamp()) {
        (Some(x), Some(y)) => test(x, y),
        _ => a.display() == b.display(),
    }
}

fn seconds_between(x: NaiveDateTime, y: NaiveDateTime) -> f64 {
    let delta = x - y;
    let seconds = delta.num_milliseconds() as f64 / 1000.0;
    seconds.abs()
}

fn integer(column: &str, value: &CellValue) -> Result<i64> {
    value.as_integer().ok_or_else(|| conversion(column, value, "int"))
}

fn real(column: &str, value: &CellValue) -> Result<f64> {
    value.as_real().ok_or_else(|| conversion(column, value, "float"))
}

fn conversion(column: &str, value: &CellValue, target: &'static str) -> CompareError {
    CompareError::Conversion {
        column: column.to_string(),
        value: value.display().into_owned(),
        target,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn detail(column_type: ColumnType, tolerance: f64) -> ColumnComparisonDetail {
        ColumnComparisonDetail::new("c", column_type).with_tolerance(tolerance)
    }

    fn eq(a: CellValue, b: CellValue, d: Option<&ColumnComparisonDetail>) -> bool {
        CellComparator::default().equal("c", &a, &b, d).unwrap()
    }

    #[test]
    fn test_blank_values_always_equal() {
        let d = detail(ColumnType::Int, 0.0);
        assert!(eq(CellValue::Null, CellValue::from("  "), Some(&d)));
        assert!(eq(CellValue::Null, CellValue::from(""), None));
    }

    #[test]
    fn test_int_tolerance() {
        let d = detail(ColumnType::Int, 2.0);
        assert!(eq(CellValue::Int(10), CellValue::Int(12), Some(&d)));
        assert!(!eq(CellValue::Int(10), CellValue::Int(13), Some(&d)));
        assert!(eq(CellValue::from("10"), CellValue::Int(11), Some(&d)));
    }

    #[test]
    fn test_int_null_is_zero() {
        let d = detail(ColumnType::Int, 1.0);
        assert!(eq(CellValue::Null, CellValue::Int(1), Some(&d)));
        assert!(!eq(CellValue::Null, CellValue::Int(2), Some(&d)));
    }

    #[test]
    fn test_int_conversion_error() {
        let d = detail(ColumnType::Int, 0.0);
        let err = CellComparator::default()
            .equal("Qty", &CellValue::from("ten"), &CellValue::Int(10), Some(&d))
            .unwrap_err();
        assert!(matches!(
            err,
            CompareError::Conversion { ref column, ref value, target: "int" }
                if column == "Qty" && value == "ten"
        ));
    }

    #[test]
    fn test_float_tolerance() {
        let d = detail(ColumnType::Double, 0.01);
        assert!(eq(CellValue::Float(1.0), CellValue::Float(1.005), Some(&d)));
        assert!(!eq(CellValue::Float(1.0), CellValue::Float(1.02), Some(&d)));
    }

    #[test]
    fn test_string_case_flag() {
        let sensitive = detail(ColumnType::String, 0.0);
        let insensitive = sensitive.clone().with_case_sensitive(false);
        assert!(!eq("Bob".into(), "BOB".into(), Some(&sensitive)));
        assert!(eq("Bob".into(), "BOB".into(), Some(&insensitive)));
    }

    #[test]
    fn test_date_tolerance_in_days() {
        let d = detail(ColumnType::Date, 1.0);
        assert!(eq("2024-01-01".into(), "2024-01-02".into(), Some(&d)));
        assert!(eq("2024-01-02".into(), "2024-01-01".into(), Some(&d)));
        assert!(!eq("2024-01-01".into(), "2024-01-03".into(), Some(&d)));

        let typed = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert!(eq("2024-01-01".into(), CellValue::Date(typed), Some(&d)));
    }

    #[test]
    fn test_date_falls_back_to_text() {
        let d = detail(ColumnType::Date, 10.0);
        assert!(eq("n/a".into(), "n/a".into(), Some(&d)));
        assert!(!eq("n/a".into(), "2024-01-01".into(), Some(&d)));
    }

    #[test]
    fn test_datetime_tolerance_in_seconds() {
        let d = detail(ColumnType::DateTime, 30.0);
        assert!(eq(
            "2024-01-01 10:00:00".into(),
            "2024-01-01 10:00:30".into(),
            Some(&d)
        ));
        assert!(!eq(
            "2024-01-01 10:00:31".into(),
            "2024-01-01 10:00:00".into(),
            Some(&d)
        ));
    }

    #[test]
    fn test_raw_and_global_case() {
        let raw = detail(ColumnType::Raw, 0.0);
        assert!(!eq("a".into(), "A".into(), Some(&raw)));

        let insensitive = CellComparator::new(false);
        assert!(insensitive.equal("c", &"Hello".into(), &"hELLO".into(), None).unwrap());
        assert!(!CellComparator::new(true)
            .equal("c", &"Hello".into(), &"hELLO".into(), None)
            .unwrap());
    }
}

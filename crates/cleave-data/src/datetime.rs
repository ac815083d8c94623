use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Int64Type, TimeUnit, TimestampNanosecondType};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::{DataError, DataResult};

/// The timestamp given to missing values with no fill value. It sorts before every time.
pub const NOT_A_TIME: i64 = i64::MIN;

/// Number of components in a datetime that date preprocessing has already decomposed:
/// year, month, day, weekday, day of year, hour, minute, second, second of day.
const DATETIME_COMPONENTS: usize = 9;

const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d.%m.%Y %H:%M:%S",
];

const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y", "%Y%m%d", "%d %B %Y",
];

/// Converts a column of datetime-like values to nanoseconds since the Unix epoch.
///
/// Strings are parsed with `datetime_format` when given, or a list of common formats
/// otherwise. Date and timestamp columns are converted directly, and integer columns are
/// taken as epoch nanoseconds. Lists of decomposed datetime components are reassembled
/// first. Missing values are replaced by `fill_value`, or by [`NOT_A_TIME`] when the fill
/// value is empty.
pub fn to_timestamps(
    array: &ArrayRef,
    datetime_format: Option<&str>,
    fill_value: &str,
) -> DataResult<Vec<i64>> {
    let fill = if fill_value.trim().is_empty() {
        NOT_A_TIME
    } else {
        parse_datetime(fill_value, datetime_format)?
    };
    match array.data_type() {
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => {
            let strings = cast(array, &DataType::Utf8)?;
            strings
                .as_string::<i32>()
                .iter()
                .map(|value| match value.map(str::trim) {
                    Some(value) if !value.is_empty() => parse_datetime(value, datetime_format),
                    _ => Ok(fill),
                })
                .collect()
        }
        DataType::Date32 | DataType::Date64 | DataType::Timestamp(_, _) => {
            let timestamps = cast(array, &DataType::Timestamp(TimeUnit::Nanosecond, None))?;
            Ok(timestamps
                .as_primitive::<TimestampNanosecondType>()
                .iter()
                .map(|value| value.unwrap_or(fill))
                .collect())
        }
        data_type if data_type.is_integer() => {
            let integers = cast(array, &DataType::Int64)?;
            Ok(integers
                .as_primitive::<Int64Type>()
                .iter()
                .map(|value| value.unwrap_or(fill))
                .collect())
        }
        DataType::List(_) | DataType::LargeList(_) | DataType::FixedSizeList(_, _) => {
            components_to_strings(array)?
                .into_iter()
                .map(|value| match value {
                    Some(value) => parse_datetime(&value, None),
                    None => Ok(fill),
                })
                .collect()
        }
        other => Err(DataError::unsupported(format!(
            "cannot interpret values of type {other} as datetimes"
        ))),
    }
}

/// Parses one datetime string to nanoseconds since the Unix epoch.
///
/// Values without a time zone are taken as UTC.
pub fn parse_datetime(value: &str, datetime_format: Option<&str>) -> DataResult<i64> {
    let parsed = match datetime_format {
        Some(format) => NaiveDateTime::parse_from_str(value, format)
            .ok()
            .or_else(|| {
                DateTime::parse_from_str(value, format)
                    .ok()
                    .map(|dt| dt.naive_utc())
            })
            .or_else(|| {
                NaiveDate::parse_from_str(value, format)
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            }),
        None => DateTime::parse_from_rfc3339(value)
            .ok()
            .map(|dt| dt.naive_utc())
            .or_else(|| {
                DATETIME_FORMATS
                    .iter()
                    .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
            })
            .or_else(|| {
                DATE_FORMATS
                    .iter()
                    .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            }),
    };
    let parsed = parsed.ok_or_else(|| {
        DataError::invalid(match datetime_format {
            Some(format) => format!("cannot parse datetime {value:?} with format {format:?}"),
            None => format!("cannot parse datetime {value:?}"),
        })
    })?;
    parsed
        .and_utc()
        .timestamp_nanos_opt()
        .ok_or_else(|| DataError::invalid(format!("datetime {value:?} is out of range")))
}

/// Rebuilds `YYYY-MM-DD HH:MM:SS` strings from lists of decomposed datetime components.
fn components_to_strings(array: &ArrayRef) -> DataResult<Vec<Option<String>>> {
    let lists: Vec<Option<ArrayRef>> = match array.data_type() {
        DataType::List(_) => array.as_list::<i32>().iter().collect(),
        DataType::LargeList(_) => array.as_list::<i64>().iter().collect(),
        DataType::FixedSizeList(_, _) => array.as_fixed_size_list().iter().collect(),
        other => {
            return Err(DataError::internal(format!(
                "expected a list of datetime components, got {other}"
            )))
        }
    };
    lists
        .into_iter()
        .map(|list| {
            let Some(list) = list else {
                return Ok(None);
            };
            let components = cast(&list, &DataType::Int64)?;
            let components = components.as_primitive::<Int64Type>();
            if components.len() != DATETIME_COMPONENTS || components.null_count() > 0 {
                return Err(DataError::invalid(format!(
                    "expected {DATETIME_COMPONENTS} non-null datetime components, got {} with {} nulls",
                    components.len(),
                    components.null_count()
                )));
            }
            let c = components.values();
            Ok(Some(format!(
                "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                c[0], c[1], c[2], c[5], c[6], c[7]
            )))
        })
        .collect()
}

use chrono::NaiveDate;

const DB_DATE_FORMAT: &str = "%Y-%m-%d";

/// Calendar dates are stored as ISO-8601 text columns.
pub fn date_to_db(date: NaiveDate) -> String {
    date.format(DB_DATE_FORMAT).to_string()
}

pub fn date_from_db(column: usize, value: &str) -> Result<NaiveDate, rusqlite::Error> {
    NaiveDate::parse_from_str(value, DB_DATE_FORMAT).map_err(|_| {
        rusqlite::Error::InvalidColumnType(
            column,
            "date".to_string(),
            rusqlite::types::Type::Text,
        )
    })
}

/// Weekday sets are stored as JSON arrays of integers (Sunday = 0).
pub fn weekdays_from_db(column: usize, value: &str) -> Result<Vec<u8>, rusqlite::Error> {
    serde_json::from_str(value).map_err(|_| {
        rusqlite::Error::InvalidColumnType(
            column,
            "weekdays".to_string(),
            rusqlite::types::Type::Text,
        )
    })
}

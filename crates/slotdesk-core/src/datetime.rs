use chrono::{
  DateTime,
  Datelike,
  NaiveDate,
  NaiveDateTime
};

const TIMESTAMP_DISPLAY_FORMAT: &str =
  "%d.%m.%Y, %H:%M:%S";

/// Decodes the backend's `DD.MM` task
/// date into a full calendar date in
/// `year`. The stored form carries no
/// year, so any other year is lost.
pub fn decode_day_month(
  raw: &str,
  year: i32
) -> Option<NaiveDate> {
  let trimmed = raw.trim();
  if trimmed.len() < 5 {
    return None;
  }

  let mut parts = trimmed.split('.');
  let day = parts.next()?.trim();
  let month = parts.next()?.trim();
  if day.is_empty() || month.is_empty()
  {
    return None;
  }

  let day = day.parse::<u32>().ok()?;
  let month =
    month.parse::<u32>().ok()?;
  NaiveDate::from_ymd_opt(
    year, month, day
  )
}

/// Encodes a calendar date into the
/// backend's `DD.MM` form.
pub fn encode_day_month(
  date: NaiveDate
) -> String {
  format!(
    "{:02}.{:02}",
    date.day(),
    date.month()
  )
}

/// Parses the operator's date entry:
/// either `YYYY-MM-DD` or the stored
/// `DD.MM` form (current year).
pub fn parse_date_entry(
  raw: &str,
  today: NaiveDate
) -> Option<NaiveDate> {
  let trimmed = raw.trim();
  if let Ok(date) =
    NaiveDate::parse_from_str(
      trimmed, "%Y-%m-%d"
    )
  {
    return Some(date);
  }
  decode_day_month(trimmed, today.year())
}

/// Renders a backend log timestamp
/// (ISO-8601, with or without offset)
/// for display; unparseable input is
/// shown as received.
pub fn format_log_timestamp(
  raw: &str
) -> String {
  if let Ok(parsed) =
    DateTime::parse_from_rfc3339(raw)
  {
    return parsed
      .naive_local()
      .format(TIMESTAMP_DISPLAY_FORMAT)
      .to_string();
  }

  for pattern in [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S"
  ] {
    if let Ok(parsed) =
      NaiveDateTime::parse_from_str(
        raw, pattern
      )
    {
      return parsed
        .format(
          TIMESTAMP_DISPLAY_FORMAT
        )
        .to_string();
    }
  }

  raw.to_string()
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::{
    decode_day_month,
    encode_day_month,
    format_log_timestamp,
    parse_date_entry
  };

  fn date(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  #[test]
  fn decodes_day_month_into_given_year()
  {
    assert_eq!(
      decode_day_month("5.3", 2026),
      None
    );
    assert_eq!(
      decode_day_month("05.03", 2026),
      Some(date(2026, 3, 5))
    );
    assert_eq!(
      decode_day_month("31.02", 2026),
      None
    );
    assert_eq!(
      decode_day_month("ab.cd", 2026),
      None
    );
  }

  #[test]
  fn round_trip_drops_the_year() {
    let stored =
      encode_day_month(date(2024, 12, 1));
    assert_eq!(stored, "01.12");
    assert_eq!(
      decode_day_month(&stored, 2026),
      Some(date(2026, 12, 1))
    );
  }

  #[test]
  fn date_entry_accepts_both_forms() {
    let today = date(2026, 10, 19);
    assert_eq!(
      parse_date_entry("2026-11-02", today),
      Some(date(2026, 11, 2))
    );
    assert_eq!(
      parse_date_entry("02.11", today),
      Some(date(2026, 11, 2))
    );
    assert_eq!(
      parse_date_entry("tomorrow", today),
      None
    );
  }

  #[test]
  fn formats_backend_timestamps() {
    assert_eq!(
      format_log_timestamp(
        "2026-10-19T08:05:09.123456"
      ),
      "19.10.2026, 08:05:09"
    );
    assert_eq!(
      format_log_timestamp(
        "2026-10-19T08:05:09+03:00"
      ),
      "19.10.2026, 08:05:09"
    );
    assert_eq!(
      format_log_timestamp("later"),
      "later"
    );
  }
}

use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use anyhow::{
  Context,
  anyhow
};
use chrono::{
  DateTime,
  Datelike,
  Days,
  Locale,
  Month,
  NaiveDate,
  NaiveTime,
  Utc,
  Weekday
};
use chrono_tz::Tz;
use regex::Regex;
use serde::Deserialize;

const TIMEZONE_CONFIG_FILE: &str =
  "chores-time.toml";
const TIMEZONE_ENV_VAR: &str =
  "CHORES_TIMEZONE";
const TIMEZONE_CONFIG_ENV_VAR: &str =
  "CHORES_TIME_CONFIG";
const DEFAULT_PROJECT_TIMEZONE: &str =
  "UTC";

pub const ISO_DATE_FORMAT: &str =
  "%Y-%m-%d";

#[derive(Debug, Deserialize)]
struct TimezoneConfig {
  timezone: Option<String>,
  time:     Option<TimezoneSection>
}

#[derive(Debug, Deserialize)]
struct TimezoneSection {
  timezone: Option<String>
}

pub fn project_timezone() -> &'static Tz
{
  static PROJECT_TZ: OnceLock<Tz> =
    OnceLock::new();
  PROJECT_TZ.get_or_init(
    resolve_project_timezone
  )
}

/// Calendar day of `now` in the project
/// timezone.
#[must_use]
pub fn today(
  now: DateTime<Utc>
) -> NaiveDate {
  now
    .with_timezone(project_timezone())
    .date_naive()
}

/// Plans always target the year the
/// invocation happens in.
#[must_use]
pub fn current_year(
  now: DateTime<Utc>
) -> i32 {
  today(now).year()
}

#[must_use]
pub fn current_month(
  now: DateTime<Utc>
) -> Month {
  month_from_number(today(now).month())
    .unwrap_or(Month::January)
}

/// Every date of `month` in `year`, in
/// ascending order. Years chrono cannot
/// represent yield no days.
#[must_use]
pub fn days_in_month(
  year: i32,
  month: Month
) -> Vec<NaiveDate> {
  let Some(first) =
    NaiveDate::from_ymd_opt(
      year,
      month.number_from_month(),
      1
    )
  else {
    tracing::warn!(
      year,
      month = month.name(),
      "month start is out of range"
    );
    return Vec::new();
  };

  first
    .iter_days()
    .take_while(|day| {
      day.month() == first.month()
    })
    .collect()
}

/// Inclusive interval membership. An
/// inverted interval contains nothing.
#[must_use]
pub fn within_interval(
  date: NaiveDate,
  start: NaiveDate,
  end: NaiveDate
) -> bool {
  start <= date && date <= end
}

/// Formats `date` with `pattern` using
/// the month and weekday names of
/// `locale`. Patterns chrono cannot render
/// fall back to ISO.
#[must_use]
pub fn format_day(
  date: NaiveDate,
  pattern: &str,
  locale: Locale
) -> String {
  let midnight = date
    .and_time(NaiveTime::MIN)
    .and_utc();
  let mut out = String::new();
  if write!(
    out,
    "{}",
    midnight
      .format_localized(pattern, locale)
  )
  .is_err()
  {
    tracing::warn!(
      pattern,
      "unusable date format; using ISO"
    );
    return format_iso(date);
  }
  out
}

#[must_use]
pub fn format_iso(
  date: NaiveDate
) -> String {
  date.format(ISO_DATE_FORMAT).to_string()
}

pub fn parse_locale(
  raw: &str
) -> Option<Locale> {
  match raw.trim() {
    | "fr" | "fr_FR" => {
      Some(Locale::fr_FR)
    }
    | "en" | "en_US" => {
      Some(Locale::en_US)
    }
    | "en_GB" => Some(Locale::en_GB),
    | "de" | "de_DE" => {
      Some(Locale::de_DE)
    }
    | "es" | "es_ES" => {
      Some(Locale::es_ES)
    }
    | "it" | "it_IT" => {
      Some(Locale::it_IT)
    }
    | "nl" | "nl_NL" => {
      Some(Locale::nl_NL)
    }
    | "pt" | "pt_PT" => {
      Some(Locale::pt_PT)
    }
    | "C" | "POSIX" => {
      Some(Locale::POSIX)
    }
    | _ => None
  }
}

pub fn parse_month(
  token: &str
) -> Option<Month> {
  let lower = token
    .trim()
    .to_ascii_lowercase();

  if let Ok(number) =
    lower.parse::<u32>()
  {
    return month_from_number(number);
  }

  match lower.as_str() {
    | "january" | "jan" => {
      Some(Month::January)
    }
    | "february" | "feb" => {
      Some(Month::February)
    }
    | "march" | "mar" => {
      Some(Month::March)
    }
    | "april" | "apr" => {
      Some(Month::April)
    }
    | "may" => Some(Month::May),
    | "june" | "jun" => {
      Some(Month::June)
    }
    | "july" | "jul" => {
      Some(Month::July)
    }
    | "august" | "aug" => {
      Some(Month::August)
    }
    | "september" | "sep" | "sept" => {
      Some(Month::September)
    }
    | "october" | "oct" => {
      Some(Month::October)
    }
    | "november" | "nov" => {
      Some(Month::November)
    }
    | "december" | "dec" => {
      Some(Month::December)
    }
    | _ => None
  }
}

fn month_from_number(
  number: u32
) -> Option<Month> {
  u8::try_from(number)
    .ok()
    .and_then(|n| {
      Month::try_from(n).ok()
    })
}

#[tracing::instrument(skip(now), fields(input = input))]
pub fn parse_date_expr(
  input: &str,
  now: DateTime<Utc>
) -> anyhow::Result<NaiveDate> {
  let token = input.trim();
  let lower =
    token.to_ascii_lowercase();
  let base = today(now);

  match lower.as_str() {
    | "today" => return Ok(base),
    | "tomorrow" => {
      return base
        .checked_add_days(Days::new(1))
        .ok_or_else(|| {
          anyhow!(
            "failed to advance to \
             tomorrow"
          )
        });
    }
    | "yesterday" => {
      return base
        .checked_sub_days(Days::new(1))
        .ok_or_else(|| {
          anyhow!(
            "failed to step back to \
             yesterday"
          )
        });
    }
    | _ => {}
  }

  if let Some(target_weekday) =
    parse_weekday_name(&lower)
  {
    return Ok(next_weekday_date(
      base,
      target_weekday
    ));
  }

  let rel_re = Regex::new(r"^(?P<sign>[+-])(?P<num>\d+)(?P<unit>[dw])$")
        .map_err(|e| anyhow!("internal regex compile failure: {e}"))?;

  if let Some(caps) =
    rel_re.captures(&lower)
  {
    let sign = caps
      .name("sign")
      .map(|m| m.as_str())
      .ok_or_else(|| {
        anyhow!("missing relative sign")
      })?;
    let num: u64 = caps
      .name("num")
      .map(|m| m.as_str())
      .ok_or_else(|| {
        anyhow!(
          "missing relative amount"
        )
      })?
      .parse()
      .context(
        "invalid relative number"
      )?;
    let unit = caps
      .name("unit")
      .map(|m| m.as_str())
      .ok_or_else(|| {
        anyhow!("missing relative unit")
      })?;

    let days = match unit {
      | "d" => num,
      | "w" => num.saturating_mul(7),
      | _ => {
        return Err(anyhow!(
          "unknown relative unit: \
           {unit}"
        ))
      }
    };

    let shifted = if sign == "-" {
      base.checked_sub_days(Days::new(
        days
      ))
    } else {
      base.checked_add_days(Days::new(
        days
      ))
    };
    return shifted.ok_or_else(|| {
      anyhow!(
        "relative date out of range: \
         {input}"
      )
    });
  }

  for fmt in [ISO_DATE_FORMAT, "%Y%m%d"]
  {
    if let Ok(date) =
      NaiveDate::parse_from_str(
        token, fmt
      )
    {
      return Ok(date);
    }
  }

  Err(anyhow!(
    "unrecognized date expression: \
     {input}"
  ))
  .with_context(|| {
    "supported formats: \
     today/tomorrow/yesterday, \
     weekday names (e.g. monday), \
     +Nd/-Nd/+Nw/-Nw, YYYY-MM-DD, \
     YYYYMMDD"
  })
}

fn parse_weekday_name(
  token: &str
) -> Option<Weekday> {
  match token.trim() {
    | "monday" | "mon" => {
      Some(Weekday::Mon)
    }
    | "tuesday" | "tue" | "tues" => {
      Some(Weekday::Tue)
    }
    | "wednesday" | "wed" => {
      Some(Weekday::Wed)
    }
    | "thursday" | "thu" | "thur"
    | "thurs" => Some(Weekday::Thu),
    | "friday" | "fri" => {
      Some(Weekday::Fri)
    }
    | "saturday" | "sat" => {
      Some(Weekday::Sat)
    }
    | "sunday" | "sun" => {
      Some(Weekday::Sun)
    }
    | _ => None
  }
}

fn next_weekday_date(
  from: NaiveDate,
  target: Weekday
) -> NaiveDate {
  let from_idx = u64::from(
    from.weekday().num_days_from_monday()
  );
  let target_idx = u64::from(
    target.num_days_from_monday()
  );
  let mut delta =
    (7 + target_idx - from_idx) % 7;
  if delta == 0 {
    delta = 7;
  }
  from
    .checked_add_days(Days::new(delta))
    .unwrap_or(from)
}

fn resolve_project_timezone() -> Tz {
  if let Ok(raw) =
    std::env::var(TIMEZONE_ENV_VAR)
  {
    if let Some(tz) = parse_timezone(
      &raw,
      TIMEZONE_ENV_VAR
    ) {
      return tz;
    }
  }

  if let Some(path) =
    timezone_config_path()
    && let Some(tz) =
      load_timezone_from_file(&path)
  {
    return tz;
  }

  parse_timezone(
    DEFAULT_PROJECT_TIMEZONE,
    "DEFAULT_PROJECT_TIMEZONE"
  )
  .unwrap_or(chrono_tz::UTC)
}

fn timezone_config_path()
-> Option<PathBuf> {
  if let Ok(raw) = std::env::var(
    TIMEZONE_CONFIG_ENV_VAR
  ) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
      return Some(PathBuf::from(
        trimmed
      ));
    }
  }

  std::env::current_dir().ok().map(
    |dir| {
      dir.join(TIMEZONE_CONFIG_FILE)
    }
  )
}

fn load_timezone_from_file(
  path: &PathBuf
) -> Option<Tz> {
  if !path.exists() {
    tracing::debug!(
      file = %path.display(),
      "timezone config file not found"
    );
    return None;
  }

  let raw = match fs::read_to_string(
    path
  ) {
    | Ok(raw) => raw,
    | Err(err) => {
      tracing::error!(
        file = %path.display(),
        error = %err,
        "failed reading timezone config file"
      );
      return None;
    }
  };

  let parsed = match toml::from_str::<
    TimezoneConfig
  >(&raw)
  {
    | Ok(parsed) => parsed,
    | Err(err) => {
      tracing::error!(
        file = %path.display(),
        error = %err,
        "failed parsing timezone config file"
      );
      return None;
    }
  };

  let timezone =
    parsed.timezone.or_else(|| {
      parsed.time.and_then(|section| {
        section.timezone
      })
    });
  let Some(timezone) = timezone else {
    tracing::warn!(
      file = %path.display(),
      "timezone config had no timezone field"
    );
    return None;
  };

  parse_timezone(
    timezone.as_str(),
    &format!("file:{}", path.display())
  )
}

fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    tracing::warn!(
      source,
      "timezone source was empty"
    );
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => {
      tracing::info!(
        source,
        timezone = %trimmed,
        "configured project timezone"
      );
      Some(tz)
    }
    | Err(err) => {
      tracing::error!(
        source,
        timezone = %trimmed,
        error = %err,
        "failed to parse timezone id"
      );
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::{
    Locale,
    Month,
    NaiveDate,
    TimeZone,
    Utc
  };

  use super::{
    days_in_month,
    format_day,
    parse_date_expr,
    parse_month,
    within_interval
  };

  fn ymd(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  #[test]
  fn lists_every_day_of_a_leap_february()
  {
    let days = days_in_month(
      2024,
      Month::February
    );
    assert_eq!(days.len(), 29);
    assert_eq!(days[0], ymd(2024, 2, 1));
    assert_eq!(
      days[28],
      ymd(2024, 2, 29)
    );
    assert!(
      days.windows(2).all(|w| w[0] < w[1])
    );
  }

  #[test]
  fn december_stops_at_year_end() {
    let days = days_in_month(
      2025,
      Month::December
    );
    assert_eq!(days.len(), 31);
    assert_eq!(
      days.last().copied(),
      Some(ymd(2025, 12, 31))
    );
  }

  #[test]
  fn interval_bounds_are_inclusive() {
    let start = ymd(2025, 3, 2);
    let end = ymd(2025, 3, 4);
    assert!(!within_interval(
      ymd(2025, 3, 1),
      start,
      end
    ));
    assert!(within_interval(
      start, start, end
    ));
    assert!(within_interval(
      end, start, end
    ));
    assert!(!within_interval(
      ymd(2025, 3, 5),
      start,
      end
    ));
    assert!(!within_interval(
      ymd(2025, 3, 3),
      end,
      start
    ));
  }

  #[test]
  fn parses_month_names_and_numbers() {
    assert_eq!(
      parse_month("March"),
      Some(Month::March)
    );
    assert_eq!(
      parse_month("sept"),
      Some(Month::September)
    );
    assert_eq!(
      parse_month("12"),
      Some(Month::December)
    );
    assert_eq!(parse_month("13"), None);
    assert_eq!(parse_month("0"), None);
    assert_eq!(parse_month("smarch"), None);
  }

  #[test]
  fn parses_relative_and_iso_dates() {
    let now = Utc
      .with_ymd_and_hms(
        2026, 2, 17, 12, 0, 0
      )
      .single()
      .expect("valid now");
    assert_eq!(
      parse_date_expr("2026-03-01", now)
        .expect("iso date"),
      ymd(2026, 3, 1)
    );
    assert_eq!(
      parse_date_expr("+3d", now)
        .expect("relative days"),
      ymd(2026, 2, 20)
    );
    assert_eq!(
      parse_date_expr("-1w", now)
        .expect("relative weeks"),
      ymd(2026, 2, 10)
    );
    assert_eq!(
      parse_date_expr("wednesday", now)
        .expect("weekday"),
      ymd(2026, 2, 18)
    );
    assert!(
      parse_date_expr("someday", now)
        .is_err()
    );
  }

  #[test]
  fn formats_with_locale_tables() {
    let day = ymd(2026, 2, 17);
    assert_eq!(
      format_day(
        day,
        "%a %d %b",
        Locale::en_US
      ),
      "Tue 17 Feb"
    );
  }
}

//! Cutoff timestamp parsing.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, anyhow, bail};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};

const C_FORMAT_DATETIME: &str = "%Y-%m-%d %H:%M:%S";
const C_FORMAT_DATE: &str = "%Y-%m-%d";

/// Parse a cutoff given as RFC 3339, local `YYYY-MM-DD HH:MM:SS`,
/// local `YYYY-MM-DD` (midnight) or `@<unix-seconds>`.
pub fn parse_cutoff(raw: &str) -> anyhow::Result<SystemTime> {
    let raw = raw.trim();

    if let Some(c_secs) = raw.strip_prefix('@') {
        let n_secs: u64 = c_secs
            .parse()
            .with_context(|| format!("invalid unix timestamp: {raw}"))?;
        return Ok(UNIX_EPOCH + Duration::from_secs(n_secs));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(SystemTime::from(dt));
    }

    let dt_naive = match NaiveDateTime::parse_from_str(raw, C_FORMAT_DATETIME) {
        Ok(v) => v,
        Err(_) => match NaiveDate::parse_from_str(raw, C_FORMAT_DATE) {
            Ok(date) => date
                .and_hms_opt(0, 0, 0)
                .ok_or_else(|| anyhow!("invalid date: {raw}"))?,
            Err(_) => bail!(
                "unrecognized cutoff '{raw}' (expected RFC 3339, '{C_FORMAT_DATETIME}', '{C_FORMAT_DATE}' or @<unix-seconds>)"
            ),
        },
    };
    let dt_local = Local
        .from_local_datetime(&dt_naive)
        .earliest()
        .ok_or_else(|| anyhow!("cutoff does not exist in the local timezone: {raw}"))?;
    Ok(SystemTime::from(dt_local))
}

/// Local RFC 3339 rendering used by `list`.
pub fn format_time(time: SystemTime) -> String {
    DateTime::<Local>::from(time).to_rfc3339_opts(chrono::SecondsFormat::Secs, false)
}

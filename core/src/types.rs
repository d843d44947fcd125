//! Shared primitive types used across the entire game.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Whole-rupee currency amount. Signed: capital may be driven below zero
/// by operator edits, never by gameplay.
pub type Money = i64;

pub type UserId = String;
pub type BusinessId = String;
pub type ScenarioResultId = String;
pub type AuctionId = String;

/// Timestamps are stored as local ISO-8601 strings in the document.
pub type Timestamp = DateTime<Local>;

pub fn now() -> Timestamp {
    Local::now()
}

/// Parse an RFC 3339 timestamp, or a naive ISO-8601 one read as local
/// time (documents written without an offset).
pub fn parse_timestamp(s: &str) -> Option<Timestamp> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Local));
    }
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
    Some(
        Local
            .from_local_datetime(&naive)
            .earliest()
            .unwrap_or_else(|| Local.from_utc_datetime(&naive)),
    )
}

pub fn de_timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<Timestamp, D::Error> {
    let raw = String::deserialize(d)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'")))
}

pub fn de_opt_timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Timestamp>, D::Error> {
    match Option::<String>::deserialize(d)? {
        None => Ok(None),
        Some(raw) => parse_timestamp(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'"))),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMoney {
    Whole(i64),
    Fractional(f64),
}

impl From<RawMoney> for Money {
    fn from(raw: RawMoney) -> Money {
        match raw {
            RawMoney::Whole(n) => n,
            RawMoney::Fractional(x) => x.round() as Money,
        }
    }
}

/// Whole rupees from an integer or a float amount (rounded).
pub fn de_money<'de, D: Deserializer<'de>>(d: D) -> Result<Money, D::Error> {
    Ok(RawMoney::deserialize(d)?.into())
}

pub fn de_money_map<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeMap<String, Money>, D::Error> {
    let raw = BTreeMap::<String, RawMoney>::deserialize(d)?;
    Ok(raw.into_iter().map(|(k, v)| (k, v.into())).collect())
}

/// Generate a document key: `<prefix>_<YYYYmmdd_HHMMSS>_<8 hex>`.
///
/// The timestamp keeps keys roughly sortable by creation time; the
/// random suffix disambiguates keys minted within the same second.
pub fn new_id(prefix: &str, at: Timestamp) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{prefix}_{}_{}", at.format("%Y%m%d_%H%M%S"), &suffix[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_carry_prefix_and_timestamp() {
        let at = now();
        let id = new_id("biz", at);
        assert!(id.starts_with("biz_"));
        assert!(id.contains(&at.format("%Y%m%d").to_string()));
        assert_eq!(id.rsplit('_').next().map(str::len), Some(8));
    }

    #[test]
    fn naive_and_offset_timestamps_both_parse() {
        let naive = parse_timestamp("2024-01-01T12:00:00.123456").unwrap();
        assert_eq!(naive.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-01-01 12:00:00");
        let whole = parse_timestamp("2024-01-01T12:00:00").unwrap();
        assert!(naive > whole);
        let at = now();
        assert_eq!(parse_timestamp(&at.to_rfc3339()), Some(at));
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn float_amounts_round_to_whole_rupees() {
        #[derive(Deserialize)]
        struct Price {
            #[serde(deserialize_with = "de_money")]
            amount: Money,
        }
        let p: Price = serde_json::from_str(r#"{"amount": 8000.0}"#).unwrap();
        assert_eq!(p.amount, 8_000);
        let p: Price = serde_json::from_str(r#"{"amount": 7099.6}"#).unwrap();
        assert_eq!(p.amount, 7_100);
        let p: Price = serde_json::from_str(r#"{"amount": 35000}"#).unwrap();
        assert_eq!(p.amount, 35_000);
    }

    #[test]
    fn ids_minted_in_same_second_differ() {
        let at = now();
        assert_ne!(new_id("user", at), new_id("user", at));
    }
}

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub is_open: bool,
    #[serde(with = "clock_time")]
    pub opening_time: NaiveTime,
    #[serde(with = "clock_time")]
    pub closing_time: NaiveTime,
    pub delivery_fee: f64,
    pub updated_at: DateTime<Utc>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            is_open: true,
            opening_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default(),
            closing_time: NaiveTime::from_hms_opt(22, 0, 0).unwrap_or_default(),
            delivery_fee: 0.0,
            updated_at: Utc::now(),
        }
    }
}

impl Settings {
    /// Whether orders are accepted at the given store-local time.
    ///
    /// The window is `[opening_time, closing_time)`. A closing time earlier than the
    /// opening time wraps past midnight, and equal times keep the store open all day.
    pub fn accepts_orders_at(&self, local: NaiveTime) -> bool {
        if !self.is_open {
            return false;
        }

        let (open, close) = (self.opening_time, self.closing_time);
        if open == close {
            true
        } else if open < close {
            local >= open && local < close
        } else {
            local >= open || local < close
        }
    }
}

/// `HH:MM` wall-clock times; seconds are accepted on input.
pub mod clock_time {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    pub fn parse(raw: &str) -> Result<NaiveTime, String> {
        NaiveTime::parse_from_str(raw.trim(), FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(raw.trim(), "%H:%M:%S"))
            .map_err(|err| format!("invalid time {raw:?}, expected HH:MM: {err}"))
    }
}

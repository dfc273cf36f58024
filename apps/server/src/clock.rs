//! Shop-local clock. The shop runs on a fixed UTC+3 offset; all dates and
//! times stored in the database are shop-local.

use chrono::{DateTime, FixedOffset, Utc};

/// Shop timezone offset from UTC (seconds).
pub const SHOP_TZ_OFFSET_SECS: i32 = 3 * 3600;

pub fn shop_now() -> DateTime<FixedOffset> {
    let tz = FixedOffset::east_opt(SHOP_TZ_OFFSET_SECS).unwrap();
    Utc::now().with_timezone(&tz)
}

pub fn shop_today() -> String {
    shop_now().format("%Y-%m-%d").to_string()
}

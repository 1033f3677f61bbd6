//! 时间工具函数 (营业时区转换)
//!
//! 营业时区未配置时使用系统本地时区。

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// 某一时刻在营业时区的日期
pub fn local_date(now: DateTime<Utc>, tz: Option<Tz>) -> NaiveDate {
    match tz {
        Some(tz) => now.with_timezone(&tz).date_naive(),
        None => now.with_timezone(&Local).date_naive(),
    }
}

/// 日期开始 (00:00:00，营业时区) 对应的 UTC 时刻
///
/// 本地零点落在夏令时跳跃中不存在时，取当天第一个存在的本地时刻
/// (跳跃结束处)；零点重复时取较早的一个。
pub fn day_start(date: NaiveDate, tz: Option<Tz>) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    match tz {
        Some(tz) => to_utc(&tz, naive),
        None => to_utc(&Local, naive),
    }
}

/// 今天零点 (营业时区)，日报窗口的起点
pub fn today_start(now: DateTime<Utc>, tz: Option<Tz>) -> DateTime<Utc> {
    day_start(local_date(now, tz), tz)
}

/// 时区跳跃以分钟为边界，逐分钟向后找即可
const MAX_GAP_MINUTES: i64 = 24 * 60;

fn to_utc<Z: TimeZone>(zone: &Z, naive: NaiveDateTime) -> DateTime<Utc> {
    (0..=MAX_GAP_MINUTES)
        .find_map(|minutes| {
            (naive + Duration::minutes(minutes))
                .and_local_timezone(zone.clone())
                .earliest()
        })
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}

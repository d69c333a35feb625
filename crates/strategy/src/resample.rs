//! Aggregation of fine-grained candles into coarser buckets aligned to local
//! calendar boundaries of a timezone.

use chrono::{Duration, NaiveDateTime, Timelike};

use common::{Candle, DayKeyResolver, Interval};

/// Resample `candles` (any order) into `interval` buckets anchored to local
/// midnight in `tz`.
///
/// Each output candle takes the first open, highest high, lowest low, last
/// close and summed volume of its bucket; its `time` is the UTC epoch of the
/// local bucket start. Buckets without input candles are not emitted.
pub fn resample(candles: &[Candle], interval: Interval, tz: &DayKeyResolver) -> Vec<Candle> {
    let mut sorted = candles.to_vec();
    sorted.sort_by_key(|c| c.time);

    let bucket_secs = i64::from(interval.minutes()) * 60;
    let mut out: Vec<Candle> = Vec::new();
    let mut current: Option<NaiveDateTime> = None;

    for c in sorted {
        let Some(local) = tz.to_local(c.time) else {
            continue;
        };
        let offset = i64::from(local.num_seconds_from_midnight()) % bucket_secs;
        let key = local - Duration::seconds(offset);

        match out.last_mut() {
            Some(bucket) if current == Some(key) => {
                bucket.high = bucket.high.max(c.high);
                bucket.low = bucket.low.min(c.low);
                bucket.close = c.close;
                bucket.volume += c.volume;
            }
            _ => {
                current = Some(key);
                out.push(Candle {
                    time: c.time - offset,
                    ..c
                });
            }
        }
    }
    out
}

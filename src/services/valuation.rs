//! Owned collection value over time

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::Serialize;
use time::Date;
use utoipa::ToSchema;

use crate::models::Card;
use crate::services::Timeframe;

/// `all` series longer than this are thinned to one point per month
const MAX_ALL_TIME_SAMPLES: usize = 30;
/// `year` series longer than this are thinned to one point per even week
const MAX_YEAR_SAMPLES: usize = 15;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ValuePoint {
    pub date: Date,
    /// DD-MM-YYYY
    pub display_date: String,
    #[schema(value_type = f64)]
    pub value: Decimal,
}

/// Value of the cards held on each sample date between the window start and
/// `today`, in strictly increasing date order.
pub fn collection_value_series(cards: &[Card], timeframe: Timeframe, today: Date) -> Vec<ValuePoint> {
    let start = window_start(cards, timeframe, today);

    let mut dates = BTreeSet::from([start, today]);
    dates.extend(
        cards
            .iter()
            .flat_map(|card| std::iter::once(card.bought_date).chain(card.sold_date))
            .filter(|date| *date >= start && *date <= today),
    );
    let samples: Vec<Date> = dates.into_iter().collect();

    let samples = match timeframe {
        Timeframe::All if samples.len() > MAX_ALL_TIME_SAMPLES => {
            keep_last_per_bucket(&samples, |date| Some((date.year(), date.month())))
        }
        Timeframe::Year if samples.len() > MAX_YEAR_SAMPLES => {
            keep_last_per_bucket(&samples, |date| {
                let week = (date - start).whole_days() / 7;
                (week % 2 == 0).then_some(week)
            })
        }
        _ => samples,
    };

    samples
        .into_iter()
        .map(|date| ValuePoint {
            date,
            display_date: display_date(date),
            value: value_at(cards, date),
        })
        .collect()
}

/// Sum of prices of cards bought on or before `date` and not sold by then.
///
/// A card sold on `date` itself no longer counts. A sold card without a
/// sale date is treated as still held.
pub fn value_at(cards: &[Card], date: Date) -> Decimal {
    cards
        .iter()
        .filter(|card| card.bought_date <= date)
        .filter(|card| card.sold_date.is_none_or(|sold_date| sold_date > date))
        .map(|card| card.price)
        .sum()
}

fn window_start(cards: &[Card], timeframe: Timeframe, today: Date) -> Date {
    timeframe.cutoff(today).unwrap_or_else(|| {
        cards
            .iter()
            .map(|card| card.bought_date)
            .min()
            .map_or(today, |earliest| earliest.min(today))
    })
}

/// Keep the first and last samples plus the last sample of every bucket.
/// Samples whose bucket is `None` are dropped.
fn keep_last_per_bucket<K, F>(samples: &[Date], bucket: F) -> Vec<Date>
where
    K: PartialEq,
    F: Fn(Date) -> Option<K>,
{
    let last = samples.len().saturating_sub(1);
    samples
        .iter()
        .enumerate()
        .filter(|&(index, &date)| {
            if index == 0 || index == last {
                return true;
            }
            match bucket(date) {
                Some(key) => bucket(samples[index + 1]) != Some(key),
                None => false,
            }
        })
        .map(|(_, &date)| date)
        .collect()
}

fn display_date(date: Date) -> String {
    format!(
        "{:02}-{:02}-{:04}",
        date.day(),
        u8::from(date.month()),
        date.year()
    )
}

//! Investment statistics over a user's card holdings.
//!
//! Everything here is a pure function of the card list, the timeframe and
//! the current date: the same input always produces the same `CardStats`.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;
use time::Date;
use utoipa::ToSchema;

use crate::models::{Card, CardStatus};
use crate::services::Timeframe;

/// Length of every top-N ranking
pub const TOP_N: usize = 3;

/// Categories need at least this many sold cards to appear in the ROI ranking.
/// Fixed business rule, not a tunable.
pub const MIN_SOLD_FOR_ROI_RANKING: u32 = 2;

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct CategoryProfit {
    #[schema(value_type = f64)]
    pub total_profit: Decimal,
    #[schema(value_type = f64)]
    pub total_sold: Decimal,
    pub count: u32,
    #[schema(value_type = f64)]
    pub average_profit: Decimal,
}

impl CategoryProfit {
    fn record(&mut self, card: &Card) {
        self.total_profit += card.realized_profit();
        self.total_sold += card.sold_price.unwrap_or_default();
        self.count += 1;
        self.average_profit = self.total_profit / Decimal::from(self.count);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct CategoryInvestment {
    #[schema(value_type = f64)]
    pub total_investment: Decimal,
    pub count: u32,
    #[schema(value_type = f64)]
    pub average_investment: Decimal,
}

impl CategoryInvestment {
    fn record(&mut self, card: &Card) {
        self.total_investment += card.price;
        self.count += 1;
        self.average_investment = self.total_investment / Decimal::from(self.count);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct CategoryRoi {
    #[schema(value_type = f64)]
    pub total_profit: Decimal,
    #[schema(value_type = f64)]
    pub total_investment: Decimal,
    pub count: u32,
    /// Percentage
    #[schema(value_type = f64)]
    pub roi: Decimal,
}

impl CategoryRoi {
    fn record(&mut self, card: &Card) {
        self.total_profit += card.realized_profit();
        self.total_investment += card.price;
        self.count += 1;
        self.roi = percentage(self.total_profit, self.total_investment);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct MonthlySales {
    #[schema(value_type = f64)]
    pub total_sales: Decimal,
    pub count: u32,
    #[schema(value_type = f64)]
    pub total_profit: Decimal,
}

impl MonthlySales {
    fn record(&mut self, card: &Card) {
        self.total_sales += card.sold_price.unwrap_or_default();
        self.count += 1;
        self.total_profit += card.realized_profit();
    }
}

/// One entry of a top-N ranking: the group key plus its figures
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranked<T> {
    pub key: String,
    #[serde(flatten)]
    pub stats: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CardStats {
    pub timeframe: Timeframe,
    #[schema(value_type = f64)]
    pub total_investment: Decimal,
    #[schema(value_type = f64)]
    pub bought_investment: Decimal,
    #[schema(value_type = f64)]
    pub sold_investment: Decimal,
    #[schema(value_type = f64)]
    pub total_sold: Decimal,
    pub cards_bought: usize,
    pub cards_sold: usize,
    #[schema(value_type = f64)]
    pub profit: Decimal,
    /// Profit over sold investment, as a percentage
    #[schema(value_type = f64)]
    pub roi: Decimal,
    pub profits_by_category: BTreeMap<String, CategoryProfit>,
    pub investments_by_category: BTreeMap<String, CategoryInvestment>,
    pub roi_by_category: BTreeMap<String, CategoryRoi>,
    pub sales_by_month: BTreeMap<String, MonthlySales>,
    #[schema(value_type = Vec<Object>)]
    pub top_categories: Vec<Ranked<CategoryProfit>>,
    #[schema(value_type = Vec<Object>)]
    pub top_investment_categories: Vec<Ranked<CategoryInvestment>>,
    #[schema(value_type = Vec<Object>)]
    pub top_roi_categories: Vec<Ranked<CategoryRoi>>,
    #[schema(value_type = Vec<Object>)]
    pub top_months: Vec<Ranked<MonthlySales>>,
}

/// Compute the statistics of `cards` restricted to `timeframe`.
///
/// Bought cards qualify by purchase date, sold cards by sale date; with a
/// window, a sold card without a sale date never qualifies. Cards outside
/// the window are left out of every total and breakdown.
pub fn compute_stats(cards: &[Card], timeframe: Timeframe, today: Date) -> CardStats {
    let (bought, sold): (Vec<&Card>, Vec<&Card>) = cards
        .iter()
        .filter(|card| in_window(card, timeframe, today))
        .partition(|card| card.status == CardStatus::Bought);

    let bought_investment: Decimal = bought.iter().map(|card| card.price).sum();
    let sold_investment: Decimal = sold.iter().map(|card| card.price).sum();
    let total_sold: Decimal = sold
        .iter()
        .map(|card| card.sold_price.unwrap_or_default())
        .sum();
    let profit = total_sold - sold_investment;

    let profits = group_by(sold.iter().copied(), category_of, CategoryProfit::record);
    let investments = group_by(
        bought.iter().chain(sold.iter()).copied(),
        category_of,
        CategoryInvestment::record,
    );
    let rois = group_by(sold.iter().copied(), category_of, CategoryRoi::record);
    let months = group_by(sold.iter().copied(), sale_month, MonthlySales::record);

    let roi_candidates: Vec<(String, CategoryRoi)> = rois
        .iter()
        .filter(|(_, roi)| roi.count >= MIN_SOLD_FOR_ROI_RANKING)
        .cloned()
        .collect();

    CardStats {
        timeframe,
        total_investment: bought_investment + sold_investment,
        bought_investment,
        sold_investment,
        total_sold,
        cards_bought: bought.len(),
        cards_sold: sold.len(),
        profit,
        roi: percentage(profit, sold_investment),
        top_categories: top_n(&profits, |p| p.total_profit),
        top_investment_categories: top_n(&investments, |i| i.total_investment),
        top_roi_categories: top_n(&roi_candidates, |r| r.roi),
        top_months: top_n(&months, |m| m.total_sales),
        profits_by_category: profits.into_iter().collect(),
        investments_by_category: investments.into_iter().collect(),
        roi_by_category: rois.into_iter().collect(),
        sales_by_month: months.into_iter().collect(),
    }
}

fn in_window(card: &Card, timeframe: Timeframe, today: Date) -> bool {
    match (card.status, timeframe) {
        (_, Timeframe::All) => true,
        (CardStatus::Bought, _) => timeframe.contains(card.bought_date, today),
        (CardStatus::Sold, _) => card
            .sold_date
            .is_some_and(|sold_date| timeframe.contains(sold_date, today)),
    }
}

fn category_of(card: &Card) -> Option<String> {
    Some(card.category_key().to_string())
}

fn sale_month(card: &Card) -> Option<String> {
    card.sold_date
        .map(|date| format!("{:04}-{:02}", date.year(), u8::from(date.month())))
}

fn percentage(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        Decimal::ZERO
    } else {
        part / whole * Decimal::ONE_HUNDRED
    }
}

/// Fold cards into groups kept in first-encounter order. Cards whose key is
/// `None` are skipped.
fn group_by<'a, T, K, F>(cards: impl Iterator<Item = &'a Card>, key: K, record: F) -> Vec<(String, T)>
where
    T: Default,
    K: Fn(&Card) -> Option<String>,
    F: Fn(&mut T, &Card),
{
    cards.fold(Vec::new(), |mut groups, card| {
        let Some(key) = key(card) else {
            return groups;
        };
        match groups.iter().position(|(existing, _)| *existing == key) {
            Some(index) => record(&mut groups[index].1, card),
            None => {
                let mut stats = T::default();
                record(&mut stats, card);
                groups.push((key, stats));
            }
        }
        groups
    })
}

/// Highest `metric` first; ties keep first-encounter order
fn top_n<T: Clone>(groups: &[(String, T)], metric: impl Fn(&T) -> Decimal) -> Vec<Ranked<T>> {
    let mut ranked: Vec<&(String, T)> = groups.iter().collect();
    ranked.sort_by(|(_, a), (_, b)| metric(b).cmp(&metric(a)));
    ranked
        .into_iter()
        .take(TOP_N)
        .map(|(key, stats)| Ranked {
            key: key.clone(),
            stats: stats.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};
    use uuid::Uuid;

    const TODAY: Date = date!(2024 - 06 - 15);

    fn dec(value: i64) -> Decimal {
        Decimal::from(value)
    }

    fn bought(price: i64, bought_date: Date, category: &str) -> Card {
        Card {
            id: 0,
            user_id: Uuid::nil(),
            collection_id: 1,
            name: "Card".to_string(),
            description: None,
            price: dec(price),
            sold_price: None,
            status: CardStatus::Bought,
            bought_date,
            sold_date: None,
            category: Some(category.to_string()),
            image_url: "/default-card.jpg".to_string(),
            graded: false,
            grading_company: None,
            grading_value: None,
            created_at: datetime!(2024-01-01 0:00 UTC),
            updated_at: datetime!(2024-01-01 0:00 UTC),
        }
    }

    fn sold(price: i64, sold_price: i64, bought_date: Date, sold_date: Date, category: &str) -> Card {
        Card {
            sold_price: Some(dec(sold_price)),
            status: CardStatus::Sold,
            sold_date: Some(sold_date),
            ..bought(price, bought_date, category)
        }
    }

    #[test]
    fn test_reference_scenario() {
        let cards = vec![
            bought(100, date!(2024 - 01 - 01), "Baseball"),
            sold(50, 80, date!(2024 - 01 - 01), date!(2024 - 02 - 01), "Hockey"),
        ];

        let stats = compute_stats(&cards, Timeframe::All, TODAY);

        assert_eq!(stats.bought_investment, dec(100));
        assert_eq!(stats.sold_investment, dec(50));
        assert_eq!(stats.total_investment, dec(150));
        assert_eq!(stats.total_sold, dec(80));
        assert_eq!(stats.profit, dec(30));
        assert_eq!(stats.roi, dec(60));
        assert_eq!(stats.cards_bought, 1);
        assert_eq!(stats.cards_sold, 1);

        let hockey = &stats.profits_by_category["Hockey"];
        assert_eq!(hockey.total_profit, dec(30));
        assert_eq!(hockey.count, 1);
        assert_eq!(hockey.average_profit, dec(30));

        assert_eq!(stats.sales_by_month["2024-02"].total_sales, dec(80));
        assert_eq!(stats.investments_by_category["Baseball"].count, 1);
        assert_eq!(stats.investments_by_category["Hockey"].count, 1);
    }

    #[test]
    fn test_empty_input() {
        let stats = compute_stats(&[], Timeframe::All, TODAY);

        assert_eq!(stats.total_investment, Decimal::ZERO);
        assert_eq!(stats.bought_investment, Decimal::ZERO);
        assert_eq!(stats.sold_investment, Decimal::ZERO);
        assert_eq!(stats.total_sold, Decimal::ZERO);
        assert_eq!(stats.profit, Decimal::ZERO);
        assert_eq!(stats.roi, Decimal::ZERO);
        assert_eq!(stats.cards_bought, 0);
        assert_eq!(stats.cards_sold, 0);
        assert!(stats.profits_by_category.is_empty());
        assert!(stats.investments_by_category.is_empty());
        assert!(stats.roi_by_category.is_empty());
        assert!(stats.sales_by_month.is_empty());
        assert!(stats.top_categories.is_empty());
        assert!(stats.top_investment_categories.is_empty());
        assert!(stats.top_roi_categories.is_empty());
        assert!(stats.top_months.is_empty());
    }

    #[test]
    fn test_week_window_filters_by_relevant_date() {
        let cards = vec![
            // bought inside the week
            bought(10, date!(2024 - 06 - 10), "Hockey"),
            // bought on the cutoff day
            bought(20, date!(2024 - 06 - 08), "Hockey"),
            // bought before the window
            bought(40, date!(2024 - 06 - 07), "Hockey"),
            // bought in the future
            bought(80, date!(2024 - 06 - 16), "Hockey"),
            // bought long ago, sold inside the window
            sold(5, 9, date!(2020 - 01 - 01), date!(2024 - 06 - 14), "Soccer"),
            // bought inside the window, sold before it cannot happen, sold after it is excluded
            sold(7, 3, date!(2024 - 06 - 01), date!(2024 - 06 - 02), "Soccer"),
        ];

        let stats = compute_stats(&cards, Timeframe::Week, TODAY);

        assert_eq!(stats.cards_bought, 2);
        assert_eq!(stats.bought_investment, dec(30));
        assert_eq!(stats.cards_sold, 1);
        assert_eq!(stats.sold_investment, dec(5));
        assert_eq!(stats.total_sold, dec(9));
        assert_eq!(stats.profit, dec(4));
        assert_eq!(stats.sales_by_month.len(), 1);
        assert!(stats.sales_by_month.contains_key("2024-06"));
    }

    #[test]
    fn test_window_excludes_sold_card_without_sold_date() {
        let mut undated = sold(5, 9, date!(2024 - 06 - 10), TODAY, "Hockey");
        undated.sold_date = None;

        let windowed = compute_stats(std::slice::from_ref(&undated), Timeframe::Month, TODAY);
        assert_eq!(windowed.cards_sold, 0);
        assert_eq!(windowed.total_sold, Decimal::ZERO);

        let all_time = compute_stats(&[undated], Timeframe::All, TODAY);
        assert_eq!(all_time.cards_sold, 1);
        assert_eq!(all_time.total_sold, dec(9));
        assert_eq!(all_time.profits_by_category["Hockey"].count, 1);
        assert!(all_time.sales_by_month.is_empty());
    }

    #[test]
    fn test_investment_totals_partition_exactly() {
        let cards = vec![
            bought(12, date!(2024 - 05 - 01), "Hockey"),
            bought(7, date!(2023 - 05 - 01), "Baseball"),
            sold(30, 25, date!(2023 - 01 - 01), date!(2024 - 06 - 01), "Hockey"),
            sold(4, 40, date!(2022 - 01 - 01), date!(2022 - 02 - 01), "Pokemon"),
        ];

        for timeframe in [
            Timeframe::Week,
            Timeframe::Month,
            Timeframe::Year,
            Timeframe::All,
        ] {
            let stats = compute_stats(&cards, timeframe, TODAY);
            assert_eq!(
                stats.bought_investment + stats.sold_investment,
                stats.total_investment
            );
            assert_eq!(stats.profit, stats.total_sold - stats.sold_investment);

            let category_count: u32 = stats
                .investments_by_category
                .values()
                .map(|c| c.count)
                .sum();
            assert_eq!(
                category_count as usize,
                stats.cards_bought + stats.cards_sold
            );
        }
    }

    #[test]
    fn test_missing_category_is_uncategorized() {
        let mut card = sold(10, 15, date!(2024 - 01 - 01), date!(2024 - 02 - 01), "");
        card.category = None;
        let mut blank = bought(3, date!(2024 - 01 - 01), "  ");
        blank.category = Some("  ".to_string());

        let stats = compute_stats(&[card, blank], Timeframe::All, TODAY);

        assert_eq!(stats.profits_by_category["Uncategorized"].count, 1);
        assert_eq!(stats.investments_by_category["Uncategorized"].count, 2);
    }

    #[test]
    fn test_roi_ranking_requires_two_sold_cards() {
        let cards = vec![
            // single sale with a huge return
            sold(1, 100, date!(2024 - 01 - 01), date!(2024 - 02 - 01), "Pokemon"),
            sold(10, 20, date!(2024 - 01 - 01), date!(2024 - 02 - 01), "Hockey"),
            sold(10, 10, date!(2024 - 01 - 01), date!(2024 - 03 - 01), "Hockey"),
            sold(10, 12, date!(2024 - 01 - 01), date!(2024 - 02 - 01), "Soccer"),
            sold(10, 12, date!(2024 - 01 - 01), date!(2024 - 03 - 01), "Soccer"),
        ];

        let stats = compute_stats(&cards, Timeframe::All, TODAY);

        assert_eq!(MIN_SOLD_FOR_ROI_RANKING, 2);
        assert_eq!(stats.roi_by_category["Pokemon"].roi, dec(9900));
        let keys: Vec<&str> = stats
            .top_roi_categories
            .iter()
            .map(|r| r.key.as_str())
            .collect();
        assert_eq!(keys, vec!["Hockey", "Soccer"]);
        assert_eq!(stats.top_roi_categories[0].stats.roi, dec(50));
        assert_eq!(stats.top_roi_categories[1].stats.roi, dec(20));
        assert!(stats
            .top_roi_categories
            .iter()
            .all(|r| r.stats.count >= MIN_SOLD_FOR_ROI_RANKING));
    }

    #[test]
    fn test_rankings_are_limited_and_ties_keep_first_encounter() {
        let cards = vec![
            bought(10, date!(2024 - 01 - 01), "Soccer"),
            bought(50, date!(2024 - 01 - 01), "Hockey"),
            bought(10, date!(2024 - 01 - 01), "Baseball"),
            bought(10, date!(2024 - 01 - 01), "Pokemon"),
        ];

        let stats = compute_stats(&cards, Timeframe::All, TODAY);

        let keys: Vec<&str> = stats
            .top_investment_categories
            .iter()
            .map(|r| r.key.as_str())
            .collect();
        assert_eq!(keys, vec!["Hockey", "Soccer", "Baseball"]);
    }

    #[test]
    fn test_top_months_by_sales() {
        let cards = vec![
            sold(1, 10, date!(2024 - 01 - 01), date!(2024 - 01 - 20), "Hockey"),
            sold(1, 30, date!(2024 - 01 - 01), date!(2024 - 02 - 20), "Hockey"),
            sold(1, 15, date!(2024 - 01 - 01), date!(2024 - 03 - 20), "Hockey"),
            sold(1, 20, date!(2024 - 01 - 01), date!(2024 - 03 - 21), "Hockey"),
            sold(1, 5, date!(2024 - 01 - 01), date!(2024 - 04 - 20), "Hockey"),
        ];

        let stats = compute_stats(&cards, Timeframe::All, TODAY);

        let keys: Vec<&str> = stats.top_months.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["2024-03", "2024-02", "2024-01"]);
        assert_eq!(stats.top_months[0].stats.count, 2);
        assert_eq!(stats.top_months[0].stats.total_profit, dec(33));
    }

    #[test]
    fn test_same_input_same_output() {
        let cards = vec![
            bought(12, date!(2024 - 05 - 01), "Hockey"),
            sold(30, 25, date!(2023 - 01 - 01), date!(2024 - 06 - 01), "Hockey"),
        ];

        assert_eq!(
            compute_stats(&cards, Timeframe::Year, TODAY),
            compute_stats(&cards, Timeframe::Year, TODAY)
        );
    }

    #[test]
    fn test_ranked_entries_serialize_flat() {
        let cards = vec![sold(50, 80, date!(2024 - 01 - 01), date!(2024 - 02 - 01), "Hockey")];
        let stats = compute_stats(&cards, Timeframe::All, TODAY);

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["top_categories"][0]["key"], "Hockey");
        assert_eq!(json["top_categories"][0]["total_profit"].as_f64(), Some(30.0));
        assert_eq!(json["timeframe"], "all");
    }
}

use crate::error::AnalyzerError;
use async_trait::async_trait;
use database::{CustomerPaymentSummary, DbError, DbRepository};
use serde::Serialize;

/// Splits a list that is already sorted best-first.
///
/// `top` is the first `n` records as they are. `bottom` is the last `n`
/// records reversed, so `bottom[0]` is the single lowest record. When the list
/// holds fewer than `2n` records the two slices share records; that overlap is
/// kept as is. Shorter lists simply give shorter slices.
pub fn top_and_bottom<T: Clone>(ranked: &[T], n: usize) -> (Vec<T>, Vec<T>) {
    let take = n.min(ranked.len());
    let top = ranked[..take].to_vec();
    let bottom = ranked[ranked.len() - take..].iter().rev().cloned().collect();
    (top, bottom)
}

/// Where the ranked payment totals come from.
#[async_trait]
pub trait PaymentSource: Send + Sync {
    /// Totals per customer, highest `total_paid` first.
    async fn customer_payment_totals(&self) -> Result<Vec<CustomerPaymentSummary>, DbError>;
}

#[async_trait]
impl PaymentSource for DbRepository {
    async fn customer_payment_totals(&self) -> Result<Vec<CustomerPaymentSummary>, DbError> {
        self.get_customer_payment_totals().await
    }
}

/// The highest and lowest paying customers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentAnalysis {
    pub top_customers: Vec<CustomerPaymentSummary>,
    pub bottom_customers: Vec<CustomerPaymentSummary>,
}

/// The payment analysis engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaymentAnalyzer;

impl PaymentAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Fetches the ranked totals once and slices them.
    pub async fn run<S: PaymentSource + ?Sized>(
        &self,
        source: &S,
        top_count: usize,
    ) -> Result<PaymentAnalysis, AnalyzerError> {
        if top_count == 0 {
            return Err(AnalyzerError::InvalidTopCount(top_count));
        }

        let totals = source.customer_payment_totals().await?;
        let (top_customers, bottom_customers) = top_and_bottom(&totals, top_count);

        tracing::info!(
            customers = totals.len(),
            top_count,
            "Payment analysis complete."
        );
        Ok(PaymentAnalysis {
            top_customers,
            bottom_customers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    struct FixedTotals(Vec<CustomerPaymentSummary>);

    #[async_trait]
    impl PaymentSource for FixedTotals {
        async fn customer_payment_totals(
            &self,
        ) -> Result<Vec<CustomerPaymentSummary>, DbError> {
            Ok(self.0.clone())
        }
    }

    struct Unreachable;

    #[async_trait]
    impl PaymentSource for Unreachable {
        async fn customer_payment_totals(
            &self,
        ) -> Result<Vec<CustomerPaymentSummary>, DbError> {
            Err(DbError::Connection("connection refused".into()))
        }
    }

    fn customer(id: i32, total: Decimal) -> CustomerPaymentSummary {
        CustomerPaymentSummary {
            customer_id: id,
            first_name: format!("FIRST{id}"),
            last_name: format!("LAST{id}"),
            total_paid: total,
            payment_count: i64::from(id),
        }
    }

    /// Seven customers, already ranked from 170.00 down to 110.00.
    fn seven() -> Vec<CustomerPaymentSummary> {
        (1..=7)
            .map(|id| customer(id, Decimal::from(180 - 10 * id)))
            .collect()
    }

    #[test]
    fn seven_records_with_n_five_overlap_by_three() {
        let ranked = seven();
        let (top, bottom) = top_and_bottom(&ranked, 5);

        assert_eq!(top.len(), 5);
        assert_eq!(bottom.len(), 5);
        assert_eq!(top, ranked[..5].to_vec());
        assert_eq!(bottom[0].customer_id, 7);
        assert_eq!(bottom[0].total_paid, dec!(110));
        assert_eq!(
            bottom.iter().map(|c| c.customer_id).collect::<Vec<_>>(),
            vec![7, 6, 5, 4, 3]
        );

        let shared = top.iter().filter(|c| bottom.contains(c)).count();
        assert_eq!(shared, 3);
    }

    #[test]
    fn empty_input_gives_empty_slices() {
        let (top, bottom) = top_and_bottom::<CustomerPaymentSummary>(&[], 5);
        assert!(top.is_empty());
        assert!(bottom.is_empty());
    }

    #[test]
    fn fewer_records_than_n_gives_short_slices() {
        let ranked = seven();
        let (top, bottom) = top_and_bottom(&ranked[..3], 5);
        assert_eq!(top.len(), 3);
        assert_eq!(bottom.len(), 3);
        assert_eq!(bottom[0].customer_id, 3);
    }

    #[test]
    fn disjoint_slices_when_there_are_enough_records() {
        let ranked = seven();
        let (top, bottom) = top_and_bottom(&ranked, 3);
        assert_eq!(
            top.iter().map(|c| c.customer_id).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(
            bottom.iter().map(|c| c.customer_id).collect::<Vec<_>>(),
            vec![7, 6, 5]
        );
    }

    #[tokio::test]
    async fn analyzer_serializes_both_slices() {
        let analysis = PaymentAnalyzer::new()
            .run(&FixedTotals(seven()), 2)
            .await
            .unwrap();

        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["top_customers"][0]["customer_id"], 1);
        assert_eq!(json["top_customers"][0]["total_paid"], 170.0);
        assert_eq!(json["bottom_customers"][0]["customer_id"], 7);
        assert_eq!(json["bottom_customers"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn zero_top_count_is_rejected_before_fetching() {
        let err = PaymentAnalyzer::new()
            .run(&Unreachable, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, AnalyzerError::InvalidTopCount(0)));
    }

    #[tokio::test]
    async fn source_failures_propagate() {
        let err = PaymentAnalyzer::new()
            .run(&Unreachable, 5)
            .await
            .unwrap_err();
        assert!(matches!(err, AnalyzerError::Database(DbError::Connection(_))));
    }
}

use crate::config::BudgetsConfig;
use crate::database::budget_warning::BudgetWarningSource;
use crate::error::app_error::AppError;
use crate::models::budget::{Budget, BudgetStatus};
use crate::models::transaction::{Transaction, TransactionKind};
use crate::service::month_window::month_window;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Spend level, in percent of a budget's limit, at which the budget is flagged.
pub const DEFAULT_WARNING_THRESHOLD_PERCENT: u32 = 80;

#[derive(Debug, Error)]
pub enum BudgetWarningError {
    #[error("User has no budgets")]
    NoBudgetsDefined,
    #[error("Storage unavailable")]
    StorageUnavailable {
        #[source]
        source: Box<AppError>,
    },
    #[error("Invalid reference time: {0}")]
    InvalidReferenceTime(String),
}

impl BudgetWarningError {
    pub fn storage(source: AppError) -> Self {
        Self::StorageUnavailable { source: Box::new(source) }
    }
}

/// How "the current month" and "close to the limit" are decided.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WarningPolicy {
    pub timezone: Tz,
    /// Fraction of the limit, e.g. `0.8`.
    pub threshold: Decimal,
}

impl WarningPolicy {
    pub fn new(timezone: Tz, threshold_percent: u32) -> Self {
        Self {
            timezone,
            threshold: Decimal::from(threshold_percent) / Decimal::ONE_HUNDRED,
        }
    }

    pub fn from_config(config: &BudgetsConfig) -> Result<Self, String> {
        Ok(Self::new(config.timezone()?, config.threshold_percent()?))
    }

    pub fn is_warning(&self, spent: Decimal, limit: Decimal) -> bool {
        spent >= limit * self.threshold
    }
}

impl Default for WarningPolicy {
    fn default() -> Self {
        Self::new(chrono_tz::UTC, DEFAULT_WARNING_THRESHOLD_PERCENT)
    }
}

/// Grouping key for categories; matching is case-insensitive.
pub fn normalize_category(category: &str) -> String {
    category.to_lowercase()
}

/// Sums expense amounts per normalized category. Income never counts as spend.
pub fn spent_by_category(transactions: &[Transaction]) -> HashMap<String, Decimal> {
    transactions
        .iter()
        .filter(|tx| tx.kind == TransactionKind::Expense)
        .fold(HashMap::new(), |mut totals, tx| {
            *totals.entry(normalize_category(&tx.category)).or_insert(Decimal::ZERO) += tx.amount;
            totals
        })
}

/// One status per budget, in the order the budgets were given.
pub fn budget_statuses(budgets: &[Budget], spent: &HashMap<String, Decimal>, policy: &WarningPolicy) -> Vec<BudgetStatus> {
    budgets
        .iter()
        .map(|budget| {
            let spent = spent.get(&normalize_category(&budget.category)).copied().unwrap_or(Decimal::ZERO);
            BudgetStatus::new(budget, spent, policy.is_warning(spent, budget.limit))
        })
        .collect()
}

/// Computes this month's spend against every budget a user owns.
pub struct BudgetWarningEngine<'a, S> {
    source: &'a S,
    policy: &'a WarningPolicy,
}

impl<'a, S: BudgetWarningSource + Sync> BudgetWarningEngine<'a, S> {
    pub fn new(source: &'a S, policy: &'a WarningPolicy) -> Self {
        Self { source, policy }
    }

    pub async fn compute_warnings(&self, user_id: &Uuid, now: DateTime<Utc>) -> Result<Vec<BudgetStatus>, BudgetWarningError> {
        let window = month_window(now, &self.policy.timezone)?;

        let (budgets, expenses) = tokio::try_join!(
            self.source.list_budgets(user_id),
            self.source.list_expense_transactions(user_id, &window),
        )
        .map_err(BudgetWarningError::storage)?;

        if budgets.is_empty() {
            return Err(BudgetWarningError::NoBudgetsDefined);
        }

        // Storage filters by date already; anything it lets through outside the month is dropped.
        let expenses: Vec<Transaction> = expenses.into_iter().filter(|tx| window.contains(&tx.date)).collect();
        let spent = spent_by_category(&expenses);
        debug!(
            user_id = %user_id,
            budgets = budgets.len(),
            expenses = expenses.len(),
            window_start = %window.start,
            window_end = %window.end,
            "computed budget spend"
        );

        Ok(budget_statuses(&budgets, &spent, self.policy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::month_window::DateRange;
    use crate::test_utils::{MockRepository, sample_budget, sample_transaction};
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn reference_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap()
    }

    fn in_month() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 9, 30, 0).unwrap()
    }

    fn expense(user_id: Uuid, category: &str, amount: Decimal, date: DateTime<Utc>) -> Transaction {
        sample_transaction(user_id, TransactionKind::Expense, category, amount, date)
    }

    async fn compute(repo: &MockRepository, user_id: &Uuid) -> Result<Vec<BudgetStatus>, BudgetWarningError> {
        let policy = WarningPolicy::default();
        BudgetWarningEngine::new(repo, &policy).compute_warnings(user_id, reference_time()).await
    }

    #[test]
    fn threshold_boundaries() {
        let policy = WarningPolicy::default();
        assert!(!policy.is_warning(dec!(79.99), dec!(100)));
        assert!(policy.is_warning(dec!(80), dec!(100)));
        assert!(policy.is_warning(dec!(150), dec!(100)));
    }

    #[test]
    fn custom_threshold_percent() {
        let policy = WarningPolicy::new(chrono_tz::UTC, 50);
        assert_eq!(policy.threshold, dec!(0.5));
        assert!(policy.is_warning(dec!(50), dec!(100)));
        assert!(!policy.is_warning(dec!(49.99), dec!(100)));
    }

    #[test]
    fn spent_by_category_skips_income() {
        let user_id = Uuid::new_v4();
        let transactions = vec![
            expense(user_id, "food", dec!(20), in_month()),
            sample_transaction(user_id, TransactionKind::Income, "food", dec!(500), in_month()),
        ];
        let spent = spent_by_category(&transactions);
        assert_eq!(spent.get("food"), Some(&dec!(20)));
    }

    #[test]
    fn decimal_sums_do_not_drift() {
        // 0.1 + 0.7 is 0.7999999999999999 in f64, which would miss an 80% threshold.
        let user_id = Uuid::new_v4();
        let transactions = vec![expense(user_id, "coffee", dec!(0.1), in_month()), expense(user_id, "coffee", dec!(0.7), in_month())];
        let spent = spent_by_category(&transactions);
        assert_eq!(spent["coffee"], dec!(0.8));
        assert!(WarningPolicy::default().is_warning(spent["coffee"], dec!(1)));
    }

    #[tokio::test]
    async fn end_to_end_scenario() {
        let user_id = Uuid::new_v4();
        let last_month = Utc.with_ymd_and_hms(2024, 2, 20, 12, 0, 0).unwrap();
        let repo = MockRepository {
            budgets: vec![sample_budget(user_id, "food", dec!(100)), sample_budget(user_id, "travel", dec!(200))],
            transactions: vec![
                expense(user_id, "food", dec!(90), in_month()),
                expense(user_id, "food", dec!(5), in_month()),
                expense(user_id, "travel", dec!(250), in_month()),
                expense(user_id, "food", dec!(1000), last_month),
            ],
            ..MockRepository::default()
        };

        let statuses = compute(&repo, &user_id).await.unwrap();

        assert_eq!(statuses.len(), 2);
        assert_eq!(statuses[0].category, "food");
        assert_eq!(statuses[0].spent, dec!(95));
        assert!(statuses[0].warning);
        assert_eq!(statuses[1].category, "travel");
        assert_eq!(statuses[1].spent, dec!(250));
        assert!(statuses[1].warning);
    }

    #[tokio::test]
    async fn budget_without_expenses_has_zero_spend() {
        let user_id = Uuid::new_v4();
        let repo = MockRepository {
            budgets: vec![sample_budget(user_id, "books", dec!(40))],
            ..MockRepository::default()
        };

        let statuses = compute(&repo, &user_id).await.unwrap();

        assert_eq!(statuses[0].spent, Decimal::ZERO);
        assert!(!statuses[0].warning);
    }

    #[tokio::test]
    async fn categories_match_case_insensitively() {
        let user_id = Uuid::new_v4();
        let repo = MockRepository {
            budgets: vec![sample_budget(user_id, "Food", dec!(100))],
            transactions: vec![expense(user_id, "food", dec!(30), in_month())],
            ..MockRepository::default()
        };

        let statuses = compute(&repo, &user_id).await.unwrap();

        assert_eq!(statuses[0].category, "Food");
        assert_eq!(statuses[0].spent, dec!(30));
    }

    #[tokio::test]
    async fn mixed_case_expenses_aggregate_together() {
        let user_id = Uuid::new_v4();
        let repo = MockRepository {
            budgets: vec![sample_budget(user_id, "travel", dec!(200))],
            transactions: vec![
                expense(user_id, "travel", dec!(50), in_month()),
                expense(user_id, "Travel", dec!(60), in_month()),
            ],
            ..MockRepository::default()
        };

        let statuses = compute(&repo, &user_id).await.unwrap();

        assert_eq!(statuses[0].spent, dec!(110));
        assert!(!statuses[0].warning);
    }

    #[tokio::test]
    async fn month_boundaries_are_respected() {
        let user_id = Uuid::new_v4();
        let first_instant = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let repo = MockRepository {
            budgets: vec![sample_budget(user_id, "rent", dec!(1000))],
            transactions: vec![
                expense(user_id, "rent", dec!(7), first_instant - Duration::microseconds(1)),
                expense(user_id, "rent", dec!(3), first_instant),
                expense(user_id, "rent", dec!(11), Utc.with_ymd_and_hms(2024, 3, 31, 23, 59, 59).unwrap()),
                expense(user_id, "rent", dec!(13), Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap()),
            ],
            ..MockRepository::default()
        };

        let statuses = compute(&repo, &user_id).await.unwrap();

        assert_eq!(statuses[0].spent, dec!(14));
    }

    #[tokio::test]
    async fn income_never_counts_toward_spend() {
        let user_id = Uuid::new_v4();
        let repo = MockRepository {
            budgets: vec![sample_budget(user_id, "salary", dec!(10))],
            transactions: vec![sample_transaction(user_id, TransactionKind::Income, "salary", dec!(5000), in_month())],
            ..MockRepository::default()
        };

        let statuses = compute(&repo, &user_id).await.unwrap();

        assert_eq!(statuses[0].spent, Decimal::ZERO);
        assert!(!statuses[0].warning);
    }

    #[tokio::test]
    async fn no_budgets_is_a_distinct_failure() {
        let user_id = Uuid::new_v4();
        let repo = MockRepository {
            transactions: vec![expense(user_id, "food", dec!(10), in_month())],
            ..MockRepository::default()
        };

        let result = compute(&repo, &user_id).await;

        assert!(matches!(result, Err(BudgetWarningError::NoBudgetsDefined)));
    }

    #[tokio::test]
    async fn statuses_keep_budget_load_order() {
        let user_id = Uuid::new_v4();
        let repo = MockRepository {
            budgets: vec![
                sample_budget(user_id, "zoo", dec!(10)),
                sample_budget(user_id, "apples", dec!(1000)),
                sample_budget(user_id, "music", dec!(50)),
            ],
            transactions: vec![expense(user_id, "apples", dec!(999), in_month())],
            ..MockRepository::default()
        };

        let statuses = compute(&repo, &user_id).await.unwrap();

        let categories: Vec<&str> = statuses.iter().map(|s| s.category.as_str()).collect();
        assert_eq!(categories, vec!["zoo", "apples", "music"]);
    }

    #[tokio::test]
    async fn other_users_data_is_ignored() {
        let user_id = Uuid::new_v4();
        let other_user = Uuid::new_v4();
        let repo = MockRepository {
            budgets: vec![sample_budget(user_id, "food", dec!(100)), sample_budget(other_user, "food", dec!(100))],
            transactions: vec![expense(other_user, "food", dec!(90), in_month())],
            ..MockRepository::default()
        };

        let statuses = compute(&repo, &user_id).await.unwrap();

        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].user, user_id);
        assert_eq!(statuses[0].spent, Decimal::ZERO);
    }

    #[tokio::test]
    async fn storage_failure_aborts_computation() {
        let user_id = Uuid::new_v4();
        let repo = MockRepository {
            budgets: vec![sample_budget(user_id, "food", dec!(100))],
            fail_transactions: true,
            ..MockRepository::default()
        };

        let result = compute(&repo, &user_id).await;

        assert!(matches!(result, Err(BudgetWarningError::StorageUnavailable { .. })));
    }

    #[tokio::test]
    async fn storage_failure_wins_over_empty_budgets() {
        let user_id = Uuid::new_v4();
        let repo = MockRepository {
            fail_budgets: true,
            ..MockRepository::default()
        };

        let result = compute(&repo, &user_id).await;

        assert!(matches!(result, Err(BudgetWarningError::StorageUnavailable { .. })));
    }

    #[tokio::test]
    async fn unrepresentable_reference_time_fails_before_storage() {
        let user_id = Uuid::new_v4();
        // Both reads would fail; the window error must come first.
        let repo = MockRepository {
            fail_budgets: true,
            fail_transactions: true,
            ..MockRepository::default()
        };
        let policy = WarningPolicy::default();

        let result = BudgetWarningEngine::new(&repo, &policy).compute_warnings(&user_id, DateTime::<Utc>::MAX_UTC).await;

        assert!(matches!(result, Err(BudgetWarningError::InvalidReferenceTime(_))));
    }

    /// Returns every stored expense regardless of the requested range.
    struct UnfilteredSource(MockRepository);

    #[async_trait::async_trait]
    impl BudgetWarningSource for UnfilteredSource {
        async fn list_budgets(&self, user_id: &Uuid) -> Result<Vec<Budget>, AppError> {
            self.0.list_budgets(user_id).await
        }

        async fn list_expense_transactions(&self, user_id: &Uuid, _range: &DateRange) -> Result<Vec<Transaction>, AppError> {
            Ok(self.0.transactions.iter().filter(|tx| tx.user_id == *user_id).cloned().collect())
        }
    }

    #[tokio::test]
    async fn expenses_outside_the_month_are_ignored_even_if_loaded() {
        let user_id = Uuid::new_v4();
        let source = UnfilteredSource(MockRepository {
            budgets: vec![sample_budget(user_id, "food", dec!(100))],
            transactions: vec![
                expense(user_id, "food", dec!(30), in_month()),
                expense(user_id, "food", dec!(90), Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap()),
                expense(user_id, "food", dec!(90), Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap()),
            ],
            ..MockRepository::default()
        });
        let policy = WarningPolicy::default();

        let statuses = BudgetWarningEngine::new(&source, &policy).compute_warnings(&user_id, reference_time()).await.unwrap();

        assert_eq!(statuses[0].spent, dec!(30));
        assert!(!statuses[0].warning);
    }

    #[tokio::test]
    async fn configured_timezone_moves_the_window() {
        let user_id = Uuid::new_v4();
        // 2024-03-01 03:00 UTC is still February in New York.
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 3, 0, 0).unwrap();
        let repo = MockRepository {
            budgets: vec![sample_budget(user_id, "food", dec!(100))],
            transactions: vec![
                expense(user_id, "food", dec!(40), Utc.with_ymd_and_hms(2024, 2, 15, 12, 0, 0).unwrap()),
                expense(user_id, "food", dec!(2), Utc.with_ymd_and_hms(2024, 3, 1, 1, 0, 0).unwrap()),
            ],
            ..MockRepository::default()
        };

        let utc_policy = WarningPolicy::default();
        let utc_statuses = BudgetWarningEngine::new(&repo, &utc_policy).compute_warnings(&user_id, now).await.unwrap();
        assert_eq!(utc_statuses[0].spent, dec!(2));

        let ny_policy = WarningPolicy::new(chrono_tz::America::New_York, DEFAULT_WARNING_THRESHOLD_PERCENT);
        let ny_statuses = BudgetWarningEngine::new(&repo, &ny_policy).compute_warnings(&user_id, now).await.unwrap();
        assert_eq!(ny_statuses[0].spent, dec!(42));
    }

    proptest! {
        #[test]
        fn warning_matches_eighty_percent_rule(limit_cents in 1i64..10_000_000, spent_cents in 0i64..20_000_000) {
            let limit = Decimal::new(limit_cents, 2);
            let spent = Decimal::new(spent_cents, 2);
            let expected = spent_cents * 10 >= limit_cents * 8;
            prop_assert_eq!(WarningPolicy::default().is_warning(spent, limit), expected);
        }
    }
}

//! Financial and attendance aggregation over the ledger and directory.

use super::store::{
    CategoryTotal, DateRange, DirectoryStore, InvoiceFilter, LedgerStore, PaymentFilter,
    PresenceFilter,
};
use crate::middleware::TenantContext;
use crate::models::{
    Child, ChildStatus, Invoice, InvoiceStatus, PaymentCategory, PaymentKind, PaymentStatus,
    Presence, PresenceKind, PresenceStatus, Staff, StaffStatus,
};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;
use service_core::error::AppError;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{instrument, warn};

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeriodBalance {
    pub income: i64,
    pub expense: i64,
    pub net: i64,
    /// `net / income * 100`, or 0 without income.
    pub margin_pct: f64,
}

impl PeriodBalance {
    pub fn from_totals(income: i64, expense: i64) -> Self {
        let net = income.saturating_sub(expense);
        let margin_pct = if income > 0 {
            round2(net as f64 / income as f64 * 100.0)
        } else {
            0.0
        };
        Self {
            income,
            expense,
            net,
            margin_pct,
        }
    }

    pub fn from_categories(totals: &[CategoryTotal]) -> Self {
        let (income, expense) =
            totals
                .iter()
                .fold((0i64, 0i64), |(income, expense), t| match t.kind {
                    PaymentKind::Income => (income.saturating_add(t.total), expense),
                    PaymentKind::Expense => (income, expense.saturating_add(t.total)),
                });
        Self::from_totals(income, expense)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyBalance {
    pub date: NaiveDate,
    pub income: i64,
    pub expense: i64,
    pub net: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SideTotals {
    pub total: i64,
    pub by_category: BTreeMap<PaymentCategory, i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinancialReport {
    pub range: DateRange,
    pub income: SideTotals,
    pub expense: SideTotals,
    pub balance: PeriodBalance,
    pub categories: Vec<CategoryTotal>,
}

impl FinancialReport {
    pub fn from_categories(range: DateRange, categories: Vec<CategoryTotal>) -> Self {
        let mut income = SideTotals::default();
        let mut expense = SideTotals::default();
        for total in &categories {
            let side = match total.kind {
                PaymentKind::Income => &mut income,
                PaymentKind::Expense => &mut expense,
            };
            side.total = side.total.saturating_add(total.total);
            let slot = side.by_category.entry(total.category).or_insert(0);
            *slot = slot.saturating_add(total.total);
        }
        Self {
            range,
            balance: PeriodBalance::from_totals(income.total, expense.total),
            income,
            expense,
            categories,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PresenceStats {
    /// Days the creche was open.
    pub total_days: u64,
    pub present_days: u64,
    pub absent_days: u64,
    pub presence_rate: f64,
}

impl PresenceStats {
    pub fn from_presences<'a>(presences: impl IntoIterator<Item = &'a Presence>) -> Self {
        let mut stats = PresenceStats::default();
        for presence in presences {
            if presence.status.is_closure() {
                continue;
            }
            stats.total_days += 1;
            match presence.status {
                PresenceStatus::Present => stats.present_days += 1,
                s if PresenceStatus::ABSENCES.contains(&s) => stats.absent_days += 1,
                _ => {}
            }
        }
        if stats.total_days > 0 {
            stats.presence_rate =
                round1(stats.present_days as f64 / stats.total_days as f64 * 100.0);
        }
        stats
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BillingStats {
    pub issued_invoices: u64,
    pub paid_invoices: u64,
    pub total_due: i64,
    pub total_paid: i64,
    pub balance_due: i64,
    pub paid_ratio: f64,
}

impl BillingStats {
    /// Cancelled invoices are not owed and are left out.
    pub fn from_invoices<'a>(invoices: impl IntoIterator<Item = &'a Invoice>) -> Self {
        let mut stats = BillingStats::default();
        for invoice in invoices {
            if invoice.status == InvoiceStatus::Cancelled {
                continue;
            }
            stats.issued_invoices += 1;
            stats.total_due = stats.total_due.saturating_add(invoice.amount);
            if invoice.status == InvoiceStatus::Paid {
                stats.paid_invoices += 1;
                stats.total_paid = stats.total_paid.saturating_add(invoice.amount);
            }
        }
        stats.balance_due = stats.total_due.saturating_sub(stats.total_paid);
        if stats.total_due > 0 {
            stats.paid_ratio = round1(stats.total_paid as f64 / stats.total_due as f64 * 100.0);
        }
        stats
    }
}

#[derive(Debug, Clone)]
pub struct ChildReport {
    pub child: Child,
    pub presence: PresenceStats,
    pub billing: BillingStats,
}

#[derive(Debug, Clone)]
pub struct StaffReport {
    pub staff: Staff,
    pub presence: PresenceStats,
    pub salaries_paid: i64,
    pub last_salary_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    OverduePayments,
    RepeatedAbsences,
    CapacityWarning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Info,
    Warning,
    Danger,
}

/// Advisory dashboard entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub level: AlertLevel,
    pub message: String,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct HeadCount {
    pub active: u64,
    pub present_today: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub children: HeadCount,
    pub staff: HeadCount,
    pub today: DailyBalance,
    pub month: PeriodBalance,
    pub alerts: Vec<Alert>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardCharts {
    pub range: DateRange,
    pub daily: Vec<DailyBalance>,
    pub categories: Vec<CategoryTotal>,
}

/// Children with at least this many absences in the trailing window are
/// flagged.
pub const REPEATED_ABSENCE_THRESHOLD: usize = 3;
pub const ABSENCE_WINDOW_DAYS: i64 = 7;
pub const DEFAULT_CHART_DAYS: i64 = 30;
pub const MAX_CHART_DAYS: i64 = 366;

#[derive(Clone)]
pub struct ReportingService {
    ledger: Arc<dyn LedgerStore>,
    directory: Arc<dyn DirectoryStore>,
}

impl ReportingService {
    pub fn new(ledger: Arc<dyn LedgerStore>, directory: Arc<dyn DirectoryStore>) -> Self {
        Self { ledger, directory }
    }

    #[instrument(skip(self, tenant), fields(service = "creche-service", creche_id = %tenant.creche_id))]
    pub async fn daily_balance(
        &self,
        tenant: &TenantContext,
        day: NaiveDate,
    ) -> Result<DailyBalance, AppError> {
        let totals = self
            .ledger
            .category_totals(&tenant.creche_id, &DateRange::day(day))
            .await?;
        let balance = PeriodBalance::from_categories(&totals);
        Ok(DailyBalance {
            date: day,
            income: balance.income,
            expense: balance.expense,
            net: balance.net,
        })
    }

    pub async fn period_balance(
        &self,
        tenant: &TenantContext,
        range: &DateRange,
    ) -> Result<PeriodBalance, AppError> {
        let totals = self.ledger.category_totals(&tenant.creche_id, range).await?;
        Ok(PeriodBalance::from_categories(&totals))
    }

    pub async fn category_breakdown(
        &self,
        tenant: &TenantContext,
        range: &DateRange,
    ) -> Result<Vec<CategoryTotal>, AppError> {
        self.ledger.category_totals(&tenant.creche_id, range).await
    }

    #[instrument(skip(self, tenant), fields(service = "creche-service", creche_id = %tenant.creche_id))]
    pub async fn financial_report(
        &self,
        tenant: &TenantContext,
        range: DateRange,
    ) -> Result<FinancialReport, AppError> {
        let categories = self.ledger.category_totals(&tenant.creche_id, &range).await?;
        Ok(FinancialReport::from_categories(range, categories))
    }

    async fn report_for_child(
        &self,
        tenant: &TenantContext,
        child: Child,
        range: &DateRange,
    ) -> Result<ChildReport, AppError> {
        let presences = self
            .directory
            .list_presences(
                &tenant.creche_id,
                &PresenceFilter {
                    kind: Some(PresenceKind::Child),
                    child_id: Some(child.id.clone()),
                    range: Some(*range),
                    ..Default::default()
                },
            )
            .await?;
        let invoices = self
            .ledger
            .list_invoices(
                &tenant.creche_id,
                &InvoiceFilter {
                    child_id: Some(child.id.clone()),
                    created: Some(*range),
                    ..Default::default()
                },
            )
            .await?;
        Ok(ChildReport {
            child,
            presence: PresenceStats::from_presences(&presences),
            billing: BillingStats::from_invoices(&invoices),
        })
    }

    pub async fn child_report(
        &self,
        tenant: &TenantContext,
        child_id: &str,
        range: &DateRange,
    ) -> Result<ChildReport, AppError> {
        let child = self
            .directory
            .get_child(&tenant.creche_id, child_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("child {} not found", child_id)))?;
        self.report_for_child(tenant, child, range).await
    }

    /// Per-child report for every active child.
    pub async fn children_report(
        &self,
        tenant: &TenantContext,
        range: &DateRange,
    ) -> Result<Vec<ChildReport>, AppError> {
        let children = self
            .directory
            .list_children(&tenant.creche_id, Some(ChildStatus::Active))
            .await?;
        let mut reports = Vec::with_capacity(children.len());
        for child in children {
            reports.push(self.report_for_child(tenant, child, range).await?);
        }
        Ok(reports)
    }

    pub async fn staff_report(
        &self,
        tenant: &TenantContext,
        range: &DateRange,
    ) -> Result<Vec<StaffReport>, AppError> {
        let staff = self.directory.list_staff(&tenant.creche_id, None).await?;
        let mut reports = Vec::with_capacity(staff.len());
        for member in staff {
            let presences = self
                .directory
                .list_presences(
                    &tenant.creche_id,
                    &PresenceFilter {
                        kind: Some(PresenceKind::Staff),
                        staff_id: Some(member.id.clone()),
                        range: Some(*range),
                        ..Default::default()
                    },
                )
                .await?;
            let salaries = self
                .ledger
                .list_payments(
                    &tenant.creche_id,
                    &PaymentFilter {
                        category: Some(PaymentCategory::Salaries),
                        staff_id: Some(member.id.clone()),
                        statuses: vec![PaymentStatus::Paid, PaymentStatus::Partial],
                        ..Default::default()
                    },
                )
                .await?;
            let salaries_paid = salaries
                .iter()
                .filter(|p| range.contains(p.date))
                .fold(0i64, |sum, p| sum.saturating_add(p.amount_paid));
            reports.push(StaffReport {
                presence: PresenceStats::from_presences(&presences),
                salaries_paid,
                last_salary_date: salaries.iter().map(|p| p.date).max(),
                staff: member,
            });
        }
        Ok(reports)
    }

    /// Each check runs on its own; a failing check is logged and skipped.
    #[instrument(skip(self, tenant), fields(service = "creche-service", creche_id = %tenant.creche_id))]
    pub async fn alerts(
        &self,
        tenant: &TenantContext,
        now: DateTime<Utc>,
    ) -> Result<Vec<Alert>, AppError> {
        let mut alerts = Vec::new();

        match self.overdue_alert(tenant, now).await {
            Ok(Some(alert)) => alerts.push(alert),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Overdue payment check failed"),
        }
        match self.absence_alert(tenant, now.date_naive()).await {
            Ok(Some(alert)) => alerts.push(alert),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Repeated absence check failed"),
        }
        match self.capacity_alert(tenant).await {
            Ok(Some(alert)) => alerts.push(alert),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Capacity check failed"),
        }

        Ok(alerts)
    }

    /// Open monthly fees for earlier months of the current year.
    async fn overdue_alert(
        &self,
        tenant: &TenantContext,
        now: DateTime<Utc>,
    ) -> Result<Option<Alert>, AppError> {
        let count = self
            .ledger
            .count_payments(
                &tenant.creche_id,
                &PaymentFilter {
                    category: Some(PaymentCategory::MonthlyFee),
                    statuses: vec![PaymentStatus::Pending, PaymentStatus::Partial],
                    period_year: Some(now.year()),
                    period_month_before: Some(now.month() as i32),
                    ..Default::default()
                },
            )
            .await?;
        Ok((count > 0).then(|| Alert {
            kind: AlertKind::OverduePayments,
            level: AlertLevel::Warning,
            message: format!("{} monthly fee(s) overdue", count),
            count,
        }))
    }

    async fn absence_alert(
        &self,
        tenant: &TenantContext,
        today: NaiveDate,
    ) -> Result<Option<Alert>, AppError> {
        let absences = self
            .directory
            .list_presences(
                &tenant.creche_id,
                &PresenceFilter {
                    kind: Some(PresenceKind::Child),
                    statuses: PresenceStatus::ABSENCES.to_vec(),
                    range: Some(DateRange::trailing_days(today, ABSENCE_WINDOW_DAYS)),
                    ..Default::default()
                },
            )
            .await?;

        let mut per_child: HashMap<&str, usize> = HashMap::new();
        for absence in &absences {
            if let Some(child_id) = absence.child_id.as_deref() {
                *per_child.entry(child_id).or_insert(0) += 1;
            }
        }
        let flagged = per_child
            .values()
            .filter(|n| **n >= REPEATED_ABSENCE_THRESHOLD)
            .count() as u64;

        Ok((flagged > 0).then(|| Alert {
            kind: AlertKind::RepeatedAbsences,
            level: AlertLevel::Danger,
            message: format!(
                "{} child(ren) absent {} or more times in the last {} days",
                flagged, REPEATED_ABSENCE_THRESHOLD, ABSENCE_WINDOW_DAYS
            ),
            count: flagged,
        }))
    }

    async fn capacity_alert(&self, tenant: &TenantContext) -> Result<Option<Alert>, AppError> {
        let Some(creche) = self.directory.get_creche(&tenant.creche_id).await? else {
            return Ok(None);
        };
        let active = self
            .directory
            .count_children(&tenant.creche_id, Some(ChildStatus::Active))
            .await?;
        Ok(creche.is_near_capacity(active).then(|| Alert {
            kind: AlertKind::CapacityWarning,
            level: AlertLevel::Info,
            message: format!(
                "{} active children for a capacity of {}",
                active, creche.max_capacity
            ),
            count: active,
        }))
    }

    pub async fn dashboard_stats(
        &self,
        tenant: &TenantContext,
        now: DateTime<Utc>,
    ) -> Result<DashboardStats, AppError> {
        let today = now.date_naive();
        let today_range = DateRange::day(today);

        let active_children = self
            .directory
            .count_children(&tenant.creche_id, Some(ChildStatus::Active))
            .await?;
        let active_staff = self
            .directory
            .list_staff(&tenant.creche_id, Some(StaffStatus::Active))
            .await?
            .len() as u64;
        let present = self
            .directory
            .list_presences(
                &tenant.creche_id,
                &PresenceFilter {
                    statuses: vec![PresenceStatus::Present],
                    range: Some(today_range),
                    ..Default::default()
                },
            )
            .await?;
        let children_present = present
            .iter()
            .filter(|p| p.kind == PresenceKind::Child)
            .count() as u64;
        let staff_present = present.len() as u64 - children_present;

        let month_start = NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today);
        let month = self
            .period_balance(tenant, &DateRange::days(month_start, today)?)
            .await?;

        Ok(DashboardStats {
            children: HeadCount {
                active: active_children,
                present_today: children_present,
            },
            staff: HeadCount {
                active: active_staff,
                present_today: staff_present,
            },
            today: self.daily_balance(tenant, today).await?,
            month,
            alerts: self.alerts(tenant, now).await?,
        })
    }

    /// Daily income/expense series and category breakdown over the
    /// trailing `days` days.
    pub async fn dashboard_charts(
        &self,
        tenant: &TenantContext,
        days: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<DashboardCharts, AppError> {
        let days = days.unwrap_or(DEFAULT_CHART_DAYS).clamp(1, MAX_CHART_DAYS);
        let today = now.date_naive();
        let range = DateRange::trailing_days(today, days);

        let payments = self
            .ledger
            .list_payments(
                &tenant.creche_id,
                &PaymentFilter {
                    statuses: vec![
                        PaymentStatus::Paid,
                        PaymentStatus::Partial,
                        PaymentStatus::Pending,
                    ],
                    range: Some(range),
                    ..Default::default()
                },
            )
            .await?;

        let mut by_day: BTreeMap<NaiveDate, (i64, i64)> = (0..days)
            .map(|offset| (today - Duration::days(days - 1 - offset), (0, 0)))
            .collect();
        for payment in &payments {
            let entry = by_day.entry(payment.date.date_naive()).or_insert((0, 0));
            match payment.kind {
                PaymentKind::Income => entry.0 = entry.0.saturating_add(payment.amount_paid),
                PaymentKind::Expense => entry.1 = entry.1.saturating_add(payment.amount_paid),
            }
        }
        let daily = by_day
            .into_iter()
            .map(|(date, (income, expense))| DailyBalance {
                date,
                income,
                expense,
                net: income.saturating_sub(expense),
            })
            .collect();

        Ok(DashboardCharts {
            range,
            daily,
            categories: super::store::fold_category_totals(&payments),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InvoiceDraft, InvoiceType, Period, MAX_AMOUNT};
    use proptest::prelude::*;

    fn presence(status: PresenceStatus) -> Presence {
        Presence::new(
            "creche-1".into(),
            PresenceKind::Child,
            "child-1".into(),
            NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
            status,
            None,
            "user-1".into(),
        )
    }

    fn invoice(amount: i64, status: InvoiceStatus) -> Invoice {
        let mut invoice = Invoice::pending(InvoiceDraft {
            creche_id: "creche-1".into(),
            child_id: "child-1".into(),
            period: Period { month: 3, year: 2025 },
            amount,
            invoice_type: InvoiceType::MonthlyFee,
            description: None,
        })
        .unwrap();
        invoice.status = status;
        invoice
    }

    #[test]
    fn margin_is_zero_without_income() {
        let balance = PeriodBalance::from_totals(0, 5_000);
        assert_eq!(balance.net, -5_000);
        assert_eq!(balance.margin_pct, 0.0);
    }

    #[test]
    fn margin_is_share_of_income() {
        let balance = PeriodBalance::from_totals(200_000, 50_000);
        assert_eq!(balance.net, 150_000);
        assert_eq!(balance.margin_pct, 75.0);
    }

    #[test]
    fn presence_rate_skips_closures_and_rounds() {
        let presences = vec![
            presence(PresenceStatus::Present),
            presence(PresenceStatus::Present),
            presence(PresenceStatus::Absent),
            presence(PresenceStatus::Holiday),
            presence(PresenceStatus::Vacation),
        ];
        let stats = PresenceStats::from_presences(&presences);
        assert_eq!(stats.total_days, 3);
        assert_eq!(stats.present_days, 2);
        assert_eq!(stats.absent_days, 1);
        assert_eq!(stats.presence_rate, 66.7);
    }

    #[test]
    fn presence_rate_is_zero_without_open_days() {
        let stats = PresenceStats::from_presences(&[presence(PresenceStatus::Holiday)]);
        assert_eq!(stats.total_days, 0);
        assert_eq!(stats.presence_rate, 0.0);
    }

    #[test]
    fn billing_stats_ignore_cancelled_invoices() {
        let invoices = vec![
            invoice(100, InvoiceStatus::Paid),
            invoice(200, InvoiceStatus::Pending),
            invoice(999, InvoiceStatus::Cancelled),
        ];
        let stats = BillingStats::from_invoices(&invoices);
        assert_eq!(stats.issued_invoices, 2);
        assert_eq!(stats.paid_invoices, 1);
        assert_eq!(stats.total_due, 300);
        assert_eq!(stats.total_paid, 100);
        assert_eq!(stats.balance_due, 200);
        assert_eq!(stats.paid_ratio, 33.3);
    }

    #[test]
    fn financial_report_splits_sides() {
        let range = DateRange::day(NaiveDate::from_ymd_opt(2025, 3, 3).unwrap());
        let report = FinancialReport::from_categories(
            range,
            vec![
                CategoryTotal {
                    kind: PaymentKind::Income,
                    category: PaymentCategory::MonthlyFee,
                    total: 300,
                    count: 2,
                },
                CategoryTotal {
                    kind: PaymentKind::Expense,
                    category: PaymentCategory::Food,
                    total: 120,
                    count: 1,
                },
            ],
        );
        assert_eq!(report.income.total, 300);
        assert_eq!(report.expense.total, 120);
        assert_eq!(report.income.by_category[&PaymentCategory::MonthlyFee], 300);
        assert_eq!(report.balance.net, 180);
        assert_eq!(report.balance.margin_pct, 60.0);
    }

    #[test]
    fn oversized_totals_saturate() {
        let huge = |kind, category| CategoryTotal {
            kind,
            category,
            total: i64::MAX,
            count: 1,
        };
        let totals = vec![
            huge(PaymentKind::Income, PaymentCategory::OtherIncome),
            huge(PaymentKind::Income, PaymentCategory::MonthlyFee),
            huge(PaymentKind::Expense, PaymentCategory::Rent),
        ];

        let balance = PeriodBalance::from_categories(&totals);
        assert_eq!(balance.income, i64::MAX);
        assert_eq!(balance.expense, i64::MAX);
        assert_eq!(balance.net, 0);

        let range = DateRange::day(NaiveDate::from_ymd_opt(2025, 3, 3).unwrap());
        let report = FinancialReport::from_categories(range, totals);
        assert_eq!(report.income.total, i64::MAX);

        let stats = BillingStats::from_invoices(&[
            invoice(MAX_AMOUNT, InvoiceStatus::Pending),
            invoice(MAX_AMOUNT, InvoiceStatus::Paid),
        ]);
        assert_eq!(stats.total_due, 2 * MAX_AMOUNT);
        assert_eq!(stats.balance_due, MAX_AMOUNT);
    }

    proptest! {
        #[test]
        fn balance_is_income_minus_expense(
            incomes in proptest::collection::vec(0i64..10_000_000, 0..20),
            expenses in proptest::collection::vec(0i64..10_000_000, 0..20),
        ) {
            let income: i64 = incomes.iter().sum();
            let expense: i64 = expenses.iter().sum();
            let balance = PeriodBalance::from_totals(income, expense);

            prop_assert_eq!(balance.net, income - expense);
            if income == 0 {
                prop_assert_eq!(balance.margin_pct, 0.0);
            } else {
                prop_assert!(balance.margin_pct <= 100.0);
            }
        }

        #[test]
        fn category_fold_matches_totals(
            amounts in proptest::collection::vec((any::<bool>(), 0i64..1_000_000), 0..30),
        ) {
            let totals: Vec<CategoryTotal> = amounts
                .iter()
                .map(|(is_income, amount)| CategoryTotal {
                    kind: if *is_income { PaymentKind::Income } else { PaymentKind::Expense },
                    category: if *is_income { PaymentCategory::OtherIncome } else { PaymentCategory::OtherExpense },
                    total: *amount,
                    count: 1,
                })
                .collect();
            let income: i64 = amounts.iter().filter(|(i, _)| *i).map(|(_, a)| a).sum();
            let expense: i64 = amounts.iter().filter(|(i, _)| !*i).map(|(_, a)| a).sum();

            let balance = PeriodBalance::from_categories(&totals);
            prop_assert_eq!(balance.income, income);
            prop_assert_eq!(balance.expense, expense);
            prop_assert_eq!(balance.net, income - expense);
        }
    }
}

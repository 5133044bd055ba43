// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::aggregate::{
    filter_by_period, filter_by_year, recent_activity, total_by_kind, totals_by_category,
    CategoryTotals, Diagnostics, RecentActivity,
};
use crate::convert::ConversionContext;
use crate::models::{Kind, Transaction};
use crate::rates::RateProvider;
use chrono::{Duration, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub balance: Decimal,
    pub currency: String,
    pub rates_as_of: NaiveDateTime,
    pub diagnostics: Diagnostics,
    pub warning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub all_time: Summary,
    pub month: Summary,
    pub period: String,
    pub by_category: CategoryTotals,
    pub recent: RecentActivity,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetStatus {
    pub year: i32,
    pub budget: Decimal,
    pub spent: Decimal,
    pub remaining: Decimal,
    pub currency: String,
    pub diagnostics: Diagnostics,
    pub warning: Option<String>,
}

/// Answers "what are my totals in currency X" over whatever store the
/// transactions came from. Each call takes a single rate snapshot up front and
/// runs every sum against it.
pub struct SummaryService {
    rates: RateProvider,
    max_age: Option<Duration>,
}

impl SummaryService {
    pub fn new(rates: RateProvider) -> Self {
        Self {
            rates,
            max_age: None,
        }
    }

    /// Refresh before answering when the cached table is older than this.
    pub fn with_max_age(mut self, max_age: Option<Duration>) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn rates(&self) -> &RateProvider {
        &self.rates
    }

    /// Pin one snapshot for `target`.
    pub fn context(&self, target: &str) -> (ConversionContext, Option<String>) {
        let fresh = self.rates.ensure_fresh(self.max_age);
        (ConversionContext::new(target, fresh.snapshot), fresh.warning)
    }

    pub fn get_summary(&self, transactions: &[Transaction], target: &str) -> Summary {
        let (ctx, warning) = self.context(target);
        let mut summary = Self::summarize_with(transactions, &ctx);
        summary.warning = warning;
        summary
    }

    /// Income, expense and balance against an already pinned snapshot.
    pub fn summarize_with(transactions: &[Transaction], ctx: &ConversionContext) -> Summary {
        let income = total_by_kind(transactions, Kind::Income, &ctx.target, &ctx.snapshot);
        let expense = total_by_kind(transactions, Kind::Expense, &ctx.target, &ctx.snapshot);
        let mut diagnostics = income.diagnostics.clone();
        diagnostics.merge(&expense.diagnostics);
        Summary {
            total_income: income.amount,
            total_expense: expense.amount,
            // Totals are non-negative, so this never saturates
            balance: income.amount.saturating_sub(expense.amount),
            currency: ctx.target.clone(),
            rates_as_of: ctx.snapshot.as_of(),
            diagnostics,
            warning: None,
        }
    }

    pub fn category_breakdown(&self, transactions: &[Transaction], target: &str) -> CategoryTotals {
        let (ctx, warning) = self.context(target);
        let mut totals = totals_by_category(transactions, &ctx.target, &ctx.snapshot);
        totals.warning = warning;
        totals
    }

    pub fn recent(&self, transactions: &[Transaction], target: &str, limit: usize) -> RecentActivity {
        let (ctx, warning) = self.context(target);
        let mut recent = recent_activity(transactions, limit, &ctx.target, &ctx.snapshot);
        recent.warning = warning;
        recent
    }

    /// Summary of one calendar month, computed from the filtered subset.
    pub fn month_summary(
        &self,
        transactions: &[Transaction],
        target: &str,
        month: u32,
        year: i32,
    ) -> Summary {
        self.get_summary(&filter_by_period(transactions, month, year), target)
    }

    /// Everything the overview screen shows, from one snapshot. The month
    /// figures are summed afresh from that month's transactions.
    pub fn dashboard(
        &self,
        transactions: &[Transaction],
        target: &str,
        month: u32,
        year: i32,
        recent: usize,
    ) -> Dashboard {
        let (ctx, warning) = self.context(target);
        let mut all_time = Self::summarize_with(transactions, &ctx);
        all_time.warning = warning.clone();
        let mut month_view = Self::summarize_with(&filter_by_period(transactions, month, year), &ctx);
        month_view.warning = warning.clone();
        let mut by_category = totals_by_category(transactions, &ctx.target, &ctx.snapshot);
        by_category.warning = warning.clone();
        let mut recent = recent_activity(transactions, recent, &ctx.target, &ctx.snapshot);
        recent.warning = warning;
        Dashboard {
            all_time,
            month: month_view,
            period: format!("{:04}-{:02}", year, month),
            by_category,
            recent,
        }
    }

    /// Expenses of `year` against an annual budget held in `target`.
    pub fn annual_budget(
        &self,
        transactions: &[Transaction],
        target: &str,
        year: i32,
        budget: Decimal,
    ) -> BudgetStatus {
        let (ctx, warning) = self.context(target);
        let spent = total_by_kind(
            &filter_by_year(transactions, year),
            Kind::Expense,
            &ctx.target,
            &ctx.snapshot,
        );
        BudgetStatus {
            year,
            budget,
            spent: spent.amount,
            remaining: budget.saturating_sub(spent.amount),
            currency: ctx.target,
            diagnostics: spent.diagnostics,
            warning,
        }
    }
}

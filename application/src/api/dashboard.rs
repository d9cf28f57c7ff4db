//! Dashboard REST API definitions.

use axum::{Extension, Json};
use common::{DateTime, Money};
use serde::Serialize;
use service::{query, Query as _};

use crate::{api, AsError, Error, Service};

/// Occupancy and financial summary of the boarding house.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Summary {
    /// Total number of `Room`s.
    pub total_rooms: i64,

    /// Number of occupied `Room`s.
    pub occupied_rooms: i64,

    /// Number of `Room`s nobody lives in.
    pub empty_rooms: i64,

    /// Sum of the `Payment`s paid during the current month.
    pub monthly_income: Money,

    /// Sum of the `Expense`s spent during the current month.
    pub monthly_expense: Money,

    /// Monthly income minus monthly expense.
    pub profit: Money,

    /// Number of overdue `Payment`s.
    pub overdue_payments: i64,

    /// Number of active `Tenant`s.
    pub active_tenants: i64,
}

impl From<query::dashboard::Summary> for Summary {
    fn from(summary: query::dashboard::Summary) -> Self {
        Self {
            total_rooms: summary.total_rooms.into(),
            occupied_rooms: summary.occupied_rooms.into(),
            empty_rooms: summary.empty_rooms.into(),
            monthly_income: summary.monthly_income,
            monthly_expense: summary.monthly_expense,
            profit: summary.profit,
            overdue_payments: summary.overdue_payments.into(),
            active_tenants: summary.active_tenants.into(),
        }
    }
}

/// Aggregates the [`Summary`] of the current month.
#[tracing::instrument(skip_all, fields(otel.name = api::SPAN_NAME))]
pub async fn summary(
    Extension(service): Extension<Service>,
) -> Result<Json<Summary>, Error> {
    service
        .execute(query::Dashboard {
            now: DateTime::now(),
        })
        .await
        .map_err(AsError::into_error)
        .map(|s| Json(s.into()))
}

impl AsError for query::dashboard::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
        }
    }
}

//! [`Payment`]-related REST API definitions.

use axum::{extract::Path, Extension, Json};
use axum_extra::extract::WithRejection;
use common::{DateTime, Money};
use serde::{Deserialize, Serialize};
use service::{
    command::{self, Command as _},
    domain::{self, payment, tenant},
    query, read, Query as _,
};

use crate::{api, define_error, AsError, Error, Service};

/// A rent payment of a tenant.
#[derive(Clone, Debug, Serialize)]
pub struct Payment {
    /// Unique identifier of this `Payment`.
    pub id: payment::Id,

    /// ID of the `Tenant` this `Payment` belongs to.
    pub tenant_id: tenant::Id,

    /// Amount of this `Payment`.
    pub amount: Money,

    /// `DateTime` this `Payment` is due at.
    pub due_date: DateTime,

    /// `DateTime` this `Payment` was paid at, if it was.
    pub paid_at: Option<DateTime>,

    /// Lifecycle status of this `Payment`.
    pub status: payment::Status,

    /// Method this `Payment` was paid with.
    pub method: String,

    /// `DateTime` when this `Payment` was created.
    pub created_at: DateTime,

    /// `DateTime` when this `Payment` was last modified.
    pub updated_at: DateTime,
}

impl From<domain::Payment> for Payment {
    fn from(payment: domain::Payment) -> Self {
        Self {
            id: payment.id,
            tenant_id: payment.tenant_id,
            amount: payment.amount,
            due_date: payment.due_date.coerce(),
            paid_at: payment.paid_at.map(|at| at.coerce()),
            status: payment.status,
            method: payment.method.to_string(),
            created_at: payment.created_at.coerce(),
            updated_at: payment.updated_at.coerce(),
        }
    }
}

/// Request body for creating or updating a [`Payment`].
///
/// Status is never accepted, but resolved from the dates.
#[derive(Clone, Debug, Deserialize)]
pub struct Input {
    /// ID of the `Tenant` the `Payment` belongs to.
    pub tenant_id: tenant::Id,

    /// Amount of the `Payment`.
    pub amount: Money,

    /// `DateTime` the `Payment` is due at.
    pub due_date: DateTime,

    /// `DateTime` the `Payment` was paid at, if it was.
    #[serde(default)]
    pub paid_at: Option<DateTime>,

    /// Method the `Payment` was paid with.
    #[serde(default)]
    pub method: String,
}

impl Input {
    /// Converts this [`Input`] into a [`command::SavePayment`] at the provided
    /// `now`.
    fn into_command(
        self,
        id: Option<payment::Id>,
        now: DateTime,
    ) -> Result<command::SavePayment, Error> {
        let Self {
            tenant_id,
            amount,
            due_date,
            paid_at,
            method,
        } = self;

        Ok(command::SavePayment {
            id,
            tenant_id,
            amount,
            due_date: due_date.coerce(),
            paid_at: paid_at.map(DateTime::coerce),
            method: api::parse("method", &method)?,
            now,
        })
    }
}

/// Lists all the [`Payment`]s ordered by their due dates.
#[tracing::instrument(skip_all, fields(otel.name = api::SPAN_NAME))]
pub async fn list(
    Extension(service): Extension<Service>,
) -> Result<Json<Vec<Payment>>, Error> {
    let payments = service
        .execute(query::payment::List::by(()))
        .await
        .map_err(AsError::into_error)?;
    Ok(Json(payments.into_iter().map(Into::into).collect()))
}

/// Lists all the [`Payment`]s of a `Tenant` ordered by their due dates.
#[tracing::instrument(skip_all, fields(%tenant_id, otel.name = api::SPAN_NAME))]
pub async fn by_tenant(
    Extension(service): Extension<Service>,
    WithRejection(Path(tenant_id), _): WithRejection<Path<tenant::Id>, Error>,
) -> Result<Json<Vec<Payment>>, Error> {
    let payments = service
        .execute(query::payment::ByTenant::by(tenant_id))
        .await
        .map_err(AsError::into_error)?;
    Ok(Json(payments.into_iter().map(Into::into).collect()))
}

/// Lists all the [`Payment`]s being overdue right now.
#[tracing::instrument(skip_all, fields(otel.name = api::SPAN_NAME))]
pub async fn overdue(
    Extension(service): Extension<Service>,
) -> Result<Json<Vec<Payment>>, Error> {
    let payments = service
        .execute(query::payment::Overdue::by(read::payment::OverdueAt(
            DateTime::now(),
        )))
        .await
        .map_err(AsError::into_error)?;
    Ok(Json(payments.into_iter().map(Into::into).collect()))
}

/// Returns a single [`Payment`].
///
/// # Errors
///
/// Possible error codes:
/// - `PAYMENT_NOT_EXISTS` - `Payment` with the provided ID does not exist.
#[tracing::instrument(skip_all, fields(%id, otel.name = api::SPAN_NAME))]
pub async fn get(
    Extension(service): Extension<Service>,
    WithRejection(Path(id), _): WithRejection<Path<payment::Id>, Error>,
) -> Result<Json<Payment>, Error> {
    service
        .execute(query::payment::ById::by(id))
        .await
        .map_err(AsError::into_error)?
        .map(|p| Json(p.into()))
        .ok_or_else(|| PaymentError::NotExists.into())
}

/// Creates a new [`Payment`], resolving its status right now.
///
/// # Errors
///
/// Possible error codes:
/// - `TENANT_NOT_EXISTS` - the `Tenant` of the `Payment` does not exist;
/// - `NEGATIVE_AMOUNT` - the amount is below zero.
#[tracing::instrument(
    skip_all,
    fields(tenant_id = %input.tenant_id, otel.name = api::SPAN_NAME),
)]
pub async fn create(
    Extension(service): Extension<Service>,
    WithRejection(Json(input), _): WithRejection<Json<Input>, Error>,
) -> Result<(http::StatusCode, Json<Payment>), Error> {
    let payment = service
        .execute(input.into_command(None, DateTime::now())?)
        .await
        .map_err(AsError::into_error)?;
    Ok((http::StatusCode::CREATED, Json(payment.into())))
}

/// Updates an existing [`Payment`], resolving its status right now.
///
/// # Errors
///
/// Possible error codes:
/// - `PAYMENT_NOT_EXISTS` - `Payment` with the provided ID does not exist;
/// - `TENANT_NOT_EXISTS` - the `Tenant` of the `Payment` does not exist;
/// - `NEGATIVE_AMOUNT` - the amount is below zero.
#[tracing::instrument(
    skip_all,
    fields(%id, tenant_id = %input.tenant_id, otel.name = api::SPAN_NAME),
)]
pub async fn update(
    Extension(service): Extension<Service>,
    WithRejection(Path(id), _): WithRejection<Path<payment::Id>, Error>,
    WithRejection(Json(input), _): WithRejection<Json<Input>, Error>,
) -> Result<Json<Payment>, Error> {
    service
        .execute(input.into_command(Some(id), DateTime::now())?)
        .await
        .map_err(AsError::into_error)
        .map(|p| Json(p.into()))
}

define_error! {
    enum PaymentError {
        #[code = "PAYMENT_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Payment` does not exist"]
        NotExists,

        #[code = "TENANT_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Tenant` does not exist"]
        TenantNotExists,

        #[code = "NEGATIVE_AMOUNT"]
        #[status = UNPROCESSABLE_ENTITY]
        #[message = "`Payment` amount cannot be negative"]
        NegativeAmount,
    }
}

impl AsError for command::save_payment::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NegativeAmount(_) => {
                Some(PaymentError::NegativeAmount.into())
            }
            Self::NotExists(_) => Some(PaymentError::NotExists.into()),
            Self::TenantNotExists(_) => {
                Some(PaymentError::TenantNotExists.into())
            }
        }
    }
}

//! [`Expense`]-related REST API definitions.

use axum::{extract::Path, Extension, Json};
use axum_extra::extract::WithRejection;
use common::{DateTime, Money};
use serde::{Deserialize, Serialize};
use service::{
    command::{self, Command as _},
    domain::{self, expense},
    query, Query as _,
};

use crate::{api, define_error, AsError, Error, Service};

/// An operational expense of the boarding house.
#[derive(Clone, Debug, Serialize)]
pub struct Expense {
    /// Unique identifier of this `Expense`.
    pub id: expense::Id,

    /// Description of this `Expense`.
    pub description: String,

    /// Amount spent.
    pub amount: Money,

    /// `DateTime` the money was spent at.
    pub date: DateTime,

    /// `DateTime` when this `Expense` was created.
    pub created_at: DateTime,

    /// `DateTime` when this `Expense` was last modified.
    pub updated_at: DateTime,
}

impl From<domain::Expense> for Expense {
    fn from(expense: domain::Expense) -> Self {
        Self {
            id: expense.id,
            description: expense.description.to_string(),
            amount: expense.amount,
            date: expense.date.coerce(),
            created_at: expense.created_at.coerce(),
            updated_at: expense.updated_at.coerce(),
        }
    }
}

/// Request body for creating or updating an [`Expense`].
#[derive(Clone, Debug, Deserialize)]
pub struct Input {
    /// Description of the `Expense`.
    pub description: String,

    /// Amount spent.
    pub amount: Money,

    /// `DateTime` the money was spent at.
    pub date: DateTime,
}

/// Lists all the [`Expense`]s, most recent first.
#[tracing::instrument(skip_all, fields(otel.name = api::SPAN_NAME))]
pub async fn list(
    Extension(service): Extension<Service>,
) -> Result<Json<Vec<Expense>>, Error> {
    let expenses = service
        .execute(query::expense::List::by(()))
        .await
        .map_err(AsError::into_error)?;
    Ok(Json(expenses.into_iter().map(Into::into).collect()))
}

/// Returns a single [`Expense`].
///
/// # Errors
///
/// Possible error codes:
/// - `EXPENSE_NOT_EXISTS` - `Expense` with the provided ID does not exist.
#[tracing::instrument(skip_all, fields(%id, otel.name = api::SPAN_NAME))]
pub async fn get(
    Extension(service): Extension<Service>,
    WithRejection(Path(id), _): WithRejection<Path<expense::Id>, Error>,
) -> Result<Json<Expense>, Error> {
    service
        .execute(query::expense::ById::by(id))
        .await
        .map_err(AsError::into_error)?
        .map(|e| Json(e.into()))
        .ok_or_else(|| ExpenseError::NotExists.into())
}

/// Records a new [`Expense`].
///
/// # Errors
///
/// Possible error codes:
/// - `NEGATIVE_AMOUNT` - the amount is below zero.
#[tracing::instrument(skip_all, fields(otel.name = api::SPAN_NAME))]
pub async fn create(
    Extension(service): Extension<Service>,
    WithRejection(Json(input), _): WithRejection<Json<Input>, Error>,
) -> Result<(http::StatusCode, Json<Expense>), Error> {
    let Input {
        description,
        amount,
        date,
    } = input;

    let expense = service
        .execute(command::CreateExpense {
            description: api::parse("description", &description)?,
            amount,
            date: date.coerce(),
        })
        .await
        .map_err(AsError::into_error)?;
    Ok((http::StatusCode::CREATED, Json(expense.into())))
}

/// Updates an existing [`Expense`].
///
/// # Errors
///
/// Possible error codes:
/// - `EXPENSE_NOT_EXISTS` - `Expense` with the provided ID does not exist;
/// - `NEGATIVE_AMOUNT` - the amount is below zero.
#[tracing::instrument(skip_all, fields(%id, otel.name = api::SPAN_NAME))]
pub async fn update(
    Extension(service): Extension<Service>,
    WithRejection(Path(id), _): WithRejection<Path<expense::Id>, Error>,
    WithRejection(Json(input), _): WithRejection<Json<Input>, Error>,
) -> Result<Json<Expense>, Error> {
    let Input {
        description,
        amount,
        date,
    } = input;

    service
        .execute(command::UpdateExpense {
            id,
            description: api::parse("description", &description)?,
            amount,
            date: date.coerce(),
        })
        .await
        .map_err(AsError::into_error)
        .map(|e| Json(e.into()))
}

/// Deletes an [`Expense`].
///
/// # Errors
///
/// Possible error codes:
/// - `EXPENSE_NOT_EXISTS` - `Expense` with the provided ID does not exist.
#[tracing::instrument(skip_all, fields(%id, otel.name = api::SPAN_NAME))]
pub async fn delete(
    Extension(service): Extension<Service>,
    WithRejection(Path(id), _): WithRejection<Path<expense::Id>, Error>,
) -> Result<http::StatusCode, Error> {
    service
        .execute(command::DeleteExpense { id })
        .await
        .map_err(AsError::into_error)
        .map(|()| http::StatusCode::NO_CONTENT)
}

define_error! {
    enum ExpenseError {
        #[code = "EXPENSE_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Expense` does not exist"]
        NotExists,

        #[code = "NEGATIVE_AMOUNT"]
        #[status = UNPROCESSABLE_ENTITY]
        #[message = "`Expense` amount cannot be negative"]
        NegativeAmount,
    }
}

impl AsError for command::create_expense::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NegativeAmount(_) => {
                Some(ExpenseError::NegativeAmount.into())
            }
        }
    }
}

impl AsError for command::update_expense::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NegativeAmount(_) => {
                Some(ExpenseError::NegativeAmount.into())
            }
            Self::NotExists(_) => Some(ExpenseError::NotExists.into()),
        }
    }
}

impl AsError for command::delete_expense::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NotExists(_) => Some(ExpenseError::NotExists.into()),
        }
    }
}

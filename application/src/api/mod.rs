//! REST API definitions.

pub mod dashboard;
pub mod expense;
pub mod payment;
pub mod room;
pub mod tenant;

use std::str::FromStr;

use axum::{
    routing::{get, put},
    Router,
};
use service::occupancy;

use crate::{define_error, AsError, Error};

/// Prefix of all the REST API routes.
pub const PREFIX: &str = "/api/v1";

/// Name of the [`tracing::Span`] for the REST API handlers.
const SPAN_NAME: &str = "REST API handler";

/// Builds the [`Router`] of the REST API, to be nested under [`PREFIX`].
#[must_use]
pub fn router() -> Router {
    Router::new()
        .route("/dashboard/summary", get(dashboard::summary))
        .route("/rooms", get(room::list).post(room::create))
        .route(
            "/rooms/:id",
            get(room::get).put(room::update).delete(room::delete),
        )
        .route("/rooms/:id/status", put(room::set_status))
        .route("/tenants", get(tenant::list).post(tenant::create))
        .route(
            "/tenants/:id",
            get(tenant::get).put(tenant::update).delete(tenant::delete),
        )
        .route("/payments", get(payment::list).post(payment::create))
        .route("/payments/overdue", get(payment::overdue))
        .route("/payments/tenant/:tenant_id", get(payment::by_tenant))
        .route("/payments/:id", get(payment::get).put(payment::update))
        .route("/expenses", get(expense::list).post(expense::create))
        .route(
            "/expenses/:id",
            get(expense::get)
                .put(expense::update)
                .delete(expense::delete),
        )
}

/// Parses the provided request `field` into a domain type.
///
/// # Errors
///
/// If the `value` doesn't match the format of the domain type.
fn parse<T>(field: &str, value: &str) -> Result<T, Error>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e| Error::invalid(field, &e))
}

impl AsError for occupancy::Error {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "ROOM_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`Room` does not exist"]
                RoomNotExists,

                #[code = "ROOM_OCCUPIED"]
                #[status = CONFLICT]
                #[message = "`Room` is occupied by another `Tenant`"]
                RoomOccupied,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::RoomNotExists(_) => Some(Error::RoomNotExists.into()),
            Self::RoomOccupied { .. } => Some(Error::RoomOccupied.into()),
        }
    }
}

//! Service contains the business logic of the application.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod command;
pub mod domain;
pub mod infra;
pub mod occupancy;
pub mod query;
pub mod read;

use derive_more::Display;
use tracerr::Traced;

#[cfg(doc)]
use infra::Database;

pub use self::{command::Command, query::Query};

/// Domain service.
#[derive(Clone, Debug)]
pub struct Service<Db> {
    /// [`Database`] of this [`Service`].
    database: Db,
}

impl<Db> Service<Db> {
    /// Creates a new [`Service`] on top of the provided [`Database`].
    #[must_use]
    pub fn new(database: Db) -> Self {
        Self { database }
    }

    /// Returns [`Database`] of this [`Service`].
    #[must_use]
    pub fn database(&self) -> &Db {
        &self.database
    }
}

/// Kind of a [`Command`] or [`Query`] failure.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum ErrorKind {
    /// Referenced entity does not exist.
    #[display("not found")]
    NotFound,

    /// Operation contradicts the current state of the entities.
    #[display("conflict")]
    Conflict,

    /// Malformed input reached the [`Service`].
    #[display("validation failed")]
    Validation,

    /// Underlying [`Database`] failed.
    #[display("dependency failed")]
    Dependency,
}

/// Classification of a failure into an [`ErrorKind`].
pub trait Classify {
    /// Returns the [`ErrorKind`] of this failure.
    fn kind(&self) -> ErrorKind;
}

impl<E: Classify> Classify for Traced<E> {
    fn kind(&self) -> ErrorKind {
        self.as_ref().kind()
    }
}

impl Classify for infra::database::Error {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Dependency
    }
}

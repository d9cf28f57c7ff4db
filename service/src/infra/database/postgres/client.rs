//! Postgres database clients definitions.

use std::{fmt, future::Future, sync::Arc};

use deadpool_postgres::{Client, Pool, Transaction};
use futures::{FutureExt as _, TryFutureExt as _};
use ouroboros::self_referencing;
use tokio::sync::{RwLock, RwLockReadGuard};
use tokio_postgres::{types::ToSql, Row, ToStatement};
use tracerr::Traced;

use crate::infra::database::{self, postgres};

/// Client an SQL statement is run with.
pub trait Connection {
    /// Runs the provided statement and returns all the resulting rows.
    ///
    /// # Errors
    ///
    /// If the statement fails or no connection could be retrieved.
    fn query<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = Result<Vec<Row>, Traced<database::Error>>>
    where
        T: ToStatement + ?Sized;

    /// Runs the provided statement and returns at most one resulting row.
    ///
    /// # Errors
    ///
    /// If the statement fails, returns more than one row, or no connection
    /// could be retrieved.
    fn query_opt<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = Result<Option<Row>, Traced<database::Error>>>
    where
        T: ToStatement + ?Sized;

    /// Runs the provided statement and returns the number of affected rows.
    ///
    /// # Errors
    ///
    /// If the statement fails or no connection could be retrieved.
    fn exec<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = Result<u64, Traced<database::Error>>>
    where
        T: ToStatement + ?Sized;
}

/// Non-transactional Postgres database client.
///
/// Every statement runs on a connection taken from the [`Pool`] for this
/// statement only.
#[derive(Clone, Debug)]
pub struct NonTx {
    /// [`Pool`] to take connections from.
    pub(crate) pool: Pool,
}

impl NonTx {
    /// Creates a new [`NonTx`] client on top of the provided [`Pool`].
    #[must_use]
    pub(crate) fn from_pool(pool: Pool) -> Self {
        Self { pool }
    }

    /// Takes a connection from the [`Pool`].
    pub(crate) async fn connection(
        &self,
    ) -> Result<Client, Traced<database::Error>> {
        self.pool
            .get()
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }
}

impl Connection for NonTx {
    async fn query<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        let conn = self.connection().await.map_err(tracerr::wrap!())?;
        conn.query(stmt, params)
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }

    async fn query_opt<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        let conn = self.connection().await.map_err(tracerr::wrap!())?;
        conn.query_opt(stmt, params)
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }

    async fn exec<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<u64, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        let conn = self.connection().await.map_err(tracerr::wrap!())?;
        conn.execute(stmt, params)
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }
}

/// Pooled connection with a [`Transaction`] begun on it.
///
/// Dropping it uncommitted rolls the [`Transaction`] back.
#[self_referencing]
struct Session {
    /// Connection owning the [`Transaction`].
    conn: Client,

    /// [`Transaction`] begun on the `conn`, until it's committed.
    #[borrows(mut conn)]
    #[not_covariant]
    tx: Option<Transaction<'this>>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}

impl Session {
    /// Begins a new [`Session`] on the provided connection.
    async fn begin(conn: Client) -> Result<Self, Traced<database::Error>> {
        Self::try_new_async_send(conn, |c| c.transaction().map_ok(Some).boxed())
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }

    /// Commits the [`Transaction`] of this [`Session`].
    async fn commit(mut self) -> Result<(), Traced<database::Error>> {
        #[expect(
            clippy::redundant_closure_for_method_calls,
            reason = "different variance, see \
                      https://doc.rust-lang.org/nomicon/subtyping.html#variance"
        )]
        let tx = self.with_tx_mut(|tx| tx.take());
        let Some(tx) = tx else {
            return Ok(());
        };
        tx.commit()
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }

    /// Returns the begun [`Transaction`] of this [`Session`].
    fn tx(&self) -> &Transaction<'_> {
        self.with_tx(|tx| tx.as_ref().expect("already committed"))
    }
}

/// Transactional Postgres database client.
///
/// The transaction is begun lazily on the first statement, and rolled back
/// if the last clone of this client is dropped before [`Tx::commit()`].
#[derive(Clone, Debug)]
pub struct Tx {
    /// [`Pool`] to take the connection from.
    pool: Pool,

    /// Lazily begun [`Session`].
    session: Arc<RwLock<Option<Session>>>,
}

impl Tx {
    /// Creates a new [`Tx`] client sharing the [`Pool`] of the provided
    /// [`NonTx`] client.
    #[must_use]
    pub fn from_non_tx(client: &NonTx) -> Self {
        Self {
            pool: client.pool.clone(),
            session: Arc::new(RwLock::new(None)),
        }
    }

    /// Returns the [`Session`] of this [`Tx`] client, beginning it if it's
    /// not yet.
    async fn session(
        &self,
    ) -> Result<RwLockReadGuard<'_, Session>, Traced<database::Error>> {
        let session = self.session.read().await;
        let guard = if session.is_none() {
            drop(session);

            let mut session = self.session.write().await;
            if session.is_none() {
                let conn = self
                    .pool
                    .get()
                    .await
                    .map_err(tracerr::from_and_wrap!(=> postgres::Error))
                    .map_err(tracerr::map_from)?;
                *session =
                    Some(Session::begin(conn).await.map_err(tracerr::wrap!())?);
            }

            session.downgrade()
        } else {
            session
        };

        Ok(RwLockReadGuard::map(guard, |s| {
            s.as_ref()
                .expect("session cannot be dropped while guard is alive")
        }))
    }

    /// Commits this [`Tx`] client.
    ///
    /// Next statement on this [`Tx`] client begins a new transaction.
    ///
    /// # Errors
    ///
    /// If failed to commit transaction of this [`Tx`] client.
    pub async fn commit(&self) -> Result<(), Traced<database::Error>> {
        let session = self.session.write().await.take();
        if let Some(s) = session {
            s.commit().await.map_err(tracerr::wrap!())
        } else {
            // Nothing was performed, so nothing to commit.
            Ok(())
        }
    }
}

impl Connection for Tx {
    async fn query<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        let session = self.session().await.map_err(tracerr::wrap!())?;
        session
            .tx()
            .query(stmt, params)
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }

    async fn query_opt<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        let session = self.session().await.map_err(tracerr::wrap!())?;
        session
            .tx()
            .query_opt(stmt, params)
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }

    async fn exec<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<u64, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        let session = self.session().await.map_err(tracerr::wrap!())?;
        session
            .tx()
            .execute(stmt, params)
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }
}

//! In-memory [`Database`] implementation.
//!
//! Keeps all the entities in process memory and serializes transactions:
//! a [`Tx`] holds the whole database exclusively until it's committed or
//! dropped. Used for tests and local experiments.

mod impls;

use std::{
    collections::{HashMap, HashSet},
    future::Future,
    sync::{self, Arc, PoisonError},
};

use derive_more::{Display, Error as StdError};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracerr::Traced;

use crate::{
    domain::{
        expense, payment, room, tenant, user, Expense, Payment, Room, Tenant,
        User,
    },
    infra::database,
};
#[cfg(doc)]
use crate::infra::Database;

/// In-memory [`Database`] client.
#[derive(Clone, Debug, Default)]
pub struct Memory<T = NonTx>(T);

impl Memory {
    /// Creates a new empty [`Memory`] database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following operation touching the provided [`Table`] fail
    /// with [`Error::Unavailable`], until [`Memory::recover()`] is called.
    ///
    /// Affects all the clones of this [`Memory`] database and the
    /// transactions started from them.
    pub fn fail_on(&self, table: Table) {
        _ = self.0.faults.lock().all.insert(table);
    }

    /// Same as [`Memory::fail_on()`], but breaks only the operations
    /// modifying the provided [`Table`], so it still can be read.
    pub fn fail_writes_on(&self, table: Table) {
        _ = self.0.faults.lock().writes.insert(table);
    }

    /// Stops failing operations previously broken with [`Memory::fail_on()`]
    /// or [`Memory::fail_writes_on()`].
    pub fn recover(&self) {
        *self.0.faults.lock() = FaultSet::default();
    }
}

/// Table of a [`Memory`] database.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Table {
    /// [`Room`]s table.
    #[display("rooms")]
    Rooms,

    /// [`Tenant`]s table.
    #[display("tenants")]
    Tenants,

    /// [`Payment`]s table.
    #[display("payments")]
    Payments,

    /// [`Expense`]s table.
    #[display("expenses")]
    Expenses,

    /// [`User`]s table.
    #[display("users")]
    Users,
}

/// Contents of a [`Memory`] database.
#[derive(Clone, Debug, Default)]
pub struct Tables {
    /// Stored [`Room`]s.
    rooms: HashMap<room::Id, Room>,

    /// Stored [`Tenant`]s.
    tenants: HashMap<tenant::Id, Tenant>,

    /// Stored [`Payment`]s.
    payments: HashMap<payment::Id, Payment>,

    /// Stored [`Expense`]s.
    expenses: HashMap<expense::Id, Expense>,

    /// Stored [`User`]s.
    users: HashMap<user::Id, User>,
}

/// [`Table`]s failing on access.
#[derive(Clone, Debug, Default)]
struct Faults(Arc<sync::Mutex<FaultSet>>);

/// Contents of [`Faults`].
#[derive(Debug, Default)]
struct FaultSet {
    /// [`Table`]s failing on any access.
    all: HashSet<Table>,

    /// [`Table`]s failing on writes only.
    writes: HashSet<Table>,
}

impl Faults {
    /// Locks this [`Faults`] set.
    fn lock(&self) -> sync::MutexGuard<'_, FaultSet> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Checks whether the provided [`Table`] is allowed to be accessed.
    fn check(
        &self,
        table: Table,
        write: bool,
    ) -> Result<(), Traced<database::Error>> {
        let faults = self.lock();
        if faults.all.contains(&table)
            || (write && faults.writes.contains(&table))
        {
            return Err(tracerr::new!(database::Error::from(
                Error::Unavailable(table)
            )));
        }
        Ok(())
    }
}

/// Non-transactional [`Memory`] database client.
#[derive(Clone, Debug, Default)]
pub struct NonTx {
    /// Committed [`Tables`].
    tables: Arc<Mutex<Tables>>,

    /// [`Faults`] injected into this client.
    faults: Faults,
}

/// Transactional [`Memory`] database client.
#[derive(Clone, Debug)]
pub struct Tx {
    /// Changes staged by this transaction, if it's not committed yet.
    staged: Arc<Mutex<Option<Staged>>>,

    /// [`Faults`] injected into the client this [`Tx`] was started from.
    faults: Faults,
}

/// Changes staged by a [`Tx`].
#[derive(Debug)]
struct Staged {
    /// Exclusively locked committed [`Tables`].
    committed: OwnedMutexGuard<Tables>,

    /// Working copy of the [`Tables`] being modified.
    tables: Tables,
}

impl Tx {
    /// Starts a new [`Tx`], waiting for any other one to finish.
    async fn begin(client: &NonTx) -> Self {
        let committed = Arc::clone(&client.tables).lock_owned().await;
        let tables = Tables::clone(&committed);
        Self {
            staged: Arc::new(Mutex::new(Some(Staged { committed, tables }))),
            faults: client.faults.clone(),
        }
    }

    /// Commits this [`Tx`], publishing all its changes at once.
    async fn commit(&self) {
        if let Some(Staged {
            mut committed,
            tables,
        }) = self.staged.lock().await.take()
        {
            *committed = tables;
        }
    }
}

/// Storage of [`Tables`] accessible by a [`Memory`] client.
pub trait Storage {
    /// Reads the [`Tables`] with the provided function.
    fn read<R>(
        &self,
        table: Table,
        f: impl FnOnce(&Tables) -> R,
    ) -> impl Future<Output = Result<R, Traced<database::Error>>>;

    /// Modifies the [`Tables`] with the provided function.
    ///
    /// The function must not modify anything before returning an [`Error`].
    fn write<R>(
        &self,
        table: Table,
        f: impl FnOnce(&mut Tables) -> Result<R, Error>,
    ) -> impl Future<Output = Result<R, Traced<database::Error>>>;
}

impl Storage for NonTx {
    async fn read<R>(
        &self,
        table: Table,
        f: impl FnOnce(&Tables) -> R,
    ) -> Result<R, Traced<database::Error>> {
        self.faults.check(table, false).map_err(tracerr::wrap!())?;
        Ok(f(&*self.tables.lock().await))
    }

    async fn write<R>(
        &self,
        table: Table,
        f: impl FnOnce(&mut Tables) -> Result<R, Error>,
    ) -> Result<R, Traced<database::Error>> {
        self.faults.check(table, true).map_err(tracerr::wrap!())?;
        f(&mut *self.tables.lock().await)
            .map_err(tracerr::from_and_wrap!(=> database::Error))
    }
}

impl Storage for Tx {
    async fn read<R>(
        &self,
        table: Table,
        f: impl FnOnce(&Tables) -> R,
    ) -> Result<R, Traced<database::Error>> {
        self.faults.check(table, false).map_err(tracerr::wrap!())?;
        let staged = self.staged.lock().await;
        Ok(f(&staged.as_ref().expect("already committed").tables))
    }

    async fn write<R>(
        &self,
        table: Table,
        f: impl FnOnce(&mut Tables) -> Result<R, Error>,
    ) -> Result<R, Traced<database::Error>> {
        self.faults.check(table, true).map_err(tracerr::wrap!())?;
        let mut staged = self.staged.lock().await;
        f(&mut staged.as_mut().expect("already committed").tables)
            .map_err(tracerr::from_and_wrap!(=> database::Error))
    }
}

/// [`Memory`] database [`Error`].
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum Error {
    /// [`Table`] is made unavailable with [`Memory::fail_on()`] or
    /// [`Memory::fail_writes_on()`].
    #[display("`{_0}` table is unavailable")]
    Unavailable(#[error(not(source))] Table),

    /// Unique constraint is violated.
    #[display("unique constraint `{_0}` is violated")]
    UniqueViolation(#[error(not(source))] &'static str),
}

impl Error {
    /// Checks if the error is a unique violation of the specified constraint.
    #[must_use]
    pub fn is_unique_violation(&self, constraint: Option<&str>) -> bool {
        match self {
            Self::UniqueViolation(c) => constraint.map_or(true, |e| e == *c),
            Self::Unavailable(_) => false,
        }
    }
}

#[cfg(test)]
mod spec {
    use common::{
        operations::{By, Commit, Delete, Select, Transact},
        Money,
    };

    use crate::{
        command::{self, fixture},
        domain::{expense, room, Room},
        infra::Database as _,
        query,
    };

    use super::Table;

    #[tokio::test]
    async fn rolls_back_dropped_transaction() {
        let svc = fixture::service();
        let room = fixture::room(&svc, "101").await;

        let tx = svc.database().execute(Transact).await.unwrap();
        tx.execute(Delete(By::<Room, _>::new(room.id))).await.unwrap();
        drop(tx);

        let stored = svc
            .database()
            .execute(Select(By::<Option<Room>, room::Id>::new(room.id)))
            .await
            .unwrap();
        assert!(stored.is_some());
    }

    #[tokio::test]
    async fn publishes_committed_transaction() {
        let svc = fixture::service();
        let room = fixture::room(&svc, "101").await;

        let tx = svc.database().execute(Transact).await.unwrap();
        tx.execute(Delete(By::<Room, _>::new(room.id))).await.unwrap();
        tx.execute(Commit).await.unwrap();
        drop(tx);

        let stored = svc
            .database()
            .execute(Select(By::<Option<Room>, room::Id>::new(room.id)))
            .await
            .unwrap();
        assert!(stored.is_none());
    }

    #[tokio::test]
    async fn keeps_reads_while_writes_fail() {
        let svc = fixture::service();
        let room = fixture::room(&svc, "101").await;
        svc.database().fail_writes_on(Table::Rooms);

        let found = svc.execute(query::room::ById::by(room.id)).await;
        let deleted = svc.execute(command::DeleteRoom { id: room.id }).await;

        assert!(found.unwrap().is_some());
        assert!(deleted.is_err());

        svc.database().recover();
        svc.execute(command::DeleteRoom { id: room.id }).await.unwrap();
    }

    #[tokio::test]
    async fn orders_rooms_and_expenses() {
        let svc = fixture::service();
        _ = fixture::room(&svc, "201").await;
        _ = fixture::room(&svc, "101").await;
        for date in ["2024-01-05T00:00:00Z", "2024-02-05T00:00:00Z"] {
            _ = svc
                .execute(command::CreateExpense {
                    description: expense::Description::new("Water").unwrap(),
                    amount: Money::from(50),
                    date: fixture::at(date).coerce(),
                })
                .await
                .unwrap();
        }

        let rooms = svc.execute(query::room::List::by(())).await.unwrap();
        let expenses =
            svc.execute(query::expense::List::by(())).await.unwrap();

        let numbers = rooms.iter().map(|r| r.number.to_string());
        assert_eq!(numbers.collect::<Vec<_>>(), ["101", "201"]);
        assert!(expenses[0].date > expenses[1].date);
    }
}

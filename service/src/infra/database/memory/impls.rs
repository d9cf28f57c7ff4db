//! [`Database`] implementations of [`Memory`].

use common::{
    operations::{By, Commit, Delete, Insert, Lock, Select, Transact, Update},
    Money,
};
use tracerr::Traced;

use crate::{
    domain::{
        expense, payment, room, tenant, user, Expense, Payment, Room, Tenant,
        User,
    },
    infra::{
        database::{self, ROOMS_NUMBER_KEY, USERS_EMAIL_KEY},
        Database,
    },
    read,
};

use super::{Error, Memory, NonTx, Storage, Table, Tables, Tx};

/// Converts the provided number of rows into their count.
fn count<T: From<i64>>(rows: usize) -> T {
    i64::try_from(rows).expect("count overflow").into()
}

impl Tables {
    /// Inserts or replaces the provided [`Room`], keeping its [`room::Number`]
    /// unique.
    fn put_room(&mut self, room: Room) -> Result<(), Error> {
        if self
            .rooms
            .values()
            .any(|r| r.id != room.id && r.number == room.number)
        {
            return Err(Error::UniqueViolation(ROOMS_NUMBER_KEY));
        }
        _ = self.rooms.insert(room.id, room);
        Ok(())
    }

    /// Inserts or replaces the provided [`User`], keeping its [`user::Email`]
    /// unique.
    fn put_user(&mut self, user: User) -> Result<(), Error> {
        if self
            .users
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(Error::UniqueViolation(USERS_EMAIL_KEY));
        }
        _ = self.users.insert(user.id, user);
        Ok(())
    }
}

impl Database<Transact> for Memory<NonTx> {
    type Ok = Memory<Tx>;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(Memory(Tx::begin(&self.0).await))
    }
}

impl Database<Transact> for Memory<Tx> {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Database<Commit> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        self.0.commit().await;
        Ok(())
    }
}

impl<S: Storage> Database<Insert<Room>> for Memory<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(room): Insert<Room>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .write(Table::Rooms, |t| t.put_room(room))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<S: Storage> Database<Update<Room>> for Memory<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(room): Update<Room>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .write(Table::Rooms, |t| t.put_room(room))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<S: Storage> Database<Update<room::StatusUpdate>> for Memory<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(upd): Update<room::StatusUpdate>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .write(Table::Rooms, |t| {
                if let Some(room) = t.rooms.get_mut(&upd.id) {
                    room.status = upd.status;
                    room.updated_at = upd.updated_at;
                }
                Ok(())
            })
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<S: Storage> Database<Delete<By<Room, room::Id>>> for Memory<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Room, room::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.0
            .write(Table::Rooms, |t| {
                _ = t.rooms.remove(&id);
                Ok(())
            })
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<S: Storage> Database<Select<By<Option<Room>, room::Id>>> for Memory<S> {
    type Ok = Option<Room>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Room>, room::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.0
            .read(Table::Rooms, |t| t.rooms.get(&id).cloned())
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<'n, S: Storage> Database<Select<By<Option<Room>, &'n room::Number>>>
    for Memory<S>
{
    type Ok = Option<Room>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Room>, &'n room::Number>>,
    ) -> Result<Self::Ok, Self::Err> {
        let number = by.into_inner();
        self.0
            .read(Table::Rooms, |t| {
                t.rooms.values().find(|r| r.number == *number).cloned()
            })
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<S: Storage> Database<Select<By<Vec<Room>, ()>>> for Memory<S> {
    type Ok = Vec<Room>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<Room>, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut rooms = self
            .0
            .read(Table::Rooms, |t| {
                t.rooms.values().cloned().collect::<Vec<_>>()
            })
            .await
            .map_err(tracerr::wrap!())?;
        rooms.sort_by(|a, b| a.number.cmp(&b.number));
        Ok(rooms)
    }
}

impl<S: Storage> Database<Select<By<read::room::Count, ()>>> for Memory<S> {
    type Ok = read::room::Count;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<read::room::Count, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .read(Table::Rooms, |t| count(t.rooms.len()))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<S: Storage> Database<Select<By<read::room::Count, room::Status>>>
    for Memory<S>
{
    type Ok = read::room::Count;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::room::Count, room::Status>>,
    ) -> Result<Self::Ok, Self::Err> {
        let status = by.into_inner();
        self.0
            .read(Table::Rooms, |t| {
                count(t.rooms.values().filter(|r| r.status == status).count())
            })
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<S: Storage> Database<Lock<By<Room, room::Id>>> for Memory<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Room, room::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // The whole `Tables` are locked by `Tx` already.
        self.0
            .read(Table::Rooms, |_| ())
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<S: Storage> Database<Insert<Tenant>> for Memory<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(tenant): Insert<Tenant>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .write(Table::Tenants, |t| {
                _ = t.tenants.insert(tenant.id, tenant);
                Ok(())
            })
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<S: Storage> Database<Update<Tenant>> for Memory<S>
where
    Self: Database<Insert<Tenant>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(tenant): Update<Tenant>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Insert(tenant)).await.map_err(tracerr::wrap!())
    }
}

impl<S: Storage> Database<Delete<By<Tenant, tenant::Id>>> for Memory<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Tenant, tenant::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.0
            .write(Table::Tenants, |t| {
                if t.tenants.remove(&id).is_some() {
                    t.payments.retain(|_, p| p.tenant_id != id);
                }
                Ok(())
            })
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<S: Storage> Database<Select<By<Option<Tenant>, tenant::Id>>>
    for Memory<S>
{
    type Ok = Option<Tenant>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Tenant>, tenant::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.0
            .read(Table::Tenants, |t| t.tenants.get(&id).cloned())
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<S: Storage> Database<Select<By<Option<Tenant>, room::Id>>> for Memory<S> {
    type Ok = Option<Tenant>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Tenant>, room::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let room_id = by.into_inner();
        self.0
            .read(Table::Tenants, |t| {
                t.tenants
                    .values()
                    .filter(|tn| tn.room_id == Some(room_id))
                    .min_by_key(|tn| (tn.created_at, tn.id))
                    .cloned()
            })
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<S: Storage> Database<Select<By<Vec<Tenant>, ()>>> for Memory<S> {
    type Ok = Vec<Tenant>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<Tenant>, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut tenants = self
            .0
            .read(Table::Tenants, |t| {
                t.tenants.values().cloned().collect::<Vec<_>>()
            })
            .await
            .map_err(tracerr::wrap!())?;
        tenants.sort_by_key(|t| (t.created_at, t.id));
        Ok(tenants)
    }
}

impl<S: Storage> Database<Select<By<read::tenant::Count, tenant::Status>>>
    for Memory<S>
{
    type Ok = read::tenant::Count;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::tenant::Count, tenant::Status>>,
    ) -> Result<Self::Ok, Self::Err> {
        let status = by.into_inner();
        self.0
            .read(Table::Tenants, |t| {
                count(t.tenants.values().filter(|t| t.status == status).count())
            })
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<S: Storage> Database<Lock<By<Tenant, tenant::Id>>> for Memory<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Tenant, tenant::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // The whole `Tables` are locked by `Tx` already.
        self.0
            .read(Table::Tenants, |_| ())
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<S: Storage> Database<Insert<Payment>> for Memory<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(payment): Insert<Payment>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .write(Table::Payments, |t| {
                _ = t.payments.insert(payment.id, payment);
                Ok(())
            })
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<S: Storage> Database<Update<Payment>> for Memory<S>
where
    Self: Database<Insert<Payment>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(payment): Update<Payment>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Insert(payment)).await.map_err(tracerr::wrap!())
    }
}

impl<S: Storage> Database<Select<By<Option<Payment>, payment::Id>>>
    for Memory<S>
{
    type Ok = Option<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Payment>, payment::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.0
            .read(Table::Payments, |t| t.payments.get(&id).cloned())
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<S: Storage> Memory<S> {
    /// Selects all the [`Payment`]s matching the provided `filter`, ordered by
    /// their due dates.
    async fn payments_where(
        &self,
        filter: impl Fn(&Payment) -> bool,
    ) -> Result<Vec<Payment>, Traced<database::Error>> {
        let mut payments = self
            .0
            .read(Table::Payments, |t| {
                t.payments
                    .values()
                    .filter(|p| filter(p))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .await
            .map_err(tracerr::wrap!())?;
        payments.sort_by_key(|p| (p.due_date, p.id));
        Ok(payments)
    }
}

impl<S: Storage> Database<Select<By<Vec<Payment>, ()>>> for Memory<S> {
    type Ok = Vec<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<Payment>, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.payments_where(|_| true)
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<S: Storage> Database<Select<By<Vec<Payment>, tenant::Id>>> for Memory<S> {
    type Ok = Vec<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Payment>, tenant::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let tenant_id = by.into_inner();
        self.payments_where(|p| p.tenant_id == tenant_id)
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<S: Storage> Database<Select<By<Vec<Payment>, read::payment::OverdueAt>>>
    for Memory<S>
{
    type Ok = Vec<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Payment>, read::payment::OverdueAt>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::payment::OverdueAt(now) = by.into_inner();
        self.payments_where(|p| p.is_overdue(now))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<S: Storage>
    Database<Select<By<read::payment::Count, read::payment::OverdueAt>>>
    for Memory<S>
{
    type Ok = read::payment::Count;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::payment::Count, read::payment::OverdueAt>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::payment::OverdueAt(now) = by.into_inner();
        self.0
            .read(Table::Payments, |t| {
                count(t.payments.values().filter(|p| p.is_overdue(now)).count())
            })
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<S: Storage> Database<Select<By<Money, read::payment::PaidWithin>>>
    for Memory<S>
{
    type Ok = Money;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Money, read::payment::PaidWithin>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::payment::PaidWithin(window) = by.into_inner();
        self.0
            .read(Table::Payments, |t| {
                t.payments
                    .values()
                    .filter(|p| {
                        p.status == payment::Status::Paid
                            && p.paid_at.is_some_and(|at| window.contains(&at))
                    })
                    .map(|p| p.amount)
                    .sum()
            })
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<S: Storage> Database<Lock<By<Payment, payment::Id>>> for Memory<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Payment, payment::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // The whole `Tables` are locked by `Tx` already.
        self.0
            .read(Table::Payments, |_| ())
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<S: Storage> Database<Insert<Expense>> for Memory<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(expense): Insert<Expense>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .write(Table::Expenses, |t| {
                _ = t.expenses.insert(expense.id, expense);
                Ok(())
            })
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<S: Storage> Database<Update<Expense>> for Memory<S>
where
    Self: Database<Insert<Expense>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(expense): Update<Expense>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Insert(expense)).await.map_err(tracerr::wrap!())
    }
}

impl<S: Storage> Database<Delete<By<Expense, expense::Id>>> for Memory<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Expense, expense::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.0
            .write(Table::Expenses, |t| {
                _ = t.expenses.remove(&id);
                Ok(())
            })
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<S: Storage> Database<Select<By<Option<Expense>, expense::Id>>>
    for Memory<S>
{
    type Ok = Option<Expense>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Expense>, expense::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.0
            .read(Table::Expenses, |t| t.expenses.get(&id).cloned())
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<S: Storage> Database<Select<By<Vec<Expense>, ()>>> for Memory<S> {
    type Ok = Vec<Expense>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<Expense>, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut expenses = self
            .0
            .read(Table::Expenses, |t| {
                t.expenses.values().cloned().collect::<Vec<_>>()
            })
            .await
            .map_err(tracerr::wrap!())?;
        // Most recent first.
        expenses.sort_by(|a, b| (b.date, b.id).cmp(&(a.date, a.id)));
        Ok(expenses)
    }
}

impl<S: Storage> Database<Select<By<Money, read::expense::DatedWithin>>>
    for Memory<S>
{
    type Ok = Money;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Money, read::expense::DatedWithin>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::expense::DatedWithin(window) = by.into_inner();
        self.0
            .read(Table::Expenses, |t| {
                t.expenses
                    .values()
                    .filter(|e| window.contains(&e.date))
                    .map(|e| e.amount)
                    .sum()
            })
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<S: Storage> Database<Insert<User>> for Memory<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(user): Insert<User>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .write(Table::Users, |t| t.put_user(user))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<S: Storage> Database<Select<By<Option<User>, user::Id>>> for Memory<S> {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.0
            .read(Table::Users, |t| t.users.get(&id).cloned())
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<'e, S: Storage> Database<Select<By<Option<User>, &'e user::Email>>>
    for Memory<S>
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'e user::Email>>,
    ) -> Result<Self::Ok, Self::Err> {
        let email = by.into_inner();
        self.0
            .read(Table::Users, |t| {
                t.users.values().find(|u| u.email == *email).cloned()
            })
            .await
            .map_err(tracerr::wrap!())
    }
}

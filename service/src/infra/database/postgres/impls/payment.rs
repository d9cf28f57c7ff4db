//! [`Payment`]-related [`Database`] implementations.

use common::{
    operations::{By, Insert, Lock, Select, Update},
    Money,
};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{payment, tenant, Payment},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Columns of the `payments` table, in the order [`payment_from()`] expects.
const COLUMNS: &str = "\
    id, tenant_id, amount, \
    due_date, paid_at, status, method, \
    created_at, updated_at";

/// Reads a [`Payment`] from the provided [`Row`] selected with [`COLUMNS`].
fn payment_from(row: &Row) -> Payment {
    Payment {
        id: row.get("id"),
        tenant_id: row.get("tenant_id"),
        amount: row.get("amount"),
        due_date: row.get("due_date"),
        paid_at: row.get("paid_at"),
        status: row.get("status"),
        method: row.get("method"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

impl<C> Database<Select<By<Option<Payment>, payment::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Payment>, payment::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        let sql =
            format!("SELECT {COLUMNS} FROM payments WHERE id = $1::UUID");
        Ok(self
            .query_opt(sql.as_str(), &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(payment_from))
    }
}

impl<C> Database<Select<By<Vec<Payment>, ()>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<Payment>, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        let sql =
            format!("SELECT {COLUMNS} FROM payments ORDER BY due_date, id");
        Ok(self
            .query(sql.as_str(), &[])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(payment_from)
            .collect())
    }
}

impl<C> Database<Select<By<Vec<Payment>, tenant::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Payment>, tenant::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let tenant_id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} FROM payments \
             WHERE tenant_id = $1::UUID \
             ORDER BY due_date, id",
        );
        Ok(self
            .query(sql.as_str(), &[&tenant_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(payment_from)
            .collect())
    }
}

impl<C> Database<Select<By<Vec<Payment>, read::payment::OverdueAt>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Payment>, read::payment::OverdueAt>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::payment::OverdueAt(now) = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} FROM payments \
             WHERE status = $1::VARCHAR \
                   AND due_date < $2::TIMESTAMPTZ \
             ORDER BY due_date, id",
        );
        Ok(self
            .query(sql.as_str(), &[&payment::Status::Unpaid, &now])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(payment_from)
            .collect())
    }
}

impl<C> Database<Select<By<read::payment::Count, read::payment::OverdueAt>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::payment::Count;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::payment::Count, read::payment::OverdueAt>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::payment::OverdueAt(now) = by.into_inner();

        const SQL: &str = "\
            SELECT COUNT(*)::INT8 \
            FROM payments \
            WHERE status = $1::VARCHAR \
                  AND due_date < $2::TIMESTAMPTZ";
        self.query_opt(SQL, &[&payment::Status::Unpaid, &now])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.expect("always exists").get::<_, i64>(0).into())
    }
}

impl<C> Database<Select<By<Money, read::payment::PaidWithin>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Money;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Money, read::payment::PaidWithin>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::payment::PaidWithin(window) = by.into_inner();

        const SQL: &str = "\
            SELECT COALESCE(SUM(amount), 0)::NUMERIC \
            FROM payments \
            WHERE status = $1::VARCHAR \
                  AND paid_at >= $2::TIMESTAMPTZ \
                  AND paid_at < $3::TIMESTAMPTZ";
        self.query_opt(
            SQL,
            &[&payment::Status::Paid, &window.start, &window.end],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(|row| row.expect("always exists").get(0))
    }
}

impl<C> Database<Insert<Payment>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Payment>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(payment): Insert<Payment>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(payment)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Payment>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(payment): Update<Payment>,
    ) -> Result<Self::Ok, Self::Err> {
        let Payment {
            id,
            tenant_id,
            amount,
            due_date,
            paid_at,
            status,
            method,
            created_at,
            updated_at,
        } = payment;

        const SQL: &str = "\
            INSERT INTO payments (\
                id, tenant_id, amount, \
                due_date, paid_at, status, method, \
                created_at, updated_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::NUMERIC, \
                $4::TIMESTAMPTZ, $5::TIMESTAMPTZ, $6::VARCHAR, $7::VARCHAR, \
                $8::TIMESTAMPTZ, $9::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET tenant_id = EXCLUDED.tenant_id, \
                amount = EXCLUDED.amount, \
                due_date = EXCLUDED.due_date, \
                paid_at = EXCLUDED.paid_at, \
                status = EXCLUDED.status, \
                method = EXCLUDED.method, \
                updated_at = EXCLUDED.updated_at";
        self.exec(
            SQL,
            &[
                &id,
                &tenant_id,
                &amount,
                &due_date,
                &paid_at,
                &status,
                &method,
                &created_at,
                &updated_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<Payment, payment::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Payment, payment::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: payment::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM payments \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

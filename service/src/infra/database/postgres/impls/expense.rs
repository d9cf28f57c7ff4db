//! [`Expense`]-related [`Database`] implementations.

use common::{
    operations::{By, Delete, Insert, Select, Update},
    Money,
};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{expense, Expense},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Columns of the `expenses` table, in the order [`expense_from()`] expects.
const COLUMNS: &str = "id, description, amount, date, created_at, updated_at";

/// Reads an [`Expense`] from the provided [`Row`] selected with [`COLUMNS`].
fn expense_from(row: &Row) -> Expense {
    Expense {
        id: row.get("id"),
        description: row.get("description"),
        amount: row.get("amount"),
        date: row.get("date"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

impl<C> Database<Select<By<Option<Expense>, expense::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Expense>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Expense>, expense::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        let sql =
            format!("SELECT {COLUMNS} FROM expenses WHERE id = $1::UUID");
        Ok(self
            .query_opt(sql.as_str(), &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(expense_from))
    }
}

impl<C> Database<Select<By<Vec<Expense>, ()>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Expense>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<Expense>, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        let sql = format!(
            "SELECT {COLUMNS} FROM expenses ORDER BY date DESC, id DESC",
        );
        Ok(self
            .query(sql.as_str(), &[])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(expense_from)
            .collect())
    }
}

impl<C> Database<Select<By<Money, read::expense::DatedWithin>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Money;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Money, read::expense::DatedWithin>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::expense::DatedWithin(window) = by.into_inner();

        const SQL: &str = "\
            SELECT COALESCE(SUM(amount), 0)::NUMERIC \
            FROM expenses \
            WHERE date >= $1::TIMESTAMPTZ \
                  AND date < $2::TIMESTAMPTZ";
        self.query_opt(SQL, &[&window.start, &window.end])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.expect("always exists").get(0))
    }
}

impl<C> Database<Insert<Expense>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Expense>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(expense): Insert<Expense>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(expense)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Expense>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(expense): Update<Expense>,
    ) -> Result<Self::Ok, Self::Err> {
        let Expense {
            id,
            description,
            amount,
            date,
            created_at,
            updated_at,
        } = expense;

        const SQL: &str = "\
            INSERT INTO expenses (\
                id, description, amount, date, \
                created_at, updated_at\
            ) \
            VALUES (\
                $1::UUID, $2::TEXT, $3::NUMERIC, $4::TIMESTAMPTZ, \
                $5::TIMESTAMPTZ, $6::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET description = EXCLUDED.description, \
                amount = EXCLUDED.amount, \
                date = EXCLUDED.date, \
                updated_at = EXCLUDED.updated_at";
        self.exec(
            SQL,
            &[&id, &description, &amount, &date, &created_at, &updated_at],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<By<Expense, expense::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Expense, expense::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM expenses \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

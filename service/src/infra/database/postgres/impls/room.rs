//! [`Room`]-related [`Database`] implementations.

use common::operations::{By, Delete, Insert, Lock, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{room, Room},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Columns of the `rooms` table, in the order [`room_from()`] expects.
const COLUMNS: &str = "\
    id, number, price, status, \
    facilities, notes, \
    created_at, updated_at";

/// Reads a [`Room`] from the provided [`Row`] selected with [`COLUMNS`].
fn room_from(row: &Row) -> Room {
    Room {
        id: row.get("id"),
        number: row.get("number"),
        price: row.get("price"),
        status: row.get("status"),
        facilities: row.get("facilities"),
        notes: row.get("notes"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

impl<C> Database<Select<By<Option<Room>, room::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Room>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Room>, room::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        let sql = format!("SELECT {COLUMNS} FROM rooms WHERE id = $1::UUID");
        Ok(self
            .query_opt(sql.as_str(), &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(room_from))
    }
}

impl<'n, C> Database<Select<By<Option<Room>, &'n room::Number>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Room>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Room>, &'n room::Number>>,
    ) -> Result<Self::Ok, Self::Err> {
        let number = by.into_inner();

        let sql =
            format!("SELECT {COLUMNS} FROM rooms WHERE number = $1::VARCHAR");
        Ok(self
            .query_opt(sql.as_str(), &[number])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(room_from))
    }
}

impl<C> Database<Select<By<Vec<Room>, ()>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Room>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<Room>, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        let sql = format!("SELECT {COLUMNS} FROM rooms ORDER BY number");
        Ok(self
            .query(sql.as_str(), &[])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(room_from)
            .collect())
    }
}

impl<C> Database<Select<By<read::room::Count, ()>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = read::room::Count;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<read::room::Count, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            SELECT COUNT(*)::INT8 \
            FROM rooms";
        self.query_opt(SQL, &[])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.expect("always exists").get::<_, i64>(0).into())
    }
}

impl<C> Database<Select<By<read::room::Count, room::Status>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = read::room::Count;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::room::Count, room::Status>>,
    ) -> Result<Self::Ok, Self::Err> {
        let status = by.into_inner();

        const SQL: &str = "\
            SELECT COUNT(*)::INT8 \
            FROM rooms \
            WHERE status = $1::VARCHAR";
        self.query_opt(SQL, &[&status])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.expect("always exists").get::<_, i64>(0).into())
    }
}

impl<C> Database<Insert<Room>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(room): Insert<Room>,
    ) -> Result<Self::Ok, Self::Err> {
        let Room {
            id,
            number,
            price,
            status,
            facilities,
            notes,
            created_at,
            updated_at,
        } = room;

        // No upsert here: a taken `number` must violate `rooms_number_key`.
        const SQL: &str = "\
            INSERT INTO rooms (\
                id, number, price, status, \
                facilities, notes, \
                created_at, updated_at\
            ) \
            VALUES (\
                $1::UUID, $2::VARCHAR, $3::NUMERIC, $4::VARCHAR, \
                $5::TEXT, $6::TEXT, \
                $7::TIMESTAMPTZ, $8::TIMESTAMPTZ\
            )";
        self.exec(
            SQL,
            &[
                &id,
                &number,
                &price,
                &status,
                &facilities,
                &notes,
                &created_at,
                &updated_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Update<Room>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(room): Update<Room>,
    ) -> Result<Self::Ok, Self::Err> {
        let Room {
            id,
            number,
            price,
            status,
            facilities,
            notes,
            created_at: _,
            updated_at,
        } = room;

        const SQL: &str = "\
            UPDATE rooms \
            SET number = $2::VARCHAR, \
                price = $3::NUMERIC, \
                status = $4::VARCHAR, \
                facilities = $5::TEXT, \
                notes = $6::TEXT, \
                updated_at = $7::TIMESTAMPTZ \
            WHERE id = $1::UUID";
        self.exec(
            SQL,
            &[
                &id,
                &number,
                &price,
                &status,
                &facilities,
                &notes,
                &updated_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Update<room::StatusUpdate>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(upd): Update<room::StatusUpdate>,
    ) -> Result<Self::Ok, Self::Err> {
        let room::StatusUpdate {
            id,
            status,
            updated_at,
        } = upd;

        const SQL: &str = "\
            UPDATE rooms \
            SET status = $2::VARCHAR, \
                updated_at = $3::TIMESTAMPTZ \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id, &status, &updated_at])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Delete<By<Room, room::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Room, room::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM rooms \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Room, room::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Room, room::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: room::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM rooms \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

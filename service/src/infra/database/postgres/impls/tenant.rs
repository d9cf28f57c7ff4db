//! [`Tenant`]-related [`Database`] implementations.

use common::operations::{By, Delete, Insert, Lock, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{room, tenant, Tenant},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Columns of the `tenants` table, in the order [`tenant_from()`] expects.
const COLUMNS: &str = "\
    id, name, phone, room_id, \
    start_date, end_date, status, \
    created_at, updated_at";

/// Reads a [`Tenant`] from the provided [`Row`] selected with [`COLUMNS`].
fn tenant_from(row: &Row) -> Tenant {
    Tenant {
        id: row.get("id"),
        name: row.get("name"),
        phone: row.get("phone"),
        room_id: row.get("room_id"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        status: row.get("status"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

impl<C> Database<Select<By<Option<Tenant>, tenant::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Tenant>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Tenant>, tenant::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        let sql = format!("SELECT {COLUMNS} FROM tenants WHERE id = $1::UUID");
        Ok(self
            .query_opt(sql.as_str(), &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(tenant_from))
    }
}

impl<C> Database<Select<By<Option<Tenant>, room::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Tenant>;
    type Err = Traced<database::Error>;

    /// Selects the earliest created [`Tenant`] living in the [`room::Id`].
    async fn execute(
        &self,
        Select(by): Select<By<Option<Tenant>, room::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let room_id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} FROM tenants \
             WHERE room_id = $1::UUID \
             ORDER BY created_at, id \
             LIMIT 1",
        );
        Ok(self
            .query_opt(sql.as_str(), &[&room_id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(tenant_from))
    }
}

impl<C> Database<Select<By<Vec<Tenant>, ()>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Tenant>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<Tenant>, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        let sql =
            format!("SELECT {COLUMNS} FROM tenants ORDER BY created_at, id");
        Ok(self
            .query(sql.as_str(), &[])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(tenant_from)
            .collect())
    }
}

impl<C> Database<Select<By<read::tenant::Count, tenant::Status>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::tenant::Count;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::tenant::Count, tenant::Status>>,
    ) -> Result<Self::Ok, Self::Err> {
        let status = by.into_inner();

        const SQL: &str = "\
            SELECT COUNT(*)::INT8 \
            FROM tenants \
            WHERE status = $1::VARCHAR";
        self.query_opt(SQL, &[&status])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.expect("always exists").get::<_, i64>(0).into())
    }
}

impl<C> Database<Insert<Tenant>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Tenant>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(tenant): Insert<Tenant>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(tenant)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Tenant>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(tenant): Update<Tenant>,
    ) -> Result<Self::Ok, Self::Err> {
        let Tenant {
            id,
            name,
            phone,
            room_id,
            start_date,
            end_date,
            status,
            created_at,
            updated_at,
        } = tenant;

        const SQL: &str = "\
            INSERT INTO tenants (\
                id, name, phone, room_id, \
                start_date, end_date, status, \
                created_at, updated_at\
            ) \
            VALUES (\
                $1::UUID, $2::VARCHAR, $3::VARCHAR, $4::UUID, \
                $5::TIMESTAMPTZ, $6::TIMESTAMPTZ, $7::VARCHAR, \
                $8::TIMESTAMPTZ, $9::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET name = EXCLUDED.name, \
                phone = EXCLUDED.phone, \
                room_id = EXCLUDED.room_id, \
                start_date = EXCLUDED.start_date, \
                end_date = EXCLUDED.end_date, \
                status = EXCLUDED.status, \
                updated_at = EXCLUDED.updated_at";
        self.exec(
            SQL,
            &[
                &id,
                &name,
                &phone,
                &room_id,
                &start_date,
                &end_date,
                &status,
                &created_at,
                &updated_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<By<Tenant, tenant::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    /// Deletes the [`Tenant`] along with all its payments, which are cascaded
    /// by the `payments_tenant_id_fkey` constraint.
    async fn execute(
        &self,
        Delete(by): Delete<By<Tenant, tenant::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM tenants \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Tenant, tenant::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Tenant, tenant::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: tenant::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM tenants \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

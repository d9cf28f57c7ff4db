//! [`Command`] for saving a [`Payment`].

use common::{
    operations::{
        By, Commit, Insert, Lock, Select, Transact, Transacted, Update,
    },
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{payment, tenant, Payment, Tenant},
    infra::{database, Database},
    Classify, ErrorKind, Service,
};

use super::Command;

/// [`Command`] for creating a new [`Payment`] or updating an existing one.
///
/// [`payment::Status`] is never provided, but resolved at the provided
/// [`SavePayment::now`] with [`payment::Status::resolve()`].
#[derive(Clone, Debug)]
pub struct SavePayment {
    /// ID of the [`Payment`] to update.
    ///
    /// A new [`Payment`] is created if [`None`].
    pub id: Option<payment::Id>,

    /// ID of the [`Tenant`] the [`Payment`] belongs to.
    pub tenant_id: tenant::Id,

    /// Amount of the [`Payment`].
    pub amount: Money,

    /// [`DateTime`] the [`Payment`] is due at.
    pub due_date: payment::DueDateTime,

    /// [`DateTime`] the [`Payment`] was paid at.
    ///
    /// [`None`] keeps an already paid [`Payment`] paid.
    pub paid_at: Option<payment::PaidDateTime>,

    /// [`payment::Method`] the [`Payment`] was paid with.
    pub method: payment::Method,

    /// [`DateTime`] to resolve the [`payment::Status`] at.
    pub now: DateTime,
}

impl<Db> Command<SavePayment> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Tenant, tenant::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Tenant>, tenant::Id>>,
            Ok = Option<Tenant>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Payment, payment::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Payment>, payment::Id>>,
            Ok = Option<Payment>,
            Err = Traced<database::Error>,
        > + Database<Insert<Payment>, Err = Traced<database::Error>>
        + Database<Update<Payment>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Payment;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: SavePayment) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let SavePayment {
            id,
            tenant_id,
            amount,
            due_date,
            paid_at,
            method,
            now,
        } = cmd;

        if amount.is_negative() {
            return Err(tracerr::new!(E::NegativeAmount(amount)));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Keep the `Tenant` from being deleted until the `Payment` is saved.
        tx.execute(Lock(By::<Tenant, _>::new(tenant_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        _ = tx
            .execute(Select(By::<Option<Tenant>, _>::new(tenant_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::TenantNotExists(tenant_id))
            .map_err(tracerr::wrap!())?;

        let payment = if let Some(id) = id {
            tx.execute(Lock(By::<Payment, _>::new(id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
            let mut payment = tx
                .execute(Select(By::<Option<Payment>, _>::new(id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or(E::NotExists(id))
                .map_err(tracerr::wrap!())?;

            payment.tenant_id = tenant_id;
            payment.amount = amount;
            payment.due_date = due_date;
            payment.paid_at = paid_at.or(payment.paid_at);
            payment.method = method;
            payment.updated_at = now.coerce();
            payment.resolve_status(now);

            tx.execute(Update(payment.clone()))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
            payment
        } else {
            let mut payment = Payment {
                id: payment::Id::new(),
                tenant_id,
                amount,
                due_date,
                paid_at,
                status: payment::Status::Unpaid,
                method,
                created_at: now.coerce(),
                updated_at: now.coerce(),
            };
            payment.resolve_status(now);

            tx.execute(Insert(payment.clone()))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
            payment
        };

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::debug!(
            "`Payment(id: {})` of `Tenant(id: {tenant_id})` is saved as `{}`",
            payment.id,
            payment.status,
        );

        Ok(payment)
    }
}

/// Error of [`SavePayment`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Amount of a [`Payment`] is negative.
    #[display("`Payment` amount cannot be negative: {_0}")]
    NegativeAmount(#[error(not(source))] Money),

    /// [`Payment`] with the provided ID does not exist.
    #[display("`Payment(id: {_0})` does not exist")]
    NotExists(#[error(not(source))] payment::Id),

    /// [`Tenant`] with the provided ID does not exist.
    #[display("`Tenant(id: {_0})` does not exist")]
    TenantNotExists(#[error(not(source))] tenant::Id),
}

impl Classify for ExecutionError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Db(_) => ErrorKind::Dependency,
            Self::NegativeAmount(_) => ErrorKind::Validation,
            Self::NotExists(_) | Self::TenantNotExists(_) => {
                ErrorKind::NotFound
            }
        }
    }
}

#[cfg(test)]
mod spec {
    use common::Money;

    use crate::{
        command::fixture,
        domain::{payment, tenant},
        query, Classify as _, Command as _, ErrorKind, Query as _,
    };

    use super::SavePayment;

    fn cmd(
        tenant_id: tenant::Id,
        paid_at: Option<&str>,
        now: &str,
    ) -> SavePayment {
        SavePayment {
            id: None,
            tenant_id,
            amount: Money::from(1_500_000),
            due_date: fixture::at("2024-01-10T00:00:00Z").coerce(),
            paid_at: paid_at.map(|at| fixture::at(at).coerce()),
            method: payment::Method::new("transfer").unwrap(),
            now: fixture::at(now),
        }
    }

    #[tokio::test]
    async fn resolves_paid_before_due() {
        let svc = fixture::service();
        let tenant = fixture::tenant(&svc, "Budi", None).await;

        let payment = svc
            .execute(cmd(
                tenant.id,
                Some("2024-01-05T00:00:00Z"),
                "2024-01-05T00:00:00Z",
            ))
            .await
            .unwrap();

        assert_eq!(payment.status, payment::Status::Paid);
        let stored = svc
            .execute(query::payment::ById::by(payment.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, payment::Status::Paid);
    }

    #[tokio::test]
    async fn resolves_late_after_due() {
        let svc = fixture::service();
        let tenant = fixture::tenant(&svc, "Budi", None).await;

        let payment = svc
            .execute(cmd(
                tenant.id,
                Some("2024-01-15T00:00:00Z"),
                "2024-01-15T00:00:00Z",
            ))
            .await
            .unwrap();

        assert_eq!(payment.status, payment::Status::Late);
    }

    #[tokio::test]
    async fn resolves_unpaid_without_paid_at() {
        let svc = fixture::service();
        let tenant = fixture::tenant(&svc, "Budi", None).await;

        for now in ["2024-01-05T00:00:00Z", "2024-02-01T00:00:00Z"] {
            let payment =
                svc.execute(cmd(tenant.id, None, now)).await.unwrap();

            assert_eq!(payment.status, payment::Status::Unpaid);
            assert_eq!(payment.paid_at, None);
        }
    }

    #[tokio::test]
    async fn updates_existing_payment() {
        let svc = fixture::service();
        let tenant = fixture::tenant(&svc, "Budi", None).await;
        let created = svc
            .execute(cmd(tenant.id, None, "2024-01-05T00:00:00Z"))
            .await
            .unwrap();

        let at = "2024-01-08T00:00:00Z";
        let mut update = cmd(tenant.id, Some(at), at);
        update.id = Some(created.id);
        let updated = svc.execute(update).await.unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.status, payment::Status::Paid);
        assert_eq!(
            svc.execute(query::payment::List::by(()))
                .await
                .unwrap()
                .len(),
            1,
        );
    }

    #[tokio::test]
    async fn never_reverts_to_unpaid() {
        let svc = fixture::service();
        let tenant = fixture::tenant(&svc, "Budi", None).await;
        let paid = svc
            .execute(cmd(
                tenant.id,
                Some("2024-01-05T00:00:00Z"),
                "2024-01-05T00:00:00Z",
            ))
            .await
            .unwrap();

        let mut update = cmd(tenant.id, None, "2024-01-06T00:00:00Z");
        update.id = Some(paid.id);
        let updated = svc.execute(update).await.unwrap();

        assert_eq!(updated.paid_at, paid.paid_at);
        assert_eq!(updated.status, payment::Status::Paid);
    }

    #[tokio::test]
    async fn turns_late_when_resaved_after_due() {
        let svc = fixture::service();
        let tenant = fixture::tenant(&svc, "Budi", None).await;
        let paid_at = "2024-01-05T00:00:00Z";
        let paid = svc
            .execute(cmd(tenant.id, Some(paid_at), paid_at))
            .await
            .unwrap();

        let mut resave = cmd(tenant.id, Some(paid_at), "2024-01-15T00:00:00Z");
        resave.id = Some(paid.id);
        let resaved = svc.execute(resave).await.unwrap();

        assert_eq!(paid.status, payment::Status::Paid);
        assert_eq!(resaved.status, payment::Status::Late);
        assert_eq!(resaved.paid_at, paid.paid_at);
        let stored = svc
            .execute(query::payment::ById::by(paid.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, payment::Status::Late);
    }

    #[tokio::test]
    async fn fails_for_unknown_tenant() {
        let svc = fixture::service();

        let err = svc
            .execute(cmd(tenant::Id::new(), None, "2024-01-05T00:00:00Z"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn fails_for_unknown_payment() {
        let svc = fixture::service();
        let tenant = fixture::tenant(&svc, "Budi", None).await;
        let mut cmd = cmd(tenant.id, None, "2024-01-05T00:00:00Z");
        cmd.id = Some(payment::Id::new());

        let err = svc.execute(cmd).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn rejects_negative_amount() {
        let svc = fixture::service();
        let tenant = fixture::tenant(&svc, "Budi", None).await;
        let mut cmd = cmd(tenant.id, None, "2024-01-05T00:00:00Z");
        cmd.amount = Money::from(-1);

        let err = svc.execute(cmd).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}

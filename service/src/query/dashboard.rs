//! [`Dashboard`] definition.

use common::{
    operations::{By, Select},
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::{Expense, Payment, Room, Tenant};
use crate::{
    domain::{room, tenant},
    infra::{database, Database},
    read, Classify, ErrorKind, Query, Service,
};

/// [`Query`] aggregating the occupancy and financial [`Summary`] of the
/// boarding house at the provided moment.
#[derive(Clone, Copy, Debug)]
pub struct Dashboard {
    /// [`DateTime`] to aggregate the [`Summary`] at.
    ///
    /// Its calendar month (in UTC) is the period of the monthly figures.
    pub now: DateTime,
}

/// Output of the [`Dashboard`] [`Query`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Summary {
    /// Total number of [`Room`]s.
    pub total_rooms: read::room::Count,

    /// Number of [`room::Status::Occupied`] [`Room`]s.
    pub occupied_rooms: read::room::Count,

    /// Number of [`Room`]s nobody lives in.
    pub empty_rooms: read::room::Count,

    /// Sum of the [`Payment`]s paid in time during the month.
    pub monthly_income: Money,

    /// Sum of the [`Expense`]s spent during the month.
    pub monthly_expense: Money,

    /// Difference between the [`Summary::monthly_income`] and the
    /// [`Summary::monthly_expense`].
    pub profit: Money,

    /// Number of [`Payment`]s being overdue.
    pub overdue_payments: read::payment::Count,

    /// Number of [`tenant::Status::Active`] [`Tenant`]s.
    pub active_tenants: read::tenant::Count,
}

impl<Db> Query<Dashboard> for Service<Db>
where
    Db: Database<
            Select<By<read::room::Count, ()>>,
            Ok = read::room::Count,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<read::room::Count, room::Status>>,
            Ok = read::room::Count,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Money, read::payment::PaidWithin>>,
            Ok = Money,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Money, read::expense::DatedWithin>>,
            Ok = Money,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<read::payment::Count, read::payment::OverdueAt>>,
            Ok = read::payment::Count,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<read::tenant::Count, tenant::Status>>,
            Ok = read::tenant::Count,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Summary;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        Dashboard { now }: Dashboard,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let total_rooms = self
            .database()
            .execute(Select(By::<read::room::Count, _>::new(())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let occupied_rooms = self
            .database()
            .execute(Select(By::<read::room::Count, _>::new(
                room::Status::Occupied,
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let month = now.month();
        let monthly_income = self
            .database()
            .execute(Select(By::<Money, _>::new(read::payment::PaidWithin(
                month.start.coerce()..month.end.coerce(),
            ))))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let monthly_expense = self
            .database()
            .execute(Select(By::<Money, _>::new(read::expense::DatedWithin(
                month.start.coerce()..month.end.coerce(),
            ))))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let overdue_payments = self
            .database()
            .execute(Select(By::<read::payment::Count, _>::new(
                read::payment::OverdueAt(now),
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let active_tenants = self
            .database()
            .execute(Select(By::<read::tenant::Count, _>::new(
                tenant::Status::Active,
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(Summary {
            total_rooms,
            occupied_rooms,
            empty_rooms: total_rooms - occupied_rooms,
            monthly_income,
            monthly_expense,
            profit: monthly_income - monthly_expense,
            overdue_payments,
            active_tenants,
        })
    }
}

/// Error of [`Dashboard`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),
}

impl Classify for ExecutionError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Db(_) => ErrorKind::Dependency,
        }
    }
}

#[cfg(test)]
mod spec {
    use common::{DateTime, Money};

    use crate::{
        command::{fixture, CreateExpense, CreateTenant, SavePayment},
        domain::{expense, payment, tenant},
        infra::{database::memory::Table, Memory},
        read, Classify as _, Command as _, ErrorKind, Query as _, Service,
    };

    use super::{Dashboard, Summary};

    async fn pay(
        svc: &Service<Memory>,
        tenant_id: tenant::Id,
        amount: i64,
        due: &str,
        paid: Option<&str>,
        now: &str,
    ) -> payment::Status {
        svc.execute(SavePayment {
            id: None,
            tenant_id,
            amount: Money::from(amount),
            due_date: fixture::at(due).coerce(),
            paid_at: paid.map(|at| fixture::at(at).coerce()),
            method: payment::Method::default(),
            now: fixture::at(now),
        })
        .await
        .unwrap()
        .status
    }

    async fn spend(svc: &Service<Memory>, amount: i64, date: &str) {
        _ = svc
            .execute(CreateExpense {
                description: expense::Description::new("Repairs").unwrap(),
                amount: Money::from(amount),
                date: fixture::at(date).coerce(),
            })
            .await
            .unwrap();
    }

    /// Fills the provided [`Service`] with:
    /// - 10 rooms, 6 of them occupied by active tenants;
    /// - 1 inactive tenant without a room;
    /// - 500 paid in time in January 2024, and some other payments;
    /// - 200 spent in January 2024, and 50 in February 2024.
    async fn seed(svc: &Service<Memory>) {
        let mut tenants = vec![];
        for n in 1..=10 {
            let room = fixture::room(svc, &format!("{n}")).await;
            if n <= 6 {
                let name = format!("Tenant {n}");
                let tenant = fixture::tenant(svc, &name, Some(room.id)).await;
                tenants.push(tenant.id);
            }
        }
        _ = svc
            .execute(CreateTenant {
                name: tenant::Name::new("Former").unwrap(),
                phone: tenant::Phone::new("0811").unwrap(),
                room_id: None,
                start_date: fixture::at("2023-01-01T00:00:00Z").coerce(),
                end_date: Some(fixture::at("2023-12-01T00:00:00Z").coerce()),
                status: tenant::Status::Inactive,
            })
            .await
            .unwrap();

        let [t1, t2, t3, t4, ..] = tenants[..] else {
            unreachable!()
        };
        // Paid in time within the month.
        assert_eq!(
            pay(
                svc,
                t1,
                300,
                "2024-01-25T00:00:00Z",
                Some("2024-01-15T00:00:00Z"),
                "2024-01-15T00:00:00Z",
            )
            .await,
            payment::Status::Paid,
        );
        assert_eq!(
            pay(
                svc,
                t2,
                200,
                "2024-02-01T00:00:00Z",
                Some("2024-01-31T23:59:59Z"),
                "2024-01-31T23:59:59Z",
            )
            .await,
            payment::Status::Paid,
        );
        // Paid in time, but in the previous month.
        assert_eq!(
            pay(
                svc,
                t3,
                1000,
                "2024-01-01T00:00:00Z",
                Some("2023-12-20T00:00:00Z"),
                "2023-12-20T00:00:00Z",
            )
            .await,
            payment::Status::Paid,
        );
        // Paid late within the month.
        assert_eq!(
            pay(
                svc,
                t4,
                700,
                "2024-01-10T00:00:00Z",
                Some("2024-01-12T00:00:00Z"),
                "2024-01-12T00:00:00Z",
            )
            .await,
            payment::Status::Late,
        );
        // Unpaid: overdue at 2024-01-20, and not yet due.
        for (tenant_id, due) in
            [(t1, "2024-01-10T00:00:00Z"), (t2, "2024-01-30T00:00:00Z")]
        {
            let status =
                pay(svc, tenant_id, 1500, due, None, "2024-01-05T00:00:00Z")
                    .await;
            assert_eq!(status, payment::Status::Unpaid);
        }

        spend(svc, 150, "2024-01-01T00:00:00Z").await;
        spend(svc, 50, "2024-01-31T12:00:00Z").await;
        spend(svc, 50, "2024-02-01T00:00:00Z").await;
    }

    fn now() -> DateTime {
        fixture::at("2024-01-20T00:00:00Z")
    }

    #[tokio::test]
    async fn aggregates_summary() {
        let svc = fixture::service();
        seed(&svc).await;

        let summary = svc.execute(Dashboard { now: now() }).await.unwrap();

        assert_eq!(
            summary,
            Summary {
                total_rooms: read::room::Count::from(10),
                occupied_rooms: read::room::Count::from(6),
                empty_rooms: read::room::Count::from(4),
                monthly_income: Money::from(500),
                monthly_expense: Money::from(200),
                profit: Money::from(300),
                overdue_payments: read::payment::Count::from(1),
                active_tenants: read::tenant::Count::from(6),
            },
        );
    }

    #[tokio::test]
    async fn is_zero_for_empty_house() {
        let svc = fixture::service();

        let summary = svc.execute(Dashboard { now: now() }).await.unwrap();

        assert_eq!(summary.total_rooms, read::room::Count::from(0));
        assert_eq!(summary.empty_rooms, read::room::Count::from(0));
        assert_eq!(summary.monthly_income, Money::ZERO);
        assert_eq!(summary.monthly_expense, Money::ZERO);
        assert_eq!(summary.profit, Money::ZERO);
        assert_eq!(summary.overdue_payments, read::payment::Count::from(0));
    }

    #[tokio::test]
    async fn allows_negative_profit() {
        let svc = fixture::service();
        spend(&svc, 200, "2024-01-02T00:00:00Z").await;

        let summary = svc.execute(Dashboard { now: now() }).await.unwrap();

        assert_eq!(summary.profit, Money::from(-200));
    }

    #[tokio::test]
    async fn is_idempotent() {
        let svc = fixture::service();
        seed(&svc).await;

        let first = svc.execute(Dashboard { now: now() }).await.unwrap();
        let second = svc.execute(Dashboard { now: now() }).await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn fails_without_partial_summary() {
        let svc = fixture::service();
        seed(&svc).await;
        svc.database().fail_on(Table::Expenses);

        let err = svc.execute(Dashboard { now: now() }).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Dependency);
    }
}

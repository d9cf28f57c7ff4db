//! [`Command`] definition.

pub mod create_expense;
pub mod create_room;
pub mod create_tenant;
pub mod delete_expense;
pub mod delete_room;
pub mod delete_tenant;
pub mod save_payment;
pub mod set_room_status;
pub mod update_expense;
pub mod update_room;
pub mod update_tenant;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    create_expense::CreateExpense, create_room::CreateRoom,
    create_tenant::CreateTenant, delete_expense::DeleteExpense,
    delete_room::DeleteRoom, delete_tenant::DeleteTenant,
    save_payment::SavePayment, set_room_status::SetRoomStatus,
    update_expense::UpdateExpense, update_room::UpdateRoom,
    update_tenant::UpdateTenant,
};

#[cfg(test)]
pub(crate) mod fixture {
    //! Helpers for testing [`Command`]s.

    use common::{DateTime, Money};

    use crate::{
        domain::{room, tenant, Room, Tenant},
        infra::Memory,
        Service,
    };

    use super::{Command as _, CreateRoom, CreateTenant};

    /// Creates a new [`Service`] backed by an empty [`Memory`] database.
    pub(crate) fn service() -> Service<Memory> {
        Service::new(Memory::new())
    }

    /// Parses the provided RFC 3339 string into a [`DateTime`].
    pub(crate) fn at(s: &str) -> DateTime {
        DateTime::from_rfc3339(s).unwrap()
    }

    /// Creates a new empty [`Room`] with the provided number.
    pub(crate) async fn room(svc: &Service<Memory>, number: &str) -> Room {
        svc.execute(CreateRoom {
            number: room::Number::new(number).unwrap(),
            price: Money::from(1_500_000),
            facilities: room::Facilities::new("AC, wifi").unwrap(),
            notes: room::Notes::default(),
        })
        .await
        .unwrap()
    }

    /// Creates a new active [`Tenant`] living in the provided [`Room`].
    pub(crate) async fn tenant(
        svc: &Service<Memory>,
        name: &str,
        room_id: Option<room::Id>,
    ) -> Tenant {
        svc.execute(CreateTenant {
            name: tenant::Name::new(name).unwrap(),
            phone: tenant::Phone::new("081234567890").unwrap(),
            room_id,
            start_date: at("2024-01-01T00:00:00Z").coerce(),
            end_date: None,
            status: tenant::Status::Active,
        })
        .await
        .unwrap()
    }
}

//! Domain definitions.

pub mod expense;
pub mod payment;
pub mod room;
pub mod tenant;
pub mod user;

pub use self::{
    expense::Expense, payment::Payment, room::Room, tenant::Tenant, user::User,
};

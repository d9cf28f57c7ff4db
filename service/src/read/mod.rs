//! Read entities definitions.

pub mod expense;
pub mod payment;
pub mod room;
pub mod tenant;

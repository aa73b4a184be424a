//! Resource declarations and resident sources.

pub mod announcement;
pub mod appointment;
pub mod citizen;
pub mod document_request;
pub mod hotline;
pub mod incident;
pub mod resident;
pub mod staff;

pub use citizen::{Citizen, CitizenSource};
pub use staff::{Staff, StaffSource};

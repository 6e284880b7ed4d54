//! `civica-school` — education-domain entities.
//!
//! Pure domain types: constructors validate, workflow transitions happen via
//! the engine, and nothing here touches storage or the network.

pub mod absence;
pub mod appointment;
pub mod enrollment;
pub mod grade;
pub mod roster;
pub mod student;

pub use absence::Absence;
pub use appointment::SchoolAppointment;
pub use enrollment::Enrollment;
pub use grade::Grade;
pub use roster::{Class, Course};
pub use student::Student;

//! # Student Data Model
//!
//! Types shared by the record store and the HTTP layer:
//!
//! - `StudentRecord`: a persisted student, as returned by the API
//! - `StudentDraft` / `NewStudent`: the create payload before and after validation
//! - `StudentPatch`: the partial update payload
//! - `Major`: the program catalog offered to the rendering layer

mod errors;
mod major;
mod student;

pub use errors::ValidationError;
pub use major::{Major, MajorInfo};
pub use student::{NewStudent, StudentDraft, StudentPatch, StudentRecord, UniqueField};

// Applicant form core: path resolution, list management, validation and the
// controller that owns the record. Handlers and the session store bind it to HTTP.

pub mod array;
pub mod controller;
pub mod handlers;
pub mod path;
pub mod session;
pub mod suggest;
pub mod validation;

pub use controller::{FormController, FormError, FormStatus, SubmitError};
pub use path::{FieldPath, ListPath};

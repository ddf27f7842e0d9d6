//! Application services for assignment coordination.

mod coordinator;
mod validator;

pub use coordinator::{
    AssigneeClaim, AssignmentCoordinator, AssignmentError, AssignmentResult, TaskFields,
    UserFields,
};
pub use validator::{
    AssignmentValidator, ValidationError, ValidatorError, ValidatorResult, check_claimed_name,
};

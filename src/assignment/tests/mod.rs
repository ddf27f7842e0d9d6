//! Unit and service tests for the assignment module.

pub mod support;

mod user_coordinator_tests;
mod validator_tests;

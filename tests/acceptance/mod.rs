//! Integration tests for timed task acceptance testing.
//!
//! All tests run against [`timed_common::clock::ManualClock`], so they are
//! deterministic and need no special privileges.

mod common;
mod deadline_test;
mod scheduling_test;
mod wraparound_test;

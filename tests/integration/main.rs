//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against the simulation radio and a recording control loop.  All tests
//! run on the host (x86_64) with no real hardware required.

mod command_tests;
mod concurrency_tests;
mod link_lifecycle_tests;
mod mock_loop;
mod tuning_tests;

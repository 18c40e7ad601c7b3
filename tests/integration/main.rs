//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific slice of
//! the controller against mock adapters. All tests run on the host
//! (x86_64) with no radio, broker, or responder required.

mod controller_tests;
mod mock_net;
mod resilience_tests;
mod timing_tests;

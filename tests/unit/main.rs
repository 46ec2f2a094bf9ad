//! Unit test harness.
//!
//! Fast, hermetic tests over the library's public surface, with hand-rolled
//! counting fakes for every port. No network, no real CLI.

mod helpers;

mod property_tests;
mod sessions;

//! Unit tests for the verification engine

mod service_tests;

//! Scenario tests for ambarictl.
//!
//! Whole workflows run through the `App` facade, against the in-memory
//! manager and against the same manager served over HTTP.


pub mod support;

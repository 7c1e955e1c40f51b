//! Loan Eligibility Service
//!
//! Trains a logistic-regression loan approval model from a CSV dataset and
//! serves predictions over HTTP.

pub mod commands;
pub mod server;

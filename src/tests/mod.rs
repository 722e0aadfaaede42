// Crate-level scenario tests and shared fixtures

mod fixtures;
mod scenarios;

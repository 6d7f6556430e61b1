#![forbid(unsafe_code)]

//! Autostack demo: a page of tab sets and cards that keep themselves
//! stacked as their content changes.

pub mod cli;
pub mod page;

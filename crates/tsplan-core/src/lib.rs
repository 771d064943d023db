#![forbid(unsafe_code)]
//! tsplan-core: the data model shared by the optimizer crates.
//!
//! - `dag`: arena-indexed plan graph with structural rewrite primitives.
//! - `spec`: closed set of operation specs (logical scan, physical scan,
//!   range, filter, group, distinct, aggregates, yield).
//! - `expr`: predicate expression tree used by filters.
//! - `time`: absolute/relative time points and half-open bounds.
//! - `capability`: what the backing store can evaluate natively.
//!
//! Nothing here decides *whether* a rewrite is legal; that lives in
//! `tsplan-planner`.

pub mod capability;
pub mod config;
pub mod dag;
pub mod error;
pub mod expr;
pub mod hash;
pub mod id;
pub mod prelude;
pub mod spec;
pub mod time;
pub mod verify;

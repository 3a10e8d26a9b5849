//! Core library for the pim-master command line application.
//!
//! The library reconciles product records exported by several independently
//! maintained systems into one master table. Key canonicalization lives in
//! [`pim::master::normalize`], per-key deduplication in [`pim::master::dedup`],
//! the ordered join chain in [`pim::master::join`], and empty-column pruning and
//! coverage accounting in [`pim::master::prune`] and [`pim::master::report`].
//! File-level orchestration, including the bronze/silver/gold passes around
//! the core, is under [`pim::master::pipeline`].

pub mod pim;

pub use pim::master::{
    PimError, Result, clean, config, dedup, enrich, error, io, join, model, normalize, pipeline,
    prune, report,
};

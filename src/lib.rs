//! `scqc` is a command line tool that collects the quality control reports
//! written by single-cell sequencing pipelines and renders them as one set of
//! summary tables, charts and data files. This package is composed of both a
//! library crate, as well as a binary crate.
//!
//! Each supported upstream tool is handled by a report module (see
//! [`modules`]). Modules find their files through [`discovery`], parse them
//! with [`parse`] (or, for barcode rank tables, [`rank`]), collect the results
//! per sample in a [`registry::SampleRegistry`] and hand a
//! [`modules::ModuleReport`] to [`render`].
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![warn(rust_2021_compatibility)]

pub mod discovery;
pub mod list;
pub mod modules;
pub mod parse;
pub mod rank;
pub mod registry;
pub mod render;
pub mod run;
pub mod utils;

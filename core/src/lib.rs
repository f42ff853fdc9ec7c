//! Core library for Satchel, a local-first manager for personal study
//! materials.
//!
//! The [`library`] module contains the whole persistence and indexing layer:
//! entity collections, the durable content store, the import pipeline, and
//! relevance search. Presentation layers (the `satchel` CLI, or any future
//! GUI) consume it through [`library::Library`].

pub mod library;

pub use library::Library;

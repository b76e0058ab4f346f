#![forbid(unsafe_code)]
//! Core primitives for Parrec.
//!
//! Deterministic numeric building blocks shared by the engine and benchmark
//! crates: SIMD dot products, dense factor-matrix storage and bounded top-k
//! selection.

pub mod matrix;
pub mod topk;
pub mod vector;

pub use matrix::{FactorMatrix, MatrixError};
pub use topk::TopkAccumulator;
pub use vector::{dot_product, dot_product_unchecked, PreparedDotQuery, VectorError};

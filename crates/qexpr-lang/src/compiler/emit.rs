//! Emission of every node kind other than parameters, constants, closures
//! and blocks, grouped by the shape of the generated code.

mod access;
mod arith;
mod branch;
mod construct;
mod convert;
mod logical;
mod quote;

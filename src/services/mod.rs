//! Batch assembly and lifecycle services

pub mod assembler;
pub mod lifecycle;
pub mod reference;

pub use assembler::{assemble_and_persist, assemble_from_session, AssembledBatch};

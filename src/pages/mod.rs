//! The pages served by the binaries, one exhibit each.

pub mod cube;
pub mod showcase;

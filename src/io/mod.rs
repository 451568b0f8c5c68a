//! Output plumbing for pairs text: the external compressor and the
//! streaming row writer.

pub mod compress;
pub mod writer;

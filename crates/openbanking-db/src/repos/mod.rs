//! Repository implementations

mod linkage;

pub use linkage::LinkageRepo;

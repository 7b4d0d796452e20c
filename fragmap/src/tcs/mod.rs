//! Systems and the stages which run them.

pub mod system;

//! The hour distribution engine. Everything in here is synchronous and free of I/O: the tracker
//! boundary lives in [crate::tracker], the front-end in [crate::cli].

pub mod capacity;
pub mod distribution;
pub mod eligibility;
pub mod session;
pub mod ticket;

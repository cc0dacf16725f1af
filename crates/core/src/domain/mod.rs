pub mod analysis;
pub mod contract;
pub mod negotiation;
pub mod profile;

pub mod rules;
pub mod session;

pub mod call;
pub mod onboard;
pub mod query;
pub mod runtime;
pub mod status;
pub mod tools;

pub mod account;
pub mod category;
pub mod quiz;
pub mod results;

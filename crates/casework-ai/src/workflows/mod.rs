pub mod analysis;
pub mod register;

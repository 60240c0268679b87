pub mod appointment;
pub mod promotion;
pub mod service;
pub mod user;

pub mod appsettings;
pub mod clock;
pub mod delivery;
pub mod error;
pub mod models;
pub mod scheduling;
pub mod storage;

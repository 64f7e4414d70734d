pub mod access;
pub mod employee;
pub mod facility;
pub mod identity;
pub mod role;
pub mod staging;

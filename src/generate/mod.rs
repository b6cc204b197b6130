pub mod device;
pub mod header;
pub mod peripheral;
pub mod register;

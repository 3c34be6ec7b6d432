pub mod access;
pub mod files;
pub mod health;

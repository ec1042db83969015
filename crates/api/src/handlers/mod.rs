pub mod email;
pub mod files;
pub mod status;
pub mod upload;

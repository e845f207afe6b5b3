pub mod deploy;
pub mod rollback;

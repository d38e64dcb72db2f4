pub mod generate;
pub mod import;
pub mod profiles;
pub mod validate;

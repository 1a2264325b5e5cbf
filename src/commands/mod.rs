mod generate;
mod import;

pub use generate::run_generate;
pub use import::run_import_command;

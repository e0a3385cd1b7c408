pub mod google;
pub mod memory;

pub use google::{GoogleSheetsClient, GoogleWorksheet};
pub use memory::MemoryWorksheet;

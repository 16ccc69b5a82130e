mod file;
mod memory;

pub use file::FileReportSink;
pub use memory::MemoryReportSink;

mod file;
mod http;
mod memory;

pub use file::JsonFileSink;
pub use http::HttpSink;
pub use memory::MemorySink;

pub mod error;
pub mod parser;

pub use error::FeedError;
pub use parser::{parse_dispatch_list, parse_line, read_dispatch_list};

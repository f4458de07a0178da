mod client;
mod url;

pub use self::{client::Client, url::ParsedUrl};

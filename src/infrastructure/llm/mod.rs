pub mod dispatcher;
pub mod http_client;
pub mod openai;

pub use dispatcher::Dispatcher;
pub use http_client::{ByteStream, HttpClient, HttpClientTrait};
pub use openai::OpenAiBackend;

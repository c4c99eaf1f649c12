pub mod indexing;
pub mod query;
pub mod transport;

pub use indexing::{IndexOutcome, IndexingClient};
pub use query::{ChatReply, QueryClient};
pub use transport::{Endpoint, HttpTransport, RawResponse, Transport};

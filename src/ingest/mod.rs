pub mod events;
pub mod feed;
pub mod ingestor;

pub use events::*;
pub use feed::*;
pub use ingestor::*;

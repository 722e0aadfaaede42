// AWS clients and discovery strategies

pub mod cloudwatch;
pub mod discovery;
pub mod factory;
pub mod identity;
pub mod queue;
pub mod session;
pub mod tagging;

pub use cloudwatch::CloudWatchApi;
pub use discovery::ResourceFilter;
pub use factory::{ClientFactory, ClientKind};
pub use identity::{StsApi, SupportAppApi};
pub use queue::QueueSender;
pub use session::SessionProvider;
pub use tagging::TaggingApi;

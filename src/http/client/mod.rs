mod hyper_client;

pub use hyper_client::{create_client, HyperClient, CONNECT_TIMEOUT};

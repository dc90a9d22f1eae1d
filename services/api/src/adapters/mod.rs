pub mod proxy_client;
pub mod webhook;

pub use proxy_client::ProxyHttpClient;
pub use webhook::WebhookClient;

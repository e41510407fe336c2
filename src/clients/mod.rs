pub mod form_host;
pub mod jotform_client;

pub use form_host::{FormHost, HostedFormId};
pub use jotform_client::JotformClient;

#[cfg(test)]
pub use form_host::MockFormHost;

//! External service clients
//!
//! The three providers are opaque request/response services; these clients
//! own the wire formats and status-code handling so the pipeline stages only
//! see typed results.

pub mod campaign;
pub mod lookup;
pub mod scrape;
pub mod types;

pub use campaign::CampaignClient;
pub use lookup::{LookupClient, LookupError, LookupService};
pub use scrape::ScrapeJobClient;

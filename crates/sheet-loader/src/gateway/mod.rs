//! Concrete gateways.
//!
//! Both implement [`FetchGateway`](sheet_core::FetchGateway) for sheet
//! content and [`ListingProvider`](sheet_core::ListingProvider) for the
//! group listing.

pub mod disk;
pub mod http;

pub use disk::DiskGateway;
pub use http::HttpGateway;

//! Community tag source implementations

pub mod lastfm;

pub use lastfm::LastfmClient;

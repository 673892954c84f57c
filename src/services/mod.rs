pub mod discovery;
pub mod preference;
pub mod storage;
pub mod venue_scoring;

pub use discovery::DiscoveryService;
pub use preference::PreferenceManager;
pub use storage::{JsonFileRepository, ProfileRepository};
pub use venue_scoring::VenueScoringService;

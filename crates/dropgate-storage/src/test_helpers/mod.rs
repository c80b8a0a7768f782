//! Test helpers shared by the dropgate crates' test suites.

mod mock_storage;

pub use mock_storage::MockStorage;

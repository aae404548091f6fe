pub mod builders;
pub mod db;
pub mod fakes;

pub use builders::{FormBuilder, SessionBuilder};
pub use db::TestDb;
pub use fakes::{FakeAssetHost, FakeIdentity, FakeRepository, RecordingCache, StallingRepository};

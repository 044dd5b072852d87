//! Shared test doubles and fixtures for the UserHub services.

mod clock;
mod dispatcher;
mod hasher;
mod repository;

pub use clock::FixedClock;
pub use dispatcher::RecordingDispatcher;
pub use hasher::FakePasswordHasher;
pub use repository::{FailingUserRepository, InMemoryUserRepository, user_fixture};

pub mod app;

pub use app::{Ctx, make_test_app, seed, send};

//! HTTP gateway to the Mealie server for GroupWarden.
//!
//! [`MealieClient`] implements the `GroupGateway` trait from
//! `groupwarden-core`. Idempotent calls go through a [`RetryPolicy`], which
//! is a single attempt unless configured otherwise.

pub mod mealie;
pub mod retry;

pub use mealie::MealieClient;
pub use retry::RetryPolicy;

pub mod client;
pub mod ids;
pub mod user;

pub use client::{Client, ClientPatch, Location, Step, Zone};
pub use user::{User, UserPatch, UserProfile};

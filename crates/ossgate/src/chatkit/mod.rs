//! ChatKit upstream protocol: event vocabulary, reasoning filter, and client

mod client;
mod event;
mod reasoning;
mod request;

pub use client::{ChatKitClient, UpstreamBody};
pub use event::{Classified, ThreadIdCapture, UpstreamEvent, classify};
pub use reasoning::is_trivial_reasoning;
pub use request::{ThreadRequest, request_headers};

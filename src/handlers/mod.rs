// Handlers by access tier:
// public (no session) → protected (session via extractors) → pages (behind the gatekeeper)

pub mod extract;
pub mod pages;
pub mod protected;
pub mod public;
pub mod utils;

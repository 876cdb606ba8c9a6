pub mod heygen_client;
pub mod render_client;

pub use heygen_client::{AvatarSummary, HeygenRenderClient, RenderDefaults, VoiceSummary};
pub use render_client::RenderJobClient;

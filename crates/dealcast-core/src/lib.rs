pub mod errors;
pub mod events;
pub mod models;
pub mod money;
pub mod normalizer;
pub mod render;
pub mod signature;

pub use errors::RejectionReason;
pub use events::{EventAction, InboundPayload, PayloadFormat, RawEvent};
pub use models::{ClassifiedEvent, DealSnapshot, Intent};
pub use money::format_currency;
pub use normalizer::{Normalizer, classify, normalize};
pub use render::{RenderedField, RenderedMessage, Renderer};
pub use signature::SIGNATURE_HEADER;

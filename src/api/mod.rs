// Metadata inference: the HTTP client, its wire types, and the track form
// that guessed values are applied to.

pub mod metadata;
pub mod models;

pub use metadata::{
    Feedback, FeedbackTone, FormField, GuessSlot, GuessTicket, MetadataClient, TrackForm,
};
pub use models::{GuessData, GuessResponse};

pub mod recording_transport;
pub mod scripted_fetcher;

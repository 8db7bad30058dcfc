use tracing::info;

use crate::channel::{RelayChannel, SimulatedChannel, UpdateChannel};
use crate::config::{self, ChannelBackend};
use crate::error::ChannelError;

/// Build the update channel selected by `channel.backend`.
pub fn build_channel(settings: &config::Settings) -> Result<Box<dyn UpdateChannel>, ChannelError> {
    let channel: Box<dyn UpdateChannel> = match settings.channel.backend {
        ChannelBackend::Simulated => Box::new(SimulatedChannel::new(&settings.simulation)),
        ChannelBackend::Relay => {
            let relay = &settings.relay;
            let feed = relay.feed_path.as_deref().ok_or(ChannelError::MissingFeed)?;
            let sink = relay.sink_path.as_deref().ok_or(ChannelError::MissingSink)?;
            Box::new(RelayChannel::open(feed, sink)?)
        }
    };
    info!(
        backend = channel.name(),
        endpoint = %settings.channel.endpoint,
        "update channel ready"
    );
    Ok(channel)
}

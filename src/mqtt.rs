// MQTT side of the skill. Each publish opens its own connection with
// `rumqttc`, drives the event loop on the calling task until the broker
// acknowledges the message, then disconnects. Nothing is kept between
// directives.
use async_trait::async_trait;
use prometheus::IntCounter;
use rumqttc::{AsyncClient, Event, EventLoop, Incoming, MqttOptions, Outgoing, QoS};
use std::time::Duration;
use tokio::time;

use crate::config::MqttConfig;
use crate::error::SkillError;

const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(2);

#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish `payload` on `topic` and return once the broker has it.
    async fn publish(&self, topic: &str, payload: &str, retain: bool) -> Result<(), SkillError>;
}

pub struct MqttPublisher {
    config: MqttConfig,
    counter_published: IntCounter,
    counter_failed: IntCounter,
}

impl MqttPublisher {
    pub fn new(config: MqttConfig, counter_published: IntCounter, counter_failed: IntCounter) -> Self {
        MqttPublisher {
            config,
            counter_published,
            counter_failed,
        }
    }

    fn options(&self) -> MqttOptions {
        let client_id = client_id(&self.config.client_prefix);
        let mut options = MqttOptions::new(client_id.as_str(), self.config.host.as_str(), self.config.port);
        options.set_keep_alive(self.config.keep_alive);

        if let Some(creds) = &self.config.credentials {
            options.set_credentials(creds.user.as_str(), creds.pass.as_str());
            tracing::debug!("Using MQTT credentials {}:*******", creds.user);
        }

        tracing::info!(
            client_id = %client_id,
            "connecting to MQTT broker at {}:{}",
            self.config.host,
            self.config.port
        );
        options
    }

    /// Connect, publish and wait for the broker's PUBACK. The caller bounds
    /// this with the configured timeout.
    async fn deliver(&self, topic: &str, payload: &str, retain: bool) -> anyhow::Result<(AsyncClient, EventLoop)> {
        let (client, mut eventloop) = AsyncClient::new(self.options(), 10);

        // Queued until the event loop has connected.
        client
            .publish(topic, QoS::AtLeastOnce, retain, payload.as_bytes().to_vec())
            .await?;

        loop {
            match eventloop.poll().await? {
                Event::Incoming(Incoming::ConnAck(ack)) => {
                    tracing::debug!("connected: {:?}", ack.code);
                }
                Event::Incoming(Incoming::PubAck(ack)) => {
                    tracing::debug!(pkid = ack.pkid, "publish acknowledged");
                    return Ok((client, eventloop));
                }
                Event::Incoming(i) => tracing::trace!("Incoming = {i:?}"),
                Event::Outgoing(o) => tracing::trace!("Outgoing = {o:?}"),
            }
        }
    }
}

/// Send DISCONNECT and drive the loop until it is written. The broker
/// closing the socket ends the loop too.
async fn close(client: AsyncClient, mut eventloop: EventLoop) -> anyhow::Result<()> {
    client.disconnect().await?;
    loop {
        match eventloop.poll().await {
            Ok(Event::Outgoing(Outgoing::Disconnect)) | Err(_) => return Ok(()),
            Ok(_) => {}
        }
    }
}

#[async_trait]
impl Publisher for MqttPublisher {
    async fn publish(&self, topic: &str, payload: &str, retain: bool) -> Result<(), SkillError> {
        let delivered = match time::timeout(self.config.timeout, self.deliver(topic, payload, retain)).await {
            Ok(Ok(connection)) => Ok(connection),
            Ok(Err(e)) => Err(SkillError::EndpointUnreachable(format!("{e:#}"))),
            Err(_) => Err(SkillError::PublishTimeout(self.config.timeout)),
        };

        let (client, eventloop) = match delivered {
            Ok(connection) => connection,
            Err(e) => {
                self.counter_failed.inc();
                tracing::error!(topic, "mqtt publish failed: {}", e);
                return Err(e);
            }
        };

        self.counter_published.inc();
        tracing::info!(topic, payload, retain, "data published");

        // The command is already with the broker; a slow DISCONNECT must not
        // turn this into a failure.
        match time::timeout(DISCONNECT_TIMEOUT, close(client, eventloop)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::debug!("mqtt disconnect failed: {:#}", e),
            Err(_) => tracing::debug!("mqtt disconnect not flushed within {:?}", DISCONNECT_TIMEOUT),
        }
        Ok(())
    }
}

/// `<prefix>` followed by eight random hex digits, unique per connection.
pub fn client_id(prefix: &str) -> String {
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!("{}{}", prefix, &random[..8])
}

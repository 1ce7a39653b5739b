//! LogSink - logs message summary via tracing

use contracts::{ContractError, Envelope, MessageSink, Payload};
use tracing::{info, instrument};

/// Sink that logs message summaries for debugging
pub struct LogSink {
    name: String,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn log_summary(&self, envelope: &Envelope) {
        let (x, y, z) = match &envelope.payload {
            Payload::Pose(msg) => {
                let p = msg.pose.position;
                (p.x, p.y, p.z)
            }
            Payload::Pose2d(msg) => (msg.x, msg.y, msg.theta),
            Payload::Odometry(msg) => {
                let p = msg.pose.pose.position;
                (p.x, p.y, p.z)
            }
            Payload::Transform(msg) => {
                let t = msg.transform.translation;
                (t.x, t.y, t.z)
            }
        };

        info!(
            sink = %self.name,
            topic = %envelope.topic,
            seq = envelope.seq,
            kind = envelope.payload.kind().as_str(),
            x,
            y,
            z,
            "Message published"
        );
    }
}

impl MessageSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, envelope),
        fields(sink = %self.name, topic = %envelope.topic)
    )]
    async fn write(&mut self, envelope: &Envelope) -> Result<(), ContractError> {
        self.log_summary(envelope);
        Ok(())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, "LogSink closed");
        Ok(())
    }
}

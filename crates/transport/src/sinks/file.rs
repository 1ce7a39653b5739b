//! FileSink - appends messages to per-topic JSONL files

use contracts::{ContractError, Envelope, MessageSink};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, instrument};

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Base output directory
    pub base_path: PathBuf,
}

impl FileSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let base_path = params
            .get("base_path")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./output"));

        Self { base_path }
    }
}

/// Sink that writes one JSON line per message, one file per topic
pub struct FileSink {
    name: String,
    config: FileSinkConfig,
    writers: HashMap<String, BufWriter<File>>,
}

impl FileSink {
    /// Create a new FileSink
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        fs::create_dir_all(&config.base_path)?;

        Ok(Self {
            name: name.into(),
            config,
            writers: HashMap::new(),
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        let config = FileSinkConfig::from_params(params);
        Self::new(name, config)
    }

    /// File that holds messages for `topic`
    pub fn topic_path(base_path: &Path, topic: &str) -> PathBuf {
        let stem: String = topic
            .trim_matches('/')
            .chars()
            .map(|c| if c == '/' { '.' } else { c })
            .collect();
        base_path.join(format!("{stem}.jsonl"))
    }

    fn append(&mut self, envelope: &Envelope) -> std::io::Result<()> {
        if !self.writers.contains_key(&envelope.topic) {
            let path = Self::topic_path(&self.config.base_path, &envelope.topic);
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            debug!(sink = %self.name, path = %path.display(), "Opened topic file");
            self.writers
                .insert(envelope.topic.clone(), BufWriter::new(file));
        }

        if let Some(writer) = self.writers.get_mut(&envelope.topic) {
            serde_json::to_writer(&mut *writer, envelope)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            writer.write_all(b"\n")?;
        }
        Ok(())
    }

    fn flush_all(&mut self) -> std::io::Result<()> {
        for writer in self.writers.values_mut() {
            writer.flush()?;
        }
        Ok(())
    }
}

impl MessageSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_write",
        skip(self, envelope),
        fields(sink = %self.name, topic = %envelope.topic)
    )]
    async fn write(&mut self, envelope: &Envelope) -> Result<(), ContractError> {
        self.append(envelope).map_err(|e| {
            error!(sink = %self.name, seq = envelope.seq, error = %e, "Write failed");
            ContractError::sink_write(&self.name, e.to_string())
        })
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        self.flush_all()
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        self.flush_all()?;
        self.writers.clear();
        debug!(sink = %self.name, "FileSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Header, Payload, Point, Pose, PoseStamped, Quaternion, Stamp};
    use tempfile::tempdir;

    fn pose_envelope(topic: &str, seq: u64) -> Envelope {
        Envelope {
            topic: topic.into(),
            seq,
            payload: Payload::Pose(PoseStamped {
                header: Header::new(Stamp::new(5, 0), "world"),
                pose: Pose::new(Point::new(1.0, 2.0, 3.0), Quaternion::IDENTITY),
            }),
        }
    }

    #[test]
    fn test_topic_path() {
        let path = FileSink::topic_path(Path::new("/out"), "/drone/pose");
        assert_eq!(path, PathBuf::from("/out/drone.pose.jsonl"));
    }

    #[tokio::test]
    async fn test_file_sink_write() {
        let dir = tempdir().unwrap();
        let config = FileSinkConfig {
            base_path: dir.path().to_path_buf(),
        };

        let mut sink = FileSink::new("test_file", config).unwrap();
        sink.write(&pose_envelope("drone/pose", 1)).await.unwrap();
        sink.write(&pose_envelope("drone/pose", 2)).await.unwrap();
        sink.write(&pose_envelope("tf", 1)).await.unwrap();
        sink.close().await.unwrap();

        let pose_file = fs::read_to_string(dir.path().join("drone.pose.jsonl")).unwrap();
        let lines: Vec<_> = pose_file.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: Envelope = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(parsed.seq, 2);
        assert_eq!(parsed, pose_envelope("drone/pose", 2));

        assert!(dir.path().join("tf.jsonl").exists());
    }
}

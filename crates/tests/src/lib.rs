//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 分发场景测试 (MemoryTransport 观测)
//! - 模拟 e2e 测试（配置 → 帧源 → 分发器 → sink）

#[cfg(test)]
mod contract_tests {
    use contracts::{MocapFrame, Payload, Point, Pose, Quaternion, RigidBody, Stamp, Version};

    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
        assert_eq!(contracts::TF_TOPIC, "tf");
    }

    #[test]
    fn test_frame_json_shape() {
        let frame = MocapFrame {
            frame_number: 7,
            stamp: Stamp::new(12, 500),
            rigid_bodies: vec![RigidBody::new(
                3,
                Pose::new(Point::new(1.0, 2.0, 3.0), Quaternion::IDENTITY),
            )],
        };
        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(value["frame_number"], 7);
        assert_eq!(value["stamp"]["sec"], 12);
        assert_eq!(value["rigid_bodies"][0]["id"], 3);
        assert_eq!(value["rigid_bodies"][0]["tracking_valid"], true);
    }

    #[test]
    fn test_version_threshold_ordering() {
        let threshold: Version = "1.7".parse().unwrap();
        assert!("1.6.9".parse::<Version>().unwrap() < threshold);
        assert!("2.0".parse::<Version>().unwrap() > threshold);
        assert_eq!(dispatcher::convert::CURRENT_CONVENTION_SINCE, threshold);
    }

    #[test]
    fn test_payload_kind_names() {
        let payload = Payload::Pose2d(Default::default());
        assert_eq!(payload.kind().as_str(), "pose2d");
    }
}

#[cfg(test)]
mod scenario_tests {
    use contracts::{
        MessageKind, Payload, Point, Pose, Quaternion, RigidBody, RigidBodyConfig, Stamp,
        Version,
    };
    use dispatcher::PublishDispatcher;
    use transport::MemoryTransport;

    fn body(id: i32, x: f64, y: f64, z: f64) -> RigidBody {
        RigidBody::new(id, Pose::new(Point::new(x, y, z), Quaternion::IDENTITY))
    }

    fn dispatcher_for(version: Version, transport: &MemoryTransport) -> PublishDispatcher {
        PublishDispatcher::new(
            transport,
            &version,
            [RigidBodyConfig::all_channels(3, "world", "body3")],
        )
        .unwrap()
    }

    /// id 3 fully enabled, id 7 unconfigured
    #[test]
    fn test_current_convention_fan_out() {
        let transport = MemoryTransport::new();
        let mut dispatcher = dispatcher_for(Version::new(2, 0), &transport);

        let stamp = Stamp::new(100, 42);
        dispatcher.publish(stamp, &[body(3, 1.0, 2.0, 3.0), body(7, 9.0, 9.0, 9.0)]);

        assert_eq!(transport.total_messages(), 4);
        for kind in [
            MessageKind::Pose,
            MessageKind::Pose2d,
            MessageKind::Odometry,
            MessageKind::Transform,
        ] {
            assert_eq!(transport.count_kind(kind), 1, "{kind:?}");
        }

        let Payload::Pose(pose) = &transport.messages_on("rigid_body_3/pose")[0] else {
            panic!("expected pose");
        };
        assert_eq!(pose.header.stamp, stamp);
        assert_eq!(pose.header.frame_id, "world");
        assert_eq!(pose.pose.position, Point::new(1.0, 2.0, 3.0));

        let Payload::Pose2d(pose2d) = &transport.messages_on("rigid_body_3/pose2d")[0] else {
            panic!("expected pose2d");
        };
        assert_eq!((pose2d.x, pose2d.y), (1.0, 2.0));
        assert!(pose2d.theta.abs() < 1e-12);

        let Payload::Odometry(odom) = &transport.messages_on("rigid_body_3/odom")[0] else {
            panic!("expected odometry");
        };
        assert_eq!(odom.child_frame_id, "body3");
        assert!(odom.pose.covariance.iter().all(|c| *c == 0.0));

        let Payload::Transform(tf) = &transport.messages_on("tf")[0] else {
            panic!("expected transform");
        };
        assert_eq!(tf.header.frame_id, "world");
        assert_eq!(tf.child_frame_id, "body3");
        assert_eq!(tf.transform.translation.x, 1.0);
        assert_eq!(tf.transform.translation.z, 3.0);

        let stats = dispatcher.stats();
        assert_eq!(stats.bodies_forwarded, 1);
        assert_eq!(stats.bodies_unconfigured, 1);
    }

    #[test]
    fn test_legacy_convention_remaps_axes() {
        let transport = MemoryTransport::new();
        let mut dispatcher = dispatcher_for(Version::new(1, 0), &transport);

        dispatcher.publish(Stamp::default(), &[body(3, 1.0, 2.0, 3.0)]);

        let Payload::Pose(pose) = &transport.messages_on("rigid_body_3/pose")[0] else {
            panic!("expected pose");
        };
        assert_eq!(pose.pose.position, Point::new(1.0, -3.0, 2.0));
    }

    #[test]
    fn test_nan_position_writes_nothing() {
        let transport = MemoryTransport::new();
        let mut dispatcher = dispatcher_for(Version::new(2, 0), &transport);

        dispatcher.publish(Stamp::default(), &[body(3, f64::NAN, 0.0, 0.0)]);

        assert_eq!(transport.total_messages(), 0);
        let sink = dispatcher.sink(3).unwrap();
        assert_eq!(sink.stats().skipped_nan, 1);
    }

    #[test]
    fn test_untracked_body_does_not_block_others() {
        let transport = MemoryTransport::new();
        let mut dispatcher = PublishDispatcher::new(
            &transport,
            &Version::new(3, 0),
            [
                RigidBodyConfig::new(1, "world", "a"),
                RigidBodyConfig::new(2, "world", "b"),
            ],
        )
        .unwrap();

        dispatcher.publish(
            Stamp::default(),
            &[RigidBody::untracked(1), body(2, 0.5, 0.5, 0.5)],
        );

        assert!(transport.messages_on("rigid_body_1/pose").is_empty());
        assert_eq!(transport.messages_on("rigid_body_2/pose").len(), 1);
        // tf is shared; only body 2 wrote to it
        assert_eq!(transport.messages_on("tf").len(), 1);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashMap;
    use std::fs;
    use std::io::BufRead;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{MessageKind, SinkConfig, SinkType};
    use dispatcher::PublishDispatcher;
    use ingestion::{source_from_config, FrameSource, MockFrameSource, MockSourceConfig};
    use observability::RelayMetricsAggregator;
    use transport::{FileSink, MemoryTransport, QueuedTransport};

    const CONFIG: &str = r#"
[capture]
natnet_version = "3.0"
source = "mock"
frequency_hz = 500.0

[[rigid_bodies]]
rigid_body_id = 1
parent_frame_id = "world"
child_frame_id = "drone"
publish_pose2d = true

[[rigid_bodies]]
rigid_body_id = 2
parent_frame_id = "world"
child_frame_id = "cart"
publish_tf = false
publish_odom = true
odom_topic = "cart/odom"
"#;

    /// Config → MockFrameSource → PublishDispatcher → MemoryTransport
    #[tokio::test]
    async fn test_e2e_mock_pipeline() {
        let blueprint = ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap();

        let transport = MemoryTransport::new();
        let mut dispatcher = PublishDispatcher::new(
            &transport,
            &blueprint.capture.natnet_version,
            blueprint.rigid_bodies.clone(),
        )
        .unwrap();

        // body 3 is produced but never configured
        let source = MockFrameSource::new(MockSourceConfig {
            frequency_hz: blueprint.capture.frequency_hz,
            body_ids: vec![1, 2, 3],
            ..Default::default()
        })
        .unwrap();
        let mut rx = source.start(32, None).unwrap();

        let mut aggregator = RelayMetricsAggregator::new();
        for _ in 0..5 {
            let frame = rx.recv().await.unwrap();
            dispatcher.publish_frame(&frame);
            aggregator.update(&frame, 0.0);
        }
        source.stop();

        // body 1: pose + pose2d + tf, body 2: pose + odom
        assert_eq!(transport.count_kind(MessageKind::Pose), 10);
        assert_eq!(transport.count_kind(MessageKind::Pose2d), 5);
        assert_eq!(transport.count_kind(MessageKind::Transform), 5);
        assert_eq!(transport.messages_on("cart/odom").len(), 5);
        assert_eq!(transport.total_messages(), 25);

        let stats = dispatcher.stats();
        assert_eq!(stats.frames, 5);
        assert_eq!(stats.bodies_unconfigured, 5);
        assert_eq!(aggregator.body_counts.get(&3), Some(&5));
    }

    /// Dropout frames produce nothing for the degraded bodies
    #[test]
    fn test_e2e_mock_dropouts_filtered() {
        let transport = MemoryTransport::new();
        let mut dispatcher = PublishDispatcher::new(
            &transport,
            &contracts::Version::new(3, 0),
            [
                contracts::RigidBodyConfig::new(1, "world", "a"),
                contracts::RigidBodyConfig::new(2, "world", "b"),
            ],
        )
        .unwrap();

        let config = MockSourceConfig {
            body_ids: vec![1, 2],
            dropout_every: 1,
            ..Default::default()
        };
        // every frame: one body untracked, the other NaN
        let frame = config.generate(1, contracts::Stamp::default(), 0.0);
        dispatcher.publish_frame(&frame);

        assert_eq!(transport.total_messages(), 0);
        let skipped: u64 = dispatcher.sinks().map(|s| s.stats().skipped()).sum();
        assert_eq!(skipped, 2);
    }

    /// `mock_dropout_every` in the config reaches the running mock source
    #[tokio::test]
    async fn test_e2e_config_dropouts_filtered() {
        let content = CONFIG.replace(
            "frequency_hz = 500.0",
            "frequency_hz = 500.0\nmock_dropout_every = 2",
        );
        let blueprint = ConfigLoader::load_from_str(&content, ConfigFormat::Toml).unwrap();
        assert_eq!(blueprint.capture.mock_dropout_every, 2);

        let transport = MemoryTransport::new();
        let mut dispatcher = PublishDispatcher::new(
            &transport,
            &blueprint.capture.natnet_version,
            blueprint.rigid_bodies.clone(),
        )
        .unwrap();

        let source = source_from_config(&blueprint.capture, &blueprint.rigid_body_ids()).unwrap();
        let mut rx = source.start(32, None).unwrap();
        for _ in 0..4 {
            let frame = rx.recv().await.unwrap();
            dispatcher.publish_frame(&frame);
        }
        source.stop();

        // frames 2 and 4 lose both bodies
        let stats = dispatcher.stats();
        assert_eq!(stats.frames, 4);
        let skipped: u64 = dispatcher.sinks().map(|s| s.stats().skipped()).sum();
        assert_eq!(skipped, 4);
        assert_eq!(transport.total_messages(), 10);
    }

    /// Rates with no usable frame period never reach a running source
    #[test]
    fn test_unusable_capture_rates_rejected() {
        for (key, value) in [
            ("frequency_hz", "inf"),
            ("frequency_hz", "1e-300"),
            ("replay_speed", "inf"),
            ("replay_speed", "1e-300"),
        ] {
            let capture_line = if key == "frequency_hz" {
                format!("frequency_hz = {value}")
            } else {
                format!("frequency_hz = 500.0\n{key} = {value}")
            };
            let content = CONFIG.replace("frequency_hz = 500.0", &capture_line);
            let err = ConfigLoader::load_from_str(&content, ConfigFormat::Toml)
                .expect_err("capture rate accepted");
            assert!(err.to_string().contains(key), "{key} = {value}: {err}");
        }

        let capture = contracts::CaptureConfig {
            frequency_hz: f64::INFINITY,
            ..Default::default()
        };
        assert!(source_from_config(&capture, &[1]).is_err());
    }

    /// QueuedTransport + FileSink: one JSONL file per topic
    #[tokio::test]
    async fn test_e2e_file_sink() {
        let dir = tempfile::tempdir().unwrap();
        let blueprint = ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap();

        let mut params = HashMap::new();
        params.insert(
            "base_path".to_string(),
            dir.path().to_string_lossy().into_owned(),
        );
        let sinks = [SinkConfig {
            name: "files".into(),
            sink_type: SinkType::File,
            queue_capacity: 1000,
            params,
        }];

        let transport = QueuedTransport::from_configs(&sinks).await.unwrap();
        let mut dispatcher = PublishDispatcher::new(
            &transport,
            &blueprint.capture.natnet_version,
            blueprint.rigid_bodies.clone(),
        )
        .unwrap();

        let config = MockSourceConfig {
            body_ids: vec![1, 2],
            ..Default::default()
        };
        for n in 1..=3 {
            let frame = config.generate(n, contracts::Stamp::new(10, 0), n as f64 * 0.01);
            dispatcher.publish_frame(&frame);
        }
        drop(dispatcher);
        let finals = transport.shutdown().await;
        assert_eq!(finals[0].1.written, 15);

        let pose_file = FileSink::topic_path(dir.path(), "rigid_body_1/pose");
        let lines: Vec<String> = std::io::BufReader::new(fs::File::open(&pose_file).unwrap())
            .lines()
            .map(|l| l.unwrap())
            .collect();
        assert_eq!(lines.len(), 3);

        let first: contracts::Envelope = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(first.topic, "rigid_body_1/pose");
        assert_eq!(first.payload.kind(), MessageKind::Pose);

        assert!(FileSink::topic_path(dir.path(), "cart/odom").exists());
        assert!(FileSink::topic_path(dir.path(), "tf").exists());
        assert!(!FileSink::topic_path(dir.path(), "rigid_body_2/pose2d").exists());
    }
}

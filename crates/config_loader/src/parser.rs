//! 配置解析模块
//!
//! 支持 TOML (主要) 和 JSON (可选) 格式。

use contracts::{ContractError, RelayBlueprint};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式 (推荐)
    Toml,
    /// JSON 格式
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// 解析 TOML 格式配置
pub fn parse_toml(content: &str) -> Result<RelayBlueprint, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 解析 JSON 格式配置
pub fn parse_json(content: &str) -> Result<RelayBlueprint, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 根据格式解析配置
pub fn parse(content: &str, format: ConfigFormat) -> Result<RelayBlueprint, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{SinkType, SourceKind, Version};

    #[test]
    fn test_parse_toml_minimal() {
        let content = r#"
[capture]
natnet_version = "2.10"

[[rigid_bodies]]
rigid_body_id = 1
parent_frame_id = "world"
child_frame_id = "drone"
publish_pose2d = true

[[sinks]]
name = "log_sink"
sink_type = "log"
"#;
        let result = parse_toml(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.capture.natnet_version, Version::new(2, 10));
        assert_eq!(bp.capture.source, SourceKind::Mock);
        assert_eq!(bp.rigid_bodies.len(), 1);
        assert!(bp.rigid_bodies[0].publish_pose);
        assert!(bp.rigid_bodies[0].publish_pose2d);
        assert!(!bp.rigid_bodies[0].publish_odom);
        assert_eq!(bp.sinks[0].queue_capacity, 1000);
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "capture": { "natnet_version": "3.1", "source": "replay", "replay_path": "rec.jsonl" },
            "rigid_bodies": [{
                "rigid_body_id": 7,
                "parent_frame_id": "map",
                "child_frame_id": "base_link",
                "publish_odom": true,
                "odom_topic": "odom"
            }],
            "sinks": [{ "name": "udp", "sink_type": "network", "params": { "addr": "127.0.0.1:9000" } }]
        }"#;
        let result = parse_json(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.capture.source, SourceKind::Replay);
        assert_eq!(bp.rigid_bodies[0].odom_topic_name(), "odom");
        assert_eq!(bp.sinks[0].sink_type, SinkType::Network);
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let content = "invalid toml [[[";
        let result = parse_toml(content);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_parse_bad_version() {
        let content = r#"
[capture]
natnet_version = "three"
"#;
        let err = parse_toml(content).unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_extension("toml"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("TOML"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("json"),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}

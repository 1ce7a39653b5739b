//! 配置校验模块
//!
//! 校验规则：
//! - 字段级规则 (`validator` derive)：非空名称、frequency_hz > 0、queue_capacity >= 1
//! - frequency_hz / replay_speed 必须是有限值，且换算出的周期可表示且非零
//! - replay 模式必须给出 replay_path
//! - 启用 odom / tf 时 child_frame_id 不能为空
//! - sink 名称唯一
//!
//! 重复的 rigid_body_id 不是错误 (后者覆盖前者)，只产生警告。

use std::collections::{HashMap, HashSet};

use tracing::debug;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use contracts::{ContractError, RelayBlueprint, SourceKind};

/// 校验 RelayBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &RelayBlueprint) -> Result<(), ContractError> {
    validate_fields(blueprint)?;
    validate_capture(blueprint)?;
    validate_rigid_bodies(blueprint)?;
    validate_sinks(blueprint)?;
    debug!(
        rigid_bodies = blueprint.rigid_bodies.len(),
        sinks = blueprint.sinks.len(),
        "Configuration validated"
    );
    Ok(())
}

/// 非致命问题
pub fn collect_warnings(blueprint: &RelayBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.rigid_bodies.is_empty() {
        warnings.push("No rigid bodies configured - nothing will be published".to_string());
    }

    if blueprint.sinks.is_empty() {
        warnings.push("No sinks configured - published messages will be discarded".to_string());
    }

    let mut counts: HashMap<i32, usize> = HashMap::new();
    for body in &blueprint.rigid_bodies {
        *counts.entry(body.rigid_body_id).or_default() += 1;
    }
    let mut duplicates: Vec<_> = counts.into_iter().filter(|(_, n)| *n > 1).collect();
    duplicates.sort_unstable();
    for (id, n) in duplicates {
        warnings.push(format!(
            "rigid_body_id {id} is configured {n} times - only the last entry is used"
        ));
    }

    for body in &blueprint.rigid_bodies {
        if !body.has_any_channel() {
            warnings.push(format!(
                "Rigid body {} has every output disabled",
                body.rigid_body_id
            ));
        }
    }

    warnings
}

/// 字段级规则
fn validate_fields(blueprint: &RelayBlueprint) -> Result<(), ContractError> {
    blueprint.validate().map_err(|errors| {
        let (field, message) = first_violation(&errors, "")
            .unwrap_or_else(|| ("<root>".to_string(), errors.to_string()));
        ContractError::config_validation(field, message)
    })
}

fn first_violation(errors: &ValidationErrors, prefix: &str) -> Option<(String, String)> {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    for (field, kind) in fields {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };

        let found = match kind {
            ValidationErrorsKind::Field(errs) => errs.first().map(|e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                (path.clone(), message)
            }),
            ValidationErrorsKind::Struct(inner) => first_violation(inner, &path),
            ValidationErrorsKind::List(items) => items
                .iter()
                .find_map(|(idx, inner)| first_violation(inner, &format!("{path}[{idx}]"))),
        };

        if found.is_some() {
            return found;
        }
    }
    None
}

/// 校验采集源配置
fn validate_capture(blueprint: &RelayBlueprint) -> Result<(), ContractError> {
    let capture = &blueprint.capture;
    if capture.frame_period().is_none() {
        return Err(ContractError::config_validation(
            "capture.frequency_hz",
            format!(
                "frequency_hz must be finite with a representable non-zero period, got {}",
                capture.frequency_hz
            ),
        ));
    }
    if capture.replay_second().is_none() {
        return Err(ContractError::config_validation(
            "capture.replay_speed",
            format!(
                "replay_speed must be finite and give a representable frame spacing, got {}",
                capture.replay_speed
            ),
        ));
    }
    if capture.source == SourceKind::Replay && capture.replay_path.is_none() {
        return Err(ContractError::config_validation(
            "capture.replay_path",
            "replay_path is required when source = \"replay\"",
        ));
    }
    Ok(())
}

/// 校验刚体输出配置
fn validate_rigid_bodies(blueprint: &RelayBlueprint) -> Result<(), ContractError> {
    for (idx, body) in blueprint.rigid_bodies.iter().enumerate() {
        if (body.publish_odom || body.publish_tf) && body.child_frame_id.is_empty() {
            return Err(ContractError::config_validation(
                format!("rigid_bodies[{idx}].child_frame_id"),
                format!(
                    "child_frame_id is required for rigid body {} when odom or tf is enabled",
                    body.rigid_body_id
                ),
            ));
        }
    }
    Ok(())
}

/// 校验 sink 配置
fn validate_sinks(blueprint: &RelayBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, sink) in blueprint.sinks.iter().enumerate() {
        if !seen.insert(sink.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("sinks[{idx}].name"),
                format!("duplicate sink name '{}'", sink.name),
            ));
        }
    }
    Ok(())
}

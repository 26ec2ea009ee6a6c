// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::sync_job::JobAction;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// 句柄校验请求
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct VerifyHandleDto {
    /// 站点标识
    #[validate(length(min = 1, max = 32))]
    pub site: String,
    /// 站点用户名
    #[validate(length(min = 1, max = 64), custom(function = "validate_handle"))]
    pub handle: String,
}

/// 抓取请求
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct FetchRequestDto {
    /// 站点标识
    #[validate(length(min = 1, max = 32))]
    pub site: String,
    /// 请求的动作，默认更新资料
    #[serde(default)]
    pub action: JobAction,
}

/// 句柄校验结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleVerification {
    Valid,
    Invalid,
}

/// 句柄只能包含字母、数字以及 `_`、`-`、`.`
fn validate_handle(handle: &str) -> Result<(), ValidationError> {
    if handle
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_handle"))
    }
}

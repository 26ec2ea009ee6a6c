// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::{
    application::dto::sync_request::{FetchRequestDto, HandleVerification, VerifyHandleDto},
    domain::{
        models::{
            profile::Handle,
            sync_job::{JobAction, SyncJob},
        },
        repositories::profile_repository::{ProfileRepository, RepositoryError},
        site::SiteError,
    },
    infrastructure::sites::registry::{AdapterRegistry, RegistryError},
    queue::sync_queue::{Admission, JobQueue},
};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

const UNAVAILABLE_MESSAGE: &str = "service temporarily unavailable";

#[derive(Error, Debug)]
pub enum UseCaseError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("Unknown site: {0}")]
    UnknownSite(String),
    #[error("Handle '{handle}' does not exist on {site}")]
    HandleNotFound { site: String, handle: String },
    #[error("No {site} handle attached")]
    NoHandle { site: String },
    #[error("Handle already attached: {0}")]
    HandleAlreadyAttached(String),
    #[error("Site unavailable: {0}")]
    Unavailable(#[from] SiteError),
    #[error("Repository error: {0}")]
    Repository(RepositoryError),
    #[error("Registry error: {0}")]
    Registry(RegistryError),
}

impl From<RegistryError> for UseCaseError {
    fn from(error: RegistryError) -> Self {
        match error {
            RegistryError::UnknownSite(site) => UseCaseError::UnknownSite(site),
            other => UseCaseError::Registry(other),
        }
    }
}

impl From<RepositoryError> for UseCaseError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::AlreadyExists(detail) => UseCaseError::HandleAlreadyAttached(detail),
            other => UseCaseError::Repository(other),
        }
    }
}

impl UseCaseError {
    /// 面向用户的错误描述
    ///
    /// 传输、解析和存储错误统一为通用提示
    pub fn user_message(&self) -> String {
        match self {
            UseCaseError::Validation(e) => format!("invalid request: {}", e),
            UseCaseError::UnknownSite(site) => format!("site '{}' is not supported", site),
            UseCaseError::HandleNotFound { site, handle } => {
                format!("handle '{}' does not exist on {}", handle, site)
            }
            UseCaseError::NoHandle { site } => format!("no {} handle attached", site),
            UseCaseError::HandleAlreadyAttached(_) => {
                "a different handle is already attached for this site".to_string()
            }
            UseCaseError::Unavailable(_) | UseCaseError::Repository(_) | UseCaseError::Registry(_) => {
                UNAVAILABLE_MESSAGE.to_string()
            }
        }
    }
}

/// 资料同步用例
///
/// 请求路径上的入口：同步校验句柄，或把抓取请求投递到队列
pub struct ProfileSyncUseCase<Q, R>
where
    Q: JobQueue,
    R: ProfileRepository,
{
    registry: Arc<AdapterRegistry>,
    queue: Arc<Q>,
    repository: Arc<R>,
}

impl<Q, R> ProfileSyncUseCase<Q, R>
where
    Q: JobQueue,
    R: ProfileRepository,
{
    pub fn new(registry: Arc<AdapterRegistry>, queue: Arc<Q>, repository: Arc<R>) -> Self {
        Self {
            registry,
            queue,
            repository,
        }
    }

    /// 校验句柄是否存在
    ///
    /// 只有站点明确报告不存在时才返回 `Invalid`
    pub async fn verify_handle(
        &self,
        dto: VerifyHandleDto,
    ) -> Result<HandleVerification, UseCaseError> {
        dto.validate()?;
        let adapter = self
            .registry
            .resolve(&dto.site, &dto.handle, CancellationToken::new())?;

        match adapter.check_handle().await {
            Ok(true) => Ok(HandleVerification::Valid),
            Ok(false) => Ok(HandleVerification::Invalid),
            Err(e) => {
                warn!(site = %dto.site, handle = %dto.handle, "Handle verification failed: {}", e);
                Err(UseCaseError::Unavailable(e))
            }
        }
    }

    /// 请求抓取
    ///
    /// 未知站点在触碰队列之前就被拒绝；准入拒绝以 `Admission { accepted: false }` 返回
    pub async fn request_fetch(
        &self,
        user_id: Uuid,
        dto: FetchRequestDto,
    ) -> Result<Admission, UseCaseError> {
        dto.validate()?;
        if !self.registry.is_supported(&dto.site) {
            return Err(UseCaseError::UnknownSite(dto.site));
        }

        let site = dto.site.to_lowercase();
        if self.repository.get_handle(user_id, &site).await?.is_none() {
            return Err(UseCaseError::NoHandle { site });
        }

        let admission = Admission::from(self.queue.enqueue(SyncJob::new(user_id, site, dto.action)));
        Ok(admission)
    }

    /// 校验并绑定句柄，成功后投递首次同步
    pub async fn attach_handle(
        &self,
        user_id: Uuid,
        dto: VerifyHandleDto,
    ) -> Result<Admission, UseCaseError> {
        let site = dto.site.to_lowercase();
        let handle = dto.handle.clone();

        if self.verify_handle(dto).await? == HandleVerification::Invalid {
            return Err(UseCaseError::HandleNotFound { site, handle });
        }

        self.repository
            .attach_handle(user_id, Handle::new(site.clone(), handle.clone()))
            .await?;
        info!(%user_id, %site, %handle, "Handle attached");

        let admission = Admission::from(self.queue.enqueue(SyncJob::new(
            user_id,
            site,
            JobAction::AddOrUpdateProfile,
        )));
        Ok(admission)
    }
}

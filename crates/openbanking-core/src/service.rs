//! Service profiles
//!
//! A deployment runs exactly one implementation, chosen once at startup
//! from [`ServiceProfile`].

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use openbanking_client::RemoteBankingGateway;
use openbanking_db::CredentialStore;
use openbanking_types::{
    AccessToken, DepositRequest, InquiryReceiveRequest, InquiryReceiveResult, LinkageRecord,
    MemberId, TransactionResult, WithdrawRequest,
};

use crate::config::{OpenBankingConfig, ServiceProfile};
use crate::error::{OpenBankingError, OpenBankingResult};
use crate::facade::{TransactionFacade, UserInfo};
use crate::linker::{AuthToken, AuthorizationLinker};

/// Everything the platform can ask of open banking
#[async_trait]
pub trait OpenBankingService: Send + Sync {
    fn profile(&self) -> ServiceProfile;

    async fn begin_linkage(&self, state: &str, member_id: MemberId)
        -> OpenBankingResult<LinkageRecord>;

    async fn complete_linkage(&self, state: &str, code: &str) -> OpenBankingResult<AuthToken>;

    async fn deposit(&self, request: DepositRequest) -> OpenBankingResult<TransactionResult>;

    async fn withdraw(&self, request: WithdrawRequest) -> OpenBankingResult<TransactionResult>;

    async fn inquiry_receive(
        &self,
        request: InquiryReceiveRequest,
    ) -> OpenBankingResult<InquiryReceiveResult>;

    async fn get_user_info(
        &self,
        access_token: &AccessToken,
        user_seq_no: &str,
    ) -> OpenBankingResult<UserInfo>;
}

/// Linker and facade over the remote gateway
pub struct ExternalOpenBankingService {
    linker: AuthorizationLinker,
    facade: TransactionFacade,
}

impl ExternalOpenBankingService {
    pub fn new(
        config: &OpenBankingConfig,
        store: Arc<dyn CredentialStore>,
        gateway: Arc<dyn RemoteBankingGateway>,
    ) -> Self {
        Self {
            linker: AuthorizationLinker::new(
                store,
                gateway.clone(),
                config.client.clone(),
                config.exchange_lease(),
            ),
            facade: TransactionFacade::new(
                gateway,
                config.settlement_account.clone(),
                config.institution_code.clone(),
            ),
        }
    }
}

#[async_trait]
impl OpenBankingService for ExternalOpenBankingService {
    fn profile(&self) -> ServiceProfile {
        ServiceProfile::External
    }

    async fn begin_linkage(
        &self,
        state: &str,
        member_id: MemberId,
    ) -> OpenBankingResult<LinkageRecord> {
        self.linker.begin_linkage(state, member_id).await
    }

    async fn complete_linkage(&self, state: &str, code: &str) -> OpenBankingResult<AuthToken> {
        self.linker.complete_linkage(state, code).await
    }

    async fn deposit(&self, request: DepositRequest) -> OpenBankingResult<TransactionResult> {
        self.facade.deposit(request).await
    }

    async fn withdraw(&self, request: WithdrawRequest) -> OpenBankingResult<TransactionResult> {
        self.facade.withdraw(request).await
    }

    async fn inquiry_receive(
        &self,
        request: InquiryReceiveRequest,
    ) -> OpenBankingResult<InquiryReceiveResult> {
        self.facade.inquiry_receive(request).await
    }

    async fn get_user_info(
        &self,
        access_token: &AccessToken,
        user_seq_no: &str,
    ) -> OpenBankingResult<UserInfo> {
        self.facade.get_user_info(access_token, user_seq_no).await
    }
}

/// Open banking switched off; every call says so
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledOpenBankingService;

fn disabled<T>(operation: &'static str) -> OpenBankingResult<T> {
    Err(OpenBankingError::FeatureDisabled { operation })
}

#[async_trait]
impl OpenBankingService for DisabledOpenBankingService {
    fn profile(&self) -> ServiceProfile {
        ServiceProfile::Disabled
    }

    async fn begin_linkage(
        &self,
        _state: &str,
        _member_id: MemberId,
    ) -> OpenBankingResult<LinkageRecord> {
        disabled("begin_linkage")
    }

    async fn complete_linkage(&self, _state: &str, _code: &str) -> OpenBankingResult<AuthToken> {
        disabled("complete_linkage")
    }

    async fn deposit(&self, _request: DepositRequest) -> OpenBankingResult<TransactionResult> {
        disabled("deposit")
    }

    async fn withdraw(&self, _request: WithdrawRequest) -> OpenBankingResult<TransactionResult> {
        disabled("withdraw")
    }

    async fn inquiry_receive(
        &self,
        _request: InquiryReceiveRequest,
    ) -> OpenBankingResult<InquiryReceiveResult> {
        disabled("inquiry_receive")
    }

    async fn get_user_info(
        &self,
        _access_token: &AccessToken,
        _user_seq_no: &str,
    ) -> OpenBankingResult<UserInfo> {
        disabled("get_user_info")
    }
}

/// Build the service for the configured profile.
///
/// The configuration is validated first, so a misconfigured external profile
/// fails at startup rather than on the first callback.
pub fn build_service(
    config: &OpenBankingConfig,
    store: Arc<dyn CredentialStore>,
    gateway: Arc<dyn RemoteBankingGateway>,
) -> OpenBankingResult<Arc<dyn OpenBankingService>> {
    config.validate()?;

    info!(profile = %config.profile, "Building open banking service");
    let service: Arc<dyn OpenBankingService> = match config.profile {
        ServiceProfile::External => Arc::new(ExternalOpenBankingService::new(config, store, gateway)),
        ServiceProfile::Disabled => Arc::new(DisabledOpenBankingService),
    };
    Ok(service)
}

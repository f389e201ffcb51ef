//! Poller wiring for unit tests.

use std::sync::Arc;

use crate::config::{WatchSettings, WatchedRepository};
use crate::github::{
    ApiBase, FetchError, GatewayConnector, MockPullRequestGateway, PersonalAccessToken,
    PullRequestGateway, RepositoryFullName,
};
use crate::notify::test_support::{RecordingBadgeSink, RecordingTransport};
use crate::persistence::MemorySnapshotStore;
use crate::telemetry::test_support::RecordingTelemetrySink;

use super::cycle::{Collaborators, Poller};
use super::policy::RepoNotificationPolicy;

/// Connector handing out one pre-built gateway.
pub struct StaticConnector(pub Arc<dyn PullRequestGateway>);

impl GatewayConnector for StaticConnector {
    fn connect(
        &self,
        _token: &PersonalAccessToken,
        _api_base: &ApiBase,
    ) -> Result<Arc<dyn PullRequestGateway>, FetchError> {
        Ok(Arc::clone(&self.0))
    }
}

/// A poller plus handles on every collaborator.
pub struct Harness {
    pub poller: Poller,
    pub store: Arc<MemorySnapshotStore>,
    pub transport: Arc<RecordingTransport>,
    pub badges: Arc<RecordingBadgeSink>,
    pub telemetry: Arc<RecordingTelemetrySink>,
}

pub fn harness(
    settings: WatchSettings,
    gateway: MockPullRequestGateway,
    transport: RecordingTransport,
) -> Harness {
    let store = Arc::new(MemorySnapshotStore::new());
    let transport_handle = Arc::new(transport);
    let badges = Arc::new(RecordingBadgeSink::new());
    let telemetry = Arc::new(RecordingTelemetrySink::default());
    let poller = Poller::new(
        settings,
        Collaborators {
            connector: Arc::new(StaticConnector(Arc::new(gateway))),
            store: Arc::clone(&store) as _,
            transport: Arc::clone(&transport_handle) as _,
            badge: Arc::clone(&badges) as _,
            telemetry: Arc::clone(&telemetry) as _,
        },
    );
    Harness {
        poller,
        store,
        transport: transport_handle,
        badges,
        telemetry,
    }
}

/// Harness whose gateway must never be called.
pub fn poller_with(settings: WatchSettings) -> Harness {
    harness(
        settings,
        MockPullRequestGateway::new(),
        RecordingTransport::new(),
    )
}

/// Fully configured settings watching `repositories`.
pub fn configured(repositories: &[&str]) -> WatchSettings {
    let mut settings = WatchSettings::unconfigured(
        ApiBase::parse("https://api.github.com").expect("API base should parse"),
    );
    settings.token = PersonalAccessToken::new("ghp_test").ok();
    settings.username = Some("alice".to_owned());
    settings.repositories = repositories
        .iter()
        .map(|name| WatchedRepository {
            full_name: RepositoryFullName::parse(name).expect("repository should parse"),
            policy: RepoNotificationPolicy::default(),
        })
        .collect();
    settings
}

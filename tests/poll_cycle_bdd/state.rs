//! Scenario state for the poll cycle BDD tests.

use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use prwatch::notify::test_support::{RecordingBadgeSink, RecordingTransport};
use prwatch::poller::RepoNotificationPolicy;
use prwatch::telemetry::NoopTelemetrySink;
use prwatch::{
    ApiBase, Collaborators, CycleReport, MemorySnapshotStore, OctocrabConnector,
    PersonalAccessToken, PollError, Poller, RepositoryFullName, WatchSettings, WatchedRepository,
};
use rstest_bdd::Slot;
use rstest_bdd_macros::ScenarioState;
use tokio::runtime::Runtime;
use wiremock::MockServer;

use crate::support::github_api::{PullRequestFixture, mount_open_pull_requests};

/// Runtime shared by every step of a scenario.
#[derive(Clone)]
pub(crate) struct SharedRuntime(Rc<Runtime>);

impl SharedRuntime {
    pub(crate) fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.0.block_on(future)
    }
}

/// The poller under test plus handles on its recording collaborators.
pub(crate) struct PollerHarness {
    pub(crate) poller: Poller,
    pub(crate) store: Arc<MemorySnapshotStore>,
    pub(crate) transport: Arc<RecordingTransport>,
    pub(crate) badges: Arc<RecordingBadgeSink>,
}

#[derive(ScenarioState, Default)]
pub(crate) struct PollCycleState {
    pub(crate) runtime: Slot<SharedRuntime>,
    pub(crate) server: Slot<MockServer>,
    pub(crate) repositories: Slot<Vec<String>>,
    pub(crate) open: Slot<Vec<PullRequestFixture>>,
    pub(crate) harness: Slot<Rc<PollerHarness>>,
    pub(crate) outcome: Slot<Result<CycleReport, PollError>>,
}

impl PollCycleState {
    pub(crate) fn runtime(&self) -> SharedRuntime {
        if self.runtime.with_ref(|_| ()).is_none() {
            let runtime = Runtime::new()
                .unwrap_or_else(|error| panic!("failed to create Tokio runtime: {error}"));
            self.runtime.set(SharedRuntime(Rc::new(runtime)));
        }
        self.runtime
            .get()
            .unwrap_or_else(|| panic!("runtime not initialised after set"))
    }

    pub(crate) fn harness(&self) -> Rc<PollerHarness> {
        self.harness
            .get()
            .unwrap_or_else(|| panic!("poller not initialised; add a Given step"))
    }

    /// Starts the mock API and a poller watching `repository` against it.
    pub(crate) fn start(&self, repository: &str, open: Vec<PullRequestFixture>) {
        let runtime = self.runtime();
        let server = runtime.block_on(MockServer::start());
        let settings = settings_for(&server.uri(), repository);
        self.server.set(server);
        self.repositories.set(vec![repository.to_owned()]);
        self.harness.set(Rc::new(build_harness(settings)));
        self.replace_open(open);
    }

    /// Re-mounts the API so it reports exactly `open`.
    pub(crate) fn replace_open(&self, open: Vec<PullRequestFixture>) {
        let runtime = self.runtime();
        let repositories = self.repositories.get().unwrap_or_default();
        let names: Vec<&str> = repositories.iter().map(String::as_str).collect();
        self.server
            .with_ref(|server| {
                runtime.block_on(async {
                    server.reset().await;
                    mount_open_pull_requests(server, &names, &open).await;
                });
            })
            .unwrap_or_else(|| panic!("mock server not initialised"));
        self.open.set(open);
    }

    pub(crate) fn run_cycle(&self) {
        let runtime = self.runtime();
        let harness = self.harness();
        let outcome = runtime.block_on(harness.poller.run_cycle());
        self.outcome.set(outcome);
    }
}

fn settings_for(server_uri: &str, repository: &str) -> WatchSettings {
    let api_base = ApiBase::parse(server_uri)
        .unwrap_or_else(|error| panic!("mock server URI should parse: {error}"));
    let full_name = RepositoryFullName::parse(repository)
        .unwrap_or_else(|error| panic!("repository should parse: {error}"));
    WatchSettings {
        token: PersonalAccessToken::new("ghp_scenario").ok(),
        username: Some("alice".to_owned()),
        repositories: vec![WatchedRepository {
            full_name,
            policy: RepoNotificationPolicy::default(),
        }],
        include_authored: true,
        notifications_enabled: true,
        poll_interval: Duration::from_secs(120),
        api_base,
    }
}

fn build_harness(settings: WatchSettings) -> PollerHarness {
    let store = Arc::new(MemorySnapshotStore::new());
    let transport = Arc::new(RecordingTransport::new());
    let badges = Arc::new(RecordingBadgeSink::new());
    let poller = Poller::new(
        settings,
        Collaborators {
            connector: Arc::new(OctocrabConnector),
            store: Arc::clone(&store) as _,
            transport: Arc::clone(&transport) as _,
            badge: Arc::clone(&badges) as _,
            telemetry: Arc::new(NoopTelemetrySink),
        },
    );
    PollerHarness {
        poller,
        store,
        transport,
        badges,
    }
}

use std::sync::{Arc, Mutex, Once};

use log::{debug, error, info, warn};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::errors::{ClientError, ErrorKind};
use crate::fetch::fetcher::Fetcher;
use crate::fetch::interval::RefreshInterval;
use crate::model::config::{PreloadFlagsRequest, SyncFlagsRequest};
use crate::options::Options;
use crate::state::State;
use crate::stats::StatsCollector;

/// Owns the background refresh task that keeps the [`State`] in sync with the
/// flags server.
pub struct SyncService {
    fetcher: Arc<Fetcher>,
    state: Arc<State>,
    stats: Arc<StatsCollector>,
    options: Arc<Options>,
    cancellation_token: CancellationToken,
    refresh_task: Mutex<Option<JoinHandle<()>>>,
    close: Once,
}

impl SyncService {
    pub fn new(
        options: &Arc<Options>,
        state: &Arc<State>,
        stats: &Arc<StatsCollector>,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            fetcher: Arc::new(Fetcher::new(
                options.url().to_owned(),
                options.request_timeout(),
            )?),
            state: Arc::clone(state),
            stats: Arc::clone(stats),
            options: Arc::clone(options),
            cancellation_token: CancellationToken::new(),
            refresh_task: Mutex::new(None),
            close: Once::new(),
        })
    }

    /// One-shot initial fetch. Failures propagate to the caller, which may
    /// decide to proceed on build-time defaults and let the refresh loop
    /// retry later.
    pub async fn preload(&self) -> Result<(), ClientError> {
        let request = PreloadFlagsRequest {
            project: self.state.project().to_owned(),
            variables: self.state.variables().to_vec(),
            flags: self.state.flag_names().to_vec(),
            values: self.state.value_names().to_vec(),
            version: self.state.version(),
        };
        let reply = self.fetcher.preload(&request).await?;
        self.state.update(&reply.flags, &reply.values, reply.version);
        Ok(())
    }

    /// Starts the background refresh task. Starting an already running
    /// service is a programmer error and is reported distinctly.
    pub fn start(&self) -> Result<(), ClientError> {
        let mut task = self.refresh_task.lock().unwrap();
        if task.is_some() {
            let err = ClientError::new(
                ErrorKind::AlreadyStarted,
                "The flags refresh task is already running.".to_owned(),
            );
            warn!(event_id = err.kind.as_u8(); "{}", err);
            return Err(err);
        }
        *task = Some(tokio::spawn(refresh_loop(
            Arc::clone(&self.state),
            Arc::clone(&self.stats),
            Arc::clone(&self.fetcher),
            Arc::clone(&self.options),
            self.cancellation_token.clone(),
        )));
        Ok(())
    }

    pub fn close(&self) {
        self.close.call_once(|| self.cancellation_token.cancel());
    }

    /// Cancels the refresh task and waits for it to exit, so no in-flight
    /// update races with teardown. A non-cancellation task failure is
    /// reported to the log, never to the caller.
    pub async fn stop(&self) {
        self.close();
        let task = self.refresh_task.lock().unwrap().take();
        if let Some(task) = task {
            if let Err(err) = task.await {
                if !err.is_cancelled() {
                    error!("Flags refresh task exited with error: {err}");
                }
            }
        }
    }
}

impl Drop for SyncService {
    fn drop(&mut self) {
        self.close();
    }
}

async fn refresh_loop(
    state: Arc<State>,
    stats: Arc<StatsCollector>,
    fetcher: Arc<Fetcher>,
    options: Arc<Options>,
    token: CancellationToken,
) {
    info!("Flags refresh task started");
    let mut interval = RefreshInterval::new(options.refresh_interval());
    loop {
        let result = tokio::select! {
            result = sync_once(&state, &stats, &fetcher) => result,
            _ = token.cancelled() => break,
        };
        let wait = match result {
            Ok(()) => {
                let wait = interval.next(true);
                debug!("Flags refresh complete, next will be in {}s", wait.as_secs());
                wait
            }
            Err(err) => {
                let wait = interval.next(false);
                error!(event_id = err.kind.as_u8(); "Failed to refresh flags: {err}, retry in {}s", wait.as_secs());
                wait
            }
        };
        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = token.cancelled() => break,
        }
    }
    info!("Flags refresh task exits");
}

async fn sync_once(
    state: &Arc<State>,
    stats: &Arc<StatsCollector>,
    fetcher: &Arc<Fetcher>,
) -> Result<(), ClientError> {
    let request = SyncFlagsRequest {
        project: state.project().to_owned(),
        flags: state.flag_names().to_vec(),
        values: state.value_names().to_vec(),
        version: state.version(),
        flags_usage: stats.flush(),
    };
    let reply = fetcher.sync(&request).await?;
    state.update(&reply.flags, &reply.values, reply.version);
    Ok(())
}

#[cfg(test)]
mod service_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use crate::constants::test_constants::MOCK_PROJECT;
    use crate::constants::{PRELOAD_ENDPOINT, SYNC_ENDPOINT};
    use crate::errors::ErrorKind;
    use crate::fetch::service::SyncService;
    use crate::options::ClientBuilder;
    use crate::state::State;
    use crate::stats::StatsCollector;

    fn build_service(url: &str) -> SyncService {
        let options = Arc::new(
            ClientBuilder::new(url, MOCK_PROJECT)
                .flag_default("TEST", false)
                .refresh_interval(Duration::from_millis(100))
                .build_options(),
        );
        let state = Arc::new(State::new(
            MOCK_PROJECT.to_owned(),
            vec![],
            vec!["TEST".to_owned()],
            vec![],
        ));
        let stats = Arc::new(StatsCollector::from_defaults(
            ["TEST".to_owned()].iter(),
        ));
        SyncService::new(&options, &state, &stats).unwrap()
    }

    fn flag_body(version: i64, enabled: bool) -> String {
        format!(
            r#"{{"version": {version}, "flags": [{{"name": "TEST", "enabled": {enabled}, "overridden": true, "conditions": []}}], "values": []}}"#
        )
    }

    #[tokio::test]
    async fn preload_applies_reply() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", PRELOAD_ENDPOINT)
            .with_status(200)
            .with_body(flag_body(1, true))
            .create_async()
            .await;

        let service = build_service(server.url().as_str());
        service.preload().await.unwrap();
        assert_eq!(service.state.version(), 1);
        assert!(service.state.get("TEST").is_some());
    }

    #[tokio::test]
    async fn refresh_loop_syncs_and_stops() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", SYNC_ENDPOINT)
            .with_status(200)
            .with_body(flag_body(2, true))
            .expect_at_least(1)
            .create_async()
            .await;

        let service = build_service(server.url().as_str());
        service.start().unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;
        service.stop().await;

        mock.assert_async().await;
        assert_eq!(service.state.version(), 2);
    }

    #[tokio::test]
    async fn double_start_is_an_error() {
        let server = mockito::Server::new_async().await;
        let service = build_service(server.url().as_str());
        service.start().unwrap();
        let err = service.start().unwrap_err();
        assert_eq!(err.kind, ErrorKind::AlreadyStarted);
        service.stop().await;
    }

    #[tokio::test]
    async fn failed_sync_keeps_previous_state() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", PRELOAD_ENDPOINT)
            .with_status(200)
            .with_body(flag_body(1, true))
            .create_async()
            .await;
        server
            .mock("POST", SYNC_ENDPOINT)
            .with_status(500)
            .expect_at_least(1)
            .create_async()
            .await;

        let service = build_service(server.url().as_str());
        service.preload().await.unwrap();
        service.start().unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;
        service.stop().await;

        // Stale but available: the preloaded table stays in effect.
        assert_eq!(service.state.version(), 1);
        assert!(service.state.get("TEST").is_some());
    }

    #[tokio::test]
    async fn first_sync_reports_seeded_usage() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", SYNC_ENDPOINT)
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"flags_usage": [{"name": "TEST", "positive_count": 0, "negative_count": 0}]}"#.to_owned(),
            ))
            .with_status(200)
            .with_body(flag_body(1, true))
            .expect_at_least(1)
            .create_async()
            .await;

        let service = build_service(server.url().as_str());
        service.start().unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;
        service.stop().await;

        mock.assert_async().await;
    }
}

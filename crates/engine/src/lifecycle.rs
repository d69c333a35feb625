use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use common::{EngineCommand, EngineState, Error, Interval, PassReport, RawCandle};

use crate::pass::StrategyPass;
use crate::source::CandleSource;

/// Cloneable handle passed to other crates (API, binary).
#[derive(Clone)]
pub struct EngineHandle {
    command_tx: mpsc::Sender<EngineCommand>,
    state: Arc<RwLock<EngineState>>,
    strategy_interval: Interval,
    interval: Arc<RwLock<Interval>>,
    latest: Arc<RwLock<Option<PassReport>>>,
    report_tx: broadcast::Sender<PassReport>,
}

impl EngineHandle {
    pub async fn send(&self, cmd: EngineCommand) {
        let _ = self.command_tx.send(cmd).await;
    }

    pub async fn state(&self) -> EngineState {
        *self.state.read().await
    }

    /// Granularity the strategy is evaluated on. Fixed for the engine's life.
    pub fn strategy_interval(&self) -> Interval {
        self.strategy_interval
    }

    /// Chart granularity last selected with `SetInterval`.
    pub async fn interval(&self) -> Interval {
        *self.interval.read().await
    }

    /// Report of the most recent completed pass, if any.
    pub async fn latest_report(&self) -> Option<PassReport> {
        self.latest.read().await.clone()
    }

    /// Subscribe to every report as passes complete.
    pub fn subscribe_reports(&self) -> broadcast::Receiver<PassReport> {
        self.report_tx.subscribe()
    }
}

/// The polling engine: runs evaluation passes on a fixed cadence and
/// processes lifecycle commands.
///
/// Passes run inline in the engine task, so two passes never overlap.
/// Candles are always fetched at the strategy interval; the chart interval
/// is only used when that fetch fails.
pub struct Engine {
    pass: StrategyPass,
    source: Arc<dyn CandleSource>,
    poll_interval: Duration,
    strategy_interval: Interval,
    state: Arc<RwLock<EngineState>>,
    interval: Arc<RwLock<Interval>>,
    latest: Arc<RwLock<Option<PassReport>>>,
    report_tx: broadcast::Sender<PassReport>,
    command_rx: mpsc::Receiver<EngineCommand>,
}

impl Engine {
    pub fn new(
        pass: StrategyPass,
        source: Arc<dyn CandleSource>,
        poll_interval: Duration,
        strategy_interval: Interval,
    ) -> (Self, EngineHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);
        let (report_tx, _) = broadcast::channel(64);
        let state = Arc::new(RwLock::new(EngineState::Stopped));
        let interval = Arc::new(RwLock::new(strategy_interval));
        let latest = Arc::new(RwLock::new(None));

        let handle = EngineHandle {
            command_tx,
            state: state.clone(),
            strategy_interval,
            interval: interval.clone(),
            latest: latest.clone(),
            report_tx: report_tx.clone(),
        };

        let engine = Engine {
            pass,
            source,
            poll_interval,
            strategy_interval,
            state,
            interval,
            latest,
            report_tx,
            command_rx,
        };

        (engine, handle)
    }

    /// Run the engine until every handle is dropped.
    /// Call from `tokio::spawn`.
    pub async fn run(mut self) {
        info!(
            poll_secs = self.poll_interval.as_secs_f64(),
            "Engine initialized in Stopped state. Waiting for Start command."
        );

        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => match cmd {
                    Some(cmd) => self.handle(cmd).await,
                    None => {
                        warn!("Engine command channel closed, shutting down");
                        break;
                    }
                },
                _ = ticker.tick() => {
                    if *self.state.read().await == EngineState::Running {
                        self.run_pass().await;
                    }
                }
            }
        }
    }

    async fn handle(&self, cmd: EngineCommand) {
        let current = *self.state.read().await;
        match cmd {
            EngineCommand::Start => {
                if current == EngineState::Running {
                    info!("Engine already running");
                    return;
                }
                info!(interval = %self.strategy_interval, "Engine starting");
                *self.state.write().await = EngineState::Running;
                self.run_pass().await;
            }
            EngineCommand::Stop => {
                info!("Engine stopping");
                *self.state.write().await = EngineState::Stopped;
            }
            EngineCommand::Pause => {
                if current == EngineState::Running {
                    info!("Engine paused, polling suspended");
                    *self.state.write().await = EngineState::Paused;
                }
            }
            EngineCommand::Resume => {
                if current == EngineState::Paused {
                    info!("Engine resumed");
                    *self.state.write().await = EngineState::Running;
                }
            }
            EngineCommand::RunNow => self.run_pass().await,
            EngineCommand::SetInterval(interval) => {
                info!(
                    interval = %interval,
                    strategy_interval = %self.strategy_interval,
                    "Chart interval changed"
                );
                *self.interval.write().await = interval;
                self.run_pass().await;
            }
        }
    }

    async fn run_pass(&self) {
        let raw = match self.source.fetch(self.strategy_interval).await {
            Ok(raw) => raw,
            Err(e) => self.fallback_candles(e).await,
        };

        match self.pass.run(&raw).await {
            Ok(report) => {
                *self.latest.write().await = Some(report.clone());
                // No subscribers is fine
                let _ = self.report_tx.send(report);
            }
            Err(e) => error!(error = %e, "Evaluation pass failed"),
        }
    }

    async fn fallback_candles(&self, err: Error) -> Vec<RawCandle> {
        let chart = *self.interval.read().await;
        if chart == self.strategy_interval {
            warn!(interval = %chart, error = %err, "Candle fetch failed, evaluating empty window");
            return Vec::new();
        }
        warn!(
            interval = %self.strategy_interval,
            fallback = %chart,
            error = %err,
            "Candle fetch failed, falling back to chart interval"
        );
        match self.source.fetch(chart).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(interval = %chart, error = %e, "Fallback fetch failed, evaluating empty window");
                Vec::new()
            }
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use common::{Candle, DayKeyResolver, Result, SignalStatus};
    use ledger::MemoryStore;
    use strategy::StrategyFileConfig;

    use crate::source::StaticSource;

    const T0: i64 = 1_704_067_200;

    fn bullish_break() -> Vec<RawCandle> {
        [
            Candle::new(T0, 100.0, 101.5, 99.5, 101.0),
            Candle::new(T0 + 900, 101.0, 101.2, 99.6, 99.8),
            Candle::new(T0 + 1800, 99.0, 103.5, 98.5, 103.0),
            Candle::new(T0 + 2700, 103.0, 104.0, 102.0, 103.5),
        ]
        .iter()
        .map(RawCandle::from)
        .collect()
    }

    fn engine_with(
        source: Arc<dyn CandleSource>,
        poll: Duration,
    ) -> (StrategyPass, EngineHandle) {
        let pass = StrategyPass::new(
            &StrategyFileConfig::default(),
            DayKeyResolver::utc(),
            Arc::new(MemoryStore::new()),
        );
        let (engine, handle) = Engine::new(pass.clone(), source, poll, Interval::M15);
        tokio::spawn(engine.run());
        (pass, handle)
    }

    fn engine() -> (StrategyPass, EngineHandle) {
        engine_with(
            Arc::new(StaticSource::new(bullish_break())),
            Duration::from_secs(3600),
        )
    }

    async fn next_report(rx: &mut broadcast::Receiver<PassReport>) -> PassReport {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for report")
            .expect("report channel closed")
    }

    struct FailingSource;

    #[async_trait]
    impl CandleSource for FailingSource {
        async fn fetch(&self, _interval: Interval) -> Result<Vec<RawCandle>> {
            Err(Error::UpstreamUnavailable("offline".into()))
        }
    }

    #[tokio::test]
    async fn start_runs_a_pass_immediately() {
        let (_, handle) = engine();
        let mut rx = handle.subscribe_reports();
        assert_eq!(handle.state().await, EngineState::Stopped);

        handle.send(EngineCommand::Start).await;
        let report = next_report(&mut rx).await;

        assert_eq!(report.status, SignalStatus::BuySignal);
        assert_eq!(handle.state().await, EngineState::Running);
        assert_eq!(handle.latest_report().await, Some(report));
    }

    #[tokio::test]
    async fn repeated_passes_keep_one_trade_per_entry() {
        let (pass, handle) = engine();
        let mut rx = handle.subscribe_reports();

        for _ in 0..3 {
            handle.send(EngineCommand::RunNow).await;
            next_report(&mut rx).await;
        }

        assert_eq!(pass.ledger().all_trades().await.unwrap().len(), 1);
        let latest = handle.latest_report().await.unwrap();
        assert_eq!(latest.trades_today, 1);
    }

    #[tokio::test]
    async fn pause_resume_and_stop_transitions() {
        let (_, handle) = engine();
        let mut rx = handle.subscribe_reports();

        handle.send(EngineCommand::Resume).await;
        handle.send(EngineCommand::Start).await;
        next_report(&mut rx).await;
        assert_eq!(handle.state().await, EngineState::Running);

        handle.send(EngineCommand::Pause).await;
        handle.send(EngineCommand::RunNow).await;
        next_report(&mut rx).await;
        assert_eq!(handle.state().await, EngineState::Paused);

        handle.send(EngineCommand::Resume).await;
        handle.send(EngineCommand::RunNow).await;
        next_report(&mut rx).await;
        assert_eq!(handle.state().await, EngineState::Running);

        handle.send(EngineCommand::Stop).await;
        handle.send(EngineCommand::RunNow).await;
        next_report(&mut rx).await;
        assert_eq!(handle.state().await, EngineState::Stopped);
    }

    /// Records requested intervals; fails for the ones listed in `failing`.
    #[derive(Default)]
    struct RecordingSource {
        requested: Mutex<Vec<Interval>>,
        failing: Vec<Interval>,
    }

    #[async_trait]
    impl CandleSource for RecordingSource {
        async fn fetch(&self, interval: Interval) -> Result<Vec<RawCandle>> {
            self.requested.lock().unwrap().push(interval);
            if self.failing.contains(&interval) {
                return Err(Error::UpstreamUnavailable("offline".into()));
            }
            Ok(bullish_break())
        }
    }

    #[tokio::test]
    async fn set_interval_triggers_a_pass_on_the_strategy_interval() {
        let source = Arc::new(RecordingSource::default());
        let (_, handle) = engine_with(source.clone(), Duration::from_secs(3600));
        let mut rx = handle.subscribe_reports();

        handle.send(EngineCommand::SetInterval(Interval::M1)).await;
        let report = next_report(&mut rx).await;

        assert_eq!(handle.interval().await, Interval::M1);
        assert_eq!(handle.strategy_interval(), Interval::M15);
        assert_eq!(*source.requested.lock().unwrap(), vec![Interval::M15]);
        assert_eq!(report.status, SignalStatus::BuySignal);
    }

    #[tokio::test]
    async fn chart_interval_is_used_only_when_strategy_fetch_fails() {
        let source = Arc::new(RecordingSource {
            failing: vec![Interval::M15],
            ..Default::default()
        });
        let (_, handle) = engine_with(source.clone(), Duration::from_secs(3600));
        let mut rx = handle.subscribe_reports();

        handle.send(EngineCommand::SetInterval(Interval::H1)).await;
        let report = next_report(&mut rx).await;

        assert_eq!(
            *source.requested.lock().unwrap(),
            vec![Interval::M15, Interval::H1]
        );
        assert_eq!(report.candle_count, 4);
    }

    #[tokio::test]
    async fn running_engine_polls_on_its_cadence() {
        let (_, handle) = engine_with(
            Arc::new(StaticSource::new(bullish_break())),
            Duration::from_millis(20),
        );
        let mut rx = handle.subscribe_reports();
        handle.send(EngineCommand::Start).await;

        // Start pass plus at least two ticks
        for _ in 0..3 {
            next_report(&mut rx).await;
        }
    }

    #[tokio::test]
    async fn fetch_failure_degrades_to_insufficient_data() {
        let (_, handle) = engine_with(Arc::new(FailingSource), Duration::from_secs(3600));
        let mut rx = handle.subscribe_reports();

        handle.send(EngineCommand::RunNow).await;
        let report = next_report(&mut rx).await;
        assert_eq!(report.status, SignalStatus::InsufficientData);
        assert_eq!(report.candle_count, 0);
    }
}

//! 后台定时任务：定时发布、缺交自动评分、缺交提醒
//!
//! 每个任务一个 interval 循环，通过 watch 通道统一停止。
//! 重叠执行是安全的，幂等性由数据库唯一索引保证。

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior, interval};
use tracing::{error, info};

use crate::config::SchedulerConfig;
use crate::errors::Result;
use crate::services::grading::GradingEngine;

pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// 通知所有循环退出并等待当前一轮结束
    pub async fn shutdown(self) {
        if self.shutdown_tx.send(true).is_err() {
            tracing::warn!("Failed to broadcast shutdown signal to scheduler tasks");
        }
        for handle in self.handles {
            if let Err(err) = handle.await {
                error!(error = %err, "Scheduler task join failed");
            }
        }
        info!("Scheduler stopped");
    }
}

pub fn spawn(engine: Arc<GradingEngine>, config: &SchedulerConfig) -> SchedulerHandle {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let publish_engine = engine.clone();
    let auto_grade_engine = engine.clone();
    let reminder_engine = engine;

    let handles = vec![
        tokio::spawn(run_every(
            "publish_scheduled",
            config.publish_interval,
            shutdown_rx.clone(),
            move || {
                let engine = publish_engine.clone();
                async move { engine.publish_scheduled(Utc::now()).await.map(|_| ()) }
            },
        )),
        tokio::spawn(run_every(
            "auto_grade",
            config.auto_grade_interval,
            shutdown_rx.clone(),
            move || {
                let engine = auto_grade_engine.clone();
                async move { engine.run_auto_grade(Utc::now()).await.map(|_| ()) }
            },
        )),
        tokio::spawn(run_every(
            "reminders",
            config.reminder_interval,
            shutdown_rx,
            move || {
                let engine = reminder_engine.clone();
                async move { engine.run_reminders(Utc::now()).await.map(|_| ()) }
            },
        )),
    ];

    info!(
        publish_interval = config.publish_interval,
        auto_grade_interval = config.auto_grade_interval,
        reminder_interval = config.reminder_interval,
        "Scheduler started"
    );

    SchedulerHandle {
        shutdown_tx,
        handles,
    }
}

async fn run_every<F, Fut>(
    name: &'static str,
    period_secs: u64,
    mut shutdown: watch::Receiver<bool>,
    job: F,
) where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let mut tick = interval(Duration::from_secs(period_secs.max(1)));
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = tick.tick() => {
                if let Err(err) = job().await {
                    error!(job = name, error = %err, "Scheduled job failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_loop_runs_until_shutdown() {
        let (tx, rx) = watch::channel(false);
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();

        let handle = tokio::spawn(run_every("test", 3600, rx, move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }));

        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();

        // interval 首次 tick 立即触发
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}

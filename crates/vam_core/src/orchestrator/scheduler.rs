//! Bounded worker pool for batches of mix jobs.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crossbeam_channel::unbounded;

use super::executor::MixExecutor;
use super::outcome::{BatchTotals, JobOutcome, JobReport};
use crate::models::MixSession;
use crate::plan::MixPlan;

/// One unit of batch work. Without a plan the executor builds one.
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub session: MixSession,
    pub plan: Option<MixPlan>,
}

impl BatchJob {
    pub fn new(session: MixSession) -> Self {
        Self {
            session,
            plan: None,
        }
    }

    pub fn with_plan(mut self, plan: MixPlan) -> Self {
        self.plan = Some(plan);
        self
    }
}

impl From<MixSession> for BatchJob {
    fn from(session: MixSession) -> Self {
        Self::new(session)
    }
}

/// Called on the collecting thread after each job, with the totals so far.
pub type BatchProgressCallback = Box<dyn Fn(&JobReport, &BatchTotals) + Send + Sync>;

/// Reports of a batch in completion order, with final totals.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub reports: Vec<JobReport>,
    pub totals: BatchTotals,
}

/// Runs independent jobs on a fixed-size pool.
///
/// Jobs never share mutable state; one job failing or panicking does not
/// affect its siblings. Completion order is whatever the pool produces.
pub struct JobScheduler {
    executor: Arc<MixExecutor>,
    workers: usize,
    on_progress: Option<BatchProgressCallback>,
}

impl JobScheduler {
    /// Scheduler sized from the executor's `[batch]` settings.
    pub fn new(executor: MixExecutor) -> Self {
        let workers = executor.settings().batch.resolved_workers();
        Self {
            executor: Arc::new(executor),
            workers,
            on_progress: None,
        }
    }

    /// Override the worker count (at least 1).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_progress(mut self, callback: BatchProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run every job and block until all have an outcome.
    pub fn run<I>(&self, jobs: I) -> BatchReport
    where
        I: IntoIterator,
        I::Item: Into<BatchJob>,
    {
        let jobs: Vec<BatchJob> = jobs.into_iter().map(Into::into).collect();
        let mut totals = BatchTotals::new(jobs.len());
        let mut reports = Vec::with_capacity(jobs.len());
        tracing::info!("Starting batch of {} job(s) on {} worker(s)", jobs.len(), self.workers);

        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("vam-worker-{i}"))
            .build()
        {
            Ok(pool) => Some(pool),
            Err(e) => {
                tracing::warn!("Failed to build worker pool, running jobs inline: {e}");
                None
            }
        };

        let (tx, rx) = unbounded::<JobReport>();
        match &pool {
            Some(pool) => {
                for job in jobs {
                    let tx = tx.clone();
                    let executor = Arc::clone(&self.executor);
                    pool.spawn(move || {
                        let _ = tx.send(run_isolated(&executor, job));
                    });
                }
            }
            None => {
                for job in jobs {
                    let _ = tx.send(run_isolated(&self.executor, job));
                }
            }
        }
        drop(tx);

        for report in rx.iter() {
            totals.record(&report.outcome);
            tracing::info!(
                "[{}] {} ({})",
                report.outcome.label(),
                report.job_name,
                totals
            );
            if let Some(callback) = &self.on_progress {
                callback(&report, &totals);
            }
            reports.push(report);
        }

        if totals.has_failures() {
            tracing::warn!("Batch finished with failures: {}", totals);
        } else {
            tracing::info!("Batch finished: {}", totals);
        }

        BatchReport { reports, totals }
    }
}

/// Run one job, turning a panic into a failed report.
fn run_isolated(executor: &MixExecutor, job: BatchJob) -> JobReport {
    let job_name = job.session.video.stem();
    let video = job.session.video.path.clone();

    let result = catch_unwind(AssertUnwindSafe(|| match job.plan {
        Some(plan) => executor.execute(job.session, plan),
        None => executor.run(job.session),
    }));

    result.unwrap_or_else(|payload| {
        let message = panic_message(payload.as_ref());
        tracing::error!("Job {} panicked: {}", job_name, message);
        JobReport {
            job_name,
            video,
            outcome: JobOutcome::Failed {
                diagnostic: format!("unexpected panic: {}", message),
            },
            steps_completed: Vec::new(),
            artifacts_removed: 0,
            log_path: None,
        }
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AudioCategory, MixConfiguration, VideoAsset};
    use crate::orchestrator::testing::{sample_clip, sample_settings, FakeTool};
    use crate::tool::{MediaTool, ToolOutput, ToolResult};
    use parking_lot::Mutex;
    use std::path::{Path, PathBuf};

    fn session(dir: &Path, name: &str, with_clip: bool) -> MixSession {
        let video_path = dir.join(format!("{}.mp4", name));
        std::fs::write(&video_path, b"video").unwrap();
        let video = VideoAsset::new(video_path, 5.0, 25.0, (1280, 720), true);
        let clips = if with_clip {
            vec![sample_clip(dir, &format!("{}.wav", name), AudioCategory::Effect, 2.0)]
        } else {
            Vec::new()
        };
        let target = dir.join("output").join(format!("{}.mp4", name));
        MixSession::new(video, clips, MixConfiguration::default(), target)
    }

    /// Fails any invocation whose output file name mentions `bad`.
    struct SelectiveTool {
        inner: FakeTool,
        panics: bool,
    }

    impl MediaTool for SelectiveTool {
        fn name(&self) -> &str {
            "ffmpeg"
        }

        fn run(&self, args: &[String]) -> ToolResult<ToolOutput> {
            let output = args.last().cloned().unwrap_or_default();
            let file_name = Path::new(&output)
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            if file_name.contains("bad") {
                if self.panics {
                    panic!("tool crashed on {}", output);
                }
                return Ok(ToolOutput {
                    exit_code: 1,
                    stdout: String::new(),
                    stderr: "encoder error".to_string(),
                });
            }
            self.inner.run(args)
        }
    }

    #[test]
    fn totals_separate_success_skip_and_failure() {
        let dir = tempfile::tempdir().unwrap();
        let tool = Arc::new(SelectiveTool {
            inner: FakeTool::new(),
            panics: false,
        });
        let executor = MixExecutor::new(tool, sample_settings(dir.path()));
        let progress: Arc<Mutex<Vec<BatchTotals>>> = Arc::default();
        let seen = Arc::clone(&progress);

        let scheduler = JobScheduler::new(executor)
            .with_workers(2)
            .with_progress(Box::new(move |_, totals| seen.lock().push(*totals)));

        let report = scheduler.run(vec![
            session(dir.path(), "good_one", true),
            session(dir.path(), "good_two", true),
            session(dir.path(), "no_audio", false),
            session(dir.path(), "bad", true),
        ]);

        assert_eq!(
            report.totals,
            BatchTotals {
                total: 4,
                succeeded: 2,
                skipped: 1,
                failed: 1
            }
        );
        assert_eq!(report.reports.len(), 4);

        let progress = progress.lock();
        assert_eq!(progress.len(), 4);
        assert!(progress.last().unwrap().is_complete());
        assert!(progress.windows(2).all(|w| w[0].finished() < w[1].finished()));
    }

    #[test]
    fn panicking_job_does_not_abort_siblings() {
        let dir = tempfile::tempdir().unwrap();
        let tool = Arc::new(SelectiveTool {
            inner: FakeTool::new(),
            panics: true,
        });
        let scheduler =
            JobScheduler::new(MixExecutor::new(tool, sample_settings(dir.path()))).with_workers(3);

        let report = scheduler.run(vec![
            BatchJob::new(session(dir.path(), "bad", true)),
            BatchJob::new(session(dir.path(), "fine", true)),
        ]);

        assert_eq!(report.totals.succeeded, 1);
        assert_eq!(report.totals.failed, 1);
        let failed = report
            .reports
            .iter()
            .find(|r| r.outcome.is_failed())
            .unwrap();
        assert_eq!(failed.job_name, "bad");
        assert!(dir.path().join("output").join("fine.mp4").exists());
        assert!(!dir.path().join("output").join("bad.mp4").exists());
    }

    #[test]
    fn same_named_videos_keep_separate_logs() {
        let dir = tempfile::tempdir().unwrap();
        let (first, second) = (dir.path().join("a"), dir.path().join("b"));
        std::fs::create_dir_all(&first).unwrap();
        std::fs::create_dir_all(&second).unwrap();

        let executor = MixExecutor::new(Arc::new(FakeTool::new()), sample_settings(dir.path()))
            .with_log_dir(dir.path().join(".logs"));
        let report = JobScheduler::new(executor).with_workers(2).run(vec![
            session(&first, "intro", true),
            session(&second, "intro", true),
        ]);
        assert_eq!(report.totals.succeeded, 2);

        let logs: Vec<PathBuf> = report
            .reports
            .iter()
            .map(|r| r.log_path.clone().unwrap())
            .collect();
        assert_ne!(logs[0], logs[1]);

        for job in &report.reports {
            let text = std::fs::read_to_string(job.log_path.as_ref().unwrap()).unwrap();
            let own = job.video.parent().unwrap();
            let other = if own == first { &second } else { &first };
            assert!(text.contains(&own.join("intro.mp4").display().to_string()));
            assert!(!text.contains(&other.join("intro.mp4").display().to_string()));
        }
    }

    #[test]
    fn worker_count_is_at_least_one() {
        let dir = tempfile::tempdir().unwrap();
        let executor = MixExecutor::new(Arc::new(FakeTool::new()), sample_settings(dir.path()));
        let scheduler = JobScheduler::new(executor).with_workers(0);
        assert_eq!(scheduler.workers(), 1);

        let report = scheduler.run(Vec::<BatchJob>::new());
        assert_eq!(report.totals, BatchTotals::new(0));
        assert!(report.reports.is_empty());
    }
}

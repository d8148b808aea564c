use crate::infrastructure::queue::{MessageQueue, QueueDepth};
use crate::infrastructure::stack::{ClusterTasks, StackDescriber};
use crate::modules::jobs::model::JobStatus;
use crate::modules::jobs::service::JobCache;
use crate::modules::resources::model::ResourceMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub name: String,
    /// `None` when this working directory has never submitted the job.
    pub status: Option<JobStatus>,
    /// Media count per status, in state machine order.
    pub media: Vec<(JobStatus, usize)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueReport {
    pub name: String,
    pub depth: QueueDepth,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorReport {
    pub cluster: String,
    pub jobs: Vec<JobReport>,
    pub queues: Vec<QueueReport>,
    pub tasks: Option<ClusterTasks>,
}

impl fmt::Display for MonitorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "==== {} ====", self.cluster)?;
        for job in &self.jobs {
            let status = job.status.map(|s| s.as_str()).unwrap_or("UNKNOWN");
            write!(f, "job {}: {}", job.name, status)?;
            for (s, count) in &job.media {
                write!(f, " {}={}", s, count)?;
            }
            writeln!(f)?;
        }
        for queue in &self.queues {
            writeln!(
                f,
                "queue {}: {} waiting, {} in flight",
                queue.name, queue.depth.visible, queue.depth.in_flight
            )?;
        }
        if let Some(tasks) = &self.tasks {
            writeln!(
                f,
                "tasks: {} running, {} pending on {} instances",
                tasks.running, tasks.pending, tasks.instances
            )?;
        }
        Ok(())
    }
}

/// Periodic status reporter. Reads only.
pub struct Monitor {
    jobs: Vec<String>,
    resources: ResourceMap,
    cache: JobCache,
    queue: Arc<dyn MessageQueue>,
    stack: Arc<dyn StackDescriber>,
    period: Duration,
}

impl Monitor {
    pub fn new(
        jobs: Vec<String>,
        resources: ResourceMap,
        cache: JobCache,
        queue: Arc<dyn MessageQueue>,
        stack: Arc<dyn StackDescriber>,
        period: Duration,
    ) -> Self {
        Self {
            jobs,
            resources,
            cache,
            queue,
            stack,
            period,
        }
    }

    /// Current state; a lookup that fails is logged and left out.
    pub async fn report(&self) -> MonitorReport {
        let mut jobs = Vec::with_capacity(self.jobs.len());
        for name in &self.jobs {
            let status = match self.cache.get_job(name).await {
                Ok(job) => job.map(|j| j.status),
                Err(e) => {
                    warn!("Could not read job {}: {}", name, e);
                    None
                }
            };
            let media = match self.cache.list_media(name).await {
                Ok(media) => JobStatus::ALL
                    .into_iter()
                    .map(|s| (s, media.iter().filter(|m| m.status == s).count()))
                    .filter(|(_, count)| *count > 0)
                    .collect(),
                Err(e) => {
                    warn!("Could not read media for {}: {}", name, e);
                    Vec::new()
                }
            };
            jobs.push(JobReport {
                name: name.clone(),
                status,
                media,
            });
        }

        let mut queues = Vec::new();
        for name in self.resources.queues() {
            match self.queue.depth(name).await {
                Ok(depth) => queues.push(QueueReport {
                    name: name.to_string(),
                    depth,
                }),
                Err(e) => warn!("Could not read queue {}: {}", name, e),
            }
        }

        let tasks = match self.stack.cluster_tasks(&self.resources.cluster).await {
            Ok(tasks) => Some(tasks),
            Err(e) => {
                warn!("Could not read tasks for {}: {}", self.resources.cluster, e);
                None
            }
        };

        MonitorReport {
            cluster: self.resources.cluster.clone(),
            jobs,
            queues,
            tasks,
        }
    }

    /// Reports every period until `token` is cancelled.
    pub fn start(self, token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("📡 Monitoring {} every {:?}", self.resources.cluster, self.period);
            let mut ticker = tokio::time::interval(self.period);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let report = self.report().await;
                        info!("\n{}", report);
                    }
                }
            }
            info!("Monitor for {} stopped", self.resources.cluster);
        })
    }
}

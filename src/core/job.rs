use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Running,
    Finished,
    Failed,
}

#[derive(Debug, Clone)]
pub struct Job {
    pub label: &'static str,
    pub status: JobStatus,
    pub started_at: Option<Instant>,
    pub ended_at: Option<Instant>,
}

impl Job {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            status: JobStatus::Pending,
            started_at: None,
            ended_at: None,
        }
    }

    pub fn start(&mut self) {
        self.status = JobStatus::Running;
        self.started_at = Some(Instant::now());
    }

    pub fn finish(&mut self, success: bool) {
        self.ended_at = Some(Instant::now());
        self.status = if success {
            JobStatus::Finished
        } else {
            JobStatus::Failed
        };
    }

    pub fn elapsed(&self) -> Option<Duration> {
        match (self.started_at, self.ended_at) {
            (Some(start), Some(end)) => Some(end.duration_since(start)),
            (Some(start), None) => Some(start.elapsed()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_job_is_pending_without_timing() {
        let job = Job::new("compile");
        assert_eq!(job.label, "compile");
        assert_eq!(job.status, JobStatus::Pending);
        assert!(job.elapsed().is_none());
    }

    #[test]
    fn finish_records_outcome_and_end_time() {
        let mut job = Job::new("upload");
        job.start();
        assert_eq!(job.status, JobStatus::Running);
        job.finish(false);
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.ended_at.is_some());
        assert!(job.elapsed().is_some());
    }
}

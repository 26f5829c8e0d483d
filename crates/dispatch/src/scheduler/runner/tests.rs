#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use hostd_core::{Config, JobRecord, JobStatus, Pid, Priority, ProcessRuntime, Resources, RuntimeError, RuntimeOp};

    use crate::error::{DispatchError, MemoryError};
    use crate::job::JobId;
    use crate::memory::BlockInfo;
    use crate::scheduler::runner::Dispatcher;
    use crate::scheduler::types::DispatchEvent;
    use crate::timer::InstantTimer;

    /// Mock runtime that records every call and fails the operations it is
    /// told to.
    #[derive(Default)]
    struct MockRuntime {
        calls: Arc<Mutex<Vec<(RuntimeOp, Pid)>>>,
        fail: Vec<RuntimeOp>,
        next_pid: Pid,
    }

    impl MockRuntime {
        fn failing(op: RuntimeOp) -> Self {
            Self {
                fail: vec![op],
                ..Default::default()
            }
        }

        fn check(&self, op: RuntimeOp, pid: Pid) -> Result<(), RuntimeError> {
            self.calls.lock().unwrap().push((op, pid));
            if self.fail.contains(&op) {
                return Err(RuntimeError::Signal {
                    pid,
                    signal: "TEST",
                    reason: "injected failure".into(),
                });
            }
            Ok(())
        }
    }

    impl ProcessRuntime for MockRuntime {
        fn start(&mut self, _argv: &[String]) -> Result<Pid, RuntimeError> {
            self.next_pid += 1;
            let pid = 100 + self.next_pid;
            self.check(RuntimeOp::Start, pid)?;
            Ok(pid)
        }

        fn suspend(&mut self, pid: Pid) -> Result<(), RuntimeError> {
            self.check(RuntimeOp::Suspend, pid)
        }

        fn resume(&mut self, pid: Pid) -> Result<(), RuntimeError> {
            self.check(RuntimeOp::Resume, pid)
        }

        fn terminate(&mut self, pid: Pid) -> Result<(), RuntimeError> {
            self.check(RuntimeOp::Terminate, pid)
        }
    }

    fn record(arrival: u64, priority: u32, cpu: u64, memory: usize, res: [u32; 4]) -> JobRecord {
        JobRecord {
            arrival_time: arrival,
            priority,
            cpu_time: cpu,
            memory,
            printers: res[0],
            scanners: res[1],
            modems: res[2],
            cds: res[3],
        }
    }

    fn dispatcher(runtime: MockRuntime) -> (Dispatcher, Arc<Mutex<Vec<(RuntimeOp, Pid)>>>) {
        let calls = Arc::clone(&runtime.calls);
        let d = Dispatcher::new(&Config::default(), Box::new(runtime), Box::new(InstantTimer)).unwrap();
        (d, calls)
    }

    fn ops(calls: &Arc<Mutex<Vec<(RuntimeOp, Pid)>>>) -> Vec<RuntimeOp> {
        calls.lock().unwrap().iter().map(|(op, _)| *op).collect()
    }

    #[test]
    fn reserved_block_sits_at_offset_zero() {
        let (d, _) = dispatcher(MockRuntime::default());
        assert_eq!(
            d.allocator().block(d.reserved_block()),
            Some(BlockInfo { offset: 0, size: 64, allocated: true })
        );
        assert_eq!(d.allocator().free_memory(), 960);
        assert!(d.is_finished());
    }

    #[test]
    fn invalid_config_rejected() {
        let mut config = Config::default();
        config.system.reserved_memory = 2048;
        let result = Dispatcher::new(&config, Box::new(MockRuntime::default()), Box::new(InstantTimer));
        assert!(matches!(result, Err(DispatchError::Config(_))));
    }

    #[test]
    fn load_sorts_by_arrival_and_keeps_ties_in_order() {
        let (mut d, _) = dispatcher(MockRuntime::default());
        d.load(vec![
            record(3, 1, 1, 10, [0; 4]),
            record(0, 2, 1, 10, [0; 4]),
            record(0, 3, 1, 10, [0; 4]),
        ]);
        assert_eq!(d.pending_arrivals(), 3);

        let events = d.step().unwrap();
        let admitted: Vec<(JobId, Priority)> = events
            .iter()
            .filter_map(|e| match e {
                DispatchEvent::Admitted { job, priority } => Some((*job, *priority)),
                _ => None,
            })
            .collect();
        assert_eq!(admitted, vec![(JobId(1), Priority::P2), (JobId(2), Priority::P3)]);
        assert_eq!(d.pending_arrivals(), 1);
    }

    #[test]
    fn rejection_has_no_side_effects() {
        let (mut d, calls) = dispatcher(MockRuntime::default());
        d.load(vec![record(0, 1, 2, 100, [3, 0, 0, 0])]);

        let events = d.step().unwrap();
        assert!(matches!(events.as_slice(), [DispatchEvent::Rejected { job: JobId(0), .. }]));
        assert_eq!(d.allocator().free_memory(), 960);
        assert_eq!(d.ledger().available(), Resources::new(2, 1, 1, 2));
        assert!(ops(&calls).is_empty());
        assert!(d.is_finished());
        assert_eq!(d.metrics().rejected, 1);
    }

    #[test]
    fn lone_job_runs_to_completion_without_preemption() {
        let (mut d, calls) = dispatcher(MockRuntime::default());
        d.load(vec![record(0, 1, 3, 100, [1, 0, 0, 0])]);

        let metrics = d.run().unwrap();
        assert_eq!(ops(&calls), vec![RuntimeOp::Start, RuntimeOp::Terminate]);
        assert_eq!(metrics.completed, 1);
        assert_eq!(metrics.preemptions, 0);
        // Started at 0, charged at 1, 2, 3.
        assert_eq!(metrics.total_turnaround, 3);
        assert_eq!(d.allocator().free_memory(), 960);
        assert_eq!(d.ledger().available(), d.ledger().capacity());
        d.allocator().validate().unwrap();
    }

    #[test]
    fn contending_job_preempts_and_demotes() {
        let (mut d, calls) = dispatcher(MockRuntime::default());
        d.load(vec![record(0, 1, 3, 100, [0; 4]), record(1, 1, 1, 100, [0; 4])]);

        // t0: job 0 starts.
        d.step().unwrap();
        assert_eq!(d.active().map(|j| j.id), Some(JobId(0)));

        // t1: job 1 promoted to lane 1, job 0 preempted down to lane 2, job 1 starts.
        let events = d.step().unwrap();
        assert!(events.contains(&DispatchEvent::Suspended {
            job: JobId(0),
            pid: 101,
            priority: Priority::P2,
        }));
        assert_eq!(d.active().map(|j| j.id), Some(JobId(1)));
        assert_eq!(d.lane(Priority::P2).len(), 1);
        assert_eq!(d.lane(Priority::P2).front().map(|j| j.status), Some(JobStatus::Suspended));

        // t2: job 1 done, job 0 resumed from lane 2.
        let events = d.step().unwrap();
        assert!(events.contains(&DispatchEvent::Resumed { job: JobId(0), pid: 101 }));

        d.run().unwrap();
        assert_eq!(
            ops(&calls),
            vec![
                RuntimeOp::Start,
                RuntimeOp::Suspend,
                RuntimeOp::Start,
                RuntimeOp::Terminate,
                RuntimeOp::Resume,
                RuntimeOp::Terminate,
            ]
        );
        assert_eq!(d.metrics().preemptions, 1);
        assert_eq!(d.metrics().completed, 2);
    }

    #[test]
    fn real_time_job_is_never_preempted() {
        let (mut d, calls) = dispatcher(MockRuntime::default());
        d.load(vec![record(0, 0, 3, 32, [0; 4]), record(0, 1, 1, 100, [0; 4])]);
        d.run().unwrap();

        assert_eq!(
            ops(&calls),
            vec![RuntimeOp::Start, RuntimeOp::Terminate, RuntimeOp::Start, RuntimeOp::Terminate]
        );
        assert_eq!(d.metrics().preemptions, 0);
    }

    #[test]
    fn backlog_head_blocks_until_memory_frees() {
        let (mut d, _) = dispatcher(MockRuntime::default());
        d.load(vec![
            record(0, 1, 2, 900, [0; 4]),
            record(0, 1, 1, 100, [0; 4]),
            record(0, 1, 1, 10, [0; 4]),
        ]);

        d.step().unwrap();
        // 900 promoted; 100 does not fit the remaining 60 and blocks the 10 behind it.
        assert_eq!(d.backlog().len(), 2);
        assert_eq!(d.allocator().free_memory(), 60);

        d.run().unwrap();
        assert_eq!(d.metrics().completed, 3);
        assert_eq!(d.allocator().free_memory(), 960);
    }

    #[test]
    fn failed_start_abandons_job_and_releases_everything() {
        let (mut d, _) = dispatcher(MockRuntime::failing(RuntimeOp::Start));
        d.load(vec![record(0, 2, 4, 200, [1, 1, 0, 0])]);

        let events = d.step().unwrap();
        assert!(events.iter().any(|e| matches!(
            e,
            DispatchEvent::RuntimeFailed { operation: RuntimeOp::Start, .. }
        )));
        assert!(events.contains(&DispatchEvent::Terminated {
            job: JobId(0),
            pid: None,
            at: 0,
            completed: false,
        }));
        assert!(d.is_finished());
        assert_eq!(d.allocator().free_memory(), 960);
        assert_eq!(d.ledger().available(), d.ledger().capacity());
        assert_eq!(d.metrics().abandoned, 1);
        assert_eq!(d.metrics().runtime_failures, 1);
    }

    #[test]
    fn failed_suspend_keeps_job_running_undemoted() {
        let (mut d, _) = dispatcher(MockRuntime::failing(RuntimeOp::Suspend));
        d.load(vec![record(0, 1, 2, 100, [0; 4]), record(1, 1, 1, 100, [0; 4])]);

        d.step().unwrap();
        let events = d.step().unwrap();
        assert!(events.iter().any(|e| matches!(
            e,
            DispatchEvent::RuntimeFailed { operation: RuntimeOp::Suspend, .. }
        )));
        let active = d.active().unwrap();
        assert_eq!(active.id, JobId(0));
        assert_eq!(active.priority, Priority::P1);
        assert_eq!(active.status, JobStatus::Running);

        d.run().unwrap();
        assert_eq!(d.metrics().completed, 2);
    }

    #[test]
    fn failed_terminate_still_releases_resources() {
        let (mut d, _) = dispatcher(MockRuntime::failing(RuntimeOp::Terminate));
        d.load(vec![record(0, 3, 1, 300, [0, 0, 1, 2])]);

        let metrics = d.run().unwrap();
        assert_eq!(metrics.completed, 1);
        assert_eq!(metrics.runtime_failures, 1);
        assert_eq!(d.allocator().free_memory(), 960);
        assert_eq!(d.ledger().available(), d.ledger().capacity());
    }

    #[test]
    fn empty_feed_finishes_after_one_quantum() {
        let (mut d, _) = dispatcher(MockRuntime::default());
        let metrics = d.run().unwrap();
        assert_eq!(metrics.quanta_elapsed, 1);
        assert_eq!(metrics.busy_quanta, 0);
        assert!(metrics.finished_at.is_some());
    }

    #[test]
    fn idle_gap_waits_for_late_arrival() {
        let (mut d, _) = dispatcher(MockRuntime::default());
        d.load(vec![record(5, 1, 1, 10, [0; 4])]);

        let metrics = d.run().unwrap();
        assert_eq!(metrics.completed, 1);
        assert_eq!(metrics.average_response(), 0.0);
        // Ticks 0-4 idle, started at 5, charged at 6.
        assert_eq!(metrics.quanta_elapsed, 7);
        assert_eq!(metrics.busy_quanta, 1);
    }

    #[test]
    fn corrupted_partition_halts_promotion() {
        let (mut d, calls) = dispatcher(MockRuntime::default());
        let reserved = d.reserved_block();
        d.allocator.corrupt_offset(reserved, 5);
        d.load(vec![record(0, 1, 2, 100, [0; 4])]);

        let err = d.step().unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Memory(MemoryError::CorruptedPartition { .. })
        ));
        assert!(d.run().is_err());
        assert!(calls.lock().unwrap().is_empty());
    }
}

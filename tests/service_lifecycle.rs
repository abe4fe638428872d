//! End-to-end lifecycle scenarios across services and controllers.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use service_lifecycle::lifecycle::{
    BlockingServiceController, FullServiceController, Operation, ServiceController, State,
    ThreadedServiceController,
};
use service_lifecycle::service::{
    BasicService, BlockingService, Readiness, Service, ServiceHooks, ThreadedService, WorkHooks, WorkerService,
};

mod common;

use common::{CountingHooks, SpawningHooks};

#[test]
fn test_synchronised_threaded_start() {
    let service = ThreadedService::new("threaded", SpawningHooks::new);
    service.set_start_synchronised(true);
    service.set_service_nb_thread(1);

    assert!(service.start());
    // The spawned thread sleeps before notifying; start waited for it.
    assert_eq!(service.hooks().notified(), 1);
    assert_eq!(service.state(), Some(State::Running));

    assert!(!service.start());
    assert_eq!(service.hooks().spawned(), 1);

    assert!(service.stop());
    assert!(service.start());
    assert_eq!(service.hooks().spawned(), 2);
    assert_eq!(service.hooks().notified(), 2);
    assert!(service.stop());
    assert_eq!(service.state(), Some(State::Stopped));
}

#[test]
fn test_blocking_controller_round_trip() {
    let service = BasicService::with_controller("blocking", CountingHooks::default(), BlockingServiceController::new());
    for _ in 0..2 {
        assert!(service.start());
        assert!(service.stop());
    }
    assert_eq!(service.state(), Some(State::Stopped));
    assert_eq!(service.hooks().starts(), 2);
    assert_eq!(service.hooks().stops(), 2);
}

#[test]
fn test_failed_start_recovers_through_start_only() {
    let service = BasicService::with_controller("blocking", CountingHooks::default(), BlockingServiceController::new());
    service.hooks().set_fail_start(true);
    assert!(!service.start());
    assert_eq!(service.state(), Some(State::Error));

    assert!(!service.stop());
    assert_eq!(service.hooks().stops(), 0);
    assert_eq!(service.state(), Some(State::Error));

    service.hooks().set_fail_start(false);
    assert!(service.start());
    assert_eq!(service.state(), Some(State::Running));
}

#[test]
fn test_rejections_never_mutate_state() {
    let from_stopped = [Operation::Setup, Operation::Init, Operation::Reset, Operation::Start];
    let from_none = [Operation::Setup];
    let controllers: Vec<(Box<dyn ServiceController>, &[Operation])> = vec![
        (Box::new(BlockingServiceController::new()), &from_stopped[..]),
        (Box::new(ThreadedServiceController::new()), &from_stopped[..]),
        (Box::new(FullServiceController::new()), &from_none[..]),
    ];
    for (ctrl, legal) in &controllers {
        let initial = ctrl.state();
        for op in Operation::REQUESTS {
            if legal.contains(&op) {
                assert!(ctrl.can_start(op), "{op} refused from {initial}");
                continue;
            }
            assert!(!ctrl.can_start(op), "{op} allowed from {initial}");
            assert!(!ctrl.op_start(op), "{op} accepted from {initial}");
            assert_eq!(ctrl.state(), initial);
        }
    }
}

#[test]
fn test_full_controller_sequence() {
    let service = BasicService::with_controller("full", CountingHooks::default(), FullServiceController::new());
    let hooks = service.hooks();

    assert!(!service.init());
    assert!(!service.start());
    assert!(!service.reset());
    assert_eq!(service.state(), Some(State::None));

    assert!(service.setup());
    assert_eq!(service.state(), Some(State::Configured));
    assert!(!service.setup());
    assert!(service.init());
    assert_eq!(service.state(), Some(State::Stopped));
    assert!(service.start());
    assert!(!service.reset());
    assert!(service.stop());
    assert!(service.reset());
    assert_eq!(service.state(), Some(State::None));

    assert_eq!(hooks.setups.load(Ordering::SeqCst), 1);
    assert_eq!(hooks.inits.load(Ordering::SeqCst), 1);
    assert_eq!(hooks.starts(), 1);
    assert_eq!(hooks.stops(), 1);
    assert_eq!(hooks.resets.load(Ordering::SeqCst), 1);
}

#[test]
fn test_full_controller_optional_steps() {
    let service = BasicService::with_controller(
        "optional",
        CountingHooks::default(),
        FullServiceController::builder().optional_init().build(),
    );
    assert!(service.start());
    assert_eq!(service.state(), Some(State::Running));
}

#[test]
fn test_observer_notified_per_successful_operation() {
    let service = BasicService::with_controller("observed", CountingHooks::default(), BlockingServiceController::new());
    let mut sub = service.service_state();

    assert!(service.start());
    assert!(!service.start());
    service.hooks().set_fail_start(true);
    assert!(service.stop());
    assert!(!service.start());

    let events = sub.drain();
    let ops: Vec<Operation> = events.iter().map(|e| e.operation).collect();
    assert_eq!(ops, vec![Operation::Start, Operation::Stop]);
    assert_eq!(events[0].state, Some(State::Running));
    assert_eq!(events[1].state, Some(State::Stopped));
}

#[tokio::test]
async fn test_async_observer() {
    let service = Arc::new(BasicService::new("async", CountingHooks::default()));
    let mut sub = service.service_state();
    let worker = {
        let service = Arc::clone(&service);
        thread::spawn(move || {
            service.setup();
            service.start();
        })
    };
    let first = sub.recv().await.expect("setup event");
    let second = sub.recv().await.expect("start event");
    worker.join().unwrap();
    assert_eq!((first.operation, first.sequence), (Operation::Setup, 1));
    assert_eq!((second.operation, second.sequence), (Operation::Start, 2));
    assert_eq!(second.state, None);
}

struct Server {
    readiness: Readiness,
    running: AtomicBool,
    stop: AtomicBool,
    served: AtomicUsize,
}

impl ServiceHooks for Server {
    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn on_start(&self) -> bool {
        self.stop.store(false, Ordering::SeqCst);
        self.running.store(true, Ordering::SeqCst);
        self.readiness.service_set_ready();
        while !self.stop.load(Ordering::SeqCst) {
            self.served.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(1));
        }
        self.running.store(false, Ordering::SeqCst);
        true
    }

    fn on_stop(&self) -> bool {
        self.stop.store(true, Ordering::SeqCst);
        true
    }
}

#[test]
fn test_blocking_service_restart() {
    let service = Arc::new(BlockingService::new("server", |readiness| Server {
        readiness,
        running: AtomicBool::new(false),
        stop: AtomicBool::new(false),
        served: AtomicUsize::new(0),
    }));
    service.set_service_wait_stop(true);

    for _ in 0..2 {
        let runner = {
            let service = Arc::clone(&service);
            thread::spawn(move || service.start())
        };
        assert!(service.wait_ready(Duration::from_secs(5)));
        assert!(service.stop());
        assert!(!service.is_running());
        assert!(runner.join().unwrap());
    }
    assert_eq!(service.state(), Some(State::Stopped));
    assert!(service.hooks().served.load(Ordering::SeqCst) >= 2);
}

#[derive(Default)]
struct Drain {
    stop: AtomicBool,
    items: AtomicUsize,
}

impl WorkHooks for Drain {
    fn on_work_start(&self) -> bool {
        self.items.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(1));
        !self.stop.load(Ordering::SeqCst)
    }

    fn on_work_stop(&self) -> bool {
        self.stop.store(true, Ordering::SeqCst);
        true
    }
}

#[test]
fn test_worker_service_in_group() {
    let service = Arc::new(WorkerService::new("drain", Drain::default()));
    service.set_start_synchronised(true);
    let mut group = service_lifecycle::ServiceGroup::new();
    group.push(service.clone());

    assert!(group.start_all().is_ok());
    assert!(service.is_running());
    assert!(common::wait_until(Duration::from_secs(2), || {
        service.work().items.load(Ordering::SeqCst) >= 3
    }));
    assert!(group.stop_all());
    assert!(!service.is_running());
    assert_eq!(service.state(), Some(State::Stopped));
}

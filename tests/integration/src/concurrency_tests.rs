//! Concurrency Integration Tests
//!
//! This test suite validates:
//! 1. Atomic claiming under racing dispatchers
//! 2. Automatic assignment falling back when a candidate is lost
//! 3. Single-shot arrival recording under parallel polls
//! 4. Cancellation racing against advancement

use std::sync::{Arc, Barrier};
use std::thread;

use crate::test_utils::{drone_at, drone_request, empty_service, t0, t_plus_secs};
use rallypoint_domain::{DispatchStatus, ProgressEventKind, ResourceStatus};
use rallypoint_engine::DispatchError;

#[test]
fn test_racing_claims_produce_exactly_one_winner() {
    let (registry, _service) = empty_service();
    registry.register(drone_at("DRONE_001", 0.0, 0.045)).unwrap();

    let barrier = Arc::new(Barrier::new(8));
    let mut handles = Vec::new();
    for _ in 0..8 {
        let registry = Arc::clone(&registry);
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            registry.claim("DRONE_001")
        }));
    }

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    for result in results.iter().filter(|r| r.is_err()) {
        assert!(matches!(
            result.as_ref().unwrap_err(),
            DispatchError::ResourceUnavailable { .. }
        ));
    }
    assert_eq!(
        registry.get("DRONE_001").unwrap().status,
        ResourceStatus::Dispatched
    );
}

#[test]
fn test_racing_named_assignments_give_one_resource_once() {
    let (registry, service) = empty_service();
    registry.register(drone_at("DRONE_001", 0.0, 0.045)).unwrap();
    let service = Arc::new(service);

    let first_request = drone_request(&service, 0.0, 0.0);
    let second_request = drone_request(&service, 0.0, 0.0);

    let barrier = Arc::new(Barrier::new(2));
    let mut handles = Vec::new();
    for request_id in [first_request.id.clone(), second_request.id.clone()] {
        let service = Arc::clone(&service);
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            service.assign_at(&request_id, Some("DRONE_001"), t0())
        }));
    }

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(
        results
            .iter()
            .filter(|r| matches!(r, Err(DispatchError::ResourceUnavailable { .. })))
            .count(),
        1
    );
}

#[test]
fn test_racing_auto_assignments_spread_over_the_fleet() {
    let (registry, service) = empty_service();
    registry.register(drone_at("DRONE_001", 0.0, 0.045)).unwrap();
    registry.register(drone_at("DRONE_002", 0.0, 0.050)).unwrap();
    registry.register(drone_at("DRONE_003", 0.0, 0.055)).unwrap();
    let service = Arc::new(service);

    let requests: Vec<String> = (0..3)
        .map(|_| drone_request(&service, 0.0, 0.0).id)
        .collect();

    let barrier = Arc::new(Barrier::new(3));
    let mut handles = Vec::new();
    for request_id in requests {
        let service = Arc::clone(&service);
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            service.assign_at(&request_id, None, t0())
        }));
    }

    // Losing a candidate to a concurrent claim falls through to the next,
    // so with three drones every dispatcher comes away with one
    let mut resource_ids: Vec<String> = handles
        .into_iter()
        .map(|h| h.join().unwrap().unwrap().resource_id)
        .collect();
    resource_ids.sort();
    resource_ids.dedup();
    assert_eq!(resource_ids.len(), 3);
}

#[test]
fn test_parallel_polls_record_one_arrival() {
    let (_registry, service) = empty_service();
    service
        .registry()
        .register(drone_at("DRONE_001", 0.0, 0.045))
        .unwrap();
    let request = drone_request(&service, 0.0, 0.0);
    let assignment = service
        .assign_at(&request.id, Some("DRONE_001"), t0())
        .unwrap();
    service.advance_at(&assignment.id, t0()).unwrap();

    let service = Arc::new(service);
    let barrier = Arc::new(Barrier::new(4));
    let mut handles = Vec::new();
    for _ in 0..4 {
        let service = Arc::clone(&service);
        let barrier = Arc::clone(&barrier);
        let assignment_id = assignment.id.clone();
        handles.push(thread::spawn(move || {
            barrier.wait();
            service.advance_at(&assignment_id, t_plus_secs(400))
        }));
    }
    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    let settled = service.get(&assignment.id).unwrap();
    assert_eq!(settled.status, DispatchStatus::InProgress);
    assert_eq!(settled.actual_arrival, Some(t_plus_secs(400)));
    let arrivals = settled
        .progress_log
        .iter()
        .filter(|e| e.kind == ProgressEventKind::Arrived)
        .count();
    assert_eq!(arrivals, 1);
}

#[test]
fn test_cancel_racing_with_advances() {
    let (registry, service) = empty_service();
    registry.register(drone_at("DRONE_001", 0.0, 0.045)).unwrap();
    let request = drone_request(&service, 0.0, 0.0);
    let assignment = service
        .assign_at(&request.id, Some("DRONE_001"), t0())
        .unwrap();

    let service = Arc::new(service);
    let barrier = Arc::new(Barrier::new(2));

    let poller = {
        let service = Arc::clone(&service);
        let barrier = Arc::clone(&barrier);
        let assignment_id = assignment.id.clone();
        thread::spawn(move || {
            barrier.wait();
            for secs in 0..20 {
                service.advance_at(&assignment_id, t_plus_secs(secs)).unwrap();
            }
        })
    };
    let canceller = {
        let service = Arc::clone(&service);
        let barrier = Arc::clone(&barrier);
        let assignment_id = assignment.id.clone();
        thread::spawn(move || {
            barrier.wait();
            service.cancel_at(&assignment_id, t_plus_secs(5)).unwrap()
        })
    };

    poller.join().unwrap();
    let cancelled = canceller.join().unwrap();

    // The flight takes minutes, so no poll can finish the assignment
    // before the cancel reaches it
    assert!(cancelled);
    assert_eq!(
        service.get(&assignment.id).unwrap().status,
        DispatchStatus::Cancelled
    );
    assert_eq!(
        registry.get("DRONE_001").unwrap().status,
        ResourceStatus::Available
    );
}

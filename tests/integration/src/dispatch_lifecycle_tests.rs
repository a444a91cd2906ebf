//! End-to-End Dispatch Lifecycle Integration Tests
//!
//! This test suite validates the complete assignment workflow:
//! 1. Request creation and resource assignment with route planning
//! 2. Travel progression through polled advances
//! 3. Arrival detection and on-scene service dwell
//! 4. Completion, resource release, and history archival
//! 5. Cancellation semantics at each lifecycle stage

use crate::test_utils::{drone_at, drone_request, empty_service, t0, t_plus_secs};
use rallypoint_domain::{DispatchStatus, Location, ProgressEventKind, ResourceStatus};
use rallypoint_engine::DispatchError;

#[test]
fn test_end_to_end_dispatch_lifecycle() {
    // Initialize tracing only if not already initialized
    let _ = tracing_subscriber::fmt::try_init();

    // Drone ~5003.77 m east of the incident: ~333.6 s of flight at 15 m/s
    let (registry, service) = empty_service();
    registry.register(drone_at("DRONE_001", 0.0, 0.045)).unwrap();
    let request = drone_request(&service, 0.0, 0.0);

    // Step 1: Assignment claims the resource and plans the route
    tracing::info!("Step 1: Assigning the drone to the request");
    let assignment = service
        .assign_at(&request.id, Some("DRONE_001"), t0())
        .unwrap();
    assert_eq!(assignment.status, DispatchStatus::Assigned);
    assert_eq!(assignment.route.len(), 3);
    assert_eq!(assignment.route[0], Location::new(0.0, 0.045).unwrap());
    assert_eq!(
        *assignment.route.last().unwrap(),
        Location::new(0.0, 0.0).unwrap()
    );
    let eta_ms = (assignment.estimated_arrival.unwrap() - t0()).num_milliseconds();
    assert!((eta_ms - 333_585).abs() < 1_000, "eta was {eta_ms} ms");
    assert_eq!(
        registry.get("DRONE_001").unwrap().status,
        ResourceStatus::Dispatched
    );

    // Step 2: First poll starts the travel
    tracing::info!("Step 2: First poll dispatches the drone");
    let dispatched = service.advance_at(&assignment.id, t0()).unwrap();
    assert_eq!(dispatched.status, DispatchStatus::Dispatched);
    assert_eq!(dispatched.progress_log.len(), 1);
    assert_eq!(
        dispatched.progress_log[0].kind,
        ProgressEventKind::Dispatched
    );
    assert_eq!(
        registry.get("DRONE_001").unwrap().status,
        ResourceStatus::EnRoute
    );

    // Step 3: Mid-flight poll reports the middle waypoint
    tracing::info!("Step 3: Mid-flight position update");
    let en_route = service.advance_at(&assignment.id, t_plus_secs(167)).unwrap();
    assert_eq!(en_route.status, DispatchStatus::Dispatched);
    let position = en_route.current_location.clone().unwrap();
    assert!((position.lat - 0.0).abs() < 1e-9);
    assert!((position.lon - 0.0225).abs() < 1e-9);
    let last_event = en_route.progress_log.last().unwrap().clone();
    assert_eq!(last_event.kind, ProgressEventKind::EnRoute);
    assert_eq!(last_event.progress_pct, Some(50));

    // Re-polling the same instant adds nothing to the log
    let repolled = service.advance_at(&assignment.id, t_plus_secs(167)).unwrap();
    assert_eq!(repolled.progress_log.len(), 2);

    // Step 4: Poll past the predicted window records the arrival
    tracing::info!("Step 4: Arrival on scene");
    let arrived = service.advance_at(&assignment.id, t_plus_secs(335)).unwrap();
    assert_eq!(arrived.status, DispatchStatus::InProgress);
    assert_eq!(arrived.actual_arrival, Some(t_plus_secs(335)));
    assert_eq!(
        arrived.current_location,
        Some(Location::new(0.0, 0.0).unwrap())
    );
    let drone = registry.get("DRONE_001").unwrap();
    assert_eq!(drone.status, ResourceStatus::Arrived);
    assert_eq!(drone.location, Location::new(0.0, 0.0).unwrap());

    // Step 5: The service dwell must elapse strictly
    tracing::info!("Step 5: Exactly the dwell is not yet completion");
    let dwelling = service.advance_at(&assignment.id, t_plus_secs(635)).unwrap();
    assert_eq!(dwelling.status, DispatchStatus::InProgress);
    assert!(service.fulfillment_history().unwrap().is_empty());

    // Step 6: One second later the work completes and archives
    tracing::info!("Step 6: Completion and archival");
    let completed = service.advance_at(&assignment.id, t_plus_secs(636)).unwrap();
    assert_eq!(completed.status, DispatchStatus::Completed);
    assert_eq!(completed.completion_time, Some(t_plus_secs(636)));
    assert_eq!(
        registry.get("DRONE_001").unwrap().status,
        ResourceStatus::Available
    );
    let history = service.fulfillment_history().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].assignment.id, assignment.id);
    assert_eq!(history[0].request.id, request.id);
    assert_eq!(history[0].completed_at, t_plus_secs(636));
    assert_eq!(history[0].resource.status, ResourceStatus::Available);

    // Step 7: Terminal assignments are inert
    tracing::info!("Step 7: Post-completion polls change nothing");
    let after = service.advance_at(&assignment.id, t_plus_secs(900)).unwrap();
    assert_eq!(after, completed);
    assert_eq!(service.fulfillment_history().unwrap().len(), 1);
}

#[test]
fn test_zero_distance_assignment_still_steps_once_per_poll() {
    let (registry, service) = empty_service();
    registry.register(drone_at("DRONE_001", 0.0, 0.0)).unwrap();
    let request = drone_request(&service, 0.0, 0.0);

    let assignment = service
        .assign_at(&request.id, Some("DRONE_001"), t0())
        .unwrap();
    assert_eq!(assignment.estimated_arrival, Some(t0()));

    // Even with no travel, dispatch and arrival are separate polls
    let first = service.advance_at(&assignment.id, t0()).unwrap();
    assert_eq!(first.status, DispatchStatus::Dispatched);

    let second = service.advance_at(&assignment.id, t0()).unwrap();
    assert_eq!(second.status, DispatchStatus::InProgress);
    assert_eq!(second.actual_arrival, Some(t0()));
}

#[test]
fn test_cancel_en_route_frees_the_resource() {
    let (registry, service) = empty_service();
    registry.register(drone_at("DRONE_001", 0.0, 0.045)).unwrap();
    let request = drone_request(&service, 0.0, 0.0);
    let assignment = service
        .assign_at(&request.id, Some("DRONE_001"), t0())
        .unwrap();
    service.advance_at(&assignment.id, t0()).unwrap();

    assert!(service.cancel_at(&assignment.id, t_plus_secs(60)).unwrap());
    assert_eq!(
        service.get(&assignment.id).unwrap().status,
        DispatchStatus::Cancelled
    );
    assert_eq!(
        registry.get("DRONE_001").unwrap().status,
        ResourceStatus::Available
    );

    // The freed drone can immediately serve another request
    let second_request = drone_request(&service, 0.0, 0.0);
    let second = service
        .assign_at(&second_request.id, Some("DRONE_001"), t_plus_secs(61))
        .unwrap();
    assert_eq!(second.resource_id, "DRONE_001");
}

#[test]
fn test_cancel_after_completion_reports_false() {
    let (registry, service) = empty_service();
    registry.register(drone_at("DRONE_001", 0.0, 0.0)).unwrap();
    let request = drone_request(&service, 0.0, 0.0);
    let assignment = service
        .assign_at(&request.id, Some("DRONE_001"), t0())
        .unwrap();

    service.advance_at(&assignment.id, t0()).unwrap();
    service.advance_at(&assignment.id, t0()).unwrap();
    service.advance_at(&assignment.id, t_plus_secs(301)).unwrap();
    assert_eq!(
        service.get(&assignment.id).unwrap().status,
        DispatchStatus::Completed
    );

    assert!(!service.cancel_at(&assignment.id, t_plus_secs(302)).unwrap());
    assert_eq!(
        service.get(&assignment.id).unwrap().status,
        DispatchStatus::Completed
    );
}

#[test]
fn test_assign_conflicts_and_fallback() {
    let (registry, service) = empty_service();
    registry.register(drone_at("DRONE_NEAR", 0.0, 0.045)).unwrap();
    registry.register(drone_at("DRONE_FAR", 0.0, 0.090)).unwrap();

    let first_request = drone_request(&service, 0.0, 0.0);
    service
        .assign_at(&first_request.id, Some("DRONE_NEAR"), t0())
        .unwrap();

    // Naming the busy drone fails outright
    let second_request = drone_request(&service, 0.0, 0.0);
    let err = service
        .assign_at(&second_request.id, Some("DRONE_NEAR"), t0())
        .unwrap_err();
    assert!(matches!(err, DispatchError::ResourceUnavailable { .. }));

    // Automatic selection quietly falls back to the next candidate
    let assignment = service.assign_at(&second_request.id, None, t0()).unwrap();
    assert_eq!(assignment.resource_id, "DRONE_FAR");
}

#[test]
fn test_track_view_mid_flight() {
    let (registry, service) = empty_service();
    registry
        .register(drone_at("DRONE_001", 0.0, 0.045).with_contact("radio", "channel-7"))
        .unwrap();
    let request = drone_request(&service, 0.0, 0.0);
    let assignment = service
        .assign_at(&request.id, Some("DRONE_001"), t0())
        .unwrap();
    service.advance_at(&assignment.id, t0()).unwrap();

    let info = service.track_at(&assignment.id, t_plus_secs(167)).unwrap();
    assert_eq!(info.assignment_id, assignment.id);
    assert_eq!(info.status, DispatchStatus::Dispatched);
    assert_eq!(info.resource_id, "DRONE_001");
    assert_eq!(info.progress_pct, 50);
    assert_eq!(info.destination, Some(Location::new(0.0, 0.0).unwrap()));
    assert_eq!(info.contact.get("radio").map(String::as_str), Some("channel-7"));
    assert!(!info.recent_events.is_empty());
}

#[test]
fn test_list_assignments_advances_and_orders_newest_first() {
    let (registry, service) = empty_service();
    registry.register(drone_at("DRONE_001", 0.0, 0.045)).unwrap();
    registry.register(drone_at("DRONE_002", 0.0, 0.090)).unwrap();

    let first_request = drone_request(&service, 0.0, 0.0);
    let first = service
        .assign_at(&first_request.id, Some("DRONE_001"), t0())
        .unwrap();
    let second_request = drone_request(&service, 0.0, 0.0);
    let second = service
        .assign_at(&second_request.id, Some("DRONE_002"), t_plus_secs(10))
        .unwrap();

    let listed = service
        .list_assignments_at(None, 10, t_plus_secs(20))
        .unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, second.id);
    assert_eq!(listed[1].id, first.id);
    // The listing poll itself started both flights
    assert!(listed.iter().all(|a| a.status == DispatchStatus::Dispatched));

    let limited = service
        .list_assignments_at(None, 1, t_plus_secs(20))
        .unwrap();
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].id, second.id);
}

#[test]
fn test_status_detail_and_resource_detail_join() {
    let (registry, service) = empty_service();
    registry.register(drone_at("DRONE_001", 0.0, 0.045)).unwrap();
    let request = drone_request(&service, 0.0, 0.0);
    let assignment = service
        .assign_at(&request.id, Some("DRONE_001"), t0())
        .unwrap();

    let detail = service.status(&assignment.id).unwrap();
    assert_eq!(detail.assignment.id, assignment.id);
    assert_eq!(detail.resource.id, "DRONE_001");
    assert_eq!(detail.request.requester_id, "ops-center");

    let resource_view = service.resource_detail("DRONE_001").unwrap();
    assert_eq!(resource_view.resource.status, ResourceStatus::Dispatched);
    assert_eq!(
        resource_view.active_assignment.unwrap().id,
        assignment.id
    );
}

#[test]
fn test_assignment_serializes_for_the_wire() {
    let (registry, service) = empty_service();
    registry.register(drone_at("DRONE_001", 0.0, 0.045)).unwrap();
    let request = drone_request(&service, 0.0, 0.0);
    let assignment = service
        .assign_at(&request.id, Some("DRONE_001"), t0())
        .unwrap();
    service.advance_at(&assignment.id, t0()).unwrap();

    let value = serde_json::to_value(service.get(&assignment.id).unwrap()).unwrap();
    assert_eq!(value["status"], "dispatched");
    assert_eq!(value["resource_id"], "DRONE_001");
    assert_eq!(value["route"].as_array().unwrap().len(), 3);
    assert!(value["actual_arrival"].is_null());

    // Timestamps cross the boundary as RFC 3339 strings
    let assigned_at = value["assigned_at"].as_str().unwrap();
    assert!(assigned_at.starts_with("2025-06-01T12:00:00"));

    // The dispatched event carries no percentage, and the field is omitted
    assert_eq!(value["progress_log"][0]["kind"], "dispatched");
    assert!(value["progress_log"][0].get("progress_pct").is_none());
}

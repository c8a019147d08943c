mod common;

use common::{at, config, controller, empty_page, insert_row};
use deadline_core::protocol::NoOverlay;
use deadline_core::{DeadlineError, Overlay, Request, Response};
use serde_json::json;

#[derive(Default)]
struct FakeLegend {
    visible: bool,
}

impl Overlay for FakeLegend {
    fn toggle(&mut self) -> Result<bool, DeadlineError> {
        self.visible = !self.visible;
        Ok(self.visible)
    }
}

#[test]
fn requests_are_decoded_from_action_tags() {
    let decode = |value| serde_json::from_value::<Request>(value);
    assert_eq!(decode(json!({"action": "start"})).unwrap(), Request::Start);
    assert_eq!(decode(json!({"action": "stop"})).unwrap(), Request::Stop);
    assert_eq!(decode(json!({"action": "clear"})).unwrap(), Request::Clear);
    assert_eq!(decode(json!({"action": "status"})).unwrap(), Request::Status);
    assert_eq!(decode(json!({"action": "ping"})).unwrap(), Request::Ping);
    assert_eq!(
        decode(json!({"action": "toggle-legend"})).unwrap(),
        Request::ToggleLegend
    );
    assert!(decode(json!({"action": "reboot"})).is_err());
    assert!(decode(json!({})).is_err());
}

#[test]
fn start_stop_and_status_round_trip() {
    let cfg = config(1, 2);
    let page = empty_page(&cfg);
    insert_row(&page, 1, 2, "05-03-2024 14:30");
    let mut scanner = controller(cfg, &page, at(1, 3, 2024, 8, 0));
    let mut legend = FakeLegend::default();

    let started = scanner.handle(Request::Start, &mut legend);
    assert_eq!(
        serde_json::to_value(&started).unwrap(),
        json!({"success": true, "message": "Scanner started"})
    );
    assert_eq!(
        scanner.handle(Request::Start, &mut legend),
        Response::failure("Scanner already running")
    );

    scanner.tick();
    assert_eq!(
        serde_json::to_value(scanner.handle(Request::Status, &mut legend)).unwrap(),
        json!({"isActive": true, "processedRows": 1})
    );

    assert_eq!(
        scanner.handle(Request::Stop, &mut legend),
        Response::ok("Scanner stopped")
    );
    assert_eq!(
        scanner.handle(Request::Stop, &mut legend),
        Response::ok("Scanner stopped")
    );
    assert_eq!(
        serde_json::to_value(scanner.handle(Request::Ping, &mut legend)).unwrap(),
        json!({"success": true, "message": "Content script is active", "isActive": false})
    );
}

#[test]
fn clear_reports_success_even_when_nothing_was_scanned() {
    let cfg = config(1, 1);
    let page = empty_page(&cfg);
    let mut scanner = controller(cfg, &page, at(1, 3, 2024, 8, 0));

    let response = scanner.handle(Request::Clear, &mut NoOverlay);
    assert!(response.is_success());
    assert!(!scanner.is_active());
}

#[test]
fn legend_toggle_reports_visibility() {
    let cfg = config(1, 1);
    let page = empty_page(&cfg);
    let mut scanner = controller(cfg, &page, at(1, 3, 2024, 8, 0));
    let mut legend = FakeLegend::default();

    assert_eq!(
        serde_json::to_value(scanner.handle(Request::ToggleLegend, &mut legend)).unwrap(),
        json!({"success": true, "visible": true})
    );
    assert_eq!(
        scanner.handle(Request::ToggleLegend, &mut legend),
        Response::Legend {
            success: true,
            visible: false
        }
    );
    assert_eq!(
        scanner.handle(Request::ToggleLegend, &mut NoOverlay),
        Response::Legend {
            success: false,
            visible: false
        }
    );
}

#[test]
fn unknown_action_reply_shape() {
    assert_eq!(
        serde_json::to_value(Response::unknown_action()).unwrap(),
        json!({"success": false, "message": "Unknown action"})
    );
    let decoded: Response =
        serde_json::from_value(json!({"success": false, "message": "Unknown action"})).unwrap();
    assert_eq!(decoded, Response::unknown_action());
}

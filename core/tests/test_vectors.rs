//! Verify dispatch behaviour against JSON test vectors in `test-vectors/`.
//!
//! Each case gives a config as loose JSON, the request the transport should
//! have received, a simulated terminal state, and the expected callback
//! result. Cases run through `MockTransport`, so no network is involved.

use std::sync::mpsc;

use xhr_core::{dispatch, DispatchError, HttpMethod, MockTransport, RequestConfig};

#[test]
fn dispatch_test_vectors() {
    let raw = include_str!("../../test-vectors/dispatch.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let config: RequestConfig = serde_json::from_value(case["config"].clone()).unwrap();

        let mock = MockTransport::new();
        let (tx, rx) = mpsc::channel();
        dispatch(&mock, config, move |result| {
            tx.send(result).unwrap();
        });

        // Verify the request the transport saw
        if let Some(expected_req) = case.get("expected_request") {
            let requests = mock.requests();
            assert_eq!(requests.len(), 1, "{name}: request count");
            let req = &requests[0];
            assert_eq!(
                req.method,
                HttpMethod::parse(expected_req["method"].as_str().unwrap()),
                "{name}: method"
            );
            assert_eq!(req.url, expected_req["url"].as_str().unwrap(), "{name}: url");

            let expected_headers: Vec<(String, String)> = expected_req["headers"]
                .as_array()
                .unwrap()
                .iter()
                .map(|h| {
                    let arr = h.as_array().unwrap();
                    (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
                })
                .collect();
            assert_eq!(req.headers, expected_headers, "{name}: headers");
            assert_eq!(req.body.as_deref(), expected_req["body"].as_str(), "{name}: body");

            // Nothing is reported before the terminal state
            assert!(rx.try_recv().is_err(), "{name}: callback fired early");

            let sim = &case["simulated_response"];
            mock.respond(
                sim["status"].as_u64().unwrap() as u16,
                sim["body"].as_str().unwrap(),
            );
        } else {
            assert!(mock.requests().is_empty(), "{name}: nothing should be sent");
        }

        // Verify the callback result
        let result = rx.try_recv().unwrap_or_else(|_| panic!("{name}: callback did not fire"));
        assert!(rx.try_recv().is_err(), "{name}: callback fired twice");

        if let Some(expected_error) = case.get("expected_error") {
            let err = result.unwrap_err();
            match expected_error.as_str().unwrap() {
                "Network" => {
                    assert!(matches!(err, DispatchError::Network(_)), "{name}: expected Network");
                    assert!(err.handle().is_some(), "{name}: network error keeps the handle");
                }
                "MissingUrl" => {
                    assert!(matches!(err, DispatchError::MissingUrl), "{name}: expected MissingUrl");
                    assert!(err.handle().is_none(), "{name}: no handle without a request");
                }
                other => panic!("{name}: unknown expected_error: {other}"),
            }
            assert_eq!(
                err.to_string(),
                case["expected_message"].as_str().unwrap(),
                "{name}: message"
            );
        } else {
            let outcome = result.unwrap();
            let expected = &case["expected_result"];
            assert_eq!(outcome.body, expected["body"].as_str().unwrap(), "{name}: body");
            assert_eq!(
                u64::from(outcome.handle.status),
                expected["status"].as_u64().unwrap(),
                "{name}: status"
            );
        }
    }
}

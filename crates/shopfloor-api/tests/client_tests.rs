// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use shopfloor_api::Client;
use shopfloor_app::{
    ColumnFilter, FormKind, FormPayload, Machine, MachineFault, MachineId,
    ProductionInstructionId, RoutingStatus, TransitionRequest,
};
use std::io::Read;
use std::thread;
use std::time::Duration;
use tiny_http::{Header, Request, Response, Server};

fn mock_server() -> Result<(Server, String)> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}/api", server.server_addr());
    Ok((server, addr))
}

fn respond_json(request: Request, status: u16, body: &str) {
    let response = Response::from_string(body)
        .with_status_code(status)
        .with_header(
            Header::from_bytes("Content-Type", "application/json")
                .expect("valid content type header"),
        );
    request.respond(response).expect("response should succeed");
}

fn header(request: &Request, name: &'static str) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|header| header.field.equiv(name))
        .map(|header| header.value.as_str().to_owned())
}

#[test]
fn unreachable_server_error_names_the_fix() {
    let client = Client::new("http://127.0.0.1:1/api", None, Duration::from_millis(50))
        .expect("client should initialize");

    let error = client
        .ping()
        .expect_err("ping should fail for unreachable endpoint");
    assert!(error.to_string().contains("api.base_url"));
}

#[test]
fn base_url_must_be_http() {
    let error = Client::new("ftp://factory.local", None, Duration::from_secs(1))
        .expect_err("ftp scheme should be rejected");
    assert!(error.to_string().contains("http or https"));
    assert!(Client::new("  ", None, Duration::from_secs(1)).is_err());
}

#[test]
fn list_attaches_bearer_token_and_counts_rejected_rows() -> Result<()> {
    let (server, addr) = mock_server()?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/api/Machine");
        assert_eq!(
            header(&request, "Authorization").as_deref(),
            Some("Bearer s3cret")
        );
        respond_json(
            request,
            200,
            r#"[
                {"id": 1, "name": "CNC Torna", "isActive": 1},
                {"id": 2, "name": "Pres", "isActive": 0},
                {"name": "no id"}
            ]"#,
        );
    });

    let client = Client::new(&addr, Some("s3cret"), Duration::from_secs(2))?;
    let listing = client.list::<Machine>()?;
    assert_eq!(listing.rows.len(), 2);
    assert_eq!(listing.rejected, 1);
    assert_eq!(listing.rows[0].name, "CNC Torna");

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn column_filters_become_query_parameters() -> Result<()> {
    let (server, addr) = mock_server()?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/api/MachineFault?severity=Y%C3%BCksek");
        respond_json(
            request,
            200,
            r#"[{"id": 4, "machineId": 1, "description": "Motor ısınıyor", "severity": "Yüksek"}]"#,
        );
    });

    let client = Client::new(&addr, None, Duration::from_secs(2))?;
    let listing =
        client.list_filtered::<MachineFault>(&[ColumnFilter::new("severity", "Yüksek")])?;
    assert_eq!(listing.rows.len(), 1);
    assert!(listing.rows[0].is_open());

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn server_errors_surface_cleaned_messages() -> Result<()> {
    let (server, addr) = mock_server()?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        respond_json(
            request,
            500,
            r#"{"title":"Internal error","detail":"database offline"}"#,
        );
    });

    let client = Client::new(&addr, None, Duration::from_secs(2))?;
    let error = client
        .list::<Machine>()
        .expect_err("500 should fail the listing");
    assert_eq!(
        error.to_string(),
        "server error (500): Internal error; database offline"
    );

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn transitions_post_to_routing_endpoints() -> Result<()> {
    let (server, addr) = mock_server()?;

    let handle = thread::spawn(move || {
        let mut seen = Vec::new();
        for _ in 0..3 {
            let mut request = server.recv().expect("request expected");
            let mut body = String::new();
            request
                .as_reader()
                .read_to_string(&mut body)
                .expect("body should be readable");
            seen.push((request.method().to_string(), request.url().to_owned(), body));
            respond_json(request, 200, "{}");
        }
        seen
    });

    let client = Client::new(&addr, Some("tok"), Duration::from_secs(2))?;
    let instruction = ProductionInstructionId::new(7);
    client.submit_transition(&TransitionRequest::EnterMachine {
        instruction,
        machine: MachineId::new(3),
    })?;
    client.submit_transition(&TransitionRequest::ExitMachine {
        instruction,
        machine: MachineId::new(3),
    })?;
    client.submit_transition(&TransitionRequest::Complete { instruction })?;

    let seen = handle.join().expect("server thread should join");
    assert_eq!(seen[0].0, "POST");
    assert_eq!(seen[0].1, "/api/ProductionInstruction/EnterMachine");
    let body: serde_json::Value = serde_json::from_str(&seen[0].2)?;
    assert_eq!(
        body,
        serde_json::json!({"productionInstructionId": 7, "machineId": 3})
    );
    assert_eq!(seen[1].1, "/api/ProductionInstruction/ExitMachine");
    assert_eq!(seen[2].1, "/api/ProductionInstruction/7/Complete");
    Ok(())
}

#[test]
fn invalid_payload_never_reaches_the_server() -> Result<()> {
    let client = Client::new("http://127.0.0.1:1/api", None, Duration::from_millis(50))?;
    let error = client
        .create(&FormPayload::blank_for(FormKind::Machine))
        .expect_err("blank machine form should fail validation");
    assert!(error.to_string().contains("machine name is required"));

    let error = client
        .submit_transition(&TransitionRequest::Complete {
            instruction: ProductionInstructionId::new(0),
        })
        .expect_err("unassigned instruction should fail validation");
    assert!(error.to_string().contains("select an instruction"));
    Ok(())
}

#[test]
fn delete_uses_record_path() -> Result<()> {
    let (server, addr) = mock_server()?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        let method = request.method().to_string();
        let url = request.url().to_owned();
        respond_json(request, 204, "");
        (method, url)
    });

    let client = Client::new(&addr, None, Duration::from_secs(2))?;
    client.delete::<Machine>(12)?;

    let (method, url) = handle.join().expect("server thread should join");
    assert_eq!(method, "DELETE");
    assert_eq!(url, "/api/Machine/12");
    Ok(())
}

#[test]
fn dashboard_tolerates_individual_failures() -> Result<()> {
    let (server, addr) = mock_server()?;

    let handle = thread::spawn(move || {
        for _ in 0..5 {
            let request = server.recv().expect("request expected");
            match request.url() {
                "/api/Machine" => respond_json(
                    request,
                    200,
                    r#"[{"id": 1, "name": "Torna", "isActive": 1}, {"id": 2, "name": "Freze", "isActive": 0}]"#,
                ),
                "/api/MachineFault" => respond_json(request, 503, "maintenance window"),
                "/api/ProductionInstruction" => respond_json(
                    request,
                    200,
                    r#"[
                        {"id": 1, "productName": "Dişli", "machineId": 1},
                        {"id": 2, "productName": "Mil", "machineId": null},
                        {"id": 3, "productName": "Flanş", "machineId": 2, "isComplated": 1}
                    ]"#,
                ),
                "/api/Store" => respond_json(
                    request,
                    200,
                    r#"[{"id": 1, "name": "Rulman", "quantity": 2, "minQuantity": 5}]"#,
                ),
                "/api/Order" => respond_json(
                    request,
                    200,
                    r#"[
                        {"orderId": 1, "customerName": "Acme", "productName": "Dişli", "quantity": 5, "status": "Yeni"},
                        {"orderId": 2, "customerName": "Beta", "productName": "Mil", "quantity": 1, "status": "Teslim Edildi"}
                    ]"#,
                ),
                other => panic!("unexpected request {other}"),
            }
        }
    });

    let client = Client::new(&addr, None, Duration::from_secs(2))?;
    let snapshot = client.fetch_dashboard();

    assert_eq!(snapshot.active_machines, Some(1));
    assert_eq!(snapshot.open_faults, None);
    let production = snapshot.production.expect("production tile should load");
    assert_eq!(production.count(RoutingStatus::InProgress), 1);
    assert_eq!(production.count(RoutingStatus::NotStarted), 1);
    assert_eq!(production.count(RoutingStatus::Completed), 1);
    assert_eq!(snapshot.low_stock_items, Some(1));
    assert_eq!(snapshot.open_orders, Some(1));
    assert_eq!(snapshot.failures.len(), 1);
    assert!(snapshot.failures[0].starts_with("faults: server error (503)"));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn routing_board_fetches_both_collections() -> Result<()> {
    let (server, addr) = mock_server()?;

    let handle = thread::spawn(move || {
        for _ in 0..2 {
            let request = server.recv().expect("request expected");
            match request.url() {
                "/api/Machine" => {
                    respond_json(request, 200, r#"[{"id": 5, "name": "Kaynak Robotu"}]"#)
                }
                "/api/ProductionInstruction" => respond_json(
                    request,
                    200,
                    r#"[{"id": 9, "productName": "Şase", "machineId": 5, "productionToMachines": [{"machineId": 5, "status": 1}]}]"#,
                ),
                other => panic!("unexpected request {other}"),
            }
        }
    });

    let client = Client::new(&addr, None, Duration::from_secs(2))?;
    let board = client.fetch_routing_board()?;
    let instruction = &board.instructions.rows[0];
    let current = instruction
        .progress()
        .current_machine
        .expect("one station in process");
    assert_eq!(board.machine_name(current), Some("Kaynak Robotu"));

    handle.join().expect("server thread should join");
    Ok(())
}

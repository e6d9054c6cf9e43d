// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use shopfloor_api::Client;
use shopfloor_app::{
    ColumnFilter, DashboardSnapshot, FormPayload, ProductionInstruction, Resource, Screen,
    TransitionRequest, apply_column_filters,
};
use shopfloor_tui::{AppRuntime, RecordSource};
use tracing::debug;

/// Single-record reads for `--show`.
pub trait RecordLookup {
    fn lookup<R: Resource>(&mut self, id: i64) -> Result<R>;
}

pub struct ApiRuntime {
    client: Client,
}

impl ApiRuntime {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl RecordSource for ApiRuntime {
    /// Screens the server cannot filter get the predicates applied here.
    fn fetch<R: Resource>(&mut self, filters: &[ColumnFilter]) -> Result<(Vec<R>, usize)> {
        if filters.is_empty() || R::SCREEN.filters_server_side() {
            let listing = self.client.list_filtered::<R>(filters)?;
            return Ok((listing.rows, listing.rejected));
        }

        let listing = self.client.list::<R>()?;
        let rows = narrow(&listing.rows, filters)?;
        Ok((rows, listing.rejected))
    }

    fn fetch_production(
        &mut self,
        filters: &[ColumnFilter],
    ) -> Result<(Vec<ProductionInstruction>, usize)> {
        let mut board = self.client.fetch_routing_board()?;
        let mut rows = std::mem::take(&mut board.instructions.rows);
        let mut named = 0;
        for step in rows
            .iter_mut()
            .flat_map(|instruction| instruction.production_to_machines.iter_mut())
            .filter(|step| step.machine_name.trim().is_empty())
        {
            if let Some(name) = board.machine_name(step.machine_id) {
                step.machine_name = name.to_owned();
                named += 1;
            }
        }
        debug!(named, "filled routing step machine names");

        let rows = if filters.is_empty() {
            rows
        } else {
            narrow(&rows, filters)?
        };
        Ok((rows, board.instructions.rejected))
    }
}

impl AppRuntime for ApiRuntime {
    fn load_dashboard(&mut self) -> Result<DashboardSnapshot> {
        Ok(self.client.fetch_dashboard())
    }

    fn delete_row(&mut self, screen: Screen, row_id: i64) -> Result<()> {
        let collection = screen
            .collection()
            .ok_or_else(|| anyhow!("{} has no rows to delete", screen.label()))?;
        self.client.delete_record(collection, row_id)
    }

    fn submit_transition(&mut self, request: &TransitionRequest) -> Result<()> {
        self.client.submit_transition(request)
    }

    fn create_record(&mut self, payload: &FormPayload) -> Result<()> {
        self.client.create(payload)
    }

    fn update_record(&mut self, row_id: i64, payload: &FormPayload) -> Result<()> {
        self.client.update(row_id, payload)
    }
}

impl RecordLookup for ApiRuntime {
    fn lookup<R: Resource>(&mut self, id: i64) -> Result<R> {
        self.client.get::<R>(id)
    }
}

fn narrow<R: Resource>(rows: &[R], filters: &[ColumnFilter]) -> Result<Vec<R>> {
    Ok(apply_column_filters(rows, filters)?
        .into_iter()
        .cloned()
        .collect())
}

#[cfg(test)]
mod tests {
    use super::{ApiRuntime, RecordLookup};
    use anyhow::{Result, anyhow};
    use shopfloor_api::Client;
    use shopfloor_app::{ColumnFilter, Machine, Person, Screen};
    use shopfloor_tui::{AppRuntime, RecordSource};
    use std::thread;
    use std::time::Duration;
    use tiny_http::{Header, Response, Server};

    /// Serves `count` requests, answering each by URL prefix, and returns
    /// the URLs it saw.
    fn serve(
        count: usize,
        routes: Vec<(&'static str, &'static str)>,
    ) -> Result<(String, thread::JoinHandle<Vec<String>>)> {
        let server =
            Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
        let base = format!("http://{}/api", server.server_addr());
        let handle = thread::spawn(move || {
            let mut seen = Vec::new();
            for _ in 0..count {
                let Ok(request) = server.recv() else { break };
                let url = request.url().to_owned();
                let body = routes
                    .iter()
                    .find(|(prefix, _)| url.starts_with(prefix))
                    .map_or("[]", |(_, body)| body);
                let response = Response::from_string(body).with_header(
                    Header::from_bytes("Content-Type", "application/json")
                        .expect("valid content type header"),
                );
                request.respond(response).expect("response should succeed");
                seen.push(url);
            }
            seen
        });
        Ok((base, handle))
    }

    fn runtime(base: &str) -> Result<ApiRuntime> {
        Ok(ApiRuntime::new(Client::new(
            base,
            Some("secret"),
            Duration::from_secs(2),
        )?))
    }

    #[test]
    fn production_steps_get_machine_names_from_the_board() -> Result<()> {
        let (base, handle) = serve(
            2,
            vec![
                (
                    "/api/Machine",
                    r#"[{"id": 5, "name": "CNC Torna"}, {"id": 6, "name": "Pres 200T"}]"#,
                ),
                (
                    "/api/ProductionInstruction",
                    r#"[{"id": 1, "productName": "Flanş", "machineId": 5,
                        "productionToMachines": [
                            {"machineId": 5, "machineName": "", "status": 1},
                            {"machineId": 6, "machineName": "Pres (eski)", "status": 0},
                            {"machineId": 9, "status": 0}
                        ]},
                       {"productName": "broken row"}]"#,
                ),
            ],
        )?;

        let (rows, rejected) = runtime(&base)?.fetch_production(&[])?;
        handle.join().map_err(|_| anyhow!("mock server panicked"))?;

        assert_eq!(rejected, 1);
        let names: Vec<&str> = rows[0]
            .production_to_machines
            .iter()
            .map(|step| step.machine_name.as_str())
            .collect();
        assert_eq!(names, vec!["CNC Torna", "Pres (eski)", ""]);
        Ok(())
    }

    #[test]
    fn server_side_screens_send_filters_as_query() -> Result<()> {
        let (base, handle) = serve(1, vec![("/api/Machine", r#"[{"id": 1, "name": "CNC"}]"#)])?;

        let (rows, _) =
            runtime(&base)?.fetch::<Machine>(&[ColumnFilter::new("name", "cnc")])?;
        let seen = handle.join().map_err(|_| anyhow!("mock server panicked"))?;

        assert_eq!(rows.len(), 1);
        assert_eq!(seen, vec!["/api/Machine?name=cnc".to_owned()]);
        Ok(())
    }

    #[test]
    fn local_screens_filter_after_fetching_everything() -> Result<()> {
        let (base, handle) = serve(
            1,
            vec![(
                "/api/Person",
                r#"[{"id": 1, "firstName": "Ayşe", "lastName": "Yılmaz", "department": "Kalite"},
                    {"id": 2, "firstName": "Mehmet", "lastName": "Demir", "department": "Üretim"}]"#,
            )],
        )?;

        let (rows, _) =
            runtime(&base)?.fetch::<Person>(&[ColumnFilter::new("department", "ÜRET")])?;
        let seen = handle.join().map_err(|_| anyhow!("mock server panicked"))?;

        assert_eq!(seen, vec!["/api/Person".to_owned()]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].first_name, "Mehmet");
        Ok(())
    }

    #[test]
    fn lookup_reads_one_record() -> Result<()> {
        let (base, handle) = serve(
            1,
            vec![("/api/Machine/3", r#"{"data": {"id": 3, "name": "Kaynak"}}"#)],
        )?;

        let machine: Machine = runtime(&base)?.lookup(3)?;
        handle.join().map_err(|_| anyhow!("mock server panicked"))?;

        assert_eq!(machine.name, "Kaynak");
        Ok(())
    }

    #[test]
    fn dashboard_has_no_collection_to_delete_from() -> Result<()> {
        let mut runtime = runtime("http://127.0.0.1:1/api")?;
        let error = runtime
            .delete_row(Screen::Dashboard, 1)
            .expect_err("dashboard delete should fail");
        assert!(error.to_string().contains("dashboard"));
        Ok(())
    }
}

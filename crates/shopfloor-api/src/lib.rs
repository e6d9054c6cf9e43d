// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;
use std::thread::{self, ScopedJoinHandle};
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shopfloor_app::{
    ColumnFilter, DashboardSnapshot, FormPayload, Machine, MachineFault, MachineId, Order,
    ProductionInstruction, ProductionInstructionId, Resource, StatusBreakdown, StoreItem,
    TransitionRequest, order_is_open,
};
use tracing::{debug, info, warn};
use url::Url;

/// Rows of one collection that decoded cleanly, plus how many did not.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing<R> {
    pub rows: Vec<R>,
    pub rejected: usize,
}

impl<R> Default for Listing<R> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            rejected: 0,
        }
    }
}

/// Machines and instructions fetched together for cross-referencing.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingBoard {
    pub machines: Listing<Machine>,
    pub instructions: Listing<ProductionInstruction>,
}

impl RoutingBoard {
    pub fn machine_name(&self, id: MachineId) -> Option<&str> {
        self.machines
            .rows
            .iter()
            .find(|machine| machine.id == id)
            .map(|machine| machine.name.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    token: Option<String>,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, token: Option<&str>, timeout: Duration) -> Result<Self> {
        let trimmed = base_url.trim();
        if trimmed.is_empty() {
            bail!("api.base_url must not be empty -- set it in the config file");
        }
        let mut base_url =
            Url::parse(trimmed).with_context(|| format!("parse api.base_url {trimmed:?}"))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            bail!(
                "api.base_url must use http or https, got {:?}",
                base_url.scheme()
            );
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let token = token
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_owned);

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            token,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Reachability and authorisation check against the machine collection.
    pub fn ping(&self) -> Result<()> {
        let url = self.endpoint(Machine::COLLECTION)?;
        self.get_value(url).map(|_| ())
    }

    pub fn list<R: Resource>(&self) -> Result<Listing<R>> {
        self.list_filtered(&[])
    }

    pub fn list_filtered<R: Resource>(&self, filters: &[ColumnFilter]) -> Result<Listing<R>> {
        let mut url = self.endpoint(R::COLLECTION)?;
        if !filters.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for filter in filters {
                let (field, needle) = filter.query_pair();
                pairs.append_pair(field, needle);
            }
        }
        let body = self.get_value(url)?;
        let listing = decode_listing(body, R::COLLECTION)?;
        debug!(
            collection = R::COLLECTION,
            rows = listing.rows.len(),
            rejected = listing.rejected,
            "listed collection"
        );
        Ok(listing)
    }

    pub fn get<R: Resource>(&self, id: i64) -> Result<R> {
        let url = self.endpoint(&format!("{}/{id}", R::COLLECTION))?;
        let body = unwrap_envelope(self.get_value(url)?);
        serde_json::from_value(body).with_context(|| format!("decode {} {id}", R::COLLECTION))
    }

    pub fn create(&self, payload: &FormPayload) -> Result<()> {
        payload.validate()?;
        let url = self.endpoint(payload.resource())?;
        info!(collection = payload.resource(), "creating record");
        self.send("POST", url.clone(), self.http.post(url).json(payload))
            .map(|_| ())
    }

    pub fn update(&self, id: i64, payload: &FormPayload) -> Result<()> {
        payload.validate()?;
        let url = self.endpoint(&format!("{}/{id}", payload.resource()))?;
        info!(collection = payload.resource(), id, "updating record");
        self.send("PUT", url.clone(), self.http.put(url).json(payload))
            .map(|_| ())
    }

    pub fn delete<R: Resource>(&self, id: i64) -> Result<()> {
        self.delete_record(R::COLLECTION, id)
    }

    pub fn delete_record(&self, collection: &str, id: i64) -> Result<()> {
        if id <= 0 {
            bail!("{collection} id must be positive -- select a saved row and retry");
        }
        let url = self.endpoint(&format!("{collection}/{id}"))?;
        info!(collection, id, "deleting record");
        self.send("DELETE", url.clone(), self.http.delete(url))
            .map(|_| ())
    }

    pub fn submit_transition(&self, request: &TransitionRequest) -> Result<()> {
        request.validate()?;
        let instruction = request.instruction();
        info!(
            action = request.label(),
            instruction = instruction.get(),
            "submitting routing transition"
        );
        let collection = ProductionInstruction::COLLECTION;
        match *request {
            TransitionRequest::EnterMachine { machine, .. } => {
                let url = self.endpoint(&format!("{collection}/EnterMachine"))?;
                let body = MachineTransitionBody::new(instruction, machine);
                self.send("POST", url.clone(), self.http.post(url).json(&body))?;
            }
            TransitionRequest::ExitMachine { machine, .. } => {
                let url = self.endpoint(&format!("{collection}/ExitMachine"))?;
                let body = MachineTransitionBody::new(instruction, machine);
                self.send("POST", url.clone(), self.http.post(url).json(&body))?;
            }
            TransitionRequest::Complete { .. } => {
                let url = self.endpoint(&format!("{collection}/{instruction}/Complete"))?;
                self.send("POST", url.clone(), self.http.post(url))?;
            }
        }
        Ok(())
    }

    /// Fetch machines and instructions in parallel. Either failure fails the
    /// whole board.
    pub fn fetch_routing_board(&self) -> Result<RoutingBoard> {
        let (machines, instructions) = thread::scope(|scope| {
            let machines = scope.spawn(|| self.list::<Machine>());
            let instructions = scope.spawn(|| self.list::<ProductionInstruction>());
            (
                settle(machines, "machine"),
                settle(instructions, "production instruction"),
            )
        });
        Ok(RoutingBoard {
            machines: machines?,
            instructions: instructions?,
        })
    }

    /// Fetch every dashboard tile in parallel. A failed tile is left empty
    /// and recorded in `failures`; the others still count.
    pub fn fetch_dashboard(&self) -> DashboardSnapshot {
        thread::scope(|scope| {
            let machines = scope.spawn(|| {
                self.list::<Machine>().map(|listing| {
                    listing
                        .rows
                        .iter()
                        .filter(|machine| machine.is_active.is_set())
                        .count()
                })
            });
            let faults = scope.spawn(|| {
                self.list::<MachineFault>()
                    .map(|listing| listing.rows.iter().filter(|fault| fault.is_open()).count())
            });
            let production = scope.spawn(|| {
                self.list::<ProductionInstruction>()
                    .map(|listing| StatusBreakdown::from_instructions(&listing.rows))
            });
            let store = scope.spawn(|| {
                self.list::<StoreItem>().map(|listing| {
                    listing
                        .rows
                        .iter()
                        .filter(|item| item.is_below_minimum())
                        .count()
                })
            });
            let orders = scope.spawn(|| {
                self.list::<Order>()
                    .map(|listing| listing.rows.iter().filter(|order| order_is_open(order)).count())
            });

            let mut failures = Vec::new();
            let active_machines = tile(machines, "machines", &mut failures);
            let open_faults = tile(faults, "faults", &mut failures);
            let production = tile(production, "production", &mut failures);
            let low_stock_items = tile(store, "store", &mut failures);
            let open_orders = tile(orders, "orders", &mut failures);
            DashboardSnapshot {
                active_machines,
                open_faults,
                production,
                low_stock_items,
                open_orders,
                failures,
            }
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("build API URL for {path:?}"))
    }

    fn get_value(&self, url: Url) -> Result<Value> {
        let response = self.send("GET", url.clone(), self.http.get(url.clone()))?;
        response
            .json()
            .with_context(|| format!("decode JSON from {url}"))
    }

    fn send(&self, method: &str, url: Url, request: RequestBuilder) -> Result<Response> {
        debug!(method, %url, "api request");
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            warn!(method, %url, status = status.as_u16(), "api request failed");
            return Err(clean_error_response(status, &body));
        }
        Ok(response)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MachineTransitionBody {
    production_instruction_id: ProductionInstructionId,
    machine_id: MachineId,
}

impl MachineTransitionBody {
    const fn new(instruction: ProductionInstructionId, machine: MachineId) -> Self {
        Self {
            production_instruction_id: instruction,
            machine_id: machine,
        }
    }
}

fn settle<T>(handle: ScopedJoinHandle<'_, Result<T>>, label: &str) -> Result<T> {
    handle
        .join()
        .map_err(|_| anyhow!("{label} fetch thread panicked"))?
}

fn tile<T>(
    handle: ScopedJoinHandle<'_, Result<T>>,
    label: &str,
    failures: &mut Vec<String>,
) -> Option<T> {
    match settle(handle, label) {
        Ok(value) => Some(value),
        Err(error) => {
            warn!(tile = label, error = %format!("{error:#}"), "dashboard tile unavailable");
            failures.push(format!("{label}: {error:#}"));
            None
        }
    }
}

/// Accepts a bare JSON array or an object wrapping one under `data`.
pub fn decode_listing<R: DeserializeOwned>(body: Value, collection: &str) -> Result<Listing<R>> {
    let rows = match unwrap_envelope(body) {
        Value::Array(rows) => rows,
        other => bail!(
            "{collection} response is not a list (got {})",
            json_kind(&other)
        ),
    };

    let mut listing = Listing::default();
    for (index, row) in rows.into_iter().enumerate() {
        match serde_json::from_value::<R>(row) {
            Ok(record) => listing.rows.push(record),
            Err(error) => {
                listing.rejected += 1;
                warn!(collection, index, %error, "dropping row that does not match the schema");
            }
        }
    }
    Ok(listing)
}

fn unwrap_envelope(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.len() == 1 && map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

fn connection_error(base_url: &Url, error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        return anyhow!(
            "request to {base_url} timed out -- raise api.timeout or check api.base_url ({error})"
        );
    }
    anyhow!("cannot reach {base_url} -- check api.base_url and that the server is running ({error})")
}

#[derive(Debug, Deserialize)]
struct ProblemDetails {
    title: Option<String>,
    detail: Option<String>,
    #[serde(default)]
    errors: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct MessageEnvelope {
    message: String,
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    let code = status.as_u16();
    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        return anyhow!(
            "server rejected the API token ({code}) -- set SHOPFLOOR_API_TOKEN or run `shopfloor --save-token <token>`"
        );
    }

    if let Ok(problem) = serde_json::from_str::<ProblemDetails>(body) {
        let mut parts: Vec<String> = [problem.title, problem.detail]
            .into_iter()
            .flatten()
            .map(|part| part.trim().to_owned())
            .filter(|part| !part.is_empty())
            .collect();
        parts.extend(
            problem
                .errors
                .into_iter()
                .filter_map(|(field, messages)| {
                    messages
                        .into_iter()
                        .next()
                        .map(|message| format!("{field}: {message}"))
                }),
        );
        if !parts.is_empty() {
            return anyhow!("server error ({code}): {}", parts.join("; "));
        }
    }

    if let Ok(parsed) = serde_json::from_str::<MessageEnvelope>(body)
        && !parsed.message.trim().is_empty()
    {
        return anyhow!("server error ({code}): {}", parsed.message.trim());
    }

    let body = body.trim();
    if !body.is_empty() && body.len() < 100 && !body.contains('{') && !body.contains('<') {
        return anyhow!("server error ({code}): {body}");
    }

    anyhow!("server returned {code}")
}

#[cfg(test)]
mod tests {
    use super::{clean_error_response, decode_listing};
    use anyhow::Result;
    use reqwest::StatusCode;
    use shopfloor_app::MachineFault;

    #[test]
    fn listing_drops_rows_that_do_not_decode() -> Result<()> {
        let body = serde_json::json!([
            {"id": 1, "machineId": 2, "description": "Kayış koptu", "severity": "Yüksek"},
            {"id": "two", "machineId": 2, "description": "bad id"},
            {"id": 3, "machineId": 4, "description": "Sensör arızası", "severity": "Düşük"},
            {"id": 4}
        ]);
        let listing = decode_listing::<MachineFault>(body, "MachineFault")?;
        assert_eq!(listing.rows.len(), 2);
        assert_eq!(listing.rejected, 2);
        assert_eq!(listing.rows[1].severity, "Düşük");
        Ok(())
    }

    #[test]
    fn listing_accepts_data_envelope() -> Result<()> {
        let body = serde_json::json!({"data": [
            {"id": 1, "machineId": 2, "description": "Titreşim"}
        ]});
        let listing = decode_listing::<MachineFault>(body, "MachineFault")?;
        assert_eq!(listing.rows.len(), 1);
        Ok(())
    }

    #[test]
    fn listing_rejects_non_list_body() {
        let body = serde_json::json!({"total": 3});
        let error = decode_listing::<MachineFault>(body, "MachineFault")
            .expect_err("object body should fail");
        assert!(error.to_string().contains("not a list"));
    }

    #[test]
    fn problem_details_are_flattened() {
        let body = r#"{"title":"One or more validation errors occurred.","status":400,"errors":{"Name":["The Name field is required."]}}"#;
        let message = clean_error_response(StatusCode::BAD_REQUEST, body).to_string();
        assert_eq!(
            message,
            "server error (400): One or more validation errors occurred.; Name: The Name field is required."
        );
    }

    #[test]
    fn message_envelope_and_plain_bodies() {
        let message =
            clean_error_response(StatusCode::CONFLICT, r#"{"message":"machine is busy"}"#)
                .to_string();
        assert_eq!(message, "server error (409): machine is busy");

        let message = clean_error_response(StatusCode::NOT_FOUND, "no such instruction").to_string();
        assert_eq!(message, "server error (404): no such instruction");

        let message =
            clean_error_response(StatusCode::BAD_GATEWAY, "<html>proxy error</html>").to_string();
        assert_eq!(message, "server returned 502");
    }

    #[test]
    fn auth_failures_name_the_fix() {
        let message = clean_error_response(StatusCode::UNAUTHORIZED, "").to_string();
        assert!(message.contains("SHOPFLOOR_API_TOKEN"));
    }
}

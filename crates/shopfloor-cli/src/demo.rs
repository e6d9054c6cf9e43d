// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! In-memory stand-in for the REST server, seeded from the testkit. Writes
//! and routing transitions are applied the way the server applies them so
//! the console can be driven without a backend.

use anyhow::{Context, Result, anyhow, bail};
use serde_json::Value;
use shopfloor_app::{
    ColumnFilter, DashboardSnapshot, Flag, FormPayload, MachineId, Person, ProductionInstruction,
    ProductionInstructionFormInput, ProductionInstructionId, Resource, RoutingStatus, RoutingStep,
    RoutingStepId, Screen, StationStatus, StatusBreakdown, TableRecord, TransitionRequest,
    apply_column_filters, order_is_open,
};
use shopfloor_testkit::Dataset;
use shopfloor_tui::{AppRuntime, RecordSource};
use time::{OffsetDateTime, PrimitiveDateTime};
use tracing::info;

use crate::runtime::RecordLookup;

pub struct DemoRuntime {
    dataset: Dataset,
}

impl DemoRuntime {
    pub fn seeded(seed: u64) -> Self {
        let mut runtime = Self {
            dataset: Dataset::seeded(seed),
        };
        runtime.fill_names();
        runtime
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    fn instruction_mut(
        &mut self,
        id: ProductionInstructionId,
    ) -> Result<&mut ProductionInstruction> {
        self.dataset
            .instructions
            .iter_mut()
            .find(|instruction| instruction.id == id)
            .ok_or_else(|| anyhow!("production instruction {id} not found -- refresh and retry"))
    }

    fn create_instruction(&mut self, input: &ProductionInstructionFormInput) -> Result<i64> {
        let id = next_id(&self.dataset.instructions);
        let mut step_id = self
            .dataset
            .instructions
            .iter()
            .flat_map(|instruction| &instruction.production_to_machines)
            .map(|step| step.id.get())
            .max()
            .unwrap_or(0);

        let mut steps = Vec::with_capacity(input.machine_ids.len());
        for machine in &input.machine_ids {
            if !self.dataset.machines.iter().any(|known| known.id == *machine) {
                bail!("machine {machine} does not exist -- check the routing machine ids");
            }
            step_id += 1;
            steps.push(RoutingStep {
                id: RoutingStepId::new(step_id),
                machine_id: *machine,
                machine_name: String::new(),
                status: StationStatus::NotArrived,
                entry_date: None,
                exit_date: None,
            });
        }

        self.dataset.instructions.push(ProductionInstruction {
            id: ProductionInstructionId::new(id),
            order_id: input.order_id,
            product_name: input.product_name.clone(),
            quantity: input.quantity,
            machine_id: None,
            is_completed: Flag::Off,
            is_deleted: Flag::Off,
            created_date: Some(now()),
            production_to_machines: steps,
        });
        Ok(id)
    }

    /// Denormalised names the server would join in.
    fn fill_names(&mut self) {
        let Dataset {
            persons,
            machines,
            faults,
            works,
            instructions,
            ..
        } = &mut self.dataset;
        let machine_name = |id: MachineId| {
            machines
                .iter()
                .find(|machine| machine.id == id)
                .map(|machine| machine.name.clone())
        };

        for fault in faults.iter_mut() {
            fault.machine_name = machine_name(fault.machine_id).unwrap_or_default();
        }
        for work in works.iter_mut() {
            work.person_name = work
                .person_id
                .and_then(|id| persons.iter().find(|person| person.id == id))
                .map(Person::full_name)
                .unwrap_or_default();
        }
        for step in instructions
            .iter_mut()
            .flat_map(|instruction| instruction.production_to_machines.iter_mut())
        {
            step.machine_name = machine_name(step.machine_id).unwrap_or_default();
        }
    }
}

impl RecordSource for DemoRuntime {
    fn fetch<R: Resource>(&mut self, filters: &[ColumnFilter]) -> Result<(Vec<R>, usize)> {
        let rows: Vec<R> = serde_json::from_str(&self.dataset.collection_json(R::COLLECTION)?)
            .with_context(|| format!("decode demo {}", R::COLLECTION))?;
        if filters.is_empty() {
            return Ok((rows, 0));
        }
        let rows = apply_column_filters(&rows, filters)?
            .into_iter()
            .cloned()
            .collect();
        Ok((rows, 0))
    }
}

impl RecordLookup for DemoRuntime {
    fn lookup<R: Resource>(&mut self, id: i64) -> Result<R> {
        let (rows, _) = self.fetch::<R>(&[])?;
        rows.into_iter()
            .find(|record| record.record_id() == id)
            .ok_or_else(|| {
                anyhow!(
                    "no {} with id {id} -- run `shopfloor --demo --list {}` to see ids",
                    R::COLLECTION,
                    R::SCREEN.label()
                )
            })
    }
}

impl AppRuntime for DemoRuntime {
    fn load_dashboard(&mut self) -> Result<DashboardSnapshot> {
        let data = &self.dataset;
        Ok(DashboardSnapshot {
            active_machines: Some(
                data.machines
                    .iter()
                    .filter(|machine| machine.is_active.is_set())
                    .count(),
            ),
            open_faults: Some(data.faults.iter().filter(|fault| fault.is_open()).count()),
            production: Some(StatusBreakdown::from_instructions(&data.instructions)),
            low_stock_items: Some(
                data.store
                    .iter()
                    .filter(|item| item.is_below_minimum())
                    .count(),
            ),
            open_orders: Some(data.orders.iter().filter(|order| order_is_open(order)).count()),
            failures: Vec::new(),
        })
    }

    fn delete_row(&mut self, screen: Screen, row_id: i64) -> Result<()> {
        let data = &mut self.dataset;
        let removed = match screen {
            Screen::Dashboard => bail!("dashboard has no rows to delete"),
            Screen::Production => {
                // Instructions are soft-deleted and then read as cancelled.
                let instruction = self.instruction_mut(ProductionInstructionId::new(row_id))?;
                instruction.is_deleted = Flag::On;
                true
            }
            Screen::Machines => remove(&mut data.machines, row_id),
            Screen::Faults => remove(&mut data.faults, row_id),
            Screen::Stations => remove(&mut data.stations, row_id),
            Screen::QualityControl => remove(&mut data.quality, row_id),
            Screen::Orders => remove(&mut data.orders, row_id),
            Screen::Works => remove(&mut data.works, row_id),
            Screen::Persons => remove(&mut data.persons, row_id),
            Screen::Store => remove(&mut data.store, row_id),
        };
        if !removed {
            bail!("{} {row_id} not found -- refresh and retry", screen.label());
        }
        info!(screen = screen.label(), id = row_id, "demo record deleted");
        Ok(())
    }

    fn submit_transition(&mut self, request: &TransitionRequest) -> Result<()> {
        request.validate()?;
        let stamp = now();
        let instruction = self.instruction_mut(request.instruction())?;
        let id = instruction.id;
        match instruction.status() {
            RoutingStatus::Cancelled => bail!("instruction {id} is cancelled"),
            RoutingStatus::Completed => bail!("instruction {id} is already completed"),
            RoutingStatus::NotStarted | RoutingStatus::InProgress => {}
        }

        match *request {
            TransitionRequest::EnterMachine { machine, .. } => {
                if let Some(current) = instruction.progress().current_machine {
                    bail!("instruction {id} is still on machine {current} -- exit it first");
                }
                let step = instruction
                    .production_to_machines
                    .iter_mut()
                    .find(|step| {
                        step.machine_id == machine && step.status == StationStatus::NotArrived
                    })
                    .ok_or_else(|| {
                        anyhow!("machine {machine} is not a waiting station of instruction {id}")
                    })?;
                step.status = StationStatus::InProcess;
                step.entry_date = Some(stamp);
                instruction.machine_id = Some(machine);
            }
            TransitionRequest::ExitMachine { machine, .. } => {
                let step = instruction
                    .production_to_machines
                    .iter_mut()
                    .find(|step| {
                        step.machine_id == machine && step.status == StationStatus::InProcess
                    })
                    .ok_or_else(|| anyhow!("instruction {id} is not on machine {machine}"))?;
                step.status = StationStatus::Finished;
                step.exit_date = Some(stamp);
            }
            TransitionRequest::Complete { .. } => {
                if instruction.machine_id.is_none() {
                    bail!(
                        "instruction {id} has not entered a machine yet -- enter its first station before completing"
                    );
                }
                for step in instruction
                    .production_to_machines
                    .iter_mut()
                    .filter(|step| step.status == StationStatus::InProcess)
                {
                    step.status = StationStatus::Finished;
                    step.exit_date = Some(stamp);
                }
                instruction.is_completed = Flag::On;
            }
        }
        info!(action = request.label(), instruction = id.get(), "demo transition applied");
        Ok(())
    }

    fn create_record(&mut self, payload: &FormPayload) -> Result<()> {
        payload.validate()?;
        let data = &mut self.dataset;
        let id = match payload {
            FormPayload::Person(_) => insert(&mut data.persons, "id", payload)?,
            FormPayload::Order(_) => insert(&mut data.orders, "orderId", payload)?,
            FormPayload::Work(_) => insert(&mut data.works, "workId", payload)?,
            FormPayload::StoreItem(_) => insert(&mut data.store, "id", payload)?,
            FormPayload::Machine(_) => insert(&mut data.machines, "id", payload)?,
            FormPayload::MachineFault(_) => insert(&mut data.faults, "id", payload)?,
            FormPayload::QualityControl(_) => insert(&mut data.quality, "id", payload)?,
            FormPayload::Station(_) => insert(&mut data.stations, "id", payload)?,
            FormPayload::ProductionInstruction(input) => self.create_instruction(input)?,
        };
        self.fill_names();
        info!(collection = payload.resource(), id, "demo record created");
        Ok(())
    }

    fn update_record(&mut self, row_id: i64, payload: &FormPayload) -> Result<()> {
        payload.validate()?;
        let data = &mut self.dataset;
        match payload {
            FormPayload::Person(_) => overwrite(&mut data.persons, row_id, payload)?,
            FormPayload::Order(_) => overwrite(&mut data.orders, row_id, payload)?,
            FormPayload::Work(_) => overwrite(&mut data.works, row_id, payload)?,
            FormPayload::StoreItem(_) => overwrite(&mut data.store, row_id, payload)?,
            FormPayload::Machine(_) => overwrite(&mut data.machines, row_id, payload)?,
            FormPayload::MachineFault(_) => overwrite(&mut data.faults, row_id, payload)?,
            FormPayload::QualityControl(_) => overwrite(&mut data.quality, row_id, payload)?,
            FormPayload::Station(_) => overwrite(&mut data.stations, row_id, payload)?,
            FormPayload::ProductionInstruction(_) => bail!(
                "production instructions cannot be edited -- create a new instruction instead"
            ),
        }
        self.fill_names();
        info!(collection = payload.resource(), id = row_id, "demo record updated");
        Ok(())
    }
}

fn now() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

fn next_id<R: TableRecord>(records: &[R]) -> i64 {
    records
        .iter()
        .map(TableRecord::record_id)
        .max()
        .unwrap_or(0)
        + 1
}

fn remove<R: TableRecord>(records: &mut Vec<R>, id: i64) -> bool {
    let before = records.len();
    records.retain(|record| record.record_id() != id);
    records.len() != before
}

fn payload_fields(payload: &FormPayload) -> Result<serde_json::Map<String, Value>> {
    match serde_json::to_value(payload).context("encode demo payload")? {
        Value::Object(fields) => Ok(fields),
        other => bail!("{} payload encoded as {other}, not an object", payload.resource()),
    }
}

fn insert<R: Resource>(records: &mut Vec<R>, id_key: &str, payload: &FormPayload) -> Result<i64> {
    let id = next_id(records);
    let mut fields = payload_fields(payload)?;
    fields.insert(id_key.to_owned(), Value::from(id));
    let record = serde_json::from_value(Value::Object(fields))
        .with_context(|| format!("build demo {} {id}", R::COLLECTION))?;
    records.push(record);
    Ok(id)
}

fn overwrite<R: Resource>(records: &mut [R], id: i64, payload: &FormPayload) -> Result<()> {
    let record = records
        .iter_mut()
        .find(|record| record.record_id() == id)
        .ok_or_else(|| anyhow!("{} {id} not found -- refresh and retry", R::COLLECTION))?;
    let mut current = match serde_json::to_value(&*record).context("encode demo record")? {
        Value::Object(fields) => fields,
        other => bail!("{} {id} encoded as {other}, not an object", R::COLLECTION),
    };
    current.extend(payload_fields(payload)?);
    *record = serde_json::from_value(Value::Object(current))
        .with_context(|| format!("rebuild demo {} {id}", R::COLLECTION))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::DemoRuntime;
    use crate::runtime::RecordLookup;
    use anyhow::Result;
    use shopfloor_app::{
        ColumnFilter, Flag, FormKind, FormPayload, Machine, MachineFault, MachineId,
        ProductionInstruction, ProductionInstructionFormInput, ProductionInstructionId,
        RoutingStatus, Screen, StationStatus, StatusBreakdown, TransitionRequest,
    };
    use shopfloor_tui::{AppRuntime, RecordSource};

    fn instruction(runtime: &mut DemoRuntime, id: i64) -> Result<ProductionInstruction> {
        runtime.lookup::<ProductionInstruction>(id)
    }

    #[test]
    fn fetch_serves_every_seeded_row_and_applies_filters() -> Result<()> {
        let mut runtime = DemoRuntime::seeded(7);
        let (machines, rejected) = runtime.fetch::<Machine>(&[])?;
        assert_eq!(machines.len(), runtime.dataset().machines.len());
        assert_eq!(rejected, 0);

        let (faults, _) =
            runtime.fetch::<MachineFault>(&[ColumnFilter::new("severity", "YÜKSEK")])?;
        let expected = runtime
            .dataset()
            .faults
            .iter()
            .filter(|fault| fault.severity == "Yüksek")
            .count();
        assert_eq!(faults.len(), expected);
        assert!(faults.iter().all(|fault| fault.severity == "Yüksek"));
        Ok(())
    }

    #[test]
    fn unknown_filter_column_is_an_error() {
        let mut runtime = DemoRuntime::seeded(7);
        let error = runtime
            .fetch::<Machine>(&[ColumnFilter::new("colour", "red")])
            .expect_err("unknown column should fail");
        assert!(error.to_string().contains("colour"));
    }

    #[test]
    fn routing_runs_from_first_station_to_completion() -> Result<()> {
        let mut runtime = DemoRuntime::seeded(7);
        let start = instruction(&mut runtime, 1)?;
        assert_eq!(start.status(), RoutingStatus::NotStarted);

        runtime.submit_transition(&TransitionRequest::enter_next(&start)?)?;
        let entered = instruction(&mut runtime, 1)?;
        assert_eq!(entered.status(), RoutingStatus::InProgress);
        assert_eq!(
            entered.production_to_machines[0].status,
            StationStatus::InProcess
        );
        assert!(entered.production_to_machines[0].entry_date.is_some());
        assert_eq!(
            entered.machine_id,
            Some(entered.production_to_machines[0].machine_id)
        );

        runtime.submit_transition(&TransitionRequest::exit_current(&entered)?)?;
        let exited = instruction(&mut runtime, 1)?;
        assert_eq!(
            exited.production_to_machines[0].status,
            StationStatus::Finished
        );
        assert_eq!(exited.progress().current_machine, None);

        runtime.submit_transition(&TransitionRequest::complete(&exited)?)?;
        assert_eq!(
            instruction(&mut runtime, 1)?.status(),
            RoutingStatus::Completed
        );
        Ok(())
    }

    #[test]
    fn server_side_rules_reject_bad_transitions() -> Result<()> {
        let mut runtime = DemoRuntime::seeded(7);

        let error = runtime
            .submit_transition(&TransitionRequest::Complete {
                instruction: ProductionInstructionId::new(1),
            })
            .expect_err("unstarted instruction cannot complete");
        assert!(error.to_string().contains("has not entered a machine"));

        let error = runtime
            .submit_transition(&TransitionRequest::Complete {
                instruction: ProductionInstructionId::new(4),
            })
            .expect_err("completed instruction stays completed");
        assert!(error.to_string().contains("already completed"));

        let error = runtime
            .submit_transition(&TransitionRequest::ExitMachine {
                instruction: ProductionInstructionId::new(1),
                machine: MachineId::new(1),
            })
            .expect_err("instruction 1 is on no machine");
        assert!(error.to_string().contains("not on machine"));

        let error = runtime
            .submit_transition(&TransitionRequest::Complete {
                instruction: ProductionInstructionId::new(999),
            })
            .expect_err("unknown instruction");
        assert!(error.to_string().contains("not found"));
        Ok(())
    }

    #[test]
    fn created_records_get_the_next_id_and_joined_names() -> Result<()> {
        let mut runtime = DemoRuntime::seeded(7);
        let machine_count = runtime.dataset().machines.len() as i64;
        let fault = FormPayload::from_fields(
            FormKind::MachineFault,
            &[
                "1".to_owned(),
                "Hidrolik kaçak".to_owned(),
                "Kritik".to_owned(),
                "Ali".to_owned(),
                "2025-03-14".to_owned(),
                String::new(),
            ],
        )?;
        runtime.create_record(&fault)?;

        let created = runtime
            .dataset()
            .faults
            .last()
            .cloned()
            .expect("fault should be appended");
        assert_eq!(created.id.get(), runtime.dataset().faults.len() as i64);
        assert_eq!(created.machine_name, runtime.dataset().machines[0].name);
        assert!(created.is_open());
        assert_eq!(runtime.dataset().machines.len() as i64, machine_count);
        Ok(())
    }

    #[test]
    fn new_instruction_routes_through_known_machines_only() -> Result<()> {
        let mut runtime = DemoRuntime::seeded(7);
        let routed = FormPayload::ProductionInstruction(ProductionInstructionFormInput {
            order_id: None,
            product_name: "Mil 25mm".to_owned(),
            quantity: 40,
            machine_ids: vec![MachineId::new(2), MachineId::new(3)],
        });
        runtime.create_record(&routed)?;
        let created = runtime
            .dataset()
            .instructions
            .last()
            .cloned()
            .expect("instruction should be appended");
        assert_eq!(created.status(), RoutingStatus::NotStarted);
        assert_eq!(created.production_to_machines.len(), 2);
        assert!(
            created
                .production_to_machines
                .iter()
                .all(|step| !step.machine_name.is_empty())
        );

        let unknown = FormPayload::ProductionInstruction(ProductionInstructionFormInput {
            order_id: None,
            product_name: "Mil 25mm".to_owned(),
            quantity: 40,
            machine_ids: vec![MachineId::new(404)],
        });
        let error = runtime
            .create_record(&unknown)
            .expect_err("unknown machine should fail");
        assert!(error.to_string().contains("machine 404"));
        Ok(())
    }

    #[test]
    fn updating_a_machine_renames_it_everywhere() -> Result<()> {
        let mut runtime = DemoRuntime::seeded(7);
        let machine = runtime.lookup::<Machine>(1)?;
        let mut values = FormPayload::field_values(FormKind::Machine, &machine)?;
        values[0] = "Torna Yeni".to_owned();
        runtime.update_record(1, &FormPayload::from_fields(FormKind::Machine, &values)?)?;

        assert_eq!(runtime.lookup::<Machine>(1)?.name, "Torna Yeni");
        assert!(
            runtime
                .dataset()
                .faults
                .iter()
                .filter(|fault| fault.machine_id.get() == 1)
                .all(|fault| fault.machine_name == "Torna Yeni")
        );

        let error = runtime
            .update_record(999, &FormPayload::from_fields(FormKind::Machine, &values)?)
            .expect_err("unknown machine id should fail");
        assert!(error.to_string().contains("not found"));
        Ok(())
    }

    #[test]
    fn deleting_an_instruction_cancels_it() -> Result<()> {
        let mut runtime = DemoRuntime::seeded(7);
        runtime.delete_row(Screen::Production, 1)?;
        let cancelled = instruction(&mut runtime, 1)?;
        assert_eq!(cancelled.is_deleted, Flag::On);

        let before = runtime.dataset().persons.len();
        runtime.delete_row(Screen::Persons, 3)?;
        assert_eq!(runtime.dataset().persons.len(), before - 1);

        let error = runtime
            .delete_row(Screen::Persons, 3)
            .expect_err("second delete should fail");
        assert!(error.to_string().contains("not found"));
        Ok(())
    }

    #[test]
    fn dashboard_counts_the_seeded_data() -> Result<()> {
        let mut runtime = DemoRuntime::seeded(7);
        let snapshot = runtime.load_dashboard()?;
        assert!(snapshot.failures.is_empty());
        assert_eq!(
            snapshot.production,
            Some(StatusBreakdown::from_instructions(
                &runtime.dataset().instructions
            ))
        );
        assert_eq!(
            snapshot.open_faults,
            Some(
                runtime
                    .dataset()
                    .faults
                    .iter()
                    .filter(|fault| fault.is_open())
                    .count()
            )
        );
        Ok(())
    }

    #[test]
    fn lookup_names_the_listing_command_on_miss() {
        let mut runtime = DemoRuntime::seeded(7);
        let error = runtime
            .lookup::<Machine>(404)
            .expect_err("missing machine should fail");
        assert!(error.to_string().contains("--list machines"));
    }
}

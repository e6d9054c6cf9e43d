// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::PrimitiveDateTime;

use crate::ids::*;
use crate::routing::{RoutingProgress, StationStatus, StatusBreakdown, project_status};
use crate::table::{CellValue, Column, TableRecord};

/// The API's 0/1 integer booleans. Missing and null decode as `Off`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flag {
    #[default]
    Off,
    On,
}

impl Flag {
    pub const fn is_set(self) -> bool {
        matches!(self, Self::On)
    }

    pub const fn as_i64(self) -> i64 {
        match self {
            Self::Off => 0,
            Self::On => 1,
        }
    }
}

impl From<bool> for Flag {
    fn from(value: bool) -> Self {
        if value { Self::On } else { Self::Off }
    }
}

impl Serialize for Flag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.as_i64())
    }
}

impl<'de> Deserialize<'de> for Flag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawFlag {
            Int(i64),
            Bool(bool),
        }

        match Option::<RawFlag>::deserialize(deserializer)? {
            None | Some(RawFlag::Int(0)) | Some(RawFlag::Bool(false)) => Ok(Self::Off),
            Some(RawFlag::Int(1)) | Some(RawFlag::Bool(true)) => Ok(Self::On),
            Some(RawFlag::Int(other)) => Err(D::Error::custom(format!(
                "flag must be 0 or 1, got {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Screen {
    Dashboard,
    Production,
    Machines,
    Faults,
    Stations,
    QualityControl,
    Orders,
    Works,
    Persons,
    Store,
}

impl Screen {
    pub const ALL: [Self; 10] = [
        Self::Dashboard,
        Self::Production,
        Self::Machines,
        Self::Faults,
        Self::Stations,
        Self::QualityControl,
        Self::Orders,
        Self::Works,
        Self::Persons,
        Self::Store,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Production => "production",
            Self::Machines => "machines",
            Self::Faults => "faults",
            Self::Stations => "stations",
            Self::QualityControl => "quality",
            Self::Orders => "orders",
            Self::Works => "works",
            Self::Persons => "persons",
            Self::Store => "store",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let wanted = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|screen| screen.label() == wanted)
    }

    /// API collection backing the screen.
    pub const fn collection(self) -> Option<&'static str> {
        match self {
            Self::Dashboard => None,
            Self::Production => Some(ProductionInstruction::COLLECTION),
            Self::Machines => Some(Machine::COLLECTION),
            Self::Faults => Some(MachineFault::COLLECTION),
            Self::Stations => Some(Station::COLLECTION),
            Self::QualityControl => Some(QualityControl::COLLECTION),
            Self::Orders => Some(Order::COLLECTION),
            Self::Works => Some(Work::COLLECTION),
            Self::Persons => Some(Person::COLLECTION),
            Self::Store => Some(StoreItem::COLLECTION),
        }
    }

    /// Screens whose lists are narrowed by the server with column predicates.
    pub const fn filters_server_side(self) -> bool {
        matches!(
            self,
            Self::Machines | Self::Faults | Self::QualityControl
        )
    }
}

/// A DTO served by one API collection and shown on one list screen.
pub trait Resource: TableRecord + DeserializeOwned + Serialize + Clone {
    const COLLECTION: &'static str;
    const SCREEN: Screen;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: PersonId,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, with = "crate::timestamp::option")]
    pub hire_date: Option<PrimitiveDateTime>,
    #[serde(default)]
    pub is_active: Flag,
}

impl Person {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_owned()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: OrderId,
    pub customer_name: String,
    pub product_name: String,
    pub quantity: i64,
    #[serde(default)]
    pub unit_price: Option<f64>,
    #[serde(default, with = "crate::timestamp::option")]
    pub order_date: Option<PrimitiveDateTime>,
    #[serde(default, with = "crate::timestamp::option")]
    pub delivery_date: Option<PrimitiveDateTime>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Work {
    pub work_id: WorkId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub person_id: Option<PersonId>,
    #[serde(default)]
    pub person_name: String,
    #[serde(default)]
    pub machine_id: Option<MachineId>,
    #[serde(default, with = "crate::timestamp::option")]
    pub start_date: Option<PrimitiveDateTime>,
    #[serde(default, with = "crate::timestamp::option")]
    pub end_date: Option<PrimitiveDateTime>,
    #[serde(default)]
    pub is_completed: Flag,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreItem {
    pub id: StoreItemId,
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub category: String,
    pub quantity: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub min_quantity: Option<f64>,
    #[serde(default)]
    pub location: String,
}

impl StoreItem {
    pub fn is_below_minimum(&self) -> bool {
        self.min_quantity
            .is_some_and(|minimum| self.quantity < minimum)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Machine {
    pub id: MachineId,
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub location: String,
    #[serde(default, with = "crate::timestamp::option")]
    pub purchase_date: Option<PrimitiveDateTime>,
    #[serde(default)]
    pub is_active: Flag,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineFault {
    pub id: MachineFaultId,
    pub machine_id: MachineId,
    #[serde(default)]
    pub machine_name: String,
    pub description: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub technician: String,
    #[serde(default, with = "crate::timestamp::option")]
    pub fault_date: Option<PrimitiveDateTime>,
    #[serde(default, with = "crate::timestamp::option")]
    pub resolved_date: Option<PrimitiveDateTime>,
}

impl MachineFault {
    pub fn is_open(&self) -> bool {
        self.resolved_date.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityControl {
    pub id: QualityControlId,
    #[serde(default)]
    pub production_instruction_id: Option<ProductionInstructionId>,
    pub product_name: String,
    #[serde(default)]
    pub inspector: String,
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub sample_size: Option<i64>,
    #[serde(default)]
    pub defect_count: i64,
    #[serde(default, with = "crate::timestamp::option")]
    pub control_date: Option<PrimitiveDateTime>,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    pub id: StationId,
    pub name: String,
    #[serde(default)]
    pub sequence: i64,
    #[serde(default)]
    pub machine_id: Option<MachineId>,
    #[serde(default)]
    pub description: String,
}

/// One entry of `productionToMachines`: a unit's visit to one machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingStep {
    #[serde(default = "unassigned_step_id")]
    pub id: RoutingStepId,
    pub machine_id: MachineId,
    #[serde(default)]
    pub machine_name: String,
    #[serde(default)]
    pub status: StationStatus,
    #[serde(default, with = "crate::timestamp::option")]
    pub entry_date: Option<PrimitiveDateTime>,
    #[serde(default, with = "crate::timestamp::option")]
    pub exit_date: Option<PrimitiveDateTime>,
}

const fn unassigned_step_id() -> RoutingStepId {
    RoutingStepId::new(0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionInstruction {
    pub id: ProductionInstructionId,
    #[serde(default)]
    pub order_id: Option<OrderId>,
    pub product_name: String,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub machine_id: Option<MachineId>,
    #[serde(default, rename = "isComplated")]
    pub is_completed: Flag,
    #[serde(default)]
    pub is_deleted: Flag,
    #[serde(default, with = "crate::timestamp::option")]
    pub created_date: Option<PrimitiveDateTime>,
    #[serde(default)]
    pub production_to_machines: Vec<RoutingStep>,
}

impl ProductionInstruction {
    pub fn status(&self) -> crate::routing::RoutingStatus {
        project_status(
            self.machine_id.map(MachineId::get),
            self.is_completed,
            self.is_deleted,
        )
    }

    pub fn progress(&self) -> RoutingProgress {
        RoutingProgress::from_steps(&self.production_to_machines)
    }
}

/// Dashboard tiles. Each tile is `None` when its fetch failed; the
/// remaining tiles still render.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DashboardSnapshot {
    pub active_machines: Option<usize>,
    pub open_faults: Option<usize>,
    pub production: Option<StatusBreakdown>,
    pub low_stock_items: Option<usize>,
    pub open_orders: Option<usize>,
    pub failures: Vec<String>,
}

impl DashboardSnapshot {
    pub fn has_tiles(&self) -> bool {
        self.active_machines.is_some()
            || self.open_faults.is_some()
            || self.production.is_some()
            || self.low_stock_items.is_some()
            || self.open_orders.is_some()
    }
}

/// Orders in these states are settled and drop off the dashboard count.
pub fn order_is_open(order: &Order) -> bool {
    !matches!(
        order.status.trim().to_lowercase().as_str(),
        "delivered" | "teslim edildi" | "cancelled" | "iptal"
    )
}

const PERSON_COLUMNS: [Column; 7] = [
    Column::new("ID", "id"),
    Column::new("Name", "name"),
    Column::new("Department", "department"),
    Column::new("Title", "title"),
    Column::new("Phone", "phone"),
    Column::new("Email", "email"),
    Column::new("Active", "isActive"),
];

impl TableRecord for Person {
    fn columns() -> &'static [Column] {
        &PERSON_COLUMNS
    }

    fn cell(&self, column: usize) -> CellValue {
        match column {
            0 => CellValue::Int(self.id.get()),
            1 => CellValue::Text(self.full_name()),
            2 => CellValue::text(&self.department),
            3 => CellValue::text(&self.title),
            4 => CellValue::text(&self.phone),
            5 => CellValue::text(&self.email),
            6 => CellValue::Bool(self.is_active.is_set()),
            _ => CellValue::Null,
        }
    }

    fn record_id(&self) -> i64 {
        self.id.get()
    }
}

impl Resource for Person {
    const COLLECTION: &'static str = "Person";
    const SCREEN: Screen = Screen::Persons;
}

const ORDER_COLUMNS: [Column; 8] = [
    Column::new("Order", "orderId"),
    Column::new("Customer", "customerName"),
    Column::new("Product", "productName"),
    Column::new("Qty", "quantity"),
    Column::new("Unit price", "unitPrice"),
    Column::new("Ordered", "orderDate"),
    Column::new("Delivery", "deliveryDate"),
    Column::new("Status", "status"),
];

impl TableRecord for Order {
    fn columns() -> &'static [Column] {
        &ORDER_COLUMNS
    }

    fn cell(&self, column: usize) -> CellValue {
        match column {
            0 => CellValue::Int(self.order_id.get()),
            1 => CellValue::text(&self.customer_name),
            2 => CellValue::text(&self.product_name),
            3 => CellValue::Int(self.quantity),
            4 => CellValue::optional_float(self.unit_price),
            5 => CellValue::optional_timestamp(self.order_date),
            6 => CellValue::optional_timestamp(self.delivery_date),
            7 => CellValue::text(&self.status),
            _ => CellValue::Null,
        }
    }

    fn record_id(&self) -> i64 {
        self.order_id.get()
    }
}

impl Resource for Order {
    const COLLECTION: &'static str = "Order";
    const SCREEN: Screen = Screen::Orders;
}

const WORK_COLUMNS: [Column; 7] = [
    Column::new("Work", "workId"),
    Column::new("Title", "title"),
    Column::new("Assignee", "personName"),
    Column::new("Machine", "machineId"),
    Column::new("Start", "startDate"),
    Column::new("End", "endDate"),
    Column::new("Done", "isCompleted"),
];

impl TableRecord for Work {
    fn columns() -> &'static [Column] {
        &WORK_COLUMNS
    }

    fn cell(&self, column: usize) -> CellValue {
        match column {
            0 => CellValue::Int(self.work_id.get()),
            1 => CellValue::text(&self.title),
            2 => CellValue::text(&self.person_name),
            3 => CellValue::optional_int(self.machine_id.map(MachineId::get)),
            4 => CellValue::optional_timestamp(self.start_date),
            5 => CellValue::optional_timestamp(self.end_date),
            6 => CellValue::Bool(self.is_completed.is_set()),
            _ => CellValue::Null,
        }
    }

    fn record_id(&self) -> i64 {
        self.work_id.get()
    }
}

impl Resource for Work {
    const COLLECTION: &'static str = "Work";
    const SCREEN: Screen = Screen::Works;
}

const STORE_COLUMNS: [Column; 8] = [
    Column::new("ID", "id"),
    Column::new("Name", "name"),
    Column::new("Code", "code"),
    Column::new("Category", "category"),
    Column::new("Qty", "quantity"),
    Column::new("Unit", "unit"),
    Column::new("Min", "minQuantity"),
    Column::new("Location", "location"),
];

impl TableRecord for StoreItem {
    fn columns() -> &'static [Column] {
        &STORE_COLUMNS
    }

    fn cell(&self, column: usize) -> CellValue {
        match column {
            0 => CellValue::Int(self.id.get()),
            1 => CellValue::text(&self.name),
            2 => CellValue::text(&self.code),
            3 => CellValue::text(&self.category),
            4 => CellValue::Float(self.quantity),
            5 => CellValue::text(&self.unit),
            6 => CellValue::optional_float(self.min_quantity),
            7 => CellValue::text(&self.location),
            _ => CellValue::Null,
        }
    }

    fn record_id(&self) -> i64 {
        self.id.get()
    }
}

impl Resource for StoreItem {
    const COLLECTION: &'static str = "Store";
    const SCREEN: Screen = Screen::Store;
}

const MACHINE_COLUMNS: [Column; 7] = [
    Column::new("ID", "id"),
    Column::new("Name", "name"),
    Column::new("Code", "code"),
    Column::new("Brand", "brand"),
    Column::new("Model", "model"),
    Column::new("Location", "location"),
    Column::new("Active", "isActive"),
];

impl TableRecord for Machine {
    fn columns() -> &'static [Column] {
        &MACHINE_COLUMNS
    }

    fn cell(&self, column: usize) -> CellValue {
        match column {
            0 => CellValue::Int(self.id.get()),
            1 => CellValue::text(&self.name),
            2 => CellValue::text(&self.code),
            3 => CellValue::text(&self.brand),
            4 => CellValue::text(&self.model),
            5 => CellValue::text(&self.location),
            6 => CellValue::Bool(self.is_active.is_set()),
            _ => CellValue::Null,
        }
    }

    fn record_id(&self) -> i64 {
        self.id.get()
    }
}

impl Resource for Machine {
    const COLLECTION: &'static str = "Machine";
    const SCREEN: Screen = Screen::Machines;
}

const FAULT_COLUMNS: [Column; 7] = [
    Column::new("ID", "id"),
    Column::new("Machine", "machineName"),
    Column::new("Description", "description"),
    Column::new("Severity", "severity"),
    Column::new("Technician", "technician"),
    Column::new("Reported", "faultDate"),
    Column::new("Resolved", "resolvedDate"),
];

impl TableRecord for MachineFault {
    fn columns() -> &'static [Column] {
        &FAULT_COLUMNS
    }

    fn cell(&self, column: usize) -> CellValue {
        match column {
            0 => CellValue::Int(self.id.get()),
            1 => CellValue::text(&self.machine_name),
            2 => CellValue::text(&self.description),
            3 => CellValue::text(&self.severity),
            4 => CellValue::text(&self.technician),
            5 => CellValue::optional_timestamp(self.fault_date),
            6 => CellValue::optional_timestamp(self.resolved_date),
            _ => CellValue::Null,
        }
    }

    fn record_id(&self) -> i64 {
        self.id.get()
    }
}

impl Resource for MachineFault {
    const COLLECTION: &'static str = "MachineFault";
    const SCREEN: Screen = Screen::Faults;
}

const QUALITY_COLUMNS: [Column; 7] = [
    Column::new("ID", "id"),
    Column::new("Product", "productName"),
    Column::new("Instruction", "productionInstructionId"),
    Column::new("Inspector", "inspector"),
    Column::new("Result", "result"),
    Column::new("Defects", "defectCount"),
    Column::new("Checked", "controlDate"),
];

impl TableRecord for QualityControl {
    fn columns() -> &'static [Column] {
        &QUALITY_COLUMNS
    }

    fn cell(&self, column: usize) -> CellValue {
        match column {
            0 => CellValue::Int(self.id.get()),
            1 => CellValue::text(&self.product_name),
            2 => CellValue::optional_int(
                self.production_instruction_id
                    .map(ProductionInstructionId::get),
            ),
            3 => CellValue::text(&self.inspector),
            4 => CellValue::text(&self.result),
            5 => CellValue::Int(self.defect_count),
            6 => CellValue::optional_timestamp(self.control_date),
            _ => CellValue::Null,
        }
    }

    fn record_id(&self) -> i64 {
        self.id.get()
    }
}

impl Resource for QualityControl {
    const COLLECTION: &'static str = "QualityControl";
    const SCREEN: Screen = Screen::QualityControl;
}

const STATION_COLUMNS: [Column; 5] = [
    Column::new("ID", "id"),
    Column::new("Name", "name"),
    Column::new("Seq", "sequence"),
    Column::new("Machine", "machineId"),
    Column::new("Description", "description"),
];

impl TableRecord for Station {
    fn columns() -> &'static [Column] {
        &STATION_COLUMNS
    }

    fn cell(&self, column: usize) -> CellValue {
        match column {
            0 => CellValue::Int(self.id.get()),
            1 => CellValue::text(&self.name),
            2 => CellValue::Int(self.sequence),
            3 => CellValue::optional_int(self.machine_id.map(MachineId::get)),
            4 => CellValue::text(&self.description),
            _ => CellValue::Null,
        }
    }

    fn record_id(&self) -> i64 {
        self.id.get()
    }
}

impl Resource for Station {
    const COLLECTION: &'static str = "Station";
    const SCREEN: Screen = Screen::Stations;
}

const PRODUCTION_COLUMNS: [Column; 8] = [
    Column::new("ID", "id"),
    Column::new("Product", "productName"),
    Column::new("Qty", "quantity"),
    Column::new("Order", "orderId"),
    Column::new("Status", "status"),
    Column::new("Finished", "finishedSteps"),
    Column::new("Steps", "steps"),
    Column::new("Created", "createdDate"),
];

/// Index of the projected status column on the production screen.
pub const PRODUCTION_STATUS_COLUMN: usize = 4;

impl TableRecord for ProductionInstruction {
    fn columns() -> &'static [Column] {
        &PRODUCTION_COLUMNS
    }

    fn cell(&self, column: usize) -> CellValue {
        match column {
            0 => CellValue::Int(self.id.get()),
            1 => CellValue::text(&self.product_name),
            2 => CellValue::Int(self.quantity),
            3 => CellValue::optional_int(self.order_id.map(OrderId::get)),
            4 => CellValue::text(self.status().label()),
            5 => CellValue::Int(self.progress().finished as i64),
            6 => CellValue::Int(self.production_to_machines.len() as i64),
            7 => CellValue::optional_timestamp(self.created_date),
            _ => CellValue::Null,
        }
    }

    fn record_id(&self) -> i64 {
        self.id.get()
    }
}

impl Resource for ProductionInstruction {
    const COLLECTION: &'static str = "ProductionInstruction";
    const SCREEN: Screen = Screen::Production;
}

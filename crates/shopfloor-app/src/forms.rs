// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::PrimitiveDateTime;

use crate::model::{
    Flag, Machine, MachineFault, Order, Person, ProductionInstruction, QualityControl, Resource,
    Screen, Station, StoreItem, Work,
};
use crate::timestamp;
use crate::{MachineId, OrderId, PersonId, ProductionInstructionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormKind {
    Person,
    Order,
    Work,
    StoreItem,
    Machine,
    MachineFault,
    QualityControl,
    Station,
    ProductionInstruction,
}

impl FormKind {
    pub const ALL: [Self; 9] = [
        Self::Person,
        Self::Order,
        Self::Work,
        Self::StoreItem,
        Self::Machine,
        Self::MachineFault,
        Self::QualityControl,
        Self::Station,
        Self::ProductionInstruction,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Order => "order",
            Self::Work => "work",
            Self::StoreItem => "store item",
            Self::Machine => "machine",
            Self::MachineFault => "machine fault",
            Self::QualityControl => "quality control",
            Self::Station => "station",
            Self::ProductionInstruction => "production instruction",
        }
    }

    pub const fn for_screen(screen: Screen) -> Option<Self> {
        match screen {
            Screen::Dashboard => None,
            Screen::Production => Some(Self::ProductionInstruction),
            Screen::Machines => Some(Self::Machine),
            Screen::Faults => Some(Self::MachineFault),
            Screen::Stations => Some(Self::Station),
            Screen::QualityControl => Some(Self::QualityControl),
            Screen::Orders => Some(Self::Order),
            Screen::Works => Some(Self::Work),
            Screen::Persons => Some(Self::Person),
            Screen::Store => Some(Self::StoreItem),
        }
    }

    /// Routing is owned by the server once an instruction exists.
    pub const fn supports_edit(self) -> bool {
        !matches!(self, Self::ProductionInstruction)
    }

    pub const fn fields(self) -> &'static [FormField] {
        match self {
            Self::Person => &PERSON_FIELDS,
            Self::Order => &ORDER_FIELDS,
            Self::Work => &WORK_FIELDS,
            Self::StoreItem => &STORE_ITEM_FIELDS,
            Self::Machine => &MACHINE_FIELDS,
            Self::MachineFault => &MACHINE_FAULT_FIELDS,
            Self::QualityControl => &QUALITY_CONTROL_FIELDS,
            Self::Station => &STATION_FIELDS,
            Self::ProductionInstruction => &PRODUCTION_INSTRUCTION_FIELDS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    OptionalInteger,
    Decimal,
    OptionalDecimal,
    Timestamp,
    Id,
    OptionalId,
    Flag,
    IdList,
}

/// One editable input of a form, keyed by its wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormField {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
}

impl FormField {
    const fn new(key: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self { key, label, kind }
    }

    /// Parse typed text into the JSON value sent for this field.
    pub fn parse(&self, raw: &str) -> Result<Value> {
        let raw = raw.trim();
        let label = self.label;
        match self.kind {
            FieldKind::Text => Ok(Value::String(raw.to_owned())),
            FieldKind::Integer | FieldKind::Id => {
                if raw.is_empty() {
                    bail!("{label} is required -- enter a whole number");
                }
                parse_integer(label, raw).map(Value::from)
            }
            FieldKind::OptionalInteger | FieldKind::OptionalId => {
                if raw.is_empty() {
                    return Ok(Value::Null);
                }
                parse_integer(label, raw).map(Value::from)
            }
            FieldKind::Decimal => {
                if raw.is_empty() {
                    bail!("{label} is required -- enter a number");
                }
                parse_decimal(label, raw).map(Value::from)
            }
            FieldKind::OptionalDecimal => {
                if raw.is_empty() {
                    return Ok(Value::Null);
                }
                parse_decimal(label, raw).map(Value::from)
            }
            FieldKind::Timestamp => {
                if raw.is_empty() {
                    return Ok(Value::Null);
                }
                match timestamp::parse(raw) {
                    Some(value) => Ok(Value::String(timestamp::format_wire(value))),
                    None => bail!("{label} must be a date like 2025-03-14 or 2025-03-14T08:30"),
                }
            }
            FieldKind::Flag => match raw.to_lowercase().as_str() {
                "" | "0" | "n" | "no" | "false" | "hayır" => Ok(Value::from(0)),
                "1" | "y" | "yes" | "true" | "evet" => Ok(Value::from(1)),
                _ => bail!("{label} must be yes or no"),
            },
            FieldKind::IdList => raw
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(|part| parse_integer(label, part).map(Value::from))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
        }
    }

    /// Render a stored JSON value back into editable text.
    pub fn render(&self, value: Option<&Value>) -> String {
        match (self.kind, value) {
            (_, None | Some(Value::Null)) => String::new(),
            (FieldKind::Flag, Some(value)) => {
                let set = value.as_i64() == Some(1) || value.as_bool() == Some(true);
                if set { "yes" } else { "no" }.to_owned()
            }
            (_, Some(Value::String(text))) => text.clone(),
            (_, Some(Value::Array(items))) => items
                .iter()
                .map(|item| item.to_string())
                .collect::<Vec<_>>()
                .join(", "),
            (_, Some(other)) => other.to_string(),
        }
    }
}

fn parse_integer(label: &str, raw: &str) -> Result<i64> {
    raw.parse::<i64>()
        .with_context(|| format!("{label} must be a whole number, got {raw:?}"))
}

fn parse_decimal(label: &str, raw: &str) -> Result<f64> {
    let value = raw
        .replace(',', ".")
        .parse::<f64>()
        .with_context(|| format!("{label} must be a number, got {raw:?}"))?;
    if !value.is_finite() {
        bail!("{label} must be a finite number");
    }
    Ok(value)
}

const PERSON_FIELDS: [FormField; 8] = [
    FormField::new("firstName", "first name", FieldKind::Text),
    FormField::new("lastName", "last name", FieldKind::Text),
    FormField::new("department", "department", FieldKind::Text),
    FormField::new("title", "title", FieldKind::Text),
    FormField::new("phone", "phone", FieldKind::Text),
    FormField::new("email", "email", FieldKind::Text),
    FormField::new("hireDate", "hire date", FieldKind::Timestamp),
    FormField::new("isActive", "active", FieldKind::Flag),
];

const ORDER_FIELDS: [FormField; 8] = [
    FormField::new("customerName", "customer", FieldKind::Text),
    FormField::new("productName", "product", FieldKind::Text),
    FormField::new("quantity", "quantity", FieldKind::Integer),
    FormField::new("unitPrice", "unit price", FieldKind::OptionalDecimal),
    FormField::new("orderDate", "order date", FieldKind::Timestamp),
    FormField::new("deliveryDate", "delivery date", FieldKind::Timestamp),
    FormField::new("status", "status", FieldKind::Text),
    FormField::new("notes", "notes", FieldKind::Text),
];

const WORK_FIELDS: [FormField; 7] = [
    FormField::new("title", "title", FieldKind::Text),
    FormField::new("description", "description", FieldKind::Text),
    FormField::new("personId", "assignee id", FieldKind::OptionalId),
    FormField::new("machineId", "machine id", FieldKind::OptionalId),
    FormField::new("startDate", "start", FieldKind::Timestamp),
    FormField::new("endDate", "end", FieldKind::Timestamp),
    FormField::new("isCompleted", "done", FieldKind::Flag),
];

const STORE_ITEM_FIELDS: [FormField; 7] = [
    FormField::new("name", "name", FieldKind::Text),
    FormField::new("code", "code", FieldKind::Text),
    FormField::new("category", "category", FieldKind::Text),
    FormField::new("quantity", "quantity", FieldKind::Decimal),
    FormField::new("unit", "unit", FieldKind::Text),
    FormField::new("minQuantity", "minimum", FieldKind::OptionalDecimal),
    FormField::new("location", "location", FieldKind::Text),
];

const MACHINE_FIELDS: [FormField; 7] = [
    FormField::new("name", "name", FieldKind::Text),
    FormField::new("code", "code", FieldKind::Text),
    FormField::new("brand", "brand", FieldKind::Text),
    FormField::new("model", "model", FieldKind::Text),
    FormField::new("location", "location", FieldKind::Text),
    FormField::new("purchaseDate", "purchase date", FieldKind::Timestamp),
    FormField::new("isActive", "active", FieldKind::Flag),
];

const MACHINE_FAULT_FIELDS: [FormField; 6] = [
    FormField::new("machineId", "machine id", FieldKind::Id),
    FormField::new("description", "description", FieldKind::Text),
    FormField::new("severity", "severity", FieldKind::Text),
    FormField::new("technician", "technician", FieldKind::Text),
    FormField::new("faultDate", "reported", FieldKind::Timestamp),
    FormField::new("resolvedDate", "resolved", FieldKind::Timestamp),
];

const QUALITY_CONTROL_FIELDS: [FormField; 8] = [
    FormField::new(
        "productionInstructionId",
        "instruction id",
        FieldKind::OptionalId,
    ),
    FormField::new("productName", "product", FieldKind::Text),
    FormField::new("inspector", "inspector", FieldKind::Text),
    FormField::new("result", "result", FieldKind::Text),
    FormField::new("sampleSize", "sample size", FieldKind::OptionalInteger),
    FormField::new("defectCount", "defects", FieldKind::Integer),
    FormField::new("controlDate", "checked", FieldKind::Timestamp),
    FormField::new("notes", "notes", FieldKind::Text),
];

const STATION_FIELDS: [FormField; 4] = [
    FormField::new("name", "name", FieldKind::Text),
    FormField::new("sequence", "sequence", FieldKind::Integer),
    FormField::new("machineId", "machine id", FieldKind::OptionalId),
    FormField::new("description", "description", FieldKind::Text),
];

const PRODUCTION_INSTRUCTION_FIELDS: [FormField; 4] = [
    FormField::new("orderId", "order id", FieldKind::OptionalId),
    FormField::new("productName", "product", FieldKind::Text),
    FormField::new("quantity", "quantity", FieldKind::Integer),
    FormField::new("machineIds", "routing machine ids", FieldKind::IdList),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonFormInput {
    pub first_name: String,
    pub last_name: String,
    pub department: String,
    pub title: String,
    pub phone: String,
    pub email: String,
    #[serde(with = "crate::timestamp::option")]
    pub hire_date: Option<PrimitiveDateTime>,
    pub is_active: Flag,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFormInput {
    pub customer_name: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Option<f64>,
    #[serde(with = "crate::timestamp::option")]
    pub order_date: Option<PrimitiveDateTime>,
    #[serde(with = "crate::timestamp::option")]
    pub delivery_date: Option<PrimitiveDateTime>,
    pub status: String,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkFormInput {
    pub title: String,
    pub description: String,
    pub person_id: Option<PersonId>,
    pub machine_id: Option<MachineId>,
    #[serde(with = "crate::timestamp::option")]
    pub start_date: Option<PrimitiveDateTime>,
    #[serde(with = "crate::timestamp::option")]
    pub end_date: Option<PrimitiveDateTime>,
    pub is_completed: Flag,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreItemFormInput {
    pub name: String,
    pub code: String,
    pub category: String,
    pub quantity: f64,
    pub unit: String,
    pub min_quantity: Option<f64>,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineFormInput {
    pub name: String,
    pub code: String,
    pub brand: String,
    pub model: String,
    pub location: String,
    #[serde(with = "crate::timestamp::option")]
    pub purchase_date: Option<PrimitiveDateTime>,
    pub is_active: Flag,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineFaultFormInput {
    pub machine_id: MachineId,
    pub description: String,
    pub severity: String,
    pub technician: String,
    #[serde(with = "crate::timestamp::option")]
    pub fault_date: Option<PrimitiveDateTime>,
    #[serde(with = "crate::timestamp::option")]
    pub resolved_date: Option<PrimitiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityControlFormInput {
    pub production_instruction_id: Option<ProductionInstructionId>,
    pub product_name: String,
    pub inspector: String,
    pub result: String,
    pub sample_size: Option<i64>,
    pub defect_count: i64,
    #[serde(with = "crate::timestamp::option")]
    pub control_date: Option<PrimitiveDateTime>,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationFormInput {
    pub name: String,
    pub sequence: i64,
    pub machine_id: Option<MachineId>,
    pub description: String,
}

/// Creating an instruction only names the product and its routing; the
/// server owns machine assignment and the completion flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionInstructionFormInput {
    pub order_id: Option<OrderId>,
    pub product_name: String,
    pub quantity: i64,
    pub machine_ids: Vec<MachineId>,
}

/// A write body. Serialises as the inner input, which is exactly the JSON
/// the collection endpoint accepts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FormPayload {
    Person(PersonFormInput),
    Order(OrderFormInput),
    Work(WorkFormInput),
    StoreItem(StoreItemFormInput),
    Machine(MachineFormInput),
    MachineFault(MachineFaultFormInput),
    QualityControl(QualityControlFormInput),
    Station(StationFormInput),
    ProductionInstruction(ProductionInstructionFormInput),
}

impl FormPayload {
    pub fn kind(&self) -> FormKind {
        match self {
            Self::Person(_) => FormKind::Person,
            Self::Order(_) => FormKind::Order,
            Self::Work(_) => FormKind::Work,
            Self::StoreItem(_) => FormKind::StoreItem,
            Self::Machine(_) => FormKind::Machine,
            Self::MachineFault(_) => FormKind::MachineFault,
            Self::QualityControl(_) => FormKind::QualityControl,
            Self::Station(_) => FormKind::Station,
            Self::ProductionInstruction(_) => FormKind::ProductionInstruction,
        }
    }

    /// API collection the payload is written to.
    pub fn resource(&self) -> &'static str {
        match self.kind() {
            FormKind::Person => Person::COLLECTION,
            FormKind::Order => Order::COLLECTION,
            FormKind::Work => Work::COLLECTION,
            FormKind::StoreItem => StoreItem::COLLECTION,
            FormKind::Machine => Machine::COLLECTION,
            FormKind::MachineFault => MachineFault::COLLECTION,
            FormKind::QualityControl => QualityControl::COLLECTION,
            FormKind::Station => Station::COLLECTION,
            FormKind::ProductionInstruction => ProductionInstruction::COLLECTION,
        }
    }

    pub fn blank_for(kind: FormKind) -> Self {
        match kind {
            FormKind::Person => Self::Person(PersonFormInput {
                first_name: String::new(),
                last_name: String::new(),
                department: String::new(),
                title: String::new(),
                phone: String::new(),
                email: String::new(),
                hire_date: None,
                is_active: Flag::On,
            }),
            FormKind::Order => Self::Order(OrderFormInput {
                customer_name: String::new(),
                product_name: String::new(),
                quantity: 1,
                unit_price: None,
                order_date: None,
                delivery_date: None,
                status: String::new(),
                notes: String::new(),
            }),
            FormKind::Work => Self::Work(WorkFormInput {
                title: String::new(),
                description: String::new(),
                person_id: None,
                machine_id: None,
                start_date: None,
                end_date: None,
                is_completed: Flag::Off,
            }),
            FormKind::StoreItem => Self::StoreItem(StoreItemFormInput {
                name: String::new(),
                code: String::new(),
                category: String::new(),
                quantity: 0.0,
                unit: String::new(),
                min_quantity: None,
                location: String::new(),
            }),
            FormKind::Machine => Self::Machine(MachineFormInput {
                name: String::new(),
                code: String::new(),
                brand: String::new(),
                model: String::new(),
                location: String::new(),
                purchase_date: None,
                is_active: Flag::On,
            }),
            FormKind::MachineFault => Self::MachineFault(MachineFaultFormInput {
                machine_id: MachineId::new(0),
                description: String::new(),
                severity: String::new(),
                technician: String::new(),
                fault_date: None,
                resolved_date: None,
            }),
            FormKind::QualityControl => Self::QualityControl(QualityControlFormInput {
                production_instruction_id: None,
                product_name: String::new(),
                inspector: String::new(),
                result: String::new(),
                sample_size: None,
                defect_count: 0,
                control_date: None,
                notes: String::new(),
            }),
            FormKind::Station => Self::Station(StationFormInput {
                name: String::new(),
                sequence: 1,
                machine_id: None,
                description: String::new(),
            }),
            FormKind::ProductionInstruction => {
                Self::ProductionInstruction(ProductionInstructionFormInput {
                    order_id: None,
                    product_name: String::new(),
                    quantity: 1,
                    machine_ids: Vec::new(),
                })
            }
        }
    }

    /// Build a payload from one raw string per field of `kind.fields()`.
    pub fn from_fields(kind: FormKind, values: &[String]) -> Result<Self> {
        let fields = kind.fields();
        if values.len() != fields.len() {
            bail!(
                "{} form expects {} fields, got {}",
                kind.label(),
                fields.len(),
                values.len()
            );
        }
        let mut body = Map::new();
        for (field, raw) in fields.iter().zip(values) {
            body.insert(field.key.to_owned(), field.parse(raw)?);
        }
        let body = Value::Object(body);
        Ok(match kind {
            FormKind::Person => Self::Person(decode_body(kind, body)?),
            FormKind::Order => Self::Order(decode_body(kind, body)?),
            FormKind::Work => Self::Work(decode_body(kind, body)?),
            FormKind::StoreItem => Self::StoreItem(decode_body(kind, body)?),
            FormKind::Machine => Self::Machine(decode_body(kind, body)?),
            FormKind::MachineFault => Self::MachineFault(decode_body(kind, body)?),
            FormKind::QualityControl => Self::QualityControl(decode_body(kind, body)?),
            FormKind::Station => Self::Station(decode_body(kind, body)?),
            FormKind::ProductionInstruction => {
                Self::ProductionInstruction(decode_body(kind, body)?)
            }
        })
    }

    /// Editable text for each field of `kind`, read from a record or payload.
    pub fn field_values<T: Serialize>(kind: FormKind, record: &T) -> Result<Vec<String>> {
        let value = serde_json::to_value(record)
            .with_context(|| format!("encode {} for editing", kind.label()))?;
        Ok(kind
            .fields()
            .iter()
            .map(|field| field.render(value.get(field.key)))
            .collect())
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Person(person) => person.validate(),
            Self::Order(order) => order.validate(),
            Self::Work(work) => work.validate(),
            Self::StoreItem(item) => item.validate(),
            Self::Machine(machine) => machine.validate(),
            Self::MachineFault(fault) => fault.validate(),
            Self::QualityControl(check) => check.validate(),
            Self::Station(station) => station.validate(),
            Self::ProductionInstruction(instruction) => instruction.validate(),
        }
    }
}

fn decode_body<T: DeserializeOwned>(kind: FormKind, body: Value) -> Result<T> {
    serde_json::from_value(body).with_context(|| format!("build {} form", kind.label()))
}

fn ensure_ordered(
    start: Option<PrimitiveDateTime>,
    end: Option<PrimitiveDateTime>,
    message: &str,
) -> Result<()> {
    if let (Some(start), Some(end)) = (start, end)
        && end < start
    {
        bail!("{message}");
    }
    Ok(())
}

impl PersonFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.first_name.trim().is_empty() {
            bail!("first name is required -- enter a first name and retry");
        }
        if self.last_name.trim().is_empty() {
            bail!("last name is required -- enter a last name and retry");
        }
        let email = self.email.trim();
        if !email.is_empty() && !email.contains('@') {
            bail!("email {email:?} is not an address -- fix it or leave it blank");
        }
        Ok(())
    }
}

impl OrderFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.customer_name.trim().is_empty() {
            bail!("customer name is required -- enter a customer and retry");
        }
        if self.product_name.trim().is_empty() {
            bail!("order product is required -- enter a product and retry");
        }
        if self.quantity <= 0 {
            bail!("order quantity must be positive");
        }
        if let Some(price) = self.unit_price
            && price < 0.0
        {
            bail!("order unit price cannot be negative");
        }
        ensure_ordered(
            self.order_date,
            self.delivery_date,
            "delivery date must be on/after order date",
        )
    }
}

impl WorkFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            bail!("work title is required -- enter a title and retry");
        }
        if let Some(person) = self.person_id
            && !person.is_assigned()
        {
            bail!("work assignee id must be positive -- choose a person or leave it blank");
        }
        ensure_ordered(
            self.start_date,
            self.end_date,
            "work end date must be on/after start date",
        )
    }
}

impl StoreItemFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("store item name is required -- enter a name and retry");
        }
        if self.quantity < 0.0 {
            bail!("store quantity cannot be negative");
        }
        if let Some(minimum) = self.min_quantity
            && minimum < 0.0
        {
            bail!("store minimum quantity cannot be negative");
        }
        Ok(())
    }
}

impl MachineFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("machine name is required -- enter a name and retry");
        }
        Ok(())
    }
}

impl MachineFaultFormInput {
    pub fn validate(&self) -> Result<()> {
        if !self.machine_id.is_assigned() {
            bail!("fault machine is required -- choose a machine and retry");
        }
        if self.description.trim().is_empty() {
            bail!("fault description is required -- describe the fault and retry");
        }
        ensure_ordered(
            self.fault_date,
            self.resolved_date,
            "fault resolved date must be on/after fault date",
        )
    }
}

impl QualityControlFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.product_name.trim().is_empty() {
            bail!("inspected product is required -- enter a product and retry");
        }
        if self.defect_count < 0 {
            bail!("defect count cannot be negative");
        }
        if let Some(sample) = self.sample_size {
            if sample <= 0 {
                bail!("sample size must be positive");
            }
            if self.defect_count > sample {
                bail!("defect count cannot exceed sample size {sample}");
            }
        }
        Ok(())
    }
}

impl StationFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("station name is required -- enter a name and retry");
        }
        if self.sequence <= 0 {
            bail!("station sequence must be at least 1");
        }
        Ok(())
    }
}

impl ProductionInstructionFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.product_name.trim().is_empty() {
            bail!("instruction product is required -- enter a product and retry");
        }
        if self.quantity <= 0 {
            bail!("instruction quantity must be positive");
        }
        if self.machine_ids.is_empty() {
            bail!("routing is empty -- add at least one machine and retry");
        }
        if let Some(machine) = self.machine_ids.iter().find(|id| !id.is_assigned()) {
            bail!("routing machine id {machine} is invalid -- choose an existing machine");
        }
        Ok(())
    }
}

// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use shopfloor_app::{
    Flag, Machine, MachineFault, MachineFaultId, MachineId, Order, OrderId, Person, PersonId,
    ProductionInstruction, ProductionInstructionId, QualityControl, QualityControlId, Resource,
    RoutingStep, RoutingStepId, Station, StationId, StationStatus, StoreItem, StoreItemId, Work,
    WorkId,
};
use time::{Date, Duration, Month, PrimitiveDateTime, Time};

const REFERENCE_YEAR: i32 = 2025;

const FIRST_NAMES: [&str; 16] = [
    "Ahmet", "Ayşe", "Mehmet", "Fatma", "Mustafa", "Zeynep", "İbrahim", "Elif", "Hüseyin",
    "Emine", "Ömer", "Şule", "Çağrı", "Gül", "Onur", "Derya",
];
const LAST_NAMES: [&str; 14] = [
    "Yılmaz", "Kaya", "Demir", "Şahin", "Çelik", "Yıldız", "Aydın", "Öztürk", "Arslan",
    "Doğan", "Kılıç", "Aslan", "Çetin", "Koç",
];
const DEPARTMENTS: [&str; 6] = [
    "Üretim",
    "Bakım",
    "Kalite",
    "Depo",
    "Planlama",
    "Satın Alma",
];
const TITLES: [&str; 6] = [
    "Operatör",
    "Teknisyen",
    "Usta",
    "Mühendis",
    "Vardiya Amiri",
    "Uzman",
];

const MACHINE_KINDS: [&str; 10] = [
    "CNC Torna",
    "CNC Freze",
    "Hidrolik Pres",
    "Kaynak Robotu",
    "Lazer Kesim",
    "Taşlama",
    "Boya Kabini",
    "Büküm Makinesi",
    "Matkap",
    "Montaj Bandı",
];
const MACHINE_BRANDS: [&str; 8] = [
    "Mazak", "Haas", "DMG Mori", "Trumpf", "Amada", "Fanuc", "Ermaksan", "Durmazlar",
];
const HALLS: [&str; 4] = ["Hol A", "Hol B", "Hol C", "Dış Saha"];

const FAULT_DESCRIPTIONS: [&str; 10] = [
    "Yağ kaçağı",
    "Motor aşırı ısınıyor",
    "Hidrolik basınç düşük",
    "Sensör arızası",
    "Kayış koptu",
    "Titreşim yüksek",
    "Soğutma sıvısı bitti",
    "Elektrik panosu sigorta attı",
    "Takım kırıldı",
    "Acil stop devrede",
];
const SEVERITIES: [&str; 4] = ["Düşük", "Orta", "Yüksek", "Kritik"];

const PRODUCTS: [&str; 10] = [
    "Dişli 40mm",
    "Flanş DN50",
    "Mil 300mm",
    "Şase Braketi",
    "Rulman Yuvası",
    "Pompa Gövdesi",
    "Kapak Plakası",
    "Bağlantı Parçası",
    "Yatak Burcu",
    "Dişli Kutusu",
];
const CUSTOMERS: [&str; 8] = [
    "Anadolu Makina",
    "Ege Otomotiv",
    "Marmara Döküm",
    "Karadeniz Metal",
    "Akdeniz Hidrolik",
    "Trakya Tarım",
    "Acme Industrial",
    "Bosphorus Pumps",
];
const ORDER_STATUSES: [&str; 5] = [
    "Yeni",
    "Üretimde",
    "Sevkiyata Hazır",
    "Teslim Edildi",
    "İptal",
];
const QC_RESULTS: [&str; 3] = ["Kabul", "Şartlı Kabul", "Red"];

const STORE_ITEMS: [(&str, &str, &str); 10] = [
    ("Rulman 6204", "Yedek Parça", "adet"),
    ("M8 Cıvata", "Bağlantı", "adet"),
    ("Hidrolik Yağ", "Sarf", "litre"),
    ("Kesme Sıvısı", "Sarf", "litre"),
    ("St37 Sac", "Hammadde", "kg"),
    ("Kaynak Teli", "Sarf", "kg"),
    ("V Kayışı", "Yedek Parça", "adet"),
    ("Endüktif Sensör", "Elektrik", "adet"),
    ("Freze Ucu 10mm", "Takım", "adet"),
    ("Eldiven", "İSG", "çift"),
];

const WORK_TITLES: [&str; 8] = [
    "Periyodik bakım",
    "Kalıp değişimi",
    "Tezgah temizliği",
    "Kalibrasyon",
    "Yağlama",
    "Numune üretimi",
    "Operatör eğitimi",
    "Envanter sayımı",
];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn chance(&mut self, percent: u64) -> bool {
        self.next_u64() % 100 < percent
    }
}

/// Where a generated instruction sits in its routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingPhase {
    NotStarted,
    AtStation,
    BetweenStations,
    Completed,
    Cancelled,
}

impl RoutingPhase {
    pub const ALL: [Self; 5] = [
        Self::NotStarted,
        Self::AtStation,
        Self::BetweenStations,
        Self::Completed,
        Self::Cancelled,
    ];
}

#[derive(Debug, Clone)]
pub struct FactoryFaker {
    rng: DeterministicRng,
}

impl FactoryFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    pub fn person(&mut self, id: i64) -> Person {
        let first = self.pick(&FIRST_NAMES);
        let last = self.pick(&LAST_NAMES);
        Person {
            id: PersonId::new(id),
            first_name: first.to_owned(),
            last_name: last.to_owned(),
            department: self.pick(&DEPARTMENTS).to_owned(),
            title: self.pick(&TITLES).to_owned(),
            phone: format!(
                "0{} {:03} {:02} {:02}",
                self.int_range(530, 559),
                self.int_range(100, 999),
                self.int_range(10, 99),
                self.int_range(10, 99),
            ),
            email: format!("{}.{}@fabrika.example", ascii_slug(first), ascii_slug(last)),
            hire_date: Some(self.datetime_within_days(3650)),
            is_active: Flag::from(self.rng.chance(85)),
        }
    }

    pub fn machine(&mut self, id: i64) -> Machine {
        let kind = self.pick(&MACHINE_KINDS);
        let brand = self.pick(&MACHINE_BRANDS);
        Machine {
            id: MachineId::new(id),
            name: format!("{kind} {id}"),
            code: format!("MK-{id:03}"),
            brand: brand.to_owned(),
            model: format!("{}-{}", brand_prefix(brand), self.int_range(100, 9_999)),
            location: self.pick(&HALLS).to_owned(),
            purchase_date: Some(self.datetime_within_days(5 * 365)),
            is_active: Flag::from(self.rng.chance(80)),
        }
    }

    pub fn machine_fault(&mut self, id: i64, machine: &Machine) -> MachineFault {
        let fault_date = self.datetime_within_days(180);
        let resolved_date = if self.rng.chance(60) {
            Some(fault_date + Duration::hours(self.int_range(1, 72)))
        } else {
            None
        };
        MachineFault {
            id: MachineFaultId::new(id),
            machine_id: machine.id,
            machine_name: machine.name.clone(),
            description: self.pick(&FAULT_DESCRIPTIONS).to_owned(),
            severity: self.pick(&SEVERITIES).to_owned(),
            technician: self.full_name(),
            fault_date: Some(fault_date),
            resolved_date,
        }
    }

    pub fn station(&mut self, id: i64, sequence: i64, machine: &Machine) -> Station {
        Station {
            id: StationId::new(id),
            name: format!("İstasyon {sequence}"),
            sequence,
            machine_id: Some(machine.id),
            description: format!("{} üzerinde işlem", machine.name),
        }
    }

    pub fn order(&mut self, id: i64) -> Order {
        let order_date = self.datetime_within_days(120);
        Order {
            order_id: OrderId::new(id),
            customer_name: self.pick(&CUSTOMERS).to_owned(),
            product_name: self.pick(&PRODUCTS).to_owned(),
            quantity: self.int_range(10, 500),
            unit_price: Some(self.int_range(500, 250_000) as f64 / 100.0),
            order_date: Some(order_date),
            delivery_date: Some(order_date + Duration::days(self.int_range(7, 60))),
            status: self.pick(&ORDER_STATUSES).to_owned(),
            notes: String::new(),
        }
    }

    pub fn work(&mut self, id: i64, assignee: &Person, machine: Option<&Machine>) -> Work {
        let start_date = self.datetime_within_days(60);
        let is_completed = self.rng.chance(50);
        Work {
            work_id: WorkId::new(id),
            title: self.pick(&WORK_TITLES).to_owned(),
            description: String::new(),
            person_id: Some(assignee.id),
            person_name: assignee.full_name(),
            machine_id: machine.map(|machine| machine.id),
            start_date: Some(start_date),
            end_date: is_completed.then(|| start_date + Duration::hours(self.int_range(1, 16))),
            is_completed: Flag::from(is_completed),
        }
    }

    pub fn store_item(&mut self, id: i64) -> StoreItem {
        let (name, category, unit) = STORE_ITEMS[self.rng.int_n(STORE_ITEMS.len())];
        let min_quantity = self
            .rng
            .chance(70)
            .then(|| self.int_range(5, 50) as f64);
        StoreItem {
            id: StoreItemId::new(id),
            name: name.to_owned(),
            code: format!("DP-{id:04}"),
            category: category.to_owned(),
            quantity: self.int_range(0, 400) as f64,
            unit: unit.to_owned(),
            min_quantity,
            location: format!("Raf {}-{}", self.int_range(1, 12), self.int_range(1, 5)),
        }
    }

    pub fn quality_control(
        &mut self,
        id: i64,
        instruction: &ProductionInstruction,
    ) -> QualityControl {
        let sample_size = self.int_range(5, 50);
        let defect_count = self.int_range(0, sample_size / 5);
        QualityControl {
            id: QualityControlId::new(id),
            production_instruction_id: Some(instruction.id),
            product_name: instruction.product_name.clone(),
            inspector: self.full_name(),
            result: self.pick(&QC_RESULTS).to_owned(),
            sample_size: Some(sample_size),
            defect_count,
            control_date: Some(self.datetime_within_days(30)),
            notes: String::new(),
        }
    }

    pub fn production_instruction(
        &mut self,
        id: i64,
        order: Option<&Order>,
        route: &[MachineId],
        phase: RoutingPhase,
    ) -> ProductionInstruction {
        let created_date = self.datetime_within_days(45);
        let finished = match phase {
            RoutingPhase::NotStarted => 0,
            RoutingPhase::Completed => route.len(),
            RoutingPhase::AtStation | RoutingPhase::BetweenStations | RoutingPhase::Cancelled => {
                self.rng.int_n(route.len())
            }
        };
        let in_process = phase == RoutingPhase::AtStation && finished < route.len();

        let mut clock = created_date;
        let mut steps = Vec::with_capacity(route.len());
        for (index, machine) in route.iter().enumerate() {
            let mut step = RoutingStep {
                id: RoutingStepId::new(id * 100 + index as i64 + 1),
                machine_id: *machine,
                machine_name: String::new(),
                status: StationStatus::NotArrived,
                entry_date: None,
                exit_date: None,
            };
            if index < finished {
                clock += Duration::minutes(self.int_range(10, 240));
                step.entry_date = Some(clock);
                clock += Duration::minutes(self.int_range(30, 480));
                step.exit_date = Some(clock);
                step.status = StationStatus::Finished;
            } else if index == finished && in_process {
                clock += Duration::minutes(self.int_range(10, 240));
                step.entry_date = Some(clock);
                step.status = StationStatus::InProcess;
            }
            steps.push(step);
        }

        let machine_id = match phase {
            RoutingPhase::NotStarted => None,
            _ if in_process => route.get(finished).copied(),
            _ => route
                .get(finished.saturating_sub(1))
                .copied()
                .or_else(|| route.first().copied()),
        };

        ProductionInstruction {
            id: ProductionInstructionId::new(id),
            order_id: order.map(|order| order.order_id),
            product_name: order.map_or_else(
                || self.pick(&PRODUCTS).to_owned(),
                |order| order.product_name.clone(),
            ),
            quantity: order.map_or(100, |order| order.quantity),
            machine_id,
            is_completed: Flag::from(phase == RoutingPhase::Completed),
            is_deleted: Flag::from(phase == RoutingPhase::Cancelled),
            created_date: Some(created_date),
            production_to_machines: steps,
        }
    }

    fn full_name(&mut self) -> String {
        format!("{} {}", self.pick(&FIRST_NAMES), self.pick(&LAST_NAMES))
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn int_range(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = max - min + 1;
        min + (self.rng.next_u64() % (span as u64)) as i64
    }

    fn datetime_within_days(&mut self, days: i64) -> PrimitiveDateTime {
        let seconds = self.int_range(0, days * 86_400);
        let minutes = seconds / 60;
        reference_now() - Duration::minutes(minutes)
    }
}

/// A consistent set of records: faults, stations, work and instructions all
/// point at generated machines, persons and orders.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub persons: Vec<Person>,
    pub machines: Vec<Machine>,
    pub faults: Vec<MachineFault>,
    pub stations: Vec<Station>,
    pub orders: Vec<Order>,
    pub works: Vec<Work>,
    pub store: Vec<StoreItem>,
    pub instructions: Vec<ProductionInstruction>,
    pub quality: Vec<QualityControl>,
}

impl Dataset {
    pub fn seeded(seed: u64) -> Self {
        let mut faker = FactoryFaker::new(seed);

        let persons: Vec<Person> = (1..=24).map(|id| faker.person(id)).collect();
        let machines: Vec<Machine> = (1..=8).map(|id| faker.machine(id)).collect();
        let faults = (1..=18)
            .map(|id| {
                let machine = &machines[faker.int_n(machines.len())];
                faker.machine_fault(id, machine)
            })
            .collect();
        let stations = machines
            .iter()
            .zip(1_i64..)
            .map(|(machine, sequence)| faker.station(sequence, sequence, machine))
            .collect();
        let orders: Vec<Order> = (1..=30).map(|id| faker.order(1000 + id)).collect();
        let works = (1..=25)
            .map(|id| {
                let person = &persons[faker.int_n(persons.len())];
                let machine = machines.get(faker.int_n(machines.len() + 2));
                faker.work(id, person, machine)
            })
            .collect();
        let store = (1..=15).map(|id| faker.store_item(id)).collect();

        let mut instructions = Vec::new();
        for (id, phase) in (1..=20).zip(RoutingPhase::ALL.into_iter().cycle()) {
            let route_len = 2 + faker.int_n(3);
            let start = faker.int_n(machines.len());
            let route: Vec<MachineId> = (0..route_len)
                .map(|offset| machines[(start + offset) % machines.len()].id)
                .collect();
            let order = orders.get(faker.int_n(orders.len()));
            instructions.push(faker.production_instruction(id, order, &route, phase));
        }
        for instruction in &mut instructions {
            for step in &mut instruction.production_to_machines {
                if let Some(machine) = machines.iter().find(|machine| machine.id == step.machine_id)
                {
                    step.machine_name = machine.name.clone();
                }
            }
        }

        let quality = instructions
            .iter()
            .filter(|instruction| instruction.is_completed.is_set())
            .zip(1..)
            .map(|(instruction, id)| faker.quality_control(id, instruction))
            .collect();

        Self {
            persons,
            machines,
            faults,
            stations,
            orders,
            works,
            store,
            instructions,
            quality,
        }
    }

    /// JSON array for one API collection, as the server would send it.
    pub fn collection_json(&self, collection: &str) -> Result<String> {
        let value = match collection {
            Person::COLLECTION => serde_json::to_value(&self.persons),
            Machine::COLLECTION => serde_json::to_value(&self.machines),
            MachineFault::COLLECTION => serde_json::to_value(&self.faults),
            Station::COLLECTION => serde_json::to_value(&self.stations),
            Order::COLLECTION => serde_json::to_value(&self.orders),
            Work::COLLECTION => serde_json::to_value(&self.works),
            StoreItem::COLLECTION => serde_json::to_value(&self.store),
            ProductionInstruction::COLLECTION => serde_json::to_value(&self.instructions),
            QualityControl::COLLECTION => serde_json::to_value(&self.quality),
            other => bail!("unknown collection {other:?}"),
        }
        .with_context(|| format!("encode {collection}"))?;
        Ok(value.to_string())
    }
}

pub fn brand_prefix(brand: &str) -> String {
    brand.chars().take(2).collect::<String>().to_uppercase()
}

pub fn reference_now() -> PrimitiveDateTime {
    PrimitiveDateTime::new(
        Date::from_calendar_date(REFERENCE_YEAR, Month::January, 1).unwrap_or(Date::MIN),
        Time::MIDNIGHT,
    )
}

fn ascii_slug(value: &str) -> String {
    value
        .chars()
        .map(|ch| match ch {
            'ç' | 'Ç' => 'c',
            'ğ' | 'Ğ' => 'g',
            'ı' | 'İ' => 'i',
            'ö' | 'Ö' => 'o',
            'ş' | 'Ş' => 's',
            'ü' | 'Ü' => 'u',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Display status for production instructions and the transition requests
//! the console may submit. The routing state machine itself lives on the
//! server; this module only projects and requests.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::ids::{MachineId, ProductionInstructionId};
use crate::model::{Flag, ProductionInstruction, RoutingStep};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoutingStatus {
    NotStarted,
    Cancelled,
    Completed,
    InProgress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagColor {
    Red,
    Green,
    Blue,
    Gray,
}

impl RoutingStatus {
    pub const ALL: [Self; 4] = [
        Self::NotStarted,
        Self::Cancelled,
        Self::Completed,
        Self::InProgress,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::NotStarted => "not started",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
            Self::InProgress => "in progress",
        }
    }

    pub const fn tag_color(self) -> TagColor {
        match self {
            Self::NotStarted | Self::Cancelled => TagColor::Red,
            Self::Completed => TagColor::Green,
            Self::InProgress => TagColor::Blue,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(value.trim()))
    }
}

/// First match wins: no machine, then deletion, then completion.
pub fn project_status(
    machine_id: Option<i64>,
    is_completed: Flag,
    is_deleted: Flag,
) -> RoutingStatus {
    match machine_id {
        None => RoutingStatus::NotStarted,
        Some(id) if id <= 0 => RoutingStatus::NotStarted,
        Some(_) if is_deleted.is_set() => RoutingStatus::Cancelled,
        Some(_) if is_completed.is_set() => RoutingStatus::Completed,
        Some(_) => RoutingStatus::InProgress,
    }
}

/// Per-station status of a routing step, `0`/`1`/`2` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum StationStatus {
    #[default]
    NotArrived,
    InProcess,
    Finished,
}

impl StationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::NotArrived => "waiting",
            Self::InProcess => "in process",
            Self::Finished => "finished",
        }
    }

    pub const fn tag_color(self) -> TagColor {
        match self {
            Self::NotArrived => TagColor::Gray,
            Self::InProcess => TagColor::Blue,
            Self::Finished => TagColor::Green,
        }
    }
}

impl TryFrom<i64> for StationStatus {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::NotArrived),
            1 => Ok(Self::InProcess),
            2 => Ok(Self::Finished),
            other => Err(format!("station status must be 0, 1 or 2, got {other}")),
        }
    }
}

impl From<StationStatus> for i64 {
    fn from(value: StationStatus) -> Self {
        match value {
            StationStatus::NotArrived => 0,
            StationStatus::InProcess => 1,
            StationStatus::Finished => 2,
        }
    }
}

/// Summary of an instruction's routing steps. Informational only; the
/// top-level status never reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoutingProgress {
    pub waiting: usize,
    pub in_process: usize,
    pub finished: usize,
    pub current_machine: Option<MachineId>,
    pub next_machine: Option<MachineId>,
}

impl RoutingProgress {
    pub fn from_steps(steps: &[RoutingStep]) -> Self {
        let mut progress = Self::default();
        for step in steps {
            match step.status {
                StationStatus::NotArrived => {
                    progress.waiting += 1;
                    progress.next_machine.get_or_insert(step.machine_id);
                }
                StationStatus::InProcess => {
                    progress.in_process += 1;
                    progress.current_machine.get_or_insert(step.machine_id);
                }
                StationStatus::Finished => progress.finished += 1,
            }
        }
        progress
    }

    pub const fn total(&self) -> usize {
        self.waiting + self.in_process + self.finished
    }

    pub fn summary(&self) -> String {
        if self.total() == 0 {
            return "-".to_owned();
        }
        format!("{}/{}", self.finished, self.total())
    }

    pub const fn all_finished(&self) -> bool {
        self.total() > 0 && self.finished == self.total()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusBreakdown {
    pub not_started: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub cancelled: usize,
}

impl StatusBreakdown {
    pub fn from_instructions<'a, I>(instructions: I) -> Self
    where
        I: IntoIterator<Item = &'a ProductionInstruction>,
    {
        let mut breakdown = Self::default();
        for instruction in instructions {
            match instruction.status() {
                RoutingStatus::NotStarted => breakdown.not_started += 1,
                RoutingStatus::InProgress => breakdown.in_progress += 1,
                RoutingStatus::Completed => breakdown.completed += 1,
                RoutingStatus::Cancelled => breakdown.cancelled += 1,
            }
        }
        breakdown
    }

    pub const fn count(&self, status: RoutingStatus) -> usize {
        match status {
            RoutingStatus::NotStarted => self.not_started,
            RoutingStatus::InProgress => self.in_progress,
            RoutingStatus::Completed => self.completed,
            RoutingStatus::Cancelled => self.cancelled,
        }
    }

    pub const fn total(&self) -> usize {
        self.not_started + self.in_progress + self.completed + self.cancelled
    }
}

/// A discrete request the console submits; the server decides the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionRequest {
    EnterMachine {
        instruction: ProductionInstructionId,
        machine: MachineId,
    },
    ExitMachine {
        instruction: ProductionInstructionId,
        machine: MachineId,
    },
    Complete {
        instruction: ProductionInstructionId,
    },
}

impl TransitionRequest {
    pub const fn instruction(&self) -> ProductionInstructionId {
        match self {
            Self::EnterMachine { instruction, .. }
            | Self::ExitMachine { instruction, .. }
            | Self::Complete { instruction } => *instruction,
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::EnterMachine { .. } => "enter machine",
            Self::ExitMachine { .. } => "exit machine",
            Self::Complete { .. } => "complete",
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.instruction().is_assigned() {
            bail!("production instruction is required -- select an instruction and retry");
        }
        match self {
            Self::EnterMachine { machine, .. } | Self::ExitMachine { machine, .. }
                if !machine.is_assigned() =>
            {
                bail!("machine is required -- choose a machine and retry");
            }
            _ => Ok(()),
        }
    }

    /// Enter the first waiting station of the routing.
    pub fn enter_next(instruction: &ProductionInstruction) -> Result<Self> {
        ensure_open(instruction)?;
        let progress = instruction.progress();
        if let Some(machine) = progress.current_machine {
            bail!(
                "instruction {} is still on machine {machine} -- exit it before entering the next station",
                instruction.id
            );
        }
        let Some(machine) = progress.next_machine else {
            bail!("instruction {} has no waiting stations", instruction.id);
        };
        Ok(Self::EnterMachine {
            instruction: instruction.id,
            machine,
        })
    }

    /// Exit the station currently in process.
    pub fn exit_current(instruction: &ProductionInstruction) -> Result<Self> {
        ensure_open(instruction)?;
        let Some(machine) = instruction.progress().current_machine else {
            bail!("instruction {} is not on any machine", instruction.id);
        };
        Ok(Self::ExitMachine {
            instruction: instruction.id,
            machine,
        })
    }

    /// Exit the station in process, or enter the next waiting one.
    pub fn for_next_step(instruction: &ProductionInstruction) -> Result<Self> {
        if instruction.progress().current_machine.is_some() {
            Self::exit_current(instruction)
        } else {
            Self::enter_next(instruction)
        }
    }

    pub fn complete(instruction: &ProductionInstruction) -> Result<Self> {
        ensure_open(instruction)?;
        Ok(Self::Complete {
            instruction: instruction.id,
        })
    }
}

fn ensure_open(instruction: &ProductionInstruction) -> Result<()> {
    match instruction.status() {
        RoutingStatus::Cancelled => bail!("instruction {} is cancelled", instruction.id),
        RoutingStatus::Completed => bail!("instruction {} is already completed", instruction.id),
        RoutingStatus::NotStarted | RoutingStatus::InProgress => Ok(()),
    }
}

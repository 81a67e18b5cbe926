use std::fmt;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MIN_WEIGHT: u8 = 1;
pub const MAX_WEIGHT: u8 = 9;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct TaskId(pub Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Relative workload of a task, always within 1..=9.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "u8", into = "u8")]
pub struct Weight(u8);

impl Weight {
    pub fn new(value: u8) -> anyhow::Result<Self> {
        if !(MIN_WEIGHT..=MAX_WEIGHT).contains(&value) {
            return Err(anyhow!(
                "weight must be between {MIN_WEIGHT} and {MAX_WEIGHT}, got {value}"
            ));
        }
        Ok(Self(value))
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let value: i64 = raw
            .trim()
            .parse()
            .map_err(|_| anyhow!("weight must be a number, got: {raw}"))?;
        let value = u8::try_from(value).map_err(|_| {
            anyhow!("weight must be between {MIN_WEIGHT} and {MAX_WEIGHT}, got {value}")
        })?;
        Self::new(value)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Weight {
    type Error = anyhow::Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Weight> for u8 {
    fn from(weight: Weight) -> Self {
        weight.0
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A recurring household task. Names are not required to be unique.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    #[serde(default)]
    pub id: TaskId,
    pub name: String,
    pub weight: Weight,
}

impl Task {
    pub fn new(name: String, weight: Weight) -> Self {
        Self {
            id: TaskId::new(),
            name,
            weight,
        }
    }
}

/// Partial update of a task; `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub weight: Option<Weight>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.weight.is_none()
    }
}

/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::device::DeviceStatus;
use crate::ids::{DeviceId, EventId, HistoryId};

/// An append-only status-history row: one per completed, non-errored
/// probe.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StatusHistory {
    pub id: HistoryId,
    pub device_id: DeviceId,
    pub status: DeviceStatus,
    pub latency_ms: f64,
    pub created_at: DateTime<Utc>,
}

/// An append-only event row.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Event {
    pub id: EventId,
    #[serde(default)]
    pub device_id: Option<DeviceId>,
    pub event_type: EventType,
    pub level: EventLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// An event as handed to the store, before an id and timestamp are
/// assigned.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NewEvent {
    #[serde(default)]
    pub device_id: Option<DeviceId>,
    pub event_type: EventType,
    pub level: EventLevel,
    pub message: String,
}

#[derive(
    Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy, Debug,
)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    DeviceOnline,
    DeviceOffline,
    PortUp,
    PortDown,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeviceOnline => write!(f, "device_online"),
            Self::DeviceOffline => write!(f, "device_offline"),
            Self::PortUp => write!(f, "port_up"),
            Self::PortDown => write!(f, "port_down"),
        }
    }
}

#[derive(
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Clone,
    Copy,
    Debug,
)]
#[serde(rename_all = "snake_case")]
pub enum EventLevel {
    Info,
    Warning,
    Error,
}

impl fmt::Display for EventLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

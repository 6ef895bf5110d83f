use std::fmt;

/// 规范化后的占用状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OccupancyStatus {
    Free,
    Occupied,
    Unknown,
}

impl OccupancyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OccupancyStatus::Free => "free",
            OccupancyStatus::Occupied => "occupied",
            OccupancyStatus::Unknown => "unknown",
        }
    }

    /// 严格解析（存储层读回、管理端修正）；无法识别时返回 None。
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "free" => Some(OccupancyStatus::Free),
            "occupied" => Some(OccupancyStatus::Occupied),
            "unknown" => Some(OccupancyStatus::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for OccupancyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 传感器类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SensorKind {
    #[default]
    Ultrasonic,
    Magnetic,
    Radar,
}

impl SensorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorKind::Ultrasonic => "ultrasonic",
            SensorKind::Magnetic => "magnetic",
            SensorKind::Radar => "radar",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ultrasonic" => Some(SensorKind::Ultrasonic),
            "magnetic" => Some(SensorKind::Magnetic),
            "radar" => Some(SensorKind::Radar),
            _ => None,
        }
    }
}

/// 车位在摄像头画面中的矩形区域（左上角 x1/y1，右下角 x2/y2）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpaceRegion {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

/// 事件指向的目标：直接指定车位，或通过传感器硬件 ID 间接指定。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventTarget {
    Space(String),
    Sensor(String),
}

impl EventTarget {
    /// 目标标识（车位 ID 或硬件 ID）。
    pub fn id(&self) -> &str {
        match self {
            EventTarget::Space(id) | EventTarget::Sensor(id) => id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            EventTarget::Space(_) => "space",
            EventTarget::Sensor(_) => "sensor",
        }
    }
}

/// 事件来源通道。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOrigin {
    Http,
    Bus,
}

impl EventOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventOrigin::Http => "http",
            EventOrigin::Bus => "bus",
        }
    }
}

/// 接入层原始状态事件（尚未规范化）。
#[derive(Debug, Clone)]
pub struct RawStatusEvent {
    pub target: EventTarget,
    pub status: String,
    pub origin: EventOrigin,
    pub received_at_ms: i64,
}

use serde::Serialize;
use serde_json::Value;

/// latest known state of one sensor node
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeRecord {
    /// unix timestamp (whole seconds) of the last accepted event, server clock
    pub last_update: u64,
    /// last reported state label (e.g. "Motion", "Vibration", "Idle")
    pub state: String,
    /// device-reported timestamp, display-only, never parsed by the hub
    pub time: String,
    /// cumulative PIR trigger count
    pub pir_hits: u64,
    /// cumulative vibration trigger count
    pub vib_hits: u64,
}

/// wire shape of the `data` object in /live.json
#[derive(Clone, Debug, Serialize)]
pub struct NodeData {
    pub state: String,
    pub time: String,
    #[serde(rename = "pirHits")]
    pub pir_hits: u64,
    #[serde(rename = "vibHits")]
    pub vib_hits: u64,
}

impl From<&NodeRecord> for NodeData {
    fn from(rec: &NodeRecord) -> Self {
        Self {
            state: rec.state.clone(),
            time: rec.time.clone(),
            pir_hits: rec.pir_hits,
            vib_hits: rec.vib_hits,
        }
    }
}

/// one decoded ingestion payload
///
/// devices send loose json; this is the strongly typed form after the
/// decode-with-defaults step in [`MotionEvent::from_json`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MotionEvent {
    pub node: String,
    pub state: String,
    pub time: String,
    /// explicit cumulative total, 0 = "not supplied"
    pub pir_hits: u64,
    /// explicit cumulative total, 0 = "not supplied"
    pub vib_hits: u64,
}

impl Default for MotionEvent {
    fn default() -> Self {
        Self {
            node: "Room-1".to_string(),
            state: "-".to_string(),
            time: "-".to_string(),
            pir_hits: 0,
            vib_hits: 0,
        }
    }
}

impl MotionEvent {
    /// decode a device payload, defaulting every missing or mistyped field
    ///
    /// the firmware side is untrusted and occasionally ships garbage (string
    /// counters, floats, nulls). none of that may turn into an error: a field
    /// that fails to coerce gets its default, same as an absent field.
    pub fn from_json(payload: &Value) -> Self {
        let d = Self::default();
        Self {
            node: string_or(payload.get("node"), &d.node),
            state: string_or(payload.get("state"), &d.state),
            time: string_or(payload.get("time"), &d.time),
            pir_hits: counter_or_zero(payload.get("pirHits")),
            vib_hits: counter_or_zero(payload.get("vibHits")),
        }
    }
}

fn string_or(v: Option<&Value>, default: &str) -> String {
    match v.and_then(Value::as_str) {
        Some(s) => s.to_string(),
        None => default.to_string(),
    }
}

/// coerce a counter field: non-negative integers pass through, everything
/// else (missing, null, string, float, negative) becomes 0
fn counter_or_zero(v: Option<&Value>) -> u64 {
    v.and_then(Value::as_u64).unwrap_or(0)
}

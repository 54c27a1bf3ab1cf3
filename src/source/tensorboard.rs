//! TensorBoard event logs.
//!
//! Event files hold TFRecord frames:
//!
//! ```text
//! u64 LE  payload length
//! u32 LE  masked CRC of the length   (not verified)
//! [u8]    payload: protobuf `Event`
//! u32 LE  masked CRC of the payload  (not verified)
//! ```
//!
//! Files are read incrementally. Each refresh resumes from the last complete
//! frame, so a frame that is still being written is picked up next time.

use std::collections::HashMap;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use prost::Message;
use tracing::debug;

use super::{is_event_file, list_sorted, Figure, Series, SourceError, ValueKind};
use crate::config::XAxisKind;

/// Protobuf messages of the event-log format (only the fields that carry scalars).
pub mod proto {
    /// One record of an event file.
    #[derive(Clone, PartialEq, prost::Message)]
    pub struct Event {
        /// Seconds since the Unix epoch.
        #[prost(double, tag = "1")]
        pub wall_time: f64,
        /// Global step.
        #[prost(int64, tag = "2")]
        pub step: i64,
        /// Logged values.
        #[prost(message, optional, tag = "5")]
        pub summary: Option<Summary>,
    }

    /// A set of tagged values.
    #[derive(Clone, PartialEq, prost::Message)]
    pub struct Summary {
        /// Values in this summary.
        #[prost(message, repeated, tag = "1")]
        pub value: Vec<SummaryValue>,
    }

    /// One tagged value.
    #[derive(Clone, PartialEq, prost::Message)]
    pub struct SummaryValue {
        /// Series name.
        #[prost(string, tag = "1")]
        pub tag: String,
        /// Legacy scalar payload.
        #[prost(float, optional, tag = "2")]
        pub simple_value: Option<f32>,
        /// Tensor payload used by newer writers.
        #[prost(message, optional, tag = "8")]
        pub tensor: Option<TensorProto>,
    }

    /// A serialized tensor.
    #[derive(Clone, PartialEq, prost::Message)]
    pub struct TensorProto {
        /// Element type ([`DT_FLOAT`] or [`DT_DOUBLE`] for scalars).
        #[prost(int32, tag = "1")]
        pub dtype: i32,
        /// Raw little-endian element bytes.
        #[prost(bytes = "vec", tag = "4")]
        pub tensor_content: Vec<u8>,
        /// Float elements.
        #[prost(float, repeated, tag = "5")]
        pub float_val: Vec<f32>,
        /// Double elements.
        #[prost(double, repeated, tag = "6")]
        pub double_val: Vec<f64>,
    }

    /// 32-bit float element type.
    pub const DT_FLOAT: i32 = 1;
    /// 64-bit float element type.
    pub const DT_DOUBLE: i32 = 2;
}

/// Frame header: length (8) + length CRC (4).
const HEADER_LEN: usize = 12;
/// Frame footer: payload CRC (4).
const FOOTER_LEN: usize = 4;

/// Encode one event as a TFRecord frame with zeroed CRC fields.
pub fn encode_record(event: &proto::Event) -> Vec<u8> {
    let payload = event.encode_to_vec();
    let len = u64::try_from(payload.len()).unwrap_or(u64::MAX);
    let mut frame = Vec::with_capacity(payload.len().saturating_add(HEADER_LEN + FOOTER_LEN));
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend_from_slice(&[0; 4]);
    frame.extend_from_slice(&payload);
    frame.extend_from_slice(&[0; 4]);
    frame
}

/// Scalar value of a summary entry, if it holds one.
fn scalar_of(value: &proto::SummaryValue) -> Option<f64> {
    if let Some(v) = value.simple_value {
        return Some(f64::from(v));
    }
    let tensor = value.tensor.as_ref()?;
    if let [v] = tensor.float_val.as_slice() {
        return Some(f64::from(*v));
    }
    if let [v] = tensor.double_val.as_slice() {
        return Some(*v);
    }
    match (tensor.dtype, tensor.tensor_content.as_slice()) {
        (proto::DT_FLOAT, bytes) => bytes
            .try_into()
            .ok()
            .map(|b: [u8; 4]| f64::from(f32::from_le_bytes(b))),
        (proto::DT_DOUBLE, bytes) => bytes.try_into().ok().map(f64::from_le_bytes),
        _ => None,
    }
}

/// Split complete frames off the front of `buf`.
///
/// Returns the payloads and the number of bytes consumed; a trailing partial
/// frame is left unconsumed.
fn split_frames(buf: &[u8]) -> (Vec<&[u8]>, usize) {
    let mut payloads = Vec::new();
    let mut pos = 0usize;
    loop {
        let Some(rest) = buf.get(pos..) else { break };
        let Some(len_bytes) = rest.get(..8) else { break };
        let Ok(len_bytes) = <[u8; 8]>::try_from(len_bytes) else {
            break;
        };
        let Ok(len) = usize::try_from(u64::from_le_bytes(len_bytes)) else {
            break;
        };
        let Some(end) = len.checked_add(HEADER_LEN + FOOTER_LEN) else {
            break;
        };
        let Some(frame) = rest.get(..end) else { break };
        if let Some(payload) = frame.get(HEADER_LEN..HEADER_LEN.saturating_add(len)) {
            payloads.push(payload);
        }
        pos = pos.saturating_add(end);
    }
    (payloads, pos)
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    wall_time: f64,
    step: i64,
    value: f64,
}

/// One event-log Figure: a single event file or a folder of them.
pub(crate) struct EventFigure {
    title: String,
    location: PathBuf,
    offsets: HashMap<PathBuf, u64>,
    names: Vec<String>,
    samples: HashMap<String, Vec<Sample>>,
    time_origin: Option<f64>,
}

impl EventFigure {
    fn event_files(&self) -> Result<Vec<PathBuf>, SourceError> {
        if self.location.is_file() {
            return Ok(vec![self.location.clone()]);
        }
        list_sorted(&self.location, |p| p.is_file() && is_event_file(p))
    }

    fn read_new_frames(&mut self, path: &Path) -> Result<(), SourceError> {
        let offset = self.offsets.get(path).copied().unwrap_or(0);
        let mut file = std::fs::File::open(path).map_err(|e| SourceError::io(path, e))?;
        let len = file
            .metadata()
            .map_err(|e| SourceError::io(path, e))?
            .len();
        if len <= offset {
            return Ok(());
        }
        file.seek(SeekFrom::Start(offset))
            .map_err(|e| SourceError::io(path, e))?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)
            .map_err(|e| SourceError::io(path, e))?;

        let (payloads, consumed) = split_frames(&buf);
        let mut added = 0usize;
        for payload in payloads {
            let event = match proto::Event::decode(payload) {
                Ok(event) => event,
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "skipping undecodable event");
                    continue;
                }
            };
            let Some(summary) = event.summary else {
                continue;
            };
            for value in &summary.value {
                let Some(scalar) = scalar_of(value) else {
                    continue;
                };
                if !self.samples.contains_key(&value.tag) {
                    self.names.push(value.tag.clone());
                }
                self.samples
                    .entry(value.tag.clone())
                    .or_default()
                    .push(Sample {
                        wall_time: event.wall_time,
                        step: event.step,
                        value: scalar,
                    });
                added = added.saturating_add(1);
            }
        }

        let consumed = u64::try_from(consumed).unwrap_or(0);
        self.offsets
            .insert(path.to_path_buf(), offset.saturating_add(consumed));
        debug!(path = %path.display(), added, "read event frames");
        Ok(())
    }

    /// Earliest wall time across every series, memoized until the next refresh.
    fn time_origin(&mut self) -> f64 {
        if let Some(origin) = self.time_origin {
            return origin;
        }
        let origin = self
            .samples
            .values()
            .flatten()
            .map(|s| s.wall_time)
            .fold(f64::INFINITY, f64::min);
        self.time_origin = Some(origin);
        origin
    }
}

/// Open an event file or a folder directly containing event files.
pub(crate) fn open(location: &Path) -> Result<Box<dyn Figure>, SourceError> {
    let mut figure = EventFigure {
        title: location.display().to_string(),
        location: location.to_path_buf(),
        offsets: HashMap::new(),
        names: Vec::new(),
        samples: HashMap::new(),
        time_origin: None,
    };
    figure.refresh()?;
    if figure.names.is_empty() {
        return Err(SourceError::Processing(format!(
            "cannot find any scalars within '{}'",
            figure.title
        )));
    }
    Ok(Box::new(figure))
}

impl Figure for EventFigure {
    fn title(&self) -> &str {
        &self.title
    }

    fn scalar_names(&self) -> &[String] {
        &self.names
    }

    fn refresh(&mut self) -> Result<(), SourceError> {
        for path in self.event_files()? {
            self.read_new_frames(&path)?;
        }
        self.time_origin = None;
        Ok(())
    }

    fn get_series(&mut self, x_axis: &XAxisKind, y: &str) -> Result<Series, SourceError> {
        if !self.samples.contains_key(y) {
            return Err(SourceError::Processing(format!("no series named '{y}'")));
        }
        let origin = match x_axis {
            XAxisKind::Step => None,
            XAxisKind::Time => Some(self.time_origin()),
            XAxisKind::Column(name) => {
                return Err(SourceError::UnsupportedXAxis {
                    x_axis: name.clone(),
                    reason: "event logs only support 'step' or 'time'".into(),
                })
            }
        };
        let samples = self.samples.get(y).map(Vec::as_slice).unwrap_or_default();

        #[allow(clippy::cast_precision_loss)] // steps are plotted as floats
        let x = samples
            .iter()
            .map(|s| match origin {
                Some(origin) => s.wall_time - origin,
                None => s.step as f64,
            })
            .collect();
        let y = samples.iter().map(|s| s.value).collect();
        Ok(Series::new(x, ValueKind::Numeric, y, ValueKind::Numeric))
    }
}

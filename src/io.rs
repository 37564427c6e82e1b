//! Safetensors I/O: recording loader and analysis dump.
//!
//! Recording container keys:
//!
//! | key            | dtype                | shape            |
//! |----------------|----------------------|------------------|
//! | `EEG`          | F32 / F64            | [C, T]           |
//! | `markers`      | I32 / I64 / F32 / F64| [T], [1, T], [T, 1] |
//! | `sampleRate`   | any numeric          | one element      |
//! | `channelNames` | U8                   | newline-separated UTF-8 |
use anyhow::{bail, ensure, Context, Result};
use ndarray::{Array, Array2, Dimension};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::recording::Recording;
use crate::Analysis;

// ── Low-level safetensors parser ─────────────────────────────────────────────

struct Tensor<'a> {
    dtype: String,
    shape: Vec<usize>,
    raw: &'a [u8],
}

fn parse(bytes: &[u8]) -> Result<HashMap<String, Tensor<'_>>> {
    ensure!(bytes.len() >= 8, "safetensors file too small");
    let n = u64::from_le_bytes(bytes[..8].try_into()?);
    let end = usize::try_from(n)
        .ok()
        .and_then(|n| n.checked_add(8))
        .with_context(|| format!("safetensors header length {n} overflows"))?;
    ensure!(bytes.len() >= end, "truncated safetensors header");
    let header: HashMap<String, serde_json::Value> =
        serde_json::from_slice(&bytes[8..end]).context("failed to parse safetensors header")?;
    let data = &bytes[end..];

    let mut out = HashMap::new();
    for (key, entry) in header {
        if key == "__metadata__" {
            continue;
        }
        let dtype = entry["dtype"]
            .as_str()
            .with_context(|| format!("{key}: missing dtype"))?
            .to_string();
        let shape = entry["shape"]
            .as_array()
            .with_context(|| format!("{key}: missing shape"))?
            .iter()
            .map(|v| v.as_u64().map(|d| d as usize))
            .collect::<Option<Vec<_>>>()
            .with_context(|| format!("{key}: bad shape"))?;
        let offsets = entry["data_offsets"]
            .as_array()
            .with_context(|| format!("{key}: missing data_offsets"))?;
        let (s, e) = match (offsets.first().and_then(|v| v.as_u64()), offsets.get(1).and_then(|v| v.as_u64())) {
            (Some(s), Some(e)) => (s as usize, e as usize),
            _ => bail!("{key}: bad data_offsets"),
        };
        ensure!(s <= e && e <= data.len(), "{key}: data_offsets {s}..{e} out of range");
        out.insert(key, Tensor { dtype, shape, raw: &data[s..e] });
    }
    Ok(out)
}

impl Tensor<'_> {
    /// All numeric dtypes widened to f64.
    fn to_f64(&self) -> Result<Vec<f64>> {
        let vals: Vec<f64> = match self.dtype.as_str() {
            "F32" => self.raw.chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64)
                .collect(),
            "F64" => self.raw.chunks_exact(8)
                .map(|b| f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
                .collect(),
            "I32" => self.raw.chunks_exact(4)
                .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64)
                .collect(),
            "I64" => self.raw.chunks_exact(8)
                .map(|b| i64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]) as f64)
                .collect(),
            "U8" => self.raw.iter().map(|&b| b as f64).collect(),
            other => bail!("unsupported dtype {other}"),
        };
        let expected: usize = self.shape.iter().product();
        ensure!(vals.len() == expected, "{} values for shape {:?}", vals.len(), self.shape);
        Ok(vals)
    }
}

fn get<'m, 'a>(tensors: &'m HashMap<String, Tensor<'a>>, key: &str) -> Result<&'m Tensor<'a>> {
    tensors.get(key).with_context(|| format!("missing '{key}' key"))
}

// ── Loader ───────────────────────────────────────────────────────────────────

/// Load a recording container (see module docs) and validate it.
pub fn load_recording(path: &Path) -> Result<Recording> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let tensors = parse(&bytes)?;

    let eeg = get(&tensors, "EEG")?;
    ensure!(
        eeg.dtype == "F32" || eeg.dtype == "F64",
        "'EEG' must be F32 or F64, got {}",
        eeg.dtype
    );
    ensure!(eeg.shape.len() == 2, "'EEG' must be 2-D, got shape {:?}", eeg.shape);
    let signal = Array2::from_shape_vec(
        (eeg.shape[0], eeg.shape[1]),
        eeg.to_f64().context("'EEG'")?.into_iter().map(|v| v as f32).collect(),
    )?;

    let mk = get(&tensors, "markers")?;
    ensure!(
        mk.shape.iter().filter(|&&d| d != 1).count() <= 1,
        "'markers' must be a vector, got shape {:?}",
        mk.shape
    );
    let markers: Vec<i32> = mk
        .to_f64()
        .context("'markers'")?
        .into_iter()
        .enumerate()
        .map(|(i, v)| {
            let r = v.round();
            ensure!(
                r.is_finite() && r >= i32::MIN as f64 && r <= i32::MAX as f64,
                "'markers'[{i}] = {v} is not a valid marker code"
            );
            Ok(r as i32)
        })
        .collect::<Result<_>>()?;

    let sr = get(&tensors, "sampleRate")?.to_f64().context("'sampleRate'")?;
    ensure!(sr.len() == 1, "'sampleRate' must hold one value, got {}", sr.len());

    let names = get(&tensors, "channelNames")?;
    ensure!(names.dtype == "U8", "'channelNames' must be U8, got {}", names.dtype);
    let channel_names: Vec<String> = std::str::from_utf8(names.raw)
        .context("'channelNames' is not UTF-8")?
        .split('\n')
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();

    let rec = Recording::new(signal, markers, channel_names, sr[0])
        .with_context(|| format!("loading {}", path.display()))?;
    Ok(rec)
}

// ── Generic safetensors builder ───────────────────────────────────────────────

/// Simple safetensors writer for F32, F64, I32 and U8 tensors plus string
/// metadata.
///
/// ```rust,no_run
/// use cluedo::io::StWriter;
/// use std::path::Path;
/// let mut w = StWriter::new();
/// w.add_f32("peaks", &[1.0f32, 2.0, 3.0], &[3, 1]);
/// w.add_metadata("labels", "a,b,c");
/// w.write(Path::new("/tmp/out.safetensors")).unwrap();
/// ```
#[derive(Default)]
pub struct StWriter {
    entries: Vec<(String, Vec<u8>, &'static str, Vec<usize>)>,
    metadata: BTreeMap<String, String>,
}

impl StWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_f32(&mut self, name: &str, data: &[f32], shape: &[usize]) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((name.to_string(), bytes, "F32", shape.to_vec()));
    }

    /// Any-dimensional f32 array, written in logical (row-major) order.
    pub fn add_f32_array<D: Dimension>(&mut self, name: &str, arr: &Array<f32, D>) {
        let data: Vec<f32> = arr.iter().copied().collect();
        self.add_f32(name, &data, arr.shape());
    }

    pub fn add_f64(&mut self, name: &str, data: &[f64], shape: &[usize]) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((name.to_string(), bytes, "F64", shape.to_vec()));
    }

    pub fn add_i32(&mut self, name: &str, data: &[i32], shape: &[usize]) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((name.to_string(), bytes, "I32", shape.to_vec()));
    }

    pub fn add_u8(&mut self, name: &str, data: &[u8]) {
        self.entries.push((name.to_string(), data.to_vec(), "U8", vec![data.len()]));
    }

    pub fn add_metadata(&mut self, key: &str, value: &str) {
        self.metadata.insert(key.to_string(), value.to_string());
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        use std::io::Write;
        let mut header_map = serde_json::Map::new();
        if !self.metadata.is_empty() {
            header_map.insert("__metadata__".into(), serde_json::to_value(&self.metadata)?);
        }
        let mut offset: usize = 0;
        for (name, data, dtype, shape) in &self.entries {
            header_map.insert(name.clone(), serde_json::json!({
                "dtype": dtype,
                "shape": shape,
                "data_offsets": [offset, offset + data.len()],
            }));
            offset += data.len();
        }
        let hdr_bytes = serde_json::to_vec(&header_map)?;
        let pad = (8 - hdr_bytes.len() % 8) % 8;
        let padded: Vec<u8> = hdr_bytes.into_iter()
            .chain(std::iter::repeat(b' ').take(pad))
            .collect();
        let mut f = std::fs::File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        f.write_all(&(padded.len() as u64).to_le_bytes())?;
        f.write_all(&padded)?;
        for (_, data, _, _) in &self.entries {
            f.write_all(data)?;
        }
        Ok(())
    }
}

// ── Writers ──────────────────────────────────────────────────────────────────

/// Write `rec` in the container format read by [`load_recording`].
pub fn write_recording(rec: &Recording, path: &Path) -> Result<()> {
    let mut w = StWriter::new();
    w.add_f32_array("EEG", &rec.signal);
    w.add_i32("markers", &rec.markers, &[rec.markers.len()]);
    w.add_f64("sampleRate", &[rec.sample_rate], &[1]);
    w.add_u8("channelNames", rec.channel_names.join("\n").as_bytes());
    w.write(path)
}

/// Dump the analysis for external plotting.
///
/// Per category `<name>`:
///   `stack_<name>`  [items, C, L]  mean epoch per item
///   `peaks_<name>`  [items, C]     peak amplitudes
///   `mean_<name>`   [items]        channel-averaged peaks
///   `votes_<name>`  [items]        electrode votes
/// Metadata: `labels_<name>` and `channels` as JSON string lists,
/// `epoch_samples`, `n_epochs`.
pub fn write_analysis(analysis: &Analysis, path: &Path) -> Result<()> {
    let mut w = StWriter::new();
    for ((stack, mp), vote) in analysis.stacks.iter().zip(&analysis.mean_peak).zip(&analysis.votes) {
        w.add_f32_array(&format!("stack_{}", stack.name), &stack.data);
        w.add_f32_array(&format!("peaks_{}", stack.name), &mp.peaks);
        w.add_f32_array(&format!("mean_{}", stack.name), &mp.scores);
        w.add_f32_array(&format!("votes_{}", stack.name), &vote.scores);
        w.add_metadata(&format!("labels_{}", stack.name), &serde_json::to_string(&stack.labels)?);
    }
    w.add_metadata("channels", &serde_json::to_string(&analysis.channel_names)?);
    w.add_metadata("epoch_samples", &analysis.epoch_samples.to_string());
    w.add_metadata("n_epochs", &analysis.n_epochs.to_string());
    w.write(path)
}

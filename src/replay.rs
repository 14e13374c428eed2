//! Replay Engine (spec §4.7).
//!
//! Downloads one capture file per applicable sub-provider for a given date,
//! merges them into a single timestamp-ordered stream (k-way merge via a
//! `BinaryHeap`), and emits events onto the same queue as live mode, either
//! at wall-clock pace or as fast as the consumer drains. Each capture frame
//! is the same on-the-wire binary layout as live (spec §4.3); on disk each
//! record is prefixed by a `u64` wall-clock timestamp and a `u32` frame
//! length (spec §4.7 step 2).

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;

use crate::constants::CLIENT_INFORMATION;
use crate::decode::{self, DecodedFrame};
use crate::error::{IntrinioError, Result};
use crate::provider::WireVariant;
use crate::queue::{FrameSender, RawFrame};
use crate::types::enums::Subprovider;
use crate::types::Event;

/// Parameters for one replay run (spec §4.7).
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    pub date: NaiveDate,
    pub subproviders: Vec<Subprovider>,
    pub with_simulated_delay: bool,
    pub write_csv: bool,
    pub csv_file_path: Option<String>,
    pub delete_file_when_done: bool,
    /// Template for the per-sub-provider capture-file endpoint; `{date}`
    /// and `{subprovider}` are substituted (spec §9 open question: "treat
    /// each as a configurable template").
    pub endpoint_template: String,
}

/// One file's remaining records plus bookkeeping needed to refill the
/// merge heap from the same file a popped record came from.
struct CaptureFile {
    records: std::vec::IntoIter<(u64, Vec<u8>)>,
    path: PathBuf,
}

/// A heap entry: timestamp, frame bytes, and which file it came from so
/// the merge can pull that file's next record (k-way merge, spec §4.7
/// step 3).
struct HeapEntry {
    timestamp_ms: u64,
    frame: Vec<u8>,
    file_index: usize,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.timestamp_ms == other.timestamp_ms
    }
}
impl Eq for HeapEntry {}
impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.timestamp_ms.cmp(&other.timestamp_ms)
    }
}

/// Downloads, merges, and emits historical capture files (spec §4.7).
pub struct ReplayEngine {
    http: reqwest::Client,
    api_key: String,
}

impl ReplayEngine {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
        }
    }

    /// Run one full replay: download each sub-provider's file, merge by
    /// timestamp, emit to `frame_tx`. Returns once every file reaches EOF.
    pub async fn run(
        &self,
        cfg: &ReplayConfig,
        wire_variant: WireVariant,
        frame_tx: &FrameSender,
    ) -> Result<()> {
        let mut files = Vec::new();
        for &subprovider in &cfg.subproviders {
            match self.download(cfg, subprovider).await? {
                Some(path) => {
                    let records = Self::read_capture_file(&path)?;
                    files.push(CaptureFile {
                        records: records.into_iter(),
                        path,
                    });
                }
                None => {
                    tracing::info!(?subprovider, "no capture file for sub-provider, skipping");
                }
            }
        }

        let mut heap: BinaryHeap<Reverse<HeapEntry>> = BinaryHeap::new();
        for (index, file) in files.iter_mut().enumerate() {
            if let Some((timestamp_ms, frame)) = file.records.next() {
                heap.push(Reverse(HeapEntry {
                    timestamp_ms,
                    frame,
                    file_index: index,
                }));
            }
        }

        let mut csv_writer = match (cfg.write_csv, &cfg.csv_file_path) {
            (true, Some(path)) => Some(CsvDump::create(path)?),
            _ => None,
        };

        let mut reference: Option<(u64, std::time::Instant)> = None;

        while let Some(Reverse(entry)) = heap.pop() {
            if cfg.with_simulated_delay {
                self.pace(&mut reference, entry.timestamp_ms).await;
            }

            let DecodedFrame { events, .. } = decode::decode_frame(wire_variant, &entry.frame);
            if let Some(writer) = csv_writer.as_mut() {
                for event in &events {
                    writer.write_event(event)?;
                }
            }
            frame_tx.try_send(RawFrame::Binary(entry.frame)).await;

            if let Some((timestamp_ms, frame)) = files[entry.file_index].records.next() {
                heap.push(Reverse(HeapEntry {
                    timestamp_ms,
                    frame,
                    file_index: entry.file_index,
                }));
            }
        }

        if let Some(writer) = csv_writer.as_mut() {
            writer.flush()?;
        }

        if cfg.delete_file_when_done {
            for file in &files {
                let _ = std::fs::remove_file(&file.path);
            }
        }

        Ok(())
    }

    /// Sleep until wall-clock catches up to `timestamp_ms`, using the
    /// first-seen record as the reference offset (spec §4.7 step 4).
    async fn pace(&self, reference: &mut Option<(u64, std::time::Instant)>, timestamp_ms: u64) {
        let (ref_ts, ref_instant) =
            *reference.get_or_insert_with(|| (timestamp_ms, std::time::Instant::now()));
        let target = ref_instant + Duration::from_millis(timestamp_ms.saturating_sub(ref_ts));
        let now = std::time::Instant::now();
        if target > now {
            tokio::time::sleep(target - now).await;
        }
    }

    /// `GET` the capture-file endpoint for `subprovider`, which hands back a
    /// presigned URL for the actual file rather than the file itself, then
    /// `GET` that URL for the real bytes and download them to a temp file.
    /// `404` on the first request means "no file for this sub-provider
    /// today" (spec §4.7 step 1); other failures are fatal.
    async fn download(&self, cfg: &ReplayConfig, subprovider: Subprovider) -> Result<Option<PathBuf>> {
        let url = cfg
            .endpoint_template
            .replace("{date}", &cfg.date.format("%Y-%m-%d").to_string())
            .replace("{subprovider}", &format!("{subprovider:?}"));

        let resp = self
            .http
            .get(&url)
            .header("Client-Information", CLIENT_INFORMATION)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| IntrinioError::TransientNetwork(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(IntrinioError::TransientNetwork(format!(
                "replay download failed: HTTP {}",
                resp.status()
            )));
        }

        // The first response is the presigned URL itself, not the capture
        // file — plain text, same as `AuthClient::try_fetch`'s token body.
        let presigned_url = resp
            .text()
            .await
            .map_err(|e| IntrinioError::TransientNetwork(e.to_string()))?
            .trim()
            .trim_matches('"')
            .to_owned();

        let data_resp = self
            .http
            .get(&presigned_url)
            .send()
            .await
            .map_err(|e| IntrinioError::TransientNetwork(e.to_string()))?;
        if !data_resp.status().is_success() {
            return Err(IntrinioError::TransientNetwork(format!(
                "replay capture download failed: HTTP {}",
                data_resp.status()
            )));
        }

        let bytes = data_resp
            .bytes()
            .await
            .map_err(|e| IntrinioError::TransientNetwork(e.to_string()))?;

        let mut tmp = tempfile::Builder::new()
            .prefix(&format!("intrinio-replay-{subprovider:?}-"))
            .suffix(".bin")
            .tempfile()?;
        tmp.write_all(&bytes)?;
        let (_, path) = tmp.keep().map_err(|e| IntrinioError::Io(e.error))?;
        Ok(Some(path))
    }

    /// Parse a capture file into `(timestamp_ms, frame_bytes)` pairs. A
    /// trailing record whose declared length runs past EOF is silently
    /// dropped rather than treated as fatal — capture files are append-only
    /// snapshots that may be read mid-write.
    fn read_capture_file(path: &Path) -> Result<Vec<(u64, Vec<u8>)>> {
        let bytes = std::fs::read(path)?;
        let mut out = Vec::new();
        let mut pos = 0usize;
        while pos + 12 <= bytes.len() {
            let ts = u64::from_le_bytes(bytes[pos..pos + 8].try_into().unwrap());
            let len = u32::from_le_bytes(bytes[pos + 8..pos + 12].try_into().unwrap()) as usize;
            pos += 12;
            if pos + len > bytes.len() {
                break;
            }
            out.push((ts, bytes[pos..pos + len].to_vec()));
            pos += len;
        }
        Ok(out)
    }
}

/// Appends replay events to a CSV file per the documented schema (spec §6):
/// `type,symbol,price,size,timestamp,extra1,extra2,extra3,extra4`.
struct CsvDump {
    writer: csv::Writer<std::fs::File>,
}

impl CsvDump {
    fn create(path: &str) -> Result<Self> {
        let file_existed = Path::new(path).exists();
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if !file_existed {
            writer.write_record([
                "type", "symbol", "price", "size", "timestamp", "extra1", "extra2", "extra3",
                "extra4",
            ])?;
        }
        Ok(Self { writer })
    }

    fn write_event(&mut self, event: &Event) -> Result<()> {
        match event {
            Event::EquitiesTrade(t) => self.writer.write_record([
                "EquitiesTrade",
                &t.symbol,
                &t.price.to_string(),
                &t.size.to_string(),
                &t.timestamp.to_string(),
                &format!("{:?}", t.subprovider),
                &t.market_center.to_string(),
                &t.condition.to_string(),
                &t.total_volume.to_string(),
            ])?,
            Event::EquitiesQuote(q) => self.writer.write_record([
                "EquitiesQuote",
                &q.symbol,
                &q.price.to_string(),
                &q.size.to_string(),
                &q.timestamp.to_string(),
                &format!("{:?}", q.quote_type),
                &format!("{:?}", q.subprovider),
                &q.market_center.to_string(),
                &q.condition.to_string(),
            ])?,
            Event::OptionsTrade(t) => self.writer.write_record([
                "OptionsTrade",
                &t.contract,
                &t.price.to_string(),
                &t.size.to_string(),
                &t.timestamp.to_string(),
                &t.underlying_price_at_execution.to_string(),
                &t.ask_at_execution.to_string(),
                &t.bid_at_execution.to_string(),
                &format!(
                    "\"{},{},{},{}\"",
                    t.qualifiers.0, t.qualifiers.1, t.qualifiers.2, t.qualifiers.3
                ),
            ])?,
            Event::OptionsQuote(q) => self.writer.write_record([
                "OptionsQuote",
                &q.contract,
                &q.ask_price.to_string(),
                &q.ask_size.to_string(),
                &q.timestamp.to_string(),
                &q.bid_price.to_string(),
                &q.bid_size.to_string(),
                "",
                "",
            ])?,
            Event::OptionsRefresh(r) => self.writer.write_record([
                "OptionsRefresh",
                &r.contract,
                &r.open.to_string(),
                &r.open_interest.to_string(),
                "",
                &r.close.to_string(),
                &r.high.to_string(),
                &r.low.to_string(),
                "",
            ])?,
            Event::OptionsUnusualActivity(u) => self.writer.write_record([
                "OptionsUnusualActivity",
                &u.contract,
                &u.average_price.to_string(),
                &u.total_size.to_string(),
                &u.timestamp.to_string(),
                &format!("{:?}", u.activity_type),
                &format!("{:?}", u.sentiment),
                &u.total_value.to_string(),
                "",
            ])?,
            Event::Raw(_) | Event::Decode(_) | Event::Terminal(_) => {}
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

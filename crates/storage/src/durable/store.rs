//! DurableStore: segment-file log store
//!
//! Every insert is framed and appended to the newest segment before it
//! becomes visible to queries. All records are mirrored in memory with
//! secondary indexes, so queries never touch disk.
//!
//! Lock order is writer then state. Lock waits honour the caller's
//! [`OpContext`]; once a frame has reached the segment the insert runs to
//! completion.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Mutex, MutexGuard, RwLock, RwLockReadGuard};
use tracing::{debug, info, trace};
use uuid::Uuid;

use logbook_core::{Error, LogQuery, LogRecord, LogStore, OpContext, QueryPage, Result};

use super::config::DurableConfig;
use super::filter::CompiledQuery;
use super::format::encode_frame;
use super::index::RecordIndex;
use super::reader::recover;
use super::writer::{SegmentWriter, WriterCounters};
use crate::matcher::page_window;

/// Longest single lock wait before the context is re-checked
const LOCK_POLL: Duration = Duration::from_millis(10);

/// Records scanned between context checks
const SCAN_CHECK_INTERVAL: usize = 1024;

#[derive(Debug, Default)]
struct State {
    records: Vec<LogRecord>,
    index: RecordIndex,
}

/// Persistent log store
#[derive(Debug)]
pub struct DurableStore {
    config: DurableConfig,
    store_id: Uuid,
    state: RwLock<State>,
    /// `None` once closed
    writer: Mutex<Option<SegmentWriter>>,
    closed: AtomicBool,
}

impl DurableStore {
    /// Open or create a store in `config.data_dir`.
    ///
    /// Replays existing segments, truncating a torn tail left by a crash.
    pub fn open(config: DurableConfig) -> Result<Self> {
        config.validate()?;
        std::fs::create_dir_all(&config.data_dir)?;

        let recovered = recover(&config.data_dir)?;
        let store_id = match recovered.store_id {
            Some(bytes) => Uuid::from_bytes(bytes),
            None => Uuid::new_v4(),
        };
        let writer = SegmentWriter::open(&config, *store_id.as_bytes(), recovered.last_segment)?;

        let index = RecordIndex::build(&recovered.records);
        info!(
            data_dir = %config.data_dir.display(),
            store_id = %store_id,
            records = recovered.records.len(),
            durability = %config.durability,
            "Durable store opened"
        );
        if recovered.truncated_bytes > 0 || recovered.skipped_frames > 0 {
            debug!(
                truncated_bytes = recovered.truncated_bytes,
                skipped_frames = recovered.skipped_frames,
                "Recovery repaired segment data"
            );
        }

        Ok(DurableStore {
            config,
            store_id,
            state: RwLock::new(State {
                records: recovered.records,
                index,
            }),
            writer: Mutex::new(Some(writer)),
            closed: AtomicBool::new(false),
        })
    }

    /// Open with defaults overlaid by `<data_dir>/logbook.toml`
    pub fn open_dir(data_dir: impl Into<std::path::PathBuf>) -> Result<Self> {
        Self::open(DurableConfig::from_data_dir(data_dir)?)
    }

    /// Configuration in use
    pub fn config(&self) -> &DurableConfig {
        &self.config
    }

    /// Identifier shared by all segments of this store
    pub fn store_id(&self) -> Uuid {
        self.store_id
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.state.read().records.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writer counters; `None` once closed
    pub fn writer_counters(&self) -> Option<WriterCounters> {
        self.writer.lock().as_ref().map(SegmentWriter::counters)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::Closed);
        }
        Ok(())
    }

    fn lock_writer(&self, ctx: &OpContext) -> Result<MutexGuard<'_, Option<SegmentWriter>>> {
        wait_for(ctx, |until| self.writer.try_lock_until(until))
    }

    fn read_state(&self, ctx: &OpContext) -> Result<RwLockReadGuard<'_, State>> {
        wait_for(ctx, |until| self.state.try_read_until(until))
    }
}

/// Retry `acquire` in short slices until it succeeds or `ctx` gives up
fn wait_for<G>(ctx: &OpContext, mut acquire: impl FnMut(Instant) -> Option<G>) -> Result<G> {
    loop {
        ctx.check()?;
        let slice = ctx.remaining().map_or(LOCK_POLL, |left| left.min(LOCK_POLL));
        if let Some(guard) = acquire(Instant::now() + slice) {
            return Ok(guard);
        }
    }
}

/// Positions of records matching `compiled`, in insertion order
fn scan(
    ctx: &OpContext,
    state: &State,
    query: &LogQuery,
    compiled: &CompiledQuery,
) -> Result<Vec<usize>> {
    let candidates: Box<dyn Iterator<Item = usize>> =
        match state.index.candidates(query, compiled.search()) {
            Some(positions) => Box::new(positions.into_iter()),
            None => Box::new(0..state.records.len()),
        };

    let mut matched = Vec::new();
    for (scanned, position) in candidates.enumerate() {
        if scanned % SCAN_CHECK_INTERVAL == SCAN_CHECK_INTERVAL - 1 {
            ctx.check()?;
        }
        if compiled.matches(&state.records[position]) {
            matched.push(position);
        }
    }
    Ok(matched)
}

impl LogStore for DurableStore {
    fn insert(&self, ctx: &OpContext, record: LogRecord) -> Result<()> {
        ctx.check()?;
        self.ensure_open()?;
        let frame = encode_frame(&record).map_err(|e| Error::Serialization(e.to_string()))?;

        let mut writer = self.lock_writer(ctx)?;
        let writer = writer.as_mut().ok_or(Error::Closed)?;
        writer.append(&frame)?;

        let mut state = self.state.write();
        let position = state.records.len();
        state.index.insert(position, &record);
        state.records.push(record);
        Ok(())
    }

    fn query(&self, ctx: &OpContext, query: &mut LogQuery) -> Result<QueryPage> {
        ctx.check()?;
        self.ensure_open()?;
        let window = query.resolve_pagination();
        let compiled = if query.is_unfiltered() {
            None
        } else {
            Some(CompiledQuery::compile(query)?)
        };

        let state = self.read_state(ctx)?;
        let mut matched = match &compiled {
            Some(compiled) => scan(ctx, &state, query, compiled)?,
            None => (0..state.records.len()).collect(),
        };

        // Newest first; the stable sort keeps insertion order on ties
        matched.sort_by(|a, b| state.records[*b].timestamp.cmp(&state.records[*a].timestamp));

        let page: Vec<LogRecord> = page_window(&matched, window)
            .iter()
            .map(|&position| state.records[position].clone())
            .collect();

        trace!(
            matched = matched.len(),
            returned = page.len(),
            page = window.page,
            "durable query"
        );
        Ok(QueryPage::new(page))
    }

    fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        let writer = self.writer.lock().take();
        if let Some(writer) = writer {
            writer.close()?;
            info!(data_dir = %self.config.data_dir.display(), "Durable store closed");
        }
        Ok(())
    }
}

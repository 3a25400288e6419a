use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::{MappingEvent, StoreState};
use crate::config::MapperConfig;
use crate::error::{MappingError, Result};
use crate::index::{invert, KeyCollision, KeyIndex, ModelConnection, ModelIndex, ModelIndexBuilder};
use crate::model::{BuildingRecord, RecordTable, SheetData};
use crate::sheet::{self, GoogleSheetSource, MergeReport, SheetSource};
use crate::telemetry::{self, HttpTelemetrySource, TelemetrySource};

/// An immutable, fully built record table as readers see it.
#[derive(Debug, Clone, Default)]
pub struct RecordSnapshot {
    seq: u64,
    refreshed_at: Option<DateTime<Utc>>,
    table: RecordTable,
}

impl RecordSnapshot {
    /// Sequence number of the refresh that produced this table (0 before
    /// the first successful refresh)
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    pub fn get(&self, key: &str) -> Option<&Arc<BuildingRecord>> {
        self.table.get(key)
    }

    pub fn table(&self) -> &RecordTable {
        &self.table
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Published { seq: u64, records: usize },
    /// A refresh issued later had already been published
    Stale { seq: u64 },
}

#[derive(Debug, Default)]
struct IndexTables {
    model: ModelIndex,
    keys: KeyIndex,
}

pub struct MappingStore {
    connection: Arc<dyn ModelConnection>,
    telemetry: Arc<dyn TelemetrySource>,
    sheet: Option<Arc<dyn SheetSource>>,
    builder: ModelIndexBuilder,
    pub(crate) refresh_interval: Duration,
    state: Mutex<StoreState>,
    index: RwLock<Arc<IndexTables>>,
    records: RwLock<Arc<RecordSnapshot>>,
    /// Last known spreadsheet rows by key, re-applied to every new table
    sheet_rows: RwLock<Arc<HashMap<String, SheetData>>>,
    issued: AtomicU64,
    in_flight: AtomicUsize,
    /// Id of the loop currently holding the store (0 when none)
    pub(crate) loop_owner: AtomicU64,
    pub(crate) loop_ids: AtomicU64,
    events: broadcast::Sender<MappingEvent>,
}

fn read<T>(lock: &RwLock<Arc<T>>) -> Arc<T> {
    Arc::clone(&lock.read().unwrap_or_else(PoisonError::into_inner))
}

fn lock_state(state: &Mutex<StoreState>) -> MutexGuard<'_, StoreState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MappingStore {
    pub fn new(connection: Arc<dyn ModelConnection>, telemetry: Arc<dyn TelemetrySource>) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            connection,
            telemetry,
            sheet: None,
            builder: ModelIndexBuilder::default(),
            refresh_interval: MapperConfig::default().refresh_interval,
            state: Mutex::new(StoreState::Uninitialized),
            index: RwLock::new(Arc::new(IndexTables::default())),
            records: RwLock::new(Arc::new(RecordSnapshot::default())),
            sheet_rows: RwLock::new(Arc::new(HashMap::new())),
            issued: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            loop_owner: AtomicU64::new(0),
            loop_ids: AtomicU64::new(0),
            events,
        }
    }

    /// Store wired to the HTTP telemetry feed (and spreadsheet, if
    /// configured) described by `config`.
    pub fn from_config(config: &MapperConfig, connection: Arc<dyn ModelConnection>) -> Result<Self> {
        config.validate()?;

        let telemetry: Arc<dyn TelemetrySource> = match config.request_timeout {
            Some(timeout) => Arc::new(HttpTelemetrySource::with_timeout(&config.telemetry_url, timeout)?),
            None => Arc::new(HttpTelemetrySource::new(&config.telemetry_url)),
        };

        let mut store = Self::new(connection, telemetry)
            .with_refresh_interval(config.refresh_interval)
            .with_model_query(&config.model_query);

        if let Some(sheet) = &config.sheet {
            let source = GoogleSheetSource::new(&sheet.spreadsheet_id, &sheet.api_key)
                .with_range(&sheet.range)
                .with_base_url(&sheet.base_url);
            store = store.with_sheet_source(Arc::new(source));
        }

        Ok(store)
    }

    pub fn with_sheet_source(mut self, source: Arc<dyn SheetSource>) -> Self {
        self.sheet = Some(source);
        self
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn with_model_query(mut self, query: impl Into<String>) -> Self {
        self.builder = ModelIndexBuilder::new(query);
        self
    }

    pub fn state(&self) -> StoreState {
        let state = *lock_state(&self.state);
        if state == StoreState::Ready && self.in_flight.load(Ordering::SeqCst) > 0 {
            StoreState::Refreshing
        } else {
            state
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MappingEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: MappingEvent) {
        let _ = self.events.send(event);
    }

    /// Build the model index and run the first refresh.
    ///
    /// A failed index build leaves the store uninitialized and is returned.
    /// A failed first telemetry fetch is logged; the store is ready with an
    /// empty table and the next cycle retries.
    pub async fn init(&self) -> Result<()> {
        {
            let mut state = lock_state(&self.state);
            match *state {
                StoreState::Uninitialized => *state = StoreState::Building,
                StoreState::Building => return Err(MappingError::NotReady(StoreState::Building.as_str())),
                StoreState::Ready | StoreState::Refreshing => {
                    debug!("Mapping store already initialized");
                    return Ok(());
                }
            }
        }

        info!("Building model index");
        let model = match self.builder.build(self.connection.as_ref()).await {
            Ok(model) => model,
            Err(e) => {
                *lock_state(&self.state) = StoreState::Uninitialized;
                warn!("Model index build failed: {}", e);
                return Err(e);
            }
        };

        let keys = invert(&model);
        let (buildings, collisions) = (model.len(), keys.collisions().len());
        *self.index.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(IndexTables { model, keys });
        *lock_state(&self.state) = StoreState::Ready;

        info!("Model index ready: {} buildings, {} key collisions", buildings, collisions);
        self.emit(MappingEvent::IndexBuilt { buildings, collisions });

        if let Err(e) = self.refresh().await {
            warn!("Initial telemetry refresh failed, retrying on the next tick: {}", e);
        }
        Ok(())
    }

    /// Run one refresh cycle: fetch telemetry into a scratch table, publish
    /// it, then merge fresh spreadsheet rows into it.
    ///
    /// On failure the published table is left untouched.
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        let state = *lock_state(&self.state);
        if state != StoreState::Ready {
            return Err(MappingError::NotReady(state.as_str()));
        }

        let _in_flight = InFlight::enter(&self.in_flight);
        let seq = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let index = read(&self.index);

        let mut table = match telemetry::fetch(self.telemetry.as_ref(), &index.keys).await {
            Ok(table) => table,
            Err(e) => {
                warn!("Refresh {} abandoned: {}", seq, e);
                self.emit(MappingEvent::RefreshFailed {
                    seq,
                    error: e.to_string(),
                });
                return Err(e);
            }
        };

        let cached: Vec<SheetData> = read(&self.sheet_rows).values().cloned().collect();
        if !cached.is_empty() {
            table = sheet::merge(&table, &cached).0;
        }

        let records = table.len();
        if !self.publish(seq, table) {
            debug!("Discarding refresh {}: a later refresh is already published", seq);
            return Ok(RefreshOutcome::Stale { seq });
        }

        debug!("Refresh {} published {} records", seq, records);
        self.emit(MappingEvent::RecordsRefreshed { seq, records });

        if let Some(source) = &self.sheet {
            match source.rows().await {
                Ok(rows) => {
                    self.merge_sheet_rows(&rows);
                }
                Err(e) => warn!("Spreadsheet fetch failed, keeping cached rows: {}", e),
            }
        }

        Ok(RefreshOutcome::Published { seq, records })
    }

    fn publish(&self, seq: u64, table: RecordTable) -> bool {
        let mut current = self.records.write().unwrap_or_else(PoisonError::into_inner);
        if seq < current.seq {
            return false;
        }
        *current = Arc::new(RecordSnapshot {
            seq,
            refreshed_at: Some(Utc::now()),
            table,
        });
        true
    }

    /// Merge a raw spreadsheet grid (header row first). The parsed rows are
    /// added to the cached rows re-applied on later refreshes, replacing any
    /// cached row with the same key.
    pub fn merge_sheet_rows(&self, rows: &[Vec<String>]) -> MergeReport {
        self.merge_sheet_data(&sheet::parse_rows(rows))
    }

    /// Merge individual late-arriving spreadsheet records. Keys without a
    /// building record are skipped but stay cached for later tables.
    pub fn merge_sheet_data(&self, rows: &[SheetData]) -> MergeReport {
        self.cache_sheet_rows(rows);
        self.apply_sheet_data(rows)
    }

    fn cache_sheet_rows(&self, rows: &[SheetData]) {
        let mut guard = self.sheet_rows.write().unwrap_or_else(PoisonError::into_inner);
        let cache = Arc::make_mut(&mut *guard);
        for row in rows {
            cache.insert(row.matching_key.clone(), row.clone());
        }
    }

    fn apply_sheet_data(&self, rows: &[SheetData]) -> MergeReport {
        loop {
            let base = read(&self.records);
            let (table, report) = sheet::merge(base.table(), rows);

            let mut current = self.records.write().unwrap_or_else(PoisonError::into_inner);
            if !Arc::ptr_eq(&*current, &base) {
                // a refresh landed while merging
                continue;
            }
            *current = Arc::new(RecordSnapshot {
                seq: base.seq,
                refreshed_at: base.refreshed_at,
                table,
            });
            drop(current);

            self.emit(MappingEvent::SheetMerged {
                matched: report.matched,
                skipped: report.skipped,
            });
            return report;
        }
    }

    // ── reads ────────────────────────────────────────────────────────────

    /// The currently published table
    pub fn snapshot(&self) -> Arc<RecordSnapshot> {
        read(&self.records)
    }

    /// All records, ordered by matching key
    pub fn records(&self) -> Vec<Arc<BuildingRecord>> {
        let snapshot = self.snapshot();
        let mut records: Vec<_> = snapshot.table.values().cloned().collect();
        records.sort_by(|a, b| a.matching_key().cmp(b.matching_key()));
        records
    }

    pub fn by_key(&self, key: &str) -> Option<Arc<BuildingRecord>> {
        self.snapshot().get(key).cloned()
    }

    pub fn by_model_id(&self, model_id: &str) -> Option<Arc<BuildingRecord>> {
        let index = read(&self.index);
        let key = index.model.get(model_id)?;
        self.snapshot().get(key).cloned()
    }

    /// One entry per id, in input order, read from a single snapshot
    pub fn by_model_ids<I, S>(&self, model_ids: I) -> Vec<Option<Arc<BuildingRecord>>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let index = read(&self.index);
        let snapshot = self.snapshot();
        model_ids
            .into_iter()
            .map(|id| {
                index
                    .model
                    .get(id.as_ref())
                    .and_then(|key| snapshot.get(key).cloned())
            })
            .collect()
    }

    pub fn key_for_model_id(&self, model_id: &str) -> Option<String> {
        read(&self.index).model.get(model_id).map(str::to_string)
    }

    pub fn model_id_for_key(&self, key: &str) -> Option<String> {
        read(&self.index).keys.get(key).map(str::to_string)
    }

    /// Keys claimed by more than one model element during the index build
    pub fn key_collisions(&self) -> Vec<KeyCollision> {
        read(&self.index).keys.collisions().to_vec()
    }

    /// Records whose name (or `"name. year"` text, when not exact) matches
    /// the query, ordered by matching key
    pub fn search(&self, query: &str, exact: bool) -> Vec<Arc<BuildingRecord>> {
        self.records()
            .into_iter()
            .filter(|record| record.matches_query(query, exact))
            .collect()
    }
}

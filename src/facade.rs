//! Uniform access to news, prompts, sheets, slides, audio, release info and
//! ads, over either the content API or local storage.
//!
//! Every operation starts by reading the persisted mode flag, then asks the
//! [`FallbackPolicy`] where to go and what to do when the API lets it down.
//! Remote futures are only polled when the policy routes to the API, so in
//! `local` mode nothing touches the network.
//!
//! Callers see errors in exactly two places: [`DataAccess::save_sheet_remote`]
//! and the validation of ad/sheet edits. Everything else degrades to local or
//! seed data.

use crate::api::{RemoteService, paths};
use crate::error::ConsoleError;
use crate::models::{
    AdEntry, AudioFile, DataMode, HealthStatus, NewsItem, NewsUpdate, PromptSet, RecordId,
    ReleaseInfo, SaveAck, SheetCollection, SheetTable, Slide, Snapshot,
};
use crate::policy::{Backend, FallbackPolicy, Operation, Recovery};
use crate::seed;
use crate::sheets::{ADS_SHEET, ads_table};
use crate::store::{LocalStore, Storage, keys};
use reqwest::Method;
use serde::de::Error as _;
use serde_json::Value;
use std::collections::HashSet;
use std::future::Future;
use tracing::{debug, error, info, instrument, warn};

/// The data-access facade.
#[derive(Debug)]
pub struct DataAccess<R, S> {
    remote: R,
    local: LocalStore<S>,
    default_mode: DataMode,
    policy: FallbackPolicy,
}

impl<R: RemoteService, S: Storage> DataAccess<R, S> {
    pub fn new(remote: R, storage: S, default_mode: DataMode) -> Self {
        Self {
            remote,
            local: LocalStore::new(storage),
            default_mode,
            policy: FallbackPolicy,
        }
    }

    /// Persisted mode, or the configured default when none is stored.
    pub fn mode(&self) -> DataMode {
        match self.local.read_raw(keys::DATA_MODE).as_deref().map(str::trim) {
            Some("api") => DataMode::Api,
            Some("local") => DataMode::Local,
            _ => self.default_mode,
        }
    }

    /// Persist the mode flag. Touches no other key.
    pub fn set_mode(&self, mode: DataMode) {
        info!(%mode, "Switching data mode");
        self.local.write_raw(keys::DATA_MODE, mode.as_str());
    }

    /// Remote value for absorbing operations, or `None` when local data should
    /// be used instead (routed locally, or the API failed).
    async fn attempt<T, F>(&self, op: Operation, resource: &str, remote: F) -> Option<T>
    where
        F: Future<Output = Result<T, ConsoleError>>,
    {
        debug_assert_eq!(self.policy.on_remote_failure(op), Recovery::UseLocal);
        let mode = self.mode();
        if self.policy.route(mode, op) == Backend::Local {
            debug!(resource, %mode, "Serving from local storage");
            return None;
        }
        match remote.await {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(resource, error = %e, "API unavailable; falling back to local data");
                None
            }
        }
    }

    /// Remote-only writes: the policy routes them to the API in every mode and
    /// surfaces every failure, so there is no local branch to take.
    async fn remote_only<T, F>(&self, resource: &str, remote: F) -> Result<T, ConsoleError>
    where
        F: Future<Output = Result<T, ConsoleError>>,
    {
        let op = Operation::RemoteOnlyWrite;
        debug_assert_eq!(self.policy.route(self.mode(), op), Backend::Remote);
        debug_assert_eq!(self.policy.on_remote_failure(op), Recovery::Surface);
        remote.await.inspect_err(|e| error!(resource, error = %e, "API call failed"))
    }

    async fn read<T, F, L>(&self, resource: &str, remote: F, local: L) -> T
    where
        F: Future<Output = Result<T, ConsoleError>>,
        L: FnOnce() -> T,
    {
        match self.attempt(Operation::Read, resource, remote).await {
            Some(v) => v,
            None => local(),
        }
    }

    async fn mirrored_write<F, L>(&self, resource: &str, remote: F, local: L) -> SaveAck
    where
        F: Future<Output = Result<SaveAck, ConsoleError>>,
        L: FnOnce() -> SaveAck,
    {
        match self.attempt(Operation::MirroredWrite, resource, remote).await {
            Some(ack) => ack,
            None => local(),
        }
    }

    async fn get_as<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ConsoleError> {
        let v = self.remote.get(path).await?;
        Ok(serde_json::from_value(v)?)
    }

    async fn send_for_ack<B: serde::Serialize>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<SaveAck, ConsoleError> {
        let body = serde_json::to_value(body)?;
        let v = self.remote.send(method, path, &body).await?;
        Ok(serde_json::from_value(v)?)
    }

    // ---- News ----

    fn local_news(&self) -> Vec<NewsItem> {
        self.local.read(keys::NEWS, seed::news)
    }

    /// The news report. Never fails.
    #[instrument(level = "info", skip_all)]
    pub async fn fetch_news(&self) -> Vec<NewsItem> {
        let remote = async {
            let body = self.remote.get(paths::REPORT).await?;
            decode_report(body)
        };
        self.read("news", remote, || self.local_news()).await
    }

    /// Submit URLs for processing and remove rows by id.
    #[instrument(level = "info", skip_all, fields(add = update.add.len(), remove = update.remove.len()))]
    pub async fn update_news(&self, update: &NewsUpdate) -> SaveAck {
        let remote = self.send_for_ack(Method::POST, paths::REPORT_UPDATE, update);
        self.mirrored_write("news", remote, || self.apply_news_locally(update))
            .await
    }

    fn apply_news_locally(&self, update: &NewsUpdate) -> SaveAck {
        let current = self.local_news();
        let next = apply_update(current, update);
        self.local.write(keys::NEWS, &next);
        SaveAck::ok()
    }

    // ---- Prompts ----

    #[instrument(level = "info", skip_all)]
    pub async fn fetch_prompts(&self) -> PromptSet {
        self.read("prompts", self.get_as(paths::PROMPTS), || {
            self.local.read(keys::PROMPTS, seed::prompts)
        })
        .await
    }

    /// Replace the whole prompt table.
    #[instrument(level = "info", skip_all, fields(rows = prompts.rows.len()))]
    pub async fn save_prompts(&self, prompts: &PromptSet) -> SaveAck {
        let remote = self.send_for_ack(Method::PUT, paths::PROMPTS, prompts);
        self.mirrored_write("prompts", remote, || {
            self.local.write(keys::PROMPTS, prompts);
            SaveAck::ok()
        })
        .await
    }

    // ---- Sheets ----

    fn local_sheets(&self) -> SheetCollection {
        self.local.read(keys::SHEETS, seed::sheets)
    }

    #[instrument(level = "info", skip_all)]
    pub async fn fetch_sheets(&self) -> SheetCollection {
        self.read("sheets", self.get_as(paths::SHEETS), || self.local_sheets())
            .await
    }

    /// Replace one sheet in the local collection. Always succeeds.
    #[instrument(level = "info", skip(self, table), fields(rows = table.rows.len()))]
    pub fn save_sheet_local(&self, name: &str, table: &SheetTable) -> SaveAck {
        let mut sheets = self.local_sheets();
        sheets.insert(name.to_string(), table.clone());
        self.local.write(keys::SHEETS, &sheets);
        SaveAck::ok()
    }

    /// Replace one sheet on the server. No local fallback: a partial sheet set
    /// cannot be merged safely, so failures go back to the caller.
    #[instrument(level = "info", skip(self, table), fields(rows = table.rows.len()))]
    pub async fn save_sheet_remote(&self, name: &str, table: &SheetTable) -> Result<Value, ConsoleError> {
        if name.trim().is_empty() {
            return Err(ConsoleError::validation("Sheet name is required"));
        }
        let remote = async {
            let body = serde_json::to_value(table)?;
            self.remote.send(Method::PUT, &paths::sheet(name), &body).await
        };
        let saved = self.remote_only("sheet", remote).await?;
        info!(sheet = name, "Sheet saved to API");
        Ok(saved)
    }

    // ---- Slides, audio, release ----

    #[instrument(level = "info", skip_all)]
    pub async fn fetch_slides(&self) -> Vec<Slide> {
        self.read("slides", self.get_as(paths::SLIDES), seed::slides).await
    }

    #[instrument(level = "info", skip_all)]
    pub async fn fetch_audio(&self) -> Vec<AudioFile> {
        self.read("audio", self.get_as(paths::AUDIO), seed::audio).await
    }

    #[instrument(level = "info", skip_all)]
    pub async fn fetch_release(&self) -> ReleaseInfo {
        self.read("release", self.get_as(paths::RELEASE), || {
            self.local.read(keys::RELEASE, seed::release)
        })
        .await
    }

    pub fn save_release_local(&self, release: &ReleaseInfo) -> SaveAck {
        self.local.write(keys::RELEASE, release);
        SaveAck::ok()
    }

    // ---- Ads ----

    /// Ads from the `ads` sheet; empty when the sheet does not exist.
    pub async fn fetch_ads(&self) -> Vec<AdEntry> {
        let sheets = self.fetch_sheets().await;
        sheets
            .get(ADS_SHEET)
            .map(|t| {
                t.rows
                    .iter()
                    .enumerate()
                    .map(|(i, row)| AdEntry::from_row(row, i))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn save_ads_local(&self, ads: &[AdEntry]) -> SaveAck {
        self.save_sheet_local(ADS_SHEET, &ads_table(ads))
    }

    pub async fn save_ads_remote(&self, ads: &[AdEntry]) -> Result<Value, ConsoleError> {
        self.save_sheet_remote(ADS_SHEET, &ads_table(ads)).await
    }

    // ---- Health ----

    /// Ping the API. Never fails; any problem reads as `ok: false`.
    #[instrument(level = "info", skip_all)]
    pub async fn check_api(&self) -> HealthStatus {
        match self.get_as::<HealthStatus>(paths::HEALTH).await {
            Ok(status) => status,
            Err(e) => {
                debug!(error = %e, "Health check failed");
                HealthStatus::down()
            }
        }
    }

    /// Load everything the dashboard needs.
    ///
    /// News and prompts load together, then sheets, then slides, audio and
    /// release info together. In `local` mode the health probe is skipped and reported down.
    #[instrument(level = "info", skip_all)]
    pub async fn load_all(&self) -> Snapshot {
        let (news, prompts) = futures::join!(self.fetch_news(), self.fetch_prompts());
        let sheets = self.fetch_sheets().await;
        let (slides, audio, release) =
            futures::join!(self.fetch_slides(), self.fetch_audio(), self.fetch_release());
        let health = match self.mode() {
            DataMode::Api => self.check_api().await,
            DataMode::Local => HealthStatus::down(),
        };
        info!(
            news = news.len(),
            sheets = sheets.len(),
            slides = slides.len(),
            audio = audio.len(),
            api_ok = health.ok,
            "Loaded snapshot"
        );
        Snapshot {
            news,
            prompts,
            sheets,
            slides,
            audio,
            release,
            health,
        }
    }
}

/// `/report` answers with `{headers, rows}` or a bare array of rows.
fn decode_report(body: Value) -> Result<Vec<NewsItem>, ConsoleError> {
    let rows = match body {
        Value::Object(mut map) => match map.remove("rows") {
            Some(rows @ Value::Array(_)) => rows,
            _ => {
                return Err(ConsoleError::Malformed(serde_json::Error::custom(
                    "report object has no rows array",
                )));
            }
        },
        rows @ Value::Array(_) => rows,
        _ => {
            return Err(ConsoleError::Malformed(serde_json::Error::custom(
                "report is neither an object nor an array",
            )));
        }
    };
    Ok(serde_json::from_value(rows)?)
}

/// Remove by id (string comparison), then append new pending items whose ids
/// continue from the remaining length.
pub fn apply_update(current: Vec<NewsItem>, update: &NewsUpdate) -> Vec<NewsItem> {
    let remove: HashSet<String> = update.remove.iter().map(ToString::to_string).collect();
    let mut next: Vec<NewsItem> = current
        .into_iter()
        .filter(|item| match &item.id {
            Some(id) => !remove.contains(&id.to_string()),
            None => true,
        })
        .collect();
    let base = next.len();
    next.extend(
        update
            .add
            .iter()
            .enumerate()
            .map(|(i, url)| NewsItem::pending(RecordId::from_index(base + i + 1), url.clone())),
    );
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Debug, Clone)]
    enum Reply {
        Json(Value),
        Status(u16),
        Garbage,
        Unreachable,
    }

    /// Canned responses per `"METHOD path"`; anything unscripted is a 404.
    #[derive(Debug, Default)]
    struct ScriptedRemote {
        replies: HashMap<String, Reply>,
        calls: Mutex<Vec<String>>,
        bodies: Mutex<Vec<Value>>,
    }

    impl ScriptedRemote {
        fn with(mut self, route: &str, reply: Reply) -> Self {
            self.replies.insert(route.to_string(), reply);
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        async fn answer(&self, route: String) -> Result<Value, ConsoleError> {
            self.calls.lock().unwrap().push(route.clone());
            match self.replies.get(&route).cloned().unwrap_or(Reply::Status(404)) {
                Reply::Json(v) => Ok(v),
                Reply::Status(status) => Err(ConsoleError::Status { path: route, status }),
                Reply::Garbage => Err(serde_json::from_str::<Value>("{\"rows\": [").unwrap_err().into()),
                Reply::Unreachable => {
                    // Builder error: a real reqwest::Error without any I/O.
                    let e = reqwest::Client::new().get("not a url").send().await.unwrap_err();
                    Err(e.into())
                }
            }
        }
    }

    impl RemoteService for ScriptedRemote {
        async fn get(&self, path: &str) -> Result<Value, ConsoleError> {
            self.answer(format!("GET {path}")).await
        }

        async fn send(&self, method: Method, path: &str, body: &Value) -> Result<Value, ConsoleError> {
            self.bodies.lock().unwrap().push(body.clone());
            self.answer(format!("{method} {path}")).await
        }
    }

    fn facade(remote: ScriptedRemote, mem: &MemoryStore, mode: DataMode) -> DataAccess<ScriptedRemote, &MemoryStore> {
        DataAccess::new(remote, mem, mode)
    }

    fn ids(items: &[NewsItem]) -> Vec<String> {
        items
            .iter()
            .map(|i| i.id.as_ref().map(ToString::to_string).unwrap_or_default())
            .collect()
    }

    #[tokio::test]
    async fn test_local_mode_never_calls_remote() {
        let mem = MemoryStore::new();
        let remote = ScriptedRemote::default().with("GET /report", Reply::Json(json!([])));
        let data = facade(remote, &mem, DataMode::Local);

        assert_eq!(data.fetch_news().await, seed::news());
        assert_eq!(data.fetch_prompts().await, seed::prompts());
        assert_eq!(data.fetch_slides().await, seed::slides());
        assert_eq!(data.fetch_audio().await, seed::audio());
        data.update_news(&NewsUpdate::default()).await;
        let snap = data.load_all().await;
        assert!(!snap.health.ok);
        assert!(data.remote.calls().is_empty());
    }

    #[tokio::test]
    async fn test_reads_absorb_every_remote_failure() {
        for reply in [Reply::Status(500), Reply::Garbage, Reply::Unreachable, Reply::Json(json!("nope"))] {
            let mem = MemoryStore::new();
            let remote = ScriptedRemote::default()
                .with("GET /report", reply.clone())
                .with("GET /prompts", reply.clone())
                .with("GET /sheets", reply.clone())
                .with("GET /slides", reply.clone())
                .with("GET /audio", reply.clone())
                .with("GET /release", reply.clone());
            let data = facade(remote, &mem, DataMode::Api);

            assert_eq!(data.fetch_news().await, seed::news(), "{reply:?}");
            assert_eq!(data.fetch_prompts().await, seed::prompts(), "{reply:?}");
            assert_eq!(data.fetch_sheets().await, seed::sheets(), "{reply:?}");
            assert_eq!(data.fetch_slides().await, seed::slides(), "{reply:?}");
            assert_eq!(data.fetch_audio().await, seed::audio(), "{reply:?}");
            assert_eq!(data.fetch_release().await, seed::release(), "{reply:?}");
        }
    }

    #[tokio::test]
    async fn test_remote_report_shapes() {
        let mem = MemoryStore::new();
        let remote = ScriptedRemote::default().with(
            "GET /report",
            Reply::Json(json!({"headers": ["id", "url"], "rows": [{"id": 10, "url": "https://a"}]})),
        );
        let data = facade(remote, &mem, DataMode::Api);
        assert_eq!(ids(&data.fetch_news().await), vec!["10"]);

        let remote = ScriptedRemote::default()
            .with("GET /report", Reply::Json(json!([{"id": "x"}, {"id": "y"}])));
        let data = facade(remote, &mem, DataMode::Api);
        assert_eq!(ids(&data.fetch_news().await), vec!["x", "y"]);
    }

    #[tokio::test]
    async fn test_mixed_field_types_stay_remote() {
        let mem = MemoryStore::new();
        let remote = ScriptedRemote::default()
            .with(
                "GET /report",
                Reply::Json(json!({"rows": [{"id": 10, "status": "done", "processed_at": 1746500000, "result": 3}]})),
            )
            .with(
                "GET /slides",
                Reply::Json(json!([{"id": 1, "texts": null, "urls": null, "type": "news-slide"}])),
            )
            .with("GET /audio", Reply::Json(json!([{"name": "live.mp3", "size": null}])));
        let data = facade(remote, &mem, DataMode::Api);

        let news = data.fetch_news().await;
        assert_eq!(ids(&news), vec!["10"]);
        assert_eq!(news[0].processed_at.as_deref(), Some("1746500000"));
        assert_eq!(news[0].result.as_deref(), Some("3"));

        let slides = data.fetch_slides().await;
        assert_eq!(slides.len(), 1);
        assert!(slides[0].texts.is_empty());

        let audio = data.fetch_audio().await;
        assert_eq!(audio.len(), 1);
        assert_eq!(audio[0].name, "live.mp3");
        assert_eq!(audio[0].size, 0);
    }

    #[tokio::test]
    async fn test_fallback_prefers_stored_over_seed() {
        let mem = MemoryStore::new();
        mem.insert_raw(keys::NEWS, r#"[{"id": 99, "url": "https://stored"}]"#);
        let data = facade(ScriptedRemote::default(), &mem, DataMode::Api);
        assert_eq!(ids(&data.fetch_news().await), vec!["99"]);
    }

    #[tokio::test]
    async fn test_update_news_add_in_fallback() {
        let mem = MemoryStore::new();
        let remote = ScriptedRemote::default().with("POST /report/update", Reply::Status(503));
        let data = facade(remote, &mem, DataMode::Api);

        let ack = data
            .update_news(&NewsUpdate {
                add: vec!["https://u1".into(), "https://u2".into()],
                remove: vec![],
            })
            .await;
        assert!(ack.ok);

        let stored: Vec<NewsItem> = serde_json::from_str(&mem.raw(keys::NEWS).unwrap()).unwrap();
        let seed_len = seed::news().len();
        assert_eq!(stored.len(), seed_len + 2);
        let added = &stored[seed_len..];
        assert_eq!(ids(added), vec![(seed_len + 1).to_string(), (seed_len + 2).to_string()]);
        for item in added {
            assert_eq!(item.status.as_deref(), Some("pending"));
            assert_eq!(item.result.as_deref(), Some(""));
            assert_eq!(item.error.as_deref(), Some(""));
            assert_eq!(item.processed_at.as_deref(), Some(""));
        }
        assert_eq!(added[1].url.as_deref(), Some("https://u2"));
        assert_eq!(
            data.remote.bodies.lock().unwrap()[0],
            json!({"add": ["https://u1", "https://u2"], "remove": []})
        );
    }

    #[tokio::test]
    async fn test_update_news_remove_by_string_id() {
        let mem = MemoryStore::new();
        mem.insert_raw(
            keys::NEWS,
            r#"[{"id": 1, "url": "a"}, {"id": "2", "url": "b"}, {"id": 3, "url": "c"}]"#,
        );
        let data = facade(ScriptedRemote::default(), &mem, DataMode::Local);
        data.update_news(&NewsUpdate {
            add: vec![],
            remove: vec![RecordId::parse("2")],
        })
        .await;
        assert_eq!(ids(&data.fetch_news().await), vec!["1", "3"]);
    }

    #[tokio::test]
    async fn test_update_news_remove_keeps_id_spelling() {
        let mem = MemoryStore::new();
        mem.insert_raw(keys::NEWS, r#"[{"id": "007", "url": "a"}, {"id": "8", "url": "b"}, {"id": 7, "url": "c"}]"#);
        let remote = ScriptedRemote::default().with("POST /report/update", Reply::Status(502));
        let data = facade(remote, &mem, DataMode::Api);
        data.update_news(&NewsUpdate {
            add: vec![],
            remove: vec![RecordId::parse("007")],
        })
        .await;
        assert_eq!(
            data.remote.bodies.lock().unwrap()[0],
            json!({"add": [], "remove": ["007"]})
        );
        let stored: Vec<NewsItem> = serde_json::from_str(&mem.raw(keys::NEWS).unwrap()).unwrap();
        assert_eq!(ids(&stored), vec!["8", "7"]);
    }

    #[tokio::test]
    async fn test_update_news_remote_success_leaves_local_alone() {
        let mem = MemoryStore::new();
        let remote = ScriptedRemote::default()
            .with("POST /report/update", Reply::Json(json!({"ok": true, "queued": 1})));
        let data = facade(remote, &mem, DataMode::Api);
        let ack = data
            .update_news(&NewsUpdate {
                add: vec!["https://u".into()],
                remove: vec![],
            })
            .await;
        assert!(ack.ok);
        assert_eq!(ack.details.get("queued"), Some(&json!(1)));
        assert_eq!(mem.raw(keys::NEWS), None);
    }

    #[tokio::test]
    async fn test_save_prompts_falls_back_locally() {
        let mem = MemoryStore::new();
        let remote = ScriptedRemote::default().with("PUT /prompts", Reply::Unreachable);
        let data = facade(remote, &mem, DataMode::Api);
        let mut prompts = seed::prompts();
        prompts.set_cell(0, "prompt", "Be brief.").unwrap();

        assert!(data.save_prompts(&prompts).await.ok);
        let stored: PromptSet = serde_json::from_str(&mem.raw(keys::PROMPTS).unwrap()).unwrap();
        assert_eq!(stored, prompts);
    }

    #[tokio::test]
    async fn test_save_sheet_remote_requires_name() {
        let mem = MemoryStore::new();
        let data = facade(ScriptedRemote::default(), &mem, DataMode::Api);
        let err = data.save_sheet_remote("", &SheetTable::default()).await.unwrap_err();
        assert!(matches!(err, ConsoleError::Validation(_)));
        assert!(data.remote.calls().is_empty());
    }

    #[tokio::test]
    async fn test_save_sheet_remote_surfaces_failure() {
        let mem = MemoryStore::new();
        let remote = ScriptedRemote::default().with("PUT /sheets/REF", Reply::Status(500));
        let data = facade(remote, &mem, DataMode::Api);
        let err = data.save_sheet_remote("REF", &SheetTable::default()).await.unwrap_err();
        assert!(matches!(err, ConsoleError::Status { status: 500, .. }));
        assert_eq!(mem.raw(keys::SHEETS), None);
    }

    #[tokio::test]
    async fn test_save_sheet_remote_escapes_name() {
        let mem = MemoryStore::new();
        let remote = ScriptedRemote::default()
            .with("PUT /sheets/news%202025-05-06", Reply::Json(json!({"ok": true})));
        let data = facade(remote, &mem, DataMode::Local);
        let v = data
            .save_sheet_remote("news 2025-05-06", &SheetTable::default())
            .await
            .unwrap();
        assert_eq!(v, json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_save_sheet_remote_in_local_mode_surfaces_failure() {
        let mem = MemoryStore::new();
        let remote = ScriptedRemote::default().with("PUT /sheets/ads", Reply::Unreachable);
        let data = facade(remote, &mem, DataMode::Local);
        let err = data.save_ads_remote(&[]).await.unwrap_err();
        assert!(err.is_remote());
        assert_eq!(data.remote.calls(), vec!["PUT /sheets/ads"]);
        assert_eq!(mem.raw(keys::SHEETS), None);
    }

    #[tokio::test]
    async fn test_load_all_includes_release() {
        let mem = MemoryStore::new();
        let remote = ScriptedRemote::default()
            .with("GET /release", Reply::Json(json!({"edition": "evening", "date": "2025-05-06"})))
            .with("GET /health", Reply::Json(json!({"ok": true})));
        let data = facade(remote, &mem, DataMode::Api);
        let snap = data.load_all().await;
        assert_eq!(snap.release.get("edition"), Some(&json!("evening")));
        assert!(snap.health.ok);

        let data = facade(ScriptedRemote::default(), &mem, DataMode::Local);
        assert_eq!(data.load_all().await.release, seed::release());
    }

    #[tokio::test]
    async fn test_save_sheet_local_is_idempotent() {
        let mem = MemoryStore::new();
        let data = facade(ScriptedRemote::default(), &mem, DataMode::Local);
        let table: SheetTable =
            serde_json::from_value(json!({"headers": ["k", "v"], "rows": [{"k": "a", "v": "1"}]})).unwrap();

        data.save_sheet_local("REF", &table);
        let once = mem.raw(keys::SHEETS).unwrap();
        data.save_sheet_local("REF", &table);
        assert_eq!(mem.raw(keys::SHEETS).unwrap(), once);

        let sheets = data.fetch_sheets().await;
        assert_eq!(sheets.get("REF"), Some(&table));
        assert!(sheets.contains_key("schedule"));
    }

    #[tokio::test]
    async fn test_mode_switch_touches_only_mode_key() {
        let mem = MemoryStore::new();
        let data = facade(ScriptedRemote::default(), &mem, DataMode::Api);
        data.save_sheet_local("REF", &SheetTable::default());
        let sheets_before = mem.raw(keys::SHEETS);

        data.set_mode(DataMode::Local);
        assert_eq!(data.mode(), DataMode::Local);
        data.set_mode(DataMode::Api);
        data.set_mode(DataMode::Local);

        assert_eq!(mem.raw(keys::SHEETS), sheets_before);
        for key in [keys::NEWS, keys::PROMPTS, keys::RELEASE] {
            assert_eq!(mem.raw(key), None, "{key}");
        }
        assert_eq!(mem.raw(keys::DATA_MODE).as_deref(), Some("local"));
    }

    #[tokio::test]
    async fn test_mode_is_read_on_every_call() {
        let mem = MemoryStore::new();
        let remote = ScriptedRemote::default().with("GET /slides", Reply::Json(json!([{"id": 1, "type": "news-slide"}])));
        let data = facade(remote, &mem, DataMode::Local);
        assert_eq!(data.fetch_slides().await.len(), seed::slides().len());

        mem.insert_raw(keys::DATA_MODE, "api");
        assert_eq!(data.fetch_slides().await.len(), 1);
        assert_eq!(data.remote.calls(), vec!["GET /slides"]);
    }

    #[tokio::test]
    async fn test_check_api() {
        let mem = MemoryStore::new();
        let data = facade(
            ScriptedRemote::default().with("GET /health", Reply::Json(json!({"ok": true, "version": "1.2"}))),
            &mem,
            DataMode::Api,
        );
        let status = data.check_api().await;
        assert!(status.ok);
        assert_eq!(status.details.get("version"), Some(&json!("1.2")));

        let data = facade(ScriptedRemote::default().with("GET /health", Reply::Garbage), &mem, DataMode::Api);
        assert!(!data.check_api().await.ok);
    }

    #[tokio::test]
    async fn test_ads_roundtrip_through_sheet() {
        let mem = MemoryStore::new();
        let data = facade(ScriptedRemote::default(), &mem, DataMode::Local);
        assert!(data.fetch_ads().await.is_empty());

        let mut ad = AdEntry::new(RecordId::parse("1700000000000"));
        ad.title = "Roastery".into();
        data.save_ads_local(&[ad.clone()]);

        let ads = data.fetch_ads().await;
        assert_eq!(ads, vec![ad]);
        let sheets = data.fetch_sheets().await;
        assert_eq!(sheets[ADS_SHEET].headers[3], "active");
    }

    #[test]
    fn test_apply_update_remove_then_add() {
        let current: Vec<NewsItem> =
            serde_json::from_value(json!([{"id": 1}, {"id": 2}, {"id": 3}])).unwrap();
        let next = apply_update(
            current,
            &NewsUpdate {
                add: vec!["https://n".into()],
                remove: vec![RecordId::parse("1")],
            },
        );
        // Ids continue from the post-removal length, so "3" appears twice.
        assert_eq!(ids(&next), vec!["2", "3", "3"]);
    }
}

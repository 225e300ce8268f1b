//! Filter controller: owns the directory criteria, debounces free-text
//! input and lets only the freshest response reach the list.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::card::{render_outcome, ListingKind};
use crate::epoch::{Dispatch, Epoch, QueryEpochGuard};
use crate::ports::DirectoryService;
use crate::scheduler::Scheduler;
use crate::session::Role;
use crate::types::{CriteriaUpdate, DoctorRecord, FilterCriteria};
use crate::view::ListView;

const SEARCH_TIMER: &str = "search";

struct Shared {
    criteria: Mutex<FilterCriteria>,
    /// Records behind the cards currently shown.
    shown: Mutex<Vec<DoctorRecord>>,
    epoch: QueryEpochGuard,
    directory: Arc<dyn DirectoryService>,
    view: Arc<dyn ListView>,
    role: Role,
}

impl Shared {
    fn criteria(&self) -> MutexGuard<'_, FilterCriteria> {
        self.criteria.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Claim an epoch and snapshot the criteria it will query with.
    fn begin(&self) -> (Epoch, FilterCriteria) {
        let criteria = self.criteria().clone();
        (self.epoch.advance(), criteria)
    }

    async fn run(&self, epoch: Epoch, kind: ListingKind, criteria: FilterCriteria) -> Dispatch {
        debug!(
            epoch = epoch.value(),
            segments = ?criteria.segments(),
            "dispatching directory query"
        );
        let result = match kind {
            ListingKind::Unfiltered => self.directory.fetch_all().await,
            ListingKind::Filtered => self.directory.fetch_filtered(&criteria).await,
        };

        if !self.epoch.is_current(epoch) {
            return self.discard(epoch);
        }
        let records = result.as_ref().map(Vec::clone).unwrap_or_default();
        let list = render_outcome(kind, result, self.role);

        let dispatch = self.epoch.commit(epoch, || {
            *self.shown.lock().unwrap_or_else(|p| p.into_inner()) = records;
            self.view.replace(list);
        });
        match dispatch {
            Dispatch::Rendered(_) => dispatch,
            Dispatch::Stale(_) => self.discard(epoch),
        }
    }

    fn discard(&self, epoch: Epoch) -> Dispatch {
        debug!(
            epoch = epoch.value(),
            current = self.epoch.current().value(),
            "discarding stale directory response"
        );
        Dispatch::Stale(epoch)
    }
}

/// One per dashboard page. The role is fixed for the page's lifetime:
/// a role change means a new page load and a new controller.
pub struct FilterController {
    shared: Arc<Shared>,
    scheduler: Scheduler<&'static str>,
    debounce: Duration,
}

impl FilterController {
    pub fn new(
        directory: Arc<dyn DirectoryService>,
        view: Arc<dyn ListView>,
        role: Role,
        debounce: Duration,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                criteria: Mutex::new(FilterCriteria::default()),
                shown: Mutex::new(Vec::new()),
                epoch: QueryEpochGuard::new(),
                directory,
                view,
                role,
            }),
            scheduler: Scheduler::new(),
            debounce,
        }
    }

    pub fn criteria(&self) -> FilterCriteria {
        self.shared.criteria().clone()
    }

    pub fn epoch(&self) -> Epoch {
        self.shared.epoch.current()
    }

    pub fn role(&self) -> Role {
        self.shared.role
    }

    /// The record behind a currently rendered card.
    pub fn record(&self, doctor_id: &str) -> Option<DoctorRecord> {
        self.shared
            .shown
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .iter()
            .find(|r| r.id == doctor_id)
            .cloned()
    }

    pub fn search_pending(&self) -> bool {
        self.scheduler.is_pending(&SEARCH_TIMER)
    }

    /// Merge `update` into the criteria.
    ///
    /// Free-text changes restart the debounce timer and return `None`.
    /// Dropdown-only changes dispatch at once, cancelling any pending
    /// free-text timer, and return the in-flight dispatch.
    pub fn on_criteria_changed(&self, update: CriteriaUpdate) -> Option<JoinHandle<Dispatch>> {
        if update.is_empty() {
            return None;
        }
        self.shared.criteria().apply(&update);

        if update.touches_search() {
            let shared = self.shared.clone();
            self.scheduler
                .schedule(SEARCH_TIMER, self.debounce, async move {
                    let (epoch, criteria) = shared.begin();
                    shared.run(epoch, ListingKind::Filtered, criteria).await;
                });
            return None;
        }

        self.scheduler.cancel(&SEARCH_TIMER);
        let (epoch, criteria) = self.shared.begin();
        let shared = self.shared.clone();
        Some(tokio::spawn(async move {
            shared.run(epoch, ListingKind::Filtered, criteria).await
        }))
    }

    /// Page-load listing of the whole directory.
    pub async fn load_all(&self) -> Dispatch {
        let (epoch, criteria) = self.shared.begin();
        self.shared.run(epoch, ListingKind::Unfiltered, criteria).await
    }

    /// Re-issue the current criteria immediately.
    pub async fn refresh(&self) -> Dispatch {
        self.scheduler.cancel(&SEARCH_TIMER);
        let (epoch, criteria) = self.shared.begin();
        let kind = if criteria.is_unconstrained() {
            ListingKind::Unfiltered
        } else {
            ListingKind::Filtered
        };
        self.shared.run(epoch, kind, criteria).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{FILTER_FAILED, NO_DOCTORS};
    use crate::error::{ServiceFailure, ServiceResult};
    use crate::types::{DoctorRecord, NewDoctor};
    use crate::view::{DirectoryBoard, RenderedList};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tokio::sync::oneshot;
    use tokio::time::sleep;

    type Reply = ServiceResult<Vec<DoctorRecord>>;

    fn key(criteria: &FilterCriteria) -> String {
        criteria.segments().join("/")
    }

    /// Answers every query from a closure and records the queries.
    struct FakeDirectory {
        calls: Mutex<Vec<String>>,
        answer: Box<dyn Fn(&FilterCriteria) -> Reply + Send + Sync>,
    }

    impl FakeDirectory {
        fn new(answer: impl Fn(&FilterCriteria) -> Reply + Send + Sync + 'static) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                answer: Box::new(answer),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DirectoryService for FakeDirectory {
        async fn fetch_all(&self) -> Reply {
            self.calls.lock().unwrap().push("all".into());
            (self.answer)(&FilterCriteria::default())
        }

        async fn fetch_filtered(&self, criteria: &FilterCriteria) -> Reply {
            self.calls.lock().unwrap().push(key(criteria));
            (self.answer)(criteria)
        }

        async fn create_doctor(&self, _: &NewDoctor, _: &str) -> ServiceResult<String> {
            unreachable!()
        }

        async fn delete_doctor(&self, _: &str, _: &str) -> ServiceResult<String> {
            unreachable!()
        }
    }

    /// Holds each filtered query until the test releases it.
    struct GatedDirectory {
        gates: Mutex<HashMap<String, oneshot::Receiver<Reply>>>,
    }

    #[async_trait]
    impl DirectoryService for GatedDirectory {
        async fn fetch_all(&self) -> Reply {
            Ok(vec![])
        }

        async fn fetch_filtered(&self, criteria: &FilterCriteria) -> Reply {
            let rx = self.gates.lock().unwrap().remove(&key(criteria));
            match rx {
                Some(rx) => rx.await.unwrap_or_else(|_| Err(ServiceFailure::new("dropped"))),
                None => Err(ServiceFailure::new("unexpected query")),
            }
        }

        async fn create_doctor(&self, _: &NewDoctor, _: &str) -> ServiceResult<String> {
            unreachable!()
        }

        async fn delete_doctor(&self, _: &str, _: &str) -> ServiceResult<String> {
            unreachable!()
        }
    }

    fn controller(dir: Arc<dyn DirectoryService>) -> (FilterController, Arc<DirectoryBoard>) {
        let board = Arc::new(DirectoryBoard::new());
        let ctl = FilterController::new(dir, board.clone(), Role::Patient, Duration::from_millis(250));
        (ctl, board)
    }

    #[tokio::test(start_paused = true)]
    async fn typing_within_window_issues_one_query() {
        let dir = FakeDirectory::new(|_| Ok(vec![DoctorRecord::new("d1", "Dr. Lee")]));
        let (ctl, board) = controller(dir.clone());

        assert!(ctl.on_criteria_changed(CriteriaUpdate::search("card")).is_none());
        sleep(Duration::from_millis(100)).await;
        ctl.on_criteria_changed(CriteriaUpdate::search("cardio"));
        assert!(dir.calls().is_empty());

        sleep(Duration::from_millis(300)).await;
        assert_eq!(dir.calls(), vec!["cardio/null/null"]);
        assert_eq!(board.card_ids(), vec!["d1"]);
        assert_eq!(board.render_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropdown_change_dispatches_immediately_with_merged_criteria() {
        let dir = FakeDirectory::new(|_| Ok(vec![]));
        let (ctl, _board) = controller(dir.clone());

        ctl.on_criteria_changed(CriteriaUpdate::search("lee"));
        assert!(ctl.search_pending());
        let handle = ctl
            .on_criteria_changed(CriteriaUpdate::time("Mon AM"))
            .expect("immediate dispatch");
        assert!(!ctl.search_pending());
        assert!(matches!(handle.await.unwrap(), Dispatch::Rendered(_)));

        sleep(Duration::from_millis(500)).await;
        assert_eq!(dir.calls(), vec!["lee/Mon AM/null"]);
    }

    #[tokio::test(start_paused = true)]
    async fn blank_search_is_unconstrained() {
        let dir = FakeDirectory::new(|_| Ok(vec![]));
        let (ctl, board) = controller(dir.clone());
        ctl.on_criteria_changed(CriteriaUpdate::search("   "));
        sleep(Duration::from_millis(300)).await;
        assert_eq!(dir.calls(), vec!["null/null/null"]);
        assert!(ctl.criteria().is_unconstrained());
        assert_eq!(
            board.snapshot(),
            Some(RenderedList::placeholder(crate::card::NO_FILTERED_DOCTORS))
        );
    }

    #[tokio::test]
    async fn empty_update_does_nothing() {
        let dir = FakeDirectory::new(|_| Ok(vec![]));
        let (ctl, board) = controller(dir.clone());
        assert!(ctl.on_criteria_changed(CriteriaUpdate::default()).is_none());
        assert!(dir.calls().is_empty());
        assert_eq!(ctl.epoch().value(), 0);
        assert!(board.snapshot().is_none());
    }

    #[tokio::test]
    async fn late_response_never_overwrites_newer_render() {
        let (tx_a, rx_a) = oneshot::channel();
        let (tx_b, rx_b) = oneshot::channel();
        let dir = Arc::new(GatedDirectory {
            gates: Mutex::new(HashMap::from([
                ("null/null/A".to_string(), rx_a),
                ("null/null/B".to_string(), rx_b),
            ])),
        });
        let (ctl, board) = controller(dir);

        let first = ctl.on_criteria_changed(CriteriaUpdate::specialty("A")).unwrap();
        let second = ctl.on_criteria_changed(CriteriaUpdate::specialty("B")).unwrap();

        tx_b.send(Ok(vec![DoctorRecord::new("b", "Dr. B")])).unwrap();
        assert!(matches!(second.await.unwrap(), Dispatch::Rendered(_)));
        assert_eq!(board.card_ids(), vec!["b"]);

        tx_a.send(Ok(vec![DoctorRecord::new("a", "Dr. A")])).unwrap();
        assert!(matches!(first.await.unwrap(), Dispatch::Stale(_)));
        assert_eq!(board.card_ids(), vec!["b"]);
        assert_eq!(board.render_count(), 1);
    }

    #[tokio::test]
    async fn in_order_arrival_renders_latest_only() {
        let (tx_a, rx_a) = oneshot::channel();
        let (tx_b, rx_b) = oneshot::channel();
        let dir = Arc::new(GatedDirectory {
            gates: Mutex::new(HashMap::from([
                ("null/null/A".to_string(), rx_a),
                ("null/null/B".to_string(), rx_b),
            ])),
        });
        let (ctl, board) = controller(dir);

        let first = ctl.on_criteria_changed(CriteriaUpdate::specialty("A")).unwrap();
        let second = ctl.on_criteria_changed(CriteriaUpdate::specialty("B")).unwrap();

        tx_a.send(Ok(vec![DoctorRecord::new("a", "Dr. A")])).unwrap();
        assert!(matches!(first.await.unwrap(), Dispatch::Stale(_)));
        assert!(board.snapshot().is_none());

        tx_b.send(Err(ServiceFailure::new("timeout"))).unwrap();
        assert!(matches!(second.await.unwrap(), Dispatch::Rendered(_)));
        assert_eq!(board.snapshot(), Some(RenderedList::placeholder(FILTER_FAILED)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn slow_render_on_another_worker_never_overwrites_newer_list() {
        let crowd: Arc<Vec<DoctorRecord>> = Arc::new(
            (0..100_000)
                .map(|i| DoctorRecord::new(format!("a{i}"), "Dr. A").with_availability(["Mon AM"]))
                .collect(),
        );
        let dir = FakeDirectory::new(move |criteria| match criteria.specialty() {
            Some("A") => Ok(crowd.as_ref().clone()),
            _ => Ok(vec![DoctorRecord::new("b", "Dr. B")]),
        });
        let (ctl, board) = controller(dir);

        let first = ctl.on_criteria_changed(CriteriaUpdate::specialty("A")).unwrap();
        sleep(Duration::from_millis(5)).await;
        let second = ctl.on_criteria_changed(CriteriaUpdate::specialty("B")).unwrap();

        assert!(second.await.unwrap().is_rendered());
        first.await.unwrap();
        assert_eq!(ctl.epoch().value(), 2);
        assert_eq!(board.card_ids(), vec!["b"]);
    }

    #[tokio::test]
    async fn load_all_renders_placeholder_for_empty_directory() {
        let dir = FakeDirectory::new(|_| Ok(vec![]));
        let (ctl, board) = controller(dir.clone());
        assert!(matches!(ctl.load_all().await, Dispatch::Rendered(_)));
        assert_eq!(dir.calls(), vec!["all"]);
        assert_eq!(board.snapshot(), Some(RenderedList::placeholder(NO_DOCTORS)));
    }

    #[tokio::test]
    async fn refresh_uses_current_criteria() {
        let dir = FakeDirectory::new(|_| Ok(vec![]));
        let (ctl, _board) = controller(dir.clone());
        ctl.refresh().await;
        ctl.on_criteria_changed(CriteriaUpdate::specialty("Cardiology"))
            .unwrap()
            .await
            .unwrap();
        ctl.refresh().await;
        assert_eq!(
            dir.calls(),
            vec!["all", "null/null/Cardiology", "null/null/Cardiology"]
        );
        assert_eq!(ctl.epoch().value(), 3);
    }

    #[tokio::test]
    async fn cards_use_the_page_role() {
        let dir = FakeDirectory::new(|_| Ok(vec![DoctorRecord::new("d1", "Dr. Lee")]));
        let board = Arc::new(DirectoryBoard::new());
        let ctl = FilterController::new(dir, board.clone(), Role::Admin, Duration::from_millis(250));
        ctl.load_all().await;
        let snapshot = board.snapshot().unwrap();
        assert_eq!(snapshot.cards()[0].action_label(), "Delete");
        assert_eq!(ctl.record("d1").and_then(|r| r.name).as_deref(), Some("Dr. Lee"));
        assert!(ctl.record("d9").is_none());
    }
}

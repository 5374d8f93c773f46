/// Optimistic-update controller.
///
/// Each gesture runs the same cycle:
/// 1. snapshot the board and apply the edit locally (placeholder IDs for new
///    entities), then render
/// 2. await the API call (the only suspension point)
/// 3. on success adopt the server's canonical result and render, otherwise
///    restore the snapshot, render and surface the error
use super::{local, placeholder_id, BoardApi, BoardView, ClientError};
use crate::events::BoardChangeEvent;
use crate::types::{BoardDetail, Card, List, MoveOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    AddCard,
    AddList,
    ReorderLists,
    ReorderCards,
    MoveCard,
}

impl GestureKind {
    fn label(self) -> &'static str {
        match self {
            GestureKind::AddCard => "add card",
            GestureKind::AddList => "add list",
            GestureKind::ReorderLists => "reorder lists",
            GestureKind::ReorderCards => "reorder cards",
            GestureKind::MoveCard => "move card",
        }
    }
}

/// Where the most recent gesture stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Optimistic(GestureKind),
    Confirmed(GestureKind),
    RolledBack(GestureKind),
}

pub struct BoardController<A: BoardApi, V: BoardView> {
    api: A,
    view: V,
    board_id: String,
    state: BoardDetail,
    phase: Phase,
}

impl<A: BoardApi, V: BoardView> BoardController<A, V> {
    /// Fetch the board and render it once.
    pub async fn load(api: A, mut view: V, board_id: &str) -> Result<Self, ClientError> {
        let state = match api.fetch_board(board_id).await {
            Ok(state) => state,
            Err(e) => {
                view.show_status(&format!("Failed to load board: {}", e));
                return Err(e);
            }
        };
        view.render(&state);
        Ok(Self {
            api,
            view,
            board_id: board_id.to_string(),
            state,
            phase: Phase::Idle,
        })
    }

    pub fn board_id(&self) -> &str {
        &self.board_id
    }

    pub fn state(&self) -> &BoardDetail {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub async fn add_card(&mut self, list_id: &str, title: &str) -> Result<Card, ClientError> {
        let kind = GestureKind::AddCard;
        let placeholder = placeholder_id();
        let snapshot = self.begin(kind, |board| {
            local::insert_card(board, list_id, &placeholder, title)
        })?;

        match self.api.create_card(list_id, title).await {
            Ok(card) => {
                let confirmed = card.clone();
                self.confirm(kind, |board| local::replace_card(board, &placeholder, confirmed));
                Ok(card)
            }
            Err(e) => Err(self.roll_back(kind, snapshot, e)),
        }
    }

    pub async fn add_list(&mut self, title: &str) -> Result<List, ClientError> {
        let kind = GestureKind::AddList;
        let placeholder = placeholder_id();
        let snapshot = self.begin(kind, |board| {
            local::insert_list(board, &placeholder, title);
            Ok(())
        })?;

        match self.api.create_list(&self.board_id, title).await {
            Ok(list) => {
                let confirmed = list.clone();
                self.confirm(kind, |board| local::replace_list(board, &placeholder, confirmed));
                Ok(list)
            }
            Err(e) => Err(self.roll_back(kind, snapshot, e)),
        }
    }

    pub async fn reorder_lists(&mut self, ordered_ids: &[String]) -> Result<Vec<List>, ClientError> {
        let kind = GestureKind::ReorderLists;
        let snapshot = self.begin(kind, |board| local::reorder_lists(board, ordered_ids))?;

        match self.api.reorder_lists(&self.board_id, ordered_ids).await {
            Ok(lists) => {
                self.confirm(kind, |board| local::adopt_lists(board, &lists));
                Ok(lists)
            }
            Err(e) => Err(self.roll_back(kind, snapshot, e)),
        }
    }

    pub async fn reorder_cards(
        &mut self,
        list_id: &str,
        ordered_ids: &[String],
    ) -> Result<Vec<Card>, ClientError> {
        let kind = GestureKind::ReorderCards;
        let snapshot = self.begin(kind, |board| {
            local::reorder_cards(board, list_id, ordered_ids)
        })?;

        match self.api.reorder_cards(list_id, ordered_ids).await {
            Ok(cards) => {
                self.confirm(kind, |board| local::adopt_cards(board, list_id, &cards));
                Ok(cards)
            }
            Err(e) => Err(self.roll_back(kind, snapshot, e)),
        }
    }

    pub async fn move_card(
        &mut self,
        card_id: &str,
        to_list_id: &str,
        to_index: i64,
    ) -> Result<MoveOutcome, ClientError> {
        let kind = GestureKind::MoveCard;
        let snapshot = self.begin(kind, |board| {
            local::move_card(board, card_id, to_list_id, to_index)
        })?;

        match self.api.move_card(card_id, to_list_id, to_index).await {
            Ok(outcome) => {
                self.confirm(kind, |board| local::adopt_move(board, &outcome));
                Ok(outcome)
            }
            Err(e) => Err(self.roll_back(kind, snapshot, e)),
        }
    }

    /// Replace local state with the server's and render.
    pub async fn refresh(&mut self) -> Result<(), ClientError> {
        match self.api.fetch_board(&self.board_id).await {
            Ok(state) => {
                self.state = state;
                self.view.render(&self.state);
                Ok(())
            }
            Err(e) => {
                log::warn!(target: "taskboard.client", "Refresh of board {} failed: {}", self.board_id, e);
                self.view.show_status(&format!("Failed to refresh board: {}", e));
                Err(e)
            }
        }
    }

    /// Consume an invalidation signal. Returns whether a re-fetch happened.
    pub async fn handle_event(&mut self, event: &BoardChangeEvent) -> Result<bool, ClientError> {
        if !event.concerns_board(&self.board_id) {
            return Ok(false);
        }
        if let BoardChangeEvent::BoardDeleted { .. } = event {
            self.view.show_status("This board was deleted");
            return Ok(false);
        }
        log::debug!(target: "taskboard.client", "{} on board {}, refreshing", event.kind(), self.board_id);
        self.refresh().await?;
        Ok(true)
    }

    fn begin(
        &mut self,
        kind: GestureKind,
        edit: impl FnOnce(&mut BoardDetail) -> Result<(), ClientError>,
    ) -> Result<BoardDetail, ClientError> {
        let snapshot = self.state.clone();
        if let Err(e) = edit(&mut self.state) {
            self.state = snapshot;
            self.view.show_status(&format!("Cannot {}: {}", kind.label(), e));
            return Err(e);
        }
        self.phase = Phase::Optimistic(kind);
        self.view.render(&self.state);
        Ok(snapshot)
    }

    fn confirm(&mut self, kind: GestureKind, reconcile: impl FnOnce(&mut BoardDetail)) {
        reconcile(&mut self.state);
        self.phase = Phase::Confirmed(kind);
        self.view.render(&self.state);
    }

    fn roll_back(&mut self, kind: GestureKind, snapshot: BoardDetail, error: ClientError) -> ClientError {
        log::warn!(
            target: "taskboard.client",
            "Rolling back {} on board {}: {}",
            kind.label(),
            self.board_id,
            error
        );
        self.state = snapshot;
        self.phase = Phase::RolledBack(kind);
        self.view.render(&self.state);
        self.view.show_status(&format!("Failed to {}: {}", kind.label(), error));
        error
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::client::{is_placeholder, InProcessApi};
    use crate::reorder::ReorderPolicy;
    use crate::storage::{BoardStorage, BoardStore};

    #[derive(Default)]
    struct RecordingView {
        renders: Vec<BoardDetail>,
        statuses: Vec<String>,
    }

    impl BoardView for RecordingView {
        fn render(&mut self, board: &BoardDetail) {
            self.renders.push(board.clone());
        }

        fn show_status(&mut self, message: &str) {
            self.statuses.push(message.to_string());
        }
    }

    /// Delegates to the store; mutations fail with a transport error while
    /// `offline` is set.
    struct FlakyApi {
        inner: InProcessApi<BoardStore>,
        offline: AtomicBool,
    }

    impl FlakyApi {
        fn check(&self) -> Result<(), ClientError> {
            if self.offline.load(Ordering::SeqCst) {
                return Err(ClientError::Transport("connection refused".into()));
            }
            Ok(())
        }
    }

    impl BoardApi for FlakyApi {
        async fn fetch_board(&self, board_id: &str) -> Result<BoardDetail, ClientError> {
            self.inner.fetch_board(board_id).await
        }

        async fn create_list(&self, board_id: &str, title: &str) -> Result<List, ClientError> {
            self.check()?;
            self.inner.create_list(board_id, title).await
        }

        async fn create_card(&self, list_id: &str, title: &str) -> Result<Card, ClientError> {
            self.check()?;
            self.inner.create_card(list_id, title).await
        }

        async fn reorder_lists(
            &self,
            board_id: &str,
            ordered_ids: &[String],
        ) -> Result<Vec<List>, ClientError> {
            self.check()?;
            self.inner.reorder_lists(board_id, ordered_ids).await
        }

        async fn reorder_cards(
            &self,
            list_id: &str,
            ordered_ids: &[String],
        ) -> Result<Vec<Card>, ClientError> {
            self.check()?;
            self.inner.reorder_cards(list_id, ordered_ids).await
        }

        async fn move_card(
            &self,
            card_id: &str,
            to_list_id: &str,
            to_index: i64,
        ) -> Result<MoveOutcome, ClientError> {
            self.check()?;
            self.inner.move_card(card_id, to_list_id, to_index).await
        }
    }

    struct Fixture {
        store: Arc<BoardStore>,
        board: String,
        l1: String,
        l2: String,
        a: String,
        c: String,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(BoardStore::in_memory(ReorderPolicy::Lenient));
        let board = store.create_board("B").unwrap().id;
        let l1 = store.create_list(&board, "L1").unwrap().id;
        let l2 = store.create_list(&board, "L2").unwrap().id;
        let a = store.create_card(&l1, "A").unwrap().id;
        let c = store.create_card(&l1, "C").unwrap().id;
        Fixture {
            store,
            board,
            l1,
            l2,
            a,
            c,
        }
    }

    async fn controller(
        f: &Fixture,
        offline: bool,
    ) -> BoardController<FlakyApi, RecordingView> {
        let api = FlakyApi {
            inner: InProcessApi::new(f.store.clone()),
            offline: AtomicBool::new(offline),
        };
        BoardController::load(api, RecordingView::default(), &f.board)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_load_renders_once() {
        let f = fixture();
        let ctl = controller(&f, false).await;
        assert_eq!(ctl.phase(), Phase::Idle);
        assert_eq!(ctl.view().renders.len(), 1);
        assert_eq!(ctl.state().list_ids(), vec![f.l1.clone(), f.l2.clone()]);
    }

    #[tokio::test]
    async fn test_move_confirmed_matches_server() {
        let f = fixture();
        let mut ctl = controller(&f, false).await;
        let outcome = ctl.move_card(&f.a, &f.l2, 0).await.unwrap();

        assert_eq!(outcome.card.list_id, f.l2);
        assert_eq!(ctl.phase(), Phase::Confirmed(GestureKind::MoveCard));
        assert_eq!(ctl.state(), &f.store.get_board(&f.board).unwrap());
        assert_eq!(ctl.state().list(&f.l1).unwrap().card_ids(), vec![f.c.clone()]);
        // optimistic render plus confirmed render
        assert_eq!(ctl.view().renders.len(), 3);
    }

    #[tokio::test]
    async fn test_failed_move_restores_exact_snapshot() {
        let f = fixture();
        let mut ctl = controller(&f, true).await;
        let before = ctl.state().clone();

        let err = ctl.move_card(&f.a, &f.l2, 0).await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
        assert_eq!(ctl.phase(), Phase::RolledBack(GestureKind::MoveCard));
        assert_eq!(ctl.state(), &before);

        let renders = &ctl.view().renders;
        // the optimistic render showed the move before the rollback
        assert_eq!(renders[1].list(&f.l2).unwrap().card_ids(), vec![f.a.clone()]);
        assert_eq!(renders.last().unwrap(), &before);
        assert_eq!(ctl.view().statuses.len(), 1);
        assert!(ctl.view().statuses[0].contains("move card"));
    }

    #[tokio::test]
    async fn test_add_card_replaces_placeholder() {
        let f = fixture();
        let mut ctl = controller(&f, false).await;
        let card = ctl.add_card(&f.l2, "New").await.unwrap();

        let optimistic = &ctl.view().renders[1];
        assert!(is_placeholder(&optimistic.list(&f.l2).unwrap().cards[0].id));

        let cards = &ctl.state().list(&f.l2).unwrap().cards;
        assert_eq!(cards, &vec![card]);
        assert!(!cards.iter().any(|c| is_placeholder(&c.id)));
    }

    #[tokio::test]
    async fn test_add_list_rolled_back_when_rejected() {
        let f = fixture();
        let mut ctl = controller(&f, false).await;
        let before = ctl.state().clone();

        let err = ctl.add_list("   ").await.unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert_eq!(ctl.state(), &before);
        assert_eq!(ctl.phase(), Phase::RolledBack(GestureKind::AddList));
    }

    #[tokio::test]
    async fn test_add_list_confirmed() {
        let f = fixture();
        let mut ctl = controller(&f, false).await;
        let list = ctl.add_list("Done").await.unwrap();
        assert_eq!(list.position, 2);
        assert_eq!(ctl.state().lists.last().unwrap().list, list);
    }

    #[tokio::test]
    async fn test_reorder_lists_and_cards() {
        let f = fixture();
        let mut ctl = controller(&f, false).await;

        ctl.reorder_lists(&[f.l2.clone(), f.l1.clone()]).await.unwrap();
        assert_eq!(ctl.state().list_ids(), vec![f.l2.clone(), f.l1.clone()]);

        ctl.reorder_cards(&f.l1, &[f.c.clone(), f.a.clone()]).await.unwrap();
        assert_eq!(
            ctl.state().list(&f.l1).unwrap().card_ids(),
            vec![f.c.clone(), f.a.clone()]
        );
        assert_eq!(ctl.state(), &f.store.get_board(&f.board).unwrap());
    }

    #[tokio::test]
    async fn test_unknown_local_target_fails_before_request() {
        let f = fixture();
        let mut ctl = controller(&f, false).await;
        let before = ctl.state().clone();
        let renders = ctl.view().renders.len();

        let err = ctl.move_card(&f.a, "missing", 0).await.unwrap_err();
        assert!(matches!(err, ClientError::Missing(_)));
        assert_eq!(ctl.state(), &before);
        assert_eq!(ctl.view().renders.len(), renders);
        assert_eq!(ctl.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn test_handle_event_refreshes_own_board_only() {
        let f = fixture();
        let mut ctl = controller(&f, false).await;

        let other = BoardChangeEvent::ListsReordered {
            board_id: "elsewhere".into(),
        };
        assert!(!ctl.handle_event(&other).await.unwrap());

        f.store.create_card(&f.l2, "From elsewhere").unwrap();
        let event = BoardChangeEvent::CardCreated {
            board_id: f.board.clone(),
            list_id: f.l2.clone(),
            card_id: "x".into(),
        };
        assert!(ctl.handle_event(&event).await.unwrap());
        assert_eq!(ctl.state().list(&f.l2).unwrap().cards.len(), 1);
    }
}

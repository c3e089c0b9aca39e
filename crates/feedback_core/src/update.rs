use engine_logging::engine_debug;

use crate::raw_list::{append_ids, parse_raw_ids, sanitize_ids};
use crate::{AppState, Effect, Msg, StoreKind, TaskKind, TaskOutcome};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::RawInputChanged(raw) => {
            // The pending list is frozen while a batch works through it.
            if state.is_running(TaskKind::BulkFeedback) {
                return (state, Vec::new());
            }
            let ids = parse_raw_ids(&raw);
            state.set_raw_input(raw);
            vec![Effect::SyncQueue { ids }]
        }
        Msg::ItemsPicked(picked) => {
            if picked.is_empty() || state.is_running(TaskKind::BulkFeedback) {
                return (state, Vec::new());
            }
            let raw = append_ids(state.raw_input(), &picked);
            let ids = parse_raw_ids(&raw);
            state.set_raw_input(raw);
            vec![Effect::SyncQueue { ids }]
        }
        Msg::SanitizeClicked => {
            let raw = sanitize_ids(&state.queue().ids());
            if raw != state.raw_input() {
                state.set_raw_input(raw);
            }
            Vec::new()
        }
        Msg::LeaveFeedbackClicked { force } => {
            if state.is_running(TaskKind::BulkFeedback) || state.queue().is_empty() {
                return (state, Vec::new());
            }
            state.set_running(TaskKind::BulkFeedback, true);
            state.set_failure_summary(None);
            state.set_status(Some("Leaving feedback...".to_string()), Some(0));
            vec![Effect::StartBulkFeedback { force }]
        }
        Msg::StopClicked(kind) => {
            if state.is_running(kind) {
                vec![Effect::Cancel(kind)]
            } else {
                Vec::new()
            }
        }
        Msg::IgnoreListedClicked => vec![Effect::IgnoreListed],
        Msg::ClearCompletedClicked => vec![Effect::ClearCompleted],
        Msg::SearchChanged(query) => {
            state.set_search_query(query.clone());
            state.set_running(TaskKind::Search, true);
            vec![Effect::StartSearch { query }]
        }
        Msg::RefreshClicked => {
            let query = state.search_query().to_string();
            state.set_running(TaskKind::Search, true);
            vec![Effect::StartSearch { query }]
        }
        Msg::StatusReported { message, percent } => {
            state.set_status(Some(message), percent);
            Vec::new()
        }
        Msg::StoreChanged { store, snapshot } => {
            match store {
                StoreKind::Queue => state.set_queue(snapshot),
                StoreKind::Picklist => state.set_picklist(snapshot),
            }
            Vec::new()
        }
        Msg::CompletedCleared { snapshot } => {
            let raw = sanitize_ids(&snapshot.ids());
            state.set_queue(snapshot);
            state.set_raw_input(raw);
            Vec::new()
        }
        Msg::ImageReady { listing_id } => {
            state.mark_image_ready(listing_id);
            Vec::new()
        }
        Msg::TaskRejected { kind, reason } => {
            engine_debug!("{} start rejected: {}", kind, reason);
            state.set_status(Some(reason), None);
            Vec::new()
        }
        Msg::TaskFinished { kind, report } => {
            state.set_running(kind, false);
            if report.outcome == TaskOutcome::Superseded {
                return (state, Vec::new());
            }
            if kind == TaskKind::BulkFeedback {
                state.set_failure_summary(report.failure_summary());
            }
            state.set_status(Some(report.message), Some(report.percent));
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
